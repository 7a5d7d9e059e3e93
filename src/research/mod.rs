//! Research Plan Construction
//!
//! This module turns a research request into a validated, time-estimated
//! plan of executable steps. Everything here is synchronous and pure: no
//! network calls, no shared state.
//!
//! # Architecture
//!
//! - [`sources::SourceMapper`] - Ranks data sources for weighted dimensions
//!   and checks their access credentials
//! - [`planner::PlanBuilder`] - Decomposes the request into prep, research,
//!   analysis and validation steps
//! - [`optimizer`] - Parallel groups, critical path and makespan
//! - [`coordinator::ResearchPlanner`] - Runs the three in order
//!
//! # Usage
//!
//! ```ignore
//! use ares_research::research::coordinator::{PlanRequest, ResearchPlanner};
//!
//! let planner = ResearchPlanner::new(&config.planning, AccessCredentials::from_env());
//! let plan = planner.create_plan(&request)?;
//!
//! for (i, group) in plan.schedule.parallel_groups.iter().enumerate() {
//!     println!("group {}: {:?}", i, group);
//! }
//! println!("critical path: {:?}", plan.schedule.critical_path);
//! ```

/// End-to-end plan creation.
pub mod coordinator;
/// Parallel grouping and critical-path estimation.
pub mod optimizer;
/// Step decomposition into the four-phase DAG.
pub mod planner;
/// Data-source selection and credential validation.
pub mod sources;

pub use coordinator::{PlanRequest, ResearchPlan, ResearchPlanner};
pub use optimizer::optimize_for_parallel_execution;
pub use planner::PlanBuilder;
pub use sources::SourceMapper;
