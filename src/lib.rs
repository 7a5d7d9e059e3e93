//! # A.R.E.S Research - Research Orchestration Core
//!
//! Turns a research request into a dependency-ordered plan of steps, groups
//! the steps for parallel execution, and dispatches them to remote specialist
//! agents over an agent-to-agent (A2A) request/response protocol.
//!
//! ## Overview
//!
//! A.R.E.S Research can be used in two ways:
//!
//! 1. **As a command-line tool** - Run the `ares-research` binary to print
//!    plans, execute them, or route single A2A messages
//! 2. **As a library** - Import the planner and dispatcher into your own
//!    orchestration service
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use ares_research::{
//!     AccessCredentials, PlanExecutor, PlanRequest, ResearchConfig, ResearchPlanner,
//!     TaskDispatcher,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ResearchConfig::load("ares-research.toml")?;
//!
//!     let planner = ResearchPlanner::new(&config.planning, AccessCredentials::from_env());
//!     let request: PlanRequest = serde_json::from_str(&std::fs::read_to_string("request.json")?)?;
//!     let plan = planner.create_plan(&request)?;
//!
//!     let dispatcher = Arc::new(TaskDispatcher::with_http(&config));
//!     let execution = PlanExecutor::new(dispatcher).execute(&plan).await?;
//!     println!("{} groups completed", execution.groups_completed);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`research`] - Source mapping, step decomposition and schedule optimization
//! - [`a2a`] - Task dispatch, message routing and plan execution
//! - [`types`] - Shared data model and error handling
//! - [`utils`] - TOML configuration and access credentials
//! - [`cli`] - Command-line parsing and terminal output

#![warn(rustdoc::missing_crate_level_docs)]

/// Agent-to-agent task dispatch and message routing.
pub mod a2a;
/// Command-line interface.
pub mod cli;
/// Research plan construction.
pub mod research;
/// Core types (plan model, A2A messages, errors).
pub mod types;
/// Configuration and credential utilities.
pub mod utils;

// Re-export commonly used types
pub use a2a::{
    AgentTransport, HttpTransport, MessageRouter, PlanExecution, PlanExecutor, RouteOutcome,
    TaskDispatcher, TaskHandler,
};
pub use research::{PlanRequest, ResearchPlan, ResearchPlanner};
pub use types::{AppError, Result};
pub use utils::credentials::AccessCredentials;
pub use utils::toml_config::{ResearchConfig, ResearchConfigManager};
