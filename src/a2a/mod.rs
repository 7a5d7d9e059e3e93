//! Agent-to-Agent Dispatch
//!
//! Sends research tasks to remote specialist agents, tracks them while they
//! are in flight, and routes inbound agent messages.
//!
//! # Architecture
//!
//! - [`transport`] - The wire boundary; [`transport::HttpTransport`] posts
//!   JSON to `{endpoint}/tasks`
//! - [`dispatcher::TaskDispatcher`] - Timeouts, cancellation, response
//!   validation and the pending-task registry
//! - [`router::MessageRouter`] - Maps `task-request`, `cancel` and `status`
//!   messages onto a [`dispatcher::TaskHandler`]
//! - [`executor::PlanExecutor`] - Runs a plan's parallel groups in order

pub mod dispatcher;
pub mod executor;
pub mod router;
pub mod transport;

pub use dispatcher::{validate_task_response, TaskDispatcher, TaskHandler};
pub use executor::{PlanExecution, PlanExecutor};
pub use router::{MessageRouter, RouteOutcome};
pub use transport::{AgentTransport, HttpTransport};
