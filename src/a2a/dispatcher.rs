//! Task dispatch to remote specialist agents
//!
//! The dispatcher owns the pending-task registry. An entry exists exactly
//! while its remote call is in flight: it is inserted before the call and
//! removed on success, failure, timeout, cancellation, or when the caller
//! drops the future.

use crate::a2a::transport::{AgentTransport, HttpTransport};
use crate::types::{AppError, Result, TaskRequest, TaskResponse, TaskStatusReport};
use crate::utils::toml_config::{AgentEndpointConfig, ResearchConfig};
use async_trait::async_trait;
use futures::future::{join_all, try_join_all};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Notify, Semaphore};

/// Operations the message router delegates to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn send_task(&self, agent_type: &str, request: &TaskRequest) -> Result<TaskResponse>;
    fn cancel_task(&self, task_id: &str) -> bool;
    fn check_task_status(&self, task_id: &str) -> TaskStatusReport;
}

#[derive(Debug)]
struct PendingTask {
    /// Distinguishes this registration from a later one reusing the task id
    ticket: u64,
    agent_type: String,
    started_at: Instant,
    cancel: Arc<Notify>,
}

type Registry = Mutex<HashMap<String, PendingTask>>;

/// Removes its registry entry on drop, unless the entry has since been
/// replaced by a newer registration.
struct PendingGuard<'a> {
    registry: &'a Registry,
    task_id: String,
    ticket: u64,
}

impl PendingGuard<'_> {
    /// Remove this registration. Returns false when it was already gone,
    /// which only happens when `cancel_task` took it.
    fn release(&self) -> bool {
        let mut pending = self.registry.lock();
        if pending
            .get(&self.task_id)
            .is_some_and(|entry| entry.ticket == self.ticket)
        {
            pending.remove(&self.task_id);
            true
        } else {
            false
        }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Sends task requests to remote agents and tracks them until they settle.
pub struct TaskDispatcher {
    transport: Arc<dyn AgentTransport>,
    agents: HashMap<String, AgentEndpointConfig>,
    default_timeout: Duration,
    pending: Registry,
    next_ticket: AtomicU64,
    permits: Arc<Semaphore>,
}

impl TaskDispatcher {
    pub fn new(config: &ResearchConfig, transport: Arc<dyn AgentTransport>) -> Self {
        Self {
            transport,
            agents: config.agents.clone(),
            default_timeout: config.dispatch.default_timeout(),
            pending: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(1),
            permits: Arc::new(Semaphore::new(config.dispatch.max_concurrent_tasks.max(1))),
        }
    }

    /// Create a dispatcher that talks HTTP to the configured agents
    pub fn with_http(config: &ResearchConfig) -> Self {
        Self::new(config, Arc::new(HttpTransport::new()))
    }

    /// Send one task and wait for its validated response.
    ///
    /// Fails with `InvalidInput` if the task id is already pending, `NotFound`
    /// for an unconfigured agent type, `Transport`, `Timeout`, `Cancelled`, or
    /// `InvalidResponse` when the body is not a well-formed `TaskResponse`
    /// for this task.
    pub async fn send_task(&self, agent_type: &str, request: &TaskRequest) -> Result<TaskResponse> {
        let (guard, cancel) = self.register(agent_type, &request.task_id)?;
        let started = Instant::now();

        let mut outcome = self.call(agent_type, request, &cancel).await;
        if !guard.release() {
            // Cancelled after the exchange settled; the cancel wins
            outcome = Err(AppError::Cancelled(request.task_id.clone()));
        }

        match &outcome {
            Ok(response) => tracing::info!(
                task_id = %request.task_id,
                agent_type = agent_type,
                status = %response.status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Task completed"
            ),
            Err(e) => tracing::warn!(
                task_id = %request.task_id,
                agent_type = agent_type,
                error = %e,
                "Task failed"
            ),
        }

        outcome
    }

    /// Dispatch all tasks concurrently; results follow input order.
    ///
    /// Fail-fast: the first error is returned, the batch's other in-flight
    /// calls are dropped and all of its registry entries are removed.
    pub async fn send_parallel_tasks(
        &self,
        tasks: &[(String, TaskRequest)],
    ) -> Result<Vec<TaskResponse>> {
        tracing::debug!(batch = tasks.len(), "Dispatching task batch");
        try_join_all(
            tasks
                .iter()
                .map(|(agent_type, request)| self.send_task(agent_type, request)),
        )
        .await
    }

    /// Dispatch all tasks concurrently and report every outcome, in input order.
    pub async fn send_parallel_tasks_settled(
        &self,
        tasks: &[(String, TaskRequest)],
    ) -> Vec<Result<TaskResponse>> {
        join_all(
            tasks
                .iter()
                .map(|(agent_type, request)| self.send_task(agent_type, request)),
        )
        .await
    }

    /// Current registry state for a task id
    pub fn check_task_status(&self, task_id: &str) -> TaskStatusReport {
        match self.pending.lock().get(task_id) {
            Some(entry) => TaskStatusReport::Pending {
                agent_type: entry.agent_type.clone(),
                elapsed_ms: entry.started_at.elapsed().as_millis() as u64,
            },
            None => TaskStatusReport::NotFound,
        }
    }

    /// Cancel a pending task. The in-flight call is abandoned and its
    /// `send_task` resolves to `Cancelled`, even if the agent had already
    /// answered. Returns whether anything was cancelled.
    pub fn cancel_task(&self, task_id: &str) -> bool {
        let removed = self.pending.lock().remove(task_id);
        match removed {
            Some(entry) => {
                entry.cancel.notify_one();
                tracing::info!(task_id = task_id, "Task cancelled");
                true
            }
            None => false,
        }
    }

    /// Number of tasks currently in flight
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    fn register(&self, agent_type: &str, task_id: &str) -> Result<(PendingGuard<'_>, Arc<Notify>)> {
        let mut pending = self.pending.lock();
        if pending.contains_key(task_id) {
            return Err(AppError::InvalidInput(format!(
                "Task '{}' is already pending",
                task_id
            )));
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let cancel = Arc::new(Notify::new());
        pending.insert(
            task_id.to_string(),
            PendingTask {
                ticket,
                agent_type: agent_type.to_string(),
                started_at: Instant::now(),
                cancel: Arc::clone(&cancel),
            },
        );

        Ok((
            PendingGuard {
                registry: &self.pending,
                task_id: task_id.to_string(),
                ticket,
            },
            cancel,
        ))
    }

    async fn call(
        &self,
        agent_type: &str,
        request: &TaskRequest,
        cancel: &Notify,
    ) -> Result<TaskResponse> {
        let endpoint = self.agents.get(agent_type).ok_or_else(|| {
            AppError::NotFound(format!(
                "No endpoint configured for agent type '{}'",
                agent_type
            ))
        })?;

        let timeout = if request.timeout_ms > 0 {
            Duration::from_millis(request.timeout_ms)
        } else {
            endpoint
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(self.default_timeout)
        };

        let exchange = async {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| AppError::Internal("Dispatcher is shut down".to_string()))?;
            let body = self.transport.send(endpoint, request).await?;
            parse_task_response(&request.task_id, &body)
        };

        tokio::select! {
            biased;
            _ = cancel.notified() => Err(AppError::Cancelled(request.task_id.clone())),
            result = tokio::time::timeout(timeout, exchange) => match result {
                Ok(outcome) => outcome,
                Err(_) => Err(AppError::Timeout(
                    request.task_id.clone(),
                    timeout.as_millis() as u64,
                )),
            },
        }
    }
}

#[async_trait]
impl TaskHandler for TaskDispatcher {
    async fn send_task(&self, agent_type: &str, request: &TaskRequest) -> Result<TaskResponse> {
        TaskDispatcher::send_task(self, agent_type, request).await
    }

    fn cancel_task(&self, task_id: &str) -> bool {
        TaskDispatcher::cancel_task(self, task_id)
    }

    fn check_task_status(&self, task_id: &str) -> TaskStatusReport {
        TaskDispatcher::check_task_status(self, task_id)
    }
}

/// Structural check of an untrusted response payload.
///
/// The payload must be an object with a string `taskId` and otherwise
/// deserialize as a `TaskResponse`.
pub fn validate_task_response(value: &Value) -> std::result::Result<TaskResponse, String> {
    let object = value
        .as_object()
        .ok_or_else(|| "response body is not a JSON object".to_string())?;

    match object.get("taskId") {
        Some(Value::String(_)) => {}
        Some(_) => return Err("taskId is not a string".to_string()),
        None => return Err("taskId is missing".to_string()),
    }

    serde_json::from_value(value.clone()).map_err(|e| e.to_string())
}

fn parse_task_response(expected_task_id: &str, body: &str) -> Result<TaskResponse> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| AppError::InvalidResponse(format!("body is not JSON: {}", e)))?;
    let response = validate_task_response(&value).map_err(AppError::InvalidResponse)?;

    if response.task_id != expected_task_id {
        return Err(AppError::InvalidResponse(format!(
            "expected taskId '{}', got '{}'",
            expected_task_id, response.task_id
        )));
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskStatus;
    use serde_json::json;
    use std::sync::{OnceLock, Weak};

    /// Transport that answers from a script, after an optional per-task delay.
    struct ScriptedTransport {
        delays_ms: HashMap<String, u64>,
        bodies: HashMap<String, String>,
    }

    impl ScriptedTransport {
        fn new() -> Self {
            Self {
                delays_ms: HashMap::new(),
                bodies: HashMap::new(),
            }
        }

        fn respond(mut self, task_id: &str, delay_ms: u64, body: Value) -> Self {
            self.delays_ms.insert(task_id.to_string(), delay_ms);
            self.bodies.insert(task_id.to_string(), body.to_string());
            self
        }
    }

    #[async_trait]
    impl AgentTransport for ScriptedTransport {
        async fn send(
            &self,
            _endpoint: &AgentEndpointConfig,
            request: &TaskRequest,
        ) -> Result<String> {
            let delay = self.delays_ms.get(&request.task_id).copied().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.bodies
                .get(&request.task_id)
                .cloned()
                .ok_or_else(|| AppError::Transport("connection refused".to_string()))
        }
    }

    /// Transport that cancels its own task and then answers successfully.
    #[derive(Default)]
    struct CancelOnSendTransport {
        dispatcher: OnceLock<Weak<TaskDispatcher>>,
    }

    #[async_trait]
    impl AgentTransport for CancelOnSendTransport {
        async fn send(
            &self,
            _endpoint: &AgentEndpointConfig,
            request: &TaskRequest,
        ) -> Result<String> {
            if let Some(dispatcher) = self.dispatcher.get().and_then(Weak::upgrade) {
                assert!(dispatcher.cancel_task(&request.task_id));
            }
            Ok(ok_body(&request.task_id).to_string())
        }
    }

    fn config() -> ResearchConfig {
        let mut config = ResearchConfig::default();
        config.agents.insert(
            "web-researcher".to_string(),
            AgentEndpointConfig::new("http://localhost:9"),
        );
        config
    }

    fn ok_body(task_id: &str) -> Value {
        json!({"taskId": task_id, "status": "success", "processingTime": 5})
    }

    fn dispatcher(transport: ScriptedTransport) -> Arc<TaskDispatcher> {
        Arc::new(TaskDispatcher::new(&config(), Arc::new(transport)))
    }

    #[test]
    fn test_validate_task_response() {
        assert!(validate_task_response(&ok_body("t1")).is_ok());
        assert_eq!(
            validate_task_response(&json!({"status": "success"})).unwrap_err(),
            "taskId is missing"
        );
        assert_eq!(
            validate_task_response(&json!({"taskId": 7, "status": "success"})).unwrap_err(),
            "taskId is not a string"
        );
        assert!(validate_task_response(&json!("t1")).is_err());
        assert!(validate_task_response(&json!({"taskId": "t1", "status": "exploded"})).is_err());
    }

    #[tokio::test]
    async fn test_send_task_success_clears_registry() {
        let dispatcher = dispatcher(ScriptedTransport::new().respond("t1", 0, ok_body("t1")));

        let response = dispatcher
            .send_task("web-researcher", &TaskRequest::new("t1", "research-step"))
            .await
            .unwrap();

        assert_eq!(response.task_id, "t1");
        assert_eq!(response.status, TaskStatus::Success);
        assert_eq!(response.processing_time_ms, Some(5));
        assert!(dispatcher.check_task_status("t1").is_not_found());
    }

    #[tokio::test]
    async fn test_invalid_response_clears_registry() {
        let dispatcher = dispatcher(
            ScriptedTransport::new().respond("t1", 0, json!({"status": "success"})),
        );

        let err = dispatcher
            .send_task("web-researcher", &TaskRequest::new("t1", "research-step"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidResponse(_)));
        assert!(err.to_string().to_lowercase().contains("invalid response"));
        assert!(dispatcher.check_task_status("t1").is_not_found());
    }

    #[tokio::test]
    async fn test_mismatched_task_id_is_invalid() {
        let dispatcher = dispatcher(ScriptedTransport::new().respond("t1", 0, ok_body("other")));

        let err = dispatcher
            .send_task("web-researcher", &TaskRequest::new("t1", "research-step"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidResponse(msg) if msg.contains("other")));
    }

    #[tokio::test]
    async fn test_unknown_agent_type() {
        let dispatcher = dispatcher(ScriptedTransport::new());

        let err = dispatcher
            .send_task("oracle", &TaskRequest::new("t1", "research-step"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_timeout_clears_registry() {
        let dispatcher = dispatcher(ScriptedTransport::new().respond("slow", 5_000, ok_body("slow")));
        let request = TaskRequest::new("slow", "research-step").with_timeout_ms(20);

        let err = dispatcher
            .send_task("web-researcher", &request)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Timeout(id, 20) if id == "slow"));
        assert!(dispatcher.check_task_status("slow").is_not_found());
    }

    #[tokio::test]
    async fn test_status_while_pending_and_cancel() {
        let dispatcher = dispatcher(ScriptedTransport::new().respond("t1", 5_000, ok_body("t1")));

        let worker = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                dispatcher
                    .send_task("web-researcher", &TaskRequest::new("t1", "research-step"))
                    .await
            })
        };

        // Wait until the call is registered
        for _ in 0..100 {
            if !dispatcher.check_task_status("t1").is_not_found() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        match dispatcher.check_task_status("t1") {
            TaskStatusReport::Pending { agent_type, .. } => assert_eq!(agent_type, "web-researcher"),
            TaskStatusReport::NotFound => panic!("task should be pending"),
        }

        assert!(dispatcher.cancel_task("t1"));
        assert!(!dispatcher.cancel_task("t1"));

        let result = tokio::time::timeout(Duration::from_secs(1), worker)
            .await
            .expect("cancelled call should resolve promptly")
            .unwrap();
        assert!(matches!(result, Err(AppError::Cancelled(id)) if id == "t1"));
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_after_answer_still_cancels() {
        let transport = Arc::new(CancelOnSendTransport::default());
        let dispatcher = Arc::new(TaskDispatcher::new(
            &config(),
            Arc::clone(&transport) as Arc<dyn AgentTransport>,
        ));
        transport
            .dispatcher
            .set(Arc::downgrade(&dispatcher))
            .unwrap();

        let result = dispatcher
            .send_task("web-researcher", &TaskRequest::new("t1", "research-step"))
            .await;

        assert!(matches!(result, Err(AppError::Cancelled(id)) if id == "t1"));
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_unknown_task() {
        let dispatcher = dispatcher(ScriptedTransport::new());
        assert!(!dispatcher.cancel_task("nope"));
    }

    #[tokio::test]
    async fn test_duplicate_pending_id_rejected() {
        let dispatcher = dispatcher(ScriptedTransport::new().respond("t1", 200, ok_body("t1")));

        let first = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                dispatcher
                    .send_task("web-researcher", &TaskRequest::new("t1", "research-step"))
                    .await
            })
        };
        for _ in 0..100 {
            if dispatcher.pending_count() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let err = dispatcher
            .send_task("web-researcher", &TaskRequest::new("t1", "research-step"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        // The original registration survives the rejected duplicate
        assert!(!dispatcher.check_task_status("t1").is_not_found());

        assert!(first.await.unwrap().is_ok());
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_parallel_results_follow_input_order() {
        let dispatcher = dispatcher(
            ScriptedTransport::new()
                .respond("t1", 80, ok_body("t1"))
                .respond("t2", 5, ok_body("t2")),
        );
        let batch = vec![
            ("web-researcher".to_string(), TaskRequest::new("t1", "research-step")),
            ("web-researcher".to_string(), TaskRequest::new("t2", "research-step")),
        ];

        let responses = dispatcher.send_parallel_tasks(&batch).await.unwrap();

        let ids: Vec<&str> = responses.iter().map(|r| r.task_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_parallel_fail_fast_cleans_batch() {
        let dispatcher = dispatcher(
            ScriptedTransport::new()
                .respond("slow", 5_000, ok_body("slow"))
                .respond("bad", 10, json!({"nope": true})),
        );
        let batch = vec![
            ("web-researcher".to_string(), TaskRequest::new("slow", "research-step")),
            ("web-researcher".to_string(), TaskRequest::new("bad", "research-step")),
        ];

        let err = tokio::time::timeout(
            Duration::from_secs(1),
            dispatcher.send_parallel_tasks(&batch),
        )
        .await
        .expect("fail-fast batch should not wait for the slow task")
        .unwrap_err();

        assert!(matches!(err, AppError::InvalidResponse(_)));
        assert!(dispatcher.check_task_status("slow").is_not_found());
        assert!(dispatcher.check_task_status("bad").is_not_found());
    }

    #[tokio::test]
    async fn test_settled_reports_each_outcome() {
        let dispatcher = dispatcher(ScriptedTransport::new().respond("ok", 0, ok_body("ok")));
        let batch = vec![
            ("web-researcher".to_string(), TaskRequest::new("missing", "research-step")),
            ("web-researcher".to_string(), TaskRequest::new("ok", "research-step")),
        ];

        let results = dispatcher.send_parallel_tasks_settled(&batch).await;

        assert!(matches!(results[0], Err(AppError::Transport(_))));
        assert_eq!(results[1].as_ref().unwrap().task_id, "ok");
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let mut config = config();
        config.dispatch.max_concurrent_tasks = 1;
        let transport = ScriptedTransport::new()
            .respond("a", 60, ok_body("a"))
            .respond("b", 60, ok_body("b"));
        let dispatcher = TaskDispatcher::new(&config, Arc::new(transport));
        let batch = vec![
            ("web-researcher".to_string(), TaskRequest::new("a", "research-step")),
            ("web-researcher".to_string(), TaskRequest::new("b", "research-step")),
        ];

        let started = Instant::now();
        dispatcher.send_parallel_tasks(&batch).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(120));
    }
}
