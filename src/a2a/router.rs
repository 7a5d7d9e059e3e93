use crate::a2a::dispatcher::TaskHandler;
use crate::types::{A2AMessage, AppError, Result, TaskRequest, TaskResponse, TaskStatusReport};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Message types the router understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    TaskRequest,
    Cancel,
    Status,
}

impl MessageKind {
    pub fn from_type(message_type: &str) -> Option<Self> {
        match message_type {
            "task-request" => Some(Self::TaskRequest),
            "cancel" => Some(Self::Cancel),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

/// An inbound message after payload parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutedMessage {
    TaskRequest {
        agent_type: String,
        request: TaskRequest,
    },
    Cancel {
        task_id: String,
    },
    Status {
        task_id: String,
    },
    Malformed {
        kind: MessageKind,
        reason: String,
    },
    Unsupported {
        message_type: String,
    },
}

/// Result of routing one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum RouteOutcome {
    Response(TaskResponse),
    Cancelled { cancelled: bool },
    Status(TaskStatusReport),
    #[serde(rename_all = "camelCase")]
    Rejected { message_type: String, reason: String },
}

/// Parse an inbound message into the action it asks for.
///
/// Task requests go to the agent named in `to`. Cancel and status payloads
/// carry a string `taskId`.
pub fn classify(message: &A2AMessage) -> RoutedMessage {
    let Some(kind) = MessageKind::from_type(&message.message_type) else {
        return RoutedMessage::Unsupported {
            message_type: message.message_type.clone(),
        };
    };

    let malformed = |reason: String| RoutedMessage::Malformed { kind, reason };

    match kind {
        MessageKind::TaskRequest => {
            if message.to.trim().is_empty() {
                return malformed("task request has no target agent".to_string());
            }
            match serde_json::from_value::<TaskRequest>(message.payload.clone()) {
                Ok(request) if request.task_id.trim().is_empty() => {
                    malformed("taskId is empty".to_string())
                }
                Ok(request) => RoutedMessage::TaskRequest {
                    agent_type: message.to.clone(),
                    request,
                },
                Err(e) => malformed(e.to_string()),
            }
        }
        MessageKind::Cancel => match payload_task_id(&message.payload) {
            Some(task_id) => RoutedMessage::Cancel { task_id },
            None => malformed("payload has no string taskId".to_string()),
        },
        MessageKind::Status => match payload_task_id(&message.payload) {
            Some(task_id) => RoutedMessage::Status { task_id },
            None => malformed("payload has no string taskId".to_string()),
        },
    }
}

fn payload_task_id(payload: &Value) -> Option<String> {
    payload
        .get("taskId")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Routes inbound agent-to-agent messages to a task handler.
pub struct MessageRouter<H: TaskHandler + ?Sized> {
    handler: Arc<H>,
}

impl<H: TaskHandler + ?Sized> MessageRouter<H> {
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Route one message.
    ///
    /// Unknown types are rejected without error. A malformed task request is
    /// a validation error; malformed cancel and status messages resolve to
    /// "nothing cancelled" and "not found".
    pub async fn route_message(&self, message: &A2AMessage) -> Result<RouteOutcome> {
        tracing::debug!(
            message_id = %message.id,
            from = %message.from,
            to = %message.to,
            message_type = %message.message_type,
            "Routing message"
        );

        match classify(message) {
            RoutedMessage::TaskRequest {
                agent_type,
                request,
            } => self
                .handler
                .send_task(&agent_type, &request)
                .await
                .map(RouteOutcome::Response),
            RoutedMessage::Cancel { task_id } => Ok(RouteOutcome::Cancelled {
                cancelled: self.handler.cancel_task(&task_id),
            }),
            RoutedMessage::Status { task_id } => {
                Ok(RouteOutcome::Status(self.handler.check_task_status(&task_id)))
            }
            RoutedMessage::Malformed { kind, reason } => {
                tracing::warn!(
                    message_id = %message.id,
                    kind = ?kind,
                    reason = %reason,
                    "Malformed message"
                );
                match kind {
                    MessageKind::TaskRequest => Err(AppError::Validation(format!(
                        "Malformed task-request message '{}': {}",
                        message.id, reason
                    ))),
                    MessageKind::Cancel => Ok(RouteOutcome::Cancelled { cancelled: false }),
                    MessageKind::Status => Ok(RouteOutcome::Status(TaskStatusReport::NotFound)),
                }
            }
            RoutedMessage::Unsupported { message_type } => {
                tracing::warn!(
                    message_id = %message.id,
                    message_type = %message_type,
                    "Rejected unsupported message type"
                );
                Ok(RouteOutcome::Rejected {
                    reason: format!("Unsupported message type '{}'", message_type),
                    message_type,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2a::dispatcher::MockTaskHandler;
    use crate::types::TaskStatus;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::HashMap;

    fn message(message_type: &str, to: &str, payload: Value) -> A2AMessage {
        A2AMessage {
            id: "msg-1".to_string(),
            from: "coordinator".to_string(),
            to: to.to_string(),
            message_type: message_type.to_string(),
            payload,
            timestamp: Utc::now(),
        }
    }

    fn response(task_id: &str) -> TaskResponse {
        TaskResponse {
            task_id: task_id.to_string(),
            status: TaskStatus::Success,
            result: Some(json!({"findings": 3})),
            error: None,
            processing_time_ms: Some(12),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn test_classify() {
        let routed = classify(&message(
            "task-request",
            "web-researcher",
            json!({"taskId": "t1", "type": "research-step"}),
        ));
        assert!(matches!(
            routed,
            RoutedMessage::TaskRequest { ref agent_type, ref request }
                if agent_type == "web-researcher" && request.task_id == "t1"
        ));

        assert_eq!(
            classify(&message("cancel", "x", json!({"taskId": "t9"}))),
            RoutedMessage::Cancel {
                task_id: "t9".to_string()
            }
        );
        assert!(matches!(
            classify(&message("status", "x", json!({"taskId": 4}))),
            RoutedMessage::Malformed {
                kind: MessageKind::Status,
                ..
            }
        ));
        assert_eq!(
            classify(&message("heartbeat", "x", Value::Null)),
            RoutedMessage::Unsupported {
                message_type: "heartbeat".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_task_request_delegates_to_handler() {
        let mut handler = MockTaskHandler::new();
        handler
            .expect_send_task()
            .withf(|agent_type, request| agent_type == "web-researcher" && request.task_id == "t1")
            .times(1)
            .returning(|_, request| Ok(response(&request.task_id)));

        let router = MessageRouter::new(Arc::new(handler));
        let outcome = router
            .route_message(&message(
                "task-request",
                "web-researcher",
                json!({"taskId": "t1", "type": "research-step", "parameters": {"topic": "AI"}}),
            ))
            .await
            .unwrap();

        assert_eq!(outcome, RouteOutcome::Response(response("t1")));
    }

    #[tokio::test]
    async fn test_handler_errors_propagate() {
        let mut handler = MockTaskHandler::new();
        handler
            .expect_send_task()
            .returning(|_, _| Err(AppError::Transport("connection refused".to_string())));

        let router = MessageRouter::new(Arc::new(handler));
        let err = router
            .route_message(&message(
                "task-request",
                "web-researcher",
                json!({"taskId": "t1", "type": "research-step"}),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Transport(_)));
    }

    #[tokio::test]
    async fn test_cancel_and_status() {
        let mut handler = MockTaskHandler::new();
        handler
            .expect_cancel_task()
            .withf(|task_id| task_id == "t1")
            .return_const(true);
        handler
            .expect_check_task_status()
            .withf(|task_id| task_id == "t1")
            .returning(|_| TaskStatusReport::Pending {
                agent_type: "web-researcher".to_string(),
                elapsed_ms: 40,
            });

        let router = MessageRouter::new(Arc::new(handler));

        assert_eq!(
            router
                .route_message(&message("cancel", "web-researcher", json!({"taskId": "t1"})))
                .await
                .unwrap(),
            RouteOutcome::Cancelled { cancelled: true }
        );
        assert!(matches!(
            router
                .route_message(&message("status", "web-researcher", json!({"taskId": "t1"})))
                .await
                .unwrap(),
            RouteOutcome::Status(TaskStatusReport::Pending { elapsed_ms: 40, .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_type_is_rejected_not_an_error() {
        let handler = MockTaskHandler::new();
        let router = MessageRouter::new(Arc::new(handler));

        let outcome = router
            .route_message(&message("heartbeat", "web-researcher", json!({})))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            RouteOutcome::Rejected { ref message_type, .. } if message_type == "heartbeat"
        ));
    }

    #[tokio::test]
    async fn test_malformed_messages() {
        // No expectations: the handler must not be called
        let handler = MockTaskHandler::new();
        let router = MessageRouter::new(Arc::new(handler));

        let err = router
            .route_message(&message("task-request", "web-researcher", json!({"type": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = router
            .route_message(&message(
                "task-request",
                "",
                json!({"taskId": "t1", "type": "research-step"}),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert_eq!(
            router
                .route_message(&message("cancel", "web-researcher", json!("t1")))
                .await
                .unwrap(),
            RouteOutcome::Cancelled { cancelled: false }
        );
        assert_eq!(
            router
                .route_message(&message("status", "web-researcher", json!({})))
                .await
                .unwrap(),
            RouteOutcome::Status(TaskStatusReport::NotFound)
        );
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(RouteOutcome::Rejected {
            message_type: "heartbeat".to_string(),
            reason: "Unsupported message type 'heartbeat'".to_string(),
        })
        .unwrap();

        assert_eq!(json["outcome"], "rejected");
        assert_eq!(json["messageType"], "heartbeat");
    }
}
