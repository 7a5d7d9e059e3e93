use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ============= Research Input Types =============

/// Category of research interest, shared by dimensions and data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Academic,
    Web,
    Statistical,
    News,
    Government,
    Expert,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Academic => "academic",
            SourceType::Web => "web",
            SourceType::Statistical => "statistical",
            SourceType::News => "news",
            SourceType::Government => "government",
            SourceType::Expert => "expert",
        }
    }

    /// Remote specialist agent that handles research against this source type
    pub fn agent_type(&self) -> &'static str {
        match self {
            SourceType::Academic => "academic-researcher",
            SourceType::Web => "web-researcher",
            SourceType::Statistical => "data-analyst",
            SourceType::News => "news-analyst",
            SourceType::Government => "government-researcher",
            SourceType::Expert => "expert-consultant",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    Low,
    Medium,
    High,
}

impl PriorityTier {
    /// Rank used for source priorities; lower is more urgent
    pub fn rank(&self) -> u32 {
        match self {
            PriorityTier::High => 1,
            PriorityTier::Medium => 2,
            PriorityTier::Low => 3,
        }
    }
}

/// A weighted category of research interest supplied with a planning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchDimension {
    #[serde(rename = "type")]
    pub kind: SourceType,
    pub relevance: f32,
    pub priority: PriorityTier,
}

impl ResearchDimension {
    pub fn new(kind: SourceType, relevance: f32, priority: PriorityTier) -> Self {
        Self {
            kind,
            relevance,
            priority,
        }
    }
}

/// Research methodology. Known values steer source volume and analysis steps;
/// anything else is carried through as opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Methodology {
    Systematic,
    Comparative,
    Exploratory,
    CaseStudy,
    Other(String),
}

impl Methodology {
    pub fn as_str(&self) -> &str {
        match self {
            Methodology::Systematic => "systematic",
            Methodology::Comparative => "comparative",
            Methodology::Exploratory => "exploratory",
            Methodology::CaseStudy => "case-study",
            Methodology::Other(name) => name,
        }
    }
}

impl From<&str> for Methodology {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().replace('_', "-").as_str() {
            "systematic" => Methodology::Systematic,
            "comparative" => Methodology::Comparative,
            "exploratory" => Methodology::Exploratory,
            "case-study" | "casestudy" => Methodology::CaseStudy,
            _ => Methodology::Other(value.trim().to_string()),
        }
    }
}

impl From<String> for Methodology {
    fn from(value: String) -> Self {
        Methodology::from(value.as_str())
    }
}

impl From<Methodology> for String {
    fn from(value: Methodology) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Methodology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How deep a research plan goes. Scales step count and duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchDepth {
    Surface,
    #[default]
    Medium,
    Comprehensive,
}

impl ResearchDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchDepth::Surface => "surface",
            ResearchDepth::Medium => "medium",
            ResearchDepth::Comprehensive => "comprehensive",
        }
    }
}

impl FromStr for ResearchDepth {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "surface" | "shallow" => Ok(ResearchDepth::Surface),
            "medium" => Ok(ResearchDepth::Medium),
            "comprehensive" | "deep" => Ok(ResearchDepth::Comprehensive),
            other => Err(AppError::InvalidInput(format!(
                "Unknown research depth '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ResearchDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============= Plan Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volume {
    Low,
    Medium,
    High,
}

impl Volume {
    pub fn as_str(&self) -> &'static str {
        match self {
            Volume::Low => "low",
            Volume::Medium => "medium",
            Volume::High => "high",
        }
    }

    /// Base research effort in time units
    pub fn effort(&self) -> f64 {
        match self {
            Volume::Low => 1.0,
            Volume::Medium => 2.0,
            Volume::High => 3.0,
        }
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked, credibility-weighted candidate information channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    #[serde(rename = "type")]
    pub kind: SourceType,
    /// Lower is more urgent
    pub priority: u32,
    pub credibility_weight: f32,
    pub estimated_volume: Volume,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceValidation {
    pub valid_sources: Vec<DataSource>,
    pub invalid_sources: Vec<DataSource>,
    pub access_issues: Vec<String>,
}

/// An atomic unit of planned work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchStep {
    pub id: String,
    pub description: String,
    pub agent_type: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub estimated_duration: f64,
    #[serde(default)]
    pub success_criteria: String,
    #[serde(default)]
    pub fallback_strategies: Vec<String>,
    #[serde(default)]
    pub priority: u32,
}

/// Parallel groups, critical path and makespan for a step set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSchedule {
    pub parallel_groups: Vec<Vec<String>>,
    pub critical_path: Vec<String>,
    pub estimated_total_time: f64,
}

// ============= A2A Types =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub task_id: String,
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub priority: u32,
    /// Milliseconds; zero means "use the configured default"
    #[serde(rename = "timeout", default)]
    pub timeout_ms: u64,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<ResearchStep>,
}

impl TaskRequest {
    pub fn new(task_id: impl Into<String>, task_type: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            task_type: task_type.into(),
            parameters: HashMap::new(),
            priority: 0,
            timeout_ms: 0,
            metadata: HashMap::new(),
            step: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_step(mut self, step: ResearchStep) -> Self {
        self.priority = step.priority;
        self.step = Some(step);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    Failure,
    Partial,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Success => "success",
            TaskStatus::Failure => "failure",
            TaskStatus::Partial => "partial",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(
        rename = "processingTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub processing_time_ms: Option<u64>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Inbound protocol envelope. The payload is untrusted until classified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct A2AMessage {
    pub id: String,
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Registry view of a task id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum TaskStatusReport {
    #[serde(rename_all = "camelCase")]
    Pending { agent_type: String, elapsed_ms: u64 },
    NotFound,
}

impl TaskStatusReport {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TaskStatusReport::NotFound)
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Task '{0}' timed out after {1}ms")]
    Timeout(String, u64),

    #[error("Task '{0}' was cancelled")]
    Cancelled(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dimension_uses_type_field() {
        let dim: ResearchDimension = serde_json::from_value(json!({
            "type": "academic",
            "relevance": 0.9,
            "priority": "high"
        }))
        .unwrap();

        assert_eq!(dim.kind, SourceType::Academic);
        assert_eq!(dim.priority, PriorityTier::High);
    }

    #[test]
    fn test_methodology_parsing() {
        assert_eq!(Methodology::from("Systematic"), Methodology::Systematic);
        assert_eq!(Methodology::from("case_study"), Methodology::CaseStudy);
        assert_eq!(
            Methodology::from("grounded theory"),
            Methodology::Other("grounded theory".to_string())
        );
        assert_eq!(Methodology::CaseStudy.to_string(), "case-study");
    }

    #[test]
    fn test_depth_parsing() {
        assert_eq!(
            "comprehensive".parse::<ResearchDepth>().unwrap(),
            ResearchDepth::Comprehensive
        );
        assert_eq!(" Medium ".parse::<ResearchDepth>().unwrap(), ResearchDepth::Medium);
        assert!(matches!(
            "bottomless".parse::<ResearchDepth>(),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_display_names_match_wire_names() {
        for volume in [Volume::Low, Volume::Medium, Volume::High] {
            assert_eq!(json!(volume), json!(volume.to_string()));
        }
        for status in [
            TaskStatus::Success,
            TaskStatus::Failure,
            TaskStatus::Partial,
            TaskStatus::Cancelled,
        ] {
            assert_eq!(json!(status), json!(status.as_str()));
        }
    }

    #[test]
    fn test_task_request_wire_names() {
        let request = TaskRequest::new("t-1", "research-step")
            .with_timeout_ms(500)
            .with_param("topic", json!("AI"));
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["taskId"], "t-1");
        assert_eq!(value["type"], "research-step");
        assert_eq!(value["timeout"], 500);
        assert_eq!(value["parameters"]["topic"], "AI");
        assert!(value.get("step").is_none());
    }

    #[test]
    fn test_status_report_serialization() {
        let report = TaskStatusReport::Pending {
            agent_type: "web-researcher".to_string(),
            elapsed_ms: 12,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["state"], "pending");
        assert_eq!(value["agentType"], "web-researcher");

        let value = serde_json::to_value(TaskStatusReport::NotFound).unwrap();
        assert_eq!(value["state"], "not-found");
    }

    #[test]
    fn test_error_messages_name_failure_class() {
        let err = AppError::InvalidResponse("missing taskId".to_string());
        assert!(err.to_string().to_lowercase().contains("invalid response"));

        let err = AppError::Timeout("t-9".to_string(), 250);
        assert_eq!(err.to_string(), "Task 't-9' timed out after 250ms");
    }
}
