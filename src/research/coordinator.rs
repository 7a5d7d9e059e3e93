use crate::{
    research::{optimizer, planner::PlanBuilder, sources::SourceMapper},
    types::{
        DataSource, ExecutionSchedule, Methodology, ResearchDepth, ResearchDimension,
        ResearchStep, Result, SourceValidation,
    },
    utils::{credentials::AccessCredentials, toml_config::PlanningConfig},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Input for a planning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub topic: String,
    pub methodology: Methodology,
    #[serde(default)]
    pub depth: Option<ResearchDepth>,
    pub dimensions: Vec<ResearchDimension>,
}

/// A validated, time-estimated research plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchPlan {
    pub id: Uuid,
    pub topic: String,
    pub methodology: Methodology,
    pub depth: ResearchDepth,
    pub sources: Vec<DataSource>,
    pub source_validation: SourceValidation,
    pub steps: Vec<ResearchStep>,
    pub schedule: ExecutionSchedule,
    pub created_at: DateTime<Utc>,
}

impl ResearchPlan {
    pub fn step(&self, id: &str) -> Option<&ResearchStep> {
        self.steps.iter().find(|s| s.id == id)
    }
}

/// Runs source mapping, validation, decomposition and scheduling in order.
pub struct ResearchPlanner {
    mapper: SourceMapper,
    builder: PlanBuilder,
    credentials: AccessCredentials,
    default_depth: ResearchDepth,
}

impl ResearchPlanner {
    pub fn new(config: &PlanningConfig, credentials: AccessCredentials) -> Self {
        Self {
            mapper: SourceMapper::from_config(config),
            builder: PlanBuilder::new(),
            credentials,
            default_depth: config.default_depth,
        }
    }

    /// Build a complete plan for a request.
    ///
    /// Missing credentials are reported in `source_validation` but do not
    /// remove sources from the plan.
    pub fn create_plan(&self, request: &PlanRequest) -> Result<ResearchPlan> {
        let depth = request.depth.unwrap_or(self.default_depth);
        let methodology = request.methodology.as_str();

        let sources =
            self.mapper
                .identify_data_sources(&request.dimensions, &request.topic, methodology);
        let source_validation = self.mapper.validate_data_sources(&sources, &self.credentials);
        for issue in &source_validation.access_issues {
            tracing::warn!("{}", issue);
        }

        let steps = self.builder.decompose_into_steps(
            &request.topic,
            methodology,
            &sources,
            &request.dimensions,
            depth,
        )?;
        let schedule = optimizer::optimize_for_parallel_execution(&steps)?;

        let plan = ResearchPlan {
            id: Uuid::new_v4(),
            topic: request.topic.clone(),
            methodology: request.methodology.clone(),
            depth,
            sources,
            source_validation,
            steps,
            schedule,
            created_at: Utc::now(),
        };

        tracing::info!(
            plan_id = %plan.id,
            topic = %plan.topic,
            steps = plan.steps.len(),
            groups = plan.schedule.parallel_groups.len(),
            estimated_total_time = plan.schedule.estimated_total_time,
            "Research plan created"
        );

        Ok(plan)
    }
}
