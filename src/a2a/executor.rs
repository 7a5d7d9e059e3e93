use crate::a2a::dispatcher::TaskDispatcher;
use crate::research::ResearchPlan;
use crate::types::{AppError, Result, ResearchStep, TaskRequest, TaskResponse, TaskStatus};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub const RESEARCH_STEP_TASK: &str = "research-step";

/// Outcome of running a plan's parallel groups.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanExecution {
    pub plan_id: Uuid,
    /// Step id and response, in dispatch order
    pub responses: Vec<(String, TaskResponse)>,
    pub groups_completed: usize,
    /// First step that reported `failure`; later groups were not dispatched
    pub halted_at: Option<String>,
}

impl PlanExecution {
    pub fn is_complete(&self) -> bool {
        self.halted_at.is_none()
    }

    pub fn response(&self, step_id: &str) -> Option<&TaskResponse> {
        self.responses
            .iter()
            .find(|(id, _)| id == step_id)
            .map(|(_, r)| r)
    }
}

/// Dispatches a plan group by group, each group as one parallel batch.
pub struct PlanExecutor {
    dispatcher: Arc<TaskDispatcher>,
}

impl PlanExecutor {
    pub fn new(dispatcher: Arc<TaskDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Run every group in order.
    ///
    /// A dispatch error aborts the run and is returned. A step whose agent
    /// answers with status `failure` completes its group but stops later
    /// groups from being dispatched.
    pub async fn execute(&self, plan: &ResearchPlan) -> Result<PlanExecution> {
        let mut execution = PlanExecution {
            plan_id: plan.id,
            responses: Vec::with_capacity(plan.steps.len()),
            groups_completed: 0,
            halted_at: None,
        };

        for (index, group) in plan.schedule.parallel_groups.iter().enumerate() {
            let batch = group
                .iter()
                .map(|step_id| {
                    let step = plan.step(step_id).ok_or_else(|| {
                        AppError::Configuration(format!(
                            "Schedule references unknown step '{}'",
                            step_id
                        ))
                    })?;
                    Ok((step.agent_type.clone(), step_request(plan, step)))
                })
                .collect::<Result<Vec<_>>>()?;

            tracing::info!(
                plan_id = %plan.id,
                group = index,
                steps = batch.len(),
                "Dispatching group"
            );

            let responses = self.dispatcher.send_parallel_tasks(&batch).await?;
            execution.groups_completed += 1;

            for (step_id, response) in group.iter().zip(responses) {
                if response.status == TaskStatus::Failure && execution.halted_at.is_none() {
                    tracing::warn!(
                        plan_id = %plan.id,
                        step_id = %step_id,
                        error = response.error.as_deref().unwrap_or("unspecified"),
                        "Step failed"
                    );
                    execution.halted_at = Some(step_id.clone());
                }
                execution.responses.push((step_id.clone(), response));
            }

            if execution.halted_at.is_some() {
                break;
            }
        }

        Ok(execution)
    }
}

/// Task id of a step within a plan: `<plan id>:<step id>`
pub fn step_task_id(plan_id: &Uuid, step_id: &str) -> String {
    format!("{}:{}", plan_id, step_id)
}

fn step_request(plan: &ResearchPlan, step: &ResearchStep) -> TaskRequest {
    TaskRequest::new(step_task_id(&plan.id, &step.id), RESEARCH_STEP_TASK)
        .with_param("topic", json!(plan.topic))
        .with_param("methodology", json!(plan.methodology.as_str()))
        .with_param("depth", json!(plan.depth.as_str()))
        .with_metadata("planId", json!(plan.id.to_string()))
        .with_metadata("dependencies", json!(step.dependencies))
        .with_step(step.clone())
}
