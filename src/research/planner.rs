//! Step decomposition
//!
//! Expands a topic, methodology and source set into the four-phase step
//! graph (prep → research → analysis → validation). Each step may only depend
//! on steps already added to the graph, so the output is acyclic by
//! construction.

use crate::types::{
    AppError, DataSource, Methodology, ResearchDepth, ResearchDimension, ResearchStep, Result,
    SourceType,
};
use std::collections::{HashMap, HashSet};

const PLANNER_AGENT: &str = "research-planner";
const SYNTHESIS_AGENT: &str = "synthesis-analyst";
const VALIDATION_AGENT: &str = "fact-checker";

/// Append-only step list that rejects duplicate ids and dependencies on
/// steps it has not seen yet.
#[derive(Debug, Default)]
struct StepGraph {
    steps: Vec<ResearchStep>,
    ids: HashSet<String>,
}

impl StepGraph {
    fn push(&mut self, step: ResearchStep) -> Result<()> {
        if self.ids.contains(&step.id) {
            return Err(AppError::Configuration(format!(
                "Step '{}' was emitted twice",
                step.id
            )));
        }
        if let Some(missing) = step.dependencies.iter().find(|d| !self.ids.contains(*d)) {
            return Err(AppError::Configuration(format!(
                "Step '{}' depends on '{}' which was not created before it",
                step.id, missing
            )));
        }
        self.ids.insert(step.id.clone());
        self.steps.push(step);
        Ok(())
    }

    fn priority_of(&self, ids: &[String]) -> u32 {
        self.steps
            .iter()
            .filter(|s| ids.contains(&s.id))
            .map(|s| s.priority)
            .min()
            .unwrap_or(1)
    }

    fn into_steps(self) -> Vec<ResearchStep> {
        self.steps
    }
}

/// Builds dependency-ordered research steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanBuilder;

impl PlanBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Decompose a research request into prep, research, analysis and
    /// validation steps.
    ///
    /// Zero sources still yields the prep steps and a plan review, so callers
    /// always receive a non-empty plan.
    pub fn decompose_into_steps(
        &self,
        topic: &str,
        methodology: &str,
        sources: &[DataSource],
        dimensions: &[ResearchDimension],
        depth: ResearchDepth,
    ) -> Result<Vec<ResearchStep>> {
        let methodology = Methodology::from(methodology);
        let scale = duration_scale(depth);
        let mut graph = StepGraph::default();

        // ---- prep ----
        let prep_ids = vec!["prep-scope".to_string(), "prep-access".to_string()];
        graph.push(ResearchStep {
            id: prep_ids[0].clone(),
            description: format!(
                "Define scope, key questions and {} approach for \"{}\"",
                methodology, topic
            ),
            agent_type: PLANNER_AGENT.to_string(),
            dependencies: vec![],
            estimated_duration: 1.0,
            success_criteria: format!("Research questions for \"{}\" agreed and bounded", topic),
            fallback_strategies: vec!["Narrow the topic to its most relevant dimension".to_string()],
            priority: 1,
        })?;
        graph.push(ResearchStep {
            id: prep_ids[1].clone(),
            description: format!("Acquire access to {} candidate data sources", sources.len()),
            agent_type: "data-acquisition".to_string(),
            dependencies: vec![],
            estimated_duration: 0.5 + 0.25 * sources.len() as f64,
            success_criteria: "Every selected source reachable or explicitly waived".to_string(),
            fallback_strategies: vec![
                "Substitute ungated sources for unreachable ones".to_string(),
            ],
            priority: 1,
        })?;

        let included = &sources[..sources.len().min(max_sources(depth))];
        if included.is_empty() {
            graph.push(ResearchStep {
                id: "validation-plan-review".to_string(),
                description: format!(
                    "Review the scope for \"{}\"; no data source qualified",
                    topic
                ),
                agent_type: VALIDATION_AGENT.to_string(),
                dependencies: prep_ids,
                estimated_duration: 0.5,
                success_criteria: "Scope revised or the request rejected with a reason"
                    .to_string(),
                fallback_strategies: vec!["Lower the dimension relevance threshold".to_string()],
                priority: 1,
            })?;
            tracing::debug!(topic = topic, "No qualifying sources; emitted minimal plan");
            return Ok(graph.into_steps());
        }

        // ---- research ----
        let mut research_ids = Vec::with_capacity(included.len());
        let mut quantitative_ids = Vec::new();
        let mut occurrences: HashMap<SourceType, usize> = HashMap::new();
        for source in included {
            let occurrence = occurrences.entry(source.kind).or_insert(0);
            *occurrence += 1;
            let id = match *occurrence {
                1 => format!("research-{}", source.kind),
                n => format!("research-{}-{}", source.kind, n),
            };
            graph.push(ResearchStep {
                id: id.clone(),
                description: format!("Collect {} evidence on \"{}\"", source.kind, topic),
                agent_type: source.kind.agent_type().to_string(),
                dependencies: prep_ids.clone(),
                estimated_duration: source.estimated_volume.effort() * scale,
                success_criteria: format!(
                    "{} findings recorded with citations (credibility ≥ {:.2})",
                    source.kind, source.credibility_weight
                ),
                fallback_strategies: research_fallbacks(source.kind),
                priority: source.priority,
            })?;
            if matches!(source.kind, SourceType::Statistical | SourceType::Government) {
                quantitative_ids.push(id.clone());
            }
            research_ids.push(id);
        }

        // ---- analysis ----
        let mut analysis: Vec<(&str, String, Vec<String>, f64)> = vec![(
            "analysis-synthesis",
            format!("Synthesize findings across all sources on \"{}\"", topic),
            research_ids.clone(),
            1.5,
        )];
        match methodology {
            Methodology::Comparative => analysis.push((
                "analysis-comparative",
                "Compare positions and outcomes across sources".to_string(),
                research_ids.clone(),
                1.5,
            )),
            Methodology::Systematic => analysis.push((
                "analysis-quality-assessment",
                "Grade evidence quality and risk of bias".to_string(),
                research_ids.clone(),
                1.0,
            )),
            Methodology::Exploratory => analysis.push((
                "analysis-trends",
                "Identify emerging themes and open questions".to_string(),
                research_ids.clone(),
                1.0,
            )),
            Methodology::CaseStudy => analysis.push((
                "analysis-case-patterns",
                "Extract recurring patterns across cases".to_string(),
                research_ids.clone(),
                1.0,
            )),
            Methodology::Other(_) => {}
        }
        if depth == ResearchDepth::Comprehensive {
            if !quantitative_ids.is_empty() {
                analysis.push((
                    "analysis-quantitative",
                    "Run quantitative analysis on statistical and government data".to_string(),
                    quantitative_ids,
                    2.0,
                ));
            }
            analysis.push((
                "analysis-dimension-coverage",
                format!(
                    "Check coverage of {} research dimensions against findings",
                    dimensions.len()
                ),
                research_ids.clone(),
                0.5 + 0.25 * dimensions.len() as f64,
            ));
        }

        let mut analysis_ids = Vec::with_capacity(analysis.len());
        for (id, description, dependencies, effort) in analysis {
            let priority = graph.priority_of(&dependencies);
            graph.push(ResearchStep {
                id: id.to_string(),
                description,
                agent_type: SYNTHESIS_AGENT.to_string(),
                dependencies,
                estimated_duration: effort * scale,
                success_criteria: format!("Analysis supports conclusions about \"{}\"", topic),
                fallback_strategies: vec![
                    "Report partial analysis with explicit gaps".to_string(),
                ],
                priority,
            })?;
            analysis_ids.push(id.to_string());
        }

        // ---- validation ----
        let validation_priority = graph.priority_of(&analysis_ids).saturating_sub(1).max(1);
        graph.push(ResearchStep {
            id: "validation-fact-check".to_string(),
            description: "Cross-check key claims against independent sources".to_string(),
            agent_type: VALIDATION_AGENT.to_string(),
            dependencies: analysis_ids.clone(),
            estimated_duration: 1.0 * scale,
            success_criteria: "Every key claim traced to at least two sources".to_string(),
            fallback_strategies: vec![
                "Flag unverifiable claims instead of dropping them".to_string(),
            ],
            priority: validation_priority,
        })?;
        if depth == ResearchDepth::Comprehensive {
            graph.push(ResearchStep {
                id: "validation-peer-review".to_string(),
                description: format!("Independent review of the {} analysis", methodology),
                agent_type: "quality-reviewer".to_string(),
                dependencies: analysis_ids,
                estimated_duration: 1.5 * scale,
                success_criteria: "Reviewer sign-off with no unresolved objections".to_string(),
                fallback_strategies: vec!["Escalate disputed findings".to_string()],
                priority: validation_priority,
            })?;
        }

        let steps = graph.into_steps();
        tracing::debug!(
            topic = topic,
            depth = %depth,
            steps = steps.len(),
            "Decomposed research into steps"
        );
        Ok(steps)
    }
}

fn max_sources(depth: ResearchDepth) -> usize {
    match depth {
        ResearchDepth::Surface => 2,
        ResearchDepth::Medium => 4,
        ResearchDepth::Comprehensive => usize::MAX,
    }
}

fn duration_scale(depth: ResearchDepth) -> f64 {
    match depth {
        ResearchDepth::Surface => 0.5,
        ResearchDepth::Medium => 1.0,
        ResearchDepth::Comprehensive => 1.5,
    }
}

fn research_fallbacks(kind: SourceType) -> Vec<String> {
    let mut fallbacks = vec!["Broaden search terms".to_string()];
    match kind {
        SourceType::Academic => fallbacks.push("Use preprint servers".to_string()),
        SourceType::Statistical | SourceType::Government => {
            fallbacks.push("Use the most recent published aggregates".to_string())
        }
        SourceType::News | SourceType::Web => {
            fallbacks.push("Restrict to established outlets".to_string())
        }
        SourceType::Expert => fallbacks.push("Use published interviews".to_string()),
    }
    fallbacks
}
