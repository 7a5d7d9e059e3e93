//! Data-source selection
//!
//! Maps weighted research dimensions onto a ranked list of candidate data
//! sources and checks which of them the deployment can actually reach.

use crate::types::{
    DataSource, Methodology, ResearchDimension, SourceType, SourceValidation, Volume,
};
use crate::utils::credentials::AccessCredentials;
use crate::utils::toml_config::PlanningConfig;
use std::collections::HashMap;

/// Priority offset applied to supplementary sources
const SUPPLEMENTARY_PENALTY: u32 = 5;

/// Credibility discount applied to supplementary sources
const SUPPLEMENTARY_DISCOUNT: f32 = 0.9;

/// Ranks data sources for a set of research dimensions.
#[derive(Debug, Clone)]
pub struct SourceMapper {
    min_relevance: f32,
    supplementary_relevance: f32,
}

impl Default for SourceMapper {
    fn default() -> Self {
        Self::from_config(&PlanningConfig::default())
    }
}

impl SourceMapper {
    pub fn new(min_relevance: f32, supplementary_relevance: f32) -> Self {
        Self {
            min_relevance,
            supplementary_relevance,
        }
    }

    pub fn from_config(config: &PlanningConfig) -> Self {
        Self::new(config.min_relevance, config.supplementary_relevance)
    }

    /// Map dimensions to a prioritized list of data sources.
    ///
    /// Only dimensions whose relevance exceeds the minimum threshold
    /// contribute. Each source type appears once, at the best priority any
    /// dimension gives it. The result is sorted by ascending priority; equal
    /// priorities keep the order in which their dimensions were supplied.
    pub fn identify_data_sources(
        &self,
        dimensions: &[ResearchDimension],
        topic: &str,
        methodology: &str,
    ) -> Vec<DataSource> {
        let methodology = Methodology::from(methodology);
        let mut ranked = RankedSources::default();

        for dimension in dimensions {
            if !dimension.relevance.is_finite() || dimension.relevance <= self.min_relevance {
                continue;
            }
            let relevance = dimension.relevance.clamp(0.0, 1.0);
            let base_priority = dimension.priority.rank() * 10
                + ((1.0 - relevance) * 9.0).round() as u32;

            ranked.offer(
                DataSource {
                    kind: dimension.kind,
                    priority: base_priority,
                    credibility_weight: credibility(dimension.kind, relevance),
                    estimated_volume: estimated_volume(dimension.kind, &methodology),
                },
                true,
            );

            if relevance >= self.supplementary_relevance {
                if let Some(extra) = supplementary_source(dimension.kind) {
                    ranked.offer(
                        DataSource {
                            kind: extra,
                            priority: base_priority + SUPPLEMENTARY_PENALTY,
                            credibility_weight: (credibility(extra, relevance)
                                * SUPPLEMENTARY_DISCOUNT)
                                .clamp(0.0, 1.0),
                            estimated_volume: estimated_volume(extra, &methodology),
                        },
                        false,
                    );
                }
            }
        }

        let mut sources = ranked.sources;
        // sort_by_key is stable, so ties keep first-seen order
        sources.sort_by_key(|source| source.priority);

        tracing::debug!(
            topic = topic,
            methodology = %methodology,
            dimensions = dimensions.len(),
            sources = sources.len(),
            "Identified data sources"
        );

        sources
    }

    /// Split sources into those whose credentials are present and those
    /// whose credentials are missing.
    pub fn validate_data_sources(
        &self,
        sources: &[DataSource],
        credentials: &AccessCredentials,
    ) -> SourceValidation {
        let mut validation = SourceValidation::default();

        for source in sources {
            if credentials.allows(source.kind) {
                validation.valid_sources.push(source.clone());
                continue;
            }

            let credential =
                AccessCredentials::required_credential(source.kind).unwrap_or("access credential");
            validation.access_issues.push(format!(
                "{} source requires {} which is not configured",
                source.kind, credential
            ));
            validation.invalid_sources.push(source.clone());
        }

        validation
    }
}

/// One entry per source type. A type offered again replaces the kept entry
/// when it ranks better, or ties with it and comes straight from a dimension
/// rather than as a supplement.
#[derive(Debug, Default)]
struct RankedSources {
    sources: Vec<DataSource>,
    /// Slot in `sources` and whether that entry is direct
    slots: HashMap<SourceType, (usize, bool)>,
}

impl RankedSources {
    fn offer(&mut self, candidate: DataSource, direct: bool) {
        match self.slots.get_mut(&candidate.kind) {
            Some((slot, kept_direct)) => {
                let kept = &mut self.sources[*slot];
                let better = candidate.priority < kept.priority
                    || (candidate.priority == kept.priority && direct && !*kept_direct);
                if better {
                    *kept = candidate;
                    *kept_direct = direct;
                }
            }
            None => {
                self.slots
                    .insert(candidate.kind, (self.sources.len(), direct));
                self.sources.push(candidate);
            }
        }
    }
}

/// Secondary source type worth consulting for a highly relevant dimension
fn supplementary_source(kind: SourceType) -> Option<SourceType> {
    match kind {
        SourceType::Web => Some(SourceType::News),
        SourceType::Statistical => Some(SourceType::Government),
        SourceType::Government => Some(SourceType::Statistical),
        SourceType::Expert => Some(SourceType::Academic),
        SourceType::Academic | SourceType::News => None,
    }
}

fn base_credibility(kind: SourceType) -> f32 {
    match kind {
        SourceType::Academic => 0.90,
        SourceType::Government => 0.85,
        SourceType::Statistical => 0.85,
        SourceType::Expert => 0.80,
        SourceType::News => 0.70,
        SourceType::Web => 0.60,
    }
}

fn credibility(kind: SourceType, relevance: f32) -> f32 {
    (base_credibility(kind) * (0.5 + 0.5 * relevance)).clamp(0.0, 1.0)
}

fn estimated_volume(kind: SourceType, methodology: &Methodology) -> Volume {
    match methodology {
        Methodology::Systematic => match kind {
            SourceType::Academic | SourceType::Statistical => Volume::High,
            _ => Volume::Medium,
        },
        Methodology::Exploratory => match kind {
            SourceType::Web | SourceType::News => Volume::High,
            _ => Volume::Medium,
        },
        Methodology::CaseStudy => match kind {
            SourceType::Expert => Volume::Medium,
            _ => Volume::Low,
        },
        Methodology::Comparative | Methodology::Other(_) => Volume::Medium,
    }
}
