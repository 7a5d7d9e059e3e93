use crate::types::SourceType;
use serde::{Deserialize, Serialize};

pub const ACADEMIC_API_KEY: &str = "ACADEMIC_API_KEY";
pub const NEWS_API_KEY: &str = "NEWS_API_KEY";
pub const STATISTICAL_API_KEY: &str = "STATISTICAL_API_KEY";

/// Which gated source types the current deployment can reach.
///
/// Only presence is recorded; credential values are never inspected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCredentials {
    pub has_academic_access: bool,
    pub has_news_access: bool,
    pub has_statistical_access: bool,
}

impl AccessCredentials {
    /// Every gated source type is reachable
    pub fn all() -> Self {
        Self {
            has_academic_access: true,
            has_news_access: true,
            has_statistical_access: true,
        }
    }

    /// Resolve presence from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve presence through an arbitrary lookup; empty values count as absent
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name: &str| lookup(name).is_some_and(|value| !value.trim().is_empty());
        Self {
            has_academic_access: present(ACADEMIC_API_KEY),
            has_news_access: present(NEWS_API_KEY),
            has_statistical_access: present(STATISTICAL_API_KEY),
        }
    }

    /// Credential a source type needs, if any
    pub fn required_credential(kind: SourceType) -> Option<&'static str> {
        match kind {
            SourceType::Academic => Some(ACADEMIC_API_KEY),
            SourceType::News => Some(NEWS_API_KEY),
            SourceType::Statistical => Some(STATISTICAL_API_KEY),
            SourceType::Web | SourceType::Government | SourceType::Expert => None,
        }
    }

    pub fn allows(&self, kind: SourceType) -> bool {
        match kind {
            SourceType::Academic => self.has_academic_access,
            SourceType::News => self.has_news_access,
            SourceType::Statistical => self.has_statistical_access,
            SourceType::Web | SourceType::Government | SourceType::Expert => true,
        }
    }
}
