//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::onboarding::legal::LegalDocument;
use crate::onboarding::processing::default_status_messages;
use crate::onboarding::staff::{StaffMember, default_roster};

/// Search proxy connection settings.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Base URL of the search proxy, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Sent as `x-api-key` when present.
    pub api_key: Option<SecretString>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl SearchConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }
}

/// Onboarding flow configuration.
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    /// Identity images required to leave the visual-assets step.
    pub min_identity_images: usize,
    /// Identity images kept at most; extra uploads are dropped.
    pub max_identity_images: usize,
    /// Interval between processing status messages.
    pub processing_tick: Duration,
    /// Status messages shown during processing, in order.
    pub processing_messages: Vec<String>,
    /// AI staff offered at the staff step.
    pub staff_roster: Vec<StaffMember>,
    /// Candidates kept from a single search.
    pub max_search_results: usize,
    /// Document presented at the legal step.
    pub legal_document: LegalDocument,
    /// Search proxy, if one is configured.
    pub search: Option<SearchConfig>,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            min_identity_images: 3,
            max_identity_images: 12,
            processing_tick: Duration::from_secs(1),
            processing_messages: default_status_messages(),
            staff_roster: default_roster(),
            max_search_results: 10,
            legal_document: LegalDocument::services_agreement(),
            search: None,
        }
    }
}

impl OnboardingConfig {
    /// Build from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys keep their defaults.
    ///
    /// - `ONBOARD_SEARCH_URL`: search proxy base URL
    /// - `ONBOARD_SEARCH_API_KEY`: search proxy key
    /// - `ONBOARD_PROCESSING_TICK_MS`: processing interval in milliseconds
    /// - `ONBOARD_MAX_SEARCH_RESULTS`: candidates kept per search
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("ONBOARD_SEARCH_URL").filter(|v| !v.trim().is_empty()) {
            let mut search = SearchConfig::new(url.trim());
            if let Some(key) = lookup("ONBOARD_SEARCH_API_KEY").filter(|v| !v.is_empty()) {
                search = search.with_api_key(key);
            }
            config.search = Some(search);
        }

        if let Some(ms) = lookup("ONBOARD_PROCESSING_TICK_MS") {
            let ms: u64 = parse_value("ONBOARD_PROCESSING_TICK_MS", &ms)?;
            if ms == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "ONBOARD_PROCESSING_TICK_MS".to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
            config.processing_tick = Duration::from_millis(ms);
        }

        if let Some(n) = lookup("ONBOARD_MAX_SEARCH_RESULTS") {
            config.max_search_results = parse_value("ONBOARD_MAX_SEARCH_RESULTS", &n)?;
        }

        Ok(config)
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })
}
