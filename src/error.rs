//! Error types for the onboarding flow.

use std::time::Duration;

use crate::onboarding::state::OnboardingStep;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Signature error: {0}")]
    Sign(#[from] SignError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors returned by controller operations.
///
/// Every variant leaves the session untouched; a UI maps them to disabled
/// controls or inline hints. None of them reach the host callbacks.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition {
        from: OnboardingStep,
        to: OnboardingStep,
    },

    #[error("Operation requires step {expected}, current step is {actual}")]
    WrongStep {
        expected: OnboardingStep,
        actual: OnboardingStep,
    },

    #[error("At least {required} identity images are required, {have} provided")]
    NotEnoughImages { have: usize, required: usize },

    #[error("No role selected")]
    RoleNotSelected,

    #[error("Legal agreement has not been signed")]
    LegalNotSigned,

    #[error("Legal document must be read to the end before signing")]
    DocumentNotRead,

    #[error("Signature must be longer than {min} characters")]
    SignatureTooShort { min: usize },

    #[error("Signing failed: {0}")]
    SigningFailed(#[from] SignError),

    #[error("No search candidate at index {index}")]
    UnknownCandidate { index: usize },

    #[error("Unknown staff member: {id}")]
    UnknownStaff { id: String },

    #[error("No identity image at index {index}")]
    UnknownImage { index: usize },

    #[error("Onboarding flow is already {status}")]
    FlowClosed { status: String },
}

/// External profile search errors.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Request(String),

    #[error("Search service returned {status}")]
    Status { status: u16 },

    #[error("Search request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Invalid search response: {0}")]
    InvalidResponse(String),
}

/// Legal signature collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("Signature rejected: {0}")]
    Rejected(String),

    #[error("Signature service unavailable: {0}")]
    Unavailable(String),
}

/// Identity image read errors.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file type for {name}: {mime_type}")]
    UnsupportedType { name: String, mime_type: String },

    #[error("File {name} is empty")]
    Empty { name: String },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
