//! Artist onboarding: typed onboarding workflow for new music accounts.

pub mod config;
pub mod error;
pub mod onboarding;
