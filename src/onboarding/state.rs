//! Onboarding step graph: which step the user is on and where it may go.

use serde::{Deserialize, Serialize};

/// The steps of the onboarding flow.
///
/// Progresses forward: Welcome → Role → Search → Legal → Identity →
/// VisualAssets → Socials → CoreActivation → Staff → Processing. Socials may
/// re-enter Search for a resync, and a resync returns to Socials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnboardingStep {
    Welcome,
    Role,
    Search,
    Legal,
    Identity,
    VisualAssets,
    Socials,
    CoreActivation,
    Staff,
    Processing,
}

impl OnboardingStep {
    /// All steps in forward order.
    pub const ALL: [OnboardingStep; 10] = [
        Self::Welcome,
        Self::Role,
        Self::Search,
        Self::Legal,
        Self::Identity,
        Self::VisualAssets,
        Self::Socials,
        Self::CoreActivation,
        Self::Staff,
        Self::Processing,
    ];

    /// Check if a forward transition from `self` to `target` is valid.
    ///
    /// Back actions are checked separately through [`previous`](Self::previous).
    pub fn can_transition_to(&self, target: OnboardingStep) -> bool {
        use OnboardingStep::*;
        matches!(
            (self, target),
            (Welcome, Role)
                | (Role, Search)
                | (Search, Legal)
                // Resync path: Socials → Search → Socials
                | (Search, Socials)
                | (Socials, Search)
                | (Legal, Identity)
                | (Identity, VisualAssets)
                | (VisualAssets, Socials)
                | (Socials, CoreActivation)
                | (CoreActivation, Staff)
                | (Staff, Processing)
        )
    }

    /// The step a "back" action returns to, if one is allowed.
    ///
    /// Nothing past Search can return to Welcome or Role, and Identity cannot
    /// return into the signed legal step.
    pub fn previous(&self) -> Option<OnboardingStep> {
        use OnboardingStep::*;
        match self {
            Role => Some(Welcome),
            Search => Some(Role),
            Legal => Some(Search),
            VisualAssets => Some(Identity),
            Socials => Some(VisualAssets),
            CoreActivation => Some(Socials),
            Staff => Some(CoreActivation),
            Welcome | Identity | Processing => None,
        }
    }

    /// The default next step in the forward progression, if any.
    pub fn next(&self) -> Option<OnboardingStep> {
        use OnboardingStep::*;
        match self {
            Welcome => Some(Role),
            Role => Some(Search),
            Search => Some(Legal),
            Legal => Some(Identity),
            Identity => Some(VisualAssets),
            VisualAssets => Some(Socials),
            Socials => Some(CoreActivation),
            CoreActivation => Some(Staff),
            Staff => Some(Processing),
            Processing => None,
        }
    }

    /// Whether the user interacts with this step (Processing runs on a timer).
    pub fn is_interactive(&self) -> bool {
        !matches!(self, Self::Processing)
    }

    /// Zero-based position used for progress indicators.
    pub fn position(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }
}

impl Default for OnboardingStep {
    fn default() -> Self {
        Self::Welcome
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::Role => "role",
            Self::Search => "search",
            Self::Legal => "legal",
            Self::Identity => "identity",
            Self::VisualAssets => "visual-assets",
            Self::Socials => "socials",
            Self::CoreActivation => "core-activation",
            Self::Staff => "staff",
            Self::Processing => "processing",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle of a flow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    /// The user is still moving through the steps.
    Active,
    /// Processing finished and the host received the payload.
    Completed,
    /// The flow was abandoned before completion.
    Dismissed,
}

impl FlowStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl std::fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Dismissed => write!(f, "dismissed"),
        }
    }
}
