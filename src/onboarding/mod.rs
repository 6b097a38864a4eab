//! Onboarding flow: first-run wizard for new artist and label accounts.
//!
//! The flow walks a user through role selection, an optional external profile
//! link, the legal agreement, identity details, reference photos, social
//! links, core activation, and AI staff selection. A short timed processing
//! sequence then hands the collected fields back to the host application.

pub mod assets;
pub mod controller;
pub mod legal;
pub mod model;
pub mod processing;
pub mod search;
pub mod session;
pub mod staff;
pub mod state;

pub use assets::{FileSource, InMemoryFile, PathFile};
pub use controller::{
    DismissHandle, OnboardingController, OnboardingDeps, OnboardingEvent, OnboardingHost,
    OnboardingSnapshot,
};
pub use legal::{LegalAgreement, LegalDocument, LegalSigner};
pub use model::{
    ArtistRole, Audience, Candidate, IdentityImage, LegalSignature, Mission, SearchFormat,
    SocialLinks, SocialPlatform, UserProfileUpdate, needs_onboarding,
};
pub use search::{CandidateStream, HttpProfileSearch, ProfileSearch};
pub use session::{OnboardingSession, Stage};
pub use staff::{StaffMember, StaffSelection};
pub use state::{FlowStatus, OnboardingStep};
