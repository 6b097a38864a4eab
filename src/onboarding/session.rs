//! In-memory onboarding session and the per-step stage it is paired with.
//!
//! `OnboardingSession` accumulates what the user has entered so far. `Stage`
//! is the current step together with the data that only matters while that
//! step is on screen (search results, the legal form, the finalized inputs
//! for processing).

use chrono::Utc;
use tracing::warn;

use crate::error::OnboardingError;

use super::legal::LegalAgreement;
use super::model::{
    ArtistRole, Candidate, IdentityImage, LegalSignature, SearchFormat, SocialLinks,
    UserProfileUpdate,
};
use super::staff::{StaffMember, StaffSelection};
use super::state::OnboardingStep;

/// Everything collected during a flow. Lives only until finalization.
#[derive(Debug, Clone)]
pub struct OnboardingSession {
    role: Option<ArtistRole>,
    selected_profile: Option<Candidate>,
    pub bio: String,
    pub location: String,
    identity_images: Vec<IdentityImage>,
    pub social_links: SocialLinks,
    pub staff: StaffSelection,
    legal: Option<LegalSignature>,
}

impl OnboardingSession {
    pub fn new(roster: Vec<StaffMember>) -> Self {
        Self {
            role: None,
            selected_profile: None,
            bio: String::new(),
            location: String::new(),
            identity_images: Vec::new(),
            social_links: SocialLinks::new(),
            staff: StaffSelection::new(roster),
            legal: None,
        }
    }

    pub fn role(&self) -> Option<ArtistRole> {
        self.role
    }

    pub(crate) fn set_role(&mut self, role: ArtistRole) {
        self.role = Some(role);
    }

    pub fn selected_profile(&self) -> Option<&Candidate> {
        self.selected_profile.as_ref()
    }

    pub fn legal_signed(&self) -> bool {
        self.legal.is_some()
    }

    pub fn legal_signature(&self) -> Option<&LegalSignature> {
        self.legal.as_ref()
    }

    pub(crate) fn record_signature(&mut self, signature: LegalSignature) {
        self.legal = Some(signature);
    }

    pub fn identity_images(&self) -> &[IdentityImage] {
        &self.identity_images
    }

    /// Seed identity fields from a chosen search candidate.
    ///
    /// The bio is only replaced while it is empty or still the text seeded
    /// from the previous candidate; a bio the user wrote is kept.
    pub fn apply_candidate(&mut self, candidate: &Candidate) {
        let previous_seed = self.selected_profile.as_ref().map(Candidate::seeded_bio);
        if self.bio.trim().is_empty() || previous_seed.as_deref() == Some(self.bio.as_str()) {
            self.bio = candidate.seeded_bio();
        }
        self.social_links
            .set_raw(candidate.source.seeded_platform(), candidate.identifier.clone());
        self.selected_profile = Some(candidate.clone());
    }

    /// Append images up to `max`. Returns how many were kept.
    pub fn add_images(&mut self, images: Vec<IdentityImage>, max: usize) -> usize {
        let room = max.saturating_sub(self.identity_images.len());
        let offered = images.len();
        let kept = offered.min(room);
        self.identity_images.extend(images.into_iter().take(kept));
        if kept < offered {
            warn!(
                dropped = offered - kept,
                max, "Identity image limit reached, dropping extra uploads"
            );
        }
        kept
    }

    pub fn remove_image(&mut self, index: usize) -> Result<IdentityImage, OnboardingError> {
        if index >= self.identity_images.len() {
            return Err(OnboardingError::UnknownImage { index });
        }
        Ok(self.identity_images.remove(index))
    }

    /// Build the host payload. Consumes the session.
    pub(crate) fn into_update(self, finalized: &ProcessingStage) -> UserProfileUpdate {
        let signature = finalized.signature();
        UserProfileUpdate {
            role: finalized.role(),
            artist_name: self.selected_profile.as_ref().map(|c| c.name.clone()),
            bio: self.bio,
            location: self.location,
            identity_assets: self.identity_images,
            active_staff_ids: self.staff.selected_ids(),
            social_links: self.social_links,
            linked_profile: self.selected_profile,
            legal_signature: signature.signature.clone(),
            legal_signed_at: signature.signed_at,
            onboarding_completed: true,
            tour_completed: false,
            onboarding_completed_at: Utc::now(),
        }
    }
}

/// Search step state.
#[derive(Debug, Clone, Default)]
pub struct SearchStage {
    pub format: SearchFormat,
    pub query: String,
    pub results: Vec<Candidate>,
    /// Entered from socials; leaving returns to socials instead of legal.
    pub resync: bool,
}

impl SearchStage {
    pub fn new(resync: bool) -> Self {
        Self {
            resync,
            ..Default::default()
        }
    }

    /// Switch between artist and channel search. Clears the previous query.
    pub fn change_format(&mut self, format: SearchFormat) {
        if self.format != format {
            self.format = format;
            self.query.clear();
            self.results.clear();
        }
    }
}

/// Inputs frozen when the user enters processing.
///
/// Only constructible from a session with a role and a legal signature, so a
/// flow in processing always has both.
#[derive(Debug, Clone)]
pub struct ProcessingStage {
    role: ArtistRole,
    signature: LegalSignature,
}

impl ProcessingStage {
    pub fn begin(session: &OnboardingSession) -> Result<Self, OnboardingError> {
        let role = session.role.ok_or(OnboardingError::RoleNotSelected)?;
        let signature = session
            .legal
            .clone()
            .ok_or(OnboardingError::LegalNotSigned)?;
        Ok(Self { role, signature })
    }

    pub fn role(&self) -> ArtistRole {
        self.role
    }

    pub fn signature(&self) -> &LegalSignature {
        &self.signature
    }
}

/// The current step plus its step-local data.
#[derive(Debug, Clone)]
pub enum Stage {
    Welcome,
    Role,
    Search(SearchStage),
    Legal(LegalAgreement),
    Identity,
    VisualAssets,
    Socials,
    CoreActivation,
    Staff,
    Processing(ProcessingStage),
}

impl Stage {
    pub fn step(&self) -> OnboardingStep {
        match self {
            Self::Welcome => OnboardingStep::Welcome,
            Self::Role => OnboardingStep::Role,
            Self::Search(_) => OnboardingStep::Search,
            Self::Legal(_) => OnboardingStep::Legal,
            Self::Identity => OnboardingStep::Identity,
            Self::VisualAssets => OnboardingStep::VisualAssets,
            Self::Socials => OnboardingStep::Socials,
            Self::CoreActivation => OnboardingStep::CoreActivation,
            Self::Staff => OnboardingStep::Staff,
            Self::Processing(_) => OnboardingStep::Processing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::legal::LegalDocument;
    use crate::onboarding::model::{Audience, SocialPlatform};
    use crate::onboarding::staff::default_roster;

    fn session() -> OnboardingSession {
        OnboardingSession::new(default_roster())
    }

    fn image(n: usize) -> IdentityImage {
        IdentityImage::from_data_uri(format!("data:image/png;base64,{n}"))
    }

    fn signature() -> LegalSignature {
        LegalSignature {
            signature: "Alex Rivera".to_string(),
            signed_at: Utc::now(),
        }
    }

    #[test]
    fn processing_requires_role_and_signature() {
        let mut s = session();
        assert!(matches!(
            ProcessingStage::begin(&s),
            Err(OnboardingError::RoleNotSelected)
        ));
        s.set_role(ArtistRole::IndividualArtist);
        assert!(matches!(
            ProcessingStage::begin(&s),
            Err(OnboardingError::LegalNotSigned)
        ));
        s.record_signature(signature());
        let stage = ProcessingStage::begin(&s).unwrap();
        assert_eq!(stage.role(), ArtistRole::IndividualArtist);
    }

    #[test]
    fn apply_candidate_seeds_bio_and_link() {
        let mut s = session();
        let candidate = Candidate {
            name: "Nova Lane".to_string(),
            image: None,
            audience: Audience::Followers(900),
            identifier: "spotify:artist:4Z8W4fKeB5YxbusRsdQVPb".to_string(),
            source: SearchFormat::Artist,
        };
        s.apply_candidate(&candidate);
        assert!(s.bio.contains("Nova Lane"));
        assert_eq!(
            s.social_links.get(SocialPlatform::Spotify),
            Some("spotify:artist:4Z8W4fKeB5YxbusRsdQVPb")
        );
        assert_eq!(s.selected_profile(), Some(&candidate));
    }

    #[test]
    fn apply_candidate_keeps_user_written_bio() {
        let mut s = session();
        let first = Candidate {
            name: "Nova Lane".to_string(),
            image: None,
            audience: Audience::Followers(900),
            identifier: "4Z8W4fKeB5YxbusRsdQVPb".to_string(),
            source: SearchFormat::Artist,
        };
        let second = Candidate {
            name: "Nova Lane Trio".to_string(),
            identifier: "1dfeR4HaWDbWqFHLkxsg1d".to_string(),
            ..first.clone()
        };

        s.apply_candidate(&first);
        s.apply_candidate(&second);
        assert!(s.bio.contains("Nova Lane Trio"), "untouched seed is refreshed");

        s.bio = "Bedroom pop from Lisbon".to_string();
        s.apply_candidate(&first);
        assert_eq!(s.bio, "Bedroom pop from Lisbon");
        assert_eq!(
            s.social_links.get(SocialPlatform::Spotify),
            Some("4Z8W4fKeB5YxbusRsdQVPb")
        );
        assert_eq!(s.selected_profile(), Some(&first));
    }

    #[test]
    fn images_are_capped() {
        let mut s = session();
        assert_eq!(s.add_images((0..10).map(image).collect(), 12), 10);
        assert_eq!(s.add_images((10..15).map(image).collect(), 12), 2);
        assert_eq!(s.identity_images().len(), 12);
        assert_eq!(s.identity_images()[11], image(11));
    }

    #[test]
    fn remove_image_by_index() {
        let mut s = session();
        s.add_images((0..3).map(image).collect(), 12);
        assert_eq!(s.remove_image(1).unwrap(), image(1));
        assert_eq!(s.identity_images(), &[image(0), image(2)]);
        assert!(matches!(
            s.remove_image(5),
            Err(OnboardingError::UnknownImage { index: 5 })
        ));
    }

    #[test]
    fn change_format_clears_results() {
        let mut stage = SearchStage::new(false);
        stage.query = "nova".to_string();
        stage.change_format(SearchFormat::Artist);
        assert_eq!(stage.query, "nova", "same format keeps the query");
        stage.change_format(SearchFormat::Channel);
        assert!(stage.query.is_empty());
        assert_eq!(stage.format, SearchFormat::Channel);
    }

    #[test]
    fn update_carries_collected_fields() {
        let mut s = session();
        s.set_role(ArtistRole::LabelOperator);
        s.record_signature(signature());
        s.location = "Lagos".to_string();
        s.add_images((0..3).map(image).collect(), 12);
        s.staff.toggle("tour-manager").unwrap();
        let finalized = ProcessingStage::begin(&s).unwrap();

        let update = s.into_update(&finalized);
        assert_eq!(update.role, ArtistRole::LabelOperator);
        assert!(update.onboarding_completed);
        assert!(!update.tour_completed);
        assert_eq!(update.identity_assets.len(), 3);
        assert_eq!(update.location, "Lagos");
        assert_eq!(update.legal_signature, "Alex Rivera");
        assert!(!update.active_staff_ids.contains(&"tour-manager".to_string()));
        assert!(update.artist_name.is_none());
    }

    #[test]
    fn stage_reports_step() {
        let legal = Stage::Legal(LegalAgreement::new(LegalDocument::services_agreement()));
        assert_eq!(legal.step(), OnboardingStep::Legal);
        assert_eq!(Stage::Search(SearchStage::new(true)).step(), OnboardingStep::Search);
        assert_eq!(Stage::Welcome.step(), OnboardingStep::Welcome);
    }
}
