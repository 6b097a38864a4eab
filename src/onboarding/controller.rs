//! OnboardingController: drives a single flow instance from welcome to the
//! host callback.
//!
//! The controller owns the session and the current stage. Host code calls one
//! operation per user action; operations that are not allowed on the current
//! step return an error and leave everything unchanged. The only awaits are
//! the search and signature collaborators, file reads, and the processing
//! timer. A dismissal observed after any of them discards the late result.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::OnboardingConfig;
use crate::error::OnboardingError;

use super::assets::{FileSource, read_selection};
use super::legal::{LegalAgreement, LegalSigner};
use super::model::{
    ArtistRole, Candidate, Mission, SearchFormat, SocialPlatform, UserProfileUpdate,
    favorite_views_for, missions_for,
};
use super::processing::{SequenceOutcome, run_status_sequence};
use super::search::{ProfileSearch, collect_candidates};
use super::session::{OnboardingSession, ProcessingStage, SearchStage, Stage};
use super::state::{FlowStatus, OnboardingStep};

/// Default broadcast channel capacity.
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Callbacks into the application that opened the flow.
pub trait OnboardingHost: Send + Sync {
    /// Called exactly once when processing finishes.
    fn on_complete(&self, fields: UserProfileUpdate, initial_favorite_views: Vec<String>);

    /// Called when the flow is abandoned before completion.
    fn on_dismiss(&self);
}

/// Collaborators a controller needs.
#[derive(Clone)]
pub struct OnboardingDeps {
    pub search: Arc<dyn ProfileSearch>,
    pub signer: Arc<dyn LegalSigner>,
    pub host: Arc<dyn OnboardingHost>,
}

/// Progress notifications for whatever renders the flow.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OnboardingEvent {
    StepChanged {
        from: OnboardingStep,
        to: OnboardingStep,
    },
    SearchResults {
        format: SearchFormat,
        count: usize,
    },
    ImagesAdded {
        added: usize,
        total: usize,
    },
    /// A user-facing alert (failed signature submission).
    Alert {
        message: String,
    },
    ProcessingStatus {
        index: usize,
        total: usize,
        message: String,
    },
    Completed {
        flow_id: Uuid,
    },
    Dismissed {
        flow_id: Uuid,
    },
}

/// Lets the host dismiss a flow while an operation is suspended.
#[derive(Clone)]
pub struct DismissHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl DismissHandle {
    pub fn dismiss(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_dismissed(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Point-in-time view of a flow, for rendering or debugging.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingSnapshot {
    pub flow_id: Uuid,
    pub status: FlowStatus,
    pub step: OnboardingStep,
    pub role: Option<ArtistRole>,
    pub legal_signed: bool,
    pub identity_image_count: usize,
    pub selected_staff_ids: Vec<String>,
}

/// Drives one onboarding flow.
pub struct OnboardingController {
    flow_id: Uuid,
    config: OnboardingConfig,
    deps: OnboardingDeps,
    session: OnboardingSession,
    stage: Stage,
    status: FlowStatus,
    events: broadcast::Sender<OnboardingEvent>,
    dismiss_tx: Arc<watch::Sender<bool>>,
    dismiss_rx: watch::Receiver<bool>,
}

impl OnboardingController {
    pub fn new(config: OnboardingConfig, deps: OnboardingDeps) -> Self {
        let (events, _rx) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        let (dismiss_tx, dismiss_rx) = watch::channel(false);
        let session = OnboardingSession::new(config.staff_roster.clone());
        let flow_id = Uuid::new_v4();
        info!(%flow_id, "Onboarding flow created");
        Self {
            flow_id,
            config,
            deps,
            session,
            stage: Stage::Welcome,
            status: FlowStatus::Active,
            events,
            dismiss_tx: Arc::new(dismiss_tx),
            dismiss_rx,
        }
    }

    pub fn flow_id(&self) -> Uuid {
        self.flow_id
    }

    pub fn step(&self) -> OnboardingStep {
        self.stage.step()
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn status(&self) -> FlowStatus {
        self.status
    }

    pub fn session(&self) -> &OnboardingSession {
        &self.session
    }

    pub fn config(&self) -> &OnboardingConfig {
        &self.config
    }

    /// Subscribe to flow events.
    pub fn subscribe(&self) -> broadcast::Receiver<OnboardingEvent> {
        self.events.subscribe()
    }

    pub fn dismiss_handle(&self) -> DismissHandle {
        DismissHandle {
            tx: Arc::clone(&self.dismiss_tx),
        }
    }

    pub fn snapshot(&self) -> OnboardingSnapshot {
        OnboardingSnapshot {
            flow_id: self.flow_id,
            status: self.status,
            step: self.step(),
            role: self.session.role(),
            legal_signed: self.session.legal_signed(),
            identity_image_count: self.session.identity_images().len(),
            selected_staff_ids: self.session.staff.selected_ids(),
        }
    }

    // ── Welcome / role ─────────────────────────────────────────────

    /// Leave the welcome screen.
    pub fn start(&mut self) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.expect_step(OnboardingStep::Welcome)?;
        self.advance(Stage::Role)
    }

    pub fn select_role(&mut self, role: ArtistRole) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.expect_step(OnboardingStep::Role)?;
        self.advance(Stage::Search(SearchStage::new(false)))?;
        self.session.set_role(role);
        info!(flow_id = %self.flow_id, %role, "Role selected");
        Ok(())
    }

    // ── Search ─────────────────────────────────────────────────────

    /// Switch between artist and channel search.
    pub fn set_search_format(&mut self, format: SearchFormat) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.search_stage_mut()?.change_format(format);
        Ok(())
    }

    /// Run a search and keep the results on the search step.
    ///
    /// A blank query clears the results without calling out. Search failures
    /// are logged and produce an empty list; the user can still skip.
    pub async fn search(&mut self, query: &str) -> Result<usize, OnboardingError> {
        self.ensure_active()?;
        let format = self.search_stage_mut()?.format;
        let query = query.trim().to_string();

        if query.is_empty() {
            let stage = self.search_stage_mut()?;
            stage.query.clear();
            stage.results.clear();
            return Ok(0);
        }

        let search = Arc::clone(&self.deps.search);
        let results = match search.search(format, &query).await {
            Ok(stream) => collect_candidates(stream, self.config.max_search_results).await,
            Err(e) => {
                warn!(flow_id = %self.flow_id, %format, error = %e, "Profile search failed");
                Vec::new()
            }
        };

        // A dismissal while the request was in flight discards the response.
        self.ensure_active()?;

        let count = results.len();
        let stage = self.search_stage_mut()?;
        stage.query = query;
        stage.results = results;
        debug!(flow_id = %self.flow_id, %format, count, "Search results stored");
        self.emit(OnboardingEvent::SearchResults { format, count });
        Ok(count)
    }

    pub fn search_results(&self) -> &[Candidate] {
        match &self.stage {
            Stage::Search(stage) => &stage.results,
            _ => &[],
        }
    }

    /// Pick a search result; seeds bio and the matching social link.
    pub fn select_candidate(&mut self, index: usize) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        let candidate = self
            .search_stage_mut()?
            .results
            .get(index)
            .cloned()
            .ok_or(OnboardingError::UnknownCandidate { index })?;
        self.leave_search()?;
        self.session.apply_candidate(&candidate);
        info!(flow_id = %self.flow_id, candidate = %candidate.name, "Search candidate selected");
        Ok(())
    }

    /// Continue without linking a profile.
    pub fn skip_search(&mut self) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.search_stage_mut()?;
        self.leave_search()
    }

    fn leave_search(&mut self) -> Result<(), OnboardingError> {
        let resync = matches!(&self.stage, Stage::Search(s) if s.resync);
        if resync || self.session.legal_signed() {
            self.advance(Stage::Socials)
        } else {
            let agreement = LegalAgreement::new(self.config.legal_document.clone());
            self.advance(Stage::Legal(agreement))
        }
    }

    // ── Legal ──────────────────────────────────────────────────────

    /// The legal form, for rendering.
    pub fn legal(&self) -> Option<&LegalAgreement> {
        match &self.stage {
            Stage::Legal(agreement) => Some(agreement),
            _ => None,
        }
    }

    pub fn legal_scrolled(
        &mut self,
        offset: f64,
        viewport_height: f64,
        content_height: f64,
    ) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.legal_mut()?
            .on_scroll(offset, viewport_height, content_height);
        Ok(())
    }

    pub fn legal_layout(
        &mut self,
        viewport_height: f64,
        content_height: f64,
    ) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.legal_mut()?.on_layout(viewport_height, content_height);
        Ok(())
    }

    pub fn set_signature(&mut self, text: &str) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.legal_mut()?.set_signature(text);
        Ok(())
    }

    /// Submit the signature. On success the flow moves to identity.
    pub async fn submit_signature(&mut self) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        let signer = Arc::clone(&self.deps.signer);
        let result = self.legal_mut()?.submit(signer.as_ref()).await;

        self.ensure_active()?;

        match result {
            Ok(signature) => {
                self.advance(Stage::Identity)?;
                self.session.record_signature(signature);
                Ok(())
            }
            Err(e @ OnboardingError::SigningFailed(_)) => {
                if let Some(message) = self.legal().and_then(|l| l.alert()).map(String::from) {
                    self.emit(OnboardingEvent::Alert { message });
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    // ── Identity / visual assets ──────────────────────────────────

    pub fn set_identity(&mut self, bio: &str, location: &str) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.expect_step(OnboardingStep::Identity)?;
        self.session.bio = bio.trim().to_string();
        self.session.location = location.trim().to_string();
        Ok(())
    }

    pub fn continue_identity(&mut self) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.expect_step(OnboardingStep::Identity)?;
        self.advance(Stage::VisualAssets)
    }

    /// Read a file selection and append it in selection order.
    ///
    /// Returns how many images were added. Unreadable files and anything over
    /// the image limit are dropped.
    pub async fn add_images(
        &mut self,
        files: Vec<Box<dyn FileSource>>,
    ) -> Result<usize, OnboardingError> {
        self.ensure_active()?;
        self.expect_step(OnboardingStep::VisualAssets)?;

        let images = read_selection(&files).await;
        self.ensure_active()?;

        let added = self
            .session
            .add_images(images, self.config.max_identity_images);
        let total = self.session.identity_images().len();
        debug!(flow_id = %self.flow_id, added, total, "Identity images added");
        self.emit(OnboardingEvent::ImagesAdded { added, total });
        Ok(added)
    }

    pub fn remove_image(&mut self, index: usize) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.expect_step(OnboardingStep::VisualAssets)?;
        self.session.remove_image(index)?;
        Ok(())
    }

    /// Leave visual assets. Requires the minimum image count.
    pub fn continue_visual_assets(&mut self) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.expect_step(OnboardingStep::VisualAssets)?;
        let have = self.session.identity_images().len();
        let required = self.config.min_identity_images;
        if have < required {
            return Err(OnboardingError::NotEnoughImages { have, required });
        }
        self.advance(Stage::Socials)
    }

    // ── Socials ────────────────────────────────────────────────────

    pub fn set_social_link(
        &mut self,
        platform: SocialPlatform,
        value: &str,
    ) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.expect_step(OnboardingStep::Socials)?;
        self.session.social_links.set(platform, value);
        Ok(())
    }

    /// Go back to search to link (another) profile. Nothing collected is lost.
    pub fn resync(&mut self) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.expect_step(OnboardingStep::Socials)?;
        self.advance(Stage::Search(SearchStage::new(true)))
    }

    pub fn continue_socials(&mut self) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.expect_step(OnboardingStep::Socials)?;
        self.advance(Stage::CoreActivation)
    }

    // ── Core activation / staff ───────────────────────────────────

    /// Missions unlocked for the selected role.
    pub fn missions(&self) -> Result<Vec<Mission>, OnboardingError> {
        let role = self.session.role().ok_or(OnboardingError::RoleNotSelected)?;
        Ok(missions_for(role))
    }

    pub fn activate_core(&mut self) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.expect_step(OnboardingStep::CoreActivation)?;
        self.advance(Stage::Staff)
    }

    /// Flip a staff member's selection. Returns whether it is now selected.
    pub fn toggle_staff(&mut self, id: &str) -> Result<bool, OnboardingError> {
        self.ensure_active()?;
        self.expect_step(OnboardingStep::Staff)?;
        self.session.staff.toggle(id)
    }

    /// Confirm staff and enter processing.
    pub fn continue_staff(&mut self) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.expect_step(OnboardingStep::Staff)?;
        let finalized = ProcessingStage::begin(&self.session)?;
        self.advance(Stage::Processing(finalized))
    }

    // ── Processing ─────────────────────────────────────────────────

    /// Play the status sequence, then hand the payload to the host.
    ///
    /// Returns the final status: `Completed`, or `Dismissed` if the dismiss
    /// handle fired first.
    pub async fn run_processing(&mut self) -> Result<FlowStatus, OnboardingError> {
        self.ensure_active()?;
        self.expect_step(OnboardingStep::Processing)?;

        let messages = self.config.processing_messages.clone();
        let total = messages.len();
        let events = self.events.clone();
        let mut cancel = self.dismiss_rx.clone();

        let outcome = run_status_sequence(
            &messages,
            self.config.processing_tick,
            &mut cancel,
            |index, message| {
                let _ = events.send(OnboardingEvent::ProcessingStatus {
                    index,
                    total,
                    message: message.to_string(),
                });
            },
        )
        .await;

        match outcome {
            SequenceOutcome::Finished => self.complete(),
            SequenceOutcome::Cancelled => self.finish_dismissed(),
        }
        Ok(self.status)
    }

    fn complete(&mut self) {
        let finalized = match &self.stage {
            Stage::Processing(finalized) => finalized.clone(),
            _ => return,
        };
        let role = finalized.role();
        let session = std::mem::replace(
            &mut self.session,
            OnboardingSession::new(self.config.staff_roster.clone()),
        );
        let update = session.into_update(&finalized);
        let views = favorite_views_for(role);

        self.status = FlowStatus::Completed;
        info!(
            flow_id = %self.flow_id,
            %role,
            identity_assets = update.identity_assets.len(),
            "Onboarding completed"
        );
        self.deps.host.on_complete(update, views);
        self.emit(OnboardingEvent::Completed {
            flow_id: self.flow_id,
        });
    }

    // ── Navigation ─────────────────────────────────────────────────

    /// Step back where allowed.
    ///
    /// A resync search returns to socials; otherwise the step graph decides.
    pub fn back(&mut self) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        let from = self.step();

        let target = match &self.stage {
            Stage::Search(stage) if stage.resync => Stage::Socials,
            _ => match from.previous() {
                Some(OnboardingStep::Welcome) => Stage::Welcome,
                Some(OnboardingStep::Role) => Stage::Role,
                Some(OnboardingStep::Search) => Stage::Search(SearchStage::new(false)),
                Some(OnboardingStep::Identity) => Stage::Identity,
                Some(OnboardingStep::VisualAssets) => Stage::VisualAssets,
                Some(OnboardingStep::Socials) => Stage::Socials,
                Some(OnboardingStep::CoreActivation) => Stage::CoreActivation,
                _ => {
                    return Err(OnboardingError::InvalidTransition {
                        from,
                        to: from.previous().unwrap_or(from),
                    });
                }
            },
        };

        let to = target.step();
        self.stage = target;
        debug!(flow_id = %self.flow_id, %from, %to, "Stepped back");
        self.emit(OnboardingEvent::StepChanged { from, to });
        Ok(())
    }

    /// Abandon the flow. The host's `on_complete` is never called afterwards.
    pub fn dismiss(&mut self) -> Result<(), OnboardingError> {
        self.ensure_active()?;
        self.dismiss_tx.send_replace(true);
        self.finish_dismissed();
        Ok(())
    }

    fn finish_dismissed(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        let step = self.step();
        self.status = FlowStatus::Dismissed;
        self.session = OnboardingSession::new(self.config.staff_roster.clone());
        info!(flow_id = %self.flow_id, %step, "Onboarding dismissed");
        self.deps.host.on_dismiss();
        self.emit(OnboardingEvent::Dismissed {
            flow_id: self.flow_id,
        });
    }

    // ── Helpers ────────────────────────────────────────────────────

    /// Fail if the flow is over; picks up a dismissal signalled through a handle.
    fn ensure_active(&mut self) -> Result<(), OnboardingError> {
        if self.status == FlowStatus::Active && *self.dismiss_rx.borrow() {
            self.finish_dismissed();
        }
        if self.status.is_terminal() {
            return Err(OnboardingError::FlowClosed {
                status: self.status.to_string(),
            });
        }
        Ok(())
    }

    fn expect_step(&self, expected: OnboardingStep) -> Result<(), OnboardingError> {
        let actual = self.step();
        if actual != expected {
            return Err(OnboardingError::WrongStep { expected, actual });
        }
        Ok(())
    }

    fn search_stage_mut(&mut self) -> Result<&mut SearchStage, OnboardingError> {
        let actual = self.step();
        match &mut self.stage {
            Stage::Search(stage) => Ok(stage),
            _ => Err(OnboardingError::WrongStep {
                expected: OnboardingStep::Search,
                actual,
            }),
        }
    }

    fn legal_mut(&mut self) -> Result<&mut LegalAgreement, OnboardingError> {
        let actual = self.step();
        match &mut self.stage {
            Stage::Legal(agreement) => Ok(agreement),
            _ => Err(OnboardingError::WrongStep {
                expected: OnboardingStep::Legal,
                actual,
            }),
        }
    }

    /// Move forward to `next` if the step graph allows it.
    fn advance(&mut self, next: Stage) -> Result<(), OnboardingError> {
        let from = self.step();
        let to = next.step();
        if !from.can_transition_to(to) {
            return Err(OnboardingError::InvalidTransition { from, to });
        }
        self.stage = next;
        info!(flow_id = %self.flow_id, %from, %to, "Onboarding step changed");
        self.emit(OnboardingEvent::StepChanged { from, to });
        Ok(())
    }

    fn emit(&self, event: OnboardingEvent) {
        // Ok if nobody is listening
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use futures::stream;

    use super::*;
    use crate::error::{SearchError, SignError};
    use crate::onboarding::assets::InMemoryFile;
    use crate::onboarding::model::Audience;
    use crate::onboarding::search::CandidateStream;

    struct FixedSearch {
        fail: bool,
    }

    #[async_trait]
    impl ProfileSearch for FixedSearch {
        async fn search(
            &self,
            format: SearchFormat,
            query: &str,
        ) -> Result<CandidateStream, SearchError> {
            if self.fail {
                return Err(SearchError::Status { status: 503 });
            }
            let candidates = vec![Candidate {
                name: format!("{query} Official"),
                image: None,
                audience: Audience::Followers(1_000),
                identifier: "1dfeR4HaWDbWqFHLkxsg1d".to_string(),
                source: format,
            }];
            Ok(Box::pin(stream::iter(candidates)))
        }
    }

    struct OkSigner;

    #[async_trait]
    impl LegalSigner for OkSigner {
        async fn sign(&self, _signature: &str) -> Result<(), SignError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingHost {
        completed: Mutex<Vec<(UserProfileUpdate, Vec<String>)>>,
        dismissed: Mutex<usize>,
    }

    impl OnboardingHost for RecordingHost {
        fn on_complete(&self, fields: UserProfileUpdate, views: Vec<String>) {
            self.completed.lock().unwrap().push((fields, views));
        }
        fn on_dismiss(&self) {
            *self.dismissed.lock().unwrap() += 1;
        }
    }

    fn controller(fail_search: bool) -> (OnboardingController, Arc<RecordingHost>) {
        let host = Arc::new(RecordingHost::default());
        let config = OnboardingConfig {
            processing_tick: Duration::from_millis(2),
            ..Default::default()
        };
        let deps = OnboardingDeps {
            search: Arc::new(FixedSearch { fail: fail_search }),
            signer: Arc::new(OkSigner),
            host: host.clone(),
        };
        (OnboardingController::new(config, deps), host)
    }

    fn png(n: u8) -> Box<dyn FileSource> {
        Box::new(InMemoryFile::new(format!("{n}.png"), "image/png", vec![n; 8]))
    }

    async fn to_legal(c: &mut OnboardingController) {
        c.start().unwrap();
        c.select_role(ArtistRole::IndividualArtist).unwrap();
        c.skip_search().unwrap();
    }

    async fn to_socials(c: &mut OnboardingController) {
        to_legal(c).await;
        c.legal_layout(800.0, 200.0).unwrap();
        c.set_signature("Alex Rivera").unwrap();
        c.submit_signature().await.unwrap();
        c.continue_identity().unwrap();
        c.add_images(vec![png(1), png(2), png(3)]).await.unwrap();
        c.continue_visual_assets().unwrap();
    }

    #[tokio::test]
    async fn operations_on_wrong_step_are_rejected() {
        let (mut c, _) = controller(false);
        let err = c.select_role(ArtistRole::LabelOperator).unwrap_err();
        assert!(matches!(
            err,
            OnboardingError::WrongStep {
                expected: OnboardingStep::Role,
                actual: OnboardingStep::Welcome
            }
        ));
        assert_eq!(c.step(), OnboardingStep::Welcome);
        assert!(c.session().role().is_none());
    }

    #[tokio::test]
    async fn selecting_candidate_jumps_to_legal_and_seeds_fields() {
        let (mut c, _) = controller(false);
        c.start().unwrap();
        c.select_role(ArtistRole::IndividualArtist).unwrap();
        assert_eq!(c.search("Nova").await.unwrap(), 1);
        c.select_candidate(0).unwrap();

        assert_eq!(c.step(), OnboardingStep::Legal);
        assert!(c.session().bio.contains("Nova Official"));
        assert_eq!(
            c.session().social_links.get(SocialPlatform::Spotify),
            Some("1dfeR4HaWDbWqFHLkxsg1d")
        );
    }

    #[tokio::test]
    async fn search_failure_leaves_results_empty() {
        let (mut c, _) = controller(true);
        c.start().unwrap();
        c.select_role(ArtistRole::IndividualArtist).unwrap();
        assert_eq!(c.search("Nova").await.unwrap(), 0);
        assert!(c.search_results().is_empty());
        assert!(matches!(
            c.select_candidate(0),
            Err(OnboardingError::UnknownCandidate { index: 0 })
        ));
        c.skip_search().unwrap();
        assert_eq!(c.step(), OnboardingStep::Legal);
    }

    #[tokio::test]
    async fn blank_query_clears_results() {
        let (mut c, _) = controller(false);
        c.start().unwrap();
        c.select_role(ArtistRole::IndividualArtist).unwrap();
        c.search("Nova").await.unwrap();
        assert_eq!(c.search("   ").await.unwrap(), 0);
        assert!(c.search_results().is_empty());
    }

    #[tokio::test]
    async fn visual_assets_gate_needs_three_images() {
        let (mut c, _) = controller(false);
        to_legal(&mut c).await;
        c.legal_layout(800.0, 200.0).unwrap();
        c.set_signature("Alex Rivera").unwrap();
        c.submit_signature().await.unwrap();
        c.continue_identity().unwrap();

        for n in 0..3u8 {
            let err = c.continue_visual_assets().unwrap_err();
            assert!(matches!(err, OnboardingError::NotEnoughImages { required: 3, .. }));
            assert_eq!(c.step(), OnboardingStep::VisualAssets);
            c.add_images(vec![png(n)]).await.unwrap();
        }
        c.continue_visual_assets().unwrap();
        assert_eq!(c.step(), OnboardingStep::Socials);
    }

    #[tokio::test]
    async fn resync_returns_to_socials_and_keeps_signature() {
        let (mut c, _) = controller(false);
        to_socials(&mut c).await;
        c.set_social_link(SocialPlatform::Instagram, "@nova").unwrap();

        c.resync().unwrap();
        assert_eq!(c.step(), OnboardingStep::Search);
        c.search("Nova").await.unwrap();
        c.select_candidate(0).unwrap();

        assert_eq!(c.step(), OnboardingStep::Socials);
        assert!(c.session().legal_signed());
        assert_eq!(c.session().identity_images().len(), 3);
        assert_eq!(c.session().social_links.get(SocialPlatform::Instagram), Some("nova"));
        assert!(c.session().social_links.get(SocialPlatform::Spotify).is_some());
    }

    #[tokio::test]
    async fn back_from_resync_search_returns_to_socials() {
        let (mut c, _) = controller(false);
        to_socials(&mut c).await;
        c.resync().unwrap();
        c.back().unwrap();
        assert_eq!(c.step(), OnboardingStep::Socials);
    }

    #[tokio::test]
    async fn back_cannot_reenter_signed_legal() {
        let (mut c, _) = controller(false);
        to_legal(&mut c).await;
        c.legal_layout(800.0, 200.0).unwrap();
        c.set_signature("Alex Rivera").unwrap();
        c.submit_signature().await.unwrap();
        assert!(matches!(
            c.back(),
            Err(OnboardingError::InvalidTransition { .. })
        ));
        assert_eq!(c.step(), OnboardingStep::Identity);
    }

    #[tokio::test]
    async fn back_from_legal_returns_to_search() {
        let (mut c, _) = controller(false);
        to_legal(&mut c).await;
        c.back().unwrap();
        assert_eq!(c.step(), OnboardingStep::Search);
        c.back().unwrap();
        assert_eq!(c.step(), OnboardingStep::Role);
    }

    #[tokio::test]
    async fn processing_completes_exactly_once() {
        let (mut c, host) = controller(false);
        to_socials(&mut c).await;
        c.continue_socials().unwrap();
        assert_eq!(c.missions().unwrap().len(), 3);
        c.activate_core().unwrap();
        c.continue_staff().unwrap();

        let mut events = c.subscribe();
        assert_eq!(c.run_processing().await.unwrap(), FlowStatus::Completed);
        assert!(matches!(
            c.run_processing().await,
            Err(OnboardingError::FlowClosed { .. })
        ));

        let completed = host.completed.lock().unwrap();
        assert_eq!(completed.len(), 1);
        assert!(completed[0].0.onboarding_completed);
        assert_eq!(completed[0].1, favorite_views_for(ArtistRole::IndividualArtist));

        let mut statuses = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, OnboardingEvent::ProcessingStatus { .. }) {
                statuses += 1;
            }
        }
        assert_eq!(statuses, c.config().processing_messages.len());
    }

    #[tokio::test]
    async fn dismiss_before_processing_never_completes() {
        let (mut c, host) = controller(false);
        to_socials(&mut c).await;
        c.dismiss().unwrap();
        assert_eq!(c.status(), FlowStatus::Dismissed);
        assert!(c.continue_socials().is_err());
        assert!(c.dismiss().is_err());
        assert!(host.completed.lock().unwrap().is_empty());
        assert_eq!(*host.dismissed.lock().unwrap(), 1);
        assert!(c.session().identity_images().is_empty(), "session is discarded");
    }

    #[tokio::test]
    async fn dismiss_handle_is_observed_on_next_operation() {
        let (mut c, host) = controller(false);
        let handle = c.dismiss_handle();
        c.start().unwrap();
        handle.dismiss();
        assert!(handle.is_dismissed());
        assert!(matches!(
            c.select_role(ArtistRole::LabelOperator),
            Err(OnboardingError::FlowClosed { .. })
        ));
        assert_eq!(*host.dismissed.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn snapshot_reflects_progress() {
        let (mut c, _) = controller(false);
        to_socials(&mut c).await;
        let snap = c.snapshot();
        assert_eq!(snap.step, OnboardingStep::Socials);
        assert_eq!(snap.role, Some(ArtistRole::IndividualArtist));
        assert!(snap.legal_signed);
        assert_eq!(snap.identity_image_count, 3);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["step"], "socials");
        assert_eq!(json["status"], "active");
    }
}
