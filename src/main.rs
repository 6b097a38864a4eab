use std::sync::Arc;

use artist_onboard::config::OnboardingConfig;
use artist_onboard::error::{OnboardingError, SearchError, SignError};
use artist_onboard::onboarding::{
    ArtistRole, CandidateStream, FileSource, FlowStatus, HttpProfileSearch, LegalSigner,
    OnboardingController, OnboardingDeps, OnboardingEvent, OnboardingHost, OnboardingStep,
    PathFile, ProfileSearch, SearchFormat, SocialPlatform, Stage, UserProfileUpdate,
};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Search stand-in when no proxy is configured: never finds anything.
struct OfflineSearch;

#[async_trait]
impl ProfileSearch for OfflineSearch {
    async fn search(
        &self,
        _format: SearchFormat,
        _query: &str,
    ) -> Result<CandidateStream, SearchError> {
        Ok(Box::pin(futures::stream::empty()))
    }
}

/// Accepts every signature; the terminal has nowhere to record it.
struct LocalSigner;

#[async_trait]
impl LegalSigner for LocalSigner {
    async fn sign(&self, signature: &str) -> Result<(), SignError> {
        tracing::info!(signature, "Signature accepted locally");
        Ok(())
    }
}

/// Prints the completion payload as JSON.
struct TerminalHost;

impl OnboardingHost for TerminalHost {
    fn on_complete(&self, fields: UserProfileUpdate, initial_favorite_views: Vec<String>) {
        let payload = serde_json::json!({
            "fields": fields,
            "initialFavoriteViews": initial_favorite_views,
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(json) => println!("\n{json}"),
            Err(e) => tracing::error!("Failed to serialize completion payload: {}", e),
        }
    }

    fn on_dismiss(&self) {
        eprintln!("Onboarding dismissed.");
    }
}

struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Ask a question. `None` on EOF.
    async fn ask(&mut self, question: &str) -> anyhow::Result<Option<String>> {
        eprint!("{question}\n> ");
        Ok(self.lines.next_line().await?.map(|l| l.trim().to_string()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = OnboardingConfig::from_env()?;

    let search: Arc<dyn ProfileSearch> = match config.search.clone() {
        Some(search_config) => {
            eprintln!("   Search: {}", search_config.base_url);
            Arc::new(HttpProfileSearch::new(search_config)?)
        }
        None => {
            eprintln!("   Search: offline (set ONBOARD_SEARCH_URL to enable)");
            Arc::new(OfflineSearch)
        }
    };

    let deps = OnboardingDeps {
        search,
        signer: Arc::new(LocalSigner),
        host: Arc::new(TerminalHost),
    };
    let mut flow = OnboardingController::new(config, deps);
    let mut prompt = Prompt::new();

    eprintln!("🎵 Artist onboarding v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Type /quit at any prompt to dismiss.\n");

    let status = drive(&mut flow, &mut prompt).await?;
    if status != FlowStatus::Completed && flow.status() == FlowStatus::Active {
        flow.dismiss()?;
    }
    Ok(())
}

/// Walk the flow one step at a time until it completes or the user quits.
async fn drive(flow: &mut OnboardingController, prompt: &mut Prompt) -> anyhow::Result<FlowStatus> {
    loop {
        let step = flow.step();
        let answer = if step.is_interactive() {
            match prompt.ask(&question_for(flow)).await? {
                Some(a) if a == "/quit" => return Ok(FlowStatus::Dismissed),
                Some(a) => a,
                None => return Ok(FlowStatus::Dismissed),
            }
        } else {
            String::new()
        };

        let result = match step {
            OnboardingStep::Welcome => flow.start(),
            OnboardingStep::Role => match answer.parse::<ArtistRole>() {
                Ok(role) => flow.select_role(role),
                Err(e) => {
                    eprintln!("{e}");
                    continue;
                }
            },
            OnboardingStep::Search => search_step(flow, &answer).await,
            OnboardingStep::Legal => {
                // The terminal shows the whole document at once
                let body_lines = flow.legal().map(|l| l.document().body.lines().count());
                flow.legal_layout(f64::MAX, body_lines.unwrap_or(0) as f64)?;
                flow.set_signature(&answer)?;
                flow.submit_signature().await
            }
            OnboardingStep::Identity => {
                let location = prompt.ask("Where are you based?").await?.unwrap_or_default();
                flow.set_identity(&answer, &location)?;
                flow.continue_identity()
            }
            OnboardingStep::VisualAssets => {
                if answer.is_empty() {
                    flow.continue_visual_assets()
                } else {
                    let files: Vec<Box<dyn FileSource>> = answer
                        .split_whitespace()
                        .map(|p| Box::new(PathFile::new(p)) as Box<dyn FileSource>)
                        .collect();
                    flow.add_images(files).await.map(|_| ())
                }
            }
            OnboardingStep::Socials => socials_step(flow, &answer),
            OnboardingStep::CoreActivation => flow.activate_core(),
            OnboardingStep::Staff => {
                if answer.is_empty() {
                    flow.continue_staff()
                } else {
                    flow.toggle_staff(&answer).map(|_| ())
                }
            }
            OnboardingStep::Processing => {
                let mut events = flow.subscribe();
                let printer = tokio::spawn(async move {
                    while let Ok(event) = events.recv().await {
                        if let OnboardingEvent::ProcessingStatus { message, .. } = event {
                            eprintln!("   … {message}");
                        }
                    }
                });
                let status = flow.run_processing().await?;
                printer.abort();
                return Ok(status);
            }
        };

        if let Err(e) = result {
            eprintln!("⚠ {e}");
        }
    }
}

async fn search_step(
    flow: &mut OnboardingController,
    answer: &str,
) -> Result<(), OnboardingError> {
    match answer {
        "" | "skip" => flow.skip_search(),
        "/channel" => flow.set_search_format(SearchFormat::Channel),
        "/artist" => flow.set_search_format(SearchFormat::Artist),
        "/back" => flow.back(),
        other if other.starts_with('#') => match parse_pick(other) {
            Some(index) => flow.select_candidate(index),
            None => {
                eprintln!("Pick a result as #1, #2, …");
                Ok(())
            }
        },
        query => run_search(flow, query).await,
    }
}

/// `#N` (1-based) to a result index.
fn parse_pick(answer: &str) -> Option<usize> {
    let n: usize = answer.strip_prefix('#')?.trim().parse().ok()?;
    n.checked_sub(1)
}

async fn run_search(flow: &mut OnboardingController, query: &str) -> Result<(), OnboardingError> {
    let count = flow.search(query).await?;
    for (i, c) in flow.search_results().iter().enumerate() {
        eprintln!("   #{} {} ({})", i + 1, c.name, c.audience);
    }
    if count == 0 {
        eprintln!("   No matches. Press Enter to skip.");
    }
    Ok(())
}

fn socials_step(
    flow: &mut OnboardingController,
    answer: &str,
) -> Result<(), OnboardingError> {
    match answer {
        "" => flow.continue_socials(),
        "/resync" => flow.resync(),
        entry => match entry.split_once(' ') {
            Some((platform, value)) => match platform.parse::<SocialPlatform>() {
                Ok(platform) => flow.set_social_link(platform, value),
                Err(e) => {
                    eprintln!("{e}");
                    Ok(())
                }
            },
            None => {
                eprintln!("Use `<platform> <handle or URL>`");
                Ok(())
            }
        },
    }
}

fn question_for(flow: &OnboardingController) -> String {
    match flow.step() {
        OnboardingStep::Welcome => "Welcome! Press Enter to set up your account.".to_string(),
        OnboardingStep::Role => "Are you an `artist` or a `label`?".to_string(),
        OnboardingStep::Search => format!(
            "Search for your profile ({}), #N to pick, /channel or /artist to switch, Enter to skip.",
            match flow.stage() {
                Stage::Search(s) => s.format,
                _ => SearchFormat::Artist,
            }
        ),
        OnboardingStep::Legal => {
            let doc = flow
                .legal()
                .map(|l| format!("{}\n\n{}", l.document().title, l.document().body))
                .unwrap_or_default();
            format!("{doc}\n\nType your full legal name to sign.")
        }
        OnboardingStep::Identity => "Tell us about yourself (bio).".to_string(),
        OnboardingStep::VisualAssets => format!(
            "Add identity photos as file paths ({} so far, {} needed). Enter to continue.",
            flow.session().identity_images().len(),
            flow.config().min_identity_images
        ),
        OnboardingStep::Socials => {
            "Add a link as `<platform> <handle>`, /resync to link a profile, Enter to continue."
                .to_string()
        }
        OnboardingStep::CoreActivation => {
            let missions = flow
                .missions()
                .map(|m| m.into_iter().map(|m| format!("  • {}", m.title)).collect::<Vec<_>>())
                .unwrap_or_default();
            format!("Your missions:\n{}\nPress Enter to activate.", missions.join("\n"))
        }
        OnboardingStep::Staff => {
            let roster: Vec<String> = flow
                .session()
                .staff
                .roster()
                .iter()
                .map(|m| {
                    let mark = if flow.session().staff.is_selected(&m.id) { "x" } else { " " };
                    format!("  [{mark}] {}: {} ({})", m.id, m.name, m.specialty)
                })
                .collect();
            format!("{}\nType an id to toggle, Enter to confirm.", roster.join("\n"))
        }
        OnboardingStep::Processing => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_is_one_based() {
        assert_eq!(parse_pick("#1"), Some(0));
        assert_eq!(parse_pick("#12"), Some(11));
    }

    #[test]
    fn bad_picks_are_rejected() {
        assert_eq!(parse_pick("#0"), None);
        assert_eq!(parse_pick("#"), None);
        assert_eq!(parse_pick("#é"), None);
        assert_eq!(parse_pick("nova"), None);
    }
}
