//! Onboarding data models: roles, search candidates, social links, and the
//! profile update handed to the host on completion.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Which kind of account is being onboarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtistRole {
    IndividualArtist,
    LabelOperator,
}

impl std::fmt::Display for ArtistRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndividualArtist => write!(f, "individual_artist"),
            Self::LabelOperator => write!(f, "label_operator"),
        }
    }
}

impl std::str::FromStr for ArtistRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "individual_artist" | "artist" => Ok(Self::IndividualArtist),
            "label_operator" | "label" => Ok(Self::LabelOperator),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Which external directory the search step queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchFormat {
    /// Streaming-service artist profiles.
    #[default]
    Artist,
    /// Video-platform channels.
    Channel,
}

impl SearchFormat {
    /// The social link a selected candidate of this format seeds.
    pub fn seeded_platform(&self) -> SocialPlatform {
        match self {
            Self::Artist => SocialPlatform::Spotify,
            Self::Channel => SocialPlatform::Youtube,
        }
    }
}

impl std::fmt::Display for SearchFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Artist => write!(f, "artist"),
            Self::Channel => write!(f, "channel"),
        }
    }
}

/// Audience size reported for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Followers(u64),
    Subscribers(u64),
}

impl Audience {
    pub fn count(&self) -> u64 {
        match self {
            Self::Followers(n) | Self::Subscribers(n) => *n,
        }
    }
}

impl std::fmt::Display for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Followers(n) => write!(f, "{n} followers"),
            Self::Subscribers(n) => write!(f, "{n} subscribers"),
        }
    }
}

/// A search result representing an external artist or channel profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub audience: Audience,
    /// External identifier or URI (artist id, channel id).
    pub identifier: String,
    pub source: SearchFormat,
}

impl Candidate {
    /// Bio text seeded from this candidate. Always contains the name.
    pub fn seeded_bio(&self) -> String {
        match self.source {
            SearchFormat::Artist => format!(
                "{} is an artist with {} on streaming platforms.",
                self.name, self.audience
            ),
            SearchFormat::Channel => {
                format!("{} runs a channel with {}.", self.name, self.audience)
            }
        }
    }
}

/// Platforms a social link can be captured for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SocialPlatform {
    Spotify,
    AppleMusic,
    Instagram,
    Tiktok,
    Youtube,
    X,
    Soundcloud,
}

impl SocialPlatform {
    pub const ALL: [SocialPlatform; 7] = [
        Self::Spotify,
        Self::AppleMusic,
        Self::Instagram,
        Self::Tiktok,
        Self::Youtube,
        Self::X,
        Self::Soundcloud,
    ];

    /// Whether values for this platform are `@handle`s rather than URLs.
    fn is_handle_platform(&self) -> bool {
        matches!(self, Self::Instagram | Self::Tiktok | Self::X)
    }
}

impl std::fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Spotify => "spotify",
            Self::AppleMusic => "apple_music",
            Self::Instagram => "instagram",
            Self::Tiktok => "tiktok",
            Self::Youtube => "youtube",
            Self::X => "x",
            Self::Soundcloud => "soundcloud",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SocialPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.to_string() == needle)
            .ok_or_else(|| format!("unknown platform: {s}"))
    }
}

/// Profile URL on a handle platform, e.g. `https://www.instagram.com/alex/`.
static HANDLE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.)?(?:instagram\.com|tiktok\.com|x\.com|twitter\.com)/@?([A-Za-z0-9._]+)/?$",
    )
    .expect("handle URL regex is valid")
});

/// Spotify artist link or URI, e.g. `https://open.spotify.com/artist/<id>?si=…`
/// or `spotify:artist:<id>`.
static SPOTIFY_ARTIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:https?://)?open\.spotify\.com/(?:intl-[a-z]{2}/)?artist/|spotify:artist:)([A-Za-z0-9]{22})(?:[/?#].*)?$",
    )
    .expect("spotify artist regex is valid")
});

/// Platform → handle/URL mapping. Every entry is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SocialLinks(BTreeMap<SocialPlatform, String>);

impl SocialLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a link after normalization. Blank values remove the entry.
    ///
    /// Handle platforms accept `@name`, `name`, or a profile URL and store the
    /// bare handle.
    pub fn set(&mut self, platform: SocialPlatform, value: &str) {
        let normalized = normalize_link(platform, value);
        if normalized.is_empty() {
            self.0.remove(&platform);
        } else {
            self.0.insert(platform, normalized);
        }
    }

    /// Store a value verbatim (used when seeding from a search candidate).
    pub fn set_raw(&mut self, platform: SocialPlatform, value: impl Into<String>) {
        self.0.insert(platform, value.into());
    }

    pub fn get(&self, platform: SocialPlatform) -> Option<&str> {
        self.0.get(&platform).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SocialPlatform, &str)> {
        self.0.iter().map(|(p, v)| (*p, v.as_str()))
    }
}

fn normalize_link(platform: SocialPlatform, value: &str) -> String {
    let trimmed = value.trim();
    if platform == SocialPlatform::Spotify {
        return match SPOTIFY_ARTIST.captures(trimmed) {
            Some(caps) => caps[1].to_string(),
            None => trimmed.to_string(),
        };
    }
    if !platform.is_handle_platform() {
        return trimmed.to_string();
    }
    if let Some(caps) = HANDLE_URL.captures(trimmed) {
        return caps[1].to_string();
    }
    trimmed.trim_start_matches('@').to_string()
}

/// A role-specific starter goal shown at core activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub title: String,
}

impl Mission {
    fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
        }
    }
}

/// Missions unlocked by core activation for a role.
pub fn missions_for(role: ArtistRole) -> Vec<Mission> {
    match role {
        ArtistRole::IndividualArtist => vec![
            Mission::new("release-first-single", "Release your first single"),
            Mission::new("build-press-kit", "Build your electronic press kit"),
            Mission::new("grow-streaming-audience", "Grow your streaming audience"),
        ],
        ArtistRole::LabelOperator => vec![
            Mission::new("onboard-roster", "Onboard your artist roster"),
            Mission::new("plan-release-calendar", "Plan the release calendar"),
            Mission::new("set-up-distribution", "Set up distribution"),
        ],
    }
}

/// Initial favorite views for individual artists.
pub const ARTIST_FAVORITE_VIEWS: &[&str] = &["dashboard", "staff-hub", "studio", "brand-builder"];

/// Initial favorite views for label operators.
pub const LABEL_FAVORITE_VIEWS: &[&str] =
    &["dashboard", "label-roster", "distribution", "crm-inbox"];

/// The fixed favorite view list for a role.
pub fn favorite_views_for(role: ArtistRole) -> Vec<String> {
    let views = match role {
        ArtistRole::IndividualArtist => ARTIST_FAVORITE_VIEWS,
        ArtistRole::LabelOperator => LABEL_FAVORITE_VIEWS,
    };
    views.iter().map(|v| v.to_string()).collect()
}

/// An uploaded identity reference photo held as a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityImage(String);

impl IdentityImage {
    /// Wrap an already-encoded data URI.
    pub fn from_data_uri(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The MIME type declared in the URI header, if well formed.
    pub fn mime_type(&self) -> Option<&str> {
        self.0.strip_prefix("data:")?.split(';').next()
    }
}

/// A completed legal acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalSignature {
    pub signature: String,
    pub signed_at: DateTime<Utc>,
}

/// Fields written back to the host's user document on completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileUpdate {
    pub role: ArtistRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_name: Option<String>,
    pub bio: String,
    pub location: String,
    pub identity_assets: Vec<IdentityImage>,
    pub social_links: SocialLinks,
    pub active_staff_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_profile: Option<Candidate>,
    pub legal_signature: String,
    pub legal_signed_at: DateTime<Utc>,
    pub onboarding_completed: bool,
    pub tour_completed: bool,
    pub onboarding_completed_at: DateTime<Utc>,
}

/// Whether the host should open the onboarding flow for a user.
pub fn needs_onboarding(onboarding_completed: bool, skip_flag: bool) -> bool {
    !onboarding_completed && !skip_flag
}
