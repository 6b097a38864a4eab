//! External profile search: the collaborator behind the search step.

use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::debug;

use crate::config::SearchConfig;
use crate::error::SearchError;

use super::model::{Audience, Candidate, SearchFormat};

/// A lazy, finite stream of candidates. Consumed once.
pub type CandidateStream = Pin<Box<dyn Stream<Item = Candidate> + Send>>;

/// Looks up artist profiles or channels by free-text query.
#[async_trait]
pub trait ProfileSearch: Send + Sync {
    async fn search(
        &self,
        format: SearchFormat,
        query: &str,
    ) -> Result<CandidateStream, SearchError>;
}

/// Drain up to `limit` candidates from a search stream.
pub async fn collect_candidates(stream: CandidateStream, limit: usize) -> Vec<Candidate> {
    stream.take(limit).collect().await
}

/// Search collaborator backed by the product's search proxy.
///
/// `GET {base_url}/api/search/artists?q=…` or `/api/search/channels?q=…`,
/// answering `{"items": [{"name", "image", "followers"|"subscribers", "id"}]}`.
pub struct HttpProfileSearch {
    config: SearchConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    name: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    followers: Option<u64>,
    #[serde(default)]
    subscribers: Option<u64>,
    id: String,
}

impl SearchItem {
    fn into_candidate(self, format: SearchFormat) -> Option<Candidate> {
        if self.name.trim().is_empty() || self.id.trim().is_empty() {
            return None;
        }
        let audience = match format {
            SearchFormat::Artist => Audience::Followers(self.followers.unwrap_or(0)),
            SearchFormat::Channel => Audience::Subscribers(self.subscribers.unwrap_or(0)),
        };
        Some(Candidate {
            name: self.name,
            image: self.image.filter(|i| !i.is_empty()),
            audience,
            identifier: self.id,
            source: format,
        })
    }
}

impl HttpProfileSearch {
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SearchError::Request(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, format: SearchFormat) -> String {
        let path = match format {
            SearchFormat::Artist => "artists",
            SearchFormat::Channel => "channels",
        };
        format!(
            "{}/api/search/{path}",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ProfileSearch for HttpProfileSearch {
    async fn search(
        &self,
        format: SearchFormat,
        query: &str,
    ) -> Result<CandidateStream, SearchError> {
        let mut request = self.client.get(self.endpoint(format)).query(&[("q", query)]);
        if let Some(ref key) = self.config.api_key {
            request = request.header("x-api-key", key.expose_secret());
        }

        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SearchError::Timeout {
                    timeout: self.config.timeout,
                }
            } else {
                SearchError::Request(e.to_string())
            }
        })?;

        if !resp.status().is_success() {
            return Err(SearchError::Status {
                status: resp.status().as_u16(),
            });
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        debug!(%format, items = body.items.len(), "Search proxy responded");

        let candidates = body
            .items
            .into_iter()
            .filter_map(move |item| item.into_candidate(format));
        Ok(Box::pin(stream::iter(candidates)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, id: &str) -> SearchItem {
        SearchItem {
            name: name.to_string(),
            image: Some(String::new()),
            followers: Some(42),
            subscribers: Some(7),
            id: id.to_string(),
        }
    }

    #[test]
    fn artist_items_use_followers() {
        let c = item("Nova", "abc").into_candidate(SearchFormat::Artist).unwrap();
        assert_eq!(c.audience, Audience::Followers(42));
        assert_eq!(c.image, None, "empty image URLs are dropped");
        assert_eq!(c.source, SearchFormat::Artist);
    }

    #[test]
    fn channel_items_use_subscribers() {
        let c = item("Nova TV", "UC1").into_candidate(SearchFormat::Channel).unwrap();
        assert_eq!(c.audience, Audience::Subscribers(7));
    }

    #[test]
    fn nameless_items_are_skipped() {
        assert!(item("  ", "abc").into_candidate(SearchFormat::Artist).is_none());
        assert!(item("Nova", "").into_candidate(SearchFormat::Artist).is_none());
    }

    #[tokio::test]
    async fn collect_respects_limit() {
        let all: Vec<Candidate> = (0..5)
            .filter_map(|i| item(&format!("A{i}"), &format!("id{i}")).into_candidate(SearchFormat::Artist))
            .collect();
        let stream: CandidateStream = Box::pin(stream::iter(all));
        let got = collect_candidates(stream, 3).await;
        assert_eq!(got.len(), 3);
        assert_eq!(got[0].name, "A0");
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let search = HttpProfileSearch::new(SearchConfig::new("http://localhost:9000/")).unwrap();
        assert_eq!(
            search.endpoint(SearchFormat::Channel),
            "http://localhost:9000/api/search/channels"
        );
    }
}
