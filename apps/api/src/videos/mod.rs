//! Video suggestions from the YouTube Data API search endpoint.
//!
//! Suggestions are cosmetic. A non-success status is a `Degraded` lookup, never an error,
//! and callers that cannot afford a failure use [`lookup_or_degrade`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const SEARCH_PATH: &str = "youtube/v3/search";
const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum VideoSearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSuggestion {
    pub title: String,
    pub thumbnail_url: String,
    pub watch_url: String,
}

/// Outcome of a lookup that reached the search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VideoLookup {
    /// Upstream order, possibly empty.
    Found { videos: Vec<VideoSuggestion> },
    /// The service answered but not successfully; shown as no suggestions.
    Degraded { reason: String },
}

impl VideoLookup {
    pub fn videos(&self) -> &[VideoSuggestion] {
        match self {
            VideoLookup::Found { videos } => videos,
            VideoLookup::Degraded { .. } => &[],
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, VideoLookup::Degraded { .. })
    }
}

/// Carried in `AppState` as `Arc<dyn VideoSearch>`.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: u32) -> Result<VideoLookup, VideoSearchError>;
}

/// Runs a search and folds transport failures into `Degraded` so the caller always gets a lookup.
pub async fn lookup_or_degrade(search: &dyn VideoSearch, query: &str, max_results: u32) -> VideoLookup {
    match search.search(query, max_results).await {
        Ok(lookup) => {
            if let VideoLookup::Degraded { reason } = &lookup {
                warn!("Video search for '{query}' degraded: {reason}");
            }
            lookup
        }
        Err(e) => {
            warn!("Video search for '{query}' failed: {e}");
            VideoLookup::Degraded {
                reason: e.to_string(),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl SearchItem {
    /// Channels and playlists carry no `videoId` and are skipped.
    fn into_suggestion(self) -> Option<VideoSuggestion> {
        let video_id = self.id.video_id?;
        let snippet = self.snippet?;
        let thumbnail_url = snippet
            .thumbnails
            .medium
            .or(snippet.thumbnails.default)
            .map(|t| t.url)
            .unwrap_or_default();
        Some(VideoSuggestion {
            title: snippet.title,
            thumbnail_url,
            watch_url: format!("{WATCH_URL_PREFIX}{video_id}"),
        })
    }
}

#[derive(Clone)]
pub struct YouTubeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self, VideoSearchError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn search(&self, query: &str, max_results: u32) -> Result<VideoLookup, VideoSearchError> {
        let max_results_param = max_results.to_string();
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, SEARCH_PATH))
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("key", self.api_key.as_str()),
                ("maxResults", max_results_param.as_str()),
                ("type", "video"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Ok(VideoLookup::Degraded {
                reason: format!("search API returned {status}"),
            });
        }

        let body: SearchResponse = response.json().await?;
        let videos: Vec<VideoSuggestion> = body
            .items
            .into_iter()
            .filter_map(SearchItem::into_suggestion)
            .take(max_results as usize)
            .collect();

        debug!("Video search for '{query}' returned {} suggestions", videos.len());
        Ok(VideoLookup::Found { videos })
    }
}
