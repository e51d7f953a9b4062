//! Shared fakes for unit tests: an in-process HTTP stub server and counting service doubles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use crate::analysis::Pipeline;
use crate::document::raster::tests::FakeRasterizer;
use crate::llm_client::{LlmError, Prompt, TextGenerator};
use crate::videos::{VideoLookup, VideoSearch, VideoSearchError, VideoSuggestion};

/// Serves `router` on an ephemeral localhost port and returns its base URL.
pub(crate) async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub(crate) struct FakeGenerator {
    reply: Result<String, (u16, String)>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<Prompt>>,
}

impl FakeGenerator {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::default(),
        }
    }

    pub(crate) fn failing(status: u16, message: &str) -> Self {
        Self {
            reply: Err((status, message.to_string())),
            calls: AtomicUsize::new(0),
            prompts: Mutex::default(),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_prompt(&self) -> Option<Prompt> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());
        self.reply.clone().map_err(|(status, message)| LlmError::Api { status, message })
    }
}

pub(crate) struct FakeVideoSearch {
    lookup: VideoLookup,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl FakeVideoSearch {
    pub(crate) fn with_lookup(lookup: VideoLookup) -> Self {
        Self {
            lookup,
            calls: AtomicUsize::new(0),
            queries: Mutex::default(),
        }
    }

    pub(crate) fn with_videos(titles: &[&str]) -> Self {
        let videos = titles
            .iter()
            .enumerate()
            .map(|(i, title)| VideoSuggestion {
                title: title.to_string(),
                thumbnail_url: format!("https://i.ytimg.com/vi/v{i}/mqdefault.jpg"),
                watch_url: format!("https://www.youtube.com/watch?v=v{i}"),
            })
            .collect();
        Self::with_lookup(VideoLookup::Found { videos })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoSearch for FakeVideoSearch {
    async fn search(&self, query: &str, _max_results: u32) -> Result<VideoLookup, VideoSearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.lookup.clone())
    }
}

/// A pipeline wired to fakes, with handles kept for call-count assertions.
pub(crate) struct FakeServices {
    pub llm: Arc<FakeGenerator>,
    pub videos: Arc<FakeVideoSearch>,
    pub rasterizer: Arc<FakeRasterizer>,
}

impl FakeServices {
    pub(crate) fn new(llm: FakeGenerator, videos: FakeVideoSearch) -> Self {
        Self {
            llm: Arc::new(llm),
            videos: Arc::new(videos),
            rasterizer: Arc::new(FakeRasterizer::new(12, 16)),
        }
    }

    pub(crate) fn pipeline(&self) -> Pipeline {
        Pipeline {
            llm: self.llm.clone(),
            videos: self.videos.clone(),
            rasterizer: self.rasterizer.clone(),
            max_video_results: 3,
        }
    }

    pub(crate) fn outbound_calls(&self) -> usize {
        self.llm.calls() + self.videos.calls() + self.rasterizer.calls()
    }
}
