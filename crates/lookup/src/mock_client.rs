//! Mock Responses client
//!
//! Canned answers selected by substring of the request input, with
//! injectable failures. Used for unit tests and offline runs.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::instrument;

use contracts::LookupError;

use crate::client::{ResponsesClient, ResponsesRequest};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(LookupError),
}

#[derive(Debug, Default)]
struct MockState {
    /// (input substring, reply), first match wins
    replies: Vec<(String, Reply)>,
    requests: Vec<ResponsesRequest>,
}

/// Mock Responses client
#[derive(Debug, Clone, Default)]
pub struct MockResponsesClient {
    state: Arc<Mutex<MockState>>,
    latency: Duration,
}

impl MockResponsesClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `text` to any request whose input contains `needle`
    pub fn respond_with(self, needle: impl Into<String>, text: impl Into<String>) -> Self {
        self.push(needle.into(), Reply::Text(text.into()));
        self
    }

    /// Fail any request whose input contains `needle`
    pub fn fail_with(self, needle: impl Into<String>, error: LookupError) -> Self {
        self.push(needle.into(), Reply::Fail(error));
        self
    }

    /// Delay every answer
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<ResponsesRequest> {
        self.lock().requests.clone()
    }

    fn push(&self, needle: String, reply: Reply) {
        self.lock().replies.push((needle, reply));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn reply_for(&self, request: &ResponsesRequest) -> Result<String, LookupError> {
        let mut state = self.lock();
        state.requests.push(request.clone());
        let reply = state
            .replies
            .iter()
            .find(|(needle, _)| request.input.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(error)) => Err(error),
            None => Err(LookupError::Rejected("no scripted response".into())),
        }
    }
}

impl ResponsesClient for MockResponsesClient {
    #[instrument(name = "mock_respond", skip(self, request), fields(model = %request.model))]
    async fn respond(&self, request: &ResponsesRequest) -> Result<String, LookupError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.reply_for(request)
    }
}
