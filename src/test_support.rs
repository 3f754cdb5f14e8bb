//! Fakes shared by unit tests.

use crate::backend::GenerativeBackend;
use crate::errors::MangaError;
use crate::retry::Delay;
use crate::wire::{GenerateContentRequest, GenerateContentResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Records requested delays instead of sleeping.
#[derive(Debug, Default)]
pub(crate) struct RecordingDelay {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub(crate) fn recorded(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Replays scripted outcomes in order and records every request it receives.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    outcomes: Mutex<VecDeque<Result<GenerateContentResponse, MangaError>>>,
    requests: Mutex<Vec<(String, GenerateContentRequest)>>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_text(self, text: &str) -> Self {
        self.push(Ok(GenerateContentResponse::from_text(text)))
    }

    pub(crate) fn push_error(self, error: MangaError) -> Self {
        self.push(Err(error))
    }

    pub(crate) fn push(self, outcome: Result<GenerateContentResponse, MangaError>) -> Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub(crate) fn requests(&self) -> Vec<(String, GenerateContentRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, MangaError> {
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), request.clone()));
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MangaError::MalformedResponse("script exhausted".into())))
    }
}

pub(crate) fn api_error(status_code: u16, message: &str) -> MangaError {
    MangaError::Api {
        status_code,
        message: message.to_string(),
        request_id: None,
    }
}
