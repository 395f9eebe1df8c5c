//! In-process [`ChatBackend`] that answers from a script and records every call

use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::{ChatBackend, ChatRequest};
use crate::LlmError;

type Responder = Box<dyn Fn(&ChatRequest) -> Result<String, LlmError> + Send + Sync>;

pub struct ScriptedBackend {
    responder: Responder,
    calls: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ChatRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always reply with the same text
    pub fn replying(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Always fail as if the backend could not be reached
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| Err(LlmError::Unavailable(message.clone())))
    }

    pub fn calls(&self) -> Vec<ChatRequest> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        let reply = (self.responder)(&request);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request);
        }
        reply
    }
}
