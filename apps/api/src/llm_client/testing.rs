//! Scripted `CompletionGateway` for orchestrator tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm_client::{CompletionGateway, CompletionParams, LlmError, PromptMessage};

/// What the gateway does once its script runs out.
#[derive(Debug, Clone)]
pub enum Exhausted {
    Reply(String),
    Fail,
}

pub struct ScriptedGateway {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    exhausted: Exhausted,
    latency: Duration,
    calls: Mutex<Vec<(Vec<PromptMessage>, CompletionParams)>>,
}

impl ScriptedGateway {
    pub fn always(reply: &str) -> Self {
        Self::new(Vec::new(), Exhausted::Reply(reply.to_string()))
    }

    pub fn always_failing() -> Self {
        Self::new(Vec::new(), Exhausted::Fail)
    }

    pub fn new(script: Vec<Result<String, LlmError>>, exhausted: Exhausted) -> Self {
        Self {
            script: Mutex::new(script.into()),
            exhausted,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every completion sleeps for `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<(Vec<PromptMessage>, CompletionParams)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        params: CompletionParams,
    ) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), params));
        let next = self.script.lock().unwrap().pop_front();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match next {
            Some(result) => result,
            None => match &self.exhausted {
                Exhausted::Reply(text) => Ok(text.clone()),
                Exhausted::Fail => Err(LlmError::Timeout(Duration::from_secs(30))),
            },
        }
    }

    async fn health_check(&self) -> Result<bool, LlmError> {
        match self.exhausted {
            Exhausted::Reply(_) => Ok(true),
            Exhausted::Fail => Err(LlmError::Network("scripted outage".to_string())),
        }
    }
}
