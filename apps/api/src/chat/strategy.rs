//! Ordered reply strategies for one chat turn.
//!
//! Each strategy is one completion attempt with its own prompt and post-processing.
//! The chain runs them in order and returns the first success; when every
//! strategy fails the caller substitutes an apology.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::llm_client::{CompletionGateway, CompletionParams, LlmError, PromptMessage};

#[async_trait]
pub trait ReplyStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, gateway: &dyn CompletionGateway) -> Result<String, LlmError>;
}

/// A prompt sent as-is, with an optional transform applied to the completion text.
pub struct PromptStrategy {
    name: &'static str,
    messages: Vec<PromptMessage>,
    params: CompletionParams,
    transform: fn(&str) -> Result<String, LlmError>,
}

fn passthrough(text: &str) -> Result<String, LlmError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(LlmError::MalformedResponse("empty reply".to_string()));
    }
    Ok(text.to_string())
}

impl PromptStrategy {
    pub fn new(name: &'static str, messages: Vec<PromptMessage>, params: CompletionParams) -> Self {
        Self {
            name,
            messages,
            params,
            transform: passthrough,
        }
    }

    pub fn with_transform(mut self, transform: fn(&str) -> Result<String, LlmError>) -> Self {
        self.transform = transform;
        self
    }
}

#[async_trait]
impl ReplyStrategy for PromptStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn attempt(&self, gateway: &dyn CompletionGateway) -> Result<String, LlmError> {
        let text = gateway.complete(&self.messages, self.params).await?;
        (self.transform)(&text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainReply {
    pub text: String,
    pub strategy: &'static str,
}

#[derive(Debug, Error)]
#[error("all {attempts} reply strategies failed, last error: {last}")]
pub struct ChainExhausted {
    pub attempts: usize,
    pub last: LlmError,
}

#[derive(Default)]
pub struct StrategyChain {
    strategies: Vec<Box<dyn ReplyStrategy>>,
}

impl StrategyChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, strategy: impl ReplyStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    #[cfg(test)]
    fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, gateway: &dyn CompletionGateway) -> Result<ChainReply, ChainExhausted> {
        let mut last = LlmError::MalformedResponse("no reply strategies configured".to_string());
        for strategy in &self.strategies {
            match strategy.attempt(gateway).await {
                Ok(text) => {
                    return Ok(ChainReply {
                        text,
                        strategy: strategy.name(),
                    })
                }
                Err(e) => {
                    warn!(
                        strategy = strategy.name(),
                        error_kind = e.kind(),
                        "reply strategy failed: {e}"
                    );
                    last = e;
                }
            }
        }
        Err(ChainExhausted {
            attempts: self.strategies.len(),
            last,
        })
    }
}
