//! Wraps the completion gateway with automatic fallback.
//!
//! Analysis, recommendation and chat paths call `generate`, which never fails:
//! any upstream error is logged and replaced with the caller's deterministic
//! fallback text. Direct callers that need the raw error (health checks, the
//! image strategy chain) use `gateway()` instead.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::llm_client::{CompletionGateway, CompletionParams, LlmError, PromptMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationSource {
    Ai,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub text: String,
    pub source: GenerationSource,
}

#[derive(Clone)]
pub struct ResilientOrchestrator {
    gateway: Arc<dyn CompletionGateway>,
}

impl ResilientOrchestrator {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &dyn CompletionGateway {
        self.gateway.as_ref()
    }

    /// Completion text, or `fallback()` if the gateway fails for any reason.
    pub async fn generate<F>(
        &self,
        purpose: &str,
        messages: &[PromptMessage],
        params: CompletionParams,
        fallback: F,
    ) -> Generated
    where
        F: FnOnce() -> String,
    {
        match self.gateway.complete(messages, params).await {
            Ok(text) => Generated {
                text,
                source: GenerationSource::Ai,
            },
            Err(e) => {
                log_fallback(purpose, &e);
                Generated {
                    text: fallback(),
                    source: GenerationSource::Fallback,
                }
            }
        }
    }

    /// Like `generate`, but the AI text must also pass `parse`. A parse failure
    /// is treated the same as an upstream failure.
    pub async fn generate_parsed<T, P, F>(
        &self,
        purpose: &str,
        messages: &[PromptMessage],
        params: CompletionParams,
        parse: P,
        fallback: F,
    ) -> (T, GenerationSource)
    where
        P: FnOnce(&str) -> Result<T, LlmError>,
        F: FnOnce() -> T,
    {
        let parsed = match self.gateway.complete(messages, params).await {
            Ok(text) => parse(&text),
            Err(e) => Err(e),
        };
        match parsed {
            Ok(value) => (value, GenerationSource::Ai),
            Err(e) => {
                log_fallback(purpose, &e);
                (fallback(), GenerationSource::Fallback)
            }
        }
    }
}

fn log_fallback(purpose: &str, error: &LlmError) {
    warn!(
        purpose,
        error_kind = error.kind(),
        "AI completion failed, using fallback: {error}"
    );
}
