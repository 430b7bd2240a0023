//! Inference client: sends a rendered prompt to a completion backend and
//! returns raw text.
//!
//! Transport failures never propagate to the pipeline. They become a failure
//! sentinel string, which the parser maps to `Other`, so one bad pair cannot
//! abort a run.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::gate::RateGate;

/// Prefix of every failure sentinel returned by [`InferenceClient`].
pub const FAILURE_PREFIX: &str = "Inference failed";

#[derive(Error, Debug)]
pub enum InferenceError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("service error: {0}")]
    Service(String),
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// A text-completion service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError>;
}

/// Prompt in, raw completion text out. Never fails.
#[async_trait]
pub trait Inference: Send {
    async fn call(&mut self, prompt: &str) -> String;
}

/// Render the sentinel text recorded for a failed call.
pub fn failure_sentinel(err: &InferenceError) -> String {
    format!("{FAILURE_PREFIX}: {err}")
}

/// Counters kept by [`InferenceClient`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub calls: u64,
    pub failures: u64,
}

/// Backend plus rate gate.
///
/// The gate pauses only after successful calls; failed calls return their
/// sentinel immediately.
pub struct InferenceClient<B> {
    backend: B,
    gate: Box<dyn RateGate>,
    stats: CallStats,
}

impl<B: CompletionBackend> InferenceClient<B> {
    pub fn with_gate(backend: B, gate: Box<dyn RateGate>) -> Self {
        Self {
            backend,
            gate,
            stats: CallStats::default(),
        }
    }

    pub fn stats(&self) -> CallStats {
        self.stats
    }
}

#[async_trait]
impl<B: CompletionBackend> Inference for InferenceClient<B> {
    async fn call(&mut self, prompt: &str) -> String {
        self.stats.calls += 1;
        match self.backend.generate(prompt).await {
            Ok(text) => {
                debug!(chars = text.len(), "inference completed");
                self.gate.pause().await;
                text
            }
            Err(e) => {
                self.stats.failures += 1;
                warn!(error = %e, "inference call failed");
                failure_sentinel(&e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted backends shared by the crate's tests.

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Backend that answers from a script, or from a responder closure when the
    /// script is empty, and records every prompt it receives.
    #[derive(Clone)]
    pub struct ScriptedBackend {
        script: Arc<Mutex<VecDeque<Result<String, String>>>>,
        responder: Arc<dyn Fn(&str) -> String + Send + Sync>,
        pub prompts: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedBackend {
        pub fn answering(answer: &str) -> Self {
            let answer = answer.to_string();
            Self::with_responder(move |_| answer.clone())
        }

        pub fn with_responder(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
            Self {
                script: Arc::new(Mutex::new(VecDeque::new())),
                responder: Arc::new(f),
                prompts: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Queue a response ahead of the responder; `Err` simulates a transport failure.
        pub fn push(&self, response: Result<&str, &str>) {
            self.script
                .lock()
                .unwrap()
                .push_back(response.map(str::to_string).map_err(str::to_string));
        }

        pub fn call_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.script.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(detail)) => Err(InferenceError::Service(detail)),
                None => Ok((self.responder)(prompt)),
            }
        }
    }

    /// Client over a scripted backend with no pacing.
    pub fn client(backend: &ScriptedBackend) -> InferenceClient<ScriptedBackend> {
        InferenceClient::with_gate(backend.clone(), Box::new(crate::gate::NoDelay))
    }
}
