//! Ordered model fallback around a [`TextGenerator`].

use core::time::Duration;
use std::time::Instant;

use thiserror::Error;
use tokio::time::timeout;
use tracing::warn;

use crate::{GenerateError, Generated, TextGenerator};

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("No models were attempted.")]
    NoModels,
    #[error("Model `{model}` failed fatally: {source}")]
    Fatal {
        model: String,
        source: GenerateError,
    },
    #[error("All models exhausted, last failure from `{model}`: {source}")]
    Exhausted {
        model: String,
        source: GenerateError,
    },
}

/// Tries an ordered list of model identifiers until one produces a result.
///
/// Retryable failures (unavailable, unknown model, rate limits, timeouts,
/// network faults) move the chain to the next identifier. A fatal failure
/// aborts immediately: retrying a bad credential against another model only
/// repeats the fault. Each attempt is capped by `attempt_timeout`, and once
/// `deadline` has elapsed no further identifiers are tried.
pub struct ModelInvoker<G> {
    generator: G,
    models: Vec<String>,
    attempt_timeout: Duration,
    deadline: Duration,
}

impl<G> ModelInvoker<G>
where
    G: TextGenerator,
{
    #[inline]
    #[must_use]
    pub const fn new(
        generator: G,
        models: Vec<String>,
        attempt_timeout: Duration,
        deadline: Duration,
    ) -> Self {
        Self {
            generator,
            models,
            attempt_timeout,
            deadline,
        }
    }

    pub async fn invoke(
        &self,
        prompt: &str,
    ) -> Result<Generated, InvokeError> {
        let started = Instant::now();
        let mut last_failure: Option<(String, GenerateError)> = None;

        for (attempt, model) in self.models.iter().enumerate() {
            if attempt > 0 && started.elapsed() >= self.deadline {
                warn!(
                    model = %model,
                    elapsed_secs = started.elapsed().as_secs(),
                    "overall deadline reached, skipping remaining models"
                );
                break;
            }

            let outcome =
                timeout(self.attempt_timeout, self.generator.generate(model, prompt))
                    .await;

            let err = match outcome {
                Ok(Ok(generated)) => return Ok(generated),
                Ok(Err(err)) => err,
                Err(_elapsed) => GenerateError::Timeout,
            };

            if err.is_fatal() {
                return Err(InvokeError::Fatal {
                    model: model.clone(),
                    source: err,
                });
            }

            warn!(
                generator = self.generator.name(),
                model = %model,
                error = %err,
                "generation attempt failed, falling back to the next model"
            );
            last_failure = Some((model.clone(), err));
        }

        match last_failure {
            Some((model, source)) => {
                Err(InvokeError::Exhausted { model, source })
            }
            None => Err(InvokeError::NoModels),
        }
    }
}
