//! Deterministic in-process generator for offline runs and tests.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;

use crate::{GenerateError, Generated, TextGenerator};

/// What the scripted generator does when a given model id is requested.
#[non_exhaustive]
#[derive(Debug)]
pub enum ScriptedOutcome {
    Text(String),
    Empty,
    Fail(GenerateError),
    /// Never resolves. Exercises attempt timeouts.
    Hang,
}

/// A [`TextGenerator`] that replays pre-programmed outcomes and records the
/// order in which model ids were consulted.
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<HashMap<String, ScriptedOutcome>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with(self, model: &str, outcome: ScriptedOutcome) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(model.to_owned(), outcome);
        self
    }

    /// Model ids consulted so far, in call order.
    #[inline]
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    #[inline]
    fn name(&self) -> &'static str {
        "Scripted"
    }

    async fn generate(
        &self,
        model: &str,
        _prompt: &str,
    ) -> Result<Generated, GenerateError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(model.to_owned());

        let outcome = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(model);

        match outcome {
            Some(ScriptedOutcome::Text(text)) => Ok(Generated::Text(text)),
            Some(ScriptedOutcome::Empty) => Ok(Generated::Empty),
            Some(ScriptedOutcome::Fail(err)) => Err(err),
            Some(ScriptedOutcome::Hang) => core::future::pending().await,
            None => Err(GenerateError::UnexpectedResponse(format!(
                "no scripted outcome for `{model}`"
            ))),
        }
    }
}
