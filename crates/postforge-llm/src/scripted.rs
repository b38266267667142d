use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::model::TextModel;
use postforge_types::{PostforgeError, Result};

// ---------------------------------------------------------------------------
// ScriptedModel
// ---------------------------------------------------------------------------

/// A deterministic model that replays pre-seeded responses in order.
///
/// Used for offline runs and tests. Once the script is exhausted, every
/// further call returns the repeat response if one was set, otherwise an
/// error.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    repeat: Option<String>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            repeat: None,
        }
    }

    /// After the script runs out, keep returning `response` forever.
    pub fn with_repeat(mut self, response: impl Into<String>) -> Self {
        self.repeat = Some(response.into());
        self
    }

    /// Number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|q| q.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TextModel for ScriptedModel {
    async fn invoke(&self, _prompt: &str) -> Result<String> {
        let next = self
            .responses
            .lock()
            .map_err(|_| PostforgeError::Other("scripted model lock poisoned".into()))?
            .pop_front();

        match next.or_else(|| self.repeat.clone()) {
            Some(text) => Ok(text),
            None => Err(PostforgeError::Model {
                model: "scripted".into(),
                message: "script exhausted".into(),
                retryable: false,
            }),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
