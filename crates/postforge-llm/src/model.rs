use async_trait::async_trait;
use std::sync::Arc;

use postforge_types::Result;

// ---------------------------------------------------------------------------
// TextModel
// ---------------------------------------------------------------------------

/// The model-invocation boundary.
///
/// A single prompt in, free-form text out. Implementations own their transport
/// (and any per-call timeout); callers must not assume anything about the
/// shape of the returned text.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Send one prompt and return the raw model text.
    async fn invoke(&self, prompt: &str) -> Result<String>;

    /// The model identifier, used in logs and error messages.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// DynModel
// ---------------------------------------------------------------------------

/// Cheaply clonable handle to a boxed [`TextModel`], shared across concurrent
/// fan-out tasks.
#[derive(Clone)]
pub struct DynModel(Arc<dyn TextModel>);

impl DynModel {
    pub fn new(model: impl TextModel + 'static) -> Self {
        Self(Arc::new(model))
    }

    pub async fn invoke(&self, prompt: &str) -> Result<String> {
        self.0.invoke(prompt).await
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }
}
