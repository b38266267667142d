//! Content generation stage: one model call per (topic, platform) pair.
//!
//! A model failure is not fatal here. It is recorded on the returned post
//! (`success == false`, empty content) and the caller decides how to react.
//! The only hard error is an unsupported platform name.

use std::time::Instant;

use postforge_llm::DynModel;
use postforge_types::{EnhancedTopic, GeneratedPost, Result};

use crate::platform::PlatformRegistry;
use crate::prompts;

/// Executes the content-generation stage.
#[derive(Clone)]
pub struct ContentGenerator {
    model: DynModel,
    platforms: PlatformRegistry,
}

impl ContentGenerator {
    pub fn new(model: DynModel, platforms: PlatformRegistry) -> Self {
        Self { model, platforms }
    }

    /// Generate one post for `topic` on `platform`.
    ///
    /// The destination URL is appended to the model's output with a single
    /// space; when `url` is empty the body is returned unchanged.
    pub async fn generate(
        &self,
        topic: &EnhancedTopic,
        url: &str,
        platform: &str,
        audience_context: Option<&str>,
    ) -> Result<GeneratedPost> {
        let config = self.platforms.get(platform)?;
        let prompt = prompts::content_generation(topic, config, audience_context);

        let start = Instant::now();
        let body = match self.model.invoke(&prompt).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(
                    topic_id = topic.id,
                    platform = %config.name,
                    error = %err,
                    "content generation failed"
                );
                return Ok(GeneratedPost::failed(topic.id, &config.name, err.to_string()));
            }
        };
        let elapsed = start.elapsed().as_secs_f64();

        let content = join_url(body.trim(), url);
        tracing::debug!(
            topic_id = topic.id,
            platform = %config.name,
            chars = content.chars().count(),
            "post generated"
        );

        Ok(GeneratedPost {
            topic_id: topic.id,
            platform: config.name.clone(),
            content,
            strategy: config.strategy.clone(),
            success: true,
            error: None,
            processing_time_seconds: elapsed,
        })
    }
}

fn join_url(body: &str, url: &str) -> String {
    if url.is_empty() {
        body.to_string()
    } else {
        format!("{body} {url}")
    }
}
