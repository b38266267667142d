//! Topic extraction stage: text in, a guaranteed non-empty topic list out.

use serde_json::{json, Value};

use postforge_llm::DynModel;
use postforge_types::{PostforgeError, Result, Topic};

use crate::prompts;

/// Upper bound on `max_topics` accepted from callers.
pub const MAX_TOPICS_LIMIT: usize = 50;

/// Number of input characters used for the synthesized fallback excerpt.
const FALLBACK_EXCERPT_CHARS: usize = 200;

/// Executes the topic-extraction stage against a text model.
#[derive(Clone)]
pub struct TopicExtractor {
    model: DynModel,
}

impl TopicExtractor {
    pub fn new(model: DynModel) -> Self {
        Self { model }
    }

    /// Extract up to `max_topics` topics from `text`.
    ///
    /// The returned list is never empty: when the model output yields no
    /// usable topics, a single fallback topic is synthesized from the input
    /// text itself. Empty input is the one fatal case.
    pub async fn extract(&self, text: &str, max_topics: usize) -> Result<Vec<Topic>> {
        self.validate(text, max_topics)?;

        let prompt = prompts::topic_extraction(text, max_topics);
        let raw = self.model.invoke(&prompt).await?;

        let entries = postforge_decode::decode_list(&raw, || vec![fallback_entry(text)]);
        let mut topics = normalize(entries);
        topics.truncate(max_topics);

        if topics.is_empty() {
            // Nothing usable survived validation; fall back to the input itself.
            topics = normalize(vec![fallback_entry(text)]);
        }

        tracing::info!(count = topics.len(), "topic extraction complete");
        Ok(topics)
    }

    fn validate(&self, text: &str, max_topics: usize) -> Result<()> {
        if text.trim().is_empty() {
            return Err(PostforgeError::Validation("text cannot be empty".into()));
        }
        if max_topics < 1 || max_topics > MAX_TOPICS_LIMIT {
            return Err(PostforgeError::Validation(format!(
                "max_topics must be between 1 and {MAX_TOPICS_LIMIT}"
            )));
        }
        Ok(())
    }
}

/// The deterministic single-topic fallback built from the input text.
fn fallback_entry(text: &str) -> Value {
    let trimmed = text.trim();
    let mut excerpt: String = trimmed.chars().take(FALLBACK_EXCERPT_CHARS).collect();
    if excerpt.len() < trimmed.len() {
        excerpt.push_str("...");
    }
    json!({
        "topic_name": "Main theme from the provided text",
        "content_excerpt": excerpt,
        "confidence_score": 0.7,
    })
}

/// Drop entries missing a name or excerpt, then assign sequential ids so the
/// surviving list is numbered 1..N with no gaps.
fn normalize(entries: Vec<Value>) -> Vec<Topic> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let name = entry["topic_name"].as_str()?.trim().to_string();
            let excerpt = entry["content_excerpt"].as_str()?.trim().to_string();
            if name.is_empty() || excerpt.is_empty() {
                return None;
            }
            let confidence = entry["confidence_score"].as_f64().unwrap_or(0.8);
            Some((name, excerpt, confidence.clamp(0.0, 1.0)))
        })
        .enumerate()
        .map(|(i, (name, excerpt, confidence))| Topic {
            id: i as u32 + 1,
            name,
            excerpt,
            confidence,
        })
        .collect()
}
