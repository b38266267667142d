//! The pipeline orchestrator: runs the three stages in order and folds the
//! outcome into a single [`PipelineResult`].
//!
//! Failure policy is fail-all per stage. A stage that cannot produce a value
//! for every item fails the whole run with `error_source` naming the stage;
//! earlier stage outputs are discarded. Partial results never escape.

use std::time::Instant;

use postforge_llm::DynModel;
use postforge_types::{
    EnhancedTopic, GeneratedPost, PipelineResult, PostforgeError, Result, StageTimings, Topic,
};

use crate::content::ContentGenerator;
use crate::emotion::EmotionAnalyzer;
use crate::fanout::FanOut;
use crate::platform::PlatformRegistry;
use crate::topics::TopicExtractor;

pub const DEFAULT_MAX_TOPICS: usize = 10;

// ---------------------------------------------------------------------------
// PipelineRequest
// ---------------------------------------------------------------------------

/// One pipeline run's input.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub text: String,
    /// Destination URL appended to every generated post. May be empty.
    pub url: String,
    pub platforms: Vec<String>,
    pub audience_context: Option<String>,
    pub max_topics: usize,
}

impl PipelineRequest {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
            platforms: vec!["twitter".to_string()],
            audience_context: None,
            max_topics: DEFAULT_MAX_TOPICS,
        }
    }

    pub fn with_platforms(mut self, platforms: Vec<String>) -> Self {
        self.platforms = platforms;
        self
    }

    pub fn with_audience_context(mut self, context: impl Into<String>) -> Self {
        self.audience_context = Some(context.into());
        self
    }

    pub fn with_max_topics(mut self, max_topics: usize) -> Self {
        self.max_topics = max_topics;
        self
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Whether fan-out stages run their items concurrently or one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    Sequential,
    #[default]
    Parallel,
}

/// The three-stage pipeline. Cheap to clone; all shared state is behind
/// `Arc`s inside the model and scheduler.
#[derive(Clone)]
pub struct Pipeline {
    pub(crate) extractor: TopicExtractor,
    pub(crate) analyzer: EmotionAnalyzer,
    pub(crate) generator: ContentGenerator,
    pub(crate) platforms: PlatformRegistry,
    pub(crate) mode: RunMode,
    pub(crate) fanout: FanOut,
}

impl Pipeline {
    pub fn new(model: DynModel) -> Self {
        let platforms = PlatformRegistry::builtin();
        Self {
            extractor: TopicExtractor::new(model.clone()),
            analyzer: EmotionAnalyzer::new(model.clone()),
            generator: ContentGenerator::new(model, platforms.clone()),
            platforms,
            mode: RunMode::default(),
            fanout: FanOut::default(),
        }
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the fan-out concurrency bound (clamped to at least 1).
    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.fanout = FanOut::new(max_concurrency);
        self
    }

    /// Use a different model for content generation, e.g. the same backend
    /// at a higher temperature than the extraction and classification calls.
    pub fn with_generation_model(mut self, model: DynModel) -> Self {
        self.generator = ContentGenerator::new(model, self.platforms.clone());
        self
    }

    pub fn platforms(&self) -> &PlatformRegistry {
        &self.platforms
    }

    /// Run the full pipeline. Never returns `Err`; every failure is folded
    /// into the result with `error` and `error_source` set.
    pub async fn run(&self, request: &PipelineRequest) -> PipelineResult {
        let mut timings = StageTimings::default();

        if let Err(err) = self.validate(request) {
            return PipelineResult::failed("validation", err.to_string(), timings);
        }

        // Stage 1: topic extraction.
        let start = Instant::now();
        let topics = match self.extractor.extract(&request.text, request.max_topics).await {
            Ok(topics) => topics,
            Err(err) => {
                timings.topic_extraction = start.elapsed().as_secs_f64();
                return PipelineResult::failed("topic_extraction", err.to_string(), timings);
            }
        };
        timings.topic_extraction = start.elapsed().as_secs_f64();
        tracing::info!(topics = topics.len(), "topic extraction finished");

        // Stage 2: emotion analysis.
        let start = Instant::now();
        let enhanced = match self.analyze_all(&topics, request).await {
            Ok(enhanced) => enhanced,
            Err(err) => {
                timings.emotion_analysis = start.elapsed().as_secs_f64();
                return PipelineResult::failed("emotion_analysis", err.to_string(), timings);
            }
        };
        timings.emotion_analysis = start.elapsed().as_secs_f64();
        tracing::info!(topics = enhanced.len(), "emotion analysis finished");

        // Stage 3: content generation, one post per (topic, platform) pair.
        let start = Instant::now();
        let posts = self.generate_all(&enhanced, request).await;
        timings.content_generation = start.elapsed().as_secs_f64();

        let failures: Vec<String> = posts
            .iter()
            .filter(|p| !p.success)
            .map(|p| {
                format!(
                    "topic {}/{}: {}",
                    p.topic_id,
                    p.platform,
                    p.error.as_deref().unwrap_or("unknown error")
                )
            })
            .collect();
        if !failures.is_empty() {
            tracing::warn!(failed = failures.len(), "content generation failed");
            return PipelineResult::failed(
                "content_generation",
                format!("content generation failed for: {}", failures.join("; ")),
                timings,
            );
        }
        tracing::info!(posts = posts.len(), "content generation finished");

        PipelineResult {
            success: true,
            total_topics: topics.len(),
            successful_generations: posts.len(),
            topics,
            enhanced_topics: enhanced,
            generated_posts: posts,
            processing_time: timings.total(),
            stage_timings: timings,
            error: None,
            error_source: None,
        }
    }

    fn validate(&self, request: &PipelineRequest) -> Result<()> {
        if request.platforms.is_empty() {
            return Err(PostforgeError::Validation(
                "at least one platform is required".into(),
            ));
        }
        for platform in &request.platforms {
            self.platforms.get(platform)?;
        }
        Ok(())
    }

    pub(crate) async fn analyze_all(
        &self,
        topics: &[Topic],
        request: &PipelineRequest,
    ) -> Result<Vec<EnhancedTopic>> {
        match self.mode {
            RunMode::Sequential => {
                self.analyzer
                    .analyze(topics, request.audience_context.as_deref())
                    .await
            }
            RunMode::Parallel => {
                let tasks: Vec<_> = topics
                    .iter()
                    .cloned()
                    .map(|topic| {
                        let analyzer = self.analyzer.clone();
                        let audience = request.audience_context.clone();
                        move || async move { analyzer.analyze_one(&topic, audience.as_deref()).await }
                    })
                    .collect();

                let mut enhanced = Vec::with_capacity(topics.len());
                let mut failures = Vec::new();
                for (topic, result) in topics.iter().zip(self.fanout.run_all(tasks).await) {
                    match result {
                        Ok(item) => enhanced.push(item),
                        Err(err) => failures.push(format!("topic {}: {err}", topic.id)),
                    }
                }
                if failures.is_empty() {
                    Ok(enhanced)
                } else {
                    Err(PostforgeError::Stage {
                        stage: "emotion_analysis".into(),
                        message: failures.join("; "),
                    })
                }
            }
        }
    }

    /// Generate the full topic × platform grid in submission order. Errors
    /// (including task panics) are folded into failed posts; the caller
    /// applies the failure policy.
    pub(crate) async fn generate_all(
        &self,
        enhanced: &[EnhancedTopic],
        request: &PipelineRequest,
    ) -> Vec<GeneratedPost> {
        let pairs: Vec<(EnhancedTopic, String)> = enhanced
            .iter()
            .flat_map(|topic| {
                request
                    .platforms
                    .iter()
                    .map(move |platform| (topic.clone(), platform.clone()))
            })
            .collect();

        match self.mode {
            RunMode::Sequential => {
                let mut posts = Vec::with_capacity(pairs.len());
                for (topic, platform) in &pairs {
                    let post = self
                        .generator
                        .generate(topic, &request.url, platform, request.audience_context.as_deref())
                        .await
                        .unwrap_or_else(|err| {
                            GeneratedPost::failed(topic.id, platform.clone(), err.to_string())
                        });
                    posts.push(post);
                }
                posts
            }
            RunMode::Parallel => {
                let tasks: Vec<_> = pairs
                    .iter()
                    .cloned()
                    .map(|(topic, platform)| {
                        let generator = self.generator.clone();
                        let url = request.url.clone();
                        let audience = request.audience_context.clone();
                        move || async move {
                            generator
                                .generate(&topic, &url, &platform, audience.as_deref())
                                .await
                        }
                    })
                    .collect();

                pairs
                    .iter()
                    .zip(self.fanout.run_all(tasks).await)
                    .map(|((topic, platform), result)| {
                        result.unwrap_or_else(|err| {
                            GeneratedPost::failed(topic.id, platform.clone(), err.to_string())
                        })
                    })
                    .collect()
            }
        }
    }
}
