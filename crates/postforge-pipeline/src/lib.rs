//! Three-stage social-post pipeline: topic extraction, emotion
//! classification, and per-platform content generation.
//!
//! [`Pipeline`] is the front door. Feed it a [`PipelineRequest`] and either
//! collect a single [`postforge_types::PipelineResult`] via [`Pipeline::run`]
//! or consume progress events via [`Pipeline::stream`]. The individual stage
//! executors are public for callers that want to run a stage in isolation.

pub mod content;
pub mod emotion;
pub mod fanout;
pub mod orchestrator;
pub mod platform;
pub mod prompts;
pub mod stream;
pub mod topics;

pub use content::ContentGenerator;
pub use emotion::EmotionAnalyzer;
pub use fanout::{FanOut, DEFAULT_CONCURRENCY};
pub use orchestrator::{Pipeline, PipelineRequest, RunMode, DEFAULT_MAX_TOPICS};
pub use platform::{PlatformConfig, PlatformRegistry};
pub use stream::StreamEvent;
pub use topics::TopicExtractor;
