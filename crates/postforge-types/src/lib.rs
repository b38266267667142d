//! Shared types and errors for the Postforge content pipeline.
//!
//! This crate provides the foundational types used across all other Postforge
//! crates:
//! - `PostforgeError` — unified error taxonomy
//! - `Topic`, `EnhancedTopic`, `GeneratedPost` — the data flowing through the
//!   three pipeline stages
//! - `PipelineResult` / `StageTimings` — the aggregate produced by one run

use serde::{Deserialize, Serialize};

/// Unified error type for all Postforge subsystems.
#[derive(Debug, thiserror::Error)]
pub enum PostforgeError {
    // === Caller input ===
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unsupported platform: {platform}")]
    UnsupportedPlatform { platform: String },

    // === Model collaborator ===
    #[error("Model '{model}' call failed: {message}")]
    Model {
        model: String,
        message: String,
        retryable: bool,
    },

    #[error("Authentication failed for model '{model}'")]
    Auth { model: String },

    // === Pipeline ===
    #[error("Stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },

    #[error("Fan-out task for {task} failed: {message}")]
    Task { task: String, message: String },

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl PostforgeError {
    /// Returns `true` if the error is transient and the call may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PostforgeError::Model { retryable: true, .. })
    }

    /// Returns `true` if the error is permanent and retrying will not help.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PostforgeError::Validation(_)
                | PostforgeError::UnsupportedPlatform { .. }
                | PostforgeError::Auth { .. }
        )
    }

    /// Maps the error to an HTTP status code for server mode.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            PostforgeError::Validation(_) | PostforgeError::UnsupportedPlatform { .. } => Some(400),
            PostforgeError::Auth { .. } => Some(401),
            PostforgeError::Model { .. } => Some(502),
            PostforgeError::Stage { .. } | PostforgeError::Task { .. } => Some(500),
            _ => None,
        }
    }
}

/// A convenience alias for `Result<T, PostforgeError>`.
pub type Result<T> = std::result::Result<T, PostforgeError>;

// ---------------------------------------------------------------------------
// EmotionTheme — the 5 fixed marketing-psychology categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionTheme {
    #[default]
    EncourageDreams,
    JustifyFailures,
    AllayFears,
    ConfirmSuspicions,
    UniteAgainstChallenges,
}

impl EmotionTheme {
    /// All 5 themes, in presentation order.
    pub const ALL: [EmotionTheme; 5] = [
        EmotionTheme::EncourageDreams,
        EmotionTheme::JustifyFailures,
        EmotionTheme::AllayFears,
        EmotionTheme::ConfirmSuspicions,
        EmotionTheme::UniteAgainstChallenges,
    ];

    /// The snake_case wire name used in prompts and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionTheme::EncourageDreams => "encourage_dreams",
            EmotionTheme::JustifyFailures => "justify_failures",
            EmotionTheme::AllayFears => "allay_fears",
            EmotionTheme::ConfirmSuspicions => "confirm_suspicions",
            EmotionTheme::UniteAgainstChallenges => "unite_against_challenges",
        }
    }

    /// Parse a wire name. Returns `None` for anything outside the fixed set.
    pub fn parse(s: &str) -> Option<EmotionTheme> {
        match s {
            "encourage_dreams" => Some(EmotionTheme::EncourageDreams),
            "justify_failures" => Some(EmotionTheme::JustifyFailures),
            "allay_fears" => Some(EmotionTheme::AllayFears),
            "confirm_suspicions" => Some(EmotionTheme::ConfirmSuspicions),
            "unite_against_challenges" => Some(EmotionTheme::UniteAgainstChallenges),
            _ => None,
        }
    }

    /// Canned one-line description, used when the model omits its own.
    pub fn description(&self) -> &'static str {
        match self {
            EmotionTheme::EncourageDreams => "Inspire aspiration and positive outcomes",
            EmotionTheme::JustifyFailures => "Validate struggles and remove self-blame",
            EmotionTheme::AllayFears => "Provide reassurance and security",
            EmotionTheme::ConfirmSuspicions => "Validate existing doubts and concerns",
            EmotionTheme::UniteAgainstChallenges => "Unite against common challenges",
        }
    }

    /// The longer guidance line embedded in the classification prompt.
    pub fn prompt_line(&self) -> &'static str {
        match self {
            EmotionTheme::EncourageDreams => {
                "Encourage Their Dreams - Content that inspires aspiration, growth, positive future outcomes, and achievement"
            }
            EmotionTheme::JustifyFailures => {
                "Justify Their Failures - Content that validates struggles, provides external explanations, removes self-blame"
            }
            EmotionTheme::AllayFears => {
                "Allay Their Fears - Content that provides reassurance, reduces anxiety, offers safety and security"
            }
            EmotionTheme::ConfirmSuspicions => {
                "Confirm Their Suspicions - Content that validates existing doubts, provides \"I knew it!\" moments"
            }
            EmotionTheme::UniteAgainstChallenges => {
                "Unite Against Common Challenges - Content that identifies shared obstacles, mutual frustrations, collective concerns"
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Topic — produced by topic extraction
// ---------------------------------------------------------------------------

/// A distinct topic extracted from the input text. Immutable after creation;
/// downstream stages reference it by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "topic_id")]
    pub id: u32,
    #[serde(rename = "topic_name")]
    pub name: String,
    #[serde(rename = "content_excerpt")]
    pub excerpt: String,
    #[serde(rename = "confidence_score")]
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// EnhancedTopic — produced by emotion targeting
// ---------------------------------------------------------------------------

/// A topic annotated with its emotion classification. One per input topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedTopic {
    #[serde(rename = "topic_id")]
    pub id: u32,
    #[serde(rename = "topic_name")]
    pub name: String,
    #[serde(rename = "content_excerpt")]
    pub excerpt: String,
    #[serde(rename = "confidence_score")]
    pub confidence: f64,
    #[serde(rename = "primary_emotion")]
    pub emotion_theme: EmotionTheme,
    pub emotion_confidence: f64,
    pub emotion_description: String,
    pub reasoning: String,
}

// ---------------------------------------------------------------------------
// GeneratedPost — produced by content generation
// ---------------------------------------------------------------------------

/// One platform-ready post for a (topic, platform) pair. Never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPost {
    pub topic_id: u32,
    pub platform: String,
    pub content: String,
    pub strategy: String,
    pub success: bool,
    pub error: Option<String>,
    pub processing_time_seconds: f64,
}

impl GeneratedPost {
    /// A failed post placeholder with empty content.
    pub fn failed(topic_id: u32, platform: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            topic_id,
            platform: platform.into(),
            content: String::new(),
            strategy: String::new(),
            success: false,
            error: Some(error.into()),
            processing_time_seconds: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// StageTimings / PipelineResult
// ---------------------------------------------------------------------------

/// Per-stage wall-clock seconds for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    pub topic_extraction: f64,
    pub emotion_analysis: f64,
    pub content_generation: f64,
}

impl StageTimings {
    /// Total elapsed time as the sum of per-stage elapsed times.
    pub fn total(&self) -> f64 {
        self.topic_extraction + self.emotion_analysis + self.content_generation
    }
}

/// The unified result of one non-streaming pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub success: bool,
    pub topics: Vec<Topic>,
    pub enhanced_topics: Vec<EnhancedTopic>,
    pub generated_posts: Vec<GeneratedPost>,
    pub total_topics: usize,
    pub successful_generations: usize,
    pub processing_time: f64,
    pub stage_timings: StageTimings,
    pub error: Option<String>,
    pub error_source: Option<String>,
}

impl PipelineResult {
    /// A failed result naming the stage that caused the failure.
    pub fn failed(source: impl Into<String>, error: impl Into<String>, timings: StageTimings) -> Self {
        Self {
            success: false,
            topics: Vec::new(),
            enhanced_topics: Vec::new(),
            generated_posts: Vec::new(),
            total_topics: 0,
            successful_generations: 0,
            processing_time: timings.total(),
            stage_timings: timings,
            error: Some(error.into()),
            error_source: Some(source.into()),
        }
    }
}
