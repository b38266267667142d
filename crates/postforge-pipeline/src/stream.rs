//! Progress streaming for pipeline runs.
//!
//! Events are pushed over a bounded channel as the run advances. Content
//! generation gathers its fan-out results first and then replays them in
//! submission order, so the per-post events arrive in a stable order even
//! when tasks finish out of order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use postforge_types::GeneratedPost;

use crate::orchestrator::{Pipeline, PipelineRequest};

const CHANNEL_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// StreamEvent
// ---------------------------------------------------------------------------

/// One progress event. Serializes to the event's data payload; the event
/// type lives out of band (see [`StreamEvent::event_type`] and
/// [`StreamEvent::to_sse`]).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    Status {
        stage: String,
        progress: u8,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        topics_count: Option<usize>,
        timestamp: DateTime<Utc>,
    },
    Post {
        post: GeneratedPost,
        topic_name: String,
        progress: u8,
        completed: usize,
        total: usize,
        timestamp: DateTime<Utc>,
    },
    PostError {
        topic_id: u32,
        platform: String,
        error: String,
        progress: u8,
        completed: usize,
        total: usize,
        timestamp: DateTime<Utc>,
    },
    Error {
        stage: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    Complete {
        progress: u8,
        message: String,
        total_processing_time: f64,
        timestamp: DateTime<Utc>,
    },
}

impl StreamEvent {
    fn status(stage: &str, progress: u8, message: impl Into<String>) -> Self {
        StreamEvent::Status {
            stage: stage.to_string(),
            progress,
            message: message.into(),
            topics_count: None,
            timestamp: Utc::now(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            StreamEvent::Status { .. } => "status",
            StreamEvent::Post { .. } => "post",
            StreamEvent::PostError { .. } => "post_error",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Complete { .. } => "complete",
        }
    }

    /// Render as one Server-Sent Events frame.
    pub fn to_sse(&self) -> String {
        let data = serde_json::to_string(self)
            .unwrap_or_else(|_| "{}".to_string());
        format!("event: {}\ndata: {data}\n\n", self.event_type())
    }
}

/// Progress value for the per-post band: 50 at the start of content
/// generation, 100 when every pair has been reported.
fn post_progress(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    50 + ((completed as f64 / total as f64) * 50.0).round() as u8
}

// ---------------------------------------------------------------------------
// Pipeline::stream
// ---------------------------------------------------------------------------

impl Pipeline {
    /// Run the pipeline, emitting progress events instead of returning a
    /// result. The run is spawned immediately; dropping the stream stops it
    /// at the next emission point.
    ///
    /// Unlike [`Pipeline::run`], content-generation failures are reported
    /// per pair as `post_error` events and do not abort the run.
    pub fn stream(&self, request: PipelineRequest) -> ReceiverStream<StreamEvent> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let pipeline = self.clone();
        tokio::spawn(async move {
            pipeline.stream_inner(request, tx).await;
        });
        ReceiverStream::new(rx)
    }

    async fn stream_inner(self, request: PipelineRequest, tx: mpsc::Sender<StreamEvent>) {
        let run_start = std::time::Instant::now();

        if !send(&tx, StreamEvent::status("init", 0, "Starting pipeline...")).await {
            return;
        }

        if let Err(err) = self.stream_validate(&request) {
            let _ = tx
                .send(StreamEvent::Error {
                    stage: "validation".into(),
                    error: err,
                    timestamp: Utc::now(),
                })
                .await;
            return;
        }

        // Stage 1: topic extraction.
        if !send(
            &tx,
            StreamEvent::status("topic_extraction", 5, "Extracting topics..."),
        )
        .await
        {
            return;
        }
        let topics = match self.extractor.extract(&request.text, request.max_topics).await {
            Ok(topics) => topics,
            Err(err) => {
                let _ = tx
                    .send(StreamEvent::Error {
                        stage: "topic_extraction".into(),
                        error: err.to_string(),
                        timestamp: Utc::now(),
                    })
                    .await;
                return;
            }
        };
        if !send(
            &tx,
            StreamEvent::Status {
                stage: "topic_extraction_complete".into(),
                progress: 25,
                message: format!("Found {} topics", topics.len()),
                topics_count: Some(topics.len()),
                timestamp: Utc::now(),
            },
        )
        .await
        {
            return;
        }

        // Stage 2: emotion analysis.
        if !send(
            &tx,
            StreamEvent::status("emotion_analysis", 30, "Analyzing emotional themes..."),
        )
        .await
        {
            return;
        }
        let enhanced = match self.analyze_all(&topics, &request).await {
            Ok(enhanced) => enhanced,
            Err(err) => {
                let _ = tx
                    .send(StreamEvent::Error {
                        stage: "emotion_analysis".into(),
                        error: err.to_string(),
                        timestamp: Utc::now(),
                    })
                    .await;
                return;
            }
        };

        // Stage 3: content generation, reported per pair.
        if !send(
            &tx,
            StreamEvent::status(
                "content_generation_start",
                50,
                "Generating platform content...",
            ),
        )
        .await
        {
            return;
        }

        let posts = self.generate_all(&enhanced, &request).await;
        let total = posts.len();
        for (completed, post) in posts.into_iter().enumerate() {
            let progress = post_progress(completed + 1, total);
            let event = if post.success {
                let topic_name = enhanced
                    .iter()
                    .find(|t| t.id == post.topic_id)
                    .map(|t| t.name.clone())
                    .unwrap_or_default();
                StreamEvent::Post {
                    post,
                    topic_name,
                    progress,
                    completed: completed + 1,
                    total,
                    timestamp: Utc::now(),
                }
            } else {
                StreamEvent::PostError {
                    topic_id: post.topic_id,
                    platform: post.platform,
                    error: post.error.unwrap_or_else(|| "unknown error".into()),
                    progress,
                    completed: completed + 1,
                    total,
                    timestamp: Utc::now(),
                }
            };
            if !send(&tx, event).await {
                return;
            }
        }

        let _ = tx
            .send(StreamEvent::Complete {
                progress: 100,
                message: "Pipeline finished".into(),
                total_processing_time: run_start.elapsed().as_secs_f64(),
                timestamp: Utc::now(),
            })
            .await;
    }

    fn stream_validate(&self, request: &PipelineRequest) -> std::result::Result<(), String> {
        if request.platforms.is_empty() {
            return Err("at least one platform is required".to_string());
        }
        for platform in &request.platforms {
            if let Err(err) = self.platforms().get(platform) {
                return Err(err.to_string());
            }
        }
        Ok(())
    }
}

/// Returns false when the receiver is gone and the run should stop.
async fn send(tx: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> bool {
    tx.send(event).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use postforge_llm::{DynModel, ScriptedModel};
    use tokio_stream::StreamExt;

    const TOPICS_JSON: &str = r#"[
        {"topic_name": "A", "content_excerpt": "aa", "confidence_score": 0.9},
        {"topic_name": "B", "content_excerpt": "bb", "confidence_score": 0.8}
    ]"#;
    const EMOTION_JSON: &str =
        r#"{"primary_emotion": "allay_fears", "emotion_confidence": 0.8, "reasoning": "r"}"#;

    use crate::orchestrator::RunMode;

    fn streaming_pipeline(responses: Vec<&str>) -> Pipeline {
        Pipeline::new(DynModel::new(ScriptedModel::new(
            responses.into_iter().map(String::from).collect(),
        )))
        .with_mode(RunMode::Sequential)
    }

    async fn collect(pipeline: Pipeline, request: PipelineRequest) -> Vec<StreamEvent> {
        pipeline.stream(request).collect().await
    }

    #[tokio::test]
    async fn successful_run_emits_canonical_sequence() {
        let pipeline = streaming_pipeline(vec![
            TOPICS_JSON,
            EMOTION_JSON,
            EMOTION_JSON,
            "post one",
            "post two",
        ]);
        let events = collect(pipeline, PipelineRequest::new("text", "https://x.test")).await;

        let kinds: Vec<&str> = events.iter().map(StreamEvent::event_type).collect();
        assert_eq!(
            kinds,
            vec!["status", "status", "status", "status", "status", "post", "post", "complete"]
        );

        let stages: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Status { stage, .. } => Some(stage.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            stages,
            vec![
                "init",
                "topic_extraction",
                "topic_extraction_complete",
                "emotion_analysis",
                "content_generation_start"
            ]
        );

        match &events[2] {
            StreamEvent::Status { topics_count, progress, .. } => {
                assert_eq!(*topics_count, Some(2));
                assert_eq!(*progress, 25);
            }
            other => panic!("expected status, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_ends_at_100() {
        let pipeline = streaming_pipeline(vec![
            TOPICS_JSON,
            EMOTION_JSON,
            EMOTION_JSON,
            "one",
            "two",
        ]);
        let events = collect(pipeline, PipelineRequest::new("text", "")).await;

        let progress: Vec<u8> = events
            .iter()
            .map(|e| match e {
                StreamEvent::Status { progress, .. }
                | StreamEvent::Post { progress, .. }
                | StreamEvent::PostError { progress, .. }
                | StreamEvent::Complete { progress, .. } => *progress,
                StreamEvent::Error { .. } => 0,
            })
            .collect();
        assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
        assert_eq!(progress.first(), Some(&0));
        assert_eq!(progress.last(), Some(&100));
    }

    #[tokio::test]
    async fn per_post_failures_become_post_error_events() {
        // Script runs dry on the second generation call.
        let pipeline = streaming_pipeline(vec![
            TOPICS_JSON,
            EMOTION_JSON,
            EMOTION_JSON,
            "post one",
        ]);
        let events = collect(pipeline, PipelineRequest::new("text", "")).await;

        let kinds: Vec<&str> = events.iter().map(StreamEvent::event_type).collect();
        assert_eq!(
            kinds,
            vec!["status", "status", "status", "status", "status", "post", "post_error", "complete"]
        );
        match &events[6] {
            StreamEvent::PostError { topic_id, platform, completed, total, .. } => {
                assert_eq!(*topic_id, 2);
                assert_eq!(platform, "twitter");
                assert_eq!(*completed, 2);
                assert_eq!(*total, 2);
            }
            other => panic!("expected post_error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_text_emits_terminal_error_event() {
        let pipeline = streaming_pipeline(vec![]);
        let events = collect(pipeline, PipelineRequest::new("  ", "")).await;

        let kinds: Vec<&str> = events.iter().map(StreamEvent::event_type).collect();
        assert_eq!(kinds, vec!["status", "status", "error"]);
        match events.last() {
            Some(StreamEvent::Error { stage, error, .. }) => {
                assert_eq!(stage, "topic_extraction");
                assert!(error.contains("empty"));
            }
            other => panic!("expected error event, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unsupported_platform_errors_before_extraction() {
        let pipeline = streaming_pipeline(vec![]);
        let request = PipelineRequest::new("text", "")
            .with_platforms(vec!["myspace".into()]);
        let events = collect(pipeline, request).await;

        let kinds: Vec<&str> = events.iter().map(StreamEvent::event_type).collect();
        assert_eq!(kinds, vec!["status", "error"]);
    }

    #[test]
    fn sse_frame_has_event_and_data_lines() {
        let event = StreamEvent::status("init", 0, "Starting pipeline...");
        let frame = event.to_sse();

        assert!(frame.starts_with("event: status\ndata: {"));
        assert!(frame.ends_with("}\n\n"));
        let data = frame
            .lines()
            .nth(1)
            .and_then(|l| l.strip_prefix("data: "))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(data).unwrap();
        assert_eq!(value["stage"], "init");
        assert_eq!(value["progress"], 0);
        // topics_count is omitted when absent.
        assert!(value.get("topics_count").is_none());
    }

    #[test]
    fn post_progress_band_runs_50_to_100() {
        assert_eq!(post_progress(1, 4), 63);
        assert_eq!(post_progress(2, 4), 75);
        assert_eq!(post_progress(4, 4), 100);
        assert_eq!(post_progress(0, 0), 100);
    }
}
