//! End-to-end pipeline runs against a scripted model.

use postforge_llm::{DynModel, ScriptedModel};
use postforge_pipeline::{Pipeline, PipelineRequest, RunMode, StreamEvent};
use postforge_types::EmotionTheme;
use tokio_stream::StreamExt;

fn scripted(responses: Vec<&str>) -> DynModel {
    DynModel::new(ScriptedModel::new(
        responses.into_iter().map(String::from).collect(),
    ))
}

#[tokio::test]
async fn happy_path_two_topics_two_platforms() {
    let model = scripted(vec![
        // Topic extraction, wrapped in a markdown fence like real model output.
        "```json\n[\n  {\"topic_name\": \"Creator Burnout\", \"content_excerpt\": \"burnout\", \"confidence_score\": 0.92},\n  {\"topic_name\": \"Algorithm Anxiety\", \"content_excerpt\": \"reach\", \"confidence_score\": 0.81}\n]\n```",
        // One classification per topic.
        r#"{"primary_emotion": "justify_failures", "emotion_confidence": 0.85, "reasoning": "Burnout is structural."}"#,
        r#"{"primary_emotion": "allay_fears", "emotion_confidence": 0.8, "reasoning": "Reach anxiety is common."}"#,
        // One body per (topic, platform) pair.
        "Burnout tweet body.",
        "Burnout linkedin body.",
        "Anxiety tweet body.",
        "Anxiety linkedin body.",
    ]);

    let pipeline = Pipeline::new(model).with_mode(RunMode::Sequential);
    let request = PipelineRequest::new(
        "Creators are burning out while chasing an algorithm they cannot see.",
        "https://example.com/essay",
    )
    .with_platforms(vec!["twitter".into(), "linkedin".into()])
    .with_audience_context("independent creators");

    let result = pipeline.run(&request).await;

    assert!(result.success, "run failed: {:?}", result.error);
    assert_eq!(result.total_topics, 2);
    assert_eq!(result.topics[0].name, "Creator Burnout");
    assert_eq!(result.enhanced_topics[0].emotion_theme, EmotionTheme::JustifyFailures);
    assert_eq!(result.enhanced_topics[1].emotion_theme, EmotionTheme::AllayFears);

    assert_eq!(result.generated_posts.len(), 4);
    assert_eq!(result.successful_generations, 4);
    for post in &result.generated_posts {
        assert!(post.success);
        assert!(post.content.ends_with(" https://example.com/essay"));
    }

    // The result serializes with the external wire field names.
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["topics"][0]["topic_id"], 1);
    assert_eq!(json["topics"][0]["topic_name"], "Creator Burnout");
    assert_eq!(json["topics"][0]["confidence_score"], 0.92);
    assert_eq!(json["enhanced_topics"][0]["primary_emotion"], "justify_failures");
    assert_eq!(json["generated_posts"][0]["topic_id"], 1);
}

#[tokio::test]
async fn degraded_model_output_still_completes() {
    // Extraction returns prose (fallback topic), classification returns
    // garbage (default theme at low confidence), generation still works.
    let model = scripted(vec![
        "Here are some topics I found interesting...",
        "I am unable to answer in JSON today.",
        "A perfectly good post body.",
    ]);

    let pipeline = Pipeline::new(model).with_mode(RunMode::Sequential);
    let result = pipeline
        .run(&PipelineRequest::new("Some source text worth posting about.", ""))
        .await;

    assert!(result.success, "run failed: {:?}", result.error);
    assert_eq!(result.total_topics, 1);
    assert_eq!(result.topics[0].name, "Main theme from the provided text");
    assert!((result.topics[0].confidence - 0.7).abs() < f64::EPSILON);

    let enhanced = &result.enhanced_topics[0];
    assert_eq!(enhanced.emotion_theme, EmotionTheme::EncourageDreams);
    assert!((enhanced.emotion_confidence - 0.3).abs() < f64::EPSILON);

    assert_eq!(result.generated_posts[0].content, "A perfectly good post body.");
}

#[tokio::test]
async fn parallel_run_matches_sequential_shape() {
    let responses = vec![
        r#"[{"topic_name": "A", "content_excerpt": "aa"}, {"topic_name": "B", "content_excerpt": "bb"}]"#
            .to_string(),
    ];
    let model = DynModel::new(
        ScriptedModel::new(responses).with_repeat(
            r#"{"primary_emotion": "unite_against_challenges", "emotion_confidence": 0.7, "reasoning": "shared fight"}"#,
        ),
    );

    let pipeline = Pipeline::new(model)
        .with_mode(RunMode::Parallel)
        .with_concurrency(2);
    let request = PipelineRequest::new("text", "https://x.test")
        .with_platforms(vec!["twitter".into(), "linkedin".into()]);

    let result = pipeline.run(&request).await;

    assert!(result.success);
    assert_eq!(result.generated_posts.len(), 4);
    // Submission order: topics outer, platforms inner.
    let pairs: Vec<(u32, &str)> = result
        .generated_posts
        .iter()
        .map(|p| (p.topic_id, p.platform.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![(1, "twitter"), (1, "linkedin"), (2, "twitter"), (2, "linkedin")]
    );
}

#[tokio::test]
async fn streamed_run_renders_sse_frames() {
    let model = scripted(vec![
        r#"[{"topic_name": "A", "content_excerpt": "aa"}]"#,
        r#"{"primary_emotion": "allay_fears", "emotion_confidence": 0.8, "reasoning": "r"}"#,
        "post body",
    ]);
    let pipeline = Pipeline::new(model).with_mode(RunMode::Sequential);

    let events: Vec<StreamEvent> = pipeline
        .stream(PipelineRequest::new("text", "https://x.test"))
        .collect()
        .await;

    let kinds: Vec<&str> = events.iter().map(StreamEvent::event_type).collect();
    assert_eq!(
        kinds,
        vec!["status", "status", "status", "status", "status", "post", "complete"]
    );

    for event in &events {
        let frame = event.to_sse();
        let mut lines = frame.lines();
        let event_line = lines.next().unwrap();
        let data_line = lines.next().unwrap();
        assert_eq!(event_line, format!("event: {}", event.event_type()));
        let payload: serde_json::Value = serde_json::from_str(
            data_line.strip_prefix("data: ").unwrap(),
        )
        .unwrap();
        assert!(payload.is_object());
        assert!(frame.ends_with("\n\n"));
    }

    match &events[5] {
        StreamEvent::Post { post, topic_name, completed, total, .. } => {
            assert_eq!(topic_name, "A");
            assert_eq!(post.content, "post body https://x.test");
            assert_eq!((*completed, *total), (1, 1));
        }
        other => panic!("expected post event, got: {other:?}"),
    }
}
