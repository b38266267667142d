//! Emotion classification stage: tag each topic with one of the five fixed
//! emotion themes. Per-topic decode failures degrade to a low-confidence
//! default instead of failing the batch.

use serde_json::{json, Map, Value};

use postforge_llm::DynModel;
use postforge_types::{EmotionTheme, EnhancedTopic, PostforgeError, Result, Topic};

use crate::prompts;

/// Confidence assigned when the model output could not be decoded at all.
const DECODE_FALLBACK_CONFIDENCE: f64 = 0.3;

/// Penalty applied when the model names a theme outside the fixed set.
const INVALID_THEME_PENALTY: f64 = 0.3;

/// Executes the emotion-classification stage, one model call per topic.
#[derive(Clone)]
pub struct EmotionAnalyzer {
    model: DynModel,
}

impl EmotionAnalyzer {
    pub fn new(model: DynModel) -> Self {
        Self { model }
    }

    /// Classify every topic in order. Fails only when the topic list is empty
    /// or a model call itself errors; bad model output degrades per topic.
    pub async fn analyze(
        &self,
        topics: &[Topic],
        audience_context: Option<&str>,
    ) -> Result<Vec<EnhancedTopic>> {
        if topics.is_empty() {
            return Err(PostforgeError::Stage {
                stage: "emotion_analysis".into(),
                message: "no topics provided".into(),
            });
        }

        let mut enhanced = Vec::with_capacity(topics.len());
        for topic in topics {
            enhanced.push(self.analyze_one(topic, audience_context).await?);
        }
        Ok(enhanced)
    }

    /// Classify a single topic.
    pub async fn analyze_one(
        &self,
        topic: &Topic,
        audience_context: Option<&str>,
    ) -> Result<EnhancedTopic> {
        let prompt = prompts::emotion_classification(topic, audience_context);
        let raw = self.model.invoke(&prompt).await?;

        let fields = postforge_decode::decode_object(&raw, fallback_classification);
        let enhanced = normalize(topic, &fields);
        tracing::debug!(
            topic_id = topic.id,
            theme = enhanced.emotion_theme.as_str(),
            confidence = enhanced.emotion_confidence,
            "emotion classified"
        );
        Ok(enhanced)
    }
}

/// Default classification used when the model output is undecodable.
fn fallback_classification() -> Map<String, Value> {
    let default = EmotionTheme::default();
    let mut map = Map::new();
    map.insert("primary_emotion".into(), json!(default.as_str()));
    map.insert("emotion_description".into(), json!(default.description()));
    map.insert(
        "emotion_confidence".into(),
        json!(DECODE_FALLBACK_CONFIDENCE),
    );
    map.insert(
        "reasoning".into(),
        json!(format!(
            "Failed to analyze emotion - defaulted to {}",
            default.as_str()
        )),
    );
    map
}

/// Fold the decoded classification into an [`EnhancedTopic`], repairing any
/// field the model got wrong.
fn normalize(topic: &Topic, fields: &Map<String, Value>) -> EnhancedTopic {
    let raw_theme = fields
        .get("primary_emotion")
        .and_then(Value::as_str)
        .unwrap_or("");
    let mut confidence = fields
        .get("emotion_confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.5);
    let mut reasoning = fields
        .get("reasoning")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("Emotion analysis for {}", topic.name));

    let theme = match EmotionTheme::parse(raw_theme) {
        Some(theme) => theme,
        None => {
            let default = EmotionTheme::default();
            confidence = (confidence - INVALID_THEME_PENALTY).max(0.1);
            reasoning.push_str(&format!(
                " (Note: Original emotion '{}' was invalid, defaulted to {})",
                raw_theme,
                default.as_str()
            ));
            default
        }
    };

    let description = fields
        .get("emotion_description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from)
        .unwrap_or_else(|| theme.description().to_string());

    EnhancedTopic {
        id: topic.id,
        name: topic.name.clone(),
        excerpt: topic.excerpt.clone(),
        confidence: topic.confidence,
        emotion_theme: theme,
        emotion_confidence: confidence.clamp(0.0, 1.0),
        emotion_description: description,
        reasoning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postforge_llm::ScriptedModel;

    fn topic(id: u32, name: &str) -> Topic {
        Topic {
            id,
            name: name.into(),
            excerpt: format!("{name} excerpt"),
            confidence: 0.9,
        }
    }

    fn analyzer_with(responses: Vec<&str>) -> EmotionAnalyzer {
        EmotionAnalyzer::new(DynModel::new(ScriptedModel::new(
            responses.into_iter().map(String::from).collect(),
        )))
    }

    #[tokio::test]
    async fn well_formed_classification_is_preserved() {
        let analyzer = analyzer_with(vec![
            r#"{"primary_emotion": "allay_fears", "emotion_description": "Reduce anxiety",
                "emotion_confidence": 0.85, "reasoning": "The topic is about uncertainty."}"#,
        ]);
        let enhanced = analyzer.analyze_one(&topic(1, "Launch Jitters"), None).await.unwrap();

        assert_eq!(enhanced.emotion_theme, EmotionTheme::AllayFears);
        assert!((enhanced.emotion_confidence - 0.85).abs() < f64::EPSILON);
        assert_eq!(enhanced.reasoning, "The topic is about uncertainty.");
        assert_eq!(enhanced.name, "Launch Jitters");
        assert_eq!(enhanced.id, 1);
    }

    #[tokio::test]
    async fn invalid_theme_defaults_with_penalty() {
        let analyzer = analyzer_with(vec![
            r#"{"primary_emotion": "rage", "emotion_confidence": 0.9, "reasoning": "Anger sells."}"#,
        ]);
        let enhanced = analyzer.analyze_one(&topic(1, "T"), None).await.unwrap();

        assert_eq!(enhanced.emotion_theme, EmotionTheme::EncourageDreams);
        assert!((enhanced.emotion_confidence - 0.6).abs() < 1e-9);
        assert!(enhanced.reasoning.contains("'rage' was invalid"));
    }

    #[tokio::test]
    async fn penalty_floors_at_point_one() {
        let analyzer = analyzer_with(vec![
            r#"{"primary_emotion": "nope", "emotion_confidence": 0.2, "reasoning": "weak"}"#,
        ]);
        let enhanced = analyzer.analyze_one(&topic(1, "T"), None).await.unwrap();
        assert!((enhanced.emotion_confidence - 0.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn undecodable_output_uses_fallback_classification() {
        let analyzer = analyzer_with(vec!["sorry, I cannot help with that"]);
        let enhanced = analyzer.analyze_one(&topic(3, "T"), None).await.unwrap();

        assert_eq!(enhanced.emotion_theme, EmotionTheme::EncourageDreams);
        assert!((enhanced.emotion_confidence - 0.3).abs() < f64::EPSILON);
        assert!(enhanced.reasoning.contains("Failed to analyze emotion"));
        assert_eq!(enhanced.id, 3);
    }

    #[tokio::test]
    async fn missing_fields_get_defaults() {
        let analyzer = analyzer_with(vec![r#"{"primary_emotion": "confirm_suspicions"}"#]);
        let enhanced = analyzer.analyze_one(&topic(1, "Rigged Game"), None).await.unwrap();

        assert_eq!(enhanced.emotion_theme, EmotionTheme::ConfirmSuspicions);
        assert!((enhanced.emotion_confidence - 0.5).abs() < f64::EPSILON);
        assert_eq!(enhanced.reasoning, "Emotion analysis for Rigged Game");
        assert_eq!(
            enhanced.emotion_description,
            EmotionTheme::ConfirmSuspicions.description()
        );
    }

    #[tokio::test]
    async fn confidence_is_clamped_to_unit_interval() {
        let analyzer = analyzer_with(vec![
            r#"{"primary_emotion": "unite_against_challenges", "emotion_confidence": 3.5, "reasoning": "r"}"#,
        ]);
        let enhanced = analyzer.analyze_one(&topic(1, "T"), None).await.unwrap();
        assert!((enhanced.emotion_confidence - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let analyzer = analyzer_with(vec![
            r#"{"primary_emotion": "allay_fears", "emotion_confidence": 0.8, "reasoning": "a"}"#,
            r#"{"primary_emotion": "justify_failures", "emotion_confidence": 0.7, "reasoning": "b"}"#,
        ]);
        let topics = vec![topic(1, "First"), topic(2, "Second")];
        let enhanced = analyzer.analyze(&topics, None).await.unwrap();

        assert_eq!(enhanced.len(), 2);
        assert_eq!(enhanced[0].id, 1);
        assert_eq!(enhanced[0].emotion_theme, EmotionTheme::AllayFears);
        assert_eq!(enhanced[1].id, 2);
        assert_eq!(enhanced[1].emotion_theme, EmotionTheme::JustifyFailures);
    }

    #[tokio::test]
    async fn empty_topic_list_is_stage_error() {
        let analyzer = analyzer_with(vec![]);
        match analyzer.analyze(&[], None).await {
            Err(PostforgeError::Stage { stage, .. }) => assert_eq!(stage, "emotion_analysis"),
            other => panic!("expected Stage error, got: {other:?}"),
        }
    }
}
