//! Prompt builders for the three pipeline stages.
//!
//! Each builder returns one complete prompt string. The JSON shape each prompt
//! asks for is the shape the corresponding stage decodes; the instructions are
//! advisory — the Lenient Decoder handles whatever actually comes back.

use postforge_types::{EmotionTheme, EnhancedTopic, Topic};

use crate::platform::PlatformConfig;

/// Prompt asking for a JSON array of 1..=max_topics distinct topics.
pub fn topic_extraction(text: &str, max_topics: usize) -> String {
    format!(
        r#"You are a topic extraction expert. Extract distinct topics from the given text.

IMPORTANT: Respond with ONLY a valid JSON array. No other text or formatting.

Format each topic as:
{{
  "topic_name": "clear topic name",
  "content_excerpt": "relevant text excerpt",
  "confidence_score": number between 0.0 and 1.0
}}

Extract 1 to {max_topics} topics. Each topic should be distinct and meaningful.

CRITICAL: You must respond with ONLY the JSON array. Do not include any explanations, markdown formatting, or additional text. Start with [ and end with ].

Extract topics from this text:

{text}"#
    )
}

/// Prompt classifying one topic against the 5 fixed emotion themes.
pub fn emotion_classification(topic: &Topic, audience_context: Option<&str>) -> String {
    let themes = EmotionTheme::ALL
        .iter()
        .map(|t| t.prompt_line())
        .collect::<Vec<_>>()
        .join("\n");
    let theme_names = EmotionTheme::ALL
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join("|");
    let audience = audience_context.unwrap_or("No audience context provided");

    format!(
        r#"You are an expert marketing psychologist specializing in emotional targeting for content marketing.

Your task is to analyze the given topic and determine which of these 5 emotional themes it should target:

{themes}

<targetAudience>
{audience}
</targetAudience>

<coreIdea>
{name}
</coreIdea>

<referenceText>
{excerpt}
</referenceText>

Select the ONE theme that best fits topic ID {id}, with a confidence score and your reasoning.

Return your response as a JSON object with this structure:
{{
  "primary_emotion": "{theme_names}",
  "emotion_description": "A short description of the emotion theme",
  "emotion_confidence": 0.85,
  "reasoning": "Detailed explanation of why this emotion theme is the best match for this topic"
}}"#,
        name = topic.name,
        excerpt = topic.excerpt,
        id = topic.id,
    )
}

/// Prompt asking for one platform post body within the advisory length window.
pub fn content_generation(
    topic: &EnhancedTopic,
    platform: &PlatformConfig,
    audience_context: Option<&str>,
) -> String {
    let audience = audience_context
        .map(|a| format!("\nTARGET AUDIENCE:\n{a}\n"))
        .unwrap_or_default();

    format!(
        r#"You are a social media content creator. Write a {platform_name} post with integrated call-to-action.

ABSOLUTE REQUIREMENTS:
- MUST be between {min}-{max} characters EXACTLY
- NEVER exceed {max} characters
- Count every character including spaces and punctuation
- Do NOT include URLs (they are added separately)

CONTENT REQUIREMENTS:
- Topic: {name}
- Emotion: {emotion}
- Why this emotion: {reasoning}
- Tone: {tone}
- Include natural call-to-action in the text
- Make it engaging and valuable
{audience}
RESPONSE FORMAT:
Return ONLY the post text. No explanations, no formatting, no URLs."#,
        platform_name = platform.name,
        min = platform.min_content_length,
        max = platform.max_content_length,
        name = topic.name,
        emotion = topic.emotion_theme.as_str(),
        reasoning = topic.reasoning,
        tone = platform.tone_guidance,
    )
}
