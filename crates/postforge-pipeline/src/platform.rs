//! Per-platform posting constraints: character limits, tone, and the advisory
//! content-length window embedded in generation prompts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use postforge_types::{PostforgeError, Result};

// ---------------------------------------------------------------------------
// PlatformConfig
// ---------------------------------------------------------------------------

/// Static configuration for one destination platform.
///
/// The content-length window is advisory: it is embedded in the generation
/// prompt but never enforced in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub name: String,
    pub character_limit: usize,
    pub min_content_length: usize,
    pub max_content_length: usize,
    pub tone_guidance: String,
    pub strategy: String,
}

// ---------------------------------------------------------------------------
// PlatformRegistry
// ---------------------------------------------------------------------------

/// Read-only registry of supported platforms. Injected into the pipeline as a
/// value and safely shared across concurrent tasks.
#[derive(Debug, Clone)]
pub struct PlatformRegistry {
    configs: HashMap<String, PlatformConfig>,
}

impl PlatformRegistry {
    /// The built-in platform set: twitter and linkedin.
    pub fn builtin() -> Self {
        let mut configs = HashMap::new();
        configs.insert(
            "twitter".to_string(),
            PlatformConfig {
                name: "twitter".to_string(),
                character_limit: 280,
                // Twitter shortens URLs to ~23 chars, leave room for one.
                min_content_length: 210,
                max_content_length: 240,
                tone_guidance: "Engaging, conversational, and authentic. Use questions to drive engagement.".to_string(),
                strategy: "single_tweet".to_string(),
            },
        );
        configs.insert(
            "linkedin".to_string(),
            PlatformConfig {
                name: "linkedin".to_string(),
                character_limit: 3000,
                min_content_length: 1200,
                max_content_length: 2800,
                tone_guidance: "Professional, insightful, and thought-provoking.".to_string(),
                strategy: "professional_post".to_string(),
            },
        );
        Self { configs }
    }

    /// Look up a platform by name (case-insensitive).
    pub fn get(&self, platform: &str) -> Result<&PlatformConfig> {
        self.configs
            .get(platform.to_lowercase().as_str())
            .ok_or_else(|| PostforgeError::UnsupportedPlatform {
                platform: platform.to_string(),
            })
    }

    pub fn is_supported(&self, platform: &str) -> bool {
        self.configs.contains_key(platform.to_lowercase().as_str())
    }

    /// Supported platform names, sorted for stable output.
    pub fn supported(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.configs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
