//! Configuration types for the turn pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SolaceError};

/// Top-level configuration for the solace service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolaceConfig {
    /// Reply model settings.
    pub llm: LlmConfig,
    /// Session title model settings.
    pub title: TitleConfig,
    /// Emotion classifier settings.
    pub emotion: EmotionConfig,
    /// Per-call time bounds for external collaborators.
    pub timeouts: TimeoutConfig,
    /// Conversation history windowing.
    pub history: HistoryConfig,
    /// Crisis bypass settings.
    pub crisis: CrisisConfig,
    /// Session store settings.
    pub store: StoreConfig,
}

/// Which hosted model API to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// OpenAI Chat Completions API (or compatible).
    OpenAi,
    /// Google Gemini `generateContent` API.
    Gemini,
}

impl ModelProvider {
    /// Default base URL for the provider.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com",
            Self::Gemini => "https://generativelanguage.googleapis.com",
        }
    }
}

/// Reply model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider used for replies.
    pub provider: ModelProvider,
    /// Base URL override. Empty means the provider default.
    pub api_url: String,
    /// API key. Usually supplied via `OPENAI_API_KEY`.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Maximum tokens per reply (0 = provider default).
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::OpenAi,
            api_url: String::new(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_owned(),
            max_tokens: 0,
        }
    }
}

/// Session title synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    /// Provider used for the short-label call.
    pub provider: ModelProvider,
    /// Base URL override. Empty means the provider default.
    pub api_url: String,
    /// API key. Usually supplied via `GEMINI_API_KEY`.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Maximum number of words kept from a synthesized title.
    pub max_words: usize,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::Gemini,
            api_url: String::new(),
            api_key: String::new(),
            model: "gemini-1.5-flash".to_owned(),
            max_words: 4,
        }
    }
}

/// Which emotion classifier implementation to use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionBackend {
    /// Offline keyword lexicon (no network).
    #[default]
    Lexicon,
    /// Hugging Face hosted inference API.
    HuggingFace,
}

/// Emotion classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    /// Classifier backend.
    pub backend: EmotionBackend,
    /// Inference API base URL (Hugging Face backend only).
    pub api_url: String,
    /// Inference API token. Usually supplied via `HF_API_TOKEN`.
    pub api_token: String,
    /// Text emotion model repo ID.
    pub text_model: String,
    /// Speech emotion model repo ID.
    pub audio_model: String,
    /// Whether the audio modality is classified at all.
    pub audio_enabled: bool,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            backend: EmotionBackend::default(),
            api_url: "https://api-inference.huggingface.co".to_owned(),
            api_token: String::new(),
            text_model: "j-hartmann/emotion-english-distilroberta-base".to_owned(),
            audio_model: "ehcalabres/wav2vec2-lg-xlsr-en-speech-emotion-recognition".to_owned(),
            audio_enabled: true,
        }
    }
}

/// Per-call time bounds. A timed-out call degrades exactly like a failed one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Bound for each classifier call, in milliseconds.
    pub classifier_ms: u64,
    /// Bound for the reply generation call, in milliseconds.
    pub generation_ms: u64,
    /// Bound for the title synthesis call, in milliseconds.
    pub title_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            classifier_ms: 10_000,
            generation_ms: 30_000,
            title_ms: 10_000,
        }
    }
}

impl TimeoutConfig {
    /// Classifier bound as a [`Duration`].
    pub fn classifier(&self) -> Duration {
        Duration::from_millis(self.classifier_ms)
    }

    /// Generation bound as a [`Duration`].
    pub fn generation(&self) -> Duration {
        Duration::from_millis(self.generation_ms)
    }

    /// Title bound as a [`Duration`].
    pub fn title(&self) -> Duration {
        Duration::from_millis(self.title_ms)
    }
}

/// History windowing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Keep only the most recent N interactions. 0 keeps everything.
    pub max_interactions: usize,
}

/// Crisis bypass configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrisisConfig {
    /// Phrases added to the built-in high-risk phrase set.
    pub extra_phrases: Vec<String>,
    /// Minimum score for a high-risk emotion label to trigger the bypass.
    pub emotion_threshold: f32,
}

impl Default for CrisisConfig {
    fn default() -> Self {
        Self {
            extra_phrases: Vec::new(),
            emotion_threshold: 0.6,
        }
    }
}

/// Which session store to use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store; sessions are lost on exit.
    #[default]
    Memory,
    /// JSON files on disk.
    Fs,
}

/// Session store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store backend.
    pub backend: StoreBackend,
    /// Data directory for the filesystem store. `None` uses the platform default.
    pub data_dir: Option<PathBuf>,
}

impl StoreConfig {
    /// Resolved data directory for the filesystem store.
    pub fn effective_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(crate::solace_dirs::sessions_dir)
    }
}

impl SolaceConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SolaceError::Config(e.to_string()))
    }

    /// Load the file at `path` if it exists, otherwise return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SolaceError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `config_dir()/config.toml`.
    pub fn default_config_path() -> PathBuf {
        crate::solace_dirs::config_dir().join("config.toml")
    }

    /// Fill secrets and paths from the environment.
    ///
    /// Reads `OPENAI_API_KEY`, `GEMINI_API_KEY`, `HF_API_TOKEN` and
    /// `SOLACE_DATA_DIR`. A variable only applies to the providers that use it,
    /// and never overrides a value already set in the file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let key_for = |provider: ModelProvider| match provider {
            ModelProvider::OpenAi => lookup("OPENAI_API_KEY"),
            ModelProvider::Gemini => lookup("GEMINI_API_KEY"),
        };
        if self.llm.api_key.is_empty() {
            if let Some(key) = key_for(self.llm.provider) {
                self.llm.api_key = key;
            }
        }
        if self.title.api_key.is_empty() {
            if let Some(key) = key_for(self.title.provider) {
                self.title.api_key = key;
            }
        }
        if self.emotion.api_token.is_empty() {
            if let Some(token) = lookup("HF_API_TOKEN") {
                self.emotion.api_token = token;
            }
        }
        if self.store.data_dir.is_none() {
            if let Some(dir) = lookup("SOLACE_DATA_DIR") {
                self.store.data_dir = Some(PathBuf::from(dir).join("sessions"));
            }
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SolaceError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.timeouts.classifier_ms == 0
            || self.timeouts.generation_ms == 0
            || self.timeouts.title_ms == 0
        {
            return Err(SolaceError::Config(
                "timeouts must be greater than zero".to_owned(),
            ));
        }
        if !(0.0..=1.0).contains(&self.crisis.emotion_threshold) {
            return Err(SolaceError::Config(format!(
                "crisis.emotion_threshold must be within [0, 1], got {}",
                self.crisis.emotion_threshold
            )));
        }
        if self.title.max_words == 0 {
            return Err(SolaceError::Config(
                "title.max_words must be at least 1".to_owned(),
            ));
        }
        if self.llm.model.trim().is_empty() || self.title.model.trim().is_empty() {
            return Err(SolaceError::Config("model names must not be empty".to_owned()));
        }
        Ok(())
    }
}
