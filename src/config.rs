//! Configuration types for the game-master session.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for the agent worker and its sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Speech-to-text provider selection.
    pub stt: SttConfig,
    /// Language model provider selection.
    pub llm: LlmConfig,
    /// Text-to-speech provider selection.
    pub tts: TtsConfig,
    /// Voice activity detection settings.
    pub vad: VadConfig,
    /// Turn detection settings.
    pub turn_detection: TurnDetectionConfig,
    /// Room input settings.
    pub room: RoomConfig,
    /// Worker process settings.
    pub worker: WorkerConfig,
}

/// Speech-to-text configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// Provider name (e.g. `"deepgram"`).
    pub provider: String,
    /// Provider model identifier.
    pub model: String,
    /// BCP-47 language hint passed to the provider.
    pub language: String,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            provider: "deepgram".to_owned(),
            model: "nova-3".to_owned(),
            language: "en".to_owned(),
        }
    }
}

/// Language model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (e.g. `"google"`, `"openai"`, `"ollama"`).
    pub provider: String,
    /// Model name to request from the provider.
    pub model: String,
    /// Base URL of the OpenAI-compatible endpoint (without `/chat/completions`).
    pub api_url: String,
    /// Name of the environment variable holding the API key.
    ///
    /// Local servers usually need no key; leave the variable unset.
    pub api_key_env: String,
    /// Sampling temperature (0.0 = greedy, higher = more random).
    pub temperature: f64,
    /// Maximum tokens to generate per response.
    pub max_tokens: usize,
    /// Maximum number of history messages to retain (excluding the system prompt).
    ///
    /// Set to 0 to disable trimming.
    pub max_history_messages: usize,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Optional add-on appended after the built-in game-master prompt.
    pub system_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "google".to_owned(),
            model: "gemini-2.5-flash".to_owned(),
            // Gemini's OpenAI-compatible surface.
            api_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_owned(),
            api_key_env: "GOOGLE_API_KEY".to_owned(),
            temperature: 0.8,
            max_tokens: 400,
            max_history_messages: 40,
            request_timeout_secs: 30,
            system_prompt: String::new(),
        }
    }
}

impl LlmConfig {
    /// Returns the fully assembled system prompt.
    pub fn effective_system_prompt(&self) -> String {
        crate::personality::assemble_prompt(&self.system_prompt)
    }

    /// Returns a display name for the effective provider.
    pub fn effective_provider_name(&self) -> String {
        format!("{}/{}", self.provider, self.model)
    }
}

/// Text-to-speech configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Provider name (e.g. `"murf"`).
    pub provider: String,
    /// Voice identifier.
    pub voice: String,
    /// Speaking style.
    pub style: String,
    /// Whether the provider should pace long text for natural delivery.
    pub text_pacing: bool,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: "murf".to_owned(),
            voice: "en-US-marcus".to_owned(),
            style: "Conversational".to_owned(),
            text_pacing: true,
            sample_rate: 24_000,
        }
    }
}

/// Voice activity detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    /// RMS energy threshold for speech detection.
    ///
    /// Audio chunks with RMS above this value are classified as speech.
    /// Typical values for f32 samples in \[-1, 1\]:
    ///   - 0.005: very sensitive (picks up quiet speech and some noise)
    ///   - 0.01:  normal sensitivity (default)
    ///   - 0.05:  low sensitivity (only loud/close speech)
    pub threshold: f32,
    /// Minimum silence duration in ms to end a speech segment.
    pub min_silence_duration_ms: u32,
    /// Minimum speech duration in ms to consider valid.
    pub min_speech_duration_ms: u32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            threshold: 0.01,
            min_silence_duration_ms: 550,
            min_speech_duration_ms: 250,
        }
    }
}

/// How the session decides that the user finished speaking.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnDetectionMode {
    /// Every VAD speech segment ends the turn.
    Vad,
    /// A multilingual end-of-turn model supplied by the runtime.
    #[default]
    Multilingual,
}

/// Turn detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnDetectionConfig {
    /// Which detector the session expects.
    pub mode: TurnDetectionMode,
    /// End-of-turn probability at or above which the turn is complete.
    pub end_of_turn_threshold: f32,
}

impl Default for TurnDetectionConfig {
    fn default() -> Self {
        Self {
            mode: TurnDetectionMode::default(),
            end_of_turn_threshold: 0.5,
        }
    }
}

/// Noise cancellation applied to the room's inbound audio.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseCancellation {
    /// Background voice cancellation.
    #[default]
    Bvc,
    /// Background voice cancellation tuned for telephony audio.
    BvcTelephony,
    /// No noise cancellation.
    Off,
}

/// Room input configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Noise cancellation mode requested from the room.
    pub noise_cancellation: NoiseCancellation,
}

/// Worker process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Environment file holding provider credentials, loaded at process start.
    pub env_file: PathBuf,
    /// Maximum number of jobs running at once.
    pub max_concurrent_jobs: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            env_file: PathBuf::from(".env.local"),
            max_concurrent_jobs: 4,
        }
    }
}

impl AgentConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::AgentError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AgentError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/aureon/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("aureon").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("aureon")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/aureon-config/config.toml")
        }
    }

    /// Check the values that would otherwise fail deep inside a session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AgentError::Config`] describing the first invalid field.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AgentError;

        if self.llm.model.trim().is_empty() {
            return Err(AgentError::Config("llm.model must not be empty".into()));
        }
        if self.llm.api_url.trim().is_empty() {
            return Err(AgentError::Config("llm.api_url must not be empty".into()));
        }
        if self.stt.model.trim().is_empty() {
            return Err(AgentError::Config("stt.model must not be empty".into()));
        }
        if self.tts.voice.trim().is_empty() {
            return Err(AgentError::Config("tts.voice must not be empty".into()));
        }
        if self.tts.sample_rate == 0 {
            return Err(AgentError::Config("tts.sample_rate must be positive".into()));
        }
        if !(self.vad.threshold > 0.0 && self.vad.threshold <= 1.0) {
            return Err(AgentError::Config(format!(
                "vad.threshold must be in (0, 1], got {}",
                self.vad.threshold
            )));
        }
        let eot = self.turn_detection.end_of_turn_threshold;
        if !(0.0..=1.0).contains(&eot) {
            return Err(AgentError::Config(format!(
                "turn_detection.end_of_turn_threshold must be in [0, 1], got {eot}"
            )));
        }
        if self.worker.max_concurrent_jobs == 0 {
            return Err(AgentError::Config(
                "worker.max_concurrent_jobs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
