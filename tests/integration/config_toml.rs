//! Configuration files as users write them.

use aureon::AgentError;
use aureon::config::{AgentConfig, NoiseCancellation, TurnDetectionMode};

#[test]
fn partial_file_keeps_defaults_for_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[llm]
model = "gpt-4o-mini"
api_url = "https://api.openai.com/v1"
api_key_env = "OPENAI_API_KEY"

[turn_detection]
mode = "vad"

[room]
noise_cancellation = "bvc_telephony"
"#,
    )
    .unwrap();

    let config = AgentConfig::from_file(&path).unwrap();
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
    assert_eq!(config.turn_detection.mode, TurnDetectionMode::Vad);
    assert_eq!(config.room.noise_cancellation, NoiseCancellation::BvcTelephony);

    assert_eq!(config.stt.model, "nova-3");
    assert_eq!(config.tts.voice, "en-US-marcus");
    assert_eq!(config.tts.style, "Conversational");
    assert!(config.validate().is_ok());
}

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = AgentConfig::default();
    config.llm.system_prompt = "Keep scenes short.".to_owned();
    config.worker.max_concurrent_jobs = 8;
    config.room.noise_cancellation = NoiseCancellation::Off;
    config.save_to_file(&path).unwrap();

    let loaded = AgentConfig::from_file(&path).unwrap();
    assert_eq!(loaded.llm.system_prompt, "Keep scenes short.");
    assert_eq!(loaded.worker.max_concurrent_jobs, 8);
    assert_eq!(loaded.room.noise_cancellation, NoiseCancellation::Off);
    assert!(loaded.llm.effective_system_prompt().ends_with("Keep scenes short."));
}

#[test]
fn unknown_enum_value_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[turn_detection]\nmode = \"telepathy\"\n").unwrap();
    assert!(matches!(
        AgentConfig::from_file(&path),
        Err(AgentError::Config(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        AgentConfig::from_file(&dir.path().join("absent.toml")),
        Err(AgentError::Io(_))
    ));
}
