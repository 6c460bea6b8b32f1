use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Sample rate of the PCM stream returned by the synthesis service.
pub const SYNTH_SAMPLE_RATE_HZ: u32 = 24_000;
/// Channel count of the PCM stream returned by the synthesis service.
pub const SYNTH_CHANNELS: u16 = 1;
/// Soft per-segment character cap accepted by the synthesis service.
pub const DEFAULT_SEGMENT_BUDGET: usize = 800;

pub const DEFAULT_HOST_LABEL: &str = "主持人";
pub const DEFAULT_GUEST_LABEL: &str = "嘉宾";
pub const DEFAULT_HOST_VOICE: &str = "zh_male_podcast_1";
pub const DEFAULT_GUEST_VOICE: &str = "zh_female_podcast_1";

pub const ENV_SPEECH_API_KEY: &str = "SPEECH_API_KEY";
pub const ENV_SPEECH_ENDPOINT: &str = "SPEECH_ENDPOINT";

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoiceId(String);

impl VoiceId {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyVoiceId);
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Maps each recognized speaker label to the service voice that reads it.
///
/// The synthesis service renders a whole segment in one call, so the full
/// assignment travels with every request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoiceAssignment {
    voices: BTreeMap<String, VoiceId>,
}

impl VoiceAssignment {
    pub fn two_speaker(
        host_label: &str,
        host_voice: VoiceId,
        guest_label: &str,
        guest_voice: VoiceId,
    ) -> Self {
        let mut voices = BTreeMap::new();
        voices.insert(host_label.to_owned(), host_voice);
        voices.insert(guest_label.to_owned(), guest_voice);
        Self { voices }
    }

    pub fn voice_for(&self, speaker: &str) -> Option<&VoiceId> {
        self.voices.get(speaker)
    }

    pub fn as_map(&self) -> &BTreeMap<String, VoiceId> {
        &self.voices
    }
}

impl Default for VoiceAssignment {
    fn default() -> Self {
        Self::two_speaker(
            DEFAULT_HOST_LABEL,
            VoiceId(DEFAULT_HOST_VOICE.to_owned()),
            DEFAULT_GUEST_LABEL,
            VoiceId(DEFAULT_GUEST_VOICE.to_owned()),
        )
    }
}

/// Per-segment character cap. Soft: a single line longer than the budget is
/// still sent whole (see `script::split_segments`).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SegmentBudget(usize);

impl SegmentBudget {
    pub fn new(chars: usize) -> Result<Self, ConfigError> {
        if chars == 0 {
            return Err(ConfigError::ZeroSegmentBudget);
        }
        Ok(Self(chars))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for SegmentBudget {
    fn default() -> Self {
        Self(DEFAULT_SEGMENT_BUDGET)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("voice id must not be empty")]
    EmptyVoiceId,
    #[error("segment budget must be > 0 characters")]
    ZeroSegmentBudget,
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiKey>, ConfigError> {
    match cli_value {
        Some(v) => Ok(Some(ApiKey::new(v)?)),
        None => match env.var(env_key) {
            Some(v) => Ok(Some(ApiKey::new(v)?)),
            None => Ok(None),
        },
    }
}

pub fn resolve_optional_string(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Option<String> {
    match cli_value {
        Some(v) => Some(v),
        None => env.var(env_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_cli_takes_precedence_over_env() {
        let env = MapEnv::default().with_var(ENV_SPEECH_API_KEY, "env-key");
        let key = resolve_api_key(Some("cli-key".to_owned()), ENV_SPEECH_API_KEY, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "cli-key");
    }

    #[test]
    fn api_key_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_SPEECH_API_KEY, "env-key");
        let key = resolve_api_key(None, ENV_SPEECH_API_KEY, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "env-key");
    }

    #[test]
    fn api_key_absent_when_neither_given() {
        let env = MapEnv::default();
        let key = resolve_api_key(None, ENV_SPEECH_API_KEY, &env).expect("no error");
        assert!(key.is_none());
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("secret").expect("valid");
        assert_eq!(format!("{key:?}"), "ApiKey(**redacted**)");
    }

    #[test]
    fn blank_api_key_rejected() {
        assert_eq!(ApiKey::new("  ").unwrap_err(), ConfigError::EmptyApiKey);
    }

    #[test]
    fn segment_budget_rejects_zero() {
        assert_eq!(
            SegmentBudget::new(0).unwrap_err(),
            ConfigError::ZeroSegmentBudget
        );
        assert_eq!(SegmentBudget::default().get(), DEFAULT_SEGMENT_BUDGET);
    }

    #[test]
    fn voice_assignment_lookup_by_label() {
        let voices = VoiceAssignment::default();
        assert_eq!(
            voices.voice_for(DEFAULT_HOST_LABEL).map(VoiceId::as_str),
            Some(DEFAULT_HOST_VOICE)
        );
        assert_eq!(
            voices.voice_for(DEFAULT_GUEST_LABEL).map(VoiceId::as_str),
            Some(DEFAULT_GUEST_VOICE)
        );
        assert!(voices.voice_for("旁白").is_none());
    }

    #[test]
    fn resolve_optional_string_env_fallback() {
        let env = MapEnv::default().with_var(ENV_SPEECH_ENDPOINT, "https://env.example/v1");
        assert_eq!(
            resolve_optional_string(None, ENV_SPEECH_ENDPOINT, &env).as_deref(),
            Some("https://env.example/v1")
        );
        assert_eq!(
            resolve_optional_string(Some("cli".to_owned()), ENV_SPEECH_ENDPOINT, &env).as_deref(),
            Some("cli")
        );
    }
}
