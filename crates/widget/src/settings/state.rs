use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

pub const SETTINGS_DIRECTORY_NAME: &str = "solva";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const SETTINGS_ENV_PREFIX: &str = "SOLVA_";

pub const DEFAULT_REPLY_DELAY_MS: u64 = 1_000;
/// Upper bound for the simulated latency.
pub const MAX_REPLY_DELAY_MS: u64 = 30_000;
pub const DEFAULT_ASSISTANT_NAME: &str = "Assistant SolvaticaTech";
pub const DEFAULT_GREETING: &str =
    "Bonjour ! Je suis l'assistant virtuel de SolvaticaTech. Comment puis-je vous aider ?";
pub const DEFAULT_CONTACT_PHONE: &str = "+22247776444";

/// What happens to a submission made while a reply is still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    #[default]
    Reject,
    Queue,
}

impl BusyPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reject" => Some(Self::Reject),
            "queue" => Some(Self::Queue),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Queue => "queue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetSettings {
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
    #[serde(default)]
    pub busy_policy: BusyPolicy,
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_contact_phone")]
    pub contact_phone: String,
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            reply_delay_ms: default_reply_delay_ms(),
            busy_policy: BusyPolicy::default(),
            assistant_name: default_assistant_name(),
            greeting: default_greeting(),
            contact_phone: default_contact_phone(),
            rng_seed: None,
        }
    }
}

impl WidgetSettings {
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms.min(MAX_REPLY_DELAY_MS))
    }

    /// WhatsApp deep link built from the digits of the contact phone.
    pub fn contact_link(&self) -> String {
        let digits = self
            .contact_phone
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>();
        format!("https://wa.me/{digits}")
    }

    pub fn normalized(mut self) -> Self {
        self.reply_delay_ms = self.reply_delay_ms.min(MAX_REPLY_DELAY_MS);
        self.assistant_name = non_blank_or(self.assistant_name, default_assistant_name);
        self.greeting = non_blank_or(self.greeting, default_greeting);
        self.contact_phone = non_blank_or(self.contact_phone, default_contact_phone);
        self
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<WidgetSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".solva"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from_disk(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> Arc<WidgetSettings> {
        self.settings.load_full()
    }

    pub fn update(&self, settings: WidgetSettings) -> SettingsResult<Arc<WidgetSettings>> {
        let normalized_settings = Arc::new(settings.normalized());
        self.persist(&normalized_settings)?;
        self.settings.store(normalized_settings.clone());
        Ok(normalized_settings)
    }

    fn load_from_disk(path: &Path) -> WidgetSettings {
        let mut figment = Figment::from(Serialized::defaults(WidgetSettings::default()));
        if path.exists() {
            figment = figment.merge(Json::file(path));
        } else {
            tracing::info!("settings file not found at {:?}, using defaults", path);
        }
        figment = figment.merge(Env::prefixed(SETTINGS_ENV_PREFIX));

        match figment.extract::<WidgetSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    "failed to parse settings from {:?}: {}. using defaults",
                    path,
                    error
                );
                WidgetSettings::default()
            }
        }
    }

    fn persist(&self, settings: &WidgetSettings) -> SettingsResult<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context(CreateDirSnafu {
                stage: "create-settings-directory",
                path: parent.to_path_buf(),
            })?;
        }

        let content = serde_json::to_string_pretty(settings).context(SerializeConfigSnafu {
            stage: "serialize-settings-json",
        })?;

        let temp_path = self.config_path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).context(WriteFileSnafu {
            stage: "write-temporary-settings-file",
            path: temp_path.clone(),
        })?;

        std::fs::rename(&temp_path, &self.config_path).context(RenameTempFileSnafu {
            stage: "rename-temporary-settings-file",
            from: temp_path,
            to: self.config_path.clone(),
        })?;

        tracing::info!("saved settings to {:?}", self.config_path);
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to create settings directory at {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to serialize settings on `{stage}`: {source}"))]
    SerializeConfig {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write settings file at {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "failed to replace settings file from {from:?} to {to:?} on `{stage}`: {source}"
    ))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

fn non_blank_or(value: String, fallback: fn() -> String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback()
    } else {
        trimmed.to_string()
    }
}

fn default_reply_delay_ms() -> u64 {
    DEFAULT_REPLY_DELAY_MS
}

fn default_assistant_name() -> String {
    DEFAULT_ASSISTANT_NAME.to_string()
}

fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}

fn default_contact_phone() -> String {
    DEFAULT_CONTACT_PHONE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_clamps_delay_and_fills_blanks() {
        let settings = WidgetSettings {
            reply_delay_ms: 90_000,
            assistant_name: "   ".to_string(),
            greeting: String::new(),
            ..WidgetSettings::default()
        }
        .normalized();

        assert_eq!(settings.reply_delay_ms, MAX_REPLY_DELAY_MS);
        assert_eq!(settings.assistant_name, DEFAULT_ASSISTANT_NAME);
        assert_eq!(settings.greeting, DEFAULT_GREETING);
    }

    #[test]
    fn contact_link_keeps_only_digits() {
        let settings = WidgetSettings {
            contact_phone: "+222 47 77 64 44".to_string(),
            ..WidgetSettings::default()
        };
        assert_eq!(settings.contact_link(), "https://wa.me/22247776444");
        assert_eq!(
            WidgetSettings::default().contact_link(),
            "https://wa.me/22247776444"
        );
    }

    #[test]
    fn busy_policy_parses_case_insensitively() {
        assert_eq!(BusyPolicy::parse(" Queue "), Some(BusyPolicy::Queue));
        assert_eq!(BusyPolicy::parse("REJECT"), Some(BusyPolicy::Reject));
        assert_eq!(BusyPolicy::parse("drop"), None);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SettingsStore::new(dir.path().join("absent.json"));
        assert_eq!(store.settings().reply_delay_ms, DEFAULT_REPLY_DELAY_MS);
        assert_eq!(store.settings().busy_policy, BusyPolicy::Reject);
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(SETTINGS_FILE_NAME);
        let store = SettingsStore::new(path.clone());

        let updated = store
            .update(WidgetSettings {
                reply_delay_ms: 250,
                busy_policy: BusyPolicy::Queue,
                rng_seed: Some(7),
                ..WidgetSettings::default()
            })
            .expect("persist settings");
        assert_eq!(updated.reply_delay_ms, 250);
        assert!(!path.with_extension("json.tmp").exists());

        let reloaded = SettingsStore::new(path);
        assert_eq!(reloaded.settings().reply_delay_ms, 250);
        assert_eq!(reloaded.settings().busy_policy, BusyPolicy::Queue);
        assert_eq!(reloaded.settings().rng_seed, Some(7));
    }

    #[test]
    fn partial_file_merges_over_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, r#"{ "busy_policy": "queue" }"#).expect("write settings");

        let store = SettingsStore::new(path);
        assert_eq!(store.settings().busy_policy, BusyPolicy::Queue);
        assert_eq!(store.settings().reply_delay_ms, DEFAULT_REPLY_DELAY_MS);
        assert_eq!(store.settings().assistant_name, DEFAULT_ASSISTANT_NAME);
    }
}
