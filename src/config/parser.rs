use super::ConfigError;
use super::validator::{require_non_empty, require_positive, require_snowflake};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub discord: DiscordConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub housekeeping: HousekeepingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscordConfig {
    #[serde(default, alias = "token")]
    pub bot_token: String,
    pub guild_id: String,
    #[serde(alias = "channel_id")]
    pub roster_channel_id: String,
    pub log_channel_id: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    #[serde(default = "default_debounce_threshold")]
    pub debounce_threshold: u32,
    #[serde(default = "default_event_delay_ms")]
    pub event_delay_ms: u64,
    #[serde(default = "default_active_tick_delay_ms")]
    pub active_tick_delay_ms: u64,
    #[serde(default = "default_idle_tick_delay_ms")]
    pub idle_tick_delay_ms: u64,
    #[serde(default)]
    pub max_rate_limit_retries: Option<u32>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            debounce_threshold: default_debounce_threshold(),
            event_delay_ms: default_event_delay_ms(),
            active_tick_delay_ms: default_active_tick_delay_ms(),
            idle_tick_delay_ms: default_idle_tick_delay_ms(),
            max_rate_limit_retries: None,
        }
    }
}

impl PollingConfig {
    pub fn event_delay(&self) -> Duration {
        Duration::from_millis(self.event_delay_ms)
    }

    pub fn active_tick_delay(&self) -> Duration {
        Duration::from_millis(self.active_tick_delay_ms)
    }

    pub fn idle_tick_delay(&self) -> Duration {
        Duration::from_millis(self.idle_tick_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    #[serde(default = "default_error_log_file")]
    pub error_log_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            error_log_file: default_error_log_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HousekeepingConfig {
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
    #[serde(default = "default_target_uptime_days")]
    pub target_uptime_days: u64,
}

impl Default for HousekeepingConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: default_report_interval_secs(),
            target_uptime_days: default_target_uptime_days(),
        }
    }
}

impl HousekeepingConfig {
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(alias = "console", default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty("discord.bot_token", &self.discord.bot_token)?;
        require_snowflake("discord.guild_id", &self.discord.guild_id)?;
        require_snowflake("discord.roster_channel_id", &self.discord.roster_channel_id)?;
        require_snowflake("discord.log_channel_id", &self.discord.log_channel_id)?;
        require_non_empty("discord.api_base_url", &self.discord.api_base_url)?;

        if self.polling.debounce_threshold == 0 {
            return Err(ConfigError::InvalidConfig(
                "polling.debounce_threshold must be at least 1".to_string(),
            ));
        }

        require_positive(
            "housekeeping.report_interval_secs",
            self.housekeeping.report_interval_secs,
        )?;

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("BOT_TOKEN") {
            self.discord.bot_token = value;
        }
        if let Ok(value) = std::env::var("ROSTER_GUILD_ID") {
            self.discord.guild_id = value;
        }
        if let Ok(value) = std::env::var("ROSTER_CHANNEL_ID") {
            self.discord.roster_channel_id = value;
        }
        if let Ok(value) = std::env::var("ROSTER_LOG_CHANNEL_ID") {
            self.discord.log_channel_id = value;
        }
    }
}

fn default_api_base_url() -> String {
    "https://discord.com/api/v9".to_string()
}

fn default_debounce_threshold() -> u32 {
    6
}

fn default_event_delay_ms() -> u64 {
    5000
}

fn default_active_tick_delay_ms() -> u64 {
    500
}

fn default_idle_tick_delay_ms() -> u64 {
    30000
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data.json")
}

fn default_error_log_file() -> PathBuf {
    PathBuf::from("error.log")
}

fn default_report_interval_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_target_uptime_days() -> u64 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::Config;
    use crate::config::ConfigError;

    const MINIMAL: &str = r#"
discord:
  bot_token: "secret"
  guild_id: "199916140183420928"
  roster_channel_id: "1113151362507755531"
  log_channel_id: "332575578383187970"
"#;

    #[test]
    fn minimal_config_fills_defaults() {
        let config = Config::from_yaml(MINIMAL).expect("parse");
        config.validate().expect("valid");

        assert_eq!(config.discord.api_base_url, "https://discord.com/api/v9");
        assert_eq!(config.polling.debounce_threshold, 6);
        assert_eq!(config.polling.event_delay(), Duration::from_millis(5000));
        assert_eq!(config.polling.active_tick_delay(), Duration::from_millis(500));
        assert_eq!(config.polling.idle_tick_delay(), Duration::from_millis(30000));
        assert_eq!(config.polling.max_rate_limit_retries, None);
        assert_eq!(config.storage.data_file, PathBuf::from("data.json"));
        assert_eq!(config.storage.error_log_file, PathBuf::from("error.log"));
        assert_eq!(
            config.housekeeping.report_interval(),
            Duration::from_secs(604_800)
        );
        assert_eq!(config.housekeeping.target_uptime_days, 7);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn polling_overrides_are_read() {
        let yaml = format!(
            "{MINIMAL}polling:\n  debounce_threshold: 3\n  idle_tick_delay_ms: 1000\n  max_rate_limit_retries: 10\n"
        );
        let config = Config::from_yaml(&yaml).expect("parse");

        assert_eq!(config.polling.debounce_threshold, 3);
        assert_eq!(config.polling.idle_tick_delay_ms, 1000);
        assert_eq!(config.polling.event_delay_ms, 5000);
        assert_eq!(config.polling.max_rate_limit_retries, Some(10));
    }

    #[test]
    fn empty_token_is_rejected() {
        let yaml = MINIMAL.replace("\"secret\"", "\"\"");
        let config = Config::from_yaml(&yaml).expect("parse");

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(ref msg) if msg.contains("bot_token")));
    }

    #[test]
    fn zero_debounce_threshold_is_rejected() {
        let yaml = format!("{MINIMAL}polling:\n  debounce_threshold: 0\n");
        let config = Config::from_yaml(&yaml).expect("parse");

        assert!(config.validate().is_err());
    }

    #[test]
    fn non_numeric_channel_is_rejected() {
        let yaml = MINIMAL.replace("\"1113151362507755531\"", "\"reg-tracking\"");
        let config = Config::from_yaml(&yaml).expect("parse");

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("roster_channel_id"));
    }

    #[test]
    fn missing_discord_section_fails_to_parse() {
        let err = Config::from_yaml("polling:\n  debounce_threshold: 6\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
