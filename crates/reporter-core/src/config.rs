use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{ReporterError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "reporter.toml";
pub const DEFAULT_TICK_MS: u64 = 1_000;
pub const DEFAULT_CREATE_EVERY_TICKS: u64 = 60;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RESULTS_PATH: &str = "results.csv";
pub const DEFAULT_DELIMITER: char = ';';

/// Top-level config (reporter.toml + REPORTER_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

/// Remote reporting service endpoint and credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL without trailing slash, e.g. `https://host/api/v0.1`.
    #[serde(deserialize_with = "deserialize_text")]
    pub base_url: String,
    /// Static bearer token sent on every request.
    #[serde(deserialize_with = "deserialize_text")]
    pub token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Create cadence, in ticks. Poll runs every tick.
    #[serde(default = "default_create_every_ticks")]
    pub create_every_ticks: u64,
    #[serde(default)]
    pub create_phase: CreatePhase,
    #[serde(default)]
    pub timer: TimerKind,
    /// Upper bound on pending reports. `None` means unbounded.
    #[serde(default)]
    pub max_pending: Option<usize>,
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

impl ScheduleConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            create_every_ticks: DEFAULT_CREATE_EVERY_TICKS,
            create_phase: CreatePhase::default(),
            timer: TimerKind::default(),
            max_pending: None,
            overflow: OverflowPolicy::default(),
        }
    }
}

/// When the first create fires relative to startup.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CreatePhase {
    /// On the very first tick, then every `create_every_ticks`.
    #[default]
    Immediate,
    /// Only after one full create interval has elapsed.
    AfterInterval,
}

/// How the pause between ticks is realised.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Sleep a full tick after each tick's work.
    #[default]
    Sleep,
    /// Fixed-rate interval; work time is absorbed into the period.
    Interval,
}

/// What happens when a push would exceed `max_pending`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the oldest pending report to make room.
    #[default]
    DropOldest,
    /// Refuse the incoming report.
    RejectNew,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(default = "default_results_path")]
    pub path: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            path: default_results_path(),
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

/// Accept scalars as text. The env provider parses `REPORTER_API__TOKEN=12345`
/// into a number, which must still land in a `String` field.
fn deserialize_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;

    struct TextVisitor;

    impl<'de> Visitor<'de> for TextVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string, number or bool")
        }

        fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_string<E>(self, v: String) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(v)
        }

        fn visit_char<E>(self, v: char) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_u64<E>(self, v: u64) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_i64<E>(self, v: i64) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_u128<E>(self, v: u128) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_i128<E>(self, v: i128) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_f64<E>(self, v: f64) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_bool<E>(self, v: bool) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(TextVisitor)
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}
fn default_create_every_ticks() -> u64 {
    DEFAULT_CREATE_EVERY_TICKS
}
fn default_results_path() -> String {
    DEFAULT_RESULTS_PATH.to_string()
}
fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

impl ReporterConfig {
    /// Load config from a TOML file with REPORTER_* env var overrides.
    ///
    /// Nested keys use a double underscore: `REPORTER_API__TOKEN`,
    /// `REPORTER_SCHEDULE__TICK_MS`. A missing file is not an error as long
    /// as the env supplies the required `api` keys.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path.unwrap_or(DEFAULT_CONFIG_PATH);

        let config: ReporterConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("REPORTER_").split("__"))
            .extract()
            .map_err(|e| ReporterError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ReporterError::Config(msg.to_string()));

        if self.api.base_url.trim().is_empty() {
            return invalid("api.base_url must not be empty");
        }
        if self.api.token.trim().is_empty() {
            return invalid("api.token must not be empty");
        }
        if self.api.timeout_secs == 0 {
            return invalid("api.timeout_secs must be at least 1");
        }
        if self.schedule.tick_ms == 0 {
            return invalid("schedule.tick_ms must be at least 1");
        }
        if self.schedule.create_every_ticks == 0 {
            return invalid("schedule.create_every_ticks must be at least 1");
        }
        if self.schedule.max_pending == Some(0) {
            return invalid("schedule.max_pending must be at least 1 when set");
        }
        if matches!(self.sink.delimiter, '"' | '\r' | '\n') {
            return invalid("sink.delimiter must not be a quote or line break");
        }
        if self.sink.path.trim().is_empty() {
            return invalid("sink.path must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    const MINIMAL: &str = r#"
        [api]
        base_url = "http://localhost:8080/api"
        token = "secret"
    "#;

    #[test]
    fn defaults_fill_optional_sections() {
        Jail::expect_with(|jail| {
            jail.create_file("reporter.toml", MINIMAL)?;
            let config = ReporterConfig::load(None).expect("load failed");

            assert_eq!(config.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
            assert_eq!(config.schedule.tick(), Duration::from_secs(1));
            assert_eq!(config.schedule.create_every_ticks, 60);
            assert_eq!(config.schedule.create_phase, CreatePhase::Immediate);
            assert_eq!(config.schedule.timer, TimerKind::Sleep);
            assert_eq!(config.schedule.max_pending, None);
            assert_eq!(config.sink.path, "results.csv");
            assert_eq!(config.sink.delimiter, ';');
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", MINIMAL)?;
            jail.set_env("REPORTER_API__TOKEN", "from-env");
            jail.set_env("REPORTER_SCHEDULE__CREATE_EVERY_TICKS", "5");
            jail.set_env("REPORTER_SCHEDULE__CREATE_PHASE", "after_interval");
            jail.set_env("REPORTER_SCHEDULE__MAX_PENDING", "10");
            jail.set_env("REPORTER_SCHEDULE__OVERFLOW", "reject_new");

            let config = ReporterConfig::load(Some("custom.toml")).expect("load failed");
            assert_eq!(config.api.token, "from-env");
            assert_eq!(config.schedule.create_every_ticks, 5);
            assert_eq!(config.schedule.create_phase, CreatePhase::AfterInterval);
            assert_eq!(config.schedule.max_pending, Some(10));
            assert_eq!(config.schedule.overflow, OverflowPolicy::RejectNew);
            Ok(())
        });
    }

    #[test]
    fn env_alone_is_enough() {
        Jail::expect_with(|jail| {
            jail.set_env("REPORTER_API__BASE_URL", "http://svc");
            jail.set_env("REPORTER_API__TOKEN", "t");
            let config = ReporterConfig::load(None).expect("load failed");
            assert_eq!(config.api.base_url, "http://svc");
            Ok(())
        });
    }

    #[test]
    fn numeric_env_token_stays_text() {
        Jail::expect_with(|jail| {
            jail.create_file("reporter.toml", MINIMAL)?;
            jail.set_env("REPORTER_API__TOKEN", "12345");
            let config = ReporterConfig::load(None).expect("load failed");
            assert_eq!(config.api.token, "12345");
            Ok(())
        });
    }

    #[test]
    fn missing_api_section_is_a_config_error() {
        Jail::expect_with(|_jail| {
            let err = ReporterConfig::load(None).unwrap_err();
            assert_eq!(err.code(), "CONFIG_ERROR");
            Ok(())
        });
    }

    #[test]
    fn zero_cadence_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "reporter.toml",
                &format!("{MINIMAL}\n[schedule]\ncreate_every_ticks = 0\n"),
            )?;
            let err = ReporterConfig::load(None).unwrap_err();
            assert!(err.to_string().contains("create_every_ticks"));
            Ok(())
        });
    }

    #[test]
    fn quote_delimiter_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "reporter.toml",
                &format!("{MINIMAL}\n[sink]\ndelimiter = '\"'\n"),
            )?;
            assert!(ReporterConfig::load(None).is_err());
            Ok(())
        });
    }

    #[test]
    fn blank_token_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "reporter.toml",
                "[api]\nbase_url = \"http://svc\"\ntoken = \"  \"\n",
            )?;
            let err = ReporterConfig::load(None).unwrap_err();
            assert!(err.to_string().contains("api.token"));
            Ok(())
        });
    }
}
