//! Alarm configuration: what to watch, how often to page, where to send mail.

use std::time::Duration;

use super::source::{ConfigSource, ConfigValue};
use crate::error::CoreError;
use crate::expression::Expression;

/// Section holding every alarm option.
pub const ALARM_SECTION: &str = "Alarm";

/// Cooldown between notifications when `time_wait` is not set.
pub const DEFAULT_COOLDOWN_SECS: u64 = 3600;

/// Default SMTP submission port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Default SMTP command timeout.
pub const DEFAULT_SMTP_TIMEOUT_SECS: u64 = 30;

/// Default subject when the variant's subject key is not set.
pub const DEFAULT_SUBJECT: &str = "Alarm message from weewx";

/// Default sender address when `from` is not set.
pub const DEFAULT_FROM_ADDRESS: &str = "alarm@weewx.com";

/// weewx's default `[StdArchive] archive_interval`.
pub const DEFAULT_ARCHIVE_INTERVAL_SECS: f64 = 300.0;

/// weewx's default `[Simulator] loop_interval`.
pub const DEFAULT_LOOP_INTERVAL_SECS: f64 = 2.5;

// ---------------------------------------------------------------------------
// AlarmKeys
// ---------------------------------------------------------------------------

/// The option names one alarm variant reads from `[Alarm]`.
///
/// Mail transport options (`smtp_*`, `from`, `mailto`) are shared between
/// variants; only the condition, timing and subject keys differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmKeys {
    /// Short label used in logs.
    pub name: &'static str,
    pub expression: &'static str,
    pub cooldown: &'static str,
    pub subject: &'static str,
    /// Required duration-gate key, if the variant has one.
    pub duration: Option<&'static str>,
}

impl AlarmKeys {
    /// Single-condition alarm with cooldown.
    pub const SIMPLE: Self = Self {
        name: "alarm",
        expression: "expression",
        cooldown: "time_wait",
        subject: "subject",
        duration: None,
    };

    /// Duration-gated wind alarm with a cleared notification.
    pub const WIND: Self = Self {
        name: "wind",
        expression: "wind_wind_expression",
        cooldown: "wind_time_wait",
        subject: "wind_subject",
        duration: Some("wind_wind_time_event"),
    };

    pub const ALL: [Self; 2] = [Self::SIMPLE, Self::WIND];
}

// ---------------------------------------------------------------------------
// AlarmConfig
// ---------------------------------------------------------------------------

/// Minimum continuous time a condition must hold before it notifies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationGate {
    /// Required accumulated seconds, compared inclusively.
    pub threshold_secs: f64,
    /// Seconds credited for every record on which the condition holds.
    pub interval_secs: f64,
}

/// Mail transport settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl SmtpSettings {
    /// Login credentials, present only when both user and password are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.user, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

/// Fully resolved configuration of one alarm. Immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmConfig {
    pub name: &'static str,
    pub expression: Expression,
    pub cooldown: Duration,
    /// `None` selects the simple policy.
    pub duration_gate: Option<DurationGate>,
    pub subject: String,
    pub from: String,
    /// Never empty.
    pub mail_to: Vec<String>,
    pub smtp: SmtpSettings,
}

impl AlarmConfig {
    /// Resolve one variant's configuration.
    ///
    /// Fails if `[Alarm]` is absent, a required option (expression, `mailto`,
    /// `smtp_host`, and the duration key for gated variants) is missing, a
    /// number does not parse, or the expression is not valid.
    pub fn from_source(source: &impl ConfigSource, keys: &AlarmKeys) -> Result<Self, CoreError> {
        if !source.has_section(ALARM_SECTION) {
            return Err(CoreError::MissingSection(ALARM_SECTION.to_string()));
        }
        let get = |key: &str| source.lookup(ALARM_SECTION, key);

        let expression_text = required_text(get(keys.expression), keys.expression)?;
        let duration_secs = match keys.duration {
            Some(key) => {
                let value = get(key).ok_or_else(|| missing(key))?;
                Some(non_negative_f64(&value, key)?)
            }
            None => None,
        };
        let smtp_host = required_text(get("smtp_host"), "smtp_host")?;
        let mail_to = get("mailto").map(|v| v.as_list()).unwrap_or_default();
        if mail_to.is_empty() {
            return Err(missing("mailto"));
        }

        let expression = Expression::parse(&expression_text)?;

        let cooldown_secs = match get(keys.cooldown) {
            Some(value) => non_negative_u64(&value, keys.cooldown)?,
            None => DEFAULT_COOLDOWN_SECS,
        };
        let port = match get("smtp_port") {
            Some(value) => value
                .as_i64()
                .and_then(|p| u16::try_from(p).ok())
                .ok_or_else(|| invalid("smtp_port", &value))?,
            None => DEFAULT_SMTP_PORT,
        };
        let timeout_secs = match get("smtp_timeout") {
            Some(value) => non_negative_u64(&value, "smtp_timeout")?,
            None => DEFAULT_SMTP_TIMEOUT_SECS,
        };

        let duration_gate = match duration_secs.filter(|secs| *secs > 0.0) {
            Some(threshold_secs) => Some(DurationGate {
                threshold_secs,
                interval_secs: record_interval_secs(source)?,
            }),
            None => None,
        };

        Ok(Self {
            name: keys.name,
            expression,
            cooldown: Duration::from_secs(cooldown_secs),
            duration_gate,
            subject: optional_text(get(keys.subject)).unwrap_or_else(|| DEFAULT_SUBJECT.into()),
            from: optional_text(get("from")).unwrap_or_else(|| DEFAULT_FROM_ADDRESS.into()),
            mail_to,
            smtp: SmtpSettings {
                host: smtp_host,
                port,
                user: optional_text(get("smtp_user")),
                password: optional_text(get("smtp_password")),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }

    /// Resolve one variant, or log why the alarm stays off.
    ///
    /// Configuration problems never propagate: the host keeps running with
    /// this alarm disabled.
    pub fn load(source: &impl ConfigSource, keys: &AlarmKeys) -> Option<Self> {
        match Self::from_source(source, keys) {
            Ok(config) => {
                tracing::info!(
                    alarm = config.name,
                    expression = %config.expression,
                    "Alarm set for expression"
                );
                Some(config)
            }
            Err(e) => {
                tracing::info!(alarm = keys.name, error = %e, "No alarm set");
                None
            }
        }
    }

    /// Load every variant the configuration asks for.
    ///
    /// A variant is attempted when its expression key is present. If none
    /// is, the simple variant is attempted anyway so the reason is logged.
    pub fn load_all(source: &impl ConfigSource) -> Vec<Self> {
        let requested: Vec<AlarmKeys> = AlarmKeys::ALL
            .into_iter()
            .filter(|keys| source.lookup(ALARM_SECTION, keys.expression).is_some())
            .collect();
        if requested.is_empty() {
            return Self::load(source, &AlarmKeys::SIMPLE).into_iter().collect();
        }
        requested
            .iter()
            .filter_map(|keys| Self::load(source, keys))
            .collect()
    }
}

/// Seconds one archive record stands for.
///
/// Simulated stations emit records every `loop_interval`; real ones every
/// `archive_interval`.
fn record_interval_secs(source: &impl ConfigSource) -> Result<f64, CoreError> {
    let station_type = source
        .lookup(ALARM_SECTION, "station_type")
        .or_else(|| source.lookup("Station", "station_type"))
        .and_then(|v| v.as_text())
        .unwrap_or_default();
    let (section, key, default) = if station_type.contains("Simulator") {
        ("Simulator", "loop_interval", DEFAULT_LOOP_INTERVAL_SECS)
    } else {
        ("StdArchive", "archive_interval", DEFAULT_ARCHIVE_INTERVAL_SECS)
    };
    match source.lookup(section, key) {
        Some(value) => positive_f64(&value, key),
        None => Ok(default),
    }
}

fn missing(key: &'static str) -> CoreError {
    CoreError::MissingKey {
        section: ALARM_SECTION.to_string(),
        key,
    }
}

fn invalid(key: &'static str, value: &ConfigValue) -> CoreError {
    CoreError::InvalidValue {
        key,
        reason: format!("{value:?}"),
    }
}

fn optional_text(value: Option<ConfigValue>) -> Option<String> {
    value
        .and_then(|v| v.as_text())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required_text(value: Option<ConfigValue>, key: &'static str) -> Result<String, CoreError> {
    optional_text(value).ok_or_else(|| missing(key))
}

fn non_negative_u64(value: &ConfigValue, key: &'static str) -> Result<u64, CoreError> {
    value
        .as_i64()
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(|| invalid(key, value))
}

fn non_negative_f64(value: &ConfigValue, key: &'static str) -> Result<f64, CoreError> {
    value
        .as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| invalid(key, value))
}

fn positive_f64(value: &ConfigValue, key: &'static str) -> Result<f64, CoreError> {
    non_negative_f64(value, key)?;
    value
        .as_f64()
        .filter(|v| *v > 0.0)
        .ok_or_else(|| invalid(key, value))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::config::TomlConfig;

    fn config(toml: &str) -> TomlConfig {
        TomlConfig::from_toml(toml).expect("test config should parse")
    }

    const MINIMAL: &str = r#"
[Alarm]
expression = "outTemp < 40.0"
smtp_host = "smtp.example.com"
mailto = "a@x.com, b@y.com"
"#;

    #[test]
    fn minimal_config_fills_defaults() {
        let cfg = AlarmConfig::from_source(&config(MINIMAL), &AlarmKeys::SIMPLE)
            .expect("minimal config should load");
        assert_eq!(cfg.name, "alarm");
        assert_eq!(cfg.expression.source(), "outTemp < 40.0");
        assert_eq!(cfg.cooldown, Duration::from_secs(DEFAULT_COOLDOWN_SECS));
        assert_eq!(cfg.duration_gate, None);
        assert_eq!(cfg.subject, DEFAULT_SUBJECT);
        assert_eq!(cfg.from, DEFAULT_FROM_ADDRESS);
        assert_eq!(cfg.mail_to, vec!["a@x.com", "b@y.com"]);
        assert_eq!(cfg.smtp.host, "smtp.example.com");
        assert_eq!(cfg.smtp.port, DEFAULT_SMTP_PORT);
        assert_eq!(cfg.smtp.credentials(), None);
        assert_eq!(
            cfg.smtp.timeout,
            Duration::from_secs(DEFAULT_SMTP_TIMEOUT_SECS)
        );
    }

    #[test]
    fn explicit_options_override_defaults() {
        let toml = r#"
[Alarm]
expression = "outTemp < 40.0"
time_wait = "600"
subject = "Frost"
from = "station@example.com"
smtp_host = "smtp.example.com"
smtp_port = 2525
smtp_user = "station"
smtp_password = "hunter2"
smtp_timeout = 5
mailto = ["ops@example.com"]
"#;
        let cfg = AlarmConfig::from_source(&config(toml), &AlarmKeys::SIMPLE)
            .expect("config should load");
        assert_eq!(cfg.cooldown, Duration::from_secs(600));
        assert_eq!(cfg.subject, "Frost");
        assert_eq!(cfg.from, "station@example.com");
        assert_eq!(cfg.smtp.port, 2525);
        assert_eq!(cfg.smtp.credentials(), Some(("station", "hunter2")));
        assert_eq!(cfg.smtp.timeout, Duration::from_secs(5));
    }

    #[test]
    fn each_required_option_disables_when_missing() {
        let cases = [
            ("expression", "smtp_host = \"h\"\nmailto = \"a@x.com\"\n"),
            ("smtp_host", "expression = \"a > 1\"\nmailto = \"a@x.com\"\n"),
            ("mailto", "expression = \"a > 1\"\nsmtp_host = \"h\"\n"),
            ("mailto", "expression = \"a > 1\"\nsmtp_host = \"h\"\nmailto = \" , \"\n"),
        ];
        for (key, body) in cases {
            let src = config(&format!("[Alarm]\n{body}"));
            assert_matches!(
                AlarmConfig::from_source(&src, &AlarmKeys::SIMPLE),
                Err(CoreError::MissingKey { key: k, .. }) if k == key
            );
            assert!(AlarmConfig::load(&src, &AlarmKeys::SIMPLE).is_none());
        }
    }

    #[test]
    fn missing_section_disables() {
        let src = config("[Station]\nstation_type = \"Vantage\"\n");
        assert_matches!(
            AlarmConfig::from_source(&src, &AlarmKeys::SIMPLE),
            Err(CoreError::MissingSection(_))
        );
    }

    #[test]
    fn invalid_expression_disables() {
        let src = config(
            "[Alarm]\nexpression = \"__import__\"\nsmtp_host = \"h\"\nmailto = \"a@x.com\"\n",
        );
        assert_matches!(
            AlarmConfig::from_source(&src, &AlarmKeys::SIMPLE),
            Err(CoreError::Expression(_))
        );
    }

    #[test]
    fn negative_cooldown_is_rejected() {
        let src = config(&format!("{MINIMAL}time_wait = -5\n"));
        assert_matches!(
            AlarmConfig::from_source(&src, &AlarmKeys::SIMPLE),
            Err(CoreError::InvalidValue {
                key: "time_wait",
                ..
            })
        );
    }

    #[test]
    fn wind_variant_reads_its_own_keys_and_archive_interval() {
        let toml = r#"
[Alarm]
wind_wind_expression = "windSpeed > 3.33"
wind_wind_time_event = 300
wind_time_wait = 3600
wind_subject = "Wind alarm"
smtp_host = "smtp.example.com"
mailto = "a@x.com"

[StdArchive]
archive_interval = 60
"#;
        let cfg = AlarmConfig::from_source(&config(toml), &AlarmKeys::WIND)
            .expect("wind config should load");
        assert_eq!(cfg.name, "wind");
        assert_eq!(cfg.subject, "Wind alarm");
        assert_eq!(
            cfg.duration_gate,
            Some(DurationGate {
                threshold_secs: 300.0,
                interval_secs: 60.0
            })
        );
    }

    #[test]
    fn wind_variant_requires_duration_key() {
        let toml = r#"
[Alarm]
wind_wind_expression = "windSpeed > 3.33"
smtp_host = "smtp.example.com"
mailto = "a@x.com"
"#;
        assert_matches!(
            AlarmConfig::from_source(&config(toml), &AlarmKeys::WIND),
            Err(CoreError::MissingKey {
                key: "wind_wind_time_event",
                ..
            })
        );
    }

    #[test]
    fn zero_duration_falls_back_to_simple_policy() {
        let toml = r#"
[Alarm]
wind_wind_expression = "windSpeed > 3.33"
wind_wind_time_event = "0"
smtp_host = "smtp.example.com"
mailto = "a@x.com"
"#;
        let cfg = AlarmConfig::from_source(&config(toml), &AlarmKeys::WIND)
            .expect("wind config should load");
        assert_eq!(cfg.duration_gate, None);
    }

    #[test]
    fn simulator_station_uses_loop_interval() {
        let toml = r#"
[Alarm]
wind_wind_expression = "windSpeed > 3.33"
wind_wind_time_event = 10
smtp_host = "smtp.example.com"
mailto = "a@x.com"

[Station]
station_type = "Simulator"

[Simulator]
loop_interval = 2

[StdArchive]
archive_interval = 300
"#;
        let cfg = AlarmConfig::from_source(&config(toml), &AlarmKeys::WIND)
            .expect("wind config should load");
        assert_eq!(
            cfg.duration_gate.map(|g| g.interval_secs),
            Some(2.0)
        );
    }

    #[test]
    fn unusable_record_interval_disables_gated_alarm() {
        for (station, section, key, value) in [
            ("Vantage", "StdArchive", "archive_interval", "0"),
            ("Vantage", "StdArchive", "archive_interval", "-300"),
            ("Vantage", "StdArchive", "archive_interval", "\"nan\""),
            ("Simulator", "Simulator", "loop_interval", "0"),
        ] {
            let toml = format!(
                "[Alarm]\nwind_wind_expression = \"windSpeed > 3.33\"\n\
                 wind_wind_time_event = 600\nsmtp_host = \"h\"\nmailto = \"a@x.com\"\n\
                 [Station]\nstation_type = \"{station}\"\n[{section}]\n{key} = {value}\n"
            );
            let src = config(&toml);
            assert_matches!(
                AlarmConfig::from_source(&src, &AlarmKeys::WIND),
                Err(CoreError::InvalidValue { key: k, .. }) if k == key,
                "{key} = {value}"
            );
            assert!(AlarmConfig::load(&src, &AlarmKeys::WIND).is_none());
        }
    }

    #[test]
    fn record_interval_is_not_checked_without_a_gate() {
        let toml = r#"
[Alarm]
expression = "outTemp < 40.0"
smtp_host = "h"
mailto = "a@x.com"

[StdArchive]
archive_interval = 0
"#;
        assert!(AlarmConfig::from_source(&config(toml), &AlarmKeys::SIMPLE).is_ok());
    }

    #[test]
    fn load_all_builds_every_requested_variant() {
        let toml = r#"
[Alarm]
expression = "outTemp < 40.0"
wind_wind_expression = "windSpeed > 3.33"
wind_wind_time_event = 300
smtp_host = "smtp.example.com"
mailto = "a@x.com"
"#;
        let alarms = AlarmConfig::load_all(&config(toml));
        let names: Vec<_> = alarms.iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["alarm", "wind"]);
    }

    #[test]
    fn load_all_without_any_expression_is_empty() {
        let src = config("[Alarm]\nsmtp_host = \"h\"\nmailto = \"a@x.com\"\n");
        assert!(AlarmConfig::load_all(&src).is_empty());
    }
}
