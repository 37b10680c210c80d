//! Environment-sourced settings.
//!
//! Variables are read through the `config` crate (keys are lower-cased by the
//! environment source) into a flat struct, then reshaped into [`Settings`].

use crate::{Error, Result, StaticRecipients};
use chrono_tz::Tz;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_DWH_SQL_FILE: &str = "sql/executions/dwh_executions.sql";

#[derive(Debug, Deserialize)]
struct RawSettings {
    api_mysql_hostname: String,
    api_mysql_port: u16,
    api_mysql_username: String,
    api_mysql_password: String,
    api_mysql_db: String,

    smtp_host: String,
    smtp_port: u16,
    smtp_user: String,
    smtp_password: String,
    smtp_from: String,
    smtp_sender_name: String,
    smtp_tls: bool,
    smtp_timeout: u64,

    maintenance_within: u32,
    maintenance_throttle: u32,
    scheduler_use_db_recipients: bool,
    scheduler_default_to: String,
    scheduler_default_cc: String,
    scheduler_default_bcc: String,

    tz: String,
    dwh_sql_file: String,
}

#[derive(Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from: String,
    pub sender_name: Option<String>,
    /// STARTTLS on the plain connection.
    pub tls: bool,
    pub timeout_secs: u64,
}

impl SmtpSettings {
    /// Login is attempted only when both user and password are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.user.is_empty() || self.password.is_empty() {
            None
        } else {
            Some((&self.user, &self.password))
        }
    }
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("from", &self.from)
            .field("sender_name", &self.sender_name)
            .field("tls", &self.tls)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientMode {
    /// Responsible operator of each task, looked up in the store.
    PerTask,
    /// One consolidated email to a configured distribution list.
    Static(StaticRecipients),
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub within_days: u32,
    pub throttle_days: u32,
    pub recipient_mode: RecipientMode,
    pub dwh_sql_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub smtp: SmtpSettings,
    pub scheduler: SchedulerSettings,
    pub timezone: Tz,
}

fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    let builder = Config::builder()
        .set_default("api_mysql_hostname", "localhost")?
        .set_default("api_mysql_port", 3306_i64)?
        .set_default("api_mysql_username", "root")?
        .set_default("api_mysql_password", "")?
        .set_default("api_mysql_db", "plax")?
        .set_default("smtp_host", "localhost")?
        .set_default("smtp_port", 587_i64)?
        .set_default("smtp_user", "")?
        .set_default("smtp_password", "")?
        .set_default("smtp_from", "no-reply@example.com")?
        .set_default("smtp_sender_name", "")?
        .set_default("smtp_tls", true)?
        .set_default("smtp_timeout", 30_i64)?
        .set_default("maintenance_within", 7_i64)?
        .set_default("maintenance_throttle", 7_i64)?
        .set_default("scheduler_use_db_recipients", true)?
        .set_default("scheduler_default_to", "")?
        .set_default("scheduler_default_cc", "")?
        .set_default("scheduler_default_bcc", "")?
        .set_default("tz", "Europe/Rome")?
        .set_default("dwh_sql_file", DEFAULT_DWH_SQL_FILE)?;

    Ok(builder)
}

impl Settings {
    /// Load from the process environment.
    pub fn load() -> Result<Self> {
        let config = defaults()?.add_source(Environment::default()).build()?;
        Self::from_config(config)
    }

    /// Load from explicit `NAME=value` pairs on top of the defaults.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut builder = defaults()?;
        for (key, value) in vars {
            builder = builder.set_override(key.as_ref().to_lowercase(), value.into())?;
        }
        Self::from_config(builder.build()?)
    }

    fn from_config(config: Config) -> Result<Self> {
        let raw: RawSettings = config.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self> {
        let timezone: Tz = raw
            .tz
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("invalid TZ '{}': {}", raw.tz, e)))?;

        let recipient_mode = if raw.scheduler_use_db_recipients {
            RecipientMode::PerTask
        } else {
            RecipientMode::Static(StaticRecipients::from_lists(
                &raw.scheduler_default_to,
                &raw.scheduler_default_cc,
                &raw.scheduler_default_bcc,
            ))
        };

        let sender_name = raw.smtp_sender_name.trim();

        Ok(Self {
            database: DatabaseSettings {
                host: raw.api_mysql_hostname,
                port: raw.api_mysql_port,
                username: raw.api_mysql_username,
                password: raw.api_mysql_password,
                database: raw.api_mysql_db,
            },
            smtp: SmtpSettings {
                host: raw.smtp_host,
                port: raw.smtp_port,
                user: raw.smtp_user,
                password: raw.smtp_password,
                from: raw.smtp_from,
                sender_name: (!sender_name.is_empty()).then(|| sender_name.to_string()),
                tls: raw.smtp_tls,
                timeout_secs: raw.smtp_timeout,
            },
            scheduler: SchedulerSettings {
                within_days: raw.maintenance_within,
                throttle_days: raw.maintenance_throttle,
                recipient_mode,
                dwh_sql_file: PathBuf::from(raw.dwh_sql_file),
            },
            timezone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_vars(Vec::<(&str, &str)>::new()).unwrap();

        assert_eq!(settings.database.host, "localhost");
        assert_eq!(settings.database.port, 3306);
        assert_eq!(settings.database.database, "plax");
        assert_eq!(settings.smtp.port, 587);
        assert!(settings.smtp.tls);
        assert_eq!(settings.smtp.timeout_secs, 30);
        assert_eq!(settings.smtp.sender_name, None);
        assert!(settings.smtp.credentials().is_none());
        assert_eq!(settings.scheduler.within_days, 7);
        assert_eq!(settings.scheduler.throttle_days, 7);
        assert_eq!(settings.scheduler.recipient_mode, RecipientMode::PerTask);
        assert_eq!(
            settings.scheduler.dwh_sql_file,
            PathBuf::from(DEFAULT_DWH_SQL_FILE)
        );
        assert_eq!(settings.timezone, chrono_tz::Europe::Rome);
    }

    #[test]
    fn test_overrides_and_static_lists() {
        let settings = Settings::from_vars([
            ("API_MYSQL_PORT", "3307"),
            ("SMTP_USER", "mailer"),
            ("SMTP_PASSWORD", "secret"),
            ("SMTP_SENDER_NAME", "  Plant Ops "),
            ("SMTP_TLS", "false"),
            ("MAINTENANCE_WITHIN", "14"),
            ("SCHEDULER_USE_DB_RECIPIENTS", "0"),
            ("SCHEDULER_DEFAULT_TO", "A@x.com, a@x.com,,b@y.com"),
            ("SCHEDULER_DEFAULT_BCC", "audit@x.com"),
            ("TZ", "UTC"),
        ])
        .unwrap();

        assert_eq!(settings.database.port, 3307);
        assert_eq!(settings.smtp.credentials(), Some(("mailer", "secret")));
        assert_eq!(settings.smtp.sender_name.as_deref(), Some("Plant Ops"));
        assert!(!settings.smtp.tls);
        assert_eq!(settings.scheduler.within_days, 14);
        assert_eq!(settings.timezone, chrono_tz::UTC);

        match settings.scheduler.recipient_mode {
            RecipientMode::Static(recipients) => {
                assert_eq!(recipients.to, vec!["A@x.com", "b@y.com"]);
                assert!(recipients.cc.is_empty());
                assert_eq!(recipients.bcc, vec!["audit@x.com"]);
            }
            other => panic!("expected static recipients, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_timezone() {
        let err = Settings::from_vars([("TZ", "Mars/Olympus")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_password_not_in_debug() {
        let settings = Settings::from_vars([("API_MYSQL_PASSWORD", "hunter2")]).unwrap();
        assert!(!format!("{:?}", settings).contains("hunter2"));
    }
}
