//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` next to the binary and from `TALLY__*`
//! environment variables (`TALLY__APP__LEVEL=debug`,
//! `TALLY__DATABASE__SQLITE=./tally.db`, `TALLY__REPORT__TIP_CURRENCY=USD`).
//!
//! See `settings.example.toml` for the configuration.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("./tally.db".to_string())
    }
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Report {
    /// Currency every tip is booked under. Defaults to `CUP`.
    pub tip_currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub report: Report,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn from_toml(raw: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_configuration_uses_defaults() {
        let settings = from_toml("");
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.database.url(), "sqlite:./tally.db?mode=rwc");
        assert!(settings.report.tip_currency.is_none());
    }

    #[test]
    fn reads_every_section() {
        let settings = from_toml(
            r#"
            [app]
            level = "debug"

            [database]
            sqlite = "/var/lib/tally/ledger.db"

            [report]
            tip_currency = "USD"
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        assert_eq!(
            settings.database.url(),
            "sqlite:/var/lib/tally/ledger.db?mode=rwc"
        );
        assert_eq!(settings.report.tip_currency.as_deref(), Some("USD"));
    }

    #[test]
    fn memory_database() {
        let settings = from_toml(r#"database = "memory""#);
        assert_eq!(settings.database.url(), "sqlite::memory:");
    }
}
