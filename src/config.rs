//! Configuration management

use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_driver")]
    pub driver: String,
    /// Database file holding the `log`, `articles` and `authors` tables
    #[serde(default = "default_database_name")]
    pub name: String,
    #[serde(default = "default_read_only")]
    pub read_only: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            name: default_database_name(),
            read_only: default_read_only(),
        }
    }
}

fn default_driver() -> String {
    "sqlite".to_string()
}

fn default_database_name() -> String {
    "news".to_string()
}

fn default_read_only() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// How many articles the popularity report lists
    #[serde(default = "default_top_articles")]
    pub top_articles: i64,
    /// A day is reported when its error share is strictly above this percentage
    #[serde(default = "default_error_threshold")]
    pub error_threshold_percent: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_articles: default_top_articles(),
            error_threshold_percent: default_error_threshold(),
        }
    }
}

fn default_top_articles() -> i64 {
    3
}

fn default_error_threshold() -> f64 {
    1.0
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";

        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("NEWSREPORT")
                    .prefix_separator("_")
                    .separator("__"),
            );

        Self::from_builder(builder)
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let settings = builder.build()?;
        let config: Config = settings.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.database.driver != "sqlite" {
            anyhow::bail!(
                "Invalid database driver '{}'. Only 'sqlite' is supported",
                self.database.driver
            );
        }
        if self.database.name.trim().is_empty() {
            anyhow::bail!("Database name cannot be empty");
        }

        if self.report.top_articles <= 0 {
            anyhow::bail!(
                "Invalid top_articles: {} (must be at least 1)",
                self.report.top_articles
            );
        }
        let threshold = self.report.error_threshold_percent;
        if !(0.0..=100.0).contains(&threshold) {
            anyhow::bail!("Invalid error_threshold_percent: {} (must be 0-100)", threshold);
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid logging level '{}'. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Result<Config> {
        Config::from_builder(
            config::Config::builder()
                .add_source(config::File::from_str(toml, config::FileFormat::Toml)),
        )
    }

    #[test]
    fn empty_source_uses_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.database.driver, "sqlite");
        assert_eq!(config.database.name, "news");
        assert!(config.database.read_only);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.report.top_articles, 3);
        assert_eq!(config.report.error_threshold_percent, 1.0);
    }

    #[test]
    fn file_values_override_defaults() {
        let config = from_toml(
            r#"
            [database]
            name = "/var/lib/news/news.db"

            [report]
            top_articles = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.database.name, "/var/lib/news/news.db");
        assert_eq!(config.report.top_articles, 5);
        assert_eq!(config.report.error_threshold_percent, 1.0);
    }

    #[test]
    fn rejects_unsupported_driver() {
        let err = from_toml("[database]\ndriver = \"postgres\"").unwrap_err();
        assert!(err.to_string().contains("postgres"));
    }

    #[test]
    fn rejects_empty_name() {
        assert!(from_toml("[database]\nname = \"  \"").is_err());
    }

    #[test]
    fn rejects_bad_report_settings() {
        assert!(from_toml("[report]\ntop_articles = 0").is_err());
        assert!(from_toml("[report]\nerror_threshold_percent = 150.0").is_err());
    }

    #[test]
    fn rejects_unknown_log_level() {
        assert!(from_toml("[logging]\nlevel = \"loud\"").is_err());
        assert!(from_toml("[logging]\nlevel = \"DEBUG\"").is_ok());
    }
}
