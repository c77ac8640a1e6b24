use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Executable probed for and launched by the system strategy.
    pub tool: Option<String>,
    #[serde(default)]
    pub strategy: StrategyChoice,
    #[serde(default)]
    pub verbose_tool: bool,
    #[serde(default)]
    pub preserve_permissions: bool,
}

/// How the strategy for an extraction is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StrategyChoice {
    /// Use the system tar when it is on PATH, otherwise extract natively.
    #[default]
    Auto,
    /// Always shell out to the system tar.
    System,
    /// Always extract in-process.
    Native,
}

/// Config file path: `~/.config/extrakt/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("extrakt").join("config.toml"))
}

/// Load config from file, falling back to defaults if missing.
pub fn load_config() -> AppConfig {
    if let Some(path) = config_path()
        && let Ok(contents) = std::fs::read_to_string(&path)
    {
        match parse(&contents) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), ?config, "loaded config");
                return config;
            }
            Err(e) => eprintln!(
                "warning: failed to parse config at {}, using defaults: {e}",
                path.display()
            ),
        }
    }

    tracing::debug!("using default config");
    AppConfig::default()
}

fn parse(contents: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.strategy, StrategyChoice::Auto);
        assert!(config.tool.is_none());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
tool = "gtar"
strategy = "native"
verbose_tool = true
preserve_permissions = true
"#;
        let config = parse(toml_str).unwrap();
        assert_eq!(config.tool.as_deref(), Some("gtar"));
        assert_eq!(config.strategy, StrategyChoice::Native);
        assert!(config.verbose_tool);
        assert!(config.preserve_permissions);
    }

    #[test]
    fn parse_system_strategy() {
        let config = parse(r#"strategy = "system""#).unwrap();
        assert_eq!(config.strategy, StrategyChoice::System);
    }

    #[test]
    fn load_config_logs_without_failing() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();

        let config = tracing::subscriber::with_default(subscriber, load_config);

        assert!(config.tool.as_deref().is_none_or(|tool| !tool.is_empty()));
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        assert!(parse(r#"strategy = "zip""#).is_err());
    }
}
