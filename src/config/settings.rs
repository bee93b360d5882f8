use crate::plugins::loading::LoadingOptions;
use serde::{Deserialize, Serialize};

/// Settings read from `modelstore.yaml` and `MODELSTORE__*` environment variables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingSettings,

    /// Options handed to the loading plugin
    pub loading: LoadingOptions,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Directory for rotating log files
    pub dir: String,

    /// Log file prefix
    pub prefix: String,

    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,

    /// Also log to the console
    pub console: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            prefix: "modelstore".to_string(),
            level: "info".to_string(),
            console: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_defaults() {
        let settings = LoggingSettings::default();
        assert_eq!(settings.dir, "logs");
        assert_eq!(settings.prefix, "modelstore");
        assert_eq!(settings.level, "info");
        assert!(settings.console);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let settings: Settings = serde_yaml_ng::from_str("loading:\n  as_number: true\n").unwrap();

        assert!(settings.loading.as_number);
        assert_eq!(settings.loading.name, None);
        assert_eq!(settings.logging, LoggingSettings::default());
    }
}
