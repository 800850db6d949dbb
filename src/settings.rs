use std::path::PathBuf;

use serde::Deserialize;

/// Runtime settings, read from `QRKIT_`-prefixed environment variables (optionally loaded
/// from a `.env` file first).
#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Settings {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".qrkit")
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            export_dir: default_export_dir(),
            log_dir: default_log_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    pub const PREFIX: &'static str = "QRKIT_";

    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(Self::PREFIX).from_iter(vars)
    }

    /// Loads `.env` when present, then the process environment. Falls back to defaults on
    /// malformed values; the returned message says why.
    pub fn load() -> (Self, Option<String>) {
        let dotenv = dotenvy::dotenv().ok();
        match Self::from_vars(std::env::vars()) {
            Ok(settings) => (settings, dotenv.map(|p| format!("loaded {}", p.display()))),
            Err(e) => (Self::default(), Some(format!("invalid settings, using defaults: {e}"))),
        }
    }

    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

#[cfg(test)]
mod settings_tests {
    use std::path::PathBuf;

    use super::Settings;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Settings::from_vars(vars(&[("PATH", "/bin")])).unwrap(), Settings::default());
    }

    #[test]
    fn test_prefixed_overrides() {
        let s = Settings::from_vars(vars(&[
            ("QRKIT_DATA_DIR", "/tmp/qr"),
            ("QRKIT_LOG_LEVEL", "debug"),
        ]))
        .unwrap();
        assert_eq!(s.data_dir, PathBuf::from("/tmp/qr"));
        assert_eq!(s.export_dir, PathBuf::from("."));
        assert_eq!(s.tracing_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_unknown_level_falls_back() {
        let s = Settings { log_level: "loud".to_string(), ..Default::default() };
        assert_eq!(s.tracing_level(), tracing::Level::INFO);
    }
}
