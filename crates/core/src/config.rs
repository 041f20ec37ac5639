use std::path::Path;

use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `ADSERVER__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub decision: DecisionConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
}

/// Which decision backend serves requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Never show ads.
    Disabled,
    /// Uniform flight and ad choice among targeted candidates.
    Uniform,
    /// Tiered, pacing-weighted flight choice with priority-weighted ads.
    Probabilistic,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Uniform => "uniform",
            Self::Probabilistic => "probabilistic",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disabled" => Ok(Self::Disabled),
            "uniform" | "enabled" => Ok(Self::Uniform),
            "probabilistic" => Ok(Self::Probabilistic),
            other => Err(format!("unknown decision backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionConfig {
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    /// Fixed RNG seed. Only meant for reproducing decisions offline.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// Length of one pacing interval. A flight's daily goal is released
    /// evenly across the intervals of the day.
    #[serde(default = "default_pacing_interval_secs")]
    pub interval_secs: u32,
}

// Default functions
fn default_node_id() -> String {
    "adserver-01".to_string()
}
fn default_backend() -> BackendKind {
    BackendKind::Probabilistic
}
fn default_pacing_interval_secs() -> u32 {
    3600
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            seed: None,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_pacing_interval_secs(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            decision: DecisionConfig::default(),
            pacing: PacingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables only.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from an optional TOML file, then environment
    /// variables. Environment values win.
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("ADSERVER")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(","),
            )
            .build()?;
        config.try_deserialize()
    }
}
