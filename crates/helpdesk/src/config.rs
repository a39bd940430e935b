//! Server configuration
//!
//! Layered in increasing precedence: built-in defaults, an optional TOML
//! file, `HELPDESK_*` environment variables, then command-line flags.
//!
//! ```toml
//! state_path = "/var/lib/helpdesk"
//! categories = ["Billing", "Delivery"]
//!
//! [intake]
//! default_confidentiality = 80
//! classify_timeout_secs = 5
//!
//! [assignment]
//! restrict_to_owning_team = false
//!
//! [classifier]
//! url = "http://classifier.internal:5001/predict"
//!
//! [[teams]]
//! name = "Finance"
//! category = "Billing"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use ticketing::assignment::AssignmentPolicy;
use ticketing::intake::IntakeConfig;
use ticketing::registry::TeamSeed;
use ticketing::router::{CategoryCatalog, KeywordClassifier, KeywordRule};
use ticketing::state::{CategoryLabel, FALLBACK_TEAM};

pub const ENV_CLASSIFIER_URL: &str = "HELPDESK_CLASSIFIER_URL";
pub const ENV_STATE_PATH: &str = "HELPDESK_STATE_PATH";
pub const ENV_CLASSIFY_TIMEOUT_SECS: &str = "HELPDESK_CLASSIFY_TIMEOUT_SECS";

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}

/// Classifier gateway settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Model endpoint; keyword rules are used when unset
    pub url: Option<String>,
    /// HTTP request timeout; 0 disables it
    pub timeout_secs: u64,
    /// Keyword rules, tried in order
    pub rules: Vec<KeywordRule>,
    /// Keyword fallback label when no rule matches
    pub default_label: Option<CategoryLabel>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 10,
            rules: KeywordClassifier::with_default_rules().rules().to_vec(),
            default_label: None,
        }
    }
}

impl ClassifierConfig {
    /// Keyword classifier built from the configured rules
    pub fn keyword_classifier(&self) -> KeywordClassifier {
        let classifier = KeywordClassifier::new(self.rules.clone());
        match &self.default_label {
            Some(label) => classifier.with_default(label.clone()),
            None => classifier,
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    /// RocksDB directory; in-memory state when unset
    pub state_path: Option<PathBuf>,
    pub intake: IntakeConfig,
    pub assignment: AssignmentPolicy,
    pub classifier: ClassifierConfig,
    /// Labels reported by `list_categories`
    pub categories: CategoryCatalog,
    /// Teams created at start-up when missing
    pub teams: Vec<TeamSeed>,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            state_path: None,
            intake: IntakeConfig::default(),
            assignment: AssignmentPolicy::default(),
            classifier: ClassifierConfig::default(),
            categories: CategoryCatalog::default(),
            teams: vec![TeamSeed {
                name: FALLBACK_TEAM.to_string(),
                category: None,
            }],
        }
    }
}

impl DeskConfig {
    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Read a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// File (or defaults) with process environment overrides applied
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `HELPDESK_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_CLASSIFIER_URL) {
            self.classifier.url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(path) = lookup(ENV_STATE_PATH) {
            self.state_path = Some(PathBuf::from(path));
        }
        if let Some(secs) = lookup(ENV_CLASSIFY_TIMEOUT_SECS) {
            self.intake.classify_timeout_secs =
                secs.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    key: ENV_CLASSIFY_TIMEOUT_SECS,
                    value: secs.clone(),
                })?;
        }
        Ok(())
    }

    /// Apply command-line overrides; `None` leaves a value unchanged
    pub fn apply_overrides(&mut self, state_path: Option<PathBuf>, classifier_url: Option<String>) {
        if let Some(path) = state_path {
            self.state_path = Some(path);
        }
        if let Some(url) = classifier_url {
            self.classifier.url = Some(url);
        }
    }
}
