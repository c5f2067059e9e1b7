//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use bowtie_extractor::ExtractorConfig;
use bowtie_llm::ProviderSettings;
use bowtie_quality::QualityThresholds;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Data locations
    #[serde(default)]
    pub paths: Paths,

    /// Provider selection and settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Extraction run tuning
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Quality gate thresholds
    #[serde(default)]
    pub quality: QualityThresholds,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Where inputs, outputs and the manifest live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    /// Directory of `*.txt` narratives
    pub text_dir: PathBuf,

    /// Root for `<provider>/<incident_id>.json` records
    pub out_dir: PathBuf,

    /// Manifest CSV
    pub manifest: PathBuf,

    /// Prompt template file (built-in template when unset)
    pub prompt_template: Option<PathBuf>,

    /// Schema template file (built-in schema when unset)
    pub schema_template: Option<PathBuf>,
}

/// Provider selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// One of `bowtie_llm::SUPPORTED_PROVIDERS`
    #[serde(default = "default_provider")]
    pub name: String,

    /// Model, token budget, temperature, timeout
    #[serde(flatten)]
    pub settings: ProviderSettings,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".bowtie").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        if !bowtie_llm::SUPPORTED_PROVIDERS.contains(&self.provider.name.as_str()) {
            return Err(CliError::Config(format!(
                "unknown provider '{}' (supported: {})",
                self.provider.name,
                bowtie_llm::SUPPORTED_PROVIDERS.join(", ")
            )));
        }
        self.extractor.validate().map_err(CliError::Config)?;
        self.quality.validate().map_err(CliError::Config)?;
        Ok(())
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            text_dir: PathBuf::from("data/text"),
            out_dir: PathBuf::from("data/structured/incidents"),
            manifest: PathBuf::from("data/manifests/structured_manifest.csv"),
            prompt_template: None,
            schema_template: None,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider(),
            settings: ProviderSettings::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_provider() -> String {
    "stub".to_string()
}
