//! Application configuration for ogetheory.
//!
//! User config lives at `~/.ogetheory/ogetheory.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OgeTheoryError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "ogetheory.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".ogetheory";

/// Similarity score (0–100) a title must reach to join a task bucket.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 90.0;

// ---------------------------------------------------------------------------
// Config structs (matching ogetheory.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Dataset locations.
    #[serde(default)]
    pub data: DataConfig,

    /// Fuzzy matching settings.
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Text export settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// `[data]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Theory dataset: a JSON object whose first value is the item list.
    #[serde(default = "default_theory_path")]
    pub theory_path: String,

    /// Taxonomy dataset: a JSON array of skill / task-number records.
    #[serde(default = "default_taxonomy_path")]
    pub taxonomy_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            theory_path: default_theory_path(),
            taxonomy_path: default_taxonomy_path(),
        }
    }
}

fn default_theory_path() -> String {
    "_select_g_name_as_goal_title_gc_content_txt_as_content_from_goal.json".into()
}
fn default_taxonomy_path() -> String {
    "oge_tasks.json".into()
}

/// `[matching]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum similarity ratio (0–100) for a title to match a skill.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_FUZZY_THRESHOLD
}

/// `[export]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory that receives exported `.txt` files.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    ".".into()
}

impl MatchingConfig {
    /// Reject thresholds outside the 0–100 similarity scale.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(OgeTheoryError::config(format!(
                "matching.threshold must be within 0..=100, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.ogetheory/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| OgeTheoryError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.ogetheory/ogetheory.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| OgeTheoryError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        OgeTheoryError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.matching.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| OgeTheoryError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| OgeTheoryError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| OgeTheoryError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
