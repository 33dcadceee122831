use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::placeholder::DEFAULT_INSERT_HINT;

/// Host-configurable behavior of the table core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Maximum number of rows visible at once regardless of control size.
    /// `None` means unbounded; `Some(1)` turns the table into a single
    /// editing area with a scrollbar.
    pub max_rows_visible: Option<usize>,

    /// Hint shown by the empty-state placeholder.
    pub insert_hint: String,

    /// Whether Tab at the last column / Shift-Tab at column 0 traverse to
    /// the next / previous row.
    pub traverse_on_tabs: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_rows_visible: None,
            insert_hint: DEFAULT_INSERT_HINT.to_string(),
            traverse_on_tabs: true,
        }
    }
}

impl TableConfig {
    /// Load config from the default location, creating it on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse a TOML fragment, e.g. a `[table]` section embedded in a larger
    /// host config file.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: TableConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default config file path.
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("composite-table").join("config.toml"))
    }
}
