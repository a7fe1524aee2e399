//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/knotree/knotree.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `KNOTREE_*` prefix, `__` between sections
//!    (e.g. `KNOTREE_LAYOUT__ROW_SPACING=120`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::layout::{
    DEFAULT_MIN_WIDTH, DEFAULT_ROW_SPACING, DEFAULT_TOP_MARGIN, DEFAULT_WIDTH_PER_NODE,
};
use crate::domain::LayoutEngine;

/// Prefix of the environment layer, e.g. `KNOTREE_LOG__RECENT_ENTRIES`.
pub const ENV_PREFIX: &str = "KNOTREE";

/// Layout geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutSettings {
    /// Vertical distance between depth rows
    pub row_spacing: f64,
    /// `y` of the root row
    pub top_margin: f64,
    /// Smallest canvas width
    pub min_width: f64,
    /// Canvas width granted per visible node beyond `min_width`
    pub width_per_node: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            row_spacing: DEFAULT_ROW_SPACING,
            top_margin: DEFAULT_TOP_MARGIN,
            min_width: DEFAULT_MIN_WIDTH,
            width_per_node: DEFAULT_WIDTH_PER_NODE,
        }
    }
}

impl LayoutSettings {
    pub fn engine(&self) -> LayoutEngine {
        LayoutEngine::new(self.row_spacing, self.top_margin)
    }
}

/// Action log display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogSettings {
    /// Entries shown by `knotree log` without `--limit`
    pub recent_entries: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { recent_entries: 8 }
    }
}

/// Unified configuration for knotree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub layout: LayoutSettings,
    pub log: LogSettings,
}

/// Get the XDG config directory for knotree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "knotree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("knotree.toml"))
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// Expand `~` and `$VAR` in a user-supplied path.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `explicit` - Optional config file; must exist if given
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path();
        Self::load_layers(global.as_deref(), explicit, Some(ENV_PREFIX))
    }

    /// Load from the given layers only: `global` is optional and skipped when
    /// absent, `explicit` must exist, `env_prefix` enables the environment layer.
    pub fn load_layers(
        global: Option<&Path>,
        explicit: Option<&Path>,
        env_prefix: Option<&str>,
    ) -> Result<Self, ApplicationError> {
        let mut builder = Config::builder();

        if let Some(global_path) = global.filter(|p| p.exists()) {
            debug!("global config: {}", global_path.display());
            builder = builder.add_source(
                File::from(global_path)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        if let Some(path) = explicit {
            let path = expand_path(path);
            if !path.is_file() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            debug!("explicit config: {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        if let Some(prefix) = env_prefix {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let settings: Self = builder
            .build()
            .map_err(config_err)?
            .try_deserialize()
            .map_err(config_err)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a TOML string on top of the defaults.
    pub fn from_toml(content: &str) -> Result<Self, ApplicationError> {
        let settings: Self = toml::from_str(content).map_err(|e| ApplicationError::Config {
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: e.to_string(),
        })
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        let layout = &self.layout;
        let checks = [
            ("layout.row_spacing", layout.row_spacing),
            ("layout.top_margin", layout.top_margin),
            ("layout.min_width", layout.min_width),
            ("layout.width_per_node", layout.width_per_node),
        ];
        for (key, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(ApplicationError::Config {
                    message: format!("{} must be a non-negative number, got {}", key, value),
                });
            }
        }
        Ok(())
    }
}
