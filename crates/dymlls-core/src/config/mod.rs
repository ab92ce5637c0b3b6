//! Configuration types and loading.
//!
//! The server runs fine without any configuration file. When one is present
//! it is a TOML document with three optional sections:
//!
//! ```toml
//! [documents]
//! max_documents = 0          # 0 = unlimited
//! max_file_size = 10485760   # bytes, 0 = unlimited
//!
//! [features]
//! preview = true
//! semantic_tokens = true
//!
//! [toolchain]
//! max_depth = 256
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "DYMLLS_CONFIG";

/// File name searched for in the working and user config directories.
pub const CONFIG_FILE_NAME: &str = "dymlls.toml";

/// Largest accepted `toolchain.max_depth`; the parser recurses once per level.
pub const MAX_NESTING_DEPTH: usize = 1024;

/// Main configuration for the dymlls server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Limits applied to the document store.
    #[serde(default)]
    pub documents: DocumentLimits,

    /// Optional server features.
    #[serde(default)]
    pub features: FeatureConfig,

    /// Settings passed to the DYML toolchain.
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

/// Resource limits for document tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentLimits {
    /// Maximum number of open documents (0 = unlimited).
    #[serde(default)]
    pub max_documents: usize,
    /// Maximum content size in bytes (0 = unlimited).
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for DocumentLimits {
    fn default() -> Self {
        Self {
            max_documents: 0,
            max_file_size: default_max_file_size(),
        }
    }
}

/// Switches for optional server behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureConfig {
    /// Push `custom/preview` notifications.
    #[serde(default = "default_true")]
    pub preview: bool,
    /// Advertise and serve `textDocument/semanticTokens/full`.
    #[serde(default = "default_true")]
    pub semantic_tokens: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            preview: true,
            semantic_tokens: true,
        }
    }
}

/// DYML toolchain settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainConfig {
    /// Maximum element nesting depth accepted by the parser, at most
    /// [`MAX_NESTING_DEPTH`].
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

const fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

const fn default_max_depth() -> usize {
    256
}

const fn default_true() -> bool {
    true
}

impl ServerConfig {
    /// Load configuration from the default locations.
    ///
    /// Paths checked in order:
    /// 1. `$DYMLLS_CONFIG` environment variable
    /// 2. `./dymlls.toml` (current directory)
    /// 3. `~/.config/dymlls/dymlls.toml` (Linux), or the platform config directory
    ///
    /// Falls back to the default configuration when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing config cannot be read, parsed or validated.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load_from(Path::new(&path));
        }

        let local_config = PathBuf::from(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Self::load_from(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("dymlls").join(CONFIG_FILE_NAME);
            if user_config.exists() {
                return Self::load_from(&user_config);
            }
        }

        tracing::debug!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or parsing fails.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ConfigNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        let depth = self.toolchain.max_depth;
        if !(1..=MAX_NESTING_DEPTH).contains(&depth) {
            return Err(Error::InvalidConfig(format!(
                "toolchain.max_depth must be between 1 and {MAX_NESTING_DEPTH}, got {depth}"
            )));
        }
        Ok(())
    }
}
