//! Tollgate Config - layered TOML configuration.
//!
//! # Usage
//!
//! ```rust,no_run
//! use tollgate_config::Config;
//!
//! let resolved = Config::load(Some(std::path::Path::new("."))).unwrap();
//! println!("bridge at {:?}", resolved.config.bridge.path);
//! ```
//!
//! # Precedence
//!
//! From highest to lowest:
//!
//! 1. **Workspace** (`{root}/.tollgate/config.toml`)
//! 2. **User** (`~/.tollgate/config.toml`)
//! 3. **Environment** (`TOLLGATE_BRIDGE_PATH`, `TOLLGATE_LOG_LEVEL`,
//!    `TOLLGATE_LOG_FORMAT`), only for fields no file set
//! 4. **Embedded defaults** (`defaults.toml`)
//!
//! This crate has no dependencies on other tollgate crates. The CLI
//! converts the loaded values into domain types.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Environment variable fallbacks.
pub mod env;
/// Configuration error types.
pub mod error;
/// File discovery and layered loading.
pub mod loader;
/// Layer merging and source tracking.
pub mod merge;
/// Annotated display of a resolved configuration.
pub mod show;
/// Configuration struct definitions.
pub mod types;
/// Range and consistency checks.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use merge::{ConfigLayer, FieldSources};
pub use show::{ResolvedConfig, ShowFormat};
pub use types::*;

impl Config {
    /// Load the full layered configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any file is malformed or the result
    /// fails validation.
    pub fn load(workspace_root: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, None)
    }

    /// Load with an explicit `~/.tollgate` replacement directory.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any file is malformed or the result
    /// fails validation.
    pub fn load_with_home(
        workspace_root: Option<&std::path::Path>,
        tollgate_home: &std::path::Path,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, Some(tollgate_home))
    }

    /// Load a single file, without layering.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or
    /// fails validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
