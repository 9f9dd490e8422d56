//! Source-annotated rendering for `tollgate config`.

use std::fmt::{self, Write as _};

use crate::error::{ConfigError, ConfigResult};
use crate::merge::FieldSources;
use crate::types::Config;

/// A resolved configuration together with where each value came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final merged configuration.
    pub config: Config,
    /// Dotted field path to the layer that set it.
    pub field_sources: FieldSources,
    /// Config files that were loaded, lowest precedence first.
    pub loaded_files: Vec<String>,
}

/// Output format for [`ResolvedConfig::show`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFormat {
    /// TOML with a trailing `# [layer]` comment on each value.
    Toml,
    /// Plain JSON.
    Json,
}

impl ResolvedConfig {
    /// Render the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RenderError`] if serialization fails.
    pub fn show(&self, format: ShowFormat) -> ConfigResult<String> {
        match format {
            ShowFormat::Toml => {
                let body = toml::to_string_pretty(&self.config)
                    .map_err(|e| render_error("toml", &e))?;
                self.annotate(&body).map_err(|e| render_error("toml", &e))
            },
            ShowFormat::Json => {
                serde_json::to_string_pretty(&self.config).map_err(|e| render_error("json", &e))
            },
        }
    }

    fn annotate(&self, body: &str) -> Result<String, fmt::Error> {
        let mut output = String::from("# Resolved tollgate configuration\n");
        if !self.loaded_files.is_empty() {
            output.push_str("#\n# Loaded files (lowest precedence first):\n");
            for path in &self.loaded_files {
                writeln!(output, "#   {path}")?;
            }
        }
        output.push('\n');

        let mut section = String::new();
        for line in body.lines() {
            let trimmed = line.trim();
            if let Some(header) = trimmed
                .strip_prefix("[[")
                .and_then(|h| h.strip_suffix("]]"))
                .or_else(|| trimmed.strip_prefix('[').and_then(|h| h.strip_suffix(']')))
            {
                section = header.to_owned();
                match self.field_sources.get(&section) {
                    Some(layer) => writeln!(output, "{line}  # [{layer}]")?,
                    None => writeln!(output, "{line}")?,
                }
                continue;
            }

            let annotation = trimmed
                .split_once(" = ")
                .map(|(key, _)| {
                    if section.is_empty() {
                        key.to_owned()
                    } else {
                        format!("{section}.{key}")
                    }
                })
                .and_then(|path| self.field_sources.get(&path));
            match annotation {
                Some(layer) => writeln!(output, "{line}  # [{layer}]")?,
                None => writeln!(output, "{line}")?,
            }
        }

        Ok(output)
    }
}

fn render_error(format: &str, err: &dyn fmt::Display) -> ConfigError {
    ConfigError::RenderError {
        format: format.to_owned(),
        message: err.to_string(),
    }
}
