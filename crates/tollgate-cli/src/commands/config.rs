//! Config command - print the resolved configuration.

use anyhow::{Context, Result};

use tollgate_config::{ResolvedConfig, ShowFormat};

/// Render `resolved` as annotated TOML or JSON.
fn render(resolved: &ResolvedConfig, json: bool) -> Result<String> {
    let format = if json { ShowFormat::Json } else { ShowFormat::Toml };
    resolved
        .show(format)
        .context("failed to render configuration")
}

/// Print `resolved` as annotated TOML or JSON.
pub(crate) fn run_config(resolved: &ResolvedConfig, json: bool) -> Result<()> {
    println!("{}", render(resolved, json)?);
    Ok(())
}
