//! CLI theme and styling.

use colored::Colorize;
use tollgate_core::RiskClass;

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format a warning message.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    /// Format an info message.
    pub(crate) fn info(text: &str) -> String {
        format!("{} {}", "i".blue(), text)
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    /// Format a separator line.
    pub(crate) fn separator() -> String {
        "━".repeat(50).dimmed().to_string()
    }

    /// Format a prompt id.
    pub(crate) fn prompt_id(id: &str) -> String {
        format!("{}", id.bold())
    }

    /// Colour a risk label by severity.
    pub(crate) fn risk(risk: RiskClass) -> String {
        match risk {
            RiskClass::Low => risk.as_str().green().to_string(),
            RiskClass::Medium => risk.as_str().yellow().to_string(),
            RiskClass::High => risk.as_str().red().bold().to_string(),
        }
    }

    /// Format a yes/no flag.
    pub(crate) fn flag(value: bool) -> String {
        if value {
            "yes".bold().to_string()
        } else {
            "no".dimmed().to_string()
        }
    }
}
