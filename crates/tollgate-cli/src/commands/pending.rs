//! Pending command - list unanswered prompts.

use anyhow::Result;
use colored::Colorize;

use tollgate_bridge::{Prompt, PromptBridge};
use tollgate_core::RiskClass;

use crate::theme::Theme;

/// Print every pending prompt, oldest first.
pub(crate) fn run_pending(bridge: &PromptBridge, json: bool) -> Result<()> {
    let prompts = bridge.list_pending()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prompts)?);
        return Ok(());
    }

    if prompts.is_empty() {
        println!("{}", Theme::info("No pending prompts"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Pending Prompts"));
    println!(
        "{:<36} {:>20} {:<6} {}",
        "ID".dimmed(),
        "CREATED".dimmed(),
        "RISK".dimmed(),
        "QUESTION".dimmed()
    );
    println!("{}", Theme::separator());

    for prompt in &prompts {
        let risk = risk_of(prompt).map_or_else(|| Theme::dimmed("-"), Theme::risk);
        println!(
            "{:<36} {:>20} {:<6} {}",
            Theme::prompt_id(&prompt.id),
            prompt.created_at,
            risk,
            prompt.question.message
        );
    }

    println!();
    Ok(())
}

/// Risk class carried by an approval prompt's details, if any.
fn risk_of(prompt: &Prompt) -> Option<RiskClass> {
    prompt
        .question
        .details
        .as_ref()?
        .get("riskClass")?
        .as_str()?
        .parse()
        .ok()
}
