//! Check command - show the policy verdict for a tool.

use tollgate_approval::ApprovalPolicy;
use tollgate_approval::policy::MatchSource;

use crate::theme::Theme;

fn describe(source: MatchSource) -> &'static str {
    match source {
        MatchSource::Allowlist => "allowlist",
        MatchSource::Denylist => "denylist",
        MatchSource::ToolRule => "tool rule",
        MatchSource::Default => "policy default",
    }
}

/// Print how `tool` would be gated.
pub(crate) fn run_check(policy: &ApprovalPolicy, tool: &str) {
    let (verdict, source) = policy.match_tool_with_source(tool);
    let display = &verdict.display_options;

    println!("\n{}", Theme::header(&format!("Policy for '{tool}'")));
    println!("{}", Theme::separator());
    println!("  requires approval  {}", Theme::flag(verdict.require_approval));
    println!("  risk class         {}", Theme::risk(verdict.risk_class));
    println!("  matched by         {}", describe(source));
    println!(
        "  display limits     {}",
        Theme::dimmed(&format!(
            "depth {}, string {}, array {}, keys {}",
            display.max_depth, display.max_string_len, display.max_array_len, display.max_object_keys
        ))
    );
    let keys: Vec<&str> = display.rules.iter().map(|r| r.key.as_str()).collect();
    println!("  redacted keys      {}", Theme::dimmed(&keys.join(", ")));
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_sources() {
        assert_eq!(describe(MatchSource::Default), "policy default");
        assert_eq!(describe(MatchSource::ToolRule), "tool rule");
    }
}
