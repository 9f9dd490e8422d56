//! Approval policy: decides, per tool name, whether a human must approve.
//!
//! An [`ApprovalPolicy`] is loaded once per gate and never changes for the
//! lifetime of that gate; a different policy means a different gate.
//!
//! # Match Precedence
//!
//! First match wins:
//!
//! 1. Tool in `allowlist` -> no approval, `low`, default display options.
//!    Per-tool rules are ignored.
//! 2. Tool in `denylist` -> approval, `high`, default display options.
//! 3. Tool has a [`ToolRule`] -> the rule's overrides on top of the policy
//!    default and the default display options.
//! 4. Otherwise -> `default_require_approval`, `medium` when approval is
//!    required and `low` otherwise.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use tollgate_core::RiskClass;

use crate::redact::{DisplayOptions, RedactionRule};

/// Per-tool override of the policy defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRule {
    /// Exact tool name this rule applies to.
    pub tool_name: String,
    /// Overrides `default_require_approval` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_approval: Option<bool>,
    /// Overrides the derived risk class when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_class: Option<RiskClass>,
    /// Display limit and redaction overrides.
    #[serde(default)]
    pub display: DisplayOverrides,
}

impl ToolRule {
    /// Create an empty rule for `tool_name`.
    #[must_use]
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            ..Self::default()
        }
    }

    /// Set whether the tool requires approval.
    #[must_use]
    pub fn require_approval(mut self, required: bool) -> Self {
        self.require_approval = Some(required);
        self
    }

    /// Set the risk class.
    #[must_use]
    pub fn risk_class(mut self, risk_class: RiskClass) -> Self {
        self.risk_class = Some(risk_class);
        self
    }

    /// Set display overrides.
    #[must_use]
    pub fn with_display(mut self, display: DisplayOverrides) -> Self {
        self.display = display;
        self
    }
}

/// Individually optional display overrides.
///
/// Numeric limits replace the default one by one. A present `rules` list
/// replaces the default rule list entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOverrides {
    /// Override for `max_depth`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Override for `max_string_len`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_string_len: Option<usize>,
    /// Override for `max_array_len`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_array_len: Option<usize>,
    /// Override for `max_object_keys`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_object_keys: Option<usize>,
    /// Replacement redaction rule list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RedactionRule>>,
}

impl DisplayOverrides {
    /// Apply these overrides on top of `defaults`.
    #[must_use]
    pub fn apply(&self, defaults: &DisplayOptions) -> DisplayOptions {
        DisplayOptions {
            max_depth: self.max_depth.unwrap_or(defaults.max_depth),
            max_string_len: self.max_string_len.unwrap_or(defaults.max_string_len),
            max_array_len: self.max_array_len.unwrap_or(defaults.max_array_len),
            max_object_keys: self.max_object_keys.unwrap_or(defaults.max_object_keys),
            rules: self
                .rules
                .clone()
                .unwrap_or_else(|| defaults.rules.clone()),
        }
    }
}

/// Verdict of a policy lookup for one tool name. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyMatch {
    /// Whether a human decision is needed before executing.
    pub require_approval: bool,
    /// Severity label for triage and display.
    pub risk_class: RiskClass,
    /// How the call's arguments are rendered for the human.
    pub display_options: DisplayOptions,
}

/// Which precedence step produced a [`PolicyMatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    /// Tool is allowlisted.
    Allowlist,
    /// Tool is denylisted.
    Denylist,
    /// A per-tool rule matched.
    ToolRule,
    /// Nothing matched; policy default applied.
    Default,
}

/// Approval policy for a gate.
///
/// # Example
///
/// ```
/// use tollgate_approval::policy::{ApprovalPolicy, ToolRule};
/// use tollgate_core::RiskClass;
///
/// let policy = ApprovalPolicy::new(true)
///     .with_allowed("readFile")
///     .with_denied("deleteFile")
///     .with_rule(ToolRule::new("search").require_approval(false));
///
/// assert!(!policy.match_tool("readFile").require_approval);
/// assert_eq!(policy.match_tool("deleteFile").risk_class, RiskClass::High);
/// assert!(!policy.match_tool("search").require_approval);
/// assert_eq!(policy.match_tool("writeFile").risk_class, RiskClass::Medium);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    /// Whether unclassified tools need approval.
    #[serde(default = "default_true")]
    pub default_require_approval: bool,
    /// Tools that never need approval.
    #[serde(default)]
    pub allowlist: HashSet<String>,
    /// Tools that always need approval at high risk.
    #[serde(default)]
    pub denylist: HashSet<String>,
    /// Per-tool overrides.
    #[serde(default)]
    pub tools: Vec<ToolRule>,
    /// Display options used when no rule overrides them.
    #[serde(default)]
    pub display_defaults: DisplayOptions,
}

fn default_true() -> bool {
    true
}

impl Default for ApprovalPolicy {
    /// Fails safe: every unclassified tool requires approval.
    fn default() -> Self {
        Self::new(true)
    }
}

impl ApprovalPolicy {
    /// Create an empty policy with the given default.
    #[must_use]
    pub fn new(default_require_approval: bool) -> Self {
        Self {
            default_require_approval,
            allowlist: HashSet::new(),
            denylist: HashSet::new(),
            tools: Vec::new(),
            display_defaults: DisplayOptions::default(),
        }
    }

    /// Add a tool to the allowlist.
    #[must_use]
    pub fn with_allowed(mut self, tool_name: impl Into<String>) -> Self {
        self.allowlist.insert(tool_name.into());
        self
    }

    /// Add a tool to the denylist.
    #[must_use]
    pub fn with_denied(mut self, tool_name: impl Into<String>) -> Self {
        self.denylist.insert(tool_name.into());
        self
    }

    /// Append a per-tool rule.
    #[must_use]
    pub fn with_rule(mut self, rule: ToolRule) -> Self {
        self.tools.push(rule);
        self
    }

    /// Set the default display options.
    #[must_use]
    pub fn with_display_defaults(mut self, display: DisplayOptions) -> Self {
        self.display_defaults = display;
        self
    }

    /// Resolve the policy verdict for `tool_name`. Pure and total.
    #[must_use]
    pub fn match_tool(&self, tool_name: &str) -> PolicyMatch {
        self.match_tool_with_source(tool_name).0
    }

    /// Like [`match_tool`](Self::match_tool), also reporting which step matched.
    #[must_use]
    pub fn match_tool_with_source(&self, tool_name: &str) -> (PolicyMatch, MatchSource) {
        if self.allowlist.contains(tool_name) {
            let verdict = PolicyMatch {
                require_approval: false,
                risk_class: RiskClass::Low,
                display_options: self.display_defaults.clone(),
            };
            return (verdict, MatchSource::Allowlist);
        }

        if self.denylist.contains(tool_name) {
            let verdict = PolicyMatch {
                require_approval: true,
                risk_class: RiskClass::High,
                display_options: self.display_defaults.clone(),
            };
            return (verdict, MatchSource::Denylist);
        }

        if let Some(rule) = self.rule_for(tool_name) {
            let require_approval = rule
                .require_approval
                .unwrap_or(self.default_require_approval);
            let verdict = PolicyMatch {
                require_approval,
                risk_class: rule
                    .risk_class
                    .unwrap_or_else(|| derived_risk(require_approval)),
                display_options: rule.display.apply(&self.display_defaults),
            };
            return (verdict, MatchSource::ToolRule);
        }

        let verdict = PolicyMatch {
            require_approval: self.default_require_approval,
            risk_class: derived_risk(self.default_require_approval),
            display_options: self.display_defaults.clone(),
        };
        (verdict, MatchSource::Default)
    }

    /// First rule whose name matches exactly.
    fn rule_for(&self, tool_name: &str) -> Option<&ToolRule> {
        self.tools.iter().find(|rule| rule.tool_name == tool_name)
    }
}

fn derived_risk(require_approval: bool) -> RiskClass {
    if require_approval {
        RiskClass::Medium
    } else {
        RiskClass::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_with_everything(name: &str) -> ToolRule {
        ToolRule::new(name)
            .require_approval(true)
            .risk_class(RiskClass::High)
            .with_display(DisplayOverrides {
                max_depth: Some(1),
                ..DisplayOverrides::default()
            })
    }

    #[test]
    fn test_allowlist_wins_over_everything() {
        let policy = ApprovalPolicy::new(true)
            .with_allowed("shell")
            .with_denied("shell")
            .with_rule(rule_with_everything("shell"));

        let (verdict, source) = policy.match_tool_with_source("shell");
        assert_eq!(source, MatchSource::Allowlist);
        assert!(!verdict.require_approval);
        assert_eq!(verdict.risk_class, RiskClass::Low);
        assert_eq!(verdict.display_options, DisplayOptions::default());
    }

    #[test]
    fn test_denylist_wins_over_rules() {
        let policy = ApprovalPolicy::new(false)
            .with_denied("rm")
            .with_rule(ToolRule::new("rm").require_approval(false).risk_class(RiskClass::Low));

        let (verdict, source) = policy.match_tool_with_source("rm");
        assert_eq!(source, MatchSource::Denylist);
        assert!(verdict.require_approval);
        assert_eq!(verdict.risk_class, RiskClass::High);
        assert_eq!(verdict.display_options, DisplayOptions::default());
    }

    #[test]
    fn test_rule_inherits_policy_default() {
        let policy = ApprovalPolicy::new(true).with_rule(ToolRule::new("fetch"));
        let verdict = policy.match_tool("fetch");
        assert!(verdict.require_approval);
        assert_eq!(verdict.risk_class, RiskClass::Medium);
    }

    #[test]
    fn test_rule_without_approval_is_low_risk() {
        let policy = ApprovalPolicy::new(true).with_rule(ToolRule::new("fetch").require_approval(false));
        let verdict = policy.match_tool("fetch");
        assert!(!verdict.require_approval);
        assert_eq!(verdict.risk_class, RiskClass::Low);
    }

    #[test]
    fn test_rule_explicit_risk_class() {
        let policy = ApprovalPolicy::new(false)
            .with_rule(ToolRule::new("deploy").risk_class(RiskClass::High));
        let verdict = policy.match_tool("deploy");
        assert!(!verdict.require_approval);
        assert_eq!(verdict.risk_class, RiskClass::High);
    }

    #[test]
    fn test_rule_numeric_limits_override_individually() {
        let policy = ApprovalPolicy::new(true).with_rule(ToolRule::new("fetch").with_display(
            DisplayOverrides {
                max_string_len: Some(10),
                ..DisplayOverrides::default()
            },
        ));
        let options = policy.match_tool("fetch").display_options;
        let defaults = DisplayOptions::default();

        assert_eq!(options.max_string_len, 10);
        assert_eq!(options.max_depth, defaults.max_depth);
        assert_eq!(options.max_array_len, defaults.max_array_len);
        assert_eq!(options.max_object_keys, defaults.max_object_keys);
        assert_eq!(options.rules, defaults.rules);
    }

    #[test]
    fn test_rule_redaction_list_replaces_defaults() {
        let policy = ApprovalPolicy::new(true).with_rule(ToolRule::new("callApi").with_display(
            DisplayOverrides {
                rules: Some(vec![RedactionRule::new("token")]),
                ..DisplayOverrides::default()
            },
        ));
        let options = policy.match_tool("callApi").display_options;
        assert_eq!(options.rules, vec![RedactionRule::new("token")]);
    }

    #[test]
    fn test_unknown_tool_fails_safe() {
        let policy = ApprovalPolicy::default();
        let (verdict, source) = policy.match_tool_with_source("mystery");
        assert_eq!(source, MatchSource::Default);
        assert!(verdict.require_approval);
        assert_eq!(verdict.risk_class, RiskClass::Medium);
    }

    #[test]
    fn test_permissive_default() {
        let policy = ApprovalPolicy::new(false);
        let verdict = policy.match_tool("anything");
        assert!(!verdict.require_approval);
        assert_eq!(verdict.risk_class, RiskClass::Low);
    }

    #[test]
    fn test_matching_is_exact() {
        let policy = ApprovalPolicy::new(true).with_allowed("read");
        assert!(policy.match_tool("readFile").require_approval);
        assert!(policy.match_tool("Read").require_approval);
    }

    #[test]
    fn test_allowlisted_names_never_require_approval() {
        let names = ["a", "b", "c", "writeFile", "deleteFile"];
        let mut policy = ApprovalPolicy::new(true);
        for name in names {
            policy = policy
                .with_allowed(name)
                .with_denied(name)
                .with_rule(rule_with_everything(name));
        }
        for name in names {
            assert!(!policy.match_tool(name).require_approval);
        }
    }

    #[test]
    fn test_policy_deserializes_with_defaults() {
        let policy: ApprovalPolicy = serde_json::from_str(r#"{"denylist": ["rm"]}"#).unwrap();
        assert!(policy.default_require_approval);
        assert!(policy.denylist.contains("rm"));
        assert!(policy.tools.is_empty());
    }
}
