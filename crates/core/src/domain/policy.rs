// Output Policy - pure interpretation of probe output
//
// Every variant is total: any input text, including empty or garbled output,
// maps to a verdict. Details are derived from the input alone.

use serde::{Deserialize, Serialize};

use super::probe::ProbeVerdict;

/// Token emitted by `|| echo "not_set"` fallbacks when a defaults key is absent
pub const NOT_SET_SENTINEL: &str = "not_set";

/// How a tri-state probe resolves an unset configuration key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsetKeyPolicy {
    /// Missing key means the OS default applies, which is assumed secure
    #[default]
    AssumeDefault,
    /// Missing key is reported as a failed control
    #[serde(alias = "fail")]
    TreatAsFailure,
}

/// Human-readable details for each tri-state outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriStateDetails {
    pub enabled: &'static str,
    pub disabled: &'static str,
    /// Used when the key is unset and the default is assumed
    pub assumed_default: &'static str,
}

/// Details reported for an unset key in strict mode
pub const UNSET_TREATED_AS_FAILURE: &str = "Not explicitly set (treated as disabled)";

/// Interpretation rule attached to a probe definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPolicy {
    /// Pass iff the output contains `marker` (case-sensitive)
    Contains { marker: &'static str },

    /// Explicit enabled / explicit disabled / unset (sentinel or anything else)
    TriState {
        enabled: &'static str,
        disabled: &'static str,
        details: TriStateDetails,
        when_unset: UnsetKeyPolicy,
    },

    /// Integer seconds; pass iff `0 < secs <= max_secs`
    Threshold { max_secs: i64 },
}

impl OutputPolicy {
    pub fn interpret(&self, output: &str) -> ProbeVerdict {
        let trimmed = output.trim();
        match *self {
            OutputPolicy::Contains { marker } => interpret_contains(trimmed, marker),
            OutputPolicy::TriState {
                enabled,
                disabled,
                details,
                when_unset,
            } => interpret_tri_state(trimmed, enabled, disabled, details, when_unset),
            OutputPolicy::Threshold { max_secs } => interpret_threshold(trimmed, max_secs),
        }
    }

    /// Same policy with a different unset-key resolution (no-op for other variants)
    pub fn with_unset_policy(self, policy: UnsetKeyPolicy) -> Self {
        match self {
            OutputPolicy::TriState {
                enabled,
                disabled,
                details,
                ..
            } => OutputPolicy::TriState {
                enabled,
                disabled,
                details,
                when_unset: policy,
            },
            other => other,
        }
    }

    /// Same policy with a different upper bound (no-op for other variants)
    pub fn with_max_secs(self, max_secs: i64) -> Self {
        match self {
            OutputPolicy::Threshold { .. } => OutputPolicy::Threshold { max_secs },
            other => other,
        }
    }
}

fn interpret_contains(output: &str, marker: &str) -> ProbeVerdict {
    let details = if output.is_empty() {
        "No output".to_string()
    } else {
        output.to_string()
    };

    ProbeVerdict {
        passed: output.contains(marker),
        details,
    }
}

fn interpret_tri_state(
    output: &str,
    enabled: &str,
    disabled: &str,
    details: TriStateDetails,
    when_unset: UnsetKeyPolicy,
) -> ProbeVerdict {
    if output == enabled {
        return ProbeVerdict::pass(details.enabled);
    }
    if output == disabled {
        return ProbeVerdict::fail(details.disabled);
    }

    // Sentinel, empty, or unrecognised value: the key is effectively unset
    match when_unset {
        UnsetKeyPolicy::AssumeDefault => ProbeVerdict::pass(details.assumed_default),
        UnsetKeyPolicy::TreatAsFailure => ProbeVerdict::fail(UNSET_TREATED_AS_FAILURE),
    }
}

fn interpret_threshold(output: &str, max_secs: i64) -> ProbeVerdict {
    let parsed = parse_leading_int(output);
    let secs = parsed.unwrap_or(0);

    let details = match parsed {
        Some(secs) => format!("{} minutes", round_minutes(secs)),
        None => format!("Unrecognized idle time value: '{}'", output),
    };

    ProbeVerdict {
        passed: secs > 0 && secs <= max_secs,
        details,
    }
}

/// Lenient integer parse: optional sign, then leading ASCII digits.
/// Trailing text is ignored ("300 seconds" -> 300).
fn parse_leading_int(text: &str) -> Option<i64> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }

    let value: i64 = rest[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Seconds to whole minutes, halves rounded up
fn round_minutes(secs: i64) -> i64 {
    (secs as f64 / 60.0 + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAILS: TriStateDetails = TriStateDetails {
        enabled: "Enabled",
        disabled: "Disabled",
        assumed_default: "Not explicitly set (default: enabled)",
    };

    fn tri_state(when_unset: UnsetKeyPolicy) -> OutputPolicy {
        OutputPolicy::TriState {
            enabled: "1",
            disabled: "0",
            details: DETAILS,
            when_unset,
        }
    }

    #[test]
    fn test_contains_is_case_sensitive() {
        let policy = OutputPolicy::Contains { marker: "enabled" };

        assert!(policy.interpret("Firewall is enabled. (State = 1)").passed);
        assert!(!policy.interpret("Firewall is ENABLED").passed);
        assert!(!policy.interpret("Firewall is disabled. (State = 0)").passed);
    }

    #[test]
    fn test_contains_empty_output_fails() {
        let verdict = OutputPolicy::Contains { marker: "On" }.interpret("");

        assert!(!verdict.passed);
        assert_eq!(verdict.details, "No output");
    }

    #[test]
    fn test_contains_details_are_trimmed_output() {
        let verdict = OutputPolicy::Contains { marker: "On" }.interpret("  FileVault is On.\n");

        assert!(verdict.passed);
        assert_eq!(verdict.details, "FileVault is On.");
    }

    #[test]
    fn test_tri_state_outcomes() {
        let policy = tri_state(UnsetKeyPolicy::AssumeDefault);

        assert_eq!(policy.interpret("1"), ProbeVerdict::pass("Enabled"));
        assert_eq!(policy.interpret("0"), ProbeVerdict::fail("Disabled"));

        let unset = policy.interpret(NOT_SET_SENTINEL);
        assert!(unset.passed);
        assert!(unset.details.contains("default"));
    }

    #[test]
    fn test_tri_state_unrecognised_value_is_unset() {
        let policy = tri_state(UnsetKeyPolicy::AssumeDefault);

        assert!(policy.interpret("").passed);
        assert!(policy.interpret("garbage").passed);
        // Exact match only: "10" is neither "1" nor "0"
        assert_eq!(policy.interpret("10").details, DETAILS.assumed_default);
    }

    #[test]
    fn test_tri_state_strict_mode() {
        let policy = tri_state(UnsetKeyPolicy::AssumeDefault)
            .with_unset_policy(UnsetKeyPolicy::TreatAsFailure);

        assert_eq!(
            policy.interpret(NOT_SET_SENTINEL),
            ProbeVerdict::fail(UNSET_TREATED_AS_FAILURE)
        );
        // Explicit values are unaffected
        assert!(policy.interpret("1").passed);
        assert!(!policy.interpret("0").passed);
    }

    #[test]
    fn test_threshold_boundaries() {
        let policy = OutputPolicy::Threshold { max_secs: 1200 };

        assert!(policy.interpret("1200").passed);
        assert!(!policy.interpret("1201").passed);
        assert!(!policy.interpret("0").passed);
        assert!(!policy.interpret("-60").passed);
        assert!(policy.interpret("1").passed);
    }

    #[test]
    fn test_threshold_details_in_minutes() {
        let policy = OutputPolicy::Threshold { max_secs: 1200 };

        assert_eq!(policy.interpret("1200").details, "20 minutes");
        assert_eq!(policy.interpret("300").details, "5 minutes");
        assert_eq!(policy.interpret("90").details, "2 minutes");
        assert_eq!(policy.interpret("89").details, "1 minutes");
    }

    #[test]
    fn test_threshold_non_numeric_fails() {
        let policy = OutputPolicy::Threshold { max_secs: 1200 };

        let verdict = policy.interpret("not a number");
        assert!(!verdict.passed);
        assert_eq!(verdict.details, "Unrecognized idle time value: 'not a number'");

        assert!(!policy.interpret("").passed);
        assert!(!policy.interpret("-").passed);
    }

    #[test]
    fn test_threshold_ignores_trailing_text() {
        let policy = OutputPolicy::Threshold { max_secs: 1200 };

        assert!(policy.interpret("600 seconds").passed);
    }

    #[test]
    fn test_threshold_override() {
        let policy = OutputPolicy::Threshold { max_secs: 1200 }.with_max_secs(300);

        assert!(policy.interpret("300").passed);
        assert!(!policy.interpret("600").passed);
    }

    #[test]
    fn test_overrides_do_not_touch_other_variants() {
        let policy = OutputPolicy::Contains { marker: "enabled" };

        assert_eq!(policy.with_max_secs(5), policy);
        assert_eq!(policy.with_unset_policy(UnsetKeyPolicy::TreatAsFailure), policy);
    }

    #[test]
    fn test_interpretation_is_pure() {
        let policies = [
            OutputPolicy::Contains { marker: "enabled" },
            tri_state(UnsetKeyPolicy::AssumeDefault),
            OutputPolicy::Threshold { max_secs: 1200 },
        ];

        for policy in policies {
            for input in ["", "1", "0", "not_set", "enabled", "1200", "\u{fffd}\n\t"] {
                assert_eq!(policy.interpret(input), policy.interpret(input));
            }
        }
    }

    #[test]
    fn test_unset_policy_config_names() {
        let strict: UnsetKeyPolicy = serde_json::from_str("\"fail\"").unwrap();
        let lenient: UnsetKeyPolicy = serde_json::from_str("\"assume_default\"").unwrap();

        assert_eq!(strict, UnsetKeyPolicy::TreatAsFailure);
        assert_eq!(lenient, UnsetKeyPolicy::AssumeDefault);
    }
}
