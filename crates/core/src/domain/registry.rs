// Probe Registry - the catalog of checks
//
// Single source of truth for which probes exist. Adding a probe means adding
// one entry to `builtin_definitions`.

use std::collections::HashSet;

use super::error::{DomainError, Result};
use super::policy::{OutputPolicy, TriStateDetails, UnsetKeyPolicy};
use super::probe::ProbeDefinition;

/// Default screen saver ceiling (20 minutes)
pub const DEFAULT_MAX_IDLE_SECS: i64 = 1200;

/// Policy knobs applied when building the built-in catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryOptions {
    pub unset_key_policy: UnsetKeyPolicy,
    pub max_idle_secs: i64,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            unset_key_policy: UnsetKeyPolicy::AssumeDefault,
            max_idle_secs: DEFAULT_MAX_IDLE_SECS,
        }
    }
}

/// Ordered, read-only sequence of probe definitions
#[derive(Debug, Clone)]
pub struct ProbeRegistry {
    probes: Vec<ProbeDefinition>,
}

impl ProbeRegistry {
    /// Built-in catalog with default policies
    pub fn builtin() -> Self {
        Self::builtin_with(RegistryOptions::default())
    }

    /// Built-in catalog with policy overrides applied
    pub fn builtin_with(options: RegistryOptions) -> Self {
        let probes = builtin_definitions()
            .into_iter()
            .map(|mut def| {
                def.policy = def
                    .policy
                    .with_unset_policy(options.unset_key_policy)
                    .with_max_secs(options.max_idle_secs);
                def
            })
            .collect();

        Self { probes }
    }

    /// Registry from arbitrary definitions (order preserved)
    pub fn from_definitions(probes: Vec<ProbeDefinition>) -> Self {
        Self { probes }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProbeDefinition> {
        self.probes.iter()
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ProbeDefinition> {
        self.probes.iter().find(|def| def.id == id)
    }

    /// Check structural invariants: unique non-empty ids, positive weights,
    /// non-empty commands.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for def in &self.probes {
            if def.id.trim().is_empty() {
                return Err(DomainError::EmptyProbeId(def.name.to_string()));
            }
            if !seen.insert(def.id) {
                return Err(DomainError::DuplicateProbeId(def.id.to_string()));
            }
            if def.weight == 0 {
                return Err(DomainError::ZeroWeight(def.id.to_string()));
            }
            if def.command.trim().is_empty() {
                return Err(DomainError::EmptyCommand(def.id.to_string()));
            }
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a ProbeRegistry {
    type Item = &'a ProbeDefinition;
    type IntoIter = std::slice::Iter<'a, ProbeDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.probes.iter()
    }
}

fn builtin_definitions() -> Vec<ProbeDefinition> {
    vec![
        ProbeDefinition {
            id: "sip",
            name: "System Integrity Protection (SIP)",
            category: "System Integrity",
            weight: 15,
            command: "csrutil status",
            policy: OutputPolicy::Contains { marker: "enabled" },
        },
        ProbeDefinition {
            id: "gatekeeper",
            name: "Gatekeeper",
            category: "System Integrity",
            weight: 12,
            command: "spctl --status",
            policy: OutputPolicy::Contains {
                marker: "assessments enabled",
            },
        },
        ProbeDefinition {
            id: "filevault",
            name: "FileVault Full-Disk Encryption",
            category: "Encryption",
            weight: 15,
            command: "fdesetup status",
            policy: OutputPolicy::Contains { marker: "On" },
        },
        ProbeDefinition {
            id: "firewall",
            name: "Application Firewall",
            category: "Network",
            weight: 10,
            command: "/usr/libexec/ApplicationFirewall/socketfilterfw --getglobalstate",
            policy: OutputPolicy::Contains { marker: "enabled" },
        },
        ProbeDefinition {
            id: "stealth",
            name: "Firewall Stealth Mode",
            category: "Network",
            weight: 8,
            command: "/usr/libexec/ApplicationFirewall/socketfilterfw --getstealthmode",
            policy: OutputPolicy::Contains { marker: "enabled" },
        },
        ProbeDefinition {
            id: "autoupdates",
            name: "Automatic Security Updates",
            category: "Updates",
            weight: 10,
            command: "defaults read /Library/Preferences/com.apple.SoftwareUpdate AutomaticCheckEnabled 2>/dev/null || echo \"not_set\"",
            policy: OutputPolicy::TriState {
                enabled: "1",
                disabled: "0",
                details: TriStateDetails {
                    enabled: "Enabled",
                    disabled: "Disabled",
                    assumed_default: "Not explicitly set (default: enabled)",
                },
                when_unset: UnsetKeyPolicy::AssumeDefault,
            },
        },
        ProbeDefinition {
            id: "screenlock",
            name: "Require Password After Sleep/Screen Saver",
            category: "User Controls",
            weight: 10,
            command: "defaults read com.apple.screensaver askForPassword 2>/dev/null || echo \"not_set\"",
            // Modern macOS dropped this key in favour of Lock Screen settings
            policy: OutputPolicy::TriState {
                enabled: "1",
                disabled: "0",
                details: TriStateDetails {
                    enabled: "Enabled (immediate or short delay)",
                    disabled: "Disabled",
                    assumed_default: "Not set in legacy plist (check Lock Screen settings)",
                },
                when_unset: UnsetKeyPolicy::AssumeDefault,
            },
        },
        ProbeDefinition {
            id: "screentimeout",
            name: "Screen Saver Timeout (≤ 20 min)",
            category: "User Controls",
            weight: 5,
            command: "defaults -currentHost read com.apple.screensaver idleTime",
            policy: OutputPolicy::Threshold {
                max_secs: DEFAULT_MAX_IDLE_SECS,
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::policy::NOT_SET_SENTINEL;

    #[test]
    fn test_builtin_registry_is_valid() {
        let registry = ProbeRegistry::builtin();

        assert_eq!(registry.len(), 8);
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn test_builtin_order_is_stable() {
        let ids: Vec<&str> = ProbeRegistry::builtin().iter().map(|d| d.id).collect();

        assert_eq!(
            ids,
            vec![
                "sip",
                "gatekeeper",
                "filevault",
                "firewall",
                "stealth",
                "autoupdates",
                "screenlock",
                "screentimeout"
            ]
        );
    }

    #[test]
    fn test_builtin_weights() {
        let total: u32 = ProbeRegistry::builtin().iter().map(|d| d.weight).sum();
        assert_eq!(total, 85);
    }

    #[test]
    fn test_tri_state_commands_fall_back_to_sentinel() {
        let registry = ProbeRegistry::builtin();

        for id in ["autoupdates", "screenlock"] {
            let def = registry.get(id).unwrap();
            assert!(def.command.ends_with(&format!("|| echo \"{}\"", NOT_SET_SENTINEL)));
            assert!(def.interpret(NOT_SET_SENTINEL).passed);
        }
    }

    #[test]
    fn test_sip_policy() {
        let registry = ProbeRegistry::builtin();
        let sip = registry.get("sip").unwrap();

        assert!(sip.interpret("System Integrity Protection status: enabled.").passed);
        assert!(!sip.interpret("System Integrity Protection status: disabled.").passed);
    }

    #[test]
    fn test_builtin_with_overrides() {
        let registry = ProbeRegistry::builtin_with(RegistryOptions {
            unset_key_policy: UnsetKeyPolicy::TreatAsFailure,
            max_idle_secs: 600,
        });

        assert!(!registry.get("autoupdates").unwrap().interpret("not_set").passed);
        assert!(!registry.get("screenlock").unwrap().interpret("not_set").passed);
        assert!(!registry.get("screentimeout").unwrap().interpret("900").passed);
        assert!(registry.get("screentimeout").unwrap().interpret("600").passed);
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut probes = builtin_definitions();
        probes.push(probes[0].clone());

        let result = ProbeRegistry::from_definitions(probes).validate();
        assert_eq!(result, Err(DomainError::DuplicateProbeId("sip".to_string())));
    }

    #[test]
    fn test_validate_rejects_zero_weight_and_empty_fields() {
        let mut def = builtin_definitions().remove(0);
        def.weight = 0;
        assert!(matches!(
            ProbeRegistry::from_definitions(vec![def.clone()]).validate(),
            Err(DomainError::ZeroWeight(_))
        ));

        def.weight = 1;
        def.command = "  ";
        assert!(matches!(
            ProbeRegistry::from_definitions(vec![def.clone()]).validate(),
            Err(DomainError::EmptyCommand(_))
        ));

        def.id = "";
        assert!(matches!(
            ProbeRegistry::from_definitions(vec![def]).validate(),
            Err(DomainError::EmptyProbeId(_))
        ));
    }

    #[test]
    fn test_empty_registry() {
        let registry = ProbeRegistry::from_definitions(vec![]);

        assert!(registry.is_empty());
        assert!(registry.validate().is_ok());
        assert!(registry.get("sip").is_none());
    }
}
