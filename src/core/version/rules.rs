// ─── Platform Rules ───
// OS detection and allow/disallow evaluation for library entries.

use crate::core::scanner::{lookup_nested_scalar, lookup_scalar};

/// Operating-system family as named by version descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Osx,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Osx
        } else {
            Platform::Linux
        }
    }

    /// Name used in `os.name` rules and `natives` maps.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Osx => "osx",
            Platform::Linux => "linux",
        }
    }

    /// Accepts the descriptor spelling plus the newer `macos` alias.
    pub fn matches_name(self, name: &str) -> bool {
        let name = name.trim();
        name.eq_ignore_ascii_case(self.as_str())
            || (self == Platform::Osx && name.eq_ignore_ascii_case("macos"))
    }

    /// Fallback classifier key when an entry has no `natives` map.
    pub fn default_native_classifier(self) -> String {
        format!("natives-{}", self.as_str())
    }

    pub fn classpath_separator(self) -> &'static str {
        match self {
            Platform::Windows => ";",
            Platform::Osx | Platform::Linux => ":",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `32` or `64`, substituted for `${arch}` in native classifier names.
pub fn arch_bits() -> &'static str {
    if cfg!(target_pointer_width = "32") {
        "32"
    } else {
        "64"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    Allow,
    Disallow,
}

impl RuleAction {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "allow" => Some(RuleAction::Allow),
            "disallow" => Some(RuleAction::Disallow),
            _ => None,
        }
    }
}

/// One `{action, os.name}` directive from a library's `rules` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRule {
    pub action: RuleAction,
    /// `None` applies to every platform.
    pub os_name: Option<String>,
}

impl PlatformRule {
    pub fn allow(os_name: Option<&str>) -> Self {
        Self {
            action: RuleAction::Allow,
            os_name: os_name.map(str::to_string),
        }
    }

    pub fn disallow(os_name: Option<&str>) -> Self {
        Self {
            action: RuleAction::Disallow,
            os_name: os_name.map(str::to_string),
        }
    }

    /// Parses a rule object; rules with an unknown action are dropped.
    pub fn parse(raw: &str) -> Option<Self> {
        let action = RuleAction::parse(&lookup_scalar(raw, "action")?)?;
        Some(Self {
            action,
            os_name: lookup_nested_scalar(raw, &["os", "name"]),
        })
    }

    pub fn applies_to(&self, platform: Platform) -> bool {
        match &self.os_name {
            None => true,
            Some(name) => platform.matches_name(name),
        }
    }
}

/// Evaluates `rules` top to bottom for `platform`.
///
/// The outcome is *allow* unless a disallowing rule applies, which ends the
/// evaluation immediately. An empty list always allows.
pub fn rules_allow(rules: &[PlatformRule], platform: Platform) -> bool {
    !rules
        .iter()
        .any(|rule| rule.action == RuleAction::Disallow && rule.applies_to(platform))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rules_means_allowed() {
        for platform in [Platform::Windows, Platform::Osx, Platform::Linux] {
            assert!(rules_allow(&[], platform));
        }
    }

    #[test]
    fn disallow_for_current_os_excludes() {
        let rules = vec![
            PlatformRule::allow(None),
            PlatformRule::disallow(Some("osx")),
        ];
        assert!(!rules_allow(&rules, Platform::Osx));
        assert!(rules_allow(&rules, Platform::Linux));
        assert!(rules_allow(&rules, Platform::Windows));
    }

    #[test]
    fn unmatched_allow_rules_fall_back_to_allow() {
        let rules = vec![PlatformRule::allow(Some("windows"))];
        assert!(rules_allow(&rules, Platform::Linux));
    }

    #[test]
    fn disallow_without_os_excludes_everywhere() {
        let rules = vec![PlatformRule::disallow(None)];
        assert!(!rules_allow(&rules, Platform::Windows));
        assert!(!rules_allow(&rules, Platform::Linux));
    }

    #[test]
    fn macos_alias_matches_osx() {
        let rule = PlatformRule::disallow(Some("macos"));
        assert!(rule.applies_to(Platform::Osx));
        assert!(!rule.applies_to(Platform::Linux));
    }

    #[test]
    fn rules_parse_from_descriptor_objects() {
        let rule = PlatformRule::parse(r#"{"action":"disallow","os":{"name":"osx","version":"^10\\.5\\.\\d$"}}"#)
            .unwrap();
        assert_eq!(rule, PlatformRule::disallow(Some("osx")));

        let rule = PlatformRule::parse(r#"{"action":"allow"}"#).unwrap();
        assert_eq!(rule, PlatformRule::allow(None));

        assert_eq!(PlatformRule::parse(r#"{"action":"maybe"}"#), None);
        assert_eq!(PlatformRule::parse(r#"{"os":{"name":"linux"}}"#), None);
    }

    #[test]
    fn classpath_separator_follows_platform() {
        assert_eq!(Platform::Windows.classpath_separator(), ";");
        assert_eq!(Platform::Linux.classpath_separator(), ":");
        assert_eq!(Platform::Osx.default_native_classifier(), "natives-osx");
    }
}
