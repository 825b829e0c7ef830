use crate::action::ActionKind;
use crate::config::ProbeConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why deep endpoint scanning was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "kebab-case")]
pub enum SkipReason {
    /// Docker or composite actions have no single source language.
    UnsupportedActionKind(ActionKind),
    /// The repository's top language could not be determined.
    UnknownLanguage,
    UnsupportedLanguage(String),
    /// No dependency manifest, or none of the API client indicators in it.
    NoApiClientDependency,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedActionKind(kind) => write!(f, "{} action", kind),
            SkipReason::UnknownLanguage => f.write_str("top language unknown"),
            SkipReason::UnsupportedLanguage(lang) => write!(f, "unsupported language {}", lang),
            SkipReason::NoApiClientDependency => f.write_str("no GitHub API client dependency"),
        }
    }
}

/// Outcome of the dependency surface probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeDecision {
    Scan,
    Skip(SkipReason),
}

impl ProbeDecision {
    pub fn allows_scan(&self) -> bool {
        matches!(self, ProbeDecision::Scan)
    }
}

/// Decide whether the action plausibly calls the GitHub API and is worth a
/// deep scan. A missing dependency manifest counts as a negative result.
pub fn probe_dependency_surface(
    kind: ActionKind,
    language: Option<&str>,
    dependency_manifest: Option<&str>,
    config: &ProbeConfig,
) -> ProbeDecision {
    if kind != ActionKind::Node {
        return ProbeDecision::Skip(SkipReason::UnsupportedActionKind(kind));
    }

    let language = match language {
        Some(lang) => lang,
        None => return ProbeDecision::Skip(SkipReason::UnknownLanguage),
    };

    if !config.supports_language(language) {
        return ProbeDecision::Skip(SkipReason::UnsupportedLanguage(language.to_string()));
    }

    let uses_client = dependency_manifest
        .map(|manifest| {
            config
                .dependency_indicators
                .iter()
                .any(|indicator| manifest.contains(indicator.as_str()))
        })
        .unwrap_or(false);

    if uses_client {
        ProbeDecision::Scan
    } else {
        ProbeDecision::Skip(SkipReason::NoApiClientDependency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKAGE_JSON: &str = r#"{
  "name": "my-action",
  "dependencies": {
    "@actions/core": "^1.10.0",
    "@actions/github": "^6.0.0"
  }
}"#;

    #[test]
    fn test_node_action_with_client_is_scanned() {
        let decision = probe_dependency_surface(
            ActionKind::Node,
            Some("TypeScript"),
            Some(PACKAGE_JSON),
            &ProbeConfig::default(),
        );
        assert!(decision.allows_scan());
    }

    #[test]
    fn test_octokit_alone_is_enough() {
        let manifest = r#"{"dependencies": {"@octokit/rest": "^20.0.0"}}"#;
        let decision = probe_dependency_surface(
            ActionKind::Node,
            Some("javascript"),
            Some(manifest),
            &ProbeConfig::default(),
        );
        assert_eq!(decision, ProbeDecision::Scan);
    }

    #[test]
    fn test_docker_and_composite_are_skipped() {
        for kind in [ActionKind::Docker, ActionKind::Composite] {
            let decision =
                probe_dependency_surface(kind, Some("JavaScript"), Some(PACKAGE_JSON), &ProbeConfig::default());
            assert_eq!(decision, ProbeDecision::Skip(SkipReason::UnsupportedActionKind(kind)));
        }
    }

    #[test]
    fn test_language_gate() {
        let config = ProbeConfig::default();
        assert_eq!(
            probe_dependency_surface(ActionKind::Node, Some("Go"), Some(PACKAGE_JSON), &config),
            ProbeDecision::Skip(SkipReason::UnsupportedLanguage("Go".into()))
        );
        assert_eq!(
            probe_dependency_surface(ActionKind::Node, None, Some(PACKAGE_JSON), &config),
            ProbeDecision::Skip(SkipReason::UnknownLanguage)
        );
    }

    #[test]
    fn test_missing_manifest_is_negative() {
        let decision =
            probe_dependency_surface(ActionKind::Node, Some("JavaScript"), None, &ProbeConfig::default());
        assert_eq!(decision, ProbeDecision::Skip(SkipReason::NoApiClientDependency));
    }

    #[test]
    fn test_manifest_without_indicator() {
        let manifest = r#"{"dependencies": {"@actions/core": "^1.10.0", "lodash": "4"}}"#;
        let decision =
            probe_dependency_surface(ActionKind::Node, Some("JavaScript"), Some(manifest), &ProbeConfig::default());
        assert!(!decision.allows_scan());
    }
}
