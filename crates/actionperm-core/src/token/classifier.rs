use super::scanner::TokenSignal;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// `${{ github.token }}` and variants such as `${{ inputs.token || github.token }}`.
static DEFAULT_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{\{.*github\.token.*\}\}").unwrap());

/// How the token reaches the action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "input", rename_all = "kebab-case")]
pub enum WiringKind {
    /// Passed through a declared `inputs:` entry.
    DeclaredInput(String),
    /// Read from an environment variable whose name must be filled in by hand.
    EnvironmentVariable,
    /// No token reference at all.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenWiring {
    pub kind: WiringKind,
    pub is_default_token: bool,
}

impl TokenWiring {
    pub fn not_used() -> Self {
        Self {
            kind: WiringKind::None,
            is_default_token: false,
        }
    }

    pub fn declared_input(&self) -> Option<&str> {
        match &self.kind {
            WiringKind::DeclaredInput(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_used(&self) -> bool {
        self.kind != WiringKind::None
    }
}

/// True if the metadata defaults something to the ambient workflow token.
pub fn references_default_token(metadata: &str) -> bool {
    DEFAULT_TOKEN_RE.is_match(metadata)
}

/// Decide how the token is wired into the action.
///
/// The first signal (in scan order) that names a declared input wins. With no
/// matching input the token is assumed to come from an environment variable.
pub fn classify_wiring(metadata: &str, signals: &[TokenSignal]) -> TokenWiring {
    let inputs = declared_inputs(metadata);

    let declared = signals.iter().find_map(|signal| match &inputs {
        Some(names) => names
            .iter()
            .find(|name| name.eq_ignore_ascii_case(signal.as_str()))
            .cloned(),
        None => textual_input(metadata, signal.as_str()),
    });

    TokenWiring {
        kind: declared.map_or(WiringKind::EnvironmentVariable, WiringKind::DeclaredInput),
        is_default_token: references_default_token(metadata),
    }
}

/// Names under `inputs:`, or `None` when the metadata is not valid YAML.
fn declared_inputs(metadata: &str) -> Option<Vec<String>> {
    let yaml: Value = serde_yaml::from_str(metadata).ok()?;
    let names = yaml
        .get("inputs")
        .and_then(|v| v.as_mapping())
        .map(|inputs| {
            inputs
                .keys()
                .filter_map(|k| k.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    Some(names)
}

/// Fallback for metadata that doesn't parse: any line declaring `<signal>:`.
fn textual_input(metadata: &str, signal: &str) -> Option<String> {
    metadata.lines().find_map(|line| {
        let (key, _) = line.trim_start().split_once(':')?;
        let key = key.trim().trim_matches(|c| c == '"' || c == '\'');
        key.eq_ignore_ascii_case(signal).then(|| key.to_string())
    })
}
