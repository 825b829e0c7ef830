use crate::permissions::PermissionSet;
use crate::probe::SkipReason;
use crate::token::{TokenWiring, WiringKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stand-in for an environment variable name that a human must fill in.
pub const ENV_VAR_PLACEHOLDER: &str = "<FigureOutYourself>";

/// Why permissions could not be inferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManualReviewReason {
    Skipped(SkipReason),
    NoSourceFiles,
    NoEndpointEvidence,
    /// Endpoints were found, but none maps to a permission scope.
    UnmappedEvidence,
}

impl fmt::Display for ManualReviewReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManualReviewReason::Skipped(reason) => write!(f, "{}", reason),
            ManualReviewReason::NoSourceFiles => f.write_str("no source files reference the token"),
            ManualReviewReason::NoEndpointEvidence => f.write_str("no endpoint evidence"),
            ManualReviewReason::UnmappedEvidence => {
                f.write_str("endpoints found, none maps to a permission scope")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManifestStatus {
    Inferred,
    TokenNotUsed,
    ManualReview(ManualReviewReason),
}

/// The `action-security.yml` record for one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub action_name: String,
    pub action_ref: String,
    pub wiring: TokenWiring,
    pub permissions: PermissionSet,
    pub status: ManifestStatus,
}

/// Build the manifest for an analyzed action. An empty permission set is
/// recorded as a manual-review case, never as "needs nothing".
pub fn synthesize_manifest(
    action_name: &str,
    action_ref: &str,
    wiring: TokenWiring,
    permissions: PermissionSet,
) -> Manifest {
    if !wiring.is_used() {
        return Manifest {
            action_name: action_name.to_string(),
            action_ref: action_ref.to_string(),
            wiring,
            permissions: PermissionSet::new(),
            status: ManifestStatus::TokenNotUsed,
        };
    }
    if permissions.is_empty() {
        return manual_review_manifest(action_name, action_ref, wiring, ManualReviewReason::NoEndpointEvidence);
    }
    Manifest {
        action_name: action_name.to_string(),
        action_ref: action_ref.to_string(),
        wiring,
        permissions,
        status: ManifestStatus::Inferred,
    }
}

/// Placeholder manifest for an action that needs a human to analyze it.
pub fn manual_review_manifest(
    action_name: &str,
    action_ref: &str,
    wiring: TokenWiring,
    reason: ManualReviewReason,
) -> Manifest {
    Manifest {
        action_name: action_name.to_string(),
        action_ref: action_ref.to_string(),
        wiring,
        permissions: PermissionSet::new(),
        status: ManifestStatus::ManualReview(reason),
    }
}

impl Manifest {
    pub fn needs_manual_review(&self) -> bool {
        matches!(self.status, ManifestStatus::ManualReview(_))
    }

    /// Render as `action-security.yml` text.
    pub fn render(&self) -> String {
        let mut lines = vec![format!(
            "name: {} # {}",
            yaml_scalar(&self.action_name),
            yaml_comment(&self.action_ref)
        )];

        if self.status == ManifestStatus::TokenNotUsed {
            lines.push("# GITHUB_TOKEN not used".to_string());
            return lines.join("\n") + "\n";
        }

        lines.push("github-token:".to_string());
        match &self.wiring.kind {
            WiringKind::DeclaredInput(input) => {
                lines.push("  action-input:".to_string());
                lines.push(format!("    input: {}", yaml_scalar(input)));
                lines.push(format!("    is-default: {}", self.wiring.is_default_token));
            }
            WiringKind::EnvironmentVariable | WiringKind::None => {
                lines.push(format!("  environment-variable-name: {}", ENV_VAR_PLACEHOLDER));
            }
        }

        match &self.status {
            ManifestStatus::ManualReview(reason) => {
                lines.push(format!(
                    "  # Permissions could not be inferred. Manual analysis required ({}).",
                    reason
                ));
            }
            _ => {
                lines.push("  permissions:".to_string());
                for (key, level) in self.permissions.iter() {
                    lines.push(format!("    {}: {}", key, level));
                }
            }
        }

        lines.join("\n") + "\n"
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Single-line YAML scalar that reads back as the same string.
///
/// Block and wrapped scalars fall back to a double-quoted JSON string, which
/// is also valid YAML.
fn yaml_scalar(value: &str) -> String {
    let emitted = serde_yaml::to_string(&serde_yaml::Value::String(value.to_string()))
        .map(|text| text.trim_end_matches('\n').to_string());
    match emitted {
        Ok(text) if !text.is_empty() && !text.contains('\n') => text,
        _ => serde_json::Value::String(value.to_string()).to_string(),
    }
}

/// Text that must stay inside a one-line YAML comment.
fn yaml_comment(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}
