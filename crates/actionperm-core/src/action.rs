use crate::error::{ActionPermError, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Title prefix of a knowledge-base request issue.
pub const KB_ISSUE_PREFIX: &str = "[KB] Add KB for";

/// Metadata file names, in lookup order.
pub const METADATA_FILES: &[&str] = &["action.yml", "action.yaml"];

/// Reference to an action: `owner/repo` or `owner/repo/path/to/action`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionRef {
    pub owner: String,
    pub repo: String,
    /// Sub-directory of a nested action, empty for a root action.
    pub path: String,
}

impl ActionRef {
    /// Parse `owner/repo[/path]`, ignoring a trailing `@ref`.
    pub fn parse(reference: &str) -> Result<Self> {
        let trimmed = reference.trim();
        let without_version = trimmed.split('@').next().unwrap_or(trimmed);
        let mut parts = without_version.split('/').filter(|p| !p.is_empty());

        let owner = parts.next();
        let repo = parts.next();
        let path: Vec<&str> = parts.collect();
        match (owner, repo) {
            (Some(owner), Some(repo))
                if is_owner_name(owner)
                    && is_path_segment(repo)
                    && path.iter().all(|segment| is_path_segment(segment)) =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    path: path.join("/"),
                })
            }
            _ => Err(ActionPermError::InvalidActionRef(reference.to_string())),
        }
    }

    /// Extract the action from a `[KB] Add KB for owner/repo` issue title.
    pub fn from_kb_issue_title(title: &str) -> Result<Self> {
        if !title.starts_with(KB_ISSUE_PREFIX) {
            return Err(ActionPermError::NotKbIssue(title.to_string()));
        }
        let action = title
            .split_whitespace()
            .last()
            .filter(|last| *last != "for")
            .ok_or_else(|| ActionPermError::InvalidActionRef(title.to_string()))?;
        Self::parse(action)
    }

    pub fn is_nested(&self) -> bool {
        !self.path.is_empty()
    }

    /// Repository path of a file inside the action directory.
    pub fn file_path(&self, file: &str) -> String {
        if self.path.is_empty() {
            file.to_string()
        } else {
            format!("{}/{}", self.path, file)
        }
    }

    /// `repo[/path]`, the action location within the owner's namespace.
    pub fn repo_path(&self) -> String {
        if self.path.is_empty() {
            self.repo.clone()
        } else {
            format!("{}/{}", self.repo, self.path)
        }
    }

    /// `<kb_root>/actions/<owner>/<repo[/path]>/action-security.yml`, lower-cased.
    pub fn kb_manifest_path(&self, kb_root: &std::path::Path) -> PathBuf {
        kb_root
            .join("actions")
            .join(self.owner.to_lowercase())
            .join(self.repo_path().to_lowercase())
            .join("action-security.yml")
    }
}

/// Account names: ASCII letters, digits, `-` and `_`.
fn is_owner_name(segment: &str) -> bool {
    segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Repository and directory names, never `.` or `..`.
fn is_path_segment(segment: &str) -> bool {
    segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo_path())
    }
}

impl FromStr for ActionRef {
    type Err = ActionPermError;

    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with(KB_ISSUE_PREFIX) {
            Self::from_kb_issue_title(s)
        } else {
            Self::parse(s)
        }
    }
}

/// Execution model declared by `runs.using`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Node,
    Docker,
    Composite,
}

impl ActionKind {
    pub fn label(&self) -> &str {
        match self {
            ActionKind::Node => "Node",
            ActionKind::Docker => "Docker",
            ActionKind::Composite => "Composite",
        }
    }

    fn from_using(using: &str) -> Self {
        let using = using.to_lowercase();
        if using.contains("node") {
            ActionKind::Node
        } else if using.contains("docker") {
            ActionKind::Docker
        } else {
            ActionKind::Composite
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The parts of `action.yml` the analysis needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMetadata {
    pub name: Option<String>,
    pub kind: ActionKind,
}

impl ActionMetadata {
    /// Read name and kind. Metadata that is not valid YAML is scanned
    /// textually instead.
    pub fn parse(content: &str) -> Self {
        match serde_yaml::from_str::<Value>(content) {
            Ok(yaml) => Self::from_yaml(&yaml, content),
            Err(_) => Self {
                name: textual_name(content),
                kind: textual_kind(content),
            },
        }
    }

    fn from_yaml(yaml: &Value, content: &str) -> Self {
        let name = yaml
            .get("name")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let kind = yaml
            .get("runs")
            .and_then(|runs| runs.get("using"))
            .and_then(|v| v.as_str())
            .map(ActionKind::from_using)
            .unwrap_or_else(|| textual_kind(content));

        Self { name, kind }
    }
}

fn textual_name(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let value = line.strip_prefix("name:")?.trim();
        let value = value.trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Looks at the few characters after `using:`.
fn textual_kind(content: &str) -> ActionKind {
    match content.find("using:") {
        Some(idx) => {
            let rest: String = content[idx + "using:".len()..].chars().take(10).collect();
            ActionKind::from_using(&rest)
        }
        None => ActionKind::Composite,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_root_action() {
        let action = ActionRef::parse("peter-evans/create-pull-request@v6").unwrap();
        assert_eq!(action.owner, "peter-evans");
        assert_eq!(action.repo, "create-pull-request");
        assert!(!action.is_nested());
        assert_eq!(action.to_string(), "peter-evans/create-pull-request");
    }

    #[test]
    fn test_parse_nested_action() {
        let action = ActionRef::parse("github/codeql-action/upload-sarif").unwrap();
        assert_eq!(action.repo, "codeql-action");
        assert_eq!(action.path, "upload-sarif");
        assert_eq!(action.file_path("action.yml"), "upload-sarif/action.yml");
        assert_eq!(action.repo_path(), "codeql-action/upload-sarif");
    }

    #[test]
    fn test_parse_rejects_single_segment() {
        assert!(ActionRef::parse("checkout").is_err());
        assert!(ActionRef::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_traversal_and_foreign_characters() {
        for reference in [
            "evil/../../../../tmp/pwned",
            "owner/repo/../../escape",
            "owner/./sub",
            "owner/repo/sub/..",
            "..\\owner/repo",
            "own er/repo",
            "owner/repo/sub dir",
            "owner.name/repo",
            "owner/repo%2F..",
        ] {
            assert!(
                matches!(ActionRef::parse(reference), Err(ActionPermError::InvalidActionRef(_))),
                "{} should be rejected",
                reference
            );
        }

        let dotted = ActionRef::parse("actions/setup.node/v1.x").unwrap();
        assert_eq!(dotted.repo, "setup.node");
        assert_eq!(dotted.path, "v1.x");
    }

    #[test]
    fn test_kb_issue_title_cannot_escape_kb_root() {
        let result = ActionRef::from_kb_issue_title("[KB] Add KB for evil/../../../../tmp/pwned");
        assert!(matches!(result, Err(ActionPermError::InvalidActionRef(_))));
    }

    #[test]
    fn test_kb_issue_title() {
        let action = ActionRef::from_kb_issue_title("[KB] Add KB for Owner/Some-Action").unwrap();
        assert_eq!(action.owner, "Owner");
        assert_eq!(action.repo, "Some-Action");

        assert!(matches!(
            ActionRef::from_kb_issue_title("Add KB for owner/repo"),
            Err(ActionPermError::NotKbIssue(_))
        ));
        assert!(ActionRef::from_kb_issue_title("[KB] Add KB for ").is_err());
    }

    #[test]
    fn test_from_str_accepts_both_forms() {
        let a: ActionRef = "[KB] Add KB for a/b".parse().unwrap();
        let b: ActionRef = "a/b".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_kb_manifest_path_is_lowercase() {
        let action = ActionRef::parse("Owner/Repo/Sub").unwrap();
        let path = action.kb_manifest_path(Path::new("knowledge-base"));
        assert_eq!(
            path,
            Path::new("knowledge-base/actions/owner/repo/sub/action-security.yml")
        );
    }

    #[test]
    fn test_metadata_kinds() {
        let node = ActionMetadata::parse("name: 'Greeter'\nruns:\n  using: 'node20'\n  main: index.js\n");
        assert_eq!(node.name.as_deref(), Some("Greeter"));
        assert_eq!(node.kind, ActionKind::Node);

        let docker = ActionMetadata::parse("name: Lint\nruns:\n  using: docker\n  image: Dockerfile\n");
        assert_eq!(docker.kind, ActionKind::Docker);

        let composite = ActionMetadata::parse("name: Setup\nruns:\n  using: composite\n  steps: []\n");
        assert_eq!(composite.kind, ActionKind::Composite);
    }

    #[test]
    fn test_metadata_textual_fallback() {
        let meta = ActionMetadata::parse("name: Broken\ndescription: [oops\nruns:\n  using: node16\n");
        assert_eq!(meta.name.as_deref(), Some("Broken"));
        assert_eq!(meta.kind, ActionKind::Node);
    }
}
