use crate::action::ActionRef;
use crate::error::{ActionPermError, Result};
use crate::providers::{GitHubClient, RepoInfo};
use crate::token::TokenSignal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A file that mentions a token signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Path relative to the repository root.
    pub path: String,
    /// Browsable location, when the backend has one.
    pub url: Option<String>,
}

/// Read access to the repository that hosts an action.
///
/// Failures are reported as absence: a file that cannot be read is `None`,
/// a failed search finds nothing.
pub trait ActionRepository {
    /// Text of a file, by path relative to the repository root.
    fn fetch_text(&self, path: &str) -> Option<String>;

    /// Dominant source language of the repository.
    fn top_language(&self) -> Option<String>;

    /// Files written in `language` that contain `signal`.
    fn search_files(&self, signal: &TokenSignal, language: &str) -> Vec<SearchHit>;

    fn repo_info(&self) -> Option<RepoInfo> {
        None
    }
}

/// Action repository on GitHub, read through the REST API.
pub struct GitHubRepository {
    runtime: tokio::runtime::Runtime,
    client: GitHubClient,
    action: ActionRef,
}

impl GitHubRepository {
    pub fn new(client: GitHubClient, action: ActionRef) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ActionPermError::Repository(format!("failed to start runtime: {}", e)))?;
        Ok(Self {
            runtime,
            client,
            action,
        })
    }
}

impl ActionRepository for GitHubRepository {
    fn fetch_text(&self, path: &str) -> Option<String> {
        let result = self
            .runtime
            .block_on(self.client.fetch_file(&self.action.owner, &self.action.repo, path));
        match result {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(path, error = %e, "failed to fetch file");
                None
            }
        }
    }

    fn top_language(&self) -> Option<String> {
        let result = self
            .runtime
            .block_on(self.client.list_languages(&self.action.owner, &self.action.repo));
        match result {
            Ok(languages) => languages.into_iter().next().map(|(name, _)| name),
            Err(e) => {
                tracing::warn!(error = %e, "failed to list repository languages");
                None
            }
        }
    }

    fn search_files(&self, signal: &TokenSignal, language: &str) -> Vec<SearchHit> {
        let result = self.runtime.block_on(self.client.search_code(
            &self.action.owner,
            &self.action.repo,
            signal.as_str(),
            language,
        ));
        match result {
            Ok(items) => items
                .into_iter()
                .map(|item| SearchHit {
                    path: item.path,
                    url: Some(item.html_url),
                })
                .collect(),
            Err(e) => {
                tracing::warn!(signal = %signal, error = %e, "code search failed");
                Vec::new()
            }
        }
    }

    fn repo_info(&self) -> Option<RepoInfo> {
        self.runtime
            .block_on(self.client.fetch_repo(&self.action.owner, &self.action.repo))
            .map_err(|e| tracing::debug!(error = %e, "failed to fetch repository info"))
            .ok()
    }
}

/// Directories never searched in a local checkout.
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git"];

/// An action repository checked out on disk.
pub struct LocalCheckout {
    root: PathBuf,
    language: Option<String>,
}

impl LocalCheckout {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ActionPermError::Repository(format!(
                "'{}' is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root,
            language: None,
        })
    }

    /// Use `language` instead of detecting it from file extensions.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    fn source_files(&self) -> Vec<PathBuf> {
        let pattern = format!(
            "{}/**/*",
            glob::Pattern::escape(&self.root.to_string_lossy())
        );
        let entries = match glob::glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "invalid checkout path pattern");
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .filter(|p| !self.is_skipped(p))
            .collect();
        files.sort();
        files
    }

    fn is_skipped(&self, path: &Path) -> bool {
        path.strip_prefix(&self.root)
            .map(|rel| {
                rel.components()
                    .any(|c| SKIPPED_DIRS.iter().any(|d| c.as_os_str() == *d))
            })
            .unwrap_or(true)
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

impl ActionRepository for LocalCheckout {
    fn fetch_text(&self, path: &str) -> Option<String> {
        std::fs::read_to_string(self.root.join(path))
            .map_err(|e| tracing::debug!(path, error = %e, "failed to read file"))
            .ok()
    }

    fn top_language(&self) -> Option<String> {
        if let Some(lang) = &self.language {
            return Some(lang.clone());
        }

        let mut bytes: HashMap<&'static str, u64> = HashMap::new();
        for file in self.source_files() {
            let language = file
                .extension()
                .and_then(|e| e.to_str())
                .and_then(language_for_extension);
            if let Some(language) = language {
                let size = std::fs::metadata(&file).map(|m| m.len()).unwrap_or(0);
                *bytes.entry(language).or_insert(0) += size;
            }
        }

        bytes
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(language, _)| language.to_string())
    }

    fn search_files(&self, signal: &TokenSignal, language: &str) -> Vec<SearchHit> {
        let needle = signal.as_str().to_lowercase();
        self.source_files()
            .into_iter()
            .filter(|file| {
                file.extension()
                    .and_then(|e| e.to_str())
                    .and_then(language_for_extension)
                    .map(|l| l.eq_ignore_ascii_case(language))
                    .unwrap_or(false)
            })
            .filter(|file| {
                std::fs::read_to_string(file)
                    .map(|text| text.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .map(|file| SearchHit {
                path: self.relative(&file),
                url: None,
            })
            .collect()
    }
}

/// Language name (GitHub linguist spelling) for a source file extension.
pub fn language_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_lowercase().as_str() {
        "js" | "mjs" | "cjs" => Some("JavaScript"),
        "ts" | "mts" | "cts" => Some("TypeScript"),
        "py" => Some("Python"),
        "go" => Some("Go"),
        "rb" => Some("Ruby"),
        "rs" => Some("Rust"),
        "java" => Some("Java"),
        "sh" | "bash" => Some("Shell"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_local_search_respects_language_and_skips_vendor() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/main.ts", "const t = core.getInput('repo-token');");
        write(dir.path(), "src/util.ts", "export const x = 1;");
        write(dir.path(), "dist/index.js", "const t = core.getInput('repo-token');");
        write(dir.path(), "node_modules/dep/index.ts", "repo-token");

        let checkout = LocalCheckout::new(dir.path()).unwrap();
        let hits = checkout.search_files(&TokenSignal::from("repo-token"), "TypeScript");

        let paths: Vec<&str> = hits.iter().map(|h| h.path.as_str()).collect();
        assert_eq!(paths, vec!["src/main.ts"]);
    }

    #[test]
    fn test_local_top_language_by_bytes() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/a.ts", &"x".repeat(500));
        write(dir.path(), "scripts/b.sh", &"y".repeat(50));

        let checkout = LocalCheckout::new(dir.path()).unwrap();
        assert_eq!(checkout.top_language().as_deref(), Some("TypeScript"));

        let forced = LocalCheckout::new(dir.path()).unwrap().with_language("JavaScript");
        assert_eq!(forced.top_language().as_deref(), Some("JavaScript"));
    }

    #[test]
    fn test_local_fetch_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "action.yml", "name: x\n");

        let checkout = LocalCheckout::new(dir.path()).unwrap();
        assert_eq!(checkout.fetch_text("action.yml").as_deref(), Some("name: x\n"));
        assert!(checkout.fetch_text("README.md").is_none());
    }

    #[test]
    fn test_local_checkout_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LocalCheckout::new(dir.path().join("absent")).is_err());
    }

    #[test]
    fn test_language_for_extension() {
        assert_eq!(language_for_extension("MJS"), Some("JavaScript"));
        assert_eq!(language_for_extension("ts"), Some("TypeScript"));
        assert_eq!(language_for_extension("md"), None);
    }
}
