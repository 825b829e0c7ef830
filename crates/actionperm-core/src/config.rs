use crate::error::{ActionPermError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "actionperm.toml";

/// Top-level configuration from `actionperm.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub github: GitHubConfig,
}

/// Gate for deep endpoint scanning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Top languages whose sources can be scanned (case-insensitive).
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Substrings in the dependency manifest that indicate a GitHub API client.
    #[serde(default = "default_indicators")]
    pub dependency_indicators: Vec<String>,
    #[serde(default = "default_dependency_manifest")]
    pub dependency_manifest: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            dependency_indicators: default_indicators(),
            dependency_manifest: default_dependency_manifest(),
        }
    }
}

impl ProbeConfig {
    pub fn supports_language(&self, language: &str) -> bool {
        self.languages.iter().any(|l| l.eq_ignore_ascii_case(language))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Upper bound on candidate source files fetched per action.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
        }
    }
}

fn default_languages() -> Vec<String> {
    vec!["JavaScript".to_string(), "TypeScript".to_string()]
}

fn default_indicators() -> Vec<String> {
    vec!["github".to_string(), "octokit".to_string()]
}

fn default_dependency_manifest() -> String {
    "package.json".to_string()
}

fn default_max_files() -> usize {
    50
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.probe.languages.is_empty() {
            return Err(ActionPermError::Config(
                "probe.languages must list at least one language".to_string(),
            ));
        }
        if self.search.max_files == 0 {
            return Err(ActionPermError::Config(
                "search.max_files must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# actionperm configuration

[probe]
# Top repository languages whose sources are scanned for API calls.
languages = ["JavaScript", "TypeScript"]
# Any of these substrings in the dependency manifest enables the deep scan.
dependency_indicators = ["github", "octokit"]
dependency_manifest = "package.json"

[search]
# Maximum number of candidate source files fetched per action.
max_files = 50

[github]
api_url = "https://api.github.com"
"#
    }
}
