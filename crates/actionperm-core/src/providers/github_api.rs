use anyhow::{Context, Result};
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// GitHub REST client for reading action repositories
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
}

/// Repository summary shown in the analysis report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoInfo {
    pub full_name: String,
    pub private: bool,
    pub stargazers_count: u64,
    pub forks_count: u64,
}

/// File entry from the contents API
#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: Option<String>,
    encoding: Option<String>,
}

/// Code search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSearchItem {
    pub path: String,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
struct CodeSearchResponse {
    total_count: u32,
    items: Vec<CodeSearchItem>,
}

impl GitHubClient {
    /// Create a new GitHub API client
    pub fn new(token: Option<String>, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("actionperm/", env!("CARGO_PKG_VERSION"))),
        );

        if let Some(ref t) = token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", t))
                    .context("Invalid GitHub token")?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch repository metadata
    pub async fn fetch_repo(&self, owner: &str, repo: &str) -> Result<RepoInfo> {
        let url = format!("{}/repos/{}/{}", self.base_url, owner, repo);

        self.client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch repository")?
            .error_for_status()
            .context("GitHub API returned error")?
            .json()
            .await
            .context("Failed to parse repository response")
    }

    /// Fetch a file's text. `Ok(None)` when the file does not exist.
    pub async fn fetch_file(&self, owner: &str, repo: &str, path: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url,
            owner,
            repo,
            path.trim_start_matches('/')
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", path))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: ContentResponse = response
            .error_for_status()
            .context("GitHub API returned error")?
            .json()
            .await
            .context("Failed to parse contents response")?;

        match (body.content, body.encoding.as_deref()) {
            (Some(content), Some("base64")) => decode_content(&content).map(Some),
            (Some(content), _) => Ok(Some(content)),
            // Directories and submodules have no inline content
            (None, _) => Ok(None),
        }
    }

    /// Languages by byte count, largest first
    pub async fn list_languages(&self, owner: &str, repo: &str) -> Result<Vec<(String, u64)>> {
        let url = format!("{}/repos/{}/{}/languages", self.base_url, owner, repo);

        let languages: HashMap<String, u64> = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch languages")?
            .error_for_status()
            .context("GitHub API returned error")?
            .json()
            .await
            .context("Failed to parse languages response")?;

        Ok(rank_languages(languages))
    }

    /// Search a repository's files for a literal token reference
    pub async fn search_code(
        &self,
        owner: &str,
        repo: &str,
        signal: &str,
        language: &str,
    ) -> Result<Vec<CodeSearchItem>> {
        let url = format!("{}/search/code", self.base_url);
        let query = code_search_query(owner, repo, signal, language);

        let response: CodeSearchResponse = self
            .client
            .get(&url)
            .query(&[("q", query.as_str()), ("per_page", "100")])
            .send()
            .await
            .context("Failed to search code")?
            .error_for_status()
            .context("GitHub API returned error")?
            .json()
            .await
            .context("Failed to parse code search response")?;

        tracing::debug!(
            signal,
            total = response.total_count,
            "code search finished"
        );
        Ok(response.items)
    }
}

/// Contents API payloads are base64 wrapped at 60 columns.
fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .context("Invalid base64 file content")?;
    String::from_utf8(bytes).context("File content is not UTF-8")
}

fn rank_languages(languages: HashMap<String, u64>) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = languages.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

fn code_search_query(owner: &str, repo: &str, signal: &str, language: &str) -> String {
    format!("{} in:file repo:{}/{} language:{}", signal, owner, repo, language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_wrapped_content() {
        // "name: hello\n" split across lines the way the API returns it
        let encoded = "bmFtZTog\naGVsbG8K\n";
        assert_eq!(decode_content(encoded).unwrap(), "name: hello\n");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_content("!!not base64!!").is_err());
    }

    #[test]
    fn test_rank_languages() {
        let mut langs = HashMap::new();
        langs.insert("Shell".to_string(), 120);
        langs.insert("TypeScript".to_string(), 98_000);
        langs.insert("JavaScript".to_string(), 4_500);

        let ranked = rank_languages(langs);
        assert_eq!(ranked[0].0, "TypeScript");
        assert_eq!(ranked[2].0, "Shell");
    }

    #[test]
    fn test_code_search_query() {
        assert_eq!(
            code_search_query("acme", "labeler", "repo-token", "TypeScript"),
            "repo-token in:file repo:acme/labeler language:TypeScript"
        );
    }
}
