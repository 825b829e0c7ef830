use super::{EndpointExtractor, EvidenceMap};
use crate::permissions::AccessLevel;
use once_cell::sync::Lazy;
use regex::Regex;

/// `octokit.rest.issues.create(...)`, `github.rest.pulls.get`, and
/// `octokit.paginate(octokit.rest.issues.listForRepo, ...)`.
static REST_CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.rest\s*\.\s*([a-z][A-Za-z]*)\s*\.\s*([a-z][A-Za-z]*)\b").unwrap()
});

/// Older octokit clients without the `rest` namespace, e.g.
/// `client.issues.createComment(...)`.
static LEGACY_CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:octokit|github|client|api|gh|kit)\s*\.\s*([a-z][A-Za-z]*)\s*\.\s*([a-z][A-Za-z]*)\s*\(")
        .unwrap()
});

/// `octokit.request("POST /repos/{owner}/{repo}/issues", ...)`.
static ROUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\brequest\s*\(\s*['"`](GET|POST|PUT|PATCH|DELETE)\s+/repos/[^/\s'"`]+/[^/\s'"`]+/?([a-z-]*)"#)
        .unwrap()
});

/// Operation-name prefixes that only read data.
const READ_VERBS: &[&str] = &[
    "get", "list", "check", "download", "compare", "search", "paginate", "export",
];

/// Client namespaces that are not REST API groups.
const IGNORED_NAMESPACES: &[&str] = &["request", "graphql", "paginate", "log", "hook", "auth"];

/// Regex-based endpoint extractor for JavaScript/TypeScript sources using an
/// octokit-style client.
#[derive(Debug, Clone, Copy, Default)]
pub struct OctokitExtractor;

impl OctokitExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl EndpointExtractor for OctokitExtractor {
    fn extract(&self, text: &str) -> EvidenceMap {
        let mut evidence = EvidenceMap::new();

        for re in [&*REST_CALL_RE, &*LEGACY_CALL_RE] {
            for caps in re.captures_iter(text) {
                let namespace = &caps[1];
                let operation = &caps[2];
                if IGNORED_NAMESPACES.contains(&namespace) {
                    continue;
                }
                evidence.insert(format!("{}.{}", namespace, operation), operation_level(operation));
            }
        }

        for caps in ROUTE_RE.captures_iter(text) {
            let method = caps[1].to_uppercase();
            let namespace = route_namespace(&caps[2]);
            let level = if method == "GET" {
                AccessLevel::Read
            } else {
                AccessLevel::Write
            };
            evidence.insert(format!("{}.{}", namespace, method.to_lowercase()), level);
        }

        evidence
    }
}

/// Access level implied by an octokit operation name. Unrecognized verbs are
/// treated as writes.
pub fn operation_level(operation: &str) -> AccessLevel {
    let is_read = READ_VERBS.iter().any(|verb| {
        operation
            .strip_prefix(verb)
            .map(|rest| rest.is_empty() || rest.starts_with(|c: char| c.is_ascii_uppercase()))
            .unwrap_or(false)
    });
    if is_read {
        AccessLevel::Read
    } else {
        AccessLevel::Write
    }
}

/// REST API group for the first path segment after `/repos/{owner}/{repo}/`.
fn route_namespace(segment: &str) -> &'static str {
    match segment {
        "issues" => "issues",
        "pulls" => "pulls",
        "actions" => "actions",
        "check-runs" | "check-suites" => "checks",
        "git" => "git",
        _ => "repos",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_calls() {
        let src = r#"
const octokit = github.getOctokit(token);
await octokit.rest.issues.createComment({ owner, repo, issue_number, body });
const { data } = await octokit.rest.repos.get({ owner, repo });
"#;
        let evidence = OctokitExtractor.extract(src);
        assert_eq!(evidence.get("issues.createComment"), Some(AccessLevel::Write));
        assert_eq!(evidence.get("repos.get"), Some(AccessLevel::Read));
        assert_eq!(evidence.len(), 2);
    }

    #[test]
    fn test_paginate_reference_without_call() {
        let src = "const all = await octokit.paginate(octokit.rest.pulls.listFiles, { owner, repo });";
        let evidence = OctokitExtractor.extract(src);
        assert_eq!(evidence.get("pulls.listFiles"), Some(AccessLevel::Read));
        assert!(evidence.get("paginate.octokit").is_none());
    }

    #[test]
    fn test_legacy_client_calls() {
        let src = "await client.checks.create({ name: 'lint' });\nclient.git.getRef({ ref });";
        let evidence = OctokitExtractor.extract(src);
        assert_eq!(evidence.get("checks.create"), Some(AccessLevel::Write));
        assert_eq!(evidence.get("git.getRef"), Some(AccessLevel::Read));
    }

    #[test]
    fn test_request_routes() {
        let src = r#"
await octokit.request("POST /repos/{owner}/{repo}/issues", { title });
await octokit.request('GET /repos/{owner}/{repo}/check-runs/{id}');
"#;
        let evidence = OctokitExtractor.extract(src);
        assert_eq!(evidence.get("issues.post"), Some(AccessLevel::Write));
        assert_eq!(evidence.get("checks.get"), Some(AccessLevel::Read));
    }

    #[test]
    fn test_operation_level() {
        assert_eq!(operation_level("get"), AccessLevel::Read);
        assert_eq!(operation_level("listForRepo"), AccessLevel::Read);
        assert_eq!(operation_level("checkCollaborator"), AccessLevel::Read);
        assert_eq!(operation_level("getter"), AccessLevel::Write);
        assert_eq!(operation_level("createRelease"), AccessLevel::Write);
        assert_eq!(operation_level("merge"), AccessLevel::Write);
    }

    #[test]
    fn test_plain_source_has_no_evidence() {
        let evidence = OctokitExtractor.extract("console.log('hello');\ncore.setOutput('x', 1);");
        assert!(evidence.is_empty());
    }
}
