use crate::evidence::EvidenceMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Access level inferred for a GitHub API call or granted to a scope.
///
/// Ordered `Read < Write`; combining two levels takes the maximum, so `write`
/// absorbs `read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Read,
    Write,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::Write => "write",
        }
    }

    /// Least upper bound of two levels.
    pub fn join(self, other: AccessLevel) -> AccessLevel {
        self.max(other)
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical `GITHUB_TOKEN` permission scope.
///
/// Variant order matches the alphabetical order of the rendered scope names,
/// which keeps `PermissionSet` iteration sorted by key name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionKey {
    Actions,
    Checks,
    Contents,
    Issues,
    Metadata,
    PullRequests,
}

impl PermissionKey {
    pub const ALL: [PermissionKey; 6] = [
        PermissionKey::Actions,
        PermissionKey::Checks,
        PermissionKey::Contents,
        PermissionKey::Issues,
        PermissionKey::Metadata,
        PermissionKey::PullRequests,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionKey::Actions => "actions",
            PermissionKey::Checks => "checks",
            PermissionKey::Contents => "contents",
            PermissionKey::Issues => "issues",
            PermissionKey::Metadata => "metadata",
            PermissionKey::PullRequests => "pull-requests",
        }
    }

    /// Canonical scope for a raw evidence key such as `pulls.create`.
    ///
    /// Returns `None` when the namespace prefix is not in the table.
    pub fn for_evidence_key(raw_key: &str) -> Option<PermissionKey> {
        let prefix = raw_key.split('.').next().unwrap_or(raw_key);
        NAMESPACE_TABLE
            .iter()
            .find(|(namespace, _)| *namespace == prefix)
            .map(|(_, key)| *key)
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// REST API namespaces (as used by octokit, e.g. `octokit.rest.pulls.*`) and
/// the permission scope each one needs.
pub const NAMESPACE_TABLE: &[(&str, PermissionKey)] = &[
    ("actions", PermissionKey::Actions),
    ("checks", PermissionKey::Checks),
    ("git", PermissionKey::Contents),
    ("issues", PermissionKey::Issues),
    ("meta", PermissionKey::Metadata),
    ("pulls", PermissionKey::PullRequests),
    ("repos", PermissionKey::Contents),
];

/// Minimal permission set: one access level per canonical scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeMap<PermissionKey, AccessLevel>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: PermissionKey) -> Option<AccessLevel> {
        self.0.get(&key).copied()
    }

    /// Iterate scopes in key-name order.
    pub fn iter(&self) -> impl Iterator<Item = (PermissionKey, AccessLevel)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Add one scope, never downgrading an existing `write`.
    pub fn with(mut self, key: PermissionKey, level: AccessLevel) -> Self {
        self.0
            .entry(key)
            .and_modify(|current| *current = current.join(level))
            .or_insert(level);
        self
    }

    /// Key-by-key join of two sets.
    pub fn merge(self, other: &PermissionSet) -> PermissionSet {
        other.iter().fold(self, |acc, (key, level)| acc.with(key, level))
    }
}

impl FromIterator<(PermissionKey, AccessLevel)> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = (PermissionKey, AccessLevel)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(PermissionSet::new(), |acc, (key, level)| acc.with(key, level))
    }
}

/// Outcome of normalizing raw evidence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub permissions: PermissionSet,
    /// Raw keys whose namespace has no canonical scope.
    pub dropped: Vec<String>,
}

/// Map raw evidence keys to canonical scopes and merge them write-dominant.
pub fn normalize(evidence: &EvidenceMap) -> Normalized {
    let mut dropped = Vec::new();
    let permissions = evidence
        .iter()
        .filter_map(|(raw_key, level)| match PermissionKey::for_evidence_key(raw_key) {
            Some(key) => Some((key, level)),
            None => {
                tracing::debug!(key = raw_key, "dropping evidence with unrecognized namespace");
                dropped.push(raw_key.to_string());
                None
            }
        })
        .collect();

    Normalized {
        permissions,
        dropped,
    }
}

/// Fold every file's evidence into one permission set.
pub fn infer_permissions<'a, I>(evidence_by_file: I) -> PermissionSet
where
    I: IntoIterator<Item = &'a EvidenceMap>,
{
    evidence_by_file
        .into_iter()
        .map(|evidence| normalize(evidence).permissions)
        .fold(PermissionSet::new(), |acc, set| acc.merge(&set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn evidence(entries: &[(&str, AccessLevel)]) -> EvidenceMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_namespace_table_is_well_formed() {
        let prefixes: HashSet<&str> = NAMESPACE_TABLE.iter().map(|(p, _)| *p).collect();
        assert_eq!(prefixes.len(), NAMESPACE_TABLE.len(), "duplicate namespace prefix");

        for key in PermissionKey::ALL {
            assert!(
                NAMESPACE_TABLE.iter().any(|(_, k)| *k == key),
                "{} is not reachable from any namespace",
                key
            );
        }
    }

    #[test]
    fn test_key_order_matches_name_order() {
        let mut names: Vec<&str> = PermissionKey::ALL.iter().map(|k| k.as_str()).collect();
        let rendered = names.clone();
        names.sort();
        assert_eq!(names, rendered);
    }

    #[test]
    fn test_issues_and_repos_scenario() {
        let e = evidence(&[
            ("issues.create", AccessLevel::Write),
            ("issues.list", AccessLevel::Read),
            ("repos.get", AccessLevel::Read),
        ]);
        let set = infer_permissions([&e]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.get(PermissionKey::Issues), Some(AccessLevel::Write));
        assert_eq!(set.get(PermissionKey::Contents), Some(AccessLevel::Read));
    }

    #[test]
    fn test_unmapped_prefix_is_dropped() {
        let e = evidence(&[("billing.get", AccessLevel::Read)]);
        let normalized = normalize(&e);

        assert!(normalized.permissions.is_empty());
        assert_eq!(normalized.dropped, vec!["billing.get".to_string()]);
    }

    #[test]
    fn test_empty_evidence_gives_empty_set() {
        let set = infer_permissions(std::iter::empty());
        assert!(set.is_empty());
    }

    #[test]
    fn test_write_is_never_downgraded() {
        let set = PermissionSet::new()
            .with(PermissionKey::Contents, AccessLevel::Write)
            .with(PermissionKey::Contents, AccessLevel::Read);
        assert_eq!(set.get(PermissionKey::Contents), Some(AccessLevel::Write));
    }

    #[test]
    fn test_git_and_repos_share_contents() {
        let e = evidence(&[
            ("repos.getContent", AccessLevel::Read),
            ("git.createRef", AccessLevel::Write),
        ]);
        let set = infer_permissions([&e]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(PermissionKey::Contents), Some(AccessLevel::Write));
    }

    #[test]
    fn test_serializes_as_scope_map() {
        let set = PermissionSet::new()
            .with(PermissionKey::PullRequests, AccessLevel::Write)
            .with(PermissionKey::Checks, AccessLevel::Read);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"checks":"read","pull-requests":"write"}"#);
    }

    fn arb_level() -> impl Strategy<Value = AccessLevel> {
        prop_oneof![Just(AccessLevel::Read), Just(AccessLevel::Write)]
    }

    fn arb_evidence() -> impl Strategy<Value = Vec<(String, AccessLevel)>> {
        let namespace = prop_oneof![
            Just("actions"),
            Just("checks"),
            Just("git"),
            Just("issues"),
            Just("meta"),
            Just("pulls"),
            Just("repos"),
            Just("billing"),
            Just("users"),
        ];
        prop::collection::vec(
            (namespace, "[a-z]{1,8}", arb_level())
                .prop_map(|(ns, op, level)| (format!("{}.{}", ns, op), level)),
            0..24,
        )
    }

    fn to_map(entries: &[(String, AccessLevel)]) -> EvidenceMap {
        entries.iter().cloned().collect()
    }

    proptest! {
        #[test]
        fn proptest_merge_is_order_independent(entries in arb_evidence()) {
            let forward = infer_permissions([&to_map(&entries)]);
            let mut reversed = entries.clone();
            reversed.reverse();
            let backward = infer_permissions([&to_map(&reversed)]);
            prop_assert_eq!(forward, backward);
        }

        #[test]
        fn proptest_union_matches_merge(a in arb_evidence(), b in arb_evidence()) {
            let e1 = to_map(&a);
            let e2 = to_map(&b);
            let union = e1.clone().union(&e2);

            let whole = infer_permissions([&union]);
            let ab = infer_permissions([&e1]).merge(&infer_permissions([&e2]));
            let ba = infer_permissions([&e2]).merge(&infer_permissions([&e1]));
            prop_assert_eq!(&whole, &ab);
            prop_assert_eq!(&ab, &ba);
        }

        #[test]
        fn proptest_merge_is_idempotent(entries in arb_evidence()) {
            let set = infer_permissions([&to_map(&entries)]);
            prop_assert_eq!(set.clone().merge(&set), set);
        }

        #[test]
        fn proptest_more_evidence_never_downgrades(a in arb_evidence(), b in arb_evidence()) {
            let before = infer_permissions([&to_map(&a)]);
            let after = infer_permissions([&to_map(&a), &to_map(&b)]);
            for (key, level) in before.iter() {
                let now = after.get(key);
                prop_assert!(now.is_some());
                prop_assert!(now.unwrap() >= level);
            }
        }
    }
}
