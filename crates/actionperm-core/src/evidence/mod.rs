pub mod collector;
pub mod extractor;

use crate::permissions::AccessLevel;
use serde::ser::{Serialize, SerializeMap, Serializer};

pub use collector::{collect_evidence, CollectedEvidence, EndpointExtractor, FileEvidence, SourceFile};
pub use extractor::OctokitExtractor;

/// One raw piece of endpoint evidence, e.g. `issues.create` => write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceEntry {
    pub key: String,
    pub level: AccessLevel,
}

/// Raw evidence keyed by `<namespace>.<operation>`, kept in first-seen order.
///
/// Inserting an existing key joins the levels, so a key seen as both read and
/// write is recorded as write regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvidenceMap {
    entries: Vec<EvidenceEntry>,
}

impl EvidenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, level: AccessLevel) {
        let key = key.into();
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(existing) => existing.level = existing.level.join(level),
            None => self.entries.push(EvidenceEntry { key, level }),
        }
    }

    pub fn get(&self, key: &str) -> Option<AccessLevel> {
        self.entries.iter().find(|e| e.key == key).map(|e| e.level)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, AccessLevel)> {
        self.entries.iter().map(|e| (e.key.as_str(), e.level))
    }

    /// Key-wise union; keys from `other` not yet present are appended in
    /// their own order.
    pub fn union(mut self, other: &EvidenceMap) -> EvidenceMap {
        for (key, level) in other.iter() {
            self.insert(key, level);
        }
        self
    }
}

impl FromIterator<(String, AccessLevel)> for EvidenceMap {
    fn from_iter<I: IntoIterator<Item = (String, AccessLevel)>>(iter: I) -> Self {
        let mut map = EvidenceMap::new();
        for (key, level) in iter {
            map.insert(key, level);
        }
        map
    }
}

impl Serialize for EvidenceMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.key, &entry.level)?;
        }
        map.end()
    }
}
