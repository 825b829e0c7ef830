use super::EvidenceMap;
use serde::Serialize;

/// Per-file endpoint usage analyzer.
pub trait EndpointExtractor: Send + Sync {
    fn extract(&self, text: &str) -> EvidenceMap;
}

/// A candidate source file. `text` is `None` when it could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub text: Option<String>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: Option<String>) -> Self {
        Self {
            path: path.into(),
            text,
        }
    }
}

/// Evidence extracted from one file. `evidence` is `None` when the file
/// contributed nothing because it was unreadable or the extractor failed.
#[derive(Debug, Clone, Serialize)]
pub struct FileEvidence {
    pub path: String,
    pub evidence: Option<EvidenceMap>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectedEvidence {
    pub per_file: Vec<FileEvidence>,
    pub union: EvidenceMap,
}

impl CollectedEvidence {
    pub fn unreadable_files(&self) -> impl Iterator<Item = &str> {
        self.per_file
            .iter()
            .filter(|f| f.evidence.is_none())
            .map(|f| f.path.as_str())
    }

    /// Evidence maps of the files that could be analyzed.
    pub fn maps(&self) -> impl Iterator<Item = &EvidenceMap> {
        self.per_file.iter().filter_map(|f| f.evidence.as_ref())
    }
}

/// Extract evidence from every file independently, then union the results.
///
/// Files are processed on scoped threads; each returns its own result and the
/// union happens only after all of them are joined.
pub fn collect_evidence(files: &[SourceFile], extractor: &dyn EndpointExtractor) -> CollectedEvidence {
    let per_file: Vec<FileEvidence> = std::thread::scope(|scope| {
        let handles: Vec<_> = files
            .iter()
            .map(|file| {
                scope.spawn(move || file.text.as_deref().map(|text| extractor.extract(text)))
            })
            .collect();

        handles
            .into_iter()
            .zip(files)
            .map(|(handle, file)| {
                let evidence = match handle.join() {
                    Ok(evidence) => evidence,
                    Err(_) => {
                        tracing::warn!(path = %file.path, "endpoint extraction panicked, skipping file");
                        None
                    }
                };
                if file.text.is_none() {
                    tracing::debug!(path = %file.path, "source file unavailable, no evidence");
                }
                FileEvidence {
                    path: file.path.clone(),
                    evidence,
                }
            })
            .collect()
    });

    let union = per_file
        .iter()
        .filter_map(|f| f.evidence.as_ref())
        .fold(EvidenceMap::new(), |acc, evidence| acc.union(evidence));

    CollectedEvidence { per_file, union }
}
