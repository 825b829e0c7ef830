use crate::action::{ActionKind, ActionMetadata, ActionRef, METADATA_FILES};
use crate::config::Config;
use crate::error::{ActionPermError, Result};
use crate::evidence::{collect_evidence, EndpointExtractor, EvidenceMap, SourceFile};
use crate::manifest::{manual_review_manifest, synthesize_manifest, Manifest, ManualReviewReason};
use crate::permissions::{infer_permissions, normalize};
use crate::probe::{probe_dependency_surface, ProbeDecision, SkipReason};
use crate::providers::RepoInfo;
use crate::source::{ActionRepository, SearchHit};
use crate::token::{detect_token_usage, TokenSignal};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything learned about one action, including its manifest.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub action: ActionRef,
    pub action_kind: ActionKind,
    pub language: Option<String>,
    pub signals: Vec<TokenSignal>,
    /// `None` when the action never references a token.
    pub probe: Option<ProbeDecision>,
    pub source_files: Vec<String>,
    pub follow_up_links: Vec<String>,
    pub unreadable_files: Vec<String>,
    pub evidence: EvidenceMap,
    /// Raw evidence keys whose namespace has no permission scope.
    pub dropped_keys: Vec<String>,
    pub repo: Option<RepoInfo>,
    pub manifest: Manifest,
    pub analyzed_at: DateTime<Utc>,
}

/// Run the full inference pipeline for one action.
///
/// Only a missing metadata file is an error; every other gap ends in a
/// manifest that says what is missing.
pub fn analyze(
    repo: &dyn ActionRepository,
    action: &ActionRef,
    config: &Config,
    extractor: &dyn EndpointExtractor,
) -> Result<Analysis> {
    let metadata_text = METADATA_FILES
        .iter()
        .find_map(|file| repo.fetch_text(&action.file_path(file)))
        .ok_or_else(|| ActionPermError::MissingMetadata(action.to_string()))?;
    let readme = repo.fetch_text(&action.file_path("README.md"));

    let metadata = ActionMetadata::parse(&metadata_text);
    let action_name = metadata.name.clone().unwrap_or_else(|| action.to_string());
    let action_label = action.to_string();
    tracing::info!(action = %action_label, kind = %metadata.kind, "analyzing action");

    let usage = detect_token_usage(&metadata_text, readme.as_deref());
    let mut analysis = Analysis {
        action: action.clone(),
        action_kind: metadata.kind,
        language: None,
        signals: usage.signals.clone(),
        probe: None,
        source_files: Vec::new(),
        follow_up_links: Vec::new(),
        unreadable_files: Vec::new(),
        evidence: EvidenceMap::new(),
        dropped_keys: Vec::new(),
        repo: repo.repo_info(),
        manifest: synthesize_manifest(
            &action_name,
            &action_label,
            usage.wiring.clone(),
            Default::default(),
        ),
        analyzed_at: Utc::now(),
    };

    if !usage.wiring.is_used() {
        tracing::warn!(action = %action_label, "action metadata and README do not reference a token");
        return Ok(analysis);
    }

    let signal_list: Vec<&str> = usage.signals.iter().map(|s| s.as_str()).collect();
    tracing::info!(signals = %signal_list.join(","), "token references found");

    analysis.language = repo.top_language();
    tracing::info!(language = ?analysis.language, "top language");

    let dependency_manifest = match metadata.kind {
        ActionKind::Node => repo.fetch_text(&action.file_path(&config.probe.dependency_manifest)),
        _ => None,
    };
    let decision = probe_dependency_surface(
        metadata.kind,
        analysis.language.as_deref(),
        dependency_manifest.as_deref(),
        &config.probe,
    );
    analysis.probe = Some(decision.clone());

    let language = match (decision, analysis.language.clone()) {
        (ProbeDecision::Scan, Some(language)) => language,
        (decision, _) => {
            let reason = match decision {
                ProbeDecision::Skip(reason) => reason,
                ProbeDecision::Scan => SkipReason::UnknownLanguage,
            };
            tracing::info!(%reason, "skipping endpoint scan");
            analysis.manifest = manual_review_manifest(
                &action_name,
                &action_label,
                usage.wiring,
                ManualReviewReason::Skipped(reason),
            );
            return Ok(analysis);
        }
    };

    let hits = find_candidate_files(repo, &usage.signals, &language, config.search.max_files);
    analysis.source_files = hits.iter().map(|h| h.path.clone()).collect();
    analysis.follow_up_links = hits.iter().filter_map(|h| h.url.clone()).collect();
    tracing::info!(count = hits.len(), "candidate source files");

    if hits.is_empty() {
        analysis.manifest = manual_review_manifest(
            &action_name,
            &action_label,
            usage.wiring,
            ManualReviewReason::NoSourceFiles,
        );
        return Ok(analysis);
    }

    let files: Vec<SourceFile> = hits
        .iter()
        .map(|hit| SourceFile::new(hit.path.clone(), repo.fetch_text(&hit.path)))
        .collect();
    let collected = collect_evidence(&files, extractor);

    let permissions = infer_permissions(collected.maps());
    analysis.dropped_keys = normalize(&collected.union).dropped;
    analysis.unreadable_files = collected.unreadable_files().map(String::from).collect();
    analysis.evidence = collected.union;
    analysis.manifest = if permissions.is_empty() && !analysis.dropped_keys.is_empty() {
        manual_review_manifest(
            &action_name,
            &action_label,
            usage.wiring,
            ManualReviewReason::UnmappedEvidence,
        )
    } else {
        synthesize_manifest(&action_name, &action_label, usage.wiring, permissions)
    };

    Ok(analysis)
}

/// Search once per signal and keep each path once, in first-found order.
fn find_candidate_files(
    repo: &dyn ActionRepository,
    signals: &[TokenSignal],
    language: &str,
    max_files: usize,
) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = Vec::new();
    for signal in signals {
        for hit in repo.search_files(signal, language) {
            if !hits.iter().any(|h| h.path == hit.path) {
                hits.push(hit);
            }
        }
    }
    if hits.len() > max_files {
        tracing::warn!(found = hits.len(), max_files, "too many candidate files, truncating");
        hits.truncate(max_files);
    }
    hits
}
