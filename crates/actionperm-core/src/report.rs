use crate::evidence::EvidenceMap;
use crate::pipeline::Analysis;

/// Markdown table of raw endpoint evidence.
pub fn evidence_table(evidence: &EvidenceMap) -> String {
    let mut out = String::from("|Endpoint | Permission|\n|---------| ----------|\n");
    for (key, level) in evidence.iter() {
        out.push_str(&format!("{} | {}\n", key, level));
    }
    out
}

/// Markdown summary of an analysis, suitable for an issue comment.
pub fn render_markdown(analysis: &Analysis) -> String {
    let signals: Vec<&str> = analysis.signals.iter().map(|s| s.as_str()).collect();

    let mut summary = vec![
        format!("Action Name: {}", analysis.action),
        format!("Action Type: {}", analysis.action_kind),
        format!("GITHUB_TOKEN Matches: {}", signals.join(",")),
    ];
    if let Some(language) = &analysis.language {
        summary.push(format!("Top language: {}", language));
    }
    if let Some(repo) = &analysis.repo {
        summary.push(format!("Stars: {}", repo.stargazers_count));
        summary.push(format!("Private: {}", repo.private));
        summary.push(format!("Forks: {}", repo.forks_count));
    }

    let mut body = format!("### Analysis\n```yml\n{}\n```\n", summary.join("\n"));

    if !analysis.evidence.is_empty() {
        body.push_str("\n### Endpoints Found\n");
        body.push_str(&evidence_table(&analysis.evidence));
    }

    if !analysis.dropped_keys.is_empty() {
        body.push_str(&format!(
            "\n#### Unmapped Endpoints\n{}\n",
            analysis.dropped_keys.join("\n")
        ));
    }

    if !analysis.unreadable_files.is_empty() {
        body.push_str(&format!(
            "\n#### Unreadable Files\n{}\n",
            analysis.unreadable_files.join("\n")
        ));
    }

    if !analysis.follow_up_links.is_empty() {
        body.push_str(&format!(
            "\n#### FollowUp Links.\n{}\n",
            analysis.follow_up_links.join("\n")
        ));
    }

    body.push_str("\n### action-security.yml\n```yaml\n");
    body.push_str(&analysis.manifest.render());
    body.push_str("```\n");
    body
}
