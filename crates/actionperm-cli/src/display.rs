use actionperm_core::manifest::ManifestStatus;
use actionperm_core::pipeline::Analysis;
use actionperm_core::{ActionRef, TokenSignal};
use colored::*;
use std::path::Path;

/// Print a short analysis summary to stderr so stdout stays machine-readable.
pub fn print_summary(analysis: &Analysis) {
    eprintln!();
    eprintln!(
        "{}",
        format!(
            " actionperm v{} — {}",
            env!("CARGO_PKG_VERSION"),
            analysis.action
        )
        .bold()
    );
    eprintln!(" {} Action type: {}", "|-".dimmed(), analysis.action_kind.label().cyan());
    eprintln!(
        " {} Top language: {}",
        "|-".dimmed(),
        analysis.language.as_deref().unwrap_or("unknown")
    );

    let signals: Vec<&str> = analysis.signals.iter().map(|s| s.as_str()).collect();
    eprintln!(
        " {} Token references: {}",
        "|-".dimmed(),
        if signals.is_empty() {
            "none".dimmed().to_string()
        } else {
            signals.join(", ")
        }
    );
    eprintln!(
        " {} Source files scanned: {}",
        "|-".dimmed(),
        analysis.source_files.len()
    );
    if !analysis.unreadable_files.is_empty() {
        eprintln!(
            " {} Unreadable files: {}",
            "|-".dimmed(),
            analysis.unreadable_files.len().to_string().yellow()
        );
    }
    if !analysis.dropped_keys.is_empty() {
        eprintln!(
            " {} Unmapped endpoints: {}",
            "|-".dimmed(),
            analysis.dropped_keys.join(", ").yellow()
        );
    }

    match &analysis.manifest.status {
        ManifestStatus::Inferred => {
            let scopes: Vec<String> = analysis
                .manifest
                .permissions
                .iter()
                .map(|(key, level)| format!("{}: {}", key, level))
                .collect();
            eprintln!(" {} Permissions: {}", "OK".green().bold(), scopes.join(", "));
        }
        ManifestStatus::TokenNotUsed => {
            eprintln!(" {} GITHUB_TOKEN not used", "OK".green().bold());
        }
        ManifestStatus::ManualReview(reason) => {
            eprintln!(
                " {} Manual review required: {}",
                "REVIEW".yellow().bold(),
                reason
            );
        }
    }
    eprintln!();
}

pub fn print_already_analyzed(action: &ActionRef, path: &Path) {
    eprintln!(
        " {} {} already analyzed ({}); use --force to redo",
        "SKIP".yellow().bold(),
        action,
        path.display()
    );
}

pub fn print_written(path: &Path) {
    eprintln!(" Manifest written to {}", path.display().to_string().green());
}

pub fn print_signals(file: &Path, signals: &[TokenSignal]) {
    if signals.is_empty() {
        println!("{} No token references in {}", "--".dimmed(), file.display());
        return;
    }
    println!("{}", format!("Token references in {}", file.display()).bold());
    for signal in signals {
        println!(" {} {}", "|-".dimmed(), signal.as_str().cyan());
    }
}
