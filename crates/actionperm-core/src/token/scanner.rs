use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credential-like identifiers: a role prefix joined to a token suffix
/// (`github_token`, `gh-tok`, `pat_token`), or bare `token` / `oidc`.
static TOKEN_SIGNAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:(?:github|repo|gh|pat)[_-](?:token|tok)|token|oidc)").unwrap()
});

/// A lower-cased token reference found in action metadata or documentation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSignal(String);

impl TokenSignal {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TokenSignal {
    fn from(value: &str) -> Self {
        TokenSignal(value.to_lowercase())
    }
}

/// Scan a text blob for token references.
///
/// Matches are lower-cased and de-duplicated, keeping first-seen order. An
/// empty vector means nothing was found.
pub fn scan_token_signals(text: &str) -> Vec<TokenSignal> {
    let mut signals: Vec<TokenSignal> = Vec::new();
    for m in TOKEN_SIGNAL_RE.find_iter(text) {
        let signal = TokenSignal::from(m.as_str());
        if !signals.contains(&signal) {
            signals.push(signal);
        }
    }
    signals
}

/// Append the signals of `more` that are not already present.
pub fn extend_signals(signals: &mut Vec<TokenSignal>, more: Vec<TokenSignal>) {
    for signal in more {
        if !signals.contains(&signal) {
            signals.push(signal);
        }
    }
}
