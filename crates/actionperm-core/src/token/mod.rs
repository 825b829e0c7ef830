pub mod classifier;
pub mod scanner;

pub use classifier::{classify_wiring, references_default_token, TokenWiring, WiringKind};
pub use scanner::{scan_token_signals, TokenSignal};

/// Token references and wiring for one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUsage {
    pub signals: Vec<TokenSignal>,
    pub wiring: TokenWiring,
}

/// Scan the README (first) and the metadata for token references, then
/// classify how the token is wired.
///
/// No reference anywhere yields `WiringKind::None`.
pub fn detect_token_usage(metadata: &str, readme: Option<&str>) -> TokenUsage {
    let mut signals = readme.map(scan_token_signals).unwrap_or_default();
    scanner::extend_signals(&mut signals, scan_token_signals(metadata));

    if signals.is_empty() {
        return TokenUsage {
            signals,
            wiring: TokenWiring::not_used(),
        };
    }

    let wiring = classify_wiring(metadata, &signals);
    TokenUsage { signals, wiring }
}

/// How the token reaches the action, given its metadata and README.
pub fn classify_token(metadata: &str, readme: Option<&str>) -> TokenWiring {
    detect_token_usage(metadata, readme).wiring
}
