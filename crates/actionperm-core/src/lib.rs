pub mod action;
pub mod config;
pub mod error;
pub mod evidence;
pub mod manifest;
pub mod permissions;
pub mod pipeline;
pub mod probe;
pub mod providers;
pub mod report;
pub mod source;
pub mod token;

pub use action::{ActionKind, ActionMetadata, ActionRef};
pub use config::Config;
pub use error::{ActionPermError, Result};
pub use evidence::{EndpointExtractor, EvidenceMap, OctokitExtractor, SourceFile};
pub use manifest::{synthesize_manifest, Manifest, ManifestStatus, ManualReviewReason};
pub use permissions::{infer_permissions, AccessLevel, PermissionKey, PermissionSet};
pub use pipeline::{analyze, Analysis};
pub use source::{ActionRepository, GitHubRepository, LocalCheckout};
pub use token::{classify_token, TokenSignal, TokenWiring, WiringKind};
