use thiserror::Error;

pub type Result<T> = std::result::Result<T, ActionPermError>;

#[derive(Error, Debug)]
pub enum ActionPermError {
    #[error("Invalid action reference '{0}': expected owner/repo[/path]")]
    InvalidActionRef(String),

    #[error("Not a knowledge-base issue title: {0}")]
    NotKbIssue(String),

    #[error("No action metadata (action.yml or action.yaml) found for {0}")]
    MissingMetadata(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Repository access error: {0}")]
    Repository(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
