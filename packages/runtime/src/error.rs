/// Errors raised while composing capabilities from settings.
///
/// These are startup-time programming or configuration errors; no operation
/// ever returns one.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown capability: {name}")]
    UnknownCapability { name: String },
    #[error("malformed capability identifier: {name:?}")]
    MalformedCapability { name: String },
    #[error("capability listed more than once: {name}")]
    DuplicateCapability { name: String },
    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] serde_json::Error),
    #[error("invalid redaction pattern: {0}")]
    InvalidRedactionPattern(#[from] regex::Error),
    #[error(transparent)]
    AlreadyInstalled(#[from] opkit_core::AlreadyInstalled),
}
