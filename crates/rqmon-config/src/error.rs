/// Errors raised while loading or validating the queues configuration.
///
/// Fatal at startup; on reload the previous valid configuration stays
/// active and the error is only logged.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config: failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config: failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Config: invalid discovery pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Config: validation failed: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
