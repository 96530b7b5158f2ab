//! CLI error types.

use md2wiki_config::ConfigError;
use md2wiki_confluence::PublishError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Publish(#[from] PublishError),

    #[error("{0}")]
    Validation(String),
}
