use std::path::PathBuf;

use thiserror::Error;

/// Invariant violations during a render. Any of these aborts the whole render; they
/// point at a traversal bug or an adversarial tree, never at recoverable input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("cursor stack underflow: retrieved a cursor that was never saved")]
    CursorUnderflow,

    #[error("list context stack underflow: left a list that was never entered")]
    ListUnderflow,

    #[error("document nesting exceeds the maximum depth of {limit}")]
    DepthExceeded { limit: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid color {0:?}, expected #RRGGBB or #AARRGGBB")]
    InvalidColor(String),
}
