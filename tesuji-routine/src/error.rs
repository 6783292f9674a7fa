use thiserror::Error;

use crate::config::ConfigError;

/// Failures reported by a [`Surface`](crate::Surface) implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SurfaceError {
    /// The page refused or failed to evaluate a script. The surface itself is
    /// still reachable.
    #[error("script rejected by the page: {0}")]
    ScriptRejected(String),
    /// The tab or the remote-debugging connection is gone.
    #[error("browsing surface unavailable: {0}")]
    Unavailable(String),
}

impl SurfaceError {
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::ScriptRejected(_))
    }
}

/// Errors that end a training session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("overlay failed to render {failures} times in a row; browsing surface considered lost")]
    SurfaceLost { failures: u32 },
    #[error(transparent)]
    Config(#[from] ConfigError),
}
