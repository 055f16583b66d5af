use thiserror::Error;

#[derive(Debug, Error)]
pub enum InjectError {
    #[error("unknown build mode {0:?} (expected development or production)")]
    UnknownMode(String),
    #[error("unknown injection target {0:?} (expected development, production or all)")]
    UnknownTarget(String),
    #[error("failed to render version manifest: {0}")]
    Manifest(#[source] serde_json::Error),
}
