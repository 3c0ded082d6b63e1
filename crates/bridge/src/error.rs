use surfview_render::RenderError;

/// Errors crossing the display bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("viewer module unavailable: {0}")]
    ModuleUnavailable(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown bridge method: {0}")]
    UnknownMethod(String),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("bridge used after dispose")]
    Disposed,
}
