use starwatch_render::RenderError;

/// Errors from mounting or driving the starfield.
#[derive(Debug, thiserror::Error)]
pub enum StarfieldError {
    /// The circular point sprite could not be rasterized.
    #[error("failed to create point sprite: {0}")]
    Sprite(#[source] RenderError),

    /// The render surface rejected an operation.
    #[error("render surface error: {0}")]
    Render(#[from] RenderError),

    /// The scene was torn down; no surface is attached.
    #[error("starfield is not mounted")]
    Detached,
}
