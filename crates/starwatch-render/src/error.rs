//! Render error types.

/// Errors raised while creating or driving a render surface.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The host could not provide a 2D drawing surface for the point sprite.
    #[error("2D drawing surface unavailable for a {size}x{size} sprite")]
    CanvasUnavailable { size: u32 },

    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// Failed to request GPU device.
    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// Failed to create surface.
    #[error("failed to create surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    /// Surface lost and could not be recovered.
    #[error("surface lost and could not be recovered")]
    SurfaceLost,

    /// GPU ran out of memory.
    #[error("out of memory")]
    OutOfMemory,

    /// Frame acquisition timed out; the frame is skipped.
    #[error("timeout acquiring the next frame")]
    Timeout,

    /// A layer was uploaded before the surface had a point sprite.
    #[error("no point sprite uploaded")]
    MissingSprite,

    /// A layer handle that was never uploaded or was already released.
    #[error("unknown layer handle {0}")]
    UnknownLayer(u32),

    /// A line handle that was never added or was already removed.
    #[error("unknown line handle {0}")]
    UnknownLine(u32),
}
