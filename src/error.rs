//! Error type shared by every loader and the application runner.

use std::path::PathBuf;

/// Errors raised while creating GPU resources or loading assets.
#[derive(thiserror::Error, Debug)]
pub enum FredError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image error on {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Texture size {width}x{height} is outside 1..={max}")]
    TextureSize { width: u32, height: u32, max: u32 },

    #[error("Unknown model format: '{0}'")]
    UnknownFormat(String),

    #[error("Model parse error: {0}")]
    Parse(String),

    #[error("Shader error: {0}")]
    Shader(String),

    #[error("Failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("No suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("Failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("Window error: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

impl FredError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FredError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        FredError::Image {
            path: path.into(),
            source,
        }
    }

    pub fn parse<T: ToString>(msg: T) -> Self {
        FredError::Parse(msg.to_string())
    }

    pub fn shader<T: ToString>(msg: T) -> Self {
        FredError::Shader(msg.to_string())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, FredError>;
