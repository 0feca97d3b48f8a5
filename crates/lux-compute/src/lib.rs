//! Statistics engine and tiered preview backends.
//!
//! Provides CPU (rayon) and GPU (wgpu) implementations of the two
//! image-level operations, statistics and rendering, behind a
//! [`PreviewBackend`] that probes tiers at startup and falls back to the
//! CPU when the GPU fails.
//!
//! # Architecture
//!
//! ```text
//! PreviewBackend (tier state machine, sessions)
//!     ├── CpuBackend   (rayon statistics + pixel kernel)
//!     ├── WgpuBackend  (compute-shader statistics + fragment-shader render)
//!     └── cuda         (reserved, always unavailable)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use lux_compute::PreviewBackend;
//! use lux_adjust::AdjustmentVector;
//!
//! let mut backend = PreviewBackend::from_env();
//! let mut session = backend.create_session(image);
//! let adjusted = backend.render(
//!     &mut session,
//!     &AdjustmentVector::new().with("Light_Master", 0.4),
//! );
//! backend.dispose_session(&mut session);
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod layout;
pub mod preview;
pub mod session;
pub mod shaders;

pub use backend::{CpuBackend, DeviceImage, PreviewDevice, Tier};
#[cfg(feature = "wgpu")]
pub use backend::{GpuImage, WgpuBackend};
pub use layout::{RenderUniform, TileStats};
pub use preview::{PreviewBackend, PreviewBuilder, PreviewConfig, ProbeOutcome};
pub use session::{PreviewSession, SessionId};

use thiserror::Error;

/// Compute and preview errors.
///
/// These never reach callers of [`PreviewBackend::render`]; they drive the
/// tier fallback instead.
#[derive(Error, Debug)]
pub enum ComputeError {
    /// No GPU adapter matched the request.
    #[error("No suitable GPU adapter found")]
    NoAdapter,

    /// Tier not compiled in, reserved, or unknown.
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    /// Device request rejected by the adapter.
    #[error("Failed to create device: {0}")]
    DeviceCreation(String),

    /// Buffer exceeds a device limit or could not be allocated.
    #[error("Failed to create buffer: {0}")]
    BufferCreation(String),

    /// Generated WGSL failed validation.
    #[error("Failed to compile shader: {0}")]
    ShaderCompilation(String),

    /// Image edge exceeds the device texture limit.
    #[error("Image too large: {width}x{height} exceeds GPU limit {limit}")]
    ImageTooLarge {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
        /// Largest texture edge the device accepts.
        limit: u32,
    },

    /// Upload, dispatch, render, readback or map failure.
    #[error("GPU operation failed: {0}")]
    OperationFailed(String),

    /// Invalid image geometry.
    #[error(transparent)]
    Core(#[from] lux_core::Error),
}

/// Result type for compute operations.
pub type ComputeResult<T> = Result<T, ComputeError>;
