//! Reserved CUDA tier.
//!
//! The tier keeps its place at the top of the probe order so a native
//! backend can be slotted in later. In this build the probe always fails
//! and selection moves on to the GPU tier.

use crate::{ComputeError, ComputeResult};

/// Probe handle for the CUDA tier.
#[derive(Debug)]
pub struct CudaTier;

impl CudaTier {
    /// Always `false`.
    pub fn is_available() -> bool {
        false
    }

    /// Always fails with [`ComputeError::BackendNotAvailable`].
    pub fn probe() -> ComputeResult<Self> {
        Err(ComputeError::BackendNotAvailable("CUDA tier is reserved and not built".into()))
    }
}
