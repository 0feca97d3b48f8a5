//! Preview tiers and their backends.
//!
//! # Architecture
//!
//! ```text
//! Tier::Cuda  (reserved, probe always fails)
//!     |
//! Tier::Gpu   WgpuBackend (Vulkan/Metal/DX12)
//!     |
//! Tier::Cpu   CpuBackend  (rayon parallelization)
//! ```
//!
//! Probing walks down from the requested tier; runtime GPU failures move
//! one step down via [`Tier::fallback`]. There is no way back up. The GPU
//! tier is driven through the [`PreviewDevice`] trait.

mod cpu_backend;
mod cuda_backend;
mod device;

#[cfg(feature = "wgpu")]
mod wgpu_backend;

pub use cpu_backend::{CpuBackend, compute_stats_parallel, compute_stats_reference, render_parallel, render_reference};
pub use cuda_backend::CudaTier;
pub use device::{DeviceImage, PreviewDevice};

#[cfg(feature = "wgpu")]
pub use wgpu_backend::{GpuImage, WgpuBackend};

use std::fmt;
use std::str::FromStr;

use crate::ComputeError;

/// Preview execution tier, highest preference first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// Reserved CUDA tier; never selected in this build.
    Cuda,
    /// GPU through wgpu.
    Gpu,
    /// CPU with rayon.
    Cpu,
}

impl Tier {
    /// All tiers in probe order.
    pub const ALL: [Tier; 3] = [Tier::Cuda, Tier::Gpu, Tier::Cpu];

    /// Check if this tier is available on the current system.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Cuda => CudaTier::is_available(),
            #[cfg(feature = "wgpu")]
            Self::Gpu => WgpuBackend::is_available(),
            #[cfg(not(feature = "wgpu"))]
            Self::Gpu => false,
            Self::Cpu => true,
        }
    }

    /// Get human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cuda => "cuda",
            Self::Gpu => "gpu",
            Self::Cpu => "cpu",
        }
    }

    /// One-line description for tier reports.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Cuda => "reserved native tier",
            Self::Gpu => "wgpu render pipeline, compute-shader statistics when supported",
            Self::Cpu => "rayon row-parallel kernel",
        }
    }

    /// Whether the tier is expected to keep up with slider drags.
    pub fn supports_realtime(&self) -> bool {
        !matches!(self, Self::Cpu)
    }

    /// Next tier down, `None` for CPU.
    pub fn fallback(&self) -> Option<Tier> {
        match self {
            Self::Cuda => Some(Self::Gpu),
            Self::Gpu => Some(Self::Cpu),
            Self::Cpu => None,
        }
    }

    /// This tier followed by every lower one.
    pub fn chain(self) -> impl Iterator<Item = Tier> {
        std::iter::successors(Some(self), |t| t.fallback())
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tier {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cuda" => Ok(Self::Cuda),
            "gpu" | "wgpu" => Ok(Self::Gpu),
            "cpu" => Ok(Self::Cpu),
            other => Err(ComputeError::BackendNotAvailable(format!("unknown tier '{other}'"))),
        }
    }
}
