//! Preview sessions.
//!
//! A session pins one source image, its statistics and, on the GPU tier,
//! the uploaded texture. Slider drags render against the session so the
//! upload and statistics pass happen once per image.

use std::fmt;

use lux_core::{ColorStats, RasterImage};

use crate::backend::Tier;
use crate::backend::DeviceImage;

/// Session identifier, unique per [`crate::PreviewBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Source image plus cached per-image state.
#[derive(Debug)]
pub struct PreviewSession {
    id: SessionId,
    image: RasterImage,
    stats: ColorStats,
    tier: Tier,
    pub(crate) gpu: Option<Box<dyn DeviceImage>>,
    pub(crate) fallback_logged: bool,
    disposed: bool,
}

impl PreviewSession {
    pub(crate) fn new(id: SessionId, image: RasterImage, tier: Tier) -> Self {
        Self {
            id,
            image,
            stats: ColorStats::neutral(),
            tier,
            gpu: None,
            fallback_logged: false,
            disposed: false,
        }
    }

    /// Identifier assigned by the creating backend.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Source image.
    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    /// Statistics computed when the session was created.
    pub fn stats(&self) -> ColorStats {
        self.stats
    }

    pub(crate) fn set_stats(&mut self, stats: ColorStats) {
        self.stats = stats;
    }

    /// Tier that last served this session.
    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub(crate) fn set_tier(&mut self, tier: Tier) {
        self.tier = tier;
    }

    /// Whether a device-side copy of the image is held.
    pub fn has_gpu_resources(&self) -> bool {
        self.gpu.is_some()
    }

    /// Whether [`crate::PreviewBackend::dispose_session`] has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Drops device resources; the source image stays readable.
    pub(crate) fn release(&mut self) {
        self.gpu = None;
    }

    pub(crate) fn mark_disposed(&mut self) {
        self.release();
        self.disposed = true;
    }
}
