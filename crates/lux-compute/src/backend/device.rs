//! Device abstraction used by the preview state machine.
//!
//! [`PreviewDevice`] is what [`crate::PreviewBackend`] drives on the GPU
//! tier; [`DeviceImage`] is the opaque handle a device hands back from
//! [`PreviewDevice::upload`]. Devices downcast handles to their own type
//! and reject foreign ones.

use std::any::Any;
use std::fmt;

use lux_adjust::AdjustParams;
use lux_core::{RasterImage, StatsAccumulator};

use crate::ComputeResult;

/// Image resident on a device.
pub trait DeviceImage: fmt::Debug + Send + 'static {
    /// Image dimensions (width, height).
    fn dimensions(&self) -> (u32, u32);

    /// Downcasting hook for the owning device.
    fn as_any(&self) -> &dyn Any;
}

/// Accelerated statistics and render operations.
///
/// Every method reports failure as an error; the caller turns any error
/// into a CPU fallback.
pub trait PreviewDevice: fmt::Debug + Send {
    /// Adapter or device name for logs.
    fn name(&self) -> &str;

    /// Whether [`PreviewDevice::compute_stats`] is usable.
    fn supports_statistics(&self) -> bool;

    /// Copies an image to the device.
    fn upload(&self, image: &RasterImage) -> ComputeResult<Box<dyn DeviceImage>>;

    /// Statistics accumulator for an uploaded image.
    fn compute_stats(&self, src: &dyn DeviceImage) -> ComputeResult<StatsAccumulator>;

    /// Renders the adjustment chain into a packed host image.
    fn render(&self, src: &dyn DeviceImage, params: &AdjustParams) -> ComputeResult<RasterImage>;
}
