//! Tiered preview backend.
//!
//! [`PreviewBackend`] owns the selected tier and serves sessions:
//!
//! ```text
//! create_session(image)  -> upload (GPU) + statistics
//! render(session, raw)   -> resolve_adjustments + transform
//! dispose_session(s)     -> release device resources (idempotent)
//! ```
//!
//! Selection walks [`Tier::chain`] from the requested tier and keeps the
//! first probe that succeeds. At runtime any GPU error moves the backend
//! to the CPU tier for good and the frame is re-rendered there, so
//! [`PreviewBackend::render`] always returns an image.
//!
//! # Example
//!
//! ```
//! use lux_compute::{PreviewBackend, Tier};
//! use lux_adjust::AdjustmentVector;
//! use lux_core::RasterImage;
//!
//! let mut backend = PreviewBackend::builder().tier(Tier::Cpu).build();
//! let image = RasterImage::filled(4, 4, [64, 64, 64, 255]);
//! let out = backend.render_image(&image, &AdjustmentVector::new().with("Light_Master", 0.5));
//! assert!(out.pixel(0, 0)[0] > 64);
//! ```

use tracing::{debug, info, warn};

use lux_adjust::{AdjustParams, AdjustmentVector, OverrideMode, resolve_adjustments};
use lux_core::{ColorStats, RasterImage};

use crate::backend::{CpuBackend, CudaTier, PreviewDevice, Tier};
#[cfg(feature = "wgpu")]
use crate::backend::WgpuBackend;
use crate::session::{PreviewSession, SessionId};
use crate::{ComputeError, ComputeResult};

/// Environment variable selecting the tier (`auto|gpu|cpu|cuda`).
pub const ENV_TIER: &str = "LUX_PREVIEW_TIER";
/// Environment variable toggling GPU statistics (`0/1/true/false`).
pub const ENV_GPU_STATS: &str = "LUX_GPU_STATS";
/// Environment variable selecting the override mode (`delta|absolute`).
pub const ENV_OVERRIDE_MODE: &str = "LUX_OVERRIDE_MODE";

// ============================================================================
// Configuration
// ============================================================================

/// Preview backend configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewConfig {
    /// Starting tier (None = probe from the top).
    pub tier: Option<Tier>,
    /// Allow compute-shader statistics on the GPU tier.
    pub gpu_statistics: bool,
    /// Spread CPU work over the rayon pool.
    pub parallel_cpu: bool,
    /// How per-parameter keys combine with master-derived values.
    pub override_mode: OverrideMode,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            tier: None,
            gpu_statistics: true,
            parallel_cpu: true,
            override_mode: OverrideMode::Delta,
        }
    }
}

impl PreviewConfig {
    /// Defaults overridden by `LUX_PREVIEW_TIER`, `LUX_GPU_STATS` and
    /// `LUX_OVERRIDE_MODE`.
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Applies overrides from a variable lookup. Malformed values are
    /// ignored with a warning.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(ENV_TIER) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "" | "auto" => self.tier = None,
                other => match other.parse::<Tier>() {
                    Ok(tier) => self.tier = Some(tier),
                    Err(_) => warn!(var = ENV_TIER, value = %raw, "Ignoring malformed tier"),
                },
            }
        }

        if let Some(raw) = lookup(ENV_GPU_STATS) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => self.gpu_statistics = true,
                "0" | "false" | "off" | "no" => self.gpu_statistics = false,
                _ => warn!(var = ENV_GPU_STATS, value = %raw, "Ignoring malformed flag"),
            }
        }

        if let Some(raw) = lookup(ENV_OVERRIDE_MODE) {
            match raw.parse::<OverrideMode>() {
                Ok(mode) => self.override_mode = mode,
                Err(e) => warn!(var = ENV_OVERRIDE_MODE, error = %e, "Ignoring malformed override mode"),
            }
        }
        self
    }
}

/// Builder for [`PreviewBackend`].
#[derive(Debug, Clone, Default)]
pub struct PreviewBuilder {
    config: PreviewConfig,
}

impl PreviewBuilder {
    /// Create new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start probing at `tier` instead of the top.
    pub fn tier(mut self, tier: Tier) -> Self {
        self.config.tier = Some(tier);
        self
    }

    /// Probe from the top (default).
    pub fn auto_tier(mut self) -> Self {
        self.config.tier = None;
        self
    }

    /// Allow or forbid GPU statistics.
    pub fn gpu_statistics(mut self, enabled: bool) -> Self {
        self.config.gpu_statistics = enabled;
        self
    }

    /// Enable or disable rayon on the CPU path.
    pub fn parallel_cpu(mut self, enabled: bool) -> Self {
        self.config.parallel_cpu = enabled;
        self
    }

    /// Set the override mode used by [`PreviewBackend::render`].
    pub fn override_mode(mut self, mode: OverrideMode) -> Self {
        self.config.override_mode = mode;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: PreviewConfig) -> Self {
        self.config = config;
        self
    }

    /// Probe tiers and build the backend.
    pub fn build(self) -> PreviewBackend {
        PreviewBackend::with_config(self.config)
    }
}

// ============================================================================
// Tier probing
// ============================================================================

/// Result of a successful tier probe.
enum Probed {
    Cuda,
    Gpu(Box<dyn PreviewDevice>),
    Cpu,
}

fn probe_tier(tier: Tier, config: &PreviewConfig) -> ComputeResult<Probed> {
    match tier {
        Tier::Cuda => CudaTier::probe().map(|_| Probed::Cuda),
        #[cfg(feature = "wgpu")]
        Tier::Gpu => WgpuBackend::new(config.gpu_statistics).map(|gpu| Probed::Gpu(Box::new(gpu))),
        #[cfg(not(feature = "wgpu"))]
        Tier::Gpu => {
            let _ = config;
            Err(ComputeError::BackendNotAvailable("built without the wgpu feature".into()))
        }
        Tier::Cpu => Ok(Probed::Cpu),
    }
}

/// What happened to one tier during backend construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Probe passed and the tier was adopted.
    Selected,
    /// Probe ran and failed.
    Failed(String),
    /// Never probed: above the requested tier, or below the adopted one.
    Skipped,
}

// ============================================================================
// PreviewBackend
// ============================================================================

/// Preview renderer with automatic tier selection and CPU fallback.
#[derive(Debug)]
pub struct PreviewBackend {
    config: PreviewConfig,
    tier: Tier,
    cpu: CpuBackend,
    gpu: Option<Box<dyn PreviewDevice>>,
    probes: Vec<(Tier, ProbeOutcome)>,
    next_session: u64,
}

impl Default for PreviewBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewBackend {
    /// Backend with default configuration (auto tier).
    pub fn new() -> Self {
        Self::with_config(PreviewConfig::default())
    }

    /// Backend configured from the environment.
    pub fn from_env() -> Self {
        Self::with_config(PreviewConfig::from_env())
    }

    /// Starts a [`PreviewBuilder`].
    pub fn builder() -> PreviewBuilder {
        PreviewBuilder::new()
    }

    fn unprobed(config: PreviewConfig) -> Self {
        Self {
            cpu: CpuBackend::new(config.parallel_cpu),
            tier: Tier::Cpu,
            gpu: None,
            probes: Tier::ALL.iter().map(|&t| (t, ProbeOutcome::Skipped)).collect(),
            next_session: 0,
            config,
        }
    }

    fn record(&mut self, tier: Tier, outcome: ProbeOutcome) {
        if let Some(slot) = self.probes.iter_mut().find(|(t, _)| *t == tier) {
            slot.1 = outcome;
        }
    }

    /// Probes from `config.tier` (or the top) down to the CPU.
    pub fn with_config(config: PreviewConfig) -> Self {
        let start = config.tier.unwrap_or(Tier::Cuda);
        let mut backend = Self::unprobed(config);

        for tier in start.chain() {
            match probe_tier(tier, &backend.config) {
                Ok(probed) => {
                    backend.adopt(tier, probed);
                    break;
                }
                Err(e) => {
                    warn!(tier = tier.name(), error = %e, "Tier probe failed");
                    backend.record(tier, ProbeOutcome::Failed(e.to_string()));
                }
            }
        }

        info!(
            tier = backend.tier.name(),
            gpu_statistics = backend.statistics_on_gpu(),
            "Preview backend ready"
        );
        backend
    }

    /// Backend on the GPU tier driven by an already constructed device.
    ///
    /// Skips probing; runtime failures of `device` still fall back to the
    /// CPU.
    pub fn with_device(config: PreviewConfig, device: Box<dyn PreviewDevice>) -> Self {
        let mut backend = Self::unprobed(config);
        info!(device = device.name(), "Preview backend using supplied device");
        backend.adopt(Tier::Gpu, Probed::Gpu(device));
        backend
    }

    fn adopt(&mut self, tier: Tier, probed: Probed) {
        match probed {
            // reserved: a successful CUDA probe has no backend to hold yet
            Probed::Cuda => {}
            Probed::Gpu(gpu) => self.gpu = Some(gpu),
            Probed::Cpu => {}
        }
        self.tier = tier;
        self.record(tier, ProbeOutcome::Selected);
    }

    /// Currently active tier.
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Configuration the backend was built with.
    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Construction-time outcome per tier, highest tier first.
    pub fn probe_report(&self) -> &[(Tier, ProbeOutcome)] {
        &self.probes
    }

    /// Probe report, one line per tier: `[+]` adopted, `[-]` failed,
    /// `[ ]` not probed.
    pub fn describe(&self) -> String {
        let mut desc = String::new();
        for (tier, outcome) in &self.probes {
            let line = match outcome {
                ProbeOutcome::Selected if *tier == Tier::Gpu => format!(
                    "[+] {}: {} (statistics on {})",
                    tier,
                    tier.description(),
                    if self.statistics_on_gpu() { "gpu" } else { "cpu" }
                ),
                ProbeOutcome::Selected => format!("[+] {}: {}", tier, tier.description()),
                ProbeOutcome::Failed(e) => format!("[-] {}: {} ({})", tier, tier.description(), e),
                ProbeOutcome::Skipped => format!("[ ] {}: {}", tier, tier.description()),
            };
            desc.push_str(&line);
            desc.push('\n');
        }
        desc
    }

    /// Whether statistics run as a compute shader.
    pub fn statistics_on_gpu(&self) -> bool {
        self.config.gpu_statistics && self.gpu.as_ref().is_some_and(|g| g.supports_statistics())
    }

    /// Drops the GPU tier: explicit `Gpu -> Cpu` transition.
    fn fall_back_to_cpu(&mut self, session: &mut PreviewSession, err: &ComputeError) {
        if !session.fallback_logged {
            warn!(
                session = %session.id(),
                from = self.tier.name(),
                error = %err,
                "GPU preview failed, falling back to CPU"
            );
            session.fallback_logged = true;
        }
        session.release();
        self.gpu = None;
        self.tier = Tier::Cpu;
        session.set_tier(Tier::Cpu);
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Creates a session: uploads the image (GPU tier) and computes its
    /// statistics.
    pub fn create_session(&mut self, image: RasterImage) -> PreviewSession {
        self.next_session += 1;
        let id = SessionId(self.next_session);
        let mut session = PreviewSession::new(id, image, self.tier);

        debug!(
            session = %id,
            width = session.image().width(),
            height = session.image().height(),
            tier = self.tier.name(),
            "Creating preview session"
        );

        if !session.image().is_empty() {
            let uploaded = self.gpu.as_ref().map(|gpu| gpu.upload(session.image()));
            match uploaded {
                Some(Ok(texture)) => session.gpu = Some(texture),
                Some(Err(e)) => self.fall_back_to_cpu(&mut session, &e),
                None => {}
            }
        }

        let stats = self.session_statistics(&mut session);
        session.set_stats(stats);
        session
    }

    fn session_statistics(&mut self, session: &mut PreviewSession) -> ColorStats {
        if self.statistics_on_gpu() {
            let result = match (self.gpu.as_ref(), session.gpu.as_deref()) {
                (Some(gpu), Some(texture)) => Some(gpu.compute_stats(texture)),
                _ => None,
            };
            match result {
                Some(Ok(acc)) => return acc.finish(),
                Some(Err(e)) => self.fall_back_to_cpu(session, &e),
                None => {}
            }
        }

        debug!(session = %session.id(), parallel = self.cpu.is_parallel(), "Computing statistics on CPU");
        self.cpu.compute_stats(session.image()).finish()
    }

    /// Resolves `adjustments` against the session statistics and renders.
    pub fn render(&mut self, session: &mut PreviewSession, adjustments: &AdjustmentVector) -> RasterImage {
        let params = resolve_adjustments(adjustments, &session.stats(), self.config.override_mode);
        self.render_params(session, &params)
    }

    /// Renders already-resolved parameters.
    pub fn render_params(&mut self, session: &mut PreviewSession, params: &AdjustParams) -> RasterImage {
        if session.image().is_empty() || params.is_identity() {
            return session.image().packed();
        }
        if session.is_disposed() {
            debug!(session = %session.id(), "Rendering disposed session on CPU");
            return self.cpu.render(session.image(), params);
        }

        if self.tier == Tier::Gpu {
            match self.render_gpu(session, params) {
                Ok(image) => return image,
                Err(e) => self.fall_back_to_cpu(session, &e),
            }
        }

        self.cpu.render(session.image(), params)
    }

    fn render_gpu(&self, session: &mut PreviewSession, params: &AdjustParams) -> ComputeResult<RasterImage> {
        let gpu = self
            .gpu
            .as_ref()
            .ok_or_else(|| ComputeError::BackendNotAvailable("GPU tier not initialised".into()))?;
        if session.gpu.is_none() {
            session.gpu = Some(gpu.upload(session.image())?);
        }
        let Some(texture) = session.gpu.as_deref() else {
            return Err(ComputeError::OperationFailed("source texture missing".into()));
        };
        gpu.render(texture, params)
    }

    /// Releases the session's device resources. Safe to call repeatedly.
    pub fn dispose_session(&mut self, session: &mut PreviewSession) {
        if !session.is_disposed() {
            debug!(session = %session.id(), "Disposing preview session");
        }
        session.mark_disposed();
    }

    // ========================================================================
    // Facade
    // ========================================================================

    /// Statistics of a single image.
    pub fn compute_statistics(&mut self, image: &RasterImage) -> ColorStats {
        let mut session = self.create_session(image.clone());
        let stats = session.stats();
        self.dispose_session(&mut session);
        stats
    }

    /// One-shot render of `image` with a raw adjustment vector.
    pub fn render_image(&mut self, image: &RasterImage, adjustments: &AdjustmentVector) -> RasterImage {
        let mut session = self.create_session(image.clone());
        let out = self.render(&mut session, adjustments);
        self.dispose_session(&mut session);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use lux_core::StatsAccumulator;

    use crate::backend::DeviceImage;

    fn cpu_backend() -> PreviewBackend {
        PreviewBackend::builder().tier(Tier::Cpu).build()
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    /// Which device operation fails.
    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Fault {
        None,
        Upload,
        Stats,
        Render,
    }

    #[derive(Debug)]
    struct HostImage(RasterImage);

    impl DeviceImage for HostImage {
        fn dimensions(&self) -> (u32, u32) {
            self.0.dimensions()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Device that computes on the host and fails on request.
    #[derive(Debug)]
    struct ScriptedDevice {
        fault: Fault,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedDevice {
        fn check(&self, op: Fault) -> ComputeResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fault == op {
                return Err(ComputeError::OperationFailed(format!("{op:?} lost")));
            }
            Ok(())
        }

        fn host<'a>(&self, src: &'a dyn DeviceImage) -> ComputeResult<&'a RasterImage> {
            src.as_any()
                .downcast_ref::<HostImage>()
                .map(|h| &h.0)
                .ok_or_else(|| ComputeError::OperationFailed("foreign image".into()))
        }
    }

    impl PreviewDevice for ScriptedDevice {
        fn name(&self) -> &str {
            "scripted"
        }

        fn supports_statistics(&self) -> bool {
            true
        }

        fn upload(&self, image: &RasterImage) -> ComputeResult<Box<dyn DeviceImage>> {
            self.check(Fault::Upload)?;
            Ok(Box::new(HostImage(image.clone())))
        }

        fn compute_stats(&self, src: &dyn DeviceImage) -> ComputeResult<StatsAccumulator> {
            self.check(Fault::Stats)?;
            Ok(CpuBackend::new(false).compute_stats(self.host(src)?))
        }

        fn render(&self, src: &dyn DeviceImage, params: &AdjustParams) -> ComputeResult<RasterImage> {
            self.check(Fault::Render)?;
            Ok(CpuBackend::new(false).render(self.host(src)?, params))
        }
    }

    fn scripted(fault: Fault) -> (PreviewBackend, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let device = ScriptedDevice { fault, calls: Arc::clone(&calls) };
        let config = PreviewConfig { parallel_cpu: false, ..Default::default() };
        (PreviewBackend::with_device(config, Box::new(device)), calls)
    }

    fn card() -> RasterImage {
        let mut img = RasterImage::new(12, 7);
        for y in 0..7 {
            for x in 0..12 {
                img.set_pixel(x, y, [(x * 20) as u8, (y * 35) as u8, 140, 255]);
            }
        }
        img
    }

    fn warm() -> AdjustmentVector {
        AdjustmentVector::new().with("Light_Master", 0.6).with("Color_Master", 0.4)
    }

    fn serial_cpu() -> PreviewBackend {
        PreviewBackend::builder().tier(Tier::Cpu).parallel_cpu(false).build()
    }

    /// What the CPU tier produces for the same session.
    fn cpu_reference(image: &RasterImage, raw: &AdjustmentVector) -> RasterImage {
        serial_cpu().render_image(image, raw)
    }

    #[derive(Clone, Default)]
    struct LogSink(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Runs `f` with warnings captured; returns the captured text.
    fn capture_warnings(f: impl FnOnce()) -> String {
        let sink = LogSink::default();
        let writer = sink.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = sink.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_env_overrides() {
        let config = PreviewConfig::default().with_env(env(&[
            (ENV_TIER, "CPU"),
            (ENV_GPU_STATS, "0"),
            (ENV_OVERRIDE_MODE, "absolute"),
        ]));
        assert_eq!(config.tier, Some(Tier::Cpu));
        assert!(!config.gpu_statistics);
        assert_eq!(config.override_mode, OverrideMode::Absolute);
    }

    #[test]
    fn test_env_malformed_values_ignored() {
        let config = PreviewConfig::default().with_env(env(&[
            (ENV_TIER, "quantum"),
            (ENV_GPU_STATS, "maybe"),
            (ENV_OVERRIDE_MODE, "sideways"),
        ]));
        assert_eq!(config, PreviewConfig::default());

        let config = PreviewConfig { tier: Some(Tier::Gpu), ..Default::default() }
            .with_env(env(&[(ENV_TIER, "auto")]));
        assert_eq!(config.tier, None);
    }

    #[test]
    fn test_forced_cpu_tier() {
        let backend = cpu_backend();
        assert_eq!(backend.tier(), Tier::Cpu);
        assert!(!backend.statistics_on_gpu());
    }

    #[test]
    fn test_cuda_request_falls_through() {
        let backend = PreviewBackend::builder().tier(Tier::Cuda).gpu_statistics(false).build();
        assert_ne!(backend.tier(), Tier::Cuda);
    }

    #[test]
    fn test_session_ids_increase() {
        let mut backend = cpu_backend();
        let a = backend.create_session(RasterImage::filled(2, 2, [1, 2, 3, 255]));
        let b = backend.create_session(RasterImage::filled(2, 2, [1, 2, 3, 255]));
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut backend = cpu_backend();
        let mut session = backend.create_session(RasterImage::filled(3, 3, [90, 90, 90, 255]));
        backend.dispose_session(&mut session);
        backend.dispose_session(&mut session);
        assert!(session.is_disposed());
        assert!(!session.has_gpu_resources());
        // still renders from the retained image
        let out = backend.render(&mut session, &AdjustmentVector::new().with("Light_Master", 0.5));
        assert!(out.pixel(1, 1)[0] > 90);
    }

    #[test]
    fn test_empty_image_is_neutral() {
        let mut backend = cpu_backend();
        let empty = RasterImage::new(0, 0);
        assert_eq!(backend.compute_statistics(&empty), ColorStats::neutral());
        let out = backend.render_image(&empty, &AdjustmentVector::new().with("Light_Master", 1.0));
        assert!(out.is_empty());
    }

    #[test]
    fn test_identity_vector_returns_source() {
        let mut backend = cpu_backend();
        let image = RasterImage::filled(5, 2, [12, 200, 99, 180]);
        let out = backend.render_image(&image, &AdjustmentVector::new());
        assert_eq!(out, image);
    }

    #[test]
    fn test_healthy_device_serves_gpu_tier() {
        let (mut backend, calls) = scripted(Fault::None);
        assert_eq!(backend.tier(), Tier::Gpu);
        assert!(backend.statistics_on_gpu());

        let image = card();
        let mut session = backend.create_session(image.clone());
        assert!(session.has_gpu_resources());
        let out = backend.render(&mut session, &warm());
        assert_eq!(out, cpu_reference(&image, &warm()));
        assert_eq!(backend.tier(), Tier::Gpu);
        // upload, statistics, render
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_render_failure_falls_back_to_cpu() {
        let (mut backend, _) = scripted(Fault::Render);
        let image = card();
        let mut session = backend.create_session(image.clone());
        assert_eq!(session.tier(), Tier::Gpu);

        let out = backend.render(&mut session, &warm());
        assert_eq!(out, cpu_reference(&image, &warm()));
        assert_eq!(backend.tier(), Tier::Cpu);
        assert_eq!(session.tier(), Tier::Cpu);
        assert!(!session.has_gpu_resources());
        assert!(!backend.statistics_on_gpu());
    }

    #[test]
    fn test_statistics_failure_falls_back_to_cpu() {
        let (mut backend, _) = scripted(Fault::Stats);
        let image = card();
        let session = backend.create_session(image.clone());
        assert_eq!(session.stats(), serial_cpu().compute_statistics(&image));
        assert_eq!(backend.tier(), Tier::Cpu);
        assert!(!session.has_gpu_resources());
    }

    #[test]
    fn test_upload_failure_falls_back_to_cpu() {
        let (mut backend, calls) = scripted(Fault::Upload);
        let image = card();
        let mut session = backend.create_session(image.clone());
        assert_eq!(backend.tier(), Tier::Cpu);
        assert_eq!(session.stats(), serial_cpu().compute_statistics(&image));
        assert_eq!(backend.render(&mut session, &warm()), cpu_reference(&image, &warm()));
        // the device is dropped after the failed upload
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fallback_warned_once_per_session() {
        let logs = capture_warnings(|| {
            let (mut backend, _) = scripted(Fault::Render);
            let mut session = backend.create_session(card());
            for master in [0.2, 0.4, 0.6] {
                let raw = AdjustmentVector::new().with("Light_Master", master);
                let out = backend.render(&mut session, &raw);
                assert_eq!(out.dimensions(), (12, 7));
            }
        });
        assert_eq!(logs.matches("falling back to CPU").count(), 1, "{logs}");
    }

    #[test]
    fn test_tier_report() {
        let backend = cpu_backend();
        let report = backend.probe_report();
        assert_eq!(report.len(), 3);
        assert!(report.contains(&(Tier::Cpu, ProbeOutcome::Selected)));
        assert!(report.contains(&(Tier::Cuda, ProbeOutcome::Skipped)));

        let desc = backend.describe();
        assert!(desc.contains("[+] cpu"));
        assert!(desc.contains("[ ] cuda"));
        assert_eq!(desc.lines().count(), 3);

        let (gpu, _) = scripted(Fault::None);
        assert!(gpu.describe().contains("[+] gpu"));
        assert!(gpu.describe().contains("statistics on gpu"));
    }
}
