//! Master-slider resolvers.
//!
//! Each family has one scalar master slider that expands into a coherent
//! set of per-parameter values:
//!
//! - [`light::resolve_light`] - soft-clipped master through asymmetric
//!   coefficient sets
//! - [`color::resolve_color`] - statistics-aware saturation/vibrance/cast
//! - [`bw::resolve_bw`] - smoothstep intensity plus linear neutrals/tone
//!
//! Users may further override individual parameters. In
//! [`OverrideMode::Delta`] an override is added to the resolved value, in
//! [`OverrideMode::Absolute`] it replaces it. Either way the result is
//! clamped to the parameter's range and keys a family does not own are
//! ignored.
//!
//! [`resolve_adjustments`] is the boundary entry point: it reads master,
//! enable and override keys from a raw [`AdjustmentVector`] and produces a
//! typed [`AdjustParams`].

pub mod bw;
pub mod color;
pub mod light;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use lux_core::ColorStats;
use lux_core::stats::GAIN_RANGE;

use crate::error::AdjustError;
use crate::keys;
use crate::params::{AdjustParams, AdjustmentVector, BwParams, ColorParams, LightParams, ParamFamily};

pub use bw::{bw_curve, resolve_bw};
pub use color::{aggregate_color, resolve_color};
pub use light::{light_base, resolve_light};

/// How per-parameter overrides combine with resolved values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideMode {
    /// Override is added to the resolved value.
    #[default]
    Delta,
    /// Override replaces the resolved value.
    Absolute,
}

impl OverrideMode {
    /// Lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Delta => "delta",
            Self::Absolute => "absolute",
        }
    }
}

impl fmt::Display for OverrideMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OverrideMode {
    type Err = AdjustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delta" => Ok(Self::Delta),
            "absolute" => Ok(Self::Absolute),
            _ => Err(AdjustError::InvalidMode(s.to_string())),
        }
    }
}

/// Applies `overrides` to `family` in place.
///
/// Keys the family does not own and non-numeric values are skipped.
pub fn apply_overrides<F: ParamFamily>(family: &mut F, overrides: &AdjustmentVector, mode: OverrideMode) {
    for (key, value) in overrides.iter() {
        let Some(v) = value.as_f32() else { continue };
        let Some((slot, (lo, hi))) = family.slot_mut(key) else { continue };
        *slot = match mode {
            OverrideMode::Delta => (*slot + v).clamp(lo, hi),
            OverrideMode::Absolute => v.clamp(lo, hi),
        };
    }
}

/// Resolves a raw boundary vector against image statistics.
///
/// Per family:
///
/// - an explicit `*_Enabled = false` resolves to identity;
/// - without an enable key the family is active when its master or any
///   of its parameter keys is present;
/// - the master (default 0) is expanded and the family's parameter keys
///   are applied as overrides in `mode`.
///
/// `BW_Enabled` carries through to [`BwParams::enabled`]. Stored
/// `Color_Gain_*` keys replace the statistics gains. An empty vector
/// resolves to [`AdjustParams::identity`].
pub fn resolve_adjustments(raw: &AdjustmentVector, stats: &ColorStats, mode: OverrideMode) -> AdjustParams {
    let mut params = AdjustParams::identity();

    if family_enabled(raw, keys::LIGHT_ENABLED, keys::LIGHT_MASTER, &keys::LIGHT_KEYS) {
        let master = raw.get_f32(keys::LIGHT_MASTER).unwrap_or(0.0);
        params.light = resolve_light(master, raw, mode);
    }

    if family_enabled(raw, keys::COLOR_ENABLED, keys::COLOR_MASTER, &keys::COLOR_KEYS) {
        let master = raw.get_f32(keys::COLOR_MASTER).unwrap_or(0.0);
        params.color = resolve_color(master, stats, raw, mode);
        for (c, key) in keys::COLOR_GAIN_KEYS.iter().enumerate() {
            if let Some(g) = raw.get_f32(key) {
                params.color.gain[c] = g.clamp(GAIN_RANGE.0, GAIN_RANGE.1);
            }
        }
    }

    if family_enabled(raw, keys::BW_ENABLED, keys::BW_MASTER, &keys::BW_KEYS) {
        let master = raw.get_f32(keys::BW_MASTER).unwrap_or(0.0);
        params.bw = resolve_bw(master, raw, mode);
    }

    trace!(
        light = !params.light.is_identity(),
        color = !params.color.is_identity(),
        bw = params.bw.enabled,
        %mode,
        "Resolved adjustment vector"
    );
    params
}

fn family_enabled(raw: &AdjustmentVector, enabled_key: &str, master_key: &str, param_keys: &[&str]) -> bool {
    match raw.get_bool(enabled_key) {
        Some(enabled) => enabled,
        None => raw.contains(master_key) || raw.contains_any(param_keys),
    }
}

/// Convenience: resolve with default (delta) mode and no statistics.
///
/// Color falls back to [`ColorStats::neutral`].
pub fn resolve_neutral(raw: &AdjustmentVector) -> AdjustParams {
    resolve_adjustments(raw, &ColorStats::neutral(), OverrideMode::Delta)
}

impl LightParams {
    /// Light values for a master slider, no overrides.
    pub fn from_master(master: f32) -> Self {
        light_base(master)
    }
}

impl ColorParams {
    /// Color values for a master slider and statistics, no overrides.
    pub fn from_master(master: f32, stats: &ColorStats) -> Self {
        resolve_color(master, stats, &AdjustmentVector::new(), OverrideMode::Delta)
    }
}

impl BwParams {
    /// Enabled B&W values for a master slider with a grain amount.
    pub fn from_master(master: f32, grain: f32) -> Self {
        let (intensity, neutrals, tone) = bw_curve(master);
        Self {
            enabled: true,
            intensity,
            neutrals,
            tone,
            grain: grain.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("delta".parse::<OverrideMode>().unwrap(), OverrideMode::Delta);
        assert_eq!("Absolute".parse::<OverrideMode>().unwrap(), OverrideMode::Absolute);
        let err = "relative".parse::<OverrideMode>().unwrap_err();
        assert_eq!(err, AdjustError::InvalidMode("relative".into()));
        assert_eq!(OverrideMode::default().to_string(), "delta");
    }

    #[test]
    fn test_empty_vector_is_identity() {
        assert_eq!(resolve_neutral(&AdjustmentVector::new()), AdjustParams::identity());
    }

    #[test]
    fn test_disabled_family_is_identity() {
        let raw = AdjustmentVector::new()
            .with(keys::LIGHT_MASTER, 0.6)
            .with(keys::LIGHT_ENABLED, false)
            .with(keys::EXPOSURE, 0.4);
        assert_eq!(resolve_neutral(&raw), AdjustParams::identity());
    }

    #[test]
    fn test_master_with_delta_override() {
        let raw = AdjustmentVector::new()
            .with(keys::LIGHT_MASTER, 0.25)
            .with(keys::LIGHT_ENABLED, true)
            .with(keys::SHADOWS, 0.15);
        let overrides = AdjustmentVector::new().with(keys::SHADOWS, 0.15);
        let resolved = resolve_neutral(&raw);
        assert_eq!(resolved.light, resolve_light(0.25, &overrides, OverrideMode::Delta));
        assert_abs_diff_eq!(
            resolved.light.shadows,
            light_base(0.25).shadows + 0.15,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let raw = AdjustmentVector::new()
            .with("Crop_U0", 0.1)
            .with("Vignette", 0.5);
        assert_eq!(resolve_neutral(&raw), AdjustParams::identity());
    }

    #[test]
    fn test_bw_enabled_carries_through() {
        let raw = AdjustmentVector::new().with(keys::BW_ENABLED, true).with(keys::BW_MASTER, 1.0);
        let params = resolve_neutral(&raw);
        assert!(params.bw.enabled);
        assert_abs_diff_eq!(params.bw.intensity, 1.0, epsilon = 1e-6);

        let raw = AdjustmentVector::new().with(keys::BW_ENABLED, false).with(keys::BW_MASTER, 1.0);
        assert!(!resolve_neutral(&raw).bw.enabled);
    }

    #[test]
    fn test_stored_gains_replace_statistics() {
        let raw = AdjustmentVector::new()
            .with(keys::COLOR_MASTER, 0.5)
            .with(keys::COLOR_GAIN_R, 1.4)
            .with(keys::COLOR_GAIN_B, 9.0);
        let params = resolve_neutral(&raw);
        assert_eq!(params.color.gain, [1.4, 1.0, 2.5]);
    }

    #[test]
    fn test_absolute_override_replaces() {
        let mut light = light_base(1.0);
        let overrides = AdjustmentVector::new().with(keys::EXPOSURE, -0.3).with(keys::SATURATION, 0.9);
        apply_overrides(&mut light, &overrides, OverrideMode::Absolute);
        assert_eq!(light.exposure, -0.3);
        assert_eq!(light.brightness, light_base(1.0).brightness);
    }

    #[test]
    fn test_from_master_helpers() {
        assert_eq!(LightParams::from_master(0.0), LightParams::identity());
        let bw = BwParams::from_master(0.0, 2.0);
        assert!(bw.enabled);
        assert_eq!(bw.grain, 1.0);
        assert_eq!(bw.intensity, 0.0);
    }
}
