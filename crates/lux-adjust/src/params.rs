//! Adjustment parameters.
//!
//! Two representations exist:
//!
//! - [`AdjustmentVector`] - string-keyed map used at the serialization
//!   boundary (sidecars, UI bindings, JSON). Holds master sliders, enable
//!   flags and per-parameter values side by side.
//! - [`AdjustParams`] - the resolved, typed vector the pixel transform and
//!   the GPU uniforms consume. One struct per family.
//!
//! Conversion between the two is explicit: [`crate::resolve_adjustments`]
//! expands masters into per-parameter values, while
//! [`AdjustParams::to_vector`] / [`AdjustParams::from_vector`] move an already
//! resolved vector across the boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lux_core::stats::GAIN_RANGE;

use crate::keys;

// ============================================================================
// Boundary map
// ============================================================================

/// Value stored under an adjustment key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdjustValue {
    /// Toggle such as `BW_Enabled`.
    Bool(bool),
    /// Slider value.
    Number(f32),
}

impl AdjustValue {
    /// Numeric view; booleans map to 0/1, non-finite numbers to `None`.
    pub fn as_f32(self) -> Option<f32> {
        match self {
            Self::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
            Self::Number(v) if v.is_finite() => Some(v),
            Self::Number(_) => None,
        }
    }

    /// Boolean view; numbers are truthy when non-zero.
    pub fn as_bool(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Number(v) => v != 0.0,
        }
    }
}

impl From<f32> for AdjustValue {
    fn from(v: f32) -> Self {
        Self::Number(v)
    }
}

impl From<f64> for AdjustValue {
    fn from(v: f64) -> Self {
        Self::Number(v as f32)
    }
}

impl From<bool> for AdjustValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// String-keyed adjustment map.
///
/// Keys are kept sorted so serialized output is stable.
///
/// ```
/// use lux_adjust::AdjustmentVector;
///
/// let v = AdjustmentVector::new()
///     .with("Light_Master", 0.25)
///     .with("Light_Enabled", true);
/// assert_eq!(v.get_f32("Light_Master"), Some(0.25));
/// assert_eq!(v.get_bool("Light_Enabled"), Some(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdjustmentVector {
    values: BTreeMap<String, AdjustValue>,
}

impl AdjustmentVector {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AdjustValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Inserts or replaces a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AdjustValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Removes a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<AdjustValue> {
        self.values.remove(key)
    }

    /// Raw value for a key.
    pub fn get(&self, key: &str) -> Option<AdjustValue> {
        self.values.get(key).copied()
    }

    /// Numeric value for a key (see [`AdjustValue::as_f32`]).
    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(AdjustValue::as_f32)
    }

    /// Boolean value for a key (see [`AdjustValue::as_bool`]).
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).map(AdjustValue::as_bool)
    }

    /// Returns `true` if the key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns `true` if any of `keys` is present.
    pub fn contains_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.contains(k))
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, AdjustValue)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<AdjustValue>> FromIterator<(K, V)> for AdjustmentVector {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (k, v) in iter {
            out.set(k, v);
        }
        out
    }
}

// ============================================================================
// Typed families
// ============================================================================

/// A family of named scalar parameters with fixed ranges.
///
/// Resolvers use this to apply overrides without knowing field names.
pub trait ParamFamily {
    /// Per-parameter keys owned by this family.
    const KEYS: &'static [&'static str];

    /// Mutable slot and its valid range for `key`, or `None` for foreign keys.
    fn slot_mut(&mut self, key: &str) -> Option<(&mut f32, (f32, f32))>;

    /// Current value for `key`.
    fn value(&self, key: &str) -> Option<f32>;
}

/// Light family: tone curve controls, each in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LightParams {
    /// Mid-tone lift.
    pub brilliance: f32,
    /// Global offset, 1.5x weight.
    pub exposure: f32,
    /// Push above 0.65.
    pub highlights: f32,
    /// Push below 0.35.
    pub shadows: f32,
    /// Global offset, 0.75x weight.
    pub brightness: f32,
    /// Slope around 0.5.
    pub contrast: f32,
    /// Black point shift.
    pub black_point: f32,
}

impl LightParams {
    /// Identity (no change).
    pub const fn identity() -> Self {
        Self {
            brilliance: 0.0,
            exposure: 0.0,
            highlights: 0.0,
            shadows: 0.0,
            brightness: 0.0,
            contrast: 0.0,
            black_point: 0.0,
        }
    }

    /// Check if this is identity (no-op).
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Copy with every field clamped to [-1, 1].
    pub fn clamp(mut self) -> Self {
        for key in Self::KEYS {
            if let Some((slot, (lo, hi))) = self.slot_mut(key) {
                *slot = slot.clamp(lo, hi);
            }
        }
        self
    }
}

impl ParamFamily for LightParams {
    const KEYS: &'static [&'static str] = &keys::LIGHT_KEYS;

    fn slot_mut(&mut self, key: &str) -> Option<(&mut f32, (f32, f32))> {
        let slot = match key {
            keys::BRILLIANCE => &mut self.brilliance,
            keys::EXPOSURE => &mut self.exposure,
            keys::HIGHLIGHTS => &mut self.highlights,
            keys::SHADOWS => &mut self.shadows,
            keys::BRIGHTNESS => &mut self.brightness,
            keys::CONTRAST => &mut self.contrast,
            keys::BLACK_POINT => &mut self.black_point,
            _ => return None,
        };
        Some((slot, (-1.0, 1.0)))
    }

    fn value(&self, key: &str) -> Option<f32> {
        Some(match key {
            keys::BRILLIANCE => self.brilliance,
            keys::EXPOSURE => self.exposure,
            keys::HIGHLIGHTS => self.highlights,
            keys::SHADOWS => self.shadows,
            keys::BRIGHTNESS => self.brightness,
            keys::CONTRAST => self.contrast,
            keys::BLACK_POINT => self.black_point,
            _ => return None,
        })
    }
}

/// Color family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorParams {
    /// Chroma scale, [-1, 1].
    pub saturation: f32,
    /// Mid-tone weighted chroma scale, [-1, 1].
    pub vibrance: f32,
    /// White balance mix amount, [0, 1].
    pub cast: f32,
    /// White balance gains applied in proportion to `cast`.
    pub gain: [f32; 3],
}

impl Default for ColorParams {
    fn default() -> Self {
        Self::identity()
    }
}

impl ColorParams {
    /// Identity (no change).
    pub const fn identity() -> Self {
        Self {
            saturation: 0.0,
            vibrance: 0.0,
            cast: 0.0,
            gain: [1.0, 1.0, 1.0],
        }
    }

    /// Check if this is identity (no-op). Gains are irrelevant while `cast` is 0.
    pub fn is_identity(&self) -> bool {
        self.saturation == 0.0 && self.vibrance == 0.0 && self.cast == 0.0
    }

    /// Copy with fields clamped to their ranges.
    pub fn clamp(self) -> Self {
        Self {
            saturation: self.saturation.clamp(-1.0, 1.0),
            vibrance: self.vibrance.clamp(-1.0, 1.0),
            cast: self.cast.clamp(0.0, 1.0),
            gain: self.gain.map(|g| g.clamp(GAIN_RANGE.0, GAIN_RANGE.1)),
        }
    }
}

impl ParamFamily for ColorParams {
    const KEYS: &'static [&'static str] = &keys::COLOR_KEYS;

    fn slot_mut(&mut self, key: &str) -> Option<(&mut f32, (f32, f32))> {
        match key {
            keys::SATURATION => Some((&mut self.saturation, (-1.0, 1.0))),
            keys::VIBRANCE => Some((&mut self.vibrance, (-1.0, 1.0))),
            keys::CAST => Some((&mut self.cast, (0.0, 1.0))),
            _ => None,
        }
    }

    fn value(&self, key: &str) -> Option<f32> {
        match key {
            keys::SATURATION => Some(self.saturation),
            keys::VIBRANCE => Some(self.vibrance),
            keys::CAST => Some(self.cast),
            _ => None,
        }
    }
}

/// Black & white family.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BwParams {
    /// Gates the conversion; everything else is ignored when `false`.
    pub enabled: bool,
    /// Base curve selector: 0 soft, 0.5 neutral, 1 rich.
    pub intensity: f32,
    /// Midtone gamma, [-1, 1].
    pub neutrals: f32,
    /// Logistic contrast, [-1, 1].
    pub tone: f32,
    /// Film grain amount, [0, 1].
    pub grain: f32,
}

impl BwParams {
    /// Disabled conversion.
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            intensity: 0.0,
            neutrals: 0.0,
            tone: 0.0,
            grain: 0.0,
        }
    }

    /// Copy with every field clamped to its slider range.
    pub fn clamp(self) -> Self {
        Self {
            enabled: self.enabled,
            intensity: self.intensity.clamp(0.0, 1.0),
            neutrals: self.neutrals.clamp(-1.0, 1.0),
            tone: self.tone.clamp(-1.0, 1.0),
            grain: self.grain.clamp(0.0, 1.0),
        }
    }
}

impl ParamFamily for BwParams {
    const KEYS: &'static [&'static str] = &keys::BW_KEYS;

    fn slot_mut(&mut self, key: &str) -> Option<(&mut f32, (f32, f32))> {
        match key {
            keys::BW_INTENSITY => Some((&mut self.intensity, (0.0, 1.0))),
            keys::BW_NEUTRALS => Some((&mut self.neutrals, (-1.0, 1.0))),
            keys::BW_TONE => Some((&mut self.tone, (-1.0, 1.0))),
            keys::BW_GRAIN => Some((&mut self.grain, (0.0, 1.0))),
            _ => None,
        }
    }

    fn value(&self, key: &str) -> Option<f32> {
        match key {
            keys::BW_INTENSITY => Some(self.intensity),
            keys::BW_NEUTRALS => Some(self.neutrals),
            keys::BW_TONE => Some(self.tone),
            keys::BW_GRAIN => Some(self.grain),
            _ => None,
        }
    }
}

// ============================================================================
// Resolved vector
// ============================================================================

/// Fully resolved adjustment vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AdjustParams {
    /// Tone curve.
    pub light: LightParams,
    /// Saturation, vibrance and white balance.
    pub color: ColorParams,
    /// Black & white conversion.
    pub bw: BwParams,
}

impl AdjustParams {
    /// All families at identity, B&W disabled.
    pub const fn identity() -> Self {
        Self {
            light: LightParams::identity(),
            color: ColorParams::identity(),
            bw: BwParams::disabled(),
        }
    }

    /// Check if applying these parameters leaves every pixel unchanged.
    pub fn is_identity(&self) -> bool {
        self.light.is_identity() && self.color.is_identity() && !self.bw.enabled
    }

    /// Serializes to a key map with per-parameter keys only.
    ///
    /// Master and Light/Color enable keys never appear; `BW_Enabled` does
    /// because it gates the conversion stage.
    pub fn to_vector(&self) -> AdjustmentVector {
        let mut out = AdjustmentVector::new();
        for key in LightParams::KEYS {
            if let Some(v) = self.light.value(key) {
                out.set(*key, v);
            }
        }
        for key in ColorParams::KEYS {
            if let Some(v) = self.color.value(key) {
                out.set(*key, v);
            }
        }
        for (key, g) in keys::COLOR_GAIN_KEYS.iter().zip(self.color.gain) {
            out.set(*key, g);
        }
        out.set(keys::BW_ENABLED, self.bw.enabled);
        for key in BwParams::KEYS {
            if let Some(v) = self.bw.value(key) {
                out.set(*key, v);
            }
        }
        out
    }

    /// Reads an already resolved map; missing or malformed keys keep identity.
    pub fn from_vector(vector: &AdjustmentVector) -> Self {
        let mut params = Self::identity();
        read_family(&mut params.light, vector);
        read_family(&mut params.color, vector);
        read_family(&mut params.bw, vector);
        for (c, key) in keys::COLOR_GAIN_KEYS.iter().enumerate() {
            if let Some(g) = vector.get_f32(key) {
                params.color.gain[c] = g.clamp(GAIN_RANGE.0, GAIN_RANGE.1);
            }
        }
        params.bw.enabled = vector.get_bool(keys::BW_ENABLED).unwrap_or(false);
        params
    }
}

fn read_family<F: ParamFamily>(family: &mut F, vector: &AdjustmentVector) {
    for key in F::KEYS {
        if let (Some(v), Some((slot, (lo, hi)))) = (vector.get_f32(key), family.slot_mut(key)) {
            *slot = v.clamp(lo, hi);
        }
    }
}
