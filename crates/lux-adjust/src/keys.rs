//! Parameter key names used at the serialization boundary.

#![allow(missing_docs)]

// Light
pub const BRILLIANCE: &str = "Brilliance";
pub const EXPOSURE: &str = "Exposure";
pub const HIGHLIGHTS: &str = "Highlights";
pub const SHADOWS: &str = "Shadows";
pub const BRIGHTNESS: &str = "Brightness";
pub const CONTRAST: &str = "Contrast";
pub const BLACK_POINT: &str = "BlackPoint";
pub const LIGHT_MASTER: &str = "Light_Master";
pub const LIGHT_ENABLED: &str = "Light_Enabled";

// Color
pub const SATURATION: &str = "Saturation";
pub const VIBRANCE: &str = "Vibrance";
pub const CAST: &str = "Cast";
pub const COLOR_GAIN_R: &str = "Color_Gain_R";
pub const COLOR_GAIN_G: &str = "Color_Gain_G";
pub const COLOR_GAIN_B: &str = "Color_Gain_B";
pub const COLOR_MASTER: &str = "Color_Master";
pub const COLOR_ENABLED: &str = "Color_Enabled";

// Black & white
pub const BW_ENABLED: &str = "BW_Enabled";
pub const BW_INTENSITY: &str = "BW_Intensity";
pub const BW_NEUTRALS: &str = "BW_Neutrals";
pub const BW_TONE: &str = "BW_Tone";
pub const BW_GRAIN: &str = "BW_Grain";
pub const BW_MASTER: &str = "BW_Master";

/// Per-parameter Light keys in shader order.
pub const LIGHT_KEYS: [&str; 7] = [BRILLIANCE, EXPOSURE, HIGHLIGHTS, SHADOWS, BRIGHTNESS, CONTRAST, BLACK_POINT];

/// Per-parameter Color keys (gains excluded, they come from statistics).
pub const COLOR_KEYS: [&str; 3] = [SATURATION, VIBRANCE, CAST];

/// White-balance gain keys, R/G/B.
pub const COLOR_GAIN_KEYS: [&str; 3] = [COLOR_GAIN_R, COLOR_GAIN_G, COLOR_GAIN_B];

/// Per-parameter Black & White keys (the enable flag excluded).
pub const BW_KEYS: [&str; 4] = [BW_INTENSITY, BW_NEUTRALS, BW_TONE, BW_GRAIN];
