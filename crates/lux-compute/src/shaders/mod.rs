//! WGSL shader sources for the GPU tier.
//!
//! Both shaders are assembled from a generated constants [`prelude`] and a
//! static body, so thresholds and curve constants come from the same Rust
//! items the CPU backend uses.

#![cfg_attr(not(feature = "wgpu"), allow(dead_code))]

use std::fmt::Write;

use lux_adjust::transform::{
    BRIGHTNESS_SCALE, BRILLIANCE_SCALE, BW_LOGIT_EPSILON, BW_NEUTRALS_SCALE, BW_RICH_STEEPNESS,
    BW_SOFT_GAMMA, BW_TONE_NEGATIVE, BW_TONE_POSITIVE, EXPOSURE_SCALE, GRAIN_AMPLITUDE, GRAIN_PCG,
    HIGHLIGHT_START, SHADOW_START, SPLIT_RANGE,
};
use lux_core::color::{HSV_EPSILON, REC601_LUMA, REC709_LUMA, SRGB_EOTF_BREAK};
use lux_core::stats::{
    DARK_THRESHOLD, HIGHLIGHT_THRESHOLD, HIST_BINS, SKIN_HUE_DEGREES, SKIN_SATURATION,
};

/// Statistics workgroup edge; one workgroup reduces a 16x16 tile.
pub const STATS_TILE: u32 = 16;

/// Float constants shared with the CPU path, in declaration order.
fn float_constants() -> Vec<(&'static str, f32)> {
    vec![
        ("HSV_EPSILON", HSV_EPSILON),
        ("SRGB_EOTF_BREAK", SRGB_EOTF_BREAK),
        ("REC709_LUMA_R", REC709_LUMA[0]),
        ("REC709_LUMA_G", REC709_LUMA[1]),
        ("REC709_LUMA_B", REC709_LUMA[2]),
        ("REC601_LUMA_R", REC601_LUMA[0]),
        ("REC601_LUMA_G", REC601_LUMA[1]),
        ("REC601_LUMA_B", REC601_LUMA[2]),
        ("HIGHLIGHT_THRESHOLD", HIGHLIGHT_THRESHOLD),
        ("DARK_THRESHOLD", DARK_THRESHOLD),
        ("SKIN_HUE_MIN", SKIN_HUE_DEGREES.0),
        ("SKIN_HUE_MAX", SKIN_HUE_DEGREES.1),
        ("SKIN_SAT_MIN", SKIN_SATURATION.0),
        ("SKIN_SAT_MAX", SKIN_SATURATION.1),
        ("EXPOSURE_SCALE", EXPOSURE_SCALE),
        ("BRIGHTNESS_SCALE", BRIGHTNESS_SCALE),
        ("BRILLIANCE_SCALE", BRILLIANCE_SCALE),
        ("HIGHLIGHT_START", HIGHLIGHT_START),
        ("SHADOW_START", SHADOW_START),
        ("SPLIT_RANGE", SPLIT_RANGE),
        ("BW_SOFT_GAMMA", BW_SOFT_GAMMA),
        ("BW_RICH_STEEPNESS", BW_RICH_STEEPNESS),
        ("BW_NEUTRALS_SCALE", BW_NEUTRALS_SCALE),
        ("BW_TONE_POSITIVE", BW_TONE_POSITIVE),
        ("BW_TONE_NEGATIVE", BW_TONE_NEGATIVE),
        ("BW_LOGIT_EPSILON", BW_LOGIT_EPSILON),
        ("GRAIN_AMPLITUDE", GRAIN_AMPLITUDE),
    ]
}

/// Generated `const` declarations shared by both shaders.
///
/// Floats use `{:?}` formatting, which always yields a valid WGSL float
/// literal (`4.0`, `0.0001`, `1e-8`).
pub fn prelude() -> String {
    let mut out = String::from("// generated constants\n");
    let _ = writeln!(out, "const HIST_BINS: u32 = {}u;", HIST_BINS);
    let _ = writeln!(out, "const TILE: u32 = {}u;", STATS_TILE);
    let _ = writeln!(out, "const GRAIN_PCG_MUL: u32 = {}u;", GRAIN_PCG[0]);
    let _ = writeln!(out, "const GRAIN_PCG_INC: u32 = {}u;", GRAIN_PCG[1]);
    let _ = writeln!(out, "const GRAIN_PCG_OUT: u32 = {}u;", GRAIN_PCG[2]);
    for (name, value) in float_constants() {
        let _ = writeln!(out, "const {name}: f32 = {value:?};");
    }
    out
}

/// HSV conversion and sRGB decode, same branch structure as
/// `lux_core::color`.
const COLOR_FUNCTIONS: &str = r#"
fn rgb_to_hsv(c: vec3<f32>) -> vec3<f32> {
    let mx = max(c.r, max(c.g, c.b));
    let mn = min(c.r, min(c.g, c.b));
    let delta = mx - mn;

    var s = 0.0;
    if mx > HSV_EPSILON {
        s = delta / mx;
    }

    var h = 0.0;
    if delta > HSV_EPSILON {
        if mx == c.r {
            h = (c.g - c.b) / delta;
        } else if mx == c.g {
            h = (c.b - c.r) / delta + 2.0;
        } else {
            h = (c.r - c.g) / delta + 4.0;
        }
        if h < 0.0 {
            h = h + 6.0;
        }
        h = h / 6.0;
    }
    return vec3<f32>(h, s, mx);
}

fn srgb_eotf(v: f32) -> f32 {
    if v <= SRGB_EOTF_BREAK {
        return v / 12.92;
    }
    return pow((v + 0.055) / 1.055, 2.4);
}
"#;

/// Per-tile statistics reduction.
///
/// Each 16x16 workgroup loads its pixels, tree-reduces saturation and
/// linear channel sums in shared memory and counts classifications and
/// histogram bins with workgroup atomics. The host merges tiles.
const STATS_BODY: &str = r#"
struct TileStats {
    sum_s: f32,
    sum_lin: array<f32, 3>,
    count: u32,
    highlights: u32,
    darks: u32,
    skin: u32,
    hist: array<u32, 64>,
}

@group(0) @binding(0) var src: texture_2d<f32>;
@group(0) @binding(1) var<storage, read_write> tiles: array<TileStats>;

var<workgroup> partial: array<vec4<f32>, 256>;
var<workgroup> wg_count: atomic<u32>;
var<workgroup> wg_high: atomic<u32>;
var<workgroup> wg_dark: atomic<u32>;
var<workgroup> wg_skin: atomic<u32>;
var<workgroup> wg_hist: array<atomic<u32>, 64>;

@compute @workgroup_size(16, 16, 1)
fn main(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(local_invocation_index) lid: u32,
    @builtin(workgroup_id) wid: vec3<u32>,
    @builtin(num_workgroups) nwg: vec3<u32>,
) {
    if lid == 0u {
        atomicStore(&wg_count, 0u);
        atomicStore(&wg_high, 0u);
        atomicStore(&wg_dark, 0u);
        atomicStore(&wg_skin, 0u);
    }
    if lid < HIST_BINS {
        atomicStore(&wg_hist[lid], 0u);
    }
    workgroupBarrier();

    let dims = textureDimensions(src);
    var acc = vec4<f32>(0.0);
    if gid.x < dims.x && gid.y < dims.y {
        let px = textureLoad(src, vec2<i32>(gid.xy), 0);
        if px.a > 0.0 {
            let hsv = rgb_to_hsv(px.rgb);
            acc = vec4<f32>(hsv.y, srgb_eotf(px.r), srgb_eotf(px.g), srgb_eotf(px.b));
            atomicAdd(&wg_count, 1u);
            if hsv.z > HIGHLIGHT_THRESHOLD {
                atomicAdd(&wg_high, 1u);
            }
            if hsv.z < DARK_THRESHOLD {
                atomicAdd(&wg_dark, 1u);
            }
            let deg = hsv.x * 360.0;
            if deg > SKIN_HUE_MIN && deg < SKIN_HUE_MAX && hsv.y > SKIN_SAT_MIN && hsv.y < SKIN_SAT_MAX {
                atomicAdd(&wg_skin, 1u);
            }
            let last = f32(HIST_BINS - 1u);
            let bin = u32(clamp(floor(hsv.y * f32(HIST_BINS)), 0.0, last));
            atomicAdd(&wg_hist[bin], 1u);
        }
    }
    partial[lid] = acc;
    workgroupBarrier();

    for (var stride = 128u; stride > 0u; stride = stride >> 1u) {
        if lid < stride {
            partial[lid] = partial[lid] + partial[lid + stride];
        }
        workgroupBarrier();
    }

    let tile = wid.y * nwg.x + wid.x;
    if lid == 0u {
        let total = partial[0];
        tiles[tile].sum_s = total.x;
        tiles[tile].sum_lin = array<f32, 3>(total.y, total.z, total.w);
        tiles[tile].count = atomicLoad(&wg_count);
        tiles[tile].highlights = atomicLoad(&wg_high);
        tiles[tile].darks = atomicLoad(&wg_dark);
        tiles[tile].skin = atomicLoad(&wg_skin);
    }
    if lid < HIST_BINS {
        tiles[tile].hist[lid] = atomicLoad(&wg_hist[lid]);
    }
}
"#;

/// Fullscreen-triangle render of the adjustment chain.
///
/// The fragment stage reads the source texel under the pixel and runs
/// tone, color and (optionally) black & white, mirroring
/// `lux_adjust::transform`. Grain is seeded by the integer pixel position.
const RENDER_BODY: &str = r#"
struct Params {
    light0: vec4<f32>,  // brilliance, exposure, highlights, shadows
    light1: vec4<f32>,  // brightness, contrast, black_point, saturation
    color: vec4<f32>,   // vibrance, cast, bw_enabled, bw_intensity
    gain: vec4<f32>,    // r, g, b, _
    bw: vec4<f32>,      // neutrals, tone, grain, _
}

@group(0) @binding(0) var src: texture_2d<f32>;
@group(0) @binding(1) var<uniform> params: Params;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vi: u32) -> VsOut {
    let x = f32(i32(vi & 1u) * 4 - 1);
    let y = f32(i32(vi >> 1u) * 4 - 1);
    var out: VsOut;
    out.pos = vec4<f32>(x, y, 0.0, 1.0);
    return out;
}

fn apply_channel(value: f32) -> f32 {
    let brilliance = params.light0.x;
    let exposure = params.light0.y;
    let highlights = params.light0.z;
    let shadows = params.light0.w;
    let brightness = params.light1.x;
    let contrast = params.light1.y;
    let black_point = params.light1.z;

    var adjusted = value + EXPOSURE_SCALE * exposure + BRIGHTNESS_SCALE * brightness;
    let centered = 2.0 * (value - 0.5);
    adjusted = adjusted + BRILLIANCE_SCALE * brilliance * (1.0 - centered * centered);

    if adjusted > HIGHLIGHT_START {
        let ratio = (adjusted - HIGHLIGHT_START) / (1.0 - HIGHLIGHT_START);
        adjusted = adjusted + highlights * ratio * SPLIT_RANGE;
    }
    if adjusted < SHADOW_START {
        let ratio = (SHADOW_START - adjusted) / SHADOW_START;
        adjusted = adjusted + shadows * ratio * SPLIT_RANGE;
    }

    adjusted = (adjusted - 0.5) * (1.0 + contrast) + 0.5;

    if black_point > 0.0 {
        adjusted = adjusted - black_point * (1.0 - adjusted);
    } else {
        adjusted = adjusted - black_point * adjusted;
    }
    return clamp(adjusted, 0.0, 1.0);
}

fn apply_color(rgb_in: vec3<f32>) -> vec3<f32> {
    let cast_amount = params.color.y;
    let rgb = rgb_in * ((1.0 - cast_amount) + params.gain.rgb * cast_amount);
    let luma = dot(rgb, vec3<f32>(REC601_LUMA_R, REC601_LUMA_G, REC601_LUMA_B));
    let weight = 1.0 - clamp(abs(luma - 0.5) * 2.0, 0.0, 1.0);
    let scale = (1.0 + params.light1.w) * (1.0 + params.color.x * weight);
    return clamp(vec3<f32>(luma) + (rgb - vec3<f32>(luma)) * scale, vec3<f32>(0.0), vec3<f32>(1.0));
}

fn logistic(x: f32, k: f32) -> f32 {
    return 1.0 / (1.0 + exp(-k * (x - 0.5)));
}

fn rich_curve(x: f32) -> f32 {
    let lo = logistic(0.0, BW_RICH_STEEPNESS);
    let hi = logistic(1.0, BW_RICH_STEEPNESS);
    return (logistic(x, BW_RICH_STEEPNESS) - lo) / (hi - lo);
}

fn bw_base_curve(luma: f32, intensity: f32) -> f32 {
    let l = clamp(luma, 0.0, 1.0);
    let i = clamp(intensity, 0.0, 1.0);
    if i >= 0.5 {
        return mix(l, rich_curve(l), (i - 0.5) * 2.0);
    }
    return mix(pow(l, BW_SOFT_GAMMA), l, i * 2.0);
}

fn bw_tone(x: f32, tone: f32) -> f32 {
    if tone == 0.0 {
        return clamp(x, 0.0, 1.0);
    }
    var k = 1.0 + BW_TONE_NEGATIVE * tone;
    if tone >= 0.0 {
        k = 1.0 + BW_TONE_POSITIVE * tone;
    }
    let xc = clamp(x, BW_LOGIT_EPSILON, 1.0 - BW_LOGIT_EPSILON);
    let logit = log(xc / (1.0 - xc));
    return clamp(1.0 / (1.0 + exp(-logit * k)), 0.0, 1.0);
}

fn pcg_hash(v: u32) -> u32 {
    let state = v * GRAIN_PCG_MUL + GRAIN_PCG_INC;
    let word = ((state >> ((state >> 28u) + 4u)) ^ state) * GRAIN_PCG_OUT;
    return (word >> 22u) ^ word;
}

fn grain_noise(coord: vec2<u32>, grain: f32) -> f32 {
    if grain <= 0.0 {
        return 0.0;
    }
    let h = pcg_hash(coord.x + pcg_hash(coord.y));
    let n = f32(h >> 8u) / 16777216.0;
    return (n - 0.5) * GRAIN_AMPLITUDE * grain;
}

fn apply_bw(rgb: vec3<f32>, coord: vec2<u32>) -> vec3<f32> {
    let luma = dot(rgb, vec3<f32>(REC709_LUMA_R, REC709_LUMA_G, REC709_LUMA_B));
    var gray = bw_base_curve(luma, params.color.w);
    gray = pow(clamp(gray, 0.0, 1.0), exp2(-BW_NEUTRALS_SCALE * params.bw.x));
    gray = bw_tone(gray, params.bw.y);
    gray = clamp(gray + grain_noise(coord, params.bw.z), 0.0, 1.0);
    return vec3<f32>(gray);
}

@fragment
fn fs_main(@builtin(position) pos: vec4<f32>) -> @location(0) vec4<f32> {
    let pixel = vec2<u32>(floor(pos.xy));
    let texel = textureLoad(src, pixel, 0);
    var rgb = vec3<f32>(
        apply_channel(texel.r),
        apply_channel(texel.g),
        apply_channel(texel.b),
    );
    rgb = apply_color(rgb);
    if params.color.z > 0.5 {
        rgb = apply_bw(rgb, pixel);
    }
    return vec4<f32>(rgb, texel.a);
}
"#;

/// Full statistics compute shader (entry point `main`).
pub fn stats_shader() -> String {
    format!("{}{}{}", prelude(), COLOR_FUNCTIONS, STATS_BODY)
}

/// Full render shader (entry points `vs_main` and `fs_main`).
pub fn render_shader() -> String {
    format!("{}{}", prelude(), RENDER_BODY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{RenderUniform, TileStats};

    fn compile(src: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(src).expect("WGSL parse failed");
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .expect("WGSL validation failed");
        module
    }

    fn struct_span(module: &naga::Module, name: &str) -> u32 {
        module
            .types
            .iter()
            .find_map(|(_, ty)| match (&ty.name, &ty.inner) {
                (Some(n), naga::TypeInner::Struct { span, .. }) if n == name => Some(*span),
                _ => None,
            })
            .unwrap_or_else(|| panic!("struct {name} not found"))
    }

    #[test]
    fn test_stats_shader_validates() {
        compile(&stats_shader());
    }

    #[test]
    fn test_render_shader_validates() {
        compile(&render_shader());
    }

    #[test]
    fn test_tile_layout_matches_host() {
        let module = compile(&stats_shader());
        assert_eq!(struct_span(&module, "TileStats") as usize, std::mem::size_of::<TileStats>());
    }

    #[test]
    fn test_params_layout_matches_host() {
        let module = compile(&render_shader());
        assert_eq!(struct_span(&module, "Params") as usize, std::mem::size_of::<RenderUniform>());
    }

    #[test]
    fn test_prelude_carries_constants() {
        let p = prelude();
        assert!(p.contains("const HIST_BINS: u32 = 64u;"));
        assert!(p.contains("const HIGHLIGHT_THRESHOLD: f32 = 0.9;"));
        assert!(p.contains("const BW_RICH_STEEPNESS: f32 = 4.0;"));
        assert!(p.contains("const HSV_EPSILON: f32 = 1e-8;"));
        assert!(p.contains("const GRAIN_PCG_INC: u32 = 2891336453u;"));
        assert_eq!(p.lines().filter(|l| l.starts_with("const ")).count(), float_constants().len() + 5);
    }

    #[test]
    fn test_grain_uses_integer_hash() {
        let src = render_shader();
        assert!(src.contains("fn pcg_hash(v: u32) -> u32"));
        assert!(src.contains("fn grain_noise(coord: vec2<u32>"));
        assert!(!src.contains("sin("));
    }

    #[test]
    fn test_workgroup_matches_tile() {
        assert!(STATS_BODY.contains("@workgroup_size(16, 16, 1)"));
        assert_eq!(STATS_TILE * STATS_TILE, 256);
    }
}
