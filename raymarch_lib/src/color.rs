//! RGBA colors used by transfer functions and the compositor.
//!
//! All channels live in `<0;1>`. Accumulated colors are premultiplied by opacity.

use nalgebra::{vector, Vector4};

pub type RGBA = Vector4<f32>;

pub fn new(r: f32, g: f32, b: f32, a: f32) -> RGBA {
    vector![r, g, b, a]
}

pub fn zero() -> RGBA {
    vector![0.0, 0.0, 0.0, 0.0]
}

pub fn mono(v: f32, opacity: f32) -> RGBA {
    vector![v, v, v, opacity]
}

/// Convert float channel to byte, clamping to `<0;1>` first
pub fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Linear interpolation between two colors
pub fn lerp(a: &RGBA, b: &RGBA, t: f32) -> RGBA {
    a * (1.0 - t) + b * t
}
