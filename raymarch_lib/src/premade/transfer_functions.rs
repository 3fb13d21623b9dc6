use crate::{
    color::{self, RGBA},
    transfer_function::ColorRamp,
};

// R G B A -- all channels <0;1>, samples normalized to <0;1>

/// Opaque bone color over dense samples
pub fn skull_tf(sample: f32) -> RGBA {
    if sample > 0.235 {
        color::new(0.89, 0.855, 0.788, 1.0)
    } else {
        color::zero()
    }
}

/// Faint white over anything above noise level
pub fn white_tf(sample: f32) -> RGBA {
    if sample > 0.04 {
        color::mono(1.0, 0.3)
    } else {
        color::zero()
    }
}

/// Opaque white for any non-zero sample
pub fn anything_tf(sample: f32) -> RGBA {
    if sample > 0.0 {
        color::mono(1.0, 1.0)
    } else {
        color::zero()
    }
}

/// Three translucent bands, red over the densest one
pub fn bands_tf(sample: f32) -> RGBA {
    if sample > 0.9 {
        color::new(0.8, 0.0, 0.0, 0.5)
    } else if sample > 0.78 {
        color::new(0.0, 0.7, 0.0, 0.3)
    } else if sample > 0.31 && sample < 0.47 {
        color::new(0.01, 0.01, 0.24, 0.02)
    } else {
        color::zero()
    }
}

/// Skin is faint and warm, bone bright and opaque
pub fn ct_ramp() -> ColorRamp {
    ColorRamp::from_points(
        &[
            (0.0, color::zero()),
            (0.2, color::zero()),
            (0.3, color::new(0.9, 0.6, 0.5, 0.05)),
            (0.45, color::new(0.9, 0.6, 0.5, 0.05)),
            (0.6, color::new(0.95, 0.92, 0.85, 0.6)),
            (1.0, color::new(1.0, 1.0, 1.0, 1.0)),
        ],
        ColorRamp::DEFAULT_RESOLUTION,
    )
}

/// Transfer function by name, used by front ends
pub fn by_name(name: &str) -> Option<fn(f32) -> RGBA> {
    match name {
        "skull" => Some(skull_tf),
        "white" => Some(white_tf),
        "anything" => Some(anything_tf),
        "bands" => Some(bands_tf),
        _ => None,
    }
}
