//! Transfer functions map normalized samples to color and opacity.

use crate::{
    color::{self, RGBA},
    common::WindowingParameters,
};

/// Mapping of normalized sample `<0;1>` to RGBA, all channels in `<0;1>`.
///
/// Evaluated concurrently from many rays, must not have side effects.
pub trait TransferFunction: Send + Sync {
    fn evaluate(&self, sample: f32) -> RGBA;
}

impl<F> TransferFunction for F
where
    F: Fn(f32) -> RGBA + Send + Sync,
{
    fn evaluate(&self, sample: f32) -> RGBA {
        self(sample)
    }
}

/// Piecewise linear transfer function, sampled into a lookup table
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    table: Vec<RGBA>,
}

impl ColorRamp {
    pub const DEFAULT_RESOLUTION: usize = 256;

    /// Build table from control points `(position, color)`.
    /// Points get sorted, values outside the first and last point are clamped.
    /// No points give a fully transparent ramp.
    pub fn from_points(points: &[(f32, RGBA)], resolution: usize) -> ColorRamp {
        let resolution = resolution.max(2);
        let mut points = points.to_vec();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let table = (0..resolution)
            .map(|i| {
                let pos = i as f32 / (resolution - 1) as f32;
                ramp_at(&points, pos)
            })
            .collect();

        ColorRamp { table }
    }

    /// Gray ramp, opacity grows with the sample
    pub fn grayscale(max_opacity: f32) -> ColorRamp {
        ColorRamp::from_points(
            &[
                (0.0, color::zero()),
                (1.0, color::mono(1.0, max_opacity)),
            ],
            Self::DEFAULT_RESOLUTION,
        )
    }

    pub fn resolution(&self) -> usize {
        self.table.len()
    }
}

fn ramp_at(points: &[(f32, RGBA)], pos: f32) -> RGBA {
    match points {
        [] => color::zero(),
        [(_, only)] => *only,
        [(first_pos, first), ..] if pos <= *first_pos => *first,
        _ => {
            for pair in points.windows(2) {
                let (p0, c0) = pair[0];
                let (p1, c1) = pair[1];
                if pos <= p1 {
                    let span = p1 - p0;
                    let t = if span > 0.0 { (pos - p0) / span } else { 1.0 };
                    return color::lerp(&c0, &c1, t);
                }
            }
            points[points.len() - 1].1
        }
    }
}

impl TransferFunction for ColorRamp {
    fn evaluate(&self, sample: f32) -> RGBA {
        let last = self.table.len() - 1;
        let pos = sample.clamp(0.0, 1.0) * last as f32;
        let i = pos.floor() as usize;
        if i >= last {
            return self.table[last];
        }
        color::lerp(&self.table[i], &self.table[i + 1], pos - i as f32)
    }
}

/// Transfer function stretched over a window of the normalized range.
///
/// Samples outside the window are clamped to its borders, or become transparent
/// on sides with enabled cutoff.
pub struct Windowed<T> {
    pub window: WindowingParameters,
    pub inner: T,
}

impl<T: TransferFunction> Windowed<T> {
    pub fn new(window: WindowingParameters, inner: T) -> Windowed<T> {
        Windowed { window, inner }
    }
}

impl<T: TransferFunction> TransferFunction for Windowed<T> {
    fn evaluate(&self, sample: f32) -> RGBA {
        match self.window.position(sample) {
            Some(pos) => self.inner.evaluate(pos),
            None => color::zero(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_color(actual: RGBA, expected: RGBA) {
        assert!(
            (actual - expected).abs().max() < 1e-5,
            "actual {actual:?}, expected {expected:?}"
        );
    }

    #[test]
    fn closure_is_transfer_function() {
        let tf = |s: f32| color::mono(s, 1.0);

        assert_color(tf.evaluate(0.25), color::new(0.25, 0.25, 0.25, 1.0));
    }

    #[test]
    fn ramp_interpolates() {
        let ramp = ColorRamp::from_points(
            &[
                (1.0, color::new(1.0, 0.0, 0.0, 1.0)),
                (0.0, color::new(0.0, 0.0, 1.0, 0.0)),
            ],
            5,
        );

        assert_eq!(ramp.resolution(), 5);
        assert_color(ramp.evaluate(0.0), color::new(0.0, 0.0, 1.0, 0.0));
        assert_color(ramp.evaluate(1.0), color::new(1.0, 0.0, 0.0, 1.0));
        assert_color(ramp.evaluate(0.5), color::new(0.5, 0.0, 0.5, 0.5));
        assert_color(ramp.evaluate(0.125), color::new(0.125, 0.0, 0.875, 0.125));
        assert_color(ramp.evaluate(7.0), color::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn ramp_clamps_outside_points() {
        let ramp = ColorRamp::from_points(
            &[
                (0.4, color::mono(0.0, 0.0)),
                (0.6, color::mono(1.0, 1.0)),
            ],
            101,
        );

        assert_color(ramp.evaluate(0.1), color::zero());
        assert_color(ramp.evaluate(0.5), color::mono(0.5, 0.5));
        assert_color(ramp.evaluate(0.9), color::mono(1.0, 1.0));
    }

    #[test]
    fn empty_ramp_transparent() {
        let ramp = ColorRamp::from_points(&[], 16);

        assert_color(ramp.evaluate(0.7), color::zero());
    }

    #[test]
    fn window_cutoffs() {
        let ramp = ColorRamp::grayscale(1.0);
        let window = WindowingParameters::new(0.5, 0.5).with_cutoffs(true, false);
        let tf = Windowed::new(window, ramp);

        assert_color(tf.evaluate(0.1), color::zero());
        assert_color(tf.evaluate(0.5), color::mono(0.5, 0.5));
        assert_color(tf.evaluate(0.95), color::mono(1.0, 1.0));
    }
}
