use super::ValueRange;

/// Window of values of interest, given by its center and width.
///
/// Window can be used for normalization of source intensities (values in source units),
/// or to stretch a transfer function over part of the normalized range (values in `<0;1>`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowingParameters {
    pub center: f32,
    pub width: f32,
    /// Values below the window are invisible, instead of being clamped to the window
    pub low_cutoff: bool,
    /// Values above the window are invisible, instead of being clamped to the window
    pub high_cutoff: bool,
}

impl WindowingParameters {
    pub fn new(center: f32, width: f32) -> WindowingParameters {
        WindowingParameters {
            center,
            width,
            low_cutoff: false,
            high_cutoff: false,
        }
    }

    pub fn from_range(range: &ValueRange) -> WindowingParameters {
        WindowingParameters::new(0.5 * (range.low + range.high), range.width())
    }

    pub fn with_cutoffs(mut self, low_cutoff: bool, high_cutoff: bool) -> WindowingParameters {
        self.low_cutoff = low_cutoff;
        self.high_cutoff = high_cutoff;
        self
    }

    pub fn range(&self) -> ValueRange {
        let half = 0.5 * self.width;
        ValueRange::new(self.center - half, self.center + half)
    }

    /// Position of `value` inside the window, in `<0;1>`.
    ///
    /// `None` if the value falls outside the window on a side with enabled cutoff.
    pub fn position(&self, value: f32) -> Option<f32> {
        let range = self.range();
        if value < range.low && self.low_cutoff {
            return None;
        }
        if value > range.high && self.high_cutoff {
            return None;
        }
        Some(range.normalize(value))
    }
}

impl Default for WindowingParameters {
    fn default() -> Self {
        WindowingParameters::new(0.5, 1.0)
    }
}
