use std::ops::Range;

/// Closed range of sample values, `[low, high]`.
///
/// Used for observed intensity ranges of slices and for normalization windows.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ValueRange {
    /// Lower bound
    pub low: f32,
    /// Upper bound
    pub high: f32,
}

impl ValueRange {
    pub fn new(low: f32, high: f32) -> ValueRange {
        ValueRange { low, high }
    }

    /// Constructs new, empty range.
    pub fn empty() -> ValueRange {
        ValueRange {
            low: f32::NAN,
            high: f32::NAN,
        }
    }

    /// Normalized range, `[0;1]`
    pub fn unit() -> ValueRange {
        ValueRange {
            low: 0.0,
            high: 1.0,
        }
    }

    /// Constructs minimal range, where all samples from an iterator
    /// are inside the range.
    pub fn from_samples<T>(iter: impl IntoIterator<Item = T>) -> ValueRange
    where
        T: Into<f32>,
    {
        let mut range = ValueRange::empty();
        for val in iter {
            range.extend(val.into());
        }
        range
    }

    pub fn is_empty(&self) -> bool {
        self.low.is_nan() || self.high.is_nan()
    }

    /// Extend the range with new value.
    pub fn extend(&mut self, val: f32) {
        if self.is_empty() {
            self.low = val;
            self.high = val;
        }

        if val > self.high {
            self.high = val;
        }

        if val < self.low {
            self.low = val;
        }
    }

    /// Smallest range containing both ranges
    pub fn union(&self, other: &ValueRange) -> ValueRange {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => *other,
            (_, true) => *self,
            _ => ValueRange {
                low: f32::min(self.low, other.low),
                high: f32::max(self.high, other.high),
            },
        }
    }

    /// Check if value is inside the range.
    pub fn contains(&self, val: f32) -> bool {
        self.low <= val && val <= self.high
    }

    pub fn width(&self) -> f32 {
        self.high - self.low
    }

    /// Range of zero width (or empty), nothing can be normalized against it
    pub fn is_degenerate(&self) -> bool {
        self.is_empty() || self.width() <= 0.0
    }

    /// Map `val` from this range into `[0;1]`, clamping values outside.
    /// Degenerate range maps everything to `0.0`.
    pub fn normalize(&self, val: f32) -> f32 {
        if self.is_degenerate() {
            return 0.0;
        }
        ((val - self.low) / self.width()).clamp(0.0, 1.0)
    }

    /// Inverse of [`normalize`](ValueRange::normalize), no clamping
    pub fn denormalize(&self, val: f32) -> f32 {
        val * self.width() + self.low
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self::empty()
    }
}

/// Conversion from standard library type.
/// Unlocks simple syntax:
/// ```
/// # use raymarch_lib::common::ValueRange;
/// let range: ValueRange = (0.0..255.0).into();
/// ```
impl From<Range<f32>> for ValueRange {
    fn from(range: Range<f32>) -> Self {
        ValueRange {
            low: range.start,
            high: range.end,
        }
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn value_range() {
        let values = [0.0, 5.0, 3.0, -2.5];

        let mut range = ValueRange::new(1.0, 1.0);

        assert!(range.contains(1.0));
        assert!(!range.contains(1.2));
        assert!(!range.contains(0.9));

        for val in values {
            range.extend(val);
        }

        assert_eq!(range.low, -2.5);
        assert_eq!(range.high, 5.0);

        assert!(range.contains(4.2));
        assert!(range.contains(-0.5));
        assert!(!range.contains(-12.5));
    }

    #[test]
    fn empty_value_range() {
        let mut range = ValueRange::empty();

        assert!(range.is_empty());
        assert!(!range.contains(2.0));
        assert!(!range.contains(0.0));

        range.extend(2.0);

        assert!(range.contains(2.0));
        assert_eq!(range.low, 2.0);
        assert_eq!(range.high, 2.0);
    }

    #[test]
    fn from_samples() {
        // Samples do not have to be floating point
        let samples = [1u8, 2, 4, 10, 5, 0];

        let range = ValueRange::from_samples(samples);

        assert_eq!(
            range,
            ValueRange {
                low: 0.0,
                high: 10.0
            }
        )
    }

    #[test]
    fn union_with_empty() {
        let a = ValueRange::new(2.0, 4.0);
        let b = ValueRange::new(-1.0, 3.0);

        assert_eq!(a.union(&ValueRange::empty()), a);
        assert_eq!(ValueRange::empty().union(&a), a);
        assert_eq!(a.union(&b), ValueRange::new(-1.0, 4.0));
    }

    #[test]
    fn normalize_clamps() {
        let range = ValueRange::new(0.0, 255.0);

        assert_eq!(range.normalize(0.0), 0.0);
        assert_eq!(range.normalize(255.0), 1.0);
        assert_eq!(range.normalize(300.0), 1.0);
        assert_eq!(range.normalize(-4.0), 0.0);
        assert!((range.normalize(100.0) - 100.0 / 255.0).abs() < f32::EPSILON);
        assert!((range.denormalize(range.normalize(51.0)) - 51.0).abs() < 1e-4);
    }

    #[test]
    fn degenerate_normalizes_to_zero() {
        let range = ValueRange::new(7.0, 7.0);

        assert!(range.is_degenerate());
        assert_eq!(range.normalize(7.0), 0.0);
    }
}
