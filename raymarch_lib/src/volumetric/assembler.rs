use log::{debug, info, warn};
use nalgebra::{point, vector, Point3};

use crate::{
    common::{CancelToken, ValueRange, WindowingParameters},
    error::AssemblyError,
    slice::Slice,
};

use super::{CoordinateConvention, PackedVolume, VolumeMetadata};

/// Relative tolerance when comparing pixel spacings of slices
const SPACING_TOLERANCE: f32 = 1e-4;

/// Used when neither explicit spacing nor slice positions are available
pub const DEFAULT_Z_SPACING: f32 = 1.0;

/// Gap tolerant stacks may span at most this many indices per present slice
pub const MAX_SPAN_PER_SLICE: usize = 4;

/// How source intensities get mapped onto `<0;1>`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Normalization {
    /// Observed minimum and maximum over the whole stack
    #[default]
    GlobalMinMax,
    /// Fixed source range
    Fixed(ValueRange),
    /// Source window, for example from the acquisition device
    Window(WindowingParameters),
}

#[derive(Debug, Clone, Default)]
pub struct AssemblyOptions {
    pub normalization: Normalization,
    /// Distance between slices, overrides positions of slices
    pub z_spacing: Option<f32>,
    /// Missing indices are interpolated from neighbours instead of failing the build
    pub gap_tolerant: bool,
    /// World position of the lower volume corner, zero by default
    pub origin: Option<Point3<f32>>,
    pub cancel: Option<CancelToken>,
}

impl AssemblyOptions {
    pub fn with_normalization(mut self, normalization: Normalization) -> AssemblyOptions {
        self.normalization = normalization;
        self
    }

    pub fn with_z_spacing(mut self, spacing: f32) -> AssemblyOptions {
        self.z_spacing = Some(spacing);
        self
    }

    pub fn gap_tolerant(mut self, tolerant: bool) -> AssemblyOptions {
        self.gap_tolerant = tolerant;
        self
    }

    pub fn with_origin(mut self, origin: Point3<f32>) -> AssemblyOptions {
        self.origin = Some(origin);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> AssemblyOptions {
        self.cancel = Some(token);
        self
    }
}

/// Builds [`PackedVolume`] from a stack of decoded slices
#[derive(Debug, Clone, Default)]
pub struct VolumeAssembler {
    options: AssemblyOptions,
}

/// Geometry shared by all slices: width, height, spacing x, spacing y
type Geometry = (usize, usize, f32, f32);

fn geometry(slice: &Slice) -> Geometry {
    let spacing = slice.pixel_spacing();
    (slice.width(), slice.height(), spacing.x, spacing.y)
}

fn spacing_matches(a: f32, b: f32) -> bool {
    (a - b).abs() <= SPACING_TOLERANCE * f32::max(a.abs(), b.abs())
}

impl VolumeAssembler {
    pub fn new(options: AssemblyOptions) -> VolumeAssembler {
        VolumeAssembler { options }
    }

    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    fn is_cancelled(&self) -> bool {
        self.options
            .cancel
            .as_ref()
            .map_or(false, CancelToken::is_cancelled)
    }

    /// Validate, order, normalize and pack slices into a volume.
    ///
    /// Either the whole volume is produced, or nothing.
    pub fn assemble(&self, mut slices: Vec<Slice>) -> Result<PackedVolume, AssemblyError> {
        if slices.is_empty() {
            return Err(AssemblyError::InconsistentStack("no slices".into()));
        }

        slices.sort_by_key(Slice::index);
        self.check_indices(&slices)?;
        let (width, height, spacing_x, spacing_y) = check_geometry(&slices)?;

        let first_index = slices[0].index();
        let last_index = slices[slices.len() - 1].index();
        let depth = index_span(first_index, last_index) + 1;
        if depth > slices.len().saturating_mul(MAX_SPAN_PER_SLICE) {
            return Err(AssemblyError::InconsistentStack(format!(
                "indices {first_index}..={last_index} span too many gaps for {} slices",
                slices.len()
            )));
        }

        debug!(
            "Assembling {} slices {width}x{height}, indices {first_index}..={last_index}",
            slices.len()
        );

        width
            .checked_mul(height)
            .and_then(|plane| plane.checked_mul(depth))
            .ok_or_else(|| {
                AssemblyError::InconsistentStack(format!(
                    "volume {width}x{height}x{depth} is too large"
                ))
            })?;

        let z_spacing = self.z_spacing(&slices)?;
        let reversed_z = positions_decrease(&slices);
        if reversed_z {
            debug!("Slice positions decrease with index, packing in reverse");
        }

        let window = self.value_window(&slices);
        debug!("Normalizing source values {window:?}");

        let metadata = VolumeMetadata::new(
            vector![width, height, depth],
            vector![spacing_x, spacing_y, z_spacing],
            window,
        )?
        .with_convention(CoordinateConvention {
            origin: self.options.origin.unwrap_or_else(|| point![0.0, 0.0, 0.0]),
            reversed_z,
        });

        // slot of every grid index, None for gaps
        let mut grid: Vec<Option<&Slice>> = vec![None; depth];
        for slice in &slices {
            grid[index_span(first_index, slice.index())] = Some(slice);
        }

        let plane = width * height;
        let mut data = vec![0.0; metadata.voxel_count()];

        for grid_z in 0..depth {
            if self.is_cancelled() {
                debug!("Assembly cancelled at slice {grid_z}");
                return Err(AssemblyError::Cancelled);
            }

            let z = if reversed_z { depth - 1 - grid_z } else { grid_z };
            let dest = &mut data[z * plane..(z + 1) * plane];

            match grid[grid_z] {
                Some(slice) => {
                    for (d, &v) in dest.iter_mut().zip(slice.data()) {
                        *d = window.normalize(v);
                    }
                }
                None => {
                    let (below, above) = neighbours(&grid, grid_z);
                    let t = (grid_z - below) as f32 / (above - below) as f32;
                    let (low, high) = match (grid[below], grid[above]) {
                        (Some(low), Some(high)) => (low, high),
                        _ => {
                            return Err(AssemblyError::InconsistentStack(
                                "gap without neighbours".into(),
                            ))
                        }
                    };
                    for ((d, &a), &b) in dest.iter_mut().zip(low.data()).zip(high.data()) {
                        let a = window.normalize(a);
                        let b = window.normalize(b);
                        *d = a + (b - a) * t;
                    }
                }
            }
        }

        info!(
            "Assembled volume {:?}, spacing {:?}",
            metadata.dims, metadata.spacing
        );

        PackedVolume::new(metadata, data)
    }

    fn check_indices(&self, sorted: &[Slice]) -> Result<(), AssemblyError> {
        for pair in sorted.windows(2) {
            let (a, b) = (pair[0].index(), pair[1].index());
            if a == b {
                return Err(AssemblyError::InconsistentStack(format!(
                    "duplicate slice index {a}"
                )));
            }
            if index_span(a, b) > 1 {
                let (first, last) = (i64::from(a) + 1, i64::from(b) - 1);
                if !self.options.gap_tolerant {
                    return Err(AssemblyError::InconsistentStack(format!(
                        "missing slice indices {first}..={last}"
                    )));
                }
                warn!("Slices {first}..={last} missing, interpolating");
            }
        }
        Ok(())
    }

    fn z_spacing(&self, sorted: &[Slice]) -> Result<f32, AssemblyError> {
        if let Some(spacing) = self.options.z_spacing {
            if !spacing.is_finite() || spacing <= 0.0 {
                return Err(AssemblyError::InconsistentStack(format!(
                    "z spacing {spacing} must be positive"
                )));
            }
            return Ok(spacing);
        }

        match spacing_from_positions(sorted) {
            Some(spacing) => Ok(spacing),
            None => {
                warn!("Slice spacing unknown, using {DEFAULT_Z_SPACING}");
                Ok(DEFAULT_Z_SPACING)
            }
        }
    }

    fn value_window(&self, slices: &[Slice]) -> ValueRange {
        match self.options.normalization {
            Normalization::GlobalMinMax => slices
                .iter()
                .fold(ValueRange::empty(), |acc, s| acc.union(&s.value_range())),
            Normalization::Fixed(range) => range,
            Normalization::Window(window) => window.range(),
        }
    }
}

fn check_geometry(slices: &[Slice]) -> Result<Geometry, AssemblyError> {
    let expected = geometry(&slices[0]);
    for slice in &slices[1..] {
        let found = geometry(slice);
        let same = found.0 == expected.0
            && found.1 == expected.1
            && spacing_matches(found.2, expected.2)
            && spacing_matches(found.3, expected.3);
        if !same {
            return Err(AssemblyError::GeometryMismatch {
                index: slice.index(),
                expected,
                found,
            });
        }
    }
    Ok(expected)
}

/// Mean distance between neighbouring slices, per one index step
fn spacing_from_positions(sorted: &[Slice]) -> Option<f32> {
    let steps: Vec<f32> = sorted
        .windows(2)
        .filter_map(|pair| {
            let a = pair[0].position()?;
            let b = pair[1].position()?;
            let index_step = index_span(pair[0].index(), pair[1].index()) as f32;
            Some((b - a).abs() / index_step)
        })
        .collect();

    if steps.is_empty() {
        return None;
    }

    let mean = steps.iter().sum::<f32>() / steps.len() as f32;
    if mean.is_finite() && mean > 0.0 {
        Some(mean)
    } else {
        None
    }
}

/// Number of index steps from `low` to `high`, `low <= high`
fn index_span(low: i32, high: i32) -> usize {
    (i64::from(high) - i64::from(low)) as usize
}

/// Positions go down as the index goes up
fn positions_decrease(sorted: &[Slice]) -> bool {
    let mut positions = sorted.iter().filter_map(Slice::position);
    match (positions.next(), positions.last()) {
        (Some(first), Some(last)) => last < first,
        _ => false,
    }
}

/// Closest present grid slots below and above a gap
fn neighbours(grid: &[Option<&Slice>], z: usize) -> (usize, usize) {
    let below = (0..z).rev().find(|&i| grid[i].is_some()).unwrap_or(0);
    let above = (z + 1..grid.len())
        .find(|&i| grid[i].is_some())
        .unwrap_or(grid.len() - 1);
    (below, above)
}
