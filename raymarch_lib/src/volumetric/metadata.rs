use nalgebra::{point, Point3, Vector3};

use crate::{
    common::{OrientedBox, ValueRange},
    error::AssemblyError,
};

/// Placement of the volume in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateConvention {
    /// World position of the lower corner of the volume
    pub origin: Point3<f32>,
    /// Slices were packed in reverse acquisition order, so that world z grows with slice position
    pub reversed_z: bool,
}

impl Default for CoordinateConvention {
    fn default() -> Self {
        CoordinateConvention {
            origin: point![0.0, 0.0, 0.0],
            reversed_z: false,
        }
    }
}

/// Description of the assembled volume.
///
/// All dims are non-zero, all spacings positive and finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeMetadata {
    /// Voxel counts `(nx, ny, nz)`
    pub dims: Vector3<usize>,
    /// Physical size of one voxel
    pub spacing: Vector3<f32>,
    /// Source values mapped onto `<0;1>`
    pub value_window: ValueRange,
    pub convention: CoordinateConvention,
}

impl VolumeMetadata {
    pub fn new(
        dims: Vector3<usize>,
        spacing: Vector3<f32>,
        value_window: ValueRange,
    ) -> Result<VolumeMetadata, AssemblyError> {
        if dims.iter().any(|&d| d == 0) {
            return Err(AssemblyError::InconsistentStack(format!(
                "volume dimensions {dims:?} must be non-zero"
            )));
        }
        if spacing.iter().any(|&s| !s.is_finite() || s <= 0.0) {
            return Err(AssemblyError::InconsistentStack(format!(
                "voxel spacing {spacing:?} must be positive"
            )));
        }
        Ok(VolumeMetadata {
            dims,
            spacing,
            value_window,
            convention: CoordinateConvention::default(),
        })
    }

    pub fn with_convention(mut self, convention: CoordinateConvention) -> VolumeMetadata {
        self.convention = convention;
        self
    }

    pub fn voxel_count(&self) -> usize {
        self.dims.x * self.dims.y * self.dims.z
    }

    /// Physical extent of the volume, `dims * spacing`
    pub fn world_dims(&self) -> Vector3<f32> {
        self.dims.map(|d| d as f32).component_mul(&self.spacing)
    }

    /// Box occupied by the volume in world space
    pub fn bounding_box(&self) -> OrientedBox {
        let lower = self.convention.origin;
        OrientedBox::axis_aligned(lower, lower + self.world_dims())
    }

    /// Source value to `<0;1>`
    pub fn normalize_value(&self, value: f32) -> f32 {
        self.value_window.normalize(value)
    }

    /// Normalized value back to source units
    pub fn denormalize_value(&self, value: f32) -> f32 {
        self.value_window.denormalize(value)
    }

    pub fn normalize_range(&self, range: &ValueRange) -> ValueRange {
        ValueRange::new(
            self.normalize_value(range.low),
            self.normalize_value(range.high),
        )
    }

    pub fn denormalize_range(&self, range: &ValueRange) -> ValueRange {
        ValueRange::new(
            self.denormalize_value(range.low),
            self.denormalize_value(range.high),
        )
    }
}
