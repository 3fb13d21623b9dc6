//! Error types of the volume build pipeline.
//!
//! Raymarching itself never fails, a missing volume renders as empty space.

use nalgebra::Vector3;
use thiserror::Error;

use crate::texture::{Region, TextureFormat};

/// Slice data is malformed or cannot be decoded
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed slice data: {0}")]
    Malformed(String),

    #[error("slice data truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(String),

    #[error("decompression failed: {0}")]
    Decompression(String),

    #[error("raw slice needs a layout (width, height, sample format)")]
    MissingRawLayout,
}

impl From<image::ImageError> for DecodeError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Decoding(e) => DecodeError::Decompression(e.to_string()),
            image::ImageError::Unsupported(e) => DecodeError::UnsupportedBitDepth(e.to_string()),
            other => DecodeError::Malformed(other.to_string()),
        }
    }
}

/// Decoding of one slice failed
#[derive(Debug, Error)]
pub enum SliceError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("unsupported slice format '{0}'")]
    UnsupportedFormat(String),
}

/// Slices cannot be assembled into a volume
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("inconsistent slice stack: {0}")]
    InconsistentStack(String),

    #[error(
        "slice {index} has geometry {found:?}, stack has {expected:?} (width, height, spacing x, spacing y)"
    )]
    GeometryMismatch {
        index: i32,
        expected: (usize, usize, f32, f32),
        found: (usize, usize, f32, f32),
    },

    #[error("volume build was cancelled")]
    Cancelled,
}

/// Upload into a texture destination failed, previous texture content stays valid
#[derive(Debug, Error, PartialEq)]
pub enum UploadError {
    #[error("destination has dimensions {destination:?}, volume has {volume:?}")]
    DimensionMismatch {
        destination: Option<Vector3<usize>>,
        volume: Vector3<usize>,
    },

    #[error("destination has format {destination:?}, upload needs {requested:?}")]
    FormatMismatch {
        destination: Option<TextureFormat>,
        requested: TextureFormat,
    },

    #[error("region {region:?} does not fit into {dims:?}")]
    RegionOutOfBounds { region: Region, dims: Vector3<usize> },

    #[error("region holds {expected} texels, got {actual} values")]
    DataLength { expected: usize, actual: usize },

    #[error("volume of {voxels} voxels does not fit into memory budget of {budget} bytes")]
    OverBudget { voxels: usize, budget: usize },
}

/// Result of the whole build pipeline
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("slice {index}: {source}")]
    Slice {
        index: i32,
        #[source]
        source: SliceError,
    },

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl BuildError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BuildError::Assembly(AssemblyError::Cancelled))
    }
}

/// Invalid option values
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },

    #[error("{name} must be in <0;1>, got {value}")]
    OutOfUnitRange { name: &'static str, value: f32 },

    #[error("resolution must be non-zero")]
    ZeroResolution,
}
