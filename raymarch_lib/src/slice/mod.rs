//! Decoding of 2D slice images.
//!
//! A slice source hands over [`EncodedSlice`]s (blob, format tag and acquisition metadata),
//! [`SliceDecoder`] turns each of them into a [`Slice`] of intensities.

mod decoder;
pub mod parse;

use std::str::FromStr;

use nalgebra::{vector, Vector2};

use crate::{common::ValueRange, error::SliceError};

pub use decoder::{Endianness, RawLayout, SliceDecoder};

/// Type of samples in the encoded slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    U8,
    I8,
    U16,
    I16,
    F32,
}

impl SampleFormat {
    pub fn bytes(&self) -> usize {
        match self {
            SampleFormat::U8 | SampleFormat::I8 => 1,
            SampleFormat::U16 | SampleFormat::I16 => 2,
            SampleFormat::F32 => 4,
        }
    }

    pub fn bit_depth(&self) -> u32 {
        8 * self.bytes() as u32
    }

    pub fn is_signed(&self) -> bool {
        !matches!(self, SampleFormat::U8 | SampleFormat::U16)
    }

    /// Range representable by the integer type, `None` for floats
    pub fn natural_range(&self) -> Option<ValueRange> {
        match self {
            SampleFormat::U8 => Some(ValueRange::new(0.0, u8::MAX as f32)),
            SampleFormat::I8 => Some(ValueRange::new(i8::MIN as f32, i8::MAX as f32)),
            SampleFormat::U16 => Some(ValueRange::new(0.0, u16::MAX as f32)),
            SampleFormat::I16 => Some(ValueRange::new(i16::MIN as f32, i16::MAX as f32)),
            SampleFormat::F32 => None,
        }
    }
}

/// Encoding of the slice blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceFormat {
    /// Headerless samples, layout is configured on the decoder
    Raw,
    /// PNG image, grayscale or color
    Png,
    /// MetaImage with local data (`.mha`)
    MetaImage,
}

impl FromStr for SliceFormat {
    type Err = SliceError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.to_ascii_lowercase().as_str() {
            "raw" | "bin" => Ok(SliceFormat::Raw),
            "png" => Ok(SliceFormat::Png),
            "mha" | "metaimage" => Ok(SliceFormat::MetaImage),
            _ => Err(SliceError::UnsupportedFormat(tag.to_string())),
        }
    }
}

/// One encoded slice, as provided by the slice source
#[derive(Debug, Clone)]
pub struct EncodedSlice {
    pub blob: Vec<u8>,
    /// Format tag, see [`SliceFormat`]
    pub format: String,
    /// Acquisition index, position of slice in the stack
    pub index: i32,
    /// Physical position of the slice along the stacking axis
    pub position: Option<f32>,
    pub pixel_spacing: Option<Vector2<f32>>,
}

impl EncodedSlice {
    pub fn new(blob: Vec<u8>, format: impl Into<String>, index: i32) -> EncodedSlice {
        EncodedSlice {
            blob,
            format: format.into(),
            index,
            position: None,
            pixel_spacing: None,
        }
    }

    pub fn with_position(mut self, position: f32) -> EncodedSlice {
        self.position = Some(position);
        self
    }

    pub fn with_pixel_spacing(mut self, spacing: Vector2<f32>) -> EncodedSlice {
        self.pixel_spacing = Some(spacing);
        self
    }
}

/// Decoded 2D intensity image.
///
/// Samples are row-major, `x` changes fastest.
/// Slice is immutable once decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    width: usize,
    height: usize,
    data: Vec<f32>,
    pixel_spacing: Vector2<f32>,
    index: i32,
    position: Option<f32>,
    value_range: ValueRange,
    sample_format: SampleFormat,
}

impl Slice {
    /// Construct slice from samples.
    /// Observed value range is computed from `data`.
    ///
    /// # Panics
    ///
    /// If `data` length does not match `width * height`
    pub fn from_samples(
        width: usize,
        height: usize,
        data: Vec<f32>,
        sample_format: SampleFormat,
    ) -> Slice {
        assert_eq!(data.len(), width * height, "slice data length");
        let value_range = ValueRange::from_samples(data.iter().copied());
        Slice {
            width,
            height,
            data,
            pixel_spacing: vector![1.0, 1.0],
            index: 0,
            position: None,
            value_range,
            sample_format,
        }
    }

    /// Set acquisition metadata.
    /// `None` values keep what the slice already has.
    pub fn with_acquisition(
        mut self,
        index: i32,
        position: Option<f32>,
        pixel_spacing: Option<Vector2<f32>>,
    ) -> Slice {
        self.index = index;
        if position.is_some() {
            self.position = position;
        }
        if let Some(spacing) = pixel_spacing {
            self.pixel_spacing = spacing;
        }
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn pixel_spacing(&self) -> Vector2<f32> {
        self.pixel_spacing
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn position(&self) -> Option<f32> {
        self.position
    }

    /// Observed range of source intensities
    pub fn value_range(&self) -> ValueRange {
        self.value_range
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.sample_format
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(x + y * self.width).copied()
    }
}
