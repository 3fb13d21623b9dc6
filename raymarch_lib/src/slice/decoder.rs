use byteorder::{BigEndian, ByteOrder, LittleEndian};
use image::{DynamicImage, ImageFormat};
use nalgebra::vector;

use crate::error::{DecodeError, SliceError};

use super::{parse, EncodedSlice, SampleFormat, Slice, SliceFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

/// Layout of headerless (raw) slices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLayout {
    pub width: usize,
    pub height: usize,
    pub sample_format: SampleFormat,
    pub endianness: Endianness,
}

impl RawLayout {
    pub fn new(width: usize, height: usize, sample_format: SampleFormat) -> RawLayout {
        RawLayout {
            width,
            height,
            sample_format,
            endianness: Endianness::Little,
        }
    }

    pub fn with_endianness(mut self, endianness: Endianness) -> RawLayout {
        self.endianness = endianness;
        self
    }

    /// Size of one slice in bytes, `None` if it does not fit `usize`
    pub fn byte_len(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)?
            .checked_mul(self.sample_format.bytes())
    }
}

/// Turns encoded blobs into [`Slice`]s.
///
/// Decoder has no mutable state, one instance can decode slices from many threads.
#[derive(Debug, Clone, Default)]
pub struct SliceDecoder {
    raw_layout: Option<RawLayout>,
}

impl SliceDecoder {
    pub fn new() -> SliceDecoder {
        SliceDecoder::default()
    }

    /// Decoder able to read raw slices of given layout
    pub fn with_raw_layout(layout: RawLayout) -> SliceDecoder {
        SliceDecoder {
            raw_layout: Some(layout),
        }
    }

    pub fn raw_layout(&self) -> Option<RawLayout> {
        self.raw_layout
    }

    /// Decode one slice.
    /// Acquisition metadata of `encoded` take precedence over metadata in the blob header.
    pub fn decode(&self, encoded: &EncodedSlice) -> Result<Slice, SliceError> {
        let format: SliceFormat = encoded.format.parse()?;
        let slice = self.decode_blob(&encoded.blob, format)?;

        Ok(slice.with_acquisition(encoded.index, encoded.position, encoded.pixel_spacing))
    }

    /// Decode blob of known format, acquisition metadata are left at defaults
    pub fn decode_blob(&self, blob: &[u8], format: SliceFormat) -> Result<Slice, DecodeError> {
        match format {
            SliceFormat::Raw => {
                let layout = self.raw_layout.ok_or(DecodeError::MissingRawLayout)?;
                decode_raw(blob, &layout)
            }
            SliceFormat::Png => decode_png(blob),
            SliceFormat::MetaImage => decode_meta_image(blob),
        }
    }
}

fn check_len(blob: &[u8], expected: usize) -> Result<(), DecodeError> {
    match blob.len() {
        actual if actual < expected => Err(DecodeError::Truncated { expected, actual }),
        actual if actual > expected => Err(DecodeError::Malformed(format!(
            "{} trailing bytes after samples",
            actual - expected
        ))),
        _ => Ok(()),
    }
}

fn decode_raw(blob: &[u8], layout: &RawLayout) -> Result<Slice, DecodeError> {
    let expected = layout.byte_len().ok_or_else(|| {
        DecodeError::Malformed(format!(
            "raw slice of {}x{} samples is too large",
            layout.width, layout.height
        ))
    })?;
    check_len(blob, expected)?;
    let data = samples_from_bytes(blob, layout.sample_format, layout.endianness)?;

    Ok(Slice::from_samples(
        layout.width,
        layout.height,
        data,
        layout.sample_format,
    ))
}

/// Convert bytes to samples, length must be multiple of sample size
fn samples_from_bytes(
    bytes: &[u8],
    format: SampleFormat,
    endianness: Endianness,
) -> Result<Vec<f32>, DecodeError> {
    let data = match endianness {
        Endianness::Little => read_samples::<LittleEndian>(bytes, format),
        Endianness::Big => read_samples::<BigEndian>(bytes, format),
    };

    if data.iter().any(|v| !v.is_finite()) {
        return Err(DecodeError::Malformed("non-finite sample".into()));
    }

    Ok(data)
}

fn read_samples<B: ByteOrder>(bytes: &[u8], format: SampleFormat) -> Vec<f32> {
    match format {
        SampleFormat::U8 => bytes.iter().map(|&b| b as f32).collect(),
        SampleFormat::I8 => bytes.iter().map(|&b| b as i8 as f32).collect(),
        SampleFormat::U16 => bytes.chunks_exact(2).map(|c| B::read_u16(c) as f32).collect(),
        SampleFormat::I16 => bytes.chunks_exact(2).map(|c| B::read_i16(c) as f32).collect(),
        SampleFormat::F32 => bytes.chunks_exact(4).map(B::read_f32).collect(),
    }
}

fn decode_png(blob: &[u8]) -> Result<Slice, DecodeError> {
    let img = image::load_from_memory_with_format(blob, ImageFormat::Png)?;
    let width = img.width() as usize;
    let height = img.height() as usize;

    let (data, sample_format): (Vec<f32>, _) = match &img {
        DynamicImage::ImageLuma8(buf) => (
            buf.as_raw().iter().map(|&v| f32::from(v)).collect(),
            SampleFormat::U8,
        ),
        DynamicImage::ImageLuma16(buf) => (
            buf.as_raw().iter().map(|&v| f32::from(v)).collect(),
            SampleFormat::U16,
        ),
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => (
            img.to_luma8().as_raw().iter().map(|&v| f32::from(v)).collect(),
            SampleFormat::U8,
        ),
        DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => (
            img.to_luma16().as_raw().iter().map(|&v| f32::from(v)).collect(),
            SampleFormat::U16,
        ),
        _ => (img.to_luma32f().into_raw(), SampleFormat::F32),
    };

    if data.len() != width * height {
        return Err(DecodeError::Malformed("image buffer size".into()));
    }

    Ok(Slice::from_samples(width, height, data, sample_format))
}

fn decode_meta_image(blob: &[u8]) -> Result<Slice, DecodeError> {
    let (header, payload) = parse::meta_image(blob)?;

    if header.compressed {
        return Err(DecodeError::Decompression(
            "compressed MetaImage data are not supported".into(),
        ));
    }

    let (width, height) = header.slice_dims()?;
    check_len(payload, header.data_len()?)?;

    let endianness = if header.big_endian {
        Endianness::Big
    } else {
        Endianness::Little
    };
    let mut data = samples_from_bytes(payload, header.sample_format, endianness)?;

    if header.channels > 1 {
        data = data
            .chunks_exact(header.channels)
            .map(|px| px.iter().sum::<f32>() / px.len() as f32)
            .collect();
    }

    let spacing = match header.spacing.as_deref() {
        Some([sx, sy, ..]) => Some(vector![*sx, *sy]),
        _ => None,
    };
    let position = header.position.as_ref().and_then(|p| p.get(2).copied());

    Ok(Slice::from_samples(width, height, data, header.sample_format).with_acquisition(
        0,
        position,
        spacing,
    ))
}
