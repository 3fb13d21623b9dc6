//! MetaImage (`.mha`) header parser.
//!
//! Header is a list of `Key = Value` lines, the last one is `ElementDataFile`.
//! With `ElementDataFile = LOCAL` the sample data follow right after that line.

use nom::{
    bytes::complete::{tag, take_till, take_while1},
    character::complete::{line_ending, space0},
    combinator::opt,
    sequence::tuple,
    IResult,
};

use crate::error::DecodeError;

use super::SampleFormat;

/// Fields of a MetaImage header, only what is needed to read one slice
#[derive(Debug, Clone, PartialEq)]
pub struct MetaImageHeader {
    pub dims: Vec<usize>,
    pub spacing: Option<Vec<f32>>,
    pub position: Option<Vec<f32>>,
    pub sample_format: SampleFormat,
    pub big_endian: bool,
    pub channels: usize,
    pub compressed: bool,
}

impl MetaImageHeader {
    /// Width and height of the slice.
    /// 3D headers are accepted only with a single slice (`DimSize = w h 1`).
    pub fn slice_dims(&self) -> Result<(usize, usize), DecodeError> {
        match self.dims.as_slice() {
            [w, h] | [w, h, 1] if *w > 0 && *h > 0 => Ok((*w, *h)),
            dims => Err(DecodeError::Malformed(format!(
                "expected single 2D slice, header has DimSize {dims:?}"
            ))),
        }
    }

    pub fn data_len(&self) -> Result<usize, DecodeError> {
        let (w, h) = self.slice_dims()?;
        w.checked_mul(h)
            .and_then(|n| n.checked_mul(self.channels))
            .and_then(|n| n.checked_mul(self.sample_format.bytes()))
            .ok_or_else(|| {
                DecodeError::Malformed(format!("slice of {w}x{h} samples is too large"))
            })
    }
}

fn is_key_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn is_line_end(c: u8) -> bool {
    c == b'\n' || c == b'\r'
}

/// One `Key = Value` line, including the line ending
fn header_line(input: &[u8]) -> IResult<&[u8], (&[u8], &[u8])> {
    let (rest, (_, key, _, _, _, value, _)) = tuple((
        space0,
        take_while1(is_key_char),
        space0,
        tag("="),
        space0,
        take_till(is_line_end),
        opt(line_ending),
    ))(input)?;
    Ok((rest, (key, value)))
}

fn utf8(bytes: &[u8]) -> Result<&str, DecodeError> {
    std::str::from_utf8(bytes)
        .map(str::trim)
        .map_err(|_| DecodeError::Malformed("header is not valid text".into()))
}

fn parse_list<T: std::str::FromStr>(key: &str, value: &str) -> Result<Vec<T>, DecodeError> {
    value
        .split_whitespace()
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| DecodeError::Malformed(format!("bad value '{v}' of {key}")))
        })
        .collect()
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

fn element_type(value: &str) -> Result<SampleFormat, DecodeError> {
    match value {
        "MET_UCHAR" => Ok(SampleFormat::U8),
        "MET_CHAR" => Ok(SampleFormat::I8),
        "MET_USHORT" => Ok(SampleFormat::U16),
        "MET_SHORT" => Ok(SampleFormat::I16),
        "MET_FLOAT" => Ok(SampleFormat::F32),
        other => Err(DecodeError::UnsupportedBitDepth(other.to_string())),
    }
}

/// Parse header, returns it with the local sample data
pub fn meta_image(input: &[u8]) -> Result<(MetaImageHeader, &[u8]), DecodeError> {
    let mut rest = input;

    let mut ndims = None;
    let mut dims = None;
    let mut spacing = None;
    let mut position = None;
    let mut sample_format = None;
    let mut big_endian = false;
    let mut channels = 1;
    let mut compressed = false;

    loop {
        let (after, (key, value)) = header_line(rest)
            .map_err(|_| DecodeError::Malformed("MetaImage header ended before ElementDataFile".into()))?;
        rest = after;

        let key = utf8(key)?;
        let value = utf8(value)?;

        match key {
            "NDims" => ndims = Some(parse_list::<usize>(key, value)?),
            "DimSize" => dims = Some(parse_list::<usize>(key, value)?),
            "ElementSpacing" | "ElementSize" => spacing = Some(parse_list::<f32>(key, value)?),
            "Position" | "Offset" | "Origin" => position = Some(parse_list::<f32>(key, value)?),
            "ElementType" => sample_format = Some(element_type(value)?),
            "ElementByteOrderMSB" | "BinaryDataByteOrderMSB" => big_endian = parse_bool(value),
            "ElementNumberOfChannels" => {
                channels = value
                    .parse()
                    .map_err(|_| DecodeError::Malformed(format!("bad channel count '{value}'")))?
            }
            "CompressedData" => compressed = parse_bool(value),
            "ElementDataFile" => {
                if value != "LOCAL" {
                    return Err(DecodeError::Malformed(format!(
                        "external data file '{value}' is not supported"
                    )));
                }
                break;
            }
            _ => (), // ObjectType, TransformMatrix, AnatomicalOrientation, ...
        }
    }

    let dims = dims.ok_or_else(|| DecodeError::Malformed("missing DimSize".into()))?;
    if let Some(&[n]) = ndims.as_deref() {
        if n != dims.len() {
            return Err(DecodeError::Malformed(format!(
                "NDims is {n}, DimSize has {} values",
                dims.len()
            )));
        }
    }
    let sample_format =
        sample_format.ok_or_else(|| DecodeError::Malformed("missing ElementType".into()))?;
    if channels == 0 {
        return Err(DecodeError::Malformed("zero channels".into()));
    }

    let header = MetaImageHeader {
        dims,
        spacing,
        position,
        sample_format,
        big_endian,
        channels,
        compressed,
    };

    Ok((header, rest))
}
