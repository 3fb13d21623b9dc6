//! Argument parsing and validation
//! Uses library `clap`

use std::ffi::OsStr;

use clap::{Arg, Command, ValueHint};

// up to 32bit value
pub fn is_positive_number(num: &str) -> Result<(), String> {
    let n = num.parse::<u32>();
    match n {
        Ok(n) => {
            if n > 0 {
                Ok(())
            } else {
                Err("Number must be greater than 0".into())
            }
        }
        Err(_) => Err("Number required".into()),
    }
}

pub fn is_float_number(num: &str) -> Result<(), String> {
    let n = num.parse::<f32>();
    match n {
        Ok(n) => {
            if n > 0.0 {
                Ok(())
            } else {
                Err("Number must be greater than 0.0".into())
            }
        }
        Err(_) => Err("Number required".into()),
    }
}

pub fn is_any_float(num: &str) -> Result<(), String> {
    match num.parse::<f32>() {
        Ok(n) if n.is_finite() => Ok(()),
        _ => Err("Number required".into()),
    }
}

const FORMAT_NAMES: &[&str] = &["raw", "png", "mha"];
const SAMPLE_NAMES: &[&str] = &["u8", "i8", "u16", "i16", "f32"];
const PRECISION_NAMES: &[&str] = &["u8", "u16", "f32"];
const MODE_NAMES: &[&str] = &["composite", "mip"];
pub const TF_NAMES: &[&str] = &["ct", "skull", "white", "anything", "bands", "gray"];

pub fn get_command<'a>() -> Command<'a> {
    Command::new("Vol-render")
        .version("0.1.0")
        .about("Builds volume from a directory of slices and renders it into an image")
        .arg(
            Arg::new("input-dir")
                .help("Directory with slice files, slices are ordered by file name")
                .required(true)
                .value_name("DIR")
                .allow_invalid_utf8(true)
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("output-file")
                .help("Rendered PNG image")
                .long("output-file")
                .short('o')
                .value_name("FILE")
                .allow_invalid_utf8(true)
                .value_hint(ValueHint::FilePath)
                .default_value_os(OsStr::new("render.png")),
        )
        .arg(
            Arg::new("format")
                .help("Format of slice files")
                .long("format")
                .short('f')
                .default_value("png")
                .value_name("FORMAT")
                .possible_values(FORMAT_NAMES),
        )
        .arg(
            Arg::new("raw-dims")
                .help("Width and height of raw slices")
                .long("raw-dims")
                .number_of_values(2)
                .value_names(&["W", "H"])
                .use_value_delimiter(true)
                .require_value_delimiter(true)
                .require_equals(true)
                .required_if_eq("format", "raw")
                .validator(is_positive_number),
        )
        .arg(
            Arg::new("sample-type")
                .help("Sample type of raw slices")
                .long("sample-type")
                .default_value("u8")
                .value_name("TYPE")
                .possible_values(SAMPLE_NAMES),
        )
        .arg(
            Arg::new("big-endian")
                .help("Raw samples are big endian")
                .long("big-endian"),
        )
        .arg(
            Arg::new("spacing")
                .help("Shape of voxel, overrides spacing found in slices")
                .long("spacing")
                .short('s')
                .number_of_values(3)
                .value_names(&["X", "Y", "Z"])
                .use_value_delimiter(true)
                .require_value_delimiter(true)
                .require_equals(true)
                .validator(is_float_number),
        )
        .arg(
            Arg::new("window")
                .help("Source value window, observed range of the stack by default")
                .long("window")
                .number_of_values(2)
                .value_names(&["CENTER", "WIDTH"])
                .use_value_delimiter(true)
                .require_value_delimiter(true)
                .require_equals(true)
                .validator(is_any_float),
        )
        .arg(
            Arg::new("gap-tolerant")
                .help("Interpolate missing or unreadable slices instead of failing")
                .long("gap-tolerant"),
        )
        .arg(
            Arg::new("precision")
                .help("Texel precision of the volume texture")
                .long("precision")
                .default_value("f32")
                .value_name("TYPE")
                .possible_values(PRECISION_NAMES),
        )
        .arg(
            Arg::new("memory-budget")
                .help("Maximum size of the volume texture in MiB")
                .long("memory-budget")
                .value_name("MIB")
                .validator(is_positive_number),
        )
        .arg(
            Arg::new("resolution")
                .help("Resolution of rendered image")
                .long("resolution")
                .short('r')
                .number_of_values(2)
                .value_names(&["W", "H"])
                .use_value_delimiter(true)
                .require_value_delimiter(true)
                .require_equals(true)
                .default_values(&["512", "512"])
                .validator(is_positive_number),
        )
        .arg(
            Arg::new("camera")
                .help("Camera position, camera looks at the volume center")
                .long("camera")
                .number_of_values(3)
                .value_names(&["X", "Y", "Z"])
                .use_value_delimiter(true)
                .require_value_delimiter(true)
                .require_equals(true)
                .allow_hyphen_values(true)
                .validator(is_any_float),
        )
        .arg(
            Arg::new("tf")
                .help("Transfer function")
                .long("tf")
                .default_value("ct")
                .value_name("NAME")
                .possible_values(TF_NAMES),
        )
        .arg(
            Arg::new("mode")
                .help("Raymarching mode")
                .long("mode")
                .short('m')
                .default_value("composite")
                .value_name("MODE")
                .possible_values(MODE_NAMES),
        )
        .arg(
            Arg::new("quality")
                .help("Sampling rate multiplier, 1 means one sample per voxel")
                .long("quality")
                .short('q')
                .default_value("1")
                .value_name("Q")
                .validator(is_float_number),
        )
        .arg(
            Arg::new("no-ert")
                .help("Disable early ray termination")
                .long("no-ert"),
        )
        .arg(
            Arg::new("shading")
                .help("Gradient shading with a directional light")
                .long("shading"),
        )
        .arg(
            Arg::new("skip-empty")
                .help("Skip blocks of the volume invisible under the transfer function")
                .long("skip-empty"),
        )
        .arg(
            Arg::new("single-thread")
                .help("Render on one thread")
                .long("single-thread"),
        )
}
