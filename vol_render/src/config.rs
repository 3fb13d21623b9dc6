use std::{path::PathBuf, str::FromStr};

use clap::ArgMatches;
use nalgebra::{point, vector, Point3, Vector2};
use raymarch_lib::{
    common::WindowingParameters,
    render::{RaymarchMode, RenderOptions, Shading},
    slice::{Endianness, RawLayout, SampleFormat, SliceDecoder, SliceFormat},
    texture::{TextureFormat, UploadOptions},
    volumetric::{AssemblyOptions, Normalization},
};

/// Parse all values of `key`
fn values_of<T>(args: &ArgMatches, key: &str) -> Result<Option<Vec<T>>, String>
where
    T: FromStr,
{
    let values = match args.values_of(key) {
        Some(values) => values,
        None => return Ok(None),
    };
    values
        .map(|v| v.parse::<T>().map_err(|_| format!("invalid value '{v}' of {key}")))
        .collect::<Result<Vec<T>, String>>()
        .map(Some)
}

fn value_of<T>(args: &ArgMatches, key: &str) -> Result<Option<T>, String>
where
    T: FromStr,
{
    args.value_of(key)
        .map(|v| v.parse::<T>().map_err(|_| format!("invalid value '{v}' of {key}")))
        .transpose()
}

/// App configuration
/// Config is built from args parsed by `clap`
#[derive(Debug)]
pub struct Config {
    /// Directory with slices
    pub input_dir: PathBuf,
    /// Rendered image
    pub output_file: PathBuf,
    /// Format tag of slices
    pub format: SliceFormat,
    /// Layout of raw slices
    pub raw_layout: Option<RawLayout>,
    /// Spacing of pixels within slices, overrides slice headers
    pub pixel_spacing: Option<Vector2<f32>>,
    /// Distance of slices
    pub z_spacing: Option<f32>,
    pub normalization: Normalization,
    pub gap_tolerant: bool,
    pub upload: UploadOptions,
    pub render_options: RenderOptions,
    /// Name of the transfer function
    pub tf_name: String,
    /// Camera position, derived from the volume if missing
    pub camera_position: Option<Point3<f32>>,
}

impl Config {
    pub fn from_args(args: ArgMatches) -> Result<Config, String> {
        // Files, unwrap safe, have default values or are required
        let input_dir = args.value_of_os("input-dir").unwrap().into();
        let output_file = args.value_of_os("output-file").unwrap().into();

        // Slices
        let format: SliceFormat = args
            .value_of("format")
            .unwrap()
            .parse()
            .map_err(|e| format!("{e}"))?;
        let raw_layout = match values_of::<usize>(&args, "raw-dims")? {
            Some(dims) => {
                let sample_format = parse_sample_format(args.value_of("sample-type").unwrap())?;
                let endianness = if args.is_present("big-endian") {
                    Endianness::Big
                } else {
                    Endianness::Little
                };
                Some(RawLayout::new(dims[0], dims[1], sample_format).with_endianness(endianness))
            }
            None => None,
        };

        // Assembly
        let spacing = values_of::<f32>(&args, "spacing")?;
        let pixel_spacing = spacing.as_ref().map(|s| vector![s[0], s[1]]);
        let z_spacing = spacing.as_ref().map(|s| s[2]);
        let normalization = match values_of::<f32>(&args, "window")? {
            Some(w) => {
                if w[1] <= 0.0 {
                    return Err("window width must be positive".into());
                }
                Normalization::Window(WindowingParameters::new(w[0], w[1]))
            }
            None => Normalization::GlobalMinMax,
        };
        let gap_tolerant = args.is_present("gap-tolerant");

        // Upload
        let precision = match args.value_of("precision").unwrap() {
            "u8" => TextureFormat::Unorm8,
            "u16" => TextureFormat::Unorm16,
            _ => TextureFormat::Float32,
        };
        let memory_budget = value_of::<usize>(&args, "memory-budget")?.map(|mib| mib << 20);
        let upload = UploadOptions {
            precision,
            memory_budget,
        };

        // Rendering
        let resolution = values_of::<usize>(&args, "resolution")?.unwrap_or(vec![512, 512]);
        let mode = match args.value_of("mode").unwrap() {
            "mip" => RaymarchMode::MaximumIntensity,
            _ => RaymarchMode::Composite,
        };
        let quality = value_of::<f32>(&args, "quality")?.unwrap_or(1.0);
        let shading = args.is_present("shading").then(Shading::default);
        let render_options = RenderOptions::builder()
            .resolution((resolution[0], resolution[1]))
            .multi_thread(!args.is_present("single-thread"))
            .early_ray_termination(!args.is_present("no-ert"))
            .mode(mode)
            .quality(quality)
            .shading(shading)
            .empty_space_skipping(args.is_present("skip-empty"))
            .build()
            .map_err(|e| format!("{e}"))?;

        let tf_name = args.value_of("tf").unwrap().to_owned();
        let camera_position = values_of::<f32>(&args, "camera")?.map(|p| point![p[0], p[1], p[2]]);

        Ok(Config {
            input_dir,
            output_file,
            format,
            raw_layout,
            pixel_spacing,
            z_spacing,
            normalization,
            gap_tolerant,
            upload,
            render_options,
            tf_name,
            camera_position,
        })
    }

    pub fn decoder(&self) -> SliceDecoder {
        match self.raw_layout {
            Some(layout) => SliceDecoder::with_raw_layout(layout),
            None => SliceDecoder::new(),
        }
    }

    pub fn assembly_options(&self) -> AssemblyOptions {
        let options = AssemblyOptions::default()
            .with_normalization(self.normalization)
            .gap_tolerant(self.gap_tolerant);
        match self.z_spacing {
            Some(z) => options.with_z_spacing(z),
            None => options,
        }
    }
}

fn parse_sample_format(name: &str) -> Result<SampleFormat, String> {
    match name {
        "u8" => Ok(SampleFormat::U8),
        "i8" => Ok(SampleFormat::I8),
        "u16" => Ok(SampleFormat::U16),
        "i16" => Ok(SampleFormat::I16),
        "f32" => Ok(SampleFormat::F32),
        _ => Err(format!("unknown sample type '{name}'")),
    }
}
