use std::{error::Error, process::ExitCode};

use config::Config;
use log::info;
use nalgebra::{vector, Point3};
use raymarch_lib::{
    color::RGBA,
    common::OrientedBox,
    premade::transfer_functions::{by_name, ct_ramp},
    transfer_function::{ColorRamp, TransferFunction},
    PerspectiveCamera, Renderer, VolumePipeline,
};

mod args;
mod config;
mod file;

use crate::{
    args::get_command,
    file::{read_slices, slice_files},
};

type BoxedTf = Box<dyn Fn(f32) -> RGBA + Send + Sync>;

pub fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cmd = get_command();
    let args = cmd.get_matches();

    let cfg = match Config::from_args(args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    match run(cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: Config) -> Result<(), Box<dyn Error>> {
    let files = slice_files(&cfg.input_dir, cfg.format)?;
    if files.is_empty() {
        return Err(format!("no {:?} slices in {}", cfg.format, cfg.input_dir.display()).into());
    }
    let slices = read_slices(&files, cfg.format, cfg.pixel_spacing)?;

    let pipeline = VolumePipeline::new(cfg.decoder())
        .with_assembly_options(cfg.assembly_options())
        .with_upload_options(cfg.upload);
    let report = pipeline.rebuild(slices, None)?;
    if !report.skipped.is_empty() {
        info!("Skipped slices {:?}", report.skipped);
    }

    let volume = pipeline
        .slot()
        .current()
        .ok_or("volume was not published")?;
    let bbox = volume.bounding_box();

    let (width, height) = cfg.render_options.resolution;
    let position = cfg
        .camera_position
        .unwrap_or_else(|| default_camera_position(&bbox));
    let mut camera = PerspectiveCamera::look_at(position, bbox.center);
    camera.change_aspect_from_resolution(width, height);

    let tf = transfer_function(&cfg.tf_name);
    let renderer = Renderer::new(pipeline.slot().clone(), tf, cfg.render_options);

    info!("Rendering {width}x{height}");
    let mut buffer = vec![0; 4 * width * height];
    renderer.render_to_buffer(&camera, &mut buffer);

    // premultiplied colors are the image over black background
    let rgb: Vec<u8> = buffer
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    image::save_buffer(
        &cfg.output_file,
        &rgb,
        width as u32,
        height as u32,
        image::ExtendedColorType::Rgb8,
    )?;
    info!("Image saved to {}", cfg.output_file.display());

    Ok(())
}

/// Above and in front of the volume, far enough to see all of it
fn default_camera_position(bbox: &OrientedBox) -> Point3<f32> {
    let distance = 2.5 * bbox.half_extents.magnitude();
    bbox.center + vector![0.6, 0.5, -1.0].normalize() * distance
}

fn transfer_function(name: &str) -> BoxedTf {
    match name {
        "ct" => ramp_tf(ct_ramp()),
        "gray" => ramp_tf(ColorRamp::grayscale(0.05)),
        // names are checked by the parser
        other => match by_name(other) {
            Some(f) => Box::new(f),
            None => ramp_tf(ct_ramp()),
        },
    }
}

fn ramp_tf(ramp: ColorRamp) -> BoxedTf {
    Box::new(move |sample| ramp.evaluate(sample))
}
