pub use criterion::{criterion_group, criterion_main, Criterion};

pub use nalgebra::{point, vector, Point3, Vector3};
pub use raymarch_lib::{
    camera::PerspectiveCamera,
    render::{RenderOptions, Renderer},
    slice::EncodedSlice,
    texture::VolumeTexture,
    transfer_function::ColorRamp,
};
use raymarch_lib::{
    common::ValueRange,
    slice::{RawLayout, SampleFormat, SliceDecoder},
    volumetric::{AssemblyOptions, Normalization},
    VolumePipeline,
};

pub const WIDTH: usize = 512;
pub const HEIGHT: usize = 512;
pub const RESOLUTION: (usize, usize) = (WIDTH, HEIGHT);

/// Side of the generated volume in voxels
pub const SIDE: usize = 128;

pub const DEFAULT_CAMERA_POSITIONS: [Point3<f32>; 3] = [
    point![300.0, 300.0, 300.0],
    point![64.0, 64.0, 350.0],
    point![-200.0, 100.0, -150.0],
];

/// Target of all cameras, center of the volume
pub const TARGET: Point3<f32> = point![64.0, 64.0, 64.0];

/// Stack of raw `u8` slices with a fuzzy ball in the middle
pub fn ball_stack(side: usize) -> Vec<EncodedSlice> {
    let center = side as f32 / 2.0;
    (0..side)
        .map(|z| {
            let mut blob = Vec::with_capacity(side * side);
            for y in 0..side {
                for x in 0..side {
                    let d = vector![x as f32 - center, y as f32 - center, z as f32 - center];
                    let v = 255.0 * (1.0 - d.magnitude() / center).max(0.0);
                    blob.push(v as u8);
                }
            }
            EncodedSlice::new(blob, "raw", z as i32)
        })
        .collect()
}

pub fn ball_pipeline(side: usize) -> VolumePipeline {
    let decoder = SliceDecoder::with_raw_layout(RawLayout::new(side, side, SampleFormat::U8));
    VolumePipeline::new(decoder).with_assembly_options(
        AssemblyOptions::default()
            .with_normalization(Normalization::Fixed(ValueRange::new(0.0, 255.0))),
    )
}

/// Built and published ball volume
pub fn get_volume() -> VolumeTexture {
    let pipeline = ball_pipeline(SIDE);
    pipeline.rebuild(ball_stack(SIDE), None).unwrap();
    let volume = pipeline.slot().current().unwrap();
    (*volume).clone()
}

/// Render frames from `DEFAULT_CAMERA_POSITIONS` in a loop
pub fn bench_render(c: &mut Criterion, bench_name: &str, render_options: RenderOptions) {
    let renderer = Renderer::from_volume(get_volume(), ColorRamp::grayscale(0.1), render_options);
    let cameras: Vec<PerspectiveCamera> = DEFAULT_CAMERA_POSITIONS
        .iter()
        .map(|&pos| PerspectiveCamera::look_at(pos, TARGET))
        .collect();
    let mut buffer = vec![0; 4 * render_options.pixel_count()];

    c.bench_function(bench_name, |b| {
        let mut cameras = cameras.iter().cycle();
        b.iter(|| {
            let camera = cameras.next().unwrap();
            renderer.render_to_buffer(camera, &mut buffer);
        });
    });
}
