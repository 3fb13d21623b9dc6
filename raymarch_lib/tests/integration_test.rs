use std::sync::Arc;

use nalgebra::{point, vector};
use raymarch_lib::{
    color,
    common::{OrientedBox, Ray, ValueRange, WindowingParameters},
    error::{AssemblyError, BuildError, DecodeError, SliceError},
    render::{ClipPlane, MarchOptions, RaymarchMode, Raymarcher, StepPolicy},
    slice::{EncodedSlice, SliceDecoder},
    test_helpers::*,
    texture::{
        MemoryTexture, Region, TextureDestination, TextureFormat, UploadOptions,
        VolumeTextureWriter,
    },
    transfer_function::{TransferFunction, Windowed},
    volumetric::{AssemblyOptions, Normalization, Volume, VolumeAssembler},
    PerspectiveCamera, RenderOptions, Renderer, VolumePipeline,
};

fn fixed_u8_pipeline(width: usize, height: usize) -> VolumePipeline {
    VolumePipeline::new(raw_u8_decoder(width, height)).with_assembly_options(
        AssemblyOptions::default()
            .with_normalization(Normalization::Fixed(u8_range()))
            .with_z_spacing(1.0),
    )
}

#[test]
fn uniform_stack_normalized_against_window() {
    let pipeline = fixed_u8_pipeline(4, 4);

    let (volume, skipped) = pipeline
        .build_packed(uniform_stack(10, 4, 4, 100), None)
        .unwrap();

    assert!(skipped.is_empty());
    assert_eq!(volume.dims(), vector![4, 4, 10]);
    assert_eq!(volume.data().len(), 4 * 4 * 10);
    assert!(volume
        .data()
        .iter()
        .all(|v| (v - 100.0 / 255.0).abs() < 1e-5));
}

#[test]
fn geometry_mismatch_fails_whole_build() {
    let decoder = raw_u8_decoder(4, 4);
    let mut slices: Vec<_> = uniform_stack(9, 4, 4, 100)
        .iter()
        .map(|e| decoder.decode(e).unwrap())
        .collect();
    let big = raw_u8_decoder(8, 8)
        .decode(&uniform_slice(8, 8, 100, 9))
        .unwrap();
    slices.push(big);

    let result = VolumeAssembler::default().assemble(slices);

    assert!(matches!(
        result,
        Err(AssemblyError::GeometryMismatch { index: 9, .. })
    ));
}

#[test]
fn normalization_round_trip() {
    let pipeline = VolumePipeline::new(raw_u8_decoder(3, 3));

    let (volume, _) = pipeline
        .build_packed(ramp_stack(5, 3, 3, 50), None)
        .unwrap();

    let range = ValueRange::from_samples(volume.data().iter().copied());
    assert!(range.low.abs() < 1e-6);
    assert!((range.high - 1.0).abs() < 1e-6);

    let meta = volume.metadata();
    assert!((meta.denormalize_value(1.0) - 200.0).abs() < 1e-3);
    assert!((meta.normalize_value(100.0) - 0.5).abs() < 1e-6);
}

#[test]
fn ray_through_unit_box() {
    let ray = Ray::new(point![0.0, 0.0, -10.0], vector![0.0, 0.0, 1.0]);

    let (t_near, t_far) = OrientedBox::unit().intersect(&ray).unwrap();

    assert!((t_near - 9.5).abs() < 1e-5);
    assert!((t_far - 10.5).abs() < 1e-5);

    let offset = Ray::new(point![0.6, 0.0, -10.0], vector![0.0, 0.0, 1.0]);
    assert!(OrientedBox::unit().intersect(&offset).is_none());
}

#[test]
fn marching_is_idempotent() {
    let pipeline = fixed_u8_pipeline(8, 8);
    pipeline.rebuild(ramp_stack(8, 8, 8, 30), None).unwrap();
    let volume = pipeline.slot().current().unwrap();

    let marcher = Raymarcher::new(
        &volume.texture,
        volume.bounding_box(),
        volume.spacing(),
        &white_tf,
        MarchOptions::default(),
    );
    let ray = Ray::from_unnormalized(point![-3.0, 1.3, -2.0], vector![1.0, 0.4, 1.2]);

    let first = marcher.march(&ray);
    let second = marcher.march(&ray);

    assert_eq!(first, second);
    assert!(first.w > 0.0);
}

#[test]
fn opaque_front_hides_step_size() {
    let volume = constant_volume(vector![4, 4, 4], 1.0);
    let meta = *volume.metadata();
    let ray = Ray::new(point![2.0, 2.0, -5.0], vector![0.0, 0.0, 1.0]);

    let colors: Vec<_> = [1.0, 3.0, 7.5]
        .iter()
        .map(|&quality| {
            let options = MarchOptions {
                step_policy: StepPolicy {
                    quality,
                    ..Default::default()
                },
                ..Default::default()
            };
            Raymarcher::new(
                &volume,
                meta.bounding_box(),
                meta.spacing,
                &opaque_tf,
                options,
            )
            .march(&ray)
        })
        .collect();

    assert!(colors.iter().all(|c| *c == color::mono(1.0, 1.0)));
}

#[test]
fn gaps_interpolated_when_tolerant() {
    let mut stack = ramp_stack(5, 2, 2, 60);
    stack.remove(2);
    let strict = fixed_u8_pipeline(2, 2);

    assert!(matches!(
        strict.build_packed(stack.clone(), None),
        Err(BuildError::Assembly(AssemblyError::InconsistentStack(_)))
    ));

    let tolerant = VolumePipeline::new(raw_u8_decoder(2, 2)).with_assembly_options(
        AssemblyOptions::default()
            .with_normalization(Normalization::Fixed(u8_range()))
            .gap_tolerant(true),
    );
    let (volume, _) = tolerant.build_packed(stack, None).unwrap();

    assert_eq!(volume.dims().z, 5);
    let filled = volume.get_data(1, 1, 2).unwrap();
    assert!((filled - 120.0 / 255.0).abs() < 1e-5);
}

#[test]
fn decreasing_positions_reorder_slices() {
    let stack: Vec<_> = ramp_stack(3, 2, 2, 100)
        .into_iter()
        .map(|e| {
            let position = 10.0 - 2.0 * e.index as f32;
            e.with_position(position)
        })
        .collect();
    let pipeline = VolumePipeline::new(raw_u8_decoder(2, 2)).with_assembly_options(
        AssemblyOptions::default().with_normalization(Normalization::Fixed(u8_range())),
    );

    let (volume, _) = pipeline.build_packed(stack, None).unwrap();
    let meta = volume.metadata();

    assert!(meta.convention.reversed_z);
    assert!((meta.spacing.z - 2.0).abs() < 1e-5);
    // slice with the lowest position (index 2, value 200) comes first
    assert!((volume.get_data(0, 0, 0).unwrap() - 200.0 / 255.0).abs() < 1e-5);
    assert_eq!(volume.get_data(0, 0, 2), Some(0.0));
}

#[test]
fn unsupported_format_names_slice() {
    let mut stack = uniform_stack(3, 2, 2, 1);
    stack[0].format = "jpeg".into();

    let err = fixed_u8_pipeline(2, 2).rebuild(stack, None).unwrap_err();

    assert!(matches!(
        err,
        BuildError::Slice {
            index: 0,
            source: SliceError::UnsupportedFormat(_)
        }
    ));
}

#[test]
fn precision_downgrade_under_budget() {
    let pipeline = fixed_u8_pipeline(4, 4).with_upload_options(UploadOptions {
        precision: TextureFormat::Float32,
        memory_budget: Some(4 * 4 * 4 * 2),
    });

    let report = pipeline.rebuild(uniform_stack(4, 4, 4, 51), None).unwrap();

    assert_eq!(report.format, TextureFormat::Unorm16);
    let published = pipeline.slot().current().unwrap();
    assert_eq!(published.texture.format(), Some(TextureFormat::Unorm16));
    let sample = published.texture.get_data(3, 3, 3).unwrap();
    assert!((sample - 0.2).abs() < 1e-4);
}

#[test]
fn partial_upload_touches_region_only() {
    let volume = constant_volume(vector![4, 4, 4], 0.25);
    let writer = VolumeTextureWriter::new(UploadOptions::default());
    let mut texture = MemoryTexture::new();
    writer.allocate(&volume, &mut texture).unwrap();
    writer.upload(&volume, &mut texture).unwrap();

    let region = Region::new(vector![1, 1, 1], vector![2, 2, 2]);
    writer
        .overwrite_region(&region, &[1.0; 8], &mut texture)
        .unwrap();

    assert_eq!(texture.get_data(1, 1, 1), Some(1.0));
    assert_eq!(texture.get_data(2, 2, 2), Some(1.0));
    assert_eq!(texture.get_data(0, 0, 0), Some(0.25));
    assert_eq!(texture.get_data(3, 2, 2), Some(0.25));

    let outside = Region::new(vector![3, 3, 3], vector![2, 2, 2]);
    assert!(writer
        .overwrite_region(&outside, &[1.0; 8], &mut texture)
        .is_err());
    assert_eq!(texture.get_data(3, 3, 3), Some(0.25));
}

#[test]
fn failed_rebuild_keeps_rendering_old_volume() {
    let pipeline = fixed_u8_pipeline(4, 4);
    pipeline.rebuild(uniform_stack(4, 4, 4, 255), None).unwrap();

    let options = RenderOptions::builder()
        .resolution((8, 8))
        .build()
        .unwrap();
    let renderer = Renderer::new(Arc::clone(pipeline.slot()), opaque_tf, options);
    let camera = PerspectiveCamera::look_at(point![2.0, 2.0, -10.0], point![2.0, 2.0, 2.0]);
    let before = renderer.render_frame(&camera);

    let mut broken = uniform_stack(4, 4, 4, 0);
    broken[3].blob.clear();
    assert!(pipeline.rebuild(broken, None).is_err());

    let after = renderer.render_frame(&camera);
    assert_eq!(before, after);
    assert!(after.iter().any(|c| c.w > 0.0));
}

#[test]
fn maximum_intensity_with_clip_plane() {
    let pipeline = fixed_u8_pipeline(2, 2);
    pipeline.rebuild(ramp_stack(4, 2, 2, 80), None).unwrap();

    let tf = |s: f32| color::mono(1.0, s);
    let camera = PerspectiveCamera::look_at(point![1.0, 1.0, -20.0], point![1.0, 1.0, 2.0]);
    let mip = RenderOptions::builder()
        .resolution((1, 1))
        .mode(RaymarchMode::MaximumIntensity)
        .build()
        .unwrap();
    let clipped = RenderOptions::builder()
        .resolution((1, 1))
        .mode(RaymarchMode::MaximumIntensity)
        .clip_plane(Some(ClipPlane::new(
            point![0.0, 0.0, 1.5],
            vector![0.0, 0.0, 1.0],
        )))
        .build()
        .unwrap();

    let full = Renderer::new(Arc::clone(pipeline.slot()), tf, mip).render_frame(&camera)[0];
    let cut = Renderer::new(Arc::clone(pipeline.slot()), tf, clipped).render_frame(&camera)[0];

    // far end of the stack is the brightest
    assert!(full.w > 0.75);
    assert!(cut.w < 0.5 * full.w);
    assert!(cut.w > 0.0);
}

#[test]
fn windowed_transfer_function_cutoffs() {
    let window = WindowingParameters::new(0.5, 0.2).with_cutoffs(true, false);
    let tf = Windowed::new(window, |s: f32| color::mono(s, 1.0));

    assert_eq!(tf.evaluate(0.1), color::zero());
    assert_eq!(tf.evaluate(0.9), color::mono(1.0, 1.0));
    assert!((tf.evaluate(0.5).x - 0.5).abs() < 1e-5);
}

#[test]
fn unpublished_slot_renders_transparent() {
    let pipeline = fixed_u8_pipeline(2, 2);
    let renderer = Renderer::new(
        Arc::clone(pipeline.slot()),
        white_tf,
        RenderOptions::builder().resolution((3, 2)).build_unchecked(),
    );
    let camera = PerspectiveCamera::new(point![0.0, 0.0, -5.0], vector![0.0, 0.0, 1.0]);

    let mut buffer = vec![1; 3 * 2 * 4];
    renderer.render_to_buffer(&camera, &mut buffer);

    assert!(buffer.iter().all(|&b| b == 0));
}

#[test]
fn empty_space_skipping_renders_same_image() {
    let pipeline = fixed_u8_pipeline(16, 16);
    pipeline.rebuild(ramp_stack(24, 16, 16, 10), None).unwrap();

    // slices below value 128 are invisible
    let tf = |s: f32| color::new(s, s, 1.0, if s > 0.5 { 0.1 } else { 0.0 });
    let camera = PerspectiveCamera::look_at(point![-10.0, 20.0, -15.0], point![8.0, 8.0, 12.0]);
    let options = RenderOptions::builder()
        .resolution((12, 12))
        .build()
        .unwrap();
    let skipping = RenderOptions::builder()
        .resolution((12, 12))
        .empty_space_skipping(true)
        .build()
        .unwrap();

    let plain = Renderer::new(Arc::clone(pipeline.slot()), tf, options).render_frame(&camera);
    let fast = Renderer::new(Arc::clone(pipeline.slot()), tf, skipping).render_frame(&camera);

    assert_eq!(plain, fast);
    assert!(plain.iter().any(|c| c.w > 0.0));
}

#[test]
fn oversized_meta_image_header_fails_build() {
    let header = "DimSize = 4294967296 4294967296\nElementType = MET_UCHAR\nElementDataFile = LOCAL\n";
    let stack = vec![EncodedSlice::new(header.as_bytes().to_vec(), "mha", 0)];

    let err = VolumePipeline::new(SliceDecoder::new())
        .rebuild(stack, None)
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::Slice {
            index: 0,
            source: SliceError::Decode(DecodeError::Malformed(_))
        }
    ));
}

#[test]
fn extreme_slice_indices_fail_build() {
    let stack = vec![
        uniform_slice(2, 2, 10, i32::MIN),
        uniform_slice(2, 2, 10, i32::MAX),
    ];
    let tolerant = VolumePipeline::new(raw_u8_decoder(2, 2))
        .with_assembly_options(AssemblyOptions::default().gap_tolerant(true));

    let strict = fixed_u8_pipeline(2, 2).rebuild(stack.clone(), None);
    let tolerant = tolerant.rebuild(stack, None);

    for res in [strict, tolerant] {
        assert!(matches!(
            res,
            Err(BuildError::Assembly(AssemblyError::InconsistentStack(_)))
        ));
    }
}
