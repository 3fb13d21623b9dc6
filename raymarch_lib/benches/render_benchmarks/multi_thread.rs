use crate::common::{bench_render, RenderOptions, HEIGHT, RESOLUTION, WIDTH};
use criterion::Criterion;
use raymarch_lib::render::{RaymarchMode, Shading};

pub fn render_mt_ert(c: &mut Criterion) {
    let render_options = RenderOptions::builder()
        .resolution(RESOLUTION)
        .multi_thread(true)
        .early_ray_termination(true)
        .build_unchecked();

    bench_render(c, &format!("Render MT | {WIDTH}x{HEIGHT} | ERT"), render_options);
}

pub fn render_mt_shaded(c: &mut Criterion) {
    let render_options = RenderOptions::builder()
        .resolution(RESOLUTION)
        .multi_thread(true)
        .shading(Some(Shading::default()))
        .build_unchecked();

    bench_render(
        c,
        &format!("Render MT | {WIDTH}x{HEIGHT} | ERT shaded"),
        render_options,
    );
}

pub fn render_mt_mip(c: &mut Criterion) {
    let render_options = RenderOptions::builder()
        .resolution(RESOLUTION)
        .multi_thread(true)
        .mode(RaymarchMode::MaximumIntensity)
        .build_unchecked();

    bench_render(c, &format!("Render MT | {WIDTH}x{HEIGHT} | MIP"), render_options);
}

pub fn render_mt_empty_space(c: &mut Criterion) {
    let render_options = RenderOptions::builder()
        .resolution(RESOLUTION)
        .multi_thread(true)
        .empty_space_skipping(true)
        .build_unchecked();

    bench_render(
        c,
        &format!("Render MT | {WIDTH}x{HEIGHT} | ERT empty space skipping"),
        render_options,
    );
}
