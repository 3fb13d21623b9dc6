use crate::common::{bench_render, RenderOptions, HEIGHT, RESOLUTION, WIDTH};
use criterion::Criterion;

pub fn render_st(c: &mut Criterion) {
    let render_options = RenderOptions::builder()
        .resolution(RESOLUTION)
        .multi_thread(false)
        .early_ray_termination(false)
        .build_unchecked();

    bench_render(
        c,
        &format!("Render ST | {WIDTH}x{HEIGHT} | no optim"),
        render_options,
    );
}

pub fn render_st_ert(c: &mut Criterion) {
    let render_options = RenderOptions::builder()
        .resolution(RESOLUTION)
        .multi_thread(false)
        .early_ray_termination(true)
        .build_unchecked();

    bench_render(c, &format!("Render ST | {WIDTH}x{HEIGHT} | ERT"), render_options);
}
