use crate::common::{ball_pipeline, ball_stack, SIDE};
use criterion::{BatchSize, Criterion};

pub fn build_volume(c: &mut Criterion) {
    let pipeline = ball_pipeline(SIDE);
    let stack = ball_stack(SIDE);

    c.bench_function(&format!("Build | {SIDE}^3 raw u8"), |b| {
        b.iter_batched(
            || stack.clone(),
            |stack| pipeline.rebuild(stack, None).unwrap(),
            BatchSize::LargeInput,
        );
    });
}
