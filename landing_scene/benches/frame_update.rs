use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cube_matrix_landing::{
    FrameAnimator, InteractionState, SceneBundle, SceneConfig, Viewport, WireframeRenderer,
};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn setup(width: u32) -> (FrameAnimator, InteractionState, SceneBundle, StdRng) {
    let config = SceneConfig::default();
    let mut rng = StdRng::seed_from_u64(1);
    let scene = SceneBundle::assemble(&config, Viewport::new(width, 800), &mut rng).unwrap();
    let state = InteractionState::new(&config.interaction, scene.layout(&config));
    (FrameAnimator::new(&config.animation), state, scene, rng)
}

fn bench_frame_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("Frame Step");

    group.bench_function("at_rest", |b| {
        let (mut animator, mut state, mut scene, mut rng) = setup(1280);
        b.iter(|| animator.step(black_box(&mut state), &mut scene, &mut rng))
    });

    group.bench_function("exploding", |b| {
        let (mut animator, mut state, mut scene, mut rng) = setup(1280);
        state.dragging = true;
        state.velocity = Vec2::new(0.0, 0.4);
        b.iter(|| animator.step(black_box(&mut state), &mut scene, &mut rng))
    });

    group.bench_function("idle_compact", |b| {
        let (mut animator, mut state, mut scene, mut rng) = setup(480);
        state.idle = true;
        b.iter(|| animator.step(black_box(&mut state), &mut scene, &mut rng))
    });

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let config = SceneConfig::default();
    let (_, _, scene, _) = setup(640);
    let renderer = WireframeRenderer::new(&config.palette);

    c.bench_function("wireframe_640x800", |b| b.iter(|| renderer.render(black_box(&scene))));
}

criterion_group!(benches, bench_frame_step, bench_snapshot);
criterion_main!(benches);
