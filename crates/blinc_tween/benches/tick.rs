use blinc_tween::{Binding, Ease, LoopType, SchedulerConfig, TweenFilter, TweenScheduler};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::cell::RefCell;
use std::rc::Rc;

const TWEENS: usize = 2_000;
const FRAME: f32 = 1.0 / 60.0;

fn populated(targets: &[Rc<RefCell<f32>>]) -> TweenScheduler {
    let mut scheduler = TweenScheduler::new(SchedulerConfig::high_capacity());
    for (i, target) in targets.iter().enumerate() {
        let _ = scheduler
            .to(Binding::weak(target), 100.0, 1.0 + (i % 7) as f32 * 0.25)
            .ease(Ease::InOutCubic)
            .loops(-1)
            .loop_type(LoopType::Yoyo)
            .tag(if i % 2 == 0 { "even" } else { "odd" })
            .build();
    }
    scheduler
}

fn bench_tick(c: &mut Criterion) {
    let targets: Vec<_> = (0..TWEENS).map(|_| Rc::new(RefCell::new(0.0f32))).collect();
    let mut scheduler = populated(&targets);

    c.bench_function("tick 2000 endless tweens", |b| {
        b.iter(|| scheduler.tick(black_box(FRAME), FRAME))
    });
}

fn bench_kill_half(c: &mut Criterion) {
    let targets: Vec<_> = (0..TWEENS).map(|_| Rc::new(RefCell::new(0.0f32))).collect();

    c.bench_function("kill 1000 tagged tweens", |b| {
        b.iter_batched(
            || populated(&targets),
            |mut scheduler| scheduler.kill(TweenFilter::Tag("even"), false),
            BatchSize::SmallInput,
        )
    });
}

fn bench_pooled_spawn(c: &mut Criterion) {
    let target = Rc::new(RefCell::new(0.0f32));
    let mut scheduler = TweenScheduler::new(SchedulerConfig::standard());

    c.bench_function("spawn and kill from pool", |b| {
        b.iter(|| {
            if let Ok(id) = scheduler.to(Binding::weak(&target), 1.0, 0.5).build() {
                scheduler.kill(id, false);
            }
        })
    });
}

criterion_group!(benches, bench_tick, bench_kill_half, bench_pooled_spawn);
criterion_main!(benches);
