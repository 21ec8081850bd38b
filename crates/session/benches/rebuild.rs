use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use session::elements::{Geom, GeomOptions, Transform};
use session::{Session, SessionConfig};

const EDITS: usize = 50;

fn scene_with_geoms(count: usize) -> (Session, Vec<Geom>) {
    let mut session = Session::new(scene::SceneDocument::new(), &SessionConfig::default()).unwrap();
    let geoms = (0..count)
        .map(|_| Geom::create(&mut session, None, &GeomOptions::default()).unwrap())
        .collect();
    session.runtime().unwrap();
    (session, geoms)
}

fn edit(session: &mut Session, geom: Geom, i: usize) {
    #[allow(clippy::cast_precision_loss)]
    let z = i as f32 * 0.01;
    geom.set_position(session, [0.0, 0.0, z]).unwrap();
}

fn bench_coalesced(c: &mut Criterion) {
    c.bench_function("edits_50_then_one_rebuild", |b| {
        b.iter_batched(
            || scene_with_geoms(EDITS),
            |(mut session, geoms)| {
                for (i, geom) in geoms.into_iter().enumerate() {
                    edit(&mut session, geom, i);
                }
                session.step().unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_eager(c: &mut Criterion) {
    c.bench_function("edits_50_rebuild_each", |b| {
        b.iter_batched(
            || scene_with_geoms(EDITS),
            |(mut session, geoms)| {
                for (i, geom) in geoms.into_iter().enumerate() {
                    edit(&mut session, geom, i);
                    session.step().unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_coalesced, bench_eager);
criterion_main!(benches);
