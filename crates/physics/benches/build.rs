use criterion::{criterion_group, criterion_main, Criterion};
use physics::PhysicsSim;
use scene::{attrs, ElementKind, SceneDocument};

fn chain(links: u16) -> SceneDocument {
    let mut doc = SceneDocument::new();
    let mut parent = doc.world();
    for i in 0..links {
        let body = doc
            .add(parent, ElementKind::Body, None, attrs([("pos", [0.0, 0.0, 0.2].into())]))
            .unwrap();
        doc.add(body, ElementKind::Joint, None, attrs([("type", "hinge".into()), ("qpos", f32::from(i).into())]))
            .unwrap();
        doc.add(body, ElementKind::Geom, None, attrs([("type", "capsule".into()), ("size", [0.02, 0.1].into())]))
            .unwrap();
        parent = body;
    }
    doc
}

fn bench_build(c: &mut Criterion) {
    let doc = chain(100);
    c.bench_function("build_chain_100", |b| b.iter(|| PhysicsSim::build(&doc).unwrap()));
}

fn bench_step(c: &mut Criterion) {
    let mut sim = PhysicsSim::build(&chain(100)).unwrap();
    c.bench_function("step_chain_100", |b| b.iter(|| sim.step()));
}

criterion_group!(benches, bench_build, bench_step);
criterion_main!(benches);
