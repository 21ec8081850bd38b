use physics::PhysicsSim;
use scene::{ElementKind, SceneDocument};

#[test]
fn sphere_free_fall_matches_analytic() -> anyhow::Result<()> {
    let doc = SceneDocument::from_path("tests/data/drop.json")?;
    let mut sim = PhysicsSim::build(&doc)?;
    let ball = doc.find(ElementKind::Body, "ball").unwrap();

    let dt = sim.timestep();
    let steps = 100_u16; // 1 s, well above the floor
    sim.step_n(usize::from(steps));

    // semi-implicit Euler: h = h0 - g dt^2 n(n+1)/2
    let n = f32::from(steps);
    let expected = 10.0 - 9.81 * dt * dt * n * (n + 1.0) / 2.0;
    let height = sim.position(ball).unwrap().z;
    assert!((height - expected).abs() < 1e-3, "height={height} expected={expected}");
    assert!((sim.time() - 1.0).abs() < 1e-4);
    Ok(())
}

#[test]
fn sphere_comes_to_rest_on_the_floor() {
    let doc = SceneDocument::from_path("tests/data/drop.json").unwrap();
    let mut sim = PhysicsSim::build(&doc).unwrap();
    let ball = doc.find(ElementKind::Body, "ball").unwrap();
    let floor = doc.find(ElementKind::Geom, "floor").unwrap();

    assert!(!sim.has_contact(ball));
    sim.step_n(300);

    let height = sim.position(ball).unwrap().z;
    assert!((height - 0.1).abs() < 0.01, "height={height}");
    assert!(sim.has_contact(ball));
    assert!(sim.has_contact(floor));

    let ball_geom = doc.find(ElementKind::Geom, "ball_geom").unwrap();
    let crate_geom = doc.find(ElementKind::Geom, "crate_geom").unwrap();
    assert!(sim.in_contact(ball_geom, floor));
    assert!(sim.in_contact(floor, ball_geom));
    assert!(!sim.in_contact(ball_geom, crate_geom));
    assert!(!sim.in_contact(ball, floor), "bodies are not geoms");
}

#[test]
fn box_settles_on_its_lowest_corner() {
    let doc = SceneDocument::from_path("tests/data/drop.json").unwrap();
    let mut sim = PhysicsSim::build(&doc).unwrap();
    let crate_body = doc.find(ElementKind::Body, "crate").unwrap();

    sim.step_n(200);
    let height = sim.position(crate_body).unwrap().z;
    assert!((height - 0.1).abs() < 0.01, "height={height}");
}

#[test]
fn contacts_are_reported_at_build_time() {
    let mut doc = SceneDocument::from_path("tests/data/drop.json").unwrap();
    let ball = doc.find(ElementKind::Body, "ball").unwrap();
    doc.set(ball, "pos", [0.0, 0.0, 0.05]).unwrap();

    let sim = PhysicsSim::build(&doc).unwrap();
    assert!(sim.has_contact(ball));
    let contact = sim.contacts()[0];
    assert!(contact.depth > 0.0);
    assert!((contact.normal.z - 1.0).abs() < 1e-6);
}
