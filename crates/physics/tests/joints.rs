use physics::PhysicsSim;
use scene::{ElementKind, SceneDocument};

fn pendulum() -> (SceneDocument, PhysicsSim) {
    let doc = SceneDocument::from_path("tests/data/pendulum.json").unwrap();
    let sim = PhysicsSim::build(&doc).unwrap();
    (doc, sim)
}

#[test]
fn initial_hinge_angle_is_applied() {
    let (doc, sim) = pendulum();
    let rod = doc.find(ElementKind::Geom, "rod").unwrap();
    let pos = sim.position(rod).unwrap();

    assert!((pos.x - 0.3 * 0.5_f32.sin()).abs() < 1e-5);
    assert!((pos.z - (1.0 + 0.3 * 0.5_f32.cos())).abs() < 1e-5);
}

#[test]
fn spring_pulls_the_hinge_back() {
    let (doc, mut sim) = pendulum();
    let hinge = doc.find(ElementKind::Joint, "hinge").unwrap();

    // a quarter period of sqrt(10) rad/s is about 0.5 s
    sim.step_n(100);
    let angle = sim.joint_position(hinge).unwrap();
    assert!(angle.abs() < 0.5, "angle={angle}");
    assert!(sim.joint_velocity(hinge).unwrap() < 0.0);
}

#[test]
fn slide_velocity_moves_children_until_the_limit() {
    let (doc, mut sim) = pendulum();
    let rail = doc.find(ElementKind::Joint, "rail").unwrap();
    // The chassis rides the cart directly; the pole's own hinge swing would
    // mask the slide.
    let chassis = doc.find(ElementKind::Geom, "chassis").unwrap();
    let start = sim.position(chassis).unwrap();

    assert!(sim.set_joint_velocity(rail, 1.0));
    sim.step_n(40);
    let moved = sim.position(chassis).unwrap();
    assert!(moved.x - start.x > 0.15, "moved {}", moved.x - start.x);
    assert!((moved.z - start.z).abs() < 1e-5);

    sim.step_n(200);
    assert!((sim.joint_position(rail).unwrap() - 0.5).abs() < 1e-5);
}

#[test]
fn writing_state_of_a_non_joint_is_refused() {
    let (doc, mut sim) = pendulum();
    let rod = doc.find(ElementKind::Geom, "rod").unwrap();
    assert!(!sim.set_joint_velocity(rod, 1.0));
    assert!(sim.joint_position(rod).is_none());
}

#[test]
fn joint_position_writes_update_poses() {
    let (doc, mut sim) = pendulum();
    let hinge = doc.find(ElementKind::Joint, "hinge").unwrap();
    let rod = doc.find(ElementKind::Geom, "rod").unwrap();

    assert!(sim.set_joint_position(hinge, 0.0));
    let pos = sim.position(rod).unwrap();
    assert!(pos.x.abs() < 1e-6);
    assert_eq!(sim.quaternion(rod), Some([1.0, 0.0, 0.0, 0.0]));
}
