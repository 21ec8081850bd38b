use physics::{BuildError, GeomType, JointType, PhysicsSim};
use scene::{attrs, ElementKind, SceneDocument};

fn pendulum() -> SceneDocument {
    SceneDocument::from_path("tests/data/pendulum.json").unwrap()
}

#[test]
fn compiles_every_element_kind() {
    let doc = pendulum();
    let sim = PhysicsSim::build(&doc).unwrap();

    // world + cart + pole
    assert_eq!(sim.bodies().len(), 3);
    assert_eq!(sim.geoms().len(), 2);
    assert_eq!(sim.joints().len(), 2);
    assert_eq!(sim.sites().len(), 1);
    assert_eq!(sim.lights().len(), 1);
    assert_eq!(sim.cameras().len(), 1);
    assert_eq!(sim.source_revision(), doc.revision());
    assert!((sim.timestep() - 0.005).abs() < f32::EPSILON);
}

#[test]
fn bindings_follow_document_nodes() {
    let doc = pendulum();
    let sim = PhysicsSim::build(&doc).unwrap();

    let hinge = doc.find(ElementKind::Joint, "hinge").unwrap();
    let joint = sim.joint(hinge).unwrap();
    assert_eq!(joint.kind, JointType::Hinge);
    assert_eq!(sim.binding(hinge).unwrap().kind, ElementKind::Joint);

    let pole = doc.find(ElementKind::Body, "pole").unwrap();
    assert_eq!(sim.body(pole).unwrap().node, pole);
    assert_eq!(sim.bodies()[joint.body].node, pole);

    let rod = doc.find(ElementKind::Geom, "rod").unwrap();
    assert_eq!(sim.geom(rod).unwrap().kind, GeomType::Capsule);
    assert!(sim.position(doc.world()).is_some());
    assert!(sim.geom(hinge).is_none());
}

#[test]
fn material_colour_is_the_fallback() {
    let doc = pendulum();
    let sim = PhysicsSim::build(&doc).unwrap();
    let rod = doc.find(ElementKind::Geom, "rod").unwrap();
    let chassis = doc.find(ElementKind::Geom, "chassis").unwrap();

    assert_eq!(sim.rgba(rod), Some([0.8, 0.6, 0.2, 1.0]));
    assert_eq!(sim.rgba(chassis), Some([0.5, 0.5, 0.5, 1.0]));
    assert_eq!(sim.is_collidable(chassis), Some(false));
    assert_eq!(sim.is_collidable(rod), Some(true));
}

#[test]
fn every_build_has_a_new_identity() {
    let doc = pendulum();
    let first = PhysicsSim::build(&doc).unwrap();
    let second = PhysicsSim::build(&doc).unwrap();

    assert_ne!(first.id(), second.id());
    assert_eq!(first.geom_poses(), second.geom_poses());
}

#[test]
fn joints_on_the_world_body_are_rejected() {
    let mut doc = SceneDocument::new();
    let joint = doc
        .add(doc.world(), ElementKind::Joint, None, attrs([("type", "hinge".into())]))
        .unwrap();
    assert_eq!(PhysicsSim::build(&doc).unwrap_err(), BuildError::JointOnWorldBody(joint));
}

#[test]
fn unknown_types_are_rejected() {
    let mut doc = SceneDocument::new();
    let body = doc.add(doc.world(), ElementKind::Body, None, attrs([])).unwrap();
    let geom = doc
        .add(body, ElementKind::Geom, None, attrs([("type", "torus".into())]))
        .unwrap();
    assert!(matches!(
        PhysicsSim::build(&doc),
        Err(BuildError::UnknownGeomType { node, name }) if node == geom && name == "torus"
    ));

    doc.remove(geom).unwrap();
    doc.add(body, ElementKind::Joint, None, attrs([("type", "spiral".into())]))
        .unwrap();
    assert!(matches!(
        PhysicsSim::build(&doc),
        Err(BuildError::UnknownJointType { .. })
    ));
}

#[test]
fn sizes_are_validated_per_shape() {
    let mut doc = SceneDocument::new();
    let geom = doc
        .add(doc.world(), ElementKind::Geom, None, attrs([("type", "box".into()), ("size", [0.1, 0.1].into())]))
        .unwrap();
    assert!(matches!(
        PhysicsSim::build(&doc),
        Err(BuildError::InvalidSize { shape: "box", .. })
    ));

    doc.set(geom, "size", [0.1, 0.1, 0.1]).unwrap();
    assert!(PhysicsSim::build(&doc).is_ok());

    doc.set(geom, "size", [0.1, 0.1, 0.1, 0.1]).unwrap();
    assert!(matches!(
        PhysicsSim::build(&doc),
        Err(BuildError::InvalidAttribute { attr, .. }) if attr == "size"
    ));
}

#[test]
fn mesh_geoms_need_a_mesh_asset() {
    let mut doc = SceneDocument::new();
    let geom = doc
        .add(doc.world(), ElementKind::Geom, None, attrs([("type", "mesh".into())]))
        .unwrap();
    assert_eq!(PhysicsSim::build(&doc).unwrap_err(), BuildError::MissingMesh(geom));

    let mesh = doc
        .add_asset(ElementKind::Mesh, Some("mug"), attrs([("scale", [0.2, 0.2, 0.3].into())]))
        .unwrap();
    doc.set(geom, "mesh", mesh).unwrap();
    let sim = PhysicsSim::build(&doc).unwrap();
    assert_eq!(sim.geom(geom).unwrap().size, [0.2, 0.2, 0.3]);

    // Removing the asset scrubs the reference, so the geom is broken again.
    doc.remove(mesh).unwrap();
    assert_eq!(PhysicsSim::build(&doc).unwrap_err(), BuildError::MissingMesh(geom));
}

#[test]
fn timestep_must_be_positive() {
    let mut doc = SceneDocument::new();
    doc.update_options(|options| options.timestep = 0.0);
    assert_eq!(PhysicsSim::build(&doc).unwrap_err(), BuildError::InvalidTimestep(0.0));
}

#[test]
fn mistyped_attributes_name_the_attribute() {
    let mut doc = SceneDocument::new();
    let body = doc
        .add(doc.world(), ElementKind::Body, None, attrs([("pos", "up".into())]))
        .unwrap();
    let err = PhysicsSim::build(&doc).unwrap_err();
    assert_eq!(
        err,
        BuildError::InvalidAttribute {
            node: body,
            attr: "pos".to_owned(),
            expected: "a vector of the expected length",
        }
    );
}
