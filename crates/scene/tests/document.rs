use scene::{attrs, AttrValue, DocumentError, ElementKind, SceneDocument};

fn body_with_geom(doc: &mut SceneDocument, name: &str) -> (scene::NodeId, scene::NodeId) {
    let body = doc
        .add(doc.world(), ElementKind::Body, Some(name), attrs([("pos", [0.0, 0.0, 1.0].into())]))
        .unwrap();
    let geom = doc
        .add(body, ElementKind::Geom, None, attrs([("type", "sphere".into()), ("size", [0.1].into())]))
        .unwrap();
    (body, geom)
}

#[test]
fn every_mutation_advances_the_revision() {
    let mut doc = SceneDocument::new();
    assert_eq!(doc.revision(), 0);

    let (body, geom) = body_with_geom(&mut doc, "ball");
    let after_add = doc.revision();
    assert_eq!(after_add, 2);

    doc.set(geom, "rgba", [1.0, 0.0, 0.0, 1.0]).unwrap();
    assert_eq!(doc.revision(), after_add + 1);

    doc.update_options(|options| options.timestep = 0.002);
    assert_eq!(doc.revision(), after_add + 2);

    doc.remove(body).unwrap();
    assert_eq!(doc.revision(), after_add + 3);
}

#[test]
fn failed_mutations_leave_the_revision_alone() {
    let mut doc = SceneDocument::new();
    let (_, geom) = body_with_geom(&mut doc, "ball");
    let revision = doc.revision();

    assert!(doc.add(geom, ElementKind::Body, None, attrs([])).is_err());
    assert!(doc.add(doc.world(), ElementKind::Body, Some("ball"), attrs([])).is_err());
    assert!(doc.unset(geom, "not-there").unwrap().is_none());
    assert_eq!(doc.revision(), revision);
}

#[test]
fn names_are_unique_per_kind() {
    let mut doc = SceneDocument::new();
    doc.add(doc.world(), ElementKind::Body, Some("arm"), attrs([])).unwrap();
    doc.add(doc.world(), ElementKind::Site, Some("arm"), attrs([])).unwrap();

    let err = doc.add(doc.world(), ElementKind::Body, Some("arm"), attrs([])).unwrap_err();
    assert!(matches!(err, DocumentError::DuplicateName { kind: ElementKind::Body, .. }));
}

#[test]
fn assets_live_in_the_asset_section() {
    let mut doc = SceneDocument::new();
    let err = doc
        .add(doc.world(), ElementKind::Texture, Some("wood"), attrs([]))
        .unwrap_err();
    assert!(matches!(err, DocumentError::InvalidParent { .. }));

    let texture = doc.add_asset(ElementKind::Texture, Some("wood"), attrs([])).unwrap();
    assert_eq!(doc.parent(texture), Some(doc.assets()));
}

#[test]
fn removal_is_recursive_and_frees_names() {
    let mut doc = SceneDocument::new();
    let (body, geom) = body_with_geom(&mut doc, "ball");
    let child = doc.add(body, ElementKind::Body, Some("child"), attrs([])).unwrap();

    assert_eq!(doc.remove(body).unwrap(), 3);
    assert!(!doc.contains(geom));
    assert!(!doc.contains(child));
    assert!(doc.find(ElementKind::Body, "child").is_none());
    assert!(doc.is_empty());

    doc.add(doc.world(), ElementKind::Body, Some("ball"), attrs([])).unwrap();
}

#[test]
fn removing_an_asset_scrubs_references() {
    let mut doc = SceneDocument::new();
    let texture = doc.add_asset(ElementKind::Texture, Some("wood"), attrs([])).unwrap();
    let material = doc
        .add_asset(ElementKind::Material, Some("wood_mat"), attrs([("texture", texture.into())]))
        .unwrap();
    let (_, geom) = body_with_geom(&mut doc, "ball");
    doc.set(geom, "material", material).unwrap();

    doc.remove(texture).unwrap();
    assert!(doc.get(material, "texture").is_none());

    doc.remove(material).unwrap();
    assert!(doc.get(geom, "material").is_none());
    assert_eq!(doc.get(geom, "type"), Some(&AttrValue::from("sphere")));
}

#[test]
fn references_to_removed_nodes_are_rejected() {
    let mut doc = SceneDocument::new();
    let texture = doc.add_asset(ElementKind::Texture, None, attrs([])).unwrap();
    doc.remove(texture).unwrap();

    let err = doc
        .add_asset(ElementKind::Material, None, attrs([("texture", texture.into())]))
        .unwrap_err();
    assert!(matches!(err, DocumentError::UnknownNode(id) if id == texture));
}

#[test]
fn find_all_walks_in_document_order() {
    let mut doc = SceneDocument::new();
    let (first, _) = body_with_geom(&mut doc, "a");
    let nested = doc.add(first, ElementKind::Body, Some("a.1"), attrs([])).unwrap();
    let (second, _) = body_with_geom(&mut doc, "b");

    let bodies = doc.find_all(doc.world(), ElementKind::Body);
    assert_eq!(bodies, vec![first, nested, second]);
    assert_eq!(doc.find_all(first, ElementKind::Geom).len(), 1);
}

#[test]
fn attach_prefixes_names_and_remaps_references() {
    let mut model = SceneDocument::new();
    let texture = model.add_asset(ElementKind::Texture, Some("skin"), attrs([])).unwrap();
    let material = model
        .add_asset(ElementKind::Material, Some("skin_mat"), attrs([("texture", texture.into())]))
        .unwrap();
    let (_, geom) = body_with_geom(&mut model, "head");
    model.set(geom, "material", material).unwrap();

    let mut doc = SceneDocument::new();
    let frame = doc.attach(doc.world(), &model, Some("robot")).unwrap();

    assert_eq!(doc.name(frame), Some("robot"));
    let head = doc.find(ElementKind::Body, "robot/head").unwrap();
    assert_eq!(doc.parent(head), Some(frame));

    let copied_material = doc.find(ElementKind::Material, "robot/skin_mat").unwrap();
    let copied_texture = doc.find(ElementKind::Texture, "robot/skin").unwrap();
    assert_eq!(
        doc.get(copied_material, "texture").and_then(AttrValue::as_node),
        Some(copied_texture)
    );
    let copied_geom = doc.children(head)[0];
    assert_eq!(
        doc.get(copied_geom, "material").and_then(AttrValue::as_node),
        Some(copied_material)
    );
}

#[test]
fn failed_attach_leaves_the_document_untouched() {
    let mut model = SceneDocument::new();
    body_with_geom(&mut model, "head");

    let mut doc = SceneDocument::new();
    doc.attach(doc.world(), &model, None).unwrap();
    let revision = doc.revision();
    let len = doc.len();

    let err = doc.attach(doc.world(), &model, None).unwrap_err();
    assert!(matches!(err, DocumentError::DuplicateName { .. }));
    assert_eq!(doc.revision(), revision);
    assert_eq!(doc.len(), len);
}
