use scene::{AttrValue, DocumentError, ElementKind, SceneDocument};
use std::fs;

#[test]
fn parse_cart_scene() {
    let doc = SceneDocument::from_path("tests/data/cart.json").unwrap();

    assert_eq!(doc.count(ElementKind::Body), 2);
    assert_eq!(doc.count(ElementKind::Joint), 2);
    assert_eq!(doc.count(ElementKind::Geom), 3);
    assert_eq!(doc.count(ElementKind::Texture), 1);
    assert!((doc.options().timestep - 0.005).abs() < f32::EPSILON);

    let pole = doc.find(ElementKind::Body, "pole").unwrap();
    let cart = doc.find(ElementKind::Body, "cart").unwrap();
    assert_eq!(doc.parent(pole), Some(cart));
    let tip = doc.find_in(cart, ElementKind::Site, "tip").unwrap();
    assert!(doc.is_ancestor(pole, tip));
}

#[test]
fn references_resolve_to_asset_nodes() {
    let doc = SceneDocument::from_path("tests/data/cart.json").unwrap();
    let floor = doc.find(ElementKind::Geom, "floor").unwrap();
    let material = doc.find(ElementKind::Material, "floor_mat").unwrap();
    let texture = doc.find(ElementKind::Texture, "checker").unwrap();

    assert_eq!(doc.get(floor, "material").and_then(AttrValue::as_node), Some(material));
    assert_eq!(doc.get(material, "texture").and_then(AttrValue::as_node), Some(texture));
    assert_eq!(doc.parent(material), Some(doc.assets()));
}

#[test]
fn integers_and_floats_keep_their_type() {
    let doc = SceneDocument::from_path("tests/data/cart.json").unwrap();
    let rod = doc.find(ElementKind::Geom, "rod").unwrap();
    assert_eq!(doc.get(rod, "contype"), Some(&AttrValue::Int(0)));
    assert_eq!(doc.get(rod, "size"), Some(&AttrValue::Vector(vec![0.02, 0.3])));
    let sun = doc.find(ElementKind::Light, "sun").unwrap();
    assert_eq!(doc.get(sun, "directional"), Some(&AttrValue::Bool(true)));
}

#[test]
fn json_round_trip_preserves_the_tree() -> anyhow::Result<()> {
    let doc = SceneDocument::from_path("tests/data/cart.json")?;
    let json = doc.to_json()?;
    let reloaded = SceneDocument::from_json(&json)?;

    assert_eq!(reloaded.len(), doc.len());
    let before = serde_json::to_value(doc.to_description()?)?;
    let after = serde_json::to_value(reloaded.to_description()?)?;
    assert_eq!(before, after);
    Ok(())
}

#[test]
fn unknown_reference_is_rejected() {
    let json = fs::read_to_string("tests/data/dangling_ref.json").unwrap();
    let err = SceneDocument::from_json(&json).unwrap_err();
    assert!(matches!(err, DocumentError::UnresolvedReference(name) if name == "missing"));
}

#[test]
fn children_of_a_geom_are_rejected() {
    let json = fs::read_to_string("tests/data/bad_parent.json").unwrap();
    let err = SceneDocument::from_json(&json).unwrap_err();
    assert!(matches!(
        err,
        DocumentError::InvalidParent {
            parent: ElementKind::Geom,
            child: ElementKind::Site
        }
    ));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let err = SceneDocument::from_json("{ \"world\": [ { \"kind\": \"wheel\" } ] }").unwrap_err();
    assert!(matches!(err, DocumentError::Parse(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = SceneDocument::from_path("tests/data/does_not_exist.json").unwrap_err();
    assert!(matches!(err, DocumentError::Io(_)));
}
