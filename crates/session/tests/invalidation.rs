use physics::BuildError;
use scene::{attrs, ElementKind, Headlight, SceneDocument};
use session::elements::{Element, Geom, GeomOptions, Transform};
use session::{Session, SessionConfig, SessionError};

fn session() -> Session {
    Session::from_path("tests/data/world.json", &SessionConfig::default()).unwrap()
}

#[test]
fn a_new_session_is_stale_until_first_use() {
    let mut session = session();
    assert!(session.is_stale());
    assert_eq!(session.build_count(), 0);

    session.runtime().unwrap();
    assert!(!session.is_stale());
    assert_eq!(session.build_count(), 1);
}

#[test]
fn many_edits_coalesce_into_one_rebuild() {
    let mut session = session();
    session.runtime().unwrap();

    for i in 0..25u8 {
        let z = 1.0 + f32::from(i);
        Geom::create(
            &mut session,
            None,
            &GeomOptions {
                pos: [0.0, 0.0, z],
                ..GeomOptions::default()
            },
        )
        .unwrap();
    }
    assert!(session.is_stale());
    assert_eq!(session.build_count(), 1);

    let runtime = session.runtime().unwrap();
    assert_eq!(runtime.geoms().len(), 27);
    assert_eq!(session.build_count(), 2);

    session.runtime().unwrap();
    session.step_n(10).unwrap();
    assert_eq!(session.build_count(), 2, "clean reads and steps never rebuild");
}

#[test]
fn runtime_always_reflects_the_latest_edit() {
    let mut session = session();
    let table = session.document().find(ElementKind::Body, "table").unwrap();
    assert!((session.runtime().unwrap().position(table).unwrap().z - 0.5).abs() < 1e-6);

    session.edit(|doc| doc.set(table, "pos", [0.0_f32, 0.0, 2.0])).unwrap();

    let runtime = session.runtime().unwrap();
    assert!((runtime.position(table).unwrap().z - 2.0).abs() < 1e-6);
    assert_eq!(runtime.source_revision(), session.document().revision());
}

#[test]
fn failed_rebuild_keeps_the_session_stale() {
    let mut session = session();
    session.runtime().unwrap();
    let top = Geom::get(&session, "table_top").unwrap();

    session.edit(|doc| doc.set(top.node(), "type", "blob")).unwrap();
    let err = session.runtime().unwrap_err();
    assert!(matches!(err, SessionError::Build(BuildError::UnknownGeomType { .. })));
    assert!(session.is_stale());
    assert_eq!(session.build_count(), 1);
    assert!(session.step().is_err(), "stepping needs a fresh runtime too");

    session.edit(|doc| doc.set(top.node(), "type", "box")).unwrap();
    session.runtime().unwrap();
    assert!(!session.is_stale());
    assert_eq!(session.build_count(), 2);
}

#[test]
fn runtime_state_writes_do_not_survive_a_rebuild() {
    let mut session = session();
    let ball = Geom::create(
        &mut session,
        None,
        &GeomOptions {
            pos: [0.0, 0.0, 3.0],
            ..GeomOptions::default()
        },
    )
    .unwrap();
    let body = ball.body(&session).unwrap();
    session
        .edit(|doc| doc.add(body.node(), ElementKind::Joint, None, attrs([("type", "free".into())])))
        .unwrap();

    session.step_n(50).unwrap();
    let fallen = ball.position(&mut session).unwrap()[2];
    assert!(fallen < 3.0);

    session.mark_dirty();
    let restarted = ball.position(&mut session).unwrap()[2];
    assert!((restarted - 3.0).abs() < 1e-6, "a rebuild starts from the document");
    assert_eq!(session.runtime().unwrap().steps(), 0);
}

#[test]
fn option_writes_mark_dirty() {
    let mut session = session();
    session.runtime().unwrap();

    session.set_timestep(0.002).unwrap();
    assert!(session.is_stale());
    assert!((session.runtime().unwrap().timestep() - 0.002).abs() < f32::EPSILON);

    session.set_headlight(Headlight {
        active: false,
        ..Headlight::default()
    });
    assert!(session.is_stale());
    assert!(!session.runtime().unwrap().headlight().active);
}

#[test]
fn rejects_non_positive_timesteps() {
    let mut session = session();
    session.runtime().unwrap();
    for timestep in [0.0, -0.01, f32::NAN, f32::INFINITY] {
        assert!(matches!(
            session.set_timestep(timestep),
            Err(SessionError::InvalidArgument(_))
        ));
    }
    assert!(!session.is_stale(), "rejected writes leave the runtime alone");
}

#[test]
fn config_timestep_overrides_the_document() {
    let config = SessionConfig::default().with_timestep(0.005);
    let mut session = Session::from_path("tests/data/world.json", &config).unwrap();
    assert!((session.timestep() - 0.005).abs() < f32::EPSILON);
    assert!((session.runtime().unwrap().timestep() - 0.005).abs() < f32::EPSILON);

    let config = SessionConfig::default().with_timestep(-1.0);
    assert!(Session::new(SceneDocument::new(), &config).is_err());
}

#[test]
fn removing_an_element_invalidates_the_runtime() {
    let mut session = session();
    let top = Geom::get(&session, "table_top").unwrap();
    assert_eq!(session.runtime().unwrap().geoms().len(), 2);

    assert_eq!(top.remove(&mut session).unwrap(), 1);
    assert!(!top.exists(&session));
    assert_eq!(session.runtime().unwrap().geoms().len(), 1);
    assert!(matches!(top.position(&mut session), Err(SessionError::Unbound(_))));
}
