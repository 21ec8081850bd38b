//! # Simulation Driver
//!
//! [`run`] loads a scene into a [`Session`], attaches a passive
//! [`HeadlessViewer`] and steps the simulation. Every `spawn_every` steps a
//! randomly placed falling cube is added; the following [`Session::sync`]
//! rebuilds the runtime once and rebinds the viewer to it. Asset files
//! changed on disk are evicted from the caches between steps.

use crate::watcher;
use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::Receiver;
use physics::JointType;
use scene::Headlight;
use session::elements::{Element, Geom, GeomOptions, Joint, JointOptions, Textured};
use session::{HeadlessViewer, LaunchMode, Session, SessionConfig, TextureOptions};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Step a scene while spawning objects into it")]
pub struct Args {
    /// Scene description to load.
    pub scene: PathBuf,
    /// Session configuration (cache capacities, timestep override).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Directory watched for texture and mesh changes.
    #[arg(long, default_value = "assets")]
    pub assets: PathBuf,
    /// Texture for spawned cubes, relative to the asset directory.
    #[arg(long)]
    pub texture: Option<String>,
    #[arg(long, default_value_t = 1000)]
    pub steps: usize,
    /// Spawn a cube every this many steps; 0 disables spawning.
    #[arg(long, default_value_t = 100)]
    pub spawn_every: usize,
}

/// Run the simulation loop described by `args`.
///
/// # Errors
///
/// Returns configuration and scene loading errors, and any build error of
/// the session once the scene has been edited.
pub fn run(args: &Args) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match &args.config {
        Some(path) => SessionConfig::from_path(path).with_context(|| format!("loading {}", path.display()))?,
        None => SessionConfig::default(),
    };
    let mut session = Session::from_path(&args.scene, &config)
        .with_context(|| format!("loading {}", args.scene.display()))?;
    session.set_headlight(Headlight {
        active: false,
        ..session.headlight()
    });

    // Watcher events carry absolute paths; cache keys must use the same form.
    let assets = std::fs::canonicalize(&args.assets).unwrap_or_else(|_| args.assets.clone());
    let (sender, changes) = crossbeam_channel::unbounded();
    let _asset_watcher = match watcher::start(&assets, sender) {
        Ok(watcher_instance) => {
            tracing::info!("Asset watcher started successfully.");
            Some(watcher_instance)
        }
        Err(e) => {
            tracing::error!("Failed to start asset watcher: {e:?}");
            None
        }
    };
    let texture = args
        .texture
        .as_ref()
        .map(|name| assets.join(name).display().to_string());

    let viewer = HeadlessViewer::new();
    let probe = viewer.probe();
    session.launch(viewer, LaunchMode::Passive)?;

    tracing::info!(steps = args.steps, timestep = session.timestep(), "starting simulation loop");
    for i in 1..=args.steps {
        session.step()?;

        if args.spawn_every > 0 && i % args.spawn_every == 0 {
            let cube = spawn_cube(&mut session, texture.as_deref())?;
            tracing::info!(step = i, cube = %cube.node(), "spawned cube");
        }
        reload_changed_assets(&mut session, &changes)?;

        if !session.is_live_view_running() {
            tracing::info!(step = i, "viewer closed, stopping");
            break;
        }
        session.sync()?;

        if i % 50 == 0 {
            let runtime = session.runtime()?;
            tracing::info!(
                step = i,
                time = runtime.time(),
                bodies = runtime.bodies().len(),
                "simulation step complete"
            );
        }
    }

    for warning in session.warnings() {
        tracing::warn!("{warning}");
    }
    let stats = probe.stats();
    tracing::info!(
        builds = session.build_count(),
        bindings = stats.bindings.len(),
        frames = stats.frames,
        "simulation loop finished"
    );
    if session.is_attached() {
        session.close()?;
    }
    Ok(())
}

/// Drop a free-falling cube at a random spot above the origin.
fn spawn_cube(session: &mut Session, texture: Option<&str>) -> Result<Geom> {
    let options = GeomOptions {
        size: vec![0.05; 3],
        pos: [
            fastrand::f32() * 2.0 - 1.0,
            fastrand::f32() * 2.0 - 1.0,
            1.5 + fastrand::f32(),
        ],
        color: [fastrand::f32(), fastrand::f32(), fastrand::f32(), 1.0],
        ..GeomOptions::default()
    };
    let cube = Geom::create(session, None, &options)?;
    let free = JointOptions {
        joint_type: JointType::Free,
        ..JointOptions::default()
    };
    let body = cube.body(session)?;
    Joint::create(session, body, &free)?;
    if let Some(path) = texture {
        cube.set_texture(session, path, &TextureOptions::default())?;
    }
    Ok(cube)
}

fn reload_changed_assets(session: &mut Session, changes: &Receiver<PathBuf>) -> Result<()> {
    for path in changes.try_iter() {
        let evicted = session.invalidate_asset_path(&path_key(&path))?;
        if evicted > 0 {
            tracing::info!(path = %path.display(), evicted, "reloading asset");
        }
    }
    Ok(())
}

fn path_key(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_have_sensible_defaults() {
        let args = Args::try_parse_from(["lazysim", "scene.json"]).unwrap();
        assert_eq!(args.scene, PathBuf::from("scene.json"));
        assert_eq!(args.assets, PathBuf::from("assets"));
        assert_eq!(args.steps, 1000);
        assert_eq!(args.spawn_every, 100);
        assert!(args.config.is_none() && args.texture.is_none());

        let args = Args::try_parse_from(["lazysim", "s.json", "--steps", "10", "--spawn-every", "0"]).unwrap();
        assert_eq!((args.steps, args.spawn_every), (10, 0));
    }

    #[test]
    fn spawned_cubes_fall_freely() {
        let mut session = Session::new(scene::SceneDocument::new(), &SessionConfig::default()).unwrap();
        let cube = spawn_cube(&mut session, None).unwrap();
        let body = cube.body(&session).unwrap();
        assert!(body.is_free(&session));
        assert!(session.runtime().unwrap().body(body.node()).unwrap().free);
    }

    #[test]
    fn changed_paths_evict_cached_assets() {
        let mut session = Session::new(scene::SceneDocument::new(), &SessionConfig::default()).unwrap();
        let path = PathBuf::from("/assets/wood.png");
        session.load_texture(&path_key(&path), &TextureOptions::default()).unwrap();

        let (sender, receiver) = crossbeam_channel::unbounded();
        sender.send(path).unwrap();
        reload_changed_assets(&mut session, &receiver).unwrap();

        assert!(session.textures().is_empty());
    }
}
