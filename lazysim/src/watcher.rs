//! # Asset Hot-Reloading
//!
//! Watches the asset directory for changed texture and mesh files. The
//! notify callback runs on the watcher's own thread, so changed paths are
//! handed to the simulation loop over a channel; the loop evicts the cached
//! assets for each path through [`session::Session::invalidate_asset_path`].

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

const ASSET_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "obj", "stl"];

/// Whether `path` names a file the asset caches can hold.
#[must_use]
pub fn is_asset_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ASSET_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Start watching `directory` recursively. Every created or modified asset
/// file is sent on `changes`.
///
/// The returned watcher must be kept alive; dropping it stops the watch.
///
/// # Errors
///
/// Fails when the directory does not exist or the platform watcher cannot be
/// created.
pub fn start(directory: &Path, changes: Sender<PathBuf>) -> Result<RecommendedWatcher> {
    info!(directory = %directory.display(), "initializing asset watcher");

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => forward(&event, &changes),
        Err(e) => error!("error watching asset files: {e:?}"),
    })
    .context("failed to create file watcher")?;

    watcher
        .watch(directory, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", directory.display()))?;
    Ok(watcher)
}

fn forward(event: &Event, changes: &Sender<PathBuf>) {
    if !event.kind.is_modify() && !event.kind.is_create() {
        return;
    }
    for path in event.paths.iter().filter(|path| is_asset_file(path)) {
        debug!(path = %path.display(), "asset changed");
        // A closed channel means the simulation loop has finished.
        if changes.send(path.clone()).is_err() {
            return;
        }
    }
}
