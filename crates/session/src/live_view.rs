//! # Live View Synchronizer
//!
//! Keeps an external viewer bound to the session's runtime. A viewer is
//! opened against one compiled runtime; once the document changes that
//! binding is stale and the next [`crate::Session::sync`] hot-swaps a freshly
//! built runtime into the viewer before refreshing it.
//!
//! ```text
//! Detached --launch--> Clean --mark_dirty--> Dirty
//!    ^                   |  ^                  |
//!    +------close--------+  +------sync--------+
//! ```
//!
//! A failed rebuild during `sync` leaves the viewer on its previous
//! runtime and the binding stale.

use crate::controller::InvalidationController;
use crate::error::SessionError;
use parking_lot::Mutex;
use physics::{BuildId, PhysicsSim};
use scene::SceneDocument;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a [`LiveView`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ViewerError(pub String);

/// A display surface for a compiled runtime.
pub trait LiveView {
    /// Start showing `runtime` without taking over stepping.
    ///
    /// # Errors
    ///
    /// Implementation-specific.
    fn open(&mut self, runtime: &PhysicsSim) -> Result<(), ViewerError>;

    /// Replace the displayed runtime with a newly built one.
    ///
    /// # Errors
    ///
    /// Implementation-specific.
    fn rebind(&mut self, runtime: &PhysicsSim) -> Result<(), ViewerError>;

    /// Redraw from the current state of `runtime`.
    ///
    /// # Errors
    ///
    /// Implementation-specific.
    fn refresh(&mut self, runtime: &PhysicsSim) -> Result<(), ViewerError>;

    /// # Errors
    ///
    /// Implementation-specific.
    fn close(&mut self) -> Result<(), ViewerError>;

    fn is_running(&self) -> bool;

    /// Show `runtime` and step it until the viewer decides to stop.
    ///
    /// # Errors
    ///
    /// Implementation-specific.
    fn run(&mut self, runtime: &mut PhysicsSim) -> Result<(), ViewerError>;
}

/// How [`crate::Session::launch`] drives the viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchMode {
    /// The viewer only displays; the caller steps and calls `sync`.
    Passive,
    /// The viewer steps the runtime itself and blocks until it finishes.
    Managed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewState {
    Detached,
    Clean,
    Dirty,
}

enum Slot {
    Detached,
    Attached {
        viewer: Box<dyn LiveView>,
        stale: bool,
        bound: BuildId,
    },
}

pub(crate) struct LiveViewSync {
    slot: Slot,
}

impl fmt::Debug for LiveViewSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.slot {
            Slot::Detached => f.write_str("LiveViewSync::Detached"),
            Slot::Attached { stale, bound, .. } => f
                .debug_struct("LiveViewSync::Attached")
                .field("stale", stale)
                .field("bound", bound)
                .finish_non_exhaustive(),
        }
    }
}

impl LiveViewSync {
    pub(crate) const fn new() -> Self {
        Self {
            slot: Slot::Detached,
        }
    }

    pub(crate) fn state(&self) -> ViewState {
        match self.slot {
            Slot::Detached => ViewState::Detached,
            Slot::Attached { stale: false, .. } => ViewState::Clean,
            Slot::Attached { stale: true, .. } => ViewState::Dirty,
        }
    }

    pub(crate) fn bound(&self) -> Option<BuildId> {
        match self.slot {
            Slot::Detached => None,
            Slot::Attached { bound, .. } => Some(bound),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        match &self.slot {
            Slot::Detached => false,
            Slot::Attached { viewer, .. } => viewer.is_running(),
        }
    }

    /// Flag the binding stale. A no-op while detached.
    pub(crate) fn mark_dirty(&mut self) {
        if let Slot::Attached { stale, .. } = &mut self.slot {
            *stale = true;
        }
    }

    pub(crate) fn launch(
        &mut self,
        mut viewer: Box<dyn LiveView>,
        mode: LaunchMode,
        controller: &mut InvalidationController,
        doc: &SceneDocument,
    ) -> Result<(), SessionError> {
        if matches!(self.slot, Slot::Attached { .. }) {
            return Err(SessionError::AlreadyAttached);
        }
        let runtime = controller.fresh(doc)?;
        match mode {
            LaunchMode::Passive => {
                viewer.open(runtime)?;
                let bound = runtime.id();
                tracing::info!(build = %bound, "live view attached");
                self.slot = Slot::Attached {
                    viewer,
                    stale: false,
                    bound,
                };
            }
            LaunchMode::Managed => {
                tracing::info!(build = %runtime.id(), "running managed live view");
                viewer.run(runtime)?;
                tracing::info!("managed live view finished");
            }
        }
        Ok(())
    }

    pub(crate) fn sync(
        &mut self,
        controller: &mut InvalidationController,
        doc: &SceneDocument,
    ) -> Result<(), SessionError> {
        let Slot::Attached {
            viewer,
            stale,
            bound,
        } = &mut self.slot
        else {
            return Err(SessionError::NotAttached);
        };

        if *stale {
            let runtime = controller.fresh(doc)?;
            viewer.rebind(runtime)?;
            tracing::debug!(from = %bound, to = %runtime.id(), "live view rebound");
            *bound = runtime.id();
            *stale = false;
            viewer.refresh(runtime)?;
        } else if let Some(runtime) = controller.current() {
            viewer.refresh(runtime)?;
        }
        Ok(())
    }

    pub(crate) fn close(&mut self) -> Result<(), SessionError> {
        match std::mem::replace(&mut self.slot, Slot::Detached) {
            Slot::Detached => Err(SessionError::NotAttached),
            Slot::Attached {
                mut viewer, bound, ..
            } => {
                tracing::info!(build = %bound, "live view detached");
                viewer.close()?;
                Ok(())
            }
        }
    }
}

/// Counters recorded by a [`HeadlessViewer`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewerStats {
    pub opened: bool,
    pub closed: bool,
    pub frames: u64,
    /// Every runtime the viewer was bound to, in order.
    pub bindings: Vec<BuildId>,
    /// Pose bytes uploaded by the last refresh.
    pub uploaded_bytes: usize,
    pub close_requested: bool,
}

/// Cloneable read handle onto a [`HeadlessViewer`] that stays usable after
/// the viewer itself was handed to a session.
#[derive(Clone, Debug, Default)]
pub struct ViewerProbe(Arc<Mutex<ViewerStats>>);

impl ViewerProbe {
    #[must_use]
    pub fn stats(&self) -> ViewerStats {
        self.0.lock().clone()
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.0.lock().frames
    }

    #[must_use]
    pub fn bindings(&self) -> Vec<BuildId> {
        self.0.lock().bindings.clone()
    }

    /// Ask the viewer to stop, as a user closing its window would.
    pub fn request_close(&self) {
        self.0.lock().close_requested = true;
    }
}

/// A [`LiveView`] that draws nothing. It uploads pose records into a
/// scratch buffer and counts what happened.
#[derive(Debug, Default)]
pub struct HeadlessViewer {
    stats: ViewerProbe,
    managed_steps: usize,
    staging: Vec<u8>,
}

impl HeadlessViewer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of steps a managed run takes before returning.
    #[must_use]
    pub const fn with_managed_steps(mut self, steps: usize) -> Self {
        self.managed_steps = steps;
        self
    }

    #[must_use]
    pub fn probe(&self) -> ViewerProbe {
        self.stats.clone()
    }

    fn upload(&mut self, runtime: &PhysicsSim) {
        let poses = runtime.geom_poses();
        self.staging.clear();
        self.staging.extend_from_slice(bytemuck::cast_slice(&poses));
        let mut stats = self.stats.0.lock();
        stats.frames += 1;
        stats.uploaded_bytes = self.staging.len();
    }
}

impl LiveView for HeadlessViewer {
    fn open(&mut self, runtime: &PhysicsSim) -> Result<(), ViewerError> {
        {
            let mut stats = self.stats.0.lock();
            if stats.opened && !stats.closed {
                return Err(ViewerError("viewer is already open".to_owned()));
            }
            stats.opened = true;
            stats.closed = false;
            stats.bindings.push(runtime.id());
        }
        tracing::info!(build = %runtime.id(), geoms = runtime.geoms().len(), "headless viewer opened");
        Ok(())
    }

    fn rebind(&mut self, runtime: &PhysicsSim) -> Result<(), ViewerError> {
        self.stats.0.lock().bindings.push(runtime.id());
        tracing::debug!(build = %runtime.id(), "headless viewer rebound");
        Ok(())
    }

    fn refresh(&mut self, runtime: &PhysicsSim) -> Result<(), ViewerError> {
        {
            let stats = self.stats.0.lock();
            if !stats.opened || stats.closed {
                return Err(ViewerError("viewer is not open".to_owned()));
            }
        }
        self.upload(runtime);
        Ok(())
    }

    fn close(&mut self) -> Result<(), ViewerError> {
        self.stats.0.lock().closed = true;
        tracing::info!("headless viewer closed");
        Ok(())
    }

    fn is_running(&self) -> bool {
        let stats = self.stats.0.lock();
        stats.opened && !stats.closed && !stats.close_requested
    }

    fn run(&mut self, runtime: &mut PhysicsSim) -> Result<(), ViewerError> {
        self.open(runtime)?;
        for _ in 0..self.managed_steps {
            if !self.is_running() {
                break;
            }
            runtime.step();
            self.upload(runtime);
        }
        self.close()
    }
}
