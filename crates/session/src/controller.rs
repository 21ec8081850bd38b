//! The runtime half of the invalidation engine: one cached [`PhysicsSim`],
//! one staleness flag, and the rule that only a successful build clears it.

use physics::{BuildError, PhysicsSim};
use scene::SceneDocument;

#[derive(Debug)]
pub(crate) struct InvalidationController {
    runtime: Option<PhysicsSim>,
    stale: bool,
    builds: u64,
}

impl InvalidationController {
    pub(crate) const fn new() -> Self {
        Self {
            runtime: None,
            stale: true,
            builds: 0,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.stale = true;
    }

    pub(crate) const fn is_stale(&self) -> bool {
        self.stale
    }

    pub(crate) const fn builds(&self) -> u64 {
        self.builds
    }

    /// The last built runtime, fresh or not.
    pub(crate) fn current(&mut self) -> Option<&mut PhysicsSim> {
        self.runtime.as_mut()
    }

    /// A runtime reflecting `doc`, rebuilding only when stale.
    pub(crate) fn fresh(&mut self, doc: &SceneDocument) -> Result<&mut PhysicsSim, BuildError> {
        match self.runtime.take() {
            Some(runtime) if !self.stale => Ok(self.runtime.insert(runtime)),
            previous => {
                self.runtime = previous;
                self.rebuild(doc)
            }
        }
    }

    fn rebuild(&mut self, doc: &SceneDocument) -> Result<&mut PhysicsSim, BuildError> {
        match PhysicsSim::build(doc) {
            Ok(sim) => {
                self.builds += 1;
                self.stale = false;
                tracing::debug!(
                    build = %sim.id(),
                    revision = doc.revision(),
                    builds = self.builds,
                    "rebuilt runtime"
                );
                Ok(self.runtime.insert(sim))
            }
            Err(err) => {
                tracing::warn!(
                    revision = doc.revision(),
                    error = %err,
                    "runtime rebuild failed, keeping previous runtime"
                );
                Err(err)
            }
        }
    }
}
