//! # Session
//!
//! The single owner of a scene document, the runtime compiled from it, the
//! asset caches and the live view. Every path that mutates the document goes
//! through `&mut Session` and marks the compiled state dirty; the runtime is
//! only rebuilt when someone asks for it.

use crate::asset_cache::{AssetCache, AssetKey, AssetKind, CacheWarning, DerivedAsset, StoreOutcome};
use crate::assets::{create_material, create_mesh, MeshOptions, TextureOptions};
use crate::config::SessionConfig;
use crate::controller::InvalidationController;
use crate::elements::{Body, Element};
use crate::error::SessionError;
use crate::live_view::{LaunchMode, LiveView, LiveViewSync, ViewState};
use physics::{BuildId, JointType, PhysicsSim};
use scene::{attrs, AttrValue, DocumentError, ElementKind, Headlight, NodeId, SceneDocument};
use std::path::Path;

/// How [`Session::load_model`] attaches another document.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Body to attach under; the world body when `None`.
    pub parent: Option<NodeId>,
    /// Names the attachment body and prefixes every copied name.
    pub prefix: Option<String>,
    /// Move free joints of the model's top-level bodies onto the attachment
    /// body instead of rejecting the model.
    pub handle_free_joints: bool,
}

#[derive(Debug)]
pub struct Session {
    document: SceneDocument,
    controller: InvalidationController,
    live_view: LiveViewSync,
    textures: AssetCache,
    meshes: AssetCache,
    warnings: Vec<CacheWarning>,
}

impl Session {
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidArgument`] when the configured timestep
    /// is not positive and finite.
    pub fn new(document: SceneDocument, config: &SessionConfig) -> Result<Self, SessionError> {
        let mut session = Self {
            document,
            controller: InvalidationController::new(),
            live_view: LiveViewSync::new(),
            textures: AssetCache::new(AssetKind::Texture, config.texture_capacity),
            meshes: AssetCache::new(AssetKind::Mesh, config.mesh_capacity),
            warnings: Vec::new(),
        };
        if let Some(timestep) = config.timestep {
            session.set_timestep(timestep)?;
        }
        Ok(session)
    }

    /// Load the scene document at `path`.
    ///
    /// # Errors
    ///
    /// Document parse and IO errors, and the errors of [`Session::new`].
    pub fn from_path(path: impl AsRef<Path>, config: &SessionConfig) -> Result<Self, SessionError> {
        Self::new(SceneDocument::from_path(path)?, config)
    }

    #[must_use]
    pub const fn document(&self) -> &SceneDocument {
        &self.document
    }

    /// Mutate the document and mark the compiled state dirty.
    pub fn edit<R>(&mut self, edit: impl FnOnce(&mut SceneDocument) -> R) -> R {
        let result = edit(&mut self.document);
        self.mark_dirty();
        result
    }

    /// Flag the runtime, and an attached live view, as out of date.
    pub fn mark_dirty(&mut self) {
        self.controller.mark_dirty();
        self.live_view.mark_dirty();
    }

    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.controller.is_stale()
    }

    /// Number of successful runtime builds so far.
    #[must_use]
    pub const fn build_count(&self) -> u64 {
        self.controller.builds()
    }

    /// The runtime for the current document, rebuilt first if stale.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Build`] when the document does not compile.
    /// The previous runtime is kept and the session stays stale.
    pub fn runtime(&mut self) -> Result<&PhysicsSim, SessionError> {
        Ok(self.controller.fresh(&self.document)?)
    }

    /// Mutable access to runtime state, with the freshness rules of
    /// [`Session::runtime`]. Writes through it are lost on the next rebuild.
    ///
    /// # Errors
    ///
    /// See [`Session::runtime`].
    pub fn runtime_mut(&mut self) -> Result<&mut PhysicsSim, SessionError> {
        Ok(self.controller.fresh(&self.document)?)
    }

    /// # Errors
    ///
    /// See [`Session::runtime`].
    pub fn step(&mut self) -> Result<(), SessionError> {
        self.runtime_mut()?.step();
        Ok(())
    }

    /// # Errors
    ///
    /// See [`Session::runtime`].
    pub fn step_n(&mut self, steps: usize) -> Result<(), SessionError> {
        self.runtime_mut()?.step_n(steps);
        Ok(())
    }

    #[must_use]
    pub const fn timestep(&self) -> f32 {
        self.document.options().timestep
    }

    /// # Errors
    ///
    /// Returns [`SessionError::InvalidArgument`] unless `timestep` is
    /// positive and finite.
    pub fn set_timestep(&mut self, timestep: f32) -> Result<(), SessionError> {
        if !(timestep.is_finite() && timestep > 0.0) {
            return Err(SessionError::InvalidArgument("timestep must be positive and finite"));
        }
        self.edit(|doc| doc.update_options(|options| options.timestep = timestep));
        Ok(())
    }

    #[must_use]
    pub const fn headlight(&self) -> Headlight {
        self.document.options().headlight
    }

    pub fn set_headlight(&mut self, headlight: Headlight) {
        self.edit(|doc| doc.update_options(|options| options.headlight = headlight));
    }

    /// Attach a copy of `model` to this session's document.
    ///
    /// # Errors
    ///
    /// [`SessionError::FreeJointNotAllowed`] when a top-level body of `model`
    /// carries a free joint and `options.handle_free_joints` is off, and the
    /// document errors of [`SceneDocument::attach`]. The document is left
    /// untouched on error.
    pub fn load_model(&mut self, model: &SceneDocument, options: &LoadOptions) -> Result<Body, SessionError> {
        let free_joints = top_level_free_joints(model);
        if free_joints.is_empty() {
            return self.attach(model, options, false);
        }
        if !options.handle_free_joints {
            let body = model
                .parent(free_joints[0])
                .and_then(|body| model.name(body).map(str::to_owned))
                .unwrap_or_else(|| free_joints[0].to_string());
            return Err(SessionError::FreeJointNotAllowed { body });
        }

        let mut stripped = model.clone();
        for joint in free_joints {
            stripped.remove(joint)?;
        }
        self.attach(&stripped, options, true)
    }

    /// Like [`Session::load_model`], letting `on_loaded` edit the model
    /// before it is attached.
    ///
    /// # Errors
    ///
    /// Errors returned by `on_loaded`, then those of [`Session::load_model`].
    pub fn load_model_with(
        &mut self,
        mut model: SceneDocument,
        options: &LoadOptions,
        on_loaded: impl FnOnce(&mut SceneDocument) -> Result<(), DocumentError>,
    ) -> Result<Body, SessionError> {
        on_loaded(&mut model)?;
        self.load_model(&model, options)
    }

    fn attach(&mut self, model: &SceneDocument, options: &LoadOptions, free: bool) -> Result<Body, SessionError> {
        let parent = options.parent.unwrap_or_else(|| self.document.world());
        let prefix = options.prefix.as_deref();
        let frame = self.edit(|doc| -> Result<NodeId, DocumentError> {
            let frame = doc.attach(parent, model, prefix)?;
            if free {
                doc.add(
                    frame,
                    ElementKind::Joint,
                    None,
                    attrs([("type", JointType::Free.as_str().into())]),
                )?;
            }
            Ok(frame)
        })?;
        tracing::debug!(%frame, prefix, free, "attached model");
        Ok(Body::wrap(frame))
    }

    #[must_use]
    pub fn texture(&self, key: &AssetKey) -> Option<&DerivedAsset> {
        self.textures.get(key)
    }

    #[must_use]
    pub fn mesh(&self, key: &AssetKey) -> Option<&DerivedAsset> {
        self.meshes.get(key)
    }

    #[must_use]
    pub const fn textures(&self) -> &AssetCache {
        &self.textures
    }

    #[must_use]
    pub const fn meshes(&self) -> &AssetCache {
        &self.meshes
    }

    /// # Errors
    ///
    /// [`DocumentError::RootRemoval`] when `asset`, or the entry it would
    /// replace or evict, owns a document root.
    pub fn store_texture(&mut self, key: AssetKey, asset: DerivedAsset) -> Result<StoreOutcome, SessionError> {
        let revision = self.document.revision();
        let outcome = self.textures.store(&mut self.document, key, asset);
        self.mark_dirty_since(revision);
        Ok(self.stored(outcome?))
    }

    /// # Errors
    ///
    /// See [`Session::store_texture`].
    pub fn store_mesh(&mut self, key: AssetKey, asset: DerivedAsset) -> Result<StoreOutcome, SessionError> {
        let revision = self.document.revision();
        let outcome = self.meshes.store(&mut self.document, key, asset);
        self.mark_dirty_since(revision);
        Ok(self.stored(outcome?))
    }

    /// Evict a texture entry. Returns `false` if `key` was not cached.
    ///
    /// # Errors
    ///
    /// Document errors raised during teardown.
    pub fn remove_texture(&mut self, key: &AssetKey) -> Result<bool, SessionError> {
        let revision = self.document.revision();
        let removed = self.textures.remove(&mut self.document, key);
        self.mark_dirty_since(revision);
        Ok(removed?)
    }

    /// Evict a mesh entry. Returns `false` if `key` was not cached.
    ///
    /// # Errors
    ///
    /// Document errors raised during teardown.
    pub fn remove_mesh(&mut self, key: &AssetKey) -> Result<bool, SessionError> {
        let revision = self.document.revision();
        let removed = self.meshes.remove(&mut self.document, key);
        self.mark_dirty_since(revision);
        Ok(removed?)
    }

    /// Mark dirty if the document moved past `revision`, whether or not the
    /// operation that moved it succeeded.
    fn mark_dirty_since(&mut self, revision: u64) {
        if self.document.revision() != revision {
            self.mark_dirty();
        }
    }

    fn stored(&mut self, outcome: StoreOutcome) -> StoreOutcome {
        self.mark_dirty();
        if let Some(warning) = &outcome.warning {
            self.warnings.push(warning.clone());
        }
        outcome
    }

    /// The material for the texture at `path`, creating it on a cache miss.
    /// Textures are keyed by path and mapping.
    ///
    /// # Errors
    ///
    /// Document errors from creating or evicting asset nodes.
    pub fn load_texture(&mut self, path: &str, options: &TextureOptions) -> Result<NodeId, SessionError> {
        let key = AssetKey::qualified(path, options.mapping.as_str());
        if let Some(root) = self.cached_root(AssetKind::Texture, &key)? {
            return Ok(root);
        }
        let revision = self.document.revision();
        let asset = create_material(&mut self.document, path, options);
        self.mark_dirty_since(revision);
        let asset = asset?;
        let material = asset.root;
        self.store_texture(key, asset)?;
        Ok(material)
    }

    /// The mesh asset for `path`, creating it on a cache miss.
    ///
    /// # Errors
    ///
    /// Document errors from creating or evicting asset nodes.
    pub fn load_mesh(&mut self, path: &str, options: &MeshOptions) -> Result<NodeId, SessionError> {
        let key = AssetKey::new(path);
        if let Some(root) = self.cached_root(AssetKind::Mesh, &key)? {
            return Ok(root);
        }
        let revision = self.document.revision();
        let asset = create_mesh(&mut self.document, path, options);
        self.mark_dirty_since(revision);
        let asset = asset?;
        let mesh = asset.root;
        self.store_mesh(key, asset)?;
        Ok(mesh)
    }

    /// The cached root for `key`. An entry whose root was removed from the
    /// document behind the cache's back is dropped and reported as a miss.
    fn cached_root(&mut self, kind: AssetKind, key: &AssetKey) -> Result<Option<NodeId>, SessionError> {
        let cache = match kind {
            AssetKind::Texture => &self.textures,
            AssetKind::Mesh => &self.meshes,
        };
        let Some(root) = cache.get(key).map(|asset| asset.root) else {
            return Ok(None);
        };
        if self.document.contains(root) {
            tracing::debug!(%kind, %key, "asset cache hit");
            return Ok(Some(root));
        }
        tracing::debug!(%kind, %key, %root, "cached asset was removed from the document, reloading");
        match kind {
            AssetKind::Texture => self.remove_texture(key)?,
            AssetKind::Mesh => self.remove_mesh(key)?,
        };
        Ok(None)
    }

    /// Evict every texture and mesh derived from `path`, so the next load
    /// reads the file again. Returns the number of evicted entries.
    ///
    /// # Errors
    ///
    /// Document errors raised during teardown.
    pub fn invalidate_asset_path(&mut self, path: &str) -> Result<usize, SessionError> {
        let mut evicted = 0;
        for key in self.textures.keys_for_path(path) {
            evicted += usize::from(self.remove_texture(&key)?);
        }
        for key in self.meshes.keys_for_path(path) {
            evicted += usize::from(self.remove_mesh(&key)?);
        }
        if evicted > 0 {
            tracing::debug!(path, evicted, "invalidated cached assets");
        }
        Ok(evicted)
    }

    /// Cache warnings recorded since the last call.
    pub fn warnings(&mut self) -> Vec<CacheWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Attach `viewer`. A passive viewer stays attached until
    /// [`Session::close`]; a managed one runs to completion first.
    ///
    /// # Errors
    ///
    /// [`SessionError::AlreadyAttached`], build errors and viewer errors.
    pub fn launch(&mut self, viewer: impl LiveView + 'static, mode: LaunchMode) -> Result<(), SessionError> {
        self.live_view
            .launch(Box::new(viewer), mode, &mut self.controller, &self.document)
    }

    /// Push the current state to the attached viewer, rebinding it to a
    /// rebuilt runtime first if the document changed.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotAttached`], build errors and viewer errors.
    pub fn sync(&mut self) -> Result<(), SessionError> {
        self.live_view.sync(&mut self.controller, &self.document)
    }

    /// # Errors
    ///
    /// [`SessionError::NotAttached`] and viewer errors.
    pub fn close(&mut self) -> Result<(), SessionError> {
        self.live_view.close()
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.live_view.state() != ViewState::Detached
    }

    #[must_use]
    pub fn is_live_view_stale(&self) -> bool {
        self.live_view.state() == ViewState::Dirty
    }

    #[must_use]
    pub fn live_view_state(&self) -> ViewState {
        self.live_view.state()
    }

    /// The runtime the attached viewer currently shows.
    #[must_use]
    pub fn live_view_build(&self) -> Option<BuildId> {
        self.live_view.bound()
    }

    #[must_use]
    pub fn is_live_view_running(&self) -> bool {
        self.live_view.is_running()
    }
}

fn top_level_free_joints(model: &SceneDocument) -> Vec<NodeId> {
    model
        .children(model.world())
        .iter()
        .filter(|&&body| model.kind(body) == Some(ElementKind::Body))
        .flat_map(|&body| model.children(body).iter().copied())
        .filter(|&joint| {
            model.kind(joint) == Some(ElementKind::Joint)
                && model.get(joint, "type").and_then(AttrValue::as_text) == Some(JointType::Free.as_str())
        })
        .collect()
}
