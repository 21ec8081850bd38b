//! # Asset Cache
//!
//! A capacity-bounded map from a logical resource key to the document nodes
//! derived from that resource. Loading the same texture or mesh twice reuses
//! the nodes created the first time instead of adding new ones.
//!
//! Entries are evicted in insertion order (FIFO). Reading an entry does not
//! refresh its position. Every entry owns its nodes: eviction, replacement
//! and manual removal all delete them from the document, dependents first.

use indexmap::IndexMap;
use scene::{DocumentError, NodeId, SceneDocument};
use std::fmt;
use std::num::NonZeroUsize;

/// The category an [`AssetCache`] holds. Each category has its own cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Texture,
    Mesh,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Texture => "texture",
            Self::Mesh => "mesh",
        })
    }
}

/// Logical identity of a loaded resource: its path plus an optional
/// qualifier such as a texture mapping mode.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssetKey {
    path: String,
    qualifier: Option<String>,
}

impl AssetKey {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            qualifier: None,
        }
    }

    #[must_use]
    pub fn qualified(path: impl Into<String>, qualifier: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            qualifier: Some(qualifier.into()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}_{qualifier}", self.path),
            None => f.write_str(&self.path),
        }
    }
}

/// Document nodes created from one resource. `root` is the node callers
/// reference (a material, a mesh); `dependents` are nodes only the root
/// refers to (the material's texture).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedAsset {
    pub root: NodeId,
    pub dependents: Vec<NodeId>,
}

impl DerivedAsset {
    #[must_use]
    pub const fn new(root: NodeId) -> Self {
        Self {
            root,
            dependents: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_dependents(root: NodeId, dependents: Vec<NodeId>) -> Self {
        Self { root, dependents }
    }

    fn owns(&self, node: NodeId) -> bool {
        self.root == node || self.dependents.contains(&node)
    }

    /// Nodes a teardown would remove: everything owned that `keep` does not
    /// also own.
    fn doomed<'a>(&'a self, keep: Option<&'a Self>) -> impl Iterator<Item = NodeId> + 'a {
        self.dependents
            .iter()
            .chain(std::iter::once(&self.root))
            .copied()
            .filter(move |&node| !keep.is_some_and(|keep| keep.owns(node)))
    }

    /// Fail if a teardown could not complete, before anything is removed.
    fn check_teardown(&self, doc: &SceneDocument, keep: Option<&Self>) -> Result<(), DocumentError> {
        match self.doomed(keep).find_map(|node| doc.kind(node).filter(|kind| kind.is_root())) {
            Some(root) => Err(DocumentError::RootRemoval(root)),
            None => Ok(()),
        }
    }

    /// Remove the asset's nodes from `doc`, skipping any node `keep` owns
    /// and any node that is already gone.
    fn teardown(&self, doc: &mut SceneDocument, keep: Option<&Self>) -> Result<(), DocumentError> {
        self.check_teardown(doc, keep)?;
        for node in self.doomed(keep) {
            if doc.contains(node) {
                doc.remove(node)?;
            }
        }
        Ok(())
    }
}

/// Non-fatal conditions reported by [`AssetCache::store`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheWarning {
    /// Storing a new key into a full cache evicted its oldest entry.
    CapacityExceeded {
        kind: AssetKind,
        capacity: usize,
        evicted: AssetKey,
    },
}

impl fmt::Display for CacheWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                kind,
                capacity,
                evicted,
            } => write!(
                f,
                "{kind} cache capacity of {capacity} exceeded, evicted `{evicted}`"
            ),
        }
    }
}

/// What a successful [`AssetCache::store`] did besides inserting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreOutcome {
    /// The key was already present and its previous asset was torn down.
    pub replaced: bool,
    pub warning: Option<CacheWarning>,
}

#[derive(Clone, Debug)]
pub struct AssetCache {
    kind: AssetKind,
    capacity: Option<NonZeroUsize>,
    entries: IndexMap<AssetKey, DerivedAsset>,
}

impl AssetCache {
    /// A cache for `kind`. A capacity of `None` or zero means unbounded.
    #[must_use]
    pub fn new(kind: AssetKind, capacity: Option<usize>) -> Self {
        Self {
            kind,
            capacity: capacity.and_then(NonZeroUsize::new),
            entries: IndexMap::new(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> AssetKind {
        self.kind
    }

    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity.map(NonZeroUsize::get)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &AssetKey) -> Option<&DerivedAsset> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &AssetKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = (&AssetKey, &DerivedAsset)> {
        self.entries.iter()
    }

    /// Every key derived from `path`, whatever its qualifier.
    #[must_use]
    pub fn keys_for_path(&self, path: &str) -> Vec<AssetKey> {
        self.entries
            .keys()
            .filter(|key| key.path == path)
            .cloned()
            .collect()
    }

    /// Insert `asset` under `key`.
    ///
    /// An existing entry for `key` is torn down and replaced; the new asset
    /// moves to the back of the eviction order. A new key inserted into a
    /// full cache first evicts the oldest entry, so the cache never holds
    /// more than its capacity.
    ///
    /// # Errors
    ///
    /// [`DocumentError::RootRemoval`] when `asset` or the entry it would
    /// replace or evict owns a document root. The cache and the document are
    /// left untouched in that case.
    pub fn store(
        &mut self,
        doc: &mut SceneDocument,
        key: AssetKey,
        asset: DerivedAsset,
    ) -> Result<StoreOutcome, DocumentError> {
        asset.check_teardown(doc, None)?;
        if let Some(previous) = self.entries.get(&key) {
            previous.check_teardown(doc, Some(&asset))?;
        } else if let Some(oldest) = self.overflowing() {
            oldest.check_teardown(doc, Some(&asset))?;
        }

        if let Some(previous) = self.entries.shift_remove(&key) {
            previous.teardown(doc, Some(&asset))?;
            tracing::debug!(kind = %self.kind, %key, "replaced cached asset");
            self.entries.insert(key, asset);
            return Ok(StoreOutcome {
                replaced: true,
                warning: None,
            });
        }

        let mut outcome = StoreOutcome::default();
        let full = self.overflowing().is_some();
        if let Some(capacity) = self.capacity.filter(|_| full) {
            if let Some((evicted, oldest)) = self.entries.shift_remove_index(0) {
                oldest.teardown(doc, Some(&asset))?;
                tracing::warn!(
                    kind = %self.kind,
                    capacity = capacity.get(),
                    %evicted,
                    "asset cache capacity exceeded, evicted oldest entry"
                );
                outcome.warning = Some(CacheWarning::CapacityExceeded {
                    kind: self.kind,
                    capacity: capacity.get(),
                    evicted,
                });
            }
        }
        self.entries.insert(key, asset);
        Ok(outcome)
    }

    /// Evict `key` and tear down its asset. Absent keys are a no-op and
    /// return `false`.
    ///
    /// # Errors
    ///
    /// [`DocumentError::RootRemoval`] when the entry owns a document root;
    /// the entry then stays cached and the document is untouched.
    pub fn remove(&mut self, doc: &mut SceneDocument, key: &AssetKey) -> Result<bool, DocumentError> {
        let Some(asset) = self.entries.get(key) else {
            return Ok(false);
        };
        asset.check_teardown(doc, None)?;
        if let Some(asset) = self.entries.shift_remove(key) {
            asset.teardown(doc, None)?;
            tracing::debug!(kind = %self.kind, %key, "removed cached asset");
        }
        Ok(true)
    }

    /// The entry the next new key would evict, if the cache is full.
    fn overflowing(&self) -> Option<&DerivedAsset> {
        let capacity = self.capacity?;
        if self.entries.len() < capacity.get() {
            return None;
        }
        self.entries.get_index(0).map(|(_, asset)| asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::{attrs, ElementKind};

    fn texture(doc: &mut SceneDocument) -> DerivedAsset {
        DerivedAsset::new(doc.add_asset(ElementKind::Texture, None, attrs([])).unwrap())
    }

    #[test]
    fn zero_capacity_is_unbounded() {
        let mut doc = SceneDocument::new();
        let mut cache = AssetCache::new(AssetKind::Texture, Some(0));
        for i in 0..50 {
            let asset = texture(&mut doc);
            let outcome = cache.store(&mut doc, AssetKey::new(format!("{i}.png")), asset).unwrap();
            assert!(outcome.warning.is_none());
        }
        assert_eq!(cache.len(), 50);
        assert_eq!(cache.capacity(), None);
    }

    #[test]
    fn restoring_the_same_asset_keeps_its_nodes() {
        let mut doc = SceneDocument::new();
        let mut cache = AssetCache::new(AssetKind::Texture, None);
        let asset = texture(&mut doc);
        let key = AssetKey::new("a.png");

        cache.store(&mut doc, key.clone(), asset.clone()).unwrap();
        let outcome = cache.store(&mut doc, key.clone(), asset.clone()).unwrap();

        assert!(outcome.replaced);
        assert!(doc.contains(asset.root));
        assert_eq!(cache.get(&key), Some(&asset));
    }

    #[test]
    fn refused_replacement_leaves_cache_and_document_alone() {
        let mut doc = SceneDocument::new();
        let mut cache = AssetCache::new(AssetKind::Texture, Some(1));
        let asset = texture(&mut doc);
        let key = AssetKey::new("a.png");
        cache.store(&mut doc, key.clone(), asset.clone()).unwrap();
        let revision = doc.revision();

        let rooted = DerivedAsset::with_dependents(doc.world(), vec![asset.root]);
        assert!(matches!(
            cache.store(&mut doc, key.clone(), rooted.clone()),
            Err(DocumentError::RootRemoval(ElementKind::World))
        ));
        assert!(matches!(
            cache.store(&mut doc, AssetKey::new("b.png"), rooted),
            Err(DocumentError::RootRemoval(ElementKind::World))
        ));

        assert_eq!(doc.revision(), revision);
        assert_eq!(cache.get(&key), Some(&asset));
        assert!(doc.contains(asset.root));
    }

    #[test]
    fn key_display_joins_path_and_qualifier() {
        assert_eq!(AssetKey::qualified("wood.png", "cube").to_string(), "wood.png_cube");
        assert_eq!(AssetKey::new("mug.obj").to_string(), "mug.obj");
    }
}
