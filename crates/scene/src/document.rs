//! # Scene Document Tree
//!
//! Slot-arena storage for the node tree. Every node owns its attribute map
//! and the ordered list of its children. Two roots exist from construction
//! on: the world body and the asset section.

use crate::error::DocumentError;
use crate::types::{AttrValue, Attrs, ElementKind, NodeId, Options};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug)]
struct Node {
    kind: ElementKind,
    name: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attrs: Attrs,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Mutable, hierarchical description of a simulated world.
#[derive(Clone, Debug)]
pub struct SceneDocument {
    slots: Vec<Slot>,
    free: Vec<u32>,
    names: HashMap<(ElementKind, String), NodeId>,
    world: NodeId,
    assets: NodeId,
    options: Options,
    revision: u64,
}

impl SceneDocument {
    /// Create a document holding only the world and asset roots.
    #[must_use]
    pub fn new() -> Self {
        let root = |kind| Slot {
            generation: 0,
            node: Some(Node {
                kind,
                name: None,
                parent: None,
                children: Vec::new(),
                attrs: Attrs::new(),
            }),
        };
        Self {
            slots: vec![root(ElementKind::World), root(ElementKind::Assets)],
            free: Vec::new(),
            names: HashMap::new(),
            world: NodeId::new(0, 0),
            assets: NodeId::new(1, 0),
            options: Options::default(),
            revision: 0,
        }
    }

    /// Root of the kinematic tree.
    #[must_use]
    pub const fn world(&self) -> NodeId {
        self.world
    }

    /// Root of the asset section.
    #[must_use]
    pub const fn assets(&self) -> NodeId {
        self.assets
    }

    /// Monotonic counter advanced by every successful mutation.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Edit the world options in place.
    pub fn update_options(&mut self, edit: impl FnOnce(&mut Options)) {
        edit(&mut self.options);
        self.touch();
    }

    /// Number of live nodes, roots included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    /// A document is empty when it holds nothing but its two roots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 2
    }

    /// Number of live nodes of `kind`.
    #[must_use]
    pub fn count(&self, kind: ElementKind) -> usize {
        self.live_nodes().filter(|(_, node)| node.kind == kind).count()
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<ElementKind> {
        self.node(id).map(|node| node.kind)
    }

    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(|node| node.name.as_deref())
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    /// Direct children in insertion order; empty for unknown nodes.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |node| node.children.as_slice())
    }

    #[must_use]
    pub fn attrs(&self, id: NodeId) -> Option<&Attrs> {
        self.node(id).map(|node| &node.attrs)
    }

    #[must_use]
    pub fn get(&self, id: NodeId, key: &str) -> Option<&AttrValue> {
        self.node(id).and_then(|node| node.attrs.get(key))
    }

    /// Find a node by kind and name anywhere in the document.
    #[must_use]
    pub fn find(&self, kind: ElementKind, name: &str) -> Option<NodeId> {
        self.names.get(&(kind, name.to_owned())).copied()
    }

    /// Find a named node of `kind` inside the subtree rooted at `scope`.
    #[must_use]
    pub fn find_in(&self, scope: NodeId, kind: ElementKind, name: &str) -> Option<NodeId> {
        self.find(kind, name)
            .filter(|&found| self.is_ancestor(scope, found))
    }

    /// All nodes of `kind` below `scope`, depth first, in document order.
    #[must_use]
    pub fn find_all(&self, scope: NodeId, kind: ElementKind) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| self.kind(id) == Some(kind))
            .collect()
    }

    /// Every node below `scope` (exclusive), depth first.
    #[must_use]
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// True when `ancestor` is `node` or one of its parents.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Add a node under `parent`.
    ///
    /// # Errors
    ///
    /// Fails when the parent is unknown, cannot own `kind`, the name is taken
    /// for this kind, or an attribute references a node that does not exist.
    pub fn add(
        &mut self,
        parent: NodeId,
        kind: ElementKind,
        name: Option<&str>,
        attrs: Attrs,
    ) -> Result<NodeId, DocumentError> {
        let parent_kind = self.kind(parent).ok_or(DocumentError::UnknownNode(parent))?;
        if kind.is_root() || !parent_kind.accepts_child(kind) {
            return Err(DocumentError::InvalidParent {
                parent: parent_kind,
                child: kind,
            });
        }
        if let Some(name) = name {
            if self.find(kind, name).is_some() {
                return Err(DocumentError::DuplicateName {
                    kind,
                    name: name.to_owned(),
                });
            }
        }
        for value in attrs.values() {
            self.check_reference(value)?;
        }

        let node = Node {
            kind,
            name: name.map(str::to_owned),
            parent: Some(parent),
            children: Vec::new(),
            attrs,
        };
        let id = self.allocate(node);
        if let Some(parent) = self.node_mut(parent) {
            parent.children.push(id);
        }
        if let Some(name) = name {
            self.names.insert((kind, name.to_owned()), id);
        }
        self.touch();
        tracing::trace!(%id, %kind, "added node");
        Ok(id)
    }

    /// Add an asset (texture, material, mesh) to the asset section.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SceneDocument::add`].
    pub fn add_asset(
        &mut self,
        kind: ElementKind,
        name: Option<&str>,
        attrs: Attrs,
    ) -> Result<NodeId, DocumentError> {
        self.add(self.assets, kind, name, attrs)
    }

    /// Remove a node and its whole subtree.
    ///
    /// Every `Ref` attribute left in the document that pointed into the
    /// removed subtree is dropped. Returns the number of removed nodes.
    ///
    /// # Errors
    ///
    /// Fails for unknown nodes and for the two roots.
    pub fn remove(&mut self, id: NodeId) -> Result<usize, DocumentError> {
        let kind = self.kind(id).ok_or(DocumentError::UnknownNode(id))?;
        if kind.is_root() {
            return Err(DocumentError::RootRemoval(kind));
        }

        let mut doomed = self.descendants(id);
        doomed.push(id);

        if let Some(parent) = self.parent(id) {
            if let Some(parent) = self.node_mut(parent) {
                parent.children.retain(|&child| child != id);
            }
        }
        for &node in &doomed {
            self.release(node);
        }

        let doomed: HashSet<NodeId> = doomed.into_iter().collect();
        let mut scrubbed = 0usize;
        for slot in &mut self.slots {
            if let Some(node) = slot.node.as_mut() {
                let before = node.attrs.len();
                node.attrs
                    .retain(|_, value| !matches!(value, AttrValue::Ref(target) if doomed.contains(target)));
                scrubbed += before - node.attrs.len();
            }
        }

        self.touch();
        tracing::trace!(%id, removed = doomed.len(), scrubbed, "removed subtree");
        Ok(doomed.len())
    }

    /// Write an attribute.
    ///
    /// # Errors
    ///
    /// Fails for unknown nodes and for references to unknown nodes.
    pub fn set(
        &mut self,
        id: NodeId,
        key: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), DocumentError> {
        let value = value.into();
        self.check_reference(&value)?;
        let node = self.node_mut(id).ok_or(DocumentError::UnknownNode(id))?;
        node.attrs.insert(key.to_owned(), value);
        self.touch();
        Ok(())
    }

    /// Remove an attribute, returning its previous value.
    ///
    /// # Errors
    ///
    /// Fails for unknown nodes.
    pub fn unset(&mut self, id: NodeId, key: &str) -> Result<Option<AttrValue>, DocumentError> {
        let node = self.node_mut(id).ok_or(DocumentError::UnknownNode(id))?;
        let previous = node.attrs.remove(key);
        if previous.is_some() {
            self.touch();
        }
        Ok(previous)
    }

    /// Copy the content of `model` into this document.
    ///
    /// A new body is created under `parent` and the world content of `model`
    /// is placed below it; the model's assets join the asset section. With a
    /// `prefix`, the attachment body is named after it and every copied name
    /// becomes `prefix/name`. The operation is atomic: on error the document
    /// is left untouched.
    ///
    /// # Errors
    ///
    /// Fails on unknown or invalid parents and on name collisions.
    pub fn attach(
        &mut self,
        parent: NodeId,
        model: &SceneDocument,
        prefix: Option<&str>,
    ) -> Result<NodeId, DocumentError> {
        let mut staged = self.clone();
        let frame = staged.add(parent, ElementKind::Body, prefix, Attrs::new())?;

        let mut mapping: HashMap<NodeId, NodeId> = HashMap::new();
        mapping.insert(model.world, frame);
        mapping.insert(model.assets, staged.assets);

        // Nodes first, references once every target exists.
        let mut pending = Vec::new();
        for source in model.descendants(model.assets).into_iter().chain(model.descendants(model.world)) {
            let Some(node) = model.node(source) else { continue };
            let target_parent = node
                .parent
                .and_then(|parent| mapping.get(&parent).copied())
                .ok_or(DocumentError::UnknownNode(source))?;
            let name = node.name.as_deref().map(|name| match prefix {
                Some(prefix) => format!("{prefix}/{name}"),
                None => name.to_owned(),
            });
            let (plain, references): (Attrs, Attrs) = node
                .attrs
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .partition(|(_, value)| value.as_node().is_none());
            let copied = staged.add(target_parent, node.kind, name.as_deref(), plain)?;
            mapping.insert(source, copied);
            if !references.is_empty() {
                pending.push((copied, references));
            }
        }
        for (copied, references) in pending {
            for (key, value) in references {
                let Some(target) = value.as_node().and_then(|old| mapping.get(&old).copied()) else {
                    continue;
                };
                staged.set(copied, &key, target)?;
            }
        }

        *self = staged;
        Ok(frame)
    }

    fn check_reference(&self, value: &AttrValue) -> Result<(), DocumentError> {
        match value {
            AttrValue::Ref(target) if !self.contains(*target) => {
                Err(DocumentError::UnknownNode(*target))
            }
            _ => Ok(()),
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation == id.generation() {
            slot.node.as_ref()
        } else {
            None
        }
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation == id.generation() {
            slot.node.as_mut()
        } else {
            None
        }
    }

    fn live_nodes(&self) -> impl Iterator<Item = (u32, &Node)> {
        self.slots
            .iter()
            .zip(0u32..)
            .filter_map(|(slot, index)| slot.node.as_ref().map(|node| (index, node)))
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId::new(index, slot.generation)
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId::new(index, 0)
        }
    }

    fn release(&mut self, id: NodeId) {
        let Some(slot) = self.slots.get_mut(id.index() as usize) else { return };
        if slot.generation != id.generation() {
            return;
        }
        if let Some(node) = slot.node.take() {
            if let Some(name) = node.name {
                self.names.remove(&(node.kind, name));
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index());
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::attrs;

    #[test]
    fn freed_slots_are_reused_with_a_new_generation() {
        let mut doc = SceneDocument::new();
        let first = doc.add(doc.world(), ElementKind::Body, None, attrs([])).unwrap();
        doc.remove(first).unwrap();
        let second = doc.add(doc.world(), ElementKind::Body, None, attrs([])).unwrap();

        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
        assert!(!doc.contains(first));
        assert!(doc.contains(second));
    }

    #[test]
    fn roots_cannot_be_removed() {
        let mut doc = SceneDocument::new();
        let world = doc.world();
        assert!(matches!(
            doc.remove(world),
            Err(DocumentError::RootRemoval(ElementKind::World))
        ));
        assert_eq!(doc.revision(), 0);
    }
}
