//! Arena-backed property tree.
//!
//! Nodes live in a flat slot array and reference each other by [`NodeId`]:
//! each node knows its parent and the ordered ids of its children. Removed
//! slots are reused, but every reuse bumps the slot's generation, so ids
//! handed out earlier never alias a different node.

use std::fmt;

use tracing::debug;

use crate::{Error, PropertyValue, Result, Vector2D};

/// Handle to a node within one [`PropertyTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Slot index of this node.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// How many times the slot had been freed before this node took it.
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    parent: Option<NodeId>,
    value: PropertyValue,
    children: Vec<NodeId>,
    generation: u32,
    live: bool,
}

impl Slot {
    fn new(name: String, parent: Option<NodeId>, value: PropertyValue) -> Self {
        Self {
            name,
            parent,
            value,
            children: Vec::new(),
            generation: 0,
            live: true,
        }
    }

    fn holds(&self, id: NodeId) -> bool {
        self.live && self.generation == id.generation
    }
}

/// A tree of named, typed property nodes.
///
/// Sibling names are unique and only [`PropertyValue::Map`] nodes have
/// children. Equality is structural: two trees are equal when their roots
/// have the same names, values and equal children in the same order.
///
/// # Example
///
/// ```
/// use wzlib_property::{PropertyTree, PropertyValue};
///
/// let mut tree = PropertyTree::new_map("root");
/// let info = tree.add_child(tree.root(), "info", PropertyValue::Map)?;
/// tree.add_child(info, "speed", 120)?;
///
/// let speed = tree.find("info/speed")?;
/// assert_eq!(tree.path(speed).as_deref(), Some("info/speed"));
/// assert_eq!(tree.root_node().child("info").and_then(|n| n.get_i32("speed")), Some(120));
/// # Ok::<(), wzlib_property::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct PropertyTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    live: usize,
}

impl PropertyTree {
    /// Create a tree holding a single root node.
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            slots: vec![Slot::new(name.into(), None, value.into())],
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            live: 1,
        }
    }

    /// Create a tree whose root is an empty map.
    pub fn new_map(name: impl Into<String>) -> Self {
        Self::new(name, PropertyValue::Map)
    }

    /// Id of the root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// View of the root node.
    pub fn root_node(&self) -> Node<'_> {
        Node {
            tree: self,
            id: self.root,
            slot: &self.slots[self.root.index()],
        }
    }

    /// Number of live nodes, root included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.live
    }

    /// Check if `id` refers to a live node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.get(id.index()).is_some_and(|slot| slot.holds(id))
    }

    /// View of a live node.
    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.holds(id))
            .map(|slot| Node { tree: self, id, slot })
    }

    fn slot(&self, id: NodeId) -> Result<&Slot> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.holds(id))
            .ok_or(Error::InvalidNode(id))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.holds(id))
            .ok_or(Error::InvalidNode(id))
    }

    fn push(&mut self, mut slot: Slot) -> Result<NodeId> {
        let id = match self.free.pop() {
            Some(index) => {
                let reused = &mut self.slots[index as usize];
                slot.generation = reused.generation;
                *reused = slot;
                NodeId {
                    index,
                    generation: reused.generation,
                }
            }
            None => {
                let index = u32::try_from(self.slots.len()).map_err(|_| Error::TreeFull {
                    slots: self.slots.len(),
                })?;
                self.slots.push(slot);
                NodeId { index, generation: 0 }
            }
        };
        self.live += 1;
        Ok(id)
    }

    /// Name of a node.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.slot(id).ok().map(|slot| slot.name.as_str())
    }

    /// Value of a node.
    pub fn value(&self, id: NodeId) -> Option<&PropertyValue> {
        self.slot(id).ok().map(|slot| &slot.value)
    }

    /// Parent of a node; `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).ok().and_then(|slot| slot.parent)
    }

    /// Ordered children of a node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|slot| slot.children.as_slice()).unwrap_or(&[])
    }

    /// Find a direct child by name.
    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.slots[child.index()].name == name)
    }

    /// Slash-separated names from below the root down to `id`.
    ///
    /// The root itself has the empty path.
    pub fn path(&self, id: NodeId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = self.slot(id).ok()?;
        while let Some(parent) = current.parent {
            names.push(current.name.as_str());
            current = &self.slots[parent.index()];
        }
        names.reverse();
        Some(names.join("/"))
    }

    /// Ids of `id` and all its descendants, in depth-first pre-order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = if self.contains(id) { vec![id] } else { Vec::new() };
        Descendants { tree: self, stack }
    }

    fn check_insert(&self, parent: NodeId, name: &str, except: Option<NodeId>) -> Result<()> {
        let slot = self.slot(parent)?;
        if !slot.value.is_map() {
            return Err(Error::NotAContainer {
                name: slot.name.clone(),
            });
        }
        let taken = slot
            .children
            .iter()
            .any(|&child| Some(child) != except && self.slots[child.index()].name == name);
        if taken {
            return Err(Error::DuplicateName {
                parent: slot.name.clone(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Append a new child to a map node.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<NodeId> {
        let name = name.into();
        self.check_insert(parent, &name, None)?;

        let id = self.push(Slot::new(name, Some(parent), value.into()))?;
        self.slots[parent.index()].children.push(id);
        Ok(id)
    }

    /// Rename a node, keeping sibling names unique.
    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if let Some(parent) = self.slot(id)?.parent {
            self.check_insert(parent, &name, Some(id))?;
        }
        self.slot_mut(id)?.name = name;
        Ok(())
    }

    /// Replace the value of a node.
    ///
    /// Turning a map into any other kind of value drops its children.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<PropertyValue>) -> Result<()> {
        let value = value.into();
        let slot = self.slot(id)?;
        if slot.value.is_map() && !value.is_map() && !slot.children.is_empty() {
            debug!(node = %id, dropped = slot.children.len(), "map replaced by scalar");
            let children = slot.children.clone();
            for child in children {
                self.kill_subtree(child);
            }
            self.slots[id.index()].children.clear();
        }
        self.slot_mut(id)?.value = value;
        Ok(())
    }

    fn kill_subtree(&mut self, id: NodeId) {
        let doomed: Vec<NodeId> = self.descendants(id).collect();
        for dead in doomed {
            let slot = &mut self.slots[dead.index()];
            slot.live = false;
            slot.parent = None;
            slot.children = Vec::new();
            slot.value = PropertyValue::Null;
            slot.name = String::new();
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(dead.index);
            self.live -= 1;
        }
    }

    fn unlink(&mut self, id: NodeId) -> Result<NodeId> {
        let parent = self.slot(id)?.parent.ok_or(Error::InvalidNode(id))?;
        self.slots[parent.index()].children.retain(|&child| child != id);
        Ok(parent)
    }

    /// Remove a node and its subtree. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        self.unlink(id)?;
        self.kill_subtree(id);
        Ok(())
    }

    /// Remove a node and return its subtree as a standalone tree.
    ///
    /// The root cannot be detached.
    pub fn detach(&mut self, id: NodeId) -> Result<PropertyTree> {
        let subtree = self.deep_clone(id)?;
        self.remove(id)?;
        Ok(subtree)
    }

    /// Copy the subtree under `id` into a new, independent tree.
    ///
    /// The copy shares nothing with `self`; its parent and child links are
    /// verified before it is returned.
    pub fn deep_clone(&self, id: NodeId) -> Result<PropertyTree> {
        let source = self.slot(id)?;
        let mut copy = PropertyTree::new(source.name.clone(), source.value.clone());

        let mut pending = vec![(id, copy.root)];
        while let Some((from, to)) = pending.pop() {
            for &child in &self.slots[from.index()].children {
                let slot = &self.slots[child.index()];
                let new_id = copy.push(Slot::new(slot.name.clone(), Some(to), slot.value.clone()))?;
                copy.slots[to.index()].children.push(new_id);
                pending.push((child, new_id));
            }
        }

        copy.verify_integrity()?;
        Ok(copy)
    }

    /// Attach a standalone tree as a new child of a map node.
    pub fn graft(&mut self, parent: NodeId, subtree: PropertyTree) -> Result<NodeId> {
        let top = subtree.slot(subtree.root)?;
        self.check_insert(parent, &top.name, None)?;

        let new_root = self.push(Slot::new(top.name.clone(), Some(parent), top.value.clone()))?;
        self.slots[parent.index()].children.push(new_root);

        let mut pending = vec![(subtree.root, new_root)];
        while let Some((from, to)) = pending.pop() {
            for &child in &subtree.slots[from.index()].children {
                let slot = &subtree.slots[child.index()];
                let new_id = self.push(Slot::new(slot.name.clone(), Some(to), slot.value.clone()))?;
                self.slots[to.index()].children.push(new_id);
                pending.push((child, new_id));
            }
        }
        Ok(new_root)
    }

    /// Attach a copy of `template`'s node `source` under `parent`.
    ///
    /// To instantiate from the same tree, clone first:
    /// `tree.graft(parent, tree.deep_clone(source)?)`.
    pub fn instantiate(
        &mut self,
        parent: NodeId,
        template: &PropertyTree,
        source: NodeId,
    ) -> Result<NodeId> {
        let copy = template.deep_clone(source)?;
        self.graft(parent, copy)
    }

    /// Check that every link agrees with its back-reference.
    pub fn verify_integrity(&self) -> Result<()> {
        let root = self.slot(self.root).map_err(|_| {
            Error::CloneIntegrityViolation(format!("root {} is not live", self.root))
        })?;
        if root.parent.is_some() {
            return Err(Error::CloneIntegrityViolation(
                "root has a parent".to_string(),
            ));
        }

        let mut reached = 0;
        let mut pending = vec![self.root];
        while let Some(id) = pending.pop() {
            reached += 1;
            if reached > self.live {
                return Err(Error::CloneIntegrityViolation(
                    "node reachable more than once".to_string(),
                ));
            }
            for &child in &self.slots[id.index()].children {
                let slot = self.slot(child).map_err(|_| {
                    Error::CloneIntegrityViolation(format!("child {} of {} is not live", child, id))
                })?;
                if slot.parent != Some(id) {
                    return Err(Error::CloneIntegrityViolation(format!(
                        "child {} does not point back to {}",
                        child, id
                    )));
                }
                pending.push(child);
            }
        }

        if reached != self.live {
            return Err(Error::CloneIntegrityViolation(format!(
                "{} live nodes but {} reachable",
                self.live, reached
            )));
        }
        Ok(())
    }

    fn subtree_eq(&self, id: NodeId, other: &PropertyTree, other_id: NodeId) -> bool {
        let mut pending = vec![(id, other_id)];
        while let Some((a, b)) = pending.pop() {
            let (a, b) = (&self.slots[a.index()], &other.slots[b.index()]);
            if a.name != b.name || a.value != b.value || a.children.len() != b.children.len() {
                return false;
            }
            pending.extend(a.children.iter().copied().zip(b.children.iter().copied()));
        }
        true
    }
}

impl PartialEq for PropertyTree {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

/// Depth-first pre-order walk over a subtree. See [`PropertyTree::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    tree: &'a PropertyTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.slots[id.index()].children.iter().rev().copied());
        Some(id)
    }
}

/// Borrowed view of one live node.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    tree: &'a PropertyTree,
    id: NodeId,
    slot: &'a Slot,
}

impl<'a> Node<'a> {
    /// Id of this node.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Name of this node.
    #[inline]
    pub fn name(&self) -> &'a str {
        &self.slot.name
    }

    /// Value of this node.
    #[inline]
    pub fn value(&self) -> &'a PropertyValue {
        &self.slot.value
    }

    /// Parent of this node.
    pub fn parent(&self) -> Option<Node<'a>> {
        self.slot.parent.and_then(|parent| self.tree.node(parent))
    }

    /// Number of children.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.slot.children.len()
    }

    /// Iterate over the children in order.
    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let (tree, slot) = (self.tree, self.slot);
        slot.children.iter().filter_map(move |&child| tree.node(child))
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<Node<'a>> {
        self.tree.child(self.id, name).and_then(|id| self.tree.node(id))
    }

    /// Value of a direct child.
    pub fn get(&self, name: &str) -> Option<&'a PropertyValue> {
        self.child(name).map(|child| child.value())
    }

    /// Integer value of a direct child, widening shorts.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(PropertyValue::as_i32)
    }

    /// Integer value of a direct child, widening shorts and ints.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(PropertyValue::as_i64)
    }

    /// Floating-point value of a direct child.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(PropertyValue::as_f64)
    }

    /// String value of a direct child.
    pub fn get_str(&self, name: &str) -> Option<&'a str> {
        self.get(name).and_then(PropertyValue::as_str)
    }

    /// Vector value of a direct child.
    pub fn get_vector(&self, name: &str) -> Option<Vector2D> {
        self.get(name).and_then(PropertyValue::as_vector)
    }

    /// Path of this node from below the root.
    pub fn path(&self) -> String {
        self.tree.path(self.id).unwrap_or_default()
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.slot.name)
            .field("value", &self.slot.value)
            .field("children", &self.slot.children.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (PropertyTree, NodeId, NodeId) {
        let mut tree = PropertyTree::new_map("root");
        let stats = tree.add_child(tree.root(), "stats", PropertyValue::Map).unwrap();
        let hp = tree.add_child(stats, "hp", 100).unwrap();
        tree.add_child(stats, "name", "slime").unwrap();
        (tree, stats, hp)
    }

    #[test]
    fn test_parent_links() {
        let (tree, stats, hp) = sample();
        assert_eq!(tree.parent(hp), Some(stats));
        assert_eq!(tree.parent(stats), Some(tree.root()));
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(tree.node_count(), 4);
        tree.verify_integrity().unwrap();
    }

    #[test]
    fn test_duplicate_sibling_rejected() {
        let (mut tree, stats, hp) = sample();
        assert!(matches!(
            tree.add_child(stats, "hp", 5),
            Err(Error::DuplicateName { .. })
        ));
        assert!(matches!(tree.rename(hp, "name"), Err(Error::DuplicateName { .. })));
        tree.rename(hp, "hp").unwrap();
        tree.rename(hp, "health").unwrap();
        assert_eq!(tree.child(stats, "health"), Some(hp));
    }

    #[test]
    fn test_scalar_cannot_hold_children() {
        let (mut tree, _, hp) = sample();
        assert!(matches!(
            tree.add_child(hp, "x", 1),
            Err(Error::NotAContainer { .. })
        ));
    }

    #[test]
    fn test_set_value_drops_children_of_map() {
        let (mut tree, stats, hp) = sample();
        tree.set_value(stats, PropertyValue::Null).unwrap();
        assert!(tree.children(stats).is_empty());
        assert!(!tree.contains(hp));
        assert_eq!(tree.node_count(), 2);
        tree.verify_integrity().unwrap();
    }

    #[test]
    fn test_detach_returns_subtree() {
        let (mut tree, stats, hp) = sample();
        let detached = tree.detach(stats).unwrap();

        assert_eq!(tree.node_count(), 1);
        assert!(!tree.contains(hp));
        assert_eq!(tree.node(hp).map(|n| n.name().to_string()), None);
        assert_eq!(detached.root_node().name(), "stats");
        assert_eq!(detached.root_node().get_i32("hp"), Some(100));
        assert!(matches!(tree.detach(tree.root()), Err(Error::InvalidNode(_))));
    }

    #[test]
    fn test_clone_is_independent() {
        let (tree, stats, _) = sample();
        let mut copy = tree.deep_clone(stats).unwrap();
        let hp = copy.child(copy.root(), "hp").unwrap();
        copy.set_value(hp, 1).unwrap();

        assert_eq!(tree.node(stats).and_then(|n| n.get_i32("hp")), Some(100));
        assert_eq!(copy.root_node().get_i32("hp"), Some(1));
    }

    #[test]
    fn test_clone_is_structurally_equal() {
        let (tree, _, _) = sample();
        let copy = tree.deep_clone(tree.root()).unwrap();
        assert_eq!(copy, tree);

        let mut renamed = copy.clone();
        renamed.rename(renamed.root(), "other").unwrap();
        assert_ne!(renamed, tree);
    }

    #[test]
    fn test_instantiate_from_template() {
        let (template, stats, _) = sample();
        let mut tree = PropertyTree::new_map("map");
        let spawned = tree.instantiate(tree.root(), &template, stats).unwrap();

        assert_eq!(tree.parent(spawned), Some(tree.root()));
        assert_eq!(tree.path(tree.child(spawned, "hp").unwrap()).as_deref(), Some("stats/hp"));
        assert!(matches!(
            tree.instantiate(tree.root(), &template, stats),
            Err(Error::DuplicateName { .. })
        ));
        tree.verify_integrity().unwrap();
    }

    #[test]
    fn test_instantiate_within_same_tree() {
        let (mut tree, stats, _) = sample();
        let mut copy = tree.deep_clone(stats).unwrap();
        copy.rename(copy.root(), "stats2").unwrap();
        let spawned = tree.graft(tree.root(), copy).unwrap();
        assert_eq!(tree.node(spawned).and_then(|n| n.get_str("name")), Some("slime"));
        assert_eq!(tree.node_count(), 7);
    }

    #[test]
    fn test_descendants_preorder() {
        let (tree, _, _) = sample();
        let names: Vec<_> = tree
            .descendants(tree.root())
            .filter_map(|id| tree.name(id))
            .collect();
        assert_eq!(names, ["root", "stats", "hp", "name"]);
    }

    #[test]
    fn test_stale_id_is_invalid() {
        let (mut tree, _, hp) = sample();
        tree.remove(hp).unwrap();
        assert!(matches!(tree.set_value(hp, 1), Err(Error::InvalidNode(_))));
        assert!(matches!(tree.remove(hp), Err(Error::InvalidNode(_))));
    }

    #[test]
    fn test_removed_slots_are_reused() {
        let (mut tree, stats, hp) = sample();
        let slots = tree.slots.len();
        for i in 0..100 {
            let id = tree.add_child(stats, format!("buff{}", i), i).unwrap();
            tree.remove(id).unwrap();
        }
        assert_eq!(tree.slots.len(), slots + 1);

        tree.remove(hp).unwrap();
        let mp = tree.add_child(stats, "mp", 50).unwrap();
        assert_eq!(mp.index(), hp.index());
        assert_ne!(mp, hp);
        assert!(tree.node(hp).is_none());
        assert!(matches!(tree.set_value(hp, 1), Err(Error::InvalidNode(_))));
        assert_eq!(tree.node(stats).and_then(|n| n.get_i32("mp")), Some(50));
        tree.verify_integrity().unwrap();
    }
}
