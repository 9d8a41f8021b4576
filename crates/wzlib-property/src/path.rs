//! Slash-delimited path lookup and cross-reference resolution.
//!
//! Segments name children; `..` steps to the parent and `.` or an empty
//! segment stays in place. Lookups never mutate the tree, so resolving the
//! same path twice always yields the same node.

use crate::{Error, NodeId, PropertyTree, Result};

impl PropertyTree {
    /// Walk `path` starting at `from`.
    pub fn resolve(&self, from: NodeId, path: &str) -> Result<NodeId> {
        if !self.contains(from) {
            return Err(Error::InvalidNode(from));
        }

        let mut current = from;
        for segment in path.split('/') {
            let next = match segment {
                "" | "." => Some(current),
                ".." => self.parent(current),
                name => self.child(current, name),
            };
            current = next.ok_or_else(|| Error::PathNotFound {
                path: path.to_string(),
                segment: segment.to_string(),
            })?;
        }
        Ok(current)
    }

    /// Walk `path` starting at the root.
    pub fn find(&self, path: &str) -> Result<NodeId> {
        self.resolve(self.root(), path)
    }

    /// Follow the path stored in a cross-reference node.
    ///
    /// The path is taken relative to the node's parent, so a sibling is
    /// reached by its bare name. Only one hop is taken: if the target is
    /// itself a cross-reference it is returned as is.
    pub fn resolve_cross_reference(&self, id: NodeId) -> Result<NodeId> {
        let node = self.node(id).ok_or(Error::InvalidNode(id))?;
        let path = node
            .value()
            .as_cross_ref()
            .ok_or_else(|| Error::NotACrossReference {
                name: node.name().to_string(),
            })?;
        let base = node.parent().map_or(id, |parent| parent.id());
        self.resolve(base, path)
    }
}

#[cfg(test)]
mod tests {
    use crate::PropertyValue;

    use super::*;

    fn sample() -> (PropertyTree, NodeId, NodeId) {
        let mut tree = PropertyTree::new_map("Mob.img");
        let root = tree.root();
        let stand = tree.add_child(root, "stand", PropertyValue::Map).unwrap();
        let frame = tree.add_child(stand, "0", 42).unwrap();
        let move_ = tree.add_child(root, "move", PropertyValue::Map).unwrap();
        let link = tree
            .add_child(move_, "0", PropertyValue::CrossRef("../stand/0".into()))
            .unwrap();
        (tree, frame, link)
    }

    #[test]
    fn test_resolve_child_path() {
        let (tree, frame, _) = sample();
        assert_eq!(tree.find("stand/0").unwrap(), frame);
        assert_eq!(tree.find("").unwrap(), tree.root());
        assert_eq!(tree.find("./stand//0").unwrap(), frame);
    }

    #[test]
    fn test_resolve_parent_segment() {
        let (tree, frame, _) = sample();
        let stand = tree.parent(frame).unwrap();
        assert_eq!(tree.resolve(frame, "..").unwrap(), stand);
        assert_eq!(tree.resolve(frame, "../..").unwrap(), tree.root());
    }

    #[test]
    fn test_resolve_above_root_fails() {
        let (tree, _, _) = sample();
        match tree.find("..") {
            Err(Error::PathNotFound { segment, .. }) => assert_eq!(segment, ".."),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_missing_segment() {
        let (tree, _, _) = sample();
        match tree.find("stand/7/x") {
            Err(Error::PathNotFound { path, segment }) => {
                assert_eq!(path, "stand/7/x");
                assert_eq!(segment, "7");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_cross_reference_is_idempotent() {
        let (tree, frame, link) = sample();
        assert_eq!(tree.resolve_cross_reference(link).unwrap(), frame);
        assert_eq!(tree.resolve_cross_reference(link).unwrap(), frame);
        assert_eq!(tree.value(link).and_then(|v| v.as_cross_ref()), Some("../stand/0"));
    }

    #[test]
    fn test_cross_reference_on_plain_node() {
        let (tree, frame, _) = sample();
        assert!(matches!(
            tree.resolve_cross_reference(frame),
            Err(Error::NotACrossReference { .. })
        ));
    }
}
