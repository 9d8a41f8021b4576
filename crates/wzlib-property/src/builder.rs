//! Builder for constructing property trees.
//!
//! [`PropertyBuilder`] describes a subtree as plain owned data, which is
//! handy for literals in code and tests. [`PropertyBuilder::build`] checks
//! the tree rules (unique sibling names, children only under maps) while
//! laying the nodes out in a [`PropertyTree`].

use crate::{Blob, NodeId, PropertyTree, PropertyValue, Result, Vector2D};

/// A node being built, before it is placed in a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyBuilder {
    /// Name of the node.
    pub name: String,
    /// Value of the node.
    pub value: PropertyValue,
    /// Child nodes; only valid when `value` is a map.
    pub children: Vec<PropertyBuilder>,
}

impl PropertyBuilder {
    /// Create a builder node with the given name and value.
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            children: Vec::new(),
        }
    }

    /// Create an empty map node.
    pub fn map(name: impl Into<String>) -> Self {
        Self::new(name, PropertyValue::Map)
    }

    /// Create a null node.
    pub fn null(name: impl Into<String>) -> Self {
        Self::new(name, PropertyValue::Null)
    }

    /// Create a vector node.
    pub fn vector(name: impl Into<String>, x: i32, y: i32) -> Self {
        Self::new(name, Vector2D::new(x, y))
    }

    /// Create a blob node.
    pub fn blob(name: impl Into<String>, blob: Blob) -> Self {
        Self::new(name, blob)
    }

    /// Create a cross-reference node.
    pub fn cross_ref(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, PropertyValue::CrossRef(path.into()))
    }

    /// Add a child node.
    pub fn child(mut self, child: PropertyBuilder) -> Self {
        self.children.push(child);
        self
    }

    /// Add multiple children.
    pub fn children(mut self, children: impl IntoIterator<Item = PropertyBuilder>) -> Self {
        self.children.extend(children);
        self
    }

    /// Lay this node out as the root of a new tree.
    pub fn build(self) -> Result<PropertyTree> {
        let PropertyBuilder {
            name,
            value,
            children,
        } = self;
        let mut tree = PropertyTree::new(name, value);
        let root = tree.root();
        attach_children(&mut tree, root, children)?;
        Ok(tree)
    }

    /// Lay this node out as a new child of `parent` in an existing tree.
    pub fn attach_to(self, tree: &mut PropertyTree, parent: NodeId) -> Result<NodeId> {
        let id = tree.add_child(parent, self.name, self.value)?;
        attach_children(tree, id, self.children)?;
        Ok(id)
    }
}

fn attach_children(
    tree: &mut PropertyTree,
    parent: NodeId,
    children: Vec<PropertyBuilder>,
) -> Result<()> {
    let mut pending = vec![(parent, children)];
    while let Some((parent, children)) = pending.pop() {
        for child in children {
            let id = tree.add_child(parent, child.name, child.value)?;
            if !child.children.is_empty() {
                pending.push((id, child.children));
            }
        }
    }
    Ok(())
}

impl PropertyTree {
    /// Export a subtree back into builder form.
    pub fn to_builder(&self, id: NodeId) -> Option<PropertyBuilder> {
        let node = self.node(id)?;
        Some(PropertyBuilder {
            name: node.name().to_string(),
            value: node.value().clone(),
            children: node
                .children()
                .filter_map(|child| self.to_builder(child.id()))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::*;

    #[test]
    fn test_build_simple_tree() {
        let tree = PropertyBuilder::map("root")
            .child(PropertyBuilder::new("a", 1))
            .child(PropertyBuilder::new("b", "x"))
            .child(PropertyBuilder::null("c"))
            .build()
            .unwrap();

        let root = tree.root_node();
        assert_eq!(root.child_count(), 3);
        assert_eq!(root.get_i32("a"), Some(1));
        assert_eq!(root.get_str("b"), Some("x"));
        assert!(root.get("c").is_some_and(PropertyValue::is_null));
        let names: Vec<_> = root.children().map(|n| n.name()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_build_nested() {
        let tree = PropertyBuilder::map("root")
            .child(
                PropertyBuilder::map("info")
                    .child(PropertyBuilder::vector("origin", 3, -7))
                    .child(PropertyBuilder::map("empty")),
            )
            .build()
            .unwrap();

        let origin = tree.find("info/origin").unwrap();
        assert_eq!(tree.value(origin), Some(&PropertyValue::Vector(Vector2D::new(3, -7))));
        tree.verify_integrity().unwrap();
    }

    #[test]
    fn test_build_rejects_duplicates() {
        let result = PropertyBuilder::map("root")
            .child(PropertyBuilder::new("a", 1))
            .child(PropertyBuilder::new("a", 2))
            .build();
        assert!(matches!(result, Err(Error::DuplicateName { .. })));
    }

    #[test]
    fn test_build_rejects_children_of_scalar() {
        let result = PropertyBuilder::new("x", 1)
            .child(PropertyBuilder::new("y", 2))
            .build();
        assert!(matches!(result, Err(Error::NotAContainer { .. })));
    }

    #[test]
    fn test_builder_export_round_trip() {
        let original = PropertyBuilder::map("root")
            .child(PropertyBuilder::map("m").child(PropertyBuilder::new("v", 2.5f64)))
            .child(PropertyBuilder::cross_ref("r", "m/v"));
        let tree = original.clone().build().unwrap();
        assert_eq!(tree.to_builder(tree.root()), Some(original));
    }

    #[test]
    fn test_attach_to_existing_tree() {
        let mut tree = PropertyTree::new_map("root");
        let root = tree.root();
        let id = PropertyBuilder::map("sub")
            .child(PropertyBuilder::new("n", 5i64))
            .attach_to(&mut tree, root)
            .unwrap();
        assert_eq!(tree.node(id).and_then(|n| n.get_i64("n")), Some(5));
    }
}
