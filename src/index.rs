//! Full key to path index.
//!
//! Resolving a full key walks the tree from the root and compares keys level by level. The
//! index resolves every leaf's full key once, up front, to the positional [`Path`] of tree
//! names and branch positions that reaches it, so later lookups follow the path directly.

use crate::node::{Node, Path};
use crate::{Branch, Tree};
use std::collections::HashMap;
use tracing::debug;

/// Maps the full key of every leaf of a tree to its [`Path`].
///
/// The index is a snapshot: it has to be rebuilt after the tree changes shape.
///
/// # Examples
///
/// ```rust
/// use kvtree::{tree, Index, Path};
///
/// let t = tree!({"a": {"b": 1, "c": [1, 2, 3]}});
/// let index = Index::build(&t);
///
/// assert_eq!(index.len(), 4);
/// assert_eq!(index.get("a/c/2"), Some(&Path::parse("a/c/2")));
/// assert!(!index.contains("a/c"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Index {
    paths: HashMap<String, Path>,
}

impl Index {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every leaf of `tree`.
    #[must_use]
    pub fn build(tree: &Tree) -> Self {
        let mut index = Index::new();
        index.add_tree(tree, &Path::new());
        debug!(entries = index.len(), "index built");
        index
    }

    /// Drops every entry and indexes `tree` again.
    pub fn rebuild(&mut self, tree: &Tree) {
        self.clear();
        self.add_tree(tree, &Path::new());
        debug!(entries = self.len(), "index rebuilt");
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Indexes the leaves of `node`, which is reached from the root through `path`.
    pub fn add_node(&mut self, node: &Node, path: &Path) {
        match node {
            Node::Tree(t) => self.add_tree(t, path),
            Node::Branch(b) => self.add_branch(b, path),
            Node::Leaf(l) => {
                self.paths.insert(l.full_key().to_string(), path.clone());
            }
        }
    }

    fn add_tree(&mut self, tree: &Tree, path: &Path) {
        for (name, child) in tree.iter() {
            self.add_node(child, &path.join(name));
        }
    }

    fn add_branch(&mut self, branch: &Branch, path: &Path) {
        for (position, child) in branch.iter().enumerate() {
            self.add_node(child, &path.join(position.to_string()));
        }
    }

    #[must_use]
    pub fn get(&self, full_key: &str) -> Option<&Path> {
        self.paths.get(full_key)
    }

    #[must_use]
    pub fn contains(&self, full_key: &str) -> bool {
        self.paths.contains_key(full_key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterates over the entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> + '_ {
        self.paths.iter().map(|(key, path)| (key.as_str(), path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;

    #[test]
    fn test_every_leaf_resolves_through_its_path() {
        let t = tree!({"a": {"b": 1, "c": [1, {"d": [true]}]}, "e": null});
        let index = Index::build(&t);

        assert_eq!(index.len(), 4);
        for (key, path) in index.iter() {
            assert_eq!(t.get(path).unwrap().full_key(), key);
        }
    }

    #[test]
    fn test_containers_are_not_indexed() {
        let t = tree!({"a": {"b": []}});
        let index = Index::build(&t);
        assert!(index.is_empty());
        assert!(!index.contains("a"));
    }

    #[test]
    fn test_rebuild_drops_stale_entries() {
        let mut t = tree!({"a": 1, "b": 2});
        let mut index = Index::build(&t);
        t.delete("a").unwrap();
        index.rebuild(&t);
        assert!(!index.contains("a"));
        assert!(index.contains("b"));
    }
}
