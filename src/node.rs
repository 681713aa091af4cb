//! The closed set of node kinds and the views used to address them.
//!
//! A document is a [`Tree`] at the root; every nested value is a [`Node`]: an ordered
//! mapping ([`Tree`]), an ordered sequence ([`Branch`]) or a scalar ([`Leaf`]). Containers own
//! their children exclusively. The only link from a child back to its ancestors is its full
//! key, a plain value kept equal to `parent_full_key + "/" + name`.

use crate::key;
use crate::{Branch, Error, Leaf, Result, Tree};
use std::fmt;

/// Name, full key and depth of a node.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub(crate) struct Ident {
    pub(crate) name: String,
    pub(crate) full_key: String,
    pub(crate) nesting_level: usize,
}

impl Ident {
    /// Identity of a document root: no name, empty full key, level 0.
    pub(crate) fn root() -> Self {
        Self::default()
    }

    pub(crate) fn child(parent: &Ident, name: String) -> Self {
        Ident {
            full_key: key::make_full_key(&parent.full_key, &name),
            nesting_level: parent.nesting_level + 1,
            name,
        }
    }
}

/// Any node of a configuration tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Tree(Tree),
    Branch(Branch),
    Leaf(Leaf),
}

impl Node {
    #[must_use]
    pub fn name(&self) -> &str {
        self.as_ref().name()
    }

    #[must_use]
    pub fn full_key(&self) -> &str {
        self.as_ref().full_key()
    }

    #[must_use]
    pub fn nesting_level(&self) -> usize {
        self.as_ref().nesting_level()
    }

    /// A tree or branch without children, or a leaf without a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_ref().is_empty()
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.as_ref().kind()
    }

    #[must_use]
    pub fn as_ref(&self) -> NodeRef<'_> {
        match self {
            Node::Tree(t) => NodeRef::Tree(t),
            Node::Branch(b) => NodeRef::Branch(b),
            Node::Leaf(l) => NodeRef::Leaf(l),
        }
    }

    pub fn as_mut(&mut self) -> NodeMut<'_> {
        match self {
            Node::Tree(t) => NodeMut::Tree(t),
            Node::Branch(b) => NodeMut::Branch(b),
            Node::Leaf(l) => NodeMut::Leaf(l),
        }
    }

    #[must_use]
    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Node::Tree(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_branch(&self) -> Option<&Branch> {
        match self {
            Node::Branch(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Node::Leaf(l) => Some(l),
            _ => None,
        }
    }

    /// Finds the node with the given full key in this subtree.
    pub fn get_by_full_key(&self, full_key: &str) -> Result<NodeRef<'_>> {
        match self {
            Node::Tree(t) => t.get_by_full_key(full_key),
            Node::Branch(b) => b.get_by_full_key(full_key),
            Node::Leaf(l) => l.get_by_full_key(full_key).map(NodeRef::Leaf),
        }
    }

    pub fn get_by_full_key_mut(&mut self, full_key: &str) -> Result<NodeMut<'_>> {
        match self {
            Node::Tree(t) => t.get_by_full_key_mut(full_key),
            Node::Branch(b) => b.get_by_full_key_mut(full_key),
            Node::Leaf(l) => {
                if l.full_key() == full_key && !full_key.is_empty() {
                    Ok(NodeMut::Leaf(l))
                } else {
                    Err(Error::not_found(full_key))
                }
            }
        }
    }

    /// Deletes the node with the given full key from this subtree.
    ///
    /// See [`Tree::delete`] for the cascading rules.
    pub fn delete(&mut self, full_key: &str) -> Result<()> {
        match self {
            Node::Tree(t) => t.delete(full_key),
            Node::Branch(b) => b.delete(full_key),
            Node::Leaf(l) => l.delete(full_key),
        }
    }

    /// Visits every leaf of this subtree in document order.
    pub fn walk<F: FnMut(&Leaf)>(&self, f: &mut F) {
        match self {
            Node::Tree(t) => t.walk(f),
            Node::Branch(b) => b.walk(f),
            Node::Leaf(l) => f(l),
        }
    }

    pub(crate) fn get_in(&self, rest: &[String], path: &Path) -> Result<&Leaf> {
        match self {
            Node::Tree(t) => t.get_in(rest, path),
            Node::Branch(b) => b.get_in(rest, path),
            Node::Leaf(l) => {
                if rest.is_empty() {
                    Ok(l)
                } else {
                    Err(too_long(path, l))
                }
            }
        }
    }

    pub(crate) fn get_in_mut(&mut self, rest: &[String], path: &Path) -> Result<&mut Leaf> {
        match self {
            Node::Tree(t) => t.get_in_mut(rest, path),
            Node::Branch(b) => b.get_in_mut(rest, path),
            Node::Leaf(l) => {
                if rest.is_empty() {
                    Ok(l)
                } else {
                    Err(too_long(path, l))
                }
            }
        }
    }

    /// Re-keys this subtree so that it lives at `ident`.
    pub(crate) fn rebase(&mut self, ident: Ident) {
        match self {
            Node::Tree(t) => t.rebase(ident),
            Node::Branch(b) => b.rebase(ident),
            Node::Leaf(l) => l.rebase(ident),
        }
    }
}

fn too_long(path: &Path, leaf: &Leaf) -> Error {
    Error::invalid_path(
        &path.to_string(),
        &format!("path is too long, {:?} is already a leaf", leaf.name()),
    )
}

impl From<Tree> for Node {
    fn from(value: Tree) -> Self {
        Node::Tree(value)
    }
}

impl From<Branch> for Node {
    fn from(value: Branch) -> Self {
        Node::Branch(value)
    }
}

impl From<Leaf> for Node {
    fn from(value: Leaf) -> Self {
        Node::Leaf(value)
    }
}

/// A borrowed view of any node, including a document root that is not wrapped in [`Node`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeRef<'a> {
    Tree(&'a Tree),
    Branch(&'a Branch),
    Leaf(&'a Leaf),
}

impl<'a> NodeRef<'a> {
    #[must_use]
    pub fn name(&self) -> &'a str {
        match self {
            NodeRef::Tree(t) => t.name(),
            NodeRef::Branch(b) => b.name(),
            NodeRef::Leaf(l) => l.name(),
        }
    }

    #[must_use]
    pub fn full_key(&self) -> &'a str {
        match self {
            NodeRef::Tree(t) => t.full_key(),
            NodeRef::Branch(b) => b.full_key(),
            NodeRef::Leaf(l) => l.full_key(),
        }
    }

    #[must_use]
    pub fn nesting_level(&self) -> usize {
        match self {
            NodeRef::Tree(t) => t.nesting_level(),
            NodeRef::Branch(b) => b.nesting_level(),
            NodeRef::Leaf(l) => l.nesting_level(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            NodeRef::Tree(t) => t.is_empty(),
            NodeRef::Branch(b) => b.is_empty(),
            NodeRef::Leaf(l) => l.is_empty(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            NodeRef::Tree(_) => "tree",
            NodeRef::Branch(_) => "branch",
            NodeRef::Leaf(_) => "leaf",
        }
    }

    #[must_use]
    pub fn as_leaf(&self) -> Option<&'a Leaf> {
        match self {
            NodeRef::Leaf(l) => Some(l),
            _ => None,
        }
    }

    /// Clones the viewed subtree into an owned node.
    #[must_use]
    pub fn to_node(&self) -> Node {
        match self {
            NodeRef::Tree(t) => Node::Tree((*t).clone()),
            NodeRef::Branch(b) => Node::Branch((*b).clone()),
            NodeRef::Leaf(l) => Node::Leaf((*l).clone()),
        }
    }
}

impl<'a> From<&'a Node> for NodeRef<'a> {
    fn from(value: &'a Node) -> Self {
        value.as_ref()
    }
}

impl<'a> From<&'a Tree> for NodeRef<'a> {
    fn from(value: &'a Tree) -> Self {
        NodeRef::Tree(value)
    }
}

impl<'a> From<&'a Branch> for NodeRef<'a> {
    fn from(value: &'a Branch) -> Self {
        NodeRef::Branch(value)
    }
}

impl<'a> From<&'a Leaf> for NodeRef<'a> {
    fn from(value: &'a Leaf) -> Self {
        NodeRef::Leaf(value)
    }
}

/// A mutable view of any node.
#[derive(Debug)]
pub enum NodeMut<'a> {
    Tree(&'a mut Tree),
    Branch(&'a mut Branch),
    Leaf(&'a mut Leaf),
}

impl NodeMut<'_> {
    #[must_use]
    pub fn full_key(&self) -> &str {
        match self {
            NodeMut::Tree(t) => t.full_key(),
            NodeMut::Branch(b) => b.full_key(),
            NodeMut::Leaf(l) => l.full_key(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            NodeMut::Tree(_) => "tree",
            NodeMut::Branch(_) => "branch",
            NodeMut::Leaf(_) => "leaf",
        }
    }
}

/// Positional route from a container to a leaf: tree names and branch indices.
///
/// # Examples
///
/// ```rust
/// use kvtree::Path;
///
/// let path = Path::parse("servers/0/host");
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.to_string(), "servers/0/host");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<String>);

impl Path {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits a `/`-separated key into segments.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        Path(
            s.split(key::SEPARATOR)
                .filter(|segment| !segment.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn push<S: Into<String>>(&mut self, segment: S) {
        self.0.push(segment.into());
    }

    /// Returns a copy of this path extended by one segment.
    #[must_use]
    pub fn join<S: Into<String>>(&self, segment: S) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(key::SEPARATOR))
    }
}

impl From<Vec<String>> for Path {
    fn from(value: Vec<String>) -> Self {
        Path(value)
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Path(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;

    #[test]
    fn test_child_ident() {
        let root = Ident::root();
        let a = Ident::child(&root, "a".to_string());
        let b = Ident::child(&a, "b".to_string());
        assert_eq!(a.full_key, "a");
        assert_eq!(a.nesting_level, 1);
        assert_eq!(b.full_key, "a/b");
        assert_eq!(b.nesting_level, 2);
    }

    #[test]
    fn test_node_kinds() {
        let t = tree!({"a": {"b": 1}, "c": [1], "d": "x"});
        assert_eq!(t.get_child("a").map(Node::kind), Some("tree"));
        assert_eq!(t.get_child("c").map(Node::kind), Some("branch"));
        assert_eq!(t.get_child("d").map(Node::kind), Some("leaf"));
    }

    #[test]
    fn test_node_walk_visits_in_order() {
        let node = Node::Tree(tree!({"z": 1, "a": [2, {"m": 3}], "k": 4}));
        let mut keys = Vec::new();
        node.walk(&mut |leaf| keys.push(leaf.full_key().to_string()));
        assert_eq!(keys, vec!["z", "a/0", "a/1/m", "k"]);
    }

    #[test]
    fn test_path_display() {
        let path: Path = ["a", "0", "b"].into_iter().collect();
        assert_eq!(path.to_string(), "a/0/b");
        assert_eq!(path.join("c").len(), 4);
    }
}
