//! Ordered mapping nodes.

use crate::key;
use crate::node::{Ident, Node, NodeMut, NodeRef, Path};
use crate::{Error, Leaf, Result};
use indexmap::IndexMap;

/// An ordered mapping from names to nodes.
///
/// Entries keep document order. Replacing an existing name keeps its position, new names are
/// appended. Every child is keyed under this tree: its full key is this tree's full key joined
/// with its name.
///
/// # Examples
///
/// ```rust
/// use kvtree::{Leaf, Tree};
///
/// let mut server = Tree::new();
/// server.insert("host", Leaf::new("localhost"));
/// server.insert("port", Leaf::new(8080));
///
/// let mut root = Tree::new();
/// root.insert("server", server);
///
/// let port = root.get_by_full_key("server/port").unwrap();
/// assert_eq!(port.full_key(), "server/port");
/// assert_eq!(port.nesting_level(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Tree {
    pub(crate) ident: Ident,
    content: IndexMap<String, Node>,
}

impl Tree {
    /// Creates an empty document root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_ident(ident: Ident) -> Self {
        Tree {
            ident,
            content: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.ident.name
    }

    #[must_use]
    pub fn full_key(&self) -> &str {
        &self.ident.full_key
    }

    #[must_use]
    pub fn nesting_level(&self) -> usize {
        self.ident.nesting_level
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Iterates over the entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> + '_ {
        self.content.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.content.keys().map(String::as_str)
    }

    #[must_use]
    pub fn get_child(&self, name: &str) -> Option<&Node> {
        self.content.get(name)
    }

    pub fn get_child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.content.get_mut(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.content.contains_key(name)
    }

    /// Adds a child, or replaces the child of the same name in place.
    ///
    /// The node and all of its descendants are re-keyed under this tree. Returns the replaced
    /// child, if any.
    pub fn insert<K, N>(&mut self, name: K, node: N) -> Option<Node>
    where
        K: Into<String>,
        N: Into<Node>,
    {
        let name = name.into();
        let mut node = node.into();
        node.rebase(Ident::child(&self.ident, name.clone()));
        self.content.insert(name, node)
    }

    /// Adds a child that is already keyed under this tree.
    pub(crate) fn push_child(&mut self, node: Node) -> Option<Node> {
        self.content.insert(node.name().to_string(), node)
    }

    /// Removes a child by name, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<Node> {
        self.content.shift_remove(name)
    }

    /// Looks up the leaf at the end of a positional path.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidPath`] if the path ends before a leaf or continues past one,
    /// [`Error::NotFound`] if a segment names nothing and [`Error::InvalidIndex`] if a branch
    /// segment is not a position.
    pub fn get(&self, path: &Path) -> Result<&Leaf> {
        self.get_in(path.segments(), path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Result<&mut Leaf> {
        self.get_in_mut(path.segments(), path)
    }

    pub(crate) fn get_in(&self, rest: &[String], path: &Path) -> Result<&Leaf> {
        let Some((head, tail)) = rest.split_first() else {
            return Err(self.too_short(path));
        };
        self.content
            .get(head)
            .ok_or_else(|| Error::not_found(&key::make_full_key(self.full_key(), head)))?
            .get_in(tail, path)
    }

    pub(crate) fn get_in_mut(&mut self, rest: &[String], path: &Path) -> Result<&mut Leaf> {
        let Some((head, tail)) = rest.split_first() else {
            return Err(self.too_short(path));
        };
        let missing = key::make_full_key(self.full_key(), head);
        self.content
            .get_mut(head)
            .ok_or_else(|| Error::not_found(&missing))?
            .get_in_mut(tail, path)
    }

    fn too_short(&self, path: &Path) -> Error {
        Error::invalid_path(
            &path.to_string(),
            &format!("path is too short, {:?} is a tree", self.full_key()),
        )
    }

    /// Finds the node with the given full key in this subtree, this tree included.
    ///
    /// The query is matched one segment at a time; each level passes the whole query down.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the key is empty, lies outside this tree or names nothing.
    pub fn get_by_full_key(&self, full_key: &str) -> Result<NodeRef<'_>> {
        match key::descend(self.full_key(), full_key)? {
            None => Ok(NodeRef::Tree(self)),
            Some(segment) => self
                .content
                .get(segment)
                .ok_or_else(|| Error::not_found(full_key))?
                .get_by_full_key(full_key),
        }
    }

    pub fn get_by_full_key_mut(&mut self, full_key: &str) -> Result<NodeMut<'_>> {
        match key::descend(self.full_key(), full_key)? {
            None => Ok(NodeMut::Tree(self)),
            Some(segment) => match self.content.get_mut(segment) {
                Some(child) => child.get_by_full_key_mut(full_key),
                None => Err(Error::not_found(full_key)),
            },
        }
    }

    /// Deletes the node with the given full key from this subtree.
    ///
    /// A container that becomes empty because of a nested delete is removed from its parent
    /// as well, all the way up to this tree, which always survives.
    ///
    /// # Errors
    ///
    /// [`Error::ForbiddenDelete`] if `full_key` addresses this tree, [`Error::NotFound`] if it
    /// addresses nothing.
    pub fn delete(&mut self, full_key: &str) -> Result<()> {
        let forbidden = || Error::ForbiddenDelete {
            key: full_key.to_string(),
        };
        if full_key == self.full_key() {
            return Err(forbidden());
        }
        let Some(segment) = key::descend(self.full_key(), full_key)? else {
            return Err(forbidden());
        };
        let is_final = key::make_full_key(self.full_key(), segment) == full_key;

        let child = self
            .content
            .get_mut(segment)
            .ok_or_else(|| Error::not_found(full_key))?;
        if !is_final {
            child.delete(full_key)?;
            if !child.is_empty() {
                return Ok(());
            }
        }

        self.content.shift_remove(segment);
        Ok(())
    }

    /// Visits every leaf in document order, depth first.
    pub fn walk<F: FnMut(&Leaf)>(&self, f: &mut F) {
        for child in self.content.values() {
            child.walk(f);
        }
    }

    pub(crate) fn rebase(&mut self, ident: Ident) {
        self.ident = ident;
        let parent = &self.ident;
        for (name, child) in self.content.iter_mut() {
            child.rebase(Ident::child(parent, name.clone()));
        }
    }
}

/// Trees are equal when they hold the same entries in the same order.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.ident == other.ident && self.content.iter().eq(other.content.iter())
    }
}

impl<K, N> FromIterator<(K, N)> for Tree
where
    K: Into<String>,
    N: Into<Node>,
{
    fn from_iter<T: IntoIterator<Item = (K, N)>>(iter: T) -> Self {
        let mut tree = Tree::new();
        for (name, node) in iter {
            tree.insert(name, node);
        }
        tree
    }
}
