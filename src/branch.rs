//! Ordered sequence nodes.

use crate::key;
use crate::node::{Ident, Node, NodeMut, NodeRef, Path};
use crate::{Error, Leaf, Result};

/// An ordered sequence of nodes.
///
/// Elements are named by their position, so the third element of the branch `servers` has
/// the full key `servers/2`. Removing an element renumbers the ones after it.
///
/// # Examples
///
/// ```rust
/// use kvtree::{Branch, Leaf, Tree};
///
/// let mut ports = Branch::new();
/// ports.push(Leaf::new(80));
/// ports.push(Leaf::new(443));
///
/// let mut root = Tree::new();
/// root.insert("ports", ports);
/// assert_eq!(root.get_by_full_key("ports/1").unwrap().name(), "1");
///
/// root.delete("ports/0").unwrap();
/// let port = root.get_by_full_key("ports/0").unwrap();
/// assert_eq!(port.as_leaf().unwrap().value().unwrap().as_i64(), Some(443));
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Branch {
    pub(crate) ident: Ident,
    content: Vec<Node>,
}

impl Branch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_ident(ident: Ident) -> Self {
        Branch {
            ident,
            content: Vec::new(),
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

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.content.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Node> {
        self.content.get(index)
    }

    /// Appends an element, keying it by its position.
    pub fn push<N: Into<Node>>(&mut self, node: N) {
        let mut node = node.into();
        node.rebase(Ident::child(&self.ident, self.content.len().to_string()));
        self.content.push(node);
    }

    /// Appends an element that is already keyed under this branch.
    pub(crate) fn push_child(&mut self, node: Node) {
        self.content.push(node);
    }

    /// Re-keys the element at `index` under a name other than its position.
    ///
    /// Positional lookups no longer reach the element afterwards.
    pub(crate) fn rename_element(&mut self, index: usize, name: String) {
        let ident = Ident::child(&self.ident, name);
        if let Some(element) = self.content.get_mut(index) {
            element.rebase(ident);
        }
    }

    /// Parses a position segment of `query`.
    ///
    /// Only the canonical decimal form names an element: `01` or `+1` parse as numbers but
    /// address nothing, so they fail with [`Error::NotFound`] for `query`.
    fn parse_index(&self, segment: &str, query: &str) -> Result<usize> {
        match segment.parse::<usize>() {
            Ok(index) if index.to_string() == segment => Ok(index),
            Ok(_) => Err(Error::not_found(query)),
            Err(_) => Err(Error::InvalidIndex {
                branch: self.full_key().to_string(),
                segment: segment.to_string(),
            }),
        }
    }

    pub(crate) fn get_in(&self, rest: &[String], path: &Path) -> Result<&Leaf> {
        let Some((head, tail)) = rest.split_first() else {
            return Err(self.too_short(path));
        };
        let missing = key::make_full_key(self.full_key(), head);
        let index = self.parse_index(head, &missing)?;
        self.content
            .get(index)
            .ok_or_else(|| Error::not_found(&missing))?
            .get_in(tail, path)
    }

    pub(crate) fn get_in_mut(&mut self, rest: &[String], path: &Path) -> Result<&mut Leaf> {
        let Some((head, tail)) = rest.split_first() else {
            return Err(self.too_short(path));
        };
        let missing = key::make_full_key(self.full_key(), head);
        let index = self.parse_index(head, &missing)?;
        self.content
            .get_mut(index)
            .ok_or_else(|| Error::not_found(&missing))?
            .get_in_mut(tail, path)
    }

    fn too_short(&self, path: &Path) -> Error {
        Error::invalid_path(
            &path.to_string(),
            &format!("path is too short, {:?} is a branch", self.full_key()),
        )
    }

    /// Finds the node with the given full key in this branch, the branch included.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for misses and out-of-range positions, [`Error::InvalidIndex`] if
    /// the segment under this branch is not a position.
    pub fn get_by_full_key(&self, full_key: &str) -> Result<NodeRef<'_>> {
        match key::descend(self.full_key(), full_key)? {
            None => Ok(NodeRef::Branch(self)),
            Some(segment) => {
                let index = self.parse_index(segment, full_key)?;
                self.content
                    .get(index)
                    .ok_or_else(|| Error::not_found(full_key))?
                    .get_by_full_key(full_key)
            }
        }
    }

    pub fn get_by_full_key_mut(&mut self, full_key: &str) -> Result<NodeMut<'_>> {
        match key::descend(self.full_key(), full_key)? {
            None => Ok(NodeMut::Branch(self)),
            Some(segment) => {
                let index = self.parse_index(segment, full_key)?;
                match self.content.get_mut(index) {
                    Some(child) => child.get_by_full_key_mut(full_key),
                    None => Err(Error::not_found(full_key)),
                }
            }
        }
    }

    /// Deletes the node with the given full key from this branch.
    ///
    /// Follows the same cascading rules as [`Tree::delete`](crate::Tree::delete).
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
        let index = self.parse_index(segment, full_key)?;

        let child = self
            .content
            .get_mut(index)
            .ok_or_else(|| Error::not_found(full_key))?;
        if !is_final {
            child.delete(full_key)?;
            if !child.is_empty() {
                return Ok(());
            }
        }

        self.content.remove(index);
        self.renumber_from(index);
        Ok(())
    }

    pub fn walk<F: FnMut(&Leaf)>(&self, f: &mut F) {
        for child in &self.content {
            child.walk(f);
        }
    }

    pub(crate) fn rebase(&mut self, ident: Ident) {
        self.ident = ident;
        self.renumber_from(0);
    }

    fn renumber_from(&mut self, start: usize) {
        let parent = &self.ident;
        for (index, child) in self.content.iter_mut().enumerate().skip(start) {
            child.rebase(Ident::child(parent, index.to_string()));
        }
    }
}

impl<N: Into<Node>> FromIterator<N> for Branch {
    fn from_iter<T: IntoIterator<Item = N>>(iter: T) -> Self {
        let mut branch = Branch::new();
        for node in iter {
            branch.push(node);
        }
        branch
    }
}

impl<'a> IntoIterator for &'a Branch {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;

    #[test]
    fn test_elements_named_by_position() {
        let t = tree!({"c": [1, {"d": 2}, [3]]});
        assert_eq!(t.get_by_full_key("c/0").unwrap().kind(), "leaf");
        assert_eq!(t.get_by_full_key("c/1/d").unwrap().nesting_level(), 3);
        assert_eq!(t.get_by_full_key("c/2/0").unwrap().full_key(), "c/2/0");
    }

    #[test]
    fn test_non_numeric_segment() {
        let t = tree!({"c": [1]});
        assert!(matches!(
            t.get_by_full_key("c/x"),
            Err(Error::InvalidIndex { .. })
        ));
        assert!(t.get_by_full_key("c/1").unwrap_err().is_not_found());
    }

    #[test]
    fn test_non_canonical_position_names_nothing() {
        let mut t = tree!({"list": ["x", "y", "z"]});
        for key in ["list/01", "list/+1", "list/00"] {
            assert!(t.get_by_full_key(key).unwrap_err().is_not_found());
            assert!(t.delete(key).unwrap_err().is_not_found());
        }
        assert!(t.get(&Path::parse("list/01")).unwrap_err().is_not_found());
        assert_eq!(t, tree!({"list": ["x", "y", "z"]}));
    }

    #[test]
    fn test_delete_renumbers() {
        let mut t = tree!({"c": ["a", "b", "c"]});
        t.delete("c/0").unwrap();
        let c = t.get_by_full_key("c/1").unwrap().as_leaf().unwrap();
        assert_eq!(c.as_str(), Some("c"));
        assert_eq!(c.full_key(), "c/1");
        assert!(t.get_by_full_key("c/2").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_cascades_through_elements() {
        let mut t = tree!({"c": [{"d": 1}, {"e": 2}], "f": 3});
        t.delete("c/0/d").unwrap();
        assert_eq!(t.get_by_full_key("c/0/e").unwrap().full_key(), "c/0/e");

        t.delete("c/0/e").unwrap();
        assert!(t.get_by_full_key("c").unwrap_err().is_not_found());
        assert!(t.get_by_full_key("f").is_ok());
    }

    #[test]
    fn test_rename_element() {
        let mut b: Branch = vec![Leaf::new(1), Leaf::new(2)].into_iter().collect();
        b.rename_element(1, "second".to_string());
        assert_eq!(b.get(1).map(Node::full_key), Some("second"));
    }
}
