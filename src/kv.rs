//! Flat key-value view of a configuration tree.
//!
//! [`Kv`] owns a [`Tree`] together with an [`Index`] of its leaves and a global key prefix.
//! Reads go through the index; every operation that changes the shape of the tree rebuilds
//! the index before returning, so the two never disagree between calls.

use crate::convert::{BranchesToString, BranchesToTree, SnakeCaseKeys, TreeConverter};
use crate::key::{self, SEPARATOR};
use crate::node::{Node, NodeMut};
use crate::{Error, Format, Index, Leaf, Options, Result, Scalar, Tree};
use std::collections::HashMap;
use tracing::debug;

/// A configuration tree addressed by flat `/`-separated keys.
///
/// # Examples
///
/// ```rust
/// use kvtree::{Format, Kv};
///
/// let mut kv = Kv::from_slice(Format::Yaml, b"db:\n  host: localhost\n  port: 5432\n").unwrap();
/// assert_eq!(kv.get_string("db/host").unwrap(), "localhost");
/// assert_eq!(kv.get_i64("db/port").unwrap(), 5432);
///
/// kv.add_prefix("svc");
/// let pairs = kv.pairs();
/// assert_eq!(pairs[0], ("svc/db/host".to_string(), "localhost".to_string()));
/// assert_eq!(pairs[1], ("svc/db/port".to_string(), "5432".to_string()));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Kv {
    tree: Tree,
    index: Index,
    global_prefix: String,
}

impl Kv {
    /// Wraps `tree` and indexes its leaves.
    #[must_use]
    pub fn new(tree: Tree) -> Self {
        let index = Index::build(&tree);
        Kv {
            tree,
            index,
            global_prefix: String::new(),
        }
    }

    /// Decodes a document and indexes it.
    pub fn from_slice(format: Format, raw: &[u8]) -> Result<Self> {
        let tree = crate::from_slice(format, raw)?;
        Ok(Kv::new(tree))
    }

    #[must_use]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    #[must_use]
    pub fn into_tree(self) -> Tree {
        self.tree
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// The prefix added to every exported key, with its trailing separator.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.global_prefix
    }

    /// Replaces the tree and re-indexes it.
    pub fn set_tree(&mut self, tree: Tree) {
        self.tree = tree;
        self.index.rebuild(&self.tree);
    }

    fn leaf(&self, key: &str) -> Result<&Leaf> {
        let path = self.index.get(key).ok_or_else(|| Error::not_found(key))?;
        self.tree
            .get(path)
            .map_err(|e| e.context(format!("get {:?} by path", key)))
    }

    /// Returns the value of the leaf at `key`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no leaf has this key, [`Error::TypeMismatch`] if the leaf has no
    /// value.
    pub fn get(&self, key: &str) -> Result<&Scalar> {
        self.leaf(key)?.scalar()
    }

    pub fn get_string(&self, key: &str) -> Result<&str> {
        match self.get(key)? {
            Scalar::String(s) => Ok(s),
            other => Err(Error::type_mismatch(key, "string", other.kind())),
        }
    }

    /// Returns an integer value; floats without a fractional part are accepted.
    pub fn get_i64(&self, key: &str) -> Result<i64> {
        let value = self.get(key)?;
        value
            .as_i64()
            .ok_or_else(|| Error::type_mismatch(key, "integer", value.kind()))
    }

    pub fn get_f64(&self, key: &str) -> Result<f64> {
        let value = self.get(key)?;
        value
            .as_f64()
            .ok_or_else(|| Error::type_mismatch(key, "number", value.kind()))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get(key)?;
        value
            .as_bool()
            .ok_or_else(|| Error::type_mismatch(key, "bool", value.kind()))
    }

    /// Sets the value of the leaf at `key`; does nothing if there is no such leaf.
    pub fn set_if_exist<V: Into<Scalar>>(&mut self, key: &str, value: V) -> Result<()> {
        let Some(path) = self.index.get(key) else {
            return Ok(());
        };
        let path = path.clone();
        self.tree
            .get_mut(&path)
            .map_err(|e| e.context(format!("get {:?} by path", key)))?
            .set_value(value);
        Ok(())
    }

    /// Reports whether any node, leaf or container, has this full key.
    #[must_use]
    pub fn exists(&self, full_key: &str) -> bool {
        self.index.contains(full_key) || self.tree.get_by_full_key(full_key).is_ok()
    }

    /// Adds `node` at `full_key` unless something is already there.
    ///
    /// The parent is the key up to the last separator, or the root for a key without one.
    /// Under a tree the node is added with the last segment as its name; under a branch it
    /// is appended and named by its position.
    ///
    /// # Errors
    ///
    /// [`Error::ParentNotFound`] if the parent does not exist, [`Error::TypeMismatch`] if the
    /// parent is a leaf.
    pub fn add_if_not_set<N: Into<Node>>(&mut self, full_key: &str, node: N) -> Result<()> {
        if full_key.is_empty() {
            return Err(Error::invalid_path(full_key, "empty key"));
        }
        if self.exists(full_key) {
            return Ok(());
        }

        let (parent_key, name) = key::split_parent(full_key).unwrap_or(("", full_key));
        let parent = if parent_key.is_empty() {
            NodeMut::Tree(&mut self.tree)
        } else {
            match self.tree.get_by_full_key_mut(parent_key) {
                Ok(parent) => parent,
                Err(e) if e.is_not_found() => {
                    return Err(Error::ParentNotFound {
                        key: full_key.to_string(),
                    })
                }
                Err(e) => return Err(e.context("get parent")),
            }
        };

        match parent {
            NodeMut::Tree(t) => {
                t.insert(name, node);
            }
            NodeMut::Branch(b) => b.push(node),
            NodeMut::Leaf(_) => {
                return Err(Error::type_mismatch(parent_key, "tree or branch", "leaf"));
            }
        }

        debug!(key = full_key, "node added");
        self.index.rebuild(&self.tree);
        Ok(())
    }

    /// Deletes the node at `full_key`; a missing key is not an error.
    ///
    /// Containers emptied by the deletion are removed too (see [`Tree::delete`]).
    pub fn delete_if_exists(&mut self, full_key: &str) -> Result<()> {
        match self.tree.delete(full_key) {
            Ok(()) => {
                debug!(key = full_key, "node deleted");
                self.index.rebuild(&self.tree);
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.context(format!("delete by key {:?}", full_key))),
        }
    }

    /// Sets the prefix prepended to every exported key.
    ///
    /// The prefix only shows in [`pairs`](Self::pairs); lookups keep using unprefixed keys.
    /// A trailing separator is added if missing and an empty prefix removes it.
    pub fn add_prefix(&mut self, prefix: &str) {
        self.global_prefix = if prefix.is_empty() || prefix.ends_with(SEPARATOR) {
            prefix.to_string()
        } else {
            format!("{}{}", prefix, SEPARATOR)
        };
    }

    /// Visits every leaf in document order.
    pub fn walk<F: FnMut(&Leaf)>(&self, mut f: F) {
        self.tree.walk(&mut f);
    }

    /// Exports `(prefixed key, value)` for every leaf in document order.
    ///
    /// Values are rendered as plain text; a leaf without a value exports an empty string.
    #[must_use]
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.index.len());
        self.walk(|leaf| {
            pairs.push((
                format!("{}{}", self.global_prefix, leaf.full_key()),
                leaf.value_string(),
            ));
        });
        pairs
    }

    /// Encodes the tree.
    pub fn marshal(&self, options: &Options) -> Result<Vec<u8>> {
        crate::to_vec(&self.tree, options)
            .map_err(|e| e.context(format!("{}-marshal of KV", options.format)))
    }

    /// Decodes a document into a new tree, replacing the current one.
    ///
    /// The current tree is kept if decoding fails.
    pub fn unmarshal(&mut self, format: Format, raw: &[u8]) -> Result<()> {
        let tree = crate::from_slice(format, raw)
            .map_err(|e| e.context(format!("{}-unmarshal of KV", format)))?;
        self.set_tree(tree);
        Ok(())
    }

    /// Replaces the tree with the result of `converter`.
    pub fn convert<C: TreeConverter>(&mut self, converter: &C) -> Result<()> {
        let converted = converter.convert(&self.tree)?;
        self.set_tree(converted);
        Ok(())
    }

    pub fn convert_branches_to_string(&mut self, format: Format, indent: usize) -> Result<()> {
        self.convert(&BranchesToString::new(format, indent))
            .map_err(|e| e.context("convert branches to string"))
    }

    /// Promotes the listed branches to trees; see [`BranchesToTree`].
    pub fn convert_branches_to_tree(&mut self, fields: HashMap<String, String>) -> Result<()> {
        self.convert(&BranchesToTree::new(fields))
            .map_err(|e| e.context("convert branches to trees"))
    }

    /// Renames the elements of the listed branches without promoting them.
    ///
    /// Only encode the tree afterwards: its elements no longer answer to positional keys.
    pub fn convert_branches_keys_as_for_tree(
        &mut self,
        fields: HashMap<String, String>,
    ) -> Result<()> {
        self.convert(&BranchesToTree::keys_only(fields))
            .map_err(|e| e.context("convert branches' keys as for tree"))
    }

    pub fn convert_names_to_snake_case(&mut self) -> Result<()> {
        self.convert(&SnakeCaseKeys)
            .map_err(|e| e.context("convert names to snake case"))
    }
}

impl From<Tree> for Kv {
    fn from(tree: Tree) -> Self {
        Kv::new(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;

    fn kv() -> Kv {
        Kv::new(tree!({
            "db": {"host": "localhost", "port": 5432, "ratio": 0.5, "tls": false, "pass": null},
            "hosts": ["a", "b"]
        }))
    }

    #[test]
    fn test_typed_getters() {
        let kv = kv();
        assert_eq!(kv.get_string("db/host").unwrap(), "localhost");
        assert_eq!(kv.get_i64("db/port").unwrap(), 5432);
        assert_eq!(kv.get_f64("db/ratio").unwrap(), 0.5);
        assert!(!kv.get_bool("db/tls").unwrap());
        assert_eq!(kv.get_string("hosts/1").unwrap(), "b");
    }

    #[test]
    fn test_getter_errors() {
        let kv = kv();
        assert!(kv.get("db/user").unwrap_err().is_not_found());
        assert!(kv.get("db").unwrap_err().is_not_found());
        assert!(matches!(
            kv.get_string("db/port"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            kv.get_i64("db/ratio"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            kv.get("db/pass"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_set_if_exist() {
        let mut kv = kv();
        kv.set_if_exist("db/host", "db.internal").unwrap();
        kv.set_if_exist("db/user", "admin").unwrap();
        assert_eq!(kv.get_string("db/host").unwrap(), "db.internal");
        assert!(!kv.exists("db/user"));
    }

    #[test]
    fn test_exists_covers_containers() {
        let kv = kv();
        assert!(kv.exists("db"));
        assert!(kv.exists("db/port"));
        assert!(kv.exists("hosts/0"));
        assert!(!kv.exists("hosts/2"));
        assert!(!kv.exists(""));
    }

    #[test]
    fn test_add_if_not_set() {
        let mut kv = kv();
        kv.add_if_not_set("db/user", Leaf::new("admin")).unwrap();
        assert_eq!(kv.get_string("db/user").unwrap(), "admin");

        kv.add_if_not_set("db/user", Leaf::new("root")).unwrap();
        assert_eq!(kv.get_string("db/user").unwrap(), "admin");

        kv.add_if_not_set("hosts/2", Leaf::new("c")).unwrap();
        assert_eq!(kv.get_string("hosts/2").unwrap(), "c");

        kv.add_if_not_set("cache", tree!({"ttl": 60})).unwrap();
        assert_eq!(kv.get_i64("cache/ttl").unwrap(), 60);
    }

    #[test]
    fn test_add_if_not_set_parent_errors() {
        let mut kv = kv();
        assert!(matches!(
            kv.add_if_not_set("queue/size", Leaf::new(1)),
            Err(Error::ParentNotFound { .. })
        ));
        assert!(matches!(
            kv.add_if_not_set("db/port/x", Leaf::new(1)),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_delete_if_exists() {
        let mut kv = kv();
        kv.delete_if_exists("db/host").unwrap();
        kv.delete_if_exists("db/host").unwrap();
        assert!(!kv.exists("db/host"));
        assert!(!kv.index().contains("db/host"));

        kv.delete_if_exists("hosts/0").unwrap();
        assert_eq!(kv.get_string("hosts/0").unwrap(), "b");
        kv.delete_if_exists("hosts/0").unwrap();
        assert!(!kv.exists("hosts"));
    }

    #[test]
    fn test_delete_non_canonical_position_is_a_no_op() {
        let mut kv = Kv::new(tree!({"list": ["x", "y", "z"]}));
        assert!(!kv.exists("list/01"));
        kv.delete_if_exists("list/01").unwrap();
        kv.delete_if_exists("list/+1").unwrap();
        assert_eq!(
            kv.pairs(),
            vec![
                ("list/0".to_string(), "x".to_string()),
                ("list/1".to_string(), "y".to_string()),
                ("list/2".to_string(), "z".to_string()),
            ]
        );
    }

    #[test]
    fn test_keys_only_collision_keeps_tree() {
        let mut kv = Kv::new(tree!({"items": [{"name": "x", "v": 1}, {"name": "x", "v": 2}]}));
        let err = kv
            .convert_branches_keys_as_for_tree(HashMap::from([(
                "items".to_string(),
                "name".to_string(),
            )]))
            .unwrap_err();
        assert!(matches!(err.root(), Error::KeyCollision { .. }));
        assert_eq!(kv.index().len(), 4);
    }

    #[test]
    fn test_prefix_is_applied_on_export_only() {
        let mut kv = kv();
        kv.add_prefix("svc/");
        assert_eq!(kv.prefix(), "svc/");
        kv.add_prefix("svc");
        assert_eq!(kv.prefix(), "svc/");

        assert!(kv.pairs().iter().all(|(key, _)| key.starts_with("svc/")));
        assert_eq!(kv.get_string("db/host").unwrap(), "localhost");
    }

    #[test]
    fn test_pairs_in_document_order() {
        let pairs = kv().pairs();
        let keys: Vec<_> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["db/host", "db/port", "db/ratio", "db/tls", "db/pass", "hosts/0", "hosts/1"]
        );
        assert_eq!(pairs[4].1, "");
        assert_eq!(pairs[2].1, "0.5");
    }

    #[test]
    fn test_unmarshal_replaces_tree() {
        let mut kv = kv();
        kv.unmarshal(Format::Json, br#"{"x": {"y": 1}}"#).unwrap();
        assert_eq!(kv.index().len(), 1);
        assert_eq!(kv.get_i64("x/y").unwrap(), 1);

        assert!(kv.unmarshal(Format::Json, b"{").is_err());
        assert_eq!(kv.get_i64("x/y").unwrap(), 1);
    }

    #[test]
    fn test_marshal() {
        let kv = Kv::new(tree!({"a": {"b": [1, 2]}}));
        let out = kv.marshal(&Options::json().with_indent(0)).unwrap();
        assert_eq!(out, br#"{"a":{"b":[1,2]}}"#);
    }

    #[test]
    fn test_converters_reindex() {
        let mut kv = Kv::new(tree!({"svcList": [{"name": "api", "port": 80}]}));
        kv.convert_names_to_snake_case().unwrap();
        assert!(kv.index().contains("svc_list/0/name"));

        kv.convert_branches_to_tree(HashMap::from([(
            "svc_list".to_string(),
            "name".to_string(),
        )]))
        .unwrap();
        assert_eq!(kv.get_i64("svc_list/api/port").unwrap(), 80);

        let mut kv = Kv::new(tree!({"a": [1]}));
        kv.convert_branches_to_string(Format::Json, 0).unwrap();
        assert_eq!(kv.get_string("a").unwrap(), "\n[1]");
    }

    #[test]
    fn test_converter_error_keeps_tree() {
        let mut kv = Kv::new(tree!({"items": [1]}));
        let err = kv
            .convert_branches_to_tree(HashMap::from([("items".to_string(), "name".to_string())]))
            .unwrap_err();
        assert!(matches!(err.root(), Error::ElementNotTree { .. }));
        assert_eq!(kv.get_i64("items/0").unwrap(), 1);
    }
}
