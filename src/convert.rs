//! Structural rewrites of trees.
//!
//! Every converter reads a tree and builds a new one; the input is left untouched. The three
//! converters are:
//!
//! - [`BranchesToString`]: replaces every branch reachable through trees with a leaf holding
//!   the branch encoded as text
//! - [`SnakeCaseKeys`]: renames every entry to `snake_case`
//! - [`BranchesToTree`]: turns selected branches of trees into trees keyed by a field of
//!   their elements
//!
//! ## Examples
//!
//! ```rust
//! use kvtree::convert::{BranchesToTree, TreeConverter};
//! use kvtree::tree;
//! use std::collections::HashMap;
//!
//! let t = tree!({"items": [{"name": "x", "v": 1}, {"name": "y", "v": 2}]});
//! let fields = HashMap::from([("items".to_string(), "name".to_string())]);
//!
//! let converted = BranchesToTree::new(fields).convert(&t).unwrap();
//! assert_eq!(converted, tree!({"items": {"x": {"name": "x", "v": 1}, "y": {"name": "y", "v": 2}}}));
//! ```

use crate::key::{self, to_snake_case};
use crate::node::{Ident, Node};
use crate::{Branch, Error, Format, Leaf, Options, Result, Scalar, Tree};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A rewrite from one tree to another.
pub trait TreeConverter {
    fn convert(&self, tree: &Tree) -> Result<Tree>;
}

/// Replaces branches with leaves holding their encoded text.
///
/// Trees are searched recursively; branches are not, so a branch nested in another branch is
/// encoded as part of the outer one. The text starts with a newline and every line is
/// indented by `nesting_level * indent` spaces of the leaf that replaces the branch, so it
/// lines up when the parent document is rendered as a block.
///
/// # Examples
///
/// ```rust
/// use kvtree::convert::{BranchesToString, TreeConverter};
/// use kvtree::{tree, Format};
///
/// let t = tree!({"a": {"ports": [80, 443]}});
/// let converted = BranchesToString::new(Format::Yaml, 2).convert(&t).unwrap();
///
/// let ports = converted.get_by_full_key("a/ports").unwrap();
/// let text = ports.as_leaf().unwrap().as_str().unwrap();
/// assert_eq!(text, "\n    - 80\n    - 443");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BranchesToString {
    pub format: Format,
    pub indent: usize,
}

impl BranchesToString {
    #[must_use]
    pub fn new(format: Format, indent: usize) -> Self {
        BranchesToString { format, indent }
    }

    fn convert_tree(&self, tree: &Tree) -> Result<Tree> {
        let mut out = Tree::with_ident(tree.ident.clone());
        for (name, child) in tree.iter() {
            let node = match child {
                Node::Tree(t) => Node::Tree(
                    self.convert_tree(t)
                        .map_err(|e| e.context(format!("convert branches of tree {:?}", name)))?,
                ),
                Node::Branch(b) => Node::Leaf(
                    self.stringify(b)
                        .map_err(|e| e.context(format!("encode {:?}", name)))?,
                ),
                Node::Leaf(l) => Node::Leaf(l.clone()),
            };
            out.push_child(node);
        }
        Ok(out)
    }

    fn stringify(&self, branch: &Branch) -> Result<Leaf> {
        let options = Options::new(self.format).with_indent(self.indent);
        let mut encoded = crate::to_string(branch, &options)?;
        if !encoded.ends_with('\n') {
            encoded.push('\n');
        }

        let ident = branch.ident.clone();
        let line_break = format!("\n{}", " ".repeat(ident.nesting_level * self.indent));
        let text = format!("\n{}", encoded).replace('\n', &line_break);
        let text = text.strip_suffix(&line_break).unwrap_or(&text).to_string();

        Ok(Leaf::with_ident(ident, Some(Scalar::String(text))))
    }
}

impl TreeConverter for BranchesToString {
    fn convert(&self, tree: &Tree) -> Result<Tree> {
        debug!(format = %self.format, indent = self.indent, "convert branches to string");
        self.convert_tree(tree)
    }
}

/// Renames every tree entry and branch element to `snake_case`.
///
/// Applying it twice gives the same tree as applying it once.
///
/// # Errors
///
/// Fails with [`Error::KeyCollision`] if two entries of one tree get the same name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SnakeCaseKeys;

impl SnakeCaseKeys {
    fn convert_node(node: &Node, ident: Ident) -> Result<Node> {
        match node {
            Node::Tree(t) => Self::convert_tree(t, ident).map(Node::Tree),
            Node::Branch(b) => {
                let mut out = Branch::with_ident(ident);
                for child in b.iter() {
                    let child_ident = Ident::child(&out.ident, to_snake_case(child.name()));
                    let converted = Self::convert_node(child, child_ident)?;
                    out.push_child(converted);
                }
                Ok(Node::Branch(out))
            }
            Node::Leaf(l) => Ok(Node::Leaf(Leaf::with_ident(ident, l.value().cloned()))),
        }
    }

    fn convert_tree(tree: &Tree, ident: Ident) -> Result<Tree> {
        let mut out = Tree::with_ident(ident);
        for (name, child) in tree.iter() {
            let snake = to_snake_case(name);
            if out.contains(&snake) {
                return Err(Error::KeyCollision {
                    key: key::make_full_key(out.full_key(), &snake),
                });
            }
            let child_ident = Ident::child(&out.ident, snake);
            let converted = Self::convert_node(child, child_ident)?;
            out.push_child(converted);
        }
        Ok(out)
    }
}

impl TreeConverter for SnakeCaseKeys {
    fn convert(&self, tree: &Tree) -> Result<Tree> {
        debug!("convert names to snake case");
        Self::convert_tree(tree, tree.ident.clone())
    }
}

/// Promotes branches of trees to trees keyed by a designated field of each element.
///
/// `fields` maps the full key of a branch to the name of the field. Each element of a listed
/// branch must be a tree whose field is a leaf holding a string; that string becomes the
/// element's key.
///
/// In keys-only mode the branch stays a branch and its elements are only renamed: it still
/// encodes as a sequence, but the full keys below it, and so the exported pairs, use the field
/// values instead of positions. Its elements can no longer be addressed by position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BranchesToTree {
    fields: HashMap<String, String>,
    only_keys: bool,
}

impl BranchesToTree {
    #[must_use]
    pub fn new(fields: HashMap<String, String>) -> Self {
        BranchesToTree {
            fields,
            only_keys: false,
        }
    }

    #[must_use]
    pub fn keys_only(fields: HashMap<String, String>) -> Self {
        BranchesToTree {
            fields,
            only_keys: true,
        }
    }

    fn convert_tree(&self, tree: &Tree) -> Result<Tree> {
        let mut out = Tree::with_ident(tree.ident.clone());
        for (name, child) in tree.iter() {
            let node = match child {
                Node::Tree(t) => Node::Tree(
                    self.convert_tree(t)
                        .map_err(|e| e.context(format!("convert branches of tree {:?}", name)))?,
                ),
                Node::Branch(b) => match self.fields.get(b.full_key()) {
                    Some(field) => self.promote(b, field)?,
                    None => Node::Branch(b.clone()),
                },
                Node::Leaf(l) => Node::Leaf(l.clone()),
            };
            out.push_child(node);
        }
        Ok(out)
    }

    fn promote(&self, branch: &Branch, field: &str) -> Result<Node> {
        let mut promoted = Tree::with_ident(branch.ident.clone());
        let mut renamed = branch.clone();
        let mut seen = HashSet::with_capacity(branch.len());

        for (index, element) in branch.iter().enumerate() {
            let Node::Tree(element) = element else {
                return Err(Error::ElementNotTree {
                    branch: branch.full_key().to_string(),
                    index,
                });
            };
            let key = element_key(branch, index, element, field)?;
            if !seen.insert(key.clone()) {
                return Err(Error::KeyCollision {
                    key: key::make_full_key(branch.full_key(), &key),
                });
            }

            if self.only_keys {
                renamed.rename_element(index, key);
            } else {
                promoted.insert(key, element.clone());
            }
        }

        if self.only_keys {
            Ok(Node::Branch(renamed))
        } else {
            Ok(Node::Tree(promoted))
        }
    }
}

/// Reads the string value of `field` from the element at `index` of `branch`.
fn element_key(branch: &Branch, index: usize, element: &Tree, field: &str) -> Result<String> {
    let position = || (branch.full_key().to_string(), index, field.to_string());
    match element.get_child(field) {
        None => {
            let (branch, index, field) = position();
            Err(Error::MissingField {
                branch,
                index,
                field,
            })
        }
        Some(Node::Leaf(leaf)) => leaf.as_str().map(str::to_string).ok_or_else(|| {
            let (branch, index, field) = position();
            Error::FieldNotString {
                branch,
                index,
                field,
            }
        }),
        Some(_) => {
            let (branch, index, field) = position();
            Err(Error::FieldNotLeaf {
                branch,
                index,
                field,
            })
        }
    }
}

impl TreeConverter for BranchesToTree {
    fn convert(&self, tree: &Tree) -> Result<Tree> {
        debug!(
            branches = self.fields.len(),
            only_keys = self.only_keys,
            "convert branches to tree"
        );
        self.convert_tree(tree)
    }
}
