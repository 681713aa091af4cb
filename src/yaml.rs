//! YAML decoding of nodes.
//!
//! The document is parsed by `serde_yaml` into its ordered value model and then converted
//! node by node, keeping mapping order. Scalars keep their YAML type: booleans, integers and
//! floats become typed [`Scalar`]s and `null` becomes a leaf without a value.

use crate::node::{Ident, Node};
use crate::{Branch, Error, Format, Leaf, Number, Result, Scalar, Tree};
use serde_yaml::{Mapping, Sequence, Value};
use tracing::trace;

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

fn untag(value: Value) -> Value {
    match value {
        Value::Tagged(tagged) => untag(tagged.value),
        other => other,
    }
}

fn key_name(key: Value, parent: &Ident) -> Result<String> {
    match untag(key) {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        other => Err(Error::type_mismatch(
            &parent.full_key,
            "scalar mapping key",
            kind(&other),
        )),
    }
}

/// Integers outside the `i64` range are kept as floats, the same as the JSON decoder does.
fn number(n: &serde_yaml::Number) -> Number {
    match n.as_i64() {
        Some(i) => Number::Integer(i),
        None => Number::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

fn decode_child(value: Value, parent: &Ident, name: String) -> Result<Node> {
    let ident = Ident::child(parent, name);
    trace!(key = %ident.full_key, "decode child");

    match untag(value) {
        Value::Mapping(mapping) => {
            let mut tree = Tree::with_ident(ident);
            tree.decode_yaml(mapping)?;
            Ok(Node::Tree(tree))
        }
        Value::Sequence(sequence) => {
            let mut branch = Branch::with_ident(ident);
            branch.decode_yaml(sequence)?;
            Ok(Node::Branch(branch))
        }
        Value::String(s) => Ok(Node::Leaf(Leaf::with_ident(ident, Some(Scalar::String(s))))),
        Value::Number(n) => Ok(Node::Leaf(Leaf::with_ident(
            ident,
            Some(Scalar::Number(number(&n))),
        ))),
        Value::Bool(b) => Ok(Node::Leaf(Leaf::with_ident(ident, Some(Scalar::Bool(b))))),
        Value::Null => Ok(Node::Leaf(Leaf::with_ident(ident, None))),
        Value::Tagged(_) => Err(Error::custom("nested tag survived untagging")),
    }
}

impl Tree {
    /// Decodes a YAML mapping document into a root tree.
    ///
    /// An empty document gives an empty tree.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kvtree::Tree;
    ///
    /// let tree = Tree::from_yaml(b"a:\n  b: 1\n  c: [1, 2, 3]\n").unwrap();
    /// assert_eq!(tree.get_by_full_key("a/c/1").unwrap().full_key(), "a/c/1");
    /// ```
    pub fn from_yaml(raw: &[u8]) -> Result<Tree> {
        let value: Value = serde_yaml::from_slice(raw)?;
        let mut tree = Tree::new();
        match untag(value) {
            Value::Null => {}
            Value::Mapping(mapping) => tree.decode_yaml(mapping)?,
            other => return Err(Error::type_mismatch("", "mapping", kind(&other))),
        }
        Ok(tree)
    }

    fn decode_yaml(&mut self, mapping: Mapping) -> Result<()> {
        for (key, value) in mapping {
            let name = key_name(key, &self.ident)?;
            let child = decode_child(value, &self.ident, name.clone())
                .map_err(|e| e.context(format!("unmarshal {:?}", name)))?;
            self.push_child(child);
        }
        Ok(())
    }
}

impl Branch {
    /// Decodes a YAML sequence document into a root branch.
    pub fn from_yaml(raw: &[u8]) -> Result<Branch> {
        let value: Value = serde_yaml::from_slice(raw)?;
        let mut branch = Branch::new();
        match untag(value) {
            Value::Null => {}
            Value::Sequence(sequence) => branch.decode_yaml(sequence)?,
            other => return Err(Error::type_mismatch("", "sequence", kind(&other))),
        }
        Ok(branch)
    }

    fn decode_yaml(&mut self, sequence: Sequence) -> Result<()> {
        for (index, value) in sequence.into_iter().enumerate() {
            let child = decode_child(value, &self.ident, index.to_string())
                .map_err(|e| e.context(format!("unmarshal element #{}", index)))?;
            self.push_child(child);
        }
        Ok(())
    }
}

impl Leaf {
    /// YAML has no standalone leaf document form.
    ///
    /// # Errors
    ///
    /// Always fails with [`Error::Unsupported`].
    pub fn from_yaml(_raw: &[u8]) -> Result<Leaf> {
        Err(Error::unsupported(
            Format::Yaml.as_str(),
            "decode standalone leaf",
        ))
    }
}
