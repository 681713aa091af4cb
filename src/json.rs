//! JSON decoding and encoding of nodes.
//!
//! Decoding runs in a single pass over one [`Decoder`]. The root reads its opening `{`, then
//! each container reads its entries until the matching closing delimiter. When an entry opens
//! a nested container, the node created for it continues on the same decoder and hands it
//! back once its own closing delimiter has been read.
//!
//! Encoding goes through `serde_json`, with the nodes implementing [`Serialize`] in document
//! order.

use crate::de::{Decoder, Delim, Token};
use crate::node::{Ident, Node, NodeRef};
use crate::{Branch, Error, Leaf, Number, Result, Scalar, Tree};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::io;
use tracing::trace;

pub(crate) fn input_str(raw: &[u8]) -> Result<&str> {
    std::str::from_utf8(raw).map_err(|e| Error::custom(format!("invalid UTF-8 input: {}", e)))
}

/// Reads the next token and checks that it opens the expected container.
fn expect_open(dec: &mut Decoder<'_>, delim: Delim) -> Result<()> {
    match dec.token()? {
        Token::Delim(d) if d == delim => Ok(()),
        other => Err(Error::syntax(
            dec.line(),
            dec.column(),
            &format!("expected '{}', found {}", delim.as_char(), other),
        )),
    }
}

fn expect_close(dec: &mut Decoder<'_>, delim: Delim) -> Result<()> {
    match dec.token()? {
        Token::Delim(d) if d == delim => Ok(()),
        other => Err(Error::syntax(
            dec.line(),
            dec.column(),
            &format!("expected closing '{}', found {}", delim.as_char(), other),
        )),
    }
}

/// Builds the child named `name` from the next value of the stream.
fn decode_child(dec: &mut Decoder<'_>, parent: &Ident, name: String) -> Result<Node> {
    let ident = Ident::child(parent, name);
    trace!(key = %ident.full_key, depth = dec.depth(), "decode child");

    match dec.token()? {
        Token::Delim(Delim::OpenObject) => {
            let mut tree = Tree::with_ident(ident);
            tree.decode_json(dec)?;
            Ok(Node::Tree(tree))
        }
        Token::Delim(Delim::OpenArray) => {
            let mut branch = Branch::with_ident(ident);
            branch.decode_json(dec)?;
            Ok(Node::Branch(branch))
        }
        Token::Delim(d) => Err(Error::syntax(
            dec.line(),
            dec.column(),
            &format!("unexpected delimiter '{}'", d.as_char()),
        )),
        Token::String(s) => Ok(Node::Leaf(Leaf::with_ident(ident, Some(Scalar::String(s))))),
        Token::Number(n) => Ok(Node::Leaf(Leaf::with_ident(ident, Some(Scalar::Number(n))))),
        Token::Bool(b) => Ok(Node::Leaf(Leaf::with_ident(ident, Some(Scalar::Bool(b))))),
        Token::Null => Ok(Node::Leaf(Leaf::with_ident(ident, None))),
    }
}

impl Tree {
    /// Decodes a JSON object document into a root tree.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kvtree::Tree;
    ///
    /// let tree = Tree::from_json(br#"{"a": {"b": 1, "c": [1, 2, 3]}}"#).unwrap();
    /// assert_eq!(tree.get_by_full_key("a/c/2").unwrap().nesting_level(), 3);
    /// ```
    ///
    /// # Errors
    ///
    /// Fails with a syntax error if the document is not a single well-formed JSON object.
    pub fn from_json(raw: &[u8]) -> Result<Tree> {
        let mut dec = Decoder::new(input_str(raw)?);
        expect_open(&mut dec, Delim::OpenObject)?;
        let mut tree = Tree::new();
        tree.decode_json(&mut dec)?;
        dec.finish()?;
        Ok(tree)
    }

    /// Reads the entries of an object whose `{` was already consumed, up to and including
    /// the closing `}`.
    pub fn decode_json(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        while dec.more() {
            let name = match dec.token()? {
                Token::String(name) => name,
                other => {
                    return Err(Error::syntax(
                        dec.line(),
                        dec.column(),
                        &format!("mapping key must be a string, found {}", other),
                    ))
                }
            };
            let child = decode_child(dec, &self.ident, name.clone())
                .map_err(|e| e.context(format!("unmarshal {:?}", name)))?;
            self.push_child(child);
        }
        expect_close(dec, Delim::CloseObject)
    }
}

impl Branch {
    /// Decodes a JSON array document into a root branch.
    pub fn from_json(raw: &[u8]) -> Result<Branch> {
        let mut dec = Decoder::new(input_str(raw)?);
        expect_open(&mut dec, Delim::OpenArray)?;
        let mut branch = Branch::new();
        branch.decode_json(&mut dec)?;
        dec.finish()?;
        Ok(branch)
    }

    /// Reads the elements of an array whose `[` was already consumed, up to and including
    /// the closing `]`.
    pub fn decode_json(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        while dec.more() {
            let index = self.len();
            let child = decode_child(dec, &self.ident, index.to_string())
                .map_err(|e| e.context(format!("unmarshal element #{}", index)))?;
            self.push_child(child);
        }
        expect_close(dec, Delim::CloseArray)
    }
}

impl Leaf {
    /// Decodes a standalone `{"name": "value"}` document into a leaf directly under the root.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kvtree::Leaf;
    ///
    /// let leaf = Leaf::from_json(br#"{"host": "localhost"}"#).unwrap();
    /// assert_eq!(leaf.full_key(), "host");
    /// assert_eq!(leaf.as_str(), Some("localhost"));
    /// ```
    pub fn from_json(raw: &[u8]) -> Result<Leaf> {
        let mut dec = Decoder::new(input_str(raw)?);
        expect_open(&mut dec, Delim::OpenObject)?;

        let name = match dec.token()? {
            Token::String(name) => name,
            other => {
                return Err(Error::syntax(
                    dec.line(),
                    dec.column(),
                    &format!("leaf name must be a string, found {}", other),
                ))
            }
        };
        let value = match dec.token()? {
            Token::String(value) => value,
            Token::Delim(d) => {
                return Err(Error::syntax(
                    dec.line(),
                    dec.column(),
                    &format!("leaf value must be a scalar, found '{}'", d.as_char()),
                ))
            }
            other => return Err(Error::type_mismatch(&name, "string", &other.to_string())),
        };

        expect_close(&mut dec, Delim::CloseObject)?;
        dec.finish()?;

        let ident = Ident::child(&Ident::root(), name);
        Ok(Leaf::with_ident(ident, Some(Scalar::String(value))))
    }
}

/// Writes `node` as JSON; an indent of 0 gives compact output.
pub(crate) fn encode<W: io::Write>(mut writer: W, node: NodeRef<'_>, indent: usize) -> Result<()> {
    if indent == 0 {
        serde_json::to_writer(&mut writer, &node)?;
    } else {
        let indent = " ".repeat(indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
        node.serialize(&mut ser)?;
    }
    Ok(())
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Number::Integer(i) => serializer.serialize_i64(*i),
            Number::Float(f) => serializer.serialize_f64(*f),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Scalar::String(s) => serializer.serialize_str(s),
            Scalar::Number(n) => n.serialize(serializer),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl Serialize for Leaf {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.value() {
            Some(value) => value.serialize(serializer),
            None => serializer.serialize_unit(),
        }
    }
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, child) in self.iter() {
            map.serialize_entry(name, child)?;
        }
        map.end()
    }
}

impl Serialize for Branch {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for child in self.iter() {
            seq.serialize_element(child)?;
        }
        seq.end()
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.as_ref().serialize(serializer)
    }
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            NodeRef::Tree(t) => t.serialize(serializer),
            NodeRef::Branch(b) => b.serialize(serializer),
            NodeRef::Leaf(l) => l.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;

    fn encode_string(node: NodeRef<'_>, indent: usize) -> String {
        let mut out = Vec::new();
        encode(&mut out, node, indent).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_decode_keeps_order_and_keys() {
        let tree = Tree::from_json(br#"{"z": 1, "a": {"y": [true, null, "s"]}, "m": 2.5}"#).unwrap();
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);

        let y2 = tree.get_by_full_key("a/y/2").unwrap().as_leaf().unwrap();
        assert_eq!(y2.as_str(), Some("s"));
        assert_eq!(y2.nesting_level(), 3);

        let y1 = tree.get_by_full_key("a/y/1").unwrap().as_leaf().unwrap();
        assert!(y1.is_empty());
    }

    #[test]
    fn test_decode_matches_built_tree() {
        let decoded = Tree::from_json(br#"{"a": {"b": 1, "c": [1, 2, 3]}}"#).unwrap();
        assert_eq!(decoded, tree!({"a": {"b": 1, "c": [1, 2, 3]}}));
    }

    #[test]
    fn test_decode_empty_containers() {
        let tree = Tree::from_json(br#"{"a": {}, "b": []}"#).unwrap();
        assert!(tree.get_child("a").unwrap().is_empty());
        assert!(tree.get_child("b").unwrap().is_empty());
    }

    #[test]
    fn test_decode_requires_object() {
        assert!(Tree::from_json(b"[1, 2]").unwrap_err().is_syntax());
        assert!(Tree::from_json(b"").unwrap_err().is_syntax());
        assert!(Tree::from_json(b"   ").unwrap_err().is_syntax());
    }

    #[test]
    fn test_decode_error_names_path() {
        let err = Tree::from_json(br#"{"a": {"b": [1, }]}}"#).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("unmarshal \"a\": unmarshal \"b\""), "{}", msg);
        assert!(err.is_syntax());
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let deep = format!("{{\"a\": {}{}}}", "[".repeat(5000), "]".repeat(5000));
        let err = Tree::from_json(deep.as_bytes()).unwrap_err();
        assert!(err.is_syntax());
        assert!(err.to_string().contains("recursion limit exceeded"));

        let deep = format!("{}{}", "[".repeat(200_000), "]".repeat(200_000));
        assert!(Branch::from_json(deep.as_bytes()).unwrap_err().is_syntax());

        let nested = format!("{{\"a\": {}{}}}", "[".repeat(100), "]".repeat(100));
        assert!(Tree::from_json(nested.as_bytes()).is_ok());
    }

    #[test]
    fn test_decode_branch_document() {
        let branch = Branch::from_json(br#"[{"a": 1}, 2]"#).unwrap();
        assert_eq!(branch.len(), 2);
        assert_eq!(branch.get_by_full_key("0/a").unwrap().full_key(), "0/a");
    }

    #[test]
    fn test_standalone_leaf() {
        let leaf = Leaf::from_json(br#" {"name": "value"} "#).unwrap();
        assert_eq!(leaf.name(), "name");
        assert_eq!(leaf.nesting_level(), 1);

        assert!(Leaf::from_json(br#"{"name": 1}"#).is_err());
        assert!(Leaf::from_json(br#"{"a": "b", "c": "d"}"#).is_err());
        assert!(Leaf::from_json(br#"{"a": {}}"#).unwrap_err().is_syntax());
    }

    #[test]
    fn test_encode_compact() {
        let t = tree!({"b": [1, "x", null], "a": {"c": true}});
        assert_eq!(
            encode_string(NodeRef::Tree(&t), 0),
            r#"{"b":[1,"x",null],"a":{"c":true}}"#
        );
    }

    #[test]
    fn test_encode_indented() {
        let t = tree!({"a": [1]});
        assert_eq!(
            encode_string(NodeRef::Tree(&t), 4),
            "{\n    \"a\": [\n        1\n    ]\n}"
        );
    }
}
