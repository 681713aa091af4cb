//! # kvtree
//!
//! Ordered configuration trees that move between JSON, YAML and flat key-value namespaces.
//!
//! ## What is a configuration tree?
//!
//! A document is decoded into a polymorphic tree of three node kinds:
//!
//! - [`Tree`]: an ordered mapping from names to child nodes
//! - [`Branch`]: an ordered sequence whose elements are named by their position
//! - [`Leaf`]: a scalar value (string, number, bool) or nothing at all
//!
//! Every node knows its *full key*, the `/`-joined names from the root down to it, and its
//! nesting level. A full key is what a flat key-value store would use to hold the value:
//! `servers/0/host` is the `host` field of the first element of the `servers` branch.
//!
//! ## Key Features
//!
//! - **Order preserving**: mapping entries keep document order through decode, edit and encode
//! - **Incremental JSON decoding**: containers decode themselves from one shared [`de::Decoder`]
//! - **Full-key addressing**: lookup and cascading deletion by full key on every node kind
//! - **Flat view**: [`Kv`] indexes every leaf and exports prefixed key/value pairs
//! - **Converters**: branches to text, keys to `snake_case`, branches of records to trees
//!
//! ## Quick Start
//!
//! ```rust
//! use kvtree::{from_str, to_string, Format, Options};
//!
//! let t = from_str(Format::Json, r#"{"server": {"host": "localhost", "ports": [80, 443]}}"#).unwrap();
//! assert_eq!(t.get_by_full_key("server/ports/1").unwrap().nesting_level(), 3);
//!
//! let yaml = to_string(&t, &Options::yaml()).unwrap();
//! assert_eq!(yaml, "server:\n  host: localhost\n  ports:\n    - 80\n    - 443\n");
//! ```
//!
//! ### Building trees in code
//!
//! ```rust
//! use kvtree::{tree, Kv};
//!
//! let mut kv = Kv::new(tree!({"db": {"host": "localhost", "port": 5432}}));
//! kv.set_if_exist("db/port", 6432).unwrap();
//! assert_eq!(kv.get_i64("db/port").unwrap(), 6432);
//! ```
//!
//! ## Formats
//!
//! | Format | Decode | Encode | Standalone leaf |
//! |--------|--------|--------|-----------------|
//! | JSON   | yes    | yes    | yes             |
//! | YAML   | yes    | yes    | no              |
//!
//! An operation a format does not offer fails with [`Error::Unsupported`].

pub mod convert;
pub mod de;
pub mod error;
pub mod index;
pub mod key;
pub mod kv;
pub mod macros;
pub mod options;
pub mod ser;

mod branch;
mod json;
mod leaf;
mod node;
mod tree;
mod yaml;

pub use branch::Branch;
pub use error::{Error, Result};
pub use index::Index;
pub use kv::Kv;
pub use leaf::{Leaf, Number, Scalar};
pub use node::{Node, NodeMut, NodeRef, Path};
pub use options::{Capabilities, Format, Options};
pub use tree::Tree;

use std::io;
use tracing::debug;

/// Decodes a document into a [`Tree`].
///
/// # Examples
///
/// ```rust
/// use kvtree::{from_slice, Format};
///
/// let t = from_slice(Format::Yaml, b"a:\n  b: [1, 2]\n").unwrap();
/// assert_eq!(t.get_by_full_key("a/b/0").unwrap().full_key(), "a/b/0");
/// ```
///
/// # Errors
///
/// Returns an error if the input is not valid UTF-8 or not a well-formed document whose top
/// level is a mapping. Syntax errors carry line and column information.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice(format: Format, raw: &[u8]) -> Result<Tree> {
    format.require(format.capabilities().decode, "decode")?;
    debug!(%format, bytes = raw.len(), "decoding tree");
    match format {
        Format::Json => Tree::from_json(raw),
        Format::Yaml => Tree::from_yaml(raw),
    }
}

/// Decodes a document from a string.
///
/// # Errors
///
/// See [`from_slice`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str(format: Format, s: &str) -> Result<Tree> {
    from_slice(format, s.as_bytes())
}

/// Decodes a document from an I/O stream.
///
/// # Examples
///
/// ```rust
/// use kvtree::{from_reader, Format};
/// use std::io::Cursor;
///
/// let t = from_reader(Format::Json, Cursor::new(br#"{"a": 1}"#)).unwrap();
/// assert_eq!(t.len(), 1);
/// ```
///
/// # Errors
///
/// Returns an error if reading fails or the document does not decode.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R: io::Read>(format: Format, mut reader: R) -> Result<Tree> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    from_slice(format, &raw)
}

/// Decodes a document whose top level is a sequence into a [`Branch`].
///
/// # Errors
///
/// Returns an error if the document is malformed or its top level is not a sequence.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn branch_from_slice(format: Format, raw: &[u8]) -> Result<Branch> {
    format.require(format.capabilities().decode, "decode")?;
    match format {
        Format::Json => Branch::from_json(raw),
        Format::Yaml => Branch::from_yaml(raw),
    }
}

/// Decodes a single-entry document `{"name": "value"}` into a [`Leaf`].
///
/// # Examples
///
/// ```rust
/// use kvtree::{leaf_from_slice, Format};
///
/// let leaf = leaf_from_slice(Format::Json, br#"{"host": "localhost"}"#).unwrap();
/// assert_eq!(leaf.name(), "host");
/// assert_eq!(leaf.as_str(), Some("localhost"));
///
/// assert!(leaf_from_slice(Format::Yaml, b"host: localhost\n").is_err());
/// ```
///
/// # Errors
///
/// Returns [`Error::Unsupported`] for formats without standalone leaves and an error if the
/// document is not a one-entry object with a string value.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn leaf_from_slice(format: Format, raw: &[u8]) -> Result<Leaf> {
    format.require(format.capabilities().standalone_leaf, "decode standalone leaf")?;
    match format {
        Format::Json => Leaf::from_json(raw),
        Format::Yaml => Leaf::from_yaml(raw),
    }
}

/// Encodes a node to a writer.
///
/// # Errors
///
/// Returns an error if the format cannot encode or writing fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<'a, W, N>(writer: W, node: N, options: &Options) -> Result<()>
where
    W: io::Write,
    N: Into<NodeRef<'a>>,
{
    let format = options.format;
    format.require(format.capabilities().encode, "encode")?;
    let node = node.into();
    debug!(%format, key = node.full_key(), "encoding node");
    match format {
        Format::Json => json::encode(writer, node, options.indent),
        Format::Yaml => ser::encode(writer, node, options.indent),
    }
}

/// Encodes a node to bytes.
///
/// # Errors
///
/// See [`to_writer`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec<'a, N: Into<NodeRef<'a>>>(node: N, options: &Options) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(128);
    to_writer(&mut buffer, node, options)?;
    Ok(buffer)
}

/// Encodes a node to a string.
///
/// JSON output has no trailing newline; YAML output ends with one.
///
/// # Examples
///
/// ```rust
/// use kvtree::{to_string, tree, Options};
///
/// let t = tree!({"a": [1, {"b": null}]});
/// assert_eq!(to_string(&t, &Options::json().with_indent(0)).unwrap(), r#"{"a":[1,{"b":null}]}"#);
/// assert_eq!(to_string(&t, &Options::yaml()).unwrap(), "a:\n  - 1\n  - b: null\n");
/// ```
///
/// # Errors
///
/// See [`to_writer`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<'a, N: Into<NodeRef<'a>>>(node: N, options: &Options) -> Result<String> {
    let bytes = to_vec(node, options)?;
    String::from_utf8(bytes).map_err(|e| Error::custom(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{"name": "svc", "ports": [80, 443], "db": {"host": "h", "tls": true}}"#;

    #[test]
    fn test_json_to_yaml_and_back() {
        let t = from_str(Format::Json, DOC).unwrap();
        let yaml = to_string(&t, &Options::yaml()).unwrap();
        let back = from_str(Format::Yaml, &yaml).unwrap();
        assert_eq!(t, back);
    }

    #[test]
    fn test_json_round_trip() {
        let t = from_str(Format::Json, DOC).unwrap();
        for indent in [0, 2, 4] {
            let json = to_string(&t, &Options::json().with_indent(indent)).unwrap();
            assert_eq!(from_str(Format::Json, &json).unwrap(), t);
        }
    }

    #[test]
    fn test_encode_subtree_and_branch() {
        let t = from_str(Format::Json, DOC).unwrap();
        let options = Options::json().with_indent(0);

        let db = t.get_child("db").unwrap();
        assert_eq!(to_string(db, &options).unwrap(), r#"{"host":"h","tls":true}"#);

        let ports = t.get_child("ports").and_then(Node::as_branch).unwrap();
        assert_eq!(to_string(ports, &options).unwrap(), "[80,443]");
    }

    #[test]
    fn test_branch_from_slice() {
        let b = branch_from_slice(Format::Json, br#"[1, "a", {"k": null}]"#).unwrap();
        assert_eq!(b.len(), 3);
        let b = branch_from_slice(Format::Yaml, b"- 1\n- a\n").unwrap();
        assert_eq!(b.len(), 2);
        assert!(branch_from_slice(Format::Json, br#"{"a": 1}"#).is_err());
    }

    #[test]
    fn test_leaf_from_slice_capability() {
        let err = leaf_from_slice(Format::Yaml, b"a: b\n").unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
        assert!(leaf_from_slice(Format::Json, br#"{"a": "b"}"#).is_ok());
    }

    #[test]
    fn test_from_reader() {
        let t = from_reader(Format::Yaml, io::Cursor::new(b"a: 1\n".to_vec())).unwrap();
        assert_eq!(t.keys().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_syntax_error_position() {
        let err = from_str(Format::Json, "{\n  \"a\": tru\n}").unwrap_err();
        assert!(err.is_syntax());
        assert!(err.to_string().contains("line 2"));
    }
}
