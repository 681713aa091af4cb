//! YAML serialization.
//!
//! This module provides the [`Emitter`] that writes nodes as block-style YAML.
//!
//! ## Overview
//!
//! - **Document order**: mapping entries are written in the order the tree keeps them
//! - **Configurable indentation**: each nesting level adds `indent` spaces (at least 2)
//! - **Quote minimization**: strings are written plain unless reading them back would give
//!   a different value or type, in which case they are double-quoted
//!
//! ## Usage
//!
//! ```rust
//! use kvtree::ser::Emitter;
//! use kvtree::tree;
//!
//! let t = tree!({"server": {"host": "localhost", "ports": [80, 443]}});
//!
//! let mut emitter = Emitter::new(2);
//! emitter.emit(&t);
//! assert_eq!(
//!     emitter.into_inner(),
//!     "server:\n  host: localhost\n  ports:\n    - 80\n    - 443\n"
//! );
//! ```

use crate::node::{Node, NodeRef};
use crate::{Branch, Leaf, Number, Result, Scalar, Tree};
use std::io;

/// Width of the `- ` marker in front of sequence elements.
const SEQUENCE_MARKER: usize = 2;

/// The YAML emitter.
pub struct Emitter {
    output: String,
    indent: usize,
}

impl Emitter {
    pub fn new(indent: usize) -> Self {
        Emitter {
            output: String::with_capacity(256),
            indent: indent.max(2),
        }
    }

    pub fn into_inner(self) -> String {
        self.output
    }

    /// Writes `node` as a complete document.
    pub fn emit<'a, N: Into<NodeRef<'a>>>(&mut self, node: N) {
        match node.into() {
            NodeRef::Tree(t) if t.is_empty() => self.output.push_str("{}\n"),
            NodeRef::Tree(t) => self.write_tree(t, 0),
            NodeRef::Branch(b) if b.is_empty() => self.output.push_str("[]\n"),
            NodeRef::Branch(b) => self.write_branch(b, 0),
            NodeRef::Leaf(l) => {
                self.write_leaf(l);
                self.output.push('\n');
            }
        }
    }

    fn write_spaces(&mut self, count: usize) {
        self.output.extend(std::iter::repeat(' ').take(count));
    }

    fn write_tree(&mut self, tree: &Tree, column: usize) {
        for (name, child) in tree.iter() {
            self.write_spaces(column);
            self.write_string(name);
            self.output.push(':');
            match child {
                Node::Leaf(l) => {
                    self.output.push(' ');
                    self.write_leaf(l);
                    self.output.push('\n');
                }
                Node::Tree(t) if t.is_empty() => self.output.push_str(" {}\n"),
                Node::Branch(b) if b.is_empty() => self.output.push_str(" []\n"),
                Node::Tree(t) => {
                    self.output.push('\n');
                    self.write_tree(t, column + self.indent);
                }
                Node::Branch(b) => {
                    self.output.push('\n');
                    self.write_branch(b, column + self.indent);
                }
            }
        }
    }

    fn write_branch(&mut self, branch: &Branch, column: usize) {
        for child in branch.iter() {
            self.write_spaces(column);
            self.output.push_str("- ");
            let inner = column + SEQUENCE_MARKER;
            match child {
                Node::Leaf(l) => {
                    self.write_leaf(l);
                    self.output.push('\n');
                }
                Node::Tree(t) if t.is_empty() => self.output.push_str("{}\n"),
                Node::Branch(b) if b.is_empty() => self.output.push_str("[]\n"),
                // The first line of a nested container goes right after the marker
                Node::Tree(t) => {
                    let start = self.output.len();
                    self.write_tree(t, inner);
                    self.output.replace_range(start..start + inner, "");
                }
                Node::Branch(b) => {
                    let start = self.output.len();
                    self.write_branch(b, inner);
                    self.output.replace_range(start..start + inner, "");
                }
            }
        }
    }

    fn write_leaf(&mut self, leaf: &Leaf) {
        match leaf.value() {
            None => self.output.push_str("null"),
            Some(Scalar::Bool(b)) => self.output.push_str(if *b { "true" } else { "false" }),
            Some(Scalar::Number(n)) => self.write_number(n),
            Some(Scalar::String(s)) => self.write_string(s),
        }
    }

    fn write_number(&mut self, n: &Number) {
        match n {
            Number::Integer(i) => self.output.push_str(&i.to_string()),
            Number::Float(f) if f.is_nan() => self.output.push_str(".nan"),
            Number::Float(f) if f.is_infinite() => {
                self.output
                    .push_str(if *f > 0.0 { ".inf" } else { "-.inf" })
            }
            // Debug keeps the fractional part of integral floats
            Number::Float(f) => self.output.push_str(&format!("{:?}", f)),
        }
    }

    /// Characters a YAML reader would not take verbatim from a plain or quoted scalar.
    fn needs_escape(c: char) -> bool {
        c.is_control() || matches!(c, '\u{FEFF}' | '\u{2028}' | '\u{2029}')
    }

    #[inline]
    fn needs_quotes(s: &str) -> bool {
        const INDICATORS: &[char] = &[
            '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"',
            '%', '@', '`', '.', '~', '+', ' ',
        ];
        const RESERVED: &[&str] = &[
            "true", "false", "yes", "no", "on", "off", "y", "n", "null",
        ];

        s.is_empty()
            || s.starts_with(INDICATORS)
            || s.starts_with(|c: char| c.is_ascii_digit())
            || s.ends_with(' ')
            || s.ends_with(':')
            || s.contains(": ")
            || s.contains(" #")
            || s.chars().any(Self::needs_escape)
            || RESERVED.iter().any(|word| s.eq_ignore_ascii_case(word))
            || s.parse::<f64>().is_ok()
    }

    #[inline]
    fn write_string(&mut self, s: &str) {
        if Self::needs_quotes(s) {
            self.output.push('"');
            for ch in s.chars() {
                match ch {
                    '"' => self.output.push_str("\\\""),
                    '\\' => self.output.push_str("\\\\"),
                    '\n' => self.output.push_str("\\n"),
                    '\r' => self.output.push_str("\\r"),
                    '\t' => self.output.push_str("\\t"),
                    '\0' => self.output.push_str("\\0"),
                    c if Self::needs_escape(c) => {
                        self.output.push_str(&format!("\\u{:04X}", c as u32))
                    }
                    _ => self.output.push(ch),
                }
            }
            self.output.push('"');
        } else {
            self.output.push_str(s);
        }
    }
}

/// Writes `node` as YAML with `indent` spaces per level.
pub(crate) fn encode<W: io::Write>(mut writer: W, node: NodeRef<'_>, indent: usize) -> Result<()> {
    let mut emitter = Emitter::new(indent);
    emitter.emit(node);
    writer.write_all(emitter.into_inner().as_bytes())?;
    Ok(())
}
