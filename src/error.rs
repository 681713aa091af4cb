//! Error types for decoding, addressing and converting configuration trees.
//!
//! ## Error Categories
//!
//! - **Malformed input**: unexpected delimiters, non-string keys, premature end of input
//! - **Not found**: a full key or path that addresses nothing
//! - **Type mismatches**: a value or node of the wrong kind
//! - **Structural preconditions**: converter inputs that do not have the required shape
//! - **Unsupported**: an operation a format does not offer
//!
//! Errors raised deep inside a recursive walk are wrapped with [`Error::context`] on the way
//! up, so the message names every level that was being processed. Use
//! [`Error::is_not_found`] to tell misses apart from real failures regardless of wrapping.
//!
//! ## Examples
//!
//! ```rust
//! use kvtree::{from_str, Format};
//!
//! let err = from_str(Format::Json, r#"{"a": [1, 2}"#).unwrap_err();
//! assert!(err.to_string().contains("line 1"));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors produced by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed document
    #[error("Syntax error at line {line}, column {col}: {msg}")]
    Syntax { line: usize, col: usize, msg: String },

    /// Unexpected end of input
    #[error("Unexpected end of input at line {line}, column {col}: expected {expected}")]
    UnexpectedEof {
        line: usize,
        col: usize,
        expected: String,
    },

    /// Nothing is stored under the key
    #[error("not found: {key:?}")]
    NotFound { key: String },

    /// The parent of a key that should be added does not exist
    #[error("parent of {key:?} is not found")]
    ParentNotFound { key: String },

    /// A value or node is not of the expected kind
    #[error("type mismatch for {key:?}: expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: String,
        found: String,
    },

    /// A branch was addressed with a segment that is not a position
    #[error("not-number index {segment:?} for branch {branch:?}")]
    InvalidIndex { branch: String, segment: String },

    /// A path does not end exactly at a leaf
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A node cannot delete itself
    #[error("cannot delete {key:?} from itself")]
    ForbiddenDelete { key: String },

    /// Two entries would end up under the same key
    #[error("key collision on {key:?}")]
    KeyCollision { key: String },

    #[error("element #{index} of branch {branch:?} is not a tree")]
    ElementNotTree { branch: String, index: usize },

    #[error("element #{index} of branch {branch:?} doesn't have field {field:?}")]
    MissingField {
        branch: String,
        index: usize,
        field: String,
    },

    #[error("field {field:?} of element #{index} of branch {branch:?} is not a leaf")]
    FieldNotLeaf {
        branch: String,
        index: usize,
        field: String,
    },

    #[error("field {field:?} of element #{index} of branch {branch:?} is not a string")]
    FieldNotString {
        branch: String,
        index: usize,
        field: String,
    },

    /// The format does not offer the requested operation
    #[error("{operation} is not supported for {format}")]
    Unsupported { format: String, operation: String },

    /// The format name is not recognized
    #[error("unknown format: {0:?}")]
    UnknownFormat(String),

    /// An error with a description of what was being done when it happened
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a syntax error with line and column information.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kvtree::Error;
    ///
    /// let err = Error::syntax(10, 5, "unexpected token");
    /// assert!(err.to_string().contains("line 10"));
    /// ```
    pub fn syntax(line: usize, col: usize, msg: &str) -> Self {
        Error::Syntax {
            line,
            col,
            msg: msg.to_string(),
        }
    }

    /// Creates an unexpected end-of-input error.
    pub fn unexpected_eof(line: usize, col: usize, expected: &str) -> Self {
        Error::UnexpectedEof {
            line,
            col,
            expected: expected.to_string(),
        }
    }

    pub fn not_found(key: &str) -> Self {
        Error::NotFound {
            key: key.to_string(),
        }
    }

    pub fn type_mismatch(key: &str, expected: &str, found: &str) -> Self {
        Error::TypeMismatch {
            key: key.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn invalid_path(path: &str, reason: &str) -> Self {
        Error::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn unsupported(format: &str, operation: &str) -> Self {
        Error::Unsupported {
            format: format.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kvtree::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Wraps the error with a description of the operation that failed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kvtree::Error;
    ///
    /// let err = Error::not_found("a/b").context("get parent");
    /// assert_eq!(err.to_string(), "get parent: not found: \"a/b\"");
    /// assert!(err.is_not_found());
    /// ```
    #[must_use]
    pub fn context<C: Into<String>>(self, context: C) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through every context layer.
    #[must_use]
    pub fn root(&self) -> &Error {
        let mut current = self;
        while let Error::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns `true` if the error is a miss, however deeply it was wrapped.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Error::NotFound { .. })
    }

    /// Returns `true` if the input document was malformed.
    #[must_use]
    pub fn is_syntax(&self) -> bool {
        matches!(
            self.root(),
            Error::Syntax { .. } | Error::UnexpectedEof { .. }
        )
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            serde_json::error::Category::Io => Error::Io(err.to_string()),
            serde_json::error::Category::Syntax | serde_json::error::Category::Data => {
                Error::syntax(err.line(), err.column(), &err.to_string())
            }
            serde_json::error::Category::Eof => {
                Error::unexpected_eof(err.line(), err.column(), "more input")
            }
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        match err.location() {
            Some(location) => Error::syntax(location.line(), location.column(), &err.to_string()),
            None => Error::Custom(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
