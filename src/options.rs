//! Format selection and encoding options.
//!
//! This module provides:
//!
//! - [`Format`]: the supported textual formats (JSON and YAML)
//! - [`Capabilities`]: what each format can do, checked by every entry point
//! - [`Options`]: target format plus indentation width for encoding
//!
//! ## Examples
//!
//! ```rust
//! use kvtree::{Format, Options};
//!
//! let options = Options::json().with_indent(4);
//! assert_eq!(options.format, Format::Json);
//! assert_eq!(options.indent, 4);
//!
//! // An explicit name wins over the file extension
//! assert_eq!(Format::detect("", "config.json").unwrap(), Format::Json);
//! assert_eq!(Format::detect("yaml", "config.json").unwrap(), Format::Yaml);
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Textual format of a configuration document.
///
/// # Examples
///
/// ```rust
/// use kvtree::Format;
///
/// assert_eq!(Format::Json.as_str(), "json");
/// assert_eq!("yml".parse::<Format>().unwrap(), Format::Yaml);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    #[default]
    Yaml,
}

/// Operations a format offers.
///
/// Support is allowed to be asymmetric: a format may decode a document shape it cannot
/// produce, or the other way round. Entry points consult this table and fail with
/// [`Error::Unsupported`] instead of guessing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub decode: bool,
    pub encode: bool,
    /// Decoding a single `{"name": "value"}` pair into a root-level leaf.
    pub standalone_leaf: bool,
}

impl Format {
    /// Returns the lowercase name of this format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }

    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        match self {
            Format::Json => Capabilities {
                decode: true,
                encode: true,
                standalone_leaf: true,
            },
            Format::Yaml => Capabilities {
                decode: true,
                encode: true,
                standalone_leaf: false,
            },
        }
    }

    /// Fails with [`Error::Unsupported`] unless `supported` holds for this format.
    pub(crate) fn require(&self, supported: bool, operation: &str) -> Result<()> {
        if supported {
            Ok(())
        } else {
            Err(Error::unsupported(self.as_str(), operation))
        }
    }

    /// Picks the format of a document.
    ///
    /// A non-empty `name` wins; otherwise the extension of `path` decides (`.json`, `.yml`,
    /// `.yaml`), and anything else falls back to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFormat`] if `name` is given but not recognized.
    pub fn detect<P: AsRef<Path>>(name: &str, path: P) -> Result<Format> {
        if !name.is_empty() {
            return name.parse();
        }

        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("yml") | Some("yaml") => Ok(Format::Yaml),
            _ => Ok(Format::default()),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

/// Encoding options.
///
/// # Examples
///
/// ```rust
/// use kvtree::{Format, Options};
///
/// // YAML with 2-space indentation
/// let options = Options::default();
///
/// // Compact JSON
/// let options = Options::json().with_indent(0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    pub format: Format,
    /// Spaces per nesting level. For JSON `0` means compact output; YAML needs at least 2.
    pub indent: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            format: Format::default(),
            indent: 2,
        }
    }
}

impl Options {
    /// Creates options for `format` with 2-space indentation.
    #[must_use]
    pub fn new(format: Format) -> Self {
        Options {
            format,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn json() -> Self {
        Self::new(Format::Json)
    }

    #[must_use]
    pub fn yaml() -> Self {
        Self::new(Format::Yaml)
    }

    /// Sets the indentation size (number of spaces per level).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kvtree::Options;
    ///
    /// let options = Options::yaml().with_indent(4);
    /// assert_eq!(options.indent, 4);
    /// ```
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(Format::detect("", "a/b/cfg.json").unwrap(), Format::Json);
        assert_eq!(Format::detect("", "cfg.yml").unwrap(), Format::Yaml);
        assert_eq!(Format::detect("", "cfg.yaml").unwrap(), Format::Yaml);
        assert_eq!(Format::detect("", "cfg").unwrap(), Format::Yaml);
    }

    #[test]
    fn test_detect_unknown_name() {
        assert_eq!(
            Format::detect("toml", "cfg.json").unwrap_err(),
            Error::UnknownFormat("toml".to_string())
        );
    }

    #[test]
    fn test_capabilities_are_checked() {
        let yaml = Format::Yaml;
        assert!(yaml.require(yaml.capabilities().decode, "decode").is_ok());
        assert!(matches!(
            yaml.require(yaml.capabilities().standalone_leaf, "decode standalone leaf"),
            Err(Error::Unsupported { .. })
        ));
    }

    #[test]
    fn test_format_serde_names() {
        let options: Options = serde_json::from_str(r#"{"format":"json","indent":4}"#).unwrap();
        assert_eq!(options, Options::json().with_indent(4));
    }
}
