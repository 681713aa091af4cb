//! Terminal nodes and the scalar values they hold.

use crate::node::Ident;
use crate::{Error, Result};
use std::fmt;

/// A numeric scalar.
///
/// # Examples
///
/// ```rust
/// use kvtree::Number;
///
/// assert_eq!(Number::Integer(42).as_i64(), Some(42));
/// assert_eq!(Number::Float(42.0).as_i64(), Some(42));
/// assert_eq!(Number::Float(3.5).as_f64(), 3.5);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

/// -2^63, exactly representable.
const I64_MIN_F64: f64 = -9.223372036854775808e18;
/// 2^63, the first float above `i64::MAX`.
const I64_END_F64: f64 = 9.223372036854775808e18;

impl Number {
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    /// Converts this number to an `i64` if it has no fractional part and fits.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(f) => {
                if f.fract() == 0.0 && *f >= I64_MIN_F64 && *f < I64_END_F64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(fl) => write!(f, "{}", fl),
        }
    }
}

/// A scalar value held by a [`Leaf`].
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    String(String),
    Number(Number),
    Bool(bool),
}

impl Scalar {
    /// Name of the scalar kind, as used in type mismatch errors.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Scalar::String(_) => "string",
            Scalar::Number(_) => "number",
            Scalar::Bool(_) => "bool",
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => f.write_str(s),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Number(Number::Integer(value as i64))
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(Number::Integer(value))
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Number(Number::Integer(value as i64))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(Number::Float(value))
    }
}

impl From<Number> for Scalar {
    fn from(value: Number) -> Self {
        Scalar::Number(value)
    }
}

/// A terminal node holding an optional scalar.
///
/// A leaf without a value is empty; an empty string is a value.
///
/// # Examples
///
/// ```rust
/// use kvtree::Leaf;
///
/// let mut leaf = Leaf::new("localhost");
/// assert_eq!(leaf.as_str(), Some("localhost"));
///
/// leaf.clear();
/// assert!(leaf.is_empty());
///
/// leaf.set_value("");
/// assert!(!leaf.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Leaf {
    pub(crate) ident: Ident,
    value: Option<Scalar>,
}

impl Leaf {
    #[must_use]
    pub fn new<V: Into<Scalar>>(value: V) -> Self {
        Leaf {
            ident: Ident::root(),
            value: Some(value.into()),
        }
    }

    /// Creates a leaf without a value.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn with_ident(ident: Ident, value: Option<Scalar>) -> Self {
        Leaf { ident, value }
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
    pub fn value(&self) -> Option<&Scalar> {
        self.value.as_ref()
    }

    /// Returns the value if it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Scalar::as_str)
    }

    pub fn set_value<V: Into<Scalar>>(&mut self, value: V) {
        self.value = Some(value.into());
    }

    pub fn clear(&mut self) {
        self.value = None;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Returns the value, failing with a type mismatch if the leaf is empty.
    pub fn scalar(&self) -> Result<&Scalar> {
        self.value
            .as_ref()
            .ok_or_else(|| Error::type_mismatch(self.full_key(), "scalar", "null"))
    }

    /// Value as exported to a flat key-value store; an empty leaf exports `""`.
    #[must_use]
    pub fn value_string(&self) -> String {
        self.value.as_ref().map(Scalar::to_string).unwrap_or_default()
    }

    /// A leaf only answers to its own full key.
    pub fn get_by_full_key(&self, full_key: &str) -> Result<&Leaf> {
        if self.full_key() == full_key && !full_key.is_empty() {
            Ok(self)
        } else {
            Err(Error::not_found(full_key))
        }
    }

    /// Clears the value when `full_key` addresses this leaf.
    ///
    /// A leaf cannot host children, so deleting it in place means dropping its value; the
    /// owning container then removes the empty leaf.
    pub fn delete(&mut self, full_key: &str) -> Result<()> {
        if self.full_key() != full_key {
            return Err(Error::not_found(full_key));
        }
        self.clear();
        Ok(())
    }

    pub(crate) fn rebase(&mut self, ident: Ident) {
        self.ident = ident;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_conversions() {
        assert_eq!(Number::Float(42.5).as_i64(), None);
        assert!(Number::Integer(1).is_integer());
        assert_eq!(Number::Integer(42).as_f64(), 42.0);
    }

    #[test]
    fn test_float_to_integer_range() {
        assert_eq!(Number::Float(3.0).as_i64(), Some(3));
        assert_eq!(Number::Float(-9.223372036854775808e18).as_i64(), Some(i64::MIN));
        assert_eq!(Number::Float(9.223372036854775808e18).as_i64(), None);
        assert_eq!(Number::Float(1e19).as_i64(), None);
        assert_eq!(Number::Float(f64::NAN).as_i64(), None);
    }

    #[test]
    fn test_scalar_accessors() {
        assert_eq!(Scalar::from("x").as_str(), Some("x"));
        assert_eq!(Scalar::from(7).as_i64(), Some(7));
        assert_eq!(Scalar::from(true).as_bool(), Some(true));
        assert_eq!(Scalar::from(1.5).as_f64(), Some(1.5));
        assert_eq!(Scalar::from(1.5).as_str(), None);
        assert_eq!(Scalar::from(true).kind(), "bool");
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::from("plain").to_string(), "plain");
        assert_eq!(Scalar::from(8080).to_string(), "8080");
        assert_eq!(Scalar::from(false).to_string(), "false");
    }

    #[test]
    fn test_empty_leaf_is_a_type_mismatch() {
        let leaf = Leaf::empty();
        assert!(matches!(leaf.scalar(), Err(Error::TypeMismatch { .. })));
        assert_eq!(leaf.value_string(), "");
    }
}
