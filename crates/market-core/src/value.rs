//! Scalar cell values.

use std::{
  fmt,
  hash::{Hash, Hasher},
};

/// A single cell of a [`Dataset`](crate::Dataset).
///
/// Equality is exact and type-sensitive: `Integer(1)` and `Text("1")` are
/// different values. Reals compare by bit pattern so that every value can be
/// used as a hash-map key (an identifier).
#[derive(Debug, Clone, Default)]
pub enum Value {
  #[default]
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
}

impl Value {
  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  pub fn text(s: impl Into<String>) -> Self { Self::Text(s.into()) }
}

impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Self::Null, Self::Null) => true,
      (Self::Integer(a), Self::Integer(b)) => a == b,
      (Self::Real(a), Self::Real(b)) => a.to_bits() == b.to_bits(),
      (Self::Text(a), Self::Text(b)) => a == b,
      _ => false,
    }
  }
}

impl Eq for Value {}

impl Hash for Value {
  fn hash<H: Hasher>(&self, state: &mut H) {
    std::mem::discriminant(self).hash(state);
    match self {
      Self::Null => {}
      Self::Integer(i) => i.hash(state),
      Self::Real(r) => r.to_bits().hash(state),
      Self::Text(s) => s.hash(state),
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Null => f.write_str("NULL"),
      Self::Integer(i) => write!(f, "{i}"),
      Self::Real(r) => write!(f, "{r}"),
      Self::Text(s) => f.write_str(s),
    }
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self { Self::Integer(i) }
}

impl From<f64> for Value {
  fn from(r: f64) -> Self { Self::Real(r) }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for Value {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}
