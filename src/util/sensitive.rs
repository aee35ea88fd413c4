use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Debug, Display};
use std::ops::Deref;

/// Wraps a value that must not leak into logs or error reports.
///
/// Its [`Debug`] and [`Display`] implementations always print
/// `<hidden>`, while (de)serialization stays transparent.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
  #[must_use]
  pub const fn new(value: T) -> Self {
    Self(value)
  }

  #[must_use]
  pub fn into_inner(self) -> T {
    self.0
  }
}

impl<T> From<T> for Sensitive<T> {
  fn from(value: T) -> Self {
    Self(value)
  }
}

impl<T> Deref for Sensitive<T> {
  type Target = T;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl<T: AsRef<str>> AsRef<str> for Sensitive<T> {
  fn as_ref(&self) -> &str {
    self.0.as_ref()
  }
}

impl<T> Debug for Sensitive<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("<hidden>")
  }
}

impl<T> Display for Sensitive<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("<hidden>")
  }
}

impl<T: Serialize> Serialize for Sensitive<T> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    self.0.serialize(serializer)
  }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    T::deserialize(deserializer).map(Self)
  }
}
