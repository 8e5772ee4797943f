use std::borrow::{Borrow, Cow};
use std::fmt;

/// The key part of attribute [`KeyValue`] pairs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Cow<'static, str>);

impl Key {
    /// Create a new `Key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use spanpool::Key;
    ///
    /// let key1 = Key::new("my_static_str");
    /// let key2 = Key::new(String::from("my_owned_string"));
    /// ```
    pub fn new(value: impl Into<Key>) -> Self {
        value.into()
    }

    /// Create a new const `Key`.
    pub const fn from_static_str(value: &'static str) -> Self {
        Key(Cow::Borrowed(value))
    }

    /// Returns a reference to the underlying key name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Key {
    fn from(key_str: &'static str) -> Self {
        Key(Cow::Borrowed(key_str))
    }
}

impl From<String> for Key {
    fn from(string: String) -> Self {
        Key(Cow::Owned(string))
    }
}

impl From<Cow<'static, str>> for Key {
    fn from(string: Cow<'static, str>) -> Self {
        Key(string)
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.0.into_owned()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(fmt)
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The value part of attribute [`KeyValue`] pairs.
///
/// Span attributes are string valued.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Value(Cow<'static, str>);

impl Value {
    /// Returns a reference to the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value(Cow::Borrowed(value))
    }
}

impl From<String> for Value {
    fn from(string: String) -> Self {
        Value(Cow::Owned(string))
    }
}

impl From<Cow<'static, str>> for Value {
    fn from(string: Cow<'static, str>) -> Self {
        Value(string)
    }
}

impl From<Value> for String {
    fn from(value: Value) -> Self {
        value.0.into_owned()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(fmt)
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A key-value pair describing an aspect of a span.
///
/// Setting an attribute with the same key as an existing attribute overwrites
/// the existing attribute's value.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyValue {
    /// The attribute name.
    pub key: Key,
    /// The attribute value.
    pub value: Value,
}

impl KeyValue {
    /// Create a new `KeyValue` pair.
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<Key>,
        V: Into<Value>,
    {
        KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_conversions() {
        let from_static = Key::new("abc");
        let from_owned = Key::new(String::from("abc"));
        assert_eq!(from_static, from_owned);
        assert_eq!(from_static.as_str(), "abc");
    }

    #[test]
    fn value_compares_to_str() {
        let value = Value::from("1");
        assert_eq!(value, "1");
        assert_ne!(value, "2");
    }

    #[test]
    fn key_value_pairs() {
        let kv = KeyValue::new("key1", "1");
        assert_eq!(kv.key.as_str(), "key1");
        assert_eq!(kv.value.as_str(), "1");
    }
}
