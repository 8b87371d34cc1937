//! Property values and the per-element property bag
//!
//! `PropertyValue` is a closed tagged union. It is totally ordered and hashable
//! (floats compare by `f64::total_cmp`) so it can key the B-tree indices.

use crate::error::{GraphError, GraphResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Reserved key surfacing an element's identifier
pub const ID_KEY: &str = "Id";

/// Reserved key surfacing an element's revision
pub const REV_ID_KEY: &str = "RevId";

/// Returns true for keys that map onto element metadata rather than the bag
pub fn is_reserved_key(key: &str) -> bool {
    key == ID_KEY || key == REV_ID_KEY
}

/// Property value type
///
/// Supports:
/// - String
/// - Integer (i64)
/// - Float (f64)
/// - Boolean
/// - Bytes
/// - Null
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Bytes(Vec<u8>),
    Null,
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PropertyValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::String(_) => "String",
            PropertyValue::Integer(_) => "Integer",
            PropertyValue::Float(_) => "Float",
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::Bytes(_) => "Bytes",
            PropertyValue::Null => "Null",
        }
    }

    /// Comparison used by predicate filters.
    ///
    /// Unlike `Ord`, integers and floats compare numerically with each other,
    /// and values of unrelated types are incomparable.
    pub fn compare(&self, other: &PropertyValue) -> Option<Ordering> {
        use PropertyValue::*;
        match (self, other) {
            (Integer(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Integer(b)) => a.partial_cmp(&(*b as f64)),
            _ if self.rank() == other.rank() => Some(self.cmp(other)),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            PropertyValue::Null => 0,
            PropertyValue::Boolean(_) => 1,
            PropertyValue::Integer(_) => 2,
            PropertyValue::Float(_) => 3,
            PropertyValue::String(_) => 4,
            PropertyValue::Bytes(_) => 5,
        }
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PropertyValue {}

impl PartialOrd for PropertyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PropertyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use PropertyValue::*;
        match (self, other) {
            (String(a), String(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (Bytes(a), Bytes(b)) => a.cmp(b),
            (Null, Null) => Ordering::Equal,
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for PropertyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            PropertyValue::String(s) => s.hash(state),
            PropertyValue::Integer(i) => i.hash(state),
            PropertyValue::Float(f) => f.to_bits().hash(state),
            PropertyValue::Boolean(b) => b.hash(state),
            PropertyValue::Bytes(b) => b.hash(state),
            PropertyValue::Null => {}
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "\"{}\"", s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(fl) => write!(f, "{}", fl),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Bytes(bytes) => {
                write!(f, "0x")?;
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            PropertyValue::Null => write!(f, "null"),
        }
    }
}

// Convenience conversions
impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Integer(i as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(bytes: Vec<u8>) -> Self {
        PropertyValue::Bytes(bytes)
    }
}

impl From<&PropertyValue> for serde_json::Value {
    fn from(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::String(s) => serde_json::Value::String(s.clone()),
            PropertyValue::Integer(i) => serde_json::Value::from(*i),
            PropertyValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            PropertyValue::Boolean(b) => serde_json::Value::Bool(*b),
            PropertyValue::Bytes(bytes) => {
                serde_json::Value::Array(bytes.iter().map(|b| serde_json::Value::from(*b)).collect())
            }
            PropertyValue::Null => serde_json::Value::Null,
        }
    }
}

impl From<serde_json::Value> for PropertyValue {
    /// Scalars map onto their variant; arrays and objects are kept as JSON text.
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => PropertyValue::Null,
            serde_json::Value::Bool(b) => PropertyValue::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => PropertyValue::Integer(i),
                None => PropertyValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => PropertyValue::String(s),
            other => PropertyValue::String(other.to_string()),
        }
    }
}

/// Plain property map, as handed to `add_*_with_properties`
pub type PropertyMap = IndexMap<String, PropertyValue>;

/// Key/value bag attached to every element.
///
/// Keys are unique; enumeration follows insertion order. Reserved keys
/// (`Id`, `RevId`) cannot be stored here, they are served by the owning element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyBag {
    entries: PropertyMap,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, returning the previous one
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let key = key.into();
        if is_reserved_key(&key) {
            return Err(GraphError::InvalidArgument(format!(
                "property key '{}' is reserved",
                key
            )));
        }
        Ok(self.entries.insert(key, value.into()))
    }

    /// Strict read
    pub fn get(&self, key: &str) -> GraphResult<&PropertyValue> {
        self.entries
            .get(key)
            .ok_or_else(|| GraphError::KeyNotFound(key.to_string()))
    }

    pub fn try_get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    /// Remove a value, returning it; fails for absent or reserved keys
    pub fn remove(&mut self, key: &str) -> GraphResult<PropertyValue> {
        if is_reserved_key(key) {
            return Err(GraphError::InvalidArgument(format!(
                "property key '{}' is reserved",
                key
            )));
        }
        self.entries
            .shift_remove(key)
            .ok_or_else(|| GraphError::KeyNotFound(key.to_string()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Lazily filtered view over the entries
    pub fn filter<'a, F>(&'a self, predicate: F) -> impl Iterator<Item = (&'a str, &'a PropertyValue)> + 'a
    where
        F: Fn(&str, &PropertyValue) -> bool + 'a,
    {
        self.iter().filter(move |(k, v)| predicate(k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_map(&self) -> PropertyMap {
        self.entries.clone()
    }

    /// Restore a value without the reserved-key check (used by rollback)
    pub(crate) fn restore(&mut self, key: String, value: Option<PropertyValue>) {
        match value {
            Some(v) => {
                self.entries.insert(key, v);
            }
            None => {
                self.entries.shift_remove(&key);
            }
        }
    }
}

impl TryFrom<PropertyMap> for PropertyBag {
    type Error = GraphError;

    fn try_from(map: PropertyMap) -> GraphResult<Self> {
        let mut bag = PropertyBag::new();
        for (key, value) in map {
            bag.set(key, value)?;
        }
        Ok(bag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_property_value_types() {
        assert_eq!(PropertyValue::String("test".to_string()).type_name(), "String");
        assert_eq!(PropertyValue::Integer(42).type_name(), "Integer");
        assert_eq!(PropertyValue::Float(3.14).type_name(), "Float");
        assert_eq!(PropertyValue::Boolean(true).type_name(), "Boolean");
        assert_eq!(PropertyValue::Bytes(vec![1, 2]).type_name(), "Bytes");
        assert_eq!(PropertyValue::Null.type_name(), "Null");
    }

    #[test]
    fn test_property_value_conversions() {
        let string_prop: PropertyValue = "hello".into();
        assert_eq!(string_prop.as_string(), Some("hello"));

        let int_prop: PropertyValue = 42i64.into();
        assert_eq!(int_prop.as_integer(), Some(42));

        let float_prop: PropertyValue = 3.14.into();
        assert_eq!(float_prop.as_float(), Some(3.14));

        let bool_prop: PropertyValue = true.into();
        assert_eq!(bool_prop.as_boolean(), Some(true));

        let bytes_prop: PropertyValue = vec![0xde, 0xad].into();
        assert_eq!(bytes_prop.to_string(), "0xdead");
    }

    #[test]
    fn test_float_values_are_hashable_and_ordered() {
        let mut set = HashSet::new();
        set.insert(PropertyValue::Float(1.5));
        set.insert(PropertyValue::Float(1.5));
        set.insert(PropertyValue::Float(f64::NAN));
        set.insert(PropertyValue::Float(f64::NAN));
        assert_eq!(set.len(), 2);

        assert!(PropertyValue::Integer(1) < PropertyValue::Integer(2));
        assert!(PropertyValue::Null < PropertyValue::Boolean(false));
        assert_ne!(PropertyValue::Integer(1), PropertyValue::Float(1.0));
    }

    #[test]
    fn test_numeric_compare_crosses_int_and_float() {
        let three = PropertyValue::Integer(3);
        assert_eq!(three.compare(&PropertyValue::Float(2.5)), Some(Ordering::Greater));
        assert_eq!(three.compare(&PropertyValue::String("3".into())), None);
    }

    #[test]
    fn test_json_conversions() {
        let value: PropertyValue = serde_json::json!(12).into();
        assert_eq!(value, PropertyValue::Integer(12));
        let value: PropertyValue = serde_json::json!(1.25).into();
        assert_eq!(value, PropertyValue::Float(1.25));
        let value: PropertyValue = serde_json::json!({"a": 1}).into();
        assert_eq!(value.as_string(), Some("{\"a\":1}"));

        let json: serde_json::Value = (&PropertyValue::Bytes(vec![1, 2])).into();
        assert_eq!(json, serde_json::json!([1, 2]));
    }

    #[test]
    fn test_bag_round_trip() {
        let mut bag = PropertyBag::new();
        assert_eq!(bag.set("name", "Alice").unwrap(), None);
        assert_eq!(bag.get("name").unwrap().as_string(), Some("Alice"));

        let previous = bag.set("name", "Alicia").unwrap();
        assert_eq!(previous, Some(PropertyValue::from("Alice")));

        let removed = bag.remove("name").unwrap();
        assert_eq!(removed.as_string(), Some("Alicia"));
        assert!(bag.try_get("name").is_none());
        assert_eq!(bag.get("name"), Err(GraphError::KeyNotFound("name".to_string())));
    }

    #[test]
    fn test_bag_rejects_reserved_keys() {
        let mut bag = PropertyBag::new();
        assert!(matches!(bag.set(ID_KEY, 1), Err(GraphError::InvalidArgument(_))));
        assert!(matches!(bag.remove(REV_ID_KEY), Err(GraphError::InvalidArgument(_))));
        assert!(matches!(bag.remove("missing"), Err(GraphError::KeyNotFound(_))));
    }

    #[test]
    fn test_bag_filter_is_lazy_view() {
        let mut bag = PropertyBag::new();
        bag.set("a", 1).unwrap();
        bag.set("b", "two").unwrap();
        bag.set("c", 3).unwrap();

        let ints: Vec<&str> = bag
            .filter(|_, v| v.as_integer().is_some())
            .map(|(k, _)| k)
            .collect();
        assert_eq!(ints, vec!["a", "c"]);
        assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }
}
