//! Purpose: Host-side image of the dynamically typed record a decode call returns.
//! Exports: `DynamicKey`, `DynamicValue`, `DynamicRecord`.
//! Role: Output of the runtime's classification step; input to `marshal::to_json`.
//! Invariants: Classification happens once, inside the runtime, while its lock is held.
//! Invariants: Entry order is whatever the foreign mapping yielded.

#[derive(Clone, Debug, PartialEq)]
pub enum DynamicKey {
    Text(String),
    NonText { type_name: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum DynamicValue {
    Text(String),
    Integer(i64),
    /// Integers in `i64::MAX + 1 ..= u64::MAX`.
    Unsigned(u64),
    Float(f64),
    Unsupported { type_name: String },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DynamicRecord {
    entries: Vec<(DynamicKey, DynamicValue)>,
}

impl DynamicRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, key: DynamicKey, value: DynamicValue) {
        self.entries.push((key, value));
    }

    /// Convenience for the common text-keyed case.
    pub fn insert(&mut self, key: impl Into<String>, value: DynamicValue) {
        self.push(DynamicKey::Text(key.into()), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(DynamicKey, DynamicValue)] {
        &self.entries
    }
}

impl IntoIterator for DynamicRecord {
    type Item = (DynamicKey, DynamicValue);
    type IntoIter = std::vec::IntoIter<(DynamicKey, DynamicValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(DynamicKey, DynamicValue)> for DynamicRecord {
    fn from_iter<I: IntoIterator<Item = (DynamicKey, DynamicValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl From<&str> for DynamicValue {
    fn from(value: &str) -> Self {
        DynamicValue::Text(value.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(value: String) -> Self {
        DynamicValue::Text(value)
    }
}

impl From<i64> for DynamicValue {
    fn from(value: i64) -> Self {
        DynamicValue::Integer(value)
    }
}

impl From<u64> for DynamicValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(value) => DynamicValue::Integer(value),
            Err(_) => DynamicValue::Unsigned(value),
        }
    }
}

impl From<f64> for DynamicValue {
    fn from(value: f64) -> Self {
        DynamicValue::Float(value)
    }
}
