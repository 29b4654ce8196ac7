//! Field storage shared by requests and responses
//!
//! Every value written to a [`FieldStore`] is copied through the JSON data
//! model first, so the store never shares structure with the caller and a
//! message can always be encoded later on.

use serde::Serialize;
use serde_json::{Map, Value};

use super::describe;
use crate::errors::FieldError;

/// Describes one protocol field of a message type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Name used on the wire
    pub name: &'static str,
    /// Whether the field conventionally holds an object or array
    pub compound: bool,
}

/// Ordered mapping of protocol field names to owned JSON values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldStore {
    fields: Map<String, Value>,
}

/// Deep-copies `value` by serializing it into the JSON model
fn deep_copy<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<Value, FieldError> {
    serde_json::to_value(value).map_err(|e| FieldError::NotSerializable {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Store a deep copy of `value` under `key`.
    ///
    /// An empty key is ignored. If the copy fails the previous value (if any)
    /// is left in place and the error is returned.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), FieldError> {
        if key.is_empty() {
            return Ok(());
        }
        let copy = deep_copy(key, value)?;
        self.fields.insert(key.to_string(), copy);
        Ok(())
    }

    /// Apply every entry of an object (by key) or array (by decimal index) as
    /// an individual [`set`](Self::set).
    pub fn set_batch<T: Serialize + ?Sized>(&mut self, batch: &T) -> Result<(), FieldError> {
        match deep_copy("<batch>", batch)? {
            Value::Object(entries) => {
                for (key, value) in entries {
                    self.insert_value(&key, value);
                }
                Ok(())
            }
            Value::Array(items) => {
                for (index, value) in items.into_iter().enumerate() {
                    self.insert_value(&index.to_string(), value);
                }
                Ok(())
            }
            other => Err(FieldError::NotABatch {
                found: describe(&other).to_string(),
            }),
        }
    }

    /// Store an already-owned value without copying it again
    pub(crate) fn insert_value(&mut self, key: &str, value: Value) {
        if !key.is_empty() {
            self.fields.insert(key.to_string(), value);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Replace a compound field wholesale (same as [`set`](Self::set))
    pub fn replace_compound<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<(), FieldError> {
        self.set(key, value)
    }

    /// Shallow-merge the own properties of `patch` into the stored compound value.
    ///
    /// A missing or null field starts out as an empty object. A null patch is a no-op.
    pub fn merge_compound<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        patch: &T,
    ) -> Result<(), FieldError> {
        if key.is_empty() {
            return Ok(());
        }
        let entries = match deep_copy(key, patch)? {
            Value::Object(entries) => entries,
            Value::Null => return Ok(()),
            other => {
                return Err(FieldError::NotABatch {
                    found: describe(&other).to_string(),
                })
            }
        };

        let mut merged = self.compound_base(key)?;
        for (entry, value) in entries {
            insert_entry(&mut merged, key, &entry, value)?;
        }
        self.fields.insert(key.to_string(), merged);
        Ok(())
    }

    /// Set a single property (or array index) of a compound field
    pub fn set_compound_entry<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        entry: &str,
        value: &T,
    ) -> Result<(), FieldError> {
        if key.is_empty() {
            return Ok(());
        }
        let value = deep_copy(key, value)?;
        let mut updated = self.compound_base(key)?;
        insert_entry(&mut updated, key, entry, value)?;
        self.fields.insert(key.to_string(), updated);
        Ok(())
    }

    fn compound_base(&self, key: &str) -> Result<Value, FieldError> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(Value::Object(Map::new())),
            Some(value @ (Value::Object(_) | Value::Array(_))) => Ok(value.clone()),
            Some(other) => Err(FieldError::NotCompound {
                key: key.to_string(),
                found: describe(other).to_string(),
            }),
        }
    }
}

fn insert_entry(target: &mut Value, key: &str, entry: &str, value: Value) -> Result<(), FieldError> {
    match target {
        Value::Object(map) => {
            map.insert(entry.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index: usize = entry.parse().map_err(|_| FieldError::NotCompound {
                key: key.to_string(),
                found: format!("an array (entry '{}' is not an index)", entry),
            })?;
            // Holes encode as null, the same as a sparse array would.
            if index >= items.len() {
                items.resize(index + 1, Value::Null);
            }
            items[index] = value;
            Ok(())
        }
        other => Err(FieldError::NotCompound {
            key: key.to_string(),
            found: describe(other).to_string(),
        }),
    }
}
