use crate::core::field_path::{FieldPath, FieldPathError};
use crate::core::value::Value;

/// Nested key/value bag holding every field the wizard collects.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueStore {
    root: Value,
}

impl Default for ValueStore {
    fn default() -> Self {
        Self {
            root: Value::object(),
        }
    }
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store from an existing record. Non-object roots are ignored.
    pub fn from_value(root: Value) -> Self {
        match root {
            Value::Object(_) => Self { root },
            _ => Self::default(),
        }
    }

    pub fn set(&mut self, path: &FieldPath, value: Value) -> Result<(), FieldPathError> {
        self.root.set_path(path, value)
    }

    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        self.root.get_path(path)
    }

    /// Missing paths read as `Value::None`.
    pub fn value_or_none(&self, path: &FieldPath) -> Value {
        self.get(path).cloned().unwrap_or_default()
    }

    pub fn is_present(&self, path: &FieldPath) -> bool {
        self.get(path).is_some_and(|value| !value.is_empty())
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn clear(&mut self) {
        self.root = Value::object();
    }
}
