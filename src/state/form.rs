use crate::core::field_path::{FieldPath, FieldPathError};
use crate::core::value::Value;
use crate::state::store::ValueStore;
use indexmap::{IndexMap, IndexSet};

/// Values plus the per-field bookkeeping that decides which errors are shown.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    values: ValueStore,
    touched: IndexSet<FieldPath>,
    errors: IndexMap<FieldPath, String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: Value) -> Self {
        Self {
            values: ValueStore::from_value(values),
            ..Self::default()
        }
    }

    pub fn values(&self) -> &ValueStore {
        &self.values
    }

    pub fn value(&self, path: &FieldPath) -> Option<&Value> {
        self.values.get(path)
    }

    pub(crate) fn write(&mut self, path: &FieldPath, value: Value) -> Result<(), FieldPathError> {
        self.values.set(path, value)
    }

    pub fn touched(&self) -> &IndexSet<FieldPath> {
        &self.touched
    }

    pub fn is_touched(&self, path: &FieldPath) -> bool {
        self.touched.contains(path)
    }

    pub(crate) fn touch(&mut self, path: &FieldPath) -> bool {
        self.touched.insert(path.clone())
    }

    pub fn errors(&self) -> &IndexMap<FieldPath, String> {
        &self.errors
    }

    pub fn error(&self, path: &FieldPath) -> Option<&str> {
        self.errors.get(path).map(String::as_str)
    }

    /// Error for `path` only once the user has interacted with it.
    pub fn visible_error(&self, path: &FieldPath) -> Option<&str> {
        if !self.is_touched(path) {
            return None;
        }
        self.error(path)
    }

    pub(crate) fn set_error(&mut self, path: &FieldPath, message: impl Into<String>) {
        self.errors.insert(path.clone(), message.into());
    }

    pub(crate) fn clear_error(&mut self, path: &FieldPath) -> bool {
        self.errors.shift_remove(path).is_some()
    }

    /// Replaces the committed errors of `fields` with `errors`.
    pub(crate) fn commit_errors<'a>(
        &mut self,
        fields: impl IntoIterator<Item = &'a FieldPath>,
        errors: &IndexMap<FieldPath, String>,
    ) {
        for field in fields {
            self.errors.shift_remove(field);
        }
        for (path, message) in errors {
            self.errors.insert(path.clone(), message.clone());
        }
    }

    pub(crate) fn discard(&mut self) {
        self.values.clear();
        self.touched.clear();
        self.errors.clear();
    }
}
