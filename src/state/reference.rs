use crate::core::field_path::{FieldPath, IntoFieldPath};
use crate::core::value::Value;
use crate::error::WizardError;
use crate::state::store::ValueStore;
use indexmap::IndexMap;

/// One selectable option (a class, an academic year, a fee schedule...).
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceItem {
    pub id: String,
    pub label: String,
    pub attributes: IndexMap<String, Value>,
}

impl ReferenceItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            attributes: IndexMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::Text(self.id.clone())),
            "label" => Some(Value::Text(self.label.clone())),
            _ => self.attributes.get(name).cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceState {
    Loading,
    Ready(Vec<ReferenceItem>),
    Failed { message: String },
}

impl ReferenceState {
    /// Options to offer; empty while loading or after a failure.
    pub fn items(&self) -> &[ReferenceItem] {
        match self {
            Self::Ready(items) => items.as_slice(),
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn can_retry(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Pre-fills `target` from an attribute of a reference item.
///
/// With a selector the item whose id equals the selector field's value is
/// used, and the target follows every change of the selection. Without one
/// the first item is used and only an empty target is filled.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDefault {
    pub source: String,
    pub target: FieldPath,
    pub attribute: String,
    pub selector: Option<FieldPath>,
}

impl ReferenceDefault {
    pub fn new(
        source: impl Into<String>,
        target: impl IntoFieldPath,
        attribute: impl Into<String>,
    ) -> Result<Self, WizardError> {
        Ok(Self {
            source: source.into(),
            target: target.into_field_path()?,
            attribute: attribute.into(),
            selector: None,
        })
    }

    pub fn selected_by(mut self, selector: impl IntoFieldPath) -> Result<Self, WizardError> {
        self.selector = Some(selector.into_field_path()?);
        Ok(self)
    }

    pub fn is_selected_by(&self, path: &FieldPath) -> bool {
        self.selector
            .as_ref()
            .is_some_and(|selector| selector.starts_with(path) || path.starts_with(selector))
    }

    /// Value to write into the target, if any.
    pub fn resolve(&self, items: &[ReferenceItem], values: &ValueStore) -> Option<Value> {
        let item = match &self.selector {
            Some(selector) => {
                let wanted = values.get(selector).and_then(Value::to_text)?;
                items.iter().find(|item| item.id == wanted.trim())?
            }
            None => {
                if values.is_present(&self.target) {
                    return None;
                }
                items.first()?
            }
        };
        item.attribute(self.attribute.as_str())
    }
}
