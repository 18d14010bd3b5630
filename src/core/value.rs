use crate::core::field_path::{FieldPath, FieldPathError, PathSegment};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Handle to a file picked in the UI (e.g. a student photo). The bytes live
/// with the uploader; the form only carries the reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
}

impl FileRef {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    None,
    Text(String),
    Bool(bool),
    Number(f64),
    File(FileRef),
    List(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    pub fn object() -> Self {
        Self::Object(IndexMap::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Text(v) => v.trim().is_empty(),
            Self::List(v) => v.is_empty(),
            Self::Object(v) => v.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileRef> {
        match self {
            Self::File(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric view that also accepts numeric text, as typed into a text box.
    pub fn coerce_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(v) => v.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Plain-text rendering used by text validators; containers have none.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::None => Some(String::new()),
            Self::Text(v) => Some(v.clone()),
            Self::Bool(v) => Some(v.to_string()),
            Self::Number(v) => Some(format_number(*v)),
            Self::File(file) => Some(file.name.clone()),
            Self::List(_) | Self::Object(_) => None,
        }
    }

    pub fn get_path(&self, path: &FieldPath) -> Option<&Value> {
        path.segments()
            .iter()
            .try_fold(self, |current, segment| match (segment, current) {
                (PathSegment::Key(key), Value::Object(map)) => map.get(key.as_str()),
                (PathSegment::Index(index), Value::List(list)) => list.get(*index),
                _ => None,
            })
    }

    /// Writes `value` at `path`, creating (or replacing) intermediate
    /// containers so that the path exists afterwards. List indexes above
    /// [`MAX_LIST_INDEX`] are refused and leave the tree untouched.
    pub fn set_path(&mut self, path: &FieldPath, value: Value) -> Result<(), FieldPathError> {
        if let Some(index) = path.segments().iter().find_map(|segment| match segment {
            PathSegment::Index(index) if *index > MAX_LIST_INDEX => Some(*index),
            _ => None,
        }) {
            return Err(FieldPathError::index_out_of_range(index, MAX_LIST_INDEX));
        }
        set_at(self, path.segments(), value);
        Ok(())
    }

    /// Copy of the tree without file references, which travel separately.
    pub fn without_files(&self) -> Value {
        match self {
            Self::File(_) => Self::None,
            Self::List(items) => Self::List(items.iter().map(Value::without_files).collect()),
            Self::Object(map) => Self::Object(
                map.iter()
                    .filter(|(_, value)| !matches!(value, Value::File(_)))
                    .map(|(key, value)| (key.clone(), value.without_files()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::None => serde_json::Value::Null,
            Self::Text(v) => serde_json::Value::String(v.clone()),
            Self::Bool(v) => serde_json::Value::Bool(*v),
            Self::Number(v) => number_to_json(*v),
            Self::File(file) => serde_json::to_value(file).unwrap_or(serde_json::Value::Null),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Self::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Largest list index a write may address. Lists are padded with
/// `Value::None` up to the index.
pub const MAX_LIST_INDEX: usize = 4096;

fn set_at(current: &mut Value, segments: &[PathSegment], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *current = value;
        return;
    };

    match head {
        PathSegment::Key(key) => {
            if !matches!(current, Value::Object(_)) {
                *current = Value::object();
            }
            if let Value::Object(map) = current {
                let slot = map.entry(key.clone()).or_insert(Value::None);
                set_at(slot, rest, value);
            }
        }
        PathSegment::Index(index) => {
            if !matches!(current, Value::List(_)) {
                *current = Value::List(Vec::new());
            }
            if let Value::List(list) = current {
                let Some(len) = index.checked_add(1) else {
                    return;
                };
                if list.len() < len {
                    list.resize_with(len, || Value::None);
                }
                if let Some(slot) = list.get_mut(*index) {
                    set_at(slot, rest, value);
                }
            }
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn number_to_json(value: f64) -> serde_json::Value {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        serde_json::Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::None,
            serde_json::Value::Bool(v) => Self::Bool(v),
            serde_json::Value::Number(v) => v.as_f64().map(Self::Number).unwrap_or(Self::None),
            serde_json::Value::String(v) => Self::Text(v),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<FileRef> for Value {
    fn from(value: FileRef) -> Self {
        Self::File(value)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(value: IndexMap<String, Value>) -> Self {
        Self::Object(value)
    }
}
