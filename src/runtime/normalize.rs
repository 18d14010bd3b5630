//! Maps the response envelopes the backend produces into fixed result types.
//! Collaborator implementations call these once so nothing past the boundary
//! has to guess at shapes.

use crate::core::value::Value;
use crate::engine::SubmittedRecord;
use crate::error::{ReferenceError, SubmitError};
use crate::state::reference::ReferenceItem;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Map;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SubmitEnvelope {
    success: Option<bool>,
    record: Option<serde_json::Value>,
    data: Option<serde_json::Value>,
    id: Option<RecordId>,
    error: Option<ErrorDetail>,
    message: Option<String>,
    errors: Option<IndexMap<String, Messages>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordId {
    Text(String),
    Number(i64),
}

impl RecordId {
    fn into_string(self) -> String {
        match self {
            Self::Text(id) => id,
            Self::Number(id) => id.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Text(String),
    Detail { message: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Messages {
    One(String),
    Many(Vec<String>),
}

/// Interprets a create/update response body.
pub fn submit_response(body: serde_json::Value) -> Result<SubmittedRecord, SubmitError> {
    if !body.is_object() {
        return Err(SubmitError::Transport(format!(
            "unexpected response: {body}"
        )));
    }
    let envelope: SubmitEnvelope = serde_json::from_value(body.clone())
        .map_err(|err| SubmitError::Transport(format!("unexpected response: {err}")))?;

    if let Some(message) = rejection(&envelope) {
        return Err(SubmitError::Rejected(message));
    }

    let record = envelope
        .record
        .or(envelope.data)
        .filter(serde_json::Value::is_object)
        .unwrap_or(body);
    let id = record
        .get("id")
        .cloned()
        .and_then(|id| serde_json::from_value::<RecordId>(id).ok())
        .map(RecordId::into_string)
        .or_else(|| envelope.id.map(RecordId::into_string));

    match id {
        Some(id) => Ok(SubmittedRecord::new(id).with_data(Value::from(record))),
        None if envelope.success == Some(true) => {
            Ok(SubmittedRecord::new(String::new()).with_data(Value::from(record)))
        }
        None => Err(SubmitError::Transport(
            "response carries no record id".to_string(),
        )),
    }
}

fn rejection(envelope: &SubmitEnvelope) -> Option<String> {
    if let Some(errors) = envelope.errors.as_ref().filter(|errors| !errors.is_empty()) {
        let joined = errors
            .iter()
            .map(|(field, messages)| match messages {
                Messages::One(message) => format!("{field}: {message}"),
                Messages::Many(messages) => format!("{field}: {}", messages.join(", ")),
            })
            .collect::<Vec<_>>()
            .join("; ");
        return Some(joined);
    }
    if let Some(error) = &envelope.error {
        return Some(match error {
            ErrorDetail::Text(message) => message.clone(),
            ErrorDetail::Detail { message } => message.clone(),
        });
    }
    if envelope.success == Some(false) {
        return Some(
            envelope
                .message
                .clone()
                .unwrap_or_else(|| "request was rejected".to_string()),
        );
    }
    let has_record = envelope.record.is_some() || envelope.data.is_some() || envelope.id.is_some();
    if !has_record && envelope.success.is_none() {
        return envelope.message.clone();
    }
    None
}

/// Interprets a reference-data response: a bare array or an object wrapping
/// the array in `items`, `data` or `results`.
pub fn reference_response(body: serde_json::Value) -> Result<Vec<ReferenceItem>, ReferenceError> {
    let rows = match body {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Object(mut map) => ["items", "data", "results"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(serde_json::Value::Array(rows)) => Some(rows),
                _ => None,
            })
            .ok_or_else(|| ReferenceError::Shape("no item list in response".to_string()))?,
        other => {
            return Err(ReferenceError::Shape(format!(
                "expected a list, found {other}"
            )));
        }
    };

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| match row {
            serde_json::Value::Object(fields) => reference_item(fields)
                .ok_or_else(|| ReferenceError::Shape(format!("item {index} has no id"))),
            _ => Err(ReferenceError::Shape(format!("item {index} is not an object"))),
        })
        .collect()
}

fn reference_item(mut fields: Map<String, serde_json::Value>) -> Option<ReferenceItem> {
    let id = match fields.remove("id")? {
        serde_json::Value::String(id) => id,
        serde_json::Value::Number(id) => id.to_string(),
        _ => return None,
    };
    let label = ["label", "name", "title"]
        .iter()
        .find_map(|key| fields.get(*key).and_then(serde_json::Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| id.clone());
    fields.remove("label");

    let mut item = ReferenceItem::new(id, label);
    for (name, value) in fields {
        item = item.with_attribute(name, Value::from(value));
    }
    Some(item)
}
