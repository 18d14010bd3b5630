use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Address of a field inside the form value tree.
///
/// Accepts dotted keys (`guardian.phone`), list indexes (`siblings[1].name`)
/// and quoted keys for names that are not identifiers (`["first name"]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn new(segments: Vec<PathSegment>) -> Result<Self, FieldPathError> {
        if segments.is_empty() {
            return Err(FieldPathError::new("field path is empty"));
        }
        Ok(Self { segments })
    }

    pub fn key(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Key(name.into())],
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        self.segments.as_slice()
    }

    pub fn parse(input: &str) -> Result<Self, FieldPathError> {
        let segments = parse_segments(input)?;
        Self::new(segments)
    }

    /// True when `self` equals `prefix` or lies underneath it.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(prefix.segments())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if idx == 0 && is_identifier(key) {
                        f.write_str(key)?;
                    } else if is_identifier(key) {
                        f.write_str(".")?;
                        f.write_str(key)?;
                    } else {
                        f.write_str("[\"")?;
                        f.write_str(key.replace('\\', "\\\\").replace('"', "\\\"").as_str())?;
                        f.write_str("\"]")?;
                    }
                }
                PathSegment::Index(index) => {
                    write!(f, "[{index}]")?;
                }
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = FieldPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = FieldPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl From<FieldPath> for String {
    fn from(value: FieldPath) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FieldPathError {
    message: String,
}

impl FieldPathError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub(crate) fn index_out_of_range(index: usize, max: usize) -> Self {
        Self::new(format!("list index {index} exceeds the maximum of {max}"))
    }
}

/// Conversion accepted by every engine operation that names a field.
pub trait IntoFieldPath {
    fn into_field_path(self) -> Result<FieldPath, FieldPathError>;
}

impl IntoFieldPath for FieldPath {
    fn into_field_path(self) -> Result<FieldPath, FieldPathError> {
        Ok(self)
    }
}

impl IntoFieldPath for &FieldPath {
    fn into_field_path(self) -> Result<FieldPath, FieldPathError> {
        Ok(self.clone())
    }
}

impl IntoFieldPath for &str {
    fn into_field_path(self) -> Result<FieldPath, FieldPathError> {
        FieldPath::parse(self)
    }
}

impl IntoFieldPath for String {
    fn into_field_path(self) -> Result<FieldPath, FieldPathError> {
        FieldPath::parse(self.as_str())
    }
}

impl IntoFieldPath for &String {
    fn into_field_path(self) -> Result<FieldPath, FieldPathError> {
        FieldPath::parse(self.as_str())
    }
}

fn parse_segments(input: &str) -> Result<Vec<PathSegment>, FieldPathError> {
    let raw = input.trim();
    if raw.is_empty() {
        return Err(FieldPathError::new("field path is empty"));
    }

    let chars: Vec<char> = raw.chars().collect();
    let mut idx = 0usize;
    let mut out = Vec::<PathSegment>::new();

    while idx < chars.len() {
        let ch = chars[idx];
        if ch == '.' {
            if out.is_empty() {
                return Err(FieldPathError::new("path cannot start with '.'"));
            }
            idx += 1;
            let key = parse_key(&chars, &mut idx)?;
            out.push(PathSegment::Key(key));
            continue;
        }

        if ch == '[' {
            let segment = parse_bracket_segment(&chars, &mut idx)?;
            out.push(segment);
            continue;
        }

        if out.is_empty() {
            let key = parse_key(&chars, &mut idx)?;
            out.push(PathSegment::Key(key));
            continue;
        }

        return Err(FieldPathError::new(format!(
            "unexpected character '{}' at position {}",
            ch, idx
        )));
    }

    Ok(out)
}

fn parse_key(chars: &[char], idx: &mut usize) -> Result<String, FieldPathError> {
    let start = *idx;
    while *idx < chars.len() {
        let ch = chars[*idx];
        if ch == '.' || ch == '[' || ch == ']' {
            break;
        }
        *idx += 1;
    }
    if *idx == start {
        return Err(FieldPathError::new(format!(
            "expected key at position {}",
            start
        )));
    }
    Ok(chars[start..*idx].iter().collect::<String>())
}

fn parse_bracket_segment(chars: &[char], idx: &mut usize) -> Result<PathSegment, FieldPathError> {
    if chars.get(*idx).copied() != Some('[') {
        return Err(FieldPathError::new("expected '['"));
    }
    *idx += 1;
    if *idx >= chars.len() {
        return Err(FieldPathError::new("unterminated '[' segment"));
    }

    let ch = chars[*idx];
    if ch == '"' || ch == '\'' {
        let quote = ch;
        *idx += 1;
        let mut key = String::new();
        let mut closed = false;
        while *idx < chars.len() {
            let c = chars[*idx];
            *idx += 1;
            if c == '\\' {
                let Some(next) = chars.get(*idx).copied() else {
                    return Err(FieldPathError::new("unterminated escape in quoted key"));
                };
                key.push(next);
                *idx += 1;
                continue;
            }
            if c == quote {
                closed = true;
                break;
            }
            key.push(c);
        }
        if !closed {
            return Err(FieldPathError::new("unterminated quoted key"));
        }
        if chars.get(*idx).copied() != Some(']') {
            return Err(FieldPathError::new("expected closing ']'"));
        }
        *idx += 1;
        return Ok(PathSegment::Key(key));
    }

    let start = *idx;
    while *idx < chars.len() && chars[*idx] != ']' {
        *idx += 1;
    }
    if *idx >= chars.len() {
        return Err(FieldPathError::new("unterminated '[' segment"));
    }
    let raw = chars[start..*idx].iter().collect::<String>();
    *idx += 1;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FieldPathError::new("empty bracket segment"));
    }
    if let Ok(index) = trimmed.parse::<usize>() {
        return Ok(PathSegment::Index(index));
    }
    Ok(PathSegment::Key(trimmed.to_string()))
}

fn is_identifier(input: &str) -> bool {
    let mut chars = input.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}
