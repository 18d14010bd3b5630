use crate::core::value::Value;
use regex::Regex;

pub type ValidationError = String;
pub type Validator = Box<dyn Fn(&Value) -> Result<(), ValidationError> + Send + Sync>;

/// Run a list of validators against `value`, returning the first error.
pub fn run_validators(validators: &[Validator], value: &Value) -> Result<(), ValidationError> {
    for validator in validators {
        validator(value)?;
    }
    Ok(())
}

// Only `required` rejects empty input; the others pass it through so that
// optional fields may stay blank.

pub fn required(message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &Value| {
        if value.is_empty() {
            Err(message.clone())
        } else {
            Ok(())
        }
    })
}

pub fn min_length(min_len: usize, message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &Value| {
        if value.is_empty() {
            return Ok(());
        }
        match value.to_text() {
            Some(text) if text.trim().chars().count() < min_len => Err(message.clone()),
            _ => Ok(()),
        }
    })
}

pub fn max_length(max_len: usize, message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &Value| match value.to_text() {
        Some(text) if text.trim().chars().count() > max_len => Err(message.clone()),
        _ => Ok(()),
    })
}

pub fn pattern(re: Regex, message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &Value| {
        if value.is_empty() {
            return Ok(());
        }
        match value.to_text() {
            Some(text) if re.is_match(text.trim()) => Ok(()),
            _ => Err(message.clone()),
        }
    })
}

pub fn email(message: impl Into<String>) -> Result<Validator, regex::Error> {
    let re = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")?;
    Ok(pattern(re, message))
}

pub fn number(message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &Value| {
        if value.is_empty() || value.coerce_number().is_some() {
            Ok(())
        } else {
            Err(message.clone())
        }
    })
}

pub fn min_number(min: f64, message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &Value| match value.coerce_number() {
        Some(n) if n < min => Err(message.clone()),
        _ => Ok(()),
    })
}

pub fn custom<F>(f: F, message: impl Into<String>) -> Validator
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    let msg = message.into();
    Box::new(move |value: &Value| if f(value) { Ok(()) } else { Err(msg.clone()) })
}
