//! Strict JSON decoding with classified, client-facing error messages.
//!
//! [`decode_json`] accepts exactly one JSON value, optionally rejects
//! fields the target type does not declare, and maps every failure onto
//! a [`ToolkitError`] whose message can be returned to the client as-is.

use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::config::ToolkitConfig;
use crate::errors::{ToolkitError, ToolkitResult};

/// Decode `bytes` as a single JSON value of type `T`.
///
/// The caller is responsible for capping `bytes` at
/// [`ToolkitConfig::effective_max_json_bytes`]; this only checks shape.
pub fn decode_json<T>(config: &ToolkitConfig, bytes: &[u8]) -> ToolkitResult<T>
where
    T: DeserializeOwned,
{
    if bytes
        .iter()
        .all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
    {
        return Err(ToolkitError::EmptyBody);
    }

    let mut unknown: Vec<String> = Vec::new();
    let mut de = serde_json::Deserializer::from_slice(bytes);

    let value: Result<T, _> = {
        let mut record = |path: serde_ignored::Path<'_>| unknown.push(path.to_string());
        let tracked = serde_ignored::Deserializer::new(&mut de, &mut record);
        serde_path_to_error::deserialize(tracked)
    };

    let value = match value {
        Ok(value) => value,
        Err(err) => {
            let field = field_name(err.path());
            let err = classify(bytes, field, err.into_inner());
            tracing::debug!(error = %err, "rejected JSON body");
            return Err(err);
        }
    };

    if !config.allow_unknown_json_fields {
        if let Some(field) = unknown.into_iter().next() {
            tracing::debug!(%field, "rejected JSON body with unknown field");
            return Err(ToolkitError::UnknownField { field });
        }
    }

    // Anything but trailing whitespace means a second value.
    if de.end().is_err() {
        return Err(ToolkitError::MultipleJsonValues);
    }

    Ok(value)
}

fn field_name(path: &serde_path_to_error::Path) -> Option<String> {
    let rendered = path.to_string();
    // The root renders as "." and carries no field.
    if rendered == "." || rendered.is_empty() {
        None
    } else {
        Some(rendered)
    }
}

fn classify(bytes: &[u8], field: Option<String>, err: serde_json::Error) -> ToolkitError {
    let offset = byte_offset(bytes, err.line(), err.column());

    match err.classify() {
        Category::Syntax => ToolkitError::MalformedJson {
            offset: Some(offset),
        },
        Category::Eof => ToolkitError::MalformedJson { offset: None },
        Category::Data if is_type_mismatch(&err) => {
            ToolkitError::InvalidJsonValue { field, offset }
        }
        Category::Data if is_unknown_field(&err) => ToolkitError::UnknownField {
            field: unknown_field_name(&err).unwrap_or_else(|| field.unwrap_or_default()),
        },
        Category::Io => ToolkitError::Unmarshal {
            detail: err.to_string(),
        },
        Category::Data => ToolkitError::Decode {
            message: err.to_string(),
        },
    }
}

fn is_type_mismatch(err: &serde_json::Error) -> bool {
    let message = err.to_string();
    message.starts_with("invalid type")
        || message.starts_with("invalid value")
        || message.starts_with("invalid length")
}

// Raised by types that opt into `#[serde(deny_unknown_fields)]`.
fn is_unknown_field(err: &serde_json::Error) -> bool {
    err.to_string().starts_with("unknown field")
}

fn unknown_field_name(err: &serde_json::Error) -> Option<String> {
    let message = err.to_string();
    let rest = message.strip_prefix("unknown field `")?;
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

/// Convert serde_json's 1-based line/column into the number of bytes read
/// up to and including the offending byte.
fn byte_offset(bytes: &[u8], line: usize, column: usize) -> usize {
    if line <= 1 {
        return column.min(bytes.len());
    }
    let line_start = bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'\n')
        .nth(line - 2)
        .map(|(i, _)| i + 1)
        .unwrap_or(0);
    (line_start + column).min(bytes.len())
}
