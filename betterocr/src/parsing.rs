//! Helpers for reading structured data back out of free-form LLM output.
//!
//! Models wrap their JSON in prose and code fences, and sometimes echo the
//! unquoted-key notation used in the prompts (`{data: "..."}`). The
//! extractors here scan for the first well-formed JSON value of the wanted
//! kind and fall back to repairing bare keys before giving up.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::{BetterOcrError, Result};
use crate::models::{Point, Quad, TextBox};

/// Corners of the axis-aligned rectangle `(x, y, w, h)`, clockwise from
/// the top-left. `None` when a corner does not fit in `i64`.
pub fn rectangle_corners(x: i64, y: i64, width: i64, height: i64) -> Option<Quad> {
    let right = x.checked_add(width)?;
    let bottom = y.checked_add(height)?;
    Some([[x, y], [right, y], [right, bottom], [x, bottom]])
}

fn corners_or_overflow(x: i64, y: i64, width: i64, height: i64) -> Result<Quad> {
    rectangle_corners(x, y, width, height).ok_or_else(|| {
        BetterOcrError::Parse(format!(
            "box [{x}, {y}, {width}, {height}] overflows the coordinate range"
        ))
    })
}

/// Normalize a box as emitted by the LLM into four corners.
///
/// Accepts `[x, y, w, h]`, `[[x, y], [w, h]]`, or four `[x, y]` corners.
/// Corners pass through unchanged, so normalizing twice is a no-op.
pub fn normalize_box(value: &Value) -> Result<Quad> {
    let items = value
        .as_array()
        .ok_or_else(|| BetterOcrError::Parse(format!("box is not an array: {value}")))?;

    if let [x, y, w, h] = items.as_slice() {
        if let (Some(x), Some(y), Some(w), Some(h)) = (coord(x), coord(y), coord(w), coord(h)) {
            return corners_or_overflow(x, y, w, h);
        }
    }

    if let [origin, size] = items.as_slice() {
        if let (Some([x, y]), Some([w, h])) = (pair(origin), pair(size)) {
            return corners_or_overflow(x, y, w, h);
        }
    }

    if let [a, b, c, d] = items.as_slice() {
        if let (Some(a), Some(b), Some(c), Some(d)) = (pair(a), pair(b), pair(c), pair(d)) {
            return Ok([a, b, c, d]);
        }
    }

    Err(BetterOcrError::Parse(format!(
        "unsupported box shape: {value}"
    )))
}

/// Integer coordinate, rounding floats. Non-finite floats and floats
/// outside the `i64` range are rejected rather than saturated.
fn coord(value: &Value) -> Option<i64> {
    if let Some(v) = value.as_i64() {
        return Some(v);
    }

    let v = value.as_f64()?.round();
    if v.is_finite() && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

fn pair(value: &Value) -> Option<Point> {
    match value.as_array()?.as_slice() {
        [x, y] => Some([coord(x)?, coord(y)?]),
        _ => None,
    }
}

/// First well-formed JSON object in `text`.
pub fn extract_json(text: &str) -> Result<Value> {
    if let Some(value) = first_json_value(text, '{', |_| true) {
        return Ok(value);
    }

    let repaired = quote_bare_keys(text);
    if let Some(value) = first_json_value(&repaired, '{', |_| true) {
        return Ok(value);
    }

    serde_json::from_str(strip_code_fences(text))
        .map_err(|e| BetterOcrError::Parse(format!("no JSON object in LLM output: {e}")))
}

/// First well-formed JSON array in `text`.
///
/// Arrays of objects win over other arrays so that an echoed `[0]` marker
/// in front of the payload is not mistaken for it.
pub fn extract_list(text: &str) -> Result<Vec<Value>> {
    let repaired = quote_bare_keys(text);
    let candidates = [text, repaired.as_str()];

    let found = candidates
        .iter()
        .find_map(|candidate| first_json_value(candidate, '[', is_record_list))
        .or_else(|| {
            candidates
                .iter()
                .find_map(|candidate| first_json_value(candidate, '[', |_| true))
        });

    match found {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(BetterOcrError::Parse(
            "no JSON array in LLM output".to_string(),
        )),
    }
}

/// Interpret a text-mode LLM reply.
///
/// Returns the `data` field of the first JSON object, or the reply itself
/// when it is a bare JSON string.
pub fn text_from_response(output: &str) -> Result<String> {
    let value = extract_json(output).map_err(|error| {
        tracing::debug!(%error, "LLM output holds no usable JSON");
        BetterOcrError::NoTextDetected
    })?;

    if let Some(data) = value.get("data") {
        return match data {
            Value::String(text) => Ok(text.clone()),
            Value::Null => Err(BetterOcrError::NoTextDetected),
            other => Ok(other.to_string()),
        };
    }

    match value {
        Value::String(text) => Ok(text),
        _ => Err(BetterOcrError::NoTextDetected),
    }
}

/// Interpret a box-mode LLM reply into normalized text boxes.
pub fn boxes_from_response(output: &str) -> Result<Vec<TextBox>> {
    let flattened = output.replace('\n', "");
    extract_list(&flattened)?
        .iter()
        .map(text_box_from_item)
        .collect()
}

fn text_box_from_item(item: &Value) -> Result<TextBox> {
    let bbox = item
        .get("box")
        .ok_or_else(|| BetterOcrError::Parse(format!("item has no box: {item}")))?;
    let text = item
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| BetterOcrError::Parse(format!("item has no text: {item}")))?;

    Ok(TextBox {
        bbox: normalize_box(bbox)?,
        text: text.to_string(),
    })
}

fn is_record_list(value: &Value) -> bool {
    match value.as_array() {
        Some(items) => items.first().map_or(true, Value::is_object),
        None => false,
    }
}

fn first_json_value(text: &str, open: char, accept: impl Fn(&Value) -> bool) -> Option<Value> {
    text.char_indices()
        .filter(|&(_, c)| c == open)
        .find_map(|(idx, _)| {
            let mut stream = serde_json::Deserializer::from_str(&text[idx..]).into_iter::<Value>();
            match stream.next() {
                Some(Ok(value)) if accept(&value) => Some(value),
                _ => None,
            }
        })
}

fn bare_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?P<lead>[{,]\s*)(?P<key>[A-Za-z_][A-Za-z0-9_]*)\s*:")
            .expect("bare key pattern is valid")
    })
}

fn quote_bare_keys(text: &str) -> String {
    bare_key_pattern()
        .replace_all(text, r#"${lead}"${key}":"#)
        .into_owned()
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (```json)
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().trim_end_matches("```").trim()
}
