use serde_json::Value;

use crate::app::{Result, SyncError};
use crate::domain::FeedSnapshot;

/// Keys searched, in order, when the feed is a JSON object.
pub const LIST_KEYS: [&str; 2] = ["items", "urls"];

/// Turns a feed response body into a [`FeedSnapshot`].
///
/// Accepted shapes:
/// - a bare array of URL strings: `["https://…", …]`
/// - an object holding that list under `items` or `urls`
/// - JSON Feed 1.0, where `items` holds objects with a `url` string
///
/// Anything else, including a non-string element or an empty URL, is a
/// [`SyncError::FeedFormat`].
#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, body: &[u8]) -> Result<FeedSnapshot> {
        let document: Value = serde_json::from_slice(body)
            .map_err(|e| SyncError::FeedFormat(format!("invalid JSON: {}", e)))?;

        let list = match &document {
            Value::Array(items) => items,
            Value::Object(map) => {
                let (key, value) = LIST_KEYS
                    .iter()
                    .find_map(|key| map.get(*key).map(|v| (*key, v)))
                    .ok_or_else(|| {
                        SyncError::FeedFormat(format!(
                            "object has none of the keys {:?}",
                            LIST_KEYS
                        ))
                    })?;
                value.as_array().ok_or_else(|| {
                    SyncError::FeedFormat(format!("'{}' must be a list", key))
                })?
            }
            other => {
                return Err(SyncError::FeedFormat(format!(
                    "expected a list or an object, got {}",
                    kind(other)
                )))
            }
        };

        let urls = list
            .iter()
            .enumerate()
            .map(|(index, item)| extract_url(index, item))
            .collect::<Result<Vec<_>>>()?;

        Ok(FeedSnapshot::new(urls))
    }
}

fn extract_url(index: usize, item: &Value) -> Result<String> {
    let url = match item {
        Value::String(url) => url,
        Value::Object(map) => match map.get("url") {
            Some(Value::String(url)) => url,
            Some(other) => {
                return Err(SyncError::FeedFormat(format!(
                    "item {}: 'url' must be a string, got {}",
                    index,
                    kind(other)
                )))
            }
            None => {
                return Err(SyncError::FeedFormat(format!(
                    "item {}: object has no 'url'",
                    index
                )))
            }
        },
        other => {
            return Err(SyncError::FeedFormat(format!(
                "item {}: expected a URL string, got {}",
                index,
                kind(other)
            )))
        }
    };

    if url.is_empty() {
        return Err(SyncError::FeedFormat(format!("item {}: empty URL", index)));
    }

    Ok(url.clone())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
