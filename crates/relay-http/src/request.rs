// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Translation of HTTP API events into requests.
//!
//! Two event layouts are accepted:
//!
//! ```text
//! 1.0: httpMethod, path, (multiValue)queryStringParameters, (multiValue)headers
//! 2.0: requestContext.http.method, rawPath, rawQueryString, headers, cookies
//! ```
//!
//! Both may carry `body` with `isBase64Encoded`.

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose};
use relay_runtime::{HandlerError, HandlerResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Error type reported for events that are not HTTP events.
pub const INVALID_EVENT_TYPE: &str = "InvalidHttpEvent";

/// Event payload layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadVersion {
    V1,
    V2,
}

/// An HTTP request decoded from an event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub version: PayloadVersion,
    pub method: String,
    pub path: String,
    /// Decoded query parameters, in order, repeated keys kept
    pub query: Vec<(String, String)>,
    /// Headers keyed by lower-cased name; repeated values joined with ", "
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

fn invalid(message: impl Into<String>) -> HandlerError {
    HandlerError::new(INVALID_EVENT_TYPE, message)
}

impl HttpRequest {
    /// Decode an event payload.
    pub fn from_event(event: &Value) -> HandlerResult<Self> {
        if !event.is_object() {
            return Err(invalid("HTTP event must be a JSON object"));
        }

        let is_v2 = event["version"] == "2.0" || event["requestContext"]["http"].is_object();
        let mut request = if is_v2 {
            Self::from_v2(event)?
        } else {
            Self::from_v1(event)?
        };
        request.body = decode_body(event)?;
        Ok(request)
    }

    fn from_v1(event: &Value) -> HandlerResult<Self> {
        let method = required_str(event, "httpMethod")?;
        let path = required_str(event, "path")?;

        let query = match event["multiValueQueryStringParameters"].as_object() {
            Some(params) => multi_value_pairs(params),
            None => single_value_pairs(event["queryStringParameters"].as_object()),
        };

        let headers = match event["multiValueHeaders"].as_object() {
            Some(headers) => multi_value_pairs(headers)
                .into_iter()
                .fold(BTreeMap::new(), merge_header),
            None => single_value_pairs(event["headers"].as_object())
                .into_iter()
                .fold(BTreeMap::new(), merge_header),
        };

        Ok(Self {
            version: PayloadVersion::V1,
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            query,
            headers,
            body: Vec::new(),
        })
    }

    fn from_v2(event: &Value) -> HandlerResult<Self> {
        let method = event["requestContext"]["http"]["method"]
            .as_str()
            .ok_or_else(|| invalid("missing requestContext.http.method"))?;
        let path = event["rawPath"]
            .as_str()
            .or_else(|| event["requestContext"]["http"]["path"].as_str())
            .ok_or_else(|| invalid("missing rawPath"))?;

        let query = parse_query_string(event["rawQueryString"].as_str().unwrap_or_default());

        let mut headers = single_value_pairs(event["headers"].as_object())
            .into_iter()
            .fold(BTreeMap::new(), merge_header);

        // 2.0 moves cookies out of the headers
        if let Some(cookies) = event["cookies"].as_array() {
            let joined = cookies
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; ");
            if !joined.is_empty() {
                headers.entry("cookie".to_string()).or_insert(joined);
            }
        }

        Ok(Self {
            version: PayloadVersion::V2,
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            query,
            headers,
            body: Vec::new(),
        })
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// First query value for `name`.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Body as text, if it is valid UTF-8.
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Body decoded as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> HandlerResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

fn required_str<'a>(event: &'a Value, field: &str) -> HandlerResult<&'a str> {
    event[field]
        .as_str()
        .ok_or_else(|| invalid(format!("missing {field}")))
}

fn decode_body(event: &Value) -> HandlerResult<Vec<u8>> {
    let Some(body) = event["body"].as_str() else {
        return Ok(Vec::new());
    };
    if event["isBase64Encoded"].as_bool().unwrap_or(false) {
        general_purpose::STANDARD
            .decode(body)
            .map_err(|e| invalid(format!("invalid base64 body: {e}")))
    } else {
        Ok(body.as_bytes().to_vec())
    }
}

fn single_value_pairs(map: Option<&Map<String, Value>>) -> Vec<(String, String)> {
    map.into_iter()
        .flatten()
        .filter_map(|(k, v)| scalar_to_string(v).map(|v| (k.clone(), v)))
        .collect()
}

fn multi_value_pairs(map: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, values) in map {
        match values.as_array() {
            Some(values) => pairs.extend(
                values
                    .iter()
                    .filter_map(scalar_to_string)
                    .map(|v| (key.clone(), v)),
            ),
            None => pairs.extend(scalar_to_string(values).map(|v| (key.clone(), v))),
        }
    }
    pairs
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn merge_header(
    mut headers: BTreeMap<String, String>,
    (name, value): (String, String),
) -> BTreeMap<String, String> {
    headers
        .entry(name.to_ascii_lowercase())
        .and_modify(|existing| {
            existing.push_str(", ");
            existing.push_str(&value);
        })
        .or_insert_with(|| value.clone());
    headers
}

fn parse_query_string(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(spaced)
}
