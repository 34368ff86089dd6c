// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP responses and their encoding as invocation results.

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose};
use relay_runtime::HandlerResult;
use serde::Serialize;
use serde_json::{Value, json};

/// An HTTP response produced by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Empty response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    /// Plain text response.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(body.into().into_bytes())
    }

    /// JSON response.
    pub fn json<T: Serialize + ?Sized>(status: u16, body: &T) -> HandlerResult<Self> {
        Ok(Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(serde_json::to_vec(body)?))
    }

    pub fn not_found() -> Self {
        Self::text(404, "Not found")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Encode as the invocation result the host turns back into HTTP.
    ///
    /// Bodies that are not valid UTF-8 are sent base64-encoded.
    pub fn into_result(self) -> Value {
        let (body, is_base64) = match String::from_utf8(self.body) {
            Ok(text) => (text, false),
            Err(e) => (general_purpose::STANDARD.encode(e.into_bytes()), true),
        };

        json!({
            "statusCode": self.status,
            "headers": self.headers,
            "body": body,
            "isBase64Encoded": is_base64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_response_result() {
        let result = HttpResponse::text(200, "Hello world!").into_result();
        assert_eq!(
            result,
            json!({
                "statusCode": 200,
                "headers": {"Content-Type": "text/plain; charset=utf-8"},
                "body": "Hello world!",
                "isBase64Encoded": false
            })
        );
    }

    #[test]
    fn test_binary_body_is_base64_encoded() {
        let result = HttpResponse::new(200)
            .with_header("Content-Type", "image/png")
            .with_body(vec![0x89, 0x50, 0x4e, 0x47, 0xff])
            .into_result();
        assert_eq!(result["isBase64Encoded"], true);
        assert_eq!(result["body"], "iVBOR/8=");
    }

    #[test]
    fn test_json_response() {
        let response = HttpResponse::json(201, &json!({"id": 2})).unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.body, br#"{"id":2}"#.to_vec());
        assert_eq!(
            response.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_not_found() {
        let response = HttpResponse::not_found();
        assert_eq!(response.status, 404);
        assert_eq!(response.body, b"Not found".to_vec());
    }
}
