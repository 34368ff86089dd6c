// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for the connections client.

use thiserror::Error;

/// Errors returned by [`ConnectionsClient`](crate::ConnectionsClient).
#[derive(Debug, Error)]
pub enum WebsocketError {
    /// Missing credentials, malformed endpoint or signing setup.
    #[error("configuration error: {0}")]
    Config(String),

    /// The connection no longer exists (HTTP 410).
    #[error("connection '{0}' is gone")]
    Gone(String),

    /// Non-success status other than 410.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// A response body that could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, WebsocketError>;

impl From<url::ParseError> for WebsocketError {
    fn from(err: url::ParseError) -> Self {
        WebsocketError::Config(format!("invalid endpoint: {err}"))
    }
}
