// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Relay Websocket - talk back to clients of a managed websocket API.
//!
//! Handlers serving websocket events only see the incoming message. To push
//! data to a client, query it or hang up, they call the connections API of
//! the stage the event came from:
//!
//! ```ignore
//! use relay_websocket::{ConnectionsClient, Credentials};
//!
//! let client = ConnectionsClient::new("abc123", "eu-west-1", "prod", Credentials::from_env()?)?;
//! client.message(&connection_id, "pong")?;
//! ```
//!
//! Requests are signed with AWS Signature Version 4 using the process
//! credentials. A connection that went away surfaces as
//! [`WebsocketError::Gone`].

mod client;
mod credentials;
mod error;
pub mod signing;

pub use client::{ConnectionIdentity, ConnectionStatus, ConnectionsClient};
pub use credentials::{ACCESS_KEY_ID_VAR, Credentials, SECRET_ACCESS_KEY_VAR, SESSION_TOKEN_VAR};
pub use error::{Result, WebsocketError};
