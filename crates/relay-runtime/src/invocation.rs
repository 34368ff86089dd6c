// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! A single unit of work and its acknowledgement.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::client::{NextEvent, RuntimeApi};
use crate::context::Context;
use crate::error::{ErrorReport, HandlerError, Result};

/// How an invocation was acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// The result was posted to the response endpoint
    Succeeded,
    /// A failure report was posted to the error endpoint
    Failed,
}

/// One invocation fetched from the control API.
///
/// Holds the API it came from as its acknowledgement channel. Both
/// acknowledgement methods consume the invocation, so it can be reported
/// at most once.
pub struct Invocation<'a> {
    api: &'a dyn RuntimeApi,
    request_id: String,
    payload: Value,
    context: Context,
    payload_error: Option<String>,
}

impl<'a> Invocation<'a> {
    pub fn new(api: &'a dyn RuntimeApi, event: NextEvent) -> Self {
        Self {
            api,
            request_id: event.request_id,
            payload: event.payload,
            context: event.context,
            payload_error: event.payload_error,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The event payload, exactly as decoded from the control API.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Set when the event body was not valid JSON; the payload is `Null`.
    pub fn payload_error(&self) -> Option<&str> {
        self.payload_error.as_deref()
    }

    /// Report a successful result.
    ///
    /// If the result cannot be encoded, a `SerializationError` failure is
    /// reported instead and [`Acknowledgement::Failed`] is returned. An error
    /// is only returned when the control API itself could not be reached.
    pub fn succeed<T>(self, result: &T) -> Result<Acknowledgement>
    where
        T: Serialize + ?Sized,
    {
        match serde_json::to_vec(result) {
            Ok(body) => {
                self.api.post_response(&self.request_id, body)?;
                Ok(Acknowledgement::Succeeded)
            }
            Err(e) => {
                warn!(
                    request_id = %self.request_id,
                    error = %e,
                    "Failed encoding invocation result, reporting failure instead"
                );
                self.fail(&HandlerError::serialization(format!(
                    "failed encoding invocation result: {e}"
                )))
            }
        }
    }

    /// Report a failed invocation.
    pub fn fail(self, error: &HandlerError) -> Result<Acknowledgement> {
        self.api
            .post_error(&self.request_id, &ErrorReport::from(error))?;
        Ok(Acknowledgement::Failed)
    }
}

impl std::fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("request_id", &self.request_id)
            .field("payload", &self.payload)
            .field("context", &self.context)
            .field("payload_error", &self.payload_error)
            .finish_non_exhaustive()
    }
}
