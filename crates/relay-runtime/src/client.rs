// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Client for the control API.
//!
//! The control API is a host-local plain-HTTP service exposing three
//! operations the runtime needs per invocation, plus one for startup
//! failures:
//!
//! ```text
//! GET  /2018-06-01/runtime/invocation/next          -> id header + JSON event
//! POST /2018-06-01/runtime/invocation/{id}/response <- JSON result
//! POST /2018-06-01/runtime/invocation/{id}/error    <- {errorMessage, errorType}
//! POST /2018-06-01/runtime/init/error               <- {errorMessage, errorType}
//! ```
//!
//! All calls block. `next` in particular blocks until the host has work,
//! which may take minutes; no timeout is applied on this side.

use serde_json::Value;
use tracing::{debug, instrument, warn};
use urlencoding::encode;

use crate::config::RuntimeConfig;
use crate::context::{Context, REQUEST_ID_HEADER};
use crate::error::{ErrorReport, Result, RuntimeError};
use crate::invocation::Invocation;

const API_VERSION: &str = "2018-06-01";

/// Header naming the error kind on error posts.
pub const ERROR_TYPE_HEADER: &str = "Lambda-Runtime-Function-Error-Type";

const MAX_REDIRECTS: u32 = 10;

/// One unit of work as returned by the control API.
#[derive(Debug, Clone, PartialEq)]
pub struct NextEvent {
    pub request_id: String,
    /// `Null` when the body could not be decoded
    pub payload: Value,
    pub context: Context,
    /// Why the body could not be decoded, if it couldn't
    pub payload_error: Option<String>,
}

/// The control API operations the run loop depends on.
///
/// [`RuntimeApiClient`] is the HTTP implementation; the trait exists so the
/// loop can be driven by something other than a live control API.
pub trait RuntimeApi {
    /// Block until the next invocation is available.
    fn next_event(&self) -> Result<NextEvent>;

    /// Report a successful result. `body` is already JSON-encoded.
    fn post_response(&self, request_id: &str, body: Vec<u8>) -> Result<()>;

    /// Report a failed invocation.
    fn post_error(&self, request_id: &str, report: &ErrorReport) -> Result<()>;

    /// Report that the runtime could not initialize.
    fn post_init_error(&self, report: &ErrorReport) -> Result<()>;

    /// Fetch the next event and wrap it as an [`Invocation`] that
    /// acknowledges through this API.
    fn next_invocation(&self) -> Result<Invocation<'_>>
    where
        Self: Sized,
    {
        let event = self.next_event()?;
        Ok(Invocation::new(self, event))
    }
}

impl<T: RuntimeApi + ?Sized> RuntimeApi for &T {
    fn next_event(&self) -> Result<NextEvent> {
        (**self).next_event()
    }

    fn post_response(&self, request_id: &str, body: Vec<u8>) -> Result<()> {
        (**self).post_response(request_id, body)
    }

    fn post_error(&self, request_id: &str, report: &ErrorReport) -> Result<()> {
        (**self).post_error(request_id, report)
    }

    fn post_init_error(&self, report: &ErrorReport) -> Result<()> {
        (**self).post_init_error(report)
    }
}

/// Blocking HTTP client for the control API.
#[derive(Debug, Clone)]
pub struct RuntimeApiClient {
    base_url: String,
    agent: ureq::Agent,
}

impl RuntimeApiClient {
    /// Create a client for the given address.
    ///
    /// The address is normally the bare `host:port` the host exports; a full
    /// `http://` or `https://` URL is accepted as well.
    pub fn new(runtime_api: &str) -> Self {
        let trimmed = runtime_api.trim().trim_end_matches('/');
        let base_url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };

        let agent = ureq::AgentBuilder::new().redirects(MAX_REDIRECTS).build();

        Self { base_url, agent }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(&config.runtime_api)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn next_url(&self) -> String {
        format!("{}/{API_VERSION}/runtime/invocation/next", self.base_url)
    }

    fn response_url(&self, request_id: &str) -> String {
        format!(
            "{}/{API_VERSION}/runtime/invocation/{}/response",
            self.base_url,
            encode(request_id)
        )
    }

    fn error_url(&self, request_id: &str) -> String {
        format!(
            "{}/{API_VERSION}/runtime/invocation/{}/error",
            self.base_url,
            encode(request_id)
        )
    }

    fn init_error_url(&self) -> String {
        format!("{}/{API_VERSION}/runtime/init/error", self.base_url)
    }

    fn post_json(&self, url: &str, body: &[u8], error_type: Option<&str>) -> Result<()> {
        let mut request = self
            .agent
            .post(url)
            .set("Content-Type", "application/json");
        if let Some(error_type) = error_type {
            request = request.set(ERROR_TYPE_HEADER, error_type);
        }

        let response = request.send_bytes(body).map_err(|e| {
            RuntimeError::Protocol(format!("error while calling the runtime API: {e}"))
        })?;

        let status = response.status();
        // read to the end so the connection goes back to the pool
        if let Err(e) = response.into_string() {
            debug!(error = %e, "Failed to drain runtime API response");
        }
        debug!(status, "Runtime API accepted post");
        Ok(())
    }

    fn post_report(&self, url: &str, report: &ErrorReport) -> Result<()> {
        let body = serde_json::to_vec(report)?;
        self.post_json(url, &body, Some(&report.error_type))
    }
}

impl RuntimeApi for RuntimeApiClient {
    #[instrument(skip(self))]
    fn next_event(&self) -> Result<NextEvent> {
        let response = self.agent.get(&self.next_url()).call().map_err(|e| {
            RuntimeError::Protocol(format!("failed to fetch next invocation: {e}"))
        })?;

        let request_id = response
            .header(REQUEST_ID_HEADER)
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if request_id.is_empty() {
            return Err(RuntimeError::Protocol(
                "failed to determine the invocation id".to_string(),
            ));
        }

        let context = Context::from_headers(|name| response.header(name));

        let body = response.into_string().map_err(|e| {
            RuntimeError::Protocol(format!(
                "failed to read invocation {request_id} body: {e}"
            ))
        })?;
        if body.is_empty() {
            return Err(RuntimeError::Protocol(format!(
                "empty runtime API response for invocation {request_id}"
            )));
        }

        // The id is known, so a body that is not JSON still gets acknowledged
        let (payload, payload_error) = match serde_json::from_str(&body) {
            Ok(payload) => (payload, None),
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "Invocation payload is not valid JSON");
                (
                    Value::Null,
                    Some(format!("invocation payload is not valid JSON: {e}")),
                )
            }
        };

        debug!(request_id = %request_id, body_size = body.len(), "Received invocation");

        Ok(NextEvent {
            request_id,
            payload,
            context,
            payload_error,
        })
    }

    #[instrument(skip(self, body), fields(request_id = %request_id, body_size = body.len()))]
    fn post_response(&self, request_id: &str, body: Vec<u8>) -> Result<()> {
        self.post_json(&self.response_url(request_id), &body, None)
    }

    #[instrument(skip(self, report), fields(request_id = %request_id, error_type = %report.error_type))]
    fn post_error(&self, request_id: &str, report: &ErrorReport) -> Result<()> {
        self.post_report(&self.error_url(request_id), report)
    }

    #[instrument(skip(self, report), fields(error_type = %report.error_type))]
    fn post_init_error(&self, report: &ErrorReport) -> Result<()> {
        self.post_report(&self.init_error_url(), report)
    }
}
