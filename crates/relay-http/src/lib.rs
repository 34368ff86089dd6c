// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Relay HTTP - serve HTTP API events with a request/response handler.
//!
//! The runtime hands handlers raw event payloads. This crate sits between
//! the two: it decodes HTTP API events into [`HttpRequest`]s, runs an
//! [`HttpHandler`], and encodes the [`HttpResponse`] as the result the host
//! expects.
//!
//! ```ignore
//! use relay_http::{HttpAdapter, HttpResponse};
//!
//! let handler = HttpAdapter::new(|request: relay_http::HttpRequest, _ctx: &relay_runtime::Context| {
//!     Ok(match request.path.as_str() {
//!         "/" => HttpResponse::text(200, "Hello world!"),
//!         _ => HttpResponse::not_found(),
//!     })
//! });
//! registry.register("http", handler.into_handler_kind())?;
//! ```

mod request;
mod response;

pub use request::{HttpRequest, INVALID_EVENT_TYPE, PayloadVersion};
pub use response::HttpResponse;

use relay_runtime::{Context, Handler, HandlerKind, HandlerResult};
use serde_json::Value;
use tracing::debug;

/// A handler working on HTTP requests instead of raw events.
pub trait HttpHandler: Send + Sync {
    fn handle(&self, request: HttpRequest, context: &Context) -> HandlerResult<HttpResponse>;
}

impl<F> HttpHandler for F
where
    F: Fn(HttpRequest, &Context) -> HandlerResult<HttpResponse> + Send + Sync,
{
    fn handle(&self, request: HttpRequest, context: &Context) -> HandlerResult<HttpResponse> {
        self(request, context)
    }
}

/// Exposes an [`HttpHandler`] as a runtime [`Handler`].
pub struct HttpAdapter<H> {
    inner: H,
}

impl<H: HttpHandler> HttpAdapter<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: HttpHandler + 'static> HttpAdapter<H> {
    /// Wrap as a runtime handler object.
    pub fn into_handler_kind(self) -> HandlerKind {
        HandlerKind::object(self)
    }
}

impl<H: HttpHandler> Handler for HttpAdapter<H> {
    fn handle(&self, payload: Value, context: &Context) -> HandlerResult {
        let request = HttpRequest::from_event(&payload)?;
        debug!(method = %request.method, path = %request.path, "Handling HTTP event");
        let response = self.inner.handle(request, context)?;
        Ok(response.into_result())
    }
}
