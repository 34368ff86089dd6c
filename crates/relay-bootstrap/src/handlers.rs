// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Handlers shipped with the bootstrap binary, selected through `_HANDLER`.

use relay_http::{HttpAdapter, HttpRequest, HttpResponse};
use relay_runtime::{Context, HandlerKind, HandlerRegistry, HandlerResult};
use serde_json::Value;

/// `hello`: ignores the event.
fn hello(_event: Value, _context: &Context) -> HandlerResult<&'static str> {
    Ok("Hello world")
}

/// `echo`: returns the event unchanged.
fn echo(event: Value, _context: &Context) -> HandlerResult {
    Ok(event)
}

/// `http`: a one-page site.
fn site(request: HttpRequest, _context: &Context) -> HandlerResult<HttpResponse> {
    Ok(match request.path.as_str() {
        "/" => HttpResponse::text(200, "Hello world!"),
        _ => HttpResponse::not_found(),
    })
}

pub fn registry() -> relay_runtime::Result<HandlerRegistry> {
    HandlerRegistry::new()
        .with("hello", HandlerKind::callable(hello))?
        .with("echo", HandlerKind::callable(echo))?
        .with("http", HttpAdapter::new(site).into_handler_kind())
}
