// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Handler shapes and their resolution.
//!
//! A handler is either a plain function or an object implementing
//! [`Handler`]. Both are normalized into [`HandlerKind`], which exposes a
//! single [`HandlerKind::invoke`] call. Which handler runs is decided once at
//! startup by resolving the configured reference against a
//! [`HandlerRegistry`].

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;
use serde_json::Value;

use crate::context::Context;
use crate::error::{HandlerError, HandlerResult, Result, RuntimeError};

/// An object that processes invocation payloads.
pub trait Handler: Send + Sync {
    fn handle(&self, payload: Value, context: &Context) -> HandlerResult;
}

type HandlerFn = dyn Fn(Value, &Context) -> HandlerResult + Send + Sync;

/// A resolved handler, normalized to one calling convention.
pub enum HandlerKind {
    Callable(Box<HandlerFn>),
    Object(Box<dyn Handler>),
}

impl HandlerKind {
    /// Wrap a function as a handler.
    ///
    /// The function may return any serializable value; it is converted to
    /// JSON before leaving the adapter, and a conversion failure is reported
    /// as a `SerializationError`.
    pub fn callable<F, R>(f: F) -> Self
    where
        F: Fn(Value, &Context) -> HandlerResult<R> + Send + Sync + 'static,
        R: Serialize,
    {
        HandlerKind::Callable(Box::new(move |payload: Value, context: &Context| {
            let result = f(payload, context)?;
            serde_json::to_value(result).map_err(HandlerError::serialization)
        }))
    }

    /// Wrap an object as a handler.
    pub fn object<H>(handler: H) -> Self
    where
        H: Handler + 'static,
    {
        HandlerKind::Object(Box::new(handler))
    }

    /// Run the handler on one payload.
    ///
    /// A panic in handler code is caught here and reported as a
    /// `HandlerError` of type `Panic`, so it fails the invocation instead
    /// of the process.
    pub fn invoke(&self, payload: Value, context: &Context) -> HandlerResult {
        catch_unwind(AssertUnwindSafe(|| match self {
            HandlerKind::Callable(f) => f(payload, context),
            HandlerKind::Object(handler) => handler.handle(payload, context),
        }))
        .unwrap_or_else(|panic_info| {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "handler panicked".to_string()
            };
            Err(HandlerError::new(HandlerError::PANIC_TYPE, panic_msg))
        })
    }

    fn shape(&self) -> &'static str {
        match self {
            HandlerKind::Callable(_) => "callable",
            HandlerKind::Object(_) => "object",
        }
    }
}

impl fmt::Debug for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandlerKind").field(&self.shape()).finish()
    }
}

/// Named handlers available to this process.
///
/// Built during startup, then consumed by [`HandlerRegistry::resolve`].
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, HandlerKind>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a reference name.
    pub fn register(&mut self, name: impl Into<String>, handler: HandlerKind) -> Result<()> {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(RuntimeError::Initialization(format!(
                "duplicate handler `{name}`"
            )));
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, name: impl Into<String>, handler: HandlerKind) -> Result<Self> {
        self.register(name, handler)?;
        Ok(self)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Resolve the configured reference to a handler.
    ///
    /// Fails with [`RuntimeError::Initialization`] when no reference is
    /// configured or nothing is registered under it.
    pub fn resolve(mut self, reference: Option<&str>) -> Result<HandlerKind> {
        let Some(reference) = reference.map(str::trim).filter(|r| !r.is_empty()) else {
            return Err(RuntimeError::Initialization(
                "no handler configured".to_string(),
            ));
        };

        self.handlers.remove(reference).ok_or_else(|| {
            let known = self.names().collect::<Vec<_>>().join(", ");
            RuntimeError::Initialization(format!(
                "handler `{reference}` doesn't exist (registered: [{known}])"
            ))
        })
    }
}
