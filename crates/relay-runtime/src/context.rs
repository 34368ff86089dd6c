// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Per-invocation metadata delivered alongside the event payload.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Header carrying the invocation identifier.
pub const REQUEST_ID_HEADER: &str = "Lambda-Runtime-Aws-Request-Id";
pub const DEADLINE_HEADER: &str = "Lambda-Runtime-Deadline-Ms";
pub const FUNCTION_ARN_HEADER: &str = "Lambda-Runtime-Invoked-Function-Arn";
pub const TRACE_ID_HEADER: &str = "Lambda-Runtime-Trace-Id";
pub const CLIENT_CONTEXT_HEADER: &str = "Lambda-Runtime-Client-Context";
pub const COGNITO_IDENTITY_HEADER: &str = "Lambda-Runtime-Cognito-Identity";

/// Optional metadata the control API attaches to an invocation.
///
/// None of these fields are required by the protocol; a missing header
/// simply leaves the field empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// Invocation deadline in epoch milliseconds
    pub deadline_ms: Option<i64>,
    pub invoked_function_arn: Option<String>,
    pub trace_id: Option<String>,
    /// Raw client context JSON, passed through untouched
    pub client_context: Option<String>,
    /// Raw cognito identity JSON, passed through untouched
    pub cognito_identity: Option<String>,
}

impl Context {
    /// Build a context from a header lookup.
    ///
    /// An unparseable deadline is ignored rather than rejected.
    pub fn from_headers<'a, F>(header: F) -> Self
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let owned = |name: &str| {
            header(name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            deadline_ms: header(DEADLINE_HEADER).and_then(|v| v.trim().parse().ok()),
            invoked_function_arn: owned(FUNCTION_ARN_HEADER),
            trace_id: owned(TRACE_ID_HEADER),
            client_context: owned(CLIENT_CONTEXT_HEADER),
            cognito_identity: owned(COGNITO_IDENTITY_HEADER),
        }
    }

    /// Invocation deadline as a timestamp.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline_ms.and_then(DateTime::from_timestamp_millis)
    }

    /// Time left until the deadline, zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.remaining_at(Utc::now())
    }

    fn remaining_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        let deadline = self.deadline()?;
        Some((deadline - now).to_std().unwrap_or(Duration::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_headers() {
        let headers: HashMap<&str, &str> = [
            (DEADLINE_HEADER, "1700000000000"),
            (FUNCTION_ARN_HEADER, "arn:aws:lambda:eu-west-1:123:function:demo"),
            (TRACE_ID_HEADER, "Root=1-abc"),
        ]
        .into_iter()
        .collect();

        let ctx = Context::from_headers(|name| headers.get(name).copied());
        assert_eq!(ctx.deadline_ms, Some(1_700_000_000_000));
        assert_eq!(
            ctx.invoked_function_arn.as_deref(),
            Some("arn:aws:lambda:eu-west-1:123:function:demo")
        );
        assert_eq!(ctx.trace_id.as_deref(), Some("Root=1-abc"));
        assert_eq!(ctx.client_context, None);
    }

    #[test]
    fn test_bad_deadline_is_ignored() {
        let ctx = Context::from_headers(|name| (name == DEADLINE_HEADER).then_some("soon"));
        assert_eq!(ctx.deadline_ms, None);
        assert_eq!(ctx.deadline(), None);
        assert_eq!(ctx.remaining(), None);
    }

    #[test]
    fn test_remaining_time() {
        let ctx = Context {
            deadline_ms: Some(10_000),
            ..Default::default()
        };
        let now = DateTime::from_timestamp_millis(7_500).unwrap();
        assert_eq!(ctx.remaining_at(now), Some(Duration::from_millis(2_500)));

        let late = DateTime::from_timestamp_millis(12_000).unwrap();
        assert_eq!(ctx.remaining_at(late), Some(Duration::ZERO));
    }
}
