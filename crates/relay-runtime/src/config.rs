// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Runtime configuration loaded from the process environment.

use std::env;
use std::path::PathBuf;

use crate::error::{Result, RuntimeError};

/// Address of the control API (`host:port`).
pub const RUNTIME_API_VAR: &str = "AWS_LAMBDA_RUNTIME_API";
/// Handler reference resolved at startup.
pub const HANDLER_VAR: &str = "_HANDLER";
/// Application root directory.
pub const TASK_ROOT_VAR: &str = "LAMBDA_TASK_ROOT";
/// Maximum number of invocations served by one process.
pub const LOOP_MAX_VAR: &str = "RELAY_LOOP_MAX";

const DEFAULT_MAX_INVOCATIONS: u32 = 1;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Control API address, `host:port` or a full `http://` URL (required)
    pub runtime_api: String,
    /// Handler reference (default: none, resolution fails at startup)
    pub handler: Option<String>,
    /// Application root directory (informational)
    pub task_root: Option<PathBuf>,
    /// Invocations served before the process retires itself (default: 1).
    /// Always at least 1.
    pub max_invocations: u32,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    ///
    /// # Required Environment Variables
    /// - `AWS_LAMBDA_RUNTIME_API` - Control API address
    ///
    /// # Optional Environment Variables
    /// - `_HANDLER` - Handler reference
    /// - `LAMBDA_TASK_ROOT` - Application root
    /// - `RELAY_LOOP_MAX` - Invocations per process (default: 1, 0 means 1)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let runtime_api = lookup(RUNTIME_API_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RuntimeError::Config(format!("{RUNTIME_API_VAR} is required")))?;

        let handler = lookup(HANDLER_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let task_root = lookup(TASK_ROOT_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let max_invocations = match lookup(LOOP_MAX_VAR).filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|e| RuntimeError::Config(format!("invalid {LOOP_MAX_VAR}: {e}")))?,
            None => DEFAULT_MAX_INVOCATIONS,
        };

        Ok(Self {
            runtime_api,
            handler,
            task_root,
            max_invocations: max_invocations.max(1),
        })
    }

    /// Create a configuration pointing at the given control API address.
    pub fn new(runtime_api: impl Into<String>) -> Self {
        Self {
            runtime_api: runtime_api.into(),
            handler: None,
            task_root: None,
            max_invocations: DEFAULT_MAX_INVOCATIONS,
        }
    }

    /// Set the handler reference.
    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Set the application root.
    pub fn with_task_root(mut self, task_root: impl Into<PathBuf>) -> Self {
        self.task_root = Some(task_root.into());
        self
    }

    /// Set the invocation limit. Values below 1 are raised to 1.
    pub fn with_max_invocations(mut self, max_invocations: u32) -> Self {
        self.max_invocations = max_invocations.max(1);
        self
    }
}
