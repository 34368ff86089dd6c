// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Relay Runtime - custom execution host for the serverless runtime API.
//!
//! The host starts a process, and that process polls a local control API
//! for work, hands each event to a user handler and reports the outcome.
//! This crate implements that loop and the control API client.
//!
//! # Features
//!
//! - **Control API client**: blocking fetch of the next invocation, result
//!   and failure reports, initialization failure report
//! - **Handler adapter**: plain functions and [`Handler`] objects behind one
//!   calling convention, panics contained per invocation
//! - **Run loop**: strictly sequential fetch/dispatch/acknowledge cycles with
//!   a per-process invocation limit
//!
//! # Quick Start
//!
//! ```ignore
//! use relay_runtime::{HandlerKind, HandlerRegistry};
//!
//! fn main() -> std::process::ExitCode {
//!     relay_runtime::telemetry::init_subscriber();
//!
//!     let registry = HandlerRegistry::new()
//!         .with("hello", HandlerKind::callable(|_event, _ctx| Ok("Hello world")))
//!         .expect("unique handler names");
//!
//!     match relay_runtime::start(registry) {
//!         Ok(_) => std::process::ExitCode::SUCCESS,
//!         Err(_) => std::process::ExitCode::FAILURE,
//!     }
//! }
//! ```
//!
//! # Error handling
//!
//! A handler error fails one invocation and the loop moves on. Everything
//! else ([`RuntimeError`]) ends the loop: the process is expected to exit
//! and the host replaces it with a fresh one.
//!
//! # Configuration
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `AWS_LAMBDA_RUNTIME_API` | Yes | - | Control API address |
//! | `_HANDLER` | No | - | Handler reference |
//! | `LAMBDA_TASK_ROOT` | No | - | Application root |
//! | `RELAY_LOOP_MAX` | No | `1` | Invocations per process |

mod client;
mod config;
mod context;
mod error;
mod handler;
mod invocation;
mod run_loop;

pub mod telemetry;

pub use client::{ERROR_TYPE_HEADER, NextEvent, RuntimeApi, RuntimeApiClient};
pub use config::{HANDLER_VAR, LOOP_MAX_VAR, RUNTIME_API_VAR, RuntimeConfig, TASK_ROOT_VAR};
pub use context::{
    CLIENT_CONTEXT_HEADER, COGNITO_IDENTITY_HEADER, Context, DEADLINE_HEADER,
    FUNCTION_ARN_HEADER, REQUEST_ID_HEADER, TRACE_ID_HEADER,
};
pub use error::{ErrorReport, HandlerError, HandlerResult, Result, RuntimeError};
pub use handler::{Handler, HandlerKind, HandlerRegistry};
pub use invocation::{Acknowledgement, Invocation};
pub use run_loop::{LoopExit, LoopState, RunLoop, Step};

/// Load configuration from the environment and serve invocations until the
/// process should exit.
pub fn start(registry: HandlerRegistry) -> Result<LoopExit> {
    let config = RuntimeConfig::from_env()?;
    start_with_config(registry, &config)
}

/// Serve invocations with an explicit configuration.
pub fn start_with_config(registry: HandlerRegistry, config: &RuntimeConfig) -> Result<LoopExit> {
    let client = RuntimeApiClient::from_config(config);
    RunLoop::initialize(client, registry, config)?.run()
}
