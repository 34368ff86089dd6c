// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The runtime control loop.
//!
//! ```text
//! initialize ──> Idle ──> Dispatching ──> Acknowledging ──> Idle ...
//!     │           │            │                │
//!     └───────────┴────────────┴────────────────┴──> Terminated
//! ```
//!
//! Initialization happens in [`RunLoop::initialize`]; a loop value only
//! exists once a handler has been resolved. Each cycle counts towards the
//! process limit *before* fetching, so a process that dies mid-invocation
//! has still used up one of its iterations. Handler failures are reported
//! and the loop continues; any control API failure ends the loop.

use tracing::{error, info, info_span, warn};

use crate::client::RuntimeApi;
use crate::config::RuntimeConfig;
use crate::error::{ErrorReport, HandlerError, Result};
use crate::handler::{HandlerKind, HandlerRegistry};
use crate::invocation::Acknowledgement;

/// Observable state of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting to start the next cycle
    Idle,
    /// Fetching an invocation and running the handler
    Dispatching,
    /// Reporting the outcome of the current invocation
    Acknowledging,
    /// Retired or failed; no further work is fetched
    Terminated,
}

/// Result of a single [`RunLoop::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// One invocation was served and acknowledged
    Served(Acknowledgement),
    /// The iteration limit is reached; nothing was fetched
    Retired,
}

/// Summary of a loop that retired gracefully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopExit {
    /// Invocations served and acknowledged
    pub served: u32,
    /// Of those, how many were reported as failures
    pub failed: u32,
}

/// Serves invocations one at a time until the iteration limit is reached.
pub struct RunLoop<A: RuntimeApi> {
    api: A,
    handler: HandlerKind,
    max_invocations: u32,
    iteration_count: u32,
    failed: u32,
    state: LoopState,
}

impl<A: RuntimeApi> RunLoop<A> {
    /// Resolve the configured handler and build the loop.
    ///
    /// On failure the error is reported to the control API as an
    /// initialization error (best effort) and returned; no invocation is
    /// ever fetched.
    pub fn initialize(api: A, registry: HandlerRegistry, config: &RuntimeConfig) -> Result<Self> {
        match registry.resolve(config.handler.as_deref()) {
            Ok(handler) => {
                info!(
                    handler = config.handler.as_deref().unwrap_or_default(),
                    max_invocations = config.max_invocations,
                    "Runtime initialized"
                );
                Ok(Self::new(api, handler, config.max_invocations))
            }
            Err(err) => {
                error!(error = %err, "Failed to initialize runtime");
                if let Err(report_err) = api.post_init_error(&ErrorReport::from(&err)) {
                    warn!(error = %report_err, "Failed to report initialization error");
                }
                Err(err)
            }
        }
    }

    /// Build a loop around an already resolved handler.
    pub fn new(api: A, handler: HandlerKind, max_invocations: u32) -> Self {
        Self {
            api,
            handler,
            max_invocations: max_invocations.max(1),
            iteration_count: 0,
            failed: 0,
            state: LoopState::Idle,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Cycles started so far, including one that hit the limit.
    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    pub fn max_invocations(&self) -> u32 {
        self.max_invocations
    }

    /// Run until the iteration limit is reached.
    ///
    /// Returns `Ok` when the process should retire normally and `Err` on any
    /// fatal failure. In both cases the caller is expected to exit.
    pub fn run(mut self) -> Result<LoopExit> {
        loop {
            if self.step()? == Step::Retired {
                let exit = LoopExit {
                    served: self.iteration_count.saturating_sub(1),
                    failed: self.failed,
                };
                info!(
                    served = exit.served,
                    failed = exit.failed,
                    "Invocation limit reached, retiring process"
                );
                return Ok(exit);
            }
        }
    }

    /// Serve a single invocation: fetch, dispatch, acknowledge.
    pub fn step(&mut self) -> Result<Step> {
        if self.state == LoopState::Terminated {
            return Ok(Step::Retired);
        }

        self.iteration_count = self.iteration_count.saturating_add(1);
        if self.iteration_count > self.max_invocations {
            self.state = LoopState::Terminated;
            return Ok(Step::Retired);
        }

        self.state = LoopState::Dispatching;
        let invocation = match self.api.next_invocation() {
            Ok(invocation) => invocation,
            Err(err) => {
                self.state = LoopState::Terminated;
                error!(error = %err, "Failed to fetch next invocation");
                return Err(err);
            }
        };

        let span = info_span!(
            "invocation",
            request_id = %invocation.request_id(),
            iteration = self.iteration_count
        );
        let _enter = span.enter();

        let outcome = match invocation.payload_error() {
            Some(reason) => Err(HandlerError::new(HandlerError::INVALID_EVENT_TYPE, reason)),
            None => self
                .handler
                .invoke(invocation.payload().clone(), invocation.context()),
        };

        self.state = LoopState::Acknowledging;
        let acknowledged = match outcome {
            Ok(result) => invocation.succeed(&result),
            Err(handler_err) => {
                warn!(
                    error_type = %handler_err.error_type(),
                    error = %handler_err.message(),
                    "Handler failed"
                );
                invocation.fail(&handler_err)
            }
        };

        match acknowledged {
            Ok(ack) => {
                if ack == Acknowledgement::Failed {
                    self.failed += 1;
                }
                self.state = LoopState::Idle;
                Ok(Step::Served(ack))
            }
            Err(err) => {
                self.state = LoopState::Terminated;
                error!(error = %err, "Failed to acknowledge invocation");
                Err(err)
            }
        }
    }
}
