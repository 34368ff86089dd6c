// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! bootstrap - the process the host starts for every execution environment.
//!
//! Reads the control API address and handler name from the environment,
//! serves invocations until the per-process limit, then exits. A non-zero
//! exit code tells the host the process failed.

mod handlers;

use std::process::ExitCode;

use relay_runtime::{RunLoop, RuntimeApiClient, RuntimeConfig, telemetry};
use tracing::{error, info};

fn main() -> ExitCode {
    telemetry::init_subscriber();

    let config = match RuntimeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid runtime configuration");
            return ExitCode::FAILURE;
        }
    };

    let registry = match handlers::registry() {
        Ok(registry) => registry,
        Err(e) => {
            error!(error = %e, "Failed to register handlers");
            return ExitCode::FAILURE;
        }
    };

    info!(
        runtime_api = %config.runtime_api,
        handler = config.handler.as_deref().unwrap_or("-"),
        max_invocations = config.max_invocations,
        "Starting runtime"
    );

    let client = RuntimeApiClient::from_config(&config);
    match RunLoop::initialize(client, registry, &config).and_then(RunLoop::run) {
        Ok(exit) => {
            info!(served = exit.served, failed = exit.failed, "Runtime retired");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Runtime terminated");
            ExitCode::FAILURE
        }
    }
}
