// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tracing subscriber initialization for the runtime process.
//!
//! The host captures stdout/stderr line by line and does not render ANSI
//! escapes, so logs go to stderr uncoloured.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: "info")

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;

/// Install the global tracing subscriber.
///
/// Sets up:
/// - A fmt layer that writes to stderr without ANSI colours
/// - An EnvFilter that respects `RUST_LOG` (default: info)
///
/// Returns `false` if a global subscriber was already installed, in which
/// case the existing one is left in place.
pub fn init_subscriber() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true);

    let subscriber = tracing_subscriber::Registry::default()
        .with(fmt)
        .with(filter);

    tracing::subscriber::set_global_default(subscriber).is_ok()
}
