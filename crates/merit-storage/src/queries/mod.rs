// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed queries over the engine-owned tables.
//!
//! Every function takes `&Database` and runs through its connection's
//! background thread. Multi-statement award transactions live in the
//! engine's ledger, not here.

pub mod activity_log;
pub mod definitions;
pub mod levels;
pub mod notifications;
pub mod progress;
pub mod stats;
