// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Merit integration tests.
//!
//! # Components
//!
//! - [`TestHarness`] - temp database, host fixture, seeded definitions, engine
//! - [`StaticActivitySource`] - scripted in-memory facts with injectable failures
//! - [`HostData`] - writer for the host platform tables

pub mod harness;
pub mod host;
pub mod static_source;

pub use harness::{sample_achievements, sample_badges, TestHarness, TestHarnessBuilder};
pub use host::{HostData, HOST_SCHEMA};
pub use static_source::StaticActivitySource;
