// SPDX-FileCopyrightText: 2026 Merit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits at the engine's external boundaries.
//!
//! Traits use `#[async_trait]` so they can be held as `Arc<dyn ...>`.

pub mod activity;

pub use activity::ActivitySource;
