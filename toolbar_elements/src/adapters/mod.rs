// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapters to integrate with page models.
//!
//! Enabled via feature flags to keep the core independent of any one host.

#[cfg(feature = "page_adapter")]
pub mod page;
