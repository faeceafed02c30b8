// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing, JSON export and composition dumps for
//! `subduction_overlay` diagnostics.
//!
//! This crate provides [`TraceSink`](subduction_overlay::trace::TraceSink)
//! implementations and plan dumps for development:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`json::JsonLinesSink`]: one JSON object per event, for offline tools.
//! - [`dump::dump`]: the per-layer composition table of a plan.

pub mod dump;
pub mod json;
pub mod pretty;
