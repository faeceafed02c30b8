// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multi-display runtime for `subduction_overlay`.
//!
//! The core crate plans one display at a time and knows nothing about
//! threads. This crate wraps it for a display server:
//!
//! - [`host::OverlayHost`]: one shared pipe inventory, one locked composer
//!   slot per display, display lifecycle and the refresh pass.
//! - [`idle_timer::IdleTimer`]: the background single-shot timer that sets
//!   the idle fallback flags.
//! - [`log_sink::LogSink`]: a [`TraceSink`](subduction_overlay::trace::TraceSink)
//!   that forwards events to the `log` facade.

pub mod host;
pub mod idle_timer;
pub mod log_sink;
