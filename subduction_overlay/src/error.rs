// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors surfaced to callers.
//!
//! Strategy infeasibility is not an error: every frame can be composed by the
//! GPU, so failing strategies only produce [`Infeasible`](crate::strategy::Infeasible)
//! reasons for tracing. [`ComposeError`] covers malformed input and calls made
//! out of order.

use crate::display::DisplayId;

/// Errors returned by [`Composer`](crate::composer::Composer) operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    /// The layer list was empty.
    #[error("display {0}: empty layer list")]
    EmptyLayerList(DisplayId),
    /// The last layer was not the framebuffer target.
    #[error("display {0}: layer list does not end with the framebuffer target")]
    MissingFramebufferTarget(DisplayId),
    /// The display has no active composer (not initialized, paused or
    /// disconnected).
    #[error("display {0} is not initialized")]
    DisplayNotInitialized(DisplayId),
    /// `commit` was called with no prepared frame pending.
    #[error("display {0}: no prepared frame to commit")]
    NoPreparedFrame(DisplayId),
}
