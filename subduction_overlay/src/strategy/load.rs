// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Load-based offload.
//!
//! When the layer count exceeds the pipes, one contiguous window of layers
//! is handed to the GPU and everything outside it goes to pipes. The window
//! is as small as the budget allows (one pipe is kept for the framebuffer
//! target) and placed where it reads the fewest source pixels, preferring
//! windows that leave video layers on pipes:
//!
//! ```text
//!   budget 3 pipes, 5 layers ─► window of 3 layers, 2 on pipes + FB
//!
//!   L0  L1  L2  L3  L4
//!   [---------]            cost 9.0 MP
//!       [---------]        cost 4.1 MP   ◄ chosen
//!           [---------]    cost 6.3 MP
//! ```
//!
//! Runs only on the primary display, only when geometry changed (the cache
//! is stale anyway), and never with secure content.

use super::{CompositionStrategy, Infeasible, StrategyInput, finish};
use crate::display::DisplayKind;
use crate::plan::{FrameInfo, StrategyKind};
use crate::resources::HwResources;

/// GPU-composes the cheapest contiguous window of layers.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoadBasedOffload;

impl CompositionStrategy for LoadBasedOffload {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LoadBased
    }

    fn try_apply(
        &self,
        input: &StrategyInput<'_>,
        hw: &mut HwResources,
    ) -> Result<FrameInfo, Infeasible> {
        if !input.config.mixed_mode {
            return Err(Infeasible::MixedModeDisabled);
        }
        if input.kind != DisplayKind::Primary {
            return Err(Infeasible::NotPrimary);
        }
        if !input.needs_full_redraw {
            return Err(Infeasible::GeometryUnchanged);
        }
        if input.stats.secure_present {
            return Err(Infeasible::SecurePresent);
        }
        let n = input.layers.len();
        if n == 0 {
            return Err(Infeasible::NothingToOffload);
        }

        let slots = input.min_pipe_budget(hw).saturating_sub(1);
        if slots == 0 {
            return Err(Infeasible::NothingToOffload);
        }
        let forced = input.forced_fb_span();
        let mut batch = n.saturating_sub(slots).max(1);
        if let Some((lo, hi)) = forced {
            batch = batch.max(hi - lo + 1);
        }
        if batch >= n {
            return Err(Infeasible::NothingToOffload);
        }

        let (start, _) = (0..=n - batch)
            .filter(|&s| forced.is_none_or(|(lo, hi)| s <= lo && hi < s + batch))
            .map(|s| (s, window_cost(input, s, batch)))
            .min_by_key(|&(s, cost)| (cost, s))
            .ok_or(Infeasible::NoBatch)?;

        let mut frame = FrameInfo::new(input.display, n);
        for i in (0..start).chain(start + batch..n) {
            frame.offload(i);
        }
        frame.map();
        finish(frame, input, hw)
    }
}

/// Source pixels read by the window, then video layers inside it.
fn window_cost(input: &StrategyInput<'_>, start: usize, len: usize) -> (u64, usize) {
    let window = &input.layers[start..start + len];
    let pixels = window.iter().map(|l| l.pixel_cost()).sum();
    let videos = window.iter().filter(|l| l.is_video()).count();
    (pixels, videos)
}
