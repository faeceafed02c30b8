// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Video-only offload: video layers on pipes, everything else on the GPU.
//!
//! The framebuffer target is stacked above the video pipes, so the video
//! shows through wherever the GPU-composed UI is transparent.

use super::{CompositionStrategy, Infeasible, StrategyInput, finish};
use crate::plan::{FrameInfo, StrategyKind};
use crate::resources::HwResources;

/// Offloads only the video layers.
#[derive(Clone, Copy, Debug, Default)]
pub struct VideoOnlyOffload;

impl CompositionStrategy for VideoOnlyOffload {
    fn kind(&self) -> StrategyKind {
        StrategyKind::VideoOnly
    }

    fn try_apply(
        &self,
        input: &StrategyInput<'_>,
        hw: &mut HwResources,
    ) -> Result<FrameInfo, Infeasible> {
        if !input.stats.has_video() {
            return Err(Infeasible::NoVideo);
        }
        let mut frame = FrameInfo::new(input.display, input.layers.len());
        for &i in &input.stats.video_indices {
            let layer = &input.layers[i];
            if layer.plane_alpha < u8::MAX {
                return Err(Infeasible::PlaneAlpha(i));
            }
            if layer.is_secure() && input.kind.is_secondary() {
                return Err(Infeasible::SecureOnSecondary);
            }
            if input.is_video_doable(i) {
                frame.offload(i);
            }
        }
        if frame.offloaded_count() == 0 {
            return Err(Infeasible::NothingToOffload);
        }
        frame.map_fb_on_top();
        finish(frame, input, hw)
    }
}
