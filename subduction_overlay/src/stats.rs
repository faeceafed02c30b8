// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame classification.
//!
//! [`classify`] scans the app layers of a frame once and records the facts
//! every strategy keys off: skip layers, video layers, whether a rotator or
//! alpha scaling is needed, and whether secure content is present.

use alloc::vec::Vec;

use crate::layer::Layer;

/// Per-frame summary of the app layers (the framebuffer target excluded).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Number of app layers.
    pub layer_count: usize,
    /// Layers flagged skip.
    pub skip_count: usize,
    /// Indices of YUV layers, in z order.
    pub video_indices: Vec<usize>,
    /// Some video layer carries a 90° rotation.
    pub needs_rotator: bool,
    /// Some layer blends with a plane alpha below opaque.
    pub needs_alpha_scale: bool,
    /// Some layer shows a secure buffer.
    pub secure_present: bool,
}

impl FrameStats {
    /// Returns `true` if any layer is flagged skip.
    #[must_use]
    pub fn skip_present(&self) -> bool {
        self.skip_count > 0
    }

    /// Returns `true` if the frame contains video.
    #[must_use]
    pub fn has_video(&self) -> bool {
        !self.video_indices.is_empty()
    }
}

/// Classifies the app layers of a frame.
///
/// `layers` must not include the framebuffer target.
#[must_use]
pub fn classify(layers: &[Layer]) -> FrameStats {
    let mut stats = FrameStats {
        layer_count: layers.len(),
        ..FrameStats::default()
    };
    for (i, layer) in layers.iter().enumerate() {
        if layer.is_skip() {
            stats.skip_count += 1;
        }
        if layer.is_video() {
            stats.video_indices.push(i);
            if layer.is_rotated_90() {
                stats.needs_rotator = true;
            }
        }
        if layer.needs_alpha_scale() {
            stats.needs_alpha_scale = true;
        }
        if layer.is_secure() {
            stats.secure_present = true;
        }
    }
    stats
}
