// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-display memory of the last committed frame.
//!
//! The cache remembers, for each layer of the last committed frame, what it
//! showed ([`LayerSignature`]) and where it went (a pipe, or the framebuffer
//! target). Strategies consult it to avoid redrawing unchanged content and to
//! keep unchanged layers on the same pipes.
//!
//! The cache is written only by [`LayerCache::update`] after a commit, and
//! cleared by [`LayerCache::invalidate`] on idle fallback, display blanking or
//! an uncacheable frame. It is never mutated by a plan that was not committed.

use alloc::vec::Vec;

use crate::layer::{Blending, BufferId, Layer, Transform};
use crate::pipe::{MAX_MIXERS, PipeId};
use crate::plan::FrameInfo;
use crate::stats::FrameStats;

/// What a layer showed and where.
///
/// Geometry is compared bit-exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerSignature {
    buffer: Option<BufferId>,
    crop: [u64; 4],
    frame: [u64; 4],
    transform: Transform,
    blending: Blending,
    plane_alpha: u8,
}

impl LayerSignature {
    /// Captures a layer's signature.
    #[must_use]
    pub fn of(layer: &Layer) -> Self {
        let bits = |r: kurbo::Rect| [r.x0, r.y0, r.x1, r.y1].map(f64::to_bits);
        Self {
            buffer: layer.buffer_id(),
            crop: bits(layer.source_crop),
            frame: bits(layer.display_frame),
            transform: layer.transform,
            blending: layer.blending,
            plane_alpha: layer.plane_alpha,
        }
    }
}

/// Cached state of the last committed frame.
#[derive(Clone, Debug, Default)]
pub struct LayerCache {
    valid: bool,
    offloaded_count: usize,
    fb_count: usize,
    fb_z: Option<u8>,
    signatures: Vec<LayerSignature>,
    offloaded: Vec<bool>,
    pipes: Vec<[Option<PipeId>; MAX_MIXERS]>,
    fb_pipes: [Option<PipeId>; MAX_MIXERS],
    video_indices: Vec<usize>,
}

impl LayerCache {
    /// An empty, invalid cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the cache describes a committed frame.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Forgets everything.
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    /// Records a committed plan together with the layers it was made for.
    ///
    /// `layers` are the app layers, framebuffer target excluded.
    pub fn update(&mut self, plan: &FrameInfo, layers: &[Layer]) {
        self.signatures.clear();
        self.signatures.extend(layers.iter().map(LayerSignature::of));
        self.offloaded.clear();
        self.offloaded.extend((0..layers.len()).map(|i| plan.is_offloaded(i)));
        self.pipes.clear();
        self.pipes.extend(
            (0..layers.len()).map(|i| plan.entry_for(i).map_or([None; MAX_MIXERS], |e| e.pipes)),
        );
        self.video_indices.clear();
        self.video_indices
            .extend(layers.iter().enumerate().filter(|(_, l)| l.is_video()).map(|(i, _)| i));
        self.offloaded_count = plan.offloaded_count();
        self.fb_count = plan.fb_count();
        self.fb_z = plan.fb_z;
        self.fb_pipes = plan.fb_pipes;
        self.valid = true;
    }

    /// Returns `true` if layer `index` shows exactly what it showed last
    /// frame, in the same place.
    #[must_use]
    pub fn matches(&self, index: usize, layer: &Layer) -> bool {
        self.valid
            && self
                .signatures
                .get(index)
                .is_some_and(|s| *s == LayerSignature::of(layer))
    }

    /// Returns `true` if layer `index` was on a pipe last frame.
    #[must_use]
    pub fn was_offloaded(&self, index: usize) -> bool {
        self.offloaded.get(index).copied().unwrap_or(false)
    }

    /// Pipes layer `index` held last frame, per mixer.
    #[must_use]
    pub fn pipes(&self, index: usize) -> Option<[Option<PipeId>; MAX_MIXERS]> {
        self.pipes.get(index).copied().filter(|p| p.iter().any(Option::is_some))
    }

    /// Pipes the framebuffer target held last frame.
    #[must_use]
    pub fn fb_pipes(&self) -> [Option<PipeId>; MAX_MIXERS] {
        self.fb_pipes
    }

    /// Framebuffer z slot last frame.
    #[must_use]
    pub fn fb_z(&self) -> Option<u8> {
        self.fb_z
    }

    /// App layers last frame.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.signatures.len()
    }

    /// Offloaded layers last frame.
    #[must_use]
    pub fn offloaded_count(&self) -> usize {
        self.offloaded_count
    }

    /// Framebuffer-composed layers last frame.
    #[must_use]
    pub fn fb_count(&self) -> usize {
        self.fb_count
    }

    /// Returns `true` if a frame has the same layer count and the same video
    /// layers as the cached one.
    #[must_use]
    pub fn same_shape(&self, stats: &FrameStats) -> bool {
        self.valid
            && self.layer_count() == stats.layer_count
            && self.video_indices == stats.video_indices
    }

    /// Returns `true` if a plan's set sizes or framebuffer slot differ from
    /// the cached frame.
    #[must_use]
    pub fn layout_differs(&self, plan: &FrameInfo) -> bool {
        !self.valid
            || self.offloaded_count != plan.offloaded_count()
            || self.fb_count != plan.fb_count()
            || self.fb_z != plan.fb_z
    }
}
