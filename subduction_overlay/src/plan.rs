// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame composition plan.
//!
//! A [`FrameInfo`] partitions the app layers of one frame into two sets:
//!
//! - **offloaded** layers, each bound to its own pipe (one per mixer it
//!   touches) and optionally a rotator session, and
//! - **framebuffer-composed** layers, which the GPU draws into the
//!   framebuffer target. The target then occupies a single z slot
//!   ([`FrameInfo::fb_z`]) and its own pipe per mixer.
//!
//! Z slots are assigned bottom-up. With the framebuffer run contiguous in
//! the layer list, the target takes the z slot of the first layer of the run:
//!
//! ```text
//!   layers:  L0   L1   L2   L3   L4
//!   set:     HW   FB   FB   HW   HW
//!   z:       0    1─────┘   2    3      fb_z = 1
//! ```

use alloc::vec;
use alloc::vec::Vec;
use core::ops::RangeInclusive;

use crate::display::DisplayId;
use crate::layer::{CompositionType, Layer};
use crate::pipe::{MAX_MIXERS, Mixer, PipeId};
use crate::rotator::RotatorSession;

/// Which strategy produced a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Every app layer on a pipe.
    Full,
    /// Unchanged layers reuse earlier work.
    Cached,
    /// The cheapest contiguous run goes to the GPU.
    LoadBased,
    /// Only video layers are offloaded.
    VideoOnly,
    /// Everything goes to the GPU.
    NoOffload,
}

impl StrategyKind {
    /// Short lowercase name, for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Cached => "cached",
            Self::LoadBased => "load-based",
            Self::VideoOnly => "video-only",
            Self::NoOffload => "no-offload",
        }
    }
}

/// Hardware resources bound to one offloaded layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffloadEntry {
    /// Index of the layer in the frame.
    pub layer: usize,
    /// Pipe per mixer, indexed by [`Mixer::index`].
    pub pipes: [Option<PipeId>; MAX_MIXERS],
    /// Z slot on the mixer.
    pub z_order: u8,
    /// Rotator session, if the layer is pre-rotated.
    pub rotator: Option<RotatorSession>,
    /// Same pipes as the previous frame with unchanged content; the pipe
    /// needs no reprogramming.
    pub reused: bool,
    /// The layer straddles both mixers with a horizontal flip and no rotator,
    /// so the left and right halves swap pipes.
    pub swap_halves: bool,
}

impl OffloadEntry {
    fn new(layer: usize, z_order: u8) -> Self {
        Self {
            layer,
            pipes: [None; MAX_MIXERS],
            z_order,
            rotator: None,
            reused: false,
            swap_halves: false,
        }
    }

    /// Pipe on one mixer.
    #[must_use]
    pub fn pipe(&self, mixer: Mixer) -> Option<PipeId> {
        self.pipes[mixer.index()]
    }
}

/// Composition plan for one frame of one display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameInfo {
    /// Display the plan is for.
    pub display: DisplayId,
    /// Strategy that produced the plan.
    pub strategy: StrategyKind,
    /// Z slot of the framebuffer target, when any layer is GPU-composed.
    pub fb_z: Option<u8>,
    /// Pipes carrying the framebuffer target, per mixer.
    pub fb_pipes: [Option<PipeId>; MAX_MIXERS],
    /// The GPU must re-render the framebuffer target this frame.
    pub fb_needs_redraw: bool,
    /// Geometry changed; nothing from the cache was trusted.
    pub needs_full_redraw: bool,
    fb_composed: Vec<bool>,
    layer_to_entry: Vec<Option<usize>>,
    entries: Vec<OffloadEntry>,
}

impl FrameInfo {
    /// A plan with every one of `layer_count` layers framebuffer-composed.
    #[must_use]
    pub fn new(display: DisplayId, layer_count: usize) -> Self {
        Self {
            display,
            strategy: StrategyKind::NoOffload,
            fb_z: None,
            fb_pipes: [None; MAX_MIXERS],
            fb_needs_redraw: true,
            needs_full_redraw: false,
            fb_composed: vec![true; layer_count],
            layer_to_entry: vec![None; layer_count],
            entries: Vec::new(),
        }
    }

    /// Number of app layers covered.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.fb_composed.len()
    }

    /// Moves a layer to the framebuffer set.
    pub fn compose_in_framebuffer(&mut self, layer: usize) {
        self.fb_composed[layer] = true;
    }

    /// Moves a layer to the offloaded set.
    pub fn offload(&mut self, layer: usize) {
        self.fb_composed[layer] = false;
    }

    /// Returns `true` if the GPU composes `layer`.
    #[must_use]
    pub fn is_fb_composed(&self, layer: usize) -> bool {
        self.fb_composed[layer]
    }

    /// Returns `true` if `layer` is on a pipe.
    #[must_use]
    pub fn is_offloaded(&self, layer: usize) -> bool {
        !self.fb_composed[layer]
    }

    /// Layers on pipes.
    #[must_use]
    pub fn offloaded_count(&self) -> usize {
        self.fb_composed.iter().filter(|fb| !**fb).count()
    }

    /// Layers composed by the GPU.
    #[must_use]
    pub fn fb_count(&self) -> usize {
        self.fb_composed.iter().filter(|fb| **fb).count()
    }

    /// Indices of offloaded layers, bottom first.
    pub fn offloaded(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.layer_count()).filter(|&i| self.is_offloaded(i))
    }

    /// Smallest index range covering every framebuffer-composed layer.
    #[must_use]
    pub fn fb_span(&self) -> Option<RangeInclusive<usize>> {
        let first = self.fb_composed.iter().position(|fb| *fb)?;
        let last = self.fb_composed.iter().rposition(|fb| *fb)?;
        Some(first..=last)
    }

    /// Returns `true` if the framebuffer-composed layers form one run.
    #[must_use]
    pub fn fb_is_contiguous(&self) -> bool {
        self.fb_span()
            .is_none_or(|mut span| span.all(|i| self.fb_composed[i]))
    }

    /// Rebuilds the layer/pipe mappings and z slots in layer order.
    ///
    /// The framebuffer target takes the slot of the first composed layer.
    /// Pipe bindings are cleared.
    pub fn map(&mut self) {
        self.rebuild(false);
    }

    /// Like [`map`](Self::map), but stacks all offloaded layers first and the
    /// framebuffer target on top of them.
    pub fn map_fb_on_top(&mut self) {
        self.rebuild(true);
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "z slots are bounded by the app layer ceiling"
    )]
    fn rebuild(&mut self, fb_on_top: bool) {
        self.entries.clear();
        self.layer_to_entry.iter_mut().for_each(|e| *e = None);
        self.fb_z = None;
        self.fb_pipes = [None; MAX_MIXERS];

        let mut z = 0_u8;
        for i in 0..self.layer_count() {
            if self.fb_composed[i] {
                if !fb_on_top && self.fb_z.is_none() {
                    self.fb_z = Some(z);
                    z += 1;
                }
            } else {
                self.layer_to_entry[i] = Some(self.entries.len());
                self.entries.push(OffloadEntry::new(i, z));
                z += 1;
            }
        }
        if fb_on_top && self.fb_count() > 0 {
            self.fb_z = Some(self.entries.len() as u8);
        }
    }

    /// Offload entries, bottom first.
    #[must_use]
    pub fn entries(&self) -> &[OffloadEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [OffloadEntry] {
        &mut self.entries
    }

    /// Entry bound to `layer`, if offloaded and mapped.
    #[must_use]
    pub fn entry_for(&self, layer: usize) -> Option<&OffloadEntry> {
        self.layer_to_entry
            .get(layer)
            .copied()
            .flatten()
            .map(|e| &self.entries[e])
    }

    /// Pipes the plan uses on `mixer`, the framebuffer target included.
    #[must_use]
    pub fn pipes_on(&self, mixer: Mixer) -> usize {
        let layers = self
            .entries
            .iter()
            .filter(|e| e.pipe(mixer).is_some())
            .count();
        layers + usize::from(self.fb_pipes[mixer.index()].is_some())
    }

    /// Every pipe the plan holds.
    pub fn pipes(&self) -> impl Iterator<Item = PipeId> + '_ {
        self.entries
            .iter()
            .flat_map(|e| e.pipes.iter().flatten().copied())
            .chain(self.fb_pipes.iter().flatten().copied())
    }

    /// Checks the plan's structural invariants: every layer is in exactly
    /// one set, every offloaded layer has an entry, and no pipe is used
    /// twice.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let mapped = (0..self.layer_count()).all(|i| {
            let entry = self.layer_to_entry[i];
            match (self.fb_composed[i], entry) {
                (true, None) => true,
                (false, Some(e)) => self.entries.get(e).is_some_and(|en| en.layer == i),
                _ => false,
            }
        });
        if !mapped || self.entries.len() != self.offloaded_count() {
            return false;
        }
        if self.fb_count() > 0 && self.fb_z.is_none() {
            return false;
        }
        let mut seen: Vec<PipeId> = self.pipes().collect();
        let total = seen.len();
        seen.sort_unstable();
        seen.dedup();
        seen.len() == total
    }

    /// Writes the decision into the layers' composition types.
    ///
    /// `layers` is the full frame, framebuffer target last. Offloaded layers
    /// become [`CompositionType::Overlay`]; framebuffer-composed layers become
    /// [`CompositionType::Gpu`], or `Overlay` when their pixels are still
    /// valid in the framebuffer and no redraw is needed.
    pub fn apply_to(&self, layers: &mut [Layer]) {
        for (i, layer) in layers.iter_mut().enumerate().take(self.layer_count()) {
            layer.composition = if self.is_offloaded(i) || !self.fb_needs_redraw {
                CompositionType::Overlay
            } else {
                CompositionType::Gpu
            };
        }
    }
}
