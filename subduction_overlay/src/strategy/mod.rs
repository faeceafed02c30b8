// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition strategies.
//!
//! Each strategy decides which layers to offload and then binds hardware for
//! them. The composer tries them in [`ORDER`], most offload first, and stops
//! at the first that succeeds:
//!
//! ```text
//!   FullOffload ──► CachedOffload ──► LoadBasedOffload ──► VideoOnlyOffload
//!        │               │                  │                     │
//!        └───────────────┴──────────────────┴─────────────────────┴──► no offload
//! ```
//!
//! A strategy either returns a fully bound [`FrameInfo`] or an [`Infeasible`]
//! reason. On failure the composer releases whatever the attempt bound before
//! trying the next strategy.

mod bind;
mod cached;
mod full;
mod load;
mod video;

use crate::cache::LayerCache;
use crate::config::ComposerConfig;
use crate::display::{DisplayGeometry, DisplayId, DisplayKind};
use crate::layer::{BufferId, Layer, rect_size};
use crate::pipe::Mixer;
use crate::plan::{FrameInfo, StrategyKind};
use crate::resources::HwResources;
use crate::rotator::{downscale_ratio, needs_rotator};
use crate::stats::FrameStats;

pub use cached::CachedOffload;
pub use full::FullOffload;
pub use load::LoadBasedOffload;
pub use video::VideoOnlyOffload;

pub(crate) use bind::bind;

/// The rotator can take this much downscale off a pipe.
pub const ROTATOR_MAX_DOWNSCALE: u32 = 4;

/// Strategies in priority order.
pub const ORDER: [&dyn CompositionStrategy; 4] = [
    &FullOffload,
    &CachedOffload,
    &LoadBasedOffload,
    &VideoOnlyOffload,
];

/// Why a strategy could not plan a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Infeasible {
    /// Partial offload is switched off.
    #[error("mixed mode disabled")]
    MixedModeDisabled,
    /// Not attempted on virtual displays.
    #[error("virtual display")]
    VirtualDisplay,
    /// Only attempted on the primary display.
    #[error("not the primary display")]
    NotPrimary,
    /// A skip layer is present.
    #[error("skip layer present")]
    SkipPresent,
    /// Plane alpha scaling is needed but unsupported.
    #[error("alpha scaling unsupported")]
    AlphaScaleUnsupported,
    /// Secure content on a non-primary display.
    #[error("secure content on secondary display")]
    SecureOnSecondary,
    /// Secure content is present.
    #[error("secure content present")]
    SecurePresent,
    /// A secure buffer would be both offloaded and read by the GPU.
    #[error("secure buffer {0:?} split between pipe and GPU")]
    SecureBufferSplit(BufferId),
    /// Too many layers for a non-primary display.
    #[error("{count} offloaded layers exceed secondary limit {max}")]
    TooManySecondaryLayers {
        /// Offloaded layers planned.
        count: usize,
        /// Display limit.
        max: usize,
    },
    /// A layer cannot be put on a pipe.
    #[error("layer {0} unsupported")]
    UnsupportedLayer(usize),
    /// No rotator session for a layer that needs one.
    #[error("no rotator session for layer {0}")]
    RotatorUnavailable(usize),
    /// Geometry changed, so the cache cannot be trusted.
    #[error("geometry changed")]
    GeometryChanged,
    /// Load balancing only runs on geometry changes.
    #[error("geometry unchanged")]
    GeometryUnchanged,
    /// The cached frame differs in shape.
    #[error("cache does not match frame")]
    CacheMismatch,
    /// The strategy would offload nothing.
    #[error("nothing to offload")]
    NothingToOffload,
    /// No video layers.
    #[error("no video layers")]
    NoVideo,
    /// A video layer has plane alpha.
    #[error("layer {0} has plane alpha")]
    PlaneAlpha(usize),
    /// No contiguous framebuffer window fits.
    #[error("no framebuffer batch fits")]
    NoBatch,
    /// The plan needs more pipes than the mixer allows.
    #[error("{mixer:?} mixer needs {needed} pipes, {available} available")]
    PipeBudget {
        /// Mixer over budget.
        mixer: Mixer,
        /// Pipes planned.
        needed: usize,
        /// Pipes available.
        available: usize,
    },
    /// Pipes ran out while binding.
    #[error("pipes exhausted on {0:?} mixer")]
    PipesExhausted(Mixer),
}

/// Everything a strategy reads about the frame being planned.
#[derive(Clone, Copy, Debug)]
pub struct StrategyInput<'a> {
    /// Display being planned.
    pub display: DisplayId,
    /// Kind of display.
    pub kind: DisplayKind,
    /// Panel geometry.
    pub geometry: DisplayGeometry,
    /// Policy and capabilities.
    pub config: &'a ComposerConfig,
    /// App layers, framebuffer target excluded.
    pub layers: &'a [Layer],
    /// Classification of `layers`.
    pub stats: &'a FrameStats,
    /// Last committed frame.
    pub cache: &'a LayerCache,
    /// Geometry changed this frame.
    pub needs_full_redraw: bool,
    /// Rotator sessions free when planning started.
    pub rotator_budget: usize,
}

impl StrategyInput<'_> {
    /// Returns `true` if a layer can be put on a pipe at all.
    #[must_use]
    pub fn is_supported(&self, layer: &Layer) -> bool {
        layer.buffer.is_some()
            && !(layer.is_rotated_90() && !layer.is_video())
            && self.has_valid_dimensions(layer)
    }

    /// Checks crop size, crop integrality, panel visibility and downscale.
    #[must_use]
    pub fn has_valid_dimensions(&self, layer: &Layer) -> bool {
        let min = self.config.min_crop_dimension;
        let (cw, ch) = rect_size(layer.integral_crop());
        let (dw, dh) = rect_size(layer.display_frame);
        if cw < min || ch < min || dw == 0 || dh == 0 {
            return false;
        }
        if !layer.is_secure() && !layer.has_integral_crop() {
            return false;
        }
        if layer
            .display_frame
            .intersect(self.geometry.bounds())
            .is_zero_area()
        {
            return false;
        }
        let mut limit = self.config.effective_max_downscale();
        if self.needs_rotator(layer) {
            limit = limit.saturating_mul(ROTATOR_MAX_DOWNSCALE);
        }
        downscale_ratio(layer) <= limit
    }

    /// Returns `true` if a layer only reaches a pipe through the rotator.
    #[must_use]
    pub fn needs_rotator(&self, layer: &Layer) -> bool {
        needs_rotator(layer, self.config.effective_max_downscale())
    }

    /// Returns `true` if the video layer at `index` can be offloaded on its
    /// own.
    #[must_use]
    pub fn is_video_doable(&self, index: usize) -> bool {
        let layer = &self.layers[index];
        layer.is_video()
            && !layer.is_skip()
            && self.is_supported(layer)
            && !self.lacks_rotator(index)
    }

    /// Returns `true` if the layer at `index` must be composed by the GPU
    /// whatever the strategy.
    #[must_use]
    pub fn is_forced_fb(&self, index: usize) -> bool {
        self.is_layer_forced_fb(&self.layers[index]) || self.lacks_rotator(index)
    }

    /// Returns `true` if the layer at `index` needs a rotator session but
    /// the layers below it that also need one use up the free sessions.
    ///
    /// Sessions go to layers bottom first; layers that are GPU-composed for
    /// other reasons do not take one.
    #[must_use]
    pub fn lacks_rotator(&self, index: usize) -> bool {
        let layer = &self.layers[index];
        if !self.needs_rotator(layer) || self.is_layer_forced_fb(layer) {
            return false;
        }
        let below = self.layers[..index]
            .iter()
            .filter(|l| self.needs_rotator(l) && !self.is_layer_forced_fb(l))
            .count();
        below >= self.rotator_budget
    }

    fn is_layer_forced_fb(&self, layer: &Layer) -> bool {
        layer.is_skip()
            || !self.is_supported(layer)
            || (layer.needs_alpha_scale() && !self.config.supports_alpha_scale)
            || (layer.is_secure() && self.kind.is_secondary())
    }

    /// Pipes left for this display on `mixer`, capped by configuration.
    #[must_use]
    pub fn pipe_budget(&self, hw: &HwResources, mixer: Mixer) -> usize {
        self.config
            .max_pipes_per_mixer
            .min(hw.pipes.available(self.display, mixer))
    }

    /// Smallest per-mixer budget across the panel's mixers.
    #[must_use]
    pub fn min_pipe_budget(&self, hw: &HwResources) -> usize {
        self.geometry
            .mixers()
            .map(|m| self.pipe_budget(hw, m))
            .min()
            .unwrap_or(0)
    }

    /// Index range of forced-framebuffer layers, if any.
    #[must_use]
    pub fn forced_fb_span(&self) -> Option<(usize, usize)> {
        let first = (0..self.layers.len()).find(|&i| self.is_forced_fb(i))?;
        let last = (0..self.layers.len()).rfind(|&i| self.is_forced_fb(i))?;
        Some((first, last))
    }
}

/// One way of splitting a frame between pipes and the GPU.
pub trait CompositionStrategy {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Plans and binds the frame, or explains why it cannot.
    ///
    /// On `Err`, resources bound during the attempt may still be held; the
    /// caller releases them.
    fn try_apply(
        &self,
        input: &StrategyInput<'_>,
        hw: &mut HwResources,
    ) -> Result<FrameInfo, Infeasible>;
}

impl core::fmt::Debug for dyn CompositionStrategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.kind().name())
    }
}

/// Checks the per-mixer budget, display limits and secure consistency of a
/// mapped plan, then binds it.
pub(crate) fn finish(
    mut frame: FrameInfo,
    input: &StrategyInput<'_>,
    hw: &mut HwResources,
) -> Result<FrameInfo, Infeasible> {
    if input.kind.is_secondary() && frame.offloaded_count() > input.config.max_secondary_layers
    {
        return Err(Infeasible::TooManySecondaryLayers {
            count: frame.offloaded_count(),
            max: input.config.max_secondary_layers,
        });
    }
    check_secure_buffers(&frame, input.layers)?;
    for mixer in input.geometry.mixers() {
        let layers = frame
            .offloaded()
            .filter(|&i| input.geometry.covers(mixer, input.layers[i].display_frame))
            .count();
        let needed = layers + usize::from(frame.fb_z.is_some());
        let available = input.pipe_budget(hw, mixer);
        if needed > available {
            return Err(Infeasible::PipeBudget {
                mixer,
                needed,
                available,
            });
        }
    }
    bind(&mut frame, input, hw)?;
    frame.needs_full_redraw = input.needs_full_redraw;
    Ok(frame)
}

/// A secure buffer shown by several layers must be offloaded in all of them
/// or in none.
fn check_secure_buffers(frame: &FrameInfo, layers: &[Layer]) -> Result<(), Infeasible> {
    for (i, a) in layers.iter().enumerate() {
        let Some(id) = a.buffer.filter(|b| b.secure).map(|b| b.id) else {
            continue;
        };
        let split = layers
            .iter()
            .enumerate()
            .skip(i + 1)
            .any(|(j, b)| b.buffer_id() == Some(id) && frame.is_offloaded(j) != frame.is_offloaded(i));
        if split {
            return Err(Infeasible::SecureBufferSplit(id));
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::Rect;

    use super::test_support::{Fixture, hw, ui, video};
    use super::*;
    use crate::layer::{Buffer, LayerFlags, Transform};

    #[test]
    fn rotated_rgb_is_unsupported() {
        let f = Fixture::new(vec![ui(1, 0.0).with_transform(Transform::ROT_90)]);
        assert!(!f.input().is_supported(&f.layers[0]));
    }

    #[test]
    fn tiny_crop_is_unsupported() {
        let mut l = ui(1, 0.0);
        l.source_crop = Rect::new(0.0, 0.0, 4.0, 200.0);
        let f = Fixture::new(vec![l]);
        assert!(!f.input().has_valid_dimensions(&f.layers[0]));
    }

    #[test]
    fn fractional_crop_only_allowed_when_secure() {
        let mut l = ui(1, 0.0);
        l.source_crop = Rect::new(0.25, 0.0, 1080.0, 200.0);
        let mut secure = l;
        secure.buffer = Some(Buffer::rgb(2).secure());
        let f = Fixture::new(vec![l, secure]);
        assert!(!f.input().has_valid_dimensions(&f.layers[0]));
        assert!(f.input().has_valid_dimensions(&f.layers[1]));
    }

    #[test]
    fn offscreen_layer_is_unsupported() {
        let mut l = ui(1, 0.0);
        l.display_frame = Rect::new(2000.0, 0.0, 3080.0, 200.0);
        let f = Fixture::new(vec![l]);
        assert!(!f.input().is_supported(&f.layers[0]));
    }

    #[test]
    fn downscale_limit_follows_decimation() {
        let mut l = ui(1, 0.0);
        l.display_frame = Rect::new(0.0, 0.0, 135.0, 25.0);
        let mut f = Fixture::new(vec![l]);
        assert!(f.input().has_valid_dimensions(&f.layers[0]), "8x with decimation");
        f.config = ComposerConfig::legacy();
        assert!(!f.input().has_valid_dimensions(&f.layers[0]), "8x over the 4x limit");
    }

    #[test]
    fn forced_fb_rules() {
        let mut f = Fixture::new(vec![
            ui(1, 0.0).with_flags(LayerFlags::SKIP),
            ui(2, 200.0).with_plane_alpha(100),
            video(3),
        ]);
        f.config = ComposerConfig::legacy();
        let input = f.input();
        assert!(input.is_forced_fb(0));
        assert!(input.is_forced_fb(1), "no alpha scaling on legacy");
        assert!(!input.is_forced_fb(2));
        assert_eq!(input.forced_fb_span(), Some((0, 1)));
    }

    #[test]
    fn rotator_sessions_go_bottom_first() {
        let rotated = video(2).with_transform(Transform::ROT_90);
        let mut f = Fixture::new(vec![
            ui(1, 0.0),
            rotated.with_flags(LayerFlags::SKIP),
            rotated,
            rotated,
        ]);
        f.rotator_budget = 1;
        let input = f.input();
        assert!(!input.lacks_rotator(1), "skip layers never take a session");
        assert!(input.is_video_doable(2));
        assert!(!input.is_forced_fb(2));
        assert!(input.lacks_rotator(3));
        assert!(!input.is_video_doable(3));
        assert!(input.is_forced_fb(3));
        assert_eq!(input.forced_fb_span(), Some((1, 3)));

        f.rotator_budget = 0;
        assert!(f.input().lacks_rotator(2));
        assert!(!f.input().lacks_rotator(0), "no rotator needed");
    }

    #[test]
    fn secure_split_is_rejected() {
        let secure = Layer::new(
            Buffer::yuv(9).secure(),
            Rect::new(0.0, 0.0, 640.0, 360.0),
            Rect::new(0.0, 0.0, 640.0, 360.0),
        );
        let f = Fixture::new(vec![secure, secure]);
        let mut frame = FrameInfo::new(DisplayId::PRIMARY, 2);
        frame.offload(0);
        frame.map();
        let mut hw = hw(2, 2, 0);
        assert_eq!(
            finish(frame, &f.input(), &mut hw),
            Err(Infeasible::SecureBufferSplit(BufferId(9)))
        );
    }

    #[test]
    fn budget_counts_framebuffer_slot() {
        let f = Fixture::new(vec![ui(1, 0.0), ui(2, 200.0)]);
        let mut frame = FrameInfo::new(DisplayId::PRIMARY, 2);
        frame.offload(0);
        frame.map();
        let mut hw = hw(1, 0, 0);
        assert_eq!(
            finish(frame, &f.input(), &mut hw),
            Err(Infeasible::PipeBudget {
                mixer: Mixer::Left,
                needed: 2,
                available: 1,
            })
        );
    }

    #[test]
    fn secondary_layer_cap() {
        let mut f = Fixture::new(vec![ui(1, 0.0), ui(2, 200.0)]);
        f.kind = DisplayKind::External;
        let mut frame = FrameInfo::new(DisplayId::EXTERNAL, 2);
        frame.offload(0);
        frame.offload(1);
        frame.map();
        let mut hw = hw(4, 0, 0);
        assert_eq!(
            finish(frame, &f.input(), &mut hw),
            Err(Infeasible::TooManySecondaryLayers { count: 2, max: 1 })
        );
    }
}
