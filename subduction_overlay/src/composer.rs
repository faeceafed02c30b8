// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-display composition scheduling.
//!
//! A [`Composer`] owns everything one display remembers between frames: its
//! [`LayerCache`], its idle flag and the plan waiting to be committed. The
//! hardware inventory is shared and passed in by reference, so displays are
//! planned one after another against the same pipes.
//!
//! ```text
//!   prepare(layers) ──► release display pipes
//!                        │
//!                        ▼
//!                  idle? gated? ──yes──► no offload
//!                        │ no                ▲
//!                        ▼                   │ all rejected
//!                  strategies in ORDER ──────┘
//!                        │ first accepted
//!                        ▼
//!                   FrameInfo ──► caller programs pipes ──► commit()
//!                                                             │
//!                                              cache.update ◄─┘
//! ```
//!
//! The cache only ever reflects committed frames. A plan dropped with
//! [`Composer::discard`] leaves the cache as it was.

use alloc::vec::Vec;

use crate::cache::LayerCache;
use crate::config::ComposerConfig;
use crate::display::{DisplayGeometry, DisplayId, DisplayKind};
use crate::error::ComposeError;
use crate::idle::IdleFallback;
use crate::layer::Layer;
use crate::pipe::MAX_MIXERS;
use crate::plan::{FrameInfo, StrategyKind};
use crate::resources::HwResources;
use crate::stats::{FrameStats, classify};
use crate::strategy::{ORDER, StrategyInput, bind};
use crate::trace::{
    CacheInvalidatedEvent, CommitEvent, FramePlanEvent, InvalidationReason, PrepareEvent,
    StrategyAttemptEvent, Tracer,
};

/// Per-frame signals from the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameFlags {
    /// Layer geometry changed since the last frame. Nothing cached is
    /// trusted and load-based offload may run.
    pub geometry_changed: bool,
    /// A secondary display is being configured; offload is suspended.
    pub secondary_configuring: bool,
}

/// Result of [`Composer::commit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitOutcome {
    /// The caller should rearm the idle timer.
    pub rearm_idle: bool,
    /// Layers on pipes in the committed frame.
    pub offloaded: usize,
}

/// Why a frame skipped every strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Gate {
    Disabled,
    NoAppLayers,
    TooManyLayers,
    Idle,
    PaddingRound,
    SecondaryConfiguring,
}

impl Gate {
    const fn name(self) -> &'static str {
        match self {
            Self::Disabled => "offload disabled",
            Self::NoAppLayers => "no app layers",
            Self::TooManyLayers => "too many layers",
            Self::Idle => "idle fallback",
            Self::PaddingRound => "padding round",
            Self::SecondaryConfiguring => "secondary configuring",
        }
    }
}

#[derive(Clone, Debug)]
struct Pending {
    plan: FrameInfo,
    layers: Vec<Layer>,
    cacheable: bool,
}

/// Plans the composition of one display, frame by frame.
#[derive(Debug)]
pub struct Composer {
    display: DisplayId,
    kind: DisplayKind,
    geometry: DisplayGeometry,
    config: ComposerConfig,
    cache: LayerCache,
    idle: IdleFallback,
    pending: Option<Pending>,
    padding_round: bool,
    geometry_dirty: bool,
    frame_index: u64,
}

impl Composer {
    /// Creates a composer with an empty cache and its own idle flag.
    #[must_use]
    pub fn new(
        display: DisplayId,
        kind: DisplayKind,
        geometry: DisplayGeometry,
        config: ComposerConfig,
    ) -> Self {
        Self {
            display,
            kind,
            geometry,
            config,
            cache: LayerCache::new(),
            idle: IdleFallback::new(),
            pending: None,
            padding_round: false,
            geometry_dirty: false,
            frame_index: 0,
        }
    }

    /// Replaces the idle flag with one shared with a timer.
    #[must_use]
    pub fn with_idle_fallback(mut self, idle: IdleFallback) -> Self {
        self.idle = idle;
        self
    }

    /// Display this composer plans for.
    #[must_use]
    pub fn display(&self) -> DisplayId {
        self.display
    }

    /// Kind of display.
    #[must_use]
    pub fn kind(&self) -> DisplayKind {
        self.kind
    }

    /// Panel geometry.
    #[must_use]
    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Last committed frame.
    #[must_use]
    pub fn cache(&self) -> &LayerCache {
        &self.cache
    }

    /// Handle to this display's idle flag, for the idle timer.
    #[must_use]
    pub fn idle_handle(&self) -> IdleFallback {
        self.idle.clone()
    }

    /// Frames prepared so far.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Plan waiting for [`commit`](Self::commit), if any.
    #[must_use]
    pub fn pending_plan(&self) -> Option<&FrameInfo> {
        self.pending.as_ref().map(|p| &p.plan)
    }

    /// Changes the panel geometry. The cache is dropped and the next frame
    /// is treated as a full redraw.
    pub fn set_geometry(&mut self, geometry: DisplayGeometry) {
        self.geometry = geometry;
        self.cache.invalidate();
        self.geometry_dirty = true;
    }

    /// Forces the next frame to be composed by the GPU.
    ///
    /// Requested when a secondary display connects so the pipes it will
    /// need are not held by this display.
    pub fn request_padding_round(&mut self) {
        self.padding_round = true;
    }

    /// Plans one frame.
    ///
    /// `layers` is the whole frame with the framebuffer target last. Every
    /// pipe and rotator session this display held is released first, then
    /// strategies are tried in order; when none fits, every app layer is
    /// composed by the GPU. The plan is kept until [`commit`](Self::commit)
    /// or [`discard`](Self::discard).
    ///
    /// # Errors
    ///
    /// [`ComposeError::EmptyLayerList`] if `layers` is empty and
    /// [`ComposeError::MissingFramebufferTarget`] if it does not end with
    /// the framebuffer target.
    pub fn prepare(
        &mut self,
        layers: &[Layer],
        flags: FrameFlags,
        hw: &mut HwResources,
        tracer: &mut Tracer<'_>,
    ) -> Result<FrameInfo, ComposeError> {
        let Some((target, app)) = layers.split_last() else {
            return Err(ComposeError::EmptyLayerList(self.display));
        };
        if !target.is_target() {
            return Err(ComposeError::MissingFramebufferTarget(self.display));
        }

        self.frame_index += 1;
        self.pending = None;
        hw.release_display(self.display);

        let idle = self.idle.take();
        let needs_full_redraw =
            flags.geometry_changed || core::mem::take(&mut self.geometry_dirty);
        tracer.prepare(&PrepareEvent {
            display: self.display,
            frame_index: self.frame_index,
            layer_count: app.len(),
            geometry_changed: needs_full_redraw,
            idle_fallback: idle,
        });
        if idle {
            self.invalidate_cache(InvalidationReason::IdleFallback, tracer);
        }

        let cacheable = app.len() <= self.config.max_app_layers;
        let gate = self.gate(app, flags, idle, cacheable);
        let stats = classify(app);
        let input = StrategyInput {
            display: self.display,
            kind: self.kind,
            geometry: self.geometry,
            config: &self.config,
            layers: app,
            stats: &stats,
            cache: &self.cache,
            needs_full_redraw,
            rotator_budget: hw.rotators.free(),
        };

        let mut plan = match gate {
            Some(gate) => {
                if self.config.debug_logs {
                    log::debug!(
                        "display {} frame {}: {}, composing on the GPU",
                        self.display,
                        self.frame_index,
                        gate.name()
                    );
                }
                no_offload(&input, hw)
            }
            None => run_strategies(&input, hw, self.frame_index, tracer)
                .unwrap_or_else(|| no_offload(&input, hw)),
        };
        plan.fb_needs_redraw = fb_needs_redraw(&plan, &input, &stats);

        tracer.frame_plan(&FramePlanEvent::new(&plan, self.frame_index));
        if self.config.debug_logs {
            log::debug!(
                "display {} frame {}: {} offloaded={} fb={} fb_z={:?} redraw={}",
                self.display,
                self.frame_index,
                plan.strategy.name(),
                plan.offloaded_count(),
                plan.fb_count(),
                plan.fb_z,
                plan.fb_needs_redraw,
            );
        }

        self.pending = Some(Pending {
            plan: plan.clone(),
            layers: app.to_vec(),
            cacheable,
        });
        Ok(plan)
    }

    /// Records the pending plan as displayed.
    ///
    /// The cache is updated from the plan, or dropped when the frame had
    /// too many layers to cache.
    ///
    /// # Errors
    ///
    /// [`ComposeError::NoPreparedFrame`] if no plan is pending.
    pub fn commit(&mut self, tracer: &mut Tracer<'_>) -> Result<CommitOutcome, ComposeError> {
        let pending = self
            .pending
            .take()
            .ok_or(ComposeError::NoPreparedFrame(self.display))?;
        if pending.cacheable {
            self.cache.update(&pending.plan, &pending.layers);
        } else if self.cache.is_valid() {
            self.invalidate_cache(InvalidationReason::Uncacheable, tracer);
        }

        let offloaded = pending.plan.offloaded_count();
        let outcome = CommitOutcome {
            rearm_idle: offloaded > 0 && self.config.idle_timeout.is_some(),
            offloaded,
        };
        tracer.commit(&CommitEvent {
            display: self.display,
            frame_index: self.frame_index,
            offloaded,
            rearm_idle: outcome.rearm_idle,
        });
        Ok(outcome)
    }

    /// Drops the pending plan and the hardware it bound. The cache is left
    /// untouched.
    pub fn discard(&mut self, hw: &mut HwResources) {
        self.pending = None;
        hw.release_display(self.display);
    }

    /// Releases everything this display holds and forgets the cache, for a
    /// paused or disconnected display.
    pub fn blank(&mut self, hw: &mut HwResources, tracer: &mut Tracer<'_>) {
        self.pending = None;
        hw.release_display(self.display);
        self.invalidate_cache(InvalidationReason::Blank, tracer);
    }

    fn gate(
        &mut self,
        app: &[Layer],
        flags: FrameFlags,
        idle: bool,
        cacheable: bool,
    ) -> Option<Gate> {
        let padding = core::mem::take(&mut self.padding_round);
        if !self.config.enabled {
            Some(Gate::Disabled)
        } else if app.is_empty() {
            Some(Gate::NoAppLayers)
        } else if !cacheable {
            Some(Gate::TooManyLayers)
        } else if idle {
            Some(Gate::Idle)
        } else if padding {
            Some(Gate::PaddingRound)
        } else if flags.secondary_configuring {
            Some(Gate::SecondaryConfiguring)
        } else {
            None
        }
    }

    fn invalidate_cache(&mut self, reason: InvalidationReason, tracer: &mut Tracer<'_>) {
        self.cache.invalidate();
        tracer.cache_invalidated(&CacheInvalidatedEvent {
            display: self.display,
            frame_index: self.frame_index,
            reason,
        });
    }
}

/// Tries each strategy once, releasing the display's hardware after every
/// rejection.
fn run_strategies(
    input: &StrategyInput<'_>,
    hw: &mut HwResources,
    frame_index: u64,
    tracer: &mut Tracer<'_>,
) -> Option<FrameInfo> {
    for strategy in ORDER {
        let kind = strategy.kind();
        match strategy.try_apply(input, hw) {
            Ok(mut plan) => {
                plan.strategy = kind;
                tracer.strategy_attempt(&StrategyAttemptEvent {
                    display: input.display,
                    frame_index,
                    strategy: kind,
                    rejected: None,
                });
                return Some(plan);
            }
            Err(reason) => {
                hw.release_display(input.display);
                tracer.strategy_attempt(&StrategyAttemptEvent {
                    display: input.display,
                    frame_index,
                    strategy: kind,
                    rejected: Some(reason),
                });
                if input.config.debug_logs {
                    log::debug!(
                        "display {} frame {}: {} rejected: {}",
                        input.display,
                        frame_index,
                        kind.name(),
                        reason
                    );
                }
            }
        }
    }
    None
}

/// Every app layer on the GPU; the framebuffer target still takes one pipe
/// per mixer when one is free.
fn no_offload(input: &StrategyInput<'_>, hw: &mut HwResources) -> FrameInfo {
    let mut plan = FrameInfo::new(input.display, input.layers.len());
    plan.map();
    if plan.fb_z.is_none() {
        plan.fb_z = Some(0);
    }
    if let Err(reason) = bind(&mut plan, input, hw) {
        log::warn!(
            "display {}: no pipe for the framebuffer target: {}",
            input.display,
            reason
        );
        hw.release_display(input.display);
        plan.fb_pipes = [None; MAX_MIXERS];
    }
    plan.strategy = StrategyKind::NoOffload;
    plan.needs_full_redraw = input.needs_full_redraw;
    plan
}

/// The GPU redraws unless every framebuffer-composed layer already sits in
/// the framebuffer unchanged, in the same layout.
fn fb_needs_redraw(plan: &FrameInfo, input: &StrategyInput<'_>, stats: &FrameStats) -> bool {
    if plan.fb_count() == 0 {
        return false;
    }
    if input.needs_full_redraw || stats.skip_present() || input.cache.layout_differs(plan) {
        return true;
    }
    (0..plan.layer_count())
        .filter(|&i| plan.is_fb_composed(i))
        .any(|i| !input.cache.matches(i, &input.layers[i]) || input.cache.was_offloaded(i))
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::Rect;

    use super::*;
    use crate::layer::{Buffer, CompositionType, LayerFlags, Transform};
    use crate::pipe::{Mixer, PipeClass, PipeInventory};
    use crate::strategy::test_support::{PANEL, ui, video};

    fn target() -> Layer {
        Layer::framebuffer_target(PANEL.bounds())
    }

    fn composer() -> Composer {
        Composer::new(
            DisplayId::PRIMARY,
            DisplayKind::Primary,
            PANEL,
            ComposerConfig::mdss(),
        )
    }

    fn inventory(general: u8, video: u8) -> HwResources {
        HwResources::new(
            PipeInventory {
                general,
                video,
                blit: 0,
                max_per_mixer: [4, 4],
            },
            2,
        )
    }

    fn prepare(c: &mut Composer, layers: &[Layer], hw: &mut HwResources) -> FrameInfo {
        c.prepare(layers, FrameFlags::default(), hw, &mut Tracer::none())
            .expect("well-formed frame")
    }

    #[test]
    fn malformed_lists_are_errors() {
        let mut c = composer();
        let mut hw = inventory(2, 1);
        let mut t = Tracer::none();
        assert_eq!(
            c.prepare(&[], FrameFlags::default(), &mut hw, &mut t),
            Err(ComposeError::EmptyLayerList(DisplayId::PRIMARY))
        );
        assert_eq!(
            c.prepare(&[ui(1, 0.0)], FrameFlags::default(), &mut hw, &mut t),
            Err(ComposeError::MissingFramebufferTarget(DisplayId::PRIMARY))
        );
        assert_eq!(
            c.commit(&mut t),
            Err(ComposeError::NoPreparedFrame(DisplayId::PRIMARY))
        );
    }

    #[test]
    fn rotated_video_and_ui_fully_offloaded() {
        let mut c = composer();
        let mut hw = inventory(2, 1);
        let layers = [ui(1, 0.0), video(2).with_transform(Transform::ROT_90), target()];
        let plan = prepare(&mut c, &layers, &mut hw);
        assert_eq!(plan.strategy, StrategyKind::Full);
        assert_eq!(plan.fb_z, None);
        assert_eq!(plan.fb_pipes, [None, None]);
        let ui_pipe = plan.entry_for(0).and_then(|e| e.pipe(Mixer::Left));
        assert_eq!(ui_pipe.map(|p| p.class), Some(PipeClass::General));
        let v = plan.entry_for(1).expect("video offloaded");
        assert_eq!(v.pipe(Mixer::Left).map(|p| p.class), Some(PipeClass::Video));
        assert!(v.rotator.is_some());
        assert!(!plan.fb_needs_redraw);
    }

    #[test]
    fn single_pipe_falls_back_to_gpu() {
        let mut c = composer();
        let mut hw = inventory(1, 0);
        let mut layers = [ui(1, 0.0), video(2).with_transform(Transform::ROT_90), target()];
        let plan = prepare(&mut c, &layers, &mut hw);
        assert_eq!(plan.strategy, StrategyKind::NoOffload);
        assert_eq!(plan.fb_count(), 2);
        assert!(plan.fb_pipes[0].is_some(), "the target still gets its pipe");
        assert_eq!(plan.pipes().count(), 1);
        plan.apply_to(&mut layers);
        assert_eq!(layers[0].composition, CompositionType::Gpu);
        assert_eq!(layers[1].composition, CompositionType::Gpu);
    }

    #[test]
    fn unchanged_ui_keeps_its_pipe() {
        let mut c = composer();
        let mut hw = inventory(2, 1);
        let mut t = Tracer::none();
        let first = prepare(&mut c, &[ui(1, 0.0), video(2), target()], &mut hw);
        c.commit(&mut t).expect("prepared");
        let ui_pipe = first.entry_for(0).and_then(|e| e.pipe(Mixer::Left));

        let second = prepare(&mut c, &[ui(1, 0.0), video(3), target()], &mut hw);
        let ui_entry = second.entry_for(0).expect("ui offloaded");
        assert!(ui_entry.reused);
        assert_eq!(ui_entry.pipe(Mixer::Left), ui_pipe);
        let video_entry = second.entry_for(1).expect("video offloaded");
        assert!(!video_entry.reused, "new buffer is reprogrammed");
    }

    #[test]
    fn rotator_shortage_demotes_one_video() {
        let mut c = composer();
        let mut hw = HwResources::new(PipeInventory::mdss(), 1);
        let mut t = Tracer::none();
        let layers = [
            ui(1, 0.0),
            video(2).with_transform(Transform::ROT_90),
            video(3).with_transform(Transform::ROT_90),
            target(),
        ];
        for frame in 0..4 {
            let plan = prepare(&mut c, &layers, &mut hw);
            if frame == 0 {
                assert_eq!(plan.strategy, StrategyKind::VideoOnly);
            }
            assert_ne!(plan.strategy, StrategyKind::NoOffload, "frame {frame}");
            let first = plan.entry_for(1).expect("lower video offloaded");
            assert!(first.rotator.is_some(), "frame {frame}");
            assert!(plan.is_fb_composed(2), "frame {frame}: no session left");
            assert_eq!(hw.rotators.held(DisplayId::PRIMARY), 1);
            assert_eq!(hw.rotators.free(), 0);
            c.commit(&mut t).expect("prepared");
        }
    }

    #[test]
    fn idle_fallback_ignores_cache() {
        let mut c = composer();
        let mut hw = inventory(2, 1);
        let mut t = Tracer::none();
        let layers = [ui(1, 0.0), video(2), target()];
        prepare(&mut c, &layers, &mut hw);
        assert!(c.commit(&mut t).expect("prepared").rearm_idle);

        c.idle_handle().mark_idle();
        let plan = prepare(&mut c, &layers, &mut hw);
        assert_eq!(plan.strategy, StrategyKind::NoOffload);
        assert!(!c.cache().is_valid());
        assert!(plan.fb_needs_redraw);
        assert_eq!(plan.entries().len(), 0);
        let outcome = c.commit(&mut t).expect("prepared");
        assert!(!outcome.rearm_idle, "nothing on pipes");

        let plan = prepare(&mut c, &layers, &mut hw);
        assert_eq!(plan.strategy, StrategyKind::Full, "the flag is consumed once");
        assert!(plan.entries().iter().all(|e| !e.reused));
    }

    #[test]
    fn static_gpu_frame_is_retained() {
        let mut c = composer();
        let mut hw = inventory(1, 0);
        let mut t = Tracer::none();
        let layers = [ui(1, 0.0), ui(2, 200.0), target()];
        let plan = prepare(&mut c, &layers, &mut hw);
        assert_eq!(plan.strategy, StrategyKind::NoOffload);
        assert!(plan.fb_needs_redraw);
        c.commit(&mut t).expect("prepared");

        let plan = prepare(&mut c, &layers, &mut hw);
        assert!(!plan.fb_needs_redraw, "nothing changed under the framebuffer");
    }

    #[test]
    fn discard_keeps_cache() {
        let mut c = composer();
        let mut hw = inventory(2, 1);
        let mut t = Tracer::none();
        let layers = [ui(1, 0.0), target()];
        prepare(&mut c, &layers, &mut hw);
        c.commit(&mut t).expect("prepared");
        assert!(c.cache().is_valid());

        prepare(&mut c, &[ui(5, 0.0), target()], &mut hw);
        c.discard(&mut hw);
        assert!(c.pending_plan().is_none());
        assert!(c.cache().matches(0, &layers[0]), "cache still shows the committed frame");
        assert_eq!(hw.pipes.held(DisplayId::PRIMARY, Mixer::Left), 0);
    }

    #[test]
    fn gates_force_gpu() {
        let mut hw = inventory(4, 2);
        let layers = [ui(1, 0.0), target()];

        let mut c = composer();
        c.request_padding_round();
        assert_eq!(prepare(&mut c, &layers, &mut hw).strategy, StrategyKind::NoOffload);
        assert_eq!(prepare(&mut c, &layers, &mut hw).strategy, StrategyKind::Full);

        let flags = FrameFlags {
            secondary_configuring: true,
            ..FrameFlags::default()
        };
        let plan = c
            .prepare(&layers, flags, &mut hw, &mut Tracer::none())
            .expect("well-formed frame");
        assert_eq!(plan.strategy, StrategyKind::NoOffload);

        let mut config = ComposerConfig::mdss();
        config.enabled = false;
        let mut off = Composer::new(DisplayId::PRIMARY, DisplayKind::Primary, PANEL, config);
        assert_eq!(prepare(&mut off, &layers, &mut hw).strategy, StrategyKind::NoOffload);
    }

    #[test]
    fn too_many_layers_is_not_cached() {
        let mut config = ComposerConfig::mdss();
        config.max_app_layers = 2;
        let mut c = Composer::new(DisplayId::PRIMARY, DisplayKind::Primary, PANEL, config);
        let mut hw = inventory(4, 2);
        let mut t = Tracer::none();
        let layers = [ui(1, 0.0), ui(2, 200.0), ui(3, 400.0), target()];
        assert_eq!(prepare(&mut c, &layers, &mut hw).strategy, StrategyKind::NoOffload);
        c.commit(&mut t).expect("prepared");
        assert!(!c.cache().is_valid());
    }

    #[test]
    fn skip_layer_lands_in_framebuffer() {
        let mut c = composer();
        let mut hw = inventory(4, 2);
        let layers = [
            ui(1, 0.0),
            ui(2, 200.0).with_flags(LayerFlags::SKIP),
            ui(3, 400.0),
            target(),
        ];
        let plan = prepare(&mut c, &layers, &mut hw);
        assert!(plan.is_fb_composed(1));
        assert!(plan.fb_needs_redraw);
        assert!(plan.is_consistent());
    }

    #[test]
    fn blank_releases_everything() {
        let mut c = composer();
        let mut hw = inventory(2, 1);
        let mut t = Tracer::none();
        prepare(&mut c, &[ui(1, 0.0), video(2), target()], &mut hw);
        c.commit(&mut t).expect("prepared");
        assert!(hw.pipes.held(DisplayId::PRIMARY, Mixer::Left) > 0);
        c.blank(&mut hw, &mut t);
        assert_eq!(hw.pipes.held(DisplayId::PRIMARY, Mixer::Left), 0);
        assert_eq!(hw.rotators.held(DisplayId::PRIMARY), 0);
        assert!(!c.cache().is_valid());
    }

    #[test]
    fn geometry_change_drops_reuse() {
        let mut c = composer();
        let mut hw = inventory(2, 1);
        let mut t = Tracer::none();
        let layers = [ui(1, 0.0), target()];
        prepare(&mut c, &layers, &mut hw);
        c.commit(&mut t).expect("prepared");
        c.set_geometry(DisplayGeometry::new(1080, 1920));
        let plan = prepare(&mut c, &layers, &mut hw);
        assert!(plan.needs_full_redraw);
        assert!(plan.entries().iter().all(|e| !e.reused));
    }

    #[test]
    fn empty_frame_shows_the_target() {
        let mut c = composer();
        let mut hw = inventory(1, 0);
        let plan = prepare(&mut c, &[target()], &mut hw);
        assert_eq!(plan.strategy, StrategyKind::NoOffload);
        assert_eq!(plan.fb_z, Some(0));
        assert!(plan.fb_pipes[0].is_some());
    }

    #[test]
    fn secondary_display_keeps_one_layer() {
        let mut c = Composer::new(
            DisplayId::EXTERNAL,
            DisplayKind::External,
            DisplayGeometry::new(1920, 1080),
            ComposerConfig::mdss(),
        );
        let mut hw = inventory(4, 2);
        let wide = |id, y: f64| {
            Layer::new(
                Buffer::rgb(id),
                Rect::new(0.0, 0.0, 1920.0, 100.0),
                Rect::new(0.0, y, 1920.0, y + 100.0),
            )
        };
        let layers = [
            wide(1, 0.0),
            wide(2, 100.0),
            Layer::framebuffer_target(Rect::new(0.0, 0.0, 1920.0, 1080.0)),
        ];
        let plan = prepare(&mut c, &layers, &mut hw);
        assert!(plan.offloaded_count() <= 1);
        assert!(plan.is_consistent());
    }
}
