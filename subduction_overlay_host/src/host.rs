// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multi-display host over one shared pipe inventory.
//!
//! [`OverlayHost`] owns the [`HwResources`] every display plans against, one
//! [`Composer`] slot per display, the idle timer and the trace sink. Each
//! call locks what it needs in a fixed order:
//!
//! ```text
//!   display slot ──► hardware inventory ──► trace sink
//! ```
//!
//! A display slot lock is held for the whole of `prepare`, `commit` and the
//! lifecycle calls, so a display cannot be paused or disconnected while it
//! is being planned. Pausing or disconnecting releases the display's pipes
//! under the inventory lock before returning, so the next display's planning
//! pass sees them free.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use subduction_overlay::composer::{CommitOutcome, Composer, FrameFlags};
use subduction_overlay::config::ComposerConfig;
use subduction_overlay::display::{DisplayGeometry, DisplayId, DisplayKind, MAX_DISPLAYS};
use subduction_overlay::error::ComposeError;
use subduction_overlay::idle::IdleFallback;
use subduction_overlay::layer::Layer;
use subduction_overlay::pipe::PipeInventory;
use subduction_overlay::plan::FrameInfo;
use subduction_overlay::resources::HwResources;
use subduction_overlay::trace::{NoopSink, TraceSink, Tracer};

use crate::idle_timer::IdleTimer;

/// One display's frame in a refresh pass.
#[derive(Debug)]
pub struct DisplayFrame<'a> {
    /// Display to plan.
    pub display: DisplayId,
    /// Full layer list, framebuffer target last. Composition types are
    /// written back from the plan.
    pub layers: &'a mut [Layer],
    /// Per-frame signals.
    pub flags: FrameFlags,
}

#[derive(Debug, Default)]
struct DisplaySlot {
    composer: Option<Composer>,
    active: bool,
}

/// Runs the composers of every attached display.
pub struct OverlayHost {
    config: ComposerConfig,
    hw: Mutex<HwResources>,
    displays: [Mutex<DisplaySlot>; MAX_DISPLAYS],
    configuring: [AtomicBool; MAX_DISPLAYS],
    idle: [IdleFallback; MAX_DISPLAYS],
    sink: Mutex<Box<dyn TraceSink + Send>>,
    timer: Option<IdleTimer>,
}

impl std::fmt::Debug for OverlayHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayHost")
            .field("config", &self.config)
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

impl OverlayHost {
    /// Creates a host with no displays attached.
    ///
    /// When the configuration has an idle timeout, a timer thread is
    /// spawned; when it fires, every display's idle flag is set and
    /// `on_idle` is called so the caller can schedule a refresh.
    ///
    /// # Errors
    ///
    /// Returns the error from spawning the timer thread.
    pub fn new(
        config: ComposerConfig,
        inventory: PipeInventory,
        rotator_sessions: usize,
        on_idle: impl Fn() + Send + 'static,
    ) -> io::Result<Self> {
        let idle: [IdleFallback; MAX_DISPLAYS] = core::array::from_fn(|_| IdleFallback::new());
        let timer = match config.idle_timeout {
            Some(timeout) => {
                let flags = idle.clone();
                Some(IdleTimer::new(timeout, move || {
                    for flag in &flags {
                        flag.mark_idle();
                    }
                    on_idle();
                })?)
            }
            None => None,
        };
        Ok(Self {
            config,
            hw: Mutex::new(HwResources::new(inventory, rotator_sessions)),
            displays: core::array::from_fn(|_| Mutex::new(DisplaySlot::default())),
            configuring: core::array::from_fn(|_| AtomicBool::new(false)),
            idle,
            sink: Mutex::new(Box::new(NoopSink)),
            timer,
        })
    }

    /// Replaces the trace sink.
    pub fn set_sink(&self, sink: Box<dyn TraceSink + Send>) {
        *self.sink.lock() = sink;
    }

    /// Composer configuration shared by every display.
    #[must_use]
    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Attaches a display and makes it active.
    ///
    /// A secondary display suspends offload on the primary display until
    /// its first commit, and the primary's next frame is a padding round so
    /// the pipes the new display needs are freed.
    ///
    /// # Errors
    ///
    /// [`ComposeError::DisplayNotInitialized`] if `display` has no slot.
    pub fn init_display(
        &self,
        display: DisplayId,
        kind: DisplayKind,
        geometry: DisplayGeometry,
    ) -> Result<(), ComposeError> {
        {
            let mut slot = self.slot(display)?.lock();
            let composer = Composer::new(display, kind, geometry, self.config)
                .with_idle_fallback(self.idle[display.index()].clone());
            slot.composer = Some(composer);
            slot.active = true;
        }
        log::info!(
            "display {display} attached as {kind:?} {}x{}",
            geometry.width,
            geometry.height
        );
        if kind.is_secondary() {
            self.configuring[display.index()].store(true, Ordering::Release);
            if let Some(primary) = self.displays[DisplayId::PRIMARY.index()]
                .lock()
                .composer
                .as_mut()
            {
                primary.request_padding_round();
            }
        }
        Ok(())
    }

    /// Stops planning a display and releases its hardware.
    ///
    /// # Errors
    ///
    /// [`ComposeError::DisplayNotInitialized`] if the display is not attached.
    pub fn pause(&self, display: DisplayId) -> Result<(), ComposeError> {
        let mut slot = self.slot(display)?.lock();
        let composer = slot
            .composer
            .as_mut()
            .ok_or(ComposeError::DisplayNotInitialized(display))?;
        self.blank(composer);
        slot.active = false;
        self.configuring[display.index()].store(false, Ordering::Release);
        log::info!("display {display} paused");
        Ok(())
    }

    /// Resumes planning a paused display. Its first frame starts from an
    /// empty cache.
    ///
    /// # Errors
    ///
    /// [`ComposeError::DisplayNotInitialized`] if the display is not attached.
    pub fn resume(&self, display: DisplayId) -> Result<(), ComposeError> {
        let mut slot = self.slot(display)?.lock();
        if slot.composer.is_none() {
            return Err(ComposeError::DisplayNotInitialized(display));
        }
        slot.active = true;
        log::info!("display {display} resumed");
        Ok(())
    }

    /// Detaches a display and releases its hardware.
    ///
    /// # Errors
    ///
    /// [`ComposeError::DisplayNotInitialized`] if the display is not attached.
    pub fn disconnect(&self, display: DisplayId) -> Result<(), ComposeError> {
        let mut slot = self.slot(display)?.lock();
        let mut composer = slot
            .composer
            .take()
            .ok_or(ComposeError::DisplayNotInitialized(display))?;
        self.blank(&mut composer);
        slot.active = false;
        self.configuring[display.index()].store(false, Ordering::Release);
        log::info!("display {display} disconnected");
        Ok(())
    }

    /// Plans one display's frame and writes the decision into `layers`.
    ///
    /// # Errors
    ///
    /// [`ComposeError::DisplayNotInitialized`] for a display that is not
    /// attached or is paused, plus the layer list errors of
    /// [`Composer::prepare`].
    pub fn prepare(
        &self,
        display: DisplayId,
        layers: &mut [Layer],
        mut flags: FrameFlags,
    ) -> Result<FrameInfo, ComposeError> {
        let mut slot = self.slot(display)?.lock();
        let composer = active_composer(&mut slot, display)?;
        if composer.kind() == DisplayKind::Primary {
            flags.secondary_configuring |= self
                .configuring
                .iter()
                .any(|c| c.load(Ordering::Acquire));
        }
        let mut hw = self.hw.lock();
        let mut sink = self.sink.lock();
        let mut tracer = Tracer::new(&mut **sink);
        let plan = composer.prepare(layers, flags, &mut hw, &mut tracer)?;
        plan.apply_to(layers);
        Ok(plan)
    }

    /// Plans every frame of a refresh pass, one display after another.
    pub fn prepare_all(
        &self,
        frames: &mut [DisplayFrame<'_>],
    ) -> Vec<Result<FrameInfo, ComposeError>> {
        frames
            .iter_mut()
            .map(|f| self.prepare(f.display, f.layers, f.flags))
            .collect()
    }

    /// Commits a display's prepared plan and rearms the idle timer when
    /// layers went to pipes.
    ///
    /// # Errors
    ///
    /// [`ComposeError::DisplayNotInitialized`] for a display that is not
    /// attached or is paused, and [`ComposeError::NoPreparedFrame`] if
    /// nothing was prepared.
    pub fn commit(&self, display: DisplayId) -> Result<CommitOutcome, ComposeError> {
        let mut slot = self.slot(display)?.lock();
        let composer = active_composer(&mut slot, display)?;
        let outcome = {
            let mut sink = self.sink.lock();
            composer.commit(&mut Tracer::new(&mut **sink))?
        };
        self.configuring[display.index()].store(false, Ordering::Release);
        if outcome.rearm_idle
            && let Some(timer) = &self.timer
        {
            timer.rearm();
        }
        Ok(outcome)
    }

    /// Drops a display's prepared plan after a programming failure.
    ///
    /// # Errors
    ///
    /// [`ComposeError::DisplayNotInitialized`] if the display is not attached.
    pub fn discard(&self, display: DisplayId) -> Result<(), ComposeError> {
        let mut slot = self.slot(display)?.lock();
        let composer = slot
            .composer
            .as_mut()
            .ok_or(ComposeError::DisplayNotInitialized(display))?;
        composer.discard(&mut self.hw.lock());
        Ok(())
    }

    /// Sets every display's idle flag, as if the idle timer had fired.
    pub fn mark_idle(&self) {
        for flag in &self.idle {
            flag.mark_idle();
        }
    }

    /// Idle flag of one display.
    #[must_use]
    pub fn idle_handle(&self, display: DisplayId) -> Option<IdleFallback> {
        self.idle.get(display.index()).cloned()
    }

    /// Returns `true` while the idle timer is counting down.
    #[must_use]
    pub fn idle_timer_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(IdleTimer::is_armed)
    }

    /// A copy of the shared inventory, for diagnostics.
    #[must_use]
    pub fn hw_snapshot(&self) -> HwResources {
        self.hw.lock().clone()
    }

    /// Runs `f` against a display's composer.
    pub fn with_composer<R>(
        &self,
        display: DisplayId,
        f: impl FnOnce(&Composer) -> R,
    ) -> Option<R> {
        let slot = self.displays.get(display.index())?.lock();
        slot.composer.as_ref().map(f)
    }

    fn slot(&self, display: DisplayId) -> Result<&Mutex<DisplaySlot>, ComposeError> {
        self.displays
            .get(display.index())
            .ok_or(ComposeError::DisplayNotInitialized(display))
    }

    fn blank(&self, composer: &mut Composer) {
        let mut hw = self.hw.lock();
        let mut sink = self.sink.lock();
        composer.blank(&mut hw, &mut Tracer::new(&mut **sink));
    }
}

fn active_composer(
    slot: &mut DisplaySlot,
    display: DisplayId,
) -> Result<&mut Composer, ComposeError> {
    if !slot.active {
        return Err(ComposeError::DisplayNotInitialized(display));
    }
    slot.composer
        .as_mut()
        .ok_or(ComposeError::DisplayNotInitialized(display))
}
