// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for composition decisions.
//!
//! This module provides a [`TraceSink`] trait with one method per event the
//! composer emits while planning and committing frames. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.

use crate::display::DisplayId;
use crate::pipe::{MAX_MIXERS, Mixer};
use crate::plan::{FrameInfo, StrategyKind};
use crate::strategy::Infeasible;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why a display's cache was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvalidationReason {
    /// The idle timer fired.
    IdleFallback,
    /// The display was paused or disconnected.
    Blank,
    /// The committed frame had too many layers to cache.
    Uncacheable,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a display starts planning a frame.
#[derive(Clone, Copy, Debug)]
pub struct PrepareEvent {
    /// Display being planned.
    pub display: DisplayId,
    /// Per-display frame counter.
    pub frame_index: u64,
    /// App layers in the frame.
    pub layer_count: usize,
    /// The caller flagged a geometry change.
    pub geometry_changed: bool,
    /// The idle flag was consumed by this frame.
    pub idle_fallback: bool,
}

/// Emitted once per strategy tried.
#[derive(Clone, Copy, Debug)]
pub struct StrategyAttemptEvent {
    /// Display being planned.
    pub display: DisplayId,
    /// Frame counter.
    pub frame_index: u64,
    /// Strategy tried.
    pub strategy: StrategyKind,
    /// Why it was rejected, or `None` if it was accepted.
    pub rejected: Option<Infeasible>,
}

/// Emitted with the final plan of a frame.
#[derive(Clone, Copy, Debug)]
pub struct FramePlanEvent {
    /// Display planned.
    pub display: DisplayId,
    /// Frame counter.
    pub frame_index: u64,
    /// Winning strategy.
    pub strategy: StrategyKind,
    /// Layers on pipes.
    pub offloaded: usize,
    /// Layers composed by the GPU.
    pub fb_count: usize,
    /// Framebuffer z slot.
    pub fb_z: Option<u8>,
    /// Pipes used per mixer, framebuffer included.
    pub pipes: [usize; MAX_MIXERS],
    /// Offloaded layers that kept last frame's pipes.
    pub reused: usize,
    /// The GPU must redraw the framebuffer.
    pub fb_needs_redraw: bool,
}

impl FramePlanEvent {
    /// Summarizes a plan.
    #[must_use]
    pub fn new(plan: &FrameInfo, frame_index: u64) -> Self {
        Self {
            display: plan.display,
            frame_index,
            strategy: plan.strategy,
            offloaded: plan.offloaded_count(),
            fb_count: plan.fb_count(),
            fb_z: plan.fb_z,
            pipes: Mixer::ALL.map(|m| plan.pipes_on(m)),
            reused: plan.entries().iter().filter(|e| e.reused).count(),
            fb_needs_redraw: plan.fb_needs_redraw,
        }
    }
}

/// Emitted when a prepared plan is committed.
#[derive(Clone, Copy, Debug)]
pub struct CommitEvent {
    /// Display committed.
    pub display: DisplayId,
    /// Frame counter.
    pub frame_index: u64,
    /// Layers on pipes.
    pub offloaded: usize,
    /// The idle timer should be rearmed.
    pub rearm_idle: bool,
}

/// Emitted when a display's cache is dropped.
#[derive(Clone, Copy, Debug)]
pub struct CacheInvalidatedEvent {
    /// Display whose cache was dropped.
    pub display: DisplayId,
    /// Frame counter at the time.
    pub frame_index: u64,
    /// Why.
    pub reason: InvalidationReason,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the composer.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when planning starts.
    fn on_prepare(&mut self, e: &PrepareEvent) {
        _ = e;
    }

    /// Called after each strategy attempt.
    fn on_strategy_attempt(&mut self, e: &StrategyAttemptEvent) {
        _ = e;
    }

    /// Called with the final plan.
    fn on_frame_plan(&mut self, e: &FramePlanEvent) {
        _ = e;
    }

    /// Called when a plan is committed.
    fn on_commit(&mut self, e: &CommitEvent) {
        _ = e;
    }

    /// Called when a cache is invalidated.
    fn on_cache_invalidated(&mut self, e: &CacheInvalidatedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $e:ident) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    }};
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PrepareEvent`].
    #[inline]
    pub fn prepare(&mut self, e: &PrepareEvent) {
        dispatch!(self, on_prepare, e);
    }

    /// Emits a [`StrategyAttemptEvent`].
    #[inline]
    pub fn strategy_attempt(&mut self, e: &StrategyAttemptEvent) {
        dispatch!(self, on_strategy_attempt, e);
    }

    /// Emits a [`FramePlanEvent`].
    #[inline]
    pub fn frame_plan(&mut self, e: &FramePlanEvent) {
        dispatch!(self, on_frame_plan, e);
    }

    /// Emits a [`CommitEvent`].
    #[inline]
    pub fn commit(&mut self, e: &CommitEvent) {
        dispatch!(self, on_commit, e);
    }

    /// Emits a [`CacheInvalidatedEvent`].
    #[inline]
    pub fn cache_invalidated(&mut self, e: &CacheInvalidatedEvent) {
        dispatch!(self, on_cache_invalidated, e);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
