// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use subduction_overlay::trace::{
    CacheInvalidatedEvent, CommitEvent, FramePlanEvent, InvalidationReason, PrepareEvent,
    StrategyAttemptEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write + Send>> {
    writer: W,
    attempts: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            attempts: true,
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer,
            attempts: true,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            attempts: true,
        }
    }

    /// Enables or disables the per-strategy lines.
    #[must_use]
    pub fn with_attempts(mut self, attempts: bool) -> Self {
        self.attempts = attempts;
        self
    }

    /// Returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn reason_name(reason: InvalidationReason) -> &'static str {
    match reason {
        InvalidationReason::IdleFallback => "idle",
        InvalidationReason::Blank => "blank",
        InvalidationReason::Uncacheable => "uncacheable",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_prepare(&mut self, e: &PrepareEvent) {
        let _ = writeln!(
            self.writer,
            "[prepare] display={} frame={} layers={} geometry={} idle={}",
            e.display,
            e.frame_index,
            e.layer_count,
            if e.geometry_changed { "changed" } else { "same" },
            e.idle_fallback,
        );
    }

    fn on_strategy_attempt(&mut self, e: &StrategyAttemptEvent) {
        if !self.attempts {
            return;
        }
        let _ = match e.rejected {
            Some(reason) => writeln!(
                self.writer,
                "[strategy] display={} frame={} {} rejected: {reason}",
                e.display,
                e.frame_index,
                e.strategy.name(),
            ),
            None => writeln!(
                self.writer,
                "[strategy] display={} frame={} {} ok",
                e.display,
                e.frame_index,
                e.strategy.name(),
            ),
        };
    }

    fn on_frame_plan(&mut self, e: &FramePlanEvent) {
        let fb_z = e.fb_z.map_or_else(|| "-".to_string(), |z| z.to_string());
        let _ = writeln!(
            self.writer,
            "[plan] display={} frame={} {} hw={} fb={} fb_z={fb_z} pipes={}+{} reused={} redraw={}",
            e.display,
            e.frame_index,
            e.strategy.name(),
            e.offloaded,
            e.fb_count,
            e.pipes[0],
            e.pipes[1],
            e.reused,
            e.fb_needs_redraw,
        );
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        let _ = writeln!(
            self.writer,
            "[commit] display={} frame={} hw={} rearm_idle={}",
            e.display, e.frame_index, e.offloaded, e.rearm_idle,
        );
    }

    fn on_cache_invalidated(&mut self, e: &CacheInvalidatedEvent) {
        let _ = writeln!(
            self.writer,
            "[cache] display={} frame={} invalidated ({})",
            e.display,
            e.frame_index,
            reason_name(e.reason),
        );
    }
}
