// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace sink forwarding composer events to the `log` facade.

use subduction_overlay::trace::{
    CacheInvalidatedEvent, CommitEvent, FramePlanEvent, PrepareEvent, StrategyAttemptEvent,
    TraceSink,
};

/// Logs every event under the `subduction_overlay` target.
///
/// Plans and invalidations go to `debug`, per-strategy attempts and commits
/// to `trace`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

const TARGET: &str = "subduction_overlay";

impl TraceSink for LogSink {
    fn on_prepare(&mut self, e: &PrepareEvent) {
        log::trace!(
            target: TARGET,
            "display {} frame {}: prepare layers={} geometry_changed={} idle={}",
            e.display,
            e.frame_index,
            e.layer_count,
            e.geometry_changed,
            e.idle_fallback,
        );
    }

    fn on_strategy_attempt(&mut self, e: &StrategyAttemptEvent) {
        match e.rejected {
            Some(reason) => log::trace!(
                target: TARGET,
                "display {} frame {}: {} rejected: {reason}",
                e.display,
                e.frame_index,
                e.strategy.name(),
            ),
            None => log::trace!(
                target: TARGET,
                "display {} frame {}: {} accepted",
                e.display,
                e.frame_index,
                e.strategy.name(),
            ),
        }
    }

    fn on_frame_plan(&mut self, e: &FramePlanEvent) {
        log::debug!(
            target: TARGET,
            "display {} frame {}: {} hw={} fb={} fb_z={:?} pipes={:?} reused={} redraw={}",
            e.display,
            e.frame_index,
            e.strategy.name(),
            e.offloaded,
            e.fb_count,
            e.fb_z,
            e.pipes,
            e.reused,
            e.fb_needs_redraw,
        );
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        log::trace!(
            target: TARGET,
            "display {} frame {}: commit hw={} rearm_idle={}",
            e.display,
            e.frame_index,
            e.offloaded,
            e.rearm_idle,
        );
    }

    fn on_cache_invalidated(&mut self, e: &CacheInvalidatedEvent) {
        log::debug!(
            target: TARGET,
            "display {} frame {}: cache invalidated ({:?})",
            e.display,
            e.frame_index,
            e.reason,
        );
    }
}
