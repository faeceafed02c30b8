// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON Lines trace output.
//!
//! [`JsonLinesSink`] writes each trace event as one JSON object on its own
//! line, suitable for `jq` or for loading into a notebook:
//!
//! ```text
//! {"event":"prepare","display":0,"frame":1,"layers":3,"geometry_changed":false,"idle":false}
//! {"event":"attempt","display":0,"frame":1,"strategy":"full","rejected":"SkipPresent"}
//! {"event":"plan","display":0,"frame":1,"strategy":"cached","hw":2,"fb":1,...}
//! ```

use std::io::Write;

use serde_json::{Value, json};

use subduction_overlay::trace::{
    CacheInvalidatedEvent, CommitEvent, FramePlanEvent, PrepareEvent, StrategyAttemptEvent,
    TraceSink,
};

/// Writes one JSON object per trace event.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, value: &Value) {
        if serde_json::to_writer(&mut self.writer, value).is_ok() {
            let _ = self.writer.write_all(b"\n");
        }
    }
}

impl<W: Write> TraceSink for JsonLinesSink<W> {
    fn on_prepare(&mut self, e: &PrepareEvent) {
        self.emit(&json!({
            "event": "prepare",
            "display": e.display.0,
            "frame": e.frame_index,
            "layers": e.layer_count,
            "geometry_changed": e.geometry_changed,
            "idle": e.idle_fallback,
        }));
    }

    fn on_strategy_attempt(&mut self, e: &StrategyAttemptEvent) {
        self.emit(&json!({
            "event": "attempt",
            "display": e.display.0,
            "frame": e.frame_index,
            "strategy": e.strategy.name(),
            "rejected": e.rejected.map(|r| format!("{r:?}")),
            "reason": e.rejected.map(|r| r.to_string()),
        }));
    }

    fn on_frame_plan(&mut self, e: &FramePlanEvent) {
        self.emit(&json!({
            "event": "plan",
            "display": e.display.0,
            "frame": e.frame_index,
            "strategy": e.strategy.name(),
            "hw": e.offloaded,
            "fb": e.fb_count,
            "fb_z": e.fb_z,
            "pipes": e.pipes,
            "reused": e.reused,
            "redraw": e.fb_needs_redraw,
        }));
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.emit(&json!({
            "event": "commit",
            "display": e.display.0,
            "frame": e.frame_index,
            "hw": e.offloaded,
            "rearm_idle": e.rearm_idle,
        }));
    }

    fn on_cache_invalidated(&mut self, e: &CacheInvalidatedEvent) {
        self.emit(&json!({
            "event": "invalidate",
            "display": e.display.0,
            "frame": e.frame_index,
            "reason": format!("{:?}", e.reason),
        }));
    }
}

#[cfg(test)]
mod tests {
    use subduction_overlay::display::DisplayId;
    use subduction_overlay::plan::StrategyKind;
    use subduction_overlay::strategy::Infeasible;
    use subduction_overlay::trace::InvalidationReason;

    use super::*;

    fn lines(sink: JsonLinesSink<Vec<u8>>) -> Vec<Value> {
        let text = String::from_utf8(sink.into_inner()).unwrap();
        text.lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn one_object_per_event() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.on_prepare(&PrepareEvent {
            display: DisplayId::PRIMARY,
            frame_index: 1,
            layer_count: 3,
            geometry_changed: true,
            idle_fallback: false,
        });
        sink.on_strategy_attempt(&StrategyAttemptEvent {
            display: DisplayId::PRIMARY,
            frame_index: 1,
            strategy: StrategyKind::Full,
            rejected: Some(Infeasible::SkipPresent),
        });
        sink.on_strategy_attempt(&StrategyAttemptEvent {
            display: DisplayId::PRIMARY,
            frame_index: 1,
            strategy: StrategyKind::Cached,
            rejected: None,
        });
        sink.on_cache_invalidated(&CacheInvalidatedEvent {
            display: DisplayId::EXTERNAL,
            frame_index: 4,
            reason: InvalidationReason::Blank,
        });

        let events = lines(sink);
        assert_eq!(events.len(), 4);
        assert_eq!(events[0]["event"], "prepare");
        assert_eq!(events[0]["layers"], 3);
        assert_eq!(events[1]["rejected"], "SkipPresent");
        assert_eq!(events[1]["reason"], "skip layer present");
        assert!(events[2]["rejected"].is_null());
        assert_eq!(events[3]["display"], 1);
        assert_eq!(events[3]["reason"], "Blank");
    }

    #[test]
    fn plan_carries_pipe_counts() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.on_frame_plan(&FramePlanEvent {
            display: DisplayId::PRIMARY,
            frame_index: 2,
            strategy: StrategyKind::LoadBased,
            offloaded: 3,
            fb_count: 2,
            fb_z: None,
            pipes: [2, 2],
            reused: 0,
            fb_needs_redraw: true,
        });
        sink.on_commit(&CommitEvent {
            display: DisplayId::PRIMARY,
            frame_index: 2,
            offloaded: 3,
            rearm_idle: true,
        });

        let events = lines(sink);
        assert_eq!(events[0]["strategy"], "load-based");
        assert_eq!(events[0]["pipes"], json!([2, 2]));
        assert!(events[0]["fb_z"].is_null());
        assert_eq!(events[1]["event"], "commit");
        assert_eq!(events[1]["rearm_idle"], true);
    }
}
