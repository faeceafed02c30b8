// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated refresh loop over a phone panel and a hot-plugged TV.
//!
//! Runs a dozen frames through an [`OverlayHost`]: a playing video on the
//! panel, a TV connected mid-stream, an idle stretch, and a pause/resume of
//! the TV. Trace events go to stdout through a
//! [`PrettyPrintSink`](subduction_overlay_debug::pretty::PrettyPrintSink) and
//! to `overlay_trace.jsonl` through a
//! [`JsonLinesSink`](subduction_overlay_debug::json::JsonLinesSink); each
//! panel plan is dumped as a table.
//!
//! Run with `RUST_LOG=debug` to see the host's lifecycle logging as well.

use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::thread;
use std::time::Duration;

use kurbo::Rect;
use subduction_overlay::composer::FrameFlags;
use subduction_overlay::config::ComposerConfig;
use subduction_overlay::display::{DisplayGeometry, DisplayId, DisplayKind};
use subduction_overlay::layer::{Buffer, Layer};
use subduction_overlay::pipe::PipeInventory;
use subduction_overlay::trace::{
    CacheInvalidatedEvent, CommitEvent, FramePlanEvent, PrepareEvent, StrategyAttemptEvent,
    TraceSink,
};
use subduction_overlay_debug::dump::dump;
use subduction_overlay_debug::json::JsonLinesSink;
use subduction_overlay_debug::pretty::PrettyPrintSink;
use subduction_overlay_host::host::{DisplayFrame, OverlayHost};

const FRAME_COUNT: u64 = 12;
const PANEL: DisplayGeometry = DisplayGeometry::new(1080, 1920);
const TV: DisplayGeometry = DisplayGeometry::new(1920, 1080);
const IDLE_TIMEOUT: Duration = Duration::from_millis(40);

/// Forwards every event to two sinks.
#[derive(Debug)]
struct Tee<A, B>(A, B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_prepare(&mut self, e: &PrepareEvent) {
        self.0.on_prepare(e);
        self.1.on_prepare(e);
    }

    fn on_strategy_attempt(&mut self, e: &StrategyAttemptEvent) {
        self.0.on_strategy_attempt(e);
        self.1.on_strategy_attempt(e);
    }

    fn on_frame_plan(&mut self, e: &FramePlanEvent) {
        self.0.on_frame_plan(e);
        self.1.on_frame_plan(e);
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.0.on_commit(e);
        self.1.on_commit(e);
    }

    fn on_cache_invalidated(&mut self, e: &CacheInvalidatedEvent) {
        self.0.on_cache_invalidated(e);
        self.1.on_cache_invalidated(e);
    }
}

fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
    Rect::new(x, y, x + w, y + h)
}

/// Wallpaper, a video that gets a new buffer every frame, and two bars.
fn panel_frame(frame: u64) -> Vec<Layer> {
    let (w, h) = (f64::from(PANEL.width), f64::from(PANEL.height));
    vec![
        Layer::new(Buffer::rgb(1), rect(0.0, 0.0, w, h), rect(0.0, 0.0, w, h)),
        Layer::new(
            Buffer::yuv(1000 + frame),
            rect(0.0, 0.0, 1920.0, 1080.0),
            rect(0.0, 600.0, w, 608.0),
        ),
        Layer::new(Buffer::rgb(2), rect(0.0, 0.0, w, 72.0), rect(0.0, 0.0, w, 72.0)),
        Layer::new(
            Buffer::rgb(3),
            rect(0.0, 0.0, w, 144.0),
            rect(0.0, h - 144.0, w, 144.0),
        ),
        Layer::framebuffer_target(PANEL.bounds()),
    ]
}

/// The same video, mirrored full screen.
fn tv_frame(frame: u64) -> Vec<Layer> {
    let (w, h) = (f64::from(TV.width), f64::from(TV.height));
    vec![
        Layer::new(
            Buffer::yuv(1000 + frame),
            rect(0.0, 0.0, w, h),
            rect(0.0, 0.0, w, h),
        ),
        Layer::new(Buffer::rgb(50), rect(0.0, 0.0, 400.0, 80.0), rect(40.0, 40.0, 400.0, 80.0)),
        Layer::framebuffer_target(TV.bounds()),
    ]
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut config = ComposerConfig::mdss();
    config.idle_timeout = Some(IDLE_TIMEOUT);
    let host = OverlayHost::new(config, PipeInventory::mdss(), 2, || {
        log::info!("idle timeout, next frame falls back to the GPU");
    })?;

    let trace_path = "overlay_trace.jsonl";
    let json = JsonLinesSink::new(BufWriter::new(File::create(trace_path)?));
    let pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    host.set_sink(Box::new(Tee(pretty, json)));

    host.init_display(DisplayId::PRIMARY, DisplayKind::Primary, PANEL)?;

    let mut stdout = std::io::stdout();
    let mut tv_attached = false;
    for frame in 0..FRAME_COUNT {
        match frame {
            3 => {
                host.init_display(DisplayId::EXTERNAL, DisplayKind::External, TV)?;
                tv_attached = true;
            }
            7 => {
                // Nothing commits for longer than the idle timeout.
                thread::sleep(IDLE_TIMEOUT * 3);
            }
            9 => {
                host.pause(DisplayId::EXTERNAL)?;
                tv_attached = false;
            }
            10 => {
                host.resume(DisplayId::EXTERNAL)?;
                tv_attached = true;
            }
            _ => {}
        }

        writeln!(stdout, "\n== frame {frame} ==")?;
        let mut panel = panel_frame(frame);
        let mut tv = tv_frame(frame);
        let mut frames = vec![DisplayFrame {
            display: DisplayId::PRIMARY,
            layers: &mut panel,
            flags: FrameFlags::default(),
        }];
        if tv_attached {
            frames.push(DisplayFrame {
                display: DisplayId::EXTERNAL,
                layers: &mut tv,
                flags: FrameFlags::default(),
            });
        }
        let displays: Vec<DisplayId> = frames.iter().map(|f| f.display).collect();
        let plans = host.prepare_all(&mut frames);

        for (display, plan) in displays.into_iter().zip(plans) {
            let plan = plan?;
            if display == DisplayId::PRIMARY {
                dump(&plan, &mut stdout)?;
            }
            host.commit(display)?;
        }
    }

    host.disconnect(DisplayId::EXTERNAL)?;
    host.disconnect(DisplayId::PRIMARY)?;
    let hw = host.hw_snapshot();
    writeln!(
        stdout,
        "\n{} of {} pipes free after disconnect",
        hw.pipes.free(),
        hw.pipes.len()
    )?;
    writeln!(stdout, "Wrote {trace_path} ({FRAME_COUNT} frames)")?;
    Ok(())
}
