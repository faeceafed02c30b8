// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plain-text table of a frame plan.
//!
//! ```text
//! display 0: cached hw=2 fb=2 fb_z=1 redraw=no
//!   idx  fb  pipe       type   z
//!     0  -   VG0        HW     0
//!     1  *   -          CACHE  1
//!     2  *   -          CACHE  1
//!     3  -   RGB1/RGB2  HW     2
//!   fb       RGB0              1
//! ```

use std::io::{self, Write};

use subduction_overlay::pipe::PipeId;
use subduction_overlay::plan::FrameInfo;

fn pipe_list(pipes: &[Option<PipeId>]) -> String {
    let names: Vec<String> = pipes.iter().flatten().map(ToString::to_string).collect();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join("/")
    }
}

fn opt_z(z: Option<u8>) -> String {
    z.map_or_else(|| "-".to_string(), |z| z.to_string())
}

/// Writes `plan` as a table, one row per app layer plus one for the
/// framebuffer target.
///
/// # Errors
///
/// Returns any error from `writer`.
pub fn dump(plan: &FrameInfo, writer: &mut dyn Write) -> io::Result<()> {
    writeln!(
        writer,
        "display {}: {} hw={} fb={} fb_z={} redraw={}",
        plan.display,
        plan.strategy.name(),
        plan.offloaded_count(),
        plan.fb_count(),
        opt_z(plan.fb_z),
        if plan.fb_needs_redraw { "yes" } else { "no" },
    )?;
    writeln!(writer, "  {:>3}  {:<2}  {:<10} {:<6} {}", "idx", "fb", "pipe", "type", "z")?;
    for i in 0..plan.layer_count() {
        let (fb, pipes, kind, z) = match plan.entry_for(i) {
            Some(entry) => ("-", pipe_list(&entry.pipes), "HW", entry.z_order.to_string()),
            None => {
                let kind = if plan.fb_needs_redraw { "GPU" } else { "CACHE" };
                ("*", "-".to_string(), kind, opt_z(plan.fb_z))
            }
        };
        writeln!(writer, "  {i:>3}  {fb:<2}  {pipes:<10} {kind:<6} {z}")?;
    }
    if let Some(z) = plan.fb_z {
        writeln!(
            writer,
            "  {:>3}  {:<2}  {:<10} {:<6} {z}",
            "fb",
            "",
            pipe_list(&plan.fb_pipes),
            "",
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use subduction_overlay::display::DisplayId;
    use subduction_overlay::pipe::PipeClass;
    use subduction_overlay::plan::StrategyKind;

    use super::*;

    fn render(plan: &FrameInfo) -> String {
        let mut out = Vec::new();
        dump(plan, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn header_and_rows() {
        let mut plan = FrameInfo::new(DisplayId::PRIMARY, 3);
        plan.offload(0);
        plan.map();
        plan.strategy = StrategyKind::Cached;
        plan.fb_needs_redraw = false;
        plan.fb_pipes[0] = Some(PipeId {
            class: PipeClass::General,
            index: 0,
        });

        let text = render(&plan);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6, "header, columns, 3 layers, fb:\n{text}");
        assert!(lines[0].starts_with("display 0: cached hw=1 fb=2 fb_z=1 redraw=no"));
        assert!(lines[2].contains("HW"), "{text}");
        assert!(lines[3].contains("CACHE"), "{text}");
        assert!(lines[5].contains("RGB0"), "{text}");
    }

    #[test]
    fn gpu_rows_when_redrawing() {
        let mut plan = FrameInfo::new(DisplayId::EXTERNAL, 2);
        plan.map();
        let text = render(&plan);
        assert!(text.starts_with("display 1: no-offload hw=0 fb=2 fb_z=0 redraw=yes"));
        assert_eq!(text.matches("GPU").count(), 2, "{text}");
        assert!(!text.contains("CACHE"));
    }

    #[test]
    fn fully_offloaded_has_no_fb_row() {
        let mut plan = FrameInfo::new(DisplayId::PRIMARY, 2);
        plan.offload(0);
        plan.offload(1);
        plan.map();
        plan.strategy = StrategyKind::Full;
        let text = render(&plan);
        assert!(text.contains("fb_z=-"), "{text}");
        assert_eq!(text.lines().count(), 4, "{text}");
    }
}
