// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cache-based offload.
//!
//! Layers that did not change since the last committed frame keep what they
//! had: an offloaded layer keeps its pipe, a framebuffer-composed layer stays
//! in the framebuffer, whose pixels are still valid. Changed layers go to
//! fresh pipes. The framebuffer set is then made contiguous:
//!
//! ```text
//!   changed:    .    X    .    .    X
//!   last frame: HW   FB   FB   FB   HW
//!   marked:     HW   HW   FB   FB   HW     (changed layers leave the FB)
//! ```
//!
//! Layers that must be GPU-composed pin the run; the run is widened over
//! them and everything between. Without pinned layers the longest run of
//! unchanged framebuffer layers is kept and the rest move to pipes.

use alloc::vec::Vec;

use super::{CompositionStrategy, Infeasible, StrategyInput, finish};
use crate::display::DisplayKind;
use crate::plan::{FrameInfo, StrategyKind};
use crate::resources::HwResources;

/// Reuses the last committed frame for unchanged layers.
#[derive(Clone, Copy, Debug, Default)]
pub struct CachedOffload;

impl CompositionStrategy for CachedOffload {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Cached
    }

    fn try_apply(
        &self,
        input: &StrategyInput<'_>,
        hw: &mut HwResources,
    ) -> Result<FrameInfo, Infeasible> {
        if !input.config.mixed_mode {
            return Err(Infeasible::MixedModeDisabled);
        }
        if input.kind == DisplayKind::Virtual {
            return Err(Infeasible::VirtualDisplay);
        }
        if input.needs_full_redraw {
            return Err(Infeasible::GeometryChanged);
        }
        if !input.cache.same_shape(input.stats) {
            return Err(Infeasible::CacheMismatch);
        }

        let fb: Vec<bool> = input
            .layers
            .iter()
            .enumerate()
            .map(|(i, l)| {
                input.is_forced_fb(i)
                    || (input.cache.matches(i, l) && !input.cache.was_offloaded(i))
            })
            .collect();
        let run = match input.forced_fb_span() {
            Some((lo, hi)) => Some(widen(&fb, lo, hi)),
            None => longest_run(&fb),
        };

        let mut frame = FrameInfo::new(input.display, input.layers.len());
        for i in 0..input.layers.len() {
            if !run.is_some_and(|(lo, hi)| (lo..=hi).contains(&i)) {
                frame.offload(i);
            }
        }
        frame.map();
        finish(frame, input, hw)
    }
}

/// Extends `lo..=hi` over adjacent framebuffer-marked layers.
fn widen(fb: &[bool], mut lo: usize, mut hi: usize) -> (usize, usize) {
    while lo > 0 && fb[lo - 1] {
        lo -= 1;
    }
    while hi + 1 < fb.len() && fb[hi + 1] {
        hi += 1;
    }
    (lo, hi)
}

/// Longest run of `true`, earliest on ties.
fn longest_run(fb: &[bool]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    let mut start = None;
    for (i, &on) in fb.iter().chain(core::iter::once(&false)).enumerate() {
        match (on, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                if best.is_none_or(|(lo, hi)| i - s > hi - lo + 1) {
                    best = Some((s, i - 1));
                }
                start = None;
            }
            _ => {}
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::layer::{LayerFlags, Transform};
    use crate::strategy::test_support::{Fixture, hw, ui, video};

    /// Commits `plan` for the fixture's current layers.
    fn commit(f: &mut Fixture, plan: &FrameInfo) {
        let layers = f.layers.clone();
        f.cache.update(plan, &layers);
    }

    fn fb_only(n: usize) -> FrameInfo {
        let mut plan = FrameInfo::new(crate::display::DisplayId::PRIMARY, n);
        plan.map();
        plan
    }

    #[test]
    fn runs() {
        assert_eq!(longest_run(&[false, true, true, false, true]), Some((1, 2)));
        assert_eq!(longest_run(&[true, false, true]), Some((0, 0)));
        assert_eq!(longest_run(&[false, false]), None);
        assert_eq!(widen(&[true, false, true, true, false], 2, 2), (2, 3));
        assert_eq!(widen(&[true, true, false], 1, 1), (0, 1));
    }

    #[test]
    fn needs_a_matching_cache() {
        let f = Fixture::new(vec![ui(1, 0.0), ui(2, 200.0)]);
        let mut res = hw(4, 4, 0);
        assert_eq!(CachedOffload.try_apply(&f.input(), &mut res), Err(Infeasible::CacheMismatch));
    }

    #[test]
    fn geometry_change_disables() {
        let mut f = Fixture::new(vec![ui(1, 0.0)]);
        commit(&mut f, &fb_only(1));
        f.needs_full_redraw = true;
        let mut res = hw(4, 4, 0);
        assert_eq!(CachedOffload.try_apply(&f.input(), &mut res), Err(Infeasible::GeometryChanged));
    }

    #[test]
    fn static_frame_stays_in_framebuffer() {
        let mut f = Fixture::new(vec![ui(1, 0.0), ui(2, 200.0)]);
        commit(&mut f, &fb_only(2));
        let mut res = hw(4, 4, 0);
        let plan = CachedOffload.try_apply(&f.input(), &mut res).expect("nothing changed");
        assert_eq!(plan.offloaded_count(), 0);
        assert_eq!(plan.fb_z, Some(0));
    }

    #[test]
    fn changed_layer_leaves_framebuffer() {
        let mut f = Fixture::new(vec![ui(1, 0.0), ui(2, 200.0), ui(3, 400.0)]);
        commit(&mut f, &fb_only(3));
        f.layers[2] = ui(30, 400.0);
        let mut res = hw(4, 4, 0);
        let plan = CachedOffload.try_apply(&f.input(), &mut res).expect("one changed layer");
        assert!(plan.is_fb_composed(0) && plan.is_fb_composed(1));
        assert!(plan.is_offloaded(2));
        assert_eq!(plan.fb_z, Some(0));
        assert_eq!(plan.entry_for(2).map(|e| e.z_order), Some(1));
    }

    #[test]
    fn forced_layer_pins_the_run() {
        // L0 unsupported (rotated RGB), L1 unchanged UI that was offloaded,
        // L2 rotated video with a new buffer.
        let mut f = Fixture::new(vec![
            ui(1, 0.0).with_transform(Transform::ROT_90),
            ui(2, 200.0),
            video(3).with_transform(Transform::ROT_90),
        ]);
        let mut last = FrameInfo::new(crate::display::DisplayId::PRIMARY, 3);
        last.offload(1);
        last.offload(2);
        last.map();
        let mut res = hw(3, 1, 0);
        crate::strategy::bind(&mut last, &f.input(), &mut res).expect("frame N binds");
        let ui_pipe = last.entry_for(1).and_then(|e| e.pipes[0]);
        commit(&mut f, &last);
        res.release_display(crate::display::DisplayId::PRIMARY);

        f.layers[2] = video(4).with_transform(Transform::ROT_90);
        let plan = CachedOffload.try_apply(&f.input(), &mut res).expect("frame N+1 cached");
        assert!(plan.is_fb_composed(0));
        assert_eq!(plan.entry_for(1).and_then(|e| e.pipes[0]), ui_pipe, "UI keeps its pipe");
        assert!(plan.entry_for(1).is_some_and(|e| e.reused));
        let video_entry = plan.entry_for(2).expect("video offloaded");
        assert!(!video_entry.reused);
        assert!(video_entry.rotator.is_some());
    }

    #[test]
    fn skip_layer_between_changes_moves_into_run() {
        let mut f = Fixture::new(vec![ui(1, 0.0), ui(2, 200.0), ui(3, 400.0)]);
        let mut last = FrameInfo::new(crate::display::DisplayId::PRIMARY, 3);
        last.offload(0);
        last.offload(2);
        last.map();
        commit(&mut f, &last);
        f.layers[1] = ui(20, 200.0).with_flags(LayerFlags::SKIP);
        f.stats = crate::stats::classify(&f.layers);
        let mut res = hw(4, 4, 0);
        let plan = CachedOffload.try_apply(&f.input(), &mut res).expect("skip layer goes to GPU");
        assert!(plan.is_offloaded(0) && plan.is_fb_composed(1) && plan.is_offloaded(2));
        assert_eq!(plan.fb_z, Some(1));
    }
}
