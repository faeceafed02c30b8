// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding a mapped plan to concrete pipes and rotator sessions.
//!
//! Binding runs in three passes:
//!
//! 1. **Reuse.** Unchanged layers (and the framebuffer target) try to take
//!    back the exact pipes they held last frame.
//! 2. **Rotators.** Layers that need pre-rotation reserve a session.
//! 3. **Fresh.** Everything still unbound requests a pipe per mixer, most
//!    constrained request first.
//!
//! If the fresh pass runs dry after some pipes were reused, the display's
//! pipes are released and binding retries once without reuse.

use alloc::vec::Vec;

use super::{Infeasible, StrategyInput};
use crate::layer::Transform;
use crate::pipe::{MAX_MIXERS, Mixer, PipeId, PipeRequest};
use crate::plan::FrameInfo;
use crate::resources::HwResources;

/// Something that needs a pipe on one mixer.
#[derive(Clone, Copy, Debug)]
enum Slot {
    Entry(usize),
    Framebuffer,
}

/// Binds every entry and the framebuffer target of a mapped plan.
pub(crate) fn bind(
    frame: &mut FrameInfo,
    input: &StrategyInput<'_>,
    hw: &mut HwResources,
) -> Result<(), Infeasible> {
    let reuse = input.cache.is_valid() && !input.needs_full_redraw;
    match bind_pass(frame, input, hw, reuse) {
        Err(Infeasible::PipesExhausted(_)) if reuse => {
            hw.release_display(input.display);
            clear_bindings(frame);
            bind_pass(frame, input, hw, false)
        }
        result => result,
    }
}

fn clear_bindings(frame: &mut FrameInfo) {
    frame.fb_pipes = [None; MAX_MIXERS];
    for entry in frame.entries_mut() {
        entry.pipes = [None; MAX_MIXERS];
        entry.rotator = None;
        entry.reused = false;
    }
}

fn bind_pass(
    frame: &mut FrameInfo,
    input: &StrategyInput<'_>,
    hw: &mut HwResources,
    reuse: bool,
) -> Result<(), Infeasible> {
    let display = input.display;
    let geometry = input.geometry;

    if reuse {
        for entry in frame.entries_mut() {
            let layer = &input.layers[entry.layer];
            if !input.cache.matches(entry.layer, layer) {
                continue;
            }
            let Some(cached) = input.cache.pipes(entry.layer) else {
                continue;
            };
            let wanted = Mixer::ALL.map(|m| geometry.covers(m, layer.display_frame));
            let same_mixers = Mixer::ALL
                .iter()
                .all(|m| wanted[m.index()] == cached[m.index()].is_some());
            if same_mixers && take_exact(hw, input, cached) {
                entry.pipes = cached;
                entry.reused = true;
            }
        }
        if frame.fb_z.is_some() {
            let cached = input.cache.fb_pipes();
            let same_mixers = geometry
                .mixers()
                .all(|m| cached[m.index()].is_some());
            if same_mixers && take_exact(hw, input, cached) {
                frame.fb_pipes = cached;
            }
        }
    }

    for entry in frame.entries_mut() {
        let layer = &input.layers[entry.layer];
        if input.needs_rotator(layer) {
            let session = hw
                .rotators
                .reserve(display, entry.layer, layer)
                .ok_or(Infeasible::RotatorUnavailable(entry.layer))?;
            entry.rotator = Some(session);
        }
    }

    let mut work: Vec<(u8, Slot, Mixer, PipeRequest)> = Vec::new();
    for (idx, entry) in frame.entries().iter().enumerate() {
        if entry.reused {
            continue;
        }
        let layer = &input.layers[entry.layer];
        let request = if layer.is_video() {
            PipeRequest::Video
        } else if input.config.blit_for_unscaled && !layer.needs_scaling() {
            PipeRequest::Blit
        } else {
            PipeRequest::Any
        };
        for mixer in geometry.mixers() {
            if geometry.covers(mixer, layer.display_frame) {
                work.push((request.strictness(), Slot::Entry(idx), mixer, request));
            }
        }
    }
    if frame.fb_z.is_some() {
        for mixer in geometry.mixers() {
            if frame.fb_pipes[mixer.index()].is_none() {
                // Served right after video requests.
                work.push((
                    PipeRequest::General.strictness(),
                    Slot::Framebuffer,
                    mixer,
                    PipeRequest::Any,
                ));
            }
        }
    }
    work.sort_by_key(|(strictness, ..)| *strictness);

    for (_, slot, mixer, request) in work {
        let pipe = hw
            .pipes
            .acquire(display, request, mixer)
            .ok_or(Infeasible::PipesExhausted(mixer))?;
        match slot {
            Slot::Entry(idx) => frame.entries_mut()[idx].pipes[mixer.index()] = Some(pipe),
            Slot::Framebuffer => frame.fb_pipes[mixer.index()] = Some(pipe),
        }
    }

    for entry in frame.entries_mut() {
        let layer = &input.layers[entry.layer];
        entry.swap_halves = entry.pipes.iter().all(Option::is_some)
            && layer.transform.contains(Transform::FLIP_H)
            && entry.rotator.is_none();
    }
    Ok(())
}

/// Takes back every cached pipe or none of them.
fn take_exact(
    hw: &mut HwResources,
    input: &StrategyInput<'_>,
    cached: [Option<PipeId>; MAX_MIXERS],
) -> bool {
    let mut taken: Vec<PipeId> = Vec::new();
    for mixer in Mixer::ALL {
        let Some(pipe) = cached[mixer.index()] else {
            continue;
        };
        if hw.pipes.acquire_exact(input.display, pipe, mixer) {
            taken.push(pipe);
        } else {
            for p in taken {
                hw.pipes.release(input.display, p);
            }
            return false;
        }
    }
    true
}
