// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rotator session bookkeeping.
//!
//! A pipe cannot rotate by 90° and can only downscale so far. The rotator is a
//! separate memory-to-memory engine that pre-rotates (and pre-downscales) a
//! video buffer so the pipe can consume the result. Sessions are scarce and,
//! like pipes, bound per frame to one display.

use alloc::vec;
use alloc::vec::Vec;

use crate::display::DisplayId;
use crate::layer::{Layer, Transform, rect_size};

/// Default number of concurrent rotator sessions.
pub const DEFAULT_ROTATOR_SESSIONS: usize = 2;

/// Handle to one rotator session slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RotatorSessionId(pub u8);

/// A rotator job reserved for one layer in one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotatorSession {
    /// Session slot.
    pub id: RotatorSessionId,
    /// Index of the layer the session serves.
    pub layer: usize,
    /// Transform applied by the rotator. The pipe then scans out unrotated.
    pub transform: Transform,
    /// Input crop size.
    pub source_size: (u32, u32),
    /// Output buffer size fed to the pipe.
    pub output_size: (u32, u32),
}

/// Returns `true` if a layer can only reach a pipe through the rotator.
///
/// That is the case for video with a 90° rotation, or video whose downscale
/// ratio exceeds what a pipe can do alone.
#[must_use]
pub fn needs_rotator(layer: &Layer, max_pipe_downscale: u32) -> bool {
    if !layer.is_video() {
        return false;
    }
    layer.is_rotated_90() || downscale_ratio(layer) > max_pipe_downscale
}

/// Worst-axis downscale factor (rounded up) between oriented crop and frame.
#[must_use]
pub fn downscale_ratio(layer: &Layer) -> u32 {
    let (cw, ch) = layer.oriented_crop_size();
    let (dw, dh) = rect_size(layer.display_frame);
    if dw == 0 || dh == 0 {
        return u32::MAX;
    }
    cw.div_ceil(dw).max(ch.div_ceil(dh))
}

/// Bounded pool of rotator sessions.
#[derive(Clone, Debug)]
pub struct RotatorPool {
    sessions: Vec<Option<(DisplayId, usize)>>,
}

impl RotatorPool {
    /// Creates a pool with `max_sessions` free slots.
    #[must_use]
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: vec![None; max_sessions],
        }
    }

    /// Reserves a session for `layer` (at index `layer_index`) on `display`.
    ///
    /// The output size is the oriented crop: width and height swap under a
    /// 90° rotation.
    pub fn reserve(
        &mut self,
        display: DisplayId,
        layer_index: usize,
        layer: &Layer,
    ) -> Option<RotatorSession> {
        let slot = self.sessions.iter().position(Option::is_none)?;
        let id = RotatorSessionId(u8::try_from(slot).ok()?);
        self.sessions[slot] = Some((display, layer_index));
        let source_size = rect_size(layer.integral_crop());
        Some(RotatorSession {
            id,
            layer: layer_index,
            transform: layer.transform,
            source_size,
            output_size: layer.oriented_crop_size(),
        })
    }

    /// Frees every session held by `display`.
    pub fn release_all(&mut self, display: DisplayId) -> usize {
        let mut freed = 0;
        for s in &mut self.sessions {
            if s.is_some_and(|(d, _)| d == display) {
                *s = None;
                freed += 1;
            }
        }
        freed
    }

    /// Free sessions.
    #[must_use]
    pub fn free(&self) -> usize {
        self.sessions.iter().filter(|s| s.is_none()).count()
    }

    /// Sessions currently held by `display`.
    #[must_use]
    pub fn held(&self, display: DisplayId) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.is_some_and(|(d, _)| d == display))
            .count()
    }
}
