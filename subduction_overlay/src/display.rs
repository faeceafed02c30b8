// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display identification and panel geometry.
//!
//! [`DisplayId`] is a lightweight handle for one of the displays sharing the
//! overlay hardware. [`DisplayGeometry`] describes the panel resolution and
//! how it is split across blending [`Mixer`]s.

use core::fmt;

use kurbo::Rect;

use crate::pipe::Mixer;

/// Number of displays the hardware can drive at once.
pub const MAX_DISPLAYS: usize = 3;

/// Panels wider than this are driven by two mixers.
pub const MAX_SINGLE_MIXER_WIDTH: u32 = 2048;

/// Identifies one display attached to the composition hardware.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DisplayId(pub u32);

impl DisplayId {
    /// The built-in panel.
    pub const PRIMARY: Self = Self(0);
    /// A hot-pluggable external display.
    pub const EXTERNAL: Self = Self(1);
    /// A virtual (write-back) display.
    pub const VIRTUAL: Self = Self(2);

    /// Slot index for per-display tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisplayId({})", self.0)
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of sink a display is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisplayKind {
    /// Built-in panel. Only the primary display may use load-based offload.
    Primary,
    /// External display. Offload is capped and secure buffers stay on the GPU.
    External,
    /// Virtual display. Only video-only offload is attempted.
    Virtual,
}

impl DisplayKind {
    /// Returns `true` for anything other than the built-in panel.
    #[must_use]
    pub const fn is_secondary(self) -> bool {
        !matches!(self, Self::Primary)
    }
}

/// Panel resolution and mixer split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayGeometry {
    /// Panel width in pixels.
    pub width: u32,
    /// Panel height in pixels.
    pub height: u32,
    /// Explicit x coordinate where the left mixer ends, if the panel
    /// is wired as two halves regardless of width.
    pub left_split: Option<u32>,
}

impl DisplayGeometry {
    /// A single-mixer panel of the given size (split automatically if wider
    /// than [`MAX_SINGLE_MIXER_WIDTH`]).
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            left_split: None,
        }
    }

    /// A panel explicitly split at `left_split`.
    #[must_use]
    pub const fn split(width: u32, height: u32, left_split: u32) -> Self {
        Self {
            width,
            height,
            left_split: Some(left_split),
        }
    }

    /// Returns `true` if the panel is driven by two mixers.
    #[must_use]
    pub const fn is_split(&self) -> bool {
        self.left_split.is_some() || self.width > MAX_SINGLE_MIXER_WIDTH
    }

    /// Number of mixers (1 or 2).
    #[must_use]
    pub const fn mixer_count(&self) -> usize {
        if self.is_split() { 2 } else { 1 }
    }

    /// X coordinate separating the left and right mixers.
    #[must_use]
    pub const fn split_x(&self) -> u32 {
        match self.left_split {
            Some(x) => x,
            None => self.width / 2,
        }
    }

    /// The full panel as a rectangle.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Returns `true` if a destination frame needs a pipe on `mixer`.
    ///
    /// On a single-mixer panel everything lands on [`Mixer::Left`].
    #[must_use]
    pub fn covers(&self, mixer: Mixer, frame: Rect) -> bool {
        if !self.is_split() {
            return mixer == Mixer::Left;
        }
        let split = f64::from(self.split_x());
        match mixer {
            Mixer::Left => frame.x0 < split,
            Mixer::Right => frame.x1 > split,
        }
    }

    /// Iterates over the mixers this panel uses.
    pub fn mixers(&self) -> impl Iterator<Item = Mixer> + use<> {
        Mixer::ALL.into_iter().take(self.mixer_count())
    }
}
