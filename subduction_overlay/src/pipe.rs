// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay pipe inventory.
//!
//! Pipes are the fixed-function hardware units that fetch, scale and convert
//! one layer each. They are a global resource shared by every display: a
//! pipe is either free or owned by exactly one `(display, mixer)` pair.
//!
//! Requests name a pipe *class* preference and fall through to other classes
//! in a fixed order:
//!
//! ```text
//!   Blit    ──► Blit ─► General ─► Video
//!   Any     ──► General ─► Video
//!   General ──► General
//!   Video   ──► Video
//! ```
//!
//! Allocation is first-fit within each class. On top of the inventory each
//! `(display, mixer)` pair is capped at its mixer's `max_per_mixer` ceiling.

use alloc::vec::Vec;
use core::fmt;

use crate::display::DisplayId;

/// Hardware limit on pipes blended by one mixer.
pub const MAX_PIPES_PER_MIXER: usize = 4;

/// Maximum mixers per display.
pub const MAX_MIXERS: usize = 2;

/// Capability class of a pipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipeClass {
    /// RGB pipe with scaling.
    General,
    /// Video-capable pipe (YUV conversion and scaling).
    Video,
    /// Dedicated blit pipe: RGB only, no scaling.
    Blit,
}

/// One of the two blending stages of a display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mixer {
    /// Left half (the only mixer on narrow panels).
    Left,
    /// Right half of a split panel.
    Right,
}

impl Mixer {
    /// Both mixers, left first.
    pub const ALL: [Self; MAX_MIXERS] = [Self::Left, Self::Right];

    /// Index into per-mixer arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// Class preference for an allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipeRequest {
    /// General first, then video.
    Any,
    /// General only.
    General,
    /// Video only.
    Video,
    /// Blit first, then general, then video.
    Blit,
}

impl PipeRequest {
    /// Classes tried, in order.
    #[must_use]
    pub const fn classes(self) -> &'static [PipeClass] {
        match self {
            Self::Any => &[PipeClass::General, PipeClass::Video],
            Self::General => &[PipeClass::General],
            Self::Video => &[PipeClass::Video],
            Self::Blit => &[PipeClass::Blit, PipeClass::General, PipeClass::Video],
        }
    }

    /// Ordering key: requests with fewer fallbacks are served first.
    #[must_use]
    pub const fn strictness(self) -> u8 {
        match self {
            Self::Video => 0,
            Self::General => 1,
            Self::Any => 2,
            Self::Blit => 3,
        }
    }
}

/// Handle to one hardware pipe.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PipeId {
    /// Capability class.
    pub class: PipeClass,
    /// Index within the class.
    pub index: u8,
}

impl fmt::Debug for PipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for PipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.class {
            PipeClass::General => "RGB",
            PipeClass::Video => "VG",
            PipeClass::Blit => "DMA",
        };
        write!(f, "{prefix}{}", self.index)
    }
}

/// How many pipes of each class the hardware has.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipeInventory {
    /// General (RGB) pipes.
    pub general: u8,
    /// Video (VG) pipes.
    pub video: u8,
    /// Blit (DMA) pipes.
    pub blit: u8,
    /// Per-`(display, mixer)` ceiling for each mixer, indexed by
    /// [`Mixer::index`], each at most [`MAX_PIPES_PER_MIXER`].
    pub max_per_mixer: [usize; MAX_MIXERS],
}

impl PipeInventory {
    /// A typical MDSS part: 3 RGB, 3 VG, 2 DMA.
    #[must_use]
    pub const fn mdss() -> Self {
        Self {
            general: 3,
            video: 3,
            blit: 2,
            max_per_mixer: [MAX_PIPES_PER_MIXER; MAX_MIXERS],
        }
    }

    /// An older part: 2 RGB, 2 VG, no blit pipes.
    #[must_use]
    pub const fn legacy() -> Self {
        Self {
            general: 2,
            video: 2,
            blit: 0,
            max_per_mixer: [MAX_PIPES_PER_MIXER; MAX_MIXERS],
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct PipeSlot {
    id: PipeId,
    owner: Option<(DisplayId, Mixer)>,
}

/// Global pipe inventory shared by every display.
///
/// Pipes are bound per frame: a display releases everything it holds before
/// planning its next frame.
#[derive(Clone, Debug)]
pub struct PipePool {
    slots: Vec<PipeSlot>,
    max_per_mixer: [usize; MAX_MIXERS],
}

impl PipePool {
    /// Creates a pool with every pipe free.
    #[must_use]
    pub fn new(inventory: PipeInventory) -> Self {
        let mut slots = Vec::new();
        for (class, count) in [
            (PipeClass::General, inventory.general),
            (PipeClass::Video, inventory.video),
            (PipeClass::Blit, inventory.blit),
        ] {
            for index in 0..count {
                slots.push(PipeSlot {
                    id: PipeId { class, index },
                    owner: None,
                });
            }
        }
        Self {
            slots,
            max_per_mixer: inventory.max_per_mixer.map(|n| n.min(MAX_PIPES_PER_MIXER)),
        }
    }

    /// Binds the first free pipe matching `request` to `(display, mixer)`.
    ///
    /// Returns `None` if no class in the request has a free pipe or the
    /// per-mixer ceiling is reached.
    pub fn acquire(
        &mut self,
        display: DisplayId,
        request: PipeRequest,
        mixer: Mixer,
    ) -> Option<PipeId> {
        if self.held(display, mixer) >= self.capacity(mixer) {
            return None;
        }
        for &class in request.classes() {
            if let Some(slot) = self
                .slots
                .iter_mut()
                .find(|s| s.id.class == class && s.owner.is_none())
            {
                slot.owner = Some((display, mixer));
                return Some(slot.id);
            }
        }
        None
    }

    /// Binds a specific pipe, if it is free and the ceiling allows.
    pub fn acquire_exact(&mut self, display: DisplayId, pipe: PipeId, mixer: Mixer) -> bool {
        if self.held(display, mixer) >= self.capacity(mixer) {
            return false;
        }
        match self
            .slots
            .iter_mut()
            .find(|s| s.id == pipe && s.owner.is_none())
        {
            Some(slot) => {
                slot.owner = Some((display, mixer));
                true
            }
            None => false,
        }
    }

    /// Frees one pipe if `display` owns it.
    pub fn release(&mut self, display: DisplayId, pipe: PipeId) {
        for slot in &mut self.slots {
            if slot.id == pipe && slot.owner.is_some_and(|(d, _)| d == display) {
                slot.owner = None;
            }
        }
    }

    /// Frees every pipe owned by `display`. Returns how many were freed.
    pub fn release_all(&mut self, display: DisplayId) -> usize {
        let mut freed = 0;
        for slot in &mut self.slots {
            if slot.owner.is_some_and(|(d, _)| d == display) {
                slot.owner = None;
                freed += 1;
            }
        }
        freed
    }

    /// Pipes `(display, mixer)` currently holds.
    #[must_use]
    pub fn held(&self, display: DisplayId, mixer: Mixer) -> usize {
        self.slots
            .iter()
            .filter(|s| s.owner == Some((display, mixer)))
            .count()
    }

    /// Free pipes of any class.
    #[must_use]
    pub fn free(&self) -> usize {
        self.slots.iter().filter(|s| s.owner.is_none()).count()
    }

    /// Free pipes of one class.
    #[must_use]
    pub fn free_of(&self, class: PipeClass) -> usize {
        self.slots
            .iter()
            .filter(|s| s.id.class == class && s.owner.is_none())
            .count()
    }

    /// Ceiling of `mixer`, bounded by the total inventory.
    #[must_use]
    pub fn capacity(&self, mixer: Mixer) -> usize {
        self.max_per_mixer[mixer.index()].min(self.slots.len())
    }

    /// How many more pipes `(display, mixer)` could acquire right now.
    #[must_use]
    pub fn available(&self, display: DisplayId, mixer: Mixer) -> usize {
        let headroom = self.capacity(mixer).saturating_sub(self.held(display, mixer));
        headroom.min(self.free())
    }

    /// Current owner of a pipe.
    #[must_use]
    pub fn owner(&self, pipe: PipeId) -> Option<(DisplayId, Mixer)> {
        self.slots.iter().find(|s| s.id == pipe).and_then(|s| s.owner)
    }

    /// Total pipes in the inventory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the inventory has no pipes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
