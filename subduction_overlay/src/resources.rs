// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared hardware inventory.

use crate::display::DisplayId;
use crate::pipe::{PipeInventory, PipePool};
use crate::rotator::RotatorPool;

/// Pipes and rotator sessions shared by every display.
///
/// A single instance exists per device. Displays plan one at a time against
/// it; the host serializes access.
#[derive(Clone, Debug)]
pub struct HwResources {
    /// Overlay pipes.
    pub pipes: PipePool,
    /// Rotator sessions.
    pub rotators: RotatorPool,
}

impl HwResources {
    /// Creates an inventory with everything free.
    #[must_use]
    pub fn new(inventory: PipeInventory, rotator_sessions: usize) -> Self {
        Self {
            pipes: PipePool::new(inventory),
            rotators: RotatorPool::new(rotator_sessions),
        }
    }

    /// Frees every pipe and rotator session held by `display`.
    pub fn release_display(&mut self, display: DisplayId) {
        self.pipes.release_all(display);
        self.rotators.release_all(display);
    }
}
