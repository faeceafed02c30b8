// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Idle fallback flag.
//!
//! When nothing has been committed for a while, holding pipes for a static
//! screen wastes power. The idle timer (owned by the host) calls
//! [`IdleFallback::mark_idle`]; the next `prepare` consumes the flag with
//! [`IdleFallback::take`], invalidates the cache and composes the whole frame
//! on the GPU, which lets the pipes go idle.
//!
//! The flag is the only state shared with the timer thread, so it is an
//! atomic rather than part of the composer's lock.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

/// Shared one-shot idle flag for one display.
#[derive(Clone, Debug, Default)]
pub struct IdleFallback {
    fired: Arc<AtomicBool>,
}

impl IdleFallback {
    /// A cleared flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests GPU fallback on the next frame.
    pub fn mark_idle(&self) {
        self.fired.store(true, Ordering::Release);
    }

    /// Consumes the flag. Returns `true` at most once per `mark_idle`.
    pub fn take(&self) -> bool {
        self.fired.swap(false, Ordering::AcqRel)
    }

    /// Returns `true` if a fallback is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_is_one_shot() {
        let flag = IdleFallback::new();
        assert!(!flag.take());
        flag.mark_idle();
        flag.mark_idle();
        assert!(flag.is_pending());
        assert!(flag.take());
        assert!(!flag.take(), "consumed by the first frame");
    }

    #[test]
    fn clones_share_state() {
        let flag = IdleFallback::new();
        let timer_side = flag.clone();
        timer_side.mark_idle();
        assert!(flag.take());
        assert!(!timer_side.is_pending());
    }
}
