//! Vertical-blank tick counter.
//!
//! The interrupt handler calls [`VblankCounter::tick`] once per frame; the
//! main program waits on the low byte of the counter changing.

use std::sync::atomic::{AtomicU16, Ordering};

/// Frame counter shared by the vertical-blank interrupt and the launcher.
pub static VBLANK_TICKS: VblankCounter = VblankCounter::new();

#[derive(Debug, Default)]
pub struct VblankCounter {
    ticks: AtomicU16,
}

impl VblankCounter {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU16::new(0),
        }
    }

    /// Interrupt side: count one frame.
    pub fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Release);
    }

    pub fn ticks(&self) -> u16 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Block until the next frame, calling `halt` between polls.
    ///
    /// There is no timeout. With interrupts off this never returns.
    pub fn wait_for_vblank(&self, mut halt: impl FnMut()) {
        let start = self.ticks() as u8;
        while self.ticks() as u8 == start {
            halt();
        }
    }
}
