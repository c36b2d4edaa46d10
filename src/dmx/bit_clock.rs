//! Bit clock paced by the embassy time driver.
//!
//! Each bit edge is placed on an absolute deadline counted in timer ticks, so the
//! time spent writing pins and looping is absorbed instead of added to every bit.
//! On the Pico the time driver is the 1 MHz system timer, shared by the Cortex-M0+,
//! the Cortex-M33 and the Hazard3 cores alike: 4 ticks per bit on every board.

use embassy_time::{Duration, Instant, TICK_HZ};

use super::{BitClock, SlotTiming};
use crate::Result;

/// A [`BitClock`] that spins on [`Instant::now`] until each bit edge is due.
///
/// Edges land within one poll of `Instant::now` after their timer tick, and the
/// error never accumulates across a slot because every deadline is measured from
/// the edge [`align`](BitClock::align) fixed, not from the previous return.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerBitClock {
    ticks_per_bit: u32,
    edge: Instant,
}

impl TimerBitClock {
    /// Clock for the time driver linked into this build.
    ///
    /// # Errors
    ///
    /// See [`SlotTiming::from_clock_hz`]; the tick rate must divide into 4 us bits
    /// closely enough to stay within DMX tolerance.
    pub fn new() -> Result<Self> {
        let tick_hz = u32::try_from(TICK_HZ).unwrap_or(u32::MAX);
        Ok(Self::from_timing(SlotTiming::from_clock_hz(tick_hz)?))
    }

    /// Clock that waits `timing.ticks_per_bit()` time-driver ticks per bit.
    ///
    /// `timing` must describe the time driver's tick rate, not the core clock.
    #[must_use]
    pub const fn from_timing(timing: SlotTiming) -> Self {
        Self {
            ticks_per_bit: timing.ticks_per_bit(),
            edge: Instant::from_ticks(0),
        }
    }

    /// Time-driver ticks in one bit period.
    #[must_use]
    pub const fn ticks_per_bit(&self) -> u32 {
        self.ticks_per_bit
    }

    /// The edge the last wait ended on.
    #[must_use]
    pub const fn edge(&self) -> Instant {
        self.edge
    }
}

impl BitClock for TimerBitClock {
    fn align(&mut self) {
        // Start on a fresh tick so the first bit is a whole period long.
        let start = Instant::now();
        let mut now = start;
        while now <= start {
            core::hint::spin_loop();
            now = Instant::now();
        }
        self.edge = now;
    }

    fn wait_bits(&mut self, bits: u16) {
        let ticks = u64::from(self.ticks_per_bit).saturating_mul(u64::from(bits));
        self.edge = self.edge.saturating_add(Duration::from_ticks(ticks));
        while Instant::now() < self.edge {
            core::hint::spin_loop();
        }
    }
}
