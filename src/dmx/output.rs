//! The tick half of the engine: pins, bit clock, frame cursor and per-tick budget.

use core::convert::Infallible;

use embassy_time::Duration;
use embedded_hal::digital::{OutputPin, PinState};

use super::slot::drive;
use super::{
    Advance, BitClock, DMX_BIT_RATE, DMX_SIZE, FRAME_START_BITS, FrameCursor, FrameUnit,
    START_CODE, Universe, transmit_break, transmit_slot,
};
use crate::{Error, Result};

/// Share of each tick the engine may spend on the wire, in percent.
///
/// A larger share gives a faster frame rate but lengthens the stretch in which other
/// work waits on the tick. 25% keeps most of the CPU free.
pub const CPU_SHARE_PERCENT_DEFAULT: u8 = 25;

/// How many bit periods of wire time one tick may use.
///
/// Budget is checked before each unit (frame start or channel slot) and never in the
/// middle of one, so a tick can overrun by nothing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickBudget {
    bits_per_tick: u16,
}

impl TickBudget {
    /// Budget of exactly `bits_per_tick` bit periods.
    ///
    /// # Errors
    ///
    /// [`Error::TickBudgetTooSmall`] if the break and start code would never fit.
    pub const fn from_bits(bits_per_tick: u16) -> Result<Self> {
        if bits_per_tick < FRAME_START_BITS {
            return Err(Error::TickBudgetTooSmall {
                bits: bits_per_tick as u32,
            });
        }
        Ok(Self { bits_per_tick })
    }

    /// Budget for ticks arriving every `period`, using `cpu_share_percent` of each.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCpuShare`] for a share outside `1..=100`, or
    /// [`Error::TickBudgetTooSmall`] if the resulting budget cannot fit a frame start.
    pub fn from_tick_period(period: Duration, cpu_share_percent: u8) -> Result<Self> {
        let bits_per_period = period
            .as_micros()
            .saturating_mul(u64::from(DMX_BIT_RATE))
            / 1_000_000;
        Self::from_available_bits(bits_per_period, cpu_share_percent)
    }

    /// Budget for a hardware timer that fires every `cycles_per_tick` core cycles.
    ///
    /// An AVR at 16 MHz with a /64 phase-correct timer overflows every 64 * 510 cycles,
    /// which is 510 bit periods; a 25% share of that leaves 127 per tick.
    ///
    /// # Errors
    ///
    /// As for [`from_tick_period`](Self::from_tick_period), plus
    /// [`Error::ClockTooSlow`] for a zero clock.
    pub fn from_timer(clock_hz: u32, cycles_per_tick: u32, cpu_share_percent: u8) -> Result<Self> {
        if clock_hz == 0 {
            return Err(Error::ClockTooSlow { clock_hz });
        }
        let bits_per_period = u64::from(cycles_per_tick)
            .saturating_mul(u64::from(DMX_BIT_RATE))
            / u64::from(clock_hz);
        Self::from_available_bits(bits_per_period, cpu_share_percent)
    }

    fn from_available_bits(bits_per_period: u64, cpu_share_percent: u8) -> Result<Self> {
        if !(1..=100).contains(&cpu_share_percent) {
            return Err(Error::InvalidCpuShare {
                percent: cpu_share_percent,
            });
        }
        let bits = bits_per_period.saturating_mul(u64::from(cpu_share_percent)) / 100;
        match u16::try_from(bits) {
            Ok(bits) => Self::from_bits(bits),
            Err(_) => Ok(Self {
                bits_per_tick: u16::MAX,
            }),
        }
    }

    /// Bit periods available per tick.
    #[must_use]
    pub const fn bits_per_tick(self) -> u16 {
        self.bits_per_tick
    }
}

/// What one call to [`DmxOutput::on_tick`] did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Another tick was already running on this universe; nothing was done.
    Reentered,
    /// The engine is stopped or has no active channels; nothing was done.
    Stopped,
    /// The engine ran.
    Ran(TickReport),
}

/// Work done by a tick that ran.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    /// Slots put on the wire, counting the start code.
    pub slots_sent: u16,
    /// Bit periods of budget consumed.
    pub bits_used: u16,
    /// Whether this tick finished a frame.
    pub frame_completed: bool,
}

/// The tick half of a DMX engine.
///
/// Owns the data line, the frame-marker line and the [`BitClock`]. Call
/// [`on_tick`](Self::on_tick) from the periodic interrupt or task. The marker line
/// goes low while channel slots are going out and high once a frame completes.
///
/// See the [module documentation](mod@crate::dmx) for usage.
pub struct DmxOutput<'a, D, M, C, const N: usize = DMX_SIZE> {
    universe: &'a Universe<N>,
    data: D,
    marker: M,
    clock: C,
    budget: TickBudget,
    cursor: FrameCursor,
    // Epoch whose start has been applied to the lines; `None` before the first start.
    applied_epoch: Option<u32>,
}

impl<'a, D, M, C, const N: usize> DmxOutput<'a, D, M, C, N>
where
    D: OutputPin<Error = Infallible>,
    M: OutputPin<Error = Infallible>,
    C: BitClock,
{
    /// Create the tick half for `universe`. Lines are configured on the first tick
    /// after the engine starts.
    pub const fn new(
        universe: &'a Universe<N>,
        data: D,
        marker: M,
        clock: C,
        budget: TickBudget,
    ) -> Self {
        Self {
            universe,
            data,
            marker,
            clock,
            budget,
            cursor: FrameCursor::new(),
            applied_epoch: None,
        }
    }

    /// Replace the data and marker lines, returning the previous pair.
    ///
    /// While the engine runs, the new lines are driven idle straight away and the
    /// current frame restarts from the break. The active channel count is kept.
    pub fn configure_pins(&mut self, data: D, marker: M) -> (D, M) {
        let old_data = core::mem::replace(&mut self.data, data);
        let old_marker = core::mem::replace(&mut self.marker, marker);
        if self.universe.is_started() {
            self.restart_lines(self.universe.epoch());
        } else {
            self.applied_epoch = None;
        }
        #[cfg(feature = "defmt")]
        defmt::info!(
            "DmxOutput: pins reconfigured (running: {})",
            self.universe.is_started()
        );
        (old_data, old_marker)
    }

    /// Run one tick: send as many whole units as the budget allows.
    ///
    /// Stops early once a frame completes; the next frame opens on a later tick.
    /// Re-entrant calls on the same universe return [`TickOutcome::Reentered`]
    /// without touching the wire.
    pub fn on_tick(&mut self) -> TickOutcome {
        let Some(_guard) = self.universe.enter_tick() else {
            return TickOutcome::Reentered;
        };
        if !self.universe.is_started() || self.universe.active_channels() == 0 {
            return TickOutcome::Stopped;
        }
        let epoch = self.universe.epoch();
        if self.applied_epoch != Some(epoch) {
            self.restart_lines(epoch);
        }

        let mut bits_left = self.budget.bits_per_tick();
        let mut report = TickReport::default();
        loop {
            let active_channels = self.universe.active_channels();
            let unit = self.cursor.next_unit(active_channels);
            let cost = unit.bit_cost();
            if bits_left < cost {
                break;
            }
            match unit {
                FrameUnit::FrameStart => {
                    transmit_break(&mut self.data, &mut self.clock);
                    transmit_slot(&mut self.data, &mut self.clock, START_CODE);
                }
                FrameUnit::Channel(channel) => {
                    drive(&mut self.marker, PinState::Low);
                    let value = self.universe.channel(usize::from(channel)).unwrap_or(0);
                    transmit_slot(&mut self.data, &mut self.clock, value);
                }
                FrameUnit::PastEnd => {
                    drive(&mut self.marker, PinState::High);
                    self.cursor.reset();
                    report.frame_completed = true;
                    break;
                }
            }
            bits_left = bits_left.saturating_sub(cost);
            report.bits_used = report.bits_used.saturating_add(cost);
            report.slots_sent = report.slots_sent.saturating_add(1);

            if self.cursor.advance(active_channels) == Advance::FrameComplete {
                drive(&mut self.marker, PinState::High);
                report.frame_completed = true;
                break;
            }
        }

        #[cfg(feature = "defmt")]
        defmt::trace!(
            "DmxOutput: tick sent {} slots, cursor at {}",
            report.slots_sent,
            self.cursor.state()
        );
        TickOutcome::Ran(report)
    }

    fn restart_lines(&mut self, epoch: u32) {
        drive(&mut self.data, PinState::High);
        drive(&mut self.marker, PinState::High);
        self.cursor.reset();
        self.applied_epoch = Some(epoch);
    }

    /// Where the next tick resumes.
    #[must_use]
    pub const fn cursor(&self) -> FrameCursor {
        self.cursor
    }

    /// Current per-tick budget.
    #[must_use]
    pub const fn budget(&self) -> TickBudget {
        self.budget
    }

    /// Change the per-tick budget; takes effect on the next tick.
    pub const fn set_budget(&mut self, budget: TickBudget) {
        self.budget = budget;
    }

    /// The universe this output transmits.
    #[must_use]
    pub const fn universe(&self) -> &'a Universe<N> {
        self.universe
    }

    /// Give back the lines and the clock.
    pub fn release(self) -> (D, M, C) {
        (self.data, self.marker, self.clock)
    }
}
