//! Slot-level waveforms: the break, the mark after break and single 11-bit slots.
//!
//! Every bit is one call to [`BitClock::wait_bits`] after the data line has been set,
//! so the time on the wire depends only on the clock and never on the value sent.

use core::convert::Infallible;

use embedded_hal::digital::{OutputPin, PinState};

use crate::{Error, Result};

/// DMX512 bit rate in bits per second (4 us per bit).
pub const DMX_BIT_RATE: u32 = 250_000;

/// Bit periods in one slot: start bit, 8 data bits, 2 stop bits.
pub const SLOT_BITS: u16 = 11;

/// Bit periods the line is held low for the break (88 us).
///
/// DMX512-A asks transmitters for at least 92 us. 88 us is the DMX512/1990 minimum
/// and is kept so a frame start stays 35 bit periods; receivers accept it in practice.
/// Interrupts can only lengthen the break.
pub const BREAK_BITS: u16 = 22;

/// Bit periods of mark after break (8 us).
pub const MARK_AFTER_BREAK_BITS: u16 = 2;

/// Bit periods to open a frame: break, mark after break and the start code slot.
pub const FRAME_START_BITS: u16 = BREAK_BITS + MARK_AFTER_BREAK_BITS + SLOT_BITS;

/// Start code for dimmer data.
pub const START_CODE: u8 = 0x00;

// Lowest and highest bit rates a receiver must accept (245-255 kbit/s).
const BIT_RATE_MIN: u32 = 245_000;
const BIT_RATE_MAX: u32 = 255_000;

/// Source of bit-period delays for the transmitter.
///
/// On hardware this is [`TimerBitClock`](super::TimerBitClock), which spins on
/// the time driver; in tests it is a simulated clock that samples the line instead
/// of waiting.
pub trait BitClock {
    /// Mark now as the edge the next [`wait_bits`](Self::wait_bits) counts from.
    ///
    /// Called before the first level of every run of bits (a slot, a break, a mark
    /// after break). Clocks that count from each call can leave this empty.
    fn align(&mut self) {}

    /// Wait until `bits` bit periods have passed since the previous edge.
    fn wait_bits(&mut self, bits: u16);
}

impl<C: BitClock + ?Sized> BitClock for &mut C {
    fn align(&mut self) {
        (**self).align();
    }

    fn wait_bits(&mut self, bits: u16) {
        (**self).wait_bits(bits);
    }
}

/// Timer ticks per bit period for a given timer clock.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotTiming {
    clock_hz: u32,
    ticks_per_bit: u32,
}

impl SlotTiming {
    /// Whole ticks per bit for a timer running at `clock_hz`.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockTooSlow`] when a 4 us bit period is shorter than one tick.
    /// - [`Error::BitRateOutOfTolerance`] when rounding to whole ticks leaves the
    ///   245-255 kbit/s window.
    pub const fn from_clock_hz(clock_hz: u32) -> Result<Self> {
        let ticks_per_bit = clock_hz / DMX_BIT_RATE;
        if ticks_per_bit == 0 {
            return Err(Error::ClockTooSlow { clock_hz });
        }
        let bit_rate_hz = clock_hz / ticks_per_bit;
        if bit_rate_hz < BIT_RATE_MIN || bit_rate_hz > BIT_RATE_MAX {
            return Err(Error::BitRateOutOfTolerance { bit_rate_hz });
        }
        Ok(Self {
            clock_hz,
            ticks_per_bit,
        })
    }

    /// Timer clock this timing was derived for.
    #[must_use]
    pub const fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Timer ticks in one bit period.
    #[must_use]
    pub const fn ticks_per_bit(&self) -> u32 {
        self.ticks_per_bit
    }

    /// Bit rate actually produced, after rounding to whole ticks.
    #[must_use]
    pub const fn bit_rate_hz(&self) -> u32 {
        self.clock_hz / self.ticks_per_bit
    }
}

/// The 11 line levels of a slot packed LSB first: bit 0 is the start bit (low),
/// bits 1-8 carry `value` LSB first and bits 9-10 are the stop bits (high).
#[must_use]
pub const fn slot_frame(value: u8) -> u16 {
    const STOP_BITS: u16 = 0b11 << 9;
    ((value as u16) << 1) | STOP_BITS
}

/// Put one slot on the wire with every interrupt masked.
///
/// Runs for exactly [`SLOT_BITS`] bit periods and leaves the line idle-high.
pub fn transmit_slot<D, C>(data: &mut D, clock: &mut C, value: u8)
where
    D: OutputPin<Error = Infallible>,
    C: BitClock,
{
    let frame = slot_frame(value);
    critical_section::with(|_| {
        clock.align();
        for bit in 0..SLOT_BITS {
            drive(data, PinState::from((frame >> bit) & 1 == 1));
            clock.wait_bits(1);
        }
    });
}

/// Hold the line low for the break, then high for the mark after break.
///
/// Interrupts stay enabled: a longer break or mark is still valid DMX.
pub fn transmit_break<D, C>(data: &mut D, clock: &mut C)
where
    D: OutputPin<Error = Infallible>,
    C: BitClock,
{
    clock.align();
    drive(data, PinState::Low);
    clock.wait_bits(BREAK_BITS);
    // An interrupt may have stretched the break; the mark still gets its full length.
    clock.align();
    drive(data, PinState::High);
    clock.wait_bits(MARK_AFTER_BREAK_BITS);
}

pub(crate) fn drive<P: OutputPin<Error = Infallible>>(pin: &mut P, state: PinState) {
    let Ok(()) = pin.set_state(state);
}
