//! Crate-wide error type.

use derive_more::{Display, Error};

/// Result alias used across the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors reported by construction-time validation and the outer glue.
///
/// The transmission path itself never fails: writes to channels outside the
/// universe are dropped and every tick runs to completion.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A channel number outside `1..=max` was passed to a checked write.
    #[display("channel {channel} is outside 1..={max}")]
    ChannelOutOfRange {
        /// The rejected channel number.
        channel: usize,
        /// Highest channel of the universe.
        max: u16,
    },

    /// The core clock cannot produce a DMX bit period once loop overhead is paid.
    #[display("clock of {clock_hz} Hz is too slow for a 4 us bit period")]
    ClockTooSlow {
        /// Core clock frequency.
        clock_hz: u32,
    },

    /// Integer cycle rounding would put the bit rate outside the 245-255 kbit/s window.
    #[display("bit rate of {bit_rate_hz} bit/s is outside DMX tolerance")]
    BitRateOutOfTolerance {
        /// Bit rate the cycle count would actually produce.
        bit_rate_hz: u32,
    },

    /// A tick budget too small to ever fit the break and start code.
    #[display("tick budget of {bits} bit periods cannot fit a frame start")]
    TickBudgetTooSmall {
        /// Bit periods available per tick.
        bits: u32,
    },

    /// CPU share must be a percentage in 1..=100.
    #[display("cpu share of {percent}% is not in 1..=100")]
    InvalidCpuShare {
        /// The rejected percentage.
        percent: u8,
    },

    /// The serial link reader reported an error.
    #[display("serial link read failed")]
    SerialLink,

    /// Spawning an embassy task failed.
    #[cfg(any(feature = "arm", feature = "riscv"))]
    #[display("task spawn failed")]
    TaskSpawn(#[error(not(source))] embassy_executor::SpawnError),
}
