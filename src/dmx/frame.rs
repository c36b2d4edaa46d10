//! Position within the frame being transmitted, kept across ticks.

use super::{FRAME_START_BITS, SLOT_BITS};

/// The next indivisible piece of work in a frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameUnit {
    /// Break, mark after break and start code.
    FrameStart,
    /// The slot for this channel (1-based).
    Channel(u16),
    /// The cursor sits past the active channel count, which was lowered mid-frame.
    PastEnd,
}

impl FrameUnit {
    /// Bit periods this unit occupies on the wire.
    #[must_use]
    pub const fn bit_cost(self) -> u16 {
        match self {
            Self::FrameStart => FRAME_START_BITS,
            Self::Channel(_) => SLOT_BITS,
            Self::PastEnd => 0,
        }
    }
}

/// What happened to the cursor after a unit went out.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Advance {
    /// More channels remain in this frame.
    Continue,
    /// The last active channel was sent; the next unit opens a new frame.
    FrameComplete,
}

/// Transmission progress: 0 before the break, `k` before channel `k`'s slot.
///
/// There is no terminal state. After the last active channel the cursor wraps back
/// to 0, and it pauses wherever a tick runs out of budget.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameCursor {
    state: u16,
}

impl FrameCursor {
    /// A cursor about to open a frame.
    #[must_use]
    pub const fn new() -> Self {
        Self { state: 0 }
    }

    /// Raw state: 0 for frame start, otherwise the next channel number.
    #[must_use]
    pub const fn state(self) -> u16 {
        self.state
    }

    /// Whether the next unit is the break and start code.
    #[must_use]
    pub const fn is_at_frame_start(self) -> bool {
        self.state == 0
    }

    /// The unit to send next, given the current active channel count.
    #[must_use]
    pub const fn next_unit(self, active_channels: u16) -> FrameUnit {
        match self.state {
            0 => FrameUnit::FrameStart,
            channel if channel <= active_channels => FrameUnit::Channel(channel),
            _ => FrameUnit::PastEnd,
        }
    }

    /// Step past the unit just sent.
    pub const fn advance(&mut self, active_channels: u16) -> Advance {
        let next = self.state.saturating_add(1);
        if next > active_channels {
            self.state = 0;
            Advance::FrameComplete
        } else {
            self.state = next;
            Advance::Continue
        }
    }

    /// Go back to frame start.
    pub const fn reset(&mut self) {
        self.state = 0;
    }
}
