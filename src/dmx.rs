//! A device abstraction for a bit-banged DMX512 output line.
//!
//! The engine is split in two halves that share one [`Universe`]:
//!
//! - [`Dmx`] is the foreground half. It writes channel values, sets the active
//!   channel count and starts or stops the engine through a [`TickSource`].
//! - [`DmxOutput`] is the tick half. It owns the data and frame-marker pins and the
//!   [`BitClock`], and moves the frame forward each time
//!   [`on_tick`](DmxOutput::on_tick) is called from a periodic interrupt or task.
//!
//! Neither half locks the other. Channel values are single atomic bytes, so a frame
//! may mix old and new values when a write races a transmission.
//!
//! # Example
//!
//! ```rust,ignore
//! use dmx_envoy::dmx::{
//!     CPU_SHARE_PERCENT_DEFAULT, Dmx, DmxOutput, SignalTickSource, TickBudget, TickSignal,
//!     TimerBitClock, Universe, run_tick_loop,
//! };
//! use embassy_rp::gpio::{Level, Output};
//! use embassy_time::Duration;
//!
//! static UNIVERSE: Universe = Universe::new();
//! static TICK_SIGNAL: TickSignal = TickSignal::new();
//!
//! async fn example(p: embassy_rp::Peripherals) -> dmx_envoy::Result<()> {
//!     let budget = TickBudget::from_tick_period(Duration::from_millis(2), CPU_SHARE_PERCENT_DEFAULT)?;
//!     let mut output = DmxOutput::new(
//!         &UNIVERSE,
//!         Output::new(p.PIN_3, Level::High), // data line
//!         Output::new(p.PIN_4, Level::High), // frame marker
//!         TimerBitClock::new()?,
//!         budget,
//!     );
//!
//!     let mut dmx = Dmx::new(&UNIVERSE, SignalTickSource::new(&TICK_SIGNAL));
//!     dmx.write(1, 255); // starts the engine
//!     dmx.write(5, 128);
//!
//!     run_tick_loop(&mut output, &TICK_SIGNAL, Duration::from_millis(2)).await
//! }
//! ```

mod bit_clock;
mod frame;
mod output;
mod serial_link;
mod slot;
mod tick_task;
mod universe;

pub use bit_clock::TimerBitClock;
pub use frame::{Advance, FrameCursor, FrameUnit};
pub use output::{CPU_SHARE_PERCENT_DEFAULT, DmxOutput, TickBudget, TickOutcome, TickReport};
pub use serial_link::{
    ChannelWrite, LINK_ESCAPED_VALUE, LINK_FRAME_CAPACITY, LINK_FRAME_START, LinkDecoder,
    encode_link_frame, run_serial_link,
};
pub use slot::{
    BREAK_BITS, BitClock, DMX_BIT_RATE, FRAME_START_BITS, MARK_AFTER_BREAK_BITS, SLOT_BITS,
    START_CODE, SlotTiming, slot_frame, transmit_break, transmit_slot,
};
pub use tick_task::{SignalTickSource, TickSignal, run_tick_loop};
pub use universe::{ACTIVE_CHANNELS_DEFAULT, FrameBuffer, TickGuard, Universe};

/// Channels in a full universe.
pub const DMX_SIZE: usize = 512;

/// Channels in a universe sized for parts with little RAM.
pub const DMX_SIZE_SMALL: usize = 128;

/// The periodic trigger that drives [`DmxOutput::on_tick`].
///
/// Implemented by whatever owns the hardware timer (or timed task). [`Dmx`] enables it
/// when the engine starts and disables it when the engine stops.
pub trait TickSource {
    /// Start delivering ticks.
    fn enable(&mut self);

    /// Stop delivering ticks. A tick already in progress runs to completion.
    fn disable(&mut self);
}

/// Foreground control of a DMX universe: channel writes and engine lifecycle.
///
/// See the [module documentation](mod@crate::dmx) for usage.
pub struct Dmx<'a, T: TickSource, const N: usize = DMX_SIZE> {
    universe: &'a Universe<N>,
    tick_source: T,
}

impl<'a, T: TickSource, const N: usize> Dmx<'a, T, N> {
    /// Create the controller for `universe`. The engine stays stopped until the first
    /// write or a positive [`set_active_channel_count`](Self::set_active_channel_count).
    pub const fn new(universe: &'a Universe<N>, tick_source: T) -> Self {
        Self {
            universe,
            tick_source,
        }
    }

    /// Set channel `channel` (1-based) to `value`, starting the engine if needed.
    ///
    /// Channels outside `1..=N` are ignored and do not start the engine. Writing past
    /// the active channel count raises it to `channel`; it is never lowered here.
    pub fn write(&mut self, channel: usize, value: u8) {
        if !self.universe.set_channel(channel, value) {
            return;
        }
        if !self.universe.is_started() {
            self.start();
        }
    }

    /// Like [`write`](Self::write), but reports channels outside the universe.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelOutOfRange`](crate::Error::ChannelOutOfRange) when
    /// `channel` is not in `1..=N`. Nothing is written in that case.
    pub fn try_write(&mut self, channel: usize, value: u8) -> crate::Result<()> {
        if !(1..=N).contains(&channel) {
            return Err(crate::Error::ChannelOutOfRange {
                channel,
                max: Universe::<N>::CAPACITY,
            });
        }
        self.write(channel, value);
        Ok(())
    }

    /// Set how many channels go out per frame.
    ///
    /// Zero stops the engine. Larger counts are clamped to `N` and start the engine
    /// if it is not already running.
    pub fn set_active_channel_count(&mut self, count: usize) {
        if count == 0 {
            self.stop();
            return;
        }
        self.universe.set_active_channels(count);
        if !self.universe.is_started() {
            self.start();
        }
    }

    /// Start the engine: the tick half re-initializes its lines on the next tick.
    ///
    /// Does nothing while the active channel count is 0 (as it is after
    /// [`stop`](Self::stop)); write a channel or set a positive count instead.
    pub fn start(&mut self) {
        if self.universe.active_channels() == 0 {
            return;
        }
        if self.universe.begin() {
            #[cfg(feature = "defmt")]
            defmt::info!(
                "Dmx: started with {} active channels",
                self.universe.active_channels()
            );
            self.tick_source.enable();
        }
    }

    /// Stop the engine and zero the active channel count.
    ///
    /// A slot already on the wire finishes; no new work starts afterwards.
    pub fn stop(&mut self) {
        self.tick_source.disable();
        self.universe.end();
        #[cfg(feature = "defmt")]
        defmt::info!("Dmx: stopped");
    }

    /// Whether the engine is running.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.universe.is_started()
    }

    /// Channels transmitted per frame.
    #[must_use]
    pub fn active_channel_count(&self) -> u16 {
        self.universe.active_channels()
    }

    /// Last value written to `channel` (1-based), or `None` outside the universe.
    #[must_use]
    pub fn channel(&self, channel: usize) -> Option<u8> {
        self.universe.channel(channel)
    }

    /// The universe this controller writes into.
    #[must_use]
    pub const fn universe(&self) -> &'a Universe<N> {
        self.universe
    }

    /// Borrow the tick source.
    #[must_use]
    pub const fn tick_source(&self) -> &T {
        &self.tick_source
    }
}
