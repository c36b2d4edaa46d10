//! Shared state between the foreground [`Dmx`](super::Dmx) and the tick-side
//! [`DmxOutput`](super::DmxOutput).

use core::array;

use portable_atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicU32, Ordering};

use super::DMX_SIZE;

/// Active channel count of a freshly created universe.
pub const ACTIVE_CHANNELS_DEFAULT: u16 = 16;

/// The last value written to every channel, one atomic byte per slot.
///
/// Indexes are 0-based here; [`Universe`] does the channel-number translation.
pub struct FrameBuffer<const N: usize> {
    slots: [AtomicU8; N],
}

impl<const N: usize> FrameBuffer<N> {
    /// A zeroed buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicU8::new(0) }; N],
        }
    }

    /// Value at `index`, or `None` past the end.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<u8> {
        self.slots
            .get(index)
            .map(|slot| slot.load(Ordering::Relaxed))
    }

    /// Store `value` at `index`. Returns `false` (and stores nothing) past the end.
    pub fn set(&self, index: usize, value: u8) -> bool {
        let Some(slot) = self.slots.get(index) else {
            return false;
        };
        slot.store(value, Ordering::Relaxed);
        true
    }

    /// Copy of every value, in index order.
    #[must_use]
    pub fn snapshot(&self) -> [u8; N] {
        array::from_fn(|index| self.get(index).unwrap_or(0))
    }
}

impl<const N: usize> Default for FrameBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// One DMX universe: its frame buffer, active channel count and engine lifecycle.
///
/// Designed to live in a `static` so the foreground and the tick handler can both
/// reach it without locking:
///
/// ```rust
/// use dmx_envoy::dmx::{DMX_SIZE_SMALL, Universe};
///
/// static UNIVERSE: Universe<DMX_SIZE_SMALL> = Universe::new();
/// assert_eq!(UNIVERSE.active_channels(), 16);
/// assert!(!UNIVERSE.is_started());
/// ```
pub struct Universe<const N: usize = DMX_SIZE> {
    frame: FrameBuffer<N>,
    active_channels: AtomicU16,
    started: AtomicBool,
    // Bumped on every start so the tick side knows to re-initialize its lines.
    epoch: AtomicU32,
    in_tick: AtomicBool,
}

impl<const N: usize> Universe<N> {
    /// Highest channel number of this universe.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "N is checked to be at most 512 in new()"
    )]
    pub const CAPACITY: u16 = N as u16;

    /// A stopped universe with every channel at zero.
    ///
    /// # Panics
    ///
    /// When `N` is not in `1..=512`; in a `static` this is a compile error.
    #[must_use]
    pub const fn new() -> Self {
        assert!(N >= 1 && N <= DMX_SIZE, "a universe holds 1 to 512 channels");
        let active = if ACTIVE_CHANNELS_DEFAULT < Self::CAPACITY {
            ACTIVE_CHANNELS_DEFAULT
        } else {
            Self::CAPACITY
        };
        Self {
            frame: FrameBuffer::new(),
            active_channels: AtomicU16::new(active),
            started: AtomicBool::new(false),
            epoch: AtomicU32::new(0),
            in_tick: AtomicBool::new(false),
        }
    }

    /// Value of `channel` (1-based), or `None` outside `1..=N`.
    #[must_use]
    pub fn channel(&self, channel: usize) -> Option<u8> {
        self.frame.get(channel.checked_sub(1)?)
    }

    /// Store `value` for `channel` (1-based) and raise the active count to cover it.
    ///
    /// Returns `false` and changes nothing when `channel` is outside `1..=N`.
    pub fn set_channel(&self, channel: usize, value: u8) -> bool {
        let Some(index) = channel.checked_sub(1) else {
            return false;
        };
        if !self.frame.set(index, value) {
            return false;
        }
        // set() succeeded, so channel <= N <= 512
        let channel = u16::try_from(channel).unwrap_or(Self::CAPACITY);
        self.active_channels.fetch_max(channel, Ordering::Relaxed);
        true
    }

    /// The frame buffer.
    #[must_use]
    pub const fn frame(&self) -> &FrameBuffer<N> {
        &self.frame
    }

    /// Copy of every channel value, channel 1 first.
    #[must_use]
    pub fn snapshot(&self) -> [u8; N] {
        self.frame.snapshot()
    }

    /// Channels transmitted per frame.
    #[must_use]
    pub fn active_channels(&self) -> u16 {
        self.active_channels.load(Ordering::Relaxed)
    }

    /// Set the active channel count, clamped to `N`.
    pub fn set_active_channels(&self, count: usize) {
        let count = u16::try_from(count.min(N)).unwrap_or(Self::CAPACITY);
        self.active_channels.store(count, Ordering::Relaxed);
    }

    /// Whether the engine is running.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Mark the engine started. Returns `true` if it was stopped before.
    pub fn begin(&self) -> bool {
        if self.started.load(Ordering::Acquire) {
            return false;
        }
        self.epoch.fetch_add(1, Ordering::Relaxed);
        !self.started.swap(true, Ordering::AcqRel)
    }

    /// Mark the engine stopped and zero the active channel count.
    pub fn end(&self) {
        self.started.store(false, Ordering::Release);
        self.active_channels.store(0, Ordering::Relaxed);
    }

    /// Start counter; changes every time the engine goes from stopped to started.
    #[must_use]
    pub fn epoch(&self) -> u32 {
        self.epoch.load(Ordering::Relaxed)
    }

    /// Claim the tick handler. `None` means a tick is already running on this universe.
    #[must_use]
    pub fn enter_tick(&self) -> Option<TickGuard<'_>> {
        if self.in_tick.swap(true, Ordering::Acquire) {
            return None;
        }
        Some(TickGuard {
            in_tick: &self.in_tick,
        })
    }

    /// Whether a tick is running right now.
    #[must_use]
    pub fn is_in_tick(&self) -> bool {
        self.in_tick.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Default for Universe<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Held for the duration of one tick; releases the handler when dropped.
#[must_use = "the tick handler is released as soon as the guard is dropped"]
pub struct TickGuard<'a> {
    in_tick: &'a AtomicBool,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.in_tick.store(false, Ordering::Release);
    }
}
