//! Byte-stream link from a lighting console on a PC to a [`Dmx`].
//!
//! The console sends `0x10`, then one byte per channel starting at channel 1. Values
//! equal to `0x10` are sent as `0x11` so the start byte stays unambiguous.

use embedded_io_async::Read;
use heapless::Vec;

use super::{DMX_SIZE, Dmx, TickSource};
use crate::{Error, Result};

/// Byte that opens every link frame.
pub const LINK_FRAME_START: u8 = 0x10;

/// What a channel value of [`LINK_FRAME_START`] is sent as.
pub const LINK_ESCAPED_VALUE: u8 = 0x11;

/// Largest encoded link frame: the start byte plus 512 channels.
pub const LINK_FRAME_CAPACITY: usize = DMX_SIZE + 1;

const READ_CHUNK: usize = 64;

/// One channel value decoded from the link.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelWrite {
    /// Channel number, 1-based.
    pub channel: u16,
    /// Value for that channel.
    pub value: u8,
}

/// Turns link bytes into [`ChannelWrite`]s.
///
/// Bytes before the first start byte are dropped, as are bytes past channel 512.
///
/// ```rust
/// use dmx_envoy::dmx::{ChannelWrite, LinkDecoder};
///
/// let mut decoder = LinkDecoder::new();
/// assert_eq!(decoder.feed(0x42), None); // no frame open yet
/// assert_eq!(decoder.feed(0x10), None);
/// assert_eq!(decoder.feed(200), Some(ChannelWrite { channel: 1, value: 200 }));
/// assert_eq!(decoder.feed(7), Some(ChannelWrite { channel: 2, value: 7 }));
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LinkDecoder {
    next_channel: Option<u16>,
}

impl LinkDecoder {
    /// A decoder waiting for the first start byte.
    #[must_use]
    pub const fn new() -> Self {
        Self { next_channel: None }
    }

    /// Feed one byte; returns the channel write it completes, if any.
    pub fn feed(&mut self, byte: u8) -> Option<ChannelWrite> {
        if byte == LINK_FRAME_START {
            self.next_channel = Some(1);
            return None;
        }
        let channel = self.next_channel?;
        if usize::from(channel) > DMX_SIZE {
            return None;
        }
        self.next_channel = Some(channel.saturating_add(1));
        Some(ChannelWrite {
            channel,
            value: byte,
        })
    }

    /// Whether a frame is open, i.e. a start byte has been seen.
    #[must_use]
    pub const fn is_in_frame(&self) -> bool {
        self.next_channel.is_some()
    }
}

/// Encode channel values (channel 1 first) as one link frame.
///
/// Values of `0x10` are replaced by `0x11`; anything past 512 values is dropped.
#[must_use]
pub fn encode_link_frame(values: &[u8]) -> Vec<u8, LINK_FRAME_CAPACITY> {
    let mut frame = Vec::new();
    let start = core::iter::once(LINK_FRAME_START);
    let body = values.iter().take(DMX_SIZE).map(|&value| {
        if value == LINK_FRAME_START {
            LINK_ESCAPED_VALUE
        } else {
            value
        }
    });
    // At most 1 + 512 bytes, which is exactly the capacity.
    for byte in start.chain(body) {
        if frame.push(byte).is_err() {
            break;
        }
    }
    frame
}

/// Read link bytes from `reader` and apply them to `dmx` until the stream ends.
///
/// # Errors
///
/// [`Error::SerialLink`] if the reader fails.
pub async fn run_serial_link<R, T, const N: usize>(
    reader: &mut R,
    dmx: &mut Dmx<'_, T, N>,
) -> Result<()>
where
    R: Read,
    T: TickSource,
{
    let mut decoder = LinkDecoder::new();
    let mut buffer = [0u8; READ_CHUNK];
    loop {
        let read = reader.read(&mut buffer).await.map_err(|_| Error::SerialLink)?;
        if read == 0 {
            #[cfg(feature = "defmt")]
            defmt::info!("serial link: end of stream");
            return Ok(());
        }
        for &byte in buffer.iter().take(read) {
            if let Some(write) = decoder.feed(byte) {
                dmx.write(usize::from(write.channel), write.value);
            }
        }
    }
}
