#![allow(missing_docs)]
//! Console-to-universe serial link.

mod support;

use std::collections::VecDeque;

use dmx_envoy::Error;
use dmx_envoy::dmx::{
    ChannelWrite, Dmx, LINK_FRAME_CAPACITY, LinkDecoder, Universe, encode_link_frame,
    run_serial_link,
};
use embassy_futures::block_on;
use embedded_io_async::{ErrorKind, ErrorType, Read};
use support::RecordingTickSource;

/// Reader that hands out pre-arranged chunks, then end of stream.
struct ScriptedReader {
    chunks: VecDeque<Result<Vec<u8>, ErrorKind>>,
}

impl ScriptedReader {
    fn new(bytes: &[u8], chunk_len: usize) -> Self {
        Self {
            chunks: bytes.chunks(chunk_len).map(|chunk| Ok(chunk.to_vec())).collect(),
        }
    }
}

impl ErrorType for ScriptedReader {
    type Error = ErrorKind;
}

impl Read for ScriptedReader {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ErrorKind> {
        match self.chunks.pop_front() {
            None => Ok(0),
            Some(Err(kind)) => Err(kind),
            Some(Ok(chunk)) => {
                let len = chunk.len().min(buf.len());
                buf[..len].copy_from_slice(&chunk[..len]);
                Ok(len)
            }
        }
    }
}

#[test]
fn decoder_waits_for_start_byte() {
    let mut decoder = LinkDecoder::new();
    assert_eq!(decoder.feed(0x55), None);
    assert!(!decoder.is_in_frame());

    assert_eq!(decoder.feed(0x10), None);
    assert!(decoder.is_in_frame());
    assert_eq!(
        decoder.feed(0x55),
        Some(ChannelWrite {
            channel: 1,
            value: 0x55
        })
    );
}

#[test]
fn start_byte_restarts_at_channel_one() {
    let mut decoder = LinkDecoder::new();
    decoder.feed(0x10);
    decoder.feed(1);
    decoder.feed(2);
    decoder.feed(0x10);
    assert_eq!(
        decoder.feed(9),
        Some(ChannelWrite {
            channel: 1,
            value: 9
        })
    );
}

#[test]
fn decoder_drops_bytes_past_channel_512() {
    let mut decoder = LinkDecoder::new();
    decoder.feed(0x10);
    let writes: Vec<_> = (0..600).filter_map(|_| decoder.feed(0xFF)).collect();
    assert_eq!(writes.len(), 512);
    assert_eq!(writes.last().map(|write| write.channel), Some(512));
}

#[test]
fn encoder_escapes_start_byte_and_truncates() {
    assert_eq!(encode_link_frame(&[0x10, 5, 0x11]).as_slice(), &[0x10, 0x11, 5, 0x11]);

    let long = encode_link_frame(&[1u8; 600]);
    assert_eq!(long.len(), LINK_FRAME_CAPACITY);
    assert_eq!(long[0], 0x10);
}

#[test]
fn link_stream_fills_the_universe() {
    let universe: Universe = Universe::new();
    let mut dmx = Dmx::new(&universe, RecordingTickSource::default());
    let mut values = vec![0u8; 150];
    values[0] = 10;
    values[4] = 255;
    values[149] = 0x10; // arrives escaped as 0x11

    let mut stream = vec![0xEE, 0xEE]; // noise before the first frame
    stream.extend_from_slice(&encode_link_frame(&values));
    let mut reader = ScriptedReader::new(&stream, 7);

    assert_eq!(block_on(run_serial_link(&mut reader, &mut dmx)), Ok(()));

    assert!(dmx.is_started());
    assert_eq!(dmx.active_channel_count(), 150);
    assert_eq!(dmx.channel(1), Some(10));
    assert_eq!(dmx.channel(5), Some(255));
    assert_eq!(dmx.channel(150), Some(0x11));
    assert_eq!(dmx.channel(151), Some(0));
}

#[test]
fn reader_errors_surface_as_link_errors() {
    let universe: Universe = Universe::new();
    let mut dmx = Dmx::new(&universe, RecordingTickSource::default());
    let mut reader = ScriptedReader {
        chunks: VecDeque::from([Ok(vec![0x10, 42]), Err(ErrorKind::Other)]),
    };

    assert_eq!(
        block_on(run_serial_link(&mut reader, &mut dmx)),
        Err(Error::SerialLink)
    );
    assert_eq!(dmx.channel(1), Some(42));
}
