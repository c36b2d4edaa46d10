//! Simulated DMX wire for host tests.
//!
//! The data line is sampled once per bit period whenever the clock "waits", so the
//! recorded samples are exactly what a receiver would see between ticks.
#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use dmx_envoy::dmx::{BREAK_BITS, BitClock, SLOT_BITS, TickSource};
use embedded_hal::digital::{ErrorType, OutputPin};

#[derive(Debug)]
pub struct WireState {
    pub data_high: bool,
    pub marker_high: bool,
    pub marker_toggles: usize,
    pub samples: Vec<bool>,
}

#[derive(Clone, Debug)]
pub struct Wire(Rc<RefCell<WireState>>);

impl Wire {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(WireState {
            data_high: true,
            marker_high: true,
            marker_toggles: 0,
            samples: Vec::new(),
        })))
    }

    pub fn data_line(&self) -> DataLine {
        DataLine(self.clone())
    }

    pub fn marker_line(&self) -> MarkerLine {
        MarkerLine(self.clone())
    }

    pub fn clock(&self) -> SimClock {
        SimClock(self.clone())
    }

    pub fn samples(&self) -> Vec<bool> {
        self.0.borrow().samples.clone()
    }

    pub fn sample_count(&self) -> usize {
        self.0.borrow().samples.len()
    }

    pub fn data_high(&self) -> bool {
        self.0.borrow().data_high
    }

    pub fn marker_high(&self) -> bool {
        self.0.borrow().marker_high
    }

    pub fn marker_toggles(&self) -> usize {
        self.0.borrow().marker_toggles
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        decode_frames(&self.0.borrow().samples)
    }
}

pub struct DataLine(Wire);

impl ErrorType for DataLine {
    type Error = Infallible;
}

impl OutputPin for DataLine {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.0.borrow_mut().data_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.0.borrow_mut().data_high = true;
        Ok(())
    }
}

pub struct MarkerLine(Wire);

impl MarkerLine {
    fn set(&mut self, high: bool) {
        let mut state = self.0.0.borrow_mut();
        if state.marker_high != high {
            state.marker_toggles += 1;
            state.marker_high = high;
        }
    }
}

impl ErrorType for MarkerLine {
    type Error = Infallible;
}

impl OutputPin for MarkerLine {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.set(true);
        Ok(())
    }
}

pub struct SimClock(Wire);

impl BitClock for SimClock {
    fn wait_bits(&mut self, bits: u16) {
        let mut state = self.0.0.borrow_mut();
        let level = state.data_high;
        state
            .samples
            .extend(std::iter::repeat_n(level, usize::from(bits)));
    }
}

/// Tick source that only records what the controller asked for.
#[derive(Debug, Default)]
pub struct RecordingTickSource {
    pub enabled: bool,
    pub enables: usize,
    pub disables: usize,
}

impl TickSource for RecordingTickSource {
    fn enable(&mut self) {
        self.enabled = true;
        self.enables += 1;
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.disables += 1;
    }
}

/// Split data-line samples into frames; each frame starts with its start code.
///
/// A low run of at least a break marks a new frame. Any other low is a start bit.
pub fn decode_frames(samples: &[bool]) -> Vec<Vec<u8>> {
    let break_bits = usize::from(BREAK_BITS);
    let slot_bits = usize::from(SLOT_BITS);
    let mut frames = Vec::new();
    let mut current: Option<Vec<u8>> = None;
    let mut index = 0;
    while index < samples.len() {
        if samples[index] {
            index += 1;
            continue;
        }
        let low_run = samples[index..].iter().take_while(|&&high| !high).count();
        if low_run >= break_bits {
            if let Some(frame) = current.take() {
                frames.push(frame);
            }
            current = Some(Vec::new());
            index += low_run;
            continue;
        }
        let slot = &samples[index..index + slot_bits];
        assert!(slot[9] && slot[10], "stop bits must be high at sample {index}");
        let value = (0..8).fold(0u8, |acc, bit| acc | (u8::from(slot[1 + bit]) << bit));
        current
            .as_mut()
            .expect("slot seen before any break")
            .push(value);
        index += slot_bits;
    }
    if let Some(frame) = current {
        frames.push(frame);
    }
    frames
}
