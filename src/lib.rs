//! Bit-banged DMX512 output for Pico 1 and 2, with no UART involved.
//!
//! The wire signal is produced one bit period at a time by spinning on the system timer,
//! and the frame is spread across many short periodic ticks so the rest of the
//! firmware keeps running. See the [`dmx`] module for the full picture.
//!
//! # Glossary
//!
//! - **Slot:** one byte on the wire, framed as a start bit, 8 data bits (LSB first) and 2 stop bits.
//! - **Break:** the long low pulse that opens every frame, followed by the *mark after break*.
//! - **Start code:** the first slot of a frame; `0x00` for dimmer data.
//! - **Universe:** one DMX line and its up-to-512 channel values.
//! - **Tick:** one invocation of the periodic handler that moves the frame forward.
#![cfg_attr(not(any(test, feature = "host")), no_std)]

#[cfg(all(feature = "pico1", feature = "pico2"))]
compile_error!("Cannot enable both 'pico1' and 'pico2' features simultaneously");

#[cfg(all(feature = "arm", feature = "riscv"))]
compile_error!("Cannot enable both 'arm' and 'riscv' features simultaneously");

// Compile-time check: pico1 only supports ARM
#[cfg(all(feature = "pico1", feature = "riscv"))]
compile_error!("Pico 1 (RP2040) only supports ARM architecture, not RISC-V");

pub mod dmx;
mod error;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};
