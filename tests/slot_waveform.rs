#![allow(missing_docs)]
//! Wire-level shape of slots and breaks, and timer timing derivation.

mod support;

use dmx_envoy::Error;
use dmx_envoy::dmx::{
    BREAK_BITS, BitClock, DMX_BIT_RATE, FRAME_START_BITS, MARK_AFTER_BREAK_BITS, SLOT_BITS,
    SlotTiming, slot_frame, transmit_break, transmit_slot,
};
use support::Wire;

#[derive(Debug, PartialEq, Eq)]
enum ClockCall {
    Align,
    Wait(u16),
}

/// Clock that only records how the transmitter paces itself.
#[derive(Default)]
struct CallLog(Vec<ClockCall>);

impl BitClock for CallLog {
    fn align(&mut self) {
        self.0.push(ClockCall::Align);
    }

    fn wait_bits(&mut self, bits: u16) {
        self.0.push(ClockCall::Wait(bits));
    }
}

fn levels(frame: u16) -> Vec<bool> {
    (0..SLOT_BITS).map(|bit| (frame >> bit) & 1 == 1).collect()
}

#[test]
fn slot_is_start_bit_data_lsb_first_then_two_stop_bits() {
    let expected = vec![
        false, // start
        true, false, true, false, false, true, false, true, // 0xA5, LSB first
        true, true, // stop
    ];
    assert_eq!(levels(slot_frame(0xA5)), expected);
}

#[test]
fn zero_slot_holds_nine_lows() {
    let frame = levels(slot_frame(0x00));
    assert!(frame[..9].iter().all(|&high| !high));
    assert!(frame[9] && frame[10]);
}

#[test]
fn transmitted_slot_matches_its_frame() {
    for value in [0x00, 0x01, 0x80, 0x5A, 0xFF] {
        let wire = Wire::new();
        let mut data = wire.data_line();
        let mut clock = wire.clock();

        transmit_slot(&mut data, &mut clock, value);

        assert_eq!(wire.samples(), levels(slot_frame(value)), "value {value:#04x}");
        assert!(wire.data_high());
    }
}

#[test]
fn break_then_mark_after_break() {
    let wire = Wire::new();
    let mut data = wire.data_line();
    let mut clock = wire.clock();

    transmit_break(&mut data, &mut clock);

    let samples = wire.samples();
    let break_bits = usize::from(BREAK_BITS);
    assert_eq!(samples.len(), break_bits + usize::from(MARK_AFTER_BREAK_BITS));
    assert!(samples[..break_bits].iter().all(|&high| !high));
    assert!(samples[break_bits..].iter().all(|&high| high));
}

#[test]
fn each_run_of_bits_is_measured_from_a_fresh_edge() {
    let wire = Wire::new();
    let mut data = wire.data_line();

    let mut clock = CallLog::default();
    transmit_break(&mut data, &mut clock);
    assert_eq!(
        clock.0,
        vec![
            ClockCall::Align,
            ClockCall::Wait(BREAK_BITS),
            ClockCall::Align,
            ClockCall::Wait(MARK_AFTER_BREAK_BITS),
        ]
    );

    let mut clock = CallLog::default();
    transmit_slot(&mut data, &mut clock, 0x42);
    assert_eq!(clock.0.first(), Some(&ClockCall::Align));
    assert_eq!(clock.0.len(), 1 + usize::from(SLOT_BITS));
    assert!(clock.0[1..].iter().all(|call| *call == ClockCall::Wait(1)));
}

#[test]
fn frame_start_costs_thirty_five_bits() {
    assert_eq!(FRAME_START_BITS, 35);
    assert_eq!(SLOT_BITS, 11);
    // 22 bits at 4 us: the 88 us break of DMX512/1990.
    assert_eq!(u32::from(BREAK_BITS) * 1_000_000 / DMX_BIT_RATE, 88);
}

#[test]
fn timing_for_common_timer_clocks() {
    let pico_timer = SlotTiming::from_clock_hz(1_000_000).expect("1 MHz timer");
    assert_eq!(pico_timer.ticks_per_bit(), 4);
    assert_eq!(pico_timer.bit_rate_hz(), 250_000);

    let core_clock = SlotTiming::from_clock_hz(125_000_000).expect("125 MHz clock");
    assert_eq!(core_clock.ticks_per_bit(), 500);
    assert_eq!(core_clock.bit_rate_hz(), 250_000);
}

#[test]
fn timing_rejects_slow_or_coarse_clocks() {
    assert_eq!(
        SlotTiming::from_clock_hz(200_000),
        Err(Error::ClockTooSlow { clock_hz: 200_000 })
    );
    // 4 ticks per bit rounds to 275 kbit/s.
    assert_eq!(
        SlotTiming::from_clock_hz(1_100_000),
        Err(Error::BitRateOutOfTolerance {
            bit_rate_hz: 275_000
        })
    );
    // 20 ticks per bit rounds to 260 kbit/s.
    assert_eq!(
        SlotTiming::from_clock_hz(5_200_000),
        Err(Error::BitRateOutOfTolerance {
            bit_rate_hz: 260_000
        })
    );
    // 24 ticks per bit gives about 254 kbit/s, still inside the window.
    assert!(SlotTiming::from_clock_hz(6_100_000).is_ok());
}
