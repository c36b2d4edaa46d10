#![allow(missing_docs)]
//! Serial-to-DMX bridge: a lighting console on the PC streams channel values over
//! UART0 (GPIO 1, 115200 baud) and they go out as DMX on GPIO 3.
//!
//! GPIO 4 is the frame marker: low while channel slots are on the wire. Put a scope
//! on it to see frame timing.

#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

use core::{convert::Infallible, panic};
use defmt::info;
use dmx_envoy::{
    Error, Result,
    dmx::{
        CPU_SHARE_PERCENT_DEFAULT, Dmx, DmxOutput, SignalTickSource, TickBudget, TickSignal,
        TimerBitClock, Universe, run_serial_link, run_tick_loop,
    },
};
use embassy_executor::Spawner;
use embassy_rp::{
    bind_interrupts,
    gpio::{Level, Output},
    peripherals::UART0,
    uart::{self, Async, UartRx},
};
use embassy_time::Duration;
use embedded_io_async::{ErrorKind, ErrorType, Read};
use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(struct Irqs {
    UART0_IRQ => uart::InterruptHandler<UART0>;
});

const TICK_PERIOD: Duration = Duration::from_millis(2);
const CONSOLE_BAUD: u32 = 115_200;

static UNIVERSE: Universe = Universe::new();
static TICK_SIGNAL: TickSignal = TickSignal::new();

type PicoDmxOutput = DmxOutput<'static, Output<'static>, Output<'static>, TimerBitClock>;

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());

    let clock = TimerBitClock::new()?;
    let budget = TickBudget::from_tick_period(TICK_PERIOD, CPU_SHARE_PERCENT_DEFAULT)?;
    info!(
        "bridge: {} timer ticks per bit, {} bits per tick",
        clock.ticks_per_bit(),
        budget.bits_per_tick()
    );

    let output = DmxOutput::new(
        &UNIVERSE,
        Output::new(p.PIN_3, Level::High),
        Output::new(p.PIN_4, Level::High),
        clock,
        budget,
    );
    let token = dmx_tick_task(output);
    spawner.spawn(token).map_err(Error::TaskSpawn)?;

    let mut config = uart::Config::default();
    config.baudrate = CONSOLE_BAUD;
    let mut console = ConsoleRx(UartRx::new(p.UART0, p.PIN_1, Irqs, p.DMA_CH0, config));

    let mut dmx = Dmx::new(&UNIVERSE, SignalTickSource::new(&TICK_SIGNAL));
    loop {
        // A framing or overrun error loses at most one frame; the next 0x10 resyncs.
        if let Err(err) = run_serial_link(&mut console, &mut dmx).await {
            info!("bridge: {}, resyncing", err);
        }
    }
}

#[embassy_executor::task]
async fn dmx_tick_task(mut output: PicoDmxOutput) -> ! {
    run_tick_loop(&mut output, &TICK_SIGNAL, TICK_PERIOD).await
}

/// UART receiver read one byte at a time so no console byte waits on a full buffer.
struct ConsoleRx(UartRx<'static, Async>);

impl ErrorType for ConsoleRx {
    type Error = ErrorKind;
}

impl Read for ConsoleRx {
    async fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, ErrorKind> {
        let Some(first) = buf.first_mut() else {
            return Ok(0);
        };
        let mut byte = [0u8; 1];
        self.0
            .read(&mut byte)
            .await
            .map_err(|_| ErrorKind::InvalidData)?;
        *first = byte[0];
        Ok(1)
    }
}
