#![allow(missing_docs)]
//! Chase a single full-on channel across the first eight DMX channels.
//!
//! DMX data goes out on GPIO 3; GPIO 4 is the frame marker.

#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

use core::{convert::Infallible, panic};
use defmt::info;
use dmx_envoy::{
    Error, Result,
    dmx::{
        CPU_SHARE_PERCENT_DEFAULT, DMX_SIZE_SMALL, Dmx, DmxOutput, SignalTickSource, TickBudget,
        TickSignal, TimerBitClock, Universe, run_tick_loop,
    },
};
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_time::{Duration, Timer};
use {defmt_rtt as _, panic_probe as _};

const TICK_PERIOD: Duration = Duration::from_millis(2);
const CHASE_CHANNELS: usize = 8;

static UNIVERSE: Universe<DMX_SIZE_SMALL> = Universe::new();
static TICK_SIGNAL: TickSignal = TickSignal::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());

    let clock = TimerBitClock::new()?;
    let output = DmxOutput::new(
        &UNIVERSE,
        Output::new(p.PIN_3, Level::High),
        Output::new(p.PIN_4, Level::High),
        clock,
        TickBudget::from_tick_period(TICK_PERIOD, CPU_SHARE_PERCENT_DEFAULT)?,
    );
    let token = dmx_tick_task(output);
    spawner.spawn(token).map_err(Error::TaskSpawn)?;

    let mut dmx = Dmx::new(&UNIVERSE, SignalTickSource::new(&TICK_SIGNAL));
    // Only send what the chase uses; frames get shorter and faster.
    dmx.set_active_channel_count(CHASE_CHANNELS);

    let mut previous = CHASE_CHANNELS;
    loop {
        let channel = previous % CHASE_CHANNELS + 1;
        dmx.write(previous, 0);
        dmx.write(channel, 255);
        info!("chase: channel {}", channel);
        previous = channel;
        Timer::after_millis(250).await;
    }
}

#[embassy_executor::task]
async fn dmx_tick_task(
    mut output: DmxOutput<'static, Output<'static>, Output<'static>, TimerBitClock, DMX_SIZE_SMALL>,
) -> ! {
    run_tick_loop(&mut output, &TICK_SIGNAL, TICK_PERIOD).await
}
