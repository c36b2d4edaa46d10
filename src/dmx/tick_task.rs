//! An embassy-timed tick source, for boards where the engine runs as a task
//! rather than from a raw timer interrupt.

use core::convert::Infallible;

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::OutputPin;

use super::{BitClock, DmxOutput, TickSource};

/// Carries enable (`true`) and disable (`false`) requests to [`run_tick_loop`].
pub type TickSignal = Signal<CriticalSectionRawMutex, bool>;

/// [`TickSource`] that starts and parks a [`run_tick_loop`] through a [`TickSignal`].
#[derive(Clone, Copy)]
pub struct SignalTickSource<'a> {
    signal: &'a TickSignal,
}

impl<'a> SignalTickSource<'a> {
    /// Tick source driving the loop that waits on `signal`.
    #[must_use]
    pub const fn new(signal: &'a TickSignal) -> Self {
        Self { signal }
    }
}

impl TickSource for SignalTickSource<'_> {
    fn enable(&mut self) {
        self.signal.signal(true);
    }

    fn disable(&mut self) {
        self.signal.signal(false);
    }
}

/// Call [`DmxOutput::on_tick`] every `period` while enabled; park while disabled.
///
/// Starts parked unless the universe is already running. A disable request takes
/// effect between ticks; a tick in progress always finishes. Ticks missed while the
/// task was starved are dropped, not replayed: after a stall the loop runs one tick
/// and then resumes the regular period from there.
pub async fn run_tick_loop<D, M, C, const N: usize>(
    output: &mut DmxOutput<'_, D, M, C, N>,
    signal: &TickSignal,
    period: Duration,
) -> !
where
    D: OutputPin<Error = Infallible>,
    M: OutputPin<Error = Infallible>,
    C: BitClock,
{
    let mut enabled = output.universe().is_started();
    loop {
        while !enabled {
            enabled = signal.wait().await;
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("run_tick_loop: ticking every {} us", period.as_micros());
        let mut deadline = Instant::now() + period;
        while enabled {
            match select(Timer::at(deadline), signal.wait()).await {
                Either::First(()) => {
                    output.on_tick();
                    deadline += period;
                    let now = Instant::now();
                    if deadline <= now {
                        deadline = now + period;
                    }
                }
                Either::Second(request) => enabled = request,
            }
        }
    }
}
