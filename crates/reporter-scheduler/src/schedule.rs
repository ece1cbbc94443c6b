use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use reporter_core::config::{CreatePhase, ScheduleConfig, TimerKind};

/// Countdown deciding on which ticks the create action fires.
///
/// With `Immediate` the first tick fires, then every `every` ticks after it.
/// With `AfterInterval` the first firing waits a full `every` ticks.
#[derive(Debug, Clone)]
pub struct CreateCadence {
    every: u64,
    until_next: u64,
}

impl CreateCadence {
    pub fn new(every: u64, phase: CreatePhase) -> Self {
        let every = every.max(1);
        let until_next = match phase {
            CreatePhase::Immediate => 0,
            CreatePhase::AfterInterval => every,
        };
        Self { every, until_next }
    }

    pub fn every(&self) -> u64 {
        self.every
    }

    /// Advance by one tick. Returns `true` when create is due on this tick.
    pub fn advance(&mut self) -> bool {
        let due = self.until_next == 0;
        if due {
            self.until_next = self.every;
        }
        self.until_next -= 1;
        due
    }
}

/// The pause between ticks.
#[async_trait]
pub trait Ticker: Send {
    /// Resolve when the next tick may start.
    async fn wait(&mut self);
}

/// Sleeps one full period after each tick's work.
pub struct SleepTicker {
    period: Duration,
}

impl SleepTicker {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

#[async_trait]
impl Ticker for SleepTicker {
    async fn wait(&mut self) {
        tokio::time::sleep(self.period).await;
    }
}

/// Fixed-rate ticks; time spent in a tick's work counts toward the period.
///
/// A tick that overruns pushes the schedule back instead of bursting.
pub struct IntervalTicker {
    period: Duration,
    // created lazily so construction does not need a running runtime
    interval: Option<Interval>,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn wait(&mut self) {
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            let mut iv = tokio::time::interval_at(Instant::now() + period, period);
            iv.set_missed_tick_behavior(MissedTickBehavior::Delay);
            iv
        });
        interval.tick().await;
    }
}

/// Build the ticker named by the schedule config.
pub fn ticker_for(config: &ScheduleConfig) -> Box<dyn Ticker> {
    match config.timer {
        TimerKind::Sleep => Box::new(SleepTicker::new(config.tick())),
        TimerKind::Interval => Box::new(IntervalTicker::new(config.tick())),
    }
}
