//! Simulation clock.
//!
//! The clock advances simulated time in fixed steps and broadcasts one [`TimerEvent`]
//! per step to every registered [`TimerEventListener`]. Listeners never block the
//! clock: each handler runs to completion inside the broadcast, either inline or on a
//! scoped worker thread when [`ClockConfig::parallel_dispatch`] is set.

use std::sync::Arc;
use std::thread;

use tracing::{debug, trace};

use crate::config::ClockConfig;
use crate::error::Error;

mod timestamp;

pub use timestamp::Timestamp;

/// One discrete advancement of the simulation clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    /// Length of the step, in nanoseconds of simulated time.
    pub step: u64,
    pub lower_limit: Timestamp,
    pub upper_limit: Timestamp,
}

pub trait TimerEventListener: Send + Sync {
    fn on_timer_event(&self, event: &TimerEvent);
}

/// Receives the run progress as a percentage each time it changes.
pub trait ProgressListener: Send {
    fn on_progress(&mut self, percentage: u8);
}

pub struct SimulationClock {
    config: ClockConfig,
    now: Timestamp,
    listeners: Vec<Arc<dyn TimerEventListener>>,
    progress_listener: Option<Box<dyn ProgressListener>>,
    last_progress: Option<u8>,
}

impl SimulationClock {
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            now: Timestamp::ZERO,
            listeners: Vec::new(),
            progress_listener: None,
            last_progress: None,
        }
    }

    pub fn add_listener(&mut self, listener: Arc<dyn TimerEventListener>) {
        self.listeners.push(listener);
    }

    /// Registers the progress listener. Only one may ever be attached.
    pub fn set_progress_listener(
        &mut self,
        listener: Box<dyn ProgressListener>,
    ) -> Result<(), Error> {
        if self.progress_listener.is_some() {
            return Err(Error::SingleListenerOnly);
        }
        self.progress_listener = Some(listener);
        Ok(())
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn is_finished(&self) -> bool {
        self.now.total_nanoseconds() >= self.config.duration
    }

    pub fn progress_percentage(&self) -> u8 {
        if self.config.duration == 0 {
            return 100;
        }
        let elapsed = self.now.total_nanoseconds().min(self.config.duration);
        ((elapsed as u128 * 100) / self.config.duration as u128) as u8
    }

    /// Advances the clock one step and broadcasts the event.
    ///
    /// Returns `false` without doing anything once the configured duration is spent.
    pub fn tick(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        let lower_limit = self.now;
        let remaining = self.config.duration - self.now.total_nanoseconds();
        let step = self.config.step.max(1).min(remaining);
        self.now.increase_nanoseconds(step);
        let event = TimerEvent {
            step,
            lower_limit,
            upper_limit: self.now,
        };
        trace!(lower = %event.lower_limit, upper = %event.upper_limit, "tick");

        if self.config.parallel_dispatch && self.listeners.len() > 1 {
            let event = &event;
            thread::scope(|s| {
                for listener in &self.listeners {
                    s.spawn(move || listener.on_timer_event(event));
                }
            });
        } else {
            for listener in &self.listeners {
                listener.on_timer_event(&event);
            }
        }

        self.notify_progress();
        true
    }

    /// Ticks until the configured duration is spent. Returns the number of ticks.
    pub fn run(&mut self) -> u64 {
        let mut ticks = 0;
        while self.tick() {
            ticks += 1;
        }
        debug!(ticks, now = %self.now, "simulation finished");
        ticks
    }

    /// Rewinds time. Listeners stay registered.
    pub fn reset(&mut self) {
        self.now = Timestamp::ZERO;
        self.last_progress = None;
    }

    fn notify_progress(&mut self) {
        let percentage = self.progress_percentage();
        if self.last_progress == Some(percentage) {
            return;
        }
        self.last_progress = Some(percentage);
        if let Some(listener) = self.progress_listener.as_mut() {
            listener.on_progress(percentage);
        }
    }
}
