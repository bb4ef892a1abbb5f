//! Scheduler
//!
//! Two states: `Idle` (no timer) and `Active` (a periodic timer is armed).
//! `start` hands out a `TickToken`; only that token can stop the timer.
//! The timer is a `crossbeam::channel::tick` receiver owned by the
//! scheduler, so stopping drops it and no tick can be observed afterwards.

use crossbeam::channel::{self, Receiver};
use std::time::{Duration, Instant};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

/// Cancellation handle returned by `Scheduler::start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Active,
}

enum Timer {
    Idle,
    Active {
        token: TickToken,
        ticks: Receiver<Instant>,
    },
}

pub struct Scheduler {
    interval: Duration,
    timer: Timer,
    next_token: u64,
}

impl Scheduler {
    /// A zero interval is raised to one millisecond.
    pub fn new(interval: Duration) -> Scheduler {
        Scheduler {
            interval: interval.max(Duration::from_millis(1)),
            timer: Timer::Idle,
            next_token: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> State {
        match self.timer {
            Timer::Idle => State::Idle,
            Timer::Active { .. } => State::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == State::Active
    }

    /// Arms the timer. If it is already armed the current token is returned
    /// and the timer keeps its phase.
    pub fn start(&mut self) -> TickToken {
        if let Timer::Active { token, .. } = self.timer {
            return token;
        }
        let token = TickToken(self.next_token);
        self.next_token += 1;
        self.timer = Timer::Active {
            token,
            ticks: channel::tick(self.interval),
        };
        log::debug!("scheduler armed ({:?}, every {:?})", token, self.interval);
        token
    }

    /// Cancels the timer if `token` is the one currently armed. Returns
    /// whether anything was cancelled; stale tokens and repeated calls are
    /// no-ops.
    pub fn stop(&mut self, token: TickToken) -> bool {
        match self.timer {
            Timer::Active { token: armed, .. } if armed == token => {
                self.timer = Timer::Idle;
                log::debug!("scheduler stopped ({:?})", token);
                true
            }
            _ => false,
        }
    }

    /// Returns the due tick, if any, without blocking. Always `None` while idle.
    pub fn try_tick(&self) -> Option<Instant> {
        match &self.timer {
            Timer::Active { ticks, .. } => ticks.try_recv().ok(),
            Timer::Idle => None,
        }
    }

    /// Blocks for at most `timeout` waiting for the next tick. Returns
    /// `None` immediately while idle.
    pub fn wait_tick(&self, timeout: Duration) -> Option<Instant> {
        match &self.timer {
            Timer::Active { ticks, .. } => ticks.recv_timeout(timeout).ok(),
            Timer::Idle => None,
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new(DEFAULT_INTERVAL)
    }
}
