//! LogFeed
//! Owns the rolling buffer, the event source, the active filter and the
//! tick scheduler of one feed view.
//!
//! Lifecycle: `mount` seeds the buffer and arms the timer, `unmount` cancels
//! the timer, discards the buffer and drops its subscribers. All mutation
//! happens on the thread that owns the `LogFeed`, either from a tick while
//! mounted or from a filter change.

use crate::config::FeedConfig;
use crate::data::{
    select, Event, EventSource, FeedBuffer, FeedStats, Filter, Generator, Predicate,
};
use crate::feed::{
    FeedUpdate, Scheduler, Subscriber, SubscriptionId, SubscriptionManager, TickToken,
};

use std::time::Duration;

pub struct LogFeed<S: EventSource = Generator> {
    source: S,
    buffer: FeedBuffer,
    filter: Filter,
    scheduler: Scheduler,
    subscriptions: SubscriptionManager,
    seed_count: usize,
    threat_threshold: u8,
    mounted: Option<TickToken>,
    ticks: u64,
}

impl LogFeed<Generator> {
    pub fn from_config(config: &FeedConfig) -> Self {
        LogFeed::new(config.generator(), config)
    }
}

impl<S: EventSource> LogFeed<S> {
    pub fn new(source: S, config: &FeedConfig) -> Self {
        LogFeed {
            source,
            buffer: FeedBuffer::new(config.capacity),
            filter: Filter::default(),
            scheduler: Scheduler::new(config.interval()),
            subscriptions: SubscriptionManager::new(),
            seed_count: config.seed_count(),
            threat_threshold: config.threat_threshold,
            mounted: None,
            ticks: 0,
        }
    }

    /// Seeds the buffer and arms the timer. Mounting twice returns the
    /// existing token and leaves the buffer alone.
    pub fn mount(&mut self) -> TickToken {
        if let Some(token) = self.mounted {
            return token;
        }
        self.buffer.seed(self.seed_count, &mut self.source);
        let token = self.scheduler.start();
        self.mounted = Some(token);
        log::info!(
            "feed mounted: {} seeded, capacity {}, interval {:?}",
            self.buffer.len(),
            self.buffer.capacity(),
            self.scheduler.interval()
        );
        self.notify();
        token
    }

    /// Cancels the timer and discards the buffer. Subscribers get one final
    /// empty update and are then dropped. Unknown or already used tokens are
    /// ignored.
    pub fn unmount(&mut self, token: TickToken) -> bool {
        if self.mounted != Some(token) || !self.scheduler.stop(token) {
            return false;
        }
        self.mounted = None;
        self.buffer.clear();
        log::info!("feed unmounted after {} ticks", self.ticks);
        self.notify();
        self.subscriptions.unsubscribe_all();
        true
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// One generate-and-insert cycle. Returns the new event, or `None`
    /// without touching the buffer when the feed is not mounted.
    pub fn on_tick(&mut self) -> Option<Event> {
        self.mounted?;
        let event = self.source.next_event();
        self.ticks += 1;
        if let Some(evicted) = self.buffer.push(event.clone()) {
            log::debug!("tick {}: {} in, {} evicted", self.ticks, event.label(), evicted.label());
        } else {
            log::debug!("tick {}: {} in", self.ticks, event.label());
        }
        self.notify();
        Some(event)
    }

    /// Runs the tick that is due, if any, without blocking. Returns the
    /// number of ticks processed. Does nothing once unmounted.
    pub fn poll(&mut self) -> usize {
        let mut n = 0;
        while self.scheduler.try_tick().is_some() {
            if self.on_tick().is_some() {
                n += 1;
            }
        }
        n
    }

    /// Waits up to `timeout` for the next tick and runs it.
    pub fn wait(&mut self, timeout: Duration) -> Option<Event> {
        self.scheduler.wait_tick(timeout)?;
        self.on_tick()
    }

    pub fn set_filter(&mut self, filter: Filter) {
        if filter != self.filter {
            self.filter = filter;
            self.notify();
        }
    }

    /// Swaps only the category selector, keeping keyword and endpoint refinements.
    pub fn set_predicate(&mut self, predicate: Predicate) {
        let mut filter = self.filter.clone();
        filter.set_predicate(predicate);
        self.set_filter(filter);
    }

    /// Moves to the next category selector.
    pub fn cycle_predicate(&mut self) -> Predicate {
        let next = self.filter.predicate().cycle(self.threat_threshold);
        self.set_predicate(next);
        next
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn threat_threshold(&self) -> u8 {
        self.threat_threshold
    }

    /// Visible events, newest first.
    pub fn view(&self) -> impl Iterator<Item = &Event> + '_ {
        select(&self.buffer, &self.filter)
    }

    pub fn buffer(&self) -> &FeedBuffer {
        &self.buffer
    }

    /// Summary of the visible events.
    pub fn stats(&self) -> FeedStats {
        FeedStats::from_events(self.view())
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn interval(&self) -> Duration {
        self.scheduler.interval()
    }

    pub fn subscribe(&mut self, depth: usize) -> (SubscriptionId, Subscriber) {
        self.subscriptions.subscribe(depth)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.unsubscribe(id)
    }

    pub fn snapshot(&self) -> FeedUpdate {
        FeedUpdate {
            events: self.view().cloned().collect(),
            filter: self.filter.clone(),
            buffered: self.buffer.len(),
            capacity: self.buffer.capacity(),
        }
    }

    fn notify(&mut self) {
        if self.subscriptions.is_empty() {
            return;
        }
        let update = self.snapshot();
        self.subscriptions.broadcast(&update);
    }
}
