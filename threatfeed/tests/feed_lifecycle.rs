use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use threatfeed::data::{Event, EventSource, Filter, Generator, Predicate, ThreatScore};
use threatfeed::feed::TickToken;
use threatfeed::{FeedConfig, LogFeed};

const FAST: Duration = Duration::from_millis(10);

/// Hands out prepared events first, then falls back to a seeded generator.
struct Scripted {
    events: VecDeque<Event>,
    fallback: Generator,
}

impl Scripted {
    fn with_scores(scores: &[u8]) -> Scripted {
        let mut gen = Generator::seeded(17);
        let events = scores
            .iter()
            .map(|&score| {
                let mut event = gen.generate();
                event.classification.threat_score = ThreatScore::new(score);
                event
            })
            .collect();
        Scripted {
            events,
            fallback: gen,
        }
    }
}

impl EventSource for Scripted {
    fn next_event(&mut self) -> Event {
        self.events
            .pop_front()
            .unwrap_or_else(|| self.fallback.generate())
    }
}

fn config(capacity: usize, seed_count: usize) -> FeedConfig {
    FeedConfig {
        capacity,
        interval_ms: FAST.as_millis() as u64,
        seed_count: Some(seed_count),
        rng_seed: Some(3),
        ..FeedConfig::default()
    }
}

fn view_ids<S: EventSource>(feed: &LogFeed<S>) -> Vec<u64> {
    feed.view().map(|e| e.id).collect()
}

#[test]
fn mount_seeds_and_arms() {
    let mut feed = LogFeed::from_config(&FeedConfig {
        rng_seed: Some(1),
        ..FeedConfig::default()
    });
    assert!(!feed.is_mounted());
    assert!(feed.buffer().is_empty());

    let token = feed.mount();
    assert!(feed.is_mounted());
    assert_eq!(feed.buffer().len(), 20);
    assert_eq!(view_ids(&feed), (0..20).rev().collect::<Vec<_>>());

    // mounting again does not reseed
    assert_eq!(feed.mount(), token);
    assert_eq!(feed.buffer().len(), 20);
}

#[test]
fn ticks_evict_the_oldest() {
    let mut feed = LogFeed::from_config(&config(3, 0));
    let token = feed.mount();
    let pushed: Vec<u64> = (0..4).map(|_| feed.on_tick().unwrap().id).collect();
    assert_eq!(pushed, vec![0, 1, 2, 3]);
    assert_eq!(view_ids(&feed), vec![3, 2, 1]);
    assert_eq!(feed.ticks(), 4);
    assert!(feed.unmount(token));
}

#[test]
fn threat_filter_preserves_order() {
    // pushed oldest first, so the buffer reads [10, 70, 60, 59]
    let source = Scripted::with_scores(&[59, 60, 70, 10]);
    let mut feed = LogFeed::new(source, &config(4, 4));
    feed.mount();
    feed.set_predicate(Predicate::threats());
    let scores: Vec<u8> = feed.view().map(|e| e.threat_score().value()).collect();
    assert_eq!(scores, vec![70, 60]);
    assert_eq!(feed.buffer().len(), 4);
}

#[test]
fn timer_drives_ticks() {
    let mut feed = LogFeed::from_config(&config(5, 0));
    feed.mount();
    let event = feed.wait(Duration::from_secs(2));
    assert!(event.is_some());
    assert_eq!(feed.buffer().len(), 1);
    assert_eq!(feed.buffer().latest(), event.as_ref());
}

#[test]
fn no_mutation_after_unmount() {
    let mut feed = LogFeed::from_config(&config(5, 2));
    let token = feed.mount();
    assert!(feed.unmount(token));
    assert!(feed.buffer().is_empty());
    let ticks = feed.ticks();

    thread::sleep(FAST * 5);
    assert_eq!(feed.poll(), 0);
    assert!(feed.wait(FAST * 3).is_none());
    assert!(feed.buffer().is_empty());
    assert_eq!(feed.ticks(), ticks);

    // teardown is idempotent
    assert!(!feed.unmount(token));
}

#[test]
fn explicit_tick_needs_a_mounted_feed() {
    let mut feed = LogFeed::from_config(&config(5, 2));
    assert!(feed.on_tick().is_none());
    assert!(feed.buffer().is_empty());

    let token = feed.mount();
    assert!(feed.on_tick().is_some());
    assert_eq!(feed.buffer().len(), 3);

    assert!(feed.unmount(token));
    let (_, updates) = feed.subscribe(4);
    assert!(feed.on_tick().is_none());
    assert!(feed.buffer().is_empty());
    assert_eq!(feed.ticks(), 1);
    assert!(updates.try_recv().is_err());
}

#[test]
fn stale_token_does_not_unmount() {
    let mut feed = LogFeed::from_config(&config(2, 0));
    let stale: TickToken = feed.mount();
    assert!(feed.unmount(stale));
    let fresh = feed.mount();
    assert_ne!(stale, fresh);
    assert!(!feed.unmount(stale));
    assert!(feed.is_mounted());
    assert!(feed.unmount(fresh));
}

#[test]
fn subscribers_see_ticks_and_filter_changes() {
    let mut feed = LogFeed::from_config(&config(4, 0));
    let (_, updates) = feed.subscribe(16);
    feed.mount();
    let mounted = updates.try_recv().unwrap();
    assert_eq!(mounted.buffered, 0);

    feed.on_tick();
    feed.on_tick();
    let after_tick = updates.try_recv().unwrap();
    assert_eq!(after_tick.buffered, 1);
    let latest = updates.try_recv().unwrap();
    assert_eq!(latest.buffered, 2);
    assert_eq!(latest.events.len(), 2);

    feed.set_filter(Filter::new(Predicate::Suspicious));
    let filtered = updates.try_recv().unwrap();
    assert_eq!(filtered.filter.predicate(), Predicate::Suspicious);
    assert!(filtered
        .events
        .iter()
        .all(|e| e.classification.suspicious_keywords));

    // same filter again is not a change
    feed.set_filter(Filter::new(Predicate::Suspicious));
    assert!(updates.try_recv().is_err());
}

#[test]
fn slow_subscriber_still_sees_teardown() {
    let mut feed = LogFeed::from_config(&config(4, 1));
    let (_, updates) = feed.subscribe(1);
    let token = feed.mount();
    feed.on_tick();
    assert!(feed.unmount(token));

    let last = updates.latest().unwrap();
    assert_eq!(last.buffered, 0);
    assert!(last.events.is_empty());
}

#[test]
fn unmount_drops_subscribers() {
    let mut feed = LogFeed::from_config(&config(4, 1));
    let (_, updates) = feed.subscribe(8);
    let token = feed.mount();
    assert!(feed.unmount(token));
    assert_eq!(updates.latest().map(|u| u.buffered), Some(0));

    // a remount starts with no subscribers
    feed.mount();
    feed.on_tick();
    assert!(updates.try_recv().is_err());
}

#[test]
fn cycling_uses_configured_threshold() {
    let mut feed = LogFeed::from_config(&FeedConfig {
        threat_threshold: 80,
        ..config(20, 20)
    });
    feed.mount();
    assert_eq!(feed.cycle_predicate(), Predicate::Bots);
    assert_eq!(feed.cycle_predicate(), Predicate::Threats { min_score: 80 });
    assert!(feed.view().all(|e| e.threat_score().value() >= 80));
    assert_eq!(feed.stats().total, feed.view().count());
    assert_eq!(feed.cycle_predicate(), Predicate::Suspicious);
    assert_eq!(feed.cycle_predicate(), Predicate::All);
    assert_eq!(feed.view().count(), 20);
}

#[test]
fn view_never_exceeds_capacity_under_load() {
    let mut feed = LogFeed::from_config(&config(7, 7));
    feed.mount();
    for _ in 0..100 {
        feed.on_tick();
        assert!(feed.buffer().len() <= 7);
    }
    let events: Vec<&Event> = feed.buffer().iter().collect();
    assert!(events
        .windows(2)
        .all(|w| w[0].id > w[1].id && w[0].timestamp >= w[1].timestamp));
}
