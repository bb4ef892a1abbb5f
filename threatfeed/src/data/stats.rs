use crate::data::{Event, ThreatLevel};

use std::collections::BTreeMap;

/// Summary of a sequence of events, as shown above the feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedStats {
    pub total: usize,
    pub bots: usize,
    pub automated: usize,
    pub suspicious: usize,
    by_level: [usize; 5],
    score_sum: u64,
    countries: BTreeMap<&'static str, usize>,
}

impl FeedStats {
    pub fn from_events<'a, I>(events: I) -> FeedStats
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut stats = FeedStats::default();
        for event in events {
            stats.add(event);
        }
        stats
    }

    pub fn add(&mut self, event: &Event) {
        let c = &event.classification;
        self.total += 1;
        self.bots += c.is_bot as usize;
        self.automated += c.is_automated as usize;
        self.suspicious += c.suspicious_keywords as usize;
        self.by_level[event.threat_level().index()] += 1;
        self.score_sum += u64::from(c.threat_score.value());
        *self.countries.entry(event.origin.country).or_default() += 1;
    }

    pub fn count(&self, level: ThreatLevel) -> usize {
        self.by_level[level.index()]
    }

    /// Events at `High` or above.
    pub fn high_or_worse(&self) -> usize {
        self.count(ThreatLevel::High) + self.count(ThreatLevel::Critical)
    }

    pub fn humans(&self) -> usize {
        self.total - self.bots
    }

    pub fn mean_score(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.score_sum as f64 / self.total as f64
    }

    /// Countries by descending count, ties broken by country code.
    pub fn top_countries(&self, n: usize) -> Vec<(&'static str, usize)> {
        let mut ranked: Vec<(&'static str, usize)> =
            self.countries.iter().map(|(&c, &count)| (c, count)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        ranked.truncate(n);
        ranked
    }
}
