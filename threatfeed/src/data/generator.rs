//! Generator
//! Produces synthetic `Event`s from fixed value pools and independent
//! uniform samples. The random source and the clock are injected so that
//! callers can reproduce a sequence exactly.

use crate::data::{
    ClientHints, Classification, Event, EventId, IpActivity, Method, Origin, Request, ThreatScore,
};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::net::Ipv4Addr;

pub const COUNTRIES: [&str; 10] = ["US", "CN", "RU", "DE", "BR", "IN", "UK", "FR", "JP", "KR"];

pub const ENDPOINTS: [&str; 6] = [
    "/api/users",
    "/api/auth/login",
    "/api/data",
    "/admin",
    "/api/payments",
    "/api/search",
];

pub const BROWSER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_1) AppleWebKit/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15",
];

pub const AUTOMATION_AGENTS: [&str; 5] = [
    "python-requests/2.28.0",
    "curl/7.81.0",
    "HeadlessChrome/119.0.0.0",
    "Go-http-client/1.1",
    "Apache-HttpClient/4.5.13",
];

// Bernoulli rates for the boolean fields.
const P_BOT: f64 = 0.3;
const P_AUTOMATED: f64 = 0.2;
const P_SUSPICIOUS: f64 = 0.1;
const P_CHROME: f64 = 0.7;
const P_FIREFOX: f64 = 0.3;
const P_MOBILE: f64 = 0.4;
const P_WINDOWS: f64 = 0.6;
const P_QUERY: f64 = 0.5;

/// Anything that can hand out one new record per call.
pub trait EventSource {
    fn next_event(&mut self) -> Event;
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct Generator<R = StdRng, C = SystemClock> {
    rng: R,
    clock: C,
    next_id: EventId,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Generator<StdRng, SystemClock> {
    pub fn from_entropy() -> Self {
        Generator::new(StdRng::from_entropy(), SystemClock)
    }

    pub fn seeded(seed: u64) -> Self {
        Generator::new(StdRng::seed_from_u64(seed), SystemClock)
    }
}

impl<R: Rng, C: Clock> Generator<R, C> {
    pub fn new(rng: R, clock: C) -> Self {
        Generator {
            rng,
            clock,
            next_id: 0,
            last_timestamp: None,
        }
    }

    /// Number of events handed out so far.
    pub fn issued(&self) -> u64 {
        self.next_id
    }

    pub fn generate(&mut self) -> Event {
        let id = self.next_id;
        self.next_id += 1;
        let timestamp = self.stamp();

        let rng = &mut self.rng;
        let is_bot = rng.gen_bool(P_BOT);
        let user_agent = if is_bot {
            AUTOMATION_AGENTS[rng.gen_range(0..AUTOMATION_AGENTS.len())]
        } else {
            BROWSER_AGENTS[rng.gen_range(0..BROWSER_AGENTS.len())]
        };

        Event {
            id,
            timestamp,
            origin: Origin {
                ip: Ipv4Addr::new(
                    rng.gen_range(0..255),
                    rng.gen_range(0..255),
                    rng.gen_range(0..255),
                    rng.gen_range(0..255),
                ),
                country: COUNTRIES[rng.gen_range(0..COUNTRIES.len())],
                country_risk_score: rng.gen_range(0..100),
            },
            classification: Classification {
                threat_score: ThreatScore::new(rng.gen_range(0..100)),
                is_bot,
                is_automated: rng.gen_bool(P_AUTOMATED),
                suspicious_keywords: rng.gen_bool(P_SUSPICIOUS),
            },
            request: Request {
                method: Method::try_from(rng.gen_range(0..Method::COUNT)).unwrap_or(Method::Get),
                endpoint: ENDPOINTS[rng.gen_range(0..ENDPOINTS.len())],
                user_agent,
                endpoint_depth: rng.gen_range(1..=5),
                has_query_params: rng.gen_bool(P_QUERY),
            },
            activity: IpActivity {
                request_count: rng.gen_range(0..500),
                hourly_requests: rng.gen_range(0..100),
                unique_endpoints: rng.gen_range(0..20),
            },
            client: ClientHints {
                is_chrome: rng.gen_bool(P_CHROME),
                is_firefox: rng.gen_bool(P_FIREFOX),
                is_mobile: rng.gen_bool(P_MOBILE),
                is_windows: rng.gen_bool(P_WINDOWS),
            },
        }
    }

    // Never step backwards, even if the wall clock does.
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = self.clock.now();
        let timestamp = match self.last_timestamp {
            Some(prev) if now < prev => prev,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }
}

impl<R: Rng, C: Clock> EventSource for Generator<R, C> {
    fn next_event(&mut self) -> Event {
        self.generate()
    }
}

impl<R: Rng, C: Clock> Iterator for Generator<R, C> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        Some(self.generate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::cell::Cell;

    /// Steps through a scripted list of offsets (seconds) from a fixed base.
    struct ScriptedClock {
        offsets: Vec<i64>,
        pos: Cell<usize>,
    }

    impl Clock for ScriptedClock {
        fn now(&self) -> DateTime<Utc> {
            let i = self.pos.get();
            self.pos.set(i + 1);
            let offset = self.offsets[i.min(self.offsets.len() - 1)];
            Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(offset)
        }
    }

    #[test]
    fn seeded_generators_agree() {
        let a: Vec<Event> = Generator::seeded(42).take(16).collect();
        let b: Vec<Event> = Generator::seeded(42).take(16).collect();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.origin, y.origin);
            assert_eq!(x.classification, y.classification);
            assert_eq!(x.request, y.request);
            assert_eq!(x.activity, y.activity);
            assert_eq!(x.client, y.client);
        }
    }

    #[test]
    fn fields_stay_in_range() {
        let mut gen = Generator::seeded(7);
        for _ in 0..2000 {
            let e = gen.generate();
            assert!(e.classification.threat_score.value() < 100);
            assert!(e.origin.country_risk_score < 100);
            assert!(COUNTRIES.contains(&e.origin.country));
            assert!(ENDPOINTS.contains(&e.request.endpoint));
            assert!((1..=5).contains(&e.request.endpoint_depth));
            assert!(e.activity.request_count < 500);
            assert!(e.activity.hourly_requests < 100);
            assert!(e.activity.unique_endpoints < 20);
            assert!(e.origin.ip.octets().iter().all(|&o| o < 255));
            if e.classification.is_bot {
                assert!(AUTOMATION_AGENTS.contains(&e.request.user_agent));
            } else {
                assert!(BROWSER_AGENTS.contains(&e.request.user_agent));
            }
        }
    }

    #[test]
    fn ids_are_monotonic() {
        let mut gen = Generator::seeded(1);
        let ids: Vec<EventId> = (0..5).map(|_| gen.generate().id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(gen.issued(), 5);
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let clock = ScriptedClock {
            offsets: vec![10, 5, 20, 15, 30],
            pos: Cell::new(0),
        };
        let mut gen = Generator::new(StdRng::seed_from_u64(3), clock);
        let stamps: Vec<i64> = (0..5)
            .map(|_| gen.generate().timestamp.timestamp() - 1_700_000_000)
            .collect();
        assert_eq!(stamps, vec![10, 10, 20, 20, 30]);
    }

    #[test]
    fn flag_rates_are_plausible() {
        let mut gen = Generator::seeded(99);
        let n = 10_000;
        let bots = (0..n).filter(|_| gen.generate().classification.is_bot).count();
        let rate = bots as f64 / n as f64;
        assert!((0.25..0.35).contains(&rate), "bot rate {rate}");
    }
}
