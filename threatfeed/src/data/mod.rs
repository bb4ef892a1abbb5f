mod buffer;
mod event;
mod filter;
mod generator;
mod stats;
mod threat;

pub use buffer::{FeedBuffer, DEFAULT_CAPACITY};
pub use event::{ClientHints, Classification, Event, EventId, IpActivity, Method, Origin, Request};
pub use filter::{
    select, EndpointPattern, EventFilter, Filter, FilterError, Predicate,
    DEFAULT_THREAT_THRESHOLD,
};
pub use generator::{
    Clock, EventSource, Generator, SystemClock, AUTOMATION_AGENTS, BROWSER_AGENTS, COUNTRIES,
    ENDPOINTS,
};
pub use stats::FeedStats;
pub use threat::{ThreatLevel, ThreatScore};
