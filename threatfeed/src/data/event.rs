use crate::data::{ThreatLevel, ThreatScore};

use chrono::{DateTime, Utc};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;
use std::net::Ipv4Addr;

pub type EventId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Method {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl Method {
    pub const COUNT: u8 = 4;

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Where the request came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Origin {
    pub ip: Ipv4Addr,
    pub country: &'static str,
    pub country_risk_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub threat_score: ThreatScore,
    pub is_bot: bool,
    pub is_automated: bool,
    pub suspicious_keywords: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub method: Method,
    pub endpoint: &'static str,
    pub user_agent: &'static str,
    pub endpoint_depth: u8,
    pub has_query_params: bool,
}

/// Per-IP counters observed around the time of the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpActivity {
    pub request_count: u32,
    pub hourly_requests: u32,
    pub unique_endpoints: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientHints {
    pub is_chrome: bool,
    pub is_firefox: bool,
    pub is_mobile: bool,
    pub is_windows: bool,
}

/// One simulated traffic record. Records are never modified once they
/// enter a `FeedBuffer`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    pub origin: Origin,
    pub classification: Classification,
    pub request: Request,
    pub activity: IpActivity,
    pub client: ClientHints,
}

impl Event {
    pub fn threat_score(&self) -> ThreatScore {
        self.classification.threat_score
    }

    pub fn threat_level(&self) -> ThreatLevel {
        self.classification.threat_score.level()
    }

    pub fn label(&self) -> String {
        format!("log-{}", self.id)
    }

    /// Short markers shown next to a record, e.g. `["BOT", "AUTO"]`.
    pub fn markers(&self) -> Vec<&'static str> {
        let c = &self.classification;
        let mut markers = Vec::new();
        if c.is_bot {
            markers.push("BOT");
        }
        if c.is_automated {
            markers.push("AUTO");
        }
        if c.suspicious_keywords {
            markers.push("SUSP");
        }
        markers
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LOG({}) {} {:<8} {} ({}) {} {} score={}",
            self.id,
            self.timestamp.format("%H:%M:%S%.3f"),
            self.threat_level(),
            self.origin.ip,
            self.origin.country,
            self.request.method,
            self.request.endpoint,
            self.classification.threat_score,
        )?;
        let markers = self.markers();
        if !markers.is_empty() {
            write!(f, " [{}]", markers.join(" "))?;
        }
        Ok(())
    }
}
