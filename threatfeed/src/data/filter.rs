use crate::data::{Event, FeedBuffer};

use glob::Pattern;
use thiserror::Error;

pub const DEFAULT_THREAT_THRESHOLD: u8 = 60;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Unknown filter '{0}' (expected one of: all, bots, threats, suspicious)")]
    UnknownPredicate(String),

    #[error("Invalid endpoint pattern: {0}")]
    InvalidPattern(String),
}

/// Anything that can decide whether an event is shown.
pub trait EventFilter {
    fn matches(&self, event: &Event) -> bool;
}

/// The closed set of category selectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Predicate {
    #[default]
    All,
    Bots,
    Threats { min_score: u8 },
    Suspicious,
}

impl Predicate {
    pub fn threats() -> Predicate {
        Predicate::Threats {
            min_score: DEFAULT_THREAT_THRESHOLD,
        }
    }

    /// Parses `all`, `bots`, `threats` or `suspicious`. `threshold` applies
    /// to `threats`.
    pub fn parse(name: &str, threshold: u8) -> Result<Predicate, FilterError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Predicate::All),
            "bots" => Ok(Predicate::Bots),
            "threats" => Ok(Predicate::Threats {
                min_score: threshold,
            }),
            "suspicious" => Ok(Predicate::Suspicious),
            _ => Err(FilterError::UnknownPredicate(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Predicate::All => "all",
            Predicate::Bots => "bots",
            Predicate::Threats { .. } => "threats",
            Predicate::Suspicious => "suspicious",
        }
    }

    /// Next selector in menu order, wrapping around. The threat threshold
    /// is carried over.
    pub fn cycle(self, threshold: u8) -> Predicate {
        match self {
            Predicate::All => Predicate::Bots,
            Predicate::Bots => Predicate::Threats {
                min_score: threshold,
            },
            Predicate::Threats { .. } => Predicate::Suspicious,
            Predicate::Suspicious => Predicate::All,
        }
    }
}

impl EventFilter for Predicate {
    fn matches(&self, event: &Event) -> bool {
        let c = &event.classification;
        match *self {
            Predicate::All => true,
            Predicate::Bots => c.is_bot,
            Predicate::Threats { min_score } => c.threat_score.value() >= min_score,
            Predicate::Suspicious => c.suspicious_keywords,
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Threats { min_score } => write!(f, "threats>={}", min_score),
            other => f.write_str(other.name()),
        }
    }
}

/// Glob over request endpoints, e.g. `/api/*`.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointPattern {
    pattern: Pattern,
}

impl EndpointPattern {
    pub fn new(pattern_str: &str) -> Result<Self, FilterError> {
        let corrected = if pattern_str.ends_with('/') {
            format!("{}*", pattern_str) // e.g. "/api/" -> "/api/*"
        } else {
            pattern_str.to_string()
        };

        let pattern =
            Pattern::new(&corrected).map_err(|e| FilterError::InvalidPattern(e.to_string()))?;

        Ok(Self { pattern })
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn matches(&self, endpoint: &str) -> bool {
        self.pattern.matches(endpoint)
    }
}

/// A predicate plus optional keyword and endpoint refinements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicate: Predicate,
    keyword: Option<String>,
    endpoint: Option<EndpointPattern>,
}

impl Filter {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            keyword: None,
            endpoint: None,
        }
    }

    /// Case-insensitive search over endpoint, user agent, country, IP and
    /// method. An empty keyword clears the search.
    pub fn with_keyword(mut self, keyword: &str) -> Self {
        let keyword = keyword.trim();
        self.keyword = if keyword.is_empty() {
            None
        } else {
            Some(keyword.to_lowercase())
        };
        self
    }

    pub fn with_endpoint(mut self, pattern: &str) -> Result<Self, FilterError> {
        self.endpoint = Some(EndpointPattern::new(pattern)?);
        Ok(self)
    }

    pub fn predicate(&self) -> Predicate {
        self.predicate
    }

    pub fn set_predicate(&mut self, predicate: Predicate) {
        self.predicate = predicate;
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn endpoint(&self) -> Option<&EndpointPattern> {
        self.endpoint.as_ref()
    }

    fn matches_keyword(&self, event: &Event) -> bool {
        let Some(keyword) = &self.keyword else {
            return true;
        };
        let req = &event.request;
        [
            req.endpoint,
            req.user_agent,
            event.origin.country,
            req.method.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(keyword.as_str()))
            || event.origin.ip.to_string().contains(keyword.as_str())
    }
}

impl EventFilter for Filter {
    fn matches(&self, event: &Event) -> bool {
        self.predicate.matches(event)
            && self
                .endpoint
                .as_ref()
                .map_or(true, |p| p.matches(event.request.endpoint))
            && self.matches_keyword(event)
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.predicate)?;
        if let Some(endpoint) = &self.endpoint {
            write!(f, " endpoint={}", endpoint.as_str())?;
        }
        if let Some(keyword) = &self.keyword {
            write!(f, " search=\"{}\"", keyword)?;
        }
        Ok(())
    }
}

/// Lazily yields the events of `buffer` accepted by `filter`, newest first.
/// The buffer is only borrowed.
pub fn select<'a, F: EventFilter + ?Sized>(
    buffer: &'a FeedBuffer,
    filter: &'a F,
) -> impl Iterator<Item = &'a Event> + 'a {
    buffer.iter().filter(move |event| filter.matches(event))
}
