use serde::Serialize;

/// Classification score, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct ThreatScore(u8);

impl ThreatScore {
    pub const MAX: u8 = 100;

    /// Values above 100 saturate.
    pub fn new(score: u8) -> ThreatScore {
        ThreatScore(score.min(Self::MAX))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn level(&self) -> ThreatLevel {
        ThreatLevel::from_score(*self)
    }
}

impl std::fmt::Display for ThreatScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ThreatLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    /// Ordered from least to most severe.
    pub const ALL: [ThreatLevel; 5] = [
        ThreatLevel::Safe,
        ThreatLevel::Low,
        ThreatLevel::Medium,
        ThreatLevel::High,
        ThreatLevel::Critical,
    ];

    pub fn from_score(score: ThreatScore) -> ThreatLevel {
        match score.value() {
            80..=u8::MAX => ThreatLevel::Critical,
            60..=79 => ThreatLevel::High,
            40..=59 => ThreatLevel::Medium,
            20..=39 => ThreatLevel::Low,
            _ => ThreatLevel::Safe,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ThreatLevel::Safe => "Safe",
            ThreatLevel::Low => "Low",
            ThreatLevel::Medium => "Medium",
            ThreatLevel::High => "High",
            ThreatLevel::Critical => "Critical",
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_saturates_at_max() {
        assert_eq!(ThreatScore::new(250).value(), 100);
        assert_eq!(ThreatScore::new(100).value(), 100);
        assert_eq!(ThreatScore::new(0).value(), 0);
    }

    #[test]
    fn level_boundaries() {
        let level = |s| ThreatScore::new(s).level();
        assert_eq!(level(0), ThreatLevel::Safe);
        assert_eq!(level(19), ThreatLevel::Safe);
        assert_eq!(level(20), ThreatLevel::Low);
        assert_eq!(level(39), ThreatLevel::Low);
        assert_eq!(level(40), ThreatLevel::Medium);
        assert_eq!(level(59), ThreatLevel::Medium);
        assert_eq!(level(60), ThreatLevel::High);
        assert_eq!(level(79), ThreatLevel::High);
        assert_eq!(level(80), ThreatLevel::Critical);
        assert_eq!(level(100), ThreatLevel::Critical);
    }

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(ThreatLevel::ALL.windows(2).all(|w| w[0] < w[1]));
        for (i, level) in ThreatLevel::ALL.iter().enumerate() {
            assert_eq!(level.index(), i);
        }
    }
}
