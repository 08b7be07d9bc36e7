use serde::Serialize;

pub const DEFAULT_GOOD_RANK: f64 = 15.0;
pub const DEFAULT_MEDIUM_RANK: f64 = 40.0;
/// Coloring fallback for metric cells whose rank is missing.
pub const METRIC_RANK_FALLBACK: f64 = 50.0;
/// Coloring fallback for rank, score and Magic Formula cells.
pub const RANK_FALLBACK: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Medium,
    Bad,
    Neutral,
}

impl Severity {
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Good => "rank-good",
            Self::Medium => "rank-medium",
            Self::Bad => "rank-bad",
            Self::Neutral => "rank-neutral",
        }
    }
}

/// Inclusive upper bounds of the good and medium bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankBands {
    pub good: f64,
    pub medium: f64,
}

impl Default for RankBands {
    fn default() -> Self {
        Self {
            good: DEFAULT_GOOD_RANK,
            medium: DEFAULT_MEDIUM_RANK,
        }
    }
}

impl RankBands {
    pub fn new(good: f64, medium: f64) -> Result<Self, String> {
        if !(good.is_finite() && medium.is_finite()) || good <= 0.0 {
            return Err(format!("rank bands must be positive numbers (got {good} and {medium})"));
        }
        if medium < good {
            return Err(format!(
                "medium rank bound {medium} must not be below good rank bound {good}"
            ));
        }
        Ok(Self { good, medium })
    }

    pub fn classify(&self, rank: f64) -> Severity {
        if !rank.is_finite() || rank <= 0.0 {
            Severity::Neutral
        } else if rank <= self.good {
            Severity::Good
        } else if rank <= self.medium {
            Severity::Medium
        } else {
            Severity::Bad
        }
    }

    /// Classifies an optional integer rank, substituting `fallback` when it
    /// is missing.
    pub fn classify_or(&self, rank: Option<u32>, fallback: f64) -> Severity {
        self.classify(rank.map_or(fallback, f64::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bands() {
        let bands = RankBands::default();
        assert_eq!(bands.classify(1.0), Severity::Good);
        assert_eq!(bands.classify(15.0), Severity::Good);
        assert_eq!(bands.classify(16.0), Severity::Medium);
        assert_eq!(bands.classify(40.0), Severity::Medium);
        assert_eq!(bands.classify(41.0), Severity::Bad);
        assert_eq!(bands.classify(9999.0), Severity::Bad);
    }

    #[test]
    fn missing_ranks_are_neutral() {
        let bands = RankBands::default();
        assert_eq!(bands.classify(0.0), Severity::Neutral);
        assert_eq!(bands.classify(f64::NAN), Severity::Neutral);
        assert_eq!(bands.classify(-3.0), Severity::Neutral);
    }

    #[test]
    fn fallbacks_depend_on_call_site() {
        let bands = RankBands::default();
        assert_eq!(bands.classify_or(None, METRIC_RANK_FALLBACK), Severity::Bad);
        assert_eq!(bands.classify_or(None, RANK_FALLBACK), Severity::Bad);
        assert_eq!(bands.classify_or(Some(3), RANK_FALLBACK), Severity::Good);

        let wide = RankBands::new(30.0, 60.0).unwrap();
        assert_eq!(wide.classify_or(None, METRIC_RANK_FALLBACK), Severity::Medium);
        assert_eq!(wide.classify_or(None, RANK_FALLBACK), Severity::Bad);
    }

    #[test]
    fn invalid_bands_are_rejected() {
        assert!(RankBands::new(40.0, 15.0).is_err());
        assert!(RankBands::new(0.0, 15.0).is_err());
        assert!(RankBands::new(10.0, f64::INFINITY).is_err());
        assert!(RankBands::new(10.0, 10.0).is_ok());
    }
}
