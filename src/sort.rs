use crate::model::CanonicalRecord;
use clap::ValueEnum;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Key used in place of any non-numeric value.
pub const NON_NUMERIC_SENTINEL: f64 = -999_999.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortCriterion {
    #[default]
    #[value(name = "magic_formula")]
    MagicFormula,
    #[value(name = "roic")]
    Roic,
    #[value(name = "ev_ebit")]
    EvEbit,
    #[value(name = "preco")]
    Price,
    #[value(name = "score")]
    Score,
    #[value(name = "papel")]
    Symbol,
}

impl SortCriterion {
    pub const ALL: [Self; 6] = [
        Self::MagicFormula,
        Self::Roic,
        Self::EvEbit,
        Self::Price,
        Self::Score,
        Self::Symbol,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MagicFormula => "magic_formula",
            Self::Roic => "roic",
            Self::EvEbit => "ev_ebit",
            Self::Price => "preco",
            Self::Score => "score",
            Self::Symbol => "papel",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::MagicFormula => "Magic Formula (ascending)",
            Self::Roic => "ROIC (descending)",
            Self::EvEbit => "EV/EBIT (ascending)",
            Self::Price => "Price (descending)",
            Self::Score => "Score (ascending)",
            Self::Symbol => "Symbol (A-Z)",
        }
    }

    /// Unknown names select the default ordering instead of failing.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortCriterion {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|criterion| criterion.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown sort criterion '{trimmed}'"))
    }
}

/// Returns a sorted copy; the input keeps its order. Ties keep their
/// relative input order.
pub fn sort_records(records: &[CanonicalRecord], criterion: SortCriterion) -> Vec<CanonicalRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| compare(a, b, criterion));
    sorted
}

fn compare(a: &CanonicalRecord, b: &CanonicalRecord, criterion: SortCriterion) -> Ordering {
    match criterion {
        SortCriterion::MagicFormula => cmp_keys(a.magic_formula_rank, b.magic_formula_rank),
        SortCriterion::Roic => cmp_keys(b.roic, a.roic),
        SortCriterion::EvEbit => cmp_keys(a.ev_to_ebit, b.ev_to_ebit),
        SortCriterion::Price => cmp_keys(b.price, a.price),
        SortCriterion::Score => cmp_keys(a.score, b.score),
        SortCriterion::Symbol => compare_symbols(&a.symbol, &b.symbol),
    }
}

pub fn sort_key(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        NON_NUMERIC_SENTINEL
    }
}

fn cmp_keys(a: f64, b: f64) -> Ordering {
    sort_key(a).total_cmp(&sort_key(b))
}

fn compare_symbols(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}
