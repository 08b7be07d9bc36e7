use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Upstream record as delivered by a backend; keys and presence vary by model.
pub type RawRecord = Map<String, Value>;

/// Selectable upstream data source. The two backends share the envelope but
/// differ in record shape: model A uses `ticker` and carries no `setor` or
/// `preco`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize)]
pub enum Model {
    A,
    #[default]
    B,
}

impl Model {
    pub const ALL: [Self; 2] = [Self::A, Self::B];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "a" | "A" => Ok(Self::A),
            "b" | "B" => Ok(Self::B),
            other => Err(format!("unknown model '{other}' (expected A or B)")),
        }
    }
}

/// Response body together with where it came from.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub origin: String,
    pub body: Value,
}

/// Record payload and optional response date after unwrapping a response.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    pub records: Vec<RawRecord>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub symbol: String,
    pub sector: String,
    /// `0.0` means unknown.
    pub price: f64,
    pub date: String,
    pub magic_formula_rank: f64,
    pub roic: f64,
    pub ev_to_ebit: f64,
    pub score: f64,
    pub rank_roic: Option<u32>,
    pub rank_ev_to_ebit: Option<u32>,
}
