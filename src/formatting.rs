//! Display helpers shared by the console and HTML sinks. Numbers use the
//! pt-BR convention of the upstream data (`1.234,56`).

use crate::model::CanonicalRecord;
use crate::summary::SummaryStats;

pub const MISSING: &str = "-";

pub fn format_decimal(value: f64, places: usize) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }
    let fixed = format!("{:.*}", places, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    let digits = int_part.len();
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (digits - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && fixed.chars().any(|ch| ch.is_ascii_digit() && ch != '0');
    let mut out = String::with_capacity(grouped.len() + frac_part.len() + 2);
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push(',');
        out.push_str(frac_part);
    }
    out
}

pub fn format_price(price: f64) -> String {
    if price == 0.0 {
        "N/A".to_string()
    } else {
        format_decimal(price, 2)
    }
}

pub fn format_percent(value: f64) -> String {
    if value.is_finite() {
        format!("{}%", format_decimal(value, 2))
    } else {
        MISSING.to_string()
    }
}

pub fn format_optional_rank(rank: Option<u32>) -> String {
    rank.map_or_else(|| MISSING.to_string(), |value| value.to_string())
}

/// Whole numbers print without decimals; zero and non-numbers print `-`.
pub fn format_rank_value(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        MISSING.to_string()
    } else if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format_decimal(value, 2)
    }
}

pub fn symbol_or_placeholder(record: Option<&CanonicalRecord>) -> &str {
    record.map_or(MISSING, |record| record.symbol.as_str())
}

/// One of the four top-level widgets, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryCard {
    pub label: &'static str,
    pub value: String,
    pub symbol: String,
}

pub fn summary_cards(stats: &SummaryStats<'_>) -> [SummaryCard; 4] {
    [
        SummaryCard {
            label: "Total stocks",
            value: stats.total.to_string(),
            symbol: String::new(),
        },
        pick_card("Best ROIC", stats.best_roic, "0%", |record| {
            format_percent(record.roic)
        }),
        pick_card("Lowest EV/EBIT", stats.lowest_ev_to_ebit, "0", |record| {
            format_decimal(record.ev_to_ebit, 2)
        }),
        pick_card("Top Magic Formula", stats.top_magic_formula, "N/A", |record| {
            format!("#{}", format_rank_value(record.magic_formula_rank))
        }),
    ]
}

fn pick_card(
    label: &'static str,
    record: Option<&CanonicalRecord>,
    empty: &str,
    value: fn(&CanonicalRecord) -> String,
) -> SummaryCard {
    SummaryCard {
        label,
        value: record.map_or_else(|| empty.to_string(), value),
        symbol: symbol_or_placeholder(record).to_string(),
    }
}
