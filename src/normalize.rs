//! Envelope unwrapping and field reconciliation between the two backend
//! record shapes.
//!
//! Field resolution mirrors the upstream dashboard's leniency: a value only
//! counts when it is "truthy" (not `null`, `false`, `0` or `""`), otherwise
//! the documented default is substituted. Nothing here fails once the payload
//! is known to be an array.

use crate::error::PipelineError;
use crate::model::{CanonicalRecord, Envelope, RawRecord, RawResponse};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, warn};

pub const MISSING_RANK: f64 = 9999.0;
pub const PLACEHOLDER: &str = "-";
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

pub fn unwrap_envelope(response: RawResponse) -> Result<Envelope, PipelineError> {
    let RawResponse { origin, body } = response;
    let date = body
        .get("date")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let payload = match body {
        Value::Object(mut map) => match map.remove("message") {
            Some(message) if is_truthy(&message) => message,
            _ => Value::Object(map),
        },
        other => other,
    };

    let items = match payload {
        Value::Array(items) => items,
        other => {
            return Err(PipelineError::malformed(
                origin,
                format!("expected an array of records, found {}", json_kind(&other)),
            ));
        }
    };

    let mut skipped = 0usize;
    let records: Vec<RawRecord> = items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => map,
            _ => {
                skipped += 1;
                RawRecord::new()
            }
        })
        .collect();
    if skipped > 0 {
        warn!(origin = %origin, skipped, "non-object records replaced with empty records");
    }
    debug!(origin = %origin, records = records.len(), date = ?date, "unwrapped response envelope");

    Ok(Envelope { records, date })
}

/// Date used for records that carry none: the envelope date when present,
/// otherwise `today`. Both are rendered as `dd/mm/YYYY`; an envelope date in
/// an unknown format is kept verbatim.
pub fn resolve_global_date(envelope_date: Option<&str>, today: NaiveDate) -> String {
    let Some(raw) = envelope_date.map(str::trim).filter(|value| !value.is_empty()) else {
        return today.format(DISPLAY_DATE_FORMAT).to_string();
    };
    parse_calendar_date(raw).map_or_else(
        || raw.to_string(),
        |date| date.format(DISPLAY_DATE_FORMAT).to_string(),
    )
}

fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.date_naive());
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(parsed);
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|parsed| parsed.date())
}

pub fn normalize(raw_records: &[RawRecord], global_date: &str) -> Vec<CanonicalRecord> {
    raw_records
        .iter()
        .map(|record| normalize_record(record, global_date))
        .collect()
}

fn normalize_record(record: &RawRecord, global_date: &str) -> CanonicalRecord {
    let symbol = text_field(record, "papel")
        .or_else(|| text_field(record, "ticker"))
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    let sector = text_field(record, "setor").unwrap_or_else(|| PLACEHOLDER.to_string());
    let price = match record.get("preco") {
        None | Some(Value::Null) => 0.0,
        Some(value) => numeric_value(value),
    };
    let date = text_field(record, "data").unwrap_or_else(|| global_date.to_string());

    CanonicalRecord {
        symbol,
        sector,
        price,
        date,
        magic_formula_rank: metric_or(record, "magic_formula", MISSING_RANK),
        roic: metric_or(record, "roic", 0.0),
        ev_to_ebit: metric_or(record, "ev_ebit", 0.0),
        score: metric_or(record, "score", 0.0),
        rank_roic: rank_field(record, "rank_roic"),
        rank_ev_to_ebit: rank_field(record, "rank_ev_ebit"),
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Numeric reading of a present value. Anything that is not a number or a
/// numeric string becomes `NaN`, which the sort engine maps to its sentinel.
pub fn numeric_value(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        Value::String(text) => parse_decimal(text).unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Accepts `12.5`, `12,5`, `1.234,56` and `1,234.56`. When both separators
/// appear, the last one is the decimal mark; anything ambiguous is `None`.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = match (trimmed.rfind(','), trimmed.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => trimmed.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => trimmed.replace(',', ""),
        (Some(_), None) => trimmed.replace(',', "."),
        (None, _) => trimmed.to_string(),
    };
    normalized.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn metric_or(record: &RawRecord, key: &str, default: f64) -> f64 {
    match record.get(key) {
        Some(value) if is_truthy(value) => numeric_value(value),
        _ => default,
    }
}

fn text_field(record: &RawRecord, key: &str) -> Option<String> {
    let value = record.get(key).filter(|value| is_truthy(value))?;
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    };
    if text.is_empty() { None } else { Some(text) }
}

fn rank_field(record: &RawRecord, key: &str) -> Option<u32> {
    let value = record.get(key).filter(|value| is_truthy(value))?;
    let rank = numeric_value(value);
    if rank.is_finite() && rank >= 1.0 && rank <= f64::from(u32::MAX) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(rank.round() as u32)
    } else {
        None
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    fn response(body: Value) -> RawResponse {
        RawResponse {
            origin: "test".to_string(),
            body,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    #[test]
    fn symbol_prefers_papel_over_ticker() {
        let records = [
            raw(json!({"papel": "PETR4", "ticker": "IGNORED"})),
            raw(json!({"ticker": "VALE3"})),
            raw(json!({"papel": "", "ticker": "ITUB4"})),
            raw(json!({"papel": null, "ticker": "BBAS3"})),
        ];
        let symbols: Vec<String> = normalize(&records, "01/01/2026")
            .into_iter()
            .map(|record| record.symbol)
            .collect();
        assert_eq!(symbols, ["PETR4", "VALE3", "ITUB4", "BBAS3"]);
    }

    #[test]
    fn missing_identity_gets_placeholder() {
        let records = [raw(json!({"roic": 10}))];
        assert_eq!(normalize(&records, "d")[0].symbol, PLACEHOLDER);
    }

    #[test]
    fn bare_record_gets_all_defaults() {
        let records = [raw(json!({"papel": "ABCD3"}))];
        let record = &normalize(&records, "14/10/2026")[0];
        assert_eq!(record.symbol, "ABCD3");
        assert_eq!(record.sector, "-");
        assert!(record.price.abs() < f64::EPSILON);
        assert_eq!(record.date, "14/10/2026");
        assert!((record.magic_formula_rank - MISSING_RANK).abs() < f64::EPSILON);
        assert!(record.roic.abs() < f64::EPSILON);
        assert!(record.ev_to_ebit.abs() < f64::EPSILON);
        assert!(record.score.abs() < f64::EPSILON);
        assert_eq!(record.rank_roic, None);
        assert_eq!(record.rank_ev_to_ebit, None);
    }

    #[test]
    fn full_record_keeps_its_values() {
        let records = [raw(json!({
            "papel": "WEGE3",
            "setor": "Bens Industriais",
            "preco": 38.5,
            "data": "10/10/2026",
            "magic_formula": 3,
            "roic": 25.1,
            "ev_ebit": 7.2,
            "score": 12,
            "rank_roic": 4,
            "rank_ev_ebit": 8
        }))];
        let record = &normalize(&records, "14/10/2026")[0];
        assert_eq!(record.sector, "Bens Industriais");
        assert!((record.price - 38.5).abs() < f64::EPSILON);
        assert_eq!(record.date, "10/10/2026");
        assert!((record.magic_formula_rank - 3.0).abs() < f64::EPSILON);
        assert!((record.roic - 25.1).abs() < f64::EPSILON);
        assert!((record.ev_to_ebit - 7.2).abs() < f64::EPSILON);
        assert!((record.score - 12.0).abs() < f64::EPSILON);
        assert_eq!(record.rank_roic, Some(4));
        assert_eq!(record.rank_ev_to_ebit, Some(8));
    }

    #[test]
    fn zero_price_is_kept_but_null_price_defaults() {
        let records = [
            raw(json!({"papel": "A", "preco": 0})),
            raw(json!({"papel": "B", "preco": null})),
            raw(json!({"papel": "C", "preco": "12,50"})),
        ];
        let prices: Vec<f64> = normalize(&records, "d").iter().map(|r| r.price).collect();
        assert!(prices[0].abs() < f64::EPSILON);
        assert!(prices[1].abs() < f64::EPSILON);
        assert!((prices[2] - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_magic_formula_counts_as_missing() {
        let records = [raw(json!({"papel": "A", "magic_formula": 0}))];
        let record = &normalize(&records, "d")[0];
        assert!((record.magic_formula_rank - MISSING_RANK).abs() < f64::EPSILON);
    }

    #[test]
    fn non_numeric_metric_becomes_nan() {
        let records = [raw(json!({"papel": "A", "roic": "n/a", "ev_ebit": true}))];
        let record = &normalize(&records, "d")[0];
        assert!(record.roic.is_nan());
        assert!(record.ev_to_ebit.is_nan());
    }

    #[test]
    fn output_preserves_length_and_order() {
        let records: Vec<RawRecord> = (0..25)
            .map(|idx| raw(json!({"ticker": format!("T{idx:02}")})))
            .collect();
        let normalized = normalize(&records, "d");
        assert_eq!(normalized.len(), records.len());
        assert_eq!(normalized[0].symbol, "T00");
        assert_eq!(normalized[24].symbol, "T24");
    }

    #[test]
    fn envelope_with_message_and_date() {
        let envelope = unwrap_envelope(response(json!({
            "message": [{"papel": "PETR4"}],
            "date": "2026-10-01"
        })))
        .unwrap();
        assert_eq!(envelope.records.len(), 1);
        assert_eq!(envelope.date.as_deref(), Some("2026-10-01"));
    }

    #[test]
    fn bare_array_body_is_the_payload() {
        let envelope = unwrap_envelope(response(json!([{"ticker": "VALE3"}, {"ticker": "ITUB4"}])))
            .unwrap();
        assert_eq!(envelope.records.len(), 2);
        assert_eq!(envelope.date, None);
    }

    #[test]
    fn object_without_array_is_malformed() {
        let err = unwrap_envelope(response(json!({"status": "ok"}))).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedResponse { .. }));

        let err = unwrap_envelope(response(json!({"message": "maintenance"}))).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedResponse { .. }));
    }

    #[test]
    fn empty_message_falls_back_to_body() {
        let err = unwrap_envelope(response(json!({"message": null}))).unwrap_err();
        assert!(err.to_string().contains("found an object"));
    }

    #[test]
    fn non_object_items_become_empty_records() {
        let envelope = unwrap_envelope(response(json!([1, {"papel": "X"}]))).unwrap();
        assert!(envelope.records[0].is_empty());
        assert_eq!(normalize(&envelope.records, "d")[0].symbol, PLACEHOLDER);
    }

    #[test]
    fn global_date_formats() {
        assert_eq!(resolve_global_date(Some("2026-10-01"), today()), "01/10/2026");
        assert_eq!(
            resolve_global_date(Some("2026-10-01T12:30:00Z"), today()),
            "01/10/2026"
        );
        assert_eq!(
            resolve_global_date(Some("2026-10-01 08:00:00"), today()),
            "01/10/2026"
        );
        assert_eq!(resolve_global_date(Some("outubro"), today()), "outubro");
        assert_eq!(resolve_global_date(None, today()), "14/10/2026");
        assert_eq!(resolve_global_date(Some("  "), today()), "14/10/2026");
    }

    #[test]
    fn decimal_parsing() {
        assert_eq!(parse_decimal("12.5"), Some(12.5));
        assert_eq!(parse_decimal("12,5"), Some(12.5));
        assert_eq!(parse_decimal("1.234,56"), Some(1234.56));
        assert_eq!(parse_decimal("1,234.56"), Some(1234.56));
        assert_eq!(parse_decimal("1.234.567,8"), Some(1_234_567.8));
        assert_eq!(parse_decimal("1,234,567.8"), Some(1_234_567.8));
        assert_eq!(parse_decimal("1,234,567"), None);
        assert_eq!(parse_decimal("1,2.3,4"), None);
        assert_eq!(parse_decimal("18%"), Some(18.0));
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal(""), None);
    }
}
