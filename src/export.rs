use crate::model::CanonicalRecord;
use anyhow::{Context, Result};
use csv::Writer;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    position: usize,
    symbol: &'a str,
    sector: &'a str,
    price: Option<f64>,
    date: &'a str,
    ev_ebit: Option<f64>,
    roic: Option<f64>,
    rank_roic: Option<u32>,
    rank_ev_ebit: Option<u32>,
    score: Option<f64>,
    magic_formula: Option<f64>,
}

/// Serializes rows in the given order. Unknown prices and non-numeric
/// metrics are written as empty cells.
pub fn serialize_table_csv(records: &[CanonicalRecord]) -> Result<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());
    for (idx, record) in records.iter().enumerate() {
        let row = CsvRow {
            position: idx + 1,
            symbol: &record.symbol,
            sector: &record.sector,
            price: Some(record.price).filter(|price| *price != 0.0 && price.is_finite()),
            date: &record.date,
            ev_ebit: finite(record.ev_to_ebit),
            roic: finite(record.roic),
            rank_roic: record.rank_roic,
            rank_ev_ebit: record.rank_ev_to_ebit,
            score: finite(record.score),
            magic_formula: finite(record.magic_formula_rank),
        };
        writer
            .serialize(row)
            .context("failed to serialize ranking row")?;
    }
    finalize_writer(writer, "ranking CSV writer")
}

fn finite(value: f64) -> Option<f64> {
    Some(value).filter(|value| value.is_finite())
}

fn finalize_writer(mut writer: Writer<Vec<u8>>, label: &str) -> Result<Vec<u8>> {
    writer
        .flush()
        .with_context(|| format!("failed to flush {label}"))?;
    writer
        .into_inner()
        .with_context(|| format!("failed to finalize {label}"))
}

pub fn archive_gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .context("failed to compress CSV output")?;
    encoder.finish().context("failed to finish gzip stream")
}

/// `report.csv` becomes `report.csv.gz`; paths already ending in `.gz` are
/// left alone.
pub fn archive_path(path: &Path) -> PathBuf {
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
    {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

/// Writes the sorted table as CSV, gzip-compressed when `archive` is set.
/// Returns the path actually written.
pub async fn save_table_csv(
    path: &Path,
    records: &[CanonicalRecord],
    archive: bool,
) -> Result<PathBuf> {
    let serialized = serialize_table_csv(records)?;
    if archive {
        let target = archive_path(path);
        write_output_file(&target, &archive_gzip(&serialized)?).await?;
        Ok(target)
    } else {
        write_output_file(path, &serialized).await?;
        Ok(path.to_path_buf())
    }
}

pub async fn write_output_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    fs::write(path, bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(())
}
