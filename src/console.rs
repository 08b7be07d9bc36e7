use crate::error::PipelineError;
use crate::formatting::{
    format_decimal, format_optional_rank, format_percent, format_price, format_rank_value,
    summary_cards,
};
use crate::model::{CanonicalRecord, Model};
use crate::severity::{METRIC_RANK_FALLBACK, RANK_FALLBACK, RankBands, Severity};
use crate::sink::PresentationSink;
use crate::sort::SortCriterion;
use crate::summary::SummaryStats;
use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};

const COMPACT_ROWS: usize = 10;
const SECTOR_WIDTH: usize = 18;

/// Terminal rendering of the ranking table and the summary widgets.
pub struct ConsoleSink {
    bands: RankBands,
    full_output: bool,
    announce_loading: bool,
    run_started_at: DateTime<Local>,
    origin: Option<String>,
}

impl ConsoleSink {
    pub const fn new(bands: RankBands, full_output: bool, run_started_at: DateTime<Local>) -> Self {
        Self {
            bands,
            full_output,
            announce_loading: false,
            run_started_at,
            origin: None,
        }
    }

    /// Prints a loading line when no spinner is shown for the fetch.
    #[must_use]
    pub fn with_loading_notice(mut self, announce: bool) -> Self {
        self.announce_loading = announce;
        self
    }

    pub fn set_origin(&mut self, origin: Option<&str>) {
        self.origin = origin.map(str::to_string);
    }

    fn print_header(&self, model: Model, criterion: SortCriterion, count: usize) {
        println!();
        println!(
            "{}",
            "===================== MagicRank Update ====================="
                .bold()
                .bright_cyan()
        );
        println!(
            "{} {}",
            "Run started".bright_yellow().bold(),
            self.run_started_at
                .format("%Y-%m-%d %H:%M:%S %Z")
                .to_string()
                .bright_white()
        );
        println!(
            "{} {} | {} | {}",
            "Model".bright_yellow().bold(),
            model.as_str().bright_white(),
            format!("Stocks: {count}").bright_white(),
            format!("Sorted by: {}", criterion.label()).bright_white()
        );
        if let Some(origin) = self.origin.as_deref() {
            println!("{} {}", "Source".bright_yellow().bold(), origin.bright_black());
        }
        println!();
    }

    fn print_full_table(&self, records: &[CanonicalRecord]) -> usize {
        let header = format!(
            "{:>3} | {:<7} | {:<18} | {:>9} | {:<10} | {:>8} | {:>8} | {:>6} | {:>6} | {:>6} | {:>5}",
            "Pos",
            "Papel",
            "Setor",
            "Preço",
            "Data",
            "EV/EBIT",
            "ROIC",
            "R.ROIC",
            "R.EV",
            "Score",
            "MF"
        );
        let separator = "----+---------+--------------------+-----------+------------+----------+----------+--------+--------+--------+------";
        let mut max_width = header.chars().count().max(separator.len());
        println!("{}", header.bold().bright_white());
        println!("{}", separator.bright_black());

        for (idx, record) in records.iter().enumerate() {
            let cells = self.colored_cells(record);
            let lead = format!(
                "{:>3} | {:<7} | {:<18} | {:>9} | {:<10} |",
                idx + 1,
                record.symbol,
                truncate(&record.sector, SECTOR_WIDTH),
                format_price(record.price),
                record.date
            );
            max_width = max_width.max(lead.chars().count() + 58);
            println!(
                "{} {} | {} | {} | {} | {} | {}",
                lead.bright_white(),
                cells.ev_to_ebit,
                cells.roic,
                cells.rank_roic,
                cells.rank_ev_to_ebit,
                cells.score,
                cells.magic
            );
        }

        max_width
    }

    fn print_compact_table(&self, records: &[CanonicalRecord]) -> usize {
        let header = format!(
            "{:>3} | {:<7} | {:<18} | {:>9} | {:>8} | {:>8} | {:>6} | {:>5}",
            "Pos", "Papel", "Setor", "Preço", "EV/EBIT", "ROIC", "Score", "MF"
        );
        let separator =
            "----+---------+--------------------+-----------+----------+----------+--------+------";
        let mut max_width = header.chars().count().max(separator.len());
        println!("{}", header.bold().bright_white());
        println!("{}", separator.bright_black());

        for (idx, record) in records.iter().take(COMPACT_ROWS).enumerate() {
            let cells = self.colored_cells(record);
            let lead = format!(
                "{:>3} | {:<7} | {:<18} | {:>9} |",
                idx + 1,
                record.symbol,
                truncate(&record.sector, SECTOR_WIDTH),
                format_price(record.price)
            );
            max_width = max_width.max(lead.chars().count() + 40);
            println!(
                "{} {} | {} | {} | {}",
                lead.bright_white(),
                cells.ev_to_ebit,
                cells.roic,
                cells.score,
                cells.magic
            );
        }
        if records.len() > COMPACT_ROWS {
            let message = format!(
                "... {} more entries (use --full-output to display all).",
                records.len() - COMPACT_ROWS
            );
            max_width = max_width.max(message.len());
            println!("{}", message.bright_black());
        }

        max_width
    }

    fn colored_cells(&self, record: &CanonicalRecord) -> RowCells {
        let bands = &self.bands;
        let score_rank = if record.score.is_finite() && record.score != 0.0 {
            record.score
        } else {
            RANK_FALLBACK
        };
        RowCells {
            ev_to_ebit: paint(
                format!("{:>8}", format_decimal(record.ev_to_ebit, 2)),
                bands.classify_or(record.rank_ev_to_ebit, METRIC_RANK_FALLBACK),
            ),
            roic: paint(
                format!("{:>8}", format_percent(record.roic)),
                bands.classify_or(record.rank_roic, METRIC_RANK_FALLBACK),
            ),
            rank_roic: paint(
                format!("{:>6}", format_optional_rank(record.rank_roic)),
                bands.classify_or(record.rank_roic, RANK_FALLBACK),
            ),
            rank_ev_to_ebit: paint(
                format!("{:>6}", format_optional_rank(record.rank_ev_to_ebit)),
                bands.classify_or(record.rank_ev_to_ebit, RANK_FALLBACK),
            ),
            score: paint(
                format!("{:>6}", format_rank_value(record.score)),
                bands.classify(score_rank),
            )
            .bold(),
            magic: paint(
                format!("{:>5}", format_rank_value(record.magic_formula_rank)),
                bands.classify(record.magic_formula_rank),
            )
            .bold(),
        }
    }
}

struct RowCells {
    ev_to_ebit: ColoredString,
    roic: ColoredString,
    rank_roic: ColoredString,
    rank_ev_to_ebit: ColoredString,
    score: ColoredString,
    magic: ColoredString,
}

fn paint(text: String, severity: Severity) -> ColoredString {
    match severity {
        Severity::Good => text.bright_green().bold(),
        Severity::Medium => text.bright_yellow(),
        Severity::Bad => text.bright_red(),
        Severity::Neutral => text.bright_black(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

impl PresentationSink for ConsoleSink {
    fn render_loading(&mut self, model: Model) {
        if self.announce_loading {
            println!("{}", format!("Loading model {model}...").bright_black());
        }
    }

    fn render_table(&mut self, model: Model, criterion: SortCriterion, records: &[CanonicalRecord]) {
        self.print_header(model, criterion, records.len());
        println!("{}", "Magic Formula Ranking".bold().bright_magenta());
        if records.is_empty() {
            println!("{}", format!("Model {model} returned no stocks.").bright_black());
            return;
        }
        let width = if self.full_output {
            self.print_full_table(records)
        } else {
            self.print_compact_table(records)
        };
        println!("{}", "=".repeat(width).bright_cyan());
    }

    fn render_summary(&mut self, stats: &SummaryStats<'_>) {
        let cards = summary_cards(stats);
        let line = cards
            .iter()
            .map(|card| {
                if card.symbol.is_empty() {
                    format!("{} {}", card.label.bright_yellow().bold(), card.value.bright_white())
                } else {
                    format!(
                        "{} {} {}",
                        card.label.bright_yellow().bold(),
                        card.value.bright_white(),
                        format!("({})", card.symbol).bright_black()
                    )
                }
            })
            .collect::<Vec<_>>()
            .join(" | ");
        println!("{line}");
    }

    fn render_error(&mut self, model: Model, error: &PipelineError) {
        println!();
        println!(
            "{} {}",
            format!("Failed to load model {model}:").bright_red().bold(),
            error.to_string().bright_white()
        );
        println!(
            "{}",
            "The table was cleared; run again or switch model to retry.".bright_black()
        );
    }
}
