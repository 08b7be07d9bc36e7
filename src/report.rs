use crate::error::PipelineError;
use crate::export::write_output_file;
use crate::formatting::{
    SummaryCard, format_decimal, format_optional_rank, format_percent, format_price,
    format_rank_value, summary_cards,
};
use crate::model::{CanonicalRecord, Model};
use crate::severity::{METRIC_RANK_FALLBACK, RANK_FALLBACK, RankBands};
use crate::sink::PresentationSink;
use crate::sort::SortCriterion;
use crate::summary::SummaryStats;
use anyhow::Result;
use chrono::{DateTime, Local};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::path::Path;

const TABLE_HEADINGS: [&str; 10] = [
    "Papel",
    "Setor",
    "Preço",
    "Data",
    "EV/EBIT",
    "ROIC",
    "Rank ROIC",
    "Rank EV/EBIT",
    "Score",
    "Magic Formula",
];
const COLUMN_COUNT: usize = TABLE_HEADINGS.len();

#[derive(Debug, Clone)]
enum TableBody {
    Loading,
    Rows(Vec<CanonicalRecord>),
    Failed(String),
}

/// Static HTML page with the four summary cards and the ranking table.
#[derive(Debug, Clone)]
pub struct HtmlReport {
    bands: RankBands,
    generated_at: DateTime<Local>,
    model: Model,
    criterion: SortCriterion,
    body: TableBody,
    cards: Option<[SummaryCard; 4]>,
}

impl HtmlReport {
    pub const fn new(bands: RankBands, generated_at: DateTime<Local>) -> Self {
        Self {
            bands,
            generated_at,
            model: Model::B,
            criterion: SortCriterion::MagicFormula,
            body: TableBody::Rows(Vec::new()),
            cards: None,
        }
    }

    pub fn set_generated_at(&mut self, generated_at: DateTime<Local>) {
        self.generated_at = generated_at;
    }

    pub async fn save(&self, output_path: &Path) -> Result<()> {
        write_output_file(output_path, self.to_html().as_bytes()).await
    }

    pub fn to_html(&self) -> String {
        let cards = match (&self.body, &self.cards) {
            (TableBody::Failed(_), _) => None,
            (_, Some(cards)) => Some(cards.clone()),
            (_, None) => Some(summary_cards(&SummaryStats::default())),
        };
        let title = format!(
            "MagicRank Report - {}",
            self.generated_at.format("%Y-%m-%d")
        );
        let generated = self
            .generated_at
            .format("%Y-%m-%d %H:%M:%S %Z")
            .to_string();
        let year = self.generated_at.format("%Y").to_string();

        let page = html! {
            (DOCTYPE)
            html lang="pt-BR" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    meta name="color-scheme" content="dark";
                    title { (title) }
                    style { (PreEscaped(REPORT_STYLE)) }
                }
                body {
                    div.page {
                        header.hero {
                            div.pill { "MagicRank v" (env!("CARGO_PKG_VERSION")) }
                            h1 { "Magic Formula Ranking" }
                            p.subtitle {
                                "Brazilian stocks ranked by return on invested capital and EV/EBIT."
                            }
                            div.meta {
                                div {
                                    span.label { "Generated" }
                                    span.value.mono { (generated) }
                                }
                                div {
                                    span.label { "Model" }
                                    span.value.mono { (self.model.as_str()) }
                                }
                                div {
                                    span.label { "Sorted by" }
                                    span.value.mono { (self.criterion.label()) }
                                }
                            }
                        }
                        @if let Some(cards) = &cards {
                            section.cards {
                                @for card in cards {
                                    div.card {
                                        div."card-label" { (card.label) }
                                        div."card-value" { (card.value) }
                                        @if !card.symbol.is_empty() {
                                            div."card-symbol" { (card.symbol) }
                                        }
                                    }
                                }
                            }
                        }
                        section."table-section" {
                            div."table-wrap" {
                                table {
                                    thead {
                                        tr {
                                            @for heading in TABLE_HEADINGS {
                                                th { (heading) }
                                            }
                                        }
                                    }
                                    tbody { (self.render_body()) }
                                }
                            }
                        }
                        footer.footer {
                            "© " (year) " MagicRank. Data: Magic Formula models A and B."
                        }
                    }
                }
            }
        };
        page.into_string()
    }

    fn render_body(&self) -> Markup {
        match &self.body {
            TableBody::Loading => html! {
                tr {
                    td.placeholder colspan=(COLUMN_COUNT) {
                        "Loading model " (self.model.as_str()) "..."
                    }
                }
            },
            TableBody::Failed(message) => html! {
                tr {
                    td."error-row" colspan=(COLUMN_COUNT) { (message) }
                }
            },
            TableBody::Rows(records) if records.is_empty() => html! {
                tr {
                    td.placeholder colspan=(COLUMN_COUNT) {
                        "Model " (self.model.as_str()) " returned no stocks."
                    }
                }
            },
            TableBody::Rows(records) => html! {
                @for record in records {
                    (self.render_row(record))
                }
            },
        }
    }

    fn render_row(&self, record: &CanonicalRecord) -> Markup {
        let bands = &self.bands;
        let ev_class = bands
            .classify_or(record.rank_ev_to_ebit, METRIC_RANK_FALLBACK)
            .css_class();
        let roic_class = bands
            .classify_or(record.rank_roic, METRIC_RANK_FALLBACK)
            .css_class();
        let rank_roic_class = bands.classify_or(record.rank_roic, RANK_FALLBACK).css_class();
        let rank_ev_class = bands
            .classify_or(record.rank_ev_to_ebit, RANK_FALLBACK)
            .css_class();
        let score_class = bands.classify(value_or(record.score, RANK_FALLBACK)).css_class();
        let magic_class = bands
            .classify(value_or(record.magic_formula_rank, RANK_FALLBACK))
            .css_class();

        html! {
            tr {
                td.symbol { (record.symbol) }
                td { (record.sector) }
                td.num { (format_price(record.price)) }
                td.mono { (record.date) }
                td class={ "num " (ev_class) } { (format_decimal(record.ev_to_ebit, 2)) }
                td class={ "num " (roic_class) } { (format_percent(record.roic)) }
                td class={ "num " (rank_roic_class) } { (format_optional_rank(record.rank_roic)) }
                td class={ "num " (rank_ev_class) } { (format_optional_rank(record.rank_ev_to_ebit)) }
                td class={ "num strong " (score_class) } { (format_rank_value(record.score)) }
                td class={ "num magic " (magic_class) } { (format_rank_value(record.magic_formula_rank)) }
            }
        }
    }
}

impl PresentationSink for HtmlReport {
    fn render_loading(&mut self, model: Model) {
        self.model = model;
        self.body = TableBody::Loading;
    }

    fn render_table(&mut self, model: Model, criterion: SortCriterion, records: &[CanonicalRecord]) {
        self.model = model;
        self.criterion = criterion;
        self.body = TableBody::Rows(records.to_vec());
    }

    fn render_summary(&mut self, stats: &SummaryStats<'_>) {
        self.cards = Some(summary_cards(stats));
    }

    fn render_error(&mut self, model: Model, error: &PipelineError) {
        self.model = model;
        self.body = TableBody::Failed(format!("Failed to load model {model}: {error}"));
        self.cards = None;
    }
}

/// Zero and non-numbers count as missing for coloring.
fn value_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value != 0.0 {
        value
    } else {
        fallback
    }
}

const REPORT_STYLE: &str = r"
:root {
  color-scheme: dark;
  --bg: #0f141b;
  --panel: #17202b;
  --panel-soft: #1d2835;
  --ink: #e6edf3;
  --muted: #8b97a6;
  --border: #263242;
  --accent: #7c5cff;
  --good: #4ade80;
  --medium: #facc15;
  --bad: #f87171;
}

* {
  box-sizing: border-box;
}

body {
  margin: 0;
  font-family: 'Inter', 'Segoe UI', sans-serif;
  color: var(--ink);
  background: radial-gradient(circle at top right, rgba(124, 92, 255, 0.18), transparent 50%), var(--bg);
}

.page {
  max-width: 1280px;
  margin: 0 auto;
  padding: 40px 24px 56px;
}

.hero {
  background: var(--panel);
  border: 1px solid var(--border);
  border-radius: 20px;
  padding: 28px 32px;
}

.pill {
  display: inline-block;
  padding: 4px 12px;
  border-radius: 999px;
  background: rgba(124, 92, 255, 0.18);
  color: var(--accent);
  font-size: 12px;
  font-weight: 600;
  letter-spacing: 0.08em;
  text-transform: uppercase;
}

h1 {
  margin: 14px 0 6px;
  font-size: clamp(2rem, 4vw, 2.8rem);
}

.subtitle {
  margin: 0 0 18px;
  color: var(--muted);
}

.meta {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
  gap: 12px;
}

.label {
  display: block;
  font-size: 11px;
  letter-spacing: 0.1em;
  text-transform: uppercase;
  color: var(--muted);
  margin-bottom: 4px;
}

.value {
  font-weight: 600;
}

.mono {
  font-family: 'JetBrains Mono', ui-monospace, monospace;
}

.cards {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
  gap: 16px;
  margin: 24px 0;
}

.card {
  background: var(--panel);
  border: 1px solid var(--border);
  border-radius: 16px;
  padding: 18px 20px;
}

.card-label {
  font-size: 12px;
  letter-spacing: 0.08em;
  text-transform: uppercase;
  color: var(--muted);
}

.card-value {
  margin-top: 8px;
  font-size: 28px;
  font-weight: 700;
}

.card-symbol {
  margin-top: 4px;
  color: var(--accent);
  font-weight: 600;
}

.table-wrap {
  overflow: auto;
  border: 1px solid var(--border);
  border-radius: 16px;
  background: var(--panel);
}

table {
  width: 100%;
  min-width: 960px;
  border-collapse: collapse;
}

thead th {
  position: sticky;
  top: 0;
  background: var(--panel-soft);
  color: var(--muted);
  font-size: 11px;
  letter-spacing: 0.08em;
  text-align: left;
  text-transform: uppercase;
  padding: 12px 16px;
}

tbody td {
  padding: 10px 16px;
  border-top: 1px solid var(--border);
  font-size: 14px;
  white-space: nowrap;
}

tbody tr:hover {
  background: var(--panel-soft);
}

.num {
  text-align: right;
  font-variant-numeric: tabular-nums;
}

.symbol,
.strong {
  font-weight: 700;
}

.magic {
  font-size: 1.1em;
  font-weight: 700;
}

.rank-good {
  color: var(--good);
  font-weight: 600;
}

.rank-medium {
  color: var(--medium);
}

.rank-bad {
  color: var(--bad);
}

.rank-neutral {
  color: var(--muted);
}

.placeholder,
.error-row {
  text-align: center;
  padding: 28px 16px;
  color: var(--muted);
}

.error-row {
  color: var(--bad);
}

.footer {
  margin-top: 24px;
  text-align: center;
  color: var(--muted);
  font-size: 13px;
}
";
