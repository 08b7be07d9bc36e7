//! Pipeline context: the current canonical collection, its model and the
//! active sort criterion.
//!
//! Every fetch is identified by a [`FetchTicket`]. Only the most recently
//! issued ticket may replace the collection; results for older tickets are
//! discarded, so a slow response can never overwrite a newer selection.

use crate::error::PipelineError;
use crate::gateway::Gateway;
use crate::model::{CanonicalRecord, Model, RawResponse};
use crate::normalize::{normalize, resolve_global_date, unwrap_envelope};
use crate::sink::PresentationSink;
use crate::sort::{SortCriterion, sort_records};
use crate::summary::{SummaryStats, aggregate};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    sequence: u64,
    model: Model,
}

impl FetchTicket {
    pub const fn sequence(self) -> u64 {
        self.sequence
    }

    pub const fn model(self) -> Model {
        self.model
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Replaced { records: usize },
    Stale { sequence: u64, latest: u64 },
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    records: Arc<[CanonicalRecord]>,
    model: Model,
    criterion: SortCriterion,
    origin: Option<String>,
    issued: u64,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Model::default(), SortCriterion::default())
    }
}

impl Pipeline {
    pub fn new(model: Model, criterion: SortCriterion) -> Self {
        Self {
            records: Arc::from(Vec::new()),
            model,
            criterion,
            origin: None,
            issued: 0,
        }
    }

    pub const fn model(&self) -> Model {
        self.model
    }

    pub const fn criterion(&self) -> SortCriterion {
        self.criterion
    }

    /// Where the current collection came from; `None` before the first
    /// successful load.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    /// Shared handle to the current collection, valid until the next
    /// successful load replaces it.
    pub fn snapshot(&self) -> Arc<[CanonicalRecord]> {
        Arc::clone(&self.records)
    }

    pub fn begin(&mut self, model: Model) -> FetchTicket {
        self.issued += 1;
        debug!(%model, sequence = self.issued, "fetch issued");
        FetchTicket {
            sequence: self.issued,
            model,
        }
    }

    /// Applies a fetch result. Errors leave the collection untouched; so do
    /// results for any ticket other than the latest one issued.
    pub fn apply(
        &mut self,
        ticket: FetchTicket,
        result: Result<RawResponse, PipelineError>,
        today: NaiveDate,
    ) -> Result<Applied, PipelineError> {
        if ticket.sequence != self.issued {
            debug!(
                model = %ticket.model,
                sequence = ticket.sequence,
                latest = self.issued,
                "discarding stale response"
            );
            return Ok(Applied::Stale {
                sequence: ticket.sequence,
                latest: self.issued,
            });
        }

        let response = result?;
        let origin = response.origin.clone();
        let envelope = unwrap_envelope(response)?;
        let global_date = resolve_global_date(envelope.date.as_deref(), today);
        let records = normalize(&envelope.records, &global_date);
        let count = records.len();

        self.records = Arc::from(records);
        self.model = ticket.model;
        self.origin = Some(origin);
        info!(model = %ticket.model, records = count, "rankings loaded");
        Ok(Applied::Replaced { records: count })
    }

    pub async fn load<G>(
        &mut self,
        gateway: &G,
        model: Model,
        today: NaiveDate,
    ) -> Result<Applied, PipelineError>
    where
        G: Gateway + ?Sized,
    {
        let ticket = self.begin(model);
        let result = gateway.fetch_model(model).await;
        self.apply(ticket, result, today)
    }

    pub fn set_criterion(&mut self, criterion: SortCriterion) {
        self.criterion = criterion;
    }

    pub fn sorted(&self) -> Vec<CanonicalRecord> {
        sort_records(&self.records, self.criterion)
    }

    pub fn summary(&self) -> SummaryStats<'_> {
        aggregate(&self.records)
    }

    pub fn render(&self, sink: &mut dyn PresentationSink) {
        let sorted = self.sorted();
        sink.render_table(self.model, self.criterion, &sorted);
        sink.render_summary(&self.summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct StubGateway {
        body: Option<Value>,
    }

    #[async_trait]
    impl Gateway for StubGateway {
        async fn fetch_model(&self, model: Model) -> Result<RawResponse, PipelineError> {
            let origin = format!("stub://{model}");
            match &self.body {
                Some(body) => Ok(RawResponse {
                    origin,
                    body: body.clone(),
                }),
                None => Err(PipelineError::status(origin, 500)),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        tables: Vec<Vec<String>>,
        totals: Vec<usize>,
        errors: Vec<String>,
    }

    impl PresentationSink for RecordingSink {
        fn render_table(&mut self, _model: Model, _criterion: SortCriterion, records: &[CanonicalRecord]) {
            self.tables
                .push(records.iter().map(|record| record.symbol.clone()).collect());
        }

        fn render_summary(&mut self, stats: &SummaryStats<'_>) {
            self.totals.push(stats.total);
        }

        fn render_error(&mut self, model: Model, error: &PipelineError) {
            self.errors.push(format!("{model}: {error}"));
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn scenario_body() -> Value {
        json!([
            {"papel": "PETR4", "roic": 30, "ev_ebit": 5, "magic_formula": 2},
            {"ticker": "VALE3", "roic": 40, "ev_ebit": 3, "magic_formula": 1}
        ])
    }

    fn symbols(records: &[CanonicalRecord]) -> Vec<&str> {
        records.iter().map(|record| record.symbol.as_str()).collect()
    }

    #[tokio::test]
    async fn mixed_models_normalize_sort_and_aggregate() {
        let gateway = StubGateway {
            body: Some(scenario_body()),
        };
        let mut pipeline = Pipeline::default();
        let applied = pipeline.load(&gateway, Model::A, today()).await.unwrap();
        assert_eq!(applied, Applied::Replaced { records: 2 });
        assert_eq!(symbols(pipeline.records()), ["PETR4", "VALE3"]);
        assert_eq!(symbols(&pipeline.sorted()), ["VALE3", "PETR4"]);
        assert!(pipeline.records().iter().all(|record| record.date == "14/10/2026"));

        let stats = pipeline.summary();
        assert_eq!(stats.best_roic.map(|r| r.symbol.as_str()), Some("VALE3"));
        assert_eq!(stats.lowest_ev_to_ebit.map(|r| r.symbol.as_str()), Some("VALE3"));
        assert_eq!(stats.top_magic_formula.map(|r| r.symbol.as_str()), Some("VALE3"));
        assert_eq!(pipeline.model(), Model::A);
        assert_eq!(pipeline.origin(), Some("stub://A"));
    }

    #[tokio::test]
    async fn record_without_metrics_survives_every_stage() {
        let gateway = StubGateway {
            body: Some(json!({"message": [{"papel": "ABCD3"}]})),
        };
        let mut pipeline = Pipeline::new(Model::B, SortCriterion::Roic);
        pipeline.load(&gateway, Model::B, today()).await.unwrap();
        let sorted = pipeline.sorted();
        assert_eq!(symbols(&sorted), ["ABCD3"]);
        let record = &sorted[0];
        assert!(record.roic.abs() < f64::EPSILON);
        assert!((record.magic_formula_rank - 9999.0).abs() < f64::EPSILON);

        let stats = pipeline.summary();
        assert_eq!(stats.best_roic.map(|r| r.symbol.as_str()), Some("ABCD3"));
        assert_eq!(stats.lowest_ev_to_ebit.map(|r| r.symbol.as_str()), Some("ABCD3"));
        assert_eq!(stats.top_magic_formula.map(|r| r.symbol.as_str()), Some("ABCD3"));
    }

    #[tokio::test]
    async fn empty_payload_yields_empty_table_and_summary() {
        let gateway = StubGateway {
            body: Some(json!({"message": [], "date": "2026-09-30"})),
        };
        let mut pipeline = Pipeline::default();
        let applied = pipeline.load(&gateway, Model::B, today()).await.unwrap();
        assert_eq!(applied, Applied::Replaced { records: 0 });
        assert!(pipeline.sorted().is_empty());
        let stats = pipeline.summary();
        assert_eq!(stats.total, 0);
        assert!(stats.is_empty());
    }

    #[tokio::test]
    async fn server_error_keeps_previous_collection() {
        let mut pipeline = Pipeline::default();
        let failing = StubGateway { body: None };

        let err = pipeline.load(&failing, Model::B, today()).await.unwrap_err();
        assert_eq!(err.http_status(), Some(500));
        assert!(pipeline.records().is_empty());

        let working = StubGateway {
            body: Some(scenario_body()),
        };
        pipeline.load(&working, Model::B, today()).await.unwrap();
        let before = pipeline.snapshot();

        let err = pipeline.load(&failing, Model::A, today()).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(pipeline.records(), &before[..]);
        assert_eq!(pipeline.model(), Model::B);
    }

    #[tokio::test]
    async fn malformed_payload_keeps_previous_collection() {
        let mut pipeline = Pipeline::default();
        pipeline
            .load(&StubGateway { body: Some(scenario_body()) }, Model::B, today())
            .await
            .unwrap();
        let err = pipeline
            .load(&StubGateway { body: Some(json!({"message": {"papel": "X"}})) }, Model::B, today())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MalformedResponse { .. }));
        assert_eq!(pipeline.records().len(), 2);
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let mut pipeline = Pipeline::default();
        let first = pipeline.begin(Model::A);
        let second = pipeline.begin(Model::B);

        let fresh = RawResponse {
            origin: "stub://B".to_string(),
            body: json!([{"papel": "NEWER"}]),
        };
        let stale = RawResponse {
            origin: "stub://A".to_string(),
            body: json!([{"papel": "OLDER"}]),
        };

        assert_eq!(
            pipeline.apply(second, Ok(fresh), today()).unwrap(),
            Applied::Replaced { records: 1 }
        );
        assert_eq!(
            pipeline.apply(first, Ok(stale), today()).unwrap(),
            Applied::Stale {
                sequence: first.sequence(),
                latest: second.sequence()
            }
        );
        assert_eq!(symbols(pipeline.records()), ["NEWER"]);
        assert_eq!(pipeline.model(), Model::B);
    }

    #[test]
    fn stale_error_is_ignored() {
        let mut pipeline = Pipeline::default();
        let first = pipeline.begin(Model::A);
        let _second = pipeline.begin(Model::B);
        let outcome = pipeline.apply(first, Err(PipelineError::status("stub://A", 503)), today());
        assert!(matches!(outcome, Ok(Applied::Stale { .. })));
    }

    #[tokio::test]
    async fn resorting_does_not_refetch() {
        let gateway = StubGateway {
            body: Some(scenario_body()),
        };
        let mut pipeline = Pipeline::default();
        pipeline.load(&gateway, Model::B, today()).await.unwrap();
        let handle = pipeline.snapshot();

        pipeline.set_criterion(SortCriterion::Symbol);
        assert_eq!(symbols(&pipeline.sorted()), ["PETR4", "VALE3"]);
        pipeline.set_criterion(SortCriterion::EvEbit);
        assert_eq!(symbols(&pipeline.sorted()), ["VALE3", "PETR4"]);
        assert!(Arc::ptr_eq(&handle, &pipeline.snapshot()));
    }

    #[tokio::test]
    async fn render_feeds_sink_sorted_rows() {
        let gateway = StubGateway {
            body: Some(scenario_body()),
        };
        let mut pipeline = Pipeline::default();
        pipeline.load(&gateway, Model::B, today()).await.unwrap();
        let mut sink = RecordingSink::default();
        pipeline.render(&mut sink);
        assert_eq!(sink.tables, vec![vec!["VALE3".to_string(), "PETR4".to_string()]]);
        assert_eq!(sink.totals, vec![2]);
        assert!(sink.errors.is_empty());
    }
}
