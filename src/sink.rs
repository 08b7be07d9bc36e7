use crate::error::PipelineError;
use crate::model::{CanonicalRecord, Model};
use crate::sort::SortCriterion;
use crate::summary::SummaryStats;

/// Consumer of a finished cycle. `render_error` replaces whatever table the
/// sink showed before.
pub trait PresentationSink {
    fn render_loading(&mut self, _model: Model) {}

    fn render_table(&mut self, model: Model, criterion: SortCriterion, records: &[CanonicalRecord]);

    fn render_summary(&mut self, stats: &SummaryStats<'_>);

    fn render_error(&mut self, model: Model, error: &PipelineError);
}
