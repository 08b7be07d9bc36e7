//! Magic Formula stock rankings: fetch a model's payload, normalize it into
//! canonical records, sort, aggregate and render.

pub mod config;
pub mod console;
pub mod error;
pub mod export;
pub mod formatting;
pub mod gateway;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod severity;
pub mod sink;
pub mod sort;
pub mod summary;

pub use config::{Endpoints, Settings};
pub use console::ConsoleSink;
pub use error::{PipelineError, describe_error};
pub use gateway::{FileGateway, Gateway, HttpGateway};
pub use model::{CanonicalRecord, Model, RawRecord, RawResponse};
pub use normalize::normalize;
pub use pipeline::{Applied, FetchTicket, Pipeline};
pub use report::HtmlReport;
pub use severity::{RankBands, Severity};
pub use sink::PresentationSink;
pub use sort::{SortCriterion, sort_records};
pub use summary::{SummaryStats, aggregate};
