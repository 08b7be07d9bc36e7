use crate::model::Model;
use crate::severity::RankBands;
use crate::sort::SortCriterion;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ENDPOINT_A: &str =
    "https://api-invest-307231904601.southamerica-east1.run.app/magic_formula_model_a";
pub const DEFAULT_ENDPOINT_B: &str =
    "https://api-invest-307231904601.southamerica-east1.run.app/magic_formula_model_b";
pub const HTTP_TIMEOUT_SECONDS: u64 = 20;
pub const USER_AGENT: &str = concat!("magicrank/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub model_a: String,
    pub model_b: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            model_a: DEFAULT_ENDPOINT_A.to_string(),
            model_b: DEFAULT_ENDPOINT_B.to_string(),
        }
    }
}

impl Endpoints {
    pub fn url(&self, model: Model) -> &str {
        match model {
            Model::A => &self.model_a,
            Model::B => &self.model_b,
        }
    }
}

/// Runtime settings for one session.
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoints: Endpoints,
    pub timeout: Duration,
    pub user_agent: String,
    pub bands: RankBands,
    pub model: Model,
    pub criterion: SortCriterion,
    /// Saved response to read instead of the network.
    pub input: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECONDS),
            user_agent: USER_AGENT.to_string(),
            bands: RankBands::default(),
            model: Model::default(),
            criterion: SortCriterion::default(),
            input: None,
        }
    }
}
