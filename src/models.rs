use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One record returned by the search API. Kept opaque; only a handful of
/// fields are read back out for the CSV projection.
pub type SearchResult = Value;

/// A single search filter from `criteria.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Criterion {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl Criterion {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// Body of a successful search response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(Vec<SearchResult>),
    /// The API answered with something other than 200 OK.
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriterionStatus {
    Found(usize),
    Rejected { status: u16, body: String },
    Failed { reason: String },
}

impl CriterionStatus {
    pub fn result_count(&self) -> usize {
        match self {
            CriterionStatus::Found(n) => *n,
            _ => 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CriterionStatus::Found(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriterionReport {
    pub criterion: Criterion,
    pub query: String,
    pub status: CriterionStatus,
}

/// Everything one pass over the criteria produced.
#[derive(Debug, Clone, Default)]
pub struct SearchRun {
    pub results: Vec<SearchResult>,
    pub reports: Vec<CriterionReport>,
}

impl SearchRun {
    pub fn failed_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| !r.status.is_success())
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormats {
    pub json: bool,
    pub csv: bool,
}

impl OutputFormats {
    pub fn any(&self) -> bool {
        self.json || self.csv
    }
}
