use crate::model::{CaseResultRow, RunSummary};

pub mod console;

/// Everything a batch run produces: per-case rows plus the aggregate summary.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub summary: RunSummary,
    pub results: Vec<CaseResultRow>,
}
