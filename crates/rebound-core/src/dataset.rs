use crate::errors::ConfigError;
use crate::model::TestCase;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads the ground-truth dataset: a JSON array of
/// {question, expected_sql, optional expected_result} records.
/// The original dataset's `natural_language`/`sql` field names are accepted
/// as aliases. Cases without an id get a positional one.
pub fn load_dataset(path: &Path) -> Result<Vec<TestCase>, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read dataset {}: {}", path.display(), e)))?;
    let mut cases: Vec<TestCase> = serde_json::from_str(&raw)
        .map_err(|e| ConfigError(format!("failed to parse dataset JSON: {}", e)))?;
    if cases.is_empty() {
        return Err(ConfigError("dataset has no test cases".into()));
    }
    for (i, tc) in cases.iter_mut().enumerate() {
        if tc.id.is_empty() {
            tc.id = format!("case-{:03}", i + 1);
        }
        if tc.question.trim().is_empty() {
            return Err(ConfigError(format!("case {} has an empty question", tc.id)));
        }
        if tc.expected_sql.trim().is_empty() {
            return Err(ConfigError(format!("case {} has no expected SQL", tc.id)));
        }
    }
    Ok(cases)
}

/// Selects `n` distinct cases deterministically for a given seed.
///
/// Cases are ordered by sha256(seed || id) and the first `n` taken, so the
/// same seed always reproduces the same subset while different seeds vary
/// the selection. Caps at the pool size.
pub fn sample_cases(cases: &[TestCase], n: usize, seed: u64) -> Vec<TestCase> {
    let mut keyed: Vec<(String, &TestCase)> = cases
        .iter()
        .map(|tc| (sample_key(seed, &tc.id), tc))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed
        .into_iter()
        .take(n.min(cases.len()))
        .map(|(_, tc)| tc.clone())
        .collect()
}

fn sample_key(seed: u64, id: &str) -> String {
    let mut h = Sha256::new();
    h.update(seed.to_le_bytes());
    h.update(b"\n");
    h.update(id.as_bytes());
    hex::encode(h.finalize())
}
