use serde::{Deserialize, Serialize};

/// One question/expected-answer pair from the ground-truth dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub id: String,
    #[serde(alias = "natural_language")]
    pub question: String,
    #[serde(alias = "sql")]
    pub expected_sql: String,
    /// Inline ground-truth rows. When absent the runner executes
    /// `expected_sql` against the database to obtain them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<ResultSet>,
    /// Dataset category tag ("counting", "ranking", ...). Informational.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A single SQL cell value. Mirrors SQLite's storage classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(f) => Some(*f),
            _ => None,
        }
    }
}

/// Tabular query output: column names plus ordered rows of values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One model invocation: the SQL it produced and what happened when we ran it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRow {
    pub attempt_no: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub matched: bool,
    pub duration_ms: Option<u64>,
}

/// Terminal state of the feedback loop for one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseOutcome {
    SuccessNoFeedback,
    SuccessWithFeedback,
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResultRow {
    pub case_id: String,
    pub question: String,
    pub expected_sql: String,
    pub outcome: CaseOutcome,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub attempts: Vec<AttemptRow>,
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_preview: Option<ResultSet>,
}

/// Aggregate counters for one batch run. Counters always sum to `total`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: u32,
    pub passed_no_feedback: u32,
    pub passed_with_feedback: u32,
    pub failed: u32,
    pub started_at: String,
}

impl RunSummary {
    pub fn record(&mut self, outcome: CaseOutcome) {
        self.total += 1;
        match outcome {
            CaseOutcome::SuccessNoFeedback => self.passed_no_feedback += 1,
            CaseOutcome::SuccessWithFeedback => self.passed_with_feedback += 1,
            CaseOutcome::Failure => self.failed += 1,
        }
    }

    pub fn passed(&self) -> u32 {
        self.passed_no_feedback + self.passed_with_feedback
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}
