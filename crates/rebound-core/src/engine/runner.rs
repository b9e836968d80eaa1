use crate::compare::results_match;
use crate::config::HarnessConfig;
use crate::dataset::sample_cases;
use crate::db::Database;
use crate::extract::{extract_feedback, extract_sql};
use crate::model::{AttemptRow, CaseOutcome, CaseResultRow, ResultSet, RunSummary, TestCase};
use crate::prompt::PromptBuilder;
use crate::providers::llm::LlmClient;
use crate::report::RunArtifacts;
use std::sync::Arc;
use tokio::time::{timeout, Duration};

/// Drives the per-case feedback loop and the sequential batch.
///
/// The loop runs at most twice per case: one initial attempt, and — when the
/// result does not match ground truth and feedback is enabled — one
/// correction attempt that exposes the expected SQL. Model, extraction and
/// SQL errors fold into the case outcome; only an unusable database aborts.
pub struct Runner {
    pub db: Database,
    pub client: Arc<dyn LlmClient>,
    pub cfg: HarnessConfig,
    prompts: PromptBuilder,
}

struct AttemptOutcome {
    row: AttemptRow,
    response_text: Option<String>,
}

impl Runner {
    /// Introspects the schema once; fails fast if the database is unusable.
    pub fn new(db: Database, client: Arc<dyn LlmClient>, cfg: HarnessConfig) -> anyhow::Result<Self> {
        let schema = db.describe_schema()?;
        Ok(Self {
            db,
            client,
            cfg,
            prompts: PromptBuilder::new(schema),
        })
    }

    pub async fn run_batch(&self, pool: &[TestCase]) -> RunArtifacts {
        let selected = sample_cases(pool, self.cfg.num_examples, self.cfg.seed);
        tracing::info!(
            event = "batch_start",
            pool = pool.len(),
            selected = selected.len(),
            seed = self.cfg.seed,
            feedback = self.cfg.feedback,
        );

        let mut summary = RunSummary {
            started_at: chrono::Utc::now().to_rfc3339(),
            ..Default::default()
        };
        let mut results = Vec::with_capacity(selected.len());
        for tc in &selected {
            let row = self.run_case(tc).await;
            summary.record(row.outcome);
            results.push(row);
        }

        tracing::info!(
            event = "batch_done",
            total = summary.total,
            passed = summary.passed(),
            failed = summary.failed,
        );
        RunArtifacts { summary, results }
    }

    /// Runs one case to a terminal outcome. Never panics, never propagates:
    /// every error path becomes a Failure row so the batch always completes.
    pub async fn run_case(&self, tc: &TestCase) -> CaseResultRow {
        let start = std::time::Instant::now();
        tracing::debug!(event = "case_start", case = %tc.id, question = %tc.question);

        // Ground truth: inline rows if the dataset carries them, otherwise
        // execute the expected SQL.
        let expected: ResultSet = match &tc.expected_result {
            Some(rs) => rs.clone(),
            None => match self.db.execute(&tc.expected_sql) {
                Ok(rs) => rs,
                Err(e) => {
                    tracing::warn!(event = "ground_truth_error", case = %tc.id, error = %e);
                    return CaseResultRow {
                        case_id: tc.id.clone(),
                        question: tc.question.clone(),
                        expected_sql: tc.expected_sql.clone(),
                        outcome: CaseOutcome::Failure,
                        message: format!("ground-truth SQL failed: {}", e),
                        feedback: None,
                        attempts: Vec::new(),
                        duration_ms: Some(start.elapsed().as_millis() as u64),
                        expected_preview: None,
                    };
                }
            },
        };

        let mut attempts = Vec::new();

        // Initial state
        let first = self
            .attempt(1, &self.prompts.initial(&tc.question), &expected)
            .await;
        let first_matched = first.row.matched;
        let first_sql = first.row.sql.clone();
        let first_error = first.row.error.clone();
        attempts.push(first.row);

        if first_matched {
            return self.finish(
                tc,
                CaseOutcome::SuccessNoFeedback,
                "ok".into(),
                None,
                attempts,
                start,
                expected,
            );
        }

        if !self.cfg.feedback {
            let message = first_error
                .map(|e| format!("first attempt failed: {}", e))
                .unwrap_or_else(|| "result mismatch (feedback disabled)".into());
            return self.finish(tc, CaseOutcome::Failure, message, None, attempts, start, expected);
        }

        // Feedback state: one correction attempt with the expected SQL exposed.
        let prompt = self.prompts.feedback(
            &tc.question,
            first_sql.as_deref(),
            first_error.as_deref(),
            &tc.expected_sql,
        );
        let second = self.attempt(2, &prompt, &expected).await;
        let second_matched = second.row.matched;
        let second_error = second.row.error.clone();
        let feedback = second
            .response_text
            .as_deref()
            .and_then(extract_feedback);
        attempts.push(second.row);

        if second_matched {
            self.finish(
                tc,
                CaseOutcome::SuccessWithFeedback,
                "ok (after feedback)".into(),
                feedback,
                attempts,
                start,
                expected,
            )
        } else {
            let message = second_error
                .map(|e| format!("feedback attempt failed: {}", e))
                .unwrap_or_else(|| "result mismatch after feedback".into());
            self.finish(tc, CaseOutcome::Failure, message, feedback, attempts, start, expected)
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        tc: &TestCase,
        outcome: CaseOutcome,
        message: String,
        feedback: Option<String>,
        attempts: Vec<AttemptRow>,
        start: std::time::Instant,
        expected: ResultSet,
    ) -> CaseResultRow {
        tracing::debug!(event = "case_done", case = %tc.id, outcome = ?outcome);
        CaseResultRow {
            case_id: tc.id.clone(),
            question: tc.question.clone(),
            expected_sql: tc.expected_sql.clone(),
            outcome,
            message,
            feedback,
            attempts,
            duration_ms: Some(start.elapsed().as_millis() as u64),
            // kept for the mismatch preview in the console report
            expected_preview: if outcome == CaseOutcome::Failure {
                Some(expected)
            } else {
                None
            },
        }
    }

    /// One model invocation: complete, extract, execute, compare. Errors are
    /// captured in the row, not propagated.
    async fn attempt(&self, attempt_no: u32, prompt: &str, expected: &ResultSet) -> AttemptOutcome {
        let start = std::time::Instant::now();

        let text = match self.call_llm(prompt).await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(event = "model_error", attempt = attempt_no, error = %e);
                return AttemptOutcome {
                    row: AttemptRow {
                        attempt_no,
                        sql: None,
                        result: None,
                        error: Some(format!("model API error: {}", e)),
                        matched: false,
                        duration_ms: Some(start.elapsed().as_millis() as u64),
                    },
                    response_text: None,
                };
            }
        };

        let sql = match extract_sql(&text) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(event = "extraction_error", attempt = attempt_no, error = %e);
                return AttemptOutcome {
                    row: AttemptRow {
                        attempt_no,
                        sql: None,
                        result: None,
                        error: Some(format!("model API error: {}", e)),
                        matched: false,
                        duration_ms: Some(start.elapsed().as_millis() as u64),
                    },
                    response_text: Some(text),
                };
            }
        };

        let (result, error, matched) = match self.db.execute(&sql) {
            Ok(rs) => {
                let matched = results_match(&rs, expected);
                (Some(rs), None, matched)
            }
            Err(e) => (None, Some(e.to_string()), false),
        };

        AttemptOutcome {
            row: AttemptRow {
                attempt_no,
                sql: Some(sql),
                result,
                error,
                matched,
                duration_ms: Some(start.elapsed().as_millis() as u64),
            },
            response_text: Some(text),
        }
    }

    async fn call_llm(&self, prompt: &str) -> anyhow::Result<String> {
        let t = self.cfg.timeout_seconds;
        let fut = self.client.complete(prompt);
        let resp = timeout(Duration::from_secs(t), fut)
            .await
            .map_err(|_| anyhow::anyhow!("model call timed out after {}s", t))??;
        Ok(resp.text)
    }
}
