use async_trait::async_trait;
use rebound_core::config::HarnessConfig;
use rebound_core::db::Database;
use rebound_core::engine::runner::Runner;
use rebound_core::model::{CaseOutcome, LlmResponse, TestCase};
use rebound_core::providers::llm::{fake::FakeClient, LlmClient};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn seed_db(path: &Path) {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.execute_batch("CREATE TABLE team (id INTEGER PRIMARY KEY, full_name TEXT);")
        .unwrap();
    for i in 1..=30 {
        conn.execute(
            "INSERT INTO team VALUES (?1, ?2)",
            rusqlite::params![i, format!("Team {}", i)],
        )
        .unwrap();
    }
}

fn harness_cfg(db: &Path, feedback: bool) -> HarnessConfig {
    HarnessConfig {
        version: 1,
        db: db.to_path_buf(),
        dataset: "unused.json".into(),
        model: "fake".into(),
        num_examples: 5,
        feedback,
        seed: 0,
        timeout_seconds: 10,
        max_tokens: 1000,
    }
}

fn count_case() -> TestCase {
    TestCase {
        id: "count-teams".into(),
        question: "How many teams are in the league?".into(),
        expected_sql: "SELECT COUNT(*) FROM team".into(),
        expected_result: None,
        category: Some("counting".into()),
    }
}

fn runner(db_path: &Path, client: Arc<dyn LlmClient>, feedback: bool) -> Runner {
    let db = Database::open_read_only(db_path).unwrap();
    Runner::new(db, client, harness_cfg(db_path, feedback)).unwrap()
}

/// Records every prompt it sees, then delegates to a scripted fake.
struct RecordingClient {
    inner: FakeClient,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl LlmClient for RecordingClient {
    async fn complete(&self, prompt: &str) -> anyhow::Result<LlmResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.inner.complete(prompt).await
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

#[tokio::test]
async fn correct_first_attempt_passes_without_feedback() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("nba.sqlite");
    seed_db(&db);

    let client = Arc::new(FakeClient::scripted_sql(&["SELECT COUNT(*) FROM team"]));
    let r = runner(&db, client, true);

    let row = r.run_case(&count_case()).await;
    assert_eq!(row.outcome, CaseOutcome::SuccessNoFeedback);
    assert_eq!(row.attempts.len(), 1);
    assert!(row.attempts[0].matched);
}

#[tokio::test]
async fn wrong_first_attempt_recovers_with_feedback() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("nba.sqlite");
    seed_db(&db);

    // First attempt counts 29 teams, correction counts all 30.
    let client = Arc::new(RecordingClient {
        inner: FakeClient::scripted_sql(&[
            "SELECT COUNT(*) FROM team WHERE id > 1",
            "SELECT COUNT(*) FROM team",
        ]),
        prompts: Mutex::new(Vec::new()),
    });
    let r = runner(&db, client.clone(), true);

    let row = r.run_case(&count_case()).await;
    assert_eq!(row.outcome, CaseOutcome::SuccessWithFeedback);
    assert_eq!(row.attempts.len(), 2);
    assert!(!row.attempts[0].matched);
    assert!(row.attempts[1].matched);

    // The second prompt exposes the ground-truth SQL and the failed attempt.
    let prompts = client.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("<expected_sql>\nSELECT COUNT(*) FROM team"));
    assert!(prompts[1].contains("SELECT COUNT(*) FROM team WHERE id > 1"));
}

#[tokio::test]
async fn sql_errors_on_both_attempts_fail_with_errors_retained() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("nba.sqlite");
    seed_db(&db);

    let client = Arc::new(FakeClient::scripted_sql(&[
        "SELECT championships FROM team",
        "SELECT championships FROM team",
    ]));
    let r = runner(&db, client, true);

    let row = r.run_case(&count_case()).await;
    assert_eq!(row.outcome, CaseOutcome::Failure);
    assert_eq!(row.attempts.len(), 2);
    assert!(row.attempts[0].error.as_deref().unwrap().contains("championships"));
    assert!(row.attempts[1].error.as_deref().unwrap().contains("championships"));
}

#[tokio::test]
async fn feedback_disabled_fails_after_one_attempt() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("nba.sqlite");
    seed_db(&db);

    let client = Arc::new(FakeClient::scripted_sql(&["SELECT COUNT(*) FROM team WHERE id > 1"]));
    let r = runner(&db, client, false);

    let row = r.run_case(&count_case()).await;
    assert_eq!(row.outcome, CaseOutcome::Failure);
    assert_eq!(row.attempts.len(), 1);
}

#[tokio::test]
async fn model_api_error_folds_into_failure() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("nba.sqlite");
    seed_db(&db);

    // Empty script: every call errors.
    let client = Arc::new(FakeClient::new(vec![]));
    let r = runner(&db, client, true);

    let row = r.run_case(&count_case()).await;
    assert_eq!(row.outcome, CaseOutcome::Failure);
    assert!(row.message.contains("model API error"));
}

#[tokio::test]
async fn malformed_reply_is_a_model_error_not_a_crash() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("nba.sqlite");
    seed_db(&db);

    let client = Arc::new(FakeClient::new(vec![
        "here is some sql: SELECT COUNT(*) FROM team".into(),
    ]));
    let r = runner(&db, client, true);

    let row = r.run_case(&count_case()).await;
    assert_eq!(row.outcome, CaseOutcome::Failure);
    assert!(row
        .attempts
        .iter()
        .all(|a| a.error.as_deref().unwrap_or_default().contains("model API error")));
}

#[tokio::test]
async fn inline_expected_result_skips_ground_truth_execution() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("nba.sqlite");
    seed_db(&db);

    let mut tc = count_case();
    tc.expected_result = Some(rebound_core::model::ResultSet {
        columns: vec!["COUNT(*)".into()],
        rows: vec![vec![rebound_core::model::Value::Integer(30)]],
    });
    // Broken ground-truth SQL must not matter when rows are inline.
    tc.expected_sql = "SELECT nope FROM nothing".into();

    let client = Arc::new(FakeClient::scripted_sql(&["SELECT COUNT(*) FROM team"]));
    let r = runner(&db, client, true);

    let row = r.run_case(&tc).await;
    assert_eq!(row.outcome, CaseOutcome::SuccessNoFeedback);
}

#[tokio::test]
async fn batch_processes_exactly_num_examples_distinct_cases() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("nba.sqlite");
    seed_db(&db);

    let pool: Vec<TestCase> = (0..8)
        .map(|i| TestCase {
            id: format!("case-{:03}", i),
            question: format!("question {}", i),
            expected_sql: "SELECT COUNT(*) FROM team".into(),
            expected_result: None,
            category: None,
        })
        .collect();

    let client = Arc::new(FakeClient::scripted_sql(&["SELECT COUNT(*) FROM team"]));
    let r = runner(&db, client, true);

    let artifacts = r.run_batch(&pool).await;
    assert_eq!(artifacts.results.len(), 5);
    assert_eq!(artifacts.summary.total, 5);
    assert_eq!(
        artifacts.summary.passed_no_feedback
            + artifacts.summary.passed_with_feedback
            + artifacts.summary.failed,
        artifacts.summary.total
    );

    let ids: std::collections::HashSet<_> =
        artifacts.results.iter().map(|r| r.case_id.clone()).collect();
    assert_eq!(ids.len(), 5);
}
