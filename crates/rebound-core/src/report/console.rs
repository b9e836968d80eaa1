use crate::model::{CaseOutcome, CaseResultRow, ResultSet, RunSummary, Value};

const PREVIEW_ROWS: usize = 5;

pub fn print_summary(summary: &RunSummary, results: &[CaseResultRow], show_rows: bool) {
    eprintln!("\nRan {} test cases (started {})", summary.total, summary.started_at);

    for r in results {
        let duration = r
            .duration_ms
            .map(|d| format!("({:.1}s)", d as f64 / 1000.0))
            .unwrap_or_default();

        match r.outcome {
            CaseOutcome::SuccessNoFeedback => {
                eprintln!("✅ {:<10} {}  {}", r.case_id, r.question, duration);
            }
            CaseOutcome::SuccessWithFeedback => {
                eprintln!("🔁 {:<10} {}  {} (passed after feedback)", r.case_id, r.question, duration);
                if let Some(fb) = &r.feedback {
                    eprintln!("    Feedback: {}", fb);
                }
            }
            CaseOutcome::Failure => {
                eprintln!("❌ {:<10} {}  {}", r.case_id, r.question, duration);
                eprintln!("    {}", r.message);
                for a in &r.attempts {
                    if let Some(sql) = &a.sql {
                        eprintln!("    Attempt {}: {}", a.attempt_no, sql);
                    }
                    if let Some(err) = &a.error {
                        eprintln!("    Attempt {} error: {}", a.attempt_no, err);
                    }
                }
                if show_rows {
                    if let Some(expected) = &r.expected_preview {
                        eprintln!("    Expected ({} rows):", expected.rows.len());
                        print_rows(expected);
                    }
                    if let Some(got) = r.attempts.iter().rev().find_map(|a| a.result.as_ref()) {
                        eprintln!("    Got ({} rows):", got.rows.len());
                        print_rows(got);
                    }
                }
            }
        }
    }

    eprintln!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let pct = if summary.total > 0 {
        summary.passed() as f64 / summary.total as f64 * 100.0
    } else {
        0.0
    };
    eprintln!(
        "Summary: {}/{} passed ({:.1}%): {} first try, {} after feedback, {} failed",
        summary.passed(),
        summary.total,
        pct,
        summary.passed_no_feedback,
        summary.passed_with_feedback,
        summary.failed,
    );
}

fn print_rows(rs: &ResultSet) {
    eprintln!("      Columns: {}", rs.columns.join(", "));
    for (i, row) in rs.rows.iter().take(PREVIEW_ROWS).enumerate() {
        let cells: Vec<String> = row.iter().map(render_value).collect();
        eprintln!("      Row {}: {}", i + 1, cells.join(" | "));
    }
    if rs.rows.len() > PREVIEW_ROWS {
        eprintln!("      ... {} more rows", rs.rows.len() - PREVIEW_ROWS);
    }
}

fn render_value(v: &Value) -> String {
    match v {
        Value::Null => "NULL".into(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => format!("{}", f),
        Value::Text(t) => t.clone(),
        Value::Blob(b) => format!("<blob {} bytes>", b.len()),
    }
}
