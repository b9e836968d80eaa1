use crate::model::{ResultSet, Value};

/// Numeric comparison tolerance. Absorbs integer/float type drift between a
/// candidate query and ground truth (e.g. AVG returning 25.0 vs 25).
pub const NUMERIC_TOLERANCE: f64 = 0.01;

/// Decides whether two result sets are equivalent.
///
/// Rows are compared as an order-independent multiset, since SQL result
/// ordering is unspecified without an ORDER BY. Numerics match within
/// [`NUMERIC_TOLERANCE`]; text is exact and case-sensitive. Column names are
/// ignored: the candidate is free to alias (`COUNT(*) as team_count`).
///
/// Symmetric, reflexive, pure.
pub fn results_match(a: &ResultSet, b: &ResultSet) -> bool {
    if a.rows.len() != b.rows.len() {
        return false;
    }
    if a.rows.is_empty() {
        return true;
    }

    // Pair every row of `a` with a distinct row of `b` under the tolerance
    // relation. The relation is not transitive, so a greedy first-fit scan
    // would make the verdict depend on row order; a maximum bipartite
    // matching (augmenting paths) does not. Equivalent iff the matching is
    // perfect, which is invariant under reordering either side.
    let mut matched_b: Vec<Option<usize>> = vec![None; b.rows.len()];
    for i in 0..a.rows.len() {
        let mut visited = vec![false; b.rows.len()];
        if !assign(i, a, b, &mut visited, &mut matched_b) {
            return false;
        }
    }
    true
}

/// Tries to pair `a.rows[i]`, re-routing earlier pairings along an
/// augmenting path when needed.
fn assign(
    i: usize,
    a: &ResultSet,
    b: &ResultSet,
    visited: &mut [bool],
    matched_b: &mut [Option<usize>],
) -> bool {
    for (j, candidate) in b.rows.iter().enumerate() {
        if visited[j] || !rows_equal(&a.rows[i], candidate) {
            continue;
        }
        visited[j] = true;
        match matched_b[j] {
            None => {
                matched_b[j] = Some(i);
                return true;
            }
            Some(prev) => {
                if assign(prev, a, b, visited, matched_b) {
                    matched_b[j] = Some(i);
                    return true;
                }
            }
        }
    }
    false
}

fn rows_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => (x - y).abs() < NUMERIC_TOLERANCE,
        _ => match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Text(x), Value::Text(y)) => x == y,
            (Value::Blob(x), Value::Blob(y)) => x == y,
            _ => false,
        },
    }
}
