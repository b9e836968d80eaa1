use regex::Regex;

/// Pulls the single SQL statement out of a model reply.
///
/// The contract is strict: the statement must appear inside
/// `<sql_query>...</sql_query>` tags. A reply that violates it is a
/// model-API error, not a crash — the caller folds it into the case outcome.
pub fn extract_sql(text: &str) -> anyhow::Result<String> {
    let re = Regex::new(r"(?s)<sql_query>(.*?)</sql_query>").expect("static pattern");
    let sql = re
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .ok_or_else(|| anyhow::anyhow!("model reply has no <sql_query> section"))?;
    if sql.is_empty() {
        anyhow::bail!("model reply has an empty <sql_query> section");
    }
    Ok(sql)
}

/// Optional commentary the model returns on the feedback turn.
pub fn extract_feedback(text: &str) -> Option<String> {
    let re = Regex::new(r"(?s)<feedback>(.*?)</feedback>").expect("static pattern");
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}
