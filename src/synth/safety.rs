//! Statement safety helpers.
//!
//! The gate rejects, it never repairs: any statement carrying a write/DDL
//! keyword or more than one statement is refused outright. Both the
//! synthesizer and the executor call these checks; neither trusts that the
//! other ran.

use std::sync::LazyLock;

use regex::Regex;

/// Write and DDL keywords that disqualify a statement, word-bounded and
/// case-insensitive.
static WRITE_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(insert|update|delete|drop|alter|create|truncate|merge)\b")
        .expect("invalid write keyword pattern")
});

/// Matches only a trailing LIMIT clause. A bounded subquery does not count
/// as a bound on the outer statement.
static TRAILING_LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blimit\s+(\d+)\s*$").expect("invalid limit pattern"));

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[a-zA-Z]*").expect("invalid fence pattern"));

/// Strip markdown code fences and surrounding whitespace from model output.
pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

/// Check that a statement is a single read-only query.
///
/// Returns a description of the violation, or `None` when the statement
/// is acceptable.
pub fn read_only_violation(sql: &str) -> Option<String> {
    let trimmed = sql.trim().trim_end_matches(';').trim();
    if trimmed.is_empty() {
        return Some("statement is empty".to_string());
    }

    if trimmed.contains(';') {
        return Some("multiple statements are not allowed".to_string());
    }

    let first_word = trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if first_word != "select" && first_word != "with" {
        return Some(format!("statement must start with SELECT, got '{}'", first_word));
    }

    if let Some(m) = WRITE_KEYWORDS.find(trimmed) {
        return Some(format!("write keyword '{}' is not allowed", m.as_str()));
    }

    None
}

/// Ensure the statement ends with an explicit LIMIT no greater than
/// `max_rows`.
///
/// An existing trailing limit is clamped when oversized; a statement whose
/// final clause carries no limit gets `default_limit` appended (already
/// capped by the caller), even when a subquery inside it is bounded.
pub fn enforce_limit(sql: &str, default_limit: usize, max_rows: usize) -> String {
    let trimmed = sql.trim().trim_end_matches(';').trim();

    if let Some(caps) = TRAILING_LIMIT.captures(trimmed) {
        let current: usize = caps
            .get(1)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(max_rows);
        if current > max_rows {
            return TRAILING_LIMIT
                .replace(trimmed, format!("LIMIT {}", max_rows))
                .to_string();
        }
        return trimmed.to_string();
    }

    format!("{} LIMIT {}", trimmed, default_limit)
}
