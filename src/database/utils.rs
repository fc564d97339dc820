use regex::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?").expect("placeholder pattern is valid"));

/// Collapse whitespace and rewrite `?` placeholders into Postgres `$n` form
pub fn sql(query: &str) -> String {
    let cleaned = query.split_whitespace().collect::<Vec<&str>>().join(" ");
    let mut param_index = 0;
    PLACEHOLDER
        .replace_all(&cleaned, |_: &Captures| {
            param_index += 1;
            format!("${}", param_index)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_numbers_placeholders_in_order() {
        let query = sql(
            r#"
            UPDATE absence_requests
            SET current_stage = ?, updated_at = ?
            WHERE id = ?
        "#,
        );
        assert_eq!(
            query,
            "UPDATE absence_requests SET current_stage = $1, updated_at = $2 WHERE id = $3"
        );
    }
}
