pub const SCHEMA_VERSION: &str = "1.0.0";

pub const PROGRESS_SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// Splits a script on `;`, ignoring separators inside quoted identifiers or
/// literals, and drops `--` comment lines from each statement.
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;

    for line in sql.lines() {
        if !in_single_quote && !in_double_quote && line.trim_start().starts_with("--") {
            continue;
        }

        for ch in line.chars() {
            match ch {
                '\'' if !in_double_quote => in_single_quote = !in_single_quote,
                '"' if !in_single_quote => in_double_quote = !in_double_quote,
                ';' if !in_single_quote && !in_double_quote => {
                    push_statement(&mut statements, &current);
                    current.clear();
                    continue;
                }
                _ => {}
            }
            current.push(ch);
        }
        current.push('\n');
    }

    push_statement(&mut statements, &current);
    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let stmt = raw.trim();
    if !stmt.is_empty() {
        statements.push(stmt.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_schema() {
        let statements = split_sql_statements(PROGRESS_SCHEMA_SQL);
        assert_eq!(statements.len(), 5);
        assert!(statements.iter().all(|s| !s.starts_with("--")));
        assert!(statements[1].contains("\"student_progress\""));
    }

    #[test]
    fn test_split_ignores_quoted_separator() {
        let statements = split_sql_statements("INSERT INTO t VALUES ('a;b'); SELECT 1;");
        assert_eq!(statements, vec!["INSERT INTO t VALUES ('a;b')", "SELECT 1"]);
    }
}
