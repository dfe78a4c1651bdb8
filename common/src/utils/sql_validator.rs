//! SQL statement validator.
//!
//! Provides security validation for ad-hoc SQL statements.

use crate::errors::AppError;

/// Validates SQL statements for security.
pub struct SqlValidator;

/// List of forbidden SQL keywords for the ad-hoc query endpoint.
///
/// DML is allowed (the console exposes explicit CRUD endpoints as well);
/// schema-destroying statements are not.
const FORBIDDEN_KEYWORDS: [&str; 3] = ["DROP ", "TRUNCATE ", "ALTER "];

impl SqlValidator {
    /// Validates a SQL statement for forbidden operations.
    ///
    /// # Errors
    /// Returns `AppError::UnsafeSql` if the SQL contains forbidden keywords.
    pub fn validate(sql: &str) -> Result<(), AppError> {
        let sql_upper = sql.to_uppercase();
        for keyword in FORBIDDEN_KEYWORDS {
            if sql_upper.contains(keyword) {
                return Err(AppError::UnsafeSql(format!(
                    "forbidden operation: {}",
                    keyword.trim()
                )));
            }
        }
        Ok(())
    }

    /// Checks whether the statement produces a row set (SELECT and friends).
    pub fn returns_rows(sql: &str) -> bool {
        let sql_upper = sql.trim().to_uppercase();
        ["SELECT", "WITH", "SHOW", "EXPLAIN", "VALUES", "TABLE "]
            .iter()
            .any(|kw| sql_upper.starts_with(kw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_allowed() {
        assert!(SqlValidator::validate("SELECT * FROM readers").is_ok());
    }

    #[test]
    fn test_dml_is_allowed() {
        assert!(SqlValidator::validate("DELETE FROM readers WHERE reader_id = 1").is_ok());
        assert!(SqlValidator::validate("UPDATE readers SET is_active = false").is_ok());
    }

    #[test]
    fn test_ddl_is_forbidden() {
        assert!(SqlValidator::validate("DROP TABLE readers").is_err());
        assert!(SqlValidator::validate("truncate readers cascade").is_err());
        assert!(SqlValidator::validate("ALTER TABLE readers ADD COLUMN x int").is_err());
    }

    #[test]
    fn test_returns_rows() {
        assert!(SqlValidator::returns_rows("SELECT 1"));
        assert!(SqlValidator::returns_rows("  with x as (select 1) select * from x"));
        assert!(SqlValidator::returns_rows("EXPLAIN SELECT 1"));
        assert!(!SqlValidator::returns_rows("INSERT INTO readers (name) VALUES ('a')"));
        assert!(!SqlValidator::returns_rows("UPDATE readers SET name = 'b'"));
    }
}
