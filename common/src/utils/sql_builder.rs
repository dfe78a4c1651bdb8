//! Generic SQL statement assembly.
//!
//! The console works against arbitrary tables discovered at runtime, so
//! statements are assembled from catalog metadata instead of being written
//! by hand. Identifiers are validated and double-quoted before they are
//! spliced into SQL; values are always passed as text bind parameters and
//! cast to the column's catalog type inside the statement (`$1::integer`),
//! which lets PostgreSQL run its own input conversion exactly like the
//! interactive tools do.

use serde_json::{Map, Value};

use crate::errors::{AppError, AppResult};

/// PostgreSQL identifier length limit.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Column metadata needed for statement assembly.
///
/// Built by the catalog service from `information_schema.columns`; kept
/// separate from the API-facing column model.
#[derive(Debug, Clone)]
pub struct ColumnMeta {
    /// Column name.
    pub name: String,
    /// Catalog data type (e.g., "integer", "timestamp without time zone").
    pub data_type: String,
    /// Underlying type name, used for arrays and user-defined types.
    pub udt_name: String,
}

impl ColumnMeta {
    /// Cast target used in `$n::<type>` placeholders.
    fn cast_target(&self) -> String {
        match self.data_type.as_str() {
            // information_schema reports "ARRAY" with udt_name "_elem"
            "ARRAY" => format!("{}[]", self.udt_name.trim_start_matches('_')),
            "USER-DEFINED" => format!("\"{}\"", self.udt_name),
            other => other.to_string(),
        }
    }
}

/// Generic SQL statement builder.
pub struct SqlBuilder;

impl SqlBuilder {
    /// Validates a table or column identifier.
    ///
    /// Identifiers cannot be bound as parameters, so only conservative
    /// snake_case names are accepted before being quoted into statements.
    ///
    /// # Errors
    /// Returns `AppError::InvalidIdentifier` for anything else.
    pub fn validate_identifier(name: &str) -> AppResult<()> {
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };
        if !valid || name.len() > MAX_IDENTIFIER_LEN {
            return Err(AppError::InvalidIdentifier(name.to_string()));
        }
        Ok(())
    }

    /// Quotes a previously validated identifier.
    pub fn quote_ident(name: &str) -> String {
        format!("\"{}\"", name)
    }

    /// Picks the column a table page is ordered by.
    ///
    /// Prefers the first column ending in `_id`, then the first column in
    /// ordinal order, then the system column `ctid`.
    pub fn sort_column(columns: &[String]) -> String {
        if let Some(col) = columns.iter().find(|c| c.ends_with("_id")) {
            return col.clone();
        }
        columns.first().cloned().unwrap_or_else(|| "ctid".to_string())
    }

    /// Builds `INSERT INTO .. VALUES .. RETURNING *`.
    ///
    /// Null and empty-string values are skipped so column defaults apply.
    pub fn insert(
        table: &str,
        columns: &[ColumnMeta],
        values: &Map<String, Value>,
    ) -> AppResult<(String, Vec<Option<String>>)> {
        Self::validate_identifier(table)?;

        let mut names = Vec::new();
        let mut placeholders = Vec::new();
        let mut binds = Vec::new();

        for (key, value) in values {
            if Self::is_skippable(value) {
                continue;
            }
            let meta = Self::find_column(columns, key)?;
            names.push(Self::quote_ident(key));
            placeholders.push(format!("${}::{}", binds.len() + 1, meta.cast_target()));
            binds.push(Self::value_to_text(meta, value));
        }

        if names.is_empty() {
            return Err(AppError::Validation("no values to insert".into()));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
            Self::quote_ident(table),
            names.join(", "),
            placeholders.join(", ")
        );
        Ok((sql, binds))
    }

    /// Builds `UPDATE .. SET .. WHERE .. RETURNING *`.
    ///
    /// Empty values in `set` are skipped; `skip_columns` (e.g. the primary
    /// key) are never updated. Conditions are ANDed equality tests.
    pub fn update(
        table: &str,
        columns: &[ColumnMeta],
        set: &Map<String, Value>,
        conditions: &Map<String, Value>,
        skip_columns: &[&str],
    ) -> AppResult<(String, Vec<Option<String>>)> {
        Self::validate_identifier(table)?;

        let mut set_parts = Vec::new();
        let mut binds = Vec::new();

        for (key, value) in set {
            if skip_columns.contains(&key.as_str()) || Self::is_skippable(value) {
                continue;
            }
            let meta = Self::find_column(columns, key)?;
            set_parts.push(format!(
                "{} = ${}::{}",
                Self::quote_ident(key),
                binds.len() + 1,
                meta.cast_target()
            ));
            binds.push(Self::value_to_text(meta, value));
        }

        if set_parts.is_empty() {
            return Err(AppError::Validation("no values to update".into()));
        }

        let where_clause = Self::build_conditions(columns, conditions, &mut binds)?;

        let sql = format!(
            "UPDATE {} SET {} WHERE {} RETURNING *",
            Self::quote_ident(table),
            set_parts.join(", "),
            where_clause
        );
        Ok((sql, binds))
    }

    /// Builds `DELETE FROM .. WHERE .. RETURNING *`.
    pub fn delete(
        table: &str,
        columns: &[ColumnMeta],
        conditions: &Map<String, Value>,
    ) -> AppResult<(String, Vec<Option<String>>)> {
        Self::validate_identifier(table)?;

        let mut binds = Vec::new();
        let where_clause = Self::build_conditions(columns, conditions, &mut binds)?;

        let sql = format!(
            "DELETE FROM {} WHERE {} RETURNING *",
            Self::quote_ident(table),
            where_clause
        );
        Ok((sql, binds))
    }

    /// Builds `SELECT * FROM .. WHERE ..` for point lookups.
    pub fn select_where(
        table: &str,
        columns: &[ColumnMeta],
        conditions: &Map<String, Value>,
    ) -> AppResult<(String, Vec<Option<String>>)> {
        Self::validate_identifier(table)?;

        let mut binds = Vec::new();
        let where_clause = Self::build_conditions(columns, conditions, &mut binds)?;

        let sql = format!(
            "SELECT * FROM {} WHERE {}",
            Self::quote_ident(table),
            where_clause
        );
        Ok((sql, binds))
    }

    /// Builds an ANDed equality WHERE clause, appending binds in place.
    ///
    /// Conditions are never dropped: a JSON null compiles to an `IS NULL`
    /// test and empty strings are bound like any other value. Silently
    /// narrowing a WHERE clause would widen the row set a bulk update or
    /// delete touches.
    fn build_conditions(
        columns: &[ColumnMeta],
        conditions: &Map<String, Value>,
        binds: &mut Vec<Option<String>>,
    ) -> AppResult<String> {
        let mut parts = Vec::new();
        for (key, value) in conditions {
            let meta = Self::find_column(columns, key)?;
            if value.is_null() {
                parts.push(format!("{} IS NULL", Self::quote_ident(key)));
                continue;
            }
            parts.push(format!(
                "{} = ${}::{}",
                Self::quote_ident(key),
                binds.len() + 1,
                meta.cast_target()
            ));
            binds.push(Self::value_to_text(meta, value));
        }
        if parts.is_empty() {
            return Err(AppError::Validation("no conditions provided".into()));
        }
        Ok(parts.join(" AND "))
    }

    fn find_column<'a>(columns: &'a [ColumnMeta], name: &str) -> AppResult<&'a ColumnMeta> {
        Self::validate_identifier(name)?;
        columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| AppError::Validation(format!("unknown column: {}", name)))
    }

    /// Null and empty-string values are skipped by insert and update SET
    /// lists so column defaults apply. WHERE conditions never use this.
    fn is_skippable(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Converts a JSON value to its text form for binding.
    ///
    /// JSON arrays destined for array columns are rendered as PostgreSQL
    /// array literals (`{a,b}`) so the `::type[]` cast can parse them.
    fn value_to_text(meta: &ColumnMeta, value: &Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Array(items) if meta.data_type == "ARRAY" => {
                let elems: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        Value::Null => "NULL".to_string(),
                        Value::String(s) => {
                            format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
                        }
                        other => other.to_string(),
                    })
                    .collect();
                Some(format!("{{{}}}", elems.join(",")))
            }
            // json/jsonb columns take their serialized form
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cols() -> Vec<ColumnMeta> {
        vec![
            ColumnMeta {
                name: "reader_id".into(),
                data_type: "integer".into(),
                udt_name: "int4".into(),
            },
            ColumnMeta {
                name: "first_name".into(),
                data_type: "character varying".into(),
                udt_name: "varchar".into(),
            },
            ColumnMeta {
                name: "is_active".into(),
                data_type: "boolean".into(),
                udt_name: "bool".into(),
            },
            ColumnMeta {
                name: "tags".into(),
                data_type: "ARRAY".into(),
                udt_name: "_text".into(),
            },
        ]
    }

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_identifier_validation() {
        assert!(SqlBuilder::validate_identifier("readers").is_ok());
        assert!(SqlBuilder::validate_identifier("_private").is_ok());
        assert!(SqlBuilder::validate_identifier("book_loans2").is_ok());
        assert!(SqlBuilder::validate_identifier("").is_err());
        assert!(SqlBuilder::validate_identifier("2fast").is_err());
        assert!(SqlBuilder::validate_identifier("readers; DROP TABLE x").is_err());
        assert!(SqlBuilder::validate_identifier("read\"ers").is_err());
        assert!(SqlBuilder::validate_identifier(&"x".repeat(64)).is_err());
    }

    #[test]
    fn test_sort_column_heuristic() {
        let with_id = vec!["title".to_string(), "author_id".to_string()];
        assert_eq!(SqlBuilder::sort_column(&with_id), "author_id");

        let plain = vec!["title".to_string(), "isbn".to_string()];
        assert_eq!(SqlBuilder::sort_column(&plain), "title");

        assert_eq!(SqlBuilder::sort_column(&[]), "ctid");
    }

    #[test]
    fn test_insert_skips_empty_values_and_casts() {
        let values = map(json!({
            "first_name": "Anna",
            "is_active": true,
            "reader_id": Value::Null,
            "tags": ""
        }));
        let (sql, binds) = SqlBuilder::insert("readers", &cols(), &values).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"readers\" (\"first_name\", \"is_active\") \
             VALUES ($1::character varying, $2::boolean) RETURNING *"
        );
        assert_eq!(binds, vec![Some("Anna".to_string()), Some("true".to_string())]);
    }

    #[test]
    fn test_insert_rejects_empty_payload() {
        let values = map(json!({ "first_name": "", "reader_id": Value::Null }));
        assert!(matches!(
            SqlBuilder::insert("readers", &cols(), &values),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_insert_rejects_unknown_column() {
        let values = map(json!({ "no_such_column": 1 }));
        assert!(matches!(
            SqlBuilder::insert("readers", &cols(), &values),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_update_skips_key_column_and_numbers_placeholders() {
        let set = map(json!({ "first_name": "Ivan", "reader_id": 99 }));
        let cond = map(json!({ "reader_id": 7 }));
        let (sql, binds) =
            SqlBuilder::update("readers", &cols(), &set, &cond, &["reader_id"]).unwrap();
        assert_eq!(
            sql,
            "UPDATE \"readers\" SET \"first_name\" = $1::character varying \
             WHERE \"reader_id\" = $2::integer RETURNING *"
        );
        assert_eq!(binds, vec![Some("Ivan".to_string()), Some("7".to_string())]);
    }

    #[test]
    fn test_update_requires_conditions() {
        let set = map(json!({ "first_name": "Ivan" }));
        let cond = Map::new();
        assert!(matches!(
            SqlBuilder::update("readers", &cols(), &set, &cond, &[]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_builds_and_conditions() {
        let cond = map(json!({ "reader_id": 3, "is_active": false }));
        let (sql, binds) = SqlBuilder::delete("readers", &cols(), &cond).unwrap();
        assert_eq!(
            sql,
            "DELETE FROM \"readers\" WHERE \"is_active\" = $1::boolean \
             AND \"reader_id\" = $2::integer RETURNING *"
        );
        assert_eq!(binds, vec![Some("false".to_string()), Some("3".to_string())]);
    }

    #[test]
    fn test_empty_string_condition_is_bound() {
        let cond = map(json!({ "first_name": "", "reader_id": 3 }));
        let (sql, binds) = SqlBuilder::delete("readers", &cols(), &cond).unwrap();
        assert_eq!(
            sql,
            "DELETE FROM \"readers\" WHERE \"first_name\" = $1::character varying \
             AND \"reader_id\" = $2::integer RETURNING *"
        );
        assert_eq!(binds, vec![Some(String::new()), Some("3".to_string())]);
    }

    #[test]
    fn test_null_condition_becomes_is_null() {
        let cond = map(json!({ "first_name": null, "reader_id": 3 }));
        let (sql, binds) = SqlBuilder::delete("readers", &cols(), &cond).unwrap();
        assert_eq!(
            sql,
            "DELETE FROM \"readers\" WHERE \"first_name\" IS NULL \
             AND \"reader_id\" = $1::integer RETURNING *"
        );
        assert_eq!(binds, vec![Some("3".to_string())]);
    }

    #[test]
    fn test_all_null_conditions_still_form_a_where_clause() {
        let cond = map(json!({ "first_name": null }));
        let (sql, binds) = SqlBuilder::delete("readers", &cols(), &cond).unwrap();
        assert_eq!(
            sql,
            "DELETE FROM \"readers\" WHERE \"first_name\" IS NULL RETURNING *"
        );
        assert!(binds.is_empty());
    }

    #[test]
    fn test_array_cast_target_and_literal() {
        let values = map(json!({ "tags": ["a", "b\"c"] }));
        let (sql, binds) = SqlBuilder::insert("readers", &cols(), &values).unwrap();
        assert!(sql.contains("$1::text[]"));
        assert_eq!(binds, vec![Some("{\"a\",\"b\\\"c\"}".to_string())]);
    }

    #[test]
    fn test_invalid_table_rejected() {
        let values = map(json!({ "first_name": "x" }));
        assert!(matches!(
            SqlBuilder::insert("readers; --", &cols(), &values),
            Err(AppError::InvalidIdentifier(_))
        ));
    }
}
