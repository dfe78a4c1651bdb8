//! 表目录与通用 CRUD 服务模块

use serde_json::{Map, Value};
use sqlx::{Column, Executor, PgPool, Row, TypeInfo};

use common::errors::{AppError, AppResult};
use common::models::query::{ColumnInfo, QueryRequest, QueryResult};
use common::models::record::RecordSet;
use common::models::schema::{TableColumn, TableData, TableSummary};
use common::response::Pagination;
use common::utils::rows;
use common::utils::{ColumnMeta, SqlBuilder, SqlValidator};
use validator::Validate;

/// 默认分页大小
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// 表目录服务：运行时发现表结构并为任意表组装 SQL
pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    /// 创建新的目录服务实例
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 列出 public 模式下的用户表
    pub async fn list_tables(&self) -> AppResult<Vec<String>> {
        let tables = sqlx::query_scalar::<_, String>(
            "SELECT table_name::text
             FROM information_schema.tables
             WHERE table_schema = 'public'
               AND table_type = 'BASE TABLE'
               AND table_name NOT LIKE 'pg_%'
               AND table_name NOT LIKE 'sql_%'
             ORDER BY table_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tables)
    }

    /// 面向仪表盘的表概要（行数与列名）
    pub async fn table_summaries(&self) -> AppResult<Vec<TableSummary>> {
        let mut summaries = Vec::new();
        for table in self.list_tables().await? {
            let columns = self.column_meta(&table).await?;
            let row_count = self.count_rows(&table).await?;
            summaries.push(TableSummary {
                name: table,
                row_count,
                columns: columns.into_iter().map(|c| c.name).collect(),
            });
        }
        Ok(summaries)
    }

    /// 获取表的列元数据，表不存在时返回 404
    pub async fn columns(&self, table: &str) -> AppResult<Vec<TableColumn>> {
        SqlBuilder::validate_identifier(table)?;
        let rows = sqlx::query(
            "SELECT column_name::text, data_type::text, is_nullable::text, column_default::text
             FROM information_schema.columns
             WHERE table_schema = 'public' AND table_name = $1
             ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(AppError::TableNotFound(table.to_string()));
        }

        Ok(rows
            .into_iter()
            .map(|row| TableColumn {
                name: row.get::<String, _>(0),
                data_type: row.get::<String, _>(1),
                nullable: row.get::<String, _>(2) == "YES",
                default: row.get::<Option<String>, _>(3),
            })
            .collect())
    }

    /// 获取表的主键列名，未定义主键时退回 "id"
    pub async fn primary_key(&self, table: &str) -> AppResult<String> {
        SqlBuilder::validate_identifier(table)?;
        let pk = sqlx::query_scalar::<_, String>(
            "SELECT kcu.column_name::text
             FROM information_schema.table_constraints tc
             JOIN information_schema.key_column_usage kcu
               ON tc.constraint_name = kcu.constraint_name
             WHERE tc.table_name = $1 AND tc.constraint_type = 'PRIMARY KEY'",
        )
        .bind(table)
        .fetch_optional(&self.pool)
        .await?;
        Ok(pk.unwrap_or_else(|| "id".to_string()))
    }

    /// 分页读取表数据
    pub async fn table_data(&self, table: &str, page: u32, page_size: u32) -> AppResult<TableData> {
        let page = page.max(1);
        let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };

        let meta = self.column_meta(table).await?;
        let columns: Vec<String> = meta.iter().map(|c| c.name.clone()).collect();
        let total = self.count_rows(table).await?;
        let sort_column = SqlBuilder::sort_column(&columns);

        let sql = format!(
            "SELECT * FROM {} ORDER BY {} LIMIT $1 OFFSET $2",
            SqlBuilder::quote_ident(table),
            SqlBuilder::quote_ident(&sort_column),
        );
        let offset = (page as i64 - 1) * page_size as i64;
        let rows = sqlx::query(&sql)
            .bind(page_size as i64)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(TableData {
            columns,
            sort_column,
            rows: rows.iter().map(rows::row_to_object).collect(),
            pagination: Pagination::new(page, page_size, total),
        })
    }

    /// 按主键读取单条记录
    pub async fn record_by_key(&self, table: &str, id: &str) -> AppResult<Value> {
        let meta = self.column_meta(table).await?;
        let pk = self.primary_key(table).await?;
        let conditions = key_condition(&pk, id);

        let (sql, binds) = SqlBuilder::select_where(table, &meta, &conditions)?;
        let row = bind_all(sqlx::query(&sql), &binds)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::RecordNotFound(format!("{}: {} = {}", table, pk, id)))?;

        Ok(rows::row_to_object(&row))
    }

    /// 插入记录，空值跳过以使用列默认值，返回插入后的行
    pub async fn insert_record(&self, table: &str, values: &Value) -> AppResult<Value> {
        let meta = self.column_meta(table).await?;
        let values = as_object(values)?;

        let (sql, binds) = SqlBuilder::insert(table, &meta, values)?;
        let row = bind_all(sqlx::query(&sql), &binds)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(table = table, "记录已插入");
        Ok(rows::row_to_object(&row))
    }

    /// 按主键更新记录（主键列与空值不参与更新）
    pub async fn update_by_key(&self, table: &str, id: &str, values: &Value) -> AppResult<Value> {
        let meta = self.column_meta(table).await?;
        let pk = self.primary_key(table).await?;
        let set = as_object(values)?;
        let conditions = key_condition(&pk, id);

        let (sql, binds) = SqlBuilder::update(table, &meta, set, &conditions, &[pk.as_str()])?;
        let row = bind_all(sqlx::query(&sql), &binds)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::RecordNotFound(format!("{}: {} = {}", table, pk, id)))?;

        tracing::info!(table = table, key = %id, "记录已更新");
        Ok(rows::row_to_object(&row))
    }

    /// 按条件批量更新，返回受影响的行
    pub async fn bulk_update(
        &self,
        table: &str,
        set: &Value,
        conditions: &Value,
    ) -> AppResult<RecordSet> {
        let meta = self.column_meta(table).await?;
        let set = as_object(set)?;
        let conditions = as_object(conditions)?;

        let (sql, binds) = SqlBuilder::update(table, &meta, set, conditions, &[])?;
        let rows = bind_all(sqlx::query(&sql), &binds)
            .fetch_all(&self.pool)
            .await?;

        tracing::info!(table = table, affected = rows.len(), "批量更新完成");
        Ok(record_set(rows))
    }

    /// 按主键删除记录，返回被删除的行
    pub async fn delete_by_key(&self, table: &str, id: &str) -> AppResult<Value> {
        let meta = self.column_meta(table).await?;
        let pk = self.primary_key(table).await?;
        let conditions = key_condition(&pk, id);

        let (sql, binds) = SqlBuilder::delete(table, &meta, &conditions)?;
        let row = bind_all(sqlx::query(&sql), &binds)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::RecordNotFound(format!("{}: {} = {}", table, pk, id)))?;

        tracing::info!(table = table, key = %id, "记录已删除");
        Ok(rows::row_to_object(&row))
    }

    /// 按条件批量删除，返回被删除的行
    pub async fn bulk_delete(&self, table: &str, conditions: &Value) -> AppResult<RecordSet> {
        let meta = self.column_meta(table).await?;
        let conditions = as_object(conditions)?;

        let (sql, binds) = SqlBuilder::delete(table, &meta, conditions)?;
        let rows = bind_all(sqlx::query(&sql), &binds)
            .fetch_all(&self.pool)
            .await?;

        tracing::info!(table = table, affected = rows.len(), "批量删除完成");
        Ok(record_set(rows))
    }

    /// 执行临时 SQL
    pub async fn execute(&self, req: QueryRequest) -> AppResult<QueryResult> {
        req.validate()?;
        SqlValidator::validate(&req.sql)?;

        let start = std::time::Instant::now();

        if SqlValidator::returns_rows(&req.sql) {
            let mut rows = sqlx::query(&req.sql).fetch_all(&self.pool).await?;
            let execution_time_ms = start.elapsed().as_millis() as u64;

            let limit = req.limit.unwrap_or(1000) as usize;
            if rows.len() > limit {
                rows.truncate(limit);
            }

            // 空结果集仍需返回列信息，从语句描述中取
            let columns = match rows.first() {
                Some(row) => row
                    .columns()
                    .iter()
                    .map(|c| ColumnInfo {
                        name: c.name().to_string(),
                        data_type: c.type_info().name().to_string(),
                        nullable: None,
                    })
                    .collect(),
                None => {
                    let statement = self.pool.describe(&req.sql).await?;
                    statement
                        .columns()
                        .iter()
                        .enumerate()
                        .map(|(idx, c)| ColumnInfo {
                            name: c.name().to_string(),
                            data_type: c.type_info().name().to_string(),
                            nullable: statement.nullable(idx),
                        })
                        .collect()
                }
            };

            tracing::info!(rows = rows.len(), elapsed_ms = execution_time_ms, "查询执行完成");
            Ok(QueryResult {
                row_count: rows.len(),
                rows: rows.iter().map(rows::row_to_values).collect(),
                columns,
                affected_rows: None,
                execution_time_ms,
            })
        } else {
            let result = sqlx::query(&req.sql).execute(&self.pool).await?;
            let execution_time_ms = start.elapsed().as_millis() as u64;

            tracing::info!(
                affected = result.rows_affected(),
                elapsed_ms = execution_time_ms,
                "语句执行完成"
            );
            Ok(QueryResult::affected(result.rows_affected(), execution_time_ms))
        }
    }

    /// 读取列元数据（供 SQL 组装使用），表不存在时返回 404
    async fn column_meta(&self, table: &str) -> AppResult<Vec<ColumnMeta>> {
        SqlBuilder::validate_identifier(table)?;
        let rows = sqlx::query(
            "SELECT column_name::text, data_type::text, udt_name::text
             FROM information_schema.columns
             WHERE table_schema = 'public' AND table_name = $1
             ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(AppError::TableNotFound(table.to_string()));
        }

        Ok(rows
            .into_iter()
            .map(|row| ColumnMeta {
                name: row.get::<String, _>(0),
                data_type: row.get::<String, _>(1),
                udt_name: row.get::<String, _>(2),
            })
            .collect())
    }

    async fn count_rows(&self, table: &str) -> AppResult<u64> {
        SqlBuilder::validate_identifier(table)?;
        let sql = format!("SELECT COUNT(*) FROM {}", SqlBuilder::quote_ident(table));
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}

/// 将路径中的主键值包装为条件映射（绑定时按列类型转换）
fn key_condition(pk: &str, id: &str) -> Map<String, Value> {
    let mut conditions = Map::new();
    conditions.insert(pk.to_string(), Value::String(id.to_string()));
    conditions
}

fn as_object(value: &Value) -> AppResult<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| AppError::Validation("expected a JSON object".into()))
}

fn record_set(rows: Vec<sqlx::postgres::PgRow>) -> RecordSet {
    RecordSet {
        affected: rows.len() as u64,
        rows: rows.iter().map(rows::row_to_object).collect(),
    }
}

/// 依次绑定文本化的参数
fn bind_all<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    binds: &'q [Option<String>],
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    let mut query = query;
    for bind in binds {
        query = query.bind(bind.as_deref());
    }
    query
}
