//! The SQLite backend, built on rusqlite.
use std::borrow::Cow;
use std::fmt::Debug;
use std::ops::Deref;
use std::path::Path;

use chrono::naive::NaiveDateTime;
use log::debug;
use rusqlite::functions::FunctionFlags;

use super::helper;
use super::{Backend, BackendConnection, BackendTransaction, Column, Connection, Row, Transaction};
use crate::query::{BoolExpr, Expr, Order};
use crate::{Error, Result, SqlType, SqlVal};

const SQLITE_DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
// Fixed width so that text comparison orders timestamps chronologically.
const SQLITE_DT_WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Name to pass to [`get_backend`](super::get_backend).
pub const BACKEND_NAME: &str = "sqlite";

/// Opens SQLite databases from a file path or `:memory:`.
#[derive(Debug, Default, Clone)]
pub struct SQLiteBackend;
impl SQLiteBackend {
    /// Create the backend.
    pub fn new() -> SQLiteBackend {
        SQLiteBackend {}
    }
}
impl SQLiteBackend {
    fn connect(&self, path: &str) -> Result<SQLiteConnection> {
        let connection = SQLiteConnection::open(Path::new(path))?;
        super::ConnectionMethods::execute(&connection, "PRAGMA foreign_keys = ON")?;
        Ok(connection)
    }
}

impl Backend for SQLiteBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn connect(&self, path: &str) -> Result<Connection> {
        Ok(Connection {
            inner: Box::new(self.connect(path)?),
        })
    }
}

/// An open SQLite database with foreign keys enforced.
#[derive(Debug)]
pub struct SQLiteConnection {
    conn: rusqlite::Connection,
}
impl SQLiteConnection {
    fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = rusqlite::Connection::open(path)?;
        register_fold_case(&conn)?;
        Ok(SQLiteConnection { conn })
    }

    #[allow(clippy::unnecessary_wraps)]
    fn wrapped_connection_methods(&self) -> Result<&rusqlite::Connection> {
        Ok(&self.conn)
    }
}
crate::connection_method_wrapper!(SQLiteConnection);

/// Registers [`helper::FOLD_CASE_FN`]. SQLite's `lower()` only folds ASCII.
fn register_fold_case(conn: &rusqlite::Connection) -> Result<()> {
    conn.create_scalar_function(
        helper::FOLD_CASE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
    )?;
    Ok(())
}

impl BackendConnection for SQLiteConnection {
    fn transaction(&mut self) -> Result<Transaction<'_>> {
        let trans: rusqlite::Transaction<'_> = self.conn.transaction()?;
        let trans = Box::new(SqliteTransaction::new(trans));
        Ok(Transaction::new(trans))
    }
    fn backend(&self) -> Box<dyn Backend> {
        Box::new(SQLiteBackend {})
    }
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }
    fn is_closed(&self) -> bool {
        false
    }
}

impl super::ConnectionMethods for rusqlite::Connection {
    fn execute(&self, sql: &str) -> Result<()> {
        debug!("execute sql {}", sql);
        self.execute_batch(sql)?;
        Ok(())
    }

    fn query(
        &self,
        table: &str,
        columns: &[Column],
        expr: Option<BoolExpr>,
        limit: Option<i32>,
        offset: Option<i32>,
        order: Option<&[Order]>,
    ) -> Result<Vec<Row>> {
        let mut sqlquery = String::new();
        helper::sql_select(columns, table, &mut sqlquery);
        let mut values: Vec<SqlVal> = Vec::new();
        if let Some(expr) = expr {
            sqlquery.push_str(" WHERE ");
            sql_for_expr(Expr::Condition(Box::new(expr)), &mut values, &mut sqlquery);
        }

        if let Some(order) = order {
            helper::sql_order(order, &mut sqlquery)
        }

        if let Some(limit) = limit {
            helper::sql_limit(limit, &mut sqlquery)
        }

        if let Some(offset) = offset {
            if limit.is_none() {
                // OFFSET is only valid after a LIMIT.
                helper::sql_limit(-1, &mut sqlquery)
            }
            helper::sql_offset(offset, &mut sqlquery)
        }

        debug!("query sql {}", sqlquery);

        let mut stmt = self.prepare(&sqlquery)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(values.iter()))?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            results.push(row_from_rusqlite(row, columns)?);
        }
        Ok(results)
    }

    fn count(&self, table: &str, expr: Option<BoolExpr>) -> Result<i64> {
        let mut sql = String::new();
        helper::sql_count(table, &mut sql);
        let mut values: Vec<SqlVal> = Vec::new();
        if let Some(expr) = expr {
            sql.push_str(" WHERE ");
            sql_for_expr(Expr::Condition(Box::new(expr)), &mut values, &mut sql);
        }
        debug!("count sql {}", sql);
        let count = self.query_row(&sql, rusqlite::params_from_iter(values.iter()), |row| {
            row.get::<_, i64>(0)
        })?;
        Ok(count)
    }

    fn insert_returning_pk(
        &self,
        table: &str,
        columns: &[Column],
        pkcol: &Column,
        values: &[SqlVal],
    ) -> Result<SqlVal> {
        let mut sql = String::new();
        helper::sql_insert_with_placeholders(
            table,
            columns,
            &mut SQLitePlaceholderSource::new(),
            &mut sql,
        );
        debug!("insert sql {}", sql);
        rusqlite::Connection::execute(self, &sql, rusqlite::params_from_iter(values.iter()))?;
        let pk_sql = format!(
            "SELECT {} FROM {} WHERE ROWID = last_insert_rowid()",
            helper::quote_ident(pkcol.name()),
            helper::quote_ident(table)
        );
        let pk: SqlVal = self.query_row_and_then(&pk_sql, [], |row| {
            sql_val_from_rusqlite(row.get_ref(0)?, pkcol.ty())
        })?;
        Ok(pk)
    }

    fn insert_only(&self, table: &str, columns: &[Column], values: &[SqlVal]) -> Result<()> {
        let mut sql = String::new();
        helper::sql_insert_with_placeholders(
            table,
            columns,
            &mut SQLitePlaceholderSource::new(),
            &mut sql,
        );
        debug!("insert sql {}", sql);
        rusqlite::Connection::execute(self, &sql, rusqlite::params_from_iter(values.iter()))?;
        Ok(())
    }

    fn insert_or_replace(
        &self,
        table: &str,
        columns: &[Column],
        pkcol: &Column,
        values: &[SqlVal],
    ) -> Result<()> {
        let mut sql = String::new();
        sql_insert_or_update(table, columns, pkcol, &mut sql);
        debug!("upsert sql {}", sql);
        rusqlite::Connection::execute(self, &sql, rusqlite::params_from_iter(values.iter()))?;
        Ok(())
    }

    fn update(
        &self,
        table: &str,
        pkcol: Column,
        pk: SqlVal,
        columns: &[Column],
        values: &[SqlVal],
    ) -> Result<()> {
        let mut sql = String::new();
        helper::sql_update_with_placeholders(
            table,
            &pkcol,
            columns,
            &mut SQLitePlaceholderSource::new(),
            &mut sql,
        );
        let placeholder_values = [values, &[pk]].concat();
        debug!("update sql {}", sql);
        rusqlite::Connection::execute(
            self,
            &sql,
            rusqlite::params_from_iter(placeholder_values.iter()),
        )?;
        Ok(())
    }

    fn update_where(
        &self,
        table: &str,
        columns: &[Column],
        values: &[SqlVal],
        expr: BoolExpr,
    ) -> Result<usize> {
        let mut sql = String::new();
        sql.push_str("UPDATE ");
        sql.push_str(&helper::quote_ident(table));
        helper::sql_set_with_placeholders(columns, &mut SQLitePlaceholderSource::new(), &mut sql);
        sql.push_str(" WHERE ");
        let mut placeholder_values = values.to_vec();
        sql_for_expr(
            Expr::Condition(Box::new(expr)),
            &mut placeholder_values,
            &mut sql,
        );
        debug!("update where sql {}", sql);
        let cnt = rusqlite::Connection::execute(
            self,
            &sql,
            rusqlite::params_from_iter(placeholder_values.iter()),
        )?;
        Ok(cnt)
    }

    fn increment_where(
        &self,
        table: &str,
        column: &'static str,
        by: i64,
        expr: BoolExpr,
    ) -> Result<usize> {
        let col = helper::quote_ident(column);
        let mut sql = format!(
            "UPDATE {} SET {col} = {col} + ? WHERE ",
            helper::quote_ident(table)
        );
        let mut values = vec![SqlVal::BigInt(by)];
        sql_for_expr(Expr::Condition(Box::new(expr)), &mut values, &mut sql);
        debug!("increment sql {}", sql);
        let cnt = rusqlite::Connection::execute(self, &sql, rusqlite::params_from_iter(values.iter()))?;
        Ok(cnt)
    }

    fn delete_where(&self, table: &str, expr: BoolExpr) -> Result<usize> {
        let mut sql = format!("DELETE FROM {} WHERE ", helper::quote_ident(table));
        let mut values: Vec<SqlVal> = Vec::new();
        sql_for_expr(Expr::Condition(Box::new(expr)), &mut values, &mut sql);
        debug!("delete where sql {}", sql);
        let cnt = rusqlite::Connection::execute(self, &sql, rusqlite::params_from_iter(values.iter()))?;
        Ok(cnt)
    }

    fn has_table(&self, table: &str) -> Result<bool> {
        let mut stmt =
            self.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?;")?;
        let mut rows = stmt.query([table])?;
        Ok(rows.next()?.is_some())
    }
}

#[derive(Debug)]
struct SqliteTransaction<'c> {
    trans: Option<rusqlite::Transaction<'c>>,
}
impl<'c> SqliteTransaction<'c> {
    fn new(trans: rusqlite::Transaction<'c>) -> Self {
        SqliteTransaction { trans: Some(trans) }
    }
    fn get(&self) -> Result<&rusqlite::Transaction<'c>> {
        match &self.trans {
            None => Err(Self::already_consumed()),
            Some(trans) => Ok(trans),
        }
    }
    fn wrapped_connection_methods(&self) -> Result<&rusqlite::Connection> {
        Ok(self.get()?.deref())
    }
    fn already_consumed() -> Error {
        Error::Internal("transaction has already been consumed".to_string())
    }
}
crate::connection_method_wrapper!(SqliteTransaction<'_>);

impl<'c> BackendTransaction<'c> for SqliteTransaction<'c> {
    fn commit(&mut self) -> Result<()> {
        match self.trans.take() {
            None => Err(Self::already_consumed()),
            Some(trans) => Ok(trans.commit()?),
        }
    }
    fn rollback(&mut self) -> Result<()> {
        match self.trans.take() {
            None => Err(Self::already_consumed()),
            Some(trans) => Ok(trans.rollback()?),
        }
    }
    fn connection_methods(&self) -> &dyn super::ConnectionMethods {
        self
    }
}

impl rusqlite::ToSql for SqlVal {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput::Borrowed, ToSqlOutput::Owned, Value, ValueRef};
        Ok(match self {
            SqlVal::Bool(b) => Owned(Value::Integer(*b as i64)),
            SqlVal::Int(i) => Owned(Value::Integer(*i as i64)),
            SqlVal::BigInt(i) => Owned(Value::Integer(*i)),
            SqlVal::Real(r) => Owned(Value::Real(*r)),
            SqlVal::Text(t) => Borrowed(ValueRef::Text(t.as_bytes())),
            SqlVal::Blob(b) => Borrowed(ValueRef::Blob(b)),
            SqlVal::Timestamp(dt) => {
                Owned(Value::Text(dt.format(SQLITE_DT_WRITE_FORMAT).to_string()))
            }
            SqlVal::Null => Owned(Value::Null),
        })
    }
}

fn row_from_rusqlite(row: &rusqlite::Row<'_>, columns: &[Column]) -> Result<Row> {
    let values = columns
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            sql_val_from_rusqlite(row.get_ref(idx)?, col.ty()).map_err(|e| match e {
                Error::SqlResultTypeMismatch { detail, .. } => Error::SqlResultTypeMismatch {
                    col: col.name().to_string(),
                    detail,
                },
                e => e,
            })
        })
        .collect::<Result<Vec<SqlVal>>>()?;
    Ok(Row::new(values))
}

fn sql_val_from_rusqlite(val: rusqlite::types::ValueRef<'_>, ty: SqlType) -> Result<SqlVal> {
    if matches!(val, rusqlite::types::ValueRef::Null) {
        return Ok(SqlVal::Null);
    }
    Ok(match ty {
        SqlType::Bool => SqlVal::Bool(val.as_i64()? != 0),
        SqlType::Int => SqlVal::Int(i32::try_from(val.as_i64()?).map_err(|_| Error::OutOfRange)?),
        SqlType::BigInt => SqlVal::BigInt(val.as_i64()?),
        SqlType::Real => SqlVal::Real(val.as_f64()?),
        SqlType::Text => SqlVal::Text(val.as_str()?.to_string()),
        SqlType::Timestamp => {
            SqlVal::Timestamp(NaiveDateTime::parse_from_str(val.as_str()?, SQLITE_DT_FORMAT)?)
        }
        SqlType::Blob => SqlVal::Blob(val.as_blob()?.to_vec()),
    })
}

fn sql_for_expr(expr: Expr, values: &mut Vec<SqlVal>, w: &mut String) {
    helper::sql_for_expr(expr, values, &mut SQLitePlaceholderSource::new(), w)
}

/// Writes an upsert keyed on `pkcol`.
fn sql_insert_or_update(table: &str, columns: &[Column], pkcol: &Column, w: &mut String) {
    helper::sql_insert_with_placeholders(table, columns, &mut SQLitePlaceholderSource::new(), w);
    w.push_str(" ON CONFLICT (");
    w.push_str(&helper::quote_ident(pkcol.name()));
    w.push_str(") DO ");
    let updates: Vec<String> = columns
        .iter()
        .filter(|c| c.name() != pkcol.name())
        .map(|c| {
            let name = helper::quote_ident(c.name());
            format!("{name} = excluded.{name}")
        })
        .collect();
    if updates.is_empty() {
        // Nothing besides the key to overwrite.
        w.push_str("NOTHING");
    } else {
        w.push_str("UPDATE SET ");
        w.push_str(&updates.join(", "));
    }
}

struct SQLitePlaceholderSource;
impl SQLitePlaceholderSource {
    fn new() -> Self {
        SQLitePlaceholderSource {}
    }
}
impl helper::PlaceholderSource for SQLitePlaceholderSource {
    fn next_placeholder(&mut self) -> Cow<'_, str> {
        Cow::Borrowed("?")
    }
}
