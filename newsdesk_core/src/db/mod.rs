//! Connections, transactions and the backends that open them.
//!
//! Code reading or writing rows takes `&impl ConnectionMethods`, which
//! is implemented by [`Connection`], [`Transaction`] and pooled
//! connections alike. Starting a transaction needs a
//! [`BackendConnection`] by mutable reference. [`connect`] turns a
//! [`ConnectionSpec`] into a boxed [`Connection`] for whichever backend
//! it names.

use std::borrow::Cow;
use std::fmt::Debug;
use std::fs;
use std::io::Write;
use std::ops::DerefMut;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::query::{BoolExpr, Expr, Order};
use crate::sqlval::FromSql;
use crate::{Error, Result, SqlType, SqlVal};

mod helper;
mod macros;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "r2d2")]
pub mod r2;
#[cfg(feature = "r2d2")]
pub use r2::ConnectionManager;

use crate::connection_method_wrapper;

/// Column description used when reading and writing rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Column {
    name: &'static str,
    ty: SqlType,
}
impl Column {
    /// Describe a column.
    pub const fn new(name: &'static str, ty: SqlType) -> Self {
        Column { name, ty }
    }
    /// Column name.
    pub fn name(&self) -> &'static str {
        self.name
    }
    /// Column type.
    pub fn ty(&self) -> SqlType {
        self.ty
    }
}

/// One result row, decoded according to the requested columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    values: Vec<SqlVal>,
}
impl Row {
    /// Wrap decoded values.
    pub fn new(values: Vec<SqlVal>) -> Self {
        Row { values }
    }
    /// Number of values in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }
    /// Whether the row has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    /// Convert the value at `idx`.
    pub fn get<T: FromSql>(&self, idx: usize) -> Result<T> {
        let val = self
            .values
            .get(idx)
            .ok_or_else(|| Error::BoundsError(format!("column {idx} of {}", self.values.len())))?;
        T::from_sql(val.clone())
    }
    /// The raw value at `idx`.
    pub fn raw(&self, idx: usize) -> Option<&SqlVal> {
        self.values.get(idx)
    }
}

/// Methods available on a database connection. Most users do not need
/// to call these methods directly and will instead use methods on
/// [DataObject][crate::DataObject] or the [Query][crate::query::Query]
/// type. Values are always passed in the order of `columns`.
pub trait ConnectionMethods {
    /// Run one or more raw SQL statements.
    fn execute(&self, sql: &str) -> Result<()>;
    /// Select `columns` from `table`.
    fn query(
        &self,
        table: &str,
        columns: &[Column],
        expr: Option<BoolExpr>,
        limit: Option<i32>,
        offset: Option<i32>,
        sort: Option<&[Order]>,
    ) -> Result<Vec<Row>>;
    /// Count the rows of `table` matching `expr`.
    fn count(&self, table: &str, expr: Option<BoolExpr>) -> Result<i64>;
    /// Insert a row and return the primary key the database assigned.
    fn insert_returning_pk(
        &self,
        table: &str,
        columns: &[Column],
        pkcol: &Column,
        values: &[SqlVal],
    ) -> Result<SqlVal>;
    /// Insert a row whose primary key is supplied by the caller.
    fn insert_only(&self, table: &str, columns: &[Column], values: &[SqlVal]) -> Result<()>;
    /// Insert a row, or overwrite the row already holding its primary key.
    fn insert_or_replace(
        &self,
        table: &str,
        columns: &[Column],
        pkcol: &Column,
        values: &[SqlVal],
    ) -> Result<()>;
    /// Update `columns` of the row whose primary key is `pk`.
    fn update(
        &self,
        table: &str,
        pkcol: Column,
        pk: SqlVal,
        columns: &[Column],
        values: &[SqlVal],
    ) -> Result<()>;
    /// Update `columns` of every row matching `expr`, returning the
    /// number of rows changed.
    fn update_where(
        &self,
        table: &str,
        columns: &[Column],
        values: &[SqlVal],
        expr: BoolExpr,
    ) -> Result<usize>;
    /// Add `by` to an integer column in place for every row matching
    /// `expr`, returning the number of rows changed.
    fn increment_where(
        &self,
        table: &str,
        column: &'static str,
        by: i64,
        expr: BoolExpr,
    ) -> Result<usize>;
    /// Delete the row whose primary key is `pk`.
    fn delete(&self, table: &str, pkcol: &'static str, pk: SqlVal) -> Result<()> {
        self.delete_where(table, BoolExpr::Eq(pkcol, Expr::Val(pk)))?;
        Ok(())
    }
    /// Delete every row matching `expr`, returning the number deleted.
    fn delete_where(&self, table: &str, expr: BoolExpr) -> Result<usize>;
    /// Whether `table` has been created.
    fn has_table(&self, table: &str) -> Result<bool>;
}

/// An open connection owned by one backend.
pub trait BackendConnection: ConnectionMethods + Debug + Send + 'static {
    /// Start a transaction. The connection stays borrowed until the
    /// transaction is committed, rolled back or dropped.
    fn transaction(&mut self) -> Result<Transaction<'_>>;
    /// The backend that opened this connection.
    fn backend(&self) -> Box<dyn Backend>;
    /// Name of that backend, e.g. `sqlite`.
    fn backend_name(&self) -> &'static str;
    /// False unless the backend knows the connection is unusable.
    fn is_closed(&self) -> bool;
}

/// A connection to any backend, boxed so callers need not name it.
#[derive(Debug)]
pub struct Connection {
    inner: Box<dyn BackendConnection>,
}
impl Connection {
    #[allow(clippy::unnecessary_wraps)]
    fn wrapped_connection_methods(&self) -> Result<&dyn BackendConnection> {
        Ok(self.inner.as_ref())
    }
}
impl BackendConnection for Connection {
    fn transaction(&mut self) -> Result<Transaction<'_>> {
        self.inner.transaction()
    }
    fn backend(&self) -> Box<dyn Backend> {
        self.inner.backend()
    }
    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}
connection_method_wrapper!(Connection);

/// Which backend to use and how to reach the database, e.g.
/// `sqlite` and a file path. Passed to [`connect`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ConnectionSpec {
    /// Backend name, such as `sqlite`.
    pub backend_name: String,
    /// Backend-specific connection string.
    pub conn_str: String,
}
impl ConnectionSpec {
    /// Create a spec from its parts.
    pub fn new(backend_name: impl Into<String>, conn_str: impl Into<String>) -> Self {
        ConnectionSpec {
            backend_name: backend_name.into(),
            conn_str: conn_str.into(),
        }
    }
    /// Parse the `backend:connection-string` form used on command
    /// lines and in environment variables.
    pub fn parse(spec: &str) -> Result<Self> {
        match spec.split_once(':') {
            Some((backend, conn_str)) if !backend.is_empty() => {
                Ok(ConnectionSpec::new(backend, conn_str))
            }
            _ => Err(Error::UnknownBackend(spec.to_string())),
        }
    }
    /// Write the spec as JSON. A directory gets a `connection.json`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec(self)?;
        fs::File::create(spec_file(path))?.write_all(&json)?;
        Ok(())
    }
    /// Read a spec written by [`save`](ConnectionSpec::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = fs::File::open(spec_file(path.as_ref()))?;
        Ok(serde_json::from_reader(file)?)
    }
    /// The backend named by this spec.
    pub fn get_backend(&self) -> Result<Box<dyn Backend>> {
        get_backend(&self.backend_name)
            .ok_or_else(|| Error::UnknownBackend(self.backend_name.clone()))
    }
}

fn spec_file(path: &Path) -> Cow<'_, Path> {
    if path.is_dir() {
        Cow::from(path.join("connection.json"))
    } else {
        Cow::from(path)
    }
}

/// A database engine able to open connections. Looked up by name with
/// [`get_backend`].
pub trait Backend {
    /// Name of the backend.
    fn name(&self) -> &'static str;
    /// Open a connection.
    fn connect(&self, conn_str: &str) -> Result<Connection>;
}

/// The compiled-in backend called `name`, if any.
pub fn get_backend(name: &str) -> Option<Box<dyn Backend>> {
    match name {
        #[cfg(feature = "sqlite")]
        sqlite::BACKEND_NAME => Some(Box::new(sqlite::SQLiteBackend::new())),
        _ => None,
    }
}

/// Open a connection to the database described by `spec`.
pub fn connect(spec: &ConnectionSpec) -> Result<Connection> {
    spec.get_backend()?.connect(&spec.conn_str)
}

/// Backend side of a [`Transaction`]. Nothing may be called after
/// `commit` or `rollback`; `Transaction` consumes itself to ensure it.
trait BackendTransaction<'c>: ConnectionMethods + Debug {
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;
    /// Upcast to the supertrait object.
    fn connection_methods(&self) -> &dyn ConnectionMethods;
}

/// A transaction opened by [`BackendConnection::transaction`].
/// Dropping it without committing rolls it back.
#[derive(Debug)]
pub struct Transaction<'c> {
    inner: Box<dyn BackendTransaction<'c> + 'c>,
}
impl<'c> Transaction<'c> {
    #[allow(unused)]
    fn new(inner: Box<dyn BackendTransaction<'c> + 'c>) -> Self {
        Transaction { inner }
    }
    /// Make the transaction's changes permanent.
    pub fn commit(mut self) -> Result<()> {
        self.inner.deref_mut().commit()
    }
    /// Same as dropping the transaction, but reports failures.
    pub fn rollback(mut self) -> Result<()> {
        self.inner.deref_mut().rollback()
    }
    #[allow(clippy::unnecessary_wraps)]
    fn wrapped_connection_methods(&self) -> Result<&dyn ConnectionMethods> {
        Ok(self.inner.as_ref().connection_methods())
    }
}

connection_method_wrapper!(Transaction<'_>);
