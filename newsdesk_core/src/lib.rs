//! Data access layer used by newsdesk: typed values, query
//! expressions, backend connections and embedded migrations.
#![allow(clippy::upper_case_acronyms)]
#![deny(missing_docs)]

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

pub mod db;
pub mod migrations;
pub mod query;
pub mod sqlval;

mod autopk;

pub use autopk::AutoPk;
use db::{Column, ConnectionMethods, Row};
pub use query::Query;
pub use sqlval::{FieldType, FromSql, IntoSql, PrimaryKeyType, SqlVal, ToSql};

/// Result of data layer operations.
pub type Result<T> = std::result::Result<T, crate::Error>;

/// Something rows can be loaded into.
///
/// Every result type has a corresponding object type and its columns
/// must be a subset of the columns of the object type.
pub trait DataResult: Sized {
    /// The stored object whose table is read.
    type DBO: DataObject;

    /// Metadata for each column, in the order they are selected.
    const COLUMNS: &'static [Column];

    /// Load an object from a row whose values follow [`Self::COLUMNS`].
    fn from_row(row: &Row) -> Result<Self>;

    /// A query over every row of the table.
    fn query() -> Query<Self>;
}

pub mod internal {
    //! Plumbing shared by model implementations and [`DataObjectOps`].

    use super::*;

    /// Methods used by [`DataObjectOps`] to write an object. You do
    /// not usually need to call these directly.
    pub trait DataObjectInternal: DataResult<DBO = Self> {
        /// [`DataResult::COLUMNS`] without the primary key column.
        const NON_PK_COLUMNS: &'static [Column];

        /// Get the primary key as mutable. Used to initialize an [`AutoPk`].
        fn pk_mut(&mut self) -> &mut impl PrimaryKeyType;

        /// Values of [`Self::NON_PK_COLUMNS`], in the same order.
        fn non_pk_values(&self) -> Vec<SqlVal>;
    }
}

/// An object stored in its own table.
///
/// The primary key must be the first entry of [`DataResult::COLUMNS`].
pub trait DataObject: DataResult<DBO = Self> + internal::DataObjectInternal {
    /// Rust type of the primary key.
    type PKType: PrimaryKeyType;
    /// Struct providing typed query helpers for each field.
    type Fields: Default;
    /// Primary key column.
    const PKCOL: &'static str;
    /// Table the objects are stored in.
    const TABLE: &'static str;
    /// True when the key is an [`AutoPk`] assigned on the first save.
    const AUTO_PK: bool;

    /// The object's primary key.
    fn pk(&self) -> &Self::PKType;

    /// Typed column handles for building filters.
    fn fields() -> Self::Fields {
        Self::Fields::default()
    }
}

/// Reading and writing a [`DataObject`] through a connection.
pub trait DataObjectOps<T: DataObject> {
    /// Load the object stored under `id`, failing with
    /// `Error::NoSuchObject` when there is none.
    fn get(conn: &impl ConnectionMethods, id: impl ToSql) -> Result<Self>
    where
        Self: DataObject,
    {
        Self::try_get(conn, id)?.ok_or(Error::NoSuchObject)
    }

    /// Load the object stored under `id`, if any.
    fn try_get(conn: &impl ConnectionMethods, id: impl ToSql) -> Result<Option<Self>>
    where
        Self: DataObject,
    {
        <Self as DataResult>::query()
            .filter(query::BoolExpr::Eq(
                Self::PKCOL,
                query::Expr::Val(id.to_sql()),
            ))
            .load_first(conn)
    }

    /// Insert or update the object.
    ///
    /// An uninitialized [`AutoPk`] always results in an insert which
    /// initializes it. An initialized one results in an update of all
    /// other columns. Objects without an automatic key are upserted.
    fn save(&mut self, conn: &impl ConnectionMethods) -> Result<()>
    where
        Self: DataObject,
    {
        let pkcol = Column::new(Self::PKCOL, <Self::PKType as FieldType>::SQLTYPE);
        if Self::AUTO_PK {
            if self.pk().is_valid() {
                conn.update(
                    Self::TABLE,
                    pkcol,
                    self.pk().to_sql(),
                    Self::NON_PK_COLUMNS,
                    &self.non_pk_values(),
                )
            } else {
                let pk = conn.insert_returning_pk(
                    Self::TABLE,
                    Self::NON_PK_COLUMNS,
                    &pkcol,
                    &self.non_pk_values(),
                )?;
                self.pk_mut().initialize(pk)
            }
        } else {
            let mut values = Vec::with_capacity(Self::COLUMNS.len());
            values.push(self.pk().to_sql());
            values.extend(self.non_pk_values());
            conn.insert_or_replace(Self::TABLE, Self::COLUMNS, &pkcol, &values)
        }
    }

    /// Remove the object's row.
    fn delete(&self, conn: &impl ConnectionMethods) -> Result<()>
    where
        Self: DataObject,
    {
        conn.delete(Self::TABLE, Self::PKCOL, self.pk().to_sql())
    }
}

impl<T> DataObjectOps<T> for T where T: DataObject {}

/// Data layer errors.
#[allow(missing_docs)]
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("No such object exists")]
    NoSuchObject,
    #[error("Index out of bounds {0}")]
    BoundsError(String),
    #[error("Type mismatch converting SqlVal. Expected {0}, found value {1:?}")]
    CannotConvertSqlVal(SqlType, SqlVal),
    #[error(
        "Mismatch between sql types and rust types while loading data for column {col}. {detail}"
    )]
    SqlResultTypeMismatch { col: String, detail: String },
    #[error("Cannot use value not saved to the database")]
    ValueNotSaved,
    #[error("Already initialized")]
    AlreadyInitialized,
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Migration error {0}")]
    MigrationError(String),
    #[error("Unknown backend {0}")]
    UnknownBackend(String),
    #[error("Range error")]
    OutOfRange,
    #[error("Internal logic error {0}")]
    Internal(String),
    #[error("(De)serialization error {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("IO error {0}")]
    IO(#[from] std::io::Error),
    #[error("Chrono error {0}")]
    Chrono(#[from] chrono::ParseError),
    #[cfg(feature = "sqlite")]
    #[error("Sqlite error {0}")]
    SQLite(rusqlite::Error),
    #[cfg(feature = "sqlite")]
    #[error("Sqlite error {0}")]
    SQLiteFromSQL(rusqlite::types::FromSqlError),
    #[cfg(feature = "r2d2")]
    #[error("Connection pool error {0}")]
    Pool(#[from] r2d2::Error),
}

impl Error {
    /// Whether this error was caused by a uniqueness, foreign key or
    /// check constraint in the database.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::ConstraintViolation(_))
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, msg)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::ConstraintViolation(msg.clone().unwrap_or_else(|| err.to_string()))
            }
            _ => Error::SQLite(e),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::types::FromSqlError> for Error {
    fn from(e: rusqlite::types::FromSqlError) -> Self {
        use rusqlite::types::FromSqlError;
        match &e {
            FromSqlError::InvalidType => Error::SqlResultTypeMismatch {
                col: "unknown".to_string(),
                detail: "unknown".to_string(),
            },
            FromSqlError::OutOfRange(_) => Error::OutOfRange,
            _ => Error::SQLiteFromSQL(e),
        }
    }
}

/// Column types. [`SqlVal`] holds a value of one of them.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum SqlType {
    /// Boolean
    Bool,
    /// 4 bytes
    Int,
    /// 8 bytes
    BigInt,
    /// 8 byte float
    Real,
    /// String
    Text,
    /// Timestamp
    Timestamp,
    /// Blob
    Blob,
}
impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use SqlType::*;
        match &self {
            Bool => "bool",
            Int => "int",
            BigInt => "big int",
            Real => "float",
            Text => "string",
            Timestamp => "timestamp",
            Blob => "blob",
        }
        .fmt(f)
    }
}
