//! Primary keys assigned by the database.

use std::cmp::Ordering;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use super::{Error, FieldType, FromSql, IntoSql, PrimaryKeyType, Result, SqlType, SqlVal, ToSql};

/// A [PrimaryKeyType] the database fills in on first save, e.g. an
/// SQLite `INTEGER PRIMARY KEY`. Reads as `None` until then, through
/// `Deref<Target = Option<T>>`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AutoPk<T: PrimaryKeyType> {
    inner: Option<T>,
}

impl<T: PrimaryKeyType> AutoPk<T> {
    /// Key of a new, unsaved object.
    pub fn uninitialized() -> Self {
        AutoPk { inner: None }
    }

    /// Key of an object already stored under `val`. Loading rows sets
    /// this up on its own.
    pub fn with_value(val: T) -> Self {
        AutoPk { inner: Some(val) }
    }

    /// The key of a saved object, or `Error::ValueNotSaved`.
    pub fn saved(&self) -> Result<T> {
        self.inner.clone().ok_or(Error::ValueNotSaved)
    }
}

impl<T: PrimaryKeyType> Deref for AutoPk<T> {
    type Target = Option<T>;
    fn deref(&self) -> &Option<T> {
        &self.inner
    }
}

impl<T: PrimaryKeyType> FromSql for AutoPk<T> {
    fn from_sql(val: SqlVal) -> Result<Self> {
        Ok(AutoPk::with_value(T::from_sql(val)?))
    }
}

impl<T: PrimaryKeyType> ToSql for AutoPk<T> {
    /// An unsaved key converts to `NULL`, which matches no row.
    fn to_sql(&self) -> SqlVal {
        self.inner.to_sql()
    }
}

impl<T: PrimaryKeyType> IntoSql for AutoPk<T> {
    fn into_sql(self) -> SqlVal {
        self.inner.into_sql()
    }
}

impl<T: PrimaryKeyType> PartialEq for AutoPk<T> {
    fn eq(&self, other: &AutoPk<T>) -> bool {
        if !self.is_valid() || !other.is_valid() {
            false
        } else {
            self.inner.eq(&other.inner)
        }
    }
}

impl<T: PrimaryKeyType> FieldType for AutoPk<T> {
    const SQLTYPE: SqlType = T::SQLTYPE;
    type RefType = T::RefType;
}
impl<T: PrimaryKeyType> PrimaryKeyType for AutoPk<T> {
    fn is_valid(&self) -> bool {
        match &self.inner {
            Some(val) => val.is_valid(),
            None => false,
        }
    }

    fn initialize(&mut self, val: SqlVal) -> Result<()> {
        if self.is_valid() {
            return Err(Error::AlreadyInitialized);
        }
        self.inner = Some(T::from_sql(val)?);
        Ok(())
    }
}

impl<T: PrimaryKeyType + std::fmt::Display> std::fmt::Display for AutoPk<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        match &self.inner {
            Some(val) => val.fmt(f),
            None => write!(f, "UNINITIALIZED"),
        }
    }
}

impl<T: PrimaryKeyType + Copy> Copy for AutoPk<T> {}

impl<T: PrimaryKeyType + Ord> PartialOrd for AutoPk<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl<T: PrimaryKeyType> From<T> for AutoPk<T> {
    fn from(val: T) -> Self {
        AutoPk::with_value(val)
    }
}
