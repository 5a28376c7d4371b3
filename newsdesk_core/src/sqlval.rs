//! Database values and conversions to and from Rust types.

use std::fmt;

use chrono::naive::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{Error::CannotConvertSqlVal, Result, SqlType};

/// A value read from or bound to a column. [`ToSql`], [`IntoSql`] and
/// [`FromSql`] convert Rust values to and from it.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SqlVal {
    Null,
    Bool(bool),
    Int(i32),
    BigInt(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Timestamp(NaiveDateTime),
}
impl SqlVal {
    /// Whether this is SQL `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlVal::Null)
    }
    #[allow(missing_docs)]
    pub fn bool(&self) -> Result<bool> {
        match self {
            SqlVal::Bool(val) => Ok(*val),
            _ => Err(CannotConvertSqlVal(SqlType::Bool, self.clone())),
        }
    }
    #[allow(missing_docs)]
    pub fn integer(&self) -> Result<i32> {
        match self {
            SqlVal::Int(val) => Ok(*val),
            _ => Err(CannotConvertSqlVal(SqlType::Int, self.clone())),
        }
    }
    #[allow(missing_docs)]
    pub fn bigint(&self) -> Result<i64> {
        match self {
            SqlVal::Int(val) => Ok(*val as i64),
            SqlVal::BigInt(val) => Ok(*val),
            _ => Err(CannotConvertSqlVal(SqlType::BigInt, self.clone())),
        }
    }
    #[allow(missing_docs)]
    pub fn text(&self) -> Result<&str> {
        match self {
            SqlVal::Text(val) => Ok(val),
            _ => Err(CannotConvertSqlVal(SqlType::Text, self.clone())),
        }
    }
    #[allow(missing_docs)]
    pub fn timestamp(&self) -> Result<NaiveDateTime> {
        match self {
            SqlVal::Timestamp(val) => Ok(*val),
            _ => Err(CannotConvertSqlVal(SqlType::Timestamp, self.clone())),
        }
    }
}
impl fmt::Display for SqlVal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use SqlVal::*;
        match &self {
            Null => f.write_str("NULL"),
            Bool(val) => val.fmt(f),
            Int(val) => val.fmt(f),
            BigInt(val) => val.fmt(f),
            Real(val) => val.fmt(f),
            Text(val) => val.fmt(f),
            Blob(val) => f.write_str(&hex::encode(val)),
            Timestamp(val) => val.format("%+").fmt(f),
        }
    }
}

/// Borrowing conversion to [`SqlVal`].
pub trait ToSql {
    /// Convert to a database value.
    fn to_sql(&self) -> SqlVal;
}

/// Owning conversion to [`SqlVal`].
pub trait IntoSql {
    /// Convert to a database value.
    fn into_sql(self) -> SqlVal;
}

impl<T> From<T> for SqlVal
where
    T: IntoSql,
{
    fn from(val: T) -> Self {
        val.into_sql()
    }
}

/// Conversion out of a [`SqlVal`].
pub trait FromSql {
    /// Convert from a database value.
    fn from_sql(val: SqlVal) -> Result<Self>
    where
        Self: Sized;
}

/// A Rust type that can be a column of a model.
pub trait FieldType: ToSql + IntoSql + FromSql {
    /// Column type used to store this type.
    const SQLTYPE: SqlType;
    /// Borrowed form accepted by filters, `str` for `String`.
    type RefType: ?Sized + ToSql;
}

/// Type suitable for being a primary key.
pub trait PrimaryKeyType: FieldType + Clone + PartialEq {
    /// Whether the key identifies a row that was saved. Only automatic
    /// keys can be invalid.
    fn is_valid(&self) -> bool {
        true
    }

    /// Set the key from the value generated by the database.
    fn initialize(&mut self, _val: SqlVal) -> Result<()> {
        Err(crate::Error::AlreadyInitialized)
    }
}

macro_rules! impl_basic_from_sql {
    ($prim:ty, $variant:ident, $sqltype:ident) => {
        impl FromSql for $prim {
            fn from_sql(val: SqlVal) -> Result<Self> {
                if let SqlVal::$variant(val) = val {
                    Ok(val as $prim)
                } else {
                    Err(crate::Error::CannotConvertSqlVal(SqlType::$sqltype, val))
                }
            }
        }
    };
}

macro_rules! impl_prim_sql {
    ($prim:ty, $variant:ident, $sqltype:ident) => {
        impl_basic_from_sql!($prim, $variant, $sqltype);
        impl IntoSql for $prim {
            fn into_sql(self) -> SqlVal {
                SqlVal::$variant(self.into())
            }
        }
        impl ToSql for $prim {
            fn to_sql(&self) -> SqlVal {
                self.clone().into_sql()
            }
        }
        impl FieldType for $prim {
            const SQLTYPE: SqlType = SqlType::$sqltype;
            type RefType = $prim;
        }

        impl PrimaryKeyType for $prim {}
    };
}

impl_prim_sql!(bool, Bool, Bool);
impl_prim_sql!(i32, Int, Int);
impl_prim_sql!(f64, Real, Real);

// Int values widen losslessly.
impl FromSql for i64 {
    fn from_sql(val: SqlVal) -> Result<Self> {
        val.bigint()
    }
}
impl IntoSql for i64 {
    fn into_sql(self) -> SqlVal {
        SqlVal::BigInt(self)
    }
}
impl ToSql for i64 {
    fn to_sql(&self) -> SqlVal {
        SqlVal::BigInt(*self)
    }
}
impl FieldType for i64 {
    const SQLTYPE: SqlType = SqlType::BigInt;
    type RefType = i64;
}
impl PrimaryKeyType for i64 {}

impl_basic_from_sql!(String, Text, Text);
impl ToSql for String {
    fn to_sql(&self) -> SqlVal {
        SqlVal::Text(self.clone())
    }
}
impl IntoSql for String {
    fn into_sql(self) -> SqlVal {
        SqlVal::Text(self)
    }
}
impl FieldType for String {
    const SQLTYPE: SqlType = SqlType::Text;
    type RefType = str;
}
impl PrimaryKeyType for String {}

impl_basic_from_sql!(Vec<u8>, Blob, Blob);
impl ToSql for Vec<u8> {
    fn to_sql(&self) -> SqlVal {
        SqlVal::Blob(self.clone())
    }
}
impl IntoSql for Vec<u8> {
    fn into_sql(self) -> SqlVal {
        SqlVal::Blob(self)
    }
}
impl FieldType for Vec<u8> {
    const SQLTYPE: SqlType = SqlType::Blob;
    type RefType = Self;
}

impl_basic_from_sql!(NaiveDateTime, Timestamp, Timestamp);
impl ToSql for NaiveDateTime {
    fn to_sql(&self) -> SqlVal {
        SqlVal::Timestamp(*self)
    }
}
impl IntoSql for NaiveDateTime {
    fn into_sql(self) -> SqlVal {
        SqlVal::Timestamp(self)
    }
}
impl FieldType for NaiveDateTime {
    const SQLTYPE: SqlType = SqlType::Timestamp;
    type RefType = Self;
}

impl IntoSql for &str {
    fn into_sql(self) -> SqlVal {
        SqlVal::Text(self.to_string())
    }
}
impl ToSql for str {
    fn to_sql(&self) -> SqlVal {
        SqlVal::Text(self.to_string())
    }
}

impl<T> ToSql for &T
where
    T: ToSql + ?Sized,
{
    fn to_sql(&self) -> SqlVal {
        (**self).to_sql()
    }
}

impl<T> ToSql for Option<T>
where
    T: ToSql,
{
    fn to_sql(&self) -> SqlVal {
        match self {
            None => SqlVal::Null,
            Some(v) => v.to_sql(),
        }
    }
}
impl<T> IntoSql for Option<T>
where
    T: IntoSql,
{
    fn into_sql(self) -> SqlVal {
        match self {
            None => SqlVal::Null,
            Some(v) => v.into_sql(),
        }
    }
}
impl<T> FromSql for Option<T>
where
    T: FromSql,
{
    fn from_sql(val: SqlVal) -> Result<Self> {
        Ok(match val {
            SqlVal::Null => None,
            _ => Some(T::from_sql(val)?),
        })
    }
}
impl<T> FieldType for Option<T>
where
    T: FieldType,
{
    const SQLTYPE: SqlType = T::SQLTYPE;
    type RefType = Self;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_widen_but_do_not_narrow() {
        assert_eq!(i64::from_sql(SqlVal::Int(7)).unwrap(), 7);
        assert!(i32::from_sql(SqlVal::BigInt(7)).is_err());
    }

    #[test]
    fn options_map_null() {
        assert_eq!(Option::<String>::from_sql(SqlVal::Null).unwrap(), None);
        assert_eq!(
            Option::<String>::from_sql(SqlVal::Text("a".into())).unwrap(),
            Some("a".to_string())
        );
        assert_eq!(None::<i64>.to_sql(), SqlVal::Null);
    }
}
