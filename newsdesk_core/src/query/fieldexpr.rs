//! Typed column handles. Not expected to be used directly.

use std::marker::PhantomData;

use super::contains_pattern;
use crate::query::{BoolExpr, Expr};
use crate::sqlval::{FieldType, SqlVal, ToSql};

macro_rules! binary_op {
    ($func_name:ident, $bound:path, $cond:ident) => {
        pub fn $func_name<U>(&self, val: U) -> BoolExpr
        where
            T: $bound,
            U: ToSql,
        {
            BoolExpr::$cond(self.name, Expr::Val(val.to_sql()))
        }
    };
}

/// Marker trait to determine whether values can be compared.
/// Unlike `PartialOrd`, handles `Option`, which we need for nullable types.
pub trait DataOrd<Rhs: ?Sized> {}
impl<T> DataOrd<T> for Option<T> where T: PartialOrd<T> + FieldType {}
impl<T> DataOrd<T> for T where T: PartialOrd<T> + FieldType {}

/// A column of a model whose values have type `T`.
#[derive(Clone, Debug)]
pub struct FieldExpr<T>
where
    T: Into<SqlVal>,
{
    name: &'static str,
    phantom: PhantomData<T>,
}

impl<T> FieldExpr<T>
where
    T: Into<SqlVal>,
{
    pub fn new(name: &'static str) -> Self {
        FieldExpr {
            name,
            phantom: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    binary_op!(eq, std::cmp::PartialEq<U>, Eq);
    binary_op!(ne, std::cmp::PartialEq<U>, Ne);
    binary_op!(lt, DataOrd<U>, Lt);
    binary_op!(gt, DataOrd<U>, Gt);
    binary_op!(le, DataOrd<U>, Le);
    binary_op!(ge, DataOrd<U>, Ge);

    pub fn like<U>(&self, val: U) -> BoolExpr
    where
        U: ToSql,
    {
        BoolExpr::Like(self.name, Expr::Val(val.to_sql()))
    }

    /// Case-insensitive match against a `LIKE` pattern.
    pub fn ilike<U>(&self, val: U) -> BoolExpr
    where
        U: ToSql,
    {
        BoolExpr::ILike(self.name, Expr::Val(val.to_sql()))
    }

    /// Case-insensitive substring match. Wildcards in `needle` match literally.
    pub fn icontains(&self, needle: &str) -> BoolExpr {
        BoolExpr::ILike(self.name, Expr::Val(SqlVal::Text(contains_pattern(needle))))
    }

    pub fn in_values<U>(&self, vals: impl IntoIterator<Item = U>) -> BoolExpr
    where
        U: ToSql,
    {
        BoolExpr::In(self.name, vals.into_iter().map(|v| v.to_sql()).collect())
    }
}

impl<T> FieldExpr<Option<T>>
where
    Option<T>: Into<SqlVal>,
{
    pub fn is_null(&self) -> BoolExpr {
        BoolExpr::Eq(self.name, Expr::Val(SqlVal::Null))
    }

    pub fn is_not_null(&self) -> BoolExpr {
        BoolExpr::Ne(self.name, Expr::Val(SqlVal::Null))
    }
}
