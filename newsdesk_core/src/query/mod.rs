//! Types to support database queries. Models expose typed
//! [`FieldExpr`] handles through their `Fields` struct; this module
//! holds the untyped expressions those handles build.

#![allow(missing_docs)]

use std::marker::PhantomData;

use crate::db::ConnectionMethods;
use crate::{DataResult, Result, SqlVal};

mod fieldexpr;

pub use fieldexpr::{DataOrd, FieldExpr};

/// Abstract representation of a database expression.
#[derive(Clone, Debug)]
pub enum Expr {
    /// A column, referenced by name.
    Column(&'static str),
    /// A value.
    Val(SqlVal),
    /// A placeholder for a value.
    Placeholder,
    /// A boolean condition.
    Condition(Box<BoolExpr>),
}

/// Abstract representation of a boolean expression.
#[derive(Clone, Debug)]
pub enum BoolExpr {
    True,
    Eq(&'static str, Expr),
    Ne(&'static str, Expr),
    Lt(&'static str, Expr),
    Gt(&'static str, Expr),
    Le(&'static str, Expr),
    Ge(&'static str, Expr),
    /// SQL `LIKE` with `\` as the escape character.
    Like(&'static str, Expr),
    /// Case-insensitive [`BoolExpr::Like`].
    ILike(&'static str, Expr),
    /// True if every expression is true. Empty is true.
    AllOf(Vec<BoolExpr>),
    /// True if any expression is true. Empty is false.
    AnyOf(Vec<BoolExpr>),
    And(Box<BoolExpr>, Box<BoolExpr>),
    Or(Box<BoolExpr>, Box<BoolExpr>),
    Not(Box<BoolExpr>),
    In(&'static str, Vec<SqlVal>),
}

impl BoolExpr {
    /// Combine with another expression using `AND`.
    pub fn and(self, other: BoolExpr) -> BoolExpr {
        match self {
            BoolExpr::True => other,
            BoolExpr::AllOf(mut all) => {
                all.push(other);
                BoolExpr::AllOf(all)
            }
            _ => BoolExpr::And(Box::new(self), Box::new(other)),
        }
    }

    /// Combine with another expression using `OR`.
    pub fn or(self, other: BoolExpr) -> BoolExpr {
        BoolExpr::Or(Box::new(self), Box::new(other))
    }

    /// Negate this expression.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> BoolExpr {
        BoolExpr::Not(Box::new(self))
    }
}

/// Escape the `LIKE` wildcards in user input so that it matches literally.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Pattern matching `input` anywhere in a column.
pub fn contains_pattern(input: &str) -> String {
    format!("%{}%", escape_like(input))
}

/// Represents the direction of a sort.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderDirection {
    Ascending,
    Descending,
}

/// Represents a sorting term (ORDER BY in SQL).
#[derive(Clone, Debug)]
pub struct Order {
    pub direction: OrderDirection,
    pub column: &'static str,
}

/// Representation of a database query.
#[derive(Clone, Debug)]
pub struct Query<T: DataResult> {
    table: &'static str,
    filter: Option<BoolExpr>,
    limit: Option<i32>,
    offset: Option<i32>,
    sort: Vec<Order>,
    phantom: PhantomData<T>,
}
impl<T: DataResult> Query<T> {
    /// Creates a query which matches all objects in `table`. The set
    /// of matched objects can be restricted with `filter` and
    /// `limit`.
    pub fn new(table: &'static str) -> Query<T> {
        Query {
            table,
            filter: None,
            limit: None,
            offset: None,
            sort: Vec::new(),
            phantom: PhantomData,
        }
    }

    /// Restricts the query to matching only objects for which `expr`
    /// is true. Replaces any earlier filter.
    pub fn filter(mut self, expr: BoolExpr) -> Query<T> {
        self.filter = Some(expr);
        self
    }

    /// Adds `expr` to the existing filter with `AND`.
    pub fn and(mut self, expr: BoolExpr) -> Query<T> {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    /// Limits the query to matching the first `lim` objects.
    pub fn limit(mut self, lim: i32) -> Query<T> {
        self.limit = Some(lim);
        self
    }

    /// Skips the first `off` objects before returning them.
    pub fn offset(mut self, off: i32) -> Query<T> {
        self.offset = Some(off);
        self
    }

    /// Order the query results by the given column. Multiple calls to
    /// this method may be made, with earlier calls taking precedence.
    pub fn order(mut self, column: &'static str, direction: OrderDirection) -> Query<T> {
        self.sort.push(Order { direction, column });
        self
    }

    /// Shorthand for `order(column, OrderDirection::Ascending)`
    pub fn order_asc(self, column: &'static str) -> Query<T> {
        self.order(column, OrderDirection::Ascending)
    }

    /// Shorthand for `order(column, OrderDirection::Descending)`
    pub fn order_desc(self, column: &'static str) -> Query<T> {
        self.order(column, OrderDirection::Descending)
    }

    fn sort(&self) -> Option<&[Order]> {
        if self.sort.is_empty() {
            None
        } else {
            Some(self.sort.as_slice())
        }
    }

    /// Executes the query against `conn` and returns the first result (if any).
    pub fn load_first(self, conn: &impl ConnectionMethods) -> Result<Option<T>> {
        let rows = conn.query(
            self.table,
            T::COLUMNS,
            self.filter.clone(),
            Some(1),
            self.offset,
            self.sort(),
        )?;
        rows.first().map(T::from_row).transpose()
    }

    /// Executes the query against `conn`.
    pub fn load(self, conn: &impl ConnectionMethods) -> Result<Vec<T>> {
        let rows = conn.query(
            self.table,
            T::COLUMNS,
            self.filter.clone(),
            self.limit,
            self.offset,
            self.sort(),
        )?;
        rows.iter().map(T::from_row).collect()
    }

    /// Counts the matching objects, ignoring limit, offset and ordering.
    pub fn count(self, conn: &impl ConnectionMethods) -> Result<i64> {
        conn.count(self.table, self.filter)
    }

    /// Executes the query against `conn` and deletes all matching objects.
    pub fn delete(self, conn: &impl ConnectionMethods) -> Result<usize> {
        conn.delete_where(self.table, self.filter.unwrap_or(BoolExpr::True))
    }
}
