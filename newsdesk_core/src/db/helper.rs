// may occur if no backends are selected
#![allow(unused)]

use std::borrow::Cow;

use super::Column;
use crate::query::{BoolExpr, Expr, Order, OrderDirection};
use crate::SqlVal;

pub trait PlaceholderSource {
    fn next_placeholder(&mut self) -> Cow<'_, str>;
}

/// SQL function every backend provides for Unicode-aware lower-casing.
/// Used on both sides of an `ILike`.
pub const FOLD_CASE_FN: &str = "fold_case";

/// Quotes an identifier so that reserved words and mixed case survive.
pub fn quote_ident(word: &str) -> String {
    format!("\"{}\"", word.replace('"', "\"\""))
}

/// Writes to `w` the SQL to express the expression given in `expr`. Values contained in `expr` are rendered
/// as placeholders in the SQL string and the actual values are added to `values`.
pub fn sql_for_expr<P>(expr: Expr, values: &mut Vec<SqlVal>, pls: &mut P, w: &mut String)
where
    P: PlaceholderSource,
{
    match expr {
        Expr::Column(name) => w.push_str(&quote_ident(name)),
        Expr::Val(v) => match v {
            // No risk of SQL injection with integers
            SqlVal::Int(i) => w.push_str(&i.to_string()),
            SqlVal::BigInt(i) => w.push_str(&i.to_string()),
            _ => {
                values.push(v);
                w.push_str(&pls.next_placeholder());
            }
        },
        Expr::Placeholder => w.push_str(&pls.next_placeholder()),
        Expr::Condition(c) => sql_for_condition(*c, values, pls, w),
    }
}

fn sql_for_condition<P>(cond: BoolExpr, values: &mut Vec<SqlVal>, pls: &mut P, w: &mut String)
where
    P: PlaceholderSource,
{
    use BoolExpr::*;
    match cond {
        True => w.push_str("1 = 1"),
        Eq(col, Expr::Val(SqlVal::Null)) => {
            w.push_str(&quote_ident(col));
            w.push_str(" IS NULL");
        }
        Ne(col, Expr::Val(SqlVal::Null)) => {
            w.push_str(&quote_ident(col));
            w.push_str(" IS NOT NULL");
        }
        Eq(col, ex) => binary(col, " = ", ex, values, pls, w),
        Ne(col, ex) => binary(col, " <> ", ex, values, pls, w),
        Lt(col, ex) => binary(col, " < ", ex, values, pls, w),
        Gt(col, ex) => binary(col, " > ", ex, values, pls, w),
        Le(col, ex) => binary(col, " <= ", ex, values, pls, w),
        Ge(col, ex) => binary(col, " >= ", ex, values, pls, w),
        Like(col, ex) => {
            binary(col, " LIKE ", ex, values, pls, w);
            w.push_str(" ESCAPE '\\'");
        }
        ILike(col, ex) => {
            w.push_str(FOLD_CASE_FN);
            w.push('(');
            w.push_str(&quote_ident(col));
            w.push_str(") LIKE ");
            w.push_str(FOLD_CASE_FN);
            w.push('(');
            sql_for_expr(ex, values, pls, w);
            w.push_str(") ESCAPE '\\'");
        }
        AllOf(conds) => joined(conds, " AND ", "1 = 1", values, pls, w),
        AnyOf(conds) => joined(conds, " OR ", "1 = 0", values, pls, w),
        And(a, b) => joined(vec![*a, *b], " AND ", "1 = 1", values, pls, w),
        Or(a, b) => joined(vec![*a, *b], " OR ", "1 = 0", values, pls, w),
        Not(a) => {
            w.push_str("NOT (");
            sql_for_condition(*a, values, pls, w);
            w.push(')');
        }
        In(_, vals) if vals.is_empty() => w.push_str("1 = 0"),
        In(col, vals) => {
            w.push_str(&quote_ident(col));
            w.push_str(" IN (");
            let mut sep = "";
            for val in vals {
                w.push_str(sep);
                sql_for_expr(Expr::Val(val), values, pls, w);
                sep = ", ";
            }
            w.push(')');
        }
    }
}

fn binary<P>(
    col: &'static str,
    op: &str,
    ex: Expr,
    values: &mut Vec<SqlVal>,
    pls: &mut P,
    w: &mut String,
) where
    P: PlaceholderSource,
{
    w.push_str(&quote_ident(col));
    w.push_str(op);
    sql_for_expr(ex, values, pls, w);
}

fn joined<P>(
    conds: Vec<BoolExpr>,
    sep: &str,
    empty: &str,
    values: &mut Vec<SqlVal>,
    pls: &mut P,
    w: &mut String,
) where
    P: PlaceholderSource,
{
    if conds.is_empty() {
        w.push_str(empty);
        return;
    }
    w.push('(');
    let mut first = true;
    for cond in conds {
        if !first {
            w.push_str(sep);
        }
        first = false;
        sql_for_condition(cond, values, pls, w);
    }
    w.push(')');
}

pub fn sql_select(columns: &[Column], table: &str, w: &mut String) {
    w.push_str("SELECT ");
    list_columns(columns, w);
    w.push_str(" FROM ");
    w.push_str(&quote_ident(table));
}

pub fn sql_count(table: &str, w: &mut String) {
    w.push_str("SELECT COUNT(*) FROM ");
    w.push_str(&quote_ident(table));
}

pub fn sql_insert_with_placeholders(
    table: &str,
    columns: &[Column],
    pls: &mut impl PlaceholderSource,
    w: &mut String,
) {
    w.push_str("INSERT INTO ");
    w.push_str(&quote_ident(table));
    if columns.is_empty() {
        w.push_str(" DEFAULT VALUES");
        return;
    }
    w.push_str(" (");
    list_columns(columns, w);
    w.push_str(") VALUES (");
    let mut sep = "";
    for _ in columns {
        w.push_str(sep);
        w.push_str(&pls.next_placeholder());
        sep = ", ";
    }
    w.push(')');
}

/// Writes to `w` the `SET` list for `columns` using values in `pls`.
pub fn sql_set_with_placeholders(
    columns: &[Column],
    pls: &mut impl PlaceholderSource,
    w: &mut String,
) {
    w.push_str(" SET ");
    let mut sep = "";
    for c in columns {
        w.push_str(sep);
        w.push_str(&quote_ident(c.name()));
        w.push_str(" = ");
        w.push_str(&pls.next_placeholder());
        sep = ", ";
    }
}

/// Writes to `w` the SQL of an UPDATE to `table` of `columns` using values in `pls`,
/// for the row uniquely identified by `pkcol`.
pub fn sql_update_with_placeholders(
    table: &str,
    pkcol: &Column,
    columns: &[Column],
    pls: &mut impl PlaceholderSource,
    w: &mut String,
) {
    w.push_str("UPDATE ");
    w.push_str(&quote_ident(table));
    sql_set_with_placeholders(columns, pls, w);
    w.push_str(" WHERE ");
    w.push_str(&quote_ident(pkcol.name()));
    w.push_str(" = ");
    w.push_str(&pls.next_placeholder());
}

pub fn sql_limit(limit: i32, w: &mut String) {
    w.push_str(&format!(" LIMIT {limit}"));
}

pub fn sql_offset(offset: i32, w: &mut String) {
    w.push_str(&format!(" OFFSET {offset}"));
}

/// Writes to `w` the SQL of the list of column `order`.
pub fn sql_order(order: &[Order], w: &mut String) {
    w.push_str(" ORDER BY ");
    let mut sep = "";
    for o in order {
        let sql_dir = match o.direction {
            OrderDirection::Ascending => "ASC",
            OrderDirection::Descending => "DESC",
        };
        w.push_str(sep);
        w.push_str(&quote_ident(o.column));
        w.push(' ');
        w.push_str(sql_dir);
        sep = ", ";
    }
}

/// Writes to `w` the SQL of the list of `columns`.
pub fn list_columns(columns: &[Column], w: &mut String) {
    let names: Vec<String> = columns.iter().map(|c| quote_ident(c.name())).collect();
    w.push_str(&names.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqlType;

    struct Question;
    impl PlaceholderSource for Question {
        fn next_placeholder(&mut self) -> Cow<'_, str> {
            Cow::Borrowed("?")
        }
    }

    fn render(cond: BoolExpr) -> (String, Vec<SqlVal>) {
        let mut sql = String::new();
        let mut values = Vec::new();
        sql_for_expr(
            Expr::Condition(Box::new(cond)),
            &mut values,
            &mut Question,
            &mut sql,
        );
        (sql, values)
    }

    #[test]
    fn null_comparisons_use_is() {
        let (sql, values) = render(BoolExpr::Eq("deleted_at", Expr::Val(SqlVal::Null)));
        assert_eq!(sql, "\"deleted_at\" IS NULL");
        assert!(values.is_empty());
        let (sql, _) = render(BoolExpr::Ne("deleted_at", Expr::Val(SqlVal::Null)));
        assert_eq!(sql, "\"deleted_at\" IS NOT NULL");
    }

    #[test]
    fn ilike_folds_both_sides() {
        let (sql, values) = render(BoolExpr::ILike(
            "title",
            Expr::Val(SqlVal::Text("%Lake%".into())),
        ));
        assert_eq!(sql, "fold_case(\"title\") LIKE fold_case(?) ESCAPE '\\'");
        assert_eq!(values, vec![SqlVal::Text("%Lake%".into())]);
    }

    #[test]
    fn conjunctions_are_parenthesized() {
        let (sql, values) = render(BoolExpr::AllOf(vec![
            BoolExpr::Eq("is_published", Expr::Val(SqlVal::Bool(true))),
            BoolExpr::Or(
                Box::new(BoolExpr::Eq("a", Expr::Val(SqlVal::Int(1)))),
                Box::new(BoolExpr::Eq("b", Expr::Val(SqlVal::Int(2)))),
            ),
        ]));
        assert_eq!(sql, "(\"is_published\" = ? AND (\"a\" = 1 OR \"b\" = 2))");
        assert_eq!(values, vec![SqlVal::Bool(true)]);
    }

    #[test]
    fn empty_in_matches_nothing() {
        let (sql, _) = render(BoolExpr::In("id", vec![]));
        assert_eq!(sql, "1 = 0");
    }

    #[test]
    fn insert_without_columns_uses_defaults() {
        let mut sql = String::new();
        sql_insert_with_placeholders("posts", &[], &mut Question, &mut sql);
        assert_eq!(sql, "INSERT INTO \"posts\" DEFAULT VALUES");
        let mut sql = String::new();
        sql_insert_with_placeholders(
            "posts",
            &[Column::new("title", SqlType::Text)],
            &mut Question,
            &mut sql,
        );
        assert_eq!(sql, "INSERT INTO \"posts\" (\"title\") VALUES (?)");
    }
}
