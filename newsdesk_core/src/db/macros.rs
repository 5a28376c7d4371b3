/// Implements [`ConnectionMethods`][crate::db::ConnectionMethods] for a
/// type by delegating every method to another implementation. By
/// default the target is `self.wrapped_connection_methods()?`; a
/// different expression may be given as `this => expr`.
#[macro_export]
macro_rules! connection_method_wrapper {
    ($ty:ty) => {
        $crate::connection_method_wrapper!($ty, this => this.wrapped_connection_methods()?);
    };
    ($ty:ty, $this:ident => $inner:expr) => {
        impl $crate::db::ConnectionMethods for $ty {
            fn execute(&self, sql: &str) -> $crate::Result<()> {
                let $this = self;
                $crate::db::ConnectionMethods::execute($inner, sql)
            }
            fn query(
                &self,
                table: &str,
                columns: &[$crate::db::Column],
                expr: Option<$crate::query::BoolExpr>,
                limit: Option<i32>,
                offset: Option<i32>,
                sort: Option<&[$crate::query::Order]>,
            ) -> $crate::Result<Vec<$crate::db::Row>> {
                let $this = self;
                $crate::db::ConnectionMethods::query(
                    $inner, table, columns, expr, limit, offset, sort,
                )
            }
            fn count(
                &self,
                table: &str,
                expr: Option<$crate::query::BoolExpr>,
            ) -> $crate::Result<i64> {
                let $this = self;
                $crate::db::ConnectionMethods::count($inner, table, expr)
            }
            fn insert_returning_pk(
                &self,
                table: &str,
                columns: &[$crate::db::Column],
                pkcol: &$crate::db::Column,
                values: &[$crate::SqlVal],
            ) -> $crate::Result<$crate::SqlVal> {
                let $this = self;
                $crate::db::ConnectionMethods::insert_returning_pk(
                    $inner, table, columns, pkcol, values,
                )
            }
            fn insert_only(
                &self,
                table: &str,
                columns: &[$crate::db::Column],
                values: &[$crate::SqlVal],
            ) -> $crate::Result<()> {
                let $this = self;
                $crate::db::ConnectionMethods::insert_only($inner, table, columns, values)
            }
            fn insert_or_replace(
                &self,
                table: &str,
                columns: &[$crate::db::Column],
                pkcol: &$crate::db::Column,
                values: &[$crate::SqlVal],
            ) -> $crate::Result<()> {
                let $this = self;
                $crate::db::ConnectionMethods::insert_or_replace(
                    $inner, table, columns, pkcol, values,
                )
            }
            fn update(
                &self,
                table: &str,
                pkcol: $crate::db::Column,
                pk: $crate::SqlVal,
                columns: &[$crate::db::Column],
                values: &[$crate::SqlVal],
            ) -> $crate::Result<()> {
                let $this = self;
                $crate::db::ConnectionMethods::update($inner, table, pkcol, pk, columns, values)
            }
            fn update_where(
                &self,
                table: &str,
                columns: &[$crate::db::Column],
                values: &[$crate::SqlVal],
                expr: $crate::query::BoolExpr,
            ) -> $crate::Result<usize> {
                let $this = self;
                $crate::db::ConnectionMethods::update_where($inner, table, columns, values, expr)
            }
            fn increment_where(
                &self,
                table: &str,
                column: &'static str,
                by: i64,
                expr: $crate::query::BoolExpr,
            ) -> $crate::Result<usize> {
                let $this = self;
                $crate::db::ConnectionMethods::increment_where($inner, table, column, by, expr)
            }
            fn delete_where(
                &self,
                table: &str,
                expr: $crate::query::BoolExpr,
            ) -> $crate::Result<usize> {
                let $this = self;
                $crate::db::ConnectionMethods::delete_where($inner, table, expr)
            }
            fn has_table(&self, table: &str) -> $crate::Result<bool> {
                let $this = self;
                $crate::db::ConnectionMethods::has_table($inner, table)
            }
        }
    };
}
