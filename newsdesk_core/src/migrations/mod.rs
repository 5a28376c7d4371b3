//! Embedded schema migrations.
//!
//! Migrations are plain SQL compiled into the binary, applied in order
//! and recorded by name in the `newsdesk_migrations` table.

use log::info;

use crate::db::{BackendConnection, Column, ConnectionMethods, Row};
use crate::query::{BoolExpr, Expr};
use crate::{DataObject, DataResult, Error, Query, Result, SqlType, SqlVal};

/// One schema change with backend-specific SQL to apply and undo it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Migration {
    name: &'static str,
    sql: Vec<BackendSql>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct BackendSql {
    backend: &'static str,
    up: &'static str,
    down: &'static str,
}

impl Migration {
    /// Create a migration with no SQL yet.
    pub fn new(name: &'static str) -> Self {
        Migration {
            name,
            sql: Vec::new(),
        }
    }

    /// Set the SQL to apply and undo this migration on `backend`.
    pub fn with_sql(mut self, backend: &'static str, up: &'static str, down: &'static str) -> Self {
        self.sql.retain(|s| s.backend != backend);
        self.sql.push(BackendSql { backend, up, down });
        self
    }

    /// The name of this migration.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The backend-specific commands to apply this migration.
    pub fn up_sql(&self, backend_name: &str) -> Option<&'static str> {
        self.sql
            .iter()
            .find(|s| s.backend == backend_name)
            .map(|s| s.up)
    }

    /// The backend-specific commands to undo this migration.
    pub fn down_sql(&self, backend_name: &str) -> Option<&'static str> {
        self.sql
            .iter()
            .find(|s| s.backend == backend_name)
            .map(|s| s.down)
    }

    /// The names of the backends this migration has sql for.
    pub fn sql_backends(&self) -> Vec<&'static str> {
        self.sql.iter().map(|s| s.backend).collect()
    }

    /// Apply the migration to a database connection. The database must
    /// be in the state of the migration prior to this one.
    pub fn apply(&self, conn: &mut impl BackendConnection) -> Result<()> {
        let backend_name = conn.backend_name();
        let sql = self
            .up_sql(backend_name)
            .ok_or_else(|| Error::UnknownBackend(backend_name.to_string()))?;
        let tx = conn.transaction()?;
        tx.execute(sql)?;
        self.mark_applied(&tx)?;
        tx.commit()
    }

    /// Mark the migration as being applied without doing any
    /// work. Use carefully -- the caller must ensure that the
    /// database schema already matches that expected by this
    /// migration.
    pub fn mark_applied(&self, conn: &impl ConnectionMethods) -> Result<()> {
        conn.insert_only(
            AppliedMigration::TABLE,
            AppliedMigration::COLUMNS,
            &[SqlVal::Text(self.name.to_string())],
        )
    }

    /// Un-apply (downgrade) the migration. This must be the latest
    /// migration applied to the database.
    pub fn downgrade(&self, conn: &mut impl BackendConnection) -> Result<()> {
        let backend_name = conn.backend_name();
        let sql = self
            .down_sql(backend_name)
            .ok_or_else(|| Error::UnknownBackend(backend_name.to_string()))?;
        let tx = conn.transaction()?;
        tx.execute(sql)?;
        tx.delete_where(
            AppliedMigration::TABLE,
            BoolExpr::Eq(
                AppliedMigration::PKCOL,
                Expr::Val(SqlVal::Text(self.name.to_string())),
            ),
        )?;
        tx.commit()
    }
}

/// An ordered collection of migrations, oldest first.
#[derive(Clone, Debug, Default)]
pub struct Migrations {
    migrations: Vec<Migration>,
}

impl Migrations {
    /// Wrap migrations given oldest first.
    pub fn new(migrations: Vec<Migration>) -> Self {
        Migrations { migrations }
    }

    /// Gets the migration with the given name, if it exists
    pub fn get_migration(&self, name: &str) -> Option<&Migration> {
        self.migrations.iter().find(|m| m.name == name)
    }

    /// Get the most recent migration.
    pub fn latest(&self) -> Option<&Migration> {
        self.migrations.last()
    }

    /// Returns all migrations
    pub fn all_migrations(&self) -> &[Migration] {
        &self.migrations
    }

    fn applied_names(&self, conn: &impl ConnectionMethods) -> Result<Vec<String>> {
        if !conn.has_table(AppliedMigration::TABLE)? {
            return Ok(Vec::new());
        }
        Ok(AppliedMigration::query()
            .load(conn)?
            .into_iter()
            .map(|m| m.name)
            .collect())
    }

    /// Get migrations which have not yet been applied to the database
    pub fn unapplied_migrations(&self, conn: &impl ConnectionMethods) -> Result<Vec<&Migration>> {
        let applied = self.applied_names(conn)?;
        Ok(self
            .migrations
            .iter()
            .filter(|m| !applied.iter().any(|name| name == m.name))
            .collect())
    }

    /// Get the last migration that has been applied to the database or None
    /// if no migrations have been applied
    pub fn last_applied_migration(
        &self,
        conn: &impl ConnectionMethods,
    ) -> Result<Option<&Migration>> {
        let applied = self.applied_names(conn)?;
        Ok(self
            .migrations
            .iter()
            .rev()
            .find(|m| applied.iter().any(|name| name == m.name)))
    }

    /// Applies every unapplied migration, returning their names.
    pub fn migrate(&self, conn: &mut impl BackendConnection) -> Result<Vec<&'static str>> {
        create_migrations_table(&*conn)?;
        let to_apply = self.unapplied_migrations(&*conn)?;
        let mut applied = Vec::with_capacity(to_apply.len());
        for m in to_apply {
            info!("Applying migration {}", m.name());
            m.apply(conn)?;
            applied.push(m.name());
        }
        Ok(applied)
    }

    /// Undo the most recently applied migration, returning its name.
    pub fn rollback_latest(
        &self,
        conn: &mut impl BackendConnection,
    ) -> Result<Option<&'static str>> {
        match self.last_applied_migration(&*conn)? {
            Some(m) => {
                info!("Rolling back migration {}", m.name());
                m.downgrade(conn)?;
                Ok(Some(m.name()))
            }
            None => Ok(None),
        }
    }

    /// Undo applied migrations newer than `name`, leaving `name` applied.
    pub fn rollback_to(
        &self,
        conn: &mut impl BackendConnection,
        name: &str,
    ) -> Result<Vec<&'static str>> {
        let target = self
            .migrations
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| Error::MigrationError(format!("No migration named {name}")))?;
        let mut rolled_back = Vec::new();
        while let Some(m) = self.last_applied_migration(&*conn)? {
            let idx = self
                .migrations
                .iter()
                .position(|candidate| candidate == m)
                .ok_or_else(|| Error::Internal("applied migration not found".to_string()))?;
            if idx <= target {
                break;
            }
            info!("Rolling back migration {}", m.name());
            m.downgrade(conn)?;
            rolled_back.push(m.name());
        }
        Ok(rolled_back)
    }

    /// Undo every applied migration.
    pub fn unmigrate(&self, conn: &mut impl BackendConnection) -> Result<Vec<&'static str>> {
        let mut rolled_back = Vec::new();
        while let Some(name) = self.rollback_latest(conn)? {
            rolled_back.push(name);
        }
        Ok(rolled_back)
    }
}

fn create_migrations_table(conn: &impl ConnectionMethods) -> Result<()> {
    conn.execute(&format!(
        "CREATE TABLE IF NOT EXISTS {} (name TEXT NOT NULL PRIMARY KEY);",
        AppliedMigration::TABLE
    ))
}

/// Row of the migration bookkeeping table.
#[derive(Clone, Debug, PartialEq, Eq)]
struct AppliedMigration {
    name: String,
}

const APPLIED_MIGRATION_COLUMNS: [Column; 1] = [Column::new("name", SqlType::Text)];

impl DataResult for AppliedMigration {
    type DBO = Self;
    const COLUMNS: &'static [Column] = &APPLIED_MIGRATION_COLUMNS;
    fn from_row(row: &Row) -> Result<Self> {
        Ok(AppliedMigration { name: row.get(0)? })
    }
    fn query() -> Query<Self> {
        Query::new(Self::TABLE)
    }
}

impl crate::internal::DataObjectInternal for AppliedMigration {
    const NON_PK_COLUMNS: &'static [Column] = &[];
    fn pk_mut(&mut self) -> &mut impl crate::PrimaryKeyType {
        &mut self.name
    }
    fn non_pk_values(&self) -> Vec<SqlVal> {
        Vec::new()
    }
}

impl DataObject for AppliedMigration {
    type PKType = String;
    type Fields = ();
    const PKCOL: &'static str = "name";
    const TABLE: &'static str = "newsdesk_migrations";
    const AUTO_PK: bool = false;
    fn pk(&self) -> &String {
        &self.name
    }
}
