#![allow(dead_code)]

use chrono::NaiveDateTime;
use newsdesk_core::db::{connect, Column, Connection, ConnectionSpec, Row};
use newsdesk_core::internal::DataObjectInternal;
use newsdesk_core::migrations::{Migration, Migrations};
use newsdesk_core::query::FieldExpr;
use newsdesk_core::{AutoPk, DataObject, DataResult, PrimaryKeyType, Query, Result, SqlType, SqlVal, ToSql};

pub fn note_migrations() -> Migrations {
    Migrations::new(vec![
        Migration::new("20240101_notes").with_sql(
            "sqlite",
            "CREATE TABLE notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE,
                stars INTEGER NOT NULL DEFAULT 0,
                archived_at TEXT
            );",
            "DROP TABLE notes;",
        ),
        Migration::new("20240201_tags").with_sql(
            "sqlite",
            "CREATE TABLE tags (name TEXT NOT NULL PRIMARY KEY, uses INTEGER NOT NULL);",
            "DROP TABLE tags;",
        ),
    ])
}

pub fn memory_connection() -> Connection {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut conn = connect(&ConnectionSpec::new("sqlite", ":memory:")).unwrap();
    note_migrations().migrate(&mut conn).unwrap();
    conn
}

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: AutoPk<i64>,
    pub title: String,
    pub stars: i64,
    pub archived_at: Option<NaiveDateTime>,
}

impl Note {
    pub fn new(title: &str) -> Self {
        Note {
            id: AutoPk::uninitialized(),
            title: title.to_string(),
            stars: 0,
            archived_at: None,
        }
    }
}

#[derive(Default)]
pub struct NoteFields;
impl NoteFields {
    pub fn id(&self) -> FieldExpr<i64> {
        FieldExpr::new("id")
    }
    pub fn title(&self) -> FieldExpr<String> {
        FieldExpr::new("title")
    }
    pub fn stars(&self) -> FieldExpr<i64> {
        FieldExpr::new("stars")
    }
    pub fn archived_at(&self) -> FieldExpr<Option<NaiveDateTime>> {
        FieldExpr::new("archived_at")
    }
}

const NOTE_COLUMNS: [Column; 4] = [
    Column::new("id", SqlType::BigInt),
    Column::new("title", SqlType::Text),
    Column::new("stars", SqlType::BigInt),
    Column::new("archived_at", SqlType::Timestamp),
];

impl DataResult for Note {
    type DBO = Self;
    const COLUMNS: &'static [Column] = &NOTE_COLUMNS;
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Note {
            id: row.get(0)?,
            title: row.get(1)?,
            stars: row.get(2)?,
            archived_at: row.get(3)?,
        })
    }
    fn query() -> Query<Self> {
        Query::new(Self::TABLE)
    }
}

impl DataObjectInternal for Note {
    const NON_PK_COLUMNS: &'static [Column] = &[NOTE_COLUMNS[1], NOTE_COLUMNS[2], NOTE_COLUMNS[3]];
    fn pk_mut(&mut self) -> &mut impl PrimaryKeyType {
        &mut self.id
    }
    fn non_pk_values(&self) -> Vec<SqlVal> {
        vec![
            self.title.to_sql(),
            self.stars.to_sql(),
            self.archived_at.to_sql(),
        ]
    }
}

impl DataObject for Note {
    type PKType = AutoPk<i64>;
    type Fields = NoteFields;
    const PKCOL: &'static str = "id";
    const TABLE: &'static str = "notes";
    const AUTO_PK: bool = true;
    fn pk(&self) -> &AutoPk<i64> {
        &self.id
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tag {
    pub name: String,
    pub uses: i64,
}

const TAG_COLUMNS: [Column; 2] = [
    Column::new("name", SqlType::Text),
    Column::new("uses", SqlType::BigInt),
];

impl DataResult for Tag {
    type DBO = Self;
    const COLUMNS: &'static [Column] = &TAG_COLUMNS;
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Tag {
            name: row.get(0)?,
            uses: row.get(1)?,
        })
    }
    fn query() -> Query<Self> {
        Query::new(Self::TABLE)
    }
}

impl DataObjectInternal for Tag {
    const NON_PK_COLUMNS: &'static [Column] = &[TAG_COLUMNS[1]];
    fn pk_mut(&mut self) -> &mut impl PrimaryKeyType {
        &mut self.name
    }
    fn non_pk_values(&self) -> Vec<SqlVal> {
        vec![self.uses.to_sql()]
    }
}

impl DataObject for Tag {
    type PKType = String;
    type Fields = ();
    const PKCOL: &'static str = "name";
    const TABLE: &'static str = "tags";
    const AUTO_PK: bool = false;
    fn pk(&self) -> &String {
        &self.name
    }
}
