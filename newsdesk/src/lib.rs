//! Newsdesk is the publishing back end of a regional news outlet.
//!
//! The public side reads published articles (home page, category
//! listings, article pages, search) and records reader engagement
//! (comments, likes, newsletter subscriptions). The editorial side
//! creates and edits posts, moves them through the trash and toggles
//! site-wide settings.
//!
//! All operations take a database handle implementing
//! [`ConnectionMethods`][db::ConnectionMethods]; the few that need a
//! transaction take a [`BackendConnection`][db::BackendConnection].
//! ```no_run
//! use newsdesk::db::{connect, ConnectionSpec};
//! use newsdesk::{editorial, frontpage, migrations};
//!
//! # fn main() -> newsdesk::Result<()> {
//! let mut conn = connect(&ConnectionSpec::new("sqlite", "newsdesk.db"))?;
//! migrations::get_migrations().migrate(&mut conn)?;
//! let draft = editorial::PostDraft::new("Lake levels rise", "Politics", "Short", "Long");
//! editorial::create_post(&conn, None, &draft.published())?;
//! let home = frontpage::home_page(&conn)?;
//! assert!(home.breaking.is_some());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod editor;
pub mod editorial;
pub mod engagement;
pub mod frontpage;
pub mod migrations;
pub mod models;
pub mod settings;
pub mod slug;
pub mod storage;
pub mod subscribers;

mod error;
mod validate;

pub use error::{Error, Result};
pub use newsdesk_core::{db, query, AutoPk, DataObject, DataObjectOps, DataResult};

/// Pool of database connections shared by request handlers.
pub type ConnectionPool = r2d2::Pool<db::ConnectionManager>;
/// A connection checked out of a [`ConnectionPool`].
pub type PooledConnection = r2d2::PooledConnection<db::ConnectionManager>;

/// Build a connection pool for `spec` holding at most `max_size` connections.
pub fn connection_pool(spec: &db::ConnectionSpec, max_size: u32) -> Result<ConnectionPool> {
    let pool = r2d2::Pool::builder()
        .max_size(max_size)
        .build(db::ConnectionManager::new(spec.clone()))
        .map_err(newsdesk_core::Error::from)?;
    Ok(pool)
}

/// Check a connection out of `pool`, waiting up to the pool's timeout.
pub fn checkout(pool: &ConnectionPool) -> Result<PooledConnection> {
    Ok(pool.get().map_err(newsdesk_core::Error::from)?)
}

/// Current time in UTC, as stored in timestamp columns.
pub(crate) fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}
