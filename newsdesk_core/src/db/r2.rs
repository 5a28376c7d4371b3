//! R2D2 support for newsdesk connections.

pub use r2d2::ManageConnection;

use std::ops::Deref;

use crate::db::{BackendConnection, Connection, ConnectionMethods, ConnectionSpec};
use crate::Result;

/// R2D2 support for newsdesk. Implements [`r2d2::ManageConnection`].
#[derive(Clone, Debug)]
pub struct ConnectionManager {
    spec: ConnectionSpec,
}
impl ConnectionManager {
    /// Create a manager opening connections described by `spec`.
    pub fn new(spec: ConnectionSpec) -> Self {
        ConnectionManager { spec }
    }
}

impl ManageConnection for ConnectionManager {
    type Connection = Connection;
    type Error = crate::Error;

    fn connect(&self) -> Result<Self::Connection> {
        crate::db::connect(&self.spec)
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<()> {
        conn.execute("SELECT 1")
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        conn.is_closed()
    }
}

crate::connection_method_wrapper!(r2d2::PooledConnection<ConnectionManager>, conn => conn.deref());
