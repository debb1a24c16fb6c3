//! Database session: one connection, opened once, closed exactly once

#[cfg(test)]
pub(crate) mod fixtures;
pub mod schema;

use futures::future::BoxFuture;
use futures::FutureExt;
use sqlx::{Connection, SqliteConnection};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

use crate::config::DatabaseConfig;
use crate::error::{ReportError, Stage};

/// A live connection prepared for read-only queries.
///
/// The connection is handed out through [`Session::connection`] until
/// [`Session::release`] closes it; after that every access fails with
/// [`ReportError::Closed`].
pub struct Session {
    name: String,
    conn: Option<SqliteConnection>,
}

impl Session {
    /// Open the configured database and prepare the cursor.
    pub async fn acquire(config: &DatabaseConfig) -> Result<Self, ReportError> {
        // Never create the file: a missing database is a connection error
        let mode = if config.read_only { "ro" } else { "rw" };
        let url = format!("sqlite:{}?mode={}", config.name, mode);

        debug!("Opening database {}", url);
        let conn = SqliteConnection::connect(&url)
            .await
            .map_err(|e| ReportError::classify(Stage::Connect, e))?;

        Self::attach(config.name.clone(), conn).await
    }

    /// Prepare an already open connection as the session cursor.
    pub async fn attach(name: impl Into<String>, mut conn: SqliteConnection) -> Result<Self, ReportError> {
        let name = name.into();

        if let Err(e) = sqlx::query(schema::QUERY_ONLY).execute(&mut conn).await {
            let err = ReportError::classify(Stage::Prepare, e);
            if let Err(close_err) = conn.close().await {
                warn!("Failed to close half-open connection to {}: {}", name, close_err);
            }
            return Err(err);
        }

        info!("Connected to database {}", name);
        Ok(Self {
            name,
            conn: Some(conn),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// The cursor for running queries, as long as the session is open.
    pub fn connection(&mut self) -> Result<&mut SqliteConnection, ReportError> {
        self.conn.as_mut().ok_or(ReportError::Closed)
    }

    /// Close the connection. A second call fails with [`ReportError::Closed`].
    pub async fn release(&mut self) -> Result<(), ReportError> {
        let Some(conn) = self.conn.take() else {
            error!("Release called on closed session {}", self.name);
            return Err(ReportError::Closed);
        };

        conn.close()
            .await
            .map_err(|e| ReportError::classify(Stage::Close, e))?;

        info!("Closed database {}", self.name);
        Ok(())
    }

    /// Run `body` against this session and release it afterwards, whether
    /// the body returns normally, fails, or panics.
    ///
    /// A failed release after a failed body is logged and the body's error
    /// wins.
    pub async fn within<T, F>(&mut self, body: F) -> Result<T, ReportError>
    where
        F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, Result<T, ReportError>>,
    {
        let outcome = AssertUnwindSafe(body(&mut *self)).catch_unwind().await;
        let released = self.release().await;

        match outcome {
            Ok(Ok(value)) => released.map(|_| value),
            Ok(Err(err)) => {
                if let Err(close_err) = released {
                    error!("Release failed after '{}': {}", err, close_err);
                }
                Err(err)
            }
            Err(payload) => {
                if let Err(close_err) = released {
                    error!("Release failed after panic: {}", close_err);
                }
                panic::resume_unwind(payload)
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.is_open() {
            warn!("Session {} dropped without release", self.name);
        }
    }
}

/// Acquire a session for `config`, run `body`, and release it on every exit path.
pub async fn scoped<T, F>(config: &DatabaseConfig, body: F) -> Result<T, ReportError>
where
    F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, Result<T, ReportError>>,
{
    let mut session = Session::acquire(config).await?;
    session.within(body).await
}
