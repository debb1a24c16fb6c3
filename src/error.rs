//! Error types for a report run

use thiserror::Error;
use tracing::error;

/// Where in the session lifecycle a driver error was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Prepare,
    Query,
    Close,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Connect => "connect",
            Stage::Prepare => "prepare",
            Stage::Query => "query",
            Stage::Close => "close",
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Database connection error: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Unexpected database error: {0}")]
    Unexpected(#[source] sqlx::Error),

    #[error("{0}")]
    NoData(&'static str),

    #[error("Database connection is already closed")]
    Closed,

    #[error("Failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

impl ReportError {
    /// Sort a driver error into the connection or unexpected class and log it.
    ///
    /// Transport-level failures are connection errors at any stage. A database
    /// error is only a connection error while opening the database; later it
    /// means the statement itself was rejected.
    pub fn classify(stage: Stage, err: sqlx::Error) -> Self {
        let connection = match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => true,
            sqlx::Error::Database(_) => stage == Stage::Connect,
            _ => false,
        };

        if connection {
            error!(stage = stage.as_str(), error = ?err, "DB connection error: {}", err);
            ReportError::Connection(err)
        } else {
            error!(stage = stage.as_str(), error = ?err, "Unexpected DB error: {}", err);
            ReportError::Unexpected(err)
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, ReportError::Connection(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_connection_errors_at_every_stage() {
        for stage in [Stage::Connect, Stage::Prepare, Stage::Query, Stage::Close] {
            let err = sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset by peer",
            ));
            assert!(ReportError::classify(stage, err).is_connection());
        }
    }

    #[test]
    fn row_errors_are_unexpected() {
        let err = ReportError::classify(Stage::Query, sqlx::Error::RowNotFound);
        assert!(matches!(err, ReportError::Unexpected(_)));
    }

    #[test]
    fn no_data_displays_its_message() {
        let err = ReportError::NoData("No article data to display!");
        assert_eq!(err.to_string(), "No article data to display!");
    }
}
