//! Seams between the repositories and diesel.

use anyhow::Result;
use diesel::SqliteConnection;

/// Runs a closure against a pooled SQLite connection.
///
/// Repositories are generic over the executor so tests can hand them a pool
/// pointing at a scratch database.
pub trait DbExecutor: Send + Sync {
    fn run<T>(&self, f: impl FnOnce(&mut SqliteConnection) -> Result<T>) -> Result<T>;
}

/// Domain value -> insertable row.
pub trait InsertMapper<D, R>: Sync + Send {
    fn to_row(&self, domain: &D) -> Result<R>;
}

/// Queried row -> domain value. Fails on values the domain cannot represent.
pub trait RowMapper<R, D>: Sync + Send {
    fn to_domain(&self, row: &R) -> Result<D>;
}
