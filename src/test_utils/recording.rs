use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::CatalogDbError;
use crate::executor::{ConnectionSource, DedicatedConnection, SqlExecutor};
use crate::results::ResultSet;
use crate::types::RowValues;

/// Where a statement was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The shared pool, one checkout per statement.
    Pool,
    /// A dedicated connection, numbered from 1 in checkout order.
    Connection(usize),
}

/// One statement as the driver received it.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub target: Target,
    pub sql: String,
    pub params: Vec<RowValues>,
}

/// Canned reply for statements whose text contains a pattern.
#[derive(Debug, Clone)]
pub enum Scripted {
    Rows(ResultSet),
    Affected(u64),
    Error(String),
}

#[derive(Default)]
struct Recorder {
    executed: Vec<Executed>,
    script: Vec<(String, Scripted)>,
    checkouts: usize,
    releases: usize,
    discards: usize,
}

/// A fake connection pool that records every statement and checkout.
///
/// Replies come from the first pattern registered with [`RecordingPool::on`] that the
/// statement text contains; unmatched statements return no rows and zero changes.
///
/// ```rust
/// use catalog_db::prelude::*;
/// use catalog_db::test_utils::{RecordingPool, Scripted};
///
/// let pool = RecordingPool::new();
/// pool.on(
///     "RETURNING id",
///     Scripted::Rows(ResultSet::from_rows(vec!["id".into()], vec![vec![RowValues::Int(7)]])),
/// );
/// let db = Database::with_source(pool.clone());
/// # let _ = db;
/// ```
#[derive(Clone, Default)]
pub struct RecordingPool {
    inner: Arc<Mutex<Recorder>>,
}

impl RecordingPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorder> {
        lock(&self.inner)
    }

    /// Reply with `response` to statements containing `pattern`.
    pub fn on(&self, pattern: impl Into<String>, response: Scripted) -> &Self {
        self.lock().script.push((pattern.into(), response));
        self
    }

    #[must_use]
    pub fn executed(&self) -> Vec<Executed> {
        self.lock().executed.clone()
    }

    /// Statement texts in execution order.
    #[must_use]
    pub fn statements(&self) -> Vec<String> {
        self.lock().executed.iter().map(|e| e.sql.clone()).collect()
    }

    /// Statements whose text contains `pattern`.
    #[must_use]
    pub fn count_matching(&self, pattern: &str) -> usize {
        self.lock()
            .executed
            .iter()
            .filter(|e| e.sql.contains(pattern))
            .count()
    }

    /// Dedicated connections handed out.
    #[must_use]
    pub fn checkouts(&self) -> usize {
        self.lock().checkouts
    }

    /// Dedicated connections given back, discarded ones included.
    #[must_use]
    pub fn releases(&self) -> usize {
        self.lock().releases
    }

    /// Dedicated connections thrown away instead of reused.
    #[must_use]
    pub fn discards(&self) -> usize {
        self.lock().discards
    }
}

fn lock(inner: &Mutex<Recorder>) -> MutexGuard<'_, Recorder> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn record(
    inner: &Mutex<Recorder>,
    target: Target,
    sql: &str,
    params: &[RowValues],
) -> Option<Scripted> {
    let mut recorder = lock(inner);
    recorder.executed.push(Executed {
        target,
        sql: sql.to_string(),
        params: params.to_vec(),
    });
    recorder
        .script
        .iter()
        .find(|(pattern, _)| sql.contains(pattern.as_str()))
        .map(|(_, response)| response.clone())
}

fn reply_rows(response: Option<Scripted>) -> Result<ResultSet, CatalogDbError> {
    match response {
        Some(Scripted::Rows(rows)) => Ok(rows),
        Some(Scripted::Affected(_)) | None => Ok(ResultSet::default()),
        Some(Scripted::Error(msg)) => Err(CatalogDbError::ExecutionError(msg)),
    }
}

fn reply_count(response: Option<Scripted>) -> Result<u64, CatalogDbError> {
    match response {
        Some(Scripted::Rows(rows)) => Ok(rows.len() as u64),
        Some(Scripted::Affected(n)) => Ok(n),
        None => Ok(0),
        Some(Scripted::Error(msg)) => Err(CatalogDbError::ExecutionError(msg)),
    }
}

fn reply_unit(response: Option<Scripted>) -> Result<(), CatalogDbError> {
    match response {
        Some(Scripted::Error(msg)) => Err(CatalogDbError::ExecutionError(msg)),
        _ => Ok(()),
    }
}

#[async_trait]
impl SqlExecutor for RecordingPool {
    async fn query(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, CatalogDbError> {
        reply_rows(record(&self.inner, Target::Pool, sql, params))
    }

    async fn execute(&self, sql: &str, params: &[RowValues]) -> Result<u64, CatalogDbError> {
        reply_count(record(&self.inner, Target::Pool, sql, params))
    }

    async fn batch_execute(&self, sql: &str) -> Result<(), CatalogDbError> {
        reply_unit(record(&self.inner, Target::Pool, sql, &[]))
    }
}

#[async_trait]
impl ConnectionSource for RecordingPool {
    type Conn = RecordingConnection;

    async fn connect(&self) -> Result<RecordingConnection, CatalogDbError> {
        let mut recorder = self.lock();
        recorder.checkouts += 1;
        Ok(RecordingConnection {
            id: recorder.checkouts,
            inner: Arc::clone(&self.inner),
        })
    }
}

/// A dedicated connection from a [`RecordingPool`].
pub struct RecordingConnection {
    id: usize,
    inner: Arc<Mutex<Recorder>>,
}

impl RecordingConnection {
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }
}

#[async_trait]
impl SqlExecutor for RecordingConnection {
    async fn query(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, CatalogDbError> {
        reply_rows(record(&self.inner, Target::Connection(self.id), sql, params))
    }

    async fn execute(&self, sql: &str, params: &[RowValues]) -> Result<u64, CatalogDbError> {
        reply_count(record(&self.inner, Target::Connection(self.id), sql, params))
    }

    async fn batch_execute(&self, sql: &str) -> Result<(), CatalogDbError> {
        reply_unit(record(&self.inner, Target::Connection(self.id), sql, &[]))
    }
}

impl DedicatedConnection for RecordingConnection {
    fn discard(self) {
        lock(&self.inner).discards += 1;
    }
}

impl Drop for RecordingConnection {
    fn drop(&mut self) {
        lock(&self.inner).releases += 1;
    }
}
