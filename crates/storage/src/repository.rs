use async_trait::async_trait;
use quiz_core::model::SessionSummary;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Storage identifier for a locally recorded attempt (`SQLite` row id).
pub type AttemptId = i64;

/// A persisted attempt together with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRow {
    pub id: AttemptId,
    pub summary: SessionSummary,
}

impl AttemptRow {
    #[must_use]
    pub fn new(id: AttemptId, summary: SessionSummary) -> Self {
        Self { id, summary }
    }
}

/// Local player profile. Holds the lifetime XP total.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Current lifetime XP, `0` for a fresh profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be read.
    async fn load_xp(&self) -> Result<u64, StorageError>;

    /// Overwrite the lifetime XP total.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be written.
    async fn save_xp(&self, xp: u64) -> Result<(), StorageError>;
}

/// Append-only log of finished quiz sessions.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Persist a finished session with its full answer log.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(&self, summary: &SessionSummary) -> Result<AttemptId, StorageError>;

    /// Fetch a single attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_attempt(&self, id: AttemptId) -> Result<SessionSummary, StorageError>;

    /// Most recent attempts first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query or mapping failures.
    async fn list_attempts(&self, limit: u32) -> Result<Vec<AttemptRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    xp: Arc<Mutex<u64>>,
    attempts: Arc<Mutex<Vec<AttemptRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing XP total.
    #[must_use]
    pub fn with_xp(xp: u64) -> Self {
        Self {
            xp: Arc::new(Mutex::new(xp)),
            attempts: Arc::default(),
        }
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn load_xp(&self) -> Result<u64, StorageError> {
        let guard = self
            .xp
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(*guard)
    }

    async fn save_xp(&self, xp: u64) -> Result<(), StorageError> {
        let mut guard = self
            .xp
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = xp;
        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, summary: &SessionSummary) -> Result<AttemptId, StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = guard.last().map_or(1, |row| row.id + 1);
        guard.push(AttemptRow::new(id, summary.clone()));
        Ok(id)
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<SessionSummary, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.summary.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_attempts(&self, limit: u32) -> Result<Vec<AttemptRow>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut rows: Vec<AttemptRow> = guard.clone();
        rows.sort_by(|a, b| {
            b.summary
                .completed_at()
                .cmp(&a.summary.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(limit);
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub profiles: Arc<dyn ProfileRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let profiles: Arc<dyn ProfileRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Self { profiles, attempts }
    }
}
