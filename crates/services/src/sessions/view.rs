use chrono::{DateTime, Utc};
use std::sync::Arc;

use quiz_core::model::{Difficulty, SessionSummary};
use storage::repository::{AttemptId, AttemptRepository, InMemoryRepository};

use crate::error::SessionError;

/// Presentation-agnostic list item for a recorded attempt.
///
/// No pre-formatted strings; the client decides how to render timestamps
/// and durations.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptListItem {
    pub id: AttemptId,
    pub completed_at: DateTime<Utc>,
    pub score: i64,
    pub total: u32,
    pub correct: u32,
    pub difficulty: Difficulty,
    pub time_taken_secs: f64,
}

impl AttemptListItem {
    #[must_use]
    pub fn from_summary(id: AttemptId, summary: &SessionSummary) -> Self {
        Self {
            id,
            completed_at: summary.completed_at(),
            score: summary.score(),
            total: summary.total_questions(),
            correct: summary.correct_count(),
            difficulty: summary.difficulty(),
            time_taken_secs: summary.time_taken_secs(),
        }
    }
}

/// Read-only facade over the local attempt log.
#[derive(Clone)]
pub struct HistoryService {
    attempts: Arc<dyn AttemptRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { attempts }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRepository::new()))
    }

    /// Most recent attempts first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn recent(&self, limit: u32) -> Result<Vec<AttemptListItem>, SessionError> {
        let rows = self.attempts.list_attempts(limit).await?;
        Ok(rows
            .iter()
            .map(|row| AttemptListItem::from_summary(row.id, &row.summary))
            .collect())
    }

    /// Full attempt including its answer log.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage`, with `StorageError::NotFound` for unknown ids.
    pub async fn attempt(&self, id: AttemptId) -> Result<SessionSummary, SessionError> {
        Ok(self.attempts.get_attempt(id).await?)
    }
}
