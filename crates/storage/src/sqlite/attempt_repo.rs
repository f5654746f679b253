use async_trait::async_trait;
use quiz_core::model::{AnswerRecord, SessionSummary};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    difficulty_to_str, parse_difficulty, question_id_from_i64, question_id_to_i64, ser,
    u32_from_i64,
};
use crate::repository::{AttemptId, AttemptRepository, AttemptRow, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl SqliteRepository {
    async fn load_answers(&self, attempt_id: AttemptId) -> Result<Vec<AnswerRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT question_id, question_text, user_answer, correct_answer
                FROM quiz_attempt_answers
                WHERE attempt_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut answers = Vec::with_capacity(rows.len());
        for row in rows {
            let question_id = question_id_from_i64(row.try_get("question_id").map_err(ser)?)?;
            answers.push(AnswerRecord::from_persisted(
                question_id,
                row.try_get("question_text").map_err(ser)?,
                row.try_get("user_answer").map_err(ser)?,
                row.try_get("correct_answer").map_err(ser)?,
            ));
        }
        Ok(answers)
    }

    async fn map_attempt_row(
        &self,
        row: &sqlx::sqlite::SqliteRow,
    ) -> Result<AttemptRow, StorageError> {
        let id: i64 = row.try_get("id").map_err(ser)?;
        let score: i64 = row.try_get("score").map_err(ser)?;
        let total_questions = u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?;
        let difficulty = parse_difficulty(&row.try_get::<String, _>("difficulty").map_err(ser)?)?;
        let started_at = row.try_get("started_at").map_err(ser)?;
        let completed_at = row.try_get("completed_at").map_err(ser)?;
        let answers = self.load_answers(id).await?;

        let summary = SessionSummary::from_persisted(
            score,
            total_questions,
            difficulty,
            started_at,
            completed_at,
            answers,
        )
        .map_err(ser)?;
        Ok(AttemptRow::new(id, summary))
    }
}

#[async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, summary: &SessionSummary) -> Result<AttemptId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
                INSERT INTO quiz_attempts (
                    score, total_questions, difficulty, started_at, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(summary.score())
        .bind(i64::from(summary.total_questions()))
        .bind(difficulty_to_str(summary.difficulty()))
        .bind(summary.started_at())
        .bind(summary.completed_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        let attempt_id = res.last_insert_rowid();

        for (position, answer) in summary.answers().iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("answer position overflow".into()))?;
            sqlx::query(
                r"
                    INSERT INTO quiz_attempt_answers (
                        attempt_id, position, question_id, question_text,
                        user_answer, correct_answer, is_correct
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
            )
            .bind(attempt_id)
            .bind(position)
            .bind(question_id_to_i64(answer.question_id())?)
            .bind(answer.question_text())
            .bind(answer.selected())
            .bind(answer.correct_answer())
            .bind(answer.is_correct())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(attempt_id)
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<SessionSummary, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, score, total_questions, difficulty, started_at, completed_at
                FROM quiz_attempts
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        Ok(self.map_attempt_row(&row).await?.summary)
    }

    async fn list_attempts(&self, limit: u32) -> Result<Vec<AttemptRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, score, total_questions, difficulty, started_at, completed_at
                FROM quiz_attempts
                ORDER BY completed_at DESC, id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(self.map_attempt_row(row).await?);
        }
        Ok(out)
    }
}
