//! Remote quiz API boundary.
//!
//! The session core only sees these traits; `HttpQuizApi` is the production
//! adapter and tests swap in fakes.

mod dto;
mod http;

use async_trait::async_trait;
use quiz_core::model::QuestionSet;

use crate::error::GatewayError;

pub use dto::{AnswerPayload, QuestionDto, RemoteProfile, SubmissionPayload, question_set_from_dtos};
pub use http::{DEFAULT_API_URL, HttpQuizApi, QuizApiConfig};

/// Supplies the ordered question set for one session.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch the questions for a new session.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` when the source is unreachable or rejects the caller.
    async fn fetch_questions(&self) -> Result<QuestionSet, GatewayError>;
}

/// Accepts finished sessions and exposes the remote user profile.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    /// Send one finished session.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the submission is rejected or cannot be sent.
    async fn submit(&self, submission: &SubmissionPayload) -> Result<(), GatewayError>;

    /// Fetch the account details of the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Unauthenticated` without a valid token.
    async fn fetch_profile(&self) -> Result<RemoteProfile, GatewayError>;
}

/// Outcome of a detached submission task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    Submitted,
    Failed { reason: String },
}
