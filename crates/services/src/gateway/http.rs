use std::env;

use async_trait::async_trait;
use quiz_core::model::QuestionSet;
use reqwest::{Client, Response, StatusCode};

use super::dto::{QuestionDto, RemoteProfile, SubmissionPayload, question_set_from_dtos};
use super::{QuestionSource, SubmissionGateway};
use crate::error::GatewayError;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Clone, Debug)]
pub struct QuizApiConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl QuizApiConfig {
    /// Blank tokens count as missing.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Read `QUIZ_API_URL` and `QUIZ_API_TOKEN`.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("QUIZ_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        Self::new(base_url, env::var("QUIZ_API_TOKEN").ok())
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

/// reqwest adapter for the quiz backend.
#[derive(Clone)]
pub struct HttpQuizApi {
    client: Client,
    config: QuizApiConfig,
}

impl HttpQuizApi {
    #[must_use]
    pub fn new(config: QuizApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn token(&self) -> Result<&str, GatewayError> {
        self.config
            .token
            .as_deref()
            .ok_or(GatewayError::Unauthenticated)
    }
}

fn check_status(response: Response) -> Result<Response, GatewayError> {
    status_error(response.status()).map_or(Ok(response), Err)
}

fn status_error(status: StatusCode) -> Option<GatewayError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::UNPROCESSABLE_ENTITY {
        return Some(GatewayError::Unauthenticated);
    }
    if !status.is_success() {
        return Some(GatewayError::HttpStatus(status));
    }
    None
}

#[async_trait]
impl QuestionSource for HttpQuizApi {
    async fn fetch_questions(&self) -> Result<QuestionSet, GatewayError> {
        let token = self.token()?;
        let response = self
            .client
            .get(self.config.endpoint("/api/quiz"))
            .bearer_auth(token)
            .send()
            .await?;

        let dtos: Vec<QuestionDto> = check_status(response)?.json().await?;
        Ok(question_set_from_dtos(dtos))
    }
}

#[async_trait]
impl SubmissionGateway for HttpQuizApi {
    async fn submit(&self, submission: &SubmissionPayload) -> Result<(), GatewayError> {
        let token = self.token()?;
        let response = self
            .client
            .post(self.config.endpoint("/api/quiz/submit"))
            .bearer_auth(token)
            .json(submission)
            .send()
            .await?;

        check_status(response)?;
        Ok(())
    }

    async fn fetch_profile(&self) -> Result<RemoteProfile, GatewayError> {
        let token = self.token()?;
        let response = self
            .client
            .get(self.config.endpoint("/api/user"))
            .bearer_auth(token)
            .send()
            .await?;

        Ok(check_status(response)?.json().await?)
    }
}
