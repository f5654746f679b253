use std::sync::Arc;

use storage::repository::Storage;

use crate::error::AppServicesError;
use crate::gateway::{HttpQuizApi, QuestionSource, QuizApiConfig, SubmissionGateway};
use crate::profile_service::ProfileService;
use crate::sessions::{HistoryService, QuizLoopService};
use crate::Clock;

/// Assembles app-facing services over one storage backend and one quiz API.
#[derive(Clone)]
pub struct AppServices {
    quiz_loop: Arc<QuizLoopService>,
    profile: Arc<ProfileService>,
    history: Arc<HistoryService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP quiz API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        api: QuizApiConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let api = Arc::new(HttpQuizApi::new(api));
        let source: Arc<dyn QuestionSource> = api.clone();
        let gateway: Arc<dyn SubmissionGateway> = api;
        Ok(Self::from_parts(clock, &storage, source, gateway))
    }

    /// Wire services from already-built parts.
    #[must_use]
    pub fn from_parts(
        clock: Clock,
        storage: &Storage,
        source: Arc<dyn QuestionSource>,
        gateway: Arc<dyn SubmissionGateway>,
    ) -> Self {
        let profile = ProfileService::new(Arc::clone(&storage.profiles), Arc::clone(&gateway));
        let quiz_loop = QuizLoopService::new(
            clock,
            source,
            gateway,
            profile.clone(),
            Arc::clone(&storage.attempts),
        );
        let history = HistoryService::new(Arc::clone(&storage.attempts));

        Self {
            quiz_loop: Arc::new(quiz_loop),
            profile: Arc::new(profile),
            history: Arc::new(history),
        }
    }

    #[must_use]
    pub fn with_shuffle_questions(mut self, shuffle: bool) -> Self {
        let quiz_loop = QuizLoopService::clone(&self.quiz_loop).with_shuffle_questions(shuffle);
        self.quiz_loop = Arc::new(quiz_loop);
        self
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn profile(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profile)
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }
}
