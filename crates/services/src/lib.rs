#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod gateway;
pub mod profile_service;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use error::{AppServicesError, GatewayError, ProfileServiceError, SessionError};
pub use gateway::{
    HttpQuizApi, QuestionSource, QuizApiConfig, RemoteProfile, SubmissionGateway,
    SubmissionPayload, SubmissionStatus,
};
pub use profile_service::ProfileService;

pub use sessions::{
    AttemptListItem, HistoryService, PlayedSession, QuizLoopService, RecordedSession,
    SessionCommand, SessionEvent, SessionOutcome, SessionOutput, SessionPhase, SessionProgress,
    SessionRunner, SessionStateMachine,
};
