use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{
    Difficulty, Question, QuestionId, QuestionSet, SessionConfig, SessionSummary, TimeLimit,
};
use quiz_core::time::fixed_clock;
use services::{
    AppServices, GatewayError, QuestionSource, RemoteProfile, SessionCommand, SessionError,
    SessionOutcome, SessionOutput, SubmissionGateway, SubmissionPayload, SubmissionStatus,
};
use storage::repository::{
    AttemptId, AttemptRepository, AttemptRow, InMemoryRepository, ProfileRepository, Storage,
    StorageError,
};
use tokio::sync::mpsc;

struct FixedQuestions(Vec<Question>);

#[async_trait]
impl QuestionSource for FixedQuestions {
    async fn fetch_questions(&self) -> Result<QuestionSet, GatewayError> {
        Ok(QuestionSet::new(self.0.clone()))
    }
}

struct Unreachable;

#[async_trait]
impl QuestionSource for Unreachable {
    async fn fetch_questions(&self) -> Result<QuestionSet, GatewayError> {
        Err(GatewayError::Unauthenticated)
    }
}

#[derive(Default)]
struct RecordingGateway {
    fail: bool,
    submitted: Mutex<Vec<SubmissionPayload>>,
}

#[async_trait]
impl SubmissionGateway for RecordingGateway {
    async fn submit(&self, submission: &SubmissionPayload) -> Result<(), GatewayError> {
        self.submitted
            .lock()
            .expect("lock submissions")
            .push(submission.clone());
        if self.fail {
            return Err(GatewayError::HttpStatus(reqwest::StatusCode::BAD_GATEWAY));
        }
        Ok(())
    }

    async fn fetch_profile(&self) -> Result<RemoteProfile, GatewayError> {
        Ok(RemoteProfile {
            username: "player".into(),
            email: "player@example.com".into(),
            notifications_enabled: true,
        })
    }
}

struct BrokenAttempts;

#[async_trait]
impl AttemptRepository for BrokenAttempts {
    async fn append_attempt(&self, _summary: &SessionSummary) -> Result<AttemptId, StorageError> {
        Err(StorageError::Connection("disk full".into()))
    }

    async fn get_attempt(&self, _id: AttemptId) -> Result<SessionSummary, StorageError> {
        Err(StorageError::NotFound)
    }

    async fn list_attempts(&self, _limit: u32) -> Result<Vec<AttemptRow>, StorageError> {
        Ok(Vec::new())
    }
}

fn questions() -> Vec<Question> {
    vec![
        Question::new(QuestionId::new(1), "Q1", vec!["A".into(), "B".into()], "A").unwrap(),
        Question::new(QuestionId::new(2), "Q2", vec!["C".into(), "D".into()], "D").unwrap(),
    ]
}

fn config() -> SessionConfig {
    SessionConfig::new(TimeLimit::from_secs(3).unwrap(), Difficulty::Moderate)
}

fn storage_with(repo: &InMemoryRepository) -> Storage {
    Storage {
        profiles: Arc::new(repo.clone()),
        attempts: Arc::new(repo.clone()),
    }
}

#[tokio::test(start_paused = true)]
async fn finished_session_records_xp_attempt_and_submission() {
    let repo = InMemoryRepository::with_xp(95);
    let gateway = Arc::new(RecordingGateway::default());
    let services = AppServices::from_parts(
        fixed_clock(),
        &storage_with(&repo),
        Arc::new(FixedQuestions(questions())),
        gateway.clone(),
    );

    let (tx, rx) = mpsc::channel(4);
    let (updates, _update_rx) = mpsc::unbounded_channel();
    tx.send(SessionCommand::Select { index: 0, option: "A".into() })
        .await
        .unwrap();

    let played = services.quiz_loop().play(config(), rx, updates).await.unwrap();

    let summary = played.outcome.summary().expect("finished").clone();
    assert_eq!(summary.score(), 4);

    let recorded = played.recorded.unwrap().expect("recorded");
    assert_eq!(recorded.progression.xp, 99);
    assert_eq!(recorded.progression.level, 1);
    let submission = played.submission.expect("submission spawned");
    assert_eq!(submission.await.unwrap(), SubmissionStatus::Submitted);

    assert_eq!(repo.load_xp().await.unwrap(), 99);
    assert_eq!(repo.get_attempt(recorded.attempt_id).await.unwrap(), summary);

    let sent = gateway.submitted.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].score, 4);
    assert_eq!(sent[0].level, "Moderate");
    assert_eq!(sent[0].answers[1].user_answer, None);
    drop(tx);
}

#[tokio::test(start_paused = true)]
async fn failed_submission_leaves_local_results_intact() {
    let repo = InMemoryRepository::new();
    let gateway = Arc::new(RecordingGateway {
        fail: true,
        ..RecordingGateway::default()
    });
    let services = AppServices::from_parts(
        fixed_clock(),
        &storage_with(&repo),
        Arc::new(FixedQuestions(questions())),
        gateway,
    );

    let (tx, rx) = mpsc::channel(4);
    let (updates, _update_rx) = mpsc::unbounded_channel();
    tx.send(SessionCommand::Select { index: 0, option: "A".into() })
        .await
        .unwrap();

    let played = services.quiz_loop().play(config(), rx, updates).await.unwrap();
    assert!(played.recorded.unwrap().is_some());

    assert!(matches!(
        played.submission.expect("submission spawned").await.unwrap(),
        SubmissionStatus::Failed { .. }
    ));
    assert_eq!(repo.load_xp().await.unwrap(), 4);
    assert_eq!(services.history().recent(5).await.unwrap().len(), 1);
    drop(tx);
}

#[tokio::test(start_paused = true)]
async fn cancelled_session_records_nothing() {
    let repo = InMemoryRepository::with_xp(10);
    let gateway = Arc::new(RecordingGateway::default());
    let services = AppServices::from_parts(
        fixed_clock(),
        &storage_with(&repo),
        Arc::new(FixedQuestions(questions())),
        gateway.clone(),
    );

    let (tx, rx) = mpsc::channel(4);
    let (updates, mut update_rx) = mpsc::unbounded_channel();
    tx.send(SessionCommand::Quit).await.unwrap();

    let played = services.quiz_loop().play(config(), rx, updates).await.unwrap();

    assert_eq!(played.outcome, SessionOutcome::Cancelled);
    assert!(played.recorded.unwrap().is_none());
    assert!(played.submission.is_none());
    assert_eq!(repo.load_xp().await.unwrap(), 10);
    assert!(services.history().recent(5).await.unwrap().is_empty());
    assert!(gateway.submitted.lock().unwrap().is_empty());

    let first = update_rx.recv().await;
    assert!(matches!(first, Some(SessionOutput::QuestionStarted { index: 0, .. })));
}

#[tokio::test(start_paused = true)]
async fn empty_question_set_submits_nothing() {
    let repo = InMemoryRepository::new();
    let gateway = Arc::new(RecordingGateway::default());
    let services = AppServices::from_parts(
        fixed_clock(),
        &storage_with(&repo),
        Arc::new(FixedQuestions(Vec::new())),
        gateway.clone(),
    );

    let (tx, rx) = mpsc::channel(4);
    let (updates, _update_rx) = mpsc::unbounded_channel();

    let played = services.quiz_loop().play(config(), rx, updates).await.unwrap();

    assert_eq!(played.outcome, SessionOutcome::Empty);
    assert!(played.recorded.unwrap().is_none());
    assert!(played.submission.is_none());
    assert!(gateway.submitted.lock().unwrap().is_empty());
    drop(tx);
}

#[tokio::test(start_paused = true)]
async fn attempt_write_failure_keeps_outcome_and_still_submits() {
    let profiles = InMemoryRepository::with_xp(10);
    let storage = Storage {
        profiles: Arc::new(profiles.clone()),
        attempts: Arc::new(BrokenAttempts),
    };
    let gateway = Arc::new(RecordingGateway::default());
    let one_question = vec![questions().remove(0)];
    let services = AppServices::from_parts(
        fixed_clock(),
        &storage,
        Arc::new(FixedQuestions(one_question)),
        gateway.clone(),
    );

    let (tx, rx) = mpsc::channel(4);
    let (updates, _update_rx) = mpsc::unbounded_channel();
    tx.send(SessionCommand::Select { index: 0, option: "A".into() })
        .await
        .unwrap();

    let played = services.quiz_loop().play(config(), rx, updates).await.unwrap();

    assert_eq!(played.outcome.summary().map(|s| s.score()), Some(5));
    assert!(matches!(
        played.recorded,
        Err(SessionError::Storage(StorageError::Connection(_)))
    ));
    assert_eq!(profiles.load_xp().await.unwrap(), 10);

    let submission = played.submission.expect("submission spawned");
    assert_eq!(submission.await.unwrap(), SubmissionStatus::Submitted);
    let sent = gateway.submitted.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].score, 5);
    drop(tx);
}

#[tokio::test]
async fn fetch_failure_surfaces_before_session_starts() {
    let services = AppServices::from_parts(
        fixed_clock(),
        &Storage::in_memory(),
        Arc::new(Unreachable),
        Arc::new(RecordingGateway::default()),
    );

    let (_tx, rx) = mpsc::channel(1);
    let (updates, _update_rx) = mpsc::unbounded_channel();

    let err = services
        .quiz_loop()
        .run_session(config(), rx, updates)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Fetch(GatewayError::Unauthenticated)));
}

#[tokio::test(start_paused = true)]
async fn shorter_tick_period_speeds_up_countdown() {
    let services = AppServices::from_parts(
        fixed_clock(),
        &Storage::in_memory(),
        Arc::new(FixedQuestions(questions())),
        Arc::new(RecordingGateway::default()),
    );
    let quiz_loop = services
        .quiz_loop()
        .as_ref()
        .clone()
        .with_tick_period(Duration::from_millis(100));

    let (tx, rx) = mpsc::channel(1);
    let (updates, _update_rx) = mpsc::unbounded_channel();
    let started = tokio::time::Instant::now();

    let outcome = quiz_loop.run_session(config(), rx, updates).await.unwrap();

    assert_eq!(outcome.summary().map(|s| s.score()), Some(-2));
    // Two questions: four 100ms ticks each, then a 1.5s display delay.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(3_800), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(3_900), "elapsed {elapsed:?}");
    drop(tx);
}
