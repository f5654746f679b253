mod cli;
mod logging;
mod terminal;

use std::error::Error;

use quiz_core::ProgressionResult;
use services::{AppServices, Clock, SubmissionStatus};
use tokio::sync::mpsc;
use tracing::warn;

use crate::cli::{Args, Command, prepare_sqlite_file, print_usage};

async fn open_services(args: &Args) -> Result<AppServices, Box<dyn Error>> {
    // Open + migrate SQLite here so core and services stay free of filesystem glue.
    prepare_sqlite_file(&args.db_url)?;
    let services =
        AppServices::new_sqlite(&args.db_url, Clock::default_clock(), args.api_config()).await?;
    Ok(services.with_shuffle_questions(args.shuffle))
}

async fn play(args: &Args) -> Result<(), Box<dyn Error>> {
    let services = open_services(args).await?;
    let config = args.session_config();
    println!(
        "{} mode: {}s per question. Answer with the option number, q to quit.",
        config.difficulty(),
        config.time_limit().secs()
    );

    let (command_tx, command_rx) = mpsc::channel(16);
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let ui = tokio::spawn(terminal::drive(
        update_rx,
        terminal::spawn_stdin_reader(),
        command_tx,
    ));

    let played = services.quiz_loop().play(config, command_rx, update_tx).await;
    if let Err(err) = ui.await {
        warn!(error = %err, "terminal task ended abnormally");
    }

    let played = played?;
    let saved = match &played.recorded {
        Ok(Some(recorded)) => {
            print_progression(&recorded.progression);
            true
        }
        Ok(None) => return Ok(()),
        // Reported once by `main` after the submission settles.
        Err(_) => false,
    };

    if let Some(submission) = played.submission {
        match submission.await {
            Ok(SubmissionStatus::Submitted) => println!("Result submitted."),
            Ok(SubmissionStatus::Failed { reason }) if saved => {
                println!("Result saved locally; submission failed: {reason}");
            }
            Ok(SubmissionStatus::Failed { reason }) => println!("Submission failed: {reason}"),
            Err(err) => warn!(error = %err, "submission task ended abnormally"),
        }
    }

    played.recorded.map(|_| ()).map_err(Into::into)
}

fn print_progression(progression: &ProgressionResult) {
    println!(
        "XP {} (+{})  |  Level {}  |  {}% to next level",
        progression.xp, progression.xp_delta, progression.level, progression.percent_to_next
    );
    if progression.levels_gained() > 0 {
        println!("Level up! You reached level {}.", progression.level);
    }
}

async fn history(args: &Args) -> Result<(), Box<dyn Error>> {
    let services = open_services(args).await?;
    if let Some(id) = args.attempt_id {
        let summary = services
            .history()
            .attempt(id)
            .await
            .map_err(|err| format!("attempt #{id}: {err}"))?;
        println!("Attempt #{id}  {}", summary.completed_at().format("%Y-%m-%d %H:%M"));
        terminal::print_summary(&summary);
        return Ok(());
    }

    let items = services.history().recent(args.history_limit).await?;
    if items.is_empty() {
        println!("No quizzes played yet.");
        return Ok(());
    }

    for item in items {
        println!(
            "#{:<4} {}  {:<8}  score {:>4}  {}/{} correct  {:.1}s",
            item.id,
            item.completed_at.format("%Y-%m-%d %H:%M"),
            item.difficulty.label(),
            item.score,
            item.correct,
            item.total,
            item.time_taken_secs
        );
    }
    Ok(())
}

async fn profile(args: &Args) -> Result<(), Box<dyn Error>> {
    let services = open_services(args).await?;
    let standing = services.profile().standing().await?;
    println!(
        "Level {}  |  {} XP  |  {}% to next level",
        standing.level, standing.xp, standing.percent_to_next
    );

    if !args.api_config().has_token() {
        println!("Not signed in (set QUIZ_API_TOKEN or pass --token).");
        return Ok(());
    }
    match services.profile().remote_profile().await {
        Ok(remote) => println!("Signed in as {} <{}>", remote.username, remote.email),
        Err(err) => eprintln!("Could not load remote profile: {err}"),
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn Error>> {
    let args = Args::from_env()
        .parse(std::env::args().skip(1))
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;

    match args.command {
        Command::Help => {
            print_usage();
            Ok(())
        }
        Command::Play => play(&args).await,
        Command::History => history(&args).await,
        Command::Profile => profile(&args).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = logging::init_logging() {
        eprintln!("logging disabled: {err}");
    }

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
