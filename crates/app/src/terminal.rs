use std::io::{BufRead, Write};

use quiz_core::model::{AnswerRecord, Question, SessionSummary};
use services::{SessionCommand, SessionOutput, SessionProgress};
use tokio::sync::mpsc;
use tracing::debug;

/// Seconds left at which the countdown starts printing.
const WARN_AT_SECS: u32 = 3;

/// Read stdin lines on a plain thread.
///
/// A blocking stdin read cannot be cancelled, so it stays off the runtime
/// and the process can exit while a read is pending.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Question currently accepting input.
struct Active {
    index: usize,
    options: Vec<String>,
}

/// Map one line of input to a command for the active question.
fn parse_input(line: &str, active: Option<&Active>) -> Option<SessionCommand> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
        return Some(SessionCommand::Quit);
    }

    let active = active?;
    let choice: usize = line.parse().ok()?;
    let option = active.options.get(choice.checked_sub(1)?)?;
    Some(SessionCommand::Select {
        index: active.index,
        option: option.clone(),
    })
}

/// Render session updates and forward player input until the session ends.
pub async fn drive(
    mut updates: mpsc::UnboundedReceiver<SessionOutput>,
    mut input: mpsc::Receiver<String>,
    commands: mpsc::Sender<SessionCommand>,
) {
    let mut active: Option<Active> = None;
    let mut input_open = true;

    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(update) = update else { break };
                let done = matches!(
                    update,
                    SessionOutput::Finished { .. } | SessionOutput::Empty | SessionOutput::Cancelled
                );
                render(&update, &mut active);
                if done {
                    break;
                }
            }
            line = input.recv(), if input_open => match line {
                Some(line) => match parse_input(&line, active.as_ref()) {
                    Some(command) => {
                        if commands.send(command).await.is_err() {
                            break;
                        }
                    }
                    None if active.is_some() => prompt("Pick an option number, or q to quit: "),
                    None => debug!(%line, "input outside answer window ignored"),
                },
                None => input_open = false,
            },
        }
    }
}

fn render(update: &SessionOutput, active: &mut Option<Active>) {
    match update {
        SessionOutput::QuestionStarted {
            index,
            question,
            progress,
        } => {
            print_question(*index, question, progress);
            *active = Some(Active {
                index: *index,
                options: question.options().to_vec(),
            });
        }
        SessionOutput::Ticked { progress, .. } => {
            if progress.time_remaining <= WARN_AT_SECS {
                println!("  {}s left", progress.time_remaining);
            }
        }
        SessionOutput::AnswerLocked { record, score, .. } => {
            *active = None;
            print_feedback(record, *score);
        }
        SessionOutput::AdvanceScheduled { .. } => {}
        SessionOutput::Finished { summary, .. } => print_summary(summary),
        SessionOutput::Empty => println!("No questions available right now."),
        SessionOutput::Cancelled => println!("\nQuiz cancelled."),
    }
}

fn question_header(index: usize, progress: &SessionProgress) -> String {
    format!(
        "Question {}/{}  |  score {}  |  {}s",
        index + 1,
        progress.total,
        progress.score,
        progress.time_remaining
    )
}

fn print_question(index: usize, question: &Question, progress: &SessionProgress) {
    println!();
    println!("{}", question_header(index, progress));
    println!("{}", question.prompt());
    for (n, option) in question.options().iter().enumerate() {
        println!("  {}) {option}", n + 1);
    }
    prompt("> ");
}

fn print_feedback(record: &AnswerRecord, score: i64) {
    let points = record.points();
    match record.selected() {
        _ if record.is_correct() => println!("Correct! {points:+}"),
        None => println!("Time's up. Answer: {} ({points:+})", record.correct_answer()),
        Some(_) => println!("Wrong. Answer: {} ({points:+})", record.correct_answer()),
    }
    println!("Score: {score}");
}

pub fn print_summary(summary: &SessionSummary) {
    println!();
    println!("Quiz complete ({})", summary.difficulty());
    println!(
        "Score {}  |  {}/{} correct  |  {:.1}s",
        summary.score(),
        summary.correct_count(),
        summary.total_questions(),
        summary.time_taken_secs()
    );
    for (n, answer) in summary.answers().iter().enumerate() {
        let mark = if answer.is_correct() { "+" } else { "-" };
        println!(
            "  {mark} {}. {}  [you: {}, answer: {}]",
            n + 1,
            answer.question_text(),
            answer.selected().unwrap_or("skipped"),
            answer.correct_answer()
        );
    }
}

fn prompt(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}
