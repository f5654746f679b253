use std::fmt;
use std::path::{Path, PathBuf};

use quiz_core::model::{Difficulty, SessionConfig, TimeLimit};
use services::QuizApiConfig;
use services::gateway::DEFAULT_API_URL;

pub const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidDifficulty { raw: String },
    InvalidTimeLimit { raw: String },
    InvalidLimit { raw: String },
    InvalidAttemptId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidDifficulty { raw } => {
                write!(f, "invalid --difficulty value: {raw} (beginner, moderate, expert)")
            }
            ArgsError::InvalidTimeLimit { raw } => {
                write!(f, "invalid --time-limit value: {raw} (positive seconds)")
            }
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
            ArgsError::InvalidAttemptId { raw } => write!(f, "invalid --id value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    History,
    Profile,
    Help,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "history" => Some(Self::History),
            "profile" => Some(Self::Profile),
            "help" | "--help" | "-h" => Some(Self::Help),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Args {
    pub command: Command,
    pub db_url: String,
    pub api_url: String,
    pub token: Option<String>,
    pub difficulty: Difficulty,
    pub time_limit: Option<TimeLimit>,
    pub history_limit: u32,
    /// Show one attempt's answer log instead of the list.
    pub attempt_id: Option<i64>,
    pub shuffle: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            command: Command::Play,
            db_url: DEFAULT_DB_URL.into(),
            api_url: DEFAULT_API_URL.into(),
            token: None,
            difficulty: Difficulty::default(),
            time_limit: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            attempt_id: None,
            shuffle: false,
        }
    }
}

impl Args {
    /// Defaults overridden by `QUIZ_DB_URL`, `QUIZ_API_URL` and `QUIZ_API_TOKEN`.
    pub fn from_env() -> Self {
        let mut args = Self::default();
        if let Ok(db) = std::env::var("QUIZ_DB_URL") {
            args.db_url = normalize_sqlite_url(&db);
        }
        let api = QuizApiConfig::from_env();
        args.api_url = api.base_url;
        args.token = api.token;
        args
    }

    /// Apply the subcommand and flags on top of `self`.
    pub fn parse(mut self, argv: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut args = argv.into_iter().peekable();

        if let Some(first) = args.peek()
            && !first.starts_with("--")
        {
            self.command =
                Command::from_arg(first).ok_or_else(|| ArgsError::UnknownCommand(first.clone()))?;
            args.next();
        }

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    self.db_url = normalize_sqlite_url(&value);
                }
                "--api-url" => self.api_url = require_value(&mut args, "--api-url")?,
                "--token" => self.token = Some(require_value(&mut args, "--token")?),
                "--difficulty" => {
                    let value = require_value(&mut args, "--difficulty")?;
                    self.difficulty = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDifficulty { raw: value.clone() })?;
                }
                "--time-limit" => {
                    let value = require_value(&mut args, "--time-limit")?;
                    let limit = value
                        .parse::<u32>()
                        .ok()
                        .and_then(|secs| TimeLimit::from_secs(secs).ok())
                        .ok_or_else(|| ArgsError::InvalidTimeLimit { raw: value.clone() })?;
                    self.time_limit = Some(limit);
                }
                "--limit" => {
                    let value = require_value(&mut args, "--limit")?;
                    self.history_limit = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLimit { raw: value.clone() })?;
                }
                "--id" => {
                    let value = require_value(&mut args, "--id")?;
                    let id = value
                        .parse::<i64>()
                        .ok()
                        .filter(|id| *id > 0)
                        .ok_or_else(|| ArgsError::InvalidAttemptId { raw: value.clone() })?;
                    self.attempt_id = Some(id);
                }
                "--shuffle" => self.shuffle = true,
                "--help" | "-h" => self.command = Command::Help,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(self)
    }

    pub fn session_config(&self) -> SessionConfig {
        let time_limit = self
            .time_limit
            .unwrap_or_else(|| self.difficulty.preset_time_limit());
        SessionConfig::new(time_limit, self.difficulty)
    }

    pub fn api_config(&self) -> QuizApiConfig {
        QuizApiConfig::new(self.api_url.clone(), self.token.clone())
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz [play]   [--difficulty <level>] [--time-limit <secs>] [--shuffle]");
    eprintln!("  quiz history  [--limit <n>] [--id <attempt>]");
    eprintln!("  quiz profile");
    eprintln!();
    eprintln!("Common flags:");
    eprintln!("  --db <sqlite_url>   default {DEFAULT_DB_URL}");
    eprintln!("  --api-url <url>     default {DEFAULT_API_URL}");
    eprintln!("  --token <bearer>");
    eprintln!();
    eprintln!("Levels: beginner (20s), moderate (10s), expert (5s)");
    eprintln!("Environment: QUIZ_DB_URL, QUIZ_API_URL, QUIZ_API_TOKEN, RUST_LOG");
}

/// Turn a bare path or `sqlite:` path into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path = Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Make sure the database file and its directory exist before sqlx opens it.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let invalid = || ArgsError::InvalidDbUrl {
        raw: db_url.to_string(),
    };
    let rest = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() {
        return Err(invalid().into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}
