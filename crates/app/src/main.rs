use std::fmt;
use std::path::PathBuf;

use quiz_core::model::SessionId;
use quiz_core::{DialogueConfig, QuestionCatalog};
use services::{AppServices, DialogueError, DialogueService};
use tokio::io::{AsyncBufReadExt, BufReader};

mod logging;

#[derive(Debug, PartialEq, Eq)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSessionId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSessionId { raw } => write!(f, "invalid --session value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz [--db <sqlite_url>] [--session <uuid>] [--catalog <path.json>]");
    eprintln!("       [--welcome <text>] [-v|-vv|-vvv]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!("  --session <new random id>");
    eprintln!("  --catalog <built-in Rust quiz>");
    eprintln!();
    eprintln!("Chat commands:");
    eprintln!("  /progress  show progress as JSON");
    eprintln!("  /reset     forget this session and start over");
    eprintln!("  /quit      exit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_SESSION_ID, QUIZ_CATALOG, QUIZ_WELCOME, RUST_LOG");
}

#[derive(Debug)]
struct Args {
    db_url: String,
    session_id: SessionId,
    catalog_path: Option<PathBuf>,
    welcome_message: Option<String>,
    verbose: u8,
    help: bool,
}

impl Args {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = normalize_sqlite_url(
            env("QUIZ_DB_URL").unwrap_or_else(|| "sqlite:quiz.sqlite3".into()),
        );
        let mut session_id = match env("QUIZ_SESSION_ID") {
            Some(raw) => parse_session_id(raw)?,
            None => SessionId::new_v4(),
        };
        let mut catalog_path = env("QUIZ_CATALOG").map(PathBuf::from);
        let mut welcome_message = env("QUIZ_WELCOME");
        let mut verbose = 0_u8;
        let mut help = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--session" => {
                    session_id = parse_session_id(require_value(args, "--session")?)?;
                }
                "--catalog" => {
                    catalog_path = Some(PathBuf::from(require_value(args, "--catalog")?));
                }
                "--welcome" => {
                    welcome_message = Some(require_value(args, "--welcome")?);
                }
                "--verbose" | "-v" => verbose = verbose.saturating_add(1),
                "-vv" => verbose = verbose.saturating_add(2),
                "-vvv" => verbose = verbose.saturating_add(3),
                "--help" | "-h" => help = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            session_id,
            catalog_path,
            welcome_message,
            verbose,
            help,
        })
    }
}

fn parse_session_id(raw: String) -> Result<SessionId, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::InvalidSessionId { raw })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
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

async fn load_catalog(path: Option<&PathBuf>) -> Result<QuestionCatalog, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(QuestionCatalog::builtin());
    };
    let raw = tokio::fs::read_to_string(path).await?;
    let catalog = QuestionCatalog::from_json(&raw)?;
    tracing::info!(path = %path.display(), questions = catalog.len(), "loaded catalog");
    Ok(catalog)
}

fn print_replies(replies: &[String]) {
    for reply in replies {
        println!("{reply}");
    }
}

/// Send the opening message for a fresh session, or repeat the pending prompt.
async fn greet(dialogue: &DialogueService, id: SessionId) -> Result<(), DialogueError> {
    let turn = dialogue.open(id).await?;
    if !turn.persisted {
        println!("Resuming session {id}.");
    }
    print_replies(&turn.replies);
    Ok(())
}

async fn show_progress(
    dialogue: &DialogueService,
    id: SessionId,
) -> Result<(), Box<dyn std::error::Error>> {
    match dialogue.progress(id).await {
        Ok(progress) => println!("{}", serde_json::to_string_pretty(&progress)?),
        Err(DialogueError::Session(err)) => {
            tracing::warn!(session = %id, error = %err, "progress unavailable");
            println!("Session state is unreadable; use /reset to start over.");
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv, |key| std::env::var(key).ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if parsed.help {
        print_usage();
        return Ok(());
    }

    logging::init_logging(parsed.verbose);

    let catalog = load_catalog(parsed.catalog_path.as_ref()).await?;
    let mut config = DialogueConfig::default();
    if let Some(welcome_message) = parsed.welcome_message {
        config.welcome_message = welcome_message;
    }

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, catalog, config).await?;
    let dialogue = services.dialogue();
    let id = parsed.session_id;
    eprintln!("session: {id}");

    greet(&dialogue, id).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/progress" => show_progress(&dialogue, id).await?,
            "/reset" => {
                dialogue.reset(id).await?;
                greet(&dialogue, id).await?;
            }
            _ => {
                let turn = dialogue.handle_message(id, &line).await?;
                print_replies(&turn.replies);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(ToString::to_string);
        Args::parse(&mut iter, |_| None)
    }

    #[test]
    fn defaults_without_args() {
        let args = parse(&[]).unwrap();
        assert!(args.db_url.starts_with("sqlite://"));
        assert!(args.db_url.ends_with("quiz.sqlite3"));
        assert!(args.catalog_path.is_none());
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn flags_override_environment() {
        let id = SessionId::new_v4();
        let mut iter = ["--session".to_string(), id.to_string(), "-vv".to_string()].into_iter();
        let args = Args::parse(&mut iter, |key| match key {
            "QUIZ_DB_URL" => Some("sqlite::memory:".into()),
            "QUIZ_SESSION_ID" => Some(SessionId::new_v4().to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.session_id, id);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            parse(&["--session", "nope"]).unwrap_err(),
            ArgsError::InvalidSessionId { raw: "nope".into() }
        );
        assert_eq!(
            parse(&["--catalog"]).unwrap_err(),
            ArgsError::MissingValue { flag: "--catalog" }
        );
        assert_eq!(
            parse(&["--bogus"]).unwrap_err(),
            ArgsError::UnknownArg("--bogus".into())
        );
    }

    #[test]
    fn bundled_catalog_parses() {
        let catalog =
            QuestionCatalog::from_json(include_str!("../../../catalogs/python.json")).unwrap();
        assert_eq!(catalog.len(), 5);
    }

    #[test]
    fn keeps_explicit_sqlite_urls() {
        assert_eq!(
            normalize_sqlite_url("sqlite://tmp/quiz.db".into()),
            "sqlite://tmp/quiz.db"
        );
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }
}
