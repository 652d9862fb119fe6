use std::fmt;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use proctor_core::model::Level;
use services::{Clock, ExamConfig, ExamServices};
use ui::{App, UiApp, build_app_context};
use url::Url;

mod logging;

use logging::{LogConfig, init_logging};

/// Pending submissions re-sent per startup pass.
const FLUSH_LIMIT: u32 = 50;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidLevel { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLevel { raw } => write!(f, "invalid --level value: {raw}"),
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

struct DesktopApp {
    services: ExamServices,
    level: Level,
    content_origin: Url,
}

impl UiApp for DesktopApp {
    fn services(&self) -> ExamServices {
        self.services.clone()
    }

    fn level(&self) -> Level {
        self.level
    }

    fn content_origin(&self) -> Url {
        self.content_origin.clone()
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    level: Level,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- ui    [--db <sqlite_url>] [--level <n>]");
    eprintln!("  cargo run -p app -- flush [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:proctor.sqlite3");
    eprintln!("  --level 1");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PROCTOR_DB_URL, PROCTOR_LEVEL");
    eprintln!("  PROCTOR_API_URL (required), PROCTOR_DEVICE_ID, PROCTOR_REQUEST_TIMEOUT_SECS,");
    eprintln!("  PROCTOR_CONTENT_URL, PROCTOR_LOG, PROCTOR_LOG_FORMAT");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Ui,
    /// Re-send undelivered submissions and exit.
    Flush,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "ui" => Some(Self::Ui),
            "flush" => Some(Self::Flush),
            _ => None,
        }
    }
}

fn parse_level(raw: String) -> Result<Level, ArgsError> {
    let parsed = raw.trim().parse::<Level>();
    parsed.map_err(|_| ArgsError::InvalidLevel { raw })
}

impl Args {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env("PROCTOR_DB_URL")
            .map_or_else(|| "sqlite://proctor.sqlite3".into(), normalize_sqlite_url);
        let mut level = match env("PROCTOR_LEVEL") {
            Some(raw) => parse_level(raw)?,
            None => Level::new(1).map_err(|_| ArgsError::InvalidLevel { raw: "1".into() })?,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--level" => {
                    level = parse_level(require_value(args, "--level")?)?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, level })
    }
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
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
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

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&LogConfig::from_env())?;

    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Ui,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Ui,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter(), |key| std::env::var(key).ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;
    let config = ExamConfig::from_env()?;
    let content_origin = config.content_origin();
    let services = ExamServices::new_sqlite(&parsed.db_url, config, Clock::system()).await?;

    // Answers stranded by an earlier run go out before anything new starts.
    let report = services.outbox().flush(FLUSH_LIMIT).await?;

    match cmd {
        Command::Flush => {
            eprintln!(
                "flush: delivered {}, still pending {}",
                report.delivered, report.failed
            );
            Ok(())
        }
        Command::Ui => {
            tracing::info!(level = %parsed.level, db = %parsed.db_url, "launching desktop app");
            let app = DesktopApp {
                services,
                level: parsed.level,
                content_origin,
            };
            let context = build_app_context(&(Arc::new(app) as Arc<dyn UiApp>));

            let desktop_cfg = DesktopConfig::new().with_window(
                WindowBuilder::new()
                    .with_title("Proctored Test")
                    .with_always_on_top(false),
            );

            LaunchBuilder::desktop()
                .with_cfg(desktop_cfg)
                .with_context(context)
                .launch(App);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
