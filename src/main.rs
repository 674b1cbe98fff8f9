use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;

use kanban_board::command::{self, CommandError, COMMANDS};
use kanban_board::config::{self, BoardConfig, ConfigError};
use kanban_board::notify::TerminalBell;
use kanban_board::Session;

#[derive(Parser)]
#[command(name = "kanban-board", about = "In-memory kanban board with drag-and-drop reordering")]
struct Cli {
    /// Board TOML file (defaults to the built-in hiring pipeline)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Start with the connectivity flag cleared
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the starting board
    Show,
    /// Apply a script of board commands (reads stdin when no file is given)
    Run {
        /// Script file, one command per line
        script: Option<PathBuf>,
    },
    /// List the script commands
    Commands,
}

fn main() {
    // Install color_eyre for unexpected panics/errors (developer bugs).
    let _ = color_eyre::install();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Show => load_session(cli.config.as_deref(), cli.offline).map(|session| {
            print!("{}", session.board());
        }),
        Command::Run { script } => cmd_run(cli.config.as_deref(), cli.offline, script.as_deref()),
        Command::Commands => {
            for info in COMMANDS {
                println!("{:<10} {}", info.name, info.usage);
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        print_user_error(&e);
        std::process::exit(1);
    }
}

/// Print a user-friendly error message, with actionable hints for known error types.
fn print_user_error(error: &color_eyre::Report) {
    if let Some(config_err) = error.downcast_ref::<ConfigError>() {
        match config_err {
            ConfigError::Io { path, source } => {
                eprintln!("error: cannot read board config {}.", path.display());
                eprintln!("  {source}");
            }
            ConfigError::TomlDe(e) => {
                eprintln!("error: board config has invalid TOML syntax.");
                eprintln!("  {e}");
            }
            ConfigError::DuplicateColumn(id) => {
                eprintln!("error: column id {id:?} is used more than once.");
            }
            ConfigError::DuplicateTask(id) => {
                eprintln!("error: task id {id:?} is used more than once.");
            }
            ConfigError::NoticeTooLong(secs) => {
                eprintln!("error: notice_secs = {secs} is too long.");
                eprintln!("  Use a value of at most {} seconds.", config::MAX_NOTICE_SECS);
            }
        }
        return;
    }

    if let Some(cmd_err) = error.root_cause().downcast_ref::<CommandError>() {
        eprintln!("error: {error}");
        eprintln!("  {cmd_err}");
        eprintln!("  Run `kanban-board commands` to list valid commands.");
        return;
    }

    eprintln!("error: {e:#}", e = error);
}

fn load_session(config_path: Option<&Path>, offline: bool) -> color_eyre::Result<Session> {
    let config = match config_path {
        Some(path) => config::load_config(path)?,
        None => BoardConfig::default(),
    };
    let mut session = Session::from_config(&config)?;
    if offline {
        session.store.set_online(false);
    }
    tracing::debug!(
        columns = session.board().column_order.len(),
        tasks = session.board().task_count(),
        online = session.is_online(),
        "board loaded"
    );
    Ok(session)
}

fn cmd_run(config_path: Option<&Path>, offline: bool, script: Option<&Path>) -> color_eyre::Result<()> {
    let mut session = load_session(config_path, offline)?;
    session.on_completion(TerminalBell::new(io::stdout()));

    let reader: Box<dyn BufRead> = match script {
        Some(path) => Box::new(BufReader::new(
            fs::File::open(path).wrap_err_with(|| format!("cannot open script {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let Some(step) = command::parse_line(&line).wrap_err_with(|| format!("line {}", n + 1))? else {
            continue;
        };
        if let Some(output) = command::execute_step(&mut session, step) {
            println!("{output}");
        }
    }
    Ok(())
}
