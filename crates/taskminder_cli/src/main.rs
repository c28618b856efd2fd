//! TaskMinder command-line front-end.
//!
//! # Responsibility
//! - Turn subcommands into coordinator intents over the on-disk database.
//! - Run the delivery loop (`watch`) that fires due reminders.
//!
//! # Invariants
//! - Every invocation loads and reconciles before applying its intent.
//! - Failures print to stderr and exit non-zero; nothing panics.

use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use taskminder_core::db::open_db;
use taskminder_core::{
    core_version, default_log_level, init_logging, run_delivery_loop, Clock, DeliverySink,
    NotificationHandlerConfig, Presentation, Priority, SqliteNotificationBackend,
    SqliteTaskStore, SystemClock, Task, TaskCoordinator,
};

const DB_FILE_NAME: &str = "taskminder.sqlite3";
const LOG_DIR_NAME: &str = "logs";

type Coordinator = TaskCoordinator<SqliteTaskStore, SqliteNotificationBackend>;

#[derive(Parser, Debug)]
#[command(name = "taskminder", version, about = "Personal task list with reminders")]
struct Cli {
    /// Directory holding the database and logs.
    #[arg(long, env = "TASKMINDER_DATA_DIR", default_value = ".taskminder")]
    data_dir: PathBuf,

    /// trace|debug|info|warn|error
    #[arg(long, env = "TASKMINDER_LOG")]
    log_level: Option<String>,

    /// Deliver reminders without the terminal bell.
    #[arg(long)]
    no_sound: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a task and schedule its reminders.
    Add {
        text: String,
        #[arg(short, long, default_value = "medium", value_parser = parse_priority)]
        priority: Priority,
    },
    /// List tasks, newest first.
    List,
    /// Complete a pending task or reopen a completed one.
    Toggle { id: String },
    /// Delete a task and cancel its reminders.
    Delete { id: String },
    /// Replace a task's text.
    Edit { id: String, text: String },
    /// Change a task's priority.
    Priority {
        id: String,
        #[arg(value_parser = parse_priority)]
        priority: Priority,
    },
    /// Remove all completed tasks.
    ClearCompleted,
    /// Show task counters.
    Stats,
    /// Write the collection as an export envelope.
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the collection from an export envelope.
    Import { file: PathBuf },
    /// List pending reminders.
    Pending,
    /// Apply a notification action (COMPLETE_TASK, SNOOZE_TASK) to a task.
    Respond { action: String, id: String },
    /// Deliver reminders as they come due until Ctrl-C.
    Watch {
        #[arg(long, env = "TASKMINDER_POLL_INTERVAL_MS", default_value_t = 1000)]
        poll_interval_ms: u64,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Add { .. } => "add",
            Command::List => "list",
            Command::Toggle { .. } => "toggle",
            Command::Delete { .. } => "delete",
            Command::Edit { .. } => "edit",
            Command::Priority { .. } => "priority",
            Command::ClearCompleted => "clear-completed",
            Command::Stats => "stats",
            Command::Export { .. } => "export",
            Command::Import { .. } => "import",
            Command::Pending => "pending",
            Command::Respond { .. } => "respond",
            Command::Watch { .. } => "watch",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let data_dir = absolute_dir(&cli.data_dir)?;
    std::fs::create_dir_all(&data_dir)
        .map_err(|err| format!("cannot create `{}`: {err}", data_dir.display()))?;

    let log_dir = data_dir.join(LOG_DIR_NAME);
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, &log_dir.to_string_lossy())?;

    let db_path = data_dir.join(DB_FILE_NAME);
    let store = Arc::new(SqliteTaskStore::new(
        open_db(&db_path).map_err(|err| err.to_string())?,
    ));
    let backend = Arc::new(SqliteNotificationBackend::new(
        open_db(&db_path).map_err(|err| err.to_string())?,
    ));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let handler = NotificationHandlerConfig {
        play_sound: !cli.no_sound,
        ..NotificationHandlerConfig::default()
    };

    let coordinator = TaskCoordinator::new(store, Arc::clone(&backend), Arc::clone(&clock));
    coordinator.load().await;
    info!(
        "event=cli_command module=cli status=start command={} version={}",
        cli.command.name(),
        core_version()
    );

    match cli.command {
        Command::Add { text, priority } => {
            let task = coordinator
                .add_task(&text, priority)
                .await
                .map_err(|err| err.to_string())?;
            println!("added {}", format_task(&task));
        }
        Command::List => list_tasks(&coordinator).await,
        Command::Toggle { id } => {
            let task = coordinator
                .toggle_task(&id)
                .await
                .map_err(|err| err.to_string())?;
            let verb = if task.completed { "completed" } else { "reopened" };
            println!("{verb} {}", format_task(&task));
        }
        Command::Delete { id } => {
            let task = coordinator
                .delete_task(&id)
                .await
                .map_err(|err| err.to_string())?;
            println!("deleted {}", format_task(&task));
        }
        Command::Edit { id, text } => {
            let task = coordinator
                .edit_task(&id, &text)
                .await
                .map_err(|err| err.to_string())?;
            println!("edited {}", format_task(&task));
        }
        Command::Priority { id, priority } => {
            let task = coordinator
                .set_priority(&id, priority)
                .await
                .map_err(|err| err.to_string())?;
            println!("updated {}", format_task(&task));
        }
        Command::ClearCompleted => {
            let removed = coordinator
                .clear_completed()
                .await
                .map_err(|err| err.to_string())?;
            println!("removed {removed} completed task(s)");
        }
        Command::Stats => {
            let stats = coordinator.stats().await;
            println!(
                "{} pending ({} high priority), {} completed, {} total",
                stats.pending, stats.high_priority_pending, stats.completed, stats.total
            );
        }
        Command::Export { output } => {
            let exported = coordinator
                .export_tasks()
                .await
                .map_err(|err| err.to_string())?;
            match output {
                Some(path) => std::fs::write(&path, exported)
                    .map_err(|err| format!("cannot write `{}`: {err}", path.display()))?,
                None => println!("{exported}"),
            }
        }
        Command::Import { file } => {
            let data = std::fs::read_to_string(&file)
                .map_err(|err| format!("cannot read `{}`: {err}", file.display()))?;
            let tasks = coordinator
                .import_tasks(&data)
                .await
                .map_err(|err| err.to_string())?;
            println!("imported {} task(s)", tasks.len());
        }
        Command::Pending => {
            let pending = backend.list_pending().map_err(|err| err.to_string())?;
            let now_ms = clock.now_ms();
            for notification in &pending {
                println!(
                    "{}  in {}  {}",
                    notification.identifier,
                    format_delay(notification.fire_at - now_ms),
                    notification.content.title
                );
            }
            println!("{} pending reminder(s)", pending.len());
        }
        Command::Respond { action, id } => {
            let applied = coordinator
                .handle_notification_response(&action, &id)
                .await
                .map_err(|err| err.to_string())?;
            println!("applied {}", applied.as_str());
        }
        Command::Watch { poll_interval_ms } => {
            watch(&backend, clock.as_ref(), handler, poll_interval_ms).await;
        }
    }

    Ok(())
}

async fn list_tasks(coordinator: &Coordinator) {
    let tasks = coordinator.tasks().await;
    if tasks.is_empty() {
        println!("no tasks");
        return;
    }
    for task in &tasks {
        println!("{}", format_task(task));
    }
}

async fn watch(
    backend: &SqliteNotificationBackend,
    clock: &dyn Clock,
    handler: NotificationHandlerConfig,
    poll_interval_ms: u64,
) {
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let stop = async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    };

    println!("watching for due reminders; press Ctrl-C to stop");
    tokio::join!(
        run_delivery_loop(
            backend,
            clock,
            handler,
            &TerminalSink,
            Duration::from_millis(poll_interval_ms.max(1)),
            shutdown_rx,
        ),
        stop
    );
}

struct TerminalSink;

impl DeliverySink for TerminalSink {
    fn deliver(&self, presentation: &Presentation) {
        if !presentation.show_alert {
            return;
        }
        let bell = if presentation.play_sound { "\x07" } else { "" };
        let content = &presentation.notification.content;
        println!(
            "{bell}{}: {} [{}]",
            content.title, content.body, presentation.notification.identifier
        );
    }
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    Priority::parse(value)
        .ok_or_else(|| format!("unknown priority `{value}`; expected high|medium|low"))
}

fn absolute_dir(path: &Path) -> Result<PathBuf, String> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|err| format!("cannot resolve current directory: {err}"))
}

fn format_task(task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    format!("[{mark}] {}  {:<6}  {}", task.id, task.priority, task.text)
}

fn format_delay(delta_ms: i64) -> String {
    let total_secs = delta_ms.max(0) / 1000;
    format!("{}m {:02}s", total_secs / 60, total_secs % 60)
}
