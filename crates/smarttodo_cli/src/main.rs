//! `smarttodo` command-line front end.
//!
//! # Responsibility
//! - Drive the same view-model, reminder and settings layers as the mobile shell.
//! - Await launched work before exiting so every command is durable.

use anyhow::{bail, Context as _};
use chrono::{Local, NaiveDateTime, TimeZone as _};
use clap::{Parser, Subcommand, ValueEnum};
use smarttodo_core::config::{DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
use smarttodo_core::reminder::notification::{snooze_label, SnoozeOption};
use smarttodo_core::reminder::receiver::{
    ACTION_COMPLETE, ACTION_SNOOZE, EXTRA_SNOOZE_DURATION, EXTRA_TASK_ID,
};
use smarttodo_core::{
    init_logging, into_shared, now_epoch_ms, open_db, ActionOutcome, AppConfig,
    NotificationActionReceiver, Priority, SettingsService, Task, TaskFilter, TaskForm, TaskId,
    TaskQuery, TaskRow, TaskService, TaskViewModel, ThemeMode, TokioReminderScheduler,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

const DUE_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Parser)]
#[command(name = "smarttodo", version, about = "Local to-do list with reminders")]
struct Cli {
    /// SQLite database file
    #[arg(long = "db", env = DB_PATH_ENV, global = true)]
    db_path: Option<PathBuf>,

    /// Absolute directory for rolling log files
    #[arg(long = "log-dir", env = LOG_DIR_ENV, global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long = "log-level", env = LOG_LEVEL_ENV, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Add(AddArgs),
    #[command(alias = "ls")]
    List(ListArgs),
    Search(SearchArgs),
    Toggle(IdArg),
    Edit(EditArgs),
    #[command(alias = "rm")]
    Delete(DeleteArgs),
    Duplicate(IdArg),
    /// Delete every completed task
    ClearCompleted(ConfirmArg),
    /// Delete every task
    ClearAll(ConfirmArg),
    /// Apply a reminder action as if tapped on the notification
    Notify(NotifyArgs),
    /// List snooze presets
    SnoozeOptions,
    Theme(ThemeArgs),
    /// Restore reminders and print them as they fire, until Ctrl-C
    Watch,
}

#[derive(Debug, Parser)]
struct AddArgs {
    title: String,
    #[arg(short = 'd', long = "description", default_value = "")]
    description: String,
    #[arg(short = 'p', long = "priority", default_value = "medium", value_parser = parse_priority)]
    priority: Priority,
    /// Local time, `YYYY-MM-DD HH:MM`
    #[arg(long = "due", value_parser = parse_due)]
    due: Option<i64>,
    /// Post a reminder at the due time
    #[arg(short = 'r', long = "remind")]
    remind: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Active,
    Completed,
}

impl From<FilterArg> for TaskFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::All => TaskFilter::All,
            FilterArg::Active => TaskFilter::Incomplete,
            FilterArg::Completed => TaskFilter::Completed,
        }
    }
}

#[derive(Debug, Parser)]
struct ListArgs {
    #[arg(short = 'f', long = "filter", value_enum, default_value = "all")]
    filter: FilterArg,
    #[arg(long = "json")]
    json: bool,
}

#[derive(Debug, Parser)]
struct SearchArgs {
    text: String,
    #[arg(long = "json")]
    json: bool,
}

#[derive(Debug, Parser)]
struct IdArg {
    id: TaskId,
}

#[derive(Debug, Parser)]
struct EditArgs {
    id: TaskId,
    #[arg(short = 't', long = "title")]
    title: Option<String>,
    #[arg(short = 'd', long = "description")]
    description: Option<String>,
    #[arg(short = 'p', long = "priority", value_parser = parse_priority)]
    priority: Option<Priority>,
    #[arg(long = "due", value_parser = parse_due, conflicts_with = "clear_due")]
    due: Option<i64>,
    #[arg(long = "clear-due")]
    clear_due: bool,
    #[arg(long = "remind", conflicts_with = "no_remind")]
    remind: bool,
    #[arg(long = "no-remind")]
    no_remind: bool,
}

#[derive(Debug, Parser)]
struct DeleteArgs {
    id: TaskId,
    #[arg(short = 'y', long = "yes")]
    yes: bool,
}

#[derive(Debug, Parser)]
struct ConfirmArg {
    /// Skip the confirmation prompt
    #[arg(short = 'y', long = "yes")]
    yes: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NotifyAction {
    Complete,
    Snooze,
}

#[derive(Debug, Parser)]
struct NotifyArgs {
    #[arg(value_enum)]
    action: NotifyAction,
    id: TaskId,
    /// Snooze length; defaults to the five minute preset
    #[arg(short = 'm', long = "minutes")]
    minutes: Option<u64>,
}

#[derive(Debug, Parser)]
struct ThemeArgs {
    /// Flip between light and dark
    #[arg(long = "toggle")]
    toggle: bool,
}

struct App {
    view_model: TaskViewModel,
    settings: SettingsService,
    receiver: NotificationActionReceiver,
    scheduler: Arc<TokioReminderScheduler>,
}

impl App {
    fn service(&self) -> &TaskService {
        self.view_model.service()
    }

    async fn require_task(&self, id: TaskId) -> anyhow::Result<Task> {
        self.service()
            .get_task(id)
            .await?
            .with_context(|| format!("task not found: {id}"))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli);
    if let Err(err) = init_logging(
        config.log_level.as_str(),
        &config.log_dir.to_string_lossy(),
    ) {
        eprintln!("warning: file logging disabled: {err}");
    }

    let app = open_app(&config.db_path)?;
    match cli.cmd {
        Commands::Add(args) => add(&app, args).await,
        Commands::List(args) => {
            let query = match TaskFilter::from(args.filter) {
                TaskFilter::All => TaskQuery::All,
                TaskFilter::Incomplete => TaskQuery::Incomplete,
                TaskFilter::Completed => TaskQuery::Completed,
            };
            print_tasks(&app.service().list_snapshot(query).await?, args.json)
        }
        Commands::Search(args) => {
            let found = app
                .service()
                .list_snapshot(TaskQuery::Search(args.text))
                .await?;
            print_tasks(&found, args.json)
        }
        Commands::Toggle(IdArg { id }) => {
            let task = app.require_task(id).await?;
            app.view_model.toggle_completion(task).await?;
            let now_done = app.require_task(id).await?.is_completed;
            println!("#{id} {}", if now_done { "completed" } else { "reopened" });
            Ok(())
        }
        Commands::Edit(args) => edit(&app, args).await,
        Commands::Delete(args) => {
            let task = app.require_task(args.id).await?;
            if !args.yes && !confirm(&format!("Delete \"{}\"?", task.title))? {
                println!("aborted");
                return Ok(());
            }
            app.view_model.delete(task).await?;
            println!("deleted #{}", args.id);
            Ok(())
        }
        Commands::Duplicate(IdArg { id }) => {
            let task = app.require_task(id).await?;
            app.view_model.duplicate(task).await?;
            println!("duplicated #{id}");
            Ok(())
        }
        Commands::ClearCompleted(ConfirmArg { yes }) => {
            let count = app.service().count_completed().await?;
            if !yes && !confirm(&format!("Delete {count} completed task(s)?"))? {
                println!("aborted");
                return Ok(());
            }
            app.view_model.delete_completed().await?;
            println!("deleted {count} completed task(s)");
            Ok(())
        }
        Commands::ClearAll(ConfirmArg { yes }) => {
            let count = app.service().count().await?;
            if !yes && !confirm(&format!("Delete all {count} task(s)?"))? {
                println!("aborted");
                return Ok(());
            }
            app.view_model.delete_all().await?;
            println!("deleted {count} task(s)");
            Ok(())
        }
        Commands::Notify(args) => notify(&app, args).await,
        Commands::SnoozeOptions => {
            for option in SnoozeOption::ALL {
                println!("{:>6} min  {}", option.duration().as_secs() / 60, option.label());
            }
            Ok(())
        }
        Commands::Theme(ThemeArgs { toggle }) => {
            let mode: ThemeMode = if toggle {
                app.settings.toggle_theme()?
            } else {
                app.settings.theme_mode()?
            };
            println!("{}", mode.as_str());
            Ok(())
        }
        Commands::Watch => watch(&app).await,
    }
}

/// Wires the core layers over the database at `db_path`.
///
/// Must run inside the tokio runtime.
fn open_app(db_path: &Path) -> anyhow::Result<App> {
    let conn =
        open_db(db_path).with_context(|| format!("failed to open {}", db_path.display()))?;
    log::info!(
        "event=cli_open module=cli status=ok db_path={}",
        db_path.display()
    );
    let shared = into_shared(conn);
    let service = TaskService::new(shared.clone())?;
    let scheduler = Arc::new(TokioReminderScheduler::new(Handle::current()));
    Ok(App {
        view_model: TaskViewModel::new(service.clone(), scheduler.clone()),
        settings: SettingsService::new(shared),
        receiver: NotificationActionReceiver::new(service, scheduler.clone()),
        scheduler,
    })
}

fn resolve_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::from_env();
    if let Some(path) = &cli.db_path {
        config.db_path = path.clone();
    }
    if let Some(dir) = cli.log_dir.as_ref().filter(|dir| dir.is_absolute()) {
        config.log_dir = dir.clone();
    }
    if let Some(level) = cli
        .log_level
        .as_deref()
        .and_then(smarttodo_core::LogLevel::parse)
    {
        config.log_level = level;
    }
    config
}

async fn add(app: &App, args: AddArgs) -> anyhow::Result<()> {
    if args.remind && args.due.is_none() {
        bail!("--remind needs --due");
    }
    let form = TaskForm {
        title: args.title,
        description: args.description,
        priority: args.priority,
        due_at: args.due,
        has_reminder: args.remind,
    };
    let task = form.into_new_task(now_epoch_ms())?;
    let before = app.service().count().await?;
    app.view_model.insert(task).await?;
    if app.service().count().await? == before {
        bail!("task was not saved; see the log for details");
    }
    println!("added");
    Ok(())
}

async fn edit(app: &App, args: EditArgs) -> anyhow::Result<()> {
    let existing = app.require_task(args.id).await?;
    let mut form = TaskForm::from_task(&existing);
    if let Some(title) = args.title {
        form.title = title;
    }
    if let Some(description) = args.description {
        form.description = description;
    }
    if let Some(priority) = args.priority {
        form.priority = priority;
    }
    if args.clear_due {
        form.due_at = None;
    } else if args.due.is_some() {
        form.due_at = args.due;
    }
    if args.remind {
        form.has_reminder = true;
    } else if args.no_remind {
        form.has_reminder = false;
    }

    let edited = form.apply_to(&existing)?;
    app.view_model.update(edited).await?;
    println!("updated #{}", args.id);
    Ok(())
}

async fn notify(app: &App, args: NotifyArgs) -> anyhow::Result<()> {
    let mut extras = HashMap::from([(EXTRA_TASK_ID.to_string(), args.id)]);
    let action = match args.action {
        NotifyAction::Complete => ACTION_COMPLETE,
        NotifyAction::Snooze => {
            if let Some(minutes) = args.minutes {
                let millis = i64::try_from(minutes.saturating_mul(60_000))
                    .context("snooze duration too large")?;
                extras.insert(EXTRA_SNOOZE_DURATION.to_string(), millis);
            }
            ACTION_SNOOZE
        }
    };

    match app.receiver.on_receive(action, &extras).await? {
        Some(outcome) => {
            println!("{}", serde_json::to_string(&outcome)?);
            if let ActionOutcome::Snoozed { trigger_at, .. } = outcome {
                let label = snooze_label(Duration::from_secs(args.minutes.unwrap_or(5) * 60));
                println!(
                    "snoozed ({label}) until {}; `smarttodo watch` delivers it",
                    format_local(trigger_at)
                );
            }
            Ok(())
        }
        None => bail!("notification action rejected"),
    }
}

async fn watch(app: &App) -> anyhow::Result<()> {
    let mut fired = app.scheduler.subscribe();
    app.view_model.restore_reminders().await?;
    println!(
        "watching {} reminder(s); Ctrl-C to stop",
        app.scheduler.pending_count()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = fired.recv() => match received {
                Ok(notification) => {
                    println!(
                        "[{}] {} {}",
                        notification.notification_id, notification.title, notification.text
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    eprintln!("warning: skipped {skipped} reminder(s)");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }
    Ok(())
}

fn print_tasks(tasks: &[Task], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(tasks)?);
        return Ok(());
    }
    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }

    let now = now_epoch_ms();
    for task in tasks {
        let row = TaskRow::render(task, now);
        let mut line = format!(
            "[{}] #{:<4} {:<6} {}",
            if row.is_completed { "x" } else { " " },
            task.id.unwrap_or_default(),
            task.priority.display_name(),
            row.title
        );
        if let Some(due) = &row.due_text {
            line.push_str("  ");
            line.push_str(due);
            if row.is_overdue {
                line.push_str(" (overdue)");
            }
        }
        println!("{line}");
        if let Some(description) = &row.description {
            println!("           {description}");
        }
    }
    Ok(())
}

fn format_local(epoch_ms: i64) -> String {
    Local
        .timestamp_millis_opt(epoch_ms)
        .single()
        .map_or_else(|| epoch_ms.to_string(), |time| time.format(DUE_INPUT_FORMAT).to_string())
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} (y/N): ");
    std::io::Write::flush(&mut std::io::stdout())?;
    let mut input = String::new();
    let _ = std::io::stdin().read_line(&mut input)?;
    let resp = input.trim().to_lowercase();
    Ok(resp == "y" || resp == "yes")
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    Priority::parse(value).ok_or_else(|| format!("expected low|medium|high, got `{value}`"))
}

fn parse_due(value: &str) -> Result<i64, String> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), DUE_INPUT_FORMAT)
        .map_err(|err| format!("expected `YYYY-MM-DD HH:MM`: {err}"))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|time| time.timestamp_millis())
        .ok_or_else(|| format!("`{value}` does not exist in the local time zone"))
}

#[cfg(test)]
mod tests {
    use super::{
        notify, open_app, parse_due, parse_priority, Cli, Commands, NotifyAction, NotifyArgs,
    };
    use clap::Parser;
    use smarttodo_core::{now_epoch_ms, Priority, Task};

    #[tokio::test]
    async fn snooze_from_one_run_is_delivered_by_the_next() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("smarttodo.sqlite3");

        let id = {
            let app = open_app(&db_path).unwrap();
            let mut task = Task::new("renew passport");
            task.due_at = Some(now_epoch_ms() - 60_000);
            task.has_reminder = true;
            let id = app.service().insert(task).await.unwrap();
            notify(
                &app,
                NotifyArgs {
                    action: NotifyAction::Snooze,
                    id,
                    minutes: Some(15),
                },
            )
            .await
            .unwrap();
            id
        };

        let next_run = open_app(&db_path).unwrap();
        next_run.view_model.restore_reminders().await.unwrap();
        let trigger = next_run
            .scheduler
            .pending_trigger(id)
            .expect("snooze restored");
        assert!(trigger > now_epoch_ms() + 14 * 60_000);
    }

    #[test]
    fn priority_flag_accepts_short_forms() {
        assert_eq!(parse_priority("H"), Ok(Priority::High));
        assert!(parse_priority("urgent").is_err());
    }

    #[test]
    fn due_flag_requires_date_and_time() {
        assert!(parse_due("2025-01-31 09:15").is_ok());
        assert!(parse_due("tomorrow").is_err());
    }

    #[test]
    fn add_command_parses_flags() {
        let cli = Cli::try_parse_from([
            "smarttodo", "add", "pay rent", "-p", "high", "--due", "2025-02-01 08:00", "--remind",
        ])
        .expect("valid command line");
        match cli.cmd {
            Commands::Add(args) => {
                assert_eq!(args.title, "pay rent");
                assert_eq!(args.priority, Priority::High);
                assert!(args.due.is_some());
                assert!(args.remind);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
