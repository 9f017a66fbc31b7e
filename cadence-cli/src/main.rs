use anyhow::{bail, Context, Result};
use cadence_core::fixtures::demo_tasks;
use cadence_core::store::{
    MemoryActivityStore, MemoryPreferencesStore, MemoryTaskStore, PreferencesStore, TaskFilter, TaskStore,
};
use cadence_core::time::{local_wall_clock, parse_local, weekday_name};
use cadence_core::{
    DayHours, ItemKind, PatternRecognizer, PlanMode, Schedule, SchedulerError, SchedulerKernel, Task,
    UserPreferences,
};
use cadence_ingest::{parse_activity_csv, parse_time_log, ImportReport};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod calendar;
mod config;
mod state;

use config::Config;
use state::{JsonPreferencesStore, JsonTaskStore, JsonlActivityStore, ModelSnapshot};

#[derive(Parser, Debug)]
#[command(
    name = "cadence",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CADENCE_BUILD_SHA"), ")"),
    about = "Cadence: a daily planner that learns when you work best"
)]
struct Cli {
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log scheduler decisions (debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write ~/.cadence/config.toml and preferences.json
    Init {
        /// First work hour (0-23)
        #[arg(long, default_value_t = 9)]
        start: u32,

        /// Last work hour (exclusive, 1-24)
        #[arg(long, default_value_t = 17)]
        end: u32,

        /// IANA timezone
        #[arg(long, default_value = "America/Chicago")]
        timezone: String,

        /// Location for weather-aware planning
        #[arg(long)]
        location: Option<String>,

        /// Overwrite existing preferences
        #[arg(long)]
        force: bool,
    },

    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Plan a day from the stored open tasks
    Plan {
        /// Target date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Short break after each task, long break every Nth
        #[arg(long)]
        intelligent: bool,

        /// Print the schedule as JSON
        #[arg(long)]
        json: bool,

        /// Store the planned dates back on the tasks
        #[arg(long)]
        apply: bool,

        /// Also write an ICS file
        #[arg(long)]
        ics: Option<PathBuf>,
    },

    /// Mark a task done and teach the models
    Done {
        task_id: String,

        /// Minutes actually spent
        #[arg(long)]
        minutes: Option<i32>,

        /// Productivity 0-5
        #[arg(long, default_value_t = 3.0)]
        score: f64,

        /// Finish time "YYYY-MM-DD HH:MM" (local); defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Push a task off its planned day
    Postpone { task_id: String },

    /// Activity history
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Predicted minutes for a task title
    Predict {
        title: String,

        #[arg(long, default_value = "")]
        category: String,
    },

    /// Plan a day of random demo tasks (nothing is stored)
    Demo {
        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value_t = 12)]
        count: usize,

        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// Add a task
    Add {
        title: String,

        /// 1-5, 5 highest
        #[arg(long, default_value_t = 3)]
        priority: u8,

        /// 1-5
        #[arg(long, default_value_t = 3)]
        difficulty: u8,

        /// Estimated minutes
        #[arg(long)]
        minutes: Option<i32>,

        #[arg(long, default_value = "")]
        category: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
    },

    /// List tasks
    List {
        /// Include completed tasks
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// Append activities from a CSV export or a time-tracker log
    Import {
        #[arg(long, conflicts_with = "log")]
        csv: Option<PathBuf>,

        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Rebuild the models from history and print what was learned
    Analyze,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("cadence error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let home = state::ensure_cadence_home()?;
    let cfg = config::load_config(&home)?;
    init_tracing(cli.quiet, cli.verbose, &cfg.logging.level)?;

    match cli.command {
        Command::Init {
            start,
            end,
            timezone,
            location,
            force,
        } => init(&home, start, end, timezone, location, force)?,

        Command::Task { command } => match command {
            TaskCommand::Add {
                title,
                priority,
                difficulty,
                minutes,
                category,
                due,
            } => {
                if !(1..=5).contains(&priority) || !(1..=5).contains(&difficulty) {
                    return Err(SchedulerError::InvalidInput(format!(
                        "priority and difficulty must be between 1 and 5 (got {priority}, {difficulty})"
                    ))
                    .into());
                }
                let store = JsonTaskStore::new(&home);
                let mut task = Task::new(store.next_id()?, title)
                    .with_priority(priority)
                    .with_difficulty(difficulty)
                    .with_duration(minutes.unwrap_or(0))
                    .with_category(category);
                if let Some(due) = due {
                    task = task.with_due(due);
                }
                println!("Added {} {}", task.id, task.title);
                store.update(task)?;
            }
            TaskCommand::List { all } => {
                let filter = if all { TaskFilter::all() } else { TaskFilter::open() };
                for t in JsonTaskStore::new(&home).list(&filter)? {
                    print_task(&t);
                }
            }
        },

        Command::Plan {
            date,
            intelligent,
            json,
            apply,
            ics,
        } => plan(&home, &cfg, date, intelligent, json, apply, ics).await?,

        Command::Done {
            task_id,
            minutes,
            score,
            at,
        } => {
            let kernel = open_kernel(&home, &cfg)?;
            let when = match at {
                Some(s) => parse_local(&s)?,
                None => now_local(&home)?,
            };
            let task = kernel.record_completion(&task_id, when, minutes, score)?;
            save_models(&home, &kernel)?;
            println!("Done: {} {}", task.id, task.title);
        }

        Command::Postpone { task_id } => {
            let kernel = open_kernel(&home, &cfg)?;
            let task = kernel.record_postponement(&task_id)?;
            save_models(&home, &kernel)?;
            let rate = kernel
                .habits()
                .task_success_rate(&task.title)
                .map(|r| format!("{:.0}%", r * 100.0))
                .unwrap_or_else(|| "unknown".to_string());
            println!("Postponed: {} {} (success rate {rate})", task.id, task.title);
        }

        Command::History { command } => match command {
            HistoryCommand::Import { csv, log } => {
                let report = match (csv, log) {
                    (Some(path), None) => parse_activity_csv(&path)?,
                    (None, Some(path)) => {
                        let text = std::fs::read_to_string(&path)
                            .with_context(|| format!("read {}", path.display()))?;
                        parse_time_log(&text)?
                    }
                    _ => bail!("pass exactly one of --csv <file> or --log <file>"),
                };
                import(&home, &cfg, report)?;
            }
            HistoryCommand::Analyze => analyze(&home, &cfg)?,
        },

        Command::Predict { title, category } => {
            let kernel = open_kernel(&home, &cfg)?;
            kernel.refresh_patterns()?;
            let minutes = kernel.predict_duration(&title, &category);
            println!("{title}: ~{minutes:.0} min");
            if let Some(desc) = kernel.patterns().pattern_description(&title) {
                println!("Pattern: {desc}");
            }
            if let Some(next) = kernel.patterns().predict_next_occurrence(&title, now_local(&home)?) {
                println!("Next expected: {}", next.format("%Y-%m-%d %H:%M"));
            }
        }

        Command::Demo { seed, count, date } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let mut rng = StdRng::seed_from_u64(seed);
            let tasks = demo_tasks(&mut rng, date, count);
            let kernel = SchedulerKernel::new(
                Arc::new(MemoryTaskStore::with_tasks(tasks)),
                Arc::new(MemoryPreferencesStore::new(Some(UserPreferences::default()))),
                Arc::new(MemoryActivityStore::new()),
            )
            .with_weights(cfg.weights.clone())
            .with_config(cfg.scheduler.clone());
            let now = date.and_hms_opt(8, 0, 0).context("demo start time")?;
            let outcome = kernel.plan_day(date, now)?;
            print_schedule(&outcome.schedule);
        }
    }

    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool, configured: &str) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        configured
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("CADENCE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn init(
    home: &Path,
    start: u32,
    end: u32,
    timezone: String,
    location: Option<String>,
    force: bool,
) -> Result<()> {
    if config::init_config(home)? {
        println!("Wrote {}", config::config_path(home).display());
    } else {
        println!("Config already exists: {}", config::config_path(home).display());
    }

    timezone
        .parse::<chrono_tz::Tz>()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {timezone}"))?;
    if start >= end || end > 24 {
        bail!("work hours must satisfy start < end <= 24 (got {start}-{end})");
    }

    let prefs_path = state::preferences_path(home);
    if prefs_path.exists() && !force {
        println!("Preferences already exist: {} (use --force to overwrite)", prefs_path.display());
        return Ok(());
    }
    let prefs = UserPreferences {
        work_hours: DayHours::new(start, end),
        timezone,
        location,
        ..UserPreferences::default()
    };
    state::write_preferences(home, &prefs)?;
    println!("Wrote {}", prefs_path.display());
    Ok(())
}

/// Kernel over the on-disk stores and the saved model snapshot.
fn open_kernel(home: &Path, cfg: &Config) -> Result<SchedulerKernel> {
    let (habits, performance) = state::read_models(home, cfg.weights.neutral_seed)?.into_models();
    Ok(SchedulerKernel::new(
        Arc::new(JsonTaskStore::new(home)),
        Arc::new(JsonPreferencesStore::new(home)),
        Arc::new(JsonlActivityStore::new(home)),
    )
    .with_models(
        Arc::new(habits),
        Arc::new(performance),
        Arc::new(PatternRecognizer::new()),
    )
    .with_weights(cfg.weights.clone())
    .with_config(cfg.scheduler.clone()))
}

fn save_models(home: &Path, kernel: &SchedulerKernel) -> Result<()> {
    state::write_models(home, &ModelSnapshot::capture(kernel.habits(), kernel.performance()))
}

/// Wall clock in the user's timezone (UTC when no preferences exist yet).
fn now_local(home: &Path) -> Result<NaiveDateTime> {
    local_wall_clock(Utc::now(), &user_timezone(home)?)
}

fn user_timezone(home: &Path) -> Result<String> {
    Ok(JsonPreferencesStore::new(home)
        .get()?
        .map(|p| p.timezone)
        .unwrap_or_else(|| "UTC".to_string()))
}

async fn plan(
    home: &Path,
    cfg: &Config,
    date: Option<NaiveDate>,
    intelligent: bool,
    json: bool,
    apply: bool,
    ics: Option<PathBuf>,
) -> Result<()> {
    let kernel = open_kernel(home, cfg)?;
    let now = now_local(home)?;
    let date = date.unwrap_or(now.date());
    let mode = if intelligent { PlanMode::Intelligent } else { PlanMode::Standard };

    let outcome = match kernel.plan(date, now, mode) {
        Err(SchedulerError::MissingPreferences) => {
            bail!("no preferences found. Run: cadence init")
        }
        other => other?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.schedule)?);
    } else {
        print_schedule(&outcome.schedule);
    }

    if apply {
        let applied = kernel.apply_updates(&outcome.task_updates)?;
        println!("Updated {applied} task(s)");
    }

    // Persist and export off the async runtime, concurrently.
    let schedule = Arc::new(outcome.schedule);
    let save = {
        let home = home.to_path_buf();
        let schedule = Arc::clone(&schedule);
        tokio::task::spawn_blocking(move || state::write_schedule(&home, &schedule))
    };
    let export = {
        let schedule = Arc::clone(&schedule);
        let tz = user_timezone(home)?;
        tokio::task::spawn_blocking(move || -> Result<Option<PathBuf>> {
            let Some(path) = ics else {
                return Ok(None);
            };
            let events = calendar::schedule_to_events(&schedule, &tz)?;
            std::fs::write(&path, calendar::events_to_ics(&events))
                .with_context(|| format!("write {}", path.display()))?;
            Ok(Some(path))
        })
    };

    let (saved, exported) = tokio::try_join!(save, export).context("joining persistence tasks")?;
    let saved = saved?;
    tracing::debug!(path = %saved.display(), "plan: schedule saved");
    if let Some(path) = exported? {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn import(home: &Path, cfg: &Config, report: ImportReport) -> Result<()> {
    let store = JsonlActivityStore::new(home);
    store.append_all(&report.activities)?;
    println!(
        "Imported {} activities ({} skipped)",
        report.activities.len(),
        report.skipped
    );
    analyze(home, cfg)
}

fn analyze(home: &Path, cfg: &Config) -> Result<()> {
    let kernel = open_kernel(home, cfg)?;
    let patterns = kernel.analyze_history()?;
    save_models(home, &kernel)?;

    let habits = kernel.habits();
    println!(
        "Most productive hour: {:02}:00",
        habits.most_productive_hour()
    );
    println!(
        "Most productive day: {}",
        weekday_name(habits.most_productive_day())
    );
    if patterns.is_empty() {
        println!("No recurring tasks yet");
    }
    for p in &patterns {
        println!("- {}: {}", p.title, p);
    }
    Ok(())
}

fn print_task(t: &Task) {
    let due = t
        .due_date
        .map(|d| format!(" due {d}"))
        .unwrap_or_default();
    let minutes = t
        .estimate()
        .map(|m| format!(" {m}m"))
        .unwrap_or_default();
    let done = if t.completed { " [done]" } else { "" };
    println!(
        "{:<5} P{} D{}{}{} {}{}",
        t.id, t.priority, t.difficulty, minutes, due, t.title, done
    );
}

fn print_schedule(schedule: &Schedule) {
    println!("# Plan for {}\n", schedule.date);
    if schedule.is_empty() {
        println!("(nothing to schedule)");
        return;
    }
    for item in &schedule.items {
        let tag = match item.kind {
            ItemKind::Task { .. } => "",
            ItemKind::Break => " (break)",
            ItemKind::Meal => " (meal)",
        };
        println!(
            "{}-{}  {}{}",
            item.start.format("%H:%M"),
            item.end.format("%H:%M"),
            item.title,
            tag
        );
    }
    println!(
        "\n{} task minutes, productivity {:.0}/100{}",
        schedule.task_minutes(),
        schedule.productivity_score,
        if schedule.is_overloaded() { ", OVERLOADED" } else { "" }
    );
}
