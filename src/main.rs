mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Sender};
use std::thread;

use cli::{Cli, Commands, ConfigAction, OptionsAction, RangeArgs, TaskFields};
use consult_time::aggregate::{self, Analytics, Grouping};
use consult_time::calendar::{format_elapsed, DateRange};
use consult_time::config::{self, EffectiveConfig};
use consult_time::export;
use consult_time::heatmap::Heatmap;
use consult_time::options::{OptionKind, Options};
use consult_time::report;
use consult_time::stopwatch::StartOutcome;
use consult_time::ticker::Ticker;
use consult_time::{Database, NewTask, Task, TaskId, TaskPatch, TaskStore, Tracker};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Add { title, fields } => cmd_add(title, fields),
        Commands::Edit {
            id,
            title,
            fields,
            time_spent,
        } => cmd_edit(id, title, fields, time_spent),
        Commands::Delete { id } => cmd_delete(id),
        Commands::List => cmd_list(),
        Commands::Track { id } => cmd_track(id),
        Commands::Report { group, range, json } => cmd_report(group, range, json),
        Commands::Heatmap { range, json } => cmd_heatmap(range, json),
        Commands::Export { format, output } => cmd_export(format, output),
        Commands::Options { action } => match action {
            OptionsAction::List { kind } => cmd_options_list(kind),
            OptionsAction::Add { kind, key, label } => cmd_options_add(&kind, &key, &label),
            OptionsAction::Remove { kind, key } => cmd_options_remove(&kind, &key),
        },
        Commands::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Edit => cmd_config_edit(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

fn get_db(config: &EffectiveConfig) -> Result<Database> {
    Database::open(&config.database_path)
}

fn open_tracker() -> Result<(EffectiveConfig, Tracker)> {
    let config = EffectiveConfig::load()?;
    let store = TaskStore::open(get_db(&config)?).context("Failed to load tasks")?;
    Ok((config, Tracker::new(store)))
}

fn load_options(tracker: &Tracker) -> Result<Options> {
    Options::load(tracker.store().database()).context("Failed to load options")
}

fn cmd_add(title: String, fields: TaskFields) -> Result<()> {
    let (_, mut tracker) = open_tracker()?;
    let options = load_options(&tracker)?;

    let date = fields.date.as_deref().map(report::parse_date).transpose()?;

    let task = tracker.create_task(NewTask {
        title,
        category: fields.category.unwrap_or_else(|| "sap-ewm".to_string()),
        system: fields.system.unwrap_or_else(|| "dev".to_string()),
        task_type: fields.task_type.unwrap_or_else(|| "implementation".to_string()),
        description: fields.description,
        ticket_number: fields.ticket,
        project: fields.project,
        date,
        start_time: fields.start,
        end_time: fields.end,
    })?;

    warn_unknown_keys(&task, &options);
    println!("Added task {}: {}", task.id, task.title);
    Ok(())
}

fn cmd_edit(
    id: TaskId,
    title: Option<String>,
    fields: TaskFields,
    time_spent: Option<u64>,
) -> Result<()> {
    let (_, mut tracker) = open_tracker()?;
    let options = load_options(&tracker)?;

    let date = fields.date.as_deref().map(report::parse_date).transpose()?;

    let task = tracker.update_task(
        id,
        TaskPatch {
            title,
            category: fields.category,
            system: fields.system,
            task_type: fields.task_type,
            description: fields.description,
            ticket_number: fields.ticket,
            project: fields.project,
            date,
            start_time: fields.start,
            end_time: fields.end,
            time_spent,
        },
    )?;

    warn_unknown_keys(&task, &options);
    println!("Updated task {}: {}", task.id, task.title);
    Ok(())
}

fn cmd_delete(id: TaskId) -> Result<()> {
    let (_, mut tracker) = open_tracker()?;
    let task = tracker.delete_task(id)?;
    println!("Deleted task {}: {}", task.id, task.title);
    Ok(())
}

fn cmd_list() -> Result<()> {
    let (_, tracker) = open_tracker()?;
    let options = load_options(&tracker)?;

    if tracker.tasks().is_empty() {
        println!("No tasks logged yet.");
        return Ok(());
    }

    for task in tracker.tasks() {
        println!("  [{}] {}", task.id, task.title);
        println!(
            "      {} | {} | {} | {}",
            options.categories.label(&task.category),
            options.systems.label(&task.system),
            options.task_types.label(&task.task_type),
            task.date
        );
        println!(
            "      Duration: {}  Tracked: {}",
            export::task_duration(task),
            format_elapsed(task.time_spent)
        );
        if let Some(ref ticket) = task.ticket_number {
            println!("      Ticket: {}", ticket);
        }
        println!();
    }

    Ok(())
}

enum SessionEvent {
    Tick,
    Input(String),
    InputClosed,
}

fn spawn_ticker(tx: &Sender<SessionEvent>) -> Ticker {
    Ticker::every_second(tx.clone(), || SessionEvent::Tick)
}

fn cmd_track(id: TaskId) -> Result<()> {
    let (_, mut tracker) = open_tracker()?;
    let (tx, rx) = mpsc::channel();

    let input_tx = tx.clone();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if input_tx.send(SessionEvent::Input(line)).is_err() {
                return;
            }
        }
        let _ = input_tx.send(SessionEvent::InputClosed);
    });

    tracker.toggle(id)?;
    let mut ticker = Some(spawn_ticker(&tx));

    eprintln!(
        "Tracking '{}' from {}",
        tracker.task(id)?.title,
        format_elapsed(tracker.displayed_seconds(id)?)
    );
    eprintln!("Commands: p = pause/resume, s = save, t <id> = switch task, q = quit");

    while let Ok(event) = rx.recv() {
        match event {
            SessionEvent::Tick => {
                if let Some(elapsed) = tracker.tick() {
                    eprint!("\r  {} ", format_elapsed(elapsed));
                }
            }
            SessionEvent::Input(line) => {
                let line = line.trim();
                let (command, arg) = line.split_once(' ').unwrap_or((line, ""));

                match command {
                    "p" => {
                        let Some(active) = tracker.stopwatch().active_task() else {
                            continue;
                        };
                        match tracker.toggle(active)? {
                            StartOutcome::Paused { elapsed, .. } => {
                                ticker = None;
                                eprintln!("\nPaused at {}", format_elapsed(elapsed));
                            }
                            _ => {
                                ticker = Some(spawn_ticker(&tx));
                                eprintln!("\nResumed");
                            }
                        }
                    }
                    "s" => match tracker.commit()? {
                        Some(task) => eprintln!(
                            "\nSaved {} to '{}'",
                            format_elapsed(task.time_spent),
                            task.title
                        ),
                        None => eprintln!("\nNothing to save"),
                    },
                    "t" => {
                        let next: TaskId = match arg.trim().parse() {
                            Ok(next) => next,
                            Err(_) => {
                                eprintln!("\nUsage: t <task id>");
                                continue;
                            }
                        };
                        // Stop ticking before the active task changes
                        ticker = None;
                        match tracker.toggle(next) {
                            Ok(_) => {
                                let task = tracker.task(next)?;
                                eprintln!(
                                    "\nNow tracking '{}' from {}",
                                    task.title,
                                    format_elapsed(task.time_spent)
                                );
                            }
                            Err(err) => eprintln!("\n{}", err),
                        }
                        if tracker.stopwatch().is_running() {
                            ticker = Some(spawn_ticker(&tx));
                        }
                    }
                    "q" => break,
                    "" => {}
                    other => eprintln!("\nUnknown command: {}", other),
                }
            }
            SessionEvent::InputClosed => break,
        }
    }

    drop(ticker);
    report_unsaved(&tracker);
    Ok(())
}

fn report_unsaved(tracker: &Tracker) {
    let Some(timer) = tracker.stopwatch().active() else {
        return;
    };
    let saved = tracker
        .task(timer.task_id)
        .map(|t| t.time_spent)
        .unwrap_or(0);

    if timer.elapsed != saved {
        eprintln!(
            "\nDiscarded unsaved time: {} (saved value stays {})",
            format_elapsed(timer.elapsed),
            format_elapsed(saved)
        );
    } else {
        eprintln!();
    }
}

/// Tasks inside the requested window, with any that could not be dated
fn select_tasks<'a>(
    tracker: &'a Tracker,
    config: &EffectiveConfig,
    range: &RangeArgs,
) -> Result<(Option<DateRange>, Vec<&'a Task>, Vec<consult_time::SkippedRecord>)> {
    let window = report::resolve_range(
        range.range.as_deref(),
        range.from.as_deref(),
        range.to.as_deref(),
        &config.default_range,
    )?;

    match window {
        Some(window) => {
            let (tasks, skipped) = aggregate::filter_by_date(tracker.tasks(), &window);
            Ok((Some(window), tasks, skipped))
        }
        None => Ok((None, tracker.tasks().iter().collect(), Vec::new())),
    }
}

fn cmd_report(group: Option<String>, range: RangeArgs, json: bool) -> Result<()> {
    let (config, tracker) = open_tracker()?;
    let options = load_options(&tracker)?;
    let (window, tasks, mut skipped) = select_tasks(&tracker, &config, &range)?;

    let output = match group.as_deref() {
        None | Some("all") => {
            let mut analytics = Analytics::compute(&tasks, &options);
            skipped.append(&mut analytics.skipped);
            analytics.skipped = skipped;
            if json {
                report::json::generate(&analytics)?
            } else {
                report::markdown::analytics(&analytics, window.as_ref())
            }
        }
        Some("summary") => {
            let summary = aggregate::summarize(tasks.iter().copied());
            if json {
                report::json::generate(&summary)?
            } else {
                let mut md = report::markdown::period_line(window.as_ref());
                md.push_str(&report::markdown::summary(&summary));
                md.push_str(&report::markdown::skipped(&skipped));
                md
            }
        }
        Some(name) => {
            let Some(grouping) = Grouping::from_str(name) else {
                bail!("Unknown group: {}", name);
            };
            let mut grouped = aggregate::group(tasks.iter().copied(), grouping, &options);
            skipped.append(&mut grouped.skipped);
            grouped.skipped = skipped;
            if json {
                report::json::generate(&grouped)?
            } else {
                let mut md = report::markdown::period_line(window.as_ref());
                md.push_str(&report::markdown::records(name, &grouped.records));
                md.push_str(&report::markdown::skipped(&grouped.skipped));
                md
            }
        }
    };

    println!("{}", output);
    Ok(())
}

fn cmd_heatmap(range: RangeArgs, json: bool) -> Result<()> {
    let (config, tracker) = open_tracker()?;
    let (window, tasks, mut skipped) = select_tasks(&tracker, &config, &range)?;

    let mut heatmap = Heatmap::build(tasks.iter().copied());
    skipped.append(&mut heatmap.skipped);
    heatmap.skipped = skipped;

    let output = if json {
        report::json::generate(&heatmap)?
    } else {
        let mut md = report::markdown::period_line(window.as_ref());
        md.push_str(&report::markdown::heatmap(&heatmap));
        md
    };

    println!("{}", output);
    Ok(())
}

fn cmd_export(format: Option<String>, output: Option<String>) -> Result<()> {
    let (config, tracker) = open_tracker()?;
    let options = load_options(&tracker)?;

    let records = export::records(tracker.tasks(), &options, &config.date_format);
    let format = format.unwrap_or_else(|| config.export_format.clone());

    let content = match format.as_str() {
        "json" => export::json::generate(&records)?,
        "csv" => export::csv::generate_string(&records)?,
        other => bail!("Unknown format: {}", other),
    };

    if let Some(path) = output {
        fs::write(&path, &content)
            .with_context(|| format!("Failed to write export to {}", path))?;
        eprintln!("Exported {} task(s) to: {}", records.len(), path);
    } else {
        println!("{}", content);
    }

    Ok(())
}

fn parse_kind(kind: &str) -> Result<OptionKind> {
    OptionKind::from_str(kind)
        .with_context(|| format!("Unknown option kind: {}. Expected category, system or type", kind))
}

fn cmd_options_list(kind: Option<String>) -> Result<()> {
    let config = EffectiveConfig::load()?;
    let options = Options::load(&get_db(&config)?)?;

    let kinds = match kind {
        Some(ref kind) => vec![parse_kind(kind)?],
        None => vec![OptionKind::Category, OptionKind::System, OptionKind::TaskType],
    };

    for kind in kinds {
        println!("{}:", kind.as_str());
        for (key, label) in options.set(kind).iter() {
            println!("  {:<20} {}", key, label);
        }
        println!();
    }

    Ok(())
}

fn cmd_options_add(kind: &str, key: &str, label: &str) -> Result<()> {
    let kind = parse_kind(kind)?;
    let config = EffectiveConfig::load()?;
    let db = get_db(&config)?;

    let mut options = Options::load(&db)?;
    let slug = options.set_mut(kind).add(key, label)?;
    options.save(&db)?;

    println!("Added {} '{}' ({})", kind.as_str(), slug, label.trim());
    Ok(())
}

fn cmd_options_remove(kind: &str, key: &str) -> Result<()> {
    let kind = parse_kind(kind)?;
    let config = EffectiveConfig::load()?;
    let db = get_db(&config)?;

    let mut options = Options::load(&db)?;
    match options.set_mut(kind).remove(key) {
        Some(label) => {
            options.save(&db)?;
            println!("Removed {} '{}' ({})", kind.as_str(), key, label);
        }
        None => println!("No {} named '{}'", kind.as_str(), key),
    }

    Ok(())
}

fn warn_unknown_keys(task: &Task, options: &Options) {
    let checks = [
        (OptionKind::Category, &task.category),
        (OptionKind::System, &task.system),
        (OptionKind::TaskType, &task.task_type),
    ];
    for (kind, key) in checks {
        if !options.set(kind).contains(key) {
            eprintln!("Note: {} '{}' is not a known option", kind.as_str(), key);
        }
    }
}

fn cmd_config_init() -> Result<()> {
    let path = config::init_global_config()?;
    println!("Configuration initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_edit() -> Result<()> {
    let path = config::global_config_path()?;

    if !path.exists() {
        config::init_global_config()?;
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

    std::process::Command::new(&editor)
        .arg(&path)
        .status()
        .with_context(|| format!("Failed to open editor: {}", editor))?;

    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = config::load_global_config()?;
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
