mod commands;
mod logging;
mod progress;

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::CliObserver;
use session_curator_core::engine::default_analysis_id;
use session_curator_core::store::{Database, SnapshotStore, COMPLETENESS_NAMESPACE};
use session_curator_core::summary::{build_summary, write_summary_csv};
use session_curator_core::{AppConfig, CompletenessReport, CurationEngine};
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let guard = logging::init_logger();

    let config = match session_curator_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            drop(guard);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let code = match args.command {
        Some(Commands::Curate {
            session_id,
            analysis_id,
        }) => run_or_fail(run_curate(&config, &session_id, analysis_id)),
        Some(Commands::CurateAll { analysis_id }) => {
            run_or_fail(run_curate_all(&config, analysis_id))
        }
        Some(Commands::Summary { output }) => {
            run_or_fail(run_summary(&config, output.as_deref()).map(|_| 0))
        }
        Some(Commands::Show { session_id }) => {
            run_or_fail(run_show(&config, session_id.as_deref()).map(|_| 0))
        }
        Some(Commands::PrintConfig) => run_or_fail(
            toml::to_string_pretty(&config)
                .map(|text| {
                    println!("{}", text);
                    0
                })
                .context("rendering configuration"),
        ),
        Some(Commands::TruncateDb) => run_or_fail(run_truncate(&config)),
        None => {
            let _ = Cli::command().print_long_help();
            0
        }
    };

    drop(guard);
    process::exit(code);
}

fn run_or_fail(result: Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(err) => {
            error!("Error: {:#}", err);
            1
        }
    }
}

fn open_store(config: &AppConfig) -> Result<SnapshotStore> {
    SnapshotStore::open(Path::new(&config.store_root))
        .with_context(|| format!("opening snapshot store at {}", config.store_root))
}

fn open_database(config: &AppConfig) -> Result<Database> {
    Database::open(&config.database_path)
        .with_context(|| format!("opening database {}", config.database_path))
}

fn run_curate(config: &AppConfig, session_id: &str, analysis_id: Option<String>) -> Result<i32> {
    let store = open_store(config)?;
    let db = open_database(config)?;
    let engine = CurationEngine::new(config.clone(), &store, &db);
    let analysis_id = analysis_id.unwrap_or_else(default_analysis_id);

    let outcome = engine.curate_session(session_id, &analysis_id, &CliObserver::new());
    if let Some(report) = &outcome.report {
        print_verdicts(session_id, report);
    }
    Ok(outcome.return_code)
}

fn run_curate_all(config: &AppConfig, analysis_id: Option<String>) -> Result<i32> {
    let store = open_store(config)?;
    let db = open_database(config)?;
    let engine = CurationEngine::new(config.clone(), &store, &db);
    let analysis_id = analysis_id.unwrap_or_else(default_analysis_id);

    let result = engine.curate_project(&analysis_id, &CliObserver::new())?;

    println!();
    info!(
        "{} curated, {} failed, {} skipped in {}",
        format!("{}", result.succeeded()).green(),
        format!("{}", result.failed()).red(),
        format!("{}", result.skipped).cyan(),
        format!("{:.2}s", result.duration.as_secs_f64()).green(),
    );
    for outcome in &result.outcomes {
        match (&outcome.report, &outcome.error) {
            (Some(report), _) => print_verdicts(&outcome.session_id, report),
            (None, Some(err)) => println!("{} {}", outcome.session_id.red(), err),
            (None, None) => {}
        }
    }

    Ok(if result.failed() > 0 { 1 } else { 0 })
}

fn run_summary(config: &AppConfig, output: Option<&str>) -> Result<()> {
    let store = open_store(config)?;
    let db = if Path::new(&config.database_path).exists() {
        Some(open_database(config)?)
    } else {
        None
    };

    let rows = build_summary(&store, db.as_ref(), config)?;
    match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path))?;
            write_summary_csv(&rows, file)?;
            info!("Wrote {} rows to {}", rows.len(), path);
        }
        None => write_summary_csv(&rows, io::stdout().lock())?,
    }
    Ok(())
}

fn run_show(config: &AppConfig, session_id: Option<&str>) -> Result<()> {
    let db = open_database(config)?;
    let Some(session_id) = session_id else {
        let curated = db.list_curated_sessions(COMPLETENESS_NAMESPACE)?;
        info!("{} curated sessions", curated.len());
        for id in curated {
            println!("{}", id);
        }
        return Ok(());
    };
    match db.get_completeness(session_id)? {
        Some(report) => println!("{}", serde_json::to_string_pretty(&report)?),
        None => println!("Session {} has not been curated", session_id),
    }
    Ok(())
}

fn run_truncate(config: &AppConfig) -> Result<i32> {
    if !prompt_confirm(
        "Are you SURE you want to COMPLETELY DELETE the Database?",
        Some(false),
    )? {
        return Ok(0);
    }
    open_database(config)?.truncate_all()?;
    println!("All tables truncated");
    Ok(0)
}

fn print_verdicts(session_id: &str, report: &CompletenessReport) {
    let flag = |value: bool| {
        if value {
            "yes".green()
        } else {
            "no".red()
        }
    };
    println!(
        "{}: complete {}, downstream {}, human eyes {}, stimulus {}",
        session_id.bold(),
        flag(report.session_complete),
        flag(report.run_downstream_analyses),
        if report.human_eyes {
            "yes".yellow()
        } else {
            "no".normal()
        },
        flag(report.stimulus_complete),
    );
    if !report.missing_scans.is_empty() {
        println!("  missing: {}", report.missing_scans.join(", "));
    }
    if !report.extra_scans.is_empty() {
        println!("  extra: {}", report.extra_scans.join(", "));
    }
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
