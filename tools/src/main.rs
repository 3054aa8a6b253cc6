//! geo-runner: headless driver for the synthetic geography engine.
//!
//! Usage:
//!   geo-runner --months 2018-11,2022-05 --assign cust-0001
//!   geo-runner --config project.json --seed "ropa:v5" --json
//!   geo-runner --intake --ages
//!   geo-runner --ipc-mode < requests.jsonl

use anyhow::{Context, Result};
use chrono::NaiveDate;
use geoweights_core::{
    ages,
    calendar::YearMonth,
    config::GeoConfig,
    growth_curve::{build_monthly_new_customers, GrowthConfig},
    request::parse_period,
    AssignRequest, GeoEngine, PeriodInput,
};
use std::env;
use std::io::{self, BufRead, Write};

const DEFAULT_MONTHS: &str = "2018-11,2019-06,2020-03,2021-10,2022-05,2023-06,2024-11,2025-04";

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Weights { date: NaiveDate },
    Summary { date: NaiveDate },
    Assign { request: AssignRequest },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let json = has_flag(&args, "--json");
    let ipc_mode = has_flag(&args, "--ipc-mode");

    let mut config = match flag_value(&args, "--config") {
        Some(path) => GeoConfig::load(path)?,
        None => GeoConfig::default_project(),
    };
    if let Some(seed) = flag_value(&args, "--seed") {
        config = config.with_seed(seed);
    }
    let engine = GeoEngine::new(config)?;
    log::info!(
        "engine ready: seed='{}' sub-regions={}",
        engine.config().seed,
        engine.geography().subregion_count()
    );

    if ipc_mode {
        return run_ipc_loop(&engine);
    }

    let months = flag_value(&args, "--months")
        .unwrap_or(DEFAULT_MONTHS)
        .split(',')
        .map(|p| parse_period(p).with_context(|| format!("bad --months entry '{p}'")))
        .collect::<Result<Vec<YearMonth>>>()?;

    if !json {
        println!("geo-runner");
        println!("  seed:    {}", engine.config().seed);
        println!("  range:   {} .. {}", engine.config().range.start, engine.config().range.end);
        println!("  months:  {}", months.len());
        println!();
    }

    for ym in &months {
        print_month(&engine, *ym, json)?;
        if let Some(customer) = flag_value(&args, "--assign") {
            let request = AssignRequest::customer(customer, PeriodInput::YearMonth(*ym));
            let assignment = engine.assign_subregion(&request)?;
            if json {
                println!("{}", serde_json::to_string(&assignment)?);
            } else {
                println!("  assign {customer}: {} ({})", assignment.subregion, assignment.region);
            }
        }
        if has_flag(&args, "--ages") {
            let (_, weights) = ages::month_sampler(&ym.period(), ym.year(), None)?;
            let shares: Vec<String> = weights.iter().map(|w| format!("{w:.3}")).collect();
            println!("  ages {}: [{}]", ym.period(), shares.join(", "));
        }
    }

    if has_flag(&args, "--intake") {
        print_intake(&engine, json)?;
    }
    Ok(())
}

fn print_month(engine: &GeoEngine, ym: YearMonth, json: bool) -> Result<()> {
    let summary = engine.summary_for_date(ym.first_day())?;
    if json {
        println!("{}", serde_json::to_string(&summary)?);
        return Ok(());
    }
    println!("=== {} ===", summary.date);
    println!("  total:     {:.6}", summary.total);
    println!("  units:     {}", summary.unit_count);
    println!("  openings:  {}", summary.active_openings.join(", "));
    for (unit, share) in &summary.top10 {
        println!("    {unit:<24} {:>6.2}%", share * 100.0);
    }
    Ok(())
}

fn print_intake(engine: &GeoEngine, json: bool) -> Result<()> {
    let rows = build_monthly_new_customers(&engine.config().range, &GrowthConfig::example())?;
    if json {
        println!("{}", serde_json::to_string(&rows)?);
        return Ok(());
    }
    println!();
    println!("=== NEW CUSTOMERS ===");
    for row in &rows {
        let peak = row.day_weights.iter().copied().fold(0.0, f64::max);
        println!(
            "  {} | new: {:>6} | days: {} | peak day weight: {peak:.2}",
            row.period, row.new_customers, row.days_in_month
        );
    }
    Ok(())
}

fn run_ipc_loop(engine: &GeoEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let cmd: IpcCommand = match serde_json::from_str(&line) {
            Ok(c) => c,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Weights { date } => engine
                .weights_for_date(date)
                .map(|w| serde_json::json!({ "date": date, "weights": w })),
            IpcCommand::Summary { date } => engine
                .summary_for_date(date)
                .map(|s| serde_json::json!(s)),
            IpcCommand::Assign { request } => engine
                .assign_subregion(&request)
                .map(|a| serde_json::json!(a)),
        };
        let reply = reply.unwrap_or_else(|e| {
            log::warn!("ipc request failed: {e}");
            serde_json::json!({ "error": e.to_string() })
        });
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
