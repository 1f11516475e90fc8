use std::path::PathBuf;

use alerts::{AddOutcome, LimitKind, RemoveTarget};
use anyhow::{Result, bail};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use price_series::DateKey;
use series_sync::{Pipeline, config, limits_file, pipeline::requested_mode, symbols};

#[derive(Parser)]
#[command(version, about = "Coin price series sync and alerts")]
struct Cli {
    /// Config file; defaults to $SERIES_SYNC_CONFIG, then ./series_sync.toml.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Apply pending database migrations.
    Migrate,
    /// Reconcile history from the snapshot file into the database.
    Ingest {
        /// Only the newest observed row per symbol.
        #[arg(long, conflicts_with_all = ["days", "from", "to"])]
        latest: bool,
        /// Days to reconcile, overriding `polling.history_days`.
        #[arg(long, conflicts_with_all = ["from", "to"])]
        days: Option<u32>,
        /// First day of an explicit interval; `--to` defaults to today.
        #[arg(long, value_name = "YYYYMMDD")]
        from: Option<DateKey>,
        /// Last day of an explicit interval.
        #[arg(long, value_name = "YYYYMMDD")]
        to: Option<DateKey>,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Print indicators of a stored series.
    Indicators {
        #[arg(long)]
        symbol: String,
        /// YYYYMMDD; today in the configured timezone by default.
        #[arg(long, value_name = "YYYYMMDD")]
        as_of: Option<DateKey>,
        #[arg(long)]
        json: bool,
    },
    Limits(LimitsCmd),
    /// Run one price check.
    Check,
    /// Poll until Ctrl-C.
    Run,
}

#[derive(Args)]
struct LimitsCmd {
    #[command(subcommand)]
    sub: LimitsSub,
}

#[derive(Subcommand)]
enum LimitsSub {
    Show {
        #[arg(long)]
        user: String,
    },
    Add {
        #[arg(long)]
        user: String,
        #[arg(long)]
        symbol: String,
        #[arg(long, value_parser = parse_kind)]
        kind: LimitKind,
        #[arg(long)]
        value: f64,
    },
    /// Remove a symbol, one kind of it, or a single value.
    Remove {
        #[arg(long)]
        user: String,
        #[arg(long)]
        symbol: String,
        #[arg(long, value_parser = parse_kind)]
        kind: Option<LimitKind>,
        #[arg(long, requires = "kind")]
        value: Option<f64>,
    },
    RemoveUser {
        #[arg(long)]
        user: String,
    },
}

fn parse_kind(s: &str) -> std::result::Result<LimitKind, String> {
    LimitKind::parse(s).ok_or_else(|| format!("expected `low` or `high`, got `{s}`"))
}

#[tokio::main]
async fn main() -> Result<()> {
    shared_utils::init_tracing("info");
    let cli = Cli::parse();
    let cfg = config::load_config_from_env(cli.config)?;

    match cli.cmd {
        Cmd::Migrate => {
            let applied = series_sync::db::migrate::run_sqlite(&cfg.database_url)?;
            println!("{applied} migration(s) applied");
        }
        Cmd::Ingest { latest, days, from, to, symbol } => {
            let today = DateKey::today_in(cfg.tz());
            let mode = requested_mode(today, latest, days, from, to)?;
            let pipeline = Pipeline::from_config(cfg)?;
            let report = pipeline.history_cycle(today, mode, symbol.as_deref()).await?;
            for outcome in &report.outcomes {
                println!("{outcome}");
            }
            for (symbol, error) in &report.failures {
                eprintln!("{symbol}: {error}");
            }
            if !report.failures.is_empty() {
                bail!("{} symbol(s) failed", report.failures.len());
            }
        }
        Cmd::Indicators { symbol, as_of, json } => {
            let as_of = as_of.unwrap_or_else(|| DateKey::today_in(cfg.tz()));
            let pipeline = Pipeline::from_config(cfg)?;
            let bundle = pipeline.indicators(&symbol, as_of)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&bundle)?);
            } else {
                println!("{bundle}");
            }
        }
        Cmd::Limits(LimitsCmd { sub }) => {
            symbols::refresh_symbols(&cfg.symbols);
            let mut book = limits_file::load_limits(&cfg.limits_file)?;
            match sub {
                LimitsSub::Show { user } => {
                    println!("{}", book.describe_user(&user));
                    return Ok(());
                }
                LimitsSub::Add { user, symbol, kind, value } => {
                    let symbol = symbol.trim().to_uppercase();
                    if !symbols::is_available(&symbol) {
                        bail!("{symbol} is not an available coin");
                    }
                    match book.add_limit(&user, &symbol, kind, value)? {
                        AddOutcome::Created => println!("{symbol} {kind} limit {value} added for {user}"),
                        AddOutcome::AlreadyExists => {
                            println!("{symbol} {kind} limit {value} already exists for {user}");
                            return Ok(());
                        }
                    }
                }
                LimitsSub::Remove { user, symbol, kind, value } => {
                    let symbol = symbol.trim().to_uppercase();
                    let target = match (kind, value) {
                        (Some(kind), Some(value)) => RemoveTarget::Value(kind, value),
                        (Some(kind), None) => RemoveTarget::Kind(kind),
                        (None, _) => RemoveTarget::Symbol,
                    };
                    book.remove_limit(&user, &symbol, target)?;
                    println!("removed {target:?} of {symbol} for {user}");
                }
                LimitsSub::RemoveUser { user } => {
                    book.remove_user(&user)?;
                    println!("removed {user}");
                }
            }
            limits_file::save_limits(&cfg.limits_file, &book)?;
        }
        Cmd::Check => {
            let pipeline = Pipeline::from_config(cfg)?;
            let report = pipeline.price_cycle(Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Cmd::Run => {
            Pipeline::from_config(cfg)?.run().await?;
        }
    }

    Ok(())
}
