use anyhow::{anyhow, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use litediff::presentation::cli_summary::{
    print_data_summary, print_perf_summary, print_schema_summary, print_snapshot_saved,
    print_warnings,
};
use litediff::presentation::writers::{all_writers, write_to_file, writer_for};
use litediff::{AppConfig, LogLevel, Report};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "litediff",
    about = "litediff: compare SQLite data and schemas, generate sync and migration SQL."
)]
struct Cli {
    /// Config file; defaults to <config dir>/litediff/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print the summary and SQL instead of writing files
    #[arg(long, global = true)]
    dry_run: bool,

    /// Output format: json, sql or all
    #[arg(short, long, default_value = "all", global = true)]
    format: String,

    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare the rows of every configured table and generate sync SQL
    Data {
        /// Also print the performance table
        #[arg(long)]
        timing: bool,
    },
    /// Compare the schemas and generate migration SQL
    Schema {
        /// Use a stored snapshot as the source side
        #[arg(long)]
        source_snapshot: Option<String>,
    },
    /// Capture the source schema (or the target's) into the snapshot directory
    Snapshot {
        #[arg(long)]
        target: bool,
        #[arg(long)]
        label: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else if cli.quiet {
        LogLevel::Error
    } else {
        LogLevel::Info
    };
    litediff::init_tracing(level);

    let cfg = AppConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Data { timing } => {
            let (results, perf) = litediff::run_data(&cfg).await?;
            let comparisons: Vec<_> = results.iter().map(|r| r.comparison.clone()).collect();
            print_data_summary(&comparisons);
            if *timing {
                print_perf_summary(&perf);
            }

            let out = run_dir(&cfg, "data");
            for r in &results {
                print_warnings(&r.sql.warnings);
                emit(&cli, &Report::Data { comparison: &r.comparison, sql: &r.sql }, &out)?;
            }
        }
        Command::Schema { source_snapshot } => {
            let (comparison, sql) = litediff::run_schema(&cfg, source_snapshot.as_deref()).await?;
            print_schema_summary(&comparison);
            print_warnings(&sql.warnings);
            emit(&cli, &Report::Schema { comparison: &comparison, sql: &sql }, &run_dir(&cfg, "schema"))?;
        }
        Command::Snapshot { target, label } => {
            let (snapshot, id) = litediff::capture_snapshot(&cfg, *target, label.as_deref()).await?;
            print_snapshot_saved(&snapshot, &id);
        }
    }

    Ok(())
}

/// `<output dir>/<kind>/<timestamp>`
fn run_dir(cfg: &AppConfig, kind: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    Path::new(&cfg.output.dir).join(kind).join(timestamp)
}

fn emit(cli: &Cli, report: &Report<'_>, dir: &Path) -> Result<()> {
    if cli.dry_run {
        if !report.sql().is_empty() {
            println!("{}", report.sql().sql);
            println!();
        }
        return Ok(());
    }
    if report.sql().is_empty() {
        return Ok(());
    }

    let writers = match cli.format.as_str() {
        "all" => all_writers(),
        fmt => vec![writer_for(fmt).ok_or_else(|| anyhow!("Unknown format: {}", fmt))?],
    };
    for writer in writers {
        let path = write_to_file(writer.as_ref(), report, dir)?;
        println!("Written {}", path.display());
    }
    Ok(())
}
