//! Factor Parity CLI.
//!
//! Compares recorded factor runs offline and reports, check by check,
//! whether every factor agreed.
//!
//! Exit codes: 0 when every check agrees, 1 on any disagreement, 2 when the
//! runs cannot be compared at all.

use clap::{Args, Parser, Subcommand, ValueEnum};
use factor_parity::comparator::{
    ignore_fields, with_date_fields, Comparator, DEFAULT_DATE_TOLERANCE_MS,
};
use factor_parity::{ParityReport, RunFile};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parity")]
#[command(about = "Factor Parity - compare recorded factor runs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information
    Version,

    /// Compare a JSON file of recorded runs
    Compare(CompareArgs),
}

#[derive(Args)]
struct CompareArgs {
    /// Recorded runs ({"runs": [{"name", "checks": [...]}, ...]})
    file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Treat numbers within this distance as equal
    #[arg(long, conflicts_with_all = ["ignore_field", "date_field"])]
    tolerance: Option<f64>,

    /// Ignore this top-level field when comparing objects (repeatable)
    #[arg(long = "ignore-field", value_name = "FIELD", conflicts_with = "date_field")]
    ignore_field: Vec<String>,

    /// Compare this top-level field as a date within --date-tolerance-ms (repeatable)
    #[arg(long = "date-field", value_name = "FIELD")]
    date_field: Vec<String>,

    /// Allowed skew for --date-field, in milliseconds
    #[arg(
        long,
        default_value_t = DEFAULT_DATE_TOLERANCE_MS,
        value_parser = clap::value_parser!(i64).range(0..)
    )]
    date_tolerance_ms: i64,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("Factor Parity v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Some(Commands::Compare(args)) => compare(&args),
        None => {
            println!("Factor Parity v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information");
            ExitCode::SUCCESS
        }
    }
}

fn comparator_for(args: &CompareArgs) -> Comparator {
    if let Some(tolerance) = args.tolerance {
        Comparator::tolerance(tolerance)
    } else if !args.date_field.is_empty() {
        with_date_fields(
            args.date_field.iter().cloned(),
            chrono::Duration::milliseconds(args.date_tolerance_ms),
        )
    } else if !args.ignore_field.is_empty() {
        ignore_fields(args.ignore_field.iter().cloned())
    } else {
        Comparator::deep_equal()
    }
}

fn compare(args: &CompareArgs) -> ExitCode {
    let comparator = comparator_for(args);
    let results = match RunFile::load(&args.file).and_then(|file| file.results(&comparator)) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    let report = ParityReport::new(results);
    match args.format {
        Format::Text => print!("{}", report.render_text()),
        Format::Json => match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::from(2);
            }
        },
    }

    if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
