//! Benchmarks and index dumps for paged vectors.

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use zipvec::testing::Pattern;

mod bench;
mod config;
mod error;
mod format;
mod kernels;
mod logging;

use crate::bench::BenchResult;
use crate::config::Settings;
use crate::error::Error;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogOutputFormat {
    Json,
    Pretty,
}

/// Command line arguments for the benchmark harness.
#[derive(Debug, Parser)]
#[clap(name = "zipvec-bench")]
struct BenchArgs {
    /// Optional path to a TOML configuration file. Anything it leaves out
    /// comes from `ZIPVEC_` environment variables or the defaults.
    #[clap(short = 'c', long, required = false)]
    config: Option<PathBuf>,

    #[clap(short = 'o', long = "output-format", default_value = "pretty")]
    output_format: Option<LogOutputFormat>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Time writes, indexed reads and iteration for every pattern.
    Bench {
        /// Print the results as JSON instead of a table.
        #[clap(long)]
        json: bool,
    },
    /// Fill a vector and print its page index.
    Dump {
        /// Pattern name such as `rel_i15`. Pages mix every pattern when
        /// omitted.
        pattern: Option<Pattern>,

        /// Number of elements. Defaults to `bench.size`.
        #[clap(short = 's', long)]
        size: Option<usize>,
    },
    /// Time the scan, encode and decode kernels for every width.
    Kernels {
        /// Print the results as JSON instead of a table.
        #[clap(long)]
        json: bool,
    },
}

fn print_results(results: &[BenchResult], json: bool) -> Result<(), Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
    } else {
        print!("{}", bench::render_table(results));
    }
    Ok(())
}

#[tracing::instrument(name = "zipvec-bench")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = BenchArgs::parse();

    // Logs go to stderr; results go to stdout.
    let pretty = matches!(args.output_format, Some(LogOutputFormat::Pretty));
    logging::setup_logging("info,zipvec=info,zipvec_bench=info", pretty);

    let settings = Settings::new(args.config).map_err(Error::from)?;
    let params = &settings.bench;
    tracing::info!(
        size = params.size,
        runs = params.runs,
        page_len = params.page_len,
        arch = ?params.arch,
        seed = params.seed,
        "loaded settings"
    );

    match args.command {
        Command::Bench { json } => print_results(&bench::run(params)?, json)?,
        Command::Dump { pattern, size } => {
            let report = bench::dump(params, pattern, size.unwrap_or(params.size))?;
            tracing::info!(
                pages = report.page_count(),
                total_bytes = report.total_bytes(),
                total_ratio = report.total_ratio(),
                "dumped index"
            );
            println!("{report}");
        }
        Command::Kernels { json } => print_results(&kernels::run(params)?, json)?,
    }

    Ok(())
}
