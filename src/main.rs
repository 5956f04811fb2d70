use uts::alloc_stats::TrackingAllocator;
#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator::new();

use std::{num::NonZeroUsize, path::PathBuf, process::ExitCode, time::Duration};

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;
use uts::{
    Driver, InlineExecutor, Result, RunSettings, SearchOutcome, ShaRng, SplittableRng, TreeParams,
    WorkStealingPool,
    driver::best_run,
    report::{self, RunReport},
};

/// Unbalanced tree search: enumerates a Galton-Watson tree on a work-stealing pool.
#[derive(Parser, Debug)]
#[command(name = "uts", version, about)]
struct Cli {
    /// Input file: eight whitespace-separated fields, or a `.yaml` document.
    #[arg(short = 'f', long = "file")]
    input: PathBuf,

    /// Number of worker threads in the pool. Not needed with `--serial`.
    #[arg(short = 'w', long, env = "UTS_NUM_WORKERS", required_unless_present = "serial")]
    workers: Option<NonZeroUsize>,

    /// Run on a single thread without the pool.
    #[arg(long)]
    serial: bool,

    /// Repeat the search and report the best throughput.
    #[arg(long, default_value_t = 1)]
    runs: usize,

    /// Stack size of every worker thread, in MiB.
    #[arg(long, default_value_t = 16)]
    stack_size_mb: usize,

    /// Log progress every N milliseconds.
    #[arg(long)]
    progress_ms: Option<u64>,

    /// Append one CSV row per run to this file.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print the final report as YAML.
    #[arg(long)]
    yaml: bool,

    /// Fail the run on depth or leaf-count mismatches too.
    #[arg(long)]
    strict: bool,

    /// Count heap allocations made during the search.
    #[arg(long)]
    track_alloc: bool,
}

impl Cli {
    fn into_settings(self) -> RunSettings {
        RunSettings {
            input: self.input,
            workers: if self.serial {
                1
            } else {
                self.workers.map_or(1, NonZeroUsize::get)
            },
            serial: self.serial,
            runs: self.runs.max(1),
            stack_size_mb: self.stack_size_mb.max(1),
            progress_ms: self.progress_ms,
            csv: self.csv,
            yaml: self.yaml,
            strict: self.strict,
            track_alloc: self.track_alloc,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(settings: &RunSettings) -> Result<bool> {
    let params = TreeParams::load(&settings.input)?;
    report::print_params(&params, ShaRng::NAME);

    let driver = Driver::new(params)
        .with_progress(settings.progress_ms.map(Duration::from_millis))
        .with_alloc_tracking(settings.track_alloc);
    println!("Computing Unbalanced Tree Search algorithm");
    let outcomes: Vec<SearchOutcome> = if settings.serial {
        let executor = InlineExecutor::new(settings.stack_size_bytes());
        driver.benchmark::<ShaRng, _>(&executor, settings.runs)?
    } else {
        let pool = WorkStealingPool::new(settings.workers, settings.stack_size_bytes())?;
        driver.benchmark::<ShaRng, _>(&pool, settings.runs)?
    };
    println!("Completed!");

    let best = best_run(&outcomes);
    if let Some(best) = best {
        report::print_summary(best);
        report::print_mismatches(best);
    }
    if let Some(path) = &settings.csv {
        report::append_csv(path, &params, &outcomes)?;
    }
    let successful = outcomes
        .iter()
        .all(|outcome| outcome.verdict.is_successful(settings.strict));
    if settings.yaml {
        let run_report = RunReport {
            generator: ShaRng::NAME,
            params: &params,
            runs: &outcomes,
            best,
            successful,
        };
        match run_report.to_yaml() {
            Ok(yaml) => print!("{yaml}"),
            Err(err) => error!("failed to render YAML report: {err}"),
        }
    }
    Ok(successful)
}

fn main() -> ExitCode {
    init_tracing();
    let settings = Cli::parse().into_settings();
    match execute(&settings) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("uts: {err}");
            ExitCode::FAILURE
        }
    }
}
