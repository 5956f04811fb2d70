use std::{
    fs::OpenOptions,
    io::{self, BufWriter, Write},
    path::Path,
};

use serde::Serialize;

use crate::{
    config::TreeParams,
    driver::SearchOutcome,
    error::{Error, Result},
};

pub mod progress;

const CSV_HEADER: &str = "root_branching_factor,non_leaf_prob,non_leaf_bf,root_seed,\
                          compute_granularity,workers,tree_size,max_depth,leaves,elapsed_secs,\
                          nodes_per_sec,nodes_per_sec_per_worker,size_ok";

fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

pub fn print_params(params: &TreeParams, generator: &str) {
    let policy = params.policy();
    println!();
    println!("Root branching factor                = {:.6}", params.root_branching_factor);
    println!("Root seed (0 <= 2^31)                = {}", params.root_seed);
    println!("Probability of non-leaf node         = {:.6}", params.non_leaf_prob);
    println!("Number of children for non-leaf node = {}", params.non_leaf_bf);
    println!("E(n)                                 = {:.6}", policy.expected_branching());
    println!("E(s)                                 = {:.6}", policy.expected_subtree_size());
    println!("Compute granularity                  = {}", params.granularity());
    println!("Random number generator              = {generator}");
}

pub fn print_summary(outcome: &SearchOutcome) {
    let stats = &outcome.stats;
    println!();
    println!("Tree size                            = {}", outcome.tree_size);
    println!("Maximum tree depth                   = {}", stats.max_depth);
    println!(
        "Number of leaves                     = {} ({:.2}%)",
        stats.leaves,
        percentage(stats.leaves, outcome.tree_size)
    );
    println!("Number of workers                    = {:04} threads", outcome.workers);
    println!("Wallclock time                       = {:.3} sec", outcome.elapsed.as_secs_f64());
    println!("Overall performance                  = {:.0} nodes/sec", outcome.nodes_per_sec());
    println!(
        "Performance per worker               = {:.0} nodes/sec",
        outcome.nodes_per_sec_per_worker()
    );
    if stats.truncated > 0 {
        println!("Truncated fan-outs                   = {}", stats.truncated);
    }
    if stats.range_errors > 0 {
        println!("Generator range errors               = {}", stats.range_errors);
    }
    if let Some(alloc) = outcome.alloc {
        println!(
            "Allocations                          = {} ({} bytes)",
            alloc.allocations, alloc.bytes
        );
    }
}

pub fn print_mismatches(outcome: &SearchOutcome) {
    for message in outcome.verdict.mismatches() {
        println!("{message}");
    }
}

fn write_csv_row(
    writer: &mut impl Write,
    params: &TreeParams,
    outcome: &SearchOutcome,
) -> io::Result<()> {
    writeln!(
        writer,
        "{},{},{},{},{},{},{},{},{},{:.6},{:.0},{:.0},{}",
        params.root_branching_factor,
        params.non_leaf_prob,
        params.non_leaf_bf,
        params.root_seed,
        params.granularity(),
        outcome.workers,
        outcome.tree_size,
        outcome.stats.max_depth,
        outcome.stats.leaves,
        outcome.elapsed.as_secs_f64(),
        outcome.nodes_per_sec(),
        outcome.nodes_per_sec_per_worker(),
        outcome.verdict.size.matches(),
    )
}

fn append_rows(path: &Path, params: &TreeParams, outcomes: &[SearchOutcome]) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let is_empty = file.metadata()?.len() == 0;
    let mut writer = BufWriter::new(file);
    if is_empty {
        writeln!(writer, "{CSV_HEADER}")?;
    }
    for outcome in outcomes {
        write_csv_row(&mut writer, params, outcome)?;
    }
    writer.flush()
}

/// Appends one row per run, writing the header first when the file is new.
pub fn append_csv(path: &Path, params: &TreeParams, outcomes: &[SearchOutcome]) -> Result<()> {
    append_rows(path, params, outcomes).map_err(|source| Error::Log {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Serialize)]
pub struct RunReport<'a> {
    pub generator: &'a str,
    pub params: &'a TreeParams,
    pub runs: &'a [SearchOutcome],
    pub best: Option<&'a SearchOutcome>,
    pub successful: bool,
}

impl RunReport<'_> {
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
