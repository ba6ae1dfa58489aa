// SPDX-License-Identifier: Apache-2.0

use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Parser;

use ttsynth::{aiger, reader, synth};

/// Synthesizes small multi-output circuits from truth tables and writes the
/// result in binary AIGER format.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Try all variable permutations and keep the cheapest ordering.
    #[arg(short = 'p', long)]
    try_perms: bool,

    /// Use only and-gates (no xor-gates).
    #[arg(short = 'a', long)]
    and_only: bool,

    /// Print the full graph instead of the one-line summary.
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Directory receiving the generated .aig files.
    #[arg(long, default_value = "outputs")]
    output_dir: PathBuf,

    /// Statistics file receiving one "name inputs outputs cost" row per run.
    #[arg(long, default_value = "stats.txt")]
    stats_file: PathBuf,

    /// A truth table in hex notation, a truth-table file, or a .filelist of
    /// problem files.
    input: String,
}

/// Name the output file after the input file, or after the hex string
/// itself when the table came from the command line.
fn output_stem(input: &str) -> String {
    Path::new(input)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string())
}

fn append_stats(
    stats_file: &Path,
    name: &str,
    num_vars: usize,
    num_outs: usize,
    cost: usize,
) -> anyhow::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(stats_file)
        .with_context(|| format!("failed to open {}", stats_file.display()))?;
    writeln!(file, "{} {} {} {}", name, num_vars, num_outs, cost)?;
    println!(
        "Added statistics for \"{}\" to the file \"{}\".",
        name,
        stats_file.display()
    );
    Ok(())
}

fn solve_one(args: &Args, input: &str) -> anyhow::Result<()> {
    let started = Instant::now();
    let (num_vars, mut outs) =
        reader::read_input(input).with_context(|| format!("failed to read problem {:?}", input))?;
    log::info!(
        "read a {}-input {}-output function from {:?}",
        num_vars,
        outs.len(),
        input
    );
    if args.try_perms {
        let best = synth::search_permutations(num_vars, &mut outs, args.and_only);
        log::info!("best ordering costs {} gates", best);
    }
    let mut gg = synth::synthesize_once(num_vars, &outs, args.and_only);
    print!("{}", gg.render(args.verbose));
    let failed = gg.verify();
    if failed == 0 {
        print!("Verification succeeded.  ");
    } else {
        print!("Verification failed for {} output(s).  ", failed);
    }
    println!("Time = {:.2} sec", started.elapsed().as_secs_f64());

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("failed to create {}", args.output_dir.display()))?;
    let aig_name = format!("{}.aig", output_stem(input));
    let aig_path = args.output_dir.join(&aig_name);
    aiger::write_file(&aig_path, &mut gg)
        .with_context(|| format!("failed to write {}", aig_path.display()))?;
    println!(
        "Written graph with {} inputs, {} outputs, and {} nodes into AIGER file \"{}\".",
        num_vars,
        outs.len(),
        gg.node_count(),
        aig_path.display()
    );
    append_stats(&args.stats_file, &aig_name, num_vars, outs.len(), gg.node_count())?;
    Ok(())
}

fn solve_list(args: &Args, list_path: &str) -> anyhow::Result<()> {
    let contents = fs::read_to_string(list_path)
        .with_context(|| format!("failed to read problem list {:?}", list_path))?;
    let mut solved = 0usize;
    for problem in contents.split_whitespace() {
        println!("\nSolving problem {:?}.", problem);
        match solve_one(args, problem) {
            Ok(()) => solved += 1,
            // A bad entry is reported and the rest of the list still runs.
            Err(err) => log::error!("problem {:?} failed: {:#}", problem, err),
        }
    }
    println!(
        "\nFinished solving {} problems from the list {:?}.",
        solved, list_path
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let _ = env_logger::builder().try_init();
    let args = Args::parse();
    let input = args.input.clone();
    if input.ends_with(".filelist") {
        solve_list(&args, &input)
    } else {
        solve_one(&args, &input)
    }
}
