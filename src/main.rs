use std::env;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;

use tv_renamer::config::Config;
use tv_renamer::renumber_engine::{RenumberEngine, RunSummary};

fn main() -> ExitCode {
    println!("TV Renamer");
    println!("==========");

    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("✗ {err}");
            return ExitCode::from(1);
        }
    };

    if config.paths.is_empty() {
        println!("No paths given, nothing to process.");
        return ExitCode::SUCCESS;
    }

    let noact = config.options.noact;
    let paths = config.paths.clone();

    let engine = match RenumberEngine::new(config).context("failed to build renumbering engine") {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("✗ {err:#}");
            return ExitCode::from(1);
        }
    };

    let mut summary = RunSummary::default();
    let mut unreadable_roots = 0usize;

    for path in &paths {
        match engine.process_root(Path::new(path)) {
            Ok(path_summary) => summary.merge(path_summary),
            Err(err) => {
                // Keep going with the remaining roots.
                eprintln!("✗ {err}");
                unreadable_roots += 1;
            }
        }
    }

    println!("==========");
    println!(
        "Summary: {} renamed, {} skipped, {} failed",
        summary.renamed,
        summary.skipped,
        summary.failures.len()
    );
    for failure in &summary.failures {
        eprintln!("✗ {failure}");
    }
    if noact {
        println!("Dry run: no files were changed.");
    }

    if summary.failures.is_empty() && unreadable_roots == 0 {
        println!("✓ Done.");
        ExitCode::SUCCESS
    } else {
        println!("⚠ Finished with errors.");
        ExitCode::from(2)
    }
}

fn print_usage() {
    println!(
        "Usage: tv-renamer -options:opt1,opt2,... -paths:p1,,p2,... \
         [-marker:TEXT] [-fseparator:TEXT] [-eseparator:TEXT]"
    );
    println!();
    println!("Renames episodes from absolute numbering to the S01E01 scheme.");
    println!();
    println!("Options:");
    println!("  print     print every planned rename as an 'old -> new' line");
    println!("  noact     dry run, do not touch the filesystem");
    println!("  doubleep  video files contain two episodes each");
    println!("  keepep    keep the original episode number");
    println!("  preserve  preserve the filename, replacing only the marker (default '***')");
}
