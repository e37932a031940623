//! # Phase-Space Analyzer
//!
//! Command-line tool that decodes an IAEA phase-space file once and feeds
//! every selected consumer.

use phsp::{analysis, report, AnalysisPlan, AnalysisReport};
use phsp_core::{ConsumerKind, PhspConfig, PhspError, RecordLayout};
use phsp_scoring::RunEnd;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "phsp=info,phsp_core=info,phsp_scoring=info";

fn print_usage() {
    println!("Usage: phsp_analyzer <file.IAEAphsp> [options]");
    println!();
    println!("Options:");
    println!("  --config <toml>        Run configuration");
    println!("  --layout full|short    Record layout (default: short)");
    println!("  --budget <n>           Decode at most n records");
    println!("  --consumers <list>     Comma-separated: dump,spectrum,fluence,voxel");
    println!("  --dump <n>             Print the first n records");
    println!("  --spectrum             Per-species energy spectra");
    println!("  --fluence              Field fluence at the projection plane");
    println!("  --voxels <file>        Voxel scoring over the listed voxels");
    println!("  --jaws <file>          Jaw settings in front of the voxels");
    println!("  --out <dir>            Report directory (default: .)");
}

fn value_of<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn parse_number(args: &[String], flag: &str) -> Result<Option<u64>, PhspError> {
    value_of(args, flag)
        .map(|s| {
            s.parse()
                .map_err(|_| PhspError::InvalidConfig(format!("{flag} expects a count, got `{s}`")))
        })
        .transpose()
}

/// Builds the plan and the report directory from the command line.
fn parse_args(args: &[String]) -> Result<(AnalysisPlan, PathBuf), PhspError> {
    let mut plan = AnalysisPlan::new(&args[1]);

    if let Some(path) = value_of(args, "--config") {
        plan.config = PhspConfig::load(path)?;
    }
    if let Some(name) = value_of(args, "--layout") {
        plan.config.decode.layout = RecordLayout::parse(name)
            .ok_or_else(|| PhspError::InvalidConfig(format!("unknown layout `{name}`")))?;
    }
    if let Some(budget) = parse_number(args, "--budget")? {
        plan.config.run.budget = budget;
    }
    if let Some(list) = value_of(args, "--consumers") {
        for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let kind = ConsumerKind::parse(name)
                .ok_or_else(|| PhspError::InvalidConfig(format!("unknown consumer `{name}`")))?;
            plan.consumers.push(kind);
        }
    }
    if let Some(count) = parse_number(args, "--dump")? {
        plan.config.dump.count = count;
        plan.consumers.push(ConsumerKind::Dump);
    }
    if args.iter().any(|a| a == "--spectrum") {
        plan.consumers.push(ConsumerKind::Spectrum);
    }
    if args.iter().any(|a| a == "--fluence") {
        plan.consumers.push(ConsumerKind::Fluence);
    }
    if let Some(path) = value_of(args, "--voxels") {
        plan.voxels = Some(PathBuf::from(path));
        plan.consumers.push(ConsumerKind::Voxel);
    }
    plan.jaws = value_of(args, "--jaws").map(PathBuf::from);

    let out_dir = PathBuf::from(value_of(args, "--out").unwrap_or("."));
    Ok((plan, out_dir))
}

fn print_run(plan: &AnalysisPlan, result: &AnalysisReport) {
    println!();
    println!("┌─ RUN ───────────────────────────────────────────────────────────┐");
    println!("│ Input:              {}", plan.input.display());
    println!("│ Layout:             {:?} ({} bytes/record)", plan.layout(), plan.layout().record_size());
    println!("│ Records decoded:    {}", result.summary.records);
    if let Some(budget) = result.summary.budget {
        println!("│ Record budget:      {budget}");
    }
    let end = match result.summary.end {
        RunEnd::Stream(end) => format!("{end:?}"),
        other => format!("{other:?}"),
    };
    println!("│ Stopped by:         {end}");
    if let Some(dumped) = result.dumped {
        println!("│ Records dumped:     {dumped}");
    }
    println!("└──────────────────────────────────────────────────────────────────┘");
}

/// Prints the summaries and writes the CSV files; returns false if any write failed.
fn write_reports(result: &AnalysisReport, out_dir: &std::path::Path) -> bool {
    let mut ok = true;
    let mut stdout = io::stdout().lock();
    let mut check = |outcome: Result<(), PhspError>| {
        if let Err(e) = outcome {
            tracing::error!(error = %e, "report failed");
            ok = false;
        }
    };

    if let Some(spectrum) = &result.spectrum {
        println!();
        println!("┌─ SPECTRUM ──────────────────────────────────────────────────────┐");
        check(report::write_spectrum_summary(&mut stdout, spectrum).map_err(stdout_error));
        check(report::save_histograms(out_dir, spectrum).map(|_| ()));
        println!("└──────────────────────────────────────────────────────────────────┘");
    }
    if let Some(fluence) = &result.fluence {
        println!();
        println!("┌─ FIELD FLUENCE ─────────────────────────────────────────────────┐");
        check(report::write_fluence_summary(&mut stdout, fluence).map_err(stdout_error));
        println!("└──────────────────────────────────────────────────────────────────┘");
    }
    if let Some(scorer) = &result.voxels {
        println!();
        println!("┌─ VOXELS ────────────────────────────────────────────────────────┐");
        check(report::write_voxel_summary(&mut stdout, scorer.stats(), scorer.voxels()).map_err(stdout_error));
        check(report::save_voxels(out_dir, scorer.voxels()).map(|_| ()));
        println!("└──────────────────────────────────────────────────────────────────┘");
    }
    ok
}

fn stdout_error(source: io::Error) -> PhspError {
    PhspError::Output {
        path: PathBuf::from("<stdout>"),
        source,
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         PHASE-SPACE ANALYZER                                     ║");
    println!("║         IAEA RECORD STREAMS                                      ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args[1].starts_with("--") {
        print_usage();
        return ExitCode::FAILURE;
    }

    let (plan, out_dir) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!(error = %e, "cannot start");
            return ExitCode::FAILURE;
        }
    };

    let result = match analysis::run(&plan, io::stdout()) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, fatal = e.is_fatal(), "run aborted");
            return ExitCode::FAILURE;
        }
    };

    print_run(&plan, &result);
    if write_reports(&result, &out_dir) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
