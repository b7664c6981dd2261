//! Orchestration for the `microc` binary: parse a Micro-C source file,
//! build its Program Graph, run the four data-flow analyses over it,
//! and print a human-readable report — the `--src-file` contract from
//! spec.md §6.

mod ast_dump;
mod report;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{arg, Command};
use mc_logger::{Logger, Verbosity};
use mc_worklist::Strategy;

fn build_cli() -> Command<'static> {
    Command::new("microc")
        .about("Static data-flow analyzer for Micro-C")
        .arg(arg!(--"src-file" <PATH>).required(true).help(
            "Path to a Micro-C source file",
        ))
        .arg(
            arg!(--"strategy" <NAME>)
                .required(false)
                .possible_values(["fifo", "lifo", "rp"])
                .default_value("fifo")
                .help("Worklist strategy used by every analysis"),
        )
        .arg(
            arg!(--"dot" <PATH>)
                .required(false)
                .help("Write the Program Graph as DOT (and SVG, if 'dot' is on $PATH)"),
        )
        .arg(arg!(--"ast").required(false).help("Print the parsed AST before the Program Graph"))
        .arg(
            arg!(-v --verbose)
                .required(false)
                .multiple_occurrences(true)
                .help("Raise logging verbosity (repeatable)"),
        )
}

fn parse_strategy(name: &str) -> Strategy {
    match name {
        "fifo" => Strategy::Fifo,
        "lifo" => Strategy::Lifo,
        "rp" => Strategy::RoundRobin,
        other => unreachable!("clap restricts --strategy to a known set, got {other}"),
    }
}

fn verbosity_for(count: u64) -> Verbosity {
    match count {
        0 => Verbosity::Simple,
        1 => Verbosity::Timing,
        _ => Verbosity::Debugging,
    }
}

/// Entry point called from `src/main.rs`. Exits non-zero on parse or
/// I/O failure (spec.md §6, §7) rather than returning — the same
/// top-level shape `fn main` callers expect from a CLI binary.
pub fn run() {
    if let Err(e) = try_run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn try_run() -> Result<()> {
    let matches = build_cli().get_matches();

    let src_path = PathBuf::from(matches.value_of("src-file").expect("required"));
    let strategy = parse_strategy(matches.value_of("strategy").unwrap_or("fifo"));
    let dot_path = matches.value_of("dot").map(PathBuf::from);
    let print_ast = matches.is_present("ast");
    let verbosity = verbosity_for(matches.occurrences_of("verbose"));
    let logger = Logger::CommandLine(verbosity);

    let src = std::fs::read_to_string(&src_path)
        .with_context(|| format!("could not read source file {:?}", src_path))?;

    let outcome = mc_parser::parse(&src);
    if !outcome.errors.is_empty() {
        for e in &outcome.errors {
            eprintln!("{}", e);
        }
        anyhow::bail!("{} parse error(s) in {:?}", outcome.errors.len(), src_path);
    }
    let program = outcome
        .program
        .expect("no errors but no program — mc-parser contract violated");
    let interner = outcome.interner;

    if print_ast {
        println!("{}", ast_dump::dump(&program, &interner));
    }

    let build_start = Instant::now();
    let pg = mc_pg::Pg::finalize(mc_pg::build(&program));
    if logger.can_log_timing() {
        logger.log(&format!(" - program graph built in {:?}", build_start.elapsed()));
    }

    for (u, v, action) in pg.dfs_edges() {
        println!("{} {} => {}", pg.label(u).display(), pg.label(v).display(), action.display(&interner));
    }

    if let Some(dot_path) = &dot_path {
        match mc_render::export(&pg, &interner, dot_path, &logger) {
            Some(svg) => logger.log_debug(&format!("rendered {:?}", svg)),
            None => logger.log_debug("graph export skipped or failed"),
        }
    }

    run_and_print_rd(&pg, &interner, strategy, &logger);
    run_and_print_lv(&pg, &interner, strategy, &logger);
    run_and_print_dv(&pg, &interner, strategy, &logger);
    run_and_print_ds(&pg, &interner, strategy, &logger);

    Ok(())
}

fn run_and_print_rd(pg: &mc_pg::Pg, interner: &mc_str::Interner, strategy: Strategy, logger: &Logger) {
    let start = Instant::now();
    let (result, iterations) = mc_analyses::rd::compute(pg, strategy);
    if logger.can_log_timing() {
        logger.log(&format!(" - RD computed in {} iterations ({:?})", iterations, start.elapsed()));
    }
    report::print_rd(pg, interner, &result);
}

fn run_and_print_lv(pg: &mc_pg::Pg, interner: &mc_str::Interner, strategy: Strategy, logger: &Logger) {
    let start = Instant::now();
    let (result, iterations) = mc_analyses::lv::compute(pg, strategy);
    if logger.can_log_timing() {
        logger.log(&format!(" - LV computed in {} iterations ({:?})", iterations, start.elapsed()));
    }
    report::print_lv(pg, interner, &result);
}

fn run_and_print_dv(pg: &mc_pg::Pg, interner: &mc_str::Interner, strategy: Strategy, logger: &Logger) {
    let start = Instant::now();
    let (result, iterations) = mc_analyses::dv::compute(pg, strategy);
    if logger.can_log_timing() {
        logger.log(&format!(" - DV computed in {} iterations ({:?}, includes its RD seeding pass)", iterations, start.elapsed()));
    }
    report::print_dv(pg, interner, &result);
}

fn run_and_print_ds(pg: &mc_pg::Pg, interner: &mc_str::Interner, strategy: Strategy, logger: &Logger) {
    let start = Instant::now();
    let (result, iterations) = mc_analyses::ds::compute(pg, strategy);
    if logger.can_log_timing() {
        logger.log(&format!(" - DS computed in {} iterations ({:?})", iterations, start.elapsed()));
    }
    report::print_ds(pg, interner, &result);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_surface_parses_required_and_optional_flags() {
        let m = build_cli().get_matches_from(vec![
            "microc",
            "--src-file",
            "prog.uc",
            "--strategy",
            "lifo",
            "--ast",
            "-vv",
        ]);
        assert_eq!(m.value_of("src-file"), Some("prog.uc"));
        assert_eq!(m.value_of("strategy"), Some("lifo"));
        assert!(m.is_present("ast"));
        assert_eq!(m.occurrences_of("verbose"), 2);
    }

    #[test]
    fn strategy_defaults_to_fifo() {
        let m = build_cli().get_matches_from(vec!["microc", "--src-file", "prog.uc"]);
        assert_eq!(m.value_of("strategy"), Some("fifo"));
    }
}
