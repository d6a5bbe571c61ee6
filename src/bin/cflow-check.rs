// Copyright (c) 2022-2023 the cflow authors

#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

use anyhow::{Context, Result};
use cflow::{assembly, ControlFlowAnalyzer, Diagnostics, Loc, Session, Suppress};
use clap::Arg;
use std::{fs::File, io::Read};

fn main() {
    let matches = app_from_crate!()
        .about("Runs the control-flow and dead-code analysis over IR listings.")
        .arg(
            Arg::with_name("inputs")
                .multiple(true)
                .required(true)
                .help("IR listings to analyze"),
        )
        .arg(
            Arg::with_name("verbosity")
                .short("v")
                .multiple(true)
                .help("Increase message verbosity"),
        )
        .arg(
            Arg::with_name("dump")
                .short("d")
                .long("dump")
                .help("Dump the trimmed listing to stdout"),
        )
        .arg(
            Arg::with_name("graph")
                .short("g")
                .long("graph")
                .help("Dump the block graph to stdout"),
        )
        .arg(
            Arg::with_name("return-label")
                .short("r")
                .long("return-label")
                .takes_value(true)
                .default_value(".ret")
                .help("Name of the unified return label"),
        )
        .arg(
            Arg::with_name("no-warn-unused")
                .long("no-warn-unused")
                .help("Suppress unused-label warnings"),
        )
        .arg(
            Arg::with_name("no-warn-dead")
                .long("no-warn-dead")
                .help("Suppress dead-code warnings"),
        )
        .get_matches();

    // Configure the logger.
    let verbose = std::cmp::max(1, matches.occurrences_of("verbosity") as usize) - 1;
    let quiet = !matches.is_present("verbosity");
    stderrlog::new()
        .module("cflow")
        .module("cflow_check")
        .quiet(quiet)
        .verbosity(verbose)
        .init()
        .unwrap();

    let mut suppress = Suppress::empty();
    if matches.is_present("no-warn-unused") {
        suppress |= Suppress::UNUSED_LABEL;
    }
    if matches.is_present("no-warn-dead") {
        suppress |= Suppress::DEAD_CODE;
    }

    let mut session = Session::new();
    let mut num_errors = 0;
    for path in matches.values_of("inputs").into_iter().flatten() {
        match check(path, &matches, suppress, &mut session) {
            Ok(true) => (),
            Ok(false) => num_errors += 1,
            Err(e) => {
                eprintln!("{}: {:#}", path, e);
                num_errors += 1;
            }
        }
    }

    std::process::exit(num_errors);
}

/// Analyze one listing. Returns `Ok(false)` if the analysis aborted.
fn check(
    path: &str,
    matches: &clap::ArgMatches,
    suppress: Suppress,
    session: &mut Session,
) -> Result<bool> {
    let mut contents = String::new();
    File::open(path)
        .and_then(|mut f| f.read_to_string(&mut contents))
        .with_context(|| format!("cannot read {}", path))?;
    let insts = assembly::parse_listing(&contents).context("cannot parse listing")?;
    info!("analyzing {} ({} instructions)", path, insts.len());

    let function = path
        .rsplit('/')
        .next()
        .unwrap()
        .trim_end_matches(".ir")
        .to_string();
    let return_label = matches.value_of("return-label").unwrap();

    let mut diags = Diagnostics::with_suppressed(suppress);
    let mut analyzer = ControlFlowAnalyzer::new(session);
    let result = analyzer.analyze(Loc::new(1, 1), &function, insts, return_label, &mut diags);

    if !diags.is_empty() {
        print!("{}:\n{}", path, diags);
    }

    let trimmed = match result {
        Ok(trimmed) => trimmed,
        Err(e) => {
            eprintln!("{}: {}", path, e);
            return Ok(false);
        }
    };

    if matches.is_present("dump") {
        print!("{}", assembly::write_listing(&trimmed));
    }
    if matches.is_present("graph") {
        let graph = analyzer.graph();
        for bb in graph.blocks() {
            let data = &graph[bb];
            print!("{} {:?}", data.name, data.kind);
            if data.dead {
                print!(" dead");
            }
            if let Some(succ) = data.fallthrough {
                print!(" fallthrough={}", graph[succ].name);
            }
            if let Some(succ) = data.branch_taken {
                print!(" taken={}", graph[succ].name);
            }
            if let Some(succ) = data.branch_not_taken {
                print!(" not-taken={}", graph[succ].name);
            }
            println!();
        }
    }

    Ok(true)
}
