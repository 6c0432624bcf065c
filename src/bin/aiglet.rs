//! One-shot CLI: runs a pipeline of AIG commands given on the command line
//! (SPEC_FULL.md §6, §10).

use std::fs::File;
use std::io::{BufWriter, Write};

use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use simplelog::{Config, TermLogger, TerminalMode, ColorChoice};

use aiglet::aiger::{self, AigerMode};
use aiglet::balance::BalanceOptions;
use aiglet::cliflags::parse_flags;
use aiglet::driver;
use aiglet::refactor::RefactorOptions;
use aiglet::resub::ResubOptions;
use aiglet::rewrite::RewriteOptions;
use aiglet::store::AigStore;

#[derive(Parser)]
#[command(name = "aiglet", about = "A combinational logic-synthesis engine over AIGs")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet: only warnings and errors.
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// A sequence of commands to run against a freshly-read AIG, e.g.
    /// `read_aiger in.aig balance rewrite write_aiger out.aig`.
    #[arg(trailing_var_arg = true)]
    pipeline: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
    ReadAiger { path: String },
    WriteAiger { path: String },
    Balance,
    Rewrite,
    Refactor,
    Resub,
    Zero,
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet { LevelFilter::Warn }
        else { match verbose { 0 => LevelFilter::Info, 1 => LevelFilter::Debug, _ => LevelFilter::Trace } };
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto);
}

/// Parses `[-flags] [positional...]` starting at `tokens[i]`, returning the
/// parsed flags and the index of the first unconsumed token.
fn flags_at(tokens: &[String], i: usize, numeric: &[char]) -> (aiglet::cliflags::ParsedFlags, usize) {
    let rest: Vec<&str> = tokens[i..].iter().map(String::as_str).collect();
    let (flags, consumed) = parse_flags(&rest, numeric);
    (flags, i + consumed)
}

fn run_pipeline(tokens: &[String]) -> aiglet::AigResult<i32> {
    let mut store: Option<AigStore> = None;
    let mut i = 0usize;
    while i < tokens.len() {
        let cmd = tokens[i].as_str();
        i += 1;
        match cmd {
            "read_aiger" => {
                let (flags, next) = flags_at(tokens, i, &[]);
                let cleanup_after_read = flags.has('c');
                i = next;
                let path = tokens.get(i).cloned().unwrap_or_default();
                i += 1;
                let file = File::open(&path)?;
                let mut s = aiger::read(file)?;
                if cleanup_after_read { s.cleanup()?; }
                store = Some(s);
                info!("read_aiger: {path}");
            }
            "write_aiger" => {
                let (flags, next) = flags_at(tokens, i, &[]);
                let strip_symbols = flags.has('s');
                i = next;
                let path = tokens.get(i).cloned().unwrap_or_default();
                i += 1;
                let s = store.as_mut().expect("write_aiger before read_aiger");
                let file = File::create(&path)?;
                let mut w = BufWriter::new(file);
                aiger::write(s, &mut w, AigerMode::Binary, strip_symbols)?;
                w.flush()?;
                info!("write_aiger: {path}");
            }
            "balance" => {
                let (flags, next) = flags_at(tokens, i, &[]);
                i = next;
                let opts = BalanceOptions { duplicate: flags.has('d'), selective: flags.has('s') };
                driver::run_balance(store.as_mut().unwrap(), &opts)?;
            }
            "rewrite" => {
                let (flags, next) = flags_at(tokens, i, &[]);
                i = next;
                let opts = RewriteOptions {
                    candidates_max: if flags.has('x') { 1 } else { RewriteOptions::default().candidates_max },
                    use_zeros: flags.has('z'),
                    ..RewriteOptions::default()
                };
                driver::run_rewrite(store.as_mut().unwrap(), &opts)?;
            }
            "drw" => {
                let (flags, next) = flags_at(tokens, i, &['C', 'N']);
                i = next;
                let default = RewriteOptions::default();
                let opts = RewriteOptions {
                    cuts_max: flags.num('C', default.cuts_max as i64) as usize,
                    candidates_max: flags.num('N', default.candidates_max as i64) as usize,
                    use_zeros: flags.has('z'),
                    ..default
                };
                // `-r` (recompute levels only) has no separate codepath here:
                // finish_pass always recomputes levels, so it's a documented no-op.
                driver::run_rewrite(store.as_mut().unwrap(), &opts)?;
            }
            "refactor" => {
                let (flags, next) = flags_at(tokens, i, &['N', 'C']);
                i = next;
                let default = RefactorOptions::default();
                let opts = RefactorOptions {
                    leaf_max: flags.num('N', default.leaf_max as i64) as usize,
                    mffc_min: flags.num('C', default.mffc_min as i64) as usize,
                    use_zeros: flags.has('z'),
                    estimate_only: flags.has('d'),
                    ..default
                };
                driver::run_refactor(store.as_mut().unwrap(), &opts)?;
            }
            "drf" => {
                let (flags, next) = flags_at(tokens, i, &['M', 'K', 'C']);
                i = next;
                let default = RefactorOptions::default();
                // `-C` is a documented synonym for `-K` (both bound the MFFC-size cutoff).
                let mffc_min = flags.nums.get(&'K').or_else(|| flags.nums.get(&'C'))
                    .copied().unwrap_or(default.mffc_min as i64) as usize;
                let opts = RefactorOptions {
                    leaf_max: flags.num('M', default.leaf_max as i64) as usize,
                    mffc_min,
                    use_zeros: flags.has('z'),
                    estimate_only: flags.has('e'),
                    ..default
                };
                driver::run_refactor(store.as_mut().unwrap(), &opts)?;
            }
            "resub" => {
                let (flags, next) = flags_at(tokens, i, &['K', 'N']);
                i = next;
                let default = ResubOptions::default();
                let opts = ResubOptions {
                    cuts_max: flags.num('K', default.cuts_max as i64) as usize,
                    steps_max: flags.num('N', default.steps_max as i64) as u8,
                    ..default
                };
                driver::run_resub(store.as_mut().unwrap(), &opts)?;
            }
            "zero" => { driver::run_zero(store.as_mut().unwrap())?; }
            "quit" => {
                let (flags, next) = flags_at(tokens, i, &[]);
                i = next;
                if flags.has('c') {
                    if let Some(s) = store.as_mut() { s.cleanup()?; }
                    return Ok(-2);
                }
                return Ok(-1);
            }
            other => {
                eprintln!("unknown command: {other}");
                std::process::exit(1);
            }
        }
    }
    Ok(0)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = if !cli.pipeline.is_empty() {
        run_pipeline(&cli.pipeline)
    } else if let Some(cmd) = cli.command {
        match cmd {
            Command::ReadAiger { path } => run_pipeline(&["read_aiger".into(), path]),
            Command::WriteAiger { path } => run_pipeline(&["write_aiger".into(), path]),
            Command::Balance => run_pipeline(&["balance".into()]),
            Command::Rewrite => run_pipeline(&["rewrite".into()]),
            Command::Refactor => run_pipeline(&["refactor".into()]),
            Command::Resub => run_pipeline(&["resub".into()]),
            Command::Zero => run_pipeline(&["zero".into()]),
        }
    } else {
        eprintln!("usage: aiglet <commands...> (e.g. read_aiger in.aig balance write_aiger out.aig)");
        std::process::exit(1);
    };

    match result {
        Ok(code) if code != 0 => std::process::exit(code),
        Ok(_) => {}
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
