//! Interactive forth-like shell exposing the same commands as `aiglet`
//! (SPEC_FULL.md §6, §10), one line at a time against a persistent store.

use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};

use log::LevelFilter;
use simplelog::{Config, TermLogger, TerminalMode, ColorChoice};

use aiglet::aiger::{self, AigerMode};
use aiglet::balance::BalanceOptions;
use aiglet::cliflags::parse_flags;
use aiglet::driver;
use aiglet::refactor::RefactorOptions;
use aiglet::resub::ResubOptions;
use aiglet::rewrite::RewriteOptions;
use aiglet::store::AigStore;

fn readln() -> Option<String> {
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim().to_string()),
        Err(_) => None,
    }
}

fn dispatch(words: &[&str], store: &mut Option<AigStore>) -> aiglet::AigResult<i32> {
    match words.first().copied() {
        None => Ok(0),
        Some("quit") => {
            let (flags, _) = parse_flags(&words[1..], &[]);
            if flags.has('c') {
                if let Some(s) = store.as_mut() { s.cleanup()?; }
                return Ok(-2);
            }
            Ok(-1)
        }
        Some("help") => {
            println!("commands: read_aiger [-c] <file> | write_aiger [-s] <file> | balance [-ds] | rewrite [-xz] | drw [-C n] [-N n] [-zr] | refactor [-N n] [-C n] [-zd] | drf [-M n] [-K n] [-C n] [-ez] | resub [-K n] [-N n] | zero | quit [-c] | help");
            Ok(0)
        }
        Some("read_aiger") => {
            let (flags, consumed) = parse_flags(&words[1..], &[]);
            let cleanup_after_read = flags.has('c');
            let Some(&path) = words.get(1 + consumed) else { eprintln!("usage: read_aiger [-c] <file>"); return Ok(1); };
            let file = File::open(path)?;
            let mut s = aiger::read(file)?;
            if cleanup_after_read { s.cleanup()?; }
            println!("read {path}: {} ANDs", s.num_ands());
            *store = Some(s);
            Ok(0)
        }
        Some("write_aiger") => {
            let (flags, consumed) = parse_flags(&words[1..], &[]);
            let strip_symbols = flags.has('s');
            let Some(&path) = words.get(1 + consumed) else { eprintln!("usage: write_aiger [-s] <file>"); return Ok(1); };
            let Some(s) = store.as_mut() else { eprintln!("no current network"); return Ok(0); };
            let file = File::create(path)?;
            let mut w = BufWriter::new(file);
            aiger::write(s, &mut w, AigerMode::Binary, strip_symbols)?;
            w.flush()?;
            Ok(0)
        }
        Some("balance") => {
            let (flags, _) = parse_flags(&words[1..], &[]);
            let opts = BalanceOptions { duplicate: flags.has('d'), selective: flags.has('s') };
            with_store(store, |s| driver::run_balance(s, &opts).map(|_| ()))
        }
        Some("rewrite") => {
            let (flags, _) = parse_flags(&words[1..], &[]);
            let opts = RewriteOptions {
                candidates_max: if flags.has('x') { 1 } else { RewriteOptions::default().candidates_max },
                use_zeros: flags.has('z'),
                ..RewriteOptions::default()
            };
            with_store(store, |s| driver::run_rewrite(s, &opts).map(|_| ()))
        }
        Some("drw") => {
            let (flags, _) = parse_flags(&words[1..], &['C', 'N']);
            let default = RewriteOptions::default();
            let opts = RewriteOptions {
                cuts_max: flags.num('C', default.cuts_max as i64) as usize,
                candidates_max: flags.num('N', default.candidates_max as i64) as usize,
                use_zeros: flags.has('z'),
                ..default
            };
            // `-r` has no separate codepath: finish_pass always recomputes
            // levels, so it's a documented no-op.
            with_store(store, |s| driver::run_rewrite(s, &opts).map(|_| ()))
        }
        Some("refactor") => {
            let (flags, _) = parse_flags(&words[1..], &['N', 'C']);
            let default = RefactorOptions::default();
            let opts = RefactorOptions {
                leaf_max: flags.num('N', default.leaf_max as i64) as usize,
                mffc_min: flags.num('C', default.mffc_min as i64) as usize,
                use_zeros: flags.has('z'),
                estimate_only: flags.has('d'),
                ..default
            };
            with_store(store, |s| driver::run_refactor(s, &opts).map(|_| ()))
        }
        Some("drf") => {
            let (flags, _) = parse_flags(&words[1..], &['M', 'K', 'C']);
            let default = RefactorOptions::default();
            let mffc_min = flags.nums.get(&'K').or_else(|| flags.nums.get(&'C'))
                .copied().unwrap_or(default.mffc_min as i64) as usize;
            let opts = RefactorOptions {
                leaf_max: flags.num('M', default.leaf_max as i64) as usize,
                mffc_min,
                use_zeros: flags.has('z'),
                estimate_only: flags.has('e'),
                ..default
            };
            with_store(store, |s| driver::run_refactor(s, &opts).map(|_| ()))
        }
        Some("resub") => {
            let (flags, _) = parse_flags(&words[1..], &['K', 'N']);
            let default = ResubOptions::default();
            let opts = ResubOptions {
                cuts_max: flags.num('K', default.cuts_max as i64) as usize,
                steps_max: flags.num('N', default.steps_max as i64) as u8,
                ..default
            };
            with_store(store, |s| driver::run_resub(s, &opts).map(|_| ()))
        }
        Some("zero") => { with_store(store, |s| driver::run_zero(s).map(|_| ())) }
        Some(other) => {
            eprintln!("unknown word: {other}");
            Ok(1)
        }
    }
}

fn with_store(store: &mut Option<AigStore>, f: impl FnOnce(&mut AigStore) -> aiglet::AigResult<()>) -> aiglet::AigResult<i32> {
    match store.as_mut() {
        Some(s) => { f(s)?; Ok(0) }
        None => { println!("no current network"); Ok(0) }
    }
}

fn main() {
    let _ = TermLogger::init(LevelFilter::Info, Config::default(), TerminalMode::Mixed, ColorChoice::Auto);
    let mut store: Option<AigStore> = None;
    let mut exit_code = 0i32;

    println!("aiglet-shell: type `help` for commands, `quit` to exit");
    'main: loop {
        print!("aig> ");
        let _ = io::stdout().flush();
        let Some(line) = readln() else { break 'main; };
        if line.is_empty() { continue; }
        let words: Vec<&str> = line.split_ascii_whitespace().collect();
        match dispatch(&words, &mut store) {
            Ok(code @ (-1 | -2)) => { exit_code = code; break 'main; }
            Ok(_) => continue,
            Err(e) => eprintln!("error: {e}"),
        }
    }
    if exit_code != 0 { std::process::exit(exit_code); }
}
