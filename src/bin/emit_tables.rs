// src/bin/emit_tables.rs
// Rebuilds the prediction table, lays it out under the persisted hash config
// and writes the C definitions + declarations for the parser runtime.
//
// Usage:
//   cargo run --bin emit_tables -- src/parser-generated.c include/parser-generated.h

use std::{env, fs, path::Path, process::ExitCode};

use anyhow::{Context, Result};
use llpack::{
    config::Settings,
    parser::tables::{Artifacts, EncodedTable, load_checked},
};

const GENERATOR: &str = "emit_tables";

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn run(source_path: &Path, header_path: &Path) -> Result<()> {
    let settings = Settings::from_env();
    let grammar = settings.load_grammar().context("failed to load grammar")?;
    let compiled = llpack::compile(grammar).context("grammar is not LL(1)")?;

    let config = load_checked(&settings.hash_config, &compiled.grammar)
        .with_context(|| format!("unusable hash config {}", settings.hash_config.display()))?;
    let encoded = EncodedTable::encode(&compiled.grammar, &compiled.table, &config)
        .context("table does not fit the hash config")?;

    let header_include = header_path
        .file_name()
        .and_then(|n| n.to_str())
        .context("header path has no file name")?;
    let artifacts = Artifacts::render(&encoded, GENERATOR, header_include)?;

    println!(
        "[emit_tables] {} buckets ({} valid), {} pool slots, {} terminals, {} nonterminals",
        encoded.modulus,
        encoded.valid_buckets(),
        encoded.pool.len(),
        encoded.symbols.terminals.len(),
        encoded.symbols.nonterminals.len()
    );
    write_file(source_path, &artifacts.source)?;
    write_file(header_path, &artifacts.header)?;
    println!("[emit_tables] wrote {}", source_path.display());
    println!("[emit_tables] wrote {}", header_path.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!(
            "usage: {} <source-file> <header-file>",
            args.first().map(String::as_str).unwrap_or(GENERATOR)
        );
        return ExitCode::FAILURE;
    }

    match run(Path::new(&args[1]), Path::new(&args[2])) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
