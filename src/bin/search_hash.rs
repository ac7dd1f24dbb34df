// src/bin/search_hash.rs
// Offline search for the parser table's perfect hash.
// Runs until interrupted (or LLPACK_MAX_TRIALS trials) and rewrites the hash
// config every time the modulus shrinks; any version of that file is usable.
//
// Usage:
//   cargo run --release --bin search_hash
//   LLPACK_WORKERS=8 LLPACK_SEED=1 cargo run --release --bin search_hash

use anyhow::{Context, Result};
use llpack::{
    Error,
    config::Settings,
    parser::tables::{FileCheckpoint, SearchState, Searcher, load_hash_config},
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env();
    let grammar = settings.load_grammar().context("failed to load grammar")?;
    let compiled = llpack::compile(grammar).context("grammar is not LL(1)")?;

    let seed = settings.seed.unwrap_or_else(rand::random);
    println!(
        "[search_hash] {} table keys, shift {}, seed {seed}, {} worker(s)",
        compiled.table.len(),
        settings.shift,
        settings.workers
    );

    let state = match load_hash_config(&settings.hash_config) {
        Ok(config) if config.shift != settings.shift => {
            log::warn!(
                "existing config uses shift {}, searching from scratch with shift {}",
                config.shift,
                settings.shift
            );
            SearchState::new()
        }
        Ok(config) => match SearchState::resume_checked(&compiled.grammar, &compiled.table, config)
        {
            Ok(state) => {
                println!(
                    "[search_hash] resuming from modulus {} ({})",
                    state.best_modulus().unwrap_or_default(),
                    settings.hash_config.display()
                );
                state
            }
            Err(e) => {
                log::warn!("existing hash config does not fit the grammar, ignoring it: {e}");
                SearchState::new()
            }
        },
        Err(Error::MissingConfig(_)) => SearchState::new(),
        Err(e) => {
            log::warn!("ignoring existing hash config: {e}");
            SearchState::new()
        }
    };

    let searcher = Searcher::new(
        &compiled.grammar,
        &compiled.table,
        settings.search_options(seed),
    );
    let mut sink = FileCheckpoint::new(&settings.hash_config);
    let state = searcher
        .search(state, &mut sink)
        .context("hash search aborted")?;

    match state.best {
        Some(best) => println!(
            "[search_hash] done after {} trials: modulus {} [{}], {} write(s) to {}",
            state.trials,
            best.modulus,
            best.major.tag(),
            sink.writes,
            sink.path().display()
        ),
        None => println!("[search_hash] done after {} trials, nothing found", state.trials),
    }
    Ok(())
}
