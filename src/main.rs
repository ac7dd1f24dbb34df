// src/main.rs
// Loads and checks the grammar, then prints the numbers that size the search.

use std::process::ExitCode;

use llpack::config::Settings;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let settings = Settings::from_env();
    let grammar = match settings.load_grammar() {
        Ok(g) => g,
        Err(e) => {
            eprintln!("grammar error: {e}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "{} expansion rules ({} unique)",
        grammar.productions().len(),
        grammar.distinct_expansions()
    );
    eprintln!("terms: {}", grammar.terminals().len());
    eprintln!("nonterms: {}", grammar.nonterminals().len());
    eprintln!("fingerprint: {}", grammar.fingerprint());

    match llpack::compile(grammar) {
        Ok(compiled) => {
            eprintln!("table keys: {}", compiled.table.len());
            eprintln!(
                "symbol slots: {}",
                compiled.table.total_symbol_slots(&compiled.grammar)
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
