// src/config.rs
// Runtime settings, all from the environment. Unparsable values fall back to
// the default.

use std::path::PathBuf;

use crate::{
    error::Result,
    grammar::{Grammar, bnf::parse_bnf},
    parser::tables::{DEFAULT_SHIFT, SearchOptions},
};

pub const DEFAULT_HASH_CONFIG: &str = "tables/parser_hash.json";

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// BNF file to load instead of the built-in grammar.
    pub grammar: Option<PathBuf>,
    pub hash_config: PathBuf,
    pub shift: u32,
    /// `None` draws a fresh seed per run.
    pub seed: Option<u64>,
    pub workers: usize,
    pub max_trials: Option<u64>,
    pub progress_every: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grammar: None,
            hash_config: PathBuf::from(DEFAULT_HASH_CONFIG),
            shift: DEFAULT_SHIFT,
            seed: None,
            workers: 1,
            max_trials: None,
            progress_every: 10_000,
        }
    }
}

impl Settings {
    /// LLPACK_GRAMMAR, LLPACK_HASH_CONFIG, LLPACK_SHIFT, LLPACK_SEED,
    /// LLPACK_WORKERS, LLPACK_MAX_TRIALS, LLPACK_PROGRESS_EVERY.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            grammar: env_path("LLPACK_GRAMMAR"),
            hash_config: env_path("LLPACK_HASH_CONFIG").unwrap_or(d.hash_config),
            shift: env_u64("LLPACK_SHIFT")
                .and_then(|v| u32::try_from(v).ok())
                .filter(|&v| v < 32)
                .unwrap_or(d.shift),
            seed: env_u64("LLPACK_SEED"),
            workers: env_u64("LLPACK_WORKERS")
                .map(|v| v.max(1) as usize)
                .unwrap_or(d.workers),
            max_trials: env_u64("LLPACK_MAX_TRIALS"),
            progress_every: env_u64("LLPACK_PROGRESS_EVERY").unwrap_or(d.progress_every),
        }
    }

    pub fn load_grammar(&self) -> Result<Grammar> {
        match &self.grammar {
            Some(path) => {
                let src = std::fs::read_to_string(path)?;
                parse_bnf(&src, None)
            }
            None => Grammar::default_grammar(),
        }
    }

    /// `seed` is the resolved seed (see [`Settings::seed`]).
    pub fn search_options(&self, seed: u64) -> SearchOptions {
        SearchOptions {
            shift: self.shift,
            seed,
            workers: self.workers,
            max_trials: self.max_trials,
            progress_every: self.progress_every,
        }
    }
}
