// src/error.rs
use std::{fmt, path::PathBuf};

use thiserror::Error;

use crate::grammar::Fingerprint;

/// One problem found while validating or analyzing a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Issue {
    #[error("unresolved symbol `{symbol}` in a production of {lhs}")]
    UnresolvedSymbol { lhs: String, symbol: String },

    #[error("start symbol {0} has no productions")]
    UndefinedStart(String),

    #[error("`{0}` is reserved for the end-of-input marker")]
    ReservedSymbol(String),

    #[error("`{0}` is declared as a terminal but also has productions")]
    TerminalHasRules(String),

    #[error("left recursion: {}", .0.join(" -> "))]
    LeftRecursion(Vec<String>),

    #[error("LL(1) conflict at [{nonterminal}, {terminal}]: {}", .alternatives.join("  |  "))]
    Conflict {
        nonterminal: String,
        terminal: String,
        alternatives: Vec<String>,
    },
}

/// Every issue found by one stage. Non-empty whenever it is returned as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics(pub Vec<Issue>);

impl Diagnostics {
    pub fn issues(&self) -> &[Issue] {
        &self.0
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &Issue> {
        self.0
            .iter()
            .filter(|i| matches!(i, Issue::Conflict { .. }))
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grammar rejected with {} issue(s)", self.0.len())?;
        for issue in &self.0 {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Grammar(#[from] Diagnostics),

    #[error("failed to parse BNF grammar: {0}")]
    Bnf(String),

    #[error(
        "raw hash collision between [{first}] and [{second}] at shift {shift}; widen the shift"
    )]
    RawHashCollision {
        first: String,
        second: String,
        shift: u32,
    },

    #[error(
        "bucket {bucket} already holds [{first}] when placing [{second}]; hash config is stale"
    )]
    BucketCollision {
        bucket: usize,
        first: String,
        second: String,
    },

    #[error("hash config was searched for grammar {found}, current grammar is {expected}")]
    StaleConfig {
        expected: Fingerprint,
        found: Fingerprint,
    },

    #[error("hash config {kind} do not match the grammar (missing: {missing:?}, extra: {extra:?})")]
    SymbolMismatch {
        kind: &'static str,
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("no hash config at {0}; run `search_hash` first")]
    MissingConfig(PathBuf),

    #[error("invalid hash config: {0}")]
    InvalidConfig(String),

    #[error("symbol `{display}` maps to `{name}`, which is not a valid identifier")]
    InvalidSymbolName { display: String, name: String },

    #[error("symbols `{first}` and `{second}` both map to `{name}`")]
    DuplicateSymbolName {
        name: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("failed to render artifacts: {0}")]
    Fmt(#[from] std::fmt::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
