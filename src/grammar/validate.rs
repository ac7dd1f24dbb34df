// src/grammar/validate.rs
// Advisory checks. Nothing here rejects a grammar; hard failures are raised by
// the builder, the FIRST pass and the table builder.

use std::fmt;

use hashbrown::HashSet;
use log::warn;

use super::{Grammar, NonterminalId, Symbol};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// Not derivable from the start symbol; its table rows are dead weight.
    Unreachable(String),
    DuplicateProduction(String),
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::Unreachable(nt) => write!(f, "{nt} is unreachable from the start symbol"),
            Advisory::DuplicateProduction(p) => write!(f, "duplicate production {p}"),
        }
    }
}

pub fn reachable(grammar: &Grammar) -> Vec<bool> {
    let mut seen = vec![false; grammar.nonterminals().len()];
    let mut stack = vec![grammar.start()];
    seen[grammar.start().idx()] = true;
    while let Some(nt) = stack.pop() {
        for (_, p) in grammar.productions_of(nt) {
            for &sym in &p.rhs {
                if let Symbol::Nonterminal(n) = sym {
                    if !seen[n.idx()] {
                        seen[n.idx()] = true;
                        stack.push(n);
                    }
                }
            }
        }
    }
    seen
}

/// Runs every advisory check and logs what it finds.
pub fn check(grammar: &Grammar) -> Vec<Advisory> {
    let mut out = Vec::new();

    for (i, ok) in reachable(grammar).into_iter().enumerate() {
        if !ok {
            let nt = NonterminalId(i as u32);
            out.push(Advisory::Unreachable(grammar.nonterminal_name(nt).to_string()));
        }
    }

    for nt in grammar.nonterminal_ids() {
        let mut seen: HashSet<&[Symbol]> = HashSet::new();
        for (id, p) in grammar.productions_of(nt) {
            if !seen.insert(p.rhs.as_slice()) {
                out.push(Advisory::DuplicateProduction(grammar.display_production(id)));
            }
        }
    }

    for a in &out {
        warn!("grammar: {a}");
    }
    out
}
