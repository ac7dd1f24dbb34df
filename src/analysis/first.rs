// src/analysis/first.rs
use std::collections::BTreeSet;

use hashbrown::HashSet;
use log::debug;

use crate::{
    error::{Diagnostics, Issue},
    grammar::{Grammar, NonterminalId, Symbol, TerminalId},
};

/// Terminals that can begin a derivation, plus whether the derivation can vanish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSet {
    pub terminals: BTreeSet<TerminalId>,
    pub nullable: bool,
}

impl FirstSet {
    pub fn contains(&self, t: TerminalId) -> bool {
        self.terminals.contains(&t)
    }
}

/// FIRST of a sequence, given FIRST of each nonterminal.
/// Stops at the first terminal or non-nullable nonterminal.
fn fold_sequence<F>(seq: &[Symbol], mut first_of: F) -> FirstSet
where
    F: FnMut(NonterminalId) -> FirstSet,
{
    let mut out = FirstSet::default();
    for &sym in seq {
        match sym {
            Symbol::Terminal(t) => {
                out.terminals.insert(t);
                return out;
            }
            Symbol::Nonterminal(n) => {
                let f = first_of(n);
                out.terminals.extend(f.terminals);
                if !f.nullable {
                    return out;
                }
            }
        }
    }
    out.nullable = true;
    out
}

/// FIRST set of every nonterminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstSets {
    sets: Vec<FirstSet>,
}

impl FirstSets {
    /// Fails with one `LeftRecursion` issue per distinct cycle.
    pub fn compute(grammar: &Grammar) -> Result<Self, Diagnostics> {
        let n = grammar.nonterminals().len();
        let mut pass = FirstPass {
            grammar,
            memo: vec![None; n],
            stack: Vec::new(),
            on_stack: vec![false; n],
            cycles: Vec::new(),
            seen_cycles: HashSet::new(),
        };
        for nt in grammar.nonterminal_ids() {
            pass.nonterminal(nt);
        }
        if !pass.cycles.is_empty() {
            return Err(Diagnostics(
                pass.cycles.into_iter().map(Issue::LeftRecursion).collect(),
            ));
        }

        let sets: Vec<FirstSet> = pass.memo.into_iter().map(Option::unwrap_or_default).collect();
        debug!(
            "first: {} sets, {} nullable",
            sets.len(),
            sets.iter().filter(|s| s.nullable).count()
        );
        Ok(Self { sets })
    }

    pub fn of(&self, nt: NonterminalId) -> &FirstSet {
        &self.sets[nt.idx()]
    }

    pub fn of_sequence(&self, seq: &[Symbol]) -> FirstSet {
        fold_sequence(seq, |n| self.sets[n.idx()].clone())
    }

    pub fn of_symbol(&self, sym: Symbol) -> FirstSet {
        self.of_sequence(std::slice::from_ref(&sym))
    }
}

struct FirstPass<'g> {
    grammar: &'g Grammar,
    memo: Vec<Option<FirstSet>>,
    stack: Vec<NonterminalId>,
    on_stack: Vec<bool>,
    cycles: Vec<Vec<String>>,
    seen_cycles: HashSet<Vec<NonterminalId>>,
}

impl FirstPass<'_> {
    fn nonterminal(&mut self, nt: NonterminalId) -> FirstSet {
        if let Some(done) = &self.memo[nt.idx()] {
            return done.clone();
        }
        if self.on_stack[nt.idx()] {
            self.record_cycle(nt);
            return FirstSet::default();
        }

        self.stack.push(nt);
        self.on_stack[nt.idx()] = true;

        let grammar = self.grammar;
        let mut out = FirstSet::default();
        for (_, p) in grammar.productions_of(nt) {
            let f = fold_sequence(&p.rhs, |n| self.nonterminal(n));
            out.terminals.extend(f.terminals);
            out.nullable |= f.nullable;
        }

        self.on_stack[nt.idx()] = false;
        self.stack.pop();
        self.memo[nt.idx()] = Some(out.clone());
        out
    }

    fn record_cycle(&mut self, nt: NonterminalId) {
        let Some(pos) = self.stack.iter().position(|&s| s == nt) else {
            return;
        };
        let members = &self.stack[pos..];
        let mut key = members.to_vec();
        key.sort_unstable();
        if !self.seen_cycles.insert(key) {
            return;
        }
        let mut path: Vec<String> = members
            .iter()
            .map(|&m| self.grammar.nonterminal_name(m).to_string())
            .collect();
        path.push(self.grammar.nonterminal_name(nt).to_string());
        self.cycles.push(path);
    }
}
