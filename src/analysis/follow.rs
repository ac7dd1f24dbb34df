// src/analysis/follow.rs
use std::collections::BTreeSet;

use hashbrown::HashSet;
use log::{debug, trace};

use super::first::FirstSets;
use crate::grammar::{Grammar, NonterminalId, Symbol, TerminalId};

/// FOLLOW set of every nonterminal.
///
/// Each occurrence of `B` in `A -> α B β` contributes FIRST(β) \ ε directly and,
/// when β can vanish, an edge "FOLLOW(B) includes FOLLOW(A)". A nonterminal's
/// FOLLOW is the union of the direct sets of everything reachable over those
/// edges, walked with a visited set so FOLLOW cycles terminate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowSets {
    sets: Vec<BTreeSet<TerminalId>>,
}

struct FollowEdges<'g> {
    grammar: &'g Grammar,
    direct: Vec<BTreeSet<TerminalId>>,
    includes: Vec<BTreeSet<NonterminalId>>,
}

impl FollowEdges<'_> {
    fn collect(
        &self,
        nt: NonterminalId,
        ancestors: &mut HashSet<NonterminalId>,
        out: &mut BTreeSet<TerminalId>,
    ) {
        if !ancestors.insert(nt) {
            trace!(
                "follow: {} already folded in",
                self.grammar.nonterminal_name(nt)
            );
            return;
        }
        out.extend(self.direct[nt.idx()].iter().copied());
        for &parent in &self.includes[nt.idx()] {
            self.collect(parent, ancestors, out);
        }
    }
}

impl FollowSets {
    pub fn compute(grammar: &Grammar, first: &FirstSets) -> Self {
        let n = grammar.nonterminals().len();
        let mut edges = FollowEdges {
            grammar,
            direct: vec![BTreeSet::new(); n],
            includes: vec![BTreeSet::new(); n],
        };
        edges.direct[grammar.start().idx()].insert(grammar.eof());

        for p in grammar.productions() {
            for (i, &sym) in p.rhs.iter().enumerate() {
                let Symbol::Nonterminal(b) = sym else {
                    continue;
                };
                let suffix = &p.rhs[i + 1..];
                let vanishes = if suffix.is_empty() {
                    true
                } else {
                    let f = first.of_sequence(suffix);
                    edges.direct[b.idx()].extend(f.terminals);
                    f.nullable
                };
                if vanishes && p.lhs != b {
                    edges.includes[b.idx()].insert(p.lhs);
                }
            }
        }

        let sets: Vec<BTreeSet<TerminalId>> = grammar
            .nonterminal_ids()
            .map(|nt| {
                let mut out = BTreeSet::new();
                edges.collect(nt, &mut HashSet::new(), &mut out);
                out
            })
            .collect();
        debug!(
            "follow: {} sets, {} terminals total",
            sets.len(),
            sets.iter().map(BTreeSet::len).sum::<usize>()
        );
        Self { sets }
    }

    pub fn of(&self, nt: NonterminalId) -> &BTreeSet<TerminalId> {
        &self.sets[nt.idx()]
    }
}
