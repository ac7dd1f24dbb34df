// src/parser/tables/build.rs
use std::collections::BTreeMap;

use hashbrown::HashMap;
use log::debug;

use crate::{
    analysis::Analysis,
    error::{Diagnostics, Issue},
    grammar::{Grammar, NonterminalId, ProductionId, Symbol, TerminalId},
};

/// What the parser does for one (nonterminal, lookahead) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prediction {
    /// Replace the nonterminal with this production's right-hand side.
    Expand(ProductionId),
    /// Pop the nonterminal without consuming input.
    Vanish,
}

pub type TableKey = (NonterminalId, TerminalId);

/// LL(1) prediction table, keyed in id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionTable {
    entries: BTreeMap<TableKey, Prediction>,
}

impl PredictionTable {
    /// Builds the table, or reports every conflicting key.
    pub fn build(grammar: &Grammar, analysis: &Analysis) -> Result<Self, Diagnostics> {
        // key -> (source production, prediction), in proposal order
        let mut candidates: HashMap<TableKey, Vec<(ProductionId, Prediction)>> = HashMap::new();
        let mut order: Vec<TableKey> = Vec::new();
        let mut propose = |key: TableKey, source: ProductionId, pred: Prediction| {
            let slot = candidates.entry(key).or_insert_with(|| {
                order.push(key);
                Vec::new()
            });
            if !slot.iter().any(|(s, _)| *s == source) {
                slot.push((source, pred));
            }
        };

        for nt in grammar.nonterminal_ids() {
            for (id, p) in grammar.productions_of(nt) {
                let first = analysis.first.of_sequence(&p.rhs);
                for &t in &first.terminals {
                    propose((nt, t), id, Prediction::Expand(id));
                }
                if first.nullable {
                    for &t in analysis.follow.of(nt) {
                        propose((nt, t), id, Prediction::Vanish);
                    }
                }
            }
        }

        let mut issues = Vec::new();
        let mut entries = BTreeMap::new();
        for key in order {
            let slot = &candidates[&key];
            if slot.len() > 1 {
                issues.push(Issue::Conflict {
                    nonterminal: grammar.nonterminal_name(key.0).to_string(),
                    terminal: grammar.terminal_name(key.1).to_string(),
                    alternatives: slot
                        .iter()
                        .map(|(src, _)| grammar.display_production(*src))
                        .collect(),
                });
                continue;
            }
            entries.insert(key, slot[0].1);
        }
        if !issues.is_empty() {
            return Err(Diagnostics(issues));
        }

        let table = Self { entries };
        debug!(
            "table: {} keys, {} symbol slots",
            table.len(),
            table.total_symbol_slots(grammar)
        );
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, nt: NonterminalId, t: TerminalId) -> Option<Prediction> {
        self.entries.get(&(nt, t)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TableKey, Prediction)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = TableKey> + '_ {
        self.entries.keys().copied()
    }

    /// The symbols a prediction pushes, empty for `Vanish`.
    pub fn payload<'g>(&self, grammar: &'g Grammar, pred: Prediction) -> &'g [Symbol] {
        match pred {
            Prediction::Expand(id) => &grammar.production(id).rhs,
            Prediction::Vanish => &[],
        }
    }

    /// Symbol slots needed by all non-empty payloads together.
    pub fn total_symbol_slots(&self, grammar: &Grammar) -> usize {
        self.entries
            .values()
            .map(|&pred| self.payload(grammar, pred).len())
            .sum()
    }
}
