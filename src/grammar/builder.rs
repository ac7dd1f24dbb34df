// src/grammar/builder.rs
use indexmap::{IndexMap, IndexSet};
use log::debug;

use super::{EOF, Grammar, NonterminalId, Production, ProductionId, Symbol, TerminalId};
use crate::error::{Diagnostics, Issue};

/// Authoring front-end for [`Grammar`]. Symbols are referenced by display text
/// and resolved once in [`GrammarBuilder::build`].
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    start: String,
    terminals: IndexSet<String>,
    rules: IndexMap<String, Vec<Vec<String>>>,
}

impl GrammarBuilder {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            terminals: IndexSet::new(),
            rules: IndexMap::new(),
        }
    }

    pub fn terminal(mut self, name: impl Into<String>) -> Self {
        self.terminals.insert(name.into());
        self
    }

    pub fn terminals<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terminals.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds one production. An empty `rhs` is an epsilon production.
    pub fn rule<I, S>(mut self, lhs: impl Into<String>, rhs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules
            .entry(lhs.into())
            .or_default()
            .push(rhs.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> Result<Grammar, Diagnostics> {
        let mut issues: Vec<Issue> = Vec::new();
        let mut push = |issue: Issue| {
            if !issues.contains(&issue) {
                issues.push(issue);
            }
        };

        if !self.rules.contains_key(&self.start) {
            push(Issue::UndefinedStart(self.start.clone()));
        }
        for name in self.terminals.iter() {
            if self.rules.contains_key(name) {
                push(Issue::TerminalHasRules(name.clone()));
            }
        }
        if self.rules.contains_key(EOF) {
            push(Issue::ReservedSymbol(EOF.to_string()));
        }

        let nonterminals: Vec<String> = self.rules.keys().cloned().collect();
        let mut terminals: Vec<String> = self
            .terminals
            .iter()
            .filter(|t| t.as_str() != EOF)
            .cloned()
            .collect();
        terminals.push(EOF.to_string());
        let eof = TerminalId((terminals.len() - 1) as u32);

        let mut productions = Vec::new();
        let mut by_lhs = vec![Vec::new(); nonterminals.len()];
        for (lhs_idx, (lhs, alternatives)) in self.rules.iter().enumerate() {
            let lhs_id = NonterminalId(lhs_idx as u32);
            for alt in alternatives {
                let mut rhs = Vec::with_capacity(alt.len());
                for name in alt {
                    if name == EOF {
                        push(Issue::ReservedSymbol(EOF.to_string()));
                    } else if let Some(i) = self.rules.get_index_of(name) {
                        rhs.push(Symbol::Nonterminal(NonterminalId(i as u32)));
                    } else if let Some(i) = terminals.iter().position(|t| t == name) {
                        rhs.push(Symbol::Terminal(TerminalId(i as u32)));
                    } else {
                        push(Issue::UnresolvedSymbol {
                            lhs: lhs.clone(),
                            symbol: name.clone(),
                        });
                    }
                }
                by_lhs[lhs_idx].push(ProductionId(productions.len() as u32));
                productions.push(Production { lhs: lhs_id, rhs });
            }
        }

        if !issues.is_empty() {
            return Err(Diagnostics(issues));
        }

        let start = NonterminalId(self.rules.get_index_of(&self.start).unwrap_or(0) as u32);
        debug!(
            "grammar: {} terminals, {} nonterminals, {} productions, start {}",
            terminals.len(),
            nonterminals.len(),
            productions.len(),
            self.start
        );
        Ok(Grammar {
            terminals,
            nonterminals,
            productions,
            by_lhs,
            start,
            eof,
        })
    }
}
