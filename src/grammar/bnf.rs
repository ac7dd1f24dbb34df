// src/grammar/bnf.rs
// Textual grammar input.
//
//   <program> ::= 'require' <string> <global-statement-list>
//   <global-statement-list> ::= <global-statement> <global-statement-list> | ""
//
//   * 'lit' / "lit"       terminal literal
//   * ""                  epsilon (may only stand alone)
//   * <name> with rules   nonterminal
//   * <name> w/o rules    token-class terminal, display text keeps the brackets
//
// The first rule's left-hand side is the start symbol unless one is given.

use ::bnf::{Grammar as BnfGrammar, Term};
use indexmap::IndexSet;
use log::debug;

use super::{Grammar, GrammarBuilder};
use crate::error::{Error, Result};

fn display(term: &Term) -> String {
    match term {
        Term::Terminal(s) => s.clone(),
        Term::Nonterminal(s) => format!("<{s}>"),
    }
}

pub fn parse_bnf(src: &str, start: Option<&str>) -> Result<Grammar> {
    let parsed: BnfGrammar = src.parse().map_err(|e| Error::Bnf(format!("{e}")))?;

    let mut lhs_names: IndexSet<String> = IndexSet::new();
    for prod in parsed.productions_iter() {
        lhs_names.insert(display(&prod.lhs));
    }
    let Some(first_lhs) = lhs_names.first().cloned() else {
        return Err(Error::Bnf("grammar has no productions".into()));
    };
    let start = start.map(str::to_string).unwrap_or(first_lhs);

    let mut builder = GrammarBuilder::new(start);
    let mut terminals: IndexSet<String> = IndexSet::new();
    for prod in parsed.productions_iter() {
        let lhs = display(&prod.lhs);
        for expr in prod.rhs_iter() {
            let mut rhs = Vec::new();
            for term in expr.terms_iter() {
                match term {
                    Term::Terminal(s) if s.is_empty() => {}
                    Term::Terminal(s) => {
                        terminals.insert(s.clone());
                        rhs.push(s.clone());
                    }
                    Term::Nonterminal(_) => {
                        let name = display(term);
                        if !lhs_names.contains(&name) {
                            terminals.insert(name.clone());
                        }
                        rhs.push(name);
                    }
                }
            }
            builder = builder.rule(lhs.clone(), rhs);
        }
    }
    debug!(
        "bnf: {} rules, {} inferred terminals",
        lhs_names.len(),
        terminals.len()
    );

    Ok(builder.terminals(terminals).build()?)
}
