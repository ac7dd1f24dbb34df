//! Prediction-table construction and LL(1) conflict reporting.

use llpack::{
    Issue,
    analysis::Analysis,
    grammar::{Grammar, GrammarBuilder, Symbol, validate},
    parser::tables::{Prediction, PredictionTable},
};

fn epsilon() -> Vec<&'static str> {
    Vec::new()
}

fn table_of(g: &Grammar) -> Result<PredictionTable, llpack::Diagnostics> {
    let analysis = Analysis::compute(g)?;
    PredictionTable::build(g, &analysis)
}

#[test]
fn optional_terminal_table() {
    let g = GrammarBuilder::new("<S>")
        .terminal("a")
        .rule("<S>", ["a"])
        .rule("<S>", epsilon())
        .build()
        .expect("valid grammar");
    let analysis = Analysis::compute(&g).expect("analysis");
    let table = PredictionTable::build(&g, &analysis).expect("LL(1)");

    let s = g.nonterminal_id("<S>").unwrap();
    let a = g.terminal_id("a").unwrap();
    let eof = g.eof();

    let follow: Vec<_> = analysis.follow.of(s).iter().copied().collect();
    assert_eq!(follow, vec![eof]);

    assert_eq!(table.len(), 2);
    let expand = table.get(s, a).expect("[S, a]");
    assert!(matches!(expand, Prediction::Expand(_)));
    assert_eq!(table.payload(&g, expand), &[Symbol::Terminal(a)]);
    assert_eq!(table.get(s, eof), Some(Prediction::Vanish));
    assert!(table.payload(&g, Prediction::Vanish).is_empty());
    assert_eq!(table.total_symbol_slots(&g), 1);
}

#[test]
fn default_grammar_entries_follow_from_first_and_follow() {
    let g = Grammar::default_grammar().expect("default grammar");
    let analysis = Analysis::compute(&g).expect("analysis");
    let table = PredictionTable::build(&g, &analysis).expect("default grammar is LL(1)");
    assert!(!table.is_empty());

    for ((nt, t), pred) in table.iter() {
        match pred {
            Prediction::Expand(id) => {
                let p = g.production(id);
                assert_eq!(p.lhs, nt, "{}", g.display_production(id));
                assert!(
                    analysis.first.of_sequence(&p.rhs).contains(t),
                    "[{}, {}] -> {}",
                    g.nonterminal_name(nt),
                    g.terminal_name(t),
                    g.display_production(id)
                );
            }
            Prediction::Vanish => {
                assert!(analysis.follow.of(nt).contains(&t));
                assert!(
                    g.productions_of(nt)
                        .any(|(_, p)| analysis.first.of_sequence(&p.rhs).nullable),
                    "{} has no nullable production",
                    g.nonterminal_name(nt)
                );
            }
        }
    }

    // Every FIRST terminal of every production is a key.
    for (id, p) in g.productions().iter().enumerate() {
        for &t in &analysis.first.of_sequence(&p.rhs).terminals {
            assert!(
                table.get(p.lhs, t).is_some(),
                "missing [{}, {}] for production {id}",
                g.nonterminal_name(p.lhs),
                g.terminal_name(t)
            );
        }
    }

    let slots: usize = table.iter().map(|(_, pred)| table.payload(&g, pred).len()).sum();
    assert_eq!(table.total_symbol_slots(&g), slots);
}

#[test]
fn common_prefix_is_a_conflict() {
    let g = GrammarBuilder::new("<S>")
        .terminals(["a", "b", "c"])
        .rule("<S>", ["a", "b"])
        .rule("<S>", ["a", "c"])
        .build()
        .expect("valid grammar");
    let err = table_of(&g).expect_err("conflict");
    assert_eq!(
        err.issues(),
        &[Issue::Conflict {
            nonterminal: "<S>".into(),
            terminal: "a".into(),
            alternatives: vec!["<S> -> a b".into(), "<S> -> a c".into()],
        }]
    );
}

#[test]
fn two_vanishing_alternatives_conflict() {
    let g = GrammarBuilder::new("<S>")
        .terminal("a")
        .rule("<S>", ["<A>"])
        .rule("<S>", epsilon())
        .rule("<A>", epsilon())
        .rule("<A>", ["a"])
        .build()
        .expect("valid grammar");
    let err = table_of(&g).expect_err("conflict");
    let conflicts: Vec<_> = err.conflicts().collect();
    assert_eq!(conflicts.len(), 1);
    assert!(matches!(
        conflicts[0],
        Issue::Conflict { nonterminal, terminal, .. } if nonterminal == "<S>" && terminal == "$"
    ));
}

#[test]
fn all_conflicts_are_reported_together() {
    let g = GrammarBuilder::new("<S>")
        .terminals(["a", "b", "x", "y"])
        .rule("<S>", ["<P>", "<Q>"])
        .rule("<P>", ["a", "x"])
        .rule("<P>", ["a", "y"])
        .rule("<Q>", ["b"])
        .rule("<Q>", ["b", "b"])
        .build()
        .expect("valid grammar");
    let err = table_of(&g).expect_err("conflicts");
    let keys: Vec<(String, String)> = err
        .conflicts()
        .map(|c| match c {
            Issue::Conflict {
                nonterminal,
                terminal,
                ..
            } => (nonterminal.clone(), terminal.clone()),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(
        keys,
        vec![
            ("<P>".to_string(), "a".to_string()),
            ("<Q>".to_string(), "b".to_string())
        ]
    );
}

#[test]
fn redundant_assignment_alternative_conflicts_on_equals() {
    // Shape of the assignment/call split before the redundant `'=' ...`
    // alternative was dropped from the shipped grammar.
    let g = GrammarBuilder::new("<rest>")
        .terminals(["(", ")", ",", "=", "id", "e"])
        .rule("<rest>", ["(", ")"])
        .rule("<rest>", ["<ids>", "=", "e"])
        .rule("<rest>", ["=", "e"])
        .rule("<ids>", [",", "id", "<ids>"])
        .rule("<ids>", epsilon())
        .build()
        .expect("valid grammar");
    let err = table_of(&g).expect_err("conflict");
    let conflicts: Vec<_> = err.conflicts().collect();
    assert_eq!(conflicts.len(), 1);
    assert!(matches!(
        conflicts[0],
        Issue::Conflict { terminal, alternatives, .. }
            if terminal == "=" && alternatives.len() == 2
    ));
}

#[test]
fn default_grammar_advisories() {
    let g = Grammar::default_grammar().expect("default grammar");
    let advisories = validate::check(&g);
    assert_eq!(
        advisories,
        vec![
            validate::Advisory::Unreachable("<assignment>".into()),
            validate::Advisory::Unreachable("<identifier-list>".into()),
        ]
    );
}

#[test]
fn duplicate_production_is_advisory() {
    let g = GrammarBuilder::new("<S>")
        .terminal("a")
        .rule("<S>", ["a"])
        .rule("<S>", ["a"])
        .build()
        .expect("valid grammar");
    let advisories = validate::check(&g);
    assert_eq!(
        advisories,
        vec![validate::Advisory::DuplicateProduction("<S> -> a".into())]
    );
    // Identical alternatives propose the same key from two productions.
    assert!(table_of(&g).is_err());
}

#[test]
fn default_grammar_compiles() {
    let g = Grammar::default_grammar().expect("default grammar");
    let terminals = g.terminals().len();
    let compiled = llpack::compile(g).expect("compiles");
    assert_eq!(compiled.grammar.terminals().len(), terminals);
    assert_eq!(compiled.grammar.nonterminal_name(compiled.grammar.start()), "<program>");
    assert!(compiled.grammar.terminal_id("<identifier>").is_some());
    assert!(compiled.grammar.nonterminal_id("<identifier>").is_none());
}
