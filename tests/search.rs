//! Perfect-hash search: pigeonhole floor, injectivity, checkpoints, resume
//! and determinism of the parallel driver.

use hashbrown::HashSet;
use llpack::{
    Compiled, Error,
    grammar::{Grammar, GrammarBuilder},
    parser::tables::{
        HashConfig, Major, MemoryCheckpoint, SearchOptions, SearchState, Searcher,
        hash::{SymbolIndex, raw_hashes},
    },
};

fn optional_terminal() -> Compiled {
    let g = GrammarBuilder::new("<S>")
        .terminal("a")
        .rule("<S>", ["a"])
        .rule("<S>", Vec::<&str>::new())
        .build()
        .expect("valid grammar");
    llpack::compile(g).expect("LL(1)")
}

fn default_compiled() -> Compiled {
    llpack::compile(Grammar::default_grammar().expect("default grammar")).expect("LL(1)")
}

fn options(seed: u64, max_trials: u64) -> SearchOptions {
    SearchOptions {
        seed,
        max_trials: Some(max_trials),
        progress_every: 0,
        ..SearchOptions::default()
    }
}

/// Buckets of every key under `config`; panics on a collision.
fn assert_injective(c: &Compiled, config: &HashConfig) {
    let index = SymbolIndex::resolve(&c.grammar, config).expect("symbols match");
    let mut seen = HashSet::new();
    for (nt, t) in c.table.keys() {
        let b = config.bucket(index.nonterminal[nt.idx()], index.terminal[t.idx()]);
        assert!(b < config.modulus as usize);
        assert!(
            seen.insert(b),
            "bucket {b} reused by [{}, {}]",
            c.grammar.nonterminal_name(nt),
            c.grammar.terminal_name(t)
        );
    }
}

#[test]
fn optional_terminal_packs_into_two_buckets() {
    let c = optional_terminal();
    let order = SymbolIndex::from_order(
        &c.grammar.terminal_ids().collect::<Vec<_>>(),
        &c.grammar.nonterminal_ids().collect::<Vec<_>>(),
    );
    for major in Major::BOTH {
        let raws = raw_hashes(&c.grammar, &c.table, &order, major, 6).expect("no raw collision");
        assert_eq!(raws.len(), 2);
        assert_ne!(raws[0], raws[1]);
    }

    let searcher = Searcher::new(&c.grammar, &c.table, options(0, 1));
    let mut sink = MemoryCheckpoint::default();
    let state = searcher.run(SearchState::new(), &mut sink).expect("search");

    assert_eq!(state.trials, 1);
    let best = state.best.expect("first trial always finds a config");
    assert_eq!(best.modulus, 2);
    assert_eq!(best.shift, 6);
    assert_eq!(best.fingerprint, Some(c.grammar.fingerprint()));
    assert_eq!(sink.saved.len(), 1);
    assert_injective(&c, &best);
}

#[test]
fn first_trial_always_yields_a_config() {
    let c = default_compiled();
    let searcher = Searcher::new(&c.grammar, &c.table, options(11, 1));
    let mut sink = MemoryCheckpoint::default();
    let state = searcher.run(SearchState::new(), &mut sink).expect("search");
    assert_eq!(sink.saved.len(), 1);
    let best = state.best.expect("config");
    assert_eq!(best.terminals, c.grammar.terminals());
    assert_eq!(best.nonterminals, c.grammar.nonterminals());
}

#[test]
fn checkpoints_strictly_shrink_and_stay_injective() {
    let c = default_compiled();
    let searcher = Searcher::new(&c.grammar, &c.table, options(7, 200));
    let mut sink = MemoryCheckpoint::default();
    let state = searcher.run(SearchState::new(), &mut sink).expect("search");

    assert_eq!(state.trials, 200);
    assert!(!sink.saved.is_empty());
    for pair in sink.saved.windows(2) {
        assert!(pair[1].modulus < pair[0].modulus);
    }
    for config in &sink.saved {
        assert!(config.modulus as usize >= c.table.len());
        assert_injective(&c, config);
    }
    assert_eq!(state.best.as_ref(), sink.saved.last());
}

#[test]
fn closure_checkpoint() {
    let c = default_compiled();
    let searcher = Searcher::new(&c.grammar, &c.table, options(3, 25));
    let mut moduli = Vec::new();
    let mut sink = |config: &HashConfig| -> llpack::Result<()> {
        moduli.push(config.modulus);
        Ok(())
    };
    let state = searcher.run(SearchState::new(), &mut sink).expect("search");
    assert_eq!(moduli.last().copied(), state.best_modulus());
}

#[test]
fn failing_checkpoint_aborts_the_search() {
    let c = optional_terminal();
    let searcher = Searcher::new(&c.grammar, &c.table, options(0, 10));
    let mut sink = |_: &HashConfig| -> llpack::Result<()> {
        Err(Error::InvalidConfig("disk full".into()))
    };
    let err = searcher
        .run(SearchState::new(), &mut sink)
        .expect_err("checkpoint error propagates");
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn resume_at_the_floor_finds_nothing_better() {
    let c = optional_terminal();
    let searcher = Searcher::new(&c.grammar, &c.table, options(0, 1));
    let state = searcher
        .run(SearchState::new(), &mut MemoryCheckpoint::default())
        .expect("search");
    let best = state.best.expect("config");

    let searcher = Searcher::new(&c.grammar, &c.table, options(5, 20));
    let mut sink = MemoryCheckpoint::default();
    let resumed = searcher
        .run(SearchState::resume(best.clone()), &mut sink)
        .expect("search");
    assert!(sink.saved.is_empty());
    assert_eq!(resumed.trials, 20);
    assert_eq!(resumed.best, Some(best));
}

#[test]
fn narrow_shift_is_a_raw_collision() {
    // With shift 0, [<S>, b] and [<T>, a] both hash to 1.
    let g = GrammarBuilder::new("<S>")
        .terminals(["a", "b"])
        .rule("<S>", ["a", "<T>"])
        .rule("<S>", ["b"])
        .rule("<T>", ["a"])
        .rule("<T>", ["b"])
        .build()
        .expect("valid grammar");
    let c = llpack::compile(g).expect("LL(1)");
    let searcher = Searcher::new(
        &c.grammar,
        &c.table,
        SearchOptions {
            shift: 0,
            ..options(0, 5)
        },
    );
    let mut sink = MemoryCheckpoint::default();
    let err = searcher
        .run(SearchState::new(), &mut sink)
        .expect_err("raw collision");
    assert!(matches!(err, Error::RawHashCollision { shift: 0, .. }));
    assert!(sink.saved.is_empty());
}

#[test]
fn parallel_search_depends_only_on_the_seed() {
    let c = default_compiled();
    let opts = SearchOptions {
        workers: 4,
        ..options(42, 32)
    };
    let searcher = Searcher::new(&c.grammar, &c.table, opts);

    let mut first = MemoryCheckpoint::default();
    let a = searcher.search(SearchState::new(), &mut first).expect("search");
    let mut second = MemoryCheckpoint::default();
    let b = searcher.search(SearchState::new(), &mut second).expect("search");

    assert_eq!(a.trials, 32);
    assert_eq!(a.best, b.best);
    assert_eq!(first.saved, second.saved);
    for pair in first.saved.windows(2) {
        assert!(pair[1].modulus < pair[0].modulus);
    }
    // Trial 0 keeps grammar order, so round one matches the sequential first trial.
    let sequential = Searcher::new(&c.grammar, &c.table, options(42, 1))
        .run(SearchState::new(), &mut MemoryCheckpoint::default())
        .expect("search");
    assert!(a.best_modulus() <= sequential.best_modulus());
    if let Some(best) = &a.best {
        assert_injective(&c, best);
    }
}

/// Grammar order, nonterminal-major, no fingerprint: what an old config on
/// disk looks like.
fn unfingerprinted(c: &Compiled, modulus: u32) -> HashConfig {
    HashConfig {
        terminals: c.grammar.terminals().to_vec(),
        nonterminals: c.grammar.nonterminals().to_vec(),
        modulus,
        shift: 6,
        major: Major::Nonterminal,
        fingerprint: None,
    }
}

#[test]
fn colliding_config_is_not_resumed() {
    let c = default_compiled();
    let err = SearchState::resume_checked(&c.grammar, &c.table, unfingerprinted(&c, 5))
        .expect_err("five buckets cannot hold every key");
    assert!(matches!(err, Error::BucketCollision { .. }));

    // Starting over instead finds and checkpoints a usable config.
    let searcher = Searcher::new(&c.grammar, &c.table, options(4, 10));
    let mut sink = MemoryCheckpoint::default();
    let state = searcher.run(SearchState::new(), &mut sink).expect("search");
    assert!(!sink.saved.is_empty());
    assert_injective(&c, state.best.as_ref().expect("config"));
}

#[test]
fn resume_checks_symbols_and_fingerprint() {
    let c = default_compiled();

    let mut missing = unfingerprinted(&c, 1 << 12);
    missing.nonterminals.pop();
    assert!(matches!(
        SearchState::resume_checked(&c.grammar, &c.table, missing),
        Err(Error::SymbolMismatch { kind: "nonterminals", .. })
    ));

    let mut stale = unfingerprinted(&c, 1 << 12);
    stale.fingerprint = Some(optional_terminal().grammar.fingerprint());
    assert!(matches!(
        SearchState::resume_checked(&c.grammar, &c.table, stale),
        Err(Error::StaleConfig { .. })
    ));

    let zero = unfingerprinted(&c, 0);
    assert!(matches!(
        SearchState::resume_checked(&c.grammar, &c.table, zero),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn fitting_config_is_resumed() {
    let c = default_compiled();
    // One row of 64 buckets per nonterminal never collides.
    let wide = unfingerprinted(&c, (c.grammar.nonterminals().len() as u32) << 6);
    let state =
        SearchState::resume_checked(&c.grammar, &c.table, wide.clone()).expect("fits the table");
    assert_eq!(state.best, Some(wide));
    assert_eq!(state.trials, 0);

    let searched = Searcher::new(&c.grammar, &c.table, options(2, 5))
        .run(SearchState::new(), &mut MemoryCheckpoint::default())
        .expect("search")
        .best
        .expect("config");
    let resumed = SearchState::resume_checked(&c.grammar, &c.table, searched.clone())
        .expect("fresh config");
    assert_eq!(resumed.best_modulus(), Some(searched.modulus));
}
