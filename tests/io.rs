//! Hash-config persistence.

use std::{fs, path::PathBuf};

use llpack::{
    Error,
    grammar::{Fingerprint, Grammar},
    parser::tables::{
        FileCheckpoint, HashConfig, Major, SearchOptions, SearchState, Searcher, load_checked,
        load_hash_config, save_hash_config,
    },
};

fn scratch_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("llpack-io-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir.join(name)
}

fn sample() -> HashConfig {
    HashConfig {
        terminals: vec!["a".into(), "$".into()],
        nonterminals: vec!["<S>".into()],
        modulus: 2,
        shift: 6,
        major: Major::Terminal,
        fingerprint: Some(Fingerprint(0x0123_4567_89ab_cdef)),
    }
}

#[test]
fn save_then_load() {
    let path = scratch_path("roundtrip/parser_hash.json");
    let config = sample();
    save_hash_config(&path, &config).expect("save");
    assert_eq!(load_hash_config(&path).expect("load"), config);
    assert!(!path.with_extension("json.tmp").exists());

    let text = fs::read_to_string(&path).expect("read");
    let json: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(json["ts"], serde_json::json!(["a", "$"]));
    assert_eq!(json["nts"], serde_json::json!(["<S>"]));
    assert_eq!(json["mod"], 2);
    assert_eq!(json["shift"], 6);
    assert_eq!(json["nt-main"], false);
    assert_eq!(json["fingerprint"], "0123456789abcdef");
}

#[test]
fn config_without_fingerprint_loads() {
    let path = scratch_path("legacy.json");
    fs::write(
        &path,
        r#"{"ts": ["a", "$"], "nts": ["<S>"], "mod": 2, "shift": 6, "nt-main": true}"#,
    )
    .expect("write");
    let config = load_hash_config(&path).expect("load");
    assert_eq!(config.fingerprint, None);
    assert_eq!(config.major, Major::Nonterminal);

    let mut saved = config.clone();
    saved.modulus = 3;
    save_hash_config(&path, &saved).expect("save");
    let text = fs::read_to_string(&path).expect("read");
    assert!(!text.contains("fingerprint"));
}

#[test]
fn missing_config() {
    let path = scratch_path("does-not-exist.json");
    let err = load_hash_config(&path).expect_err("missing");
    assert!(matches!(err, Error::MissingConfig(p) if p == path));
}

#[test]
fn malformed_configs() {
    let path = scratch_path("zero-mod.json");
    fs::write(
        &path,
        r#"{"ts": [], "nts": [], "mod": 0, "shift": 6, "nt-main": true}"#,
    )
    .expect("write");
    assert!(matches!(
        load_hash_config(&path),
        Err(Error::InvalidConfig(_))
    ));

    let path = scratch_path("truncated.json");
    fs::write(&path, r#"{"ts": ["a""#).expect("write");
    assert!(matches!(load_hash_config(&path), Err(Error::Json(_))));

    let path = scratch_path("bad-fingerprint.json");
    fs::write(
        &path,
        r#"{"ts": [], "nts": [], "mod": 1, "shift": 6, "nt-main": true, "fingerprint": "xyz"}"#,
    )
    .expect("write");
    assert!(matches!(load_hash_config(&path), Err(Error::Json(_))));
}

#[test]
fn file_checkpoint_feeds_load_checked() {
    let g = Grammar::default_grammar().expect("default grammar");
    let c = llpack::compile(g).expect("LL(1)");
    let path = scratch_path("search/parser_hash.json");
    let _ = fs::remove_file(&path);

    let opts = SearchOptions {
        seed: 17,
        max_trials: Some(30),
        progress_every: 0,
        ..SearchOptions::default()
    };
    let mut sink = FileCheckpoint::new(&path);
    let state = Searcher::new(&c.grammar, &c.table, opts)
        .run(SearchState::new(), &mut sink)
        .expect("search");
    assert!(sink.writes >= 1);
    assert_eq!(sink.path(), path.as_path());

    let loaded = load_checked(&path, &c.grammar).expect("fresh config");
    assert_eq!(Some(loaded), state.best);
}

#[test]
fn fingerprint_ignores_rule_order() {
    let a = llpack::grammar::GrammarBuilder::new("<S>")
        .terminals(["x", "y"])
        .rule("<S>", ["<A>", "<B>"])
        .rule("<A>", ["x"])
        .rule("<B>", ["y"])
        .build()
        .expect("valid grammar");
    let b = llpack::grammar::GrammarBuilder::new("<S>")
        .terminals(["y", "x"])
        .rule("<B>", ["y"])
        .rule("<S>", ["<A>", "<B>"])
        .rule("<A>", ["x"])
        .build()
        .expect("valid grammar");
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(
        a.fingerprint().to_string().parse::<Fingerprint>().expect("hex"),
        a.fingerprint()
    );

    let c = llpack::grammar::GrammarBuilder::new("<S>")
        .terminals(["x", "y"])
        .rule("<S>", ["<B>", "<A>"])
        .rule("<A>", ["x"])
        .rule("<B>", ["y"])
        .build()
        .expect("valid grammar");
    assert_ne!(a.fingerprint(), c.fingerprint());
}
