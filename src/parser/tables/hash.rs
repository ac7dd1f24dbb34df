// src/parser/tables/hash.rs
// Perfect hash over the prediction table's keys:
//
//   bucket(nt, t) = ((major << shift) + minor) % modulus
//
// where (major, minor) is (nt, t) or (t, nt) depending on `Major`, and the
// indices are positions in the persisted symbol orderings.

use super::build::PredictionTable;
use crate::{
    error::{Error, Result},
    grammar::{Fingerprint, Grammar, NonterminalId, TerminalId},
};

pub const DEFAULT_SHIFT: u32 = 6;

/// Which symbol's index occupies the high bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Major {
    Nonterminal,
    Terminal,
}

impl Major {
    pub const BOTH: [Major; 2] = [Major::Nonterminal, Major::Terminal];

    pub fn tag(self) -> &'static str {
        match self {
            Major::Nonterminal => "nt",
            Major::Terminal => "t",
        }
    }
}

#[inline]
pub fn raw_hash(major: Major, shift: u32, nt: u32, t: u32) -> u64 {
    let (hi, lo) = match major {
        Major::Nonterminal => (nt, t),
        Major::Terminal => (t, nt),
    };
    ((hi as u64) << shift) + lo as u64
}

/// A persisted search result. Symbol orderings are by display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashConfig {
    pub terminals: Vec<String>,
    pub nonterminals: Vec<String>,
    pub modulus: u32,
    pub shift: u32,
    pub major: Major,
    pub fingerprint: Option<Fingerprint>,
}

impl HashConfig {
    #[inline]
    pub fn bucket(&self, nt_index: u32, t_index: u32) -> usize {
        (raw_hash(self.major, self.shift, nt_index, t_index) % self.modulus as u64) as usize
    }
}

/// A HashConfig resolved against a grammar: id -> persisted index.
#[derive(Debug, Clone)]
pub struct SymbolIndex {
    pub terminal: Vec<u32>,
    pub nonterminal: Vec<u32>,
}

impl SymbolIndex {
    pub fn from_order(terminals: &[TerminalId], nonterminals: &[NonterminalId]) -> Self {
        let mut terminal = vec![0u32; terminals.len()];
        for (i, t) in terminals.iter().enumerate() {
            terminal[t.idx()] = i as u32;
        }
        let mut nonterminal = vec![0u32; nonterminals.len()];
        for (i, n) in nonterminals.iter().enumerate() {
            nonterminal[n.idx()] = i as u32;
        }
        Self {
            terminal,
            nonterminal,
        }
    }

    /// Checks that `config` orders exactly the grammar's symbols and maps them to ids.
    pub fn resolve(grammar: &Grammar, config: &HashConfig) -> Result<Self> {
        let terminals = resolve_names(
            "terminals",
            grammar.terminals(),
            &config.terminals,
            |name| grammar.terminal_id(name),
        )?;
        let nonterminals = resolve_names(
            "nonterminals",
            grammar.nonterminals(),
            &config.nonterminals,
            |name| grammar.nonterminal_id(name),
        )?;
        Ok(Self::from_order(&terminals, &nonterminals))
    }
}

fn resolve_names<Id, F>(
    kind: &'static str,
    expected: &[String],
    persisted: &[String],
    lookup: F,
) -> Result<Vec<Id>>
where
    F: Fn(&str) -> Option<Id>,
{
    let missing: Vec<String> = expected
        .iter()
        .filter(|e| !persisted.contains(e))
        .cloned()
        .collect();
    let mut extra: Vec<String> = Vec::new();
    let mut ids = Vec::with_capacity(persisted.len());
    for name in persisted {
        match lookup(name) {
            Some(id) => ids.push(id),
            None => extra.push(name.clone()),
        }
    }
    if !missing.is_empty() || !extra.is_empty() || persisted.len() != expected.len() {
        return Err(Error::SymbolMismatch {
            kind,
            missing,
            extra,
        });
    }
    Ok(ids)
}

/// Raw hashes of every table key under one orientation, or the first collision.
pub fn raw_hashes(
    grammar: &Grammar,
    table: &PredictionTable,
    index: &SymbolIndex,
    major: Major,
    shift: u32,
) -> Result<Vec<u64>> {
    let mut raws = Vec::with_capacity(table.len());
    let mut owners: hashbrown::HashMap<u64, (NonterminalId, TerminalId)> =
        hashbrown::HashMap::with_capacity(table.len());
    for (nt, t) in table.keys() {
        let raw = raw_hash(
            major,
            shift,
            index.nonterminal[nt.idx()],
            index.terminal[t.idx()],
        );
        if let Some(&(pnt, pt)) = owners.get(&raw) {
            return Err(Error::RawHashCollision {
                first: key_name(grammar, pnt, pt),
                second: key_name(grammar, nt, t),
                shift,
            });
        }
        owners.insert(raw, (nt, t));
        raws.push(raw);
    }
    Ok(raws)
}

/// Fails unless `config` covers the grammar's symbols and gives every key of
/// `table` its own bucket.
pub fn verify_injective(
    grammar: &Grammar,
    table: &PredictionTable,
    config: &HashConfig,
) -> Result<()> {
    if config.modulus == 0 {
        return Err(Error::InvalidConfig("modulus must be positive".into()));
    }
    let index = SymbolIndex::resolve(grammar, config)?;
    let mut owners: hashbrown::HashMap<usize, (NonterminalId, TerminalId)> =
        hashbrown::HashMap::with_capacity(table.len());
    for (nt, t) in table.keys() {
        let b = config.bucket(index.nonterminal[nt.idx()], index.terminal[t.idx()]);
        if let Some(&(pnt, pt)) = owners.get(&b) {
            return Err(Error::BucketCollision {
                bucket: b,
                first: key_name(grammar, pnt, pt),
                second: key_name(grammar, nt, t),
            });
        }
        owners.insert(b, (nt, t));
    }
    Ok(())
}

pub fn key_name(grammar: &Grammar, nt: NonterminalId, t: TerminalId) -> String {
    format!(
        "{}, {}",
        grammar.nonterminal_name(nt),
        grammar.terminal_name(t)
    )
}
