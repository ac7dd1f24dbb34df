// src/parser/tables/encode.rs
use log::debug;

use super::{
    build::PredictionTable,
    hash::{HashConfig, Major, SymbolIndex, key_name},
    io::check_fingerprint,
    names::token_names,
};
use crate::{
    error::{Error, Result},
    grammar::{Grammar, NonterminalId, Symbol, TerminalId},
};

/// One pushed symbol, by its index in the persisted ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Terminal(u32),
    Nonterminal(u32),
}

/// `valid == false` is a syntax error; a valid bucket with `len == 0` pops
/// the nonterminal without pushing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bucket {
    pub valid: bool,
    pub offset: u32,
    pub len: u32,
}

/// Symbol orderings used for hashing, with display text and enum names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDescriptor {
    pub terminals: Vec<String>,
    pub terminal_names: Vec<String>,
    pub nonterminals: Vec<String>,
    pub nonterminal_names: Vec<String>,
}

impl SymbolDescriptor {
    pub fn new(config: &HashConfig) -> Result<Self> {
        Ok(Self {
            terminal_names: token_names(&config.terminals)?,
            terminals: config.terminals.clone(),
            nonterminal_names: token_names(&config.nonterminals)?,
            nonterminals: config.nonterminals.clone(),
        })
    }

    pub fn terminal_index(&self, display: &str) -> Option<u32> {
        self.terminals
            .iter()
            .position(|t| t == display)
            .map(|i| i as u32)
    }

    pub fn nonterminal_index(&self, display: &str) -> Option<u32> {
        self.nonterminals
            .iter()
            .position(|n| n == display)
            .map(|i| i as u32)
    }
}

/// Flat, collision-free lookup table. All payloads share `pool`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTable {
    pub symbols: SymbolDescriptor,
    pub modulus: u32,
    pub shift: u32,
    pub major: Major,
    pub buckets: Vec<Bucket>,
    pub pool: Vec<Slot>,
}

impl EncodedTable {
    /// Lays `table` out under `config`. Fails if the config was searched for
    /// different symbols or a different grammar, or if two keys share a bucket.
    pub fn encode(grammar: &Grammar, table: &PredictionTable, config: &HashConfig) -> Result<Self> {
        check_fingerprint(grammar, config)?;
        let index = SymbolIndex::resolve(grammar, config)?;
        let symbols = SymbolDescriptor::new(config)?;

        let mut buckets = vec![Bucket::default(); config.modulus as usize];
        let mut owners: Vec<Option<(NonterminalId, TerminalId)>> =
            vec![None; config.modulus as usize];
        let mut pool = Vec::with_capacity(table.total_symbol_slots(grammar));

        for ((nt, t), pred) in table.iter() {
            let b = config.bucket(index.nonterminal[nt.idx()], index.terminal[t.idx()]);
            if let Some((pnt, pt)) = owners[b] {
                return Err(Error::BucketCollision {
                    bucket: b,
                    first: key_name(grammar, pnt, pt),
                    second: key_name(grammar, nt, t),
                });
            }
            owners[b] = Some((nt, t));

            let payload = table.payload(grammar, pred);
            buckets[b] = Bucket {
                valid: true,
                offset: if payload.is_empty() { 0 } else { pool.len() as u32 },
                len: payload.len() as u32,
            };
            pool.extend(payload.iter().map(|&sym| match sym {
                Symbol::Terminal(id) => Slot::Terminal(index.terminal[id.idx()]),
                Symbol::Nonterminal(id) => Slot::Nonterminal(index.nonterminal[id.idx()]),
            }));
        }

        debug!(
            "encode: {} buckets, {} valid, {} pool slots",
            buckets.len(),
            buckets.iter().filter(|b| b.valid).count(),
            pool.len()
        );
        Ok(Self {
            symbols,
            modulus: config.modulus,
            shift: config.shift,
            major: config.major,
            buckets,
            pool,
        })
    }

    /// Bucket index for a (nonterminal, terminal) pair of persisted indices.
    #[inline]
    pub fn index(&self, nt: u32, t: u32) -> usize {
        let raw = super::hash::raw_hash(self.major, self.shift, nt, t);
        (raw % self.modulus as u64) as usize
    }

    pub fn bucket(&self, nt: u32, t: u32) -> Bucket {
        self.buckets[self.index(nt, t)]
    }

    /// The symbols to push, or `None` on a syntax error.
    pub fn lookup(&self, nt: u32, t: u32) -> Option<&[Slot]> {
        let b = self.bucket(nt, t);
        if !b.valid {
            return None;
        }
        let start = b.offset as usize;
        Some(&self.pool[start..start + b.len as usize])
    }

    pub fn valid_buckets(&self) -> usize {
        self.buckets.iter().filter(|b| b.valid).count()
    }
}
