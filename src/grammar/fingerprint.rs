// src/grammar/fingerprint.rs
// Stable content hash of a grammar, persisted next to the hash config so a
// stale config is caught at load time. FNV-1a 64, independent of rule order.

use std::{fmt, str::FromStr};

use super::Grammar;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub u64);

struct Fnv(u64);

impl Fnv {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    // Length-prefixed so ["ab","c"] and ["a","bc"] differ.
    fn write_str(&mut self, s: &str) {
        self.write(&(s.len() as u32).to_le_bytes());
        self.write(s.as_bytes());
    }
}

impl Fingerprint {
    pub fn of(grammar: &Grammar) -> Self {
        let mut h = Fnv(FNV_OFFSET);
        h.write_str(grammar.nonterminal_name(grammar.start()));

        let mut terminals: Vec<&str> = grammar.terminals().iter().map(String::as_str).collect();
        terminals.sort_unstable();
        h.write(&(terminals.len() as u32).to_le_bytes());
        for t in terminals {
            h.write_str(t);
        }

        let mut nts: Vec<_> = grammar.nonterminal_ids().collect();
        nts.sort_by(|a, b| grammar.nonterminal_name(*a).cmp(grammar.nonterminal_name(*b)));
        for nt in nts {
            h.write_str(grammar.nonterminal_name(nt));
            for (_, p) in grammar.productions_of(nt) {
                h.write(&(p.rhs.len() as u32).to_le_bytes());
                for &sym in &p.rhs {
                    // Tag the kind: `<x>` may be a token class or a rule.
                    h.write(&[matches!(sym, super::Symbol::Nonterminal(_)) as u8]);
                    h.write_str(grammar.symbol_name(sym));
                }
            }
        }
        Fingerprint(h.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s.trim_start_matches("0x"), 16).map(Fingerprint)
    }
}
