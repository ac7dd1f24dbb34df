// src/grammar/mod.rs
pub mod bnf;
pub mod builder;
pub mod fingerprint;
pub mod validate;

pub use builder::GrammarBuilder;
pub use fingerprint::Fingerprint;

/// Display text of the end-of-input terminal.
pub const EOF: &str = "$";

/// The language grammar the compiler front-end is built against.
pub const DEFAULT_GRAMMAR: &str = include_str!("../../grammar/ifj21.bnf");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonterminalId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductionId(pub u32);

impl TerminalId {
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}
impl NonterminalId {
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}
impl ProductionId {
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Terminal(TerminalId),
    Nonterminal(NonterminalId),
}

/// One expansion of `lhs`. An empty `rhs` is the epsilon derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub lhs: NonterminalId,
    pub rhs: Vec<Symbol>,
}

impl Production {
    pub fn is_epsilon(&self) -> bool {
        self.rhs.is_empty()
    }
}

/// Immutable grammar. Ids index straight into the name tables.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) terminals: Vec<String>,
    pub(crate) nonterminals: Vec<String>,
    pub(crate) productions: Vec<Production>,
    pub(crate) by_lhs: Vec<Vec<ProductionId>>,
    pub(crate) start: NonterminalId,
    pub(crate) eof: TerminalId,
}

impl Grammar {
    /// Loads the built-in grammar.
    pub fn default_grammar() -> crate::error::Result<Grammar> {
        bnf::parse_bnf(DEFAULT_GRAMMAR, None)
    }

    pub fn terminals(&self) -> &[String] {
        &self.terminals
    }

    pub fn nonterminals(&self) -> &[String] {
        &self.nonterminals
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id.idx()]
    }

    pub fn productions_of(
        &self,
        nt: NonterminalId,
    ) -> impl Iterator<Item = (ProductionId, &Production)> + '_ {
        self.by_lhs[nt.idx()]
            .iter()
            .map(move |&id| (id, &self.productions[id.idx()]))
    }

    pub fn terminal_ids(&self) -> impl Iterator<Item = TerminalId> {
        (0..self.terminals.len() as u32).map(TerminalId)
    }

    pub fn nonterminal_ids(&self) -> impl Iterator<Item = NonterminalId> {
        (0..self.nonterminals.len() as u32).map(NonterminalId)
    }

    pub fn start(&self) -> NonterminalId {
        self.start
    }

    pub fn eof(&self) -> TerminalId {
        self.eof
    }

    pub fn terminal_name(&self, id: TerminalId) -> &str {
        &self.terminals[id.idx()]
    }

    pub fn nonterminal_name(&self, id: NonterminalId) -> &str {
        &self.nonterminals[id.idx()]
    }

    pub fn symbol_name(&self, sym: Symbol) -> &str {
        match sym {
            Symbol::Terminal(t) => self.terminal_name(t),
            Symbol::Nonterminal(n) => self.nonterminal_name(n),
        }
    }

    pub fn terminal_id(&self, name: &str) -> Option<TerminalId> {
        self.terminals
            .iter()
            .position(|t| t == name)
            .map(|i| TerminalId(i as u32))
    }

    pub fn nonterminal_id(&self, name: &str) -> Option<NonterminalId> {
        self.nonterminals
            .iter()
            .position(|n| n == name)
            .map(|i| NonterminalId(i as u32))
    }

    /// `<lhs> -> a <b> c`, with `ε` for an empty right-hand side.
    pub fn display_production(&self, id: ProductionId) -> String {
        let p = self.production(id);
        let rhs = if p.rhs.is_empty() {
            "ε".to_string()
        } else {
            p.rhs
                .iter()
                .map(|&s| self.symbol_name(s))
                .collect::<Vec<_>>()
                .join(" ")
        };
        format!("{} -> {}", self.nonterminal_name(p.lhs), rhs)
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self)
    }

    /// Number of distinct right-hand sides, whichever nonterminal owns them.
    pub fn distinct_expansions(&self) -> usize {
        self.productions
            .iter()
            .map(|p| p.rhs.as_slice())
            .collect::<hashbrown::HashSet<_>>()
            .len()
    }
}
