// src/parser/tables/search.rs
// Anytime search for the smallest collision-free modulus.
//
// Each trial fixes an index assignment for terminals and nonterminals, hashes
// every table key under both orientations and scans moduli upward from the
// pigeonhole floor. Improvements are handed to a `Checkpoint` right away, so
// every persisted config is usable on its own; more trials only shrink it.

use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use rayon::prelude::*;

use super::{
    build::PredictionTable,
    hash::{DEFAULT_SHIFT, HashConfig, Major, SymbolIndex, raw_hashes, verify_injective},
    io::check_fingerprint,
};
use crate::{
    error::Result,
    grammar::{Fingerprint, Grammar, NonterminalId, TerminalId},
};

/// Receives every improving config, in order of strictly decreasing modulus.
pub trait Checkpoint {
    fn persist(&mut self, config: &HashConfig) -> Result<()>;
}

impl<F> Checkpoint for F
where
    F: FnMut(&HashConfig) -> Result<()>,
{
    fn persist(&mut self, config: &HashConfig) -> Result<()> {
        self(config)
    }
}

/// Keeps every checkpoint in memory.
#[derive(Debug, Default)]
pub struct MemoryCheckpoint {
    pub saved: Vec<HashConfig>,
}

impl Checkpoint for MemoryCheckpoint {
    fn persist(&mut self, config: &HashConfig) -> Result<()> {
        self.saved.push(config.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub shift: u32,
    pub seed: u64,
    /// 1 = sequential reference loop; more runs trials in parallel rounds.
    pub workers: usize,
    /// `None` searches until the process is killed.
    pub max_trials: Option<u64>,
    /// Log a progress line every this many trials (0 = never).
    pub progress_every: u64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            shift: DEFAULT_SHIFT,
            seed: 0,
            workers: 1,
            max_trials: None,
            progress_every: 10_000,
        }
    }
}

/// Explicit search state threaded through every trial.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub best: Option<HashConfig>,
    pub trials: u64,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continues from a previously persisted config.
    pub fn resume(config: HashConfig) -> Self {
        Self {
            best: Some(config),
            trials: 0,
        }
    }

    /// [`SearchState::resume`] for a config that still fits `table`: matching
    /// fingerprint (if any) and symbols, no two keys in one bucket.
    pub fn resume_checked(
        grammar: &Grammar,
        table: &PredictionTable,
        config: HashConfig,
    ) -> Result<Self> {
        check_fingerprint(grammar, &config)?;
        verify_injective(grammar, table, &config)?;
        Ok(Self::resume(config))
    }

    pub fn best_modulus(&self) -> Option<u32> {
        self.best.as_ref().map(|c| c.modulus)
    }
}

/// Reusable bucket-occupancy stamps, so a modulus test never clears memory.
#[derive(Debug, Default)]
struct Scratch {
    stamp: Vec<u32>,
    generation: u32,
}

impl Scratch {
    fn injective(&mut self, raws: &[u64], modulus: u32) -> bool {
        let m = modulus as usize;
        if self.stamp.len() < m {
            self.stamp.resize(m, 0);
        }
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.stamp.fill(0);
            self.generation = 1;
        }
        for &raw in raws {
            let b = (raw % modulus as u64) as usize;
            if self.stamp[b] == self.generation {
                return false;
            }
            self.stamp[b] = self.generation;
        }
        true
    }
}

/// Smallest injective modulus in `[floor, ceil]`.
fn smallest_injective(raws: &[u64], floor: u32, ceil: u32, scratch: &mut Scratch) -> Option<u32> {
    (floor..=ceil).find(|&m| scratch.injective(raws, m))
}

pub struct Searcher<'a> {
    grammar: &'a Grammar,
    table: &'a PredictionTable,
    fingerprint: Fingerprint,
    options: SearchOptions,
}

impl<'a> Searcher<'a> {
    pub fn new(grammar: &'a Grammar, table: &'a PredictionTable, options: SearchOptions) -> Self {
        Self {
            grammar,
            table,
            fingerprint: grammar.fingerprint(),
            options,
        }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    fn initial_order(&self) -> (Vec<TerminalId>, Vec<NonterminalId>) {
        (
            self.grammar.terminal_ids().collect(),
            self.grammar.nonterminal_ids().collect(),
        )
    }

    /// Best config for one index assignment that beats `bound`, if any.
    fn trial(
        &self,
        terminals: &[TerminalId],
        nonterminals: &[NonterminalId],
        bound: Option<u32>,
        scratch: &mut Scratch,
    ) -> Result<Option<HashConfig>> {
        let index = SymbolIndex::from_order(terminals, nonterminals);
        let shift = self.options.shift;
        let floor = (self.table.len() as u32).max(1);

        // Both orientations are hashed before either is scanned: a raw
        // collision in either one is fatal.
        let mut raws = Vec::with_capacity(2);
        for major in Major::BOTH {
            raws.push((major, raw_hashes(self.grammar, self.table, &index, major, shift)?));
        }

        let mut found: Option<(Major, u32, u64)> = None;
        for (major, raws) in &raws {
            let max_raw = raws.iter().copied().max().unwrap_or(0);
            let mut ceil = max_raw.saturating_add(1).min(u32::MAX as u64) as u32;
            if let Some(b) = bound {
                ceil = ceil.min(b.saturating_sub(1));
            }
            if let Some((_, m, _)) = found {
                ceil = ceil.min(m.saturating_sub(1));
            }
            if floor > ceil {
                continue;
            }
            if let Some(m) = smallest_injective(raws, floor, ceil, scratch) {
                found = Some((*major, m, max_raw));
            }
        }

        Ok(found.map(|(major, modulus, max_raw)| {
            debug!("[{}] {} (of {})", major.tag(), modulus, max_raw);
            HashConfig {
                terminals: terminals
                    .iter()
                    .map(|&t| self.grammar.terminal_name(t).to_string())
                    .collect(),
                nonterminals: nonterminals
                    .iter()
                    .map(|&n| self.grammar.nonterminal_name(n).to_string())
                    .collect(),
                modulus,
                shift,
                major,
                fingerprint: Some(self.fingerprint),
            }
        }))
    }

    fn budget_left(&self, state: &SearchState) -> u64 {
        match self.options.max_trials {
            Some(max) => max.saturating_sub(state.trials),
            None => u64::MAX,
        }
    }

    fn improve<C: Checkpoint + ?Sized>(
        &self,
        state: &mut SearchState,
        config: HashConfig,
        sink: &mut C,
    ) -> Result<()> {
        info!(
            "search: modulus {} [{}] after {} trials ({} keys)",
            config.modulus,
            config.major.tag(),
            state.trials,
            self.table.len()
        );
        sink.persist(&config)?;
        state.best = Some(config);
        Ok(())
    }

    fn progress(&self, state: &SearchState) {
        let every = self.options.progress_every;
        if every > 0 && state.trials % every == 0 {
            info!(
                "search: {} trials, best modulus {:?}",
                state.trials,
                state.best_modulus()
            );
        }
    }

    /// Sequential loop: one permutation stream, shuffled in place after each trial.
    pub fn run<C: Checkpoint + ?Sized>(
        &self,
        mut state: SearchState,
        sink: &mut C,
    ) -> Result<SearchState> {
        let mut rng = StdRng::seed_from_u64(self.options.seed);
        let (mut ts, mut nts) = self.initial_order();
        let mut scratch = Scratch::default();

        while self.budget_left(&state) > 0 {
            let bound = state.best_modulus();
            let found = self.trial(&ts, &nts, bound, &mut scratch)?;
            state.trials += 1;
            if let Some(config) = found {
                self.improve(&mut state, config, sink)?;
            }
            self.progress(&state);

            ts.shuffle(&mut rng);
            nts.shuffle(&mut rng);
        }
        Ok(state)
    }

    /// Parallel rounds of independent trials. Trial `k` permutes the grammar
    /// order with its own RNG stream (trial 0 keeps it), so results depend on
    /// the seed only, not on scheduling.
    pub fn run_parallel<C: Checkpoint + ?Sized>(
        &self,
        mut state: SearchState,
        sink: &mut C,
    ) -> Result<SearchState> {
        let workers = self.options.workers.max(1) as u64;

        loop {
            let batch = workers.min(self.budget_left(&state));
            if batch == 0 {
                break;
            }
            let bound = state.best_modulus();
            let base = state.trials;

            let results: Vec<(u64, Result<Option<HashConfig>>)> = (0..batch)
                .into_par_iter()
                .map(|k| {
                    let trial_no = base + k;
                    let (mut ts, mut nts) = self.initial_order();
                    if trial_no > 0 {
                        let mut rng = StdRng::seed_from_u64(stream_seed(self.options.seed, trial_no));
                        ts.shuffle(&mut rng);
                        nts.shuffle(&mut rng);
                    }
                    let mut scratch = Scratch::default();
                    (trial_no, self.trial(&ts, &nts, bound, &mut scratch))
                })
                .collect();

            let mut round_best: Option<HashConfig> = None;
            for (_, result) in results {
                if let Some(config) = result? {
                    let better = round_best
                        .as_ref()
                        .is_none_or(|b| config.modulus < b.modulus);
                    if better {
                        round_best = Some(config);
                    }
                }
            }

            state.trials += batch;
            if let Some(config) = round_best {
                self.improve(&mut state, config, sink)?;
            }
            let every = self.options.progress_every;
            if every > 0 && (state.trials / every) != (base / every) {
                info!(
                    "search: {} trials, best modulus {:?}",
                    state.trials,
                    state.best_modulus()
                );
            }
        }
        Ok(state)
    }

    /// Dispatches on `workers`.
    pub fn search<C: Checkpoint + ?Sized>(
        &self,
        state: SearchState,
        sink: &mut C,
    ) -> Result<SearchState> {
        if self.options.workers > 1 {
            self.run_parallel(state, sink)
        } else {
            self.run(state, sink)
        }
    }
}

fn stream_seed(seed: u64, trial_no: u64) -> u64 {
    seed ^ trial_no.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
