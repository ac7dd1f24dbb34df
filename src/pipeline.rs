// src/pipeline.rs
use log::debug;

use crate::{
    analysis::Analysis,
    error::Result,
    grammar::{Grammar, validate},
    parser::tables::PredictionTable,
};

/// A grammar with its analysis and prediction table. Cheap to rebuild, so
/// every command recomputes it instead of persisting it.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub grammar: Grammar,
    pub analysis: Analysis,
    pub table: PredictionTable,
}

pub fn compile(grammar: Grammar) -> Result<Compiled> {
    validate::check(&grammar);
    let analysis = Analysis::compute(&grammar)?;
    let table = PredictionTable::build(&grammar, &analysis)?;
    debug!("compiled grammar {}", grammar.fingerprint());
    Ok(Compiled {
        grammar,
        analysis,
        table,
    })
}
