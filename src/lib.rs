//! LL(1) table compiler: grammar analysis, prediction-table construction, a
//! minimal perfect-hash search over the table's keys and emission of the
//! packed table for the parser runtime.

pub mod analysis;
pub mod config;
pub mod error;
pub mod grammar;
pub mod parser;
pub mod pipeline;

pub use error::{Diagnostics, Error, Issue, Result};
pub use pipeline::{Compiled, compile};
