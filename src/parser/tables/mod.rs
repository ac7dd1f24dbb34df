// src/parser/tables/mod.rs
pub mod build;
pub mod emit_c;
pub mod encode;
pub mod hash;
pub mod io;
pub mod names;
pub mod search;

pub use build::{Prediction, PredictionTable, TableKey};
pub use emit_c::Artifacts;
pub use encode::{Bucket, EncodedTable, Slot, SymbolDescriptor};
pub use hash::{DEFAULT_SHIFT, HashConfig, Major};
pub use io::{FileCheckpoint, load_checked, load_hash_config, save_hash_config};
pub use search::{Checkpoint, MemoryCheckpoint, SearchOptions, SearchState, Searcher};
