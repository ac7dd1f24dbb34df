// src/analysis/mod.rs
pub mod first;
pub mod follow;

pub use first::{FirstSet, FirstSets};
pub use follow::FollowSets;

use crate::{error::Diagnostics, grammar::Grammar};

/// FIRST and FOLLOW for one grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub first: FirstSets,
    pub follow: FollowSets,
}

impl Analysis {
    pub fn compute(grammar: &Grammar) -> Result<Self, Diagnostics> {
        let first = FirstSets::compute(grammar)?;
        let follow = FollowSets::compute(grammar, &first);
        Ok(Self { first, follow })
    }
}
