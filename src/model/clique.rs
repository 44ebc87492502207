//!
//! Cliques (blocks of states) and bandings
//!
use super::ids::{BandingId, CliqueId, StateId};

pub const DEFAULT_TABLE_CLASS: &str = "DPTable";

#[derive(Debug, Clone)]
pub struct Clique {
    pub id: CliqueId,
    pub name: String,
    pub states: Vec<StateId>,
    ///
    /// coordinate remap for this clique
    ///
    pub banding: Option<BandingId>,
    ///
    /// banding of the loop nest this clique runs inside; cliques with the
    /// same linked banding that are adjacent in the schedule share one loop
    ///
    pub linked_banding: Option<BandingId>,
    ///
    /// storage class of the clique's DP table
    ///
    pub table_class: String,
}

impl Clique {
    pub fn n_states(&self) -> usize {
        self.states.len()
    }
}

///
/// Externally supplied coordinate mapping.
///
/// The generated loop walks `iterator` (a C++ object exposing
/// `begin/end/next` and `rbegin/rend/prev`) and reads the coordinate of each
/// tape from `coordinates`.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banding {
    pub id: BandingId,
    pub name: String,
    pub iterator: String,
    pub coordinates: Vec<String>,
}
