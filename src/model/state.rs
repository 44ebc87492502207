//!
//! States and transitions
//!
use super::ids::{CliqueId, EmissionId, StateId, TransitionId};
use crate::template::Expr;

#[derive(Debug, Clone)]
pub struct State {
    pub id: StateId,
    pub name: String,
    ///
    /// number of previous symbols on each tape the state depends on
    ///
    pub order: Vec<usize>,
    ///
    /// `Some` for a Moore state (emits on entry), `None` for a Mealy state
    /// whose emissions live on the incoming transitions
    ///
    pub emission: Option<EmissionId>,
    pub clique: CliqueId,
    /// index inside the clique's state vector
    pub index_in_clique: usize,
}

impl State {
    pub fn is_moore(&self) -> bool {
        self.emission.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub id: TransitionId,
    pub name: String,
    pub from: StateId,
    pub to: StateId,
    ///
    /// emission applied on this transition; the target's emission for a
    /// transition into a Moore state
    ///
    pub emission: EmissionId,
    pub probability: Expr,
}

impl Transition {
    ///
    /// State the recursion pulls from.
    ///
    /// The forward direction computes `to` from `from`; the backward
    /// direction the other way round.
    ///
    pub fn source(&self, forward: bool) -> StateId {
        if forward {
            self.from
        } else {
            self.to
        }
    }
    ///
    /// State the recursion writes to.
    ///
    pub fn target(&self, forward: bool) -> StateId {
        if forward {
            self.to
        } else {
            self.from
        }
    }
}
