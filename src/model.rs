//!
//! HMM model
//!
//! ## Structure
//!
//! * tapes: parallel observed sequences, sorted by speed
//! * cliques: blocks of states linked by silent transitions
//! * states: with per-tape order and an optional (Moore) emission
//! * transitions: with probability and emission expressions
//!
//! A model is created through `HmmBuilder` (or a JSON `HmmDescription`)
//! and is immutable afterwards.
//!
pub mod builder;
pub mod clique;
pub mod description;
pub mod emission;
pub mod ids;
pub mod mocks;
pub mod state;
pub mod tape;

pub use builder::HmmBuilder;
pub use clique::{Banding, Clique, DEFAULT_TABLE_CLASS};
pub use emission::Emission;
pub use ids::{BandingId, CliqueId, EmissionId, StateId, TapeId, TransitionId};
pub use state::{State, Transition};
pub use tape::{Alphabet, Tape};

#[derive(Debug, Clone)]
pub struct Hmm {
    pub name: String,
    pub tapes: Vec<Tape>,
    pub states: Vec<State>,
    pub transitions: Vec<Transition>,
    pub emissions: Vec<Emission>,
    pub cliques: Vec<Clique>,
    pub bandings: Vec<Banding>,
    ///
    /// extra parameter declarations appended to every generated function,
    /// e.g. `const Params& par`
    ///
    pub parameters: Vec<String>,
}

impl Hmm {
    pub fn n_tapes(&self) -> usize {
        self.tapes.len()
    }
    pub fn n_states(&self) -> usize {
        self.states.len()
    }
    pub fn n_transitions(&self) -> usize {
        self.transitions.len()
    }
    pub fn tape(&self, id: TapeId) -> &Tape {
        &self.tapes[id.0]
    }
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.0]
    }
    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id.0]
    }
    pub fn emission(&self, id: EmissionId) -> &Emission {
        &self.emissions[id.0]
    }
    pub fn clique(&self, id: CliqueId) -> &Clique {
        &self.cliques[id.0]
    }
    pub fn banding(&self, id: BandingId) -> &Banding {
        &self.bandings[id.0]
    }
    pub fn tape_ids(&self) -> impl Iterator<Item = TapeId> {
        (0..self.tapes.len()).map(TapeId)
    }
    pub fn state_ids(&self) -> impl Iterator<Item = StateId> {
        (0..self.states.len()).map(StateId)
    }
    pub fn transition_ids(&self) -> impl Iterator<Item = TransitionId> {
        (0..self.transitions.len()).map(TransitionId)
    }
    pub fn clique_ids(&self) -> impl Iterator<Item = CliqueId> {
        (0..self.cliques.len()).map(CliqueId)
    }
    pub fn state_by_name(&self, name: &str) -> Option<StateId> {
        self.states.iter().find(|s| s.name == name).map(|s| s.id)
    }
    pub fn clique_by_name(&self, name: &str) -> Option<CliqueId> {
        self.cliques.iter().find(|c| c.name == name).map(|c| c.id)
    }
    pub fn transition_by_name(&self, name: &str) -> Option<TransitionId> {
        self.transitions
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.id)
    }
    ///
    /// Symbols consumed per tape by a transition
    ///
    pub fn consumed(&self, t: TransitionId) -> &[usize] {
        &self.emission(self.transition(t).emission).consumed
    }
    pub fn clique_of(&self, s: StateId) -> CliqueId {
        self.state(s).clique
    }
    ///
    /// Consumes nothing and stays inside one clique
    ///
    pub fn is_silent(&self, t: TransitionId) -> bool {
        let tr = self.transition(t);
        self.emission(tr.emission).is_silent() && self.clique_of(tr.from) == self.clique_of(tr.to)
    }
    ///
    /// Transitions leaving `s`
    ///
    pub fn transitions_from(&self, s: StateId) -> impl Iterator<Item = &Transition> + '_ {
        self.transitions.iter().filter(move |t| t.from == s)
    }
    ///
    /// Transitions entering `s`
    ///
    pub fn transitions_to(&self, s: StateId) -> impl Iterator<Item = &Transition> + '_ {
        self.transitions.iter().filter(move |t| t.to == s)
    }
    ///
    /// Trace entry for errors
    ///
    pub fn trace_name(&self) -> String {
        format!("hmm `{}`", self.name)
    }
}
