//!
//! Queries on `AnalyzedHmm` shared by the recursion synthesizer and the
//! reference evaluator
//!
//! `forward` selects the direction of the recursion: forward recursions
//! compute a transition's `to` from its `from`, backward ones the reverse
//! (see `Transition::source` and `Transition::target`).
//!
use super::AnalyzedHmm;
use crate::graph::{EdgeSet, Group};
use crate::model::{CliqueId, StateId, TransitionId};
use derive_new::new;

///
/// A group of states of one clique joined by silent transitions, in the
/// order the recursion must resolve them.
///
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct SilentComponent {
    /// sorted by id
    pub states: Vec<StateId>,
    /// `true` if the states depend on each other (including a self loop)
    pub cyclic: bool,
    /// silent transitions whose target lies in `states`
    pub transitions: Vec<TransitionId>,
}

impl AnalyzedHmm {
    ///
    /// Transitions whose target (in direction `forward`) lies in clique `c`
    ///
    pub fn transitions_into(&self, c: CliqueId, forward: bool) -> Vec<TransitionId> {
        self.hmm
            .transitions
            .iter()
            .filter(|t| self.hmm.clique_of(t.target(forward)) == c)
            .map(|t| t.id)
            .collect()
    }
    ///
    /// Distinct consumed vectors of the non-silent transitions into `c`, the
    /// zero vector (if any) last
    ///
    pub fn emission_vectors(&self, c: CliqueId, forward: bool) -> Vec<Vec<usize>> {
        let mut vectors: Vec<Vec<usize>> = Vec::new();
        for t in self.transitions_into(c, forward) {
            if self.hmm.is_silent(t) {
                continue;
            }
            let v = self.hmm.consumed(t).to_vec();
            if !vectors.contains(&v) {
                vectors.push(v);
            }
        }
        // stable: keeps the first-seen order of the others
        vectors.sort_by_key(|v| v.iter().all(|&x| x == 0));
        vectors
    }
    ///
    /// Distinct cliques that non-silent transitions with consumed vector
    /// `vector` come from into `c`, in schedule order with `c` itself last
    ///
    pub fn source_cliques(&self, c: CliqueId, vector: &[usize], forward: bool) -> Vec<CliqueId> {
        let mut sources: Vec<CliqueId> = Vec::new();
        for t in self.transitions_into(c, forward) {
            if self.hmm.is_silent(t) || self.hmm.consumed(t) != vector {
                continue;
            }
            let src = self.hmm.clique_of(self.hmm.transition(t).source(forward));
            if !sources.contains(&src) {
                sources.push(src);
            }
        }
        let rank = |c: &CliqueId| self.schedule.iter().position(|x| x == c).unwrap_or(0);
        sources.sort_by_key(|s| (*s == c, rank(s)));
        sources
    }
    ///
    /// Non-silent transitions from clique `src` into clique `c` with consumed
    /// vector `vector`
    ///
    pub fn transitions_between(
        &self,
        src: CliqueId,
        c: CliqueId,
        vector: &[usize],
        forward: bool,
    ) -> Vec<TransitionId> {
        self.transitions_into(c, forward)
            .into_iter()
            .filter(|&t| {
                let tr = self.hmm.transition(t);
                !self.hmm.is_silent(t)
                    && self.hmm.consumed(t) == vector
                    && self.hmm.clique_of(tr.source(forward)) == src
            })
            .collect()
    }
    ///
    /// States of `c` that receive a transition in direction `forward`
    ///
    pub fn target_states(&self, c: CliqueId, forward: bool) -> Vec<StateId> {
        let mut states: Vec<StateId> = self
            .transitions_into(c, forward)
            .into_iter()
            .map(|t| self.hmm.transition(t).target(forward))
            .collect();
        states.sort();
        states.dedup();
        states
    }
    ///
    /// States of `src` that are the source of a transition into `c`
    ///
    pub fn source_states(&self, src: CliqueId, c: CliqueId, forward: bool) -> Vec<StateId> {
        let mut states: Vec<StateId> = self
            .transitions_into(c, forward)
            .into_iter()
            .map(|t| self.hmm.transition(t).source(forward))
            .filter(|&s| self.hmm.clique_of(s) == src)
            .collect();
        states.sort();
        states.dedup();
        states
    }
    ///
    /// Silent transitions inside `c`, grouped by `sort_graph` in resolution
    /// order for direction `forward`
    ///
    pub fn silent_components(&self, c: CliqueId, forward: bool) -> Vec<SilentComponent> {
        let silent: Vec<TransitionId> = self
            .transitions_into(c, forward)
            .into_iter()
            .filter(|&t| self.hmm.is_silent(t))
            .collect();
        let graph = EdgeSet::from_edges(silent.iter().map(|&t| {
            let tr = self.hmm.transition(t);
            (tr.source(forward), tr.target(forward))
        }));
        graph
            .sort_graph()
            .into_iter()
            .map(|group| {
                let cyclic = group.is_cyclic();
                let states = match group {
                    Group::Transient(s) => vec![s],
                    Group::Cyclic(ss) => ss,
                };
                let transitions = silent
                    .iter()
                    .copied()
                    .filter(|&t| states.contains(&self.hmm.transition(t).target(forward)))
                    .collect();
                SilentComponent::new(states, cyclic, transitions)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::analysis::analyze;
    use crate::model::mocks::*;

    #[test]
    fn casino_vectors_and_sources() {
        let a = analyze(mock_casino()).unwrap();
        let dice = a.hmm.clique_by_name("dice").unwrap();
        let begin = a.hmm.clique_by_name("begin").unwrap();
        assert_eq!(a.emission_vectors(dice, true), vec![vec![1]]);
        assert_eq!(a.source_cliques(dice, &[1], true), vec![begin, dice]);
        assert_eq!(a.transitions_between(begin, dice, &[1], true).len(), 2);
        assert_eq!(a.transitions_between(dice, dice, &[1], true).len(), 4);

        // walking backward, dice receives from finish (silent vector) and itself
        let finish = a.hmm.clique_by_name("finish").unwrap();
        assert_eq!(a.emission_vectors(dice, false), vec![vec![1], vec![0]]);
        assert_eq!(a.source_cliques(dice, &[0], false), vec![finish]);
        assert_eq!(a.source_states(dice, finish, true).len(), 2);
        assert_eq!(a.target_states(finish, true), vec![a.end]);
        assert!(a.silent_components(dice, true).is_empty());
    }

    #[test]
    fn silent_self_loop_component() {
        let a = analyze(mock_silent_loop()).unwrap();
        let lp = a.hmm.clique_by_name("loop").unwrap();
        let comps = a.silent_components(lp, true);
        assert_eq!(comps.len(), 1);
        let sa = a.hmm.state_by_name("A").unwrap();
        assert_eq!(comps[0].states, vec![sa]);
        assert!(comps[0].cyclic);
        assert_eq!(comps[0].transitions.len(), 1);
        // entry from start is a zero vector from another clique
        assert_eq!(a.emission_vectors(lp, true), vec![vec![0]]);
    }

    #[test]
    fn silent_cycle_resolution_order() {
        let a = analyze(mock_silent_cycle()).unwrap();
        let main = a.hmm.clique_by_name("main").unwrap();
        let m = a.hmm.state_by_name("M").unwrap();
        let d1 = a.hmm.state_by_name("D1").unwrap();
        let d2 = a.hmm.state_by_name("D2").unwrap();

        // forward: M feeds the cycle D1 <-> D2
        let comps = a.silent_components(main, true);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].states, vec![m]);
        assert!(!comps[0].cyclic);
        assert!(comps[0].transitions.is_empty());
        assert_eq!(comps[1].states, vec![d1, d2]);
        assert!(comps[1].cyclic);
        assert_eq!(comps[1].transitions.len(), 3);

        // backward: the cycle is resolved first, then M reads it
        let comps = a.silent_components(main, false);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].states, vec![d1, d2]);
        assert_eq!(comps[1].states, vec![m]);
        assert_eq!(comps[1].transitions.len(), 1);
    }
}
