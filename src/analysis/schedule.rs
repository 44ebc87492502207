//!
//! Start/end states, clique schedule and clique boundaries
//!
use crate::error::{fail, ErrorKind, Result};
use crate::graph::{EdgeSet, Group};
use crate::model::{CliqueId, Hmm, StateId, TransitionId};

///
/// The unique state without incoming transitions and the unique state
/// without outgoing transitions.
///
pub fn terminal_states(hmm: &Hmm) -> Result<(StateId, StateId)> {
    let mut g: EdgeSet<StateId> = EdgeSet::new();
    for s in hmm.state_ids() {
        g.add_node(s);
    }
    for t in hmm.transitions.iter() {
        g.add_edge(t.from, t.to);
    }
    let names = |ids: &[StateId]| -> Vec<String> {
        ids.iter().map(|&s| hmm.state(s).name.clone()).collect()
    };

    let starts = g.sources();
    let start = match starts.len() {
        0 => return fail(ErrorKind::NoStartState),
        1 => starts[0],
        _ => {
            return fail(ErrorKind::MultipleStartStates {
                states: names(&starts),
            })
        }
    };
    let ends = g.sinks();
    let end = match ends.len() {
        0 => return fail(ErrorKind::NoEndState),
        1 => ends[0],
        _ => {
            return fail(ErrorKind::MultipleEndStates {
                states: names(&ends),
            })
        }
    };

    for (role, s) in [("start", start), ("end", end)].iter() {
        let state = hmm.state(*s);
        if let Some(tape) = hmm.tape_ids().find(|t| state.order[t.0] != 0) {
            return fail(ErrorKind::TerminalStateOrder {
                role: *role,
                state: state.name.clone(),
                tape: hmm.tape(tape).name.clone(),
            });
        }
    }
    Ok((start, end))
}

///
/// Graph on cliques with an edge for every transition crossing cliques
///
pub fn clique_graph(hmm: &Hmm) -> EdgeSet<CliqueId> {
    let mut g = EdgeSet::new();
    for c in hmm.clique_ids() {
        g.add_node(c);
    }
    for t in hmm.transitions.iter() {
        let (a, b) = (hmm.clique_of(t.from), hmm.clique_of(t.to));
        if a != b {
            g.add_edge(a, b);
        }
    }
    g
}

///
/// Cliques in an order where every clique follows those it receives
/// transitions from.
///
pub fn clique_schedule(hmm: &Hmm) -> Result<Vec<CliqueId>> {
    let mut schedule = Vec::new();
    for group in clique_graph(hmm).sort_graph() {
        match group {
            Group::Transient(c) => schedule.push(c),
            Group::Cyclic(cs) => {
                return fail(ErrorKind::CyclicCliqueGraph {
                    cliques: cs.iter().map(|&c| hmm.clique(c).name.clone()).collect(),
                })
            }
        }
    }
    Ok(schedule)
}

///
/// Transitions crossing into, staying inside and leaving a clique
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Boundary {
    pub incoming: Vec<TransitionId>,
    pub internal: Vec<TransitionId>,
    pub outgoing: Vec<TransitionId>,
}

pub fn boundaries(hmm: &Hmm) -> Vec<Boundary> {
    let mut bs = vec![Boundary::default(); hmm.cliques.len()];
    for t in hmm.transitions.iter() {
        let (a, b) = (hmm.clique_of(t.from), hmm.clique_of(t.to));
        if a == b {
            bs[a.0].internal.push(t.id);
        } else {
            bs[a.0].outgoing.push(t.id);
            bs[b.0].incoming.push(t.id);
        }
    }
    bs
}
