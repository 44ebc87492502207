//!
//! Position propagation
//!
//! For every state and tape, the number of symbols consumed since the start
//! state (`from_start`) and until the end state (`from_end`, non-positive),
//! together with a flag telling whether that number is the same along every
//! path.
//!
use crate::error::{fail, ErrorKind, Result};
use crate::model::{Hmm, StateId, TransitionId};

///
/// Position relative to one anchor, per tape
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchored {
    /// closest position to the anchor over all paths
    pub pos: Vec<i64>,
    /// `true` if every path gives the same position
    pub fixed: Vec<bool>,
}

impl Anchored {
    fn seed(n_tapes: usize) -> Anchored {
        Anchored {
            pos: vec![0; n_tapes],
            fixed: vec![true; n_tapes],
        }
    }
    ///
    /// Merge a candidate; returns `true` if anything changed.
    ///
    /// `closer(a, b)` picks the position nearer to the anchor.
    ///
    fn merge(&mut self, candidate: &Anchored, closer: fn(i64, i64) -> i64) -> bool {
        let mut changed = false;
        for i in 0..self.pos.len() {
            let pos = closer(self.pos[i], candidate.pos[i]);
            let fixed = self.fixed[i] && candidate.fixed[i] && self.pos[i] == candidate.pos[i];
            if pos != self.pos[i] || fixed != self.fixed[i] {
                self.pos[i] = pos;
                self.fixed[i] = fixed;
                changed = true;
            }
        }
        changed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Propagation {
    pub from_start: Vec<Option<Anchored>>,
    pub from_end: Vec<Option<Anchored>>,
}

///
/// Propagate with transitions visited in declaration order.
///
pub fn propagate(hmm: &Hmm, start: StateId, end: StateId) -> Propagation {
    let order: Vec<TransitionId> = hmm.transition_ids().collect();
    propagate_in_order(hmm, start, end, &order)
}

///
/// Propagate visiting transitions in `order` on every sweep.
///
/// The result does not depend on `order`.
///
pub fn propagate_in_order(
    hmm: &Hmm,
    start: StateId,
    end: StateId,
    order: &[TransitionId],
) -> Propagation {
    let n = hmm.n_tapes();
    let mut p = Propagation {
        from_start: vec![None; hmm.n_states()],
        from_end: vec![None; hmm.n_states()],
    };
    p.from_start[start.0] = Some(Anchored::seed(n));
    p.from_end[end.0] = Some(Anchored::seed(n));

    let mut changed = true;
    while changed {
        changed = false;
        for &t in order {
            let tr = hmm.transition(t);
            let consumed = hmm.consumed(t);

            // forward: to = from + consumed
            if let Some(f) = p.from_start[tr.from.0].clone() {
                let candidate = Anchored {
                    pos: f.pos.iter().zip(consumed).map(|(&x, &c)| x + c as i64).collect(),
                    fixed: f.fixed,
                };
                changed |= merge_into(&mut p.from_start[tr.to.0], candidate, i64::min);
            }

            // backward: from = to - consumed
            if let Some(g) = p.from_end[tr.to.0].clone() {
                let candidate = Anchored {
                    pos: g.pos.iter().zip(consumed).map(|(&x, &c)| x - c as i64).collect(),
                    fixed: g.fixed,
                };
                changed |= merge_into(&mut p.from_end[tr.from.0], candidate, i64::max);
            }
        }
    }
    p
}

fn merge_into(slot: &mut Option<Anchored>, candidate: Anchored, closer: fn(i64, i64) -> i64) -> bool {
    match slot {
        None => {
            *slot = Some(candidate);
            true
        }
        Some(existing) => existing.merge(&candidate, closer),
    }
}

impl Propagation {
    ///
    /// Every state must be reached in both directions.
    ///
    pub fn check_reached(&self, hmm: &Hmm) -> Result<()> {
        for s in hmm.state_ids() {
            if self.from_start[s.0].is_none() {
                return fail(ErrorKind::UnreachableState {
                    state: hmm.state(s).name.clone(),
                    direction: "not reachable from the start state",
                });
            }
            if self.from_end[s.0].is_none() {
                return fail(ErrorKind::UnreachableState {
                    state: hmm.state(s).name.clone(),
                    direction: "cannot reach the end state",
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mocks::*;

    fn terminals(hmm: &Hmm) -> (StateId, StateId) {
        (
            hmm.state_by_name("start").unwrap(),
            hmm.state_by_name("end").unwrap(),
        )
    }

    #[test]
    fn fixed_length_chain() {
        let hmm = mock_fixed_length(3);
        let (s, e) = terminals(&hmm);
        let p = propagate(&hmm, s, e);
        let s1 = hmm.state_by_name("S1").unwrap();
        let f = p.from_start[s1.0].as_ref().unwrap();
        assert_eq!(f.pos, vec![2]);
        assert_eq!(f.fixed, vec![true]);
        let g = p.from_end[s1.0].as_ref().unwrap();
        assert_eq!(g.pos, vec![-1]);
        assert_eq!(g.fixed, vec![true]);
        let end = p.from_start[e.0].as_ref().unwrap();
        assert_eq!(end.pos, vec![3]);
        assert!(end.fixed[0]);
    }

    #[test]
    fn cycles_make_positions_variable() {
        let hmm = mock_casino();
        let (s, e) = terminals(&hmm);
        let p = propagate(&hmm, s, e);
        let f = hmm.state_by_name("F").unwrap();
        let fs = p.from_start[f.0].as_ref().unwrap();
        assert_eq!(fs.pos, vec![1]);
        assert_eq!(fs.fixed, vec![false]);
        let fe = p.from_end[f.0].as_ref().unwrap();
        assert_eq!(fe.pos, vec![0]);
        assert_eq!(fe.fixed, vec![false]);
        assert!(p.check_reached(&hmm).is_ok());
    }

    #[test]
    fn confluent_under_any_order() {
        for hmm in vec![mock_pair(), mock_silent_cycle(), mock_markov(), mock_casino()] {
            let (s, e) = terminals(&hmm);
            let forward: Vec<TransitionId> = hmm.transition_ids().collect();
            let reverse: Vec<TransitionId> = forward.iter().rev().copied().collect();
            let interleaved: Vec<TransitionId> = forward
                .iter()
                .step_by(2)
                .chain(forward.iter().skip(1).step_by(2))
                .copied()
                .collect();
            let a = propagate_in_order(&hmm, s, e, &forward);
            let b = propagate_in_order(&hmm, s, e, &reverse);
            let c = propagate_in_order(&hmm, s, e, &interleaved);
            assert_eq!(a, b);
            assert_eq!(a, c);
        }
    }
}
