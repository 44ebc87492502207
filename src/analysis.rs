//!
//! Structural analysis of an `Hmm`
//!
//! `analyze` turns a validated model into an `AnalyzedHmm`:
//!
//! 1. start/end states and the clique schedule (`schedule`)
//! 2. position propagation to a fixed point (`positions`)
//! 3. per-state, per-clique and overall coordinate `Range`s
//! 4. clique boundaries and count-array signatures (`signature`)
//!
//! The synthesizer and the reference evaluator only read from the result.
//!
pub mod positions;
pub mod queries;
pub mod schedule;
pub mod signature;

pub use positions::{propagate, propagate_in_order, Anchored, Propagation};
pub use queries::SilentComponent;
pub use schedule::Boundary;
pub use signature::{Signature, SignatureTable, Signatures};

use crate::error::{Result, Traced};
use crate::model::{CliqueId, Hmm, StateId, TapeId};
use crate::range::{Bound, Range};
use log::{debug, info, warn};

///
/// How a state's coordinate on one tape is known
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    /// same offset from the start along every path
    FromStart,
    /// same offset from the end along every path
    FromEnd,
    /// both; only the end state of a fixed-length tape
    FromBoth,
    Variable,
}

#[derive(Debug, Clone)]
pub struct AnalyzedHmm {
    pub hmm: Hmm,
    pub start: StateId,
    pub end: StateId,
    /// cliques in execution order of a forward recursion
    pub schedule: Vec<CliqueId>,
    pub propagation: Propagation,
    pub state_ranges: Vec<Range>,
    /// per state, per tape
    pub placements: Vec<Vec<Placement>>,
    pub clique_ranges: Vec<Range>,
    /// union of every clique range
    pub overall_range: Range,
    /// number of symbols every path emits on a tape, if it is deterministic
    pub fixed_lengths: Vec<Option<i64>>,
    pub boundaries: Vec<Boundary>,
    pub signatures: Signatures,
    /// generations kept for the slowest tape by a folded table
    pub fold_generations: usize,
}

///
/// Run every analysis step on `hmm`.
///
pub fn analyze(hmm: Hmm) -> Result<AnalyzedHmm> {
    let trace = hmm.trace_name();
    analyze_inner(hmm).within(trace)
}

fn analyze_inner(hmm: Hmm) -> Result<AnalyzedHmm> {
    let schedule = schedule::clique_schedule(&hmm)?;
    let (start, end) = schedule::terminal_states(&hmm)?;
    let propagation = propagate(&hmm, start, end);
    propagation.check_reached(&hmm)?;

    let fixed_lengths: Vec<Option<i64>> = hmm
        .tape_ids()
        .map(|t| {
            propagation.from_start[end.0]
                .as_ref()
                .filter(|a| a.fixed[t.0])
                .map(|a| a.pos[t.0])
        })
        .collect();
    for (t, len) in hmm.tape_ids().zip(fixed_lengths.iter()) {
        if let Some(len) = len {
            warn!(
                "tape `{}` always has length {}; the end state is placed from both ends",
                hmm.tape(t).name,
                len
            );
        }
    }

    let mut state_ranges = Vec::with_capacity(hmm.n_states());
    let mut placements = Vec::with_capacity(hmm.n_states());
    for s in hmm.state_ids() {
        let (range, placement) = state_range(&hmm, &propagation, s, end);
        debug!("state {} range {}", hmm.state(s).name, range);
        state_ranges.push(range);
        placements.push(placement);
    }

    let clique_ranges: Vec<Range> = hmm
        .cliques
        .iter()
        .map(|c| {
            let mut r = state_ranges[c.states[0].0].clone();
            for s in c.states.iter().skip(1) {
                r.include(&state_ranges[s.0]);
            }
            r
        })
        .collect();
    let mut overall_range = clique_ranges[0].clone();
    for r in clique_ranges.iter().skip(1) {
        overall_range.include(r);
    }

    let boundaries = schedule::boundaries(&hmm);
    let signatures = signature::signatures(&hmm);
    let fold_generations = fold_generations(&hmm);
    info!(
        "analyzed `{}`: {} cliques, overall range {}, {} generations when folded",
        hmm.name,
        schedule.len(),
        overall_range,
        fold_generations
    );

    Ok(AnalyzedHmm {
        hmm,
        start,
        end,
        schedule,
        propagation,
        state_ranges,
        placements,
        clique_ranges,
        overall_range,
        fixed_lengths,
        boundaries,
        signatures,
        fold_generations,
    })
}

fn state_range(hmm: &Hmm, p: &Propagation, s: StateId, end: StateId) -> (Range, Vec<Placement>) {
    let n = hmm.n_tapes();
    let mut from = Vec::with_capacity(n);
    let mut to = Vec::with_capacity(n);
    let mut placement = Vec::with_capacity(n);
    // both directions are present after check_reached
    let (fs, fe) = match (&p.from_start[s.0], &p.from_end[s.0]) {
        (Some(fs), Some(fe)) => (fs, fe),
        _ => return (Range::everything(n), vec![Placement::Variable; n]),
    };
    for i in 0..n {
        let (a, b, pl) = if fs.fixed[i] {
            if fe.fixed[i] && s == end {
                (Bound::end(fe.pos[i]), Bound::end(fe.pos[i]), Placement::FromBoth)
            } else if fe.fixed[i] {
                (Bound::start(fs.pos[i]), Bound::start(fs.pos[i]), Placement::FromBoth)
            } else {
                (Bound::start(fs.pos[i]), Bound::start(fs.pos[i]), Placement::FromStart)
            }
        } else if fe.fixed[i] {
            (Bound::end(fe.pos[i]), Bound::end(fe.pos[i]), Placement::FromEnd)
        } else {
            (Bound::start(fs.pos[i]), Bound::end(fe.pos[i]), Placement::Variable)
        };
        from.push(a);
        to.push(b);
        placement.push(pl);
    }
    (Range::new(from, to), placement)
}

///
/// 1 + the most symbols one transition consumes on the slowest tape, and at
/// least 2
///
fn fold_generations(hmm: &Hmm) -> usize {
    let slowest = hmm.n_tapes().saturating_sub(1);
    let most = hmm
        .emissions
        .iter()
        .map(|e| e.consumed.get(slowest).copied().unwrap_or(0))
        .max()
        .unwrap_or(0);
    (1 + most).max(2)
}

impl AnalyzedHmm {
    pub fn n_tapes(&self) -> usize {
        self.hmm.n_tapes()
    }
    ///
    /// Tape of the outermost loop
    ///
    pub fn slowest_tape(&self) -> TapeId {
        TapeId(self.hmm.n_tapes().saturating_sub(1))
    }
    pub fn clique_range(&self, c: CliqueId) -> &Range {
        &self.clique_ranges[c.0]
    }
    pub fn state_range(&self, s: StateId) -> &Range {
        &self.state_ranges[s.0]
    }
    ///
    /// Cliques in the order a recursion walking in `forward` direction
    /// visits them
    ///
    pub fn walk(&self, forward: bool) -> Vec<CliqueId> {
        if forward {
            self.schedule.clone()
        } else {
            self.schedule.iter().rev().copied().collect()
        }
    }
    ///
    /// A clique is folded unless its table is kept, its slowest coordinate
    /// spans a length independent number of positions, or a banding
    /// iterator decides the visiting order. Every other clique that reads
    /// it must do so within the generations still held after the clique
    /// was filled in direction `forward`.
    ///
    pub fn is_folded(&self, c: CliqueId, retain_table: bool, forward: bool) -> bool {
        let clique = self.hmm.clique(c);
        let slow = self.slowest_tape();
        let range = self.clique_range(c);
        if retain_table
            || clique.banding.is_some()
            || clique.linked_banding.is_some()
            || range.is_fixed(slow)
        {
            return false;
        }
        let kept = self.fold_generations as i64 - 1;
        self.hmm.transitions.iter().all(|t| {
            let (source, reader) = (t.source(forward), t.target(forward));
            if self.hmm.clique_of(source) != c || self.hmm.clique_of(reader) == c {
                return true;
            }
            let emit = self.hmm.consumed(t.id)[slow.0] as i64;
            let at = self.state_range(reader);
            if forward {
                let (last, from, to) = (range.to[slow.0], at.from[slow.0], at.to[slow.0]);
                !last.is_start()
                    && !from.is_start()
                    && !to.is_start()
                    && from.offset - emit >= last.offset - kept
            } else {
                let (first, from, to) = (range.from[slow.0], at.from[slow.0], at.to[slow.0]);
                first.is_start()
                    && from.is_start()
                    && to.is_start()
                    && to.offset + emit <= first.offset + kept
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::mocks::*;
    use crate::model::{Alphabet, HmmBuilder};
    use crate::template::Template;

    #[test]
    fn casino_ranges() {
        let a = analyze(mock_casino()).unwrap();
        let f = a.hmm.state_by_name("F").unwrap();
        assert_eq!(a.state_range(f).to_string(), "Range[1,end]");
        assert_eq!(a.placements[f.0], vec![Placement::Variable]);
        assert_eq!(a.state_range(a.start).to_string(), "Range[0,0]");
        assert_eq!(a.state_range(a.end).to_string(), "Range[end,end]");
        let dice = a.hmm.clique_by_name("dice").unwrap();
        assert_eq!(a.clique_range(dice).to_string(), "Range[1,end]");
        assert_eq!(a.overall_range, Range::everything(1));
        assert_eq!(a.fixed_lengths, vec![None]);
        assert_eq!(a.fold_generations, 2);
        assert!(a.is_folded(dice, false, true));
        assert!(a.is_folded(dice, false, false));
        assert!(!a.is_folded(dice, true, true));
        let begin = a.hmm.clique_by_name("begin").unwrap();
        assert!(!a.is_folded(begin, false, true));
    }

    #[test]
    fn fixed_length_tape() {
        let a = analyze(mock_fixed_length(3)).unwrap();
        assert_eq!(a.fixed_lengths, vec![Some(3)]);
        let s1 = a.hmm.state_by_name("S1").unwrap();
        assert_eq!(a.state_range(s1).to_string(), "Range[2,2]");
        assert_eq!(a.placements[s1.0], vec![Placement::FromBoth]);
        assert_eq!(a.state_range(a.end).to_string(), "Range[end,end]");
        // no clique of a fixed length model is ever folded
        for c in a.hmm.clique_ids() {
            assert!(!a.is_folded(c, false, true));
        }
    }

    #[test]
    fn pair_generations() {
        let a = analyze(mock_pair()).unwrap();
        assert_eq!(a.slowest_tape(), TapeId(1));
        assert_eq!(a.fold_generations, 2);
        let m = a.hmm.state_by_name("M").unwrap();
        assert_eq!(a.state_range(m).to_string(), "Range[1,end][1,end]");
        let x = a.hmm.state_by_name("X").unwrap();
        assert_eq!(a.state_range(x).to_string(), "Range[1,end][0,end]");
    }

    #[test]
    fn folding_needs_late_readers() {
        // `chain` is read by `finish` at the end only, but `first` is read
        // by `chain` everywhere
        let a = analyze(mock_markov()).unwrap();
        let chain = a.hmm.clique_by_name("chain").unwrap();
        assert!(a.is_folded(chain, false, true));
        let first = a.hmm.clique_by_name("first").unwrap();
        assert!(!a.is_folded(first, false, true));
        let banded = analyze(mock_banded_pair()).unwrap();
        let align = banded.hmm.clique_by_name("align").unwrap();
        assert!(!banded.is_folded(align, false, true));
    }

    #[test]
    fn unreachable_state_is_fatal() {
        let p = |v| Template::constant("p", v);
        let mut b = HmmBuilder::new("dead", vec![("x", Alphabet::from_chars("ab", "ab"), 0)]);
        b.clique("c")
            .clique("d")
            .state("c", "start", None, &[])
            .state("c", "end", None, &[])
            .state("d", "island", None, &[])
            .transition("start", "end", p(1.0), None)
            .transition("island", "island", p(1.0), None);
        let hmm = b.build().unwrap();
        let e = analyze(hmm).unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::UnreachableState { .. }));
        assert_eq!(e.trace(), vec!["hmm `dead`"]);
    }
}
