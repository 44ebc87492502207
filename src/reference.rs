//!
//! Reference evaluator
//!
//! Computes forward, backward and Viterbi values of an analysed model
//! directly on concrete sequences, with the same clique schedule and the
//! same silent components the generated code uses. Silent transitions
//! inside a cell are solved densely with `ndarray`.
//!
//! This is what generated recursions are checked against; nothing here is
//! used while generating code.
//!
//! ```text
//! let w = Weights::new().emission_fn("loaded", |h| LOADED[h[0][0]]);
//! let e = Evaluator::new(&a, &w, &[seq])?;
//! e.forward_probability()? == e.backward_probability()?
//! ```
//!
pub mod solve;
pub mod weights;

pub use weights::Weights;

use crate::analysis::AnalyzedHmm;
use crate::error::{fail, ErrorKind, Result, Traced};
use crate::model::{CliqueId, StateId, TransitionId};
use itertools::Itertools;
use log::debug;
use ndarray::prelude::*;
use ndarray::IxDyn;
use rand::seq::SliceRandom;
use rand::Rng;
use solve::{relax_silent, solve_silent};

///
/// Value of every state at every coordinate
///
#[derive(Debug, Clone)]
pub struct Table {
    cells: Vec<ArrayD<f64>>,
}

impl Table {
    fn new(n_states: usize, lengths: &[usize]) -> Self {
        let shape: Vec<usize> = lengths.iter().map(|&l| l + 1).collect();
        Table {
            cells: (0..n_states)
                .map(|_| ArrayD::zeros(IxDyn(&shape)))
                .collect(),
        }
    }
    pub fn get(&self, s: StateId, pos: &[usize]) -> f64 {
        self.cells[s.0][IxDyn(pos)]
    }
    fn set(&mut self, s: StateId, pos: &[usize], value: f64) {
        self.cells[s.0][IxDyn(pos)] = value;
    }
}

pub struct Evaluator<'a> {
    a: &'a AnalyzedHmm,
    weights: &'a Weights,
    /// per tape, symbol indices
    seqs: &'a [Vec<usize>],
    lengths: Vec<usize>,
}

impl<'a> Evaluator<'a> {
    pub fn new(a: &'a AnalyzedHmm, weights: &'a Weights, seqs: &'a [Vec<usize>]) -> Result<Self> {
        if seqs.len() != a.n_tapes() {
            return fail(ErrorKind::SequenceCount {
                expected: a.n_tapes(),
                found: seqs.len(),
            });
        }
        Ok(Evaluator {
            a,
            weights,
            seqs,
            lengths: seqs.iter().map(|s| s.len()).collect(),
        })
    }

    ///
    /// Every coordinate, slowest tape outermost, in increasing order
    ///
    fn coordinates(&self) -> Vec<Vec<usize>> {
        (0..self.lengths.len())
            .rev()
            .map(|t| 0..=self.lengths[t])
            .multi_cartesian_product()
            .map(|mut p| {
                p.reverse();
                p
            })
            .collect()
    }
    ///
    /// Coordinate at the other end of a transition consuming `consumed`
    ///
    fn shift(&self, pos: &[usize], consumed: &[usize], forward: bool) -> Option<Vec<usize>> {
        pos.iter()
            .zip(consumed.iter())
            .zip(self.lengths.iter())
            .map(|((&p, &c), &len)| {
                if forward {
                    p.checked_sub(c)
                } else {
                    Some(p + c).filter(|&q| q <= len)
                }
            })
            .collect()
    }
    ///
    /// Probability times emission of `t`, whose target lies at `to`
    ///
    fn weight(&self, t: TransitionId, to: &[usize]) -> Result<f64> {
        let hmm = &self.a.hmm;
        let tr = hmm.transition(t);
        let em = hmm.emission(tr.emission);
        let history: Vec<Vec<usize>> = hmm
            .tapes
            .iter()
            .map(|tape| {
                let i = tape.id.0;
                let need = em.order[i] + em.consumed[i];
                (0..need)
                    .map(|k| {
                        let p = to[i] as i64 - need as i64 + k as i64;
                        if p >= 0 {
                            self.seqs[i][p as usize]
                        } else {
                            tape.alphabet.dummy()
                        }
                    })
                    .collect()
            })
            .collect();
        let p = self.weights.transition(tr)?;
        let e = self.weights.emission(em, &history)?;
        Ok(p * e)
    }

    fn fill(&self, forward: bool, maximize: bool) -> Result<Table> {
        let a = self.a;
        let hmm = &a.hmm;
        let mut table = Table::new(hmm.n_states(), &self.lengths);
        let mut cells = self.coordinates();
        if !forward {
            cells.reverse();
        }
        let (seed, seed_at) = if forward {
            (a.start, vec![0; self.lengths.len()])
        } else {
            (a.end, self.lengths.clone())
        };
        for c in a.walk(forward) {
            let name = &hmm.clique(c).name;
            self.fill_clique(c, &cells, forward, maximize, (seed, seed_at.as_slice()), &mut table)
                .within_with(|| format!("clique `{}`", name))?;
        }
        Ok(table)
    }

    fn fill_clique(
        &self,
        c: CliqueId,
        cells: &[Vec<usize>],
        forward: bool,
        maximize: bool,
        (seed, seed_at): (StateId, &[usize]),
        table: &mut Table,
    ) -> Result<()> {
        let hmm = &self.a.hmm;
        let clique = hmm.clique(c);
        let k = clique.n_states();
        let index = |s: StateId| hmm.state(s).index_in_clique;
        let into = self.a.transitions_into(c, forward);
        for pos in cells {
            let mut b: Array1<f64> = Array1::zeros(k);
            let mut internal: Array2<f64> = Array2::zeros((k, k));
            if hmm.clique_of(seed) == c && pos.as_slice() == seed_at {
                b[index(seed)] = 1.0;
            }
            for &t in into.iter() {
                let tr = hmm.transition(t);
                let (i, j) = (index(tr.target(forward)), index(tr.source(forward)));
                if hmm.is_silent(t) {
                    let w = self.weight(t, pos)?;
                    internal[[i, j]] = if maximize {
                        internal[[i, j]].max(w)
                    } else {
                        internal[[i, j]] + w
                    };
                    continue;
                }
                let other = match self.shift(pos, hmm.consumed(t), forward) {
                    Some(other) => other,
                    None => continue,
                };
                let w = if forward {
                    self.weight(t, pos)?
                } else {
                    self.weight(t, &other)?
                };
                let term = table.get(tr.source(forward), &other) * w;
                b[i] = if maximize { b[i].max(term) } else { b[i] + term };
            }
            let x = if internal.iter().all(|&v| v == 0.0) {
                b
            } else if maximize {
                relax_silent(&internal, &b)
            } else {
                match solve_silent(&internal, &b) {
                    Some(x) => x,
                    None => {
                        return fail(ErrorKind::SingularSystem {
                            clique: clique.name.clone(),
                        })
                    }
                }
            };
            for &s in clique.states.iter() {
                table.set(s, pos, x[index(s)]);
            }
        }
        Ok(())
    }

    pub fn forward(&self) -> Result<Table> {
        self.fill(true, false)
    }
    pub fn backward(&self) -> Result<Table> {
        self.fill(false, false)
    }
    ///
    /// Probability of the sequences: the forward value of the end state
    ///
    pub fn forward_probability(&self) -> Result<f64> {
        Ok(self.forward()?.get(self.a.end, &self.lengths))
    }
    ///
    /// The same probability from the backward value of the start state
    ///
    pub fn backward_probability(&self) -> Result<f64> {
        let origin = vec![0; self.lengths.len()];
        Ok(self.backward()?.get(self.a.start, &origin))
    }
    ///
    /// Probability of the best path, and the path from start to end
    ///
    pub fn viterbi(&self) -> Result<(f64, Vec<StateId>)> {
        let table = self.fill(true, true)?;
        let best = table.get(self.a.end, &self.lengths);
        let path = self.trace(&table, |values| {
            values
                .iter()
                .enumerate()
                .filter(|(_, &v)| v > 0.0)
                .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
                    Some((_, b)) if b >= v => best,
                    _ => Some((i, v)),
                })
                .map(|(i, _)| i)
        })?;
        debug!("viterbi {} over {} states", best, path.len());
        Ok((best, path))
    }
    ///
    /// A path drawn from the posterior, walking back over a forward table
    ///
    pub fn sample<R: Rng>(&self, forward: &Table, rng: &mut R) -> Result<Vec<StateId>> {
        self.trace(forward, |values| {
            let choices: Vec<usize> = (0..values.len()).collect();
            choices.choose_weighted(rng, |&i| values[i]).ok().copied()
        })
    }

    ///
    /// Walk back from the end state, picking a predecessor among the
    /// contributions `value(from) * weight` to the current state.
    ///
    fn trace<F>(&self, table: &Table, mut pick: F) -> Result<Vec<StateId>>
    where
        F: FnMut(&[f64]) -> Option<usize>,
    {
        let hmm = &self.a.hmm;
        let mut state = self.a.end;
        let mut pos = self.lengths.clone();
        let mut path = vec![state];
        let limit = self.coordinates().len() * hmm.n_states() + 1;
        while state != self.a.start && path.len() <= limit {
            let mut values: Vec<f64> = Vec::new();
            let mut steps: Vec<(StateId, Vec<usize>)> = Vec::new();
            for tr in hmm.transitions_to(state) {
                let from = match self.shift(&pos, hmm.consumed(tr.id), true) {
                    Some(from) => from,
                    None => continue,
                };
                values.push(table.get(tr.from, &from) * self.weight(tr.id, &pos)?);
                steps.push((tr.from, from));
            }
            match pick(&values) {
                Some(i) => {
                    let (s, p) = steps.swap_remove(i);
                    state = s;
                    pos = p;
                }
                None => break,
            }
            path.push(state);
        }
        path.reverse();
        Ok(path)
    }
}
