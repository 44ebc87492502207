//!
//! Silent transitions inside one clique
//!
//! After the emitting contributions of a cell are summed, the silent
//! components of its clique are resolved in `sort_graph` order:
//!
//! * a transient state just adds what its silent predecessors hold,
//! * a single state with silent self loops is divided by `1 - t`,
//! * k >= 2 mutually dependent states solve `x = (I - T)^-1 b` with the
//!   inverse computed by the emitted `hmmc_invert` helper.
//!
//! Maximizing recursions relax the component k-1 times instead, since an
//! inverse has no max-plus counterpart.
//!
use super::matrix::Matrix;
use super::offsets::Phase;
use super::transitions::product;
use super::Generator;
use crate::analysis::SilentComponent;
use crate::error::{Result, Traced};
use crate::model::{CliqueId, StateId, TransitionId};
use log::{debug, warn};

/// components larger than this are still inverted densely, with a warning
pub const LARGE_COMPONENT: usize = 8;

impl<'a> Generator<'a> {
    ///
    /// Resolve every silent component of clique `c` at the current cell,
    /// whose state vector is `cur`.
    ///
    pub fn resolve_silent(&mut self, c: CliqueId, phase: Phase, maximize: bool) -> Result<()> {
        let a = self.a;
        for comp in a.silent_components(c, phase.forward) {
            let names: Vec<&str> = comp.states.iter().map(|&s| a.hmm.state(s).name.as_str()).collect();
            self.resolve_component(c, &comp, phase, maximize)
                .within_with(|| format!("silent component {:?}", names))?;
        }
        Ok(())
    }

    fn resolve_component(
        &mut self,
        c: CliqueId,
        comp: &SilentComponent,
        phase: Phase,
        maximize: bool,
    ) -> Result<()> {
        let a = self.a;
        let range = a.clique_range(c).clone();
        let index = |s: StateId| a.hmm.state(s).index_in_clique;
        let (external, internal): (Vec<TransitionId>, Vec<TransitionId>) = comp
            .transitions
            .iter()
            .copied()
            .partition(|&t| !comp.states.contains(&a.hmm.transition(t).source(phase.forward)));

        for &t in external.iter() {
            let tr = a.hmm.transition(t);
            let w = self.transition_weight(t, "position", &range, phase)?;
            let term = product(
                self.session.numeric(),
                &[Some(format!("cur.s[{}]", index(tr.source(phase.forward)))), w],
            );
            self.accumulate(&format!("cur.s[{}]", index(tr.target(phase.forward))), &term, maximize);
        }
        if !comp.cyclic || internal.is_empty() {
            return Ok(());
        }

        let k = comp.states.len();
        if maximize {
            if k < 2 {
                return Ok(());
            }
            self.doc
                .add(format!("for (int iRound = 0; iRound < {}; ++iRound) {{", k - 1));
            for &t in internal.iter() {
                let tr = a.hmm.transition(t);
                if tr.from == tr.to {
                    continue;
                }
                let w = self.transition_weight(t, "position", &range, phase)?;
                let term = product(
                    self.session.numeric(),
                    &[Some(format!("cur.s[{}]", index(tr.source(phase.forward)))), w],
                );
                self.accumulate(&format!("cur.s[{}]", index(tr.target(phase.forward))), &term, true);
            }
            self.doc.add("}");
            return Ok(());
        }

        if k == 1 {
            let s = index(comp.states[0]);
            let mut loops: Vec<String> = Vec::new();
            for &t in internal.iter() {
                let w = self.transition_weight(t, "position", &range, phase)?;
                loops.push(product(self.session.numeric(), &[w]));
            }
            self.doc.add(format!(
                "cur.s[{s}] = cur.s[{s}] / ({} - ({}));",
                self.session.numeric().one(),
                loops.join(" + "),
                s = s
            ));
            return Ok(());
        }

        if k > LARGE_COMPONENT {
            warn!("silent component of {} states is inverted densely", k);
        }
        let m = self.session.next("matrix");
        let mut matrix = Matrix::identity(format!("iMatrix{}", m), k);
        let position = |s: StateId| comp.states.iter().position(|&x| x == s);
        let mut independent = true;
        for &t in internal.iter() {
            let tr = a.hmm.transition(t);
            let (row, col) = match (position(tr.target(phase.forward)), position(tr.source(phase.forward))) {
                (Some(row), Some(col)) => (row, col),
                _ => continue,
            };
            independent &= self.is_position_independent(t);
            let w = self.transition_weight(t, "position", &range, phase)?;
            matrix.subtract(row, col, &product(self.session.numeric(), &[w]))?;
        }
        matrix.freeze();
        let inverse = format!("iInverse{}", m);
        self.fun
            .temps
            .ensure(&mut self.doc, matrix.name(), "_extreal_", k * k)?;
        self.fun.temps.ensure(&mut self.doc, &inverse, "_extreal_", k * k)?;
        self.fun
            .temps
            .ensure(&mut self.doc, "iTempVector", "_extreal_", k)?;
        self.session.require_helper("invert");

        let mut setup = matrix.assignments(matrix.name());
        setup.push(format!("hmmc_invert({}, {}, {});", matrix.name(), inverse, k));
        if independent {
            for line in setup {
                self.doc.add_init("function", line)?;
            }
        } else {
            self.doc.add_lines(setup);
        }
        for (r, &s) in comp.states.iter().enumerate() {
            self.doc
                .add(format!("iTempVector[{}] = cur.s[{}];", r, index(s)));
        }
        for (r, &s) in comp.states.iter().enumerate() {
            let terms: Vec<String> = (0..k)
                .map(|col| format!("{}[{}] * iTempVector[{}]", inverse, r * k + col, col))
                .collect();
            self.doc
                .add(format!("cur.s[{}] = {};", index(s), terms.join(" + ")));
        }
        debug!(
            "silent component of {} states solved with {} ({})",
            k,
            matrix.name(),
            if independent { "once" } else { "per cell" }
        );
        Ok(())
    }

    ///
    /// Silent transitions of clique `c`, in resolution order
    ///
    pub fn silent_transitions(&self, c: CliqueId, forward: bool) -> Vec<TransitionId> {
        self.a
            .silent_components(c, forward)
            .into_iter()
            .flat_map(|comp| comp.transitions)
            .collect()
    }
}
