//!
//! Table filling recursions: forward, backward, the fill part of Viterbi
//! and Baum-Welch
//!
//! ```text
//! _extreal_ forward(const std::vector<int>& seq_x, ...) {
//!     <tables, cached values, scratch arrays>
//!     tab_begin.write({0}).s[0] = 1.0;
//!     for (...) {                      one loop nest per clique
//!         <symbols, emissions>
//!         casino_dice_States& cur = tab_dice.write({iPos0});
//!         if (guard) {                 one block per vector and source
//!             const casino_begin_States& src = tab_begin.read({iPos0-1});
//!             cur.s[0] += src.s[0] * 0.5 * 0.16666666666666666;
//!         }
//!         <silent components>
//!     }
//!     return tab_finish.read({iLen0}).s[0];
//! }
//! ```
//!
use super::kind::{CountSelection, Request};
use super::offsets::Phase;
use super::positions::loop_groups;
use super::transitions::product;
use super::{Generator, Names};
use crate::error::{Result, Traced};
use crate::model::CliqueId;
use crate::range::Guard;
use log::debug;

impl<'a> Generator<'a> {
    ///
    /// Emit the fill function `name` for `req`.
    ///
    pub fn fill(&mut self, req: &Request, name: &str) -> Result<()> {
        let a = self.a;
        let params = req.kind.params();
        let phase = Phase::new(params.forward, false);
        let retain = req.retain_table();
        let counts = if params.counts { Some(req.counts) } else { None };
        let numeric = self.session.numeric();

        let mut args = self.sequence_arguments();
        if retain {
            args.push(format!("{}& tables", self.tables_type()));
        }
        if counts.is_some() {
            args.insert(0, format!("const {}& fw", self.tables_type()));
            args.push(format!("{}& counts", self.counts_type()));
        }
        self.begin_function("_extreal_", name, args, req.cache_values)?;
        self.declare_tables(retain, phase.forward)?;

        let (origin, lengths) = (self.origin(), self.lengths());
        let (start, end) = (a.hmm.state(a.start), a.hmm.state(a.end));
        if counts.is_some() {
            self.doc.add_init(
                "function",
                format!(
                    "const _extreal_ iTotal = fw.{}.read({}).s[{}];",
                    a.hmm.clique(end.clique).name,
                    lengths,
                    end.index_in_clique
                ),
            )?;
        }
        let (seed, seed_at, result, result_at) = if phase.forward {
            (start, &origin, end, &lengths)
        } else {
            (end, &lengths, start, &origin)
        };
        self.doc.add(format!(
            "{}.write({}).s[{}] = {};",
            self.table_var(seed.clique),
            seed_at,
            seed.index_in_clique,
            numeric.one()
        ));

        for group in loop_groups(a, &a.walk(phase.forward)) {
            let label = group
                .cliques
                .iter()
                .map(|&c| a.hmm.clique(c).name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            match group.banding {
                None => {
                    let c = group.cliques[0];
                    let range = a.clique_range(c).clone();
                    let folded = a.is_folded(c, retain, phase.forward);
                    let nest = self.open_loops(c, &range, phase.forward, folded)?;
                    self.cell(c, phase, params.maximize, counts)
                        .within_with(|| format!("clique `{}`", label))?;
                    self.close_loops(nest)?;
                }
                Some(b) => {
                    let nest = self.open_banded_loop(b, phase.forward)?;
                    for &c in group.cliques.iter() {
                        match self.band_guard(c) {
                            Guard::Always => self.doc.add("{"),
                            Guard::Condition(g) => self.doc.add(format!("if ({}) {{", g)),
                        };
                        self.cell(c, phase, params.maximize, counts)
                            .within_with(|| format!("clique `{}`", label))?;
                        self.doc.add("}");
                    }
                    self.close_loops(nest)?;
                }
            }
        }

        self.doc.add(format!(
            "return {};",
            self.state_cell(result.clique, result_at, result.index_in_clique)
        ));
        self.end_function()?;
        debug!("{} recursion `{}` written", req.kind, name);
        Ok(())
    }

    ///
    /// Body computing the cell of clique `c` at the current coordinate
    ///
    fn cell(
        &mut self,
        c: CliqueId,
        phase: Phase,
        maximize: bool,
        counts: Option<CountSelection>,
    ) -> Result<()> {
        let a = self.a;
        let index = |s| a.hmm.state(s).index_in_clique;
        let range = a.clique_range(c).clone();
        let here = self.positions(&vec![0; a.n_tapes()]);
        let states = self.states_type(c);
        self.doc.open("position")?;
        self.doc.add(format!(
            "{}& cur = {}.write({});",
            states,
            self.table_var(c),
            here
        ));
        if counts.is_some() {
            self.doc.add(format!(
                "const {}& fwcur = fw.{}.read({});",
                states,
                a.hmm.clique(c).name,
                here
            ));
        }

        for v in a.emission_vectors(c, phase.forward) {
            let offsets: Vec<i64> = v.iter().map(|&e| phase.source_offset(e)).collect();
            for src in a.source_cliques(c, &v, phase.forward) {
                let mut checked = range.clone();
                match checked.check(&offsets, a.clique_range(src), &Names(&a.hmm)) {
                    Guard::Always => self.doc.add("{"),
                    Guard::Condition(g) => self.doc.add(format!("if ({}) {{", g)),
                };
                let src_type = self.states_type(src);
                let src_table = self.table_var(src);
                let at = self.positions(&offsets);
                self.doc
                    .add(format!("const {}& src = {}.read({});", src_type, src_table, at));
                for t in a.transitions_between(src, c, &v, phase.forward) {
                    let tr = a.hmm.transition(t);
                    let (i, j) = (index(tr.target(phase.forward)), index(tr.source(phase.forward)));
                    let w = self.transition_weight(t, "position", &range, phase)?;
                    let from = format!("src.s[{}]", j);
                    let term = product(self.session.numeric(), &[Some(from.clone()), w.clone()]);
                    self.accumulate(&format!("cur.s[{}]", i), &term, maximize);
                    if let Some(selection) = counts {
                        self.count_transition(t, &from, w, &range, phase, selection)?;
                    }
                }
                self.doc.add("}");
            }
        }

        self.resolve_silent(c, phase, maximize)?;
        if let Some(selection) = counts {
            for t in self.silent_transitions(c, phase.forward) {
                let j = index(a.hmm.transition(t).source(phase.forward));
                let w = self.transition_weight(t, "position", &range, phase)?;
                self.count_transition(t, &format!("cur.s[{}]", j), w, &range, phase, selection)?;
            }
        }
        self.doc.close("position")?;
        Ok(())
    }

    ///
    /// `target += term`, or its max-product counterpart
    ///
    pub fn accumulate(&mut self, target: &str, term: &str, maximize: bool) {
        if maximize {
            self.doc.add(format!(
                "{t} = std::max<_extreal_>({t}, {});",
                term,
                t = target
            ));
        } else {
            self.doc.add(format!("{} += {};", target, term));
        }
    }
}
