//!
//! Tracebacks over a retained table
//!
//! Starting at the end state with every coordinate at the sequence end, the
//! trace repeatedly picks a predecessor of the current state: the best one
//! for Viterbi, a random one weighted by its forward contribution for
//! sampling. The state path is returned in forward order.
//!
use super::kind::{RecursionKind, Request};
use super::offsets::Phase;
use super::transitions::product;
use super::{Generator, Names};
use crate::error::{Result, Traced};
use crate::range::{with_offset, Guard};
use log::debug;

fn next_position(tape: usize) -> String {
    format!("iNextPos{}", tape)
}

impl<'a> Generator<'a> {
    ///
    /// Emit the traceback function `name` for `req`.
    ///
    pub fn trace(&mut self, req: &Request, name: &str) -> Result<()> {
        let a = self.a;
        let sample = req.kind == RecursionKind::Sample;
        let phase = Phase::new(false, true);
        let numeric = self.session.numeric();

        let mut args = vec![format!("const {}& tables", self.tables_type())];
        args.extend(self.sequence_arguments());
        if sample {
            args.push("std::mt19937& rng".to_string());
        }
        self.begin_function("std::vector<int>", name, args, req.cache_values)?;
        if sample {
            self.doc.add_init(
                "function",
                "std::uniform_real_distribution<double> iUniform(0.0, 1.0);",
            )?;
        }

        let n = a.n_tapes();
        self.doc.add("std::vector<int> path;");
        self.doc.add(format!("int iState = {};", a.end.0));
        for t in a.hmm.tapes.iter() {
            self.doc
                .add(format!("int {} = {};", t.position_id(), t.length_id()));
        }
        self.doc.add("path.push_back(iState);");
        self.doc.add(format!("while (iState != {}) {{", a.start.0));
        self.doc.add("int iNextState = -1;");
        for t in a.hmm.tapes.iter() {
            self.doc
                .add(format!("int {} = {};", next_position(t.id.0), t.position_id()));
        }
        let here = self.positions(&vec![0; n]);
        if sample {
            self.doc.add(format!(
                "const _extreal_ iTarget = tables.getProb(iState, {}) * iUniform(rng);",
                here
            ));
            self.doc.add(format!("_extreal_ iAcc = {};", numeric.zero()));
        } else {
            self.doc.add(format!("_extreal_ iBest = {};", numeric.zero()));
        }
        self.doc.add("switch (iState) {");
        for s in a.hmm.state_ids() {
            if s == a.start {
                continue;
            }
            let state = a.hmm.state(s);
            self.doc.add(format!("case {}: {{  // {}", s.0, state.name));
            self.doc.open("innersymbol")?;
            let range = a.state_range(s).clone();
            for tr in a.hmm.transitions_to(s) {
                let offsets: Vec<i64> = a
                    .hmm
                    .consumed(tr.id)
                    .iter()
                    .map(|&e| phase.source_offset(e))
                    .collect();
                let mut checked = range.clone();
                match checked.check(&offsets, a.state_range(tr.from), &Names(&a.hmm)) {
                    Guard::Always => self.doc.add("{"),
                    Guard::Condition(g) => self.doc.add(format!("if ({}) {{", g)),
                };
                let from = a.hmm.state(tr.from);
                let w = self
                    .transition_weight(tr.id, "innersymbol", &range, phase)
                    .within_with(|| format!("transition `{}`", tr.name))?;
                let value = product(
                    numeric,
                    &[
                        Some(format!(
                            "tables.{}.read({}).s[{}]",
                            a.hmm.clique(from.clique).name,
                            self.positions(&offsets),
                            from.index_in_clique
                        )),
                        w,
                    ],
                );
                self.doc
                    .add(format!("const _extreal_ iValue = {};", value));
                if sample {
                    self.doc.add("iAcc += iValue;");
                    self.doc.add("if (iNextState < 0 && iAcc >= iTarget) {");
                } else {
                    self.doc.add("if (iValue > iBest) {");
                    self.doc.add("iBest = iValue;");
                }
                self.doc.add(format!("iNextState = {};", tr.from.0));
                for t in a.hmm.tapes.iter() {
                    self.doc.add(format!(
                        "{} = {};",
                        next_position(t.id.0),
                        with_offset(&t.position_id(), offsets[t.id.0])
                    ));
                }
                self.doc.add("}");
                self.doc.add("}");
            }
            self.doc.close("innersymbol")?;
            self.doc.add("break;");
            self.doc.add("}");
        }
        self.doc.add("}");
        self.doc.add("if (iNextState < 0) {");
        self.doc.add("break;");
        self.doc.add("}");
        self.doc.add("iState = iNextState;");
        for t in a.hmm.tapes.iter() {
            self.doc
                .add(format!("{} = {};", t.position_id(), next_position(t.id.0)));
        }
        self.doc.add("path.push_back(iState);");
        self.doc.add("}");
        self.doc.add("std::reverse(path.begin(), path.end());");
        self.doc.add("return path;");
        self.end_function()?;
        debug!("{} traceback `{}` written", req.kind, name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::model::mocks::*;
    use crate::session::Session;

    fn traced(req: Request) -> String {
        let a = analyze(mock_casino()).unwrap();
        let mut session = Session::default();
        let mut g = Generator::new(&a, &mut session);
        g.doc.open("program").unwrap();
        let name = req.name.clone();
        g.trace(&req, &name).unwrap();
        g.patch_signatures();
        g.doc.close("program").unwrap();
        g.doc.render("").unwrap()
    }

    #[test]
    fn viterbi_picks_the_best() {
        let text = traced(Request::new(RecursionKind::Viterbi, "viterbi_trace"));
        assert!(text.contains(
            "std::vector<int> viterbi_trace(const casino_Tables& tables, const std::vector<int>& seq_x);"
        ));
        assert!(text.contains("int iState = 3;"));
        assert!(text.contains("int iPos0 = iLen0;"));
        assert!(text.contains("while (iState != 0) {"));
        assert!(text.contains("case 2: {  // L"));
        assert!(text.contains("const _extreal_ iValue = tables.dice.read({iPos0-1}).s[1] * 0.85 * iEmission[0];"));
        assert!(text.contains("if (iValue > iBest) {"));
        assert!(text.contains("iNextPos0 = iPos0-1;"));
        assert!(text.contains("std::reverse(path.begin(), path.end());"));
        // emissions are fetched inside each case
        assert_eq!(text.matches("iEmission[0] = loaded[iSymbol[0]];").count(), 1);
        assert!(!text.contains("case 0:"));
    }

    #[test]
    fn sampling_is_cumulative() {
        let text = traced(Request::new(RecursionKind::Sample, "sample"));
        assert!(text.contains("std::mt19937& rng)"));
        assert!(text.contains("std::uniform_real_distribution<double> iUniform(0.0, 1.0);"));
        assert!(text.contains("const _extreal_ iTarget = tables.getProb(iState, {iPos0}) * iUniform(rng);"));
        assert!(text.contains("iAcc += iValue;"));
        assert!(text.contains("if (iNextState < 0 && iAcc >= iTarget) {"));
    }
}
