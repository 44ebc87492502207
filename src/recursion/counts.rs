//!
//! Baum-Welch expected counts
//!
//! Transitions with the same signature share one count array; a
//! transition's entries start at `sequential id * stride`, followed by one
//! entry per combination of the symbols its source state remembers.
//! Emissions are laid out the same way, over `order + consumed` symbols.
//!
//! ```text
//! counts.transition_1[3*2+iSymbol[0]] += iPosterior;
//! ```
//!
use super::kind::CountSelection;
use super::offsets::Phase;
use super::transitions::product;
use super::Generator;
use crate::analysis::Signature;
use crate::error::Result;
use crate::model::{TapeId, TransitionId};
use crate::range::Range;

impl<'a> Generator<'a> {
    ///
    /// Entries per member of a count array: the number of symbol histories
    ///
    pub fn stride(&self, sig: &Signature) -> usize {
        self.a
            .hmm
            .tapes
            .iter()
            .map(|t| t.alphabet.size().pow(sig.0[t.id.0] as u32))
            .product()
    }

    ///
    /// Write the `<hmm>_Counts` struct into the header.
    ///
    pub fn write_counts_type(&mut self) -> Result<()> {
        let a = self.a;
        let zero = self.session.numeric().zero();
        let mut members: Vec<(String, usize)> = Vec::new();
        for sig in a.signatures.transitions.signatures() {
            let n = a.signatures.transitions.members(sig).len() * self.stride(sig);
            members.push((format!("transition_{}", sig.ident()), n));
        }
        for sig in a.signatures.emissions.signatures() {
            let emitting = a
                .signatures
                .emissions
                .members(sig)
                .iter()
                .any(|&e| !a.hmm.emission(e).is_silent());
            if emitting {
                let n = a.signatures.emissions.members(sig).len() * self.stride(sig);
                members.push((format!("emission_{}", sig.ident()), n));
            }
        }
        let name = self.counts_type();
        let mut lines = vec![format!("struct {} {{", name)];
        for (member, _) in members.iter() {
            lines.push(format!("std::vector<_extreal_> {};", member));
        }
        let inits: Vec<String> = members
            .iter()
            .map(|(member, n)| format!("{}({}, {})", member, n, zero))
            .collect();
        if inits.is_empty() {
            lines.push(format!("{}() {{}}", name));
        } else {
            lines.push(format!("{}() : {} {{}}", name, inits.join(", ")));
        }
        lines.push("};".to_string());
        self.header_lines(&lines)
    }

    ///
    /// Index into a count array for the symbols at `offsets` (per tape, from
    /// the current coordinate)
    ///
    fn history_index(
        &mut self,
        base: usize,
        offsets: &[(TapeId, i64)],
        range: &Range,
    ) -> Result<String> {
        let a = self.a;
        let mut index = String::new();
        for &(tape, offset) in offsets {
            let symbol = self.symbol("position", tape, offset, range)?;
            let size = a.hmm.tape(tape).alphabet.size();
            index = if index.is_empty() {
                symbol
            } else {
                format!("({})*{}+{}", index, size, symbol)
            };
        }
        Ok(if index.is_empty() {
            format!("{}", base)
        } else {
            format!("{}+{}", base, index)
        })
    }

    ///
    /// Add the posterior of transition `t` to the counts. The current cell
    /// holds its source state (the fill walks backward); `to` is the
    /// backward value of its target and `weight` its probability times
    /// emission.
    ///
    pub fn count_transition(
        &mut self,
        t: TransitionId,
        to: &str,
        weight: Option<String>,
        range: &Range,
        phase: Phase,
        selection: CountSelection,
    ) -> Result<()> {
        let a = self.a;
        let tr = a.hmm.transition(t);
        let from = a.hmm.state(tr.from);
        let em = a.hmm.emission(tr.emission);
        let count_emission = selection.emissions && !em.is_silent();
        if !selection.transitions && !count_emission {
            return Ok(());
        }
        self.fun
            .temps
            .scalar(&mut self.doc, "iPosterior", "_extreal_ iPosterior;")?;
        let posterior = product(
            self.session.numeric(),
            &[
                Some(format!("fwcur.s[{}]", from.index_in_clique)),
                Some(to.to_string()),
                weight,
            ],
        );
        self.doc
            .add(format!("iPosterior = {} / iTotal;", posterior));

        if selection.transitions {
            let sig = a.signatures.transitions.signature(t).clone();
            let base = a.signatures.transitions.sequential_id(t) * self.stride(&sig);
            let offsets: Vec<(TapeId, i64)> = a
                .hmm
                .tapes
                .iter()
                .flat_map(|tape| (0..from.order[tape.id.0]).map(move |d| (tape.id, -1 - d as i64)))
                .collect();
            let index = self.history_index(base, &offsets, range)?;
            self.doc.add(format!(
                "counts.transition_{}[{}] += iPosterior;  // {}",
                sig.ident(),
                index,
                tr.name
            ));
        }
        if count_emission {
            let sig = a.signatures.emissions.signature(em.id).clone();
            let base = a.signatures.emissions.sequential_id(em.id) * self.stride(&sig);
            let offsets: Vec<(TapeId, i64)> = a
                .hmm
                .tapes
                .iter()
                .flat_map(|tape| {
                    let (consumed, depth) = (em.consumed[tape.id.0], sig.0[tape.id.0]);
                    (0..depth).map(move |d| (tape.id, phase.symbol_at_depth(consumed, d)))
                })
                .collect();
            let index = self.history_index(base, &offsets, range)?;
            self.doc.add(format!(
                "counts.emission_{}[{}] += iPosterior;  // {}",
                sig.ident(),
                index,
                em.name
            ));
        }
        Ok(())
    }
}
