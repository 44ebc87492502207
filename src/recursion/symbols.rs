//!
//! Cached symbol fetches
//!
//! Every `(tape, offset)` pair read by a function gets one slot of the
//! `iSymbol` array. The slot is filled once per instance of the scope that
//! needs it, with a range check that substitutes the alphabet's dummy
//! symbol when the position falls outside the sequence.
//!
use super::{Generator, Names};
use crate::error::Result;
use crate::model::TapeId;
use crate::range::{with_offset, Bound, Guard, Range};

impl<'a> Generator<'a> {
    ///
    /// Expression for the symbol `offset` positions away from the current
    /// coordinate on `tape`. `range` is where the current coordinate can be.
    ///
    pub fn symbol(&mut self, label: &str, tape: TapeId, offset: i64, range: &Range) -> Result<String> {
        let a = self.a;
        let next = self.fun.symbols.len();
        let k = *self.fun.symbols.entry((tape, offset)).or_insert(next);
        self.fun
            .temps
            .ensure(&mut self.doc, "iSymbol", "int", k + 1)?;
        let var = format!("iSymbol[{}]", k);
        if self.once.first_time(&self.doc, label, &var)? {
            let t = a.hmm.tape(tape);
            let fetch = format!("{}[{}]", t.sequence_id(), with_offset(&t.position_id(), offset));
            let statement = match symbol_guard(range, tape, offset, &Names(&a.hmm)) {
                Guard::Always => format!("{} = {};", var, fetch),
                Guard::Condition(c) => format!("{} = {} ? {} : {};", var, c, fetch, t.alphabet.dummy()),
            };
            self.doc.add_init(label, statement)?;
        }
        Ok(var)
    }
}

///
/// Condition under which position `offset` on `tape` holds a symbol, for a
/// coordinate anywhere in `range`. Other tapes are not checked.
///
pub fn symbol_guard(range: &Range, tape: TapeId, offset: i64, names: &Names) -> Guard {
    let mut bound = range.clone();
    bound.from[tape.0] = Bound::start(0);
    bound.to[tape.0] = Bound::end(-1);
    let mut shift = vec![0; range.n_tapes()];
    shift[tape.0] = offset;
    let mut current = range.clone();
    current.check(&shift, &bound, names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::model::mocks::*;
    use crate::session::Session;

    #[test]
    fn guard_only_checks_the_fetched_tape() {
        let a = analyze(mock_pair()).unwrap();
        let names = Names(&a.hmm);
        let m = a.hmm.state_by_name("M").unwrap();
        let range = a.state_range(m);
        // M sits in [1,end] on both tapes: the last symbol is always there
        assert_eq!(symbol_guard(range, TapeId(0), -1, &names), Guard::Always);
        assert_eq!(
            symbol_guard(range, TapeId(1), -2, &names).to_string(),
            "(iPos1-2>=0)"
        );
        assert_eq!(
            symbol_guard(range, TapeId(0), 0, &names).to_string(),
            "(iPos0<=iLen0-1)"
        );
    }

    #[test]
    fn fetched_once_per_scope() {
        let a = analyze(mock_casino()).unwrap();
        let mut session = Session::default();
        let mut g = Generator::new(&a, &mut session);
        let range = a.clique_range(a.hmm.clique_by_name("dice").unwrap()).clone();
        g.doc.open("function").unwrap();
        g.doc.open("position").unwrap();
        let s1 = g.symbol("position", TapeId(0), -1, &range).unwrap();
        let s2 = g.symbol("position", TapeId(0), -1, &range).unwrap();
        let s3 = g.symbol("position", TapeId(0), -2, &range).unwrap();
        assert_eq!(s1, s2);
        assert_eq!(s3, "iSymbol[1]");
        g.doc.close("position").unwrap();
        g.fun.temps.finish(&mut g.doc);
        g.doc.close("function").unwrap();
        let text = g.doc.render("").unwrap();
        assert_eq!(text.matches("iSymbol[0] = seq_x[iPos0-1];").count(), 1);
        assert!(text.contains("iSymbol[1] = (iPos0-2>=0) ? seq_x[iPos0-2] : 0;"));
        assert!(text.contains("int iSymbol[2];"));
    }
}
