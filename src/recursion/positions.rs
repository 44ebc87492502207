//!
//! Loop nests over DP coordinates
//!
//! The slowest tape is the outermost loop. A forward walk counts up, a
//! backward walk counts down. Cliques with a banding visit the coordinates
//! the banding iterator yields instead, and consecutive cliques sharing a
//! linked banding share one loop.
//!
//! ```text
//! for (int iPos1 = 1; iPos1 <= iLen1; ++iPos1) {      slowvar
//!     for (int iPos0 = 1; iPos0 <= iLen0; ++iPos0) {  position
//!         ...
//! ```
//!
use super::{Generator, Names};
use crate::error::Result;
use crate::model::{BandingId, CliqueId, TapeId};
use crate::range::{Extent, Guard, Range};

///
/// Cliques filled inside one loop nest
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopGroup {
    pub banding: Option<BandingId>,
    pub cliques: Vec<CliqueId>,
}

///
/// Split a walk into loop groups.
///
pub fn loop_groups(a: &crate::analysis::AnalyzedHmm, walk: &[CliqueId]) -> Vec<LoopGroup> {
    let mut groups: Vec<LoopGroup> = Vec::new();
    for &c in walk {
        let clique = a.hmm.clique(c);
        match (clique.linked_banding, clique.banding) {
            (Some(b), _) => match groups.last_mut() {
                Some(g) if g.banding == Some(b) && a.hmm.clique(g.cliques[0]).linked_banding == Some(b) => {
                    g.cliques.push(c)
                }
                _ => groups.push(LoopGroup {
                    banding: Some(b),
                    cliques: vec![c],
                }),
            },
            (None, b) => groups.push(LoopGroup {
                banding: b,
                cliques: vec![c],
            }),
        }
    }
    groups
}

///
/// What has to be closed after the body of a loop nest
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopNest {
    braces: usize,
    slowvar: bool,
}

impl<'a> Generator<'a> {
    ///
    /// Open the loops visiting every coordinate of `range`. When `folded`,
    /// the slow column about to be filled is cleared first. The cursor ends
    /// inside the innermost loop.
    ///
    pub fn open_loops(&mut self, c: CliqueId, range: &Range, forward: bool, folded: bool) -> Result<LoopNest> {
        let a = self.a;
        let mut nest = LoopNest {
            braces: 0,
            slowvar: false,
        };
        for i in (0..a.n_tapes()).rev() {
            let tape = a.hmm.tape(TapeId(i));
            let pos = tape.position_id();
            let len = tape.length_id();
            let (lo, hi) = (range.from[i].render(&len), range.to[i].render(&len));
            let first = if forward { &lo } else { &hi };
            let slowest = i + 1 == a.n_tapes();
            if slowest && folded {
                self.fun
                    .temps
                    .scalar(&mut self.doc, "iPrevSlowCoord", "int iPrevSlowCoord;")?;
                self.doc.add(format!("iPrevSlowCoord = {};", first));
            }
            match range.extent(TapeId(i)) {
                Extent::Single => {
                    self.doc.add("{");
                    self.doc.add(format!("const int {} = {};", pos, lo));
                }
                _ if forward => {
                    self.doc
                        .add(format!("for (int {p} = {}; {p} <= {}; ++{p}) {{", lo, hi, p = pos));
                }
                _ => {
                    self.doc
                        .add(format!("for (int {p} = {}; {p} >= {}; --{p}) {{", hi, lo, p = pos));
                }
            }
            nest.braces += 1;
            if slowest {
                self.doc.open("slowvar")?;
                nest.slowvar = true;
                if folded {
                    let table = self.table_var(c);
                    self.doc.add_lines(vec![
                        format!("if ({} != iPrevSlowCoord) {{", pos),
                        format!("{}.clear({});", table, pos),
                        format!("iPrevSlowCoord = {};", pos),
                        "}".to_string(),
                    ]);
                }
            }
        }
        Ok(nest)
    }

    ///
    /// Open the banding loop of a group; coordinates come from the iterator.
    ///
    pub fn open_banded_loop(&mut self, banding: BandingId, forward: bool) -> Result<LoopNest> {
        let a = self.a;
        let b = a.hmm.banding(banding);
        let it = &b.iterator;
        if forward {
            self.doc
                .add(format!("for ({it}.begin(); !{it}.end(); {it}.next()) {{", it = it));
        } else {
            self.doc
                .add(format!("for ({it}.rbegin(); !{it}.rend(); {it}.prev()) {{", it = it));
        }
        self.doc.open("slowvar")?;
        for t in a.hmm.tapes.iter() {
            self.doc.add(format!(
                "const int {} = {};",
                t.position_id(),
                b.coordinates[t.id.0]
            ));
        }
        Ok(LoopNest {
            braces: 1,
            slowvar: true,
        })
    }

    ///
    /// Condition for a banding coordinate to lie in the range of clique `c`
    ///
    pub fn band_guard(&self, c: CliqueId) -> Guard {
        let a = self.a;
        let mut anywhere = Range::anything(a.n_tapes());
        anywhere.check(&vec![0; a.n_tapes()], a.clique_range(c), &Names(&a.hmm))
    }

    pub fn close_loops(&mut self, nest: LoopNest) -> Result<()> {
        if nest.slowvar {
            self.doc.close("slowvar")?;
        }
        for _ in 0..nest.braces {
            self.doc.add("}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::model::mocks::*;
    use crate::session::Session;

    #[test]
    fn pair_loops_forward_and_backward() {
        let a = analyze(mock_pair()).unwrap();
        let align = a.hmm.clique_by_name("align").unwrap();
        let range = a.clique_range(align).clone();
        let mut session = Session::default();
        let mut g = Generator::new(&a, &mut session);
        g.doc.open("function").unwrap();
        let nest = g.open_loops(align, &range, true, true).unwrap();
        g.doc.add("body();");
        g.close_loops(nest).unwrap();
        let nest = g.open_loops(align, &range, false, false).unwrap();
        g.close_loops(nest).unwrap();
        g.doc.close("function").unwrap();
        let text = g.doc.render("").unwrap();
        assert!(text.contains("int iPrevSlowCoord;"));
        assert!(text.contains("iPrevSlowCoord = 0;"));
        assert!(text.contains("for (int iPos1 = 0; iPos1 <= iLen1; ++iPos1) {"));
        assert!(text.contains("    for (int iPos0 = 0; iPos0 <= iLen0; ++iPos0) {"));
        assert!(text.contains("        body();"));
        assert!(text.contains("tab_align.clear(iPos1);"));
        assert!(text.contains("for (int iPos1 = iLen1; iPos1 >= 0; --iPos1) {"));
        assert!(text.find("clear").unwrap() < text.find("iPos0 = 0").unwrap());
    }

    #[test]
    fn fixed_coordinate_is_a_block() {
        let a = analyze(mock_casino()).unwrap();
        let begin = a.hmm.clique_by_name("begin").unwrap();
        let range = a.clique_range(begin).clone();
        let mut session = Session::default();
        let mut g = Generator::new(&a, &mut session);
        g.doc.open("function").unwrap();
        let nest = g.open_loops(begin, &range, true, false).unwrap();
        g.close_loops(nest).unwrap();
        g.doc.close("function").unwrap();
        assert_eq!(g.doc.render("").unwrap(), "{\n    const int iPos0 = 0;\n}\n");
    }

    #[test]
    fn banded_clique() {
        let a = analyze(mock_banded_pair()).unwrap();
        let groups = loop_groups(&a, &a.walk(true));
        assert_eq!(groups.len(), a.hmm.cliques.len());
        let align = a.hmm.clique_by_name("align").unwrap();
        let g0 = groups.iter().find(|g| g.cliques == vec![align]).unwrap();
        assert!(g0.banding.is_some());
        let mut session = Session::default();
        let mut g = Generator::new(&a, &mut session);
        assert!(!g.band_guard(align).is_always());
        g.doc.open("function").unwrap();
        let nest = g.open_banded_loop(g0.banding.unwrap(), false).unwrap();
        g.close_loops(nest).unwrap();
        g.doc.close("function").unwrap();
        let text = g.doc.render("").unwrap();
        assert!(text.contains("for (band.rbegin(); !band.rend(); band.prev()) {"));
        assert!(text.contains("const int iPos0 = band.x();"));
        assert!(text.contains("const int iPos1 = band.y();"));
    }
}
