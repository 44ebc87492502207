//!
//! Coordinate ranges
//!
//! A `Range` gives, per tape, the closed interval of DP coordinates a state
//! (or a clique, or a loop) can occupy. Each bound is anchored either to the
//! start of the tape (`0 + offset`) or to its end (`length + offset`).
//!
//! ```text
//! [Start(2), Start(2)]   fixed position 2
//! [End(-1), End(-1)]     fixed position length-1
//! [Start(0), End(0)]     anywhere in 0..=length
//! ```
//!
use crate::model::TapeId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bound {
    pub anchor: Anchor,
    pub offset: i64,
}

impl Bound {
    pub fn start(offset: i64) -> Bound {
        Bound {
            anchor: Anchor::Start,
            offset,
        }
    }
    pub fn end(offset: i64) -> Bound {
        Bound {
            anchor: Anchor::End,
            offset,
        }
    }
    pub fn is_start(&self) -> bool {
        self.anchor == Anchor::Start
    }
    ///
    /// Target-language expression of the bound, given the length identifier
    ///
    pub fn render(&self, length: &str) -> String {
        match self.anchor {
            Anchor::Start => format!("{}", self.offset),
            Anchor::End => with_offset(length, self.offset),
        }
    }
}

///
/// `base+k`, `base-k` or `base`
///
pub fn with_offset(base: &str, offset: i64) -> String {
    if offset > 0 {
        format!("{}+{}", base, offset)
    } else if offset < 0 {
        format!("{}{}", base, offset)
    } else {
        base.to_string()
    }
}

///
/// Shape of a range on one tape
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extent {
    /// one position
    Single,
    /// several positions, both bounds start-anchored
    FromStart,
    /// several positions, both bounds end-anchored
    FromEnd,
    /// start-anchored lower bound, end-anchored upper bound (or vice versa)
    Variable,
}

impl Extent {
    ///
    /// compact code: 0 single, 1 from start, 2 from end, 3 variable
    ///
    pub fn code(&self) -> u8 {
        match self {
            Extent::Single => 0,
            Extent::FromStart => 1,
            Extent::FromEnd => 2,
            Extent::Variable => 3,
        }
    }
}

///
/// Names of the runtime quantities a guard is written in terms of.
///
pub trait Coordinates {
    fn position(&self, tape: TapeId) -> String;
    fn length(&self, tape: TapeId) -> String;
}

///
/// Result of `Range::check`
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// statically known to hold
    Always,
    /// `&&` of per-tape conditions
    Condition(String),
}

impl Guard {
    pub fn is_always(&self) -> bool {
        matches!(self, Guard::Always)
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::Always => write!(f, "true"),
            Guard::Condition(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Range {
    pub from: Vec<Bound>,
    pub to: Vec<Bound>,
}

impl Range {
    pub fn new(from: Vec<Bound>, to: Vec<Bound>) -> Range {
        assert_eq!(from.len(), to.len());
        Range { from, to }
    }
    ///
    /// `[0, length]` on every tape
    ///
    pub fn everything(n_tapes: usize) -> Range {
        Range {
            from: vec![Bound::start(0); n_tapes],
            to: vec![Bound::end(0); n_tapes],
        }
    }
    ///
    /// `[-1, length+1]`: an unknown position, that fails every static check
    /// against `everything`
    ///
    pub fn anything(n_tapes: usize) -> Range {
        Range {
            from: vec![Bound::start(-1); n_tapes],
            to: vec![Bound::end(1); n_tapes],
        }
    }
    ///
    /// Valid positions of a symbol: `[0, length-1]`
    ///
    pub fn symbols(n_tapes: usize) -> Range {
        Range {
            from: vec![Bound::start(0); n_tapes],
            to: vec![Bound::end(-1); n_tapes],
        }
    }
    pub fn n_tapes(&self) -> usize {
        self.from.len()
    }
    ///
    /// Both bounds have the same anchor, i.e. the coordinate takes a number
    /// of positions that does not depend on the tape length.
    ///
    pub fn is_fixed(&self, tape: TapeId) -> bool {
        self.from[tape.0].anchor == self.to[tape.0].anchor
    }
    pub fn extent(&self, tape: TapeId) -> Extent {
        let (from, to) = (self.from[tape.0], self.to[tape.0]);
        if from == to {
            Extent::Single
        } else if from.is_start() && to.is_start() {
            Extent::FromStart
        } else if !from.is_start() && !to.is_start() {
            Extent::FromEnd
        } else {
            Extent::Variable
        }
    }
    ///
    /// Two ranges that need the same loop variables
    ///
    pub fn same_loop_variables(&self, other: &Range) -> bool {
        (0..self.n_tapes()).all(|i| self.is_fixed(TapeId(i)) == other.is_fixed(TapeId(i)))
    }
    ///
    /// Enlarge to cover `other`.
    ///
    /// Bounds with the same anchor take min (lower) and max (upper). With
    /// different anchors a start-anchored lower bound and an end-anchored
    /// upper bound win.
    ///
    pub fn include(&mut self, other: &Range) {
        for i in 0..self.n_tapes() {
            let (a, b) = (self.from[i], other.from[i]);
            self.from[i] = match (a.anchor, b.anchor) {
                (Anchor::End, Anchor::End) | (Anchor::Start, Anchor::Start) => Bound {
                    anchor: a.anchor,
                    offset: a.offset.min(b.offset),
                },
                (Anchor::End, Anchor::Start) => b,
                (Anchor::Start, Anchor::End) => a,
            };
            let (a, b) = (self.to[i], other.to[i]);
            self.to[i] = match (a.anchor, b.anchor) {
                (Anchor::End, Anchor::End) | (Anchor::Start, Anchor::Start) => Bound {
                    anchor: a.anchor,
                    offset: a.offset.max(b.offset),
                },
                (Anchor::Start, Anchor::End) => b,
                (Anchor::End, Anchor::Start) => a,
            };
        }
    }
    ///
    /// Guard ensuring that a coordinate in this range, moved by `offset`,
    /// lies in `bound`.
    ///
    /// A check on a tape is needed when the anchors make the comparison
    /// impossible at compile time, or when the shifted bound already falls
    /// outside. After the check this range is narrowed to the validated part
    /// (when anchors agree), so chained checks do not test it again.
    ///
    pub fn check(&mut self, offset: &[i64], bound: &Range, coords: &dyn Coordinates) -> Guard {
        let mut conditions: Vec<String> = Vec::new();
        for i in 0..self.n_tapes() {
            let tape = TapeId(i);
            let off = offset[i];
            let shifted = with_offset(&coords.position(tape), off);

            // lower bound
            let (cur, lim) = (self.from[i], bound.from[i]);
            if (cur.is_start() && !lim.is_start()) || cur.offset + off < lim.offset {
                conditions.push(format!(
                    "({}>={})",
                    shifted,
                    lim.render(&coords.length(tape))
                ));
                if cur.anchor == lim.anchor {
                    self.from[i].offset = lim.offset - off;
                }
            }

            // upper bound
            let (cur, lim) = (self.to[i], bound.to[i]);
            if (!cur.is_start() && lim.is_start()) || cur.offset + off > lim.offset {
                conditions.push(format!(
                    "({}<={})",
                    shifted,
                    lim.render(&coords.length(tape))
                ));
                if cur.anchor == lim.anchor {
                    self.to[i].offset = lim.offset - off;
                }
            }
        }
        if conditions.is_empty() {
            Guard::Always
        } else {
            Guard::Condition(conditions.join("&&"))
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |b: &Bound| match b.anchor {
            Anchor::Start => format!("{}", b.offset),
            Anchor::End => with_offset("end", b.offset),
        };
        let tapes: Vec<String> = (0..self.n_tapes())
            .map(|i| format!("[{},{}]", show(&self.from[i]), show(&self.to[i])))
            .collect();
        write!(f, "Range{}", tapes.join(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Names;
    impl Coordinates for Names {
        fn position(&self, tape: TapeId) -> String {
            format!("iPos{}", tape.0)
        }
        fn length(&self, tape: TapeId) -> String {
            format!("iLen{}", tape.0)
        }
    }

    fn fixed(p: i64) -> Range {
        Range::new(vec![Bound::start(p)], vec![Bound::start(p)])
    }

    #[test]
    fn include_idempotent_and_commutative() {
        let a = Range::new(
            vec![Bound::start(1), Bound::end(-3)],
            vec![Bound::start(4), Bound::end(0)],
        );
        let b = Range::new(
            vec![Bound::start(0), Bound::end(-1)],
            vec![Bound::start(2), Bound::end(-2)],
        );
        let mut aa = a.clone();
        aa.include(&a);
        assert_eq!(aa, a);

        let mut ab = a.clone();
        ab.include(&b);
        let mut ba = b.clone();
        ba.include(&a);
        assert_eq!(ab, ba);
        assert_eq!(
            ab,
            Range::new(
                vec![Bound::start(0), Bound::end(-3)],
                vec![Bound::start(4), Bound::end(0)],
            )
        );
    }

    #[test]
    fn include_mixed_anchors() {
        // start state [0,0] and end state [end,end] make [0,end]
        let mut r = fixed(0);
        r.include(&Range::new(vec![Bound::end(0)], vec![Bound::end(0)]));
        assert_eq!(r, Range::everything(1));
        let mut r = Range::new(vec![Bound::end(0)], vec![Bound::end(0)]);
        r.include(&fixed(0));
        assert_eq!(r, Range::everything(1));
        assert_eq!(r.extent(TapeId(0)), Extent::Variable);
        assert!(!r.is_fixed(TapeId(0)));
    }

    #[test]
    fn extents() {
        assert_eq!(fixed(3).extent(TapeId(0)).code(), 0);
        let r = Range::new(vec![Bound::start(0)], vec![Bound::start(2)]);
        assert_eq!(r.extent(TapeId(0)), Extent::FromStart);
        let r = Range::new(vec![Bound::end(-2)], vec![Bound::end(0)]);
        assert_eq!(r.extent(TapeId(0)).code(), 2);
        assert!(r.is_fixed(TapeId(0)));
        assert_eq!(Range::everything(1).extent(TapeId(0)).code(), 3);
    }

    #[test]
    fn check_unneeded() {
        // coordinate in [1, end] moved back by one lands in [0, end]
        let mut r = Range::new(vec![Bound::start(1)], vec![Bound::end(0)]);
        let g = r.check(&[-1], &Range::everything(1), &Names);
        assert_eq!(g, Guard::Always);
        assert_eq!(g.to_string(), "true");
    }

    #[test]
    fn check_narrows_range() {
        let mut r = Range::everything(1);
        let g = r.check(&[-1], &Range::everything(1), &Names);
        assert_eq!(g, Guard::Condition("(iPos0-1>=0)".to_string()));
        assert_eq!(r.from[0], Bound::start(1));
        // second identical check is statically satisfied
        let g = r.check(&[-1], &Range::everything(1), &Names);
        assert!(g.is_always());
    }

    #[test]
    fn check_symbol_fetch() {
        // reading the symbol at pos-1 needs pos-1 in [0, len-1]
        let mut r = Range::everything(2);
        let g = r.check(&[-1, 0], &Range::symbols(2), &Names);
        assert_eq!(
            g.to_string(),
            "(iPos0-1>=0)&&(iPos1<=iLen1-1)"
        );
        assert_eq!(r.from[0], Bound::start(1));
        assert_eq!(r.to[1], Bound::end(-1));
    }

    #[test]
    fn check_across_anchors() {
        // start-anchored current against end-anchored bound always checks
        let mut r = Range::new(vec![Bound::start(0)], vec![Bound::start(5)]);
        let bound = Range::new(vec![Bound::end(-3)], vec![Bound::end(0)]);
        let g = r.check(&[0], &bound, &Names);
        assert_eq!(g.to_string(), "(iPos0>=iLen0-3)&&(iPos0<=iLen0)");
        // anchors differ, so nothing was narrowed
        assert_eq!(r.from[0], Bound::start(0));
        let mut any = Range::anything(1);
        let g = any.check(&[0], &Range::everything(1), &Names);
        assert_eq!(g.to_string(), "(iPos0>=0)&&(iPos0<=iLen0)");
    }

    #[test]
    fn render_bounds() {
        assert_eq!(Bound::start(3).render("n"), "3");
        assert_eq!(Bound::end(0).render("n"), "n");
        assert_eq!(Bound::end(-2).render("n"), "n-2");
        assert_eq!(format!("{}", Range::symbols(1)), "Range[0,end-1]");
    }
}
