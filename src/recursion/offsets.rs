//!
//! Where a symbol is read relative to the current DP coordinate
//!
//! A fill computes the cell of a transition's target (forward) or source
//! (backward); a trace stands on a transition's target and looks back.
//! With `emit` symbols consumed on a tape:
//!
//! ```text
//! forward fill   current = target   last symbol at current-1       position at current-emit
//! backward fill  current = source   last symbol at current+emit-1  position at current
//! trace          current = target   last symbol at current-1       position at current-emit
//! ```
//!
use crate::range::with_offset;

///
/// Direction of one generated function
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
    pub forward: bool,
    pub backtrace: bool,
}

impl Phase {
    pub fn new(forward: bool, backtrace: bool) -> Self {
        Phase { forward, backtrace }
    }
    ///
    /// Offset of the last consumed symbol (depth 0)
    ///
    pub fn symbol_offset(&self, emit: usize) -> i64 {
        symbol_offset(self.forward, self.backtrace, emit)
    }
    ///
    /// Offset of the symbol `depth` positions before the last consumed one
    ///
    pub fn symbol_at_depth(&self, emit: usize, depth: usize) -> i64 {
        self.symbol_offset(emit) - depth as i64
    }
    ///
    /// How far the current coordinate lies after the position bound to a
    /// position identifier
    ///
    pub fn position_shift(&self, emit: usize) -> i64 {
        position_shift(self.forward, self.backtrace, emit)
    }
    ///
    /// Offset of the cell read from, relative to the current one
    ///
    pub fn source_offset(&self, emit: usize) -> i64 {
        if self.forward || self.backtrace {
            -(emit as i64)
        } else {
            emit as i64
        }
    }
    ///
    /// Expression bound to a position identifier
    ///
    pub fn position_expr(&self, position: &str, emit: usize) -> String {
        format!("({})", with_offset(position, -self.position_shift(emit)))
    }
}

pub fn symbol_offset(forward: bool, backtrace: bool, emit: usize) -> i64 {
    if forward == backtrace {
        emit as i64 - 1
    } else {
        -1
    }
}

pub fn position_shift(forward: bool, backtrace: bool, emit: usize) -> i64 {
    if forward == backtrace {
        0
    } else {
        emit as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(true, false, 1 => -1 ; "forward fill single")]
    #[test_case(true, false, 3 => -1 ; "forward fill triple")]
    #[test_case(false, false, 1 => 0 ; "backward fill single")]
    #[test_case(false, false, 2 => 1 ; "backward fill double")]
    #[test_case(false, false, 0 => -1 ; "backward fill silent")]
    #[test_case(false, true, 2 => -1 ; "trace")]
    fn symbol_offsets(forward: bool, backtrace: bool, emit: usize) -> i64 {
        symbol_offset(forward, backtrace, emit)
    }

    #[test]
    fn fill_directions_differ_unless_single() {
        for emit in 0..4 {
            let f = symbol_offset(true, false, emit);
            let b = symbol_offset(false, false, emit);
            assert_eq!(f == b, emit == 0);
        }
    }

    #[test]
    fn positions() {
        let fw = Phase::new(true, false);
        let bw = Phase::new(false, false);
        assert_eq!(fw.position_expr("iPos0", 1), "(iPos0-1)");
        assert_eq!(bw.position_expr("iPos0", 1), "(iPos0)");
        assert_eq!(fw.source_offset(2), -2);
        assert_eq!(bw.source_offset(2), 2);
        assert_eq!(Phase::new(false, true).source_offset(1), -1);
        assert_eq!(fw.symbol_at_depth(1, 1), -2);
        assert_eq!(bw.symbol_at_depth(2, 2), -1);
    }
}
