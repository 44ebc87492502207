//!
//! Tapes (observed sequences) and their alphabets
//!
use super::ids::TapeId;

///
/// Ordered symbol list. Symbols reach the generated code as indices into
/// this list; index 0 doubles as the dummy symbol read outside a sequence.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    pub name: String,
    pub symbols: Vec<String>,
}

impl Alphabet {
    pub fn new<S: Into<String>>(name: S, symbols: &[&str]) -> Self {
        Alphabet {
            name: name.into(),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
        }
    }
    ///
    /// "ACGT" style alphabet of one-character symbols
    ///
    pub fn from_chars<S: Into<String>>(name: S, chars: &str) -> Self {
        Alphabet {
            name: name.into(),
            symbols: chars.chars().map(|c| c.to_string()).collect(),
        }
    }
    pub fn size(&self) -> usize {
        self.symbols.len()
    }
    pub fn dummy(&self) -> usize {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    pub id: TapeId,
    pub name: String,
    pub alphabet: Alphabet,
    /// speed rank; lower is faster (inner loop)
    pub speed: i32,
}

impl Tape {
    ///
    /// identifier of the sequence argument in generated functions
    ///
    pub fn sequence_id(&self) -> String {
        format!("seq_{}", self.name)
    }
    ///
    /// identifier of the sequence length in generated functions
    ///
    pub fn length_id(&self) -> String {
        format!("iLen{}", self.id.0)
    }
    ///
    /// identifier of the DP coordinate on this tape
    ///
    pub fn position_id(&self) -> String {
        format!("iPos{}", self.id.0)
    }
}
