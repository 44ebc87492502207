//!
//! Recursion kinds and requests
//!
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecursionKind {
    Forward,
    Backward,
    Viterbi,
    Sample,
    BaumWelch,
}

///
/// Fixed parameters of a recursion kind
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindParams {
    /// cliques walked in schedule order, transitions from `from` to `to`
    pub forward: bool,
    /// walks back over a retained table instead of filling one
    pub backtrace: bool,
    /// keeps the full table by default
    pub retain_table: bool,
    /// accumulates posterior counts
    pub counts: bool,
    /// max instead of sum
    pub maximize: bool,
}

const fn params(
    forward: bool,
    backtrace: bool,
    retain_table: bool,
    counts: bool,
    maximize: bool,
) -> KindParams {
    KindParams {
        forward,
        backtrace,
        retain_table,
        counts,
        maximize,
    }
}

const KIND_PARAMS: [(RecursionKind, KindParams); 5] = [
    (RecursionKind::Forward, params(true, false, false, false, false)),
    (RecursionKind::Backward, params(false, false, false, false, false)),
    (RecursionKind::Viterbi, params(true, false, true, false, true)),
    (RecursionKind::Sample, params(false, true, true, false, false)),
    (RecursionKind::BaumWelch, params(false, false, false, true, false)),
];

impl RecursionKind {
    pub fn params(&self) -> KindParams {
        KIND_PARAMS
            .iter()
            .find(|(k, _)| k == self)
            .map(|(_, p)| *p)
            .unwrap_or(KIND_PARAMS[0].1)
    }
    pub fn label(&self) -> &'static str {
        match self {
            RecursionKind::Forward => "forward",
            RecursionKind::Backward => "backward",
            RecursionKind::Viterbi => "viterbi",
            RecursionKind::Sample => "sample",
            RecursionKind::BaumWelch => "baumwelch",
        }
    }
    ///
    /// Kinds that read a retained forward table
    ///
    pub fn needs_forward_table(&self) -> bool {
        matches!(self, RecursionKind::Sample | RecursionKind::BaumWelch)
    }
}

impl fmt::Display for RecursionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

///
/// Which Baum-Welch counts to accumulate
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountSelection {
    #[serde(default = "yes")]
    pub transitions: bool,
    #[serde(default = "yes")]
    pub emissions: bool,
}

fn yes() -> bool {
    true
}

impl Default for CountSelection {
    fn default() -> Self {
        CountSelection {
            transitions: true,
            emissions: true,
        }
    }
}

///
/// One function to generate
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub kind: RecursionKind,
    /// C++ function name
    pub name: String,
    /// keep the full table; the kind's default if unset
    #[serde(default)]
    pub retain_table: Option<bool>,
    /// compute position independent transitions and per-cell emissions once
    #[serde(default = "yes")]
    pub cache_values: bool,
    #[serde(default)]
    pub counts: CountSelection,
}

impl Request {
    pub fn new<S: Into<String>>(kind: RecursionKind, name: S) -> Self {
        Request {
            kind,
            name: name.into(),
            retain_table: None,
            cache_values: true,
            counts: CountSelection::default(),
        }
    }
    pub fn retained(mut self) -> Self {
        self.retain_table = Some(true);
        self
    }
    pub fn uncached(mut self) -> Self {
        self.cache_values = false;
        self
    }
    pub fn retain_table(&self) -> bool {
        self.retain_table
            .unwrap_or_else(|| self.kind.params().retain_table)
    }
}
