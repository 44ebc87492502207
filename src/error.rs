//!
//! Fatal compile errors
//!
//! Every error aborts the whole generation run. An error carries the path of
//! enclosing model nodes (`hmm`, `clique`, `state`, ...) that were being
//! processed when it was raised, outermost first.
//!
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    //
    // model
    //
    #[error("duplicate {kind} identifier `{id}`")]
    DuplicateIdentifier { kind: &'static str, id: String },
    #[error("{kind} `{id}` refers to undefined {target_kind} `{target}`")]
    DanglingReference {
        kind: &'static str,
        id: String,
        target_kind: &'static str,
        target: String,
    },
    #[error("clique `{clique}` has no states")]
    EmptyClique { clique: String },
    #[error("transition `{transition}` carries emission `{emission}` but its target state `{state}` already emits `{state_emission}`")]
    ConflictingEmission {
        transition: String,
        emission: String,
        state: String,
        state_emission: String,
    },
    #[error("transition `{transition}` from `{from}` (order {from_order}) consuming {consumed} symbol(s) on tape `{tape}` cannot reach `{to}` (order {to_order})")]
    OrderViolation {
        transition: String,
        from: String,
        to: String,
        tape: String,
        from_order: usize,
        consumed: usize,
        to_order: usize,
    },
    #[error("expression `{expr}` refers to tape `{tape}` which is not declared")]
    UnknownTape { expr: String, tape: String },
    //
    // analysis
    //
    #[error("graph on cliques is cyclic; a cycle runs through {cliques:?}")]
    CyclicCliqueGraph { cliques: Vec<String> },
    #[error("no start state (every state has an incoming transition)")]
    NoStartState,
    #[error("multiple start states: {states:?}")]
    MultipleStartStates { states: Vec<String> },
    #[error("no end state (every state has an outgoing transition)")]
    NoEndState,
    #[error("multiple end states: {states:?}")]
    MultipleEndStates { states: Vec<String> },
    #[error("{role} state `{state}` must have zero order on tape `{tape}`")]
    TerminalStateOrder {
        role: &'static str,
        state: String,
        tape: String,
    },
    #[error("state `{state}` is unreachable ({direction})")]
    UnreachableState {
        state: String,
        direction: &'static str,
    },
    //
    // assembly
    //
    #[error("scope `{label}` is already open")]
    ScopeAlreadyOpen { label: String },
    #[error("closing scope `{found}` but innermost open scope is `{expected}`")]
    ScopeMismatch { expected: String, found: String },
    #[error("closing scope `{label}` but no scope is open")]
    ScopeStackUnderflow { label: String },
    #[error("scope `{label}` is not open")]
    ScopeNotOpen { label: String },
    #[error("scope `{label}` is not a linear scope")]
    NotALinearScope { label: String },
    #[error("scope `{label}` is a linear scope")]
    LinearScope { label: String },
    #[error("slot {index} is out of range for linear scope `{label}` of width {width}")]
    LinearIndexOutOfRange {
        label: String,
        index: usize,
        width: usize,
    },
    #[error("unterminated literal in generated line `{line}`")]
    UnterminatedLiteral { line: String },
    //
    // templates
    //
    #[error("identifier `{slot}` of expression `{expr}` is not bound")]
    UnboundSlot { expr: String, slot: String },
    #[error("identifier `{slot}` of expression `{expr}` is bound twice")]
    SlotBoundTwice { expr: String, slot: String },
    #[error("expression `{expr}` has no identifier `{slot}`")]
    UnknownSlot { expr: String, slot: String },
    //
    // synthesis
    //
    #[error("matrix `{matrix}` entry ({row}, {col}) is outside its {dim}x{dim} bounds")]
    MatrixOutOfBounds {
        matrix: String,
        row: usize,
        col: usize,
        dim: usize,
    },
    #[error("matrix `{matrix}` was modified after its inverse was requested")]
    MatrixFrozen { matrix: String },
    #[error("{kind} recursion `{name}` needs a retained table from a {needs} recursion")]
    MissingInputTable {
        kind: &'static str,
        name: String,
        needs: &'static str,
    },
    #[error("unknown numeric type `{0}`")]
    UnknownNumeric(String),
    //
    // reference evaluation
    //
    #[error("expression `{expr}` has no numeric value")]
    NoValue { expr: String },
    #[error("silent transitions of clique `{clique}` form a singular system")]
    SingularSystem { clique: String },
    #[error("{found} sequence(s) given for {expected} tape(s)")]
    SequenceCount { expected: usize, found: usize },
    //
    // input/output
    //
    #[error("invalid model description: {0}")]
    InvalidDescription(String),
    #[error("io error: {0}")]
    Io(String),
}

///
/// Error with the structural trace of enclosing model nodes.
///
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}{}", format_trace(.trace))]
pub struct CompileError {
    kind: ErrorKind,
    /// innermost first; reversed for display
    trace: Vec<String>,
}

fn format_trace(trace: &[String]) -> String {
    if trace.is_empty() {
        String::new()
    } else {
        let path: Vec<&str> = trace.iter().rev().map(|s| s.as_str()).collect();
        format!(" (in {})", path.join(" > "))
    }
}

impl CompileError {
    pub fn new(kind: ErrorKind) -> Self {
        CompileError {
            kind,
            trace: Vec::new(),
        }
    }
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
    ///
    /// Enclosing nodes, outermost first.
    ///
    pub fn trace(&self) -> Vec<&str> {
        self.trace.iter().rev().map(|s| s.as_str()).collect()
    }
    ///
    /// Record that this error happened inside `node`.
    ///
    pub fn within<S: Into<String>>(mut self, node: S) -> Self {
        self.trace.push(node.into());
        self
    }
}

impl From<ErrorKind> for CompileError {
    fn from(kind: ErrorKind) -> Self {
        CompileError::new(kind)
    }
}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::new(ErrorKind::Io(e.to_string()))
    }
}

impl From<serde_json::Error> for CompileError {
    fn from(e: serde_json::Error) -> Self {
        CompileError::new(ErrorKind::InvalidDescription(e.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;

///
/// Attach trace entries to errors while they propagate with `?`. Errors
/// convertible into `CompileError` (io, json) are converted first.
///
pub trait Traced<T> {
    fn within<S: Into<String>>(self, node: S) -> Result<T>;
    fn within_with<F: FnOnce() -> String>(self, node: F) -> Result<T>;
}

impl<T, E: Into<CompileError>> Traced<T> for std::result::Result<T, E> {
    fn within<S: Into<String>>(self, node: S) -> Result<T> {
        self.map_err(|e| e.into().within(node))
    }
    fn within_with<F: FnOnce() -> String>(self, node: F) -> Result<T> {
        self.map_err(|e| e.into().within(node()))
    }
}

///
/// Shorthand for `Err(CompileError::new(kind))`.
///
pub fn fail<T>(kind: ErrorKind) -> Result<T> {
    Err(CompileError::new(kind))
}
