//!
//! Recursion synthesizer
//!
//! Walks the cliques of an `AnalyzedHmm` and writes C++ DP recursions into
//! one `Document`. One `generate` call is one run: the `Session` is reset
//! first and every request becomes one or two functions.
//!
//! * `fill`: forward, backward, Viterbi (fill part) and Baum-Welch
//! * `trace`: Viterbi traceback and stochastic sampling
//! * `program`: header/body layout, identifier tables, helpers
//!
pub mod counts;
pub mod emissions;
pub mod fill;
pub mod kind;
pub mod matrix;
pub mod offsets;
pub mod positions;
pub mod program;
pub mod silent;
pub mod snippets;
pub mod states;
pub mod symbols;
pub mod temporaries;
pub mod trace;
pub mod transitions;

pub use kind::{CountSelection, KindParams, RecursionKind, Request};
pub use matrix::Matrix;
pub use offsets::Phase;
pub use program::{generate, Output};

use crate::analysis::AnalyzedHmm;
use crate::assembly::{DeclareOnce, Document, TextId};
use crate::error::Result;
use crate::model::{CliqueId, EmissionId, Hmm, TapeId, TransitionId};
use crate::range::Coordinates;
use crate::session::Session;
use fnv::FnvHashMap;
use temporaries::Temporaries;

///
/// Runtime names of the DP coordinates and sequence lengths
///
pub struct Names<'h>(pub &'h Hmm);

impl<'h> Coordinates for Names<'h> {
    fn position(&self, tape: TapeId) -> String {
        self.0.tape(tape).position_id()
    }
    fn length(&self, tape: TapeId) -> String {
        self.0.tape(tape).length_id()
    }
}

///
/// Per-function caches; cleared whenever a new function starts
///
#[derive(Debug, Default)]
pub struct FunctionState {
    pub cache_values: bool,
    /// `(tape, offset)` to its slot in `iSymbol`
    pub symbols: FnvHashMap<(TapeId, i64), usize>,
    /// emission to its slot in `iEmission`
    pub emissions: FnvHashMap<EmissionId, usize>,
    /// position independent transition to its slot in `iTransition`
    pub transitions: FnvHashMap<TransitionId, usize>,
    pub temps: Temporaries,
}

///
/// Signature of a generated function, patched once the run has collected
/// every parameter
///
#[derive(Debug, Clone)]
pub struct PendingSignature {
    pub definition: TextId,
    pub prototype: TextId,
    pub returns: String,
    pub name: String,
    /// leading arguments specific to the function
    pub arguments: Vec<String>,
}

pub struct Generator<'a> {
    pub a: &'a AnalyzedHmm,
    pub session: &'a mut Session,
    pub doc: Document,
    pub once: DeclareOnce,
    pub fun: FunctionState,
    pub signatures: Vec<PendingSignature>,
}

impl<'a> Generator<'a> {
    pub fn new(a: &'a AnalyzedHmm, session: &'a mut Session) -> Self {
        Generator {
            a,
            session,
            doc: Document::new(),
            once: DeclareOnce::new(),
            fun: FunctionState::default(),
            signatures: Vec::new(),
        }
    }

    //
    // names of generated types and variables
    //

    pub fn hmm_name(&self) -> &'a str {
        &self.a.hmm.name
    }
    pub fn states_type(&self, c: CliqueId) -> String {
        format!("{}_{}_States", self.a.hmm.name, self.a.hmm.clique(c).name)
    }
    pub fn tables_type(&self) -> String {
        format!("{}_Tables", self.a.hmm.name)
    }
    pub fn counts_type(&self) -> String {
        format!("{}_Counts", self.a.hmm.name)
    }
    pub fn table_var(&self, c: CliqueId) -> String {
        format!("tab_{}", self.a.hmm.clique(c).name)
    }
    pub fn table_type(&self, c: CliqueId, folded: bool) -> String {
        let class = &self.a.hmm.clique(c).table_class;
        let prefix = if folded { "Folded" } else { "" };
        format!(
            "{}{}<{},{}>",
            prefix,
            class,
            self.states_type(c),
            self.a.n_tapes()
        )
    }
    ///
    /// `{iPos0-1,iPos1}` for a coordinate shifted by `offsets`
    ///
    pub fn positions(&self, offsets: &[i64]) -> String {
        let items: Vec<String> = self
            .a
            .hmm
            .tapes
            .iter()
            .map(|t| crate::range::with_offset(&t.position_id(), offsets[t.id.0]))
            .collect();
        format!("{{{}}}", items.join(","))
    }
    ///
    /// `{0,0}`
    ///
    pub fn origin(&self) -> String {
        format!("{{{}}}", vec!["0"; self.a.n_tapes()].join(","))
    }
    ///
    /// `{iLen0,iLen1}`
    ///
    pub fn lengths(&self) -> String {
        let items: Vec<String> = self.a.hmm.tapes.iter().map(|t| t.length_id()).collect();
        format!("{{{}}}", items.join(","))
    }
    ///
    /// `const std::vector<int>& seq_x` for every tape
    ///
    pub fn sequence_arguments(&self) -> Vec<String> {
        self.a
            .hmm
            .tapes
            .iter()
            .map(|t| format!("const std::vector<int>& {}", t.sequence_id()))
            .collect()
    }

    //
    // function lifecycle
    //

    ///
    /// Start a function definition. Writes a placeholder signature (patched
    /// by `patch_signatures`), opens the `function` scope and declares the
    /// sequence lengths.
    ///
    pub fn begin_function(
        &mut self,
        returns: &str,
        name: &str,
        arguments: Vec<String>,
        cache_values: bool,
    ) -> Result<()> {
        self.fun = FunctionState {
            cache_values,
            ..FunctionState::default()
        };
        self.once.clear();
        let prototype = self.doc.add_init("program", "")?;
        self.doc.add("");
        let definition = self.doc.add("");
        self.signatures.push(PendingSignature {
            definition,
            prototype,
            returns: returns.to_string(),
            name: name.to_string(),
            arguments,
        });
        self.doc.add("{");
        self.doc.open("function")?;
        let a = self.a;
        for t in a.hmm.tapes.iter() {
            self.doc.add_init(
                "function",
                format!("const int {} = {}.size();", t.length_id(), t.sequence_id()),
            )?;
        }
        Ok(())
    }
    pub fn end_function(&mut self) -> Result<()> {
        self.fun.temps.finish(&mut self.doc);
        self.doc.close("function")?;
        self.doc.add("}");
        Ok(())
    }
    ///
    /// Fill in every function signature with the parameters accumulated in
    /// the session.
    ///
    pub fn patch_signatures(&mut self) {
        let extra: Vec<String> = self.session.parameters().to_vec();
        for sig in self.signatures.iter() {
            let mut args = sig.arguments.clone();
            args.extend(extra.iter().cloned());
            let head = format!("{} {}({})", sig.returns, sig.name, args.join(", "));
            self.doc.replace(sig.prototype, format!("{};", head));
            self.doc.replace(sig.definition, head);
        }
    }
}
