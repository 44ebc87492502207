//!
//! hmmc: a compiler from hidden Markov model descriptions to C++ dynamic
//! programming recursions (forward, backward, Viterbi, sampling and
//! Baum-Welch).
//!
//! Pipeline
//!
//! ```text
//! HmmBuilder / HmmDescription
//!     -> Hmm (model)
//!     -> analysis::analyze -> AnalyzedHmm (schedule, ranges, signatures)
//!     -> recursion::generate -> assembly::Document -> Output { header, body }
//! ```
//!
pub mod analysis;
pub mod assembly;
pub mod cli;
pub mod error;
pub mod graph;
pub mod model;
pub mod numeric;
pub mod prelude;
pub mod range;
pub mod recursion;
pub mod reference;
pub mod session;
pub mod template;

#[cfg(test)]
#[macro_use]
extern crate approx;
