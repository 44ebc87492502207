//!
//! globally-available parts
//!
pub use crate::analysis::{analyze, AnalyzedHmm};
pub use crate::error::{CompileError, ErrorKind, Result, Traced};
pub use crate::model::{CliqueId, Hmm, HmmBuilder, StateId, TapeId, TransitionId};
pub use crate::numeric::Numeric;
pub use crate::recursion::{generate, Output, RecursionKind, Request};
pub use crate::session::Session;
