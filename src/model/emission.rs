//!
//! Emissions
//!
use super::ids::EmissionId;
use crate::template::Expr;

#[derive(Debug, Clone)]
pub struct Emission {
    pub id: EmissionId,
    pub name: String,
    pub probability: Expr,
    ///
    /// symbols consumed on each tape (0 or more)
    ///
    pub consumed: Vec<usize>,
    ///
    /// symbol history available on each tape; minimum of the orders of the
    /// states this emission is entered from
    ///
    pub order: Vec<usize>,
}

impl Emission {
    ///
    /// Consumes nothing on every tape
    ///
    pub fn is_silent(&self) -> bool {
        self.consumed.iter().all(|&c| c == 0)
    }
}
