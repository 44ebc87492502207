//!
//! Transition values and the products they are part of
//!
use super::offsets::Phase;
use super::Generator;
use crate::error::Result;
use crate::model::TransitionId;
use crate::numeric::Numeric;
use crate::range::Range;

impl<'a> Generator<'a> {
    ///
    /// Probability of transition `t` at the current cell, or `None` when it
    /// is constantly one. Position independent probabilities are computed
    /// once in the function's init block when values are cached.
    ///
    pub fn transition_value(
        &mut self,
        t: TransitionId,
        label: &str,
        range: &Range,
        phase: Phase,
    ) -> Result<Option<String>> {
        let a = self.a;
        let tr = a.hmm.transition(t);
        let p = &*tr.probability;
        let consumed = a.hmm.consumed(t);
        if p.constant() == Some(1.0) {
            return Ok(None);
        }
        if !self.fun.cache_values || !p.is_position_independent() || p.constant().is_some() {
            return self.bind(p, label, consumed, range, phase).map(Some);
        }
        let next = self.fun.transitions.len();
        let k = *self.fun.transitions.entry(t).or_insert(next);
        self.fun
            .temps
            .ensure(&mut self.doc, "iTransition", "_extreal_", k + 1)?;
        let var = format!("iTransition[{}]", k);
        if self.once.first_time(&self.doc, "function", &var)? {
            let value = self.bind(p, "function", consumed, range, phase)?;
            self.doc
                .add_init("function", format!("{} = {};  // {}", var, value, tr.name))?;
        }
        Ok(Some(var))
    }

    ///
    /// `P(t) * e(t)` at the current cell, `None` if both are one
    ///
    pub fn transition_weight(
        &mut self,
        t: TransitionId,
        label: &str,
        range: &Range,
        phase: Phase,
    ) -> Result<Option<String>> {
        let a = self.a;
        let p = self.transition_value(t, label, range, phase)?;
        let e = self.emission_value(a.hmm.transition(t).emission, label, range, phase)?;
        Ok(match (p, e) {
            (None, None) => None,
            (p, e) => Some(product(self.session.numeric(), &[p, e])),
        })
    }

    ///
    /// `true` if the weight of `t` is the same at every cell
    ///
    pub fn is_position_independent(&self, t: TransitionId) -> bool {
        let tr = self.a.hmm.transition(t);
        tr.probability.is_position_independent()
            && self.a.hmm.emission(tr.emission).probability.is_position_independent()
    }
}

///
/// `a * b * ...` over the factors present; one if there are none
///
pub fn product(numeric: Numeric, factors: &[Option<String>]) -> String {
    let present: Vec<&str> = factors.iter().flatten().map(|s| s.as_str()).collect();
    if present.is_empty() {
        numeric.one().to_string()
    } else {
        present.join(" * ")
    }
}
