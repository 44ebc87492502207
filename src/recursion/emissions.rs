//!
//! Binding probability templates, and emission values
//!
use super::offsets::Phase;
use super::Generator;
use crate::error::Result;
use crate::model::EmissionId;
use crate::range::Range;
use crate::template::{Binding, ExprTemplate, Slot};

impl<'a> Generator<'a> {
    ///
    /// Render `expr` for a transition consuming `consumed` that ends (forward
    /// fill, trace) or starts (backward fill) at the current coordinate.
    /// Symbol fetches are cached in scope `label`.
    ///
    pub fn bind(
        &mut self,
        expr: &dyn ExprTemplate,
        label: &str,
        consumed: &[usize],
        range: &Range,
        phase: Phase,
    ) -> Result<String> {
        let a = self.a;
        let mut binding = Binding::new(expr);
        for slot in binding.slots().to_vec() {
            let value = match &slot {
                Slot::Symbol { tape, depth } => {
                    let offset = phase.symbol_at_depth(consumed[tape.0], *depth);
                    self.symbol(label, *tape, offset, range)?
                }
                Slot::Position { tape } => {
                    phase.position_expr(&a.hmm.tape(*tape).position_id(), consumed[tape.0])
                }
                Slot::Global(name) => self.session.global(name),
            };
            binding.bind(&slot, value)?;
        }
        Ok(self.session.numeric().wrap(&binding.render()?))
    }

    ///
    /// Value of emission `e` at the current cell, or `None` when it is
    /// constantly one. Sequence dependent emissions are computed once per
    /// instance of scope `label` when values are cached.
    ///
    pub fn emission_value(
        &mut self,
        e: EmissionId,
        label: &str,
        range: &Range,
        phase: Phase,
    ) -> Result<Option<String>> {
        let a = self.a;
        let em = a.hmm.emission(e);
        let p = &*em.probability;
        if p.constant() == Some(1.0) {
            return Ok(None);
        }
        if !self.fun.cache_values || p.is_position_independent() {
            return self.bind(p, label, &em.consumed, range, phase).map(Some);
        }
        let next = self.fun.emissions.len();
        let k = *self.fun.emissions.entry(e).or_insert(next);
        self.fun
            .temps
            .ensure(&mut self.doc, "iEmission", "_extreal_", k + 1)?;
        let var = format!("iEmission[{}]", k);
        if self.once.first_time(&self.doc, label, &var)? {
            let value = self.bind(p, label, &em.consumed, range, phase)?;
            self.doc
                .add_init(label, format!("{} = {};  // {}", var, value, em.name))?;
        }
        Ok(Some(var))
    }
}
