//!
//! Numeric values of probability expressions
//!
//! Constant expressions evaluate to themselves. Anything else (arrays,
//! parameters, symbol lookups) needs a value or a function registered under
//! the transition or emission name.
//!
use crate::error::{fail, ErrorKind, Result};
use crate::model::{Emission, Transition};
use fnv::FnvHashMap;

///
/// Emission value from the symbol history on each tape, oldest first; the
/// last `consumed` symbols of a tape are the ones the emission consumes.
///
pub type EmissionFn = Box<dyn Fn(&[Vec<usize>]) -> f64>;

#[derive(Default)]
pub struct Weights {
    transitions: FnvHashMap<String, f64>,
    emissions: FnvHashMap<String, EmissionFn>,
}

impl Weights {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn transition_value<S: Into<String>>(mut self, transition: S, value: f64) -> Self {
        self.transitions.insert(transition.into(), value);
        self
    }
    pub fn emission_fn<S, F>(mut self, emission: S, f: F) -> Self
    where
        S: Into<String>,
        F: Fn(&[Vec<usize>]) -> f64 + 'static,
    {
        self.emissions.insert(emission.into(), Box::new(f));
        self
    }
    ///
    /// Probability of a transition, not including its emission
    ///
    pub fn transition(&self, tr: &Transition) -> Result<f64> {
        match self.transitions.get(&tr.name) {
            Some(&v) => Ok(v),
            None => match tr.probability.constant() {
                Some(v) => Ok(v),
                None => fail(ErrorKind::NoValue {
                    expr: tr.probability.name().to_string(),
                }),
            },
        }
    }
    pub fn emission(&self, em: &Emission, history: &[Vec<usize>]) -> Result<f64> {
        match self.emissions.get(&em.name) {
            Some(f) => Ok(f(history)),
            None => match em.probability.constant() {
                Some(v) => Ok(v),
                None => fail(ErrorKind::NoValue {
                    expr: em.probability.name().to_string(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mocks::*;

    #[test]
    fn constants_and_overrides() {
        let hmm = mock_casino();
        let fair = &hmm.emissions[0];
        let loaded = &hmm.emissions[1];
        let w = Weights::new();
        assert_abs_diff_eq!(w.emission(fair, &[vec![3]]).unwrap(), 1.0 / 6.0, epsilon = 1e-12);
        assert_eq!(
            w.emission(loaded, &[vec![3]]).unwrap_err().kind(),
            &ErrorKind::NoValue {
                expr: "loaded".to_string()
            }
        );
        let w = Weights::new()
            .emission_fn("loaded", |h| LOADED[h[0][0]])
            .transition_value("start_F", 0.25);
        assert_abs_diff_eq!(w.emission(loaded, &[vec![5]]).unwrap(), 0.5);
        assert_abs_diff_eq!(w.transition(&hmm.transitions[0]).unwrap(), 0.25);
        assert_abs_diff_eq!(w.transition(&hmm.transitions[1]).unwrap(), 0.5);
    }
}
