//!
//! Compiler session: the mutable state of one generation run
//!
//! Global identifier substitutions, accumulated function parameters,
//! helper definitions requested but not yet written and unique-name
//! counters. `reset` is called at the start of every run, so nothing leaks
//! from one run into the next.
//!
use crate::numeric::Numeric;
use fnv::FnvHashMap;
use log::debug;

#[derive(Debug, Clone)]
pub struct Session {
    numeric: Numeric,
    globals: FnvHashMap<String, String>,
    parameters: Vec<String>,
    pending: Vec<String>,
    written: Vec<String>,
    counters: FnvHashMap<&'static str, usize>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(Numeric::default())
    }
}

impl Session {
    pub fn new(numeric: Numeric) -> Self {
        let mut s = Session {
            numeric,
            globals: FnvHashMap::default(),
            parameters: Vec::new(),
            pending: Vec::new(),
            written: Vec::new(),
            counters: FnvHashMap::default(),
        };
        s.reset();
        s
    }
    ///
    /// Forget everything accumulated by a previous run.
    ///
    pub fn reset(&mut self) {
        self.globals.clear();
        self.parameters.clear();
        self.pending.clear();
        self.written.clear();
        self.counters.clear();
        self.globals
            .insert("_extreal_".to_string(), "_extreal_".to_string());
        self.globals
            .insert("_shortreal_".to_string(), "double".to_string());
        debug!("session reset ({})", self.numeric);
    }
    pub fn numeric(&self) -> Numeric {
        self.numeric
    }
    pub fn set_numeric(&mut self, numeric: Numeric) {
        self.numeric = numeric;
    }
    ///
    /// Text substituted for a global template identifier; unknown globals
    /// stand for themselves (they are expected among the parameters).
    ///
    pub fn global(&self, name: &str) -> String {
        self.globals
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
    pub fn define_global(&mut self, name: &str, value: &str) {
        self.globals.insert(name.to_string(), value.to_string());
    }
    ///
    /// Add a parameter declaration to every function of this run; repeated
    /// declarations are kept once.
    ///
    pub fn add_parameter(&mut self, declaration: &str) {
        let declaration = declaration.trim();
        if !declaration.is_empty() && !self.parameters.iter().any(|p| p == declaration) {
            self.parameters.push(declaration.to_string());
        }
    }
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }
    ///
    /// Request a helper definition; returns `true` the first time.
    ///
    pub fn require_helper(&mut self, name: &str) -> bool {
        if self.pending.iter().any(|p| p == name) || self.written.iter().any(|p| p == name) {
            false
        } else {
            self.pending.push(name.to_string());
            true
        }
    }
    ///
    /// Helpers requested since the last call, in request order
    ///
    pub fn take_pending(&mut self) -> Vec<String> {
        let pending = std::mem::take(&mut self.pending);
        self.written.extend(pending.iter().cloned());
        pending
    }
    ///
    /// Next value of a named counter, starting from 0
    ///
    pub fn next(&mut self, counter: &'static str) -> usize {
        let c = self.counters.entry(counter).or_insert(0);
        *c += 1;
        *c - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_forgets_the_run() {
        let mut s = Session::new(Numeric::Double);
        s.add_parameter("const Params& par");
        s.add_parameter(" const Params& par ");
        assert_eq!(s.parameters().len(), 1);
        assert!(s.require_helper("invert"));
        assert!(!s.require_helper("invert"));
        assert_eq!(s.take_pending(), vec!["invert".to_string()]);
        assert!(!s.require_helper("invert"));
        assert_eq!(s.next("matrix"), 0);
        assert_eq!(s.next("matrix"), 1);
        s.define_global("scale", "2.0");
        assert_eq!(s.global("scale"), "2.0");

        s.reset();
        assert!(s.parameters().is_empty());
        assert!(s.require_helper("invert"));
        assert_eq!(s.next("matrix"), 0);
        assert_eq!(s.global("scale"), "scale");
        assert_eq!(s.global("_shortreal_"), "double");
    }
}
