//!
//! Probability expression templates
//!
//! A template is a piece of target-language text with named identifiers.
//! Each identifier is attached to a slot:
//!
//! * `Slot::Symbol { tape, depth }` the symbol `depth` positions back on a tape
//! * `Slot::Position { tape }` the current coordinate on a tape
//! * `Slot::Global(name)` anything else, bound by the session
//!
//! The generator binds every slot exactly once through a `Binding` and then
//! renders the text.
//!
use crate::error::{fail, ErrorKind, Result};
use crate::model::TapeId;
use fnv::FnvHashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Symbol { tape: TapeId, depth: usize },
    Position { tape: TapeId },
    Global(String),
}

impl Slot {
    pub fn depends_on_sequence(&self) -> bool {
        !matches!(self, Slot::Global(_))
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Symbol { tape, depth } => write!(f, "symbol[tape={},depth={}]", tape.0, depth),
            Slot::Position { tape } => write!(f, "position[tape={}]", tape.0),
            Slot::Global(name) => write!(f, "{}", name),
        }
    }
}

///
/// The narrow contract the synthesizer relies on.
///
pub trait ExprTemplate: fmt::Debug {
    ///
    /// name used in diagnostics and identifier tables
    ///
    fn name(&self) -> &str;
    ///
    /// distinct slots, in declaration order
    ///
    fn slots(&self) -> Vec<Slot>;
    ///
    /// Text with every slot replaced by its value.
    /// `values` holds a value for every slot in `slots()`.
    ///
    fn substitute(&self, values: &FnvHashMap<Slot, String>) -> String;
    ///
    /// Numeric value if the expression is a plain constant.
    ///
    fn constant(&self) -> Option<f64> {
        None
    }
    ///
    /// `true` if the value is the same at every DP cell.
    ///
    fn is_position_independent(&self) -> bool {
        self.slots().iter().all(|s| !s.depends_on_sequence())
    }
}

/// Shared handle to a template; one emission is used by many transitions.
pub type Expr = Rc<dyn ExprTemplate>;

///
/// Plain text template with whole-word identifier substitution.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    name: String,
    text: String,
    identifiers: Vec<(String, Slot)>,
}

impl Template {
    pub fn new<S: Into<String>, T: Into<String>>(name: S, text: T) -> Self {
        Template {
            name: name.into(),
            text: text.into(),
            identifiers: Vec::new(),
        }
    }
    ///
    /// Constant probability
    ///
    pub fn constant<S: Into<String>>(name: S, value: f64) -> Self {
        Template::new(name, format!("{:?}", value))
    }
    pub fn symbol<S: Into<String>>(mut self, identifier: S, tape: TapeId, depth: usize) -> Self {
        self.identifiers
            .push((identifier.into(), Slot::Symbol { tape, depth }));
        self
    }
    pub fn position<S: Into<String>>(mut self, identifier: S, tape: TapeId) -> Self {
        self.identifiers
            .push((identifier.into(), Slot::Position { tape }));
        self
    }
    pub fn global<S: Into<String>>(mut self, identifier: S) -> Self {
        let identifier = identifier.into();
        self.identifiers
            .push((identifier.clone(), Slot::Global(identifier)));
        self
    }
    pub fn text(&self) -> &str {
        &self.text
    }
    pub fn into_expr(self) -> Expr {
        Rc::new(self)
    }
}

impl ExprTemplate for Template {
    fn name(&self) -> &str {
        &self.name
    }
    fn slots(&self) -> Vec<Slot> {
        let mut slots: Vec<Slot> = Vec::new();
        for (_, slot) in self.identifiers.iter() {
            if !slots.contains(slot) {
                slots.push(slot.clone());
            }
        }
        slots
    }
    fn substitute(&self, values: &FnvHashMap<Slot, String>) -> String {
        let lookup: FnvHashMap<&str, &Slot> = self
            .identifiers
            .iter()
            .map(|(ident, slot)| (ident.as_str(), slot))
            .collect();
        let mut out = String::with_capacity(self.text.len());
        let mut word = String::new();
        let flush = |word: &mut String, out: &mut String| {
            if !word.is_empty() {
                match lookup.get(word.as_str()).and_then(|s| values.get(s)) {
                    Some(v) => out.push_str(v),
                    None => out.push_str(word),
                }
                word.clear();
            }
        };
        for c in self.text.chars() {
            let continues = c == '_' || c.is_ascii_alphanumeric();
            let starts = c == '_' || c.is_ascii_alphabetic();
            if continues && (!word.is_empty() || starts) {
                word.push(c);
            } else {
                flush(&mut word, &mut out);
                out.push(c);
            }
        }
        flush(&mut word, &mut out);
        out
    }
    fn constant(&self) -> Option<f64> {
        if self.identifiers.is_empty() {
            self.text.trim().parse().ok()
        } else {
            None
        }
    }
}

///
/// Bind-exactly-once wrapper around a template
///
pub struct Binding<'a> {
    expr: &'a dyn ExprTemplate,
    slots: Vec<Slot>,
    values: FnvHashMap<Slot, String>,
}

impl<'a> Binding<'a> {
    pub fn new(expr: &'a dyn ExprTemplate) -> Self {
        Binding {
            expr,
            slots: expr.slots(),
            values: FnvHashMap::default(),
        }
    }
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }
    pub fn is_bound(&self, slot: &Slot) -> bool {
        self.values.contains_key(slot)
    }
    pub fn bind<S: Into<String>>(&mut self, slot: &Slot, value: S) -> Result<()> {
        if !self.slots.contains(slot) {
            return fail(ErrorKind::UnknownSlot {
                expr: self.expr.name().to_string(),
                slot: slot.to_string(),
            });
        }
        if self.values.contains_key(slot) {
            return fail(ErrorKind::SlotBoundTwice {
                expr: self.expr.name().to_string(),
                slot: slot.to_string(),
            });
        }
        self.values.insert(slot.clone(), value.into());
        Ok(())
    }
    pub fn render(&self) -> Result<String> {
        if let Some(slot) = self.slots.iter().find(|s| !self.values.contains_key(s)) {
            return fail(ErrorKind::UnboundSlot {
                expr: self.expr.name().to_string(),
                slot: slot.to_string(),
            });
        }
        Ok(self.expr.substitute(&self.values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_emission() -> Template {
        Template::new("emitMatch", "match[x][y] * scale(pos)")
            .symbol("x", TapeId(0), 0)
            .symbol("y", TapeId(1), 0)
            .position("pos", TapeId(0))
    }

    #[test]
    fn substitutes_whole_words_only() {
        let t = match_emission();
        let mut b = Binding::new(&t);
        b.bind(&Slot::Symbol { tape: TapeId(0), depth: 0 }, "iSymbol[0]")
            .unwrap();
        b.bind(&Slot::Symbol { tape: TapeId(1), depth: 0 }, "iSymbol[1]")
            .unwrap();
        b.bind(&Slot::Position { tape: TapeId(0) }, "(iPos0)-1")
            .unwrap();
        assert_eq!(
            b.render().unwrap(),
            "match[iSymbol[0]][iSymbol[1]] * scale((iPos0)-1)"
        );
    }

    #[test]
    fn bind_exactly_once() {
        let t = match_emission();
        let mut b = Binding::new(&t);
        let x = Slot::Symbol {
            tape: TapeId(0),
            depth: 0,
        };
        b.bind(&x, "a").unwrap();
        let e = b.bind(&x, "b").unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::SlotBoundTwice { .. }));
        let e = b.render().unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::UnboundSlot { .. }));
        let e = b
            .bind(&Slot::Global("nothing".to_string()), "c")
            .unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::UnknownSlot { .. }));
    }

    #[test]
    fn constants() {
        let t = Template::constant("t", 0.3);
        assert_eq!(t.text(), "0.3");
        assert_eq!(t.constant(), Some(0.3));
        assert!(t.is_position_independent());
        assert_eq!(Binding::new(&t).render().unwrap(), "0.3");
        assert_eq!(match_emission().constant(), None);
        assert!(!match_emission().is_position_independent());
        let g = Template::new("g", "par.delta").global("par");
        assert!(g.is_position_independent());
    }
}
