//!
//! Document: a fragment chain with named scopes
//!
//! ```text
//! open("f")            ... [head f] [body f] [tail f] <cursor restored here>
//! add_init("f", x)     x lands before [head f]
//! add(y)               y lands before [body f] while "f" is innermost
//! add_exit("f", z)     z lands before [tail f]
//! ```
//!
//! Handles of a scope stay usable until its `close`; a label can be opened
//! again afterwards and then yields fresh handles.
//!
use super::fragment::{Chain, TextId};
use super::preprocess::{indent, select};
use crate::error::{fail, ErrorKind, Result};
use fnv::FnvHashMap;
use log::warn;

#[derive(Debug, Clone)]
enum Handles {
    Nested {
        head: TextId,
        body: TextId,
        tail: TextId,
    },
    Linear(Vec<TextId>),
}

#[derive(Debug, Clone)]
struct Scope {
    handles: Handles,
    /// cursor before the scope was opened
    saved: TextId,
    open: bool,
}

#[derive(Debug, Clone)]
pub struct Document {
    chain: Chain,
    cursor: TextId,
    scopes: FnvHashMap<String, Scope>,
    stack: Vec<String>,
}

impl Default for Document {
    fn default() -> Self {
        let chain = Chain::new();
        let cursor = chain.terminal();
        Document {
            chain,
            cursor,
            scopes: FnvHashMap::default(),
            stack: Vec::new(),
        }
    }
}

fn line<S: Into<String>>(text: S) -> String {
    let mut text = text.into();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }
    ///
    /// Number of open scopes
    ///
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
    pub fn is_open(&self, label: &str) -> bool {
        self.scopes.get(label).map_or(false, |s| s.open)
    }
    ///
    /// Write a line at the cursor.
    ///
    pub fn add<S: Into<String>>(&mut self, text: S) -> TextId {
        self.chain.insert_before(self.cursor, line(text))
    }
    ///
    /// Write several lines at the cursor.
    ///
    pub fn add_lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for l in lines {
            self.add(l);
        }
    }
    ///
    /// Overwrite a fragment written earlier.
    ///
    pub fn replace<S: Into<String>>(&mut self, id: TextId, text: S) {
        self.chain.set_content(id, line(text));
    }
    pub fn content(&self, id: TextId) -> &str {
        self.chain.content(id)
    }

    fn scope(&self, label: &str) -> Result<&Scope> {
        match self.scopes.get(label) {
            Some(s) if s.open => Ok(s),
            _ => fail(ErrorKind::ScopeNotOpen {
                label: label.to_string(),
            }),
        }
    }
    fn nested(&self, label: &str) -> Result<(TextId, TextId, TextId)> {
        match self.scope(label)?.handles {
            Handles::Nested { head, body, tail } => Ok((head, body, tail)),
            Handles::Linear(_) => fail(ErrorKind::LinearScope {
                label: label.to_string(),
            }),
        }
    }
    fn register(&mut self, label: &str, handles: Handles) {
        self.scopes.insert(
            label.to_string(),
            Scope {
                handles,
                saved: self.cursor,
                open: true,
            },
        );
        self.stack.push(label.to_string());
    }
    fn open_before(&mut self, label: &str, at: TextId) -> Result<()> {
        if self.is_open(label) {
            return fail(ErrorKind::ScopeAlreadyOpen {
                label: label.to_string(),
            });
        }
        let head = self.chain.insert_before(at, "");
        let body = self.chain.insert_before(at, "");
        let tail = self.chain.insert_before(at, "");
        self.register(label, Handles::Nested { head, body, tail });
        self.cursor = body;
        Ok(())
    }
    fn open_linear_before(&mut self, label: &str, at: TextId, n: usize) -> Result<()> {
        if self.is_open(label) {
            return fail(ErrorKind::ScopeAlreadyOpen {
                label: label.to_string(),
            });
        }
        let slots = (0..n).map(|_| self.chain.insert_before(at, "")).collect();
        self.register(label, Handles::Linear(slots));
        Ok(())
    }

    ///
    /// Open a scope at the cursor; the cursor moves into its body.
    ///
    pub fn open(&mut self, label: &str) -> Result<()> {
        self.open_before(label, self.cursor)
    }
    ///
    /// Open a scope in the init section of the open scope `outer`, i.e.
    /// before everything written to `outer`'s body so far.
    ///
    pub fn open_at_init(&mut self, label: &str, outer: &str) -> Result<()> {
        let (head, _, _) = self.nested(outer)?;
        self.open_before(label, head)
    }
    ///
    /// Open `n` parallel slots at the cursor. The cursor does not move.
    ///
    pub fn open_linear(&mut self, label: &str, n: usize) -> Result<()> {
        self.open_linear_before(label, self.cursor, n)
    }
    pub fn open_linear_at_init(&mut self, label: &str, outer: &str, n: usize) -> Result<()> {
        let (head, _, _) = self.nested(outer)?;
        self.open_linear_before(label, head, n)
    }

    fn pop(&mut self, label: &str, linear: bool) -> Result<()> {
        let top = match self.stack.last() {
            Some(top) => top.clone(),
            None => {
                return fail(ErrorKind::ScopeStackUnderflow {
                    label: label.to_string(),
                })
            }
        };
        if top != label {
            return fail(ErrorKind::ScopeMismatch {
                expected: top,
                found: label.to_string(),
            });
        }
        let scope = self.scope(label)?;
        match (&scope.handles, linear) {
            (Handles::Linear(_), false) => {
                return fail(ErrorKind::LinearScope {
                    label: label.to_string(),
                })
            }
            (Handles::Nested { .. }, true) => {
                return fail(ErrorKind::NotALinearScope {
                    label: label.to_string(),
                })
            }
            _ => {}
        }
        let saved = scope.saved;
        self.stack.pop();
        if let Some(s) = self.scopes.get_mut(label) {
            s.open = false;
        }
        self.cursor = saved;
        Ok(())
    }
    ///
    /// Close the innermost scope, which must be `label`.
    ///
    pub fn close(&mut self, label: &str) -> Result<()> {
        self.pop(label, false)
    }
    pub fn close_linear(&mut self, label: &str) -> Result<()> {
        self.pop(label, true)
    }

    ///
    /// Append to the init section of an open scope.
    ///
    pub fn add_init<S: Into<String>>(&mut self, label: &str, text: S) -> Result<TextId> {
        let (head, _, _) = self.nested(label)?;
        Ok(self.chain.insert_before(head, line(text)))
    }
    ///
    /// Append to the exit section of an open scope.
    ///
    pub fn add_exit<S: Into<String>>(&mut self, label: &str, text: S) -> Result<TextId> {
        let (_, _, tail) = self.nested(label)?;
        Ok(self.chain.insert_before(tail, line(text)))
    }
    ///
    /// Append to the body of an open scope, wherever the cursor is.
    ///
    pub fn add_body<S: Into<String>>(&mut self, label: &str, text: S) -> Result<TextId> {
        let (_, body, _) = self.nested(label)?;
        Ok(self.chain.insert_before(body, line(text)))
    }
    pub fn add_to_linear<S: Into<String>>(
        &mut self,
        label: &str,
        index: usize,
        text: S,
    ) -> Result<TextId> {
        let slot = match &self.scope(label)?.handles {
            Handles::Linear(slots) => match slots.get(index) {
                Some(&slot) => slot,
                None => {
                    return fail(ErrorKind::LinearIndexOutOfRange {
                        label: label.to_string(),
                        index,
                        width: slots.len(),
                    })
                }
            },
            Handles::Nested { .. } => {
                return fail(ErrorKind::NotALinearScope {
                    label: label.to_string(),
                })
            }
        };
        Ok(self.chain.insert_before(slot, line(text)))
    }
    ///
    /// Head handle of the current instance of an open scope
    ///
    pub fn head(&self, label: &str) -> Result<TextId> {
        let (head, _, _) = self.nested(label)?;
        Ok(head)
    }

    ///
    /// Render the whole document as seen with `tag` defined.
    ///
    pub fn render(&self, tag: &str) -> Result<String> {
        if let Some(label) = self.stack.last() {
            warn!("rendering while scope `{}` is still open", label);
        }
        let selected = select(&self.chain.flatten(), tag);
        let (text, depth) = indent(&selected)?;
        if depth != 0 {
            warn!(
                "generated code for `{}` has {} unclosed brace(s)",
                if tag.is_empty() { "all" } else { tag },
                depth
            );
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_body_tail_order() {
        let mut d = Document::new();
        d.add("void f() {");
        d.open("function").unwrap();
        d.add("body1();");
        d.add_init("function", "int a;").unwrap();
        d.add_exit("function", "return;").unwrap();
        d.add("body2();");
        d.add_init("function", "int b;").unwrap();
        d.close("function").unwrap();
        d.add("}");
        assert_eq!(
            d.render("").unwrap(),
            "void f() {\n    int a;\n    int b;\n    body1();\n    body2();\n    return;\n}\n"
        );
    }

    #[test]
    fn open_at_init_precedes_earlier_code() {
        let mut d = Document::new();
        d.open("outer").unwrap();
        d.add("use(x);");
        d.open_at_init("decl", "outer").unwrap();
        d.add("int x;");
        d.close("decl").unwrap();
        d.add("use(x);");
        d.close("outer").unwrap();
        assert_eq!(d.render("").unwrap(), "int x;\nuse(x);\nuse(x);\n");
    }

    #[test]
    fn linear_slots() {
        let mut d = Document::new();
        d.add("switch (s) {");
        d.open_linear("cases", 2).unwrap();
        d.add("}");
        d.add_to_linear("cases", 1, "case 1: b(); break;").unwrap();
        d.add_to_linear("cases", 0, "case 0: a(); break;").unwrap();
        d.add_to_linear("cases", 1, "// again").unwrap();
        let e = d.add_to_linear("cases", 2, "x").unwrap_err();
        assert_eq!(
            e.kind(),
            &ErrorKind::LinearIndexOutOfRange {
                label: "cases".to_string(),
                index: 2,
                width: 2
            }
        );
        assert!(matches!(
            d.close("cases").unwrap_err().kind(),
            ErrorKind::LinearScope { .. }
        ));
        d.close_linear("cases").unwrap();
        assert_eq!(
            d.render("").unwrap(),
            "switch (s) {\n    case 0: a(); break;\n    case 1: b(); break;\n    // again\n}\n"
        );
    }

    #[test]
    fn scope_errors() {
        let mut d = Document::new();
        d.open("a").unwrap();
        assert_eq!(
            d.open("a").unwrap_err().kind(),
            &ErrorKind::ScopeAlreadyOpen {
                label: "a".to_string()
            }
        );
        d.open("b").unwrap();
        assert_eq!(
            d.close("a").unwrap_err().kind(),
            &ErrorKind::ScopeMismatch {
                expected: "b".to_string(),
                found: "a".to_string()
            }
        );
        d.close("b").unwrap();
        assert!(matches!(
            d.add_init("b", "x").unwrap_err().kind(),
            ErrorKind::ScopeNotOpen { .. }
        ));
        assert!(matches!(
            d.close_linear("a").unwrap_err().kind(),
            ErrorKind::NotALinearScope { .. }
        ));
        d.close("a").unwrap();
        assert!(matches!(
            d.close("a").unwrap_err().kind(),
            ErrorKind::ScopeStackUnderflow { .. }
        ));
        assert!(matches!(
            d.open_at_init("c", "a").unwrap_err().kind(),
            ErrorKind::ScopeNotOpen { .. }
        ));
        assert_eq!(d.depth(), 0);
    }

    #[test]
    fn reopened_scope_has_fresh_head() {
        let mut d = Document::new();
        d.open("s").unwrap();
        let h1 = d.head("s").unwrap();
        d.close("s").unwrap();
        d.open("s").unwrap();
        let h2 = d.head("s").unwrap();
        assert_ne!(h1, h2);
        let id = d.add("x = 1;");
        d.replace(id, "x = 2;");
        d.close("s").unwrap();
        assert_eq!(d.render("").unwrap(), "x = 2;\n");
    }
}
