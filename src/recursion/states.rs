//!
//! DP tables: per-clique state vectors, the table aggregate handed between
//! functions, and their declaration inside one function
//!
use super::Generator;
use crate::error::Result;
use crate::model::CliqueId;
use log::debug;

impl<'a> Generator<'a> {
    ///
    /// Write the state vector struct of every clique and the `<hmm>_Tables`
    /// aggregate into the header.
    ///
    pub fn write_state_types(&mut self) -> Result<()> {
        let a = self.a;
        let zero = self.session.numeric().zero();
        for clique in a.hmm.cliques.iter() {
            let name = self.states_type(clique.id);
            let n = clique.n_states();
            self.header_lines(&[
                format!("struct {} {{", name),
                format!("_extreal_ s[{}];", n),
                format!(
                    "{}() {{ for (int i = 0; i < {}; ++i) s[i] = {}; }}",
                    name, n, zero
                ),
                "};".to_string(),
            ])?;
        }

        let tables = self.tables_type();
        let n_tapes = a.n_tapes();
        self.header_lines(&[format!("class {} {{", tables), "public:".to_string()])?;
        self.doc.open_linear_at_init("tables", "program", 3)?;
        self.doc.add_to_linear(
            "tables",
            1,
            format!("void init(const std::array<int,{}>& iLen) {{", n_tapes),
        )?;
        self.doc.add_to_linear(
            "tables",
            2,
            format!(
                "_extreal_ getProb(int iState, const std::array<int,{}>& iPos) const {{",
                n_tapes
            ),
        )?;
        self.doc.add_to_linear("tables", 2, "switch (iState) {")?;
        for clique in a.hmm.cliques.iter() {
            let member = &clique.name;
            let table = self.table_type(clique.id, false);
            self.doc
                .add_to_linear("tables", 0, format!("{} {};", table, member))?;
            self.doc
                .add_to_linear("tables", 1, format!("{}.init(iLen);", member))?;
            for &s in clique.states.iter() {
                let state = a.hmm.state(s);
                self.doc.add_to_linear(
                    "tables",
                    2,
                    format!(
                        "case {}: return {}.read(iPos).s[{}];",
                        s.0, member, state.index_in_clique
                    ),
                )?;
            }
        }
        self.doc.add_to_linear("tables", 1, "}")?;
        self.doc.add_to_linear("tables", 2, "}")?;
        self.doc
            .add_to_linear("tables", 2, format!("return {};", zero))?;
        self.doc.add_to_linear("tables", 2, "}")?;
        self.doc.close_linear("tables")?;
        self.header_lines(&["};".to_string()])?;
        debug!("state types written for {} cliques", a.hmm.cliques.len());
        Ok(())
    }

    pub fn header_lines(&mut self, lines: &[String]) -> Result<()> {
        for l in lines {
            self.doc.add_init("program", l.as_str())?;
        }
        Ok(())
    }

    ///
    /// Make `tab_<clique>` available in the current function: a member of
    /// the `tables` argument when the table is retained, otherwise a local
    /// (possibly folded) table.
    ///
    pub fn declare_tables(&mut self, retain: bool, forward: bool) -> Result<()> {
        let a = self.a;
        let lengths = self.lengths();
        if retain {
            self.doc
                .add_init("function", format!("tables.init({});", lengths))?;
        }
        for clique in a.hmm.cliques.iter() {
            let var = self.table_var(clique.id);
            let line = if retain {
                format!(
                    "{}& {} = tables.{};",
                    self.table_type(clique.id, false),
                    var,
                    clique.name
                )
            } else if a.is_folded(clique.id, false, forward) {
                format!(
                    "{} {}({}, {});",
                    self.table_type(clique.id, true),
                    var,
                    lengths,
                    a.fold_generations
                )
            } else {
                format!(
                    "{} {}({});",
                    self.table_type(clique.id, false),
                    var,
                    lengths
                )
            };
            self.doc.add_init("function", line)?;
        }
        Ok(())
    }

    ///
    /// `tab_<clique>.read({...}).s[i]` for state `s` of clique `c`
    ///
    pub fn state_cell(&self, c: CliqueId, positions: &str, index: usize) -> String {
        format!("{}.read({}).s[{}]", self.table_var(c), positions, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::model::mocks::*;
    use crate::session::Session;

    #[test]
    fn aggregate_covers_every_state() {
        let a = analyze(mock_casino()).unwrap();
        let mut session = Session::default();
        let mut g = Generator::new(&a, &mut session);
        g.doc.open("program").unwrap();
        g.write_state_types().unwrap();
        g.doc.close("program").unwrap();
        let text = g.doc.render("").unwrap();
        assert!(text.contains("struct casino_dice_States {"));
        assert!(text.contains("    _extreal_ s[2];"));
        assert!(text.contains("DPTable<casino_dice_States,1> dice;"));
        assert!(text.contains("dice.init(iLen);"));
        assert!(text.contains("case 2: return dice.read(iPos).s[1];"));
        // members, then init, then the accessor
        assert!(text.find("finish;").unwrap() < text.find("void init").unwrap());
        assert!(text.find("finish.init").unwrap() < text.find("getProb").unwrap());
        assert!(text.trim_end().ends_with("};"));
    }

    #[test]
    fn folded_local_tables() {
        let a = analyze(mock_casino()).unwrap();
        let mut session = Session::default();
        let mut g = Generator::new(&a, &mut session);
        g.doc.open("function").unwrap();
        g.declare_tables(false, true).unwrap();
        g.doc.close("function").unwrap();
        let text = g.doc.render("").unwrap();
        assert!(text.contains("FoldedDPTable<casino_dice_States,1> tab_dice({iLen0}, 2);"));
        assert!(text.contains("DPTable<casino_begin_States,1> tab_begin({iLen0});"));
    }
}
