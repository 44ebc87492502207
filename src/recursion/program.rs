//!
//! One generation run: the layout of the emitted program
//!
//! The whole program is assembled into one document and rendered three
//! times. `_HEADER_` keeps the declarations, `_BODY_` the definitions
//! (including the header by name) and `_SINGLE_` both, without the include.
//!
//! ```text
//! #ifndef _BODY_
//! #IFNDEF _casino_h_            header guard, survives rendering
//! ...includes, typedef
//!     [program init]           DPTable, state types, counts, externs,
//!                              prototypes
//! #ENDIF
//! #endif
//! #ifndef _HEADER_
//! #ifndef _SINGLE_
//! #include "casino.h"
//! #endif
//!     [body init]              helpers, identifier tables
//!     functions
//! #endif
//! ```
//!
use super::kind::{RecursionKind, Request};
use super::snippets::snippet;
use super::Generator;
use crate::analysis::AnalyzedHmm;
use crate::error::{fail, ErrorKind, Result, Traced};
use crate::model::DEFAULT_TABLE_CLASS;
use crate::session::Session;
use fnv::FnvHashSet;
use log::{info, warn};

///
/// Rendered partitions of one run
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub header: String,
    pub body: String,
    /// header and body in one file
    pub combined: String,
}

///
/// Generate every requested recursion for `a`. `header_name` is the file
/// name the body includes.
///
pub fn generate(
    a: &AnalyzedHmm,
    requests: &[Request],
    session: &mut Session,
    header_name: &str,
) -> Result<Output> {
    session.reset();
    check_requests(requests).within_with(|| format!("hmm `{}`", a.hmm.name))?;
    for p in a.hmm.parameters.iter() {
        session.add_parameter(p);
    }
    let mut g = Generator::new(a, session);
    g.program(requests, header_name)
        .within_with(|| format!("hmm `{}`", a.hmm.name))?;
    let output = Output {
        header: g.doc.render("_HEADER_")?,
        body: g.doc.render("_BODY_")?,
        combined: g.doc.render("_SINGLE_")?,
    };
    info!(
        "hmm `{}`: {} recursion(s), header {} bytes, body {} bytes",
        a.hmm.name,
        requests.len(),
        output.header.len(),
        output.body.len()
    );
    Ok(output)
}

///
/// Function names are unique; sampling and Baum-Welch need a retained
/// forward table from the same run.
///
fn check_requests(requests: &[Request]) -> Result<()> {
    let mut names: FnvHashSet<&str> = FnvHashSet::default();
    for r in requests {
        if !names.insert(r.name.as_str()) {
            return fail(ErrorKind::DuplicateIdentifier {
                kind: "recursion",
                id: r.name.clone(),
            });
        }
    }
    let has_forward_table = requests
        .iter()
        .any(|r| r.kind == RecursionKind::Forward && r.retain_table());
    for r in requests {
        if r.kind.needs_forward_table() && !has_forward_table {
            return fail(ErrorKind::MissingInputTable {
                kind: r.kind.label(),
                name: r.name.clone(),
                needs: RecursionKind::Forward.label(),
            });
        }
    }
    Ok(())
}

fn c_string(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

impl<'a> Generator<'a> {
    fn program(&mut self, requests: &[Request], header_name: &str) -> Result<()> {
        let a = self.a;
        let name = self.hmm_name();
        let numeric = self.session.numeric();
        let guard = format!("_{}_h_", name);

        self.doc
            .add(format!("// dynamic programming recursions for hmm `{}`", name));
        self.doc.add("#ifndef _BODY_");
        self.doc.add(format!("#IFNDEF {}", guard));
        self.doc.add(format!("#DEFINE {}", guard));
        for include in ["vector", "array", "random", "algorithm", "cmath"].iter() {
            self.doc.add(format!("#include <{}>", include));
        }
        if let Some(include) = numeric.include() {
            self.doc.add(format!("#include \"{}\"", include));
        }
        self.doc
            .add(format!("typedef {} _extreal_;", numeric.real_type()));
        self.doc.open("program")?;

        if a.hmm.cliques.iter().any(|c| c.table_class == DEFAULT_TABLE_CLASS) {
            if let Some(s) = snippet("DPTable") {
                for line in s.definition_lines().filter(|l| !l.is_empty()) {
                    self.doc.add_init("program", line)?;
                }
            }
        }
        self.write_state_types()?;
        if requests.iter().any(|r| r.kind.params().counts) {
            self.write_counts_type()?;
        }

        self.doc.add("#ENDIF");
        self.doc.add("#endif");
        self.doc.add("#ifndef _HEADER_");
        self.doc.add("#ifndef _SINGLE_");
        self.doc.add(format!("#include \"{}\"", header_name));
        self.doc.add("#endif");
        self.doc.open("body")?;
        self.write_identifier_tables()?;

        for r in requests {
            match r.kind {
                RecursionKind::Viterbi => {
                    self.fill(r, &format!("{}_recurse", r.name))
                        .within_with(|| format!("recursion `{}`", r.name))?;
                    self.trace(r, &format!("{}_trace", r.name))
                        .within_with(|| format!("recursion `{}`", r.name))?;
                }
                RecursionKind::Sample => {
                    self.trace(r, &r.name)
                        .within_with(|| format!("recursion `{}`", r.name))?;
                }
                _ => {
                    self.fill(r, &r.name)
                        .within_with(|| format!("recursion `{}`", r.name))?;
                }
            }
        }
        self.write_helpers()?;

        self.doc.close("body")?;
        self.doc.add("#endif");
        self.doc.close("program")?;
        self.patch_signatures();
        Ok(())
    }

    ///
    /// Helpers requested while writing the functions: the prototype goes to
    /// the header, the definition to the top of the body.
    ///
    fn write_helpers(&mut self) -> Result<()> {
        for helper in self.session.take_pending() {
            let s = match snippet(&helper) {
                Some(s) => s,
                None => {
                    warn!("no definition for helper `{}`", helper);
                    continue;
                }
            };
            let label = match s.prototype {
                Some(prototype) => {
                    self.doc.add_init("program", prototype)?;
                    "body"
                }
                None => "program",
            };
            for line in s.definition_lines().filter(|l| !l.is_empty()) {
                self.doc.add_init(label, line)?;
            }
        }
        Ok(())
    }

    ///
    /// Names and structure of the model, for the caller to interpret state
    /// paths and count arrays
    ///
    fn write_identifier_tables(&mut self) -> Result<()> {
        let a = self.a;
        let name = self.hmm_name();
        let hmm = &a.hmm;
        let strings = |items: Vec<String>| -> Vec<String> { items.iter().map(|s| c_string(s)).collect() };
        let numbers = |items: Vec<usize>| -> Vec<String> { items.iter().map(|i| i.to_string()).collect() };
        let tables: Vec<(&str, &str, Vec<String>)> = vec![
            (
                "const char* const",
                "stateId",
                strings(hmm.states.iter().map(|s| s.name.clone()).collect()),
            ),
            (
                "const char* const",
                "transitionId",
                strings(hmm.transitions.iter().map(|t| t.name.clone()).collect()),
            ),
            (
                "const int",
                "transitionFrom",
                numbers(hmm.transitions.iter().map(|t| t.from.0).collect()),
            ),
            (
                "const int",
                "transitionTo",
                numbers(hmm.transitions.iter().map(|t| t.to.0).collect()),
            ),
            (
                "const char* const",
                "transitionProbability",
                strings(
                    hmm.transitions
                        .iter()
                        .map(|t| t.probability.name().to_string())
                        .collect(),
                ),
            ),
            (
                "const char* const",
                "transitionEmission",
                strings(
                    hmm.transitions
                        .iter()
                        .map(|t| hmm.emission(t.emission).name.clone())
                        .collect(),
                ),
            ),
            (
                "const char* const",
                "outputId",
                strings(hmm.tapes.iter().map(|t| t.name.clone()).collect()),
            ),
        ];
        for (ctype, table, values) in tables {
            self.doc.add_init(
                "program",
                format!("extern {} {}_{}[{}];", ctype, name, table, values.len()),
            )?;
            self.doc.add_init(
                "body",
                format!(
                    "{} {}_{}[{}] = {{ {} }};",
                    ctype,
                    name,
                    table,
                    values.len(),
                    values.join(", ")
                ),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::model::mocks::*;
    use crate::numeric::Numeric;

    fn casino_requests() -> Vec<Request> {
        vec![
            Request::new(RecursionKind::Forward, "forward").retained(),
            Request::new(RecursionKind::Backward, "backward"),
            Request::new(RecursionKind::Viterbi, "viterbi"),
        ]
    }

    #[test]
    fn partitions() {
        let a = analyze(mock_casino()).unwrap();
        let mut session = Session::default();
        let out = generate(&a, &casino_requests(), &mut session, "casino.h").unwrap();

        assert!(out.header.contains("#ifndef _casino_h_"));
        assert!(out.header.contains("#define _casino_h_"));
        assert!(out.header.contains("typedef double _extreal_;"));
        assert!(out.header.contains("struct casino_dice_States {"));
        assert!(out.header.contains("class casino_Tables {"));
        assert!(out.header.contains("_extreal_ forward(const std::vector<int>& seq_x, casino_Tables& tables);"));
        assert!(out.header.contains("_extreal_ viterbi_recurse(const std::vector<int>& seq_x, casino_Tables& tables);"));
        assert!(out.header.contains("std::vector<int> viterbi_trace(const casino_Tables& tables, const std::vector<int>& seq_x);"));
        assert!(out.header.contains("extern const char* const casino_stateId[4];"));
        assert!(!out.header.contains("#include \"casino.h\""));
        assert!(!out.header.contains("tab_dice"));

        assert!(out.body.contains("#include \"casino.h\""));
        assert!(out.body.contains("const char* const casino_stateId[4] = { \"start\", \"F\", \"L\", \"end\" };"));
        assert!(out.body.contains("const int casino_transitionFrom[8] = { 0, 0, 1, 1, 2, 2, 1, 2 };"));
        assert!(out.body.contains("_extreal_ backward(const std::vector<int>& seq_x)\n{"));
        assert!(!out.body.contains("struct casino_dice_States"));
        assert!(!out.body.contains("#ifndef _casino_h_"));

        assert!(!out.combined.contains("#include \"casino.h\""));
        assert!(out.combined.contains("struct casino_dice_States {"));
        assert!(out.combined.contains("_extreal_ backward(const std::vector<int>& seq_x)\n{"));
        for text in [&out.header, &out.body, &out.combined].iter() {
            assert!(!text.contains("_BODY_") && !text.contains("_SINGLE_"));
        }
    }

    #[test]
    fn parameters_reach_every_signature() {
        let mut hmm = mock_casino();
        hmm.parameters.push("const double* loaded".to_string());
        let a = analyze(hmm).unwrap();
        let mut session = Session::new(Numeric::BFloat);
        let out = generate(&a, &casino_requests(), &mut session, "casino.h").unwrap();
        assert!(out.header.contains("#include \"bfloat.h\""));
        assert!(out.header.contains("typedef bfloat _extreal_;"));
        assert!(out.header.contains("_extreal_ backward(const std::vector<int>& seq_x, const double* loaded);"));
        assert!(out.body.contains(
            "std::vector<int> viterbi_trace(const casino_Tables& tables, const std::vector<int>& seq_x, const double* loaded)"
        ));

        // nothing carries over into the next run
        let a = analyze(mock_casino()).unwrap();
        let out = generate(&a, &casino_requests(), &mut session, "casino.h").unwrap();
        assert!(!out.header.contains("loaded)"));
    }

    #[test]
    fn helpers_are_written_once() {
        let a = analyze(mock_silent_cycle()).unwrap();
        let mut session = Session::default();
        let requests = vec![
            Request::new(RecursionKind::Forward, "forward").retained(),
            Request::new(RecursionKind::Backward, "backward"),
        ];
        let out = generate(&a, &requests, &mut session, "silentcycle.h").unwrap();
        assert_eq!(
            out.header
                .matches("void hmmc_invert(const _extreal_* iMatrix, _extreal_* iInverse, int iDim);")
                .count(),
            1
        );
        assert_eq!(out.body.matches("void hmmc_invert(const _extreal_* iMatrix, _extreal_* iInverse, int iDim) {").count(), 1);
        assert!(out.body.find("void hmmc_invert").unwrap() < out.body.find("_extreal_ forward(").unwrap());
    }

    #[test]
    fn baum_welch_needs_a_forward_table() {
        let a = analyze(mock_casino()).unwrap();
        let mut session = Session::default();
        let e = generate(
            &a,
            &[Request::new(RecursionKind::BaumWelch, "bw")],
            &mut session,
            "casino.h",
        )
        .unwrap_err();
        assert_eq!(
            e.kind(),
            &ErrorKind::MissingInputTable {
                kind: "baumwelch",
                name: "bw".to_string(),
                needs: "forward",
            }
        );
        assert_eq!(e.trace(), vec!["hmm `casino`"]);

        let requests = vec![
            Request::new(RecursionKind::Forward, "forward").retained(),
            Request::new(RecursionKind::BaumWelch, "bw"),
            Request::new(RecursionKind::Sample, "sample"),
        ];
        let out = generate(&a, &requests, &mut session, "casino.h").unwrap();
        assert!(out.header.contains("struct casino_Counts {"));
        assert!(out.header.contains("std::mt19937& rng);"));
    }

    #[test]
    fn duplicate_function_names() {
        let a = analyze(mock_casino()).unwrap();
        let mut session = Session::default();
        let requests = vec![
            Request::new(RecursionKind::Forward, "f"),
            Request::new(RecursionKind::Backward, "f"),
        ];
        let e = generate(&a, &requests, &mut session, "casino.h").unwrap_err();
        assert_eq!(
            e.kind(),
            &ErrorKind::DuplicateIdentifier {
                kind: "recursion",
                id: "f".to_string(),
            }
        );
    }
}
