//!
//! end-to-end tests of model analysis, code generation and the reference
//! evaluator
//!
#[macro_use]
extern crate approx;

use hmmc::cli::run_compile;
use hmmc::model::mocks::*;
use hmmc::prelude::*;
use hmmc::reference::{Evaluator, Weights};
use itertools::Itertools;
use std::path::Path;
use std::process::Command;
use test_case::test_case;

fn weights() -> Weights {
    Weights::new()
        .emission_fn("loaded", |h| LOADED[h[0][0]])
        .emission_fn("emitM", |h| {
            if h.len() == 2 {
                if h[0][0] == h[1][0] {
                    0.22
                } else {
                    0.0266
                }
            } else {
                [0.3, 0.7][h[0][0]]
            }
        })
        .emission_fn("emitNext", |h| [[0.8, 0.2], [0.4, 0.6]][h[0][0]][h[0][1]])
        .emission_fn("emit", |h| [0.3, 0.7][h[0][0]])
}

fn all_kinds() -> Vec<Request> {
    vec![
        Request::new(RecursionKind::Forward, "forward").retained(),
        Request::new(RecursionKind::Backward, "backward"),
        Request::new(RecursionKind::Viterbi, "viterbi"),
        Request::new(RecursionKind::Sample, "sample"),
        Request::new(RecursionKind::BaumWelch, "baumwelch"),
    ]
}

#[test_case(mock_casino(), vec![vec![0, 5, 5, 2, 5]] ; "casino")]
#[test_case(mock_silent_loop(), vec![vec![]] ; "silent loop")]
#[test_case(mock_silent_cycle(), vec![vec![0, 1, 1, 0, 1]] ; "silent cycle")]
#[test_case(mock_pair(), vec![vec![0, 1, 2, 3], vec![0, 2, 3]] ; "pair")]
#[test_case(mock_markov(), vec![vec![0, 0, 1, 1, 0]] ; "markov")]
#[test_case(mock_fixed_length(3), vec![vec![1, 0, 1]] ; "fixed length")]
fn forward_equals_backward(hmm: Hmm, seqs: Vec<Vec<usize>>) {
    let a = analyze(hmm).unwrap();
    let w = weights();
    let e = Evaluator::new(&a, &w, &seqs).unwrap();
    let f = e.forward_probability().unwrap();
    let b = e.backward_probability().unwrap();
    assert!(f > 0.0);
    assert_relative_eq!(f, b, max_relative = 1e-10);
    let (best, path) = e.viterbi().unwrap();
    assert!(best > 0.0);
    assert!(best <= f * (1.0 + 1e-10));
    assert_eq!(path.first(), Some(&a.start));
    assert_eq!(path.last(), Some(&a.end));
    for (&from, &to) in path.iter().tuple_windows() {
        assert!(a.hmm.transitions_from(from).any(|t| t.to == to));
    }
}

#[test_case(mock_casino() ; "casino")]
#[test_case(mock_silent_loop() ; "silent loop")]
#[test_case(mock_silent_cycle() ; "silent cycle")]
#[test_case(mock_pair() ; "pair")]
#[test_case(mock_markov() ; "markov")]
#[test_case(mock_fixed_length(3) ; "fixed length")]
fn every_kind_is_generated(hmm: Hmm) {
    let name = hmm.name.clone();
    let a = analyze(hmm).unwrap();
    let mut session = Session::default();
    let out = generate(&a, &all_kinds(), &mut session, "model.h").unwrap();
    assert!(out.header.contains(&format!("#ifndef _{}_h_", name)));
    assert!(out.body.contains("#include \"model.h\""));
    for f in ["forward(", "backward(", "viterbi_recurse(", "viterbi_trace(", "sample(", "baumwelch("].iter() {
        assert!(out.header.contains(f), "{} missing from header", f);
        assert!(out.body.contains(f), "{} missing from body", f);
    }
}

#[test]
fn fixed_length_accepts_only_its_length() {
    let a = analyze(mock_fixed_length(3)).unwrap();
    assert_eq!(a.fixed_lengths, vec![Some(3)]);
    let w = weights();
    let seqs = vec![vec![1, 0, 1]];
    let e = Evaluator::new(&a, &w, &seqs).unwrap();
    assert_abs_diff_eq!(e.forward_probability().unwrap(), 0.7 * 0.3 * 0.7, epsilon = 1e-15);
    for seqs in [vec![vec![1, 0]], vec![vec![1, 0, 1, 1]]].iter() {
        let e = Evaluator::new(&a, &w, seqs).unwrap();
        assert_abs_diff_eq!(e.forward_probability().unwrap(), 0.0);
        assert_abs_diff_eq!(e.backward_probability().unwrap(), 0.0);
    }
}

#[test]
fn compile_job_to_files() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("casino.json");
    let mut job: serde_json::Value = serde_json::from_str(CASINO_JSON).unwrap();
    job["recursions"] = serde_json::json!([
        { "kind": "forward", "name": "forward", "retain_table": true },
        { "kind": "sample", "name": "sample" }
    ]);
    std::fs::write(&model, job.to_string()).unwrap();

    // header and body
    let header = dir.path().join("casino.h");
    let body = dir.path().join("casino.cc");
    run_compile(&model, &body, Some(&header), Some(Numeric::LogSpace)).unwrap();
    let h = std::fs::read_to_string(&header).unwrap();
    let b = std::fs::read_to_string(&body).unwrap();
    assert!(h.contains("#ifndef _casino_h_"));
    assert!(h.contains("std::mt19937& rng);"));
    assert!(b.contains("#include \"casino.h\""));
    assert!(!b.contains("struct casino_dice_States {"));

    // single file
    let single = dir.path().join("single.cc");
    run_compile(&model, &single, None, None).unwrap();
    let s = std::fs::read_to_string(&single).unwrap();
    assert!(s.contains("typedef double _extreal_;"));
    assert!(s.contains("struct casino_dice_States {"));
    assert!(!s.contains("#include \"single.cc\""));
}

///
/// Arrays read by the probability templates of the mocks, with the same
/// values `weights()` gives.
///
const CPP_PARAMETERS: &str = "
const double loaded[6] = { 0.1, 0.1, 0.1, 0.1, 0.1, 0.5 };
const double pM[2] = { 0.3, 0.7 };
const double pEmit[2] = { 0.3, 0.7 };
const double markov[2][2] = { { 0.8, 0.2 }, { 0.4, 0.6 } };
const double pMatch[4][4] = {
    { 0.22, 0.0266, 0.0266, 0.0266 },
    { 0.0266, 0.22, 0.0266, 0.0266 },
    { 0.0266, 0.0266, 0.22, 0.0266 },
    { 0.0266, 0.0266, 0.0266, 0.22 },
};
";

fn cpp_compiler() -> Option<&'static str> {
    ["c++", "g++", "clang++"].iter().copied().find(|cc| {
        Command::new(cc)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    })
}

///
/// Program calling the generated `forward` (retained) and `backward`, then
/// printing both totals followed by the forward value of every state except
/// start at the origin.
///
fn cpp_driver(a: &AnalyzedHmm, seqs: &[Vec<usize>]) -> String {
    let mut lines = vec![
        "#include <cstdio>".to_string(),
        "#include <vector>".to_string(),
        CPP_PARAMETERS.to_string(),
        "#include \"model.cc\"".to_string(),
        "int main() {".to_string(),
    ];
    let mut args = Vec::new();
    for t in a.hmm.tapes.iter() {
        lines.push(format!(
            "std::vector<int> {} = {{ {} }};",
            t.sequence_id(),
            seqs[t.id.0].iter().join(", ")
        ));
        args.push(t.sequence_id());
    }
    lines.push(format!("{}_Tables tables;", a.hmm.name));
    lines.push(format!("double f = forward({}, tables);", args.join(", ")));
    lines.push(format!("double b = backward({});", args.join(", ")));
    lines.push("printf(\"%.17g %.17g\", f, b);".to_string());
    let origin = vec!["0"; a.n_tapes()].join(", ");
    for s in a.hmm.state_ids().filter(|&s| s != a.start) {
        lines.push(format!(
            "printf(\" %.17g\", (double)tables.getProb({}, {{ {} }}));",
            s.0, origin
        ));
    }
    lines.push("printf(\"\\n\");".to_string());
    lines.push("return 0;".to_string());
    lines.push("}".to_string());
    lines.join("\n")
}

///
/// Compile and run the generated recursions of `hmm` on `seqs`. `None` when
/// no C++ compiler is installed.
///
fn run_generated(a: &AnalyzedHmm, seqs: &[Vec<usize>], dir: &Path) -> Option<Vec<f64>> {
    let cc = match cpp_compiler() {
        Some(cc) => cc,
        None => {
            eprintln!("no C++ compiler found; generated code is not run");
            return None;
        }
    };
    let requests = vec![
        Request::new(RecursionKind::Forward, "forward").retained(),
        Request::new(RecursionKind::Backward, "backward"),
    ];
    let mut session = Session::new(Numeric::Double);
    let out = generate(a, &requests, &mut session, "model.h").unwrap();
    std::fs::write(dir.join("model.cc"), &out.combined).unwrap();
    std::fs::write(dir.join("driver.cc"), cpp_driver(a, seqs)).unwrap();
    let exe = dir.join("driver");
    let built = Command::new(cc)
        .arg("-std=c++11")
        .arg("-o")
        .arg(&exe)
        .arg(dir.join("driver.cc"))
        .output()
        .unwrap();
    assert!(
        built.status.success(),
        "{}\n{}",
        String::from_utf8_lossy(&built.stderr),
        out.combined
    );
    let ran = Command::new(&exe).output().unwrap();
    assert!(ran.status.success());
    let values = String::from_utf8_lossy(&ran.stdout)
        .split_whitespace()
        .map(|v| v.parse::<f64>().unwrap())
        .collect();
    Some(values)
}

#[test_case(mock_casino(), vec![vec![0, 5, 5, 2, 5]] ; "casino")]
#[test_case(mock_silent_loop(), vec![vec![]] ; "silent loop")]
#[test_case(mock_silent_cycle(), vec![vec![0, 1, 1, 0, 1]] ; "silent cycle")]
#[test_case(mock_pair(), vec![vec![0, 1, 2, 3], vec![0, 2, 3]] ; "pair")]
#[test_case(mock_markov(), vec![vec![0, 0, 1, 1, 0]] ; "markov")]
#[test_case(mock_fixed_length(3), vec![vec![1, 0, 1]] ; "fixed length")]
fn generated_code_matches_reference(hmm: Hmm, seqs: Vec<Vec<usize>>) {
    let a = analyze(hmm).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let values = match run_generated(&a, &seqs, dir.path()) {
        Some(values) => values,
        None => return,
    };
    let w = weights();
    let e = Evaluator::new(&a, &w, &seqs).unwrap();
    let expected = e.forward_probability().unwrap();
    assert!(expected > 0.0);
    assert_eq!(values.len(), 2 + a.hmm.n_states() - 1);
    // forward total, backward total
    assert_relative_eq!(values[0], expected, max_relative = 1e-9);
    assert_relative_eq!(values[1], expected, max_relative = 1e-9);
    // forward table at the origin
    let table = e.forward().unwrap();
    let origin = vec![0; a.n_tapes()];
    for (s, &v) in a
        .hmm
        .state_ids()
        .filter(|&s| s != a.start)
        .zip(values[2..].iter())
    {
        assert_abs_diff_eq!(v, table.get(s, &origin), epsilon = 1e-12);
    }
}

#[test]
fn generated_silent_loop_value() {
    let a = analyze(mock_silent_loop()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let values = match run_generated(&a, &[vec![]], dir.path()) {
        Some(values) => values,
        None => return,
    };
    // states after start: A, B, end
    let state_a = a.hmm.state_by_name("A").unwrap();
    assert_eq!(state_a.0, 1);
    assert_abs_diff_eq!(values[2], 0.714286, epsilon = 1e-6);
    assert_abs_diff_eq!(values[0], 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(values[1], 1.0, epsilon = 1e-12);
}
