//!
//! Mock models for testing
//!
use super::builder::HmmBuilder;
use super::description::HmmDescription;
use super::tape::Alphabet;
use super::Hmm;
use crate::template::Template;

fn c(name: &str, value: f64) -> Template {
    Template::constant(name, value)
}

///
/// Occasionally dishonest casino (one tape, two Moore states in one clique)
///
pub const CASINO_JSON: &str = r#"{
  "name": "casino",
  "tapes": [{ "name": "x", "alphabet": { "name": "die", "symbols": ["1","2","3","4","5","6"] } }],
  "cliques": [
    { "name": "begin", "states": [{ "name": "start" }] },
    { "name": "dice", "states": [{ "name": "F", "emission": "fair" }, { "name": "L", "emission": "loaded" }] },
    { "name": "finish", "states": [{ "name": "end" }] }
  ],
  "emissions": [
    { "name": "fair", "consumed": { "x": 1 }, "probability": { "text": "0.16666666666666666" } },
    { "name": "loaded", "consumed": { "x": 1 },
      "probability": { "text": "loaded[s]", "identifiers": [{ "kind": "symbol", "name": "s", "tape": "x" }] } }
  ],
  "transitions": [
    { "from": "start", "to": "F", "probability": { "text": "0.5" } },
    { "from": "start", "to": "L", "probability": { "text": "0.5" } },
    { "from": "F", "to": "F", "probability": { "text": "0.9" } },
    { "from": "F", "to": "L", "probability": { "text": "0.05" } },
    { "from": "L", "to": "L", "probability": { "text": "0.85" } },
    { "from": "L", "to": "F", "probability": { "text": "0.1" } },
    { "from": "F", "to": "end", "probability": { "text": "0.05" } },
    { "from": "L", "to": "end", "probability": { "text": "0.05" } }
  ]
}"#;

///
/// loaded die: 6 comes up half of the time
///
pub const LOADED: [f64; 6] = [0.1, 0.1, 0.1, 0.1, 0.1, 0.5];

pub fn mock_casino() -> Hmm {
    match HmmDescription::from_json(CASINO_JSON).and_then(|d| d.to_hmm()) {
        Ok(hmm) => hmm,
        Err(e) => panic!("casino mock is invalid: {}", e),
    }
}

///
/// Silent self loop
///
/// ```text
///          0.5      0.7
///   start ----> A -------> end
///     |        ^ \          ^
///     |        \_/ 0.3      |
///     +-------> B ----------+
///          0.5      1.0
/// ```
///
/// All transitions are silent; A and B share the clique `loop`.
///
pub fn mock_silent_loop() -> Hmm {
    let mut b = HmmBuilder::new("silentloop", vec![("x", Alphabet::from_chars("ab", "ab"), 0)]);
    b.clique("begin")
        .clique("loop")
        .clique("finish")
        .state("begin", "start", None, &[])
        .state("loop", "A", None, &[])
        .state("loop", "B", None, &[])
        .state("finish", "end", None, &[])
        .transition("start", "A", c("p", 0.5), None)
        .transition("start", "B", c("p", 0.5), None)
        .transition("A", "A", c("p", 0.3), None)
        .transition("A", "end", c("p", 0.7), None)
        .transition("B", "end", c("p", 1.0), None);
    match b.build() {
        Ok(hmm) => hmm,
        Err(e) => panic!("{}", e),
    }
}

///
/// One emitting state `M` and a two-state silent cycle `D1 <-> D2` in a
/// single clique.
///
/// ```text
/// start -> M;  M -> M, D1, end;  D1 -> D2, M, end;  D2 -> D1, M, end
/// ```
///
pub fn mock_silent_cycle() -> Hmm {
    let mut b = HmmBuilder::new("silentcycle", vec![("x", Alphabet::from_chars("ab", "ab"), 0)]);
    b.clique("begin")
        .clique("main")
        .clique("finish")
        .emission(
            "emitM",
            Template::new("emitM", "pM[s]").symbol("s", super::TapeId(0), 0),
            &[1],
        )
        .state("begin", "start", None, &[])
        .state("main", "M", None, &[])
        .state("main", "D1", None, &[])
        .state("main", "D2", None, &[])
        .state("finish", "end", None, &[])
        .transition("start", "M", c("p", 1.0), Some("emitM"))
        .transition("M", "M", c("p", 0.5), Some("emitM"))
        .transition("M", "D1", c("p", 0.3), None)
        .transition("M", "end", c("p", 0.2), None)
        .transition("D1", "D2", c("p", 0.5), None)
        .transition("D1", "M", c("p", 0.3), Some("emitM"))
        .transition("D1", "end", c("p", 0.2), None)
        .transition("D2", "D1", c("p", 0.4), None)
        .transition("D2", "M", c("p", 0.4), Some("emitM"))
        .transition("D2", "end", c("p", 0.2), None);
    match b.build() {
        Ok(hmm) => hmm,
        Err(e) => panic!("{}", e),
    }
}

///
/// Pair HMM aligning tape `x` (fast) against tape `y` (slow)
///
/// match state `M` consumes one symbol of each tape; `X` and `Y` insert.
///
pub fn mock_pair() -> Hmm {
    let dna = Alphabet::from_chars("dna", "ACGT");
    let mut b = HmmBuilder::new("pair", vec![("y", dna.clone(), 1), ("x", dna, 0)]);
    let (x, y) = (super::TapeId(0), super::TapeId(1));
    b.clique("begin")
        .clique("align")
        .clique("finish")
        .emission(
            "emitM",
            Template::new("emitM", "pMatch[a][b]")
                .symbol("a", x, 0)
                .symbol("b", y, 0),
            &[1, 1],
        )
        .emission("emitX", c("emitX", 0.25), &[1, 0])
        .emission("emitY", c("emitY", 0.25), &[0, 1])
        .state("begin", "start", None, &[])
        .state("align", "M", Some("emitM"), &[])
        .state("align", "X", Some("emitX"), &[])
        .state("align", "Y", Some("emitY"), &[])
        .state("finish", "end", None, &[]);
    for (from, probs) in [
        ("start", [0.8, 0.1, 0.1, 0.0]),
        ("M", [0.8, 0.05, 0.05, 0.1]),
        ("X", [0.5, 0.4, 0.0, 0.1]),
        ("Y", [0.5, 0.0, 0.4, 0.1]),
    ]
    .iter()
    {
        for (to, p) in ["M", "X", "Y", "end"].iter().zip(probs.iter()) {
            if *p > 0.0 {
                b.transition(from, to, c("p", *p), None);
            }
        }
    }
    match b.build() {
        Ok(hmm) => hmm,
        Err(e) => panic!("{}", e),
    }
}

///
/// First order Markov chain over tape `x`: the emission of `S` reads the
/// previous symbol.
///
pub fn mock_markov() -> Hmm {
    let mut b = HmmBuilder::new("markov", vec![("x", Alphabet::from_chars("ab", "ab"), 0)]);
    let x = super::TapeId(0);
    b.clique("begin")
        .clique("first")
        .clique("chain")
        .clique("finish")
        .emission("emitFirst", c("emitFirst", 0.5), &[1])
        .emission(
            "emitNext",
            Template::new("emitNext", "markov[prev][cur]")
                .symbol("prev", x, 1)
                .symbol("cur", x, 0),
            &[1],
        )
        .state("begin", "start", None, &[])
        .state("first", "F", Some("emitFirst"), &[1])
        .state("chain", "S", Some("emitNext"), &[1])
        .state("finish", "end", None, &[])
        .transition("start", "F", c("p", 1.0), None)
        .transition("F", "S", c("p", 0.9), None)
        .transition("F", "end", c("p", 0.1), None)
        .transition("S", "S", c("p", 0.9), None)
        .transition("S", "end", c("p", 0.1), None);
    match b.build() {
        Ok(hmm) => hmm,
        Err(e) => panic!("{}", e),
    }
}

///
/// Linear chain emitting exactly `n` symbols (fixed length)
///
pub fn mock_fixed_length(n: usize) -> Hmm {
    let mut b = HmmBuilder::new("fixed", vec![("x", Alphabet::from_chars("ab", "ab"), 0)]);
    let x = super::TapeId(0);
    b.clique("begin")
        .clique("finish")
        .state("begin", "start", None, &[])
        .state("finish", "end", None, &[])
        .emission(
            "emit",
            Template::new("emit", "pEmit[s]").symbol("s", x, 0),
            &[1],
        );
    let mut prev = "start".to_string();
    for i in 0..n {
        let clique = format!("c{}", i);
        let name = format!("S{}", i);
        b.clique(&clique).state(&clique, &name, Some("emit"), &[]);
        b.transition(&prev, &name, c("p", 1.0), None);
        prev = name;
    }
    b.transition(&prev, "end", c("p", 1.0), None);
    match b.build() {
        Ok(hmm) => hmm,
        Err(e) => panic!("{}", e),
    }
}

///
/// `mock_pair` whose alignment clique is restricted by a banding
///
pub fn mock_banded_pair() -> Hmm {
    let dna = Alphabet::from_chars("dna", "ACGT");
    let mut b = HmmBuilder::new("bandedpair", vec![("x", dna.clone(), 0), ("y", dna, 1)]);
    b.banding("diag", "band", &["band.x()", "band.y()"])
        .clique("begin")
        .clique_with("align", Some("diag"), None, None)
        .clique("finish")
        .emission("emitM", c("emitM", 0.0625), &[1, 1])
        .state("begin", "start", None, &[])
        .state("align", "M", Some("emitM"), &[])
        .state("finish", "end", None, &[])
        .transition("start", "M", c("p", 1.0), None)
        .transition("M", "M", c("p", 0.9), None)
        .transition("M", "end", c("p", 0.1), None);
    match b.build() {
        Ok(hmm) => hmm,
        Err(e) => panic!("{}", e),
    }
}
