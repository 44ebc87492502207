//!
//! JSON model description
//!
//! ```json
//! {
//!   "name": "casino",
//!   "tapes": [{ "name": "x", "alphabet": { "name": "die", "symbols": ["1", "2"] } }],
//!   "cliques": [{ "name": "begin", "states": [{ "name": "start" }] }],
//!   "emissions": [{ "name": "fair", "consumed": { "x": 1 },
//!                   "probability": { "text": "fair[s]",
//!                                    "identifiers": [{ "kind": "symbol", "name": "s", "tape": "x" }] } }],
//!   "transitions": [{ "from": "start", "to": "F", "probability": { "text": "0.5" } }]
//! }
//! ```
//!
use super::builder::HmmBuilder;
use super::tape::Alphabet;
use super::Hmm;
use crate::error::{fail, ErrorKind, Result};
use crate::template::Template;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HmmDescription {
    pub name: String,
    pub tapes: Vec<TapeDescription>,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub bandings: Vec<BandingDescription>,
    pub cliques: Vec<CliqueDescription>,
    #[serde(default)]
    pub emissions: Vec<EmissionDescription>,
    pub transitions: Vec<TransitionDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapeDescription {
    pub name: String,
    pub alphabet: AlphabetDescription,
    #[serde(default)]
    pub speed: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphabetDescription {
    pub name: String,
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandingDescription {
    pub name: String,
    pub iterator: String,
    /// coordinate expression per tape name
    pub coordinates: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliqueDescription {
    pub name: String,
    pub states: Vec<StateDescription>,
    #[serde(default)]
    pub banding: Option<String>,
    #[serde(default)]
    pub linked_banding: Option<String>,
    #[serde(default)]
    pub table_class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDescription {
    pub name: String,
    #[serde(default)]
    pub emission: Option<String>,
    /// order per tape name; missing tapes have order 0
    #[serde(default)]
    pub order: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionDescription {
    pub name: String,
    pub probability: ExpressionDescription,
    /// symbols consumed per tape name; missing tapes consume nothing
    #[serde(default)]
    pub consumed: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDescription {
    #[serde(default)]
    pub name: Option<String>,
    pub from: String,
    pub to: String,
    pub probability: ExpressionDescription,
    #[serde(default)]
    pub emission: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionDescription {
    pub text: String,
    #[serde(default)]
    pub identifiers: Vec<IdentifierDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IdentifierDescription {
    Symbol {
        name: String,
        tape: String,
        #[serde(default)]
        depth: usize,
    },
    Position {
        name: String,
        tape: String,
    },
    Global {
        name: String,
    },
}

impl HmmDescription {
    pub fn from_json(json: &str) -> Result<HmmDescription> {
        Ok(serde_json::from_str(json)?)
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
    ///
    /// Resolve names and validate through `HmmBuilder`.
    ///
    pub fn to_hmm(&self) -> Result<Hmm> {
        let tapes = self
            .tapes
            .iter()
            .map(|t| {
                let symbols: Vec<&str> = t.alphabet.symbols.iter().map(|s| s.as_str()).collect();
                (
                    t.name.as_str(),
                    Alphabet::new(t.alphabet.name.clone(), &symbols),
                    t.speed,
                )
            })
            .collect();
        let mut b = HmmBuilder::new(self.name.clone(), tapes);

        for p in self.parameters.iter() {
            b.parameter(p);
        }
        for banding in self.bandings.iter() {
            let coordinates = self.per_tape_text(&b, &banding.name, &banding.coordinates)?;
            let coordinates: Vec<&str> = coordinates.iter().map(|s| s.as_str()).collect();
            b.banding(&banding.name, &banding.iterator, &coordinates);
        }
        for c in self.cliques.iter() {
            b.clique_with(
                &c.name,
                c.banding.as_deref(),
                c.linked_banding.as_deref(),
                c.table_class.as_deref(),
            );
            for s in c.states.iter() {
                let order = self.per_tape_count(&b, &s.name, &s.order)?;
                b.state(&c.name, &s.name, s.emission.as_deref(), &order);
            }
        }
        for e in self.emissions.iter() {
            let probability = expression(&b, &e.name, &e.probability)?;
            let consumed = self.per_tape_count(&b, &e.name, &e.consumed)?;
            b.emission(&e.name, probability, &consumed);
        }
        for t in self.transitions.iter() {
            let name = t
                .name
                .clone()
                .unwrap_or_else(|| format!("{}_{}", t.from, t.to));
            let probability = expression(&b, &name, &t.probability)?;
            b.transition_expr(
                &name,
                &t.from,
                &t.to,
                probability.into_expr(),
                t.emission.as_deref(),
            );
        }
        b.build()
    }

    fn per_tape_count(
        &self,
        b: &HmmBuilder,
        owner: &str,
        map: &BTreeMap<String, usize>,
    ) -> Result<Vec<usize>> {
        let mut v = vec![0; b.n_tapes()];
        for (tape, &n) in map.iter() {
            let id = b.tape_id(tape).map_err(|_| unknown_tape(owner, tape))?;
            v[id.0] = n;
        }
        Ok(v)
    }

    fn per_tape_text(
        &self,
        b: &HmmBuilder,
        owner: &str,
        map: &BTreeMap<String, String>,
    ) -> Result<Vec<String>> {
        let mut v = vec![String::new(); b.n_tapes()];
        for (tape, text) in map.iter() {
            let id = b.tape_id(tape).map_err(|_| unknown_tape(owner, tape))?;
            v[id.0] = text.clone();
        }
        if let Some(i) = v.iter().position(|s| s.is_empty()) {
            return fail(ErrorKind::InvalidDescription(format!(
                "banding `{}` has no coordinate for tape #{}",
                owner, i
            )));
        }
        Ok(v)
    }
}

fn unknown_tape(owner: &str, tape: &str) -> crate::error::CompileError {
    ErrorKind::UnknownTape {
        expr: owner.to_string(),
        tape: tape.to_string(),
    }
    .into()
}

fn expression(b: &HmmBuilder, name: &str, e: &ExpressionDescription) -> Result<Template> {
    let mut t = Template::new(name, e.text.clone());
    for ident in e.identifiers.iter() {
        t = match ident {
            IdentifierDescription::Symbol { name: i, tape, depth } => {
                let id = b.tape_id(tape).map_err(|_| unknown_tape(name, tape))?;
                t.symbol(i.clone(), id, *depth)
            }
            IdentifierDescription::Position { name: i, tape } => {
                let id = b.tape_id(tape).map_err(|_| unknown_tape(name, tape))?;
                t.position(i.clone(), id)
            }
            IdentifierDescription::Global { name: i } => t.global(i.clone()),
        };
    }
    Ok(t)
}
