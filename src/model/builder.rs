//!
//! Model construction and validation
//!
use super::clique::{Banding, Clique, DEFAULT_TABLE_CLASS};
use super::emission::Emission;
use super::ids::{BandingId, CliqueId, EmissionId, StateId, TapeId, TransitionId};
use super::state::{State, Transition};
use super::tape::{Alphabet, Tape};
use super::Hmm;
use crate::error::{fail, ErrorKind, Result, Traced};
use crate::template::{Expr, ExprTemplate, Template};
use fnv::FnvHashMap;
use itertools::Itertools;
use log::{debug, warn};
use std::rc::Rc;

/// name of the implicit emission of transitions into Mealy states that
/// declare none
pub const SILENT_EMISSION: &str = "silent";

struct CliqueSpec {
    name: String,
    banding: Option<String>,
    linked_banding: Option<String>,
    table_class: String,
}

struct StateSpec {
    clique: String,
    name: String,
    emission: Option<String>,
    order: Vec<usize>,
}

struct EmissionSpec {
    name: String,
    probability: Expr,
    consumed: Vec<usize>,
}

struct TransitionSpec {
    name: String,
    from: String,
    to: String,
    probability: Expr,
    emission: Option<String>,
}

///
/// Builder of `Hmm`.
///
/// Tapes are fixed at construction (so that `tape_id` is available while
/// writing expressions); everything else refers to other items by name and
/// is resolved in `build`.
///
pub struct HmmBuilder {
    name: String,
    tapes: Vec<Tape>,
    cliques: Vec<CliqueSpec>,
    states: Vec<StateSpec>,
    emissions: Vec<EmissionSpec>,
    transitions: Vec<TransitionSpec>,
    bandings: Vec<(String, String, Vec<String>)>,
    parameters: Vec<String>,
}

impl HmmBuilder {
    ///
    /// `tapes` are `(name, alphabet, speed)`; they get ordinals by a stable
    /// sort on speed.
    ///
    pub fn new<S: Into<String>>(name: S, tapes: Vec<(&str, Alphabet, i32)>) -> Self {
        let tapes: Vec<Tape> = tapes
            .into_iter()
            .sorted_by_key(|(_, _, speed)| *speed)
            .enumerate()
            .map(|(i, (name, alphabet, speed))| Tape {
                id: TapeId(i),
                name: name.to_string(),
                alphabet,
                speed,
            })
            .collect();
        HmmBuilder {
            name: name.into(),
            tapes,
            cliques: Vec::new(),
            states: Vec::new(),
            emissions: Vec::new(),
            transitions: Vec::new(),
            bandings: Vec::new(),
            parameters: Vec::new(),
        }
    }
    pub fn n_tapes(&self) -> usize {
        self.tapes.len()
    }
    pub fn tape_id(&self, name: &str) -> Result<TapeId> {
        match self.tapes.iter().find(|t| t.name == name) {
            Some(t) => Ok(t.id),
            None => fail(ErrorKind::UnknownTape {
                expr: self.name.clone(),
                tape: name.to_string(),
            }),
        }
    }
    pub fn clique(&mut self, name: &str) -> &mut Self {
        self.cliques.push(CliqueSpec {
            name: name.to_string(),
            banding: None,
            linked_banding: None,
            table_class: DEFAULT_TABLE_CLASS.to_string(),
        });
        self
    }
    ///
    /// Clique with banding and a custom DP table class
    ///
    pub fn clique_with(
        &mut self,
        name: &str,
        banding: Option<&str>,
        linked_banding: Option<&str>,
        table_class: Option<&str>,
    ) -> &mut Self {
        self.cliques.push(CliqueSpec {
            name: name.to_string(),
            banding: banding.map(|s| s.to_string()),
            linked_banding: linked_banding.or(banding).map(|s| s.to_string()),
            table_class: table_class.unwrap_or(DEFAULT_TABLE_CLASS).to_string(),
        });
        self
    }
    ///
    /// Add a state. An empty `order` means zero order on every tape.
    ///
    pub fn state(
        &mut self,
        clique: &str,
        name: &str,
        emission: Option<&str>,
        order: &[usize],
    ) -> &mut Self {
        self.states.push(StateSpec {
            clique: clique.to_string(),
            name: name.to_string(),
            emission: emission.map(|s| s.to_string()),
            order: order.to_vec(),
        });
        self
    }
    ///
    /// Add an emission consuming `consumed[i]` symbols on tape `i`.
    /// An empty `consumed` means a silent emission.
    ///
    pub fn emission<P: ExprTemplate + 'static>(
        &mut self,
        name: &str,
        probability: P,
        consumed: &[usize],
    ) -> &mut Self {
        self.emission_expr(name, Rc::new(probability), consumed)
    }
    pub fn emission_expr(&mut self, name: &str, probability: Expr, consumed: &[usize]) -> &mut Self {
        self.emissions.push(EmissionSpec {
            name: name.to_string(),
            probability,
            consumed: consumed.to_vec(),
        });
        self
    }
    ///
    /// Add a transition named `from_to`.
    ///
    pub fn transition<P: ExprTemplate + 'static>(
        &mut self,
        from: &str,
        to: &str,
        probability: P,
        emission: Option<&str>,
    ) -> &mut Self {
        let name = format!("{}_{}", from, to);
        self.transition_expr(&name, from, to, Rc::new(probability), emission)
    }
    pub fn transition_expr(
        &mut self,
        name: &str,
        from: &str,
        to: &str,
        probability: Expr,
        emission: Option<&str>,
    ) -> &mut Self {
        self.transitions.push(TransitionSpec {
            name: name.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            probability,
            emission: emission.map(|s| s.to_string()),
        });
        self
    }
    pub fn banding(&mut self, name: &str, iterator: &str, coordinates: &[&str]) -> &mut Self {
        self.bandings.push((
            name.to_string(),
            iterator.to_string(),
            coordinates.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }
    pub fn parameter(&mut self, declaration: &str) -> &mut Self {
        self.parameters.push(declaration.to_string());
        self
    }
    pub fn build(self) -> Result<Hmm> {
        let trace = format!("hmm `{}`", self.name);
        self.build_inner().within(trace)
    }

    fn per_tape(&self, what: &str, v: &[usize]) -> Result<Vec<usize>> {
        if v.is_empty() {
            Ok(vec![0; self.tapes.len()])
        } else if v.len() == self.tapes.len() {
            Ok(v.to_vec())
        } else {
            fail(ErrorKind::InvalidDescription(format!(
                "{} has {} entries but the model has {} tapes",
                what,
                v.len(),
                self.tapes.len()
            )))
        }
    }

    fn build_inner(self) -> Result<Hmm> {
        let n_tapes = self.tapes.len();
        check_unique("tape", self.tapes.iter().map(|t| t.name.as_str()))?;
        check_unique("clique", self.cliques.iter().map(|c| c.name.as_str()))?;
        check_unique("state", self.states.iter().map(|s| s.name.as_str()))?;
        check_unique("emission", self.emissions.iter().map(|e| e.name.as_str()))?;
        check_unique(
            "transition",
            self.transitions.iter().map(|t| t.name.as_str()),
        )?;
        check_unique("banding", self.bandings.iter().map(|b| b.0.as_str()))?;

        // bandings
        let mut bandings = Vec::new();
        for (i, (name, iterator, coordinates)) in self.bandings.iter().enumerate() {
            if coordinates.len() != n_tapes {
                return fail(ErrorKind::InvalidDescription(format!(
                    "banding `{}` has {} coordinates but the model has {} tapes",
                    name,
                    coordinates.len(),
                    n_tapes
                )));
            }
            bandings.push(Banding {
                id: BandingId(i),
                name: name.clone(),
                iterator: iterator.clone(),
                coordinates: coordinates.clone(),
            });
        }
        let banding_ids: FnvHashMap<&str, BandingId> = bandings
            .iter()
            .map(|b| (b.name.as_str(), b.id))
            .collect();
        let resolve_banding = |clique: &str, name: &Option<String>| -> Result<Option<BandingId>> {
            match name {
                None => Ok(None),
                Some(n) => match banding_ids.get(n.as_str()) {
                    Some(&id) => Ok(Some(id)),
                    None => fail(ErrorKind::DanglingReference {
                        kind: "clique",
                        id: clique.to_string(),
                        target_kind: "banding",
                        target: n.clone(),
                    }),
                },
            }
        };

        // cliques
        let mut cliques = Vec::new();
        for (i, c) in self.cliques.iter().enumerate() {
            cliques.push(Clique {
                id: CliqueId(i),
                name: c.name.clone(),
                states: Vec::new(),
                banding: resolve_banding(&c.name, &c.banding)?,
                linked_banding: resolve_banding(&c.name, &c.linked_banding)?,
                table_class: c.table_class.clone(),
            });
        }
        let clique_ids: FnvHashMap<String, CliqueId> =
            cliques.iter().map(|c| (c.name.clone(), c.id)).collect();

        // emissions (plus the implicit silent one, appended on demand)
        let mut emissions = Vec::new();
        for (i, e) in self.emissions.iter().enumerate() {
            emissions.push(Emission {
                id: EmissionId(i),
                name: e.name.clone(),
                probability: e.probability.clone(),
                consumed: self
                    .per_tape(&format!("emission `{}`", e.name), &e.consumed)?,
                order: vec![0; n_tapes],
            });
        }
        let mut emission_ids: FnvHashMap<String, EmissionId> =
            emissions.iter().map(|e| (e.name.clone(), e.id)).collect();

        // states
        let mut states = Vec::new();
        for (i, s) in self.states.iter().enumerate() {
            let clique = match clique_ids.get(&s.clique) {
                Some(&c) => c,
                None => {
                    return fail(ErrorKind::DanglingReference {
                        kind: "state",
                        id: s.name.clone(),
                        target_kind: "clique",
                        target: s.clique.clone(),
                    })
                }
            };
            let emission = match &s.emission {
                None => None,
                Some(e) => match emission_ids.get(e) {
                    Some(&id) => Some(id),
                    None => {
                        return fail(ErrorKind::DanglingReference {
                            kind: "state",
                            id: s.name.clone(),
                            target_kind: "emission",
                            target: e.clone(),
                        })
                    }
                },
            };
            let id = StateId(i);
            let index_in_clique = cliques[clique.0].states.len();
            cliques[clique.0].states.push(id);
            states.push(State {
                id,
                name: s.name.clone(),
                order: self.per_tape(&format!("order of state `{}`", s.name), &s.order)?,
                emission,
                clique,
                index_in_clique,
            });
        }
        if let Some(c) = cliques.iter().find(|c| c.states.is_empty()) {
            return fail(ErrorKind::EmptyClique {
                clique: c.name.clone(),
            });
        }
        let state_ids: FnvHashMap<String, StateId> =
            states.iter().map(|s| (s.name.clone(), s.id)).collect();

        // transitions
        let mut transitions = Vec::new();
        for (i, t) in self.transitions.iter().enumerate() {
            let lookup = |name: &str| -> Result<StateId> {
                match state_ids.get(name) {
                    Some(&s) => Ok(s),
                    None => fail(ErrorKind::DanglingReference {
                        kind: "transition",
                        id: t.name.clone(),
                        target_kind: "state",
                        target: name.to_string(),
                    }),
                }
            };
            let from = lookup(&t.from)?;
            let to = lookup(&t.to)?;
            let declared = match &t.emission {
                None => None,
                Some(e) => match emission_ids.get(e) {
                    Some(&id) => Some(id),
                    None => {
                        return fail(ErrorKind::DanglingReference {
                            kind: "transition",
                            id: t.name.clone(),
                            target_kind: "emission",
                            target: e.clone(),
                        })
                    }
                },
            };
            let emission = match (states[to.0].emission, declared) {
                (Some(moore), None) => moore,
                (Some(moore), Some(e)) if moore == e => moore,
                (Some(moore), Some(e)) => {
                    return fail(ErrorKind::ConflictingEmission {
                        transition: t.name.clone(),
                        emission: emissions[e.0].name.clone(),
                        state: states[to.0].name.clone(),
                        state_emission: emissions[moore.0].name.clone(),
                    })
                }
                (None, Some(e)) => e,
                (None, None) => match emission_ids.get(SILENT_EMISSION) {
                    Some(&id) => id,
                    None => {
                        let id = EmissionId(emissions.len());
                        emissions.push(Emission {
                            id,
                            name: SILENT_EMISSION.to_string(),
                            probability: Rc::new(Template::constant(SILENT_EMISSION, 1.0)),
                            consumed: vec![0; n_tapes],
                            order: vec![0; n_tapes],
                        });
                        emission_ids.insert(SILENT_EMISSION.to_string(), id);
                        id
                    }
                },
            };
            transitions.push(Transition {
                id: TransitionId(i),
                name: t.name.clone(),
                from,
                to,
                emission,
                probability: t.probability.clone(),
            });
        }

        let mut hmm = Hmm {
            name: self.name.clone(),
            tapes: self.tapes.clone(),
            states,
            transitions,
            emissions,
            cliques,
            bandings,
            parameters: self.parameters.clone(),
        };
        assign_emission_orders(&mut hmm);
        check_orders(&hmm)?;
        debug!(
            "built hmm `{}`: {} tapes, {} cliques, {} states, {} transitions",
            hmm.name,
            hmm.n_tapes(),
            hmm.cliques.len(),
            hmm.n_states(),
            hmm.n_transitions()
        );
        Ok(hmm)
    }
}

fn check_unique<'a, I: Iterator<Item = &'a str>>(kind: &'static str, names: I) -> Result<()> {
    match names.duplicates().next() {
        Some(id) => fail(ErrorKind::DuplicateIdentifier {
            kind,
            id: id.to_string(),
        }),
        None => Ok(()),
    }
}

///
/// Emission order = minimum of the orders of the states it is entered from.
///
fn assign_emission_orders(hmm: &mut Hmm) {
    for e in 0..hmm.emissions.len() {
        let sources: Vec<StateId> = hmm
            .transitions
            .iter()
            .filter(|t| t.emission.0 == e)
            .map(|t| t.from)
            .unique()
            .collect();
        if sources.is_empty() {
            continue;
        }
        let mut order = vec![usize::MAX; hmm.n_tapes()];
        for tape in 0..hmm.n_tapes() {
            let orders: Vec<usize> = sources
                .iter()
                .map(|&s| hmm.states[s.0].order[tape])
                .collect();
            let min = orders.iter().copied().min().unwrap_or(0);
            if orders.iter().any(|&o| o != min) {
                warn!(
                    "emission `{}` is entered from states of different order on tape `{}` ({:?}); using order {}",
                    hmm.emissions[e].name,
                    hmm.tapes[tape].name,
                    orders,
                    min
                );
            }
            order[tape] = min;
        }
        hmm.emissions[e].order = order;
    }
}

///
/// `from.order + consumed >= to.order` on every tape
///
fn check_orders(hmm: &Hmm) -> Result<()> {
    for t in hmm.transitions.iter() {
        let from = hmm.state(t.from);
        let to = hmm.state(t.to);
        let consumed = &hmm.emission(t.emission).consumed;
        for tape in hmm.tape_ids() {
            let i = tape.0;
            if from.order[i] + consumed[i] < to.order[i] {
                return fail(ErrorKind::OrderViolation {
                    transition: t.name.clone(),
                    from: from.name.clone(),
                    to: to.name.clone(),
                    tape: hmm.tape(tape).name.clone(),
                    from_order: from.order[i],
                    consumed: consumed[i],
                    to_order: to.order[i],
                })
                .within(format!("transition `{}`", t.name));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dna() -> Alphabet {
        Alphabet::from_chars("dna", "ACGT")
    }

    fn small() -> HmmBuilder {
        let mut b = HmmBuilder::new("small", vec![("y", dna(), 1), ("x", dna(), 0)]);
        b.clique("begin")
            .clique("body")
            .clique("finish")
            .emission("emit", Template::constant("emit", 0.25), &[1, 0])
            .state("begin", "start", None, &[])
            .state("body", "M", Some("emit"), &[])
            .state("finish", "end", None, &[])
            .transition("start", "M", Template::constant("p", 1.0), None)
            .transition("M", "M", Template::constant("p", 0.9), None)
            .transition("M", "end", Template::constant("p", 0.1), None);
        b
    }

    #[test]
    fn tapes_sorted_by_speed() {
        let b = small();
        assert_eq!(b.tape_id("x").unwrap(), TapeId(0));
        assert_eq!(b.tape_id("y").unwrap(), TapeId(1));
        assert!(b.tape_id("z").is_err());
    }

    #[test]
    fn moore_emission_and_implicit_silent() {
        let hmm = small().build().unwrap();
        let m = hmm.state_by_name("M").unwrap();
        let into_m = hmm.transitions_to(m).next().unwrap();
        assert_eq!(hmm.emission(into_m.emission).name, "emit");
        let end = hmm.state_by_name("end").unwrap();
        let into_end = hmm.transitions_to(end).next().unwrap();
        assert_eq!(hmm.emission(into_end.emission).name, SILENT_EMISSION);
        assert!(hmm.emission(into_end.emission).is_silent());
        assert_eq!(hmm.state(m).index_in_clique, 0);
    }

    #[test]
    fn rejects_duplicates_and_dangling() {
        let mut b = small();
        b.state("body", "M", None, &[]);
        let e = b.build().unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::DuplicateIdentifier { kind: "state", .. }));
        assert_eq!(e.trace(), vec!["hmm `small`"]);

        let mut b = small();
        b.transition("M", "nowhere", Template::constant("p", 1.0), None);
        let e = b.build().unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::DanglingReference { .. }));

        let mut b = small();
        b.clique("unused");
        let e = b.build().unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::EmptyClique { .. }));
    }

    #[test]
    fn rejects_conflicting_emission() {
        let mut b = small();
        b.emission("other", Template::constant("o", 0.5), &[0, 1]);
        b.transition_expr(
            "again",
            "start",
            "M",
            Template::constant("p", 1.0).into_expr(),
            Some("other"),
        );
        let e = b.build().unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::ConflictingEmission { .. }));
    }

    #[test]
    fn order_violation_is_fatal() {
        let mut b = HmmBuilder::new("ord", vec![("x", dna(), 0)]);
        b.clique("a")
            .clique("b")
            .clique("c")
            .state("a", "start", None, &[0])
            .state("b", "H", None, &[1])
            .state("c", "end", None, &[0])
            .transition("start", "H", Template::constant("p", 1.0), None)
            .transition("H", "end", Template::constant("p", 1.0), None);
        let e = b.build().unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::OrderViolation { to_order: 1, .. }));
        assert_eq!(e.trace(), vec!["hmm `ord`", "transition `start_H`"]);
    }

    #[test]
    fn emission_order_takes_minimum() {
        let mut b = HmmBuilder::new("ord", vec![("x", dna(), 0)]);
        b.clique("a")
            .clique("b")
            .clique("c")
            .emission("e", Template::constant("e", 0.25), &[1])
            .state("a", "start", None, &[0])
            .state("b", "P", None, &[1])
            .state("b", "Q", None, &[0])
            .state("c", "end", None, &[0])
            .transition_expr("s_p", "start", "P", Template::constant("p", 0.5).into_expr(), Some("e"))
            .transition_expr("s_q", "start", "Q", Template::constant("p", 0.5).into_expr(), Some("e"))
            .transition_expr("p_e", "P", "end", Template::constant("p", 1.0).into_expr(), Some("e"))
            .transition_expr("q_e", "Q", "end", Template::constant("p", 1.0).into_expr(), Some("e"));
        let hmm = b.build().unwrap();
        let e = &hmm.emissions[0];
        // entered from start (0), P (1), Q (0)
        assert_eq!(e.order, vec![0]);
    }
}
