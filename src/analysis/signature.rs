//!
//! Signatures: count-array buckets
//!
//! Transitions (and emissions) whose generated count code has the same
//! shape share a signature; each member gets a sequential id inside its
//! bucket.
//!
use crate::model::{EmissionId, Hmm, TransitionId};
use fnv::FnvHashMap;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

///
/// Per-tape dependency depths
///
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(pub Vec<usize>);

impl Signature {
    ///
    /// identifier-safe form, e.g. `1_0`
    ///
    pub fn ident(&self) -> String {
        self.0.iter().map(|d| d.to_string()).collect::<Vec<_>>().join("_")
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.ident().replace('_', ","))
    }
}

#[derive(Debug, Clone)]
pub struct SignatureTable<T: Copy + Eq + Hash> {
    buckets: BTreeMap<Signature, Vec<T>>,
    index: FnvHashMap<T, (Signature, usize)>,
}

impl<T: Copy + Eq + Hash> SignatureTable<T> {
    pub fn build<I: IntoIterator<Item = (T, Signature)>>(items: I) -> Self {
        let mut buckets: BTreeMap<Signature, Vec<T>> = BTreeMap::new();
        let mut index = FnvHashMap::default();
        for (item, sig) in items {
            let members = buckets.entry(sig.clone()).or_insert_with(Vec::new);
            index.insert(item, (sig, members.len()));
            members.push(item);
        }
        SignatureTable { buckets, index }
    }
    pub fn signature(&self, item: T) -> &Signature {
        &self.index[&item].0
    }
    ///
    /// id of `item` inside its bucket
    ///
    pub fn sequential_id(&self, item: T) -> usize {
        self.index[&item].1
    }
    pub fn members(&self, sig: &Signature) -> &[T] {
        self.buckets.get(sig).map(|v| v.as_slice()).unwrap_or(&[])
    }
    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        self.buckets.keys()
    }
    pub fn n_buckets(&self) -> usize {
        self.buckets.len()
    }
}

#[derive(Debug, Clone)]
pub struct Signatures {
    pub transitions: SignatureTable<TransitionId>,
    pub emissions: SignatureTable<EmissionId>,
}

///
/// transition: order of the from-state; emission: order plus consumed
///
pub fn signatures(hmm: &Hmm) -> Signatures {
    let transitions = SignatureTable::build(
        hmm.transitions
            .iter()
            .map(|t| (t.id, Signature(hmm.state(t.from).order.clone()))),
    );
    let emissions = SignatureTable::build(hmm.emissions.iter().map(|e| {
        let depths = e.order.iter().zip(e.consumed.iter()).map(|(o, c)| o + c).collect();
        (e.id, Signature(depths))
    }));
    Signatures {
        transitions,
        emissions,
    }
}
