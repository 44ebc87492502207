//!
//! Code assembly engine
//!
//! Independent of the HMM domain. A `Document` is a growable chain of text
//! fragments addressed through named scopes, so that a generator can come
//! back to a place it passed earlier (e.g. the declarations at the top of a
//! function) and insert there.
//!
//! * `fragment`: the arena and its insert-before chain
//! * `document`: scopes and rendering
//! * `preprocess`: partition selection and indentation
//!
pub mod document;
pub mod fragment;
pub mod preprocess;

pub use document::Document;
pub use fragment::TextId;

use crate::error::Result;
use fnv::FnvHashMap;

///
/// Memo for "declare once per scope instance".
///
/// Remembers, per `(label, item)`, the head of the scope instance in which
/// `item` was last declared. A reopened scope has a new head, so the item is
/// declared again there.
///
#[derive(Debug, Clone, Default)]
pub struct DeclareOnce {
    memo: FnvHashMap<(String, String), TextId>,
}

impl DeclareOnce {
    pub fn new() -> Self {
        Self::default()
    }
    ///
    /// `true` if `item` was not yet declared in the current instance of the
    /// open scope `label`. The caller declares it when this returns `true`.
    ///
    pub fn first_time(&mut self, doc: &Document, label: &str, item: &str) -> Result<bool> {
        let head = doc.head(label)?;
        let key = (label.to_string(), item.to_string());
        match self.memo.get(&key) {
            Some(&h) if h == head => Ok(false),
            _ => {
                self.memo.insert(key, head);
                Ok(true)
            }
        }
    }
    pub fn clear(&mut self) {
        self.memo.clear();
    }
}
