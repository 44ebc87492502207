//!
//! Fragment arena
//!
//! Fragments form one chain ending in a fixed terminal sentinel. New text is
//! always inserted *before* an existing fragment, so a remembered fragment
//! works as a "write here later" position.
//!
use std::fmt;

///
/// Stable handle of a fragment
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextId(usize);

impl fmt::Display for TextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "text#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Fragment {
    content: String,
    prev: Option<TextId>,
    next: Option<TextId>,
}

#[derive(Debug, Clone)]
pub struct Chain {
    fragments: Vec<Fragment>,
    first: TextId,
    terminal: TextId,
}

impl Default for Chain {
    fn default() -> Self {
        Chain {
            fragments: vec![Fragment {
                content: String::new(),
                prev: None,
                next: None,
            }],
            first: TextId(0),
            terminal: TextId(0),
        }
    }
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }
    ///
    /// The sentinel every chain ends with
    ///
    pub fn terminal(&self) -> TextId {
        self.terminal
    }
    pub fn len(&self) -> usize {
        self.fragments.len()
    }
    pub fn is_empty(&self) -> bool {
        self.fragments.len() == 1
    }
    ///
    /// Insert a new fragment right before `at`; returns its handle.
    ///
    pub fn insert_before<S: Into<String>>(&mut self, at: TextId, content: S) -> TextId {
        let id = TextId(self.fragments.len());
        let prev = self.fragments[at.0].prev;
        self.fragments.push(Fragment {
            content: content.into(),
            prev,
            next: Some(at),
        });
        self.fragments[at.0].prev = Some(id);
        match prev {
            Some(p) => self.fragments[p.0].next = Some(id),
            None => self.first = id,
        }
        id
    }
    pub fn content(&self, id: TextId) -> &str {
        &self.fragments[id.0].content
    }
    pub fn set_content<S: Into<String>>(&mut self, id: TextId, content: S) {
        self.fragments[id.0].content = content.into();
    }
    pub fn append(&mut self, id: TextId, text: &str) {
        self.fragments[id.0].content.push_str(text);
    }
    ///
    /// Handles in render order
    ///
    pub fn iter(&self) -> ChainIter<'_> {
        ChainIter {
            chain: self,
            next: Some(self.first),
        }
    }
    ///
    /// Concatenated content in render order
    ///
    pub fn flatten(&self) -> String {
        let mut s = String::new();
        for id in self.iter() {
            s.push_str(self.content(id));
        }
        s
    }
}

pub struct ChainIter<'a> {
    chain: &'a Chain,
    next: Option<TextId>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = TextId;
    fn next(&mut self) -> Option<TextId> {
        let id = self.next?;
        self.next = self.chain.fragments[id.0].next;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_before_remembered_fragment() {
        let mut c = Chain::new();
        assert!(c.is_empty());
        let end = c.terminal();
        let a = c.insert_before(end, "a");
        let marker = c.insert_before(end, "");
        c.insert_before(end, "c");
        // written later, rendered earlier
        c.insert_before(marker, "b1");
        c.insert_before(marker, "b2");
        c.insert_before(a, "0");
        assert_eq!(c.flatten(), "0ab1b2c");
        assert_eq!(c.iter().count(), c.len());
        c.set_content(a, "A");
        c.append(a, "!");
        assert_eq!(c.flatten(), "0A!b1b2c");
    }
}
