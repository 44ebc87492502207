//!
//! Typed indices into the model tables
//!
use std::fmt;

macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(&self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

index_type!(
    /// Tape ordinal, after sorting tapes by speed. `TapeId(0)` is the
    /// innermost (fastest) loop.
    TapeId,
    "tape"
);
index_type!(
    /// Global state number
    StateId,
    "state"
);
index_type!(TransitionId, "transition");
index_type!(EmissionId, "emission");
index_type!(CliqueId, "clique");
index_type!(BandingId, "banding");
