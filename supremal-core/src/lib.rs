//! Vocabulary and storage layer for symbolic discrete-event systems: event
//! bitsets, the lattice trait used to merge sparse cell values, and row-major
//! compressed sparse matrices with a boolean sparse-matrix product.
//!
//! The types in this crate are deliberately free of any automaton semantics;
//! the `supremal` crate builds the actual systems on top of them.
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod events;
pub mod lattice;
pub mod math;
pub mod sparse;

pub use error::{Error, Result};
pub use events::{Event, EventSet};
pub use lattice::Lattice;
pub use sparse::{SparseBitMatrix, SparseEventMatrix, SparseMatrix};

/// Alias for the integer type used to index states. Adjacency matrices are
/// addressed with this type, so it bounds the number of states a system (or a
/// virtual product of systems) may have.
pub type State = u32;

/// The prelude makes using this crate easier: `use supremal_core::prelude::*;`
/// brings every commonly needed item into scope.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::events::{Event, EventSet};
    pub use crate::lattice::Lattice;
    pub use crate::math;
    pub use crate::sparse::{SparseBitMatrix, SparseEventMatrix, SparseMatrix};
    pub use crate::State;
}
