//! Symbolic finite-state automata for supervisory control of discrete-event
//! systems.
//!
//! An automaton is a directed graph whose edges carry sets of event labels;
//! it is stored as a pair of sparse adjacency matrices (one labeled with
//! [`Events`] cells, one boolean with an identity overlay) so that
//! reachability questions reduce to sparse boolean matrix products. On top of
//! that sit the classic supervisory-control operations: accessible part,
//! co-accessible part, trim, the lazy synchronous product `P || E`, and the
//! monolithic synthesis of the supremal controllable sublanguage via
//! [`supc`](synthesis::supc).
//!
//! Everything that answers queries about transitions implements the
//! [`TransitionSystem`] trait, so the synthesis and language algorithms run
//! unchanged over concrete automata and over virtual product views.
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use supremal_core::{error, events, lattice, math, sparse};
pub use supremal_core::{Error, Event, Lattice, Result, State};

/// Width, in 64-bit words, of the event sets used by the engine; the default
/// covers the full [`Event`] range.
pub const EVENT_WORDS: usize = 4;

/// The event-set type used throughout the engine.
pub type Events = supremal_core::EventSet<EVENT_WORDS>;

/// A set of states that iterates in ascending order.
pub type StateSet = math::OrderedSet<State>;

/// The common query surface of concrete automata and virtual product views.
pub mod system;
pub use system::TransitionSystem;

/// The concrete automaton, its write proxy and its builder.
pub mod automaton;
pub use automaton::{Automaton, AutomatonBuilder, TransitionProxy};

/// Accessible part, co-accessible part and trim as boolean matrix fixpoints.
pub mod reachability;

/// The lazy synchronous product `P || E` and its materialization.
pub mod sync;
pub use sync::{synchronize, SyncProduct};

/// Monolithic supervisor synthesis.
pub mod synthesis;
pub use synthesis::supc;

/// Benchmark generator modeling a linear cluster tool.
pub mod cluster_tool;

/// The prelude brings every commonly used item into scope:
/// `use supremal::prelude::*;`.
pub mod prelude {
    pub use crate::automaton::{Automaton, AutomatonBuilder, TransitionProxy};
    pub use crate::cluster_tool::{self, ClusterTool};
    pub use crate::sync::{synchronize, SyncProduct};
    pub use crate::synthesis::supc;
    pub use crate::system::TransitionSystem;
    pub use crate::{Error, Event, Events, Lattice, Result, State, StateSet};
    pub use supremal_core::math;
    pub use supremal_core::sparse::{SparseBitMatrix, SparseMatrix};
}
