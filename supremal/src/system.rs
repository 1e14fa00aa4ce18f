//! The query surface shared by concrete automata and virtual product views.

use crate::{Event, Events, Result, State, StateSet};

/// Read-only interface of a deterministic event-labeled transition system.
///
/// Implementors expose the transition function `δ(q, ε)` and its inverse
/// together with the per-state event bitmaps that make enabledness tests
/// O(1). The concrete [`Automaton`](crate::Automaton) backs these queries
/// with sparse matrices; the lazy [`SyncProduct`](crate::SyncProduct)
/// resolves them on demand from its two operands, which is why the
/// supervisor-synthesis code can walk a product of millions of virtual
/// states without ever materializing it.
///
/// Methods taking a state index expect it to be below [`size`](Self::size)
/// and panic otherwise; the fallible methods report storage-level problems
/// such as reading an uncompressed matrix.
pub trait TransitionSystem {
    /// Number of states. For virtual views this is the full, not the
    /// reachable, state count.
    fn size(&self) -> usize;

    /// The initial state.
    fn initial(&self) -> State;

    /// The marked (accepting) states, ascending.
    fn marked_states(&self) -> &StateSet;

    /// True if `q` is marked.
    fn is_marked(&self, q: State) -> bool {
        self.marked_states().contains(&q)
    }

    /// Union of all event labels occurring in the system.
    fn events(&self) -> Events;

    /// Events enabled at `q`, i.e. labels of outgoing transitions.
    fn state_events(&self, q: State) -> Events;

    /// Events on transitions arriving at `q`.
    fn inv_state_events(&self, q: State) -> Events;

    /// True if `δ(q, event)` is defined.
    fn enables(&self, q: State, event: Event) -> bool {
        self.state_events(q).contains(event)
    }

    /// True if some transition labeled `event` arrives at `q`.
    fn coenables(&self, q: State, event: Event) -> bool {
        self.inv_state_events(q).contains(event)
    }

    /// The unique successor `δ(q, event)`, or `None` if the event is not
    /// enabled at `q`.
    fn successor(&self, q: State, event: Event) -> Result<Option<State>>;

    /// All states with a transition labeled `event` into `q`. May be empty.
    fn predecessors(&self, q: State, event: Event) -> Result<Vec<State>>;

    /// Ensures the cached inverse graph needed by
    /// [`predecessors`](Self::predecessors) is available. Idempotent and
    /// logically const: only an internal cache is touched.
    fn allocate_inv_graph(&self) -> Result<()>;

    /// Releases the cached inverse graph. Idempotent.
    fn clear_inv_graph(&self);
}

impl<T: TransitionSystem> TransitionSystem for &T {
    fn size(&self) -> usize {
        T::size(self)
    }
    fn initial(&self) -> State {
        T::initial(self)
    }
    fn marked_states(&self) -> &StateSet {
        T::marked_states(self)
    }
    fn events(&self) -> Events {
        T::events(self)
    }
    fn state_events(&self, q: State) -> Events {
        T::state_events(self, q)
    }
    fn inv_state_events(&self, q: State) -> Events {
        T::inv_state_events(self, q)
    }
    fn successor(&self, q: State, event: Event) -> Result<Option<State>> {
        T::successor(self, q, event)
    }
    fn predecessors(&self, q: State, event: Event) -> Result<Vec<State>> {
        T::predecessors(self, q, event)
    }
    fn allocate_inv_graph(&self) -> Result<()> {
        T::allocate_inv_graph(self)
    }
    fn clear_inv_graph(&self) {
        T::clear_inv_graph(self)
    }
}
