//! The concrete automaton: two consistent sparse adjacency matrices plus
//! per-state event caches.
//!
//! The event-labeled matrix `G` is the source of truth: `G[i, j]` holds every
//! event leading from state `i` to state `j`. Alongside it lives a boolean
//! shadow matrix with an identity overlay, which is what the reachability
//! fixpoints multiply, and the per-state bitmaps of outgoing and incoming
//! events that make enabledness tests O(1). Every mutating call leaves all
//! of these in agreement before returning.
//!
//! The transition function is deterministic: a state has at most one
//! successor per event. Writes that would break this overwrite the previous
//! edge (or, with the `strict` feature, fail with
//! [`Error::NonDeterministic`]).

use std::cell::{Cell, RefCell};

use crate::system::TransitionSystem;
use crate::{Error, Event, Events, Result, State, StateSet};
use supremal_core::sparse::{SparseBitMatrix, SparseMatrix};

/// A deterministic event-labeled automaton backed by sparse matrices.
///
/// States are the integers `0..size`; events are [`Event`] codes. After bulk
/// edits through [`insert`](Automaton::insert) or
/// [`edge_mut`](Automaton::edge_mut), call
/// [`make_compressed`](Automaton::make_compressed) before running queries
/// that scan matrix rows.
#[derive(Debug, Clone)]
pub struct Automaton {
    pub(crate) size: usize,
    pub(crate) initial: State,
    pub(crate) marked: StateSet,
    pub(crate) graph: SparseMatrix<Events>,
    pub(crate) bit_graph: SparseBitMatrix,
    pub(crate) state_events: Vec<Events>,
    pub(crate) inv_state_events: Vec<Events>,
    pub(crate) events: Events,
    pub(crate) inv_graph: RefCell<Option<SparseMatrix<Events>>>,
    pub(crate) dirty: Cell<bool>,
}

impl Automaton {
    /// Creates an automaton with `size` states, no transitions, the given
    /// initial state and marked states. The boolean shadow starts as the
    /// identity.
    ///
    /// # Panics
    /// If `initial` or any marked state is not below `size` (except on the
    /// empty automaton, where there are no valid states at all).
    pub fn new(size: usize, initial: State, marked: impl IntoIterator<Item = State>) -> Self {
        assert!(size == 0 || (initial as usize) < size, "initial state {initial} outside {size} states");
        let marked: StateSet = marked.into_iter().collect();
        if let Some(&max) = marked.iter().next_back() {
            assert!((max as usize) < size, "marked state {max} outside {size} states");
        }
        Self {
            size,
            initial,
            marked,
            graph: SparseMatrix::new(size, size),
            bit_graph: SparseBitMatrix::identity(size),
            state_events: vec![Events::new(); size],
            inv_state_events: vec![Events::new(); size],
            events: Events::new(),
            inv_graph: RefCell::new(None),
            dirty: Cell::new(false),
        }
    }

    /// Starts building an automaton with `size` states.
    pub fn builder(size: usize) -> AutomatonBuilder {
        AutomatonBuilder {
            size,
            initial: 0,
            marked: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Adds `event` to the edge from `from` to `to`.
    ///
    /// If `event` already leads from `from` to a different state, that edge
    /// is cleared first so the transition function stays deterministic. With
    /// the `strict` feature this situation fails with
    /// [`Error::NonDeterministic`] instead.
    pub fn insert(&mut self, from: State, to: State, event: Event) -> Result<()> {
        self.check_state(from)?;
        self.check_state(to)?;
        if self.state_events[from as usize].contains(event) {
            match self.scan_successor(from, event) {
                Some(prev) if prev == to => return Ok(()),
                Some(_) if cfg!(feature = "strict") => return Err(Error::NonDeterministic),
                Some(prev) => self.remove_edge_event(from, prev, event),
                None => debug_assert!(false, "event cache lists an event with no stored edge"),
            }
        }
        self.graph.join_cell(from, to, Events::singleton(event));
        self.bit_graph.join_cell(from, to, true);
        self.state_events[from as usize].insert(event);
        self.inv_state_events[to as usize].insert(event);
        self.events.insert(event);
        self.touch();
        Ok(())
    }

    /// Write handle for the cell `(from, to)`; see [`TransitionProxy`].
    pub fn edge_mut(&mut self, from: State, to: State) -> TransitionProxy<'_> {
        TransitionProxy { automaton: self, from, to }
    }

    /// The events currently leading from `from` to `to`, pending edits
    /// included.
    ///
    /// # Panics
    /// If either state is out of range.
    pub fn edge(&self, from: State, to: State) -> Events {
        self.graph.coeff(from, to)
    }

    /// The event-labeled adjacency matrix.
    pub fn graph(&self) -> &SparseMatrix<Events> {
        &self.graph
    }

    /// The boolean shadow matrix, identity overlay included.
    pub fn bit_graph(&self) -> &SparseBitMatrix {
        &self.bit_graph
    }

    /// Folds pending matrix edits into compressed storage and marks every
    /// downstream cache as fresh. Must be called after bulk edits, before
    /// row-scanning queries.
    pub fn make_compressed(&mut self) {
        self.graph.make_compressed();
        self.bit_graph.make_compressed();
        self.dirty.set(false);
    }

    /// True if the automaton was edited since the last
    /// [`make_compressed`](Automaton::make_compressed); downstream caches
    /// (the inverse graph, any accelerator copy) are stale then.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub(crate) fn check_state(&self, q: State) -> Result<()> {
        if (q as usize) < self.size {
            Ok(())
        } else {
            Err(Error::OutOfRange { index: q as usize, bound: self.size })
        }
    }

    pub(crate) fn assert_state(&self, q: State) {
        assert!((q as usize) < self.size, "state {q} outside {} states", self.size);
    }

    // Successor lookup over the merged matrix view; usable while edits are
    // still pending, which is what the overwrite check needs.
    fn scan_successor(&self, from: State, event: Event) -> Option<State> {
        self.graph
            .row_entries(from)
            .into_iter()
            .find(|(_, set)| set.contains(event))
            .map(|(col, _)| col)
    }

    // Removes a single event from an edge, dropping the boolean cell when the
    // edge empties (the diagonal keeps its identity overlay). The total event
    // set is left alone; callers re-add the event elsewhere or recompute.
    fn remove_edge_event(&mut self, from: State, to: State, event: Event) {
        let mut cell = self.graph.coeff(from, to);
        cell.remove(event);
        self.graph.set_cell(from, to, cell);
        if cell.is_empty() && from != to {
            self.bit_graph.set_cell(from, to, false);
        }
        self.state_events[from as usize] = self.row_union(from);
        self.recompute_inv_state_events(to);
    }

    // Clears the whole cell `(from, to)` and rebuilds every cache that may
    // have shrunk, including the total event set.
    fn clear_cell(&mut self, from: State, to: State) {
        self.graph.set_cell(from, to, Events::new());
        if from != to {
            self.bit_graph.set_cell(from, to, false);
        }
        self.state_events[from as usize] = self.row_union(from);
        self.recompute_inv_state_events(to);
        self.events = self.state_events.iter().fold(Events::new(), |acc, s| acc | *s);
        self.touch();
    }

    fn row_union(&self, from: State) -> Events {
        self.graph
            .row_entries(from)
            .into_iter()
            .fold(Events::new(), |acc, (_, set)| acc | set)
    }

    fn recompute_inv_state_events(&mut self, to: State) {
        let mut incoming = Events::new();
        for i in 0..self.size as State {
            incoming |= self.graph.coeff(i, to);
        }
        self.inv_state_events[to as usize] = incoming;
    }

    fn touch(&mut self) {
        self.dirty.set(true);
        self.inv_graph.borrow_mut().take();
    }
}

impl TransitionSystem for Automaton {
    fn size(&self) -> usize {
        self.size
    }

    fn initial(&self) -> State {
        self.initial
    }

    fn marked_states(&self) -> &StateSet {
        &self.marked
    }

    fn events(&self) -> Events {
        self.events
    }

    fn state_events(&self, q: State) -> Events {
        self.assert_state(q);
        self.state_events[q as usize]
    }

    fn inv_state_events(&self, q: State) -> Events {
        self.assert_state(q);
        self.inv_state_events[q as usize]
    }

    fn successor(&self, q: State, event: Event) -> Result<Option<State>> {
        self.assert_state(q);
        if !self.state_events[q as usize].contains(event) {
            return Ok(None);
        }
        for (col, set) in self.graph.row_iter(q)? {
            if set.contains(event) {
                return Ok(Some(col));
            }
        }
        Ok(None)
    }

    fn predecessors(&self, q: State, event: Event) -> Result<Vec<State>> {
        self.assert_state(q);
        if !self.inv_state_events[q as usize].contains(event) {
            return Ok(Vec::new());
        }
        self.allocate_inv_graph()?;
        let guard = self.inv_graph.borrow();
        let inv = guard.as_ref().expect("inverse graph allocated above");
        let mut predecessors = Vec::new();
        for (col, set) in inv.row_iter(q)? {
            if set.contains(event) {
                predecessors.push(col);
            }
        }
        Ok(predecessors)
    }

    fn allocate_inv_graph(&self) -> Result<()> {
        if self.inv_graph.borrow().is_some() {
            return Ok(());
        }
        let transposed = self.graph.transpose()?;
        *self.inv_graph.borrow_mut() = Some(transposed);
        Ok(())
    }

    fn clear_inv_graph(&self) {
        self.inv_graph.borrow_mut().take();
    }
}

/// Structural equality: same shape, initial state, marked set and event
/// matrix. Compress both sides before comparing, otherwise logically equal
/// automata with different pending edits are reported unequal.
impl PartialEq for Automaton {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size
            && self.initial == other.initial
            && self.marked == other.marked
            && self.graph == other.graph
    }
}

impl Eq for Automaton {}

/// Single-use write binding to one cell of the adjacency matrix, returned by
/// [`Automaton::edge_mut`].
///
/// Reads of the automaton stay cheap because nothing is invalidated until a
/// proxy actually writes; each write marks the automaton dirty and drops the
/// cached inverse graph.
#[derive(Debug)]
pub struct TransitionProxy<'a> {
    automaton: &'a mut Automaton,
    from: State,
    to: State,
}

impl TransitionProxy<'_> {
    /// Adds one event to the bound edge; same semantics as
    /// [`Automaton::insert`].
    pub fn add(self, event: Event) -> Result<()> {
        self.automaton.insert(self.from, self.to, event)
    }

    /// Replaces the bound edge with exactly `events`. Assigning the empty
    /// set clears the edge (the boolean diagonal keeps its identity
    /// overlay). Each contained event goes through the deterministic write
    /// path, so edges elsewhere in the row may be overwritten.
    pub fn assign(self, events: Events) -> Result<()> {
        self.automaton.check_state(self.from)?;
        self.automaton.check_state(self.to)?;
        if self.automaton.edge(self.from, self.to) == events {
            return Ok(());
        }
        self.automaton.clear_cell(self.from, self.to);
        for event in events.iter() {
            self.automaton.insert(self.from, self.to, event)?;
        }
        Ok(())
    }
}

/// Chainable construction of an [`Automaton`]; compresses on
/// [`build`](AutomatonBuilder::build).
///
/// ```
/// use supremal::prelude::*;
///
/// let automaton = Automaton::builder(2)
///     .marked([0])
///     .edges([(0, 1, 0), (1, 0, 1)])
///     .build()
///     .unwrap();
/// assert_eq!(automaton.size(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct AutomatonBuilder {
    size: usize,
    initial: State,
    marked: Vec<State>,
    edges: Vec<(State, State, Event)>,
}

impl AutomatonBuilder {
    /// Sets the initial state; defaults to 0.
    pub fn initial(mut self, q: State) -> Self {
        self.initial = q;
        self
    }

    /// Adds marked states.
    pub fn marked(mut self, states: impl IntoIterator<Item = State>) -> Self {
        self.marked.extend(states);
        self
    }

    /// Adds `(from, to, event)` edges.
    pub fn edges(mut self, edges: impl IntoIterator<Item = (State, State, Event)>) -> Self {
        self.edges.extend(edges);
        self
    }

    /// Builds the automaton and compresses its matrices.
    pub fn build(self) -> Result<Automaton> {
        let mut automaton = Automaton::new(self.size, self.initial, self.marked);
        for (from, to, event) in self.edges {
            automaton.insert(from, to, event)?;
        }
        automaton.make_compressed();
        Ok(automaton)
    }
}
