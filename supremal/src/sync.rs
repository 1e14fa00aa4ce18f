//! The lazy synchronous product `P || E`.
//!
//! Composing two systems multiplies their state counts, but supervisor
//! synthesis usually explores only a thin reachable slice of that space. The
//! [`SyncProduct`] therefore stores no matrices at all: it keeps references
//! (or owned copies) of its two operands plus the partition of their event
//! sets into shared and private labels, and resolves every query on demand.
//! A product state `q` encodes the pair `(q mod |Q_L|, q div |Q_L|)`.
//!
//! Transitions follow the usual synchronization rule: shared events need
//! both operands to move, private events move one operand and leave the
//! other in place. Since the operands are deterministic, so is the product.
//!
//! [`synchronize`] walks the reachable slice of a product and materializes
//! it as a concrete [`Automaton`].

use itertools::Itertools;

use crate::automaton::Automaton;
use crate::system::TransitionSystem;
use crate::{Event, Events, Result, State, StateSet};

/// Lazy composition view over two transition systems.
///
/// The operands may be concrete automata, references to them, or other
/// products, so `P || E || F` nests without materializing intermediate
/// systems. The view is immutable after construction; cloning yields another
/// handle onto the same operands.
#[derive(Debug, Clone)]
pub struct SyncProduct<L, R> {
    left: L,
    right: R,
    left_size: usize,
    size: usize,
    initial: State,
    marked: StateSet,
    events: Events,
    shared: Events,
    only_left: Events,
    only_right: Events,
}

impl<L: TransitionSystem, R: TransitionSystem> SyncProduct<L, R> {
    /// Builds the product view of `left` and `right`.
    ///
    /// # Panics
    /// If the virtual state count `|Q_L| * |Q_R|` does not fit the state
    /// index type.
    pub fn new(left: L, right: R) -> Self {
        let left_size = left.size();
        let size = (left_size as u64) * (right.size() as u64);
        assert!(size <= State::MAX as u64, "product of {left_size} and {} states overflows the index type", right.size());
        let size = size as usize;

        let shared = left.events() & right.events();
        let only_left = left.events() ^ shared;
        let only_right = right.events() ^ shared;
        let initial = if size == 0 {
            0
        } else {
            right.initial() * left_size as State + left.initial()
        };
        let marked = left
            .marked_states()
            .iter()
            .cartesian_product(right.marked_states().iter())
            .map(|(&l, &r)| r * left_size as State + l)
            .collect();
        let events = left.events() | right.events();
        Self {
            left,
            right,
            left_size,
            size,
            initial,
            marked,
            events,
            shared,
            only_left,
            only_right,
        }
    }

    /// The left operand.
    pub fn left(&self) -> &L {
        &self.left
    }

    /// The right operand.
    pub fn right(&self) -> &R {
        &self.right
    }

    /// Events occurring in both operands; these synchronize.
    pub fn shared_events(&self) -> Events {
        self.shared
    }

    /// Events private to the left operand.
    pub fn left_private_events(&self) -> Events {
        self.only_left
    }

    /// Events private to the right operand.
    pub fn right_private_events(&self) -> Events {
        self.only_right
    }

    /// Splits a product state into its `(left, right)` components.
    ///
    /// # Panics
    /// If `q` is outside the virtual state space.
    pub fn decompose(&self, q: State) -> (State, State) {
        self.assert_state(q);
        let n = self.left_size as State;
        (q % n, q / n)
    }

    fn compose(&self, left: State, right: State) -> State {
        right * self.left_size as State + left
    }

    fn assert_state(&self, q: State) {
        assert!((q as usize) < self.size, "state {q} outside {} virtual states", self.size);
    }

    /// Materializes the reachable slice of the product as a concrete
    /// automaton, with states renumbered densely in ascending order of their
    /// virtual index.
    pub fn materialize(&self) -> Result<Automaton> {
        if self.size == 0 {
            return Ok(Automaton::new(0, 0, []));
        }
        let mut seen: crate::math::Set<State> = crate::math::Set::default();
        let mut stack = vec![self.initial];
        seen.insert(self.initial);
        while let Some(q) = stack.pop() {
            for event in self.state_events(q).iter() {
                if let Some(target) = self.successor(q, event)? {
                    if seen.insert(target) {
                        stack.push(target);
                    }
                }
            }
        }
        let mut states: Vec<State> = seen.into_iter().collect();
        states.sort_unstable();
        materialize_states(self, &states)
    }
}

/// Builds a concrete automaton from the sorted `states` of `system`,
/// renumbered densely. Transitions whose target lies outside `states` are
/// dropped. The initial state must be contained.
pub(crate) fn materialize_states<S: TransitionSystem>(system: &S, states: &[State]) -> Result<Automaton> {
    let index_of = |q: State| {
        states
            .binary_search(&q)
            .expect("materialized state missing from the kept set") as State
    };
    let marked = states
        .iter()
        .enumerate()
        .filter(|&(_, &q)| system.is_marked(q))
        .map(|(i, _)| i as State);
    let mut automaton = Automaton::new(states.len(), index_of(system.initial()), marked.collect::<Vec<_>>());
    for (new_from, &q) in states.iter().enumerate() {
        for event in system.state_events(q).iter() {
            if let Some(target) = system.successor(q, event)? {
                if let Ok(new_to) = states.binary_search(&target) {
                    automaton.insert(new_from as State, new_to as State, event)?;
                }
            }
        }
    }
    automaton.make_compressed();
    Ok(automaton)
}

/// Synchronous composition: builds `left || right` and materializes its
/// reachable slice.
pub fn synchronize<L, R>(left: L, right: R) -> Result<Automaton>
where
    L: TransitionSystem,
    R: TransitionSystem,
{
    SyncProduct::new(left, right).materialize()
}

impl<L: TransitionSystem, R: TransitionSystem> TransitionSystem for SyncProduct<L, R> {
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
        let (ql, qr) = self.decompose(q);
        let out_l = self.left.state_events(ql);
        let out_r = self.right.state_events(qr);
        (out_l & out_r & self.shared) | (out_l & self.only_left) | (out_r & self.only_right)
    }

    fn inv_state_events(&self, q: State) -> Events {
        let (ql, qr) = self.decompose(q);
        let in_l = self.left.inv_state_events(ql);
        let in_r = self.right.inv_state_events(qr);
        (in_l & in_r & self.shared) | (in_l & self.only_left) | (in_r & self.only_right)
    }

    fn successor(&self, q: State, event: Event) -> Result<Option<State>> {
        let (ql, qr) = self.decompose(q);
        let in_l = self.left.enables(ql, event);
        let in_r = self.right.enables(qr, event);
        if in_l && in_r {
            match (self.left.successor(ql, event)?, self.right.successor(qr, event)?) {
                (Some(l), Some(r)) => Ok(Some(self.compose(l, r))),
                _ => Ok(None),
            }
        } else if in_l && self.only_left.contains(event) {
            Ok(self.left.successor(ql, event)?.map(|l| self.compose(l, qr)))
        } else if in_r && self.only_right.contains(event) {
            Ok(self.right.successor(qr, event)?.map(|r| self.compose(ql, r)))
        } else {
            Ok(None)
        }
    }

    fn predecessors(&self, q: State, event: Event) -> Result<Vec<State>> {
        let (ql, qr) = self.decompose(q);
        let in_l = self.left.coenables(ql, event);
        let in_r = self.right.coenables(qr, event);
        if in_l && in_r {
            let from_left = self.left.predecessors(ql, event)?;
            let from_right = self.right.predecessors(qr, event)?;
            Ok(from_left
                .iter()
                .cartesian_product(from_right.iter())
                .map(|(&l, &r)| self.compose(l, r))
                .collect())
        } else if in_l && self.only_left.contains(event) {
            Ok(self
                .left
                .predecessors(ql, event)?
                .into_iter()
                .map(|l| self.compose(l, qr))
                .collect())
        } else if in_r && self.only_right.contains(event) {
            Ok(self
                .right
                .predecessors(qr, event)?
                .into_iter()
                .map(|r| self.compose(ql, r))
                .collect())
        } else {
            Ok(Vec::new())
        }
    }

    fn allocate_inv_graph(&self) -> Result<()> {
        self.left.allocate_inv_graph()?;
        self.right.allocate_inv_graph()
    }

    fn clear_inv_graph(&self) {
        self.left.clear_inv_graph();
        self.right.clear_inv_graph();
    }
}
