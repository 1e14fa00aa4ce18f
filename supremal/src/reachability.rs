//! Reachability as sparse boolean linear algebra.
//!
//! Forward and backward searches run as fixpoints of a sparse matrix-matrix
//! product over the automaton's boolean shadow graph: the frontier is a
//! `|Q| x k` matrix with one column per seed state, and one multiplication
//! advances every search by one step at once. Because the shadow graph
//! carries an identity overlay, each step is monotone (previously reached
//! states stay reached), so the fixpoint is detected by the nonzero count
//! stabilizing instead of by tracking an explicit frontier. At most `|Q|`
//! iterations are needed.
//!
//! With rows indexing source states, one backward step is a plain product
//! with the shadow graph, while a forward step multiplies with its
//! transpose.

use tracing::trace;

use crate::automaton::Automaton;
use crate::{Events, Result, State, StateSet};
use supremal_core::sparse::{SparseBitMatrix, SparseMatrix};

/// Runs the multi-source reachability fixpoint on a step matrix and returns
/// every state touched by any of the searches.
pub(crate) fn reach_fixpoint(
    step: &SparseBitMatrix,
    seeds: impl IntoIterator<Item = State>,
) -> Result<StateSet> {
    let n = step.rows();
    let seeds: Vec<State> = seeds.into_iter().collect();
    let mut frontier = SparseBitMatrix::from_triplets(
        n,
        seeds.len(),
        seeds.iter().enumerate().map(|(col, &s)| (s, col as u32, true)),
    );

    let mut reached = 0usize;
    for _ in 0..n {
        let next = step.multiply(&frontier)?;
        let nnz = next.nnz();
        frontier = next;
        if nnz == reached {
            break;
        }
        reached = nnz;
        trace!(nnz, "reachability fixpoint step");
    }
    let result = frontier.nonempty_rows()?.collect();
    Ok(result)
}

impl Automaton {
    /// States reachable from the initial state along forward transitions.
    pub fn accessible_part(&self) -> Result<StateSet> {
        if self.size == 0 {
            return Ok(StateSet::new());
        }
        let forward = self.bit_graph.transpose()?;
        reach_fixpoint(&forward, [self.initial])
    }

    /// States from which some marked state is reachable. A marked state with
    /// no outgoing transitions is co-accessible by itself, courtesy of the
    /// identity overlay. Empty if no state is marked.
    pub fn coaccessible_part(&self) -> Result<StateSet> {
        reach_fixpoint(&self.bit_graph, self.marked.iter().copied())
    }

    /// States that are both accessible and co-accessible.
    pub fn trim_states(&self) -> Result<StateSet> {
        let accessible = self.accessible_part()?;
        let coaccessible = self.coaccessible_part()?;
        Ok(accessible.intersection(&coaccessible).copied().collect())
    }

    /// Restricts the automaton to its trim states in place, renumbering the
    /// survivors compactly in ascending order and rebuilding both matrices
    /// and every cache. With an empty marked set this empties the automaton.
    pub fn trim(&mut self) -> Result<&mut Self> {
        let keep = self.trim_states()?;
        if keep.len() == self.size {
            return Ok(self);
        }

        let mut map = vec![None::<State>; self.size];
        for (new, &old) in keep.iter().enumerate() {
            map[old as usize] = Some(new as State);
        }

        let size = keep.len();
        let mut state_events = vec![Events::new(); size];
        let mut inv_state_events = vec![Events::new(); size];
        let mut events = Events::new();
        let mut triplets = Vec::new();
        let mut bit_triplets: Vec<(u32, u32, bool)> = (0..size as u32).map(|i| (i, i, true)).collect();
        for (new_from, &old_from) in keep.iter().enumerate() {
            let new_from = new_from as u32;
            for (old_to, set) in self.graph.row_iter(old_from)? {
                if let Some(new_to) = map[old_to as usize] {
                    triplets.push((new_from, new_to, set));
                    bit_triplets.push((new_from, new_to, true));
                    events |= set;
                    state_events[new_from as usize] |= set;
                    inv_state_events[new_to as usize] |= set;
                }
            }
        }

        self.graph = SparseMatrix::from_triplets(size, size, triplets);
        self.bit_graph = SparseBitMatrix::from_triplets(size, size, bit_triplets);
        self.state_events = state_events;
        self.inv_state_events = inv_state_events;
        self.events = events;
        let marked: StateSet = self.marked.iter().filter_map(|&m| map[m as usize]).collect();
        self.marked = marked;
        self.initial = match map.get(self.initial as usize).copied().flatten() {
            Some(q) => q,
            // the initial state only ever drops out together with everything else
            None => {
                debug_assert!(size == 0, "initial state pruned from a nonempty trim");
                0
            }
        };
        self.size = size;
        self.inv_graph.borrow_mut().take();
        self.dirty.set(true);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    const A: Event = 0;
    const B: Event = 1;
    const G: Event = 2;

    fn branching() -> Automaton {
        Automaton::builder(4)
            .initial(0)
            .marked([0, 2])
            .edges([
                (0, 0, A),
                (0, 2, G),
                (1, 0, A),
                (1, 1, B),
                (2, 1, A),
                (2, 1, G),
                (2, 2, B),
                (2, 3, A),
            ])
            .build()
            .unwrap()
    }

    #[test]
    fn every_state_of_the_branching_graph_is_accessible() {
        let sys = branching();
        assert_eq!(sys.accessible_part().unwrap(), [0, 1, 2, 3].into_iter().collect());
        assert_eq!(sys.coaccessible_part().unwrap(), [0, 1, 2].into_iter().collect());
        assert_eq!(sys.trim_states().unwrap(), [0, 1, 2].into_iter().collect());
    }

    #[test]
    fn disconnected_successors_are_cut_both_ways() {
        let sys = Automaton::builder(4)
            .initial(0)
            .marked([0, 2])
            .edges([
                (0, 0, A),
                (0, 2, G),
                (1, 1, B),
                (2, 1, A),
                (2, 1, G),
                (2, 2, B),
                (3, 1, A),
                (3, 2, A),
            ])
            .build()
            .unwrap();
        assert_eq!(sys.accessible_part().unwrap(), [0, 1, 2].into_iter().collect());
        assert_eq!(sys.coaccessible_part().unwrap(), [0, 2, 3].into_iter().collect());
        assert_eq!(sys.trim_states().unwrap(), [0, 2].into_iter().collect());
    }

    #[test]
    fn marked_sink_is_coaccessible() {
        let sys = Automaton::builder(2).marked([1]).edges([(0, 1, A)]).build().unwrap();
        assert_eq!(sys.coaccessible_part().unwrap(), [0, 1].into_iter().collect());
    }

    #[test]
    fn trim_renumbers_and_preserves_edges() {
        let mut sys = branching();
        sys.trim().unwrap();

        assert_eq!(sys.size(), 3);
        assert_eq!(sys.initial(), 0);
        assert_eq!(sys.marked_states(), &[0, 2].into_iter().collect());
        assert_eq!(sys.edge(0, 0), Events::singleton(A));
        assert_eq!(sys.edge(0, 2), Events::singleton(G));
        assert_eq!(sys.edge(1, 0), Events::singleton(A));
        assert_eq!(sys.edge(1, 1), Events::singleton(B));
        // the later (2, 3, A) edge claimed A for itself, so only G remains here
        assert_eq!(sys.edge(2, 1), Events::singleton(G));
        assert_eq!(sys.edge(2, 2), Events::singleton(B));
        assert_eq!(sys.graph().nnz(), 6);

        // a trimmed automaton is fully accessible and co-accessible
        let all: StateSet = [0, 1, 2].into_iter().collect();
        assert_eq!(sys.accessible_part().unwrap(), all);
        assert_eq!(sys.coaccessible_part().unwrap(), all);
    }

    #[test]
    fn trim_is_idempotent() {
        let mut once = branching();
        once.trim().unwrap();
        let mut twice = once.clone();
        twice.trim().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_marking_trims_to_nothing() {
        let mut sys = Automaton::builder(2)
            .edges([(0, 1, A), (1, 0, B)])
            .build()
            .unwrap();
        assert_eq!(sys.coaccessible_part().unwrap(), StateSet::new());
        sys.trim().unwrap();
        assert_eq!(sys.size(), 0);
        assert_eq!(sys.graph().nnz(), 0);
        assert!(sys.marked_states().is_empty());
    }
}
