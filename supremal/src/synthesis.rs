//! Monolithic supervisor synthesis.
//!
//! [`supc`] computes the supremal controllable and nonblocking sublanguage
//! of `plant || spec` with respect to a set of uncontrollable events. The
//! composition is never materialized during the search: a depth-first walk
//! over the lazy product classifies states as alive or bad, where a state is
//! bad when the plant enables an uncontrollable event there that the
//! composition disables. Bad states are contagious along uncontrollable
//! edges, so discovering one triggers a reverse search that kills every
//! ancestor reachable through uncontrollable transitions alone. A final
//! backward pass from the marked states discards alive states that can no
//! longer reach marking, and the survivors are emitted as a concrete
//! automaton.

use tracing::{debug, warn};

use crate::automaton::Automaton;
use crate::math;
use crate::sync::{materialize_states, SyncProduct};
use crate::system::TransitionSystem;
use crate::{Error, Events, Result, State};

/// Synthesizes the supremal controllable sublanguage of `plant || spec`.
///
/// `uncontrollable` holds the event codes the supervisor may never disable;
/// only those actually occurring in the systems take part. When every state
/// of the composition is pruned, a warning is logged and the zero-state
/// automaton is returned.
///
/// Both operands must be compressed. The search allocates the operands'
/// inverse graphs for its reverse passes and releases them before
/// returning.
pub fn supc<L, R>(plant: L, spec: R, uncontrollable: Events) -> Result<Automaton>
where
    L: TransitionSystem,
    R: TransitionSystem,
{
    let product = SyncProduct::new(plant, spec);
    if product.size() == 0 {
        warn!("supervisor synthesis over an empty composition");
        return Ok(Automaton::new(0, 0, []));
    }
    product.allocate_inv_graph()?;

    // uncontrollable events restricted to those that can actually occur
    let bad_events = uncontrollable & product.events();
    let plant_uncontrollable = uncontrollable & product.left().events();

    let mut alive: math::Set<State> = math::Set::default();
    let mut dead: math::Set<State> = math::Set::default();
    let mut stack = vec![product.initial()];
    while let Some(q) = stack.pop() {
        if alive.contains(&q) || dead.contains(&q) {
            continue;
        }
        let (plant_state, _) = product.decompose(q);
        let enabled = product.state_events(q);
        let is_bad = plant_uncontrollable
            .iter()
            .any(|event| product.left().enables(plant_state, event) && !enabled.contains(event));
        if is_bad {
            remove_bad_states(&product, q, bad_events, &mut alive, &mut dead)?;
        } else {
            alive.insert(q);
            for event in enabled.iter() {
                if let Some(target) = product.successor(q, event)? {
                    if !alive.contains(&target) && !dead.contains(&target) {
                        stack.push(target);
                    }
                }
            }
        }
    }

    let kept = nonblocking_slice(&product, &alive)?;
    product.clear_inv_graph();
    debug!(
        explored = alive.len() + dead.len(),
        pruned = dead.len(),
        kept = kept.len(),
        "supervisor synthesis finished"
    );

    match materialize_supervisor(&product, &kept) {
        Err(Error::EmptyComposition) => {
            warn!("supervisor synthesis pruned every state; returning the empty automaton");
            Ok(Automaton::new(0, 0, []))
        }
        result => result,
    }
}

/// Reverse search from a freshly discovered bad state: every ancestor
/// reachable through uncontrollable transitions alone cannot be saved by
/// disabling anything, so it dies too.
fn remove_bad_states<L, R>(
    product: &SyncProduct<L, R>,
    origin: State,
    bad_events: Events,
    alive: &mut math::Set<State>,
    dead: &mut math::Set<State>,
) -> Result<()>
where
    L: TransitionSystem,
    R: TransitionSystem,
{
    let mut stack = vec![origin];
    while let Some(q) = stack.pop() {
        if !dead.insert(q) {
            continue;
        }
        alive.swap_remove(&q);
        for event in bad_events.iter() {
            if product.coenables(q, event) {
                for predecessor in product.predecessors(q, event)? {
                    if !dead.contains(&predecessor) {
                        stack.push(predecessor);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Backward pass from the marked alive states, following only predecessors
/// that are themselves alive; whatever it does not reach cannot be marked
/// anymore and is discarded.
fn nonblocking_slice<L, R>(
    product: &SyncProduct<L, R>,
    alive: &math::Set<State>,
) -> Result<math::Set<State>>
where
    L: TransitionSystem,
    R: TransitionSystem,
{
    let mut kept: math::Set<State> = math::Set::default();
    let mut stack: Vec<State> = Vec::new();
    for &marked in product.marked_states() {
        if alive.contains(&marked) && kept.insert(marked) {
            stack.push(marked);
        }
    }
    while let Some(q) = stack.pop() {
        for event in product.inv_state_events(q).iter() {
            for predecessor in product.predecessors(q, event)? {
                if alive.contains(&predecessor) && kept.insert(predecessor) {
                    stack.push(predecessor);
                }
            }
        }
    }
    Ok(kept)
}

fn materialize_supervisor<L, R>(
    product: &SyncProduct<L, R>,
    kept: &math::Set<State>,
) -> Result<Automaton>
where
    L: TransitionSystem,
    R: TransitionSystem,
{
    let mut states: Vec<State> = kept.iter().copied().collect();
    states.sort_unstable();
    if states.binary_search(&product.initial()).is_err() {
        return Err(Error::EmptyComposition);
    }
    materialize_states(product, &states)
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    const C: Event = 0;
    const U1: Event = 1;
    const U2: Event = 2;

    #[test]
    fn uncontrollable_loop_survives_in_full() {
        // one machine cycling start/finish; the specification only ever talks
        // about the controllable start, so nothing is bad
        let plant = Automaton::builder(2)
            .marked([0])
            .edges([(0, 1, C), (1, 0, U1)])
            .build()
            .unwrap();
        let spec = Automaton::builder(1).marked([0]).edges([(0, 0, C)]).build().unwrap();

        let supervisor = supc(&plant, &spec, Events::singleton(U1)).unwrap();
        assert_eq!(supervisor.size(), 2);
        assert_eq!(supervisor.graph().nnz(), 2);
        assert_eq!(supervisor.successor(0, C).unwrap(), Some(1));
        assert_eq!(supervisor.successor(1, U1).unwrap(), Some(0));
    }

    #[test]
    fn uncontrollable_chain_is_pruned_back_to_a_controllable_gate() {
        // after the controllable first step, two uncontrollable events follow;
        // the specification forbids the last one, so the whole chain behind it
        // dies and the supervisor keeps the gate closed
        let plant = Automaton::builder(4)
            .marked([0, 3])
            .edges([(0, 1, C), (1, 2, U1), (2, 3, U2)])
            .build()
            .unwrap();
        let spec = Automaton::builder(2).marked([0]).edges([(1, 1, U2)]).build().unwrap();

        let supervisor = supc(&plant, &spec, [U1, U2].into_iter().collect()).unwrap();
        assert_eq!(supervisor.size(), 1);
        assert_eq!(supervisor.graph().nnz(), 0);
        assert_eq!(supervisor.marked_states(), &[0].into_iter().collect());
    }

    #[test]
    fn bad_initial_state_yields_the_empty_supervisor() {
        let plant = Automaton::builder(2)
            .marked([0])
            .edges([(0, 1, U1), (1, 0, C)])
            .build()
            .unwrap();
        // the specification knows the uncontrollable event but never enables
        // it where it matters
        let spec = Automaton::builder(2).marked([0]).edges([(1, 1, U1)]).build().unwrap();

        let supervisor = supc(&plant, &spec, Events::singleton(U1)).unwrap();
        assert_eq!(supervisor.size(), 0);
        assert_eq!(supervisor.graph().nnz(), 0);
        assert!(supervisor.marked_states().is_empty());
    }
}
