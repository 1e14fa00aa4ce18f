//! Generator for a family of linear cluster-tool benchmarks.
//!
//! A cluster tool is a line of processing clusters, each served by its own
//! robot, with a one-slot buffer between neighboring clusters. Robot `i`
//! alternates between a controllable `load` action and an uncontrollable
//! `unload`; the buffer specification between clusters `i` and `i + 1` fills
//! on `unload(i)` and drains on `load(i + 1)`, so the control problem is to
//! keep robots from unloading into occupied buffers. The generated family
//! scales the supervisor-synthesis workload by the number of clusters while
//! staying analytically tractable: with two clusters the supremal
//! supervisor has exactly 6 states and 8 transitions.

use crate::automaton::Automaton;
use crate::{Event, Events, Result};

/// A generated benchmark instance: the robot plants, the buffer
/// specifications, and the uncontrollable event codes.
#[derive(Debug, Clone)]
pub struct ClusterTool {
    /// One two-state robot automaton per cluster.
    pub plants: Vec<Automaton>,
    /// One two-state buffer automaton between each pair of neighbors.
    pub specs: Vec<Automaton>,
    /// The `unload` events; the supervisor may not disable these.
    pub uncontrollable: Events,
}

/// Event code of the controllable load action of cluster `i`.
pub fn load(i: usize) -> Event {
    (2 * i) as Event
}

/// Event code of the uncontrollable unload action of cluster `i`.
pub fn unload(i: usize) -> Event {
    (2 * i + 1) as Event
}

/// Generates the benchmark instance with `clusters` clusters, using only the
/// public constructor and edge API.
///
/// # Panics
/// If `clusters` is zero or its event codes would not fit [`Event`].
pub fn generate(clusters: usize) -> Result<ClusterTool> {
    assert!(clusters >= 1, "a cluster tool needs at least one cluster");
    assert!(2 * clusters - 1 <= Event::MAX as usize, "event codes for {clusters} clusters overflow the event type");

    let mut plants = Vec::with_capacity(clusters);
    for i in 0..clusters {
        plants.push(
            Automaton::builder(2)
                .marked([0])
                .edges([(0, 1, load(i)), (1, 0, unload(i))])
                .build()?,
        );
    }

    let mut specs = Vec::with_capacity(clusters - 1);
    for i in 0..clusters - 1 {
        specs.push(
            Automaton::builder(2)
                .marked([0])
                .edges([(0, 1, unload(i)), (1, 0, load(i + 1))])
                .build()?,
        );
    }

    let uncontrollable = (0..clusters).map(unload).collect();
    Ok(ClusterTool { plants, specs, uncontrollable })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn two_clusters_have_the_expected_shape() {
        let ClusterTool { plants, specs, uncontrollable } = generate(2).unwrap();
        assert_eq!(plants.len(), 2);
        assert_eq!(specs.len(), 1);
        assert_eq!(uncontrollable, [1, 3].into_iter().collect());

        for (i, plant) in plants.iter().enumerate() {
            assert_eq!(plant.size(), 2);
            assert_eq!(plant.successor(0, load(i)).unwrap(), Some(1));
            assert_eq!(plant.successor(1, unload(i)).unwrap(), Some(0));
            assert_eq!(plant.marked_states(), &[0].into_iter().collect());
        }
        let buffer = &specs[0];
        assert_eq!(buffer.successor(0, unload(0)).unwrap(), Some(1));
        assert_eq!(buffer.successor(1, load(1)).unwrap(), Some(0));
    }
}
