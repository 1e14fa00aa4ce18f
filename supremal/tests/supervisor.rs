//! End-to-end supervisor synthesis over the cluster-tool benchmark:
//! generate the family, fold the plants and specifications with the
//! synchronous composition, trim, synthesize, and check the result against
//! the analytical expectations.

use supremal::prelude::*;

fn fold_synchronize(mut systems: Vec<Automaton>) -> Automaton {
    let mut result = systems.remove(0);
    for next in systems {
        result = synchronize(&result, &next).unwrap();
    }
    result
}

/// Walks the supervisor and the plant/spec composition in lockstep,
/// asserting that the supervisor never disables an uncontrollable event the
/// plant enables, and that its language stays inside the composition.
fn assert_controllable_and_contained(
    supervisor: &Automaton,
    plant: &Automaton,
    spec: &Automaton,
    uncontrollable: Events,
    check_controllability: bool,
) {
    let composition = SyncProduct::new(plant, spec);
    let mut seen = std::collections::BTreeSet::new();
    let mut stack = vec![(supervisor.initial(), composition.initial())];
    seen.insert((supervisor.initial(), composition.initial()));
    while let Some((s, v)) = stack.pop() {
        let enabled = supervisor.state_events(s);
        let (plant_state, _) = composition.decompose(v);

        // containment: everything the supervisor does, the composition does
        assert_eq!(enabled & composition.state_events(v), enabled);
        assert_eq!(supervisor.is_marked(s), composition.is_marked(v));
        // and everything the supervisor does, the plant can do
        for event in enabled.iter() {
            assert!(plant.events().contains(event));
            assert!(plant.enables(plant_state, event));
        }

        if check_controllability {
            for event in (uncontrollable & plant.state_events(plant_state)).iter() {
                assert!(
                    enabled.contains(event),
                    "supervisor disables uncontrollable event {event} at state {s}"
                );
            }
        }

        for event in enabled.iter() {
            let next_s = supervisor.successor(s, event).unwrap().unwrap();
            let next_v = composition.successor(v, event).unwrap().unwrap();
            if seen.insert((next_s, next_v)) {
                stack.push((next_s, next_v));
            }
        }
    }
}

#[test]
fn two_cluster_supervisor_matches_the_analytical_result() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let ClusterTool { plants, specs, uncontrollable } = cluster_tool::generate(2).unwrap();

    let mut plant = fold_synchronize(plants);
    let mut spec = fold_synchronize(specs);
    plant.trim().unwrap();
    spec.trim().unwrap();

    // two independent robots interleave freely
    assert_eq!(plant.size(), 4);
    assert_eq!(plant.graph().nnz(), 8);
    assert_eq!(spec.size(), 2);

    let supervisor = supc(&plant, &spec, uncontrollable).unwrap();
    assert_eq!(supervisor.size(), 6);
    assert_eq!(supervisor.graph().nnz(), 8);

    assert_controllable_and_contained(&supervisor, &plant, &spec, uncontrollable, true);
}

#[test]
fn three_cluster_supervisor_terminates_and_stays_inside_the_plant() {
    let ClusterTool { plants, specs, uncontrollable } = cluster_tool::generate(3).unwrap();

    let mut plant = fold_synchronize(plants);
    let mut spec = fold_synchronize(specs);
    plant.trim().unwrap();
    spec.trim().unwrap();
    assert_eq!(plant.size(), 8);
    assert_eq!(spec.size(), 4);

    let supervisor = supc(&plant, &spec, uncontrollable).unwrap();
    assert!(supervisor.size() > 0);
    assert_controllable_and_contained(&supervisor, &plant, &spec, uncontrollable, false);
}

#[test]
fn supervised_behavior_is_reachable_and_nonblocking() {
    let ClusterTool { plants, specs, uncontrollable } = cluster_tool::generate(2).unwrap();

    let plant = fold_synchronize(plants);
    let spec = fold_synchronize(specs);
    let supervisor = supc(&plant, &spec, uncontrollable).unwrap();

    let all: StateSet = (0..supervisor.size() as State).collect();
    assert_eq!(supervisor.accessible_part().unwrap(), all);
    assert_eq!(supervisor.coaccessible_part().unwrap(), all);
}
