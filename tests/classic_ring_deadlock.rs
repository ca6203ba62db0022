//! Deterministic reproduction of the classic circular wait
//!
//! Drives the real components from one thread: all five agents take their
//! left fork, then every agent files a request for its right fork. At that
//! point every fork is held by the requesting agent's neighbor, the monitor
//! must report the full ten-node ring, and reporting must change nothing.

use forkwatch::{AllocationGraph, DeadlockMonitor, EdgeState, ResourceSet, WaitNode, left, right};

const N: usize = 5;

#[test]
fn test_all_lefts_taken_forms_detectable_ring() {
    let graph = AllocationGraph::new(N, N);
    let forks = ResourceSet::new(N);

    // Every agent completes its AcquiringLeft phase
    for agent in 0..N {
        let fork = left(agent, N);
        graph.mark_requested(agent, fork);
        assert!(!DeadlockMonitor::detect(&graph.snapshot()));
        forks.acquire(fork);
        graph.mark_allocated(agent, fork);
    }
    // All five forks are now held
    for fork in 0..N {
        assert!(!forks.is_free(fork));
    }

    // Every agent marks its right-fork request, as it would just before
    // blocking. The last mark closes the circle.
    for agent in 0..N {
        graph.mark_requested(agent, right(agent, N));
    }

    let snapshot = graph.snapshot();
    let cycle = DeadlockMonitor::find_cycle(&snapshot).expect("ring must be detected");
    assert_eq!(cycle.len(), 2 * N, "cycle alternates all agents and forks");
    for agent in 0..N {
        assert!(cycle.contains(&WaitNode::Agent(agent)));
    }
    for fork in 0..N {
        assert!(cycle.contains(&WaitNode::Resource(fork)));
    }

    // Detection is advisory: nothing was rolled back or released
    for agent in 0..N {
        assert_eq!(snapshot.edge(agent, left(agent, N)), EdgeState::Allocated);
        assert_eq!(snapshot.edge(agent, right(agent, N)), EdgeState::Requested);
        assert!(!forks.is_free(left(agent, N)));
    }

    // A second scan of the same snapshot gives the same answer
    assert_eq!(DeadlockMonitor::find_cycle(&snapshot), Some(cycle));
}

#[test]
fn test_ring_without_one_request_is_cycle_free() {
    let graph = AllocationGraph::new(N, N);

    // Same table, except agent 0 never files its right-fork request
    for agent in 0..N {
        graph.mark_requested(agent, left(agent, N));
        graph.mark_allocated(agent, left(agent, N));
    }
    for agent in 1..N {
        graph.mark_requested(agent, right(agent, N));
    }

    assert!(!DeadlockMonitor::detect(&graph.snapshot()));
}

#[test]
fn test_one_release_unblocks_the_ring() {
    let graph = AllocationGraph::new(N, N);
    let forks = ResourceSet::new(N);

    for agent in 0..N {
        graph.mark_requested(agent, left(agent, N));
        forks.acquire(left(agent, N));
        graph.mark_allocated(agent, left(agent, N));
    }
    for agent in 0..N {
        graph.mark_requested(agent, right(agent, N));
    }
    assert!(DeadlockMonitor::detect(&graph.snapshot()));

    // Agent 2 gives its left fork back: its neighbor's wait can now be
    // satisfied and the circle is broken. Its own request stays pending.
    graph.clear(2, left(2, N));
    forks.release(left(2, N));

    assert!(!DeadlockMonitor::detect(&graph.snapshot()));
    assert!(forks.try_acquire(left(2, N)));
}
