//! # Forkwatch
//!
//! A dining-philosophers simulator with an online deadlock monitor.
//!
//! N agents on N forks in a ring, each needing both neighboring forks to
//! eat. Before every blocking acquire the agent records its request in a
//! shared resource-allocation graph and the monitor scans a snapshot of the
//! graph for a circular wait. The monitor reports what it finds and
//! prevents nothing: a genuine deadlock still hangs, it just hangs
//! announced.
//!
//! ## Features
//!
//! - Resource-allocation graph shared lock-free between agents and monitor
//! - Deterministic wait-for cycle detection over graph snapshots
//! - Structured event stream with optional JSON-lines logging
//! - Cooperative stop for bounded runs; unbounded by default

mod core;
pub use core::{
    ScanMode, Simulation, SimulationHandle,
    agent::{left, right},
    graph::{AllocationGraph, GraphSnapshot},
    monitor::DeadlockMonitor,
    resources::ResourceSet,
    types::{AgentId, EdgeState, HoldMarker, ResourceId, SimEvent, WaitNode},
};
