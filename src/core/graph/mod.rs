//! Graph state for deadlock monitoring
//!
//! The allocation graph is the single piece of shared mutable state in the
//! simulation: agents write request/hold edges into it, the monitor reads
//! snapshots out of it.

mod allocation_graph;

pub use allocation_graph::{AllocationGraph, GraphSnapshot};
