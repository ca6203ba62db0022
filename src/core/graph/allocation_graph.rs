//! Resource-allocation graph shared by all agent threads
//!
//! The graph is a fixed-shape agents x resources matrix of edge states.
//! Each agent mutates only its own row; the monitor reads the whole matrix.
//! Cells are atomic so row writers and the full-matrix reader coexist
//! without a lock, at the cost of the snapshot being a best-effort
//! point-in-time copy rather than a linearizable one.
//!
//! Raw cell addresses never leave this module; all access goes through the
//! `(agent, resource)` indexed methods.

use crate::core::types::{AgentId, EdgeState, ResourceId};
use std::sync::atomic::{AtomicU8, Ordering};

/// Shared edge matrix between agents and resources
pub struct AllocationGraph {
    agents: usize,
    resources: usize,
    cells: Vec<AtomicU8>,
}

impl AllocationGraph {
    /// Create a graph with every edge set to `EdgeState::None`
    ///
    /// The shape is fixed for the lifetime of the graph. The matrix may be
    /// rectangular; the dining simulation always wires it square.
    pub fn new(agents: usize, resources: usize) -> Self {
        let mut cells = Vec::with_capacity(agents * resources);
        cells.resize_with(agents * resources, || AtomicU8::new(EdgeState::None as u8));
        AllocationGraph {
            agents,
            resources,
            cells,
        }
    }

    /// Number of agent rows
    pub fn agents(&self) -> usize {
        self.agents
    }

    /// Number of resource columns
    pub fn resources(&self) -> usize {
        self.resources
    }

    fn cell(&self, agent: AgentId, resource: ResourceId) -> &AtomicU8 {
        assert!(agent < self.agents && resource < self.resources);
        &self.cells[agent * self.resources + resource]
    }

    /// Record that `agent` has asked for `resource` and is about to block
    ///
    /// Contract: the previous edge state is `None`. Marking a request twice
    /// without an intervening [`clear`](Self::clear) is a logic fault in the
    /// caller, checked only in debug builds.
    pub fn mark_requested(&self, agent: AgentId, resource: ResourceId) {
        let prev = self
            .cell(agent, resource)
            .swap(EdgeState::Requested as u8, Ordering::Release);
        debug_assert_eq!(EdgeState::from_u8(prev), EdgeState::None);
    }

    /// Record that `agent` now holds `resource`
    ///
    /// Contract: called only after the resource's semaphore permit has been
    /// acquired, so at most one agent ever holds an `Allocated` edge to a
    /// given resource.
    pub fn mark_allocated(&self, agent: AgentId, resource: ResourceId) {
        let prev = self
            .cell(agent, resource)
            .swap(EdgeState::Allocated as u8, Ordering::Release);
        debug_assert_eq!(EdgeState::from_u8(prev), EdgeState::Requested);
    }

    /// Reset the edge to `None` on release
    pub fn clear(&self, agent: AgentId, resource: ResourceId) {
        let prev = self
            .cell(agent, resource)
            .swap(EdgeState::None as u8, Ordering::Release);
        debug_assert_eq!(EdgeState::from_u8(prev), EdgeState::Allocated);
    }

    /// Read one edge
    pub fn edge(&self, agent: AgentId, resource: ResourceId) -> EdgeState {
        EdgeState::from_u8(self.cell(agent, resource).load(Ordering::Acquire))
    }

    /// Copy the current matrix into an immutable snapshot for the monitor
    ///
    /// Concurrent writers may race individual cells; the snapshot is advisory
    /// unless the caller serializes it against mutation (see `ScanMode`).
    pub fn snapshot(&self) -> GraphSnapshot {
        let edges = self
            .cells
            .iter()
            .map(|c| EdgeState::from_u8(c.load(Ordering::Acquire)))
            .collect();
        GraphSnapshot {
            agents: self.agents,
            resources: self.resources,
            edges,
        }
    }
}

/// Immutable copy of the allocation matrix at one point in time
///
/// This is what the monitor scans; a fixed snapshot always yields the same
/// detection answer.
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    agents: usize,
    resources: usize,
    edges: Vec<EdgeState>,
}

impl GraphSnapshot {
    /// Number of agent rows
    pub fn agents(&self) -> usize {
        self.agents
    }

    /// Number of resource columns
    pub fn resources(&self) -> usize {
        self.resources
    }

    /// Edge state for one (agent, resource) pair
    pub fn edge(&self, agent: AgentId, resource: ResourceId) -> EdgeState {
        self.edges[agent * self.resources + resource]
    }

    /// Resources `agent` is currently requesting, in ascending resource id
    pub fn requests(&self, agent: AgentId) -> impl Iterator<Item = ResourceId> + '_ {
        (0..self.resources).filter(move |&r| self.edge(agent, r) == EdgeState::Requested)
    }

    /// Agent currently holding `resource`, if any
    ///
    /// Scans the column in ascending agent id; the allocation invariant
    /// guarantees at most one match.
    pub fn holder(&self, resource: ResourceId) -> Option<AgentId> {
        (0..self.agents).find(|&a| self.edge(a, resource) == EdgeState::Allocated)
    }
}
