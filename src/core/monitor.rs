//! Online deadlock monitor
//!
//! Scans a [`GraphSnapshot`] for a wait-for cycle. The snapshot is modeled
//! as a bipartite directed graph: `Agent(i) -> Resource(j)` when agent `i`
//! has a `Requested` edge on `j`, and `Resource(j) -> Agent(i)` when agent
//! `i` holds `j`. A cycle in that graph is a circular wait.
//!
//! The scan is depth-first over a single tagged node type, starting from
//! each unvisited agent in ascending id order and following edges in
//! ascending id order, so a fixed snapshot always yields the same answer.
//!
//! Detection is advisory telemetry: a positive result is reported to the
//! sink and nothing else happens. The caller still blocks on its acquire,
//! so a real deadlock detected here still deadlocks.

use crate::core::graph::GraphSnapshot;
use crate::core::types::WaitNode;

/// Stateless wait-for-cycle scanner over graph snapshots
pub struct DeadlockMonitor;

impl DeadlockMonitor {
    /// Return true iff the snapshot contains a wait-for cycle
    pub fn detect(snapshot: &GraphSnapshot) -> bool {
        Self::find_cycle(snapshot).is_some()
    }

    /// Find a wait-for cycle and return its node sequence
    ///
    /// The returned nodes are the cycle in traversal order, starting at the
    /// first node the scan re-entered. Returns `None` when the snapshot is
    /// cycle-free.
    pub fn find_cycle(snapshot: &GraphSnapshot) -> Option<Vec<WaitNode>> {
        let mut scan = Scan::new(snapshot);
        for agent in 0..snapshot.agents() {
            let node = WaitNode::Agent(agent);
            if !scan.visited(node) && scan.visit(node) {
                return Some(scan.into_cycle());
            }
        }
        None
    }
}

/// One traversal over a snapshot
///
/// Both marker sets are keyed by a flattened node index: agents occupy
/// `[0, agents)`, resources `[agents, agents + resources)`. The sets live
/// only for the duration of one `find_cycle` call.
struct Scan<'a> {
    snap: &'a GraphSnapshot,
    visited: Vec<bool>,
    on_path: Vec<bool>,
    path: Vec<WaitNode>,
    /// Node the depth-first walk re-entered, set when a cycle closes
    reentry: Option<WaitNode>,
}

impl<'a> Scan<'a> {
    fn new(snap: &'a GraphSnapshot) -> Self {
        let nodes = snap.agents() + snap.resources();
        Scan {
            snap,
            visited: vec![false; nodes],
            on_path: vec![false; nodes],
            path: Vec::new(),
            reentry: None,
        }
    }

    fn index(&self, node: WaitNode) -> usize {
        match node {
            WaitNode::Agent(id) => id,
            WaitNode::Resource(id) => self.snap.agents() + id,
        }
    }

    fn visited(&self, node: WaitNode) -> bool {
        self.visited[self.index(node)]
    }

    /// Depth-first visit, true iff a cycle closes under this node
    fn visit(&mut self, node: WaitNode) -> bool {
        let idx = self.index(node);
        if self.on_path[idx] {
            self.reentry = Some(node);
            return true;
        }
        if self.visited[idx] {
            return false;
        }
        self.visited[idx] = true;
        self.on_path[idx] = true;
        self.path.push(node);

        let found = match node {
            WaitNode::Agent(agent) => {
                // Follow every outstanding request, ascending resource id
                let mut found = false;
                for resource in self.snap.requests(agent) {
                    if self.visit(WaitNode::Resource(resource)) {
                        found = true;
                        break;
                    }
                }
                found
            }
            WaitNode::Resource(resource) => {
                // A resource points at its single holder, if it has one
                match self.snap.holder(resource) {
                    Some(holder) => self.visit(WaitNode::Agent(holder)),
                    None => false,
                }
            }
        };

        if !found {
            self.on_path[idx] = false;
            self.path.pop();
        }
        found
    }

    /// Extract the cycle from the path stack after `visit` returned true
    fn into_cycle(self) -> Vec<WaitNode> {
        let reentry = self
            .reentry
            .unwrap_or_else(|| unreachable!("into_cycle called without a closed cycle"));
        let start = self
            .path
            .iter()
            .position(|&n| n == reentry)
            .unwrap_or_else(|| unreachable!("reentry node is on the path by construction"));
        self.path[start..].to_vec()
    }
}
