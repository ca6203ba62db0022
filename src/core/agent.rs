//! Per-agent state machine
//!
//! Each agent runs on its own thread and cycles through
//! Thinking -> AcquiringLeft -> AcquiringRight -> Eating -> Releasing until
//! the cooperative stop flag is observed. The stop flag is polled only at
//! the thinking boundary, when the agent holds nothing, so a stopped
//! simulation never leaves a fork half-marked.
//!
//! Before every blocking acquire the agent marks its request edge and runs
//! the monitor over a fresh snapshot. A detected cycle is reported and then
//! ignored: the agent blocks anyway. With the ring mapping below, all N
//! agents grabbing their left fork first is exactly the classic circular
//! wait, and when it happens the simulation hangs by design.

use crate::core::monitor::DeadlockMonitor;
use crate::core::types::{AgentId, HoldMarker, ResourceId, SimEvent};
use crate::core::{ScanMode, Shared};
use crossbeam_channel::Sender;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

/// The fork to an agent's left: `(id + 1) mod N`
///
/// Every agent requests the same relatively-positioned fork first. This
/// offset is what makes the full circular wait reachable; changing it
/// changes which deadlocks exist at all.
///
/// `agents` must be nonzero; an empty table has no forks to map.
pub fn left(id: AgentId, agents: usize) -> ResourceId {
    debug_assert!(agents > 0, "ring mapping needs a nonempty table");
    (id + 1) % agents
}

/// The fork to an agent's right: its own id
///
/// `agents` must be nonzero, as for [`left`].
pub fn right(id: AgentId, agents: usize) -> ResourceId {
    debug_assert!(agents > 0, "ring mapping needs a nonempty table");
    id
}

/// One philosopher: owns its rng and its seat at the shared table
pub struct AgentLoop {
    id: AgentId,
    left: ResourceId,
    right: ResourceId,
    rng: StdRng,
    shared: Arc<Shared>,
    events: Sender<SimEvent>,
}

impl AgentLoop {
    /// Build the agent for seat `id`
    ///
    /// The rng is seeded from the simulation seed plus the agent id, so a
    /// fixed seed reproduces every agent's duration sequence.
    pub(crate) fn new(id: AgentId, shared: Arc<Shared>, events: Sender<SimEvent>) -> Self {
        let agents = shared.graph.agents();
        AgentLoop {
            id,
            left: left(id, agents),
            right: right(id, agents),
            rng: StdRng::seed_from_u64(shared.seed.wrapping_add(id as u64)),
            shared,
            events,
        }
    }

    /// Run the state machine until the stop flag is seen
    pub fn run(mut self) {
        while !self.shared.stop.load(Ordering::Acquire) {
            self.think();
            self.acquire(self.left);
            self.set_marker(HoldMarker::Left);
            self.acquire(self.right);
            self.set_marker(HoldMarker::Both);
            self.eat();
            self.put_down();
        }
    }

    fn emit(&self, event: SimEvent) {
        // The dispatcher may already be gone during shutdown
        let _ = self.events.send(event);
    }

    fn think(&mut self) {
        let duration_ms = self.rng.random_range(1..=self.shared.thinking_max);
        self.emit(SimEvent::Thinking {
            agent: self.id,
            duration_ms,
        });
        thread::sleep(Duration::from_millis(duration_ms));
    }

    fn eat(&mut self) {
        let duration_ms = self.rng.random_range(1..=self.shared.eating_max);
        self.emit(SimEvent::Eating {
            agent: self.id,
            duration_ms,
        });
        thread::sleep(Duration::from_millis(duration_ms));
    }

    /// Mark the request, scan for a circular wait, then block
    ///
    /// The scan result is advisory: a detected cycle is emitted to the sink
    /// and the acquire proceeds regardless. In `Locked` mode the scan lock
    /// spans only {mark, snapshot, scan}; it is released before the blocking
    /// acquire so a blocked agent never stalls other scanners.
    fn acquire(&mut self, resource: ResourceId) {
        let cycle = match self.shared.scan_mode {
            ScanMode::BestEffort => {
                self.shared.graph.mark_requested(self.id, resource);
                DeadlockMonitor::find_cycle(&self.shared.graph.snapshot())
            }
            ScanMode::Locked => {
                let _guard = self.shared.scan_lock.lock();
                self.shared.graph.mark_requested(self.id, resource);
                DeadlockMonitor::find_cycle(&self.shared.graph.snapshot())
            }
        };

        if let Some(cycle) = cycle {
            self.emit(SimEvent::DeadlockDetected {
                agent: self.id,
                resource,
                cycle,
            });
        }

        self.shared.resources.acquire(resource);
        self.shared.graph.mark_allocated(self.id, resource);
    }

    /// Clear both edges, then return both permits, left first
    ///
    /// Any release order is safe here since both forks are exclusively held;
    /// left-then-right matches the acquisition order for readability.
    fn put_down(&mut self) {
        self.emit(SimEvent::Releasing { agent: self.id });
        self.set_marker(HoldMarker::None);

        self.shared.graph.clear(self.id, self.left);
        self.shared.graph.clear(self.id, self.right);
        self.shared.resources.release(self.left);
        self.shared.resources.release(self.right);
    }

    /// Update this agent's marker and emit the whole table's state
    fn set_marker(&self, marker: HoldMarker) {
        let holding = {
            let mut table = self.shared.table.lock();
            table[self.id] = marker;
            table.clone()
        };
        self.emit(SimEvent::TableSnapshot { holding });
    }
}
