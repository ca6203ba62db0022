// Core types
pub mod types;
pub use types::*;

// Logging functionality
pub mod logger;

// Allocation graph
pub mod graph;

// Deadlock monitor
pub mod monitor;

// Binary semaphores for the forks
pub mod resources;

// Per-agent state machine
pub mod agent;

use crate::core::agent::AgentLoop;
use crate::core::graph::{AllocationGraph, GraphSnapshot};
use crate::core::logger::EventLogger;
use crate::core::resources::ResourceSet;
use anyhow::{Context, Result, anyhow, bail};
use crossbeam_channel::unbounded;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

/// How the pre-acquire deadlock scan is serialized against graph mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// No lock around {mark request, snapshot, scan}. The snapshot is an
    /// advisory point-in-time copy; concurrent writes during a scan may
    /// produce a missed or spurious cycle. This matches the monitor's role
    /// as telemetry rather than a correctness gate.
    #[default]
    BestEffort,
    /// One coarse lock held across {mark request, snapshot, scan}, released
    /// before the blocking acquire. Scans then see a consistent matrix, at
    /// the cost of serializing all agents' scans.
    Locked,
}

/// State shared by every agent thread
pub(crate) struct Shared {
    pub(crate) graph: AllocationGraph,
    pub(crate) resources: ResourceSet,
    /// Per-agent hold markers for the table snapshot events
    pub(crate) table: Mutex<Vec<HoldMarker>>,
    /// Cooperative stop flag, polled only at the thinking boundary
    pub(crate) stop: AtomicBool,
    /// Serializes scans in `ScanMode::Locked`; untouched otherwise
    pub(crate) scan_lock: Mutex<()>,
    pub(crate) scan_mode: ScanMode,
    pub(crate) thinking_max: u64,
    pub(crate) eating_max: u64,
    pub(crate) seed: u64,
}

/// Simulation configuration builder
///
/// Configures and starts the dining table: N agents on N forks in a ring,
/// with the deadlock monitor scanning before every blocking acquire.
///
/// # Example
///
/// ```no_run
/// use forkwatch::Simulation;
///
/// let handle = Simulation::new()
///     .agents(5)
///     .seed(0)
///     .on_event(|event| println!("{event:?}"))
///     .start()
///     .expect("invalid configuration");
///
/// std::thread::sleep(std::time::Duration::from_secs(1));
/// handle.stop().unwrap();
/// ```
pub struct Simulation {
    agents: usize,
    thinking_max: u64,
    eating_max: u64,
    seed: u64,
    scan_mode: ScanMode,
    log_path: Option<String>,
    callback: Option<Box<dyn Fn(SimEvent) + Send + 'static>>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    /// Create a simulation with the classic defaults
    ///
    /// Five agents, thinking bounded by 10ms, eating bounded by 100ms,
    /// seed 0, best-effort scanning, logging disabled, no callback.
    pub fn new() -> Self {
        Simulation {
            agents: 5,
            thinking_max: 10,
            eating_max: 100,
            seed: 0,
            scan_mode: ScanMode::BestEffort,
            log_path: None,
            callback: None,
        }
    }

    /// Set the number of agents (and forks; the table is always square)
    pub fn agents(mut self, agents: usize) -> Self {
        self.agents = agents;
        self
    }

    /// Upper bound on one thinking phase, in milliseconds
    pub fn thinking_max(mut self, ms: u64) -> Self {
        self.thinking_max = ms;
        self
    }

    /// Upper bound on one eating phase, in milliseconds
    pub fn eating_max(mut self, ms: u64) -> Self {
        self.eating_max = ms;
        self
    }

    /// Seed for the per-agent duration rngs
    ///
    /// A fixed seed reproduces every agent's duration sequence; thread
    /// interleaving stays up to the scheduler.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Choose how scans are serialized against graph mutation
    pub fn scan_mode(mut self, mode: ScanMode) -> Self {
        self.scan_mode = mode;
        self
    }

    /// Activate the JSON-lines event log at the given path
    pub fn with_log<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.log_path = Some(path.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Set a callback invoked on the dispatcher thread for every event
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(SimEvent) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Validate the configuration, spawn the agents, and return a handle
    ///
    /// # Errors
    /// Fails before any thread starts if the configuration is invalid
    /// (fewer than two agents, or a zero duration bound) or if the log file
    /// cannot be opened.
    pub fn start(self) -> Result<SimulationHandle> {
        if self.agents < 2 {
            bail!("simulation needs at least two agents, got {}", self.agents);
        }
        if self.thinking_max == 0 || self.eating_max == 0 {
            bail!("duration bounds must be at least 1ms");
        }

        let logger = match &self.log_path {
            Some(path) => {
                EventLogger::with_file(path).context("Failed to initialize event log")?
            }
            None => EventLogger::new(),
        };

        // Dispatcher: drains the event channel, writes the log, runs the
        // callback. A dedicated thread keeps the sink alive even when every
        // agent is deadlocked.
        let (tx, rx) = unbounded::<SimEvent>();
        let callback = self.callback;
        let dispatcher = thread::Builder::new()
            .name("forkwatch-sink".into())
            .spawn(move || {
                while let Ok(event) = rx.recv() {
                    logger.log_event(&event);
                    if let Some(cb) = &callback {
                        cb(event);
                    }
                }
            })
            .context("Failed to spawn dispatcher thread")?;

        let shared = Arc::new(Shared {
            graph: AllocationGraph::new(self.agents, self.agents),
            resources: ResourceSet::new(self.agents),
            table: Mutex::new(vec![HoldMarker::None; self.agents]),
            stop: AtomicBool::new(false),
            scan_lock: Mutex::new(()),
            scan_mode: self.scan_mode,
            thinking_max: self.thinking_max,
            eating_max: self.eating_max,
            seed: self.seed,
        });

        let mut agents = Vec::with_capacity(self.agents);
        for id in 0..self.agents {
            let agent = AgentLoop::new(id, Arc::clone(&shared), tx.clone());
            let handle = thread::Builder::new()
                .name(format!("agent-{id}"))
                .spawn(move || agent.run())
                .with_context(|| format!("Failed to spawn agent {id}"))?;
            agents.push(handle);
        }
        // The dispatcher exits once the last agent drops its sender
        drop(tx);

        Ok(SimulationHandle {
            shared,
            agents,
            dispatcher: Some(dispatcher),
        })
    }
}

/// Handle to a running simulation
///
/// Dropping the handle detaches the simulation: the agents keep running
/// until the process exits, which is the original unbounded behavior. Call
/// [`request_stop`](Self::request_stop) and [`join`](Self::join) (or
/// [`stop`](Self::stop)) for a bounded run.
pub struct SimulationHandle {
    shared: Arc<Shared>,
    agents: Vec<JoinHandle<()>>,
    dispatcher: Option<JoinHandle<()>>,
}

impl SimulationHandle {
    /// Number of agents at the table
    pub fn agents(&self) -> usize {
        self.shared.graph.agents()
    }

    /// Ask every agent to exit at its next thinking boundary
    ///
    /// Agents never stop mid-acquisition; one in its eating phase finishes
    /// the cycle and releases both forks before exiting.
    pub fn request_stop(&self) {
        self.shared.stop.store(true, Ordering::Release);
    }

    /// Point-in-time copy of the allocation graph
    pub fn graph_snapshot(&self) -> GraphSnapshot {
        self.shared.graph.snapshot()
    }

    /// Current per-agent hold markers
    pub fn table(&self) -> Vec<HoldMarker> {
        self.shared.table.lock().clone()
    }

    /// Number of forks whose permit is currently available
    ///
    /// Racy while agents run; exact once they have been joined.
    pub fn free_resources(&self) -> usize {
        (0..self.shared.resources.len())
            .filter(|&r| self.shared.resources.is_free(r))
            .count()
    }

    /// Wait for every agent and the dispatcher to finish
    ///
    /// Without a prior [`request_stop`](Self::request_stop) this blocks
    /// forever: the simulation is non-terminating by design. It also never
    /// returns if the agents are genuinely deadlocked; that liveness failure
    /// is the accepted terminal state, not an error.
    pub fn join(mut self) -> Result<()> {
        for handle in self.agents.drain(..) {
            handle.join().map_err(|_| anyhow!("agent thread panicked"))?;
        }
        if let Some(dispatcher) = self.dispatcher.take() {
            dispatcher
                .join()
                .map_err(|_| anyhow!("dispatcher thread panicked"))?;
        }
        Ok(())
    }

    /// Request a stop and join everything
    pub fn stop(self) -> Result<()> {
        self.request_stop();
        self.join()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_too_few_agents() {
        assert!(Simulation::new().agents(0).start().is_err());
        assert!(Simulation::new().agents(1).start().is_err());
    }

    #[test]
    fn test_rejects_zero_duration_bounds() {
        assert!(Simulation::new().thinking_max(0).start().is_err());
        assert!(Simulation::new().eating_max(0).start().is_err());
    }

    #[test]
    fn test_short_bounded_run_stops_cleanly() {
        let handle = Simulation::new()
            .agents(3)
            .thinking_max(2)
            .eating_max(2)
            .seed(7)
            .start()
            .unwrap();
        assert_eq!(handle.agents(), 3);

        std::thread::sleep(std::time::Duration::from_millis(50));
        handle.request_stop();
        // Joining implies no agent is stuck; markers and forks must be clean
        // after the last cycle completes, checked in the integration tests.
        handle.join().unwrap();
    }
}
