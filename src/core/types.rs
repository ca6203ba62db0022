use serde::{Deserialize, Serialize};
use std::fmt;

/// Agent identifier type
///
/// Identifies one philosopher thread in the simulation. Agent ids are dense,
/// in `[0, agents)`.
pub type AgentId = usize;

/// Resource identifier type
///
/// Identifies one fork on the table. Resource ids are dense, in
/// `[0, resources)`.
pub type ResourceId = usize;

/// State of one (agent, resource) edge in the allocation graph
///
/// The legal per-cell lifecycle is `None -> Requested -> Allocated -> None`;
/// only the owning agent's thread ever mutates a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EdgeState {
    /// No relation between the agent and the resource
    None = 0,
    /// The agent has asked for the resource but not yet obtained it
    Requested = 1,
    /// The agent currently holds the resource
    Allocated = 2,
}

impl EdgeState {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => EdgeState::Requested,
            2 => EdgeState::Allocated,
            _ => EdgeState::None,
        }
    }
}

/// A node in the bipartite wait-for view of the allocation graph
///
/// The monitor walks a single graph whose nodes are either agents or
/// resources; tagging the id keeps the traversal unified instead of running
/// two mutually recursive scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum WaitNode {
    Agent(AgentId),
    Resource(ResourceId),
}

impl fmt::Display for WaitNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitNode::Agent(id) => write!(f, "A{id}"),
            WaitNode::Resource(id) => write!(f, "R{id}"),
        }
    }
}

/// Per-agent marker for the table-state snapshot
///
/// Mirrors the classic trace: `-` holding nothing, `L` holding only the left
/// fork, `B` holding both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldMarker {
    #[serde(rename = "-")]
    None,
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "B")]
    Both,
}

impl fmt::Display for HoldMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            HoldMarker::None => '-',
            HoldMarker::Left => 'L',
            HoldMarker::Both => 'B',
        };
        write!(f, "{c}")
    }
}

/// Structured event emitted by the simulation core
///
/// Events from a single agent arrive in that agent's program order; no order
/// is guaranteed across agents. Textual rendering is the sink's concern, the
/// core only produces these values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    /// The agent entered its thinking phase for `duration_ms` milliseconds
    Thinking { agent: AgentId, duration_ms: u64 },
    /// The agent holds both forks and eats for `duration_ms` milliseconds
    Eating { agent: AgentId, duration_ms: u64 },
    /// Per-agent hold markers for the whole table, emitted after each
    /// acquisition and release
    TableSnapshot { holding: Vec<HoldMarker> },
    /// The monitor found a wait-for cycle while `agent` was about to block
    /// on `resource`
    ///
    /// Advisory only: the agent proceeds to block regardless. `cycle` is the
    /// node sequence of the detected circular wait.
    DeadlockDetected {
        agent: AgentId,
        resource: ResourceId,
        cycle: Vec<WaitNode>,
    },
    /// The agent put both forks back down
    Releasing { agent: AgentId },
}

impl SimEvent {
    /// Agent this event belongs to, if it is a per-agent event
    pub fn agent(&self) -> Option<AgentId> {
        match self {
            SimEvent::Thinking { agent, .. }
            | SimEvent::Eating { agent, .. }
            | SimEvent::DeadlockDetected { agent, .. }
            | SimEvent::Releasing { agent } => Some(*agent),
            SimEvent::TableSnapshot { .. } => None,
        }
    }
}
