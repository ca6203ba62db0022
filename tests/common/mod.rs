use forkwatch::{SimEvent, Simulation, SimulationHandle};
use std::sync::mpsc;
use std::time::{Duration, Instant};

#[allow(dead_code)]
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SimHarness {
    pub handle: SimulationHandle,
    pub rx: mpsc::Receiver<SimEvent>,
}

/// Start a simulation whose event stream is captured on a channel
pub fn start_sim(sim: Simulation) -> SimHarness {
    let (tx, rx) = mpsc::channel::<SimEvent>();
    let handle = sim
        .on_event(move |event| {
            let _ = tx.send(event);
        })
        .start()
        .expect("Failed to start simulation");
    SimHarness { handle, rx }
}

/// Collect events until `done` is satisfied by the events so far
///
/// Panics if the predicate is not satisfied within `timeout`.
#[allow(dead_code)]
pub fn collect_until<F>(h: &SimHarness, timeout: Duration, mut done: F) -> Vec<SimEvent>
where
    F: FnMut(&[SimEvent]) -> bool,
{
    let deadline = Instant::now() + timeout;
    let mut events = Vec::new();
    while !done(&events) {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .unwrap_or_else(|| panic!("condition not reached within {timeout:?}"));
        match h.rx.recv_timeout(remaining) {
            Ok(event) => events.push(event),
            Err(_) => panic!("condition not reached within {timeout:?}"),
        }
    }
    events
}

/// Drain whatever is still buffered on the channel
#[allow(dead_code)]
pub fn drain(h: &SimHarness, into: &mut Vec<SimEvent>) {
    while let Ok(event) = h.rx.try_recv() {
        into.push(event);
    }
}
