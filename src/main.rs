use anyhow::Result;
use clap::Parser;
use forkwatch::{ScanMode, SimEvent, Simulation};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Forkwatch - Dining-Philosophers Simulator With An Online Deadlock Monitor"
)]
struct Cli {
    /// Number of agents (and forks) at the table
    #[arg(short, long, default_value_t = 5)]
    agents: usize,

    /// Upper bound on one thinking phase, in milliseconds
    #[arg(long, default_value_t = 10)]
    thinking_max: u64,

    /// Upper bound on one eating phase, in milliseconds
    #[arg(long, default_value_t = 100)]
    eating_max: u64,

    /// Seed for the per-agent duration rngs
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Hold a lock across each deadlock scan instead of best-effort snapshots
    #[arg(long)]
    locked_scan: bool,

    /// Stop after this many seconds (runs forever when omitted)
    #[arg(short, long)]
    duration: Option<u64>,

    /// Write the structured event stream to this JSON-lines file
    #[arg(short, long)]
    log_file: Option<PathBuf>,
}

/// Render one event the way the classic trace does
fn render(event: &SimEvent) {
    match event {
        SimEvent::Thinking { agent, duration_ms } => {
            println!("{agent} is thinking for {duration_ms}ms");
        }
        SimEvent::Eating { agent, duration_ms } => {
            println!("{agent} is EATING for {duration_ms}ms");
        }
        SimEvent::TableSnapshot { holding } => {
            let markers: Vec<String> = holding.iter().map(|m| m.to_string()).collect();
            println!("[ {} ]", markers.join(" "));
        }
        SimEvent::DeadlockDetected {
            agent,
            resource,
            cycle,
        } => {
            let path: Vec<String> = cycle.iter().map(|n| n.to_string()).collect();
            println!(
                "Deadlock detected (before acquire of resource {resource} by agent {agent}): {}",
                path.join(" -> ")
            );
        }
        SimEvent::Releasing { agent } => {
            println!(" {agent} returning forks");
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let scan_mode = if cli.locked_scan {
        ScanMode::Locked
    } else {
        ScanMode::BestEffort
    };

    let mut sim = Simulation::new()
        .agents(cli.agents)
        .thinking_max(cli.thinking_max)
        .eating_max(cli.eating_max)
        .seed(cli.seed)
        .scan_mode(scan_mode)
        .on_event(|event| render(&event));
    if let Some(path) = &cli.log_file {
        sim = sim.with_log(path);
    }

    let handle = sim.start()?;

    match cli.duration {
        Some(secs) => {
            thread::sleep(Duration::from_secs(secs));
            handle.request_stop();
            handle.join()?;
        }
        // Non-terminating by design: runs until the process is killed
        None => handle.join()?,
    }
    Ok(())
}
