//! Host simulator for the gridtherm sensor-grid firmware
//!
//! Runs the real scheduler against a simulated probe field, a loopback
//! telemetry endpoint and a state file standing in for flash. Console
//! commands are read from stdin.
//!
//! # Extra commands
//!
//! | Command          | Action                              |
//! |------------------|-------------------------------------|
//! | `TOUCH <r> <c>`  | Warm the probe at a grid position   |
//! | `QUIT`           | Exit                                |
//!
//! Everything else goes to the firmware console (`HELP` lists it).

mod bus;
mod config;
mod net;
mod operator;
mod storage;

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use log::info;

use gridtherm_core::store::save_settings;
use gridtherm_core::{Activity, GridPosition, Peripherals, Scheduler, Snapshot, TemperatureSample};
use gridtherm_hal::{Clock, DeviceIdentity, KeyValueStore, StorageKey};

use bus::{FieldHandle, SimBus};
use config::SimConfig;
use net::{LoopbackTransport, SimLink};
use operator::{AutoOperator, TOUCH_C};
use storage::FileStore;

/// Real time between loop iterations
const LOOP_PERIOD: Duration = Duration::from_millis(10);

#[derive(Debug, Parser)]
#[command(author, version, about = "Gridtherm host simulator")]
struct Cli {
    /// Simulator configuration file
    #[arg(long, short, default_value = "gridtherm-sim.toml")]
    config: PathBuf,
    /// State file, overriding the configuration
    #[arg(long)]
    state: Option<PathBuf>,
    /// Do not warm probes automatically while learning
    #[arg(long)]
    manual: bool,
}

/// Simulated time running `speed` times faster than the host clock
struct ScaledClock {
    start: Instant,
    speed: u64,
}

impl Clock for ScaledClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64 * self.speed
    }
}

struct SimIdentity(String);

impl DeviceIdentity for SimIdentity {
    fn device_id(&self) -> &str {
        &self.0
    }
}

type SimScheduler =
    Scheduler<SimBus, LoopbackTransport, SimLink, FileStore, SimIdentity, ScaledClock>;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = if cli.config.exists() {
        SimConfig::load(&cli.config)?
    } else {
        info!("No {} found, using defaults", cli.config.display());
        SimConfig::default()
    };
    let size = config.grid_size()?;

    let state_file = cli.state.unwrap_or_else(|| config.run.state_file.clone());
    let mut storage = FileStore::open(&state_file);
    if !storage.exists(StorageKey::Settings) {
        save_settings(&mut storage, &config.network.initial_settings()?)
            .map_err(|e| anyhow::anyhow!("seeding settings: {}", e))?;
    }

    let bus = SimBus::new(size, &config.field);
    let field = bus.handle();
    let mut scheduler: SimScheduler = Scheduler::boot(
        size,
        Peripherals {
            bus,
            transport: LoopbackTransport::new(&config.network.response),
            network: SimLink::default(),
            storage,
            identity: SimIdentity(config.run.device_id.clone()),
            clock: ScaledClock {
                start: Instant::now(),
                speed: u64::from(config.run.speed),
            },
        },
    );

    let mut operator = (config.run.auto_learn && !cli.manual).then(|| AutoOperator::new(field.clone()));
    let lines = spawn_stdin();
    println!("gridtherm-sim: {} grid, type HELP or QUIT", size);

    loop {
        while let Ok(line) = lines.try_recv() {
            if !handle_line(&mut scheduler, &field, &line)? {
                return Ok(());
            }
        }

        if let Some(operator) = operator.as_mut() {
            operator.assist(scheduler.runtime());
        }

        if let Activity::Measured { .. } = scheduler.tick() {
            if let Some(snapshot) = scheduler.last_snapshot() {
                print_snapshot(snapshot);
            }
        }

        std::thread::sleep(LOOP_PERIOD);
    }
}

/// Forward stdin lines to the loop
fn spawn_stdin() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Returns `false` when the simulator should exit
fn handle_line(scheduler: &mut SimScheduler, field: &FieldHandle, line: &str) -> Result<bool> {
    let mut words = line.split_whitespace();
    match words.next() {
        Some(word) if word.eq_ignore_ascii_case("QUIT") => return Ok(false),
        Some(word) if word.eq_ignore_ascii_case("TOUCH") => {
            let row = words.next().and_then(|w| w.parse().ok());
            let col = words.next().and_then(|w| w.parse().ok());
            match (row, col) {
                (Some(row), Some(col)) => {
                    let position = GridPosition::new(row, col);
                    match field.warm(position, TOUCH_C) {
                        Some(_) => println!("Touched {}", position),
                        None => println!("ERROR: no probe at {}", position),
                    }
                }
                _ => println!("ERROR: usage TOUCH <row> <col>"),
            }
        }
        _ => {
            let mut reply = String::new();
            scheduler.handle_line(line, &mut reply)?;
            print!("{}", reply);
        }
    }
    Ok(true)
}

fn print_snapshot(snapshot: &Snapshot) {
    let size = snapshot.size();
    for row in 0..size.rows() {
        let cells: Vec<String> = snapshot
            .row(row)
            .iter()
            .map(|sample| match sample {
                TemperatureSample::Valid(celsius) => format!("{:6.2}", celsius),
                TemperatureSample::Invalid => "    --".to_string(),
            })
            .collect();
        println!("{}", cells.join(" "));
    }
    match snapshot.statistics() {
        Some(stats) => println!(
            "min {:.2} max {:.2} avg {:.2} ({} valid)",
            stats.min_temp, stats.max_temp, stats.avg_temp, stats.valid_readings
        ),
        None => println!("no valid readings"),
    }
}
