//! Cooperative control loop
//!
//! One [`Scheduler::tick`] polls three interval timers against the clock:
//!
//! - learning poll (while learning)
//! - measurement and report (while measuring)
//! - link supervision (always)
//!
//! The mode decides which of the first two may run, so a tick never
//! interleaves a learning step with a sample. Every collaborator call
//! blocks until it completes or fails on its own.

use log::{error, info, warn};

use gridtherm_hal::{Clock, Connectivity, DeviceIdentity, KeyValueStore, SensorBus, Transport};
use gridtherm_protocol::IntervalDirective;

use crate::config::{CONNECTIVITY_CHECK_MS, LEARN_POLL_MS};
use crate::grid::GridSize;
use crate::learning::{LearningSession, StepOutcome};
use crate::registry::SensorRegistry;
use crate::runtime::Runtime;
use crate::sampler::{sample, Snapshot};
use crate::state::{Event, Mode};
use crate::store::{load_calibration, load_mapping, load_settings, persist_mapping};
use crate::telemetry::{build_report, ReportError, Reporter};
use crate::timer::IntervalTimer;

/// Hardware collaborators handed to the scheduler at boot
pub struct Peripherals<B, T, N, S, I, K> {
    pub bus: B,
    pub transport: T,
    pub network: N,
    pub storage: S,
    pub identity: I,
    pub clock: K,
}

/// What one tick did
#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
    /// No timer was due
    Idle,
    /// A learning poll ran
    Learning(StepOutcome),
    /// A snapshot was taken and a report attempted
    Measured {
        valid: usize,
        report: Result<Option<IntervalDirective>, ReportError>,
    },
}

/// Top-level loop state
pub struct Scheduler<B, T, N, S, I, K> {
    pub(crate) runtime: Runtime,
    pub(crate) registry: SensorRegistry<B>,
    pub(crate) reporter: Reporter<T>,
    pub(crate) network: N,
    pub(crate) storage: S,
    identity: I,
    pub(crate) clock: K,
    pub(crate) learn_timer: IntervalTimer,
    pub(crate) measure_timer: IntervalTimer,
    link_timer: IntervalTimer,
}

impl<B, T, N, S, I, K> Scheduler<B, T, N, S, I, K>
where
    B: SensorBus,
    T: Transport,
    N: Connectivity,
    S: KeyValueStore,
    I: DeviceIdentity,
    K: Clock,
{
    /// Restore persisted state and enter the matching mode
    pub fn boot(size: GridSize, peripherals: Peripherals<B, T, N, S, I, K>) -> Self {
        let Peripherals {
            bus,
            transport,
            network,
            mut storage,
            identity,
            clock,
        } = peripherals;

        info!("Booting {} grid, device {}", size, identity.device_id());

        let registry = SensorRegistry::new(bus);
        let settings = load_settings(&mut storage);
        let mut runtime = Runtime::new(size, settings);
        runtime.mapping = load_mapping(&mut storage, size);
        runtime.calibration = load_calibration(&mut storage, size);

        let now = clock.now_ms();
        let mut scheduler = Self {
            learn_timer: IntervalTimer::new(LEARN_POLL_MS, now),
            measure_timer: IntervalTimer::new(runtime.interval_ms(), now),
            link_timer: IntervalTimer::new(CONNECTIVITY_CHECK_MS, now),
            runtime,
            registry,
            reporter: Reporter::new(transport),
            network,
            storage,
            identity,
            clock,
        };

        let event = if scheduler.runtime.mapping.is_complete() {
            Event::MappingLoaded
        } else {
            Event::MappingMissing
        };
        scheduler.runtime.mode = scheduler.runtime.mode.transition(event);
        if scheduler.runtime.mode.learning() {
            scheduler.start_learning();
        }

        scheduler.supervise_link();
        scheduler
    }

    /// Run whatever is due
    pub fn tick(&mut self) -> Activity {
        let now = self.clock.now_ms();

        if self.link_timer.poll(now) {
            self.supervise_link();
        }

        match self.runtime.mode {
            Mode::Learning if self.learn_timer.poll(now) => Activity::Learning(self.learn_step()),
            Mode::Normal if self.measure_timer.poll(now) => self.measure(now),
            _ => Activity::Idle,
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn mode(&self) -> Mode {
        self.runtime.mode
    }

    /// Most recent snapshot
    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.runtime.last_snapshot.as_ref()
    }

    pub fn registry(&self) -> &SensorRegistry<B> {
        &self.registry
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Consume the scheduler, returning the storage backend
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Start a new learning session over the current (empty) mapping
    pub(crate) fn start_learning(&mut self) {
        let size = self.runtime.grid();
        self.runtime.session = Some(LearningSession::start(size, &mut self.registry));
        self.runtime.last_snapshot = None;
        self.learn_timer.reset(self.clock.now_ms());
    }

    fn learn_step(&mut self) -> StepOutcome {
        let Some(session) = self.runtime.session.as_mut() else {
            warn!("Learning mode without a session, restarting");
            self.start_learning();
            return StepOutcome::NoSignal;
        };

        let outcome = session.step(&mut self.runtime.mapping, &mut self.registry);
        if let StepOutcome::Complete { .. } = outcome {
            self.finish_learning();
        }
        outcome
    }

    fn finish_learning(&mut self) {
        if let Err(e) = persist_mapping(&mut self.storage, &self.runtime.mapping) {
            // Mapping stays valid in memory until the next power cycle
            error!("Failed to save mapping: {}", e);
        }
        self.runtime.session = None;
        self.runtime.mode = self.runtime.mode.transition(Event::LearningComplete);
        self.measure_timer.reset(self.clock.now_ms());
        info!("Learning complete, measuring every {} s", self.runtime.interval_s);
    }

    fn measure(&mut self, now: u64) -> Activity {
        let snapshot = sample(
            &self.runtime.mapping,
            &self.runtime.calibration,
            &mut self.registry,
            now,
        );
        let valid = snapshot.valid_count();
        let report = self.report(&snapshot);
        self.runtime.last_snapshot = Some(snapshot);
        Activity::Measured { valid, report }
    }

    fn report(&mut self, snapshot: &Snapshot) -> Result<Option<IntervalDirective>, ReportError> {
        if !self.network.is_connected() {
            warn!("Report skipped: network offline");
            return Err(ReportError::Offline);
        }

        let report = build_report(snapshot, self.identity.device_id(), self.runtime.interval_s);
        let directive = self
            .reporter
            .send(&self.runtime.settings.network.server_url, &report)?;

        if let Some(directive) = directive {
            if directive.was_clamped() {
                warn!(
                    "Remote interval {} s raised to {} s",
                    directive.requested_s, directive.interval_s
                );
            }
            info!("Remote interval set to {} s", directive.interval_s);
            self.set_interval(directive.interval_s);
        }
        Ok(directive)
    }

    /// Change the effective sampling/reporting period
    pub(crate) fn set_interval(&mut self, interval_s: u32) {
        self.runtime.interval_s = interval_s;
        self.measure_timer.set_period(self.runtime.interval_ms());
    }

    fn supervise_link(&mut self) {
        if self.network.is_connected() {
            return;
        }
        let network = &self.runtime.settings.network;
        if !network.has_credentials() {
            return;
        }
        warn!("Network down, reconnecting to {}", network.ssid.as_str());
        self.network
            .reconnect(network.ssid.as_str(), network.password.as_str());
    }

    /// Start a reconnection with the current credentials
    pub(crate) fn reconnect(&mut self) {
        let network = &self.runtime.settings.network;
        if network.has_credentials() {
            self.network
                .reconnect(network.ssid.as_str(), network.password.as_str());
        }
    }
}
