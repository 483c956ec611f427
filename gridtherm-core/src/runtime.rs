//! Process-wide runtime state
//!
//! Everything that outlives a single learning poll or sampling cycle lives
//! here and is owned by the scheduler. Components receive the parts they
//! need by reference.

use crate::calibration::CalibrationTable;
use crate::config::Settings;
use crate::grid::GridSize;
use crate::learning::LearningSession;
use crate::mapping::Mapping;
use crate::sampler::Snapshot;
use crate::state::Mode;

/// Shared runtime context
#[derive(Debug, Clone)]
pub struct Runtime {
    pub mode: Mode,
    pub mapping: Mapping,
    pub calibration: CalibrationTable,
    pub settings: Settings,
    /// Effective sampling/reporting period; a remote directive changes it
    /// without touching the stored setting
    pub interval_s: u32,
    /// Present only while learning
    pub session: Option<LearningSession>,
    pub last_snapshot: Option<Snapshot>,
}

impl Runtime {
    /// Fresh context before storage has been consulted
    pub fn new(size: GridSize, settings: Settings) -> Self {
        Self {
            mode: Mode::Boot,
            mapping: Mapping::new(size),
            calibration: CalibrationTable::new(size),
            interval_s: settings.interval_s,
            settings,
            session: None,
            last_snapshot: None,
        }
    }

    pub fn grid(&self) -> GridSize {
        self.mapping.size()
    }

    /// Effective period in milliseconds
    pub fn interval_ms(&self) -> u64 {
        u64::from(self.interval_s) * 1000
    }
}
