//! Auto-learning session
//!
//! The operator warms sensors one at a time in row-major order. Every poll
//! the session reads all discovered sensors and compares each against its
//! baseline; the first sensor (in enumeration order) that rose more than
//! [`LEARN_THRESHOLD_C`] is bound to the next free position.
//!
//! ```text
//!   start ──► capture baselines
//!               │
//!               ▼
//!   ┌──► poll: first id with diff > threshold?
//!   │      │ none ─────────────────────────────► NoSignal
//!   │      │ already mapped ───────────────────► Duplicate (no change)
//!   │      │ new ──► assign (n / C, n % C), rebase that id
//!   │      ▼
//!   └── n < R*C                n == R*C ──────► Complete
//! ```
//!
//! Only one assignment is made per poll, so two simultaneous touches are
//! never attributed to adjacent positions in the same tick.

use heapless::Vec;
use log::{debug, info, warn};

use gridtherm_hal::{BusError, SensorBus, SensorId, MAX_BUS_DEVICES};

use crate::config::LEARN_THRESHOLD_C;
use crate::grid::{GridPosition, GridSize};
use crate::mapping::Mapping;
use crate::registry::SensorRegistry;

/// Result of one learning poll
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepOutcome {
    /// No sensor crossed the threshold
    NoSignal,
    /// A sensor was bound to the next position
    Assigned {
        id: SensorId,
        position: GridPosition,
        diff: f32,
    },
    /// The warmed sensor is already mapped; nothing changed
    Duplicate {
        id: SensorId,
        existing: GridPosition,
        diff: f32,
    },
    /// The last position was bound; the mapping is complete
    Complete { id: SensorId, position: GridPosition },
    /// The conversion failed; the poll was skipped
    BusFault(BusError),
}

/// Transient state of one learning run
#[derive(Debug, Clone)]
pub struct LearningSession {
    size: GridSize,
    baselines: Vec<(SensorId, f32), MAX_BUS_DEVICES>,
    learned: usize,
}

impl LearningSession {
    /// Start a session, capturing one baseline per discovered sensor
    ///
    /// Sensors that cannot be read now get their baseline from their first
    /// successful read in a later poll.
    pub fn start<B: SensorBus>(size: GridSize, registry: &mut SensorRegistry<B>) -> Self {
        let mut session = Self {
            size,
            baselines: Vec::new(),
            learned: 0,
        };

        if let Err(e) = registry.convert() {
            warn!("Learning: baseline conversion failed: {}", e);
            return session;
        }

        let ids: Vec<SensorId, MAX_BUS_DEVICES> = registry.identities().iter().copied().collect();
        for id in ids {
            if let Ok(celsius) = registry.read(&id) {
                session.rebase(id, celsius);
            }
        }

        info!(
            "Learning started: {} positions, {} baselines, warm sensor at {}",
            size.len(),
            session.baselines.len(),
            GridPosition::new(0, 0)
        );
        session
    }

    /// Positions learned so far
    pub fn learned(&self) -> usize {
        self.learned
    }

    /// Positions still to learn
    pub fn remaining(&self) -> usize {
        self.size.len() - self.learned
    }

    pub fn is_complete(&self) -> bool {
        self.learned == self.size.len()
    }

    /// Position the operator should warm next
    pub fn next_position(&self) -> Option<GridPosition> {
        self.size.position(self.learned)
    }

    /// Baseline of a sensor, if captured
    pub fn baseline(&self, id: &SensorId) -> Option<f32> {
        self.baselines
            .iter()
            .find(|(known, _)| known == id)
            .map(|(_, celsius)| *celsius)
    }

    fn rebase(&mut self, id: SensorId, celsius: f32) {
        if let Some(entry) = self.baselines.iter_mut().find(|(known, _)| *known == id) {
            entry.1 = celsius;
        } else {
            // Registry holds at most MAX_BUS_DEVICES identities
            let _ = self.baselines.push((id, celsius));
        }
    }

    /// Run one poll against the partial mapping
    pub fn step<B: SensorBus>(
        &mut self,
        mapping: &mut Mapping,
        registry: &mut SensorRegistry<B>,
    ) -> StepOutcome {
        if self.is_complete() {
            return StepOutcome::NoSignal;
        }

        if let Err(e) = registry.convert() {
            warn!("Learning: conversion failed: {}", e);
            return StepOutcome::BusFault(e);
        }

        let mut candidate: Option<(SensorId, f32, f32)> = None;
        let ids: Vec<SensorId, MAX_BUS_DEVICES> = registry.identities().iter().copied().collect();
        for id in ids {
            let Ok(celsius) = registry.read(&id) else {
                continue;
            };
            let Some(baseline) = self.baseline(&id) else {
                self.rebase(id, celsius);
                continue;
            };
            let diff = celsius - baseline;
            if candidate.is_none() && diff > LEARN_THRESHOLD_C {
                candidate = Some((id, celsius, diff));
            }
        }

        let Some((id, celsius, diff)) = candidate else {
            return StepOutcome::NoSignal;
        };

        if let Some(existing) = mapping.position_of(&id) {
            warn!(
                "Learning: sensor {} already mapped at {} (+{}), touch ignored",
                id, existing, diff
            );
            return StepOutcome::Duplicate { id, existing, diff };
        }

        let Some(position) = self.next_position() else {
            return StepOutcome::NoSignal;
        };
        if let Err(e) = mapping.assign(position, id) {
            warn!("Learning: cannot assign {} to {}: {}", id, position, e);
            return StepOutcome::NoSignal;
        }
        self.learned += 1;
        self.rebase(id, celsius);

        if self.is_complete() {
            if let Err(e) = mapping.mark_complete() {
                warn!("Learning: mapping not complete: {}", e);
                return StepOutcome::NoSignal;
            }
            info!("Learning: sensor {} -> {}, all positions learned", id, position);
            return StepOutcome::Complete { id, position };
        }

        info!(
            "Learning: sensor {} -> {} (+{}), {} remaining",
            id,
            position,
            diff,
            self.remaining()
        );
        if let Some(next) = self.next_position() {
            debug!("Learning: warm sensor at {}", next);
        }
        StepOutcome::Assigned { id, position, diff }
    }
}
