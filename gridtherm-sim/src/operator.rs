//! Simulated operator
//!
//! Follows the learning prompts: whenever the firmware waits for a new
//! position, the operator puts a finger on the probe that physically sits
//! there.

use gridtherm_core::{GridPosition, Runtime};
use log::{info, warn};

use crate::bus::FieldHandle;

/// Heat a fingertip adds to a probe
pub const TOUCH_C: f32 = 3.0;

pub struct AutoOperator {
    field: FieldHandle,
    warmed: Option<GridPosition>,
}

impl AutoOperator {
    pub fn new(field: FieldHandle) -> Self {
        Self {
            field,
            warmed: None,
        }
    }

    /// Warm the position the learning session is waiting for, once
    pub fn assist(&mut self, runtime: &Runtime) {
        if !runtime.mode.learning() {
            self.warmed = None;
            return;
        }
        let Some(next) = runtime.session.as_ref().and_then(|s| s.next_position()) else {
            return;
        };
        if self.warmed == Some(next) {
            return;
        }
        self.warmed = Some(next);

        match self.field.warm(next, TOUCH_C) {
            Some(id) => info!("Operator: touching {} (probe {})", next, id),
            None => warn!("Operator: no probe at {}", next),
        }
    }
}
