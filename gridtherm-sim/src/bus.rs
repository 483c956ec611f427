//! Simulated sensor bus
//!
//! Probes sit at hidden grid positions with hidden serial numbers. The
//! firmware only ever sees identities; the simulated operator knows the
//! layout and can warm the probe at a position.

use std::cell::RefCell;
use std::rc::Rc;

use gridtherm_core::{GridPosition, GridSize};
use gridtherm_hal::{BusError, SensorBus, SensorId, MAX_BUS_DEVICES};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::FieldConfig;

/// Fraction of added heat kept per conversion
const HEAT_RETENTION: f32 = 0.8;

struct Probe {
    id: SensorId,
    position: GridPosition,
    bias_c: f32,
    heat_c: f32,
    attached: bool,
}

struct Field {
    ambient_c: f32,
    noise_c: f32,
    probes: Vec<Probe>,
    latched: Vec<(SensorId, f32)>,
    rng: StdRng,
}

/// Bus over the simulated probes
pub struct SimBus {
    field: Rc<RefCell<Field>>,
}

/// Operator-side access to the simulated probes
#[derive(Clone)]
pub struct FieldHandle {
    field: Rc<RefCell<Field>>,
}

impl SimBus {
    /// One probe per grid position, in shuffled bus order
    pub fn new(size: GridSize, config: &FieldConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut probes: Vec<Probe> = size
            .positions()
            .map(|position| {
                let mut serial = [0u8; 8];
                serial[0] = 0x28;
                rng.fill(&mut serial[1..]);
                Probe {
                    id: SensorId::new(serial),
                    position,
                    bias_c: rng.gen_range(-1.0f32..=1.0) * config.max_bias_c,
                    heat_c: 0.0,
                    attached: true,
                }
            })
            .collect();

        probes.shuffle(&mut rng);

        for position in config.unplugged_positions() {
            if let Some(probe) = probes.iter_mut().find(|p| p.position == position) {
                probe.attached = false;
            }
        }

        let field = Field {
            ambient_c: config.ambient_c,
            noise_c: config.noise_c,
            probes,
            latched: Vec::new(),
            rng,
        };
        Self {
            field: Rc::new(RefCell::new(field)),
        }
    }

    pub fn handle(&self) -> FieldHandle {
        FieldHandle {
            field: self.field.clone(),
        }
    }
}

impl FieldHandle {
    /// Add heat to the probe at a position, as a fingertip would
    pub fn warm(&self, position: GridPosition, delta_c: f32) -> Option<SensorId> {
        let mut field = self.field.borrow_mut();
        let probe = field.probes.iter_mut().find(|p| p.position == position)?;
        probe.heat_c += delta_c;
        Some(probe.id)
    }

    /// Hidden position of a probe
    #[cfg(test)]
    pub fn position_of(&self, id: &SensorId) -> Option<GridPosition> {
        let field = self.field.borrow();
        field
            .probes
            .iter()
            .find(|p| p.id == *id)
            .map(|p| p.position)
    }
}

impl SensorBus for SimBus {
    fn discover(&mut self) -> heapless::Vec<SensorId, MAX_BUS_DEVICES> {
        let field = self.field.borrow();
        field
            .probes
            .iter()
            .filter(|p| p.attached)
            .map(|p| p.id)
            .take(MAX_BUS_DEVICES)
            .collect()
    }

    fn request_conversion(&mut self) -> Result<(), BusError> {
        let mut field = self.field.borrow_mut();
        let Field {
            ambient_c,
            noise_c,
            probes,
            latched,
            rng,
        } = &mut *field;

        latched.clear();
        for probe in probes.iter_mut().filter(|p| p.attached) {
            let celsius = *ambient_c + probe.bias_c + probe.heat_c + rng.gen_range(-1.0f32..=1.0) * *noise_c;
            latched.push((probe.id, celsius));
            probe.heat_c *= HEAT_RETENTION;
        }
        debug!("Converted {} probes", latched.len());
        Ok(())
    }

    fn read_celsius(&mut self, id: &SensorId) -> Result<f32, BusError> {
        let field = self.field.borrow();
        field
            .latched
            .iter()
            .find(|(known, _)| known == id)
            .map(|(_, celsius)| *celsius)
            .ok_or(BusError::Disconnected)
    }
}
