//! Mode definition

use super::events::Event;

/// Operating modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Storage not yet consulted
    Boot,
    /// Assigning sensors to positions from warming gestures
    Learning,
    /// Sampling and reporting with a complete mapping
    Normal,
}

impl Mode {
    /// Check if sampling and reporting may run
    pub fn measuring(&self) -> bool {
        matches!(self, Mode::Normal)
    }

    /// Check if learning steps may run
    pub fn learning(&self) -> bool {
        matches!(self, Mode::Learning)
    }

    /// Process an event and return the next mode
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use Mode::*;

        match (self, event) {
            (Boot, MappingLoaded) => Normal,
            (Boot, MappingMissing) => Learning,

            (Learning, LearningComplete) => Normal,

            // RESET restarts learning from any mode
            (_, MappingCleared) => Learning,

            // Default: stay in current mode
            _ => self,
        }
    }
}
