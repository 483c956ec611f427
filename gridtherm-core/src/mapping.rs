//! Position to sensor mapping
//!
//! A mapping is either partial (being learned) or complete. A complete
//! mapping assigns a distinct identity to every position of its grid.

use core::fmt;

use heapless::Vec;

use gridtherm_hal::SensorId;

use crate::grid::{GridPosition, GridSize, MAX_POSITIONS};

/// Errors mutating a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MappingError {
    /// Position outside the grid
    OutOfBounds(GridPosition),
    /// Identity already assigned elsewhere
    Duplicate { existing: GridPosition },
    /// Position already holds an identity
    Occupied(GridPosition),
    /// Not every position is assigned
    Incomplete,
    /// Mapping is frozen
    AlreadyComplete,
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::OutOfBounds(position) => write!(f, "position {} outside grid", position),
            MappingError::Duplicate { existing } => {
                write!(f, "sensor already mapped at {}", existing)
            }
            MappingError::Occupied(position) => write!(f, "position {} already assigned", position),
            MappingError::Incomplete => f.write_str("mapping incomplete"),
            MappingError::AlreadyComplete => f.write_str("mapping already complete"),
        }
    }
}

/// Grid position to sensor identity table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    size: GridSize,
    slots: Vec<Option<SensorId>, MAX_POSITIONS>,
    complete: bool,
}

impl Mapping {
    /// Empty mapping for a grid
    pub fn new(size: GridSize) -> Self {
        let mut slots = Vec::new();
        // len() <= MAX_POSITIONS by construction of GridSize
        slots.resize(size.len(), None).ok();
        Self {
            size,
            slots,
            complete: false,
        }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Identity assigned to a position
    pub fn get(&self, position: GridPosition) -> Option<SensorId> {
        let index = self.size.index_of(position)?;
        self.slots.get(index).copied().flatten()
    }

    /// Position holding an identity
    pub fn position_of(&self, id: &SensorId) -> Option<GridPosition> {
        let index = self.slots.iter().position(|slot| slot.as_ref() == Some(id))?;
        self.size.position(index)
    }

    pub fn contains(&self, id: &SensorId) -> bool {
        self.position_of(id).is_some()
    }

    /// Number of assigned positions
    pub fn assigned_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Assign an identity to a free position
    pub fn assign(&mut self, position: GridPosition, id: SensorId) -> Result<(), MappingError> {
        if self.complete {
            return Err(MappingError::AlreadyComplete);
        }
        let index = self
            .size
            .index_of(position)
            .ok_or(MappingError::OutOfBounds(position))?;
        if let Some(existing) = self.position_of(&id) {
            return Err(MappingError::Duplicate { existing });
        }
        if self.slots[index].is_some() {
            return Err(MappingError::Occupied(position));
        }
        self.slots[index] = Some(id);
        Ok(())
    }

    /// Freeze the mapping once every position is assigned
    pub fn mark_complete(&mut self) -> Result<(), MappingError> {
        if self.slots.iter().any(Option::is_none) {
            return Err(MappingError::Incomplete);
        }
        self.complete = true;
        Ok(())
    }

    /// Every position with its identity, row-major
    pub fn iter(&self) -> impl Iterator<Item = (GridPosition, Option<SensorId>)> + '_ {
        self.size
            .positions()
            .zip(self.slots.iter().copied())
    }

    /// Assigned positions only, row-major
    pub fn assigned(&self) -> impl Iterator<Item = (GridPosition, SensorId)> + '_ {
        self.iter()
            .filter_map(|(position, id)| id.map(|id| (position, id)))
    }
}
