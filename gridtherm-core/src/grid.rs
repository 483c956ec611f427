//! Grid geometry
//!
//! Positions are addressed row-major: index `i` maps to row `i / cols`,
//! column `i % cols`. The learning order follows the same indexing.

use core::fmt;

use gridtherm_hal::StorageKey;

/// Upper bound on `rows * cols`
pub const MAX_POSITIONS: usize = 64;

/// Errors constructing a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GridError {
    /// A dimension is zero
    Empty,
    /// `rows * cols` exceeds [`MAX_POSITIONS`]
    TooLarge,
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::Empty => f.write_str("grid dimensions must be non-zero"),
            GridError::TooLarge => write!(f, "grid exceeds {} positions", MAX_POSITIONS),
        }
    }
}

/// Grid dimensions, fixed for the lifetime of a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GridSize {
    rows: u8,
    cols: u8,
}

impl Default for GridSize {
    fn default() -> Self {
        Self::REFERENCE
    }
}

impl GridSize {
    /// Reference deployment: 3 rows of 7 sensors
    pub const REFERENCE: GridSize = GridSize { rows: 3, cols: 7 };

    /// Create a grid size, validating the dimensions
    pub fn new(rows: u8, cols: u8) -> Result<Self, GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::Empty);
        }
        if usize::from(rows) * usize::from(cols) > MAX_POSITIONS {
            return Err(GridError::TooLarge);
        }
        Ok(Self { rows, cols })
    }

    pub const fn rows(self) -> u8 {
        self.rows
    }

    pub const fn cols(self) -> u8 {
        self.cols
    }

    /// Number of positions (`rows * cols`)
    pub const fn len(self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Position for a row-major index
    pub fn position(self, index: usize) -> Option<GridPosition> {
        if index >= self.len() {
            return None;
        }
        let cols = usize::from(self.cols);
        Some(GridPosition {
            row: (index / cols) as u8,
            col: (index % cols) as u8,
        })
    }

    /// Row-major index of a position
    pub fn index_of(self, position: GridPosition) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        Some(usize::from(position.row) * usize::from(self.cols) + usize::from(position.col))
    }

    pub fn contains(self, position: GridPosition) -> bool {
        position.row < self.rows && position.col < self.cols
    }

    /// All positions in row-major order
    pub fn positions(self) -> impl Iterator<Item = GridPosition> {
        (0..self.len()).filter_map(move |index| self.position(index))
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// One cell of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GridPosition {
    pub row: u8,
    pub col: u8,
}

impl GridPosition {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Storage key of the identity assigned to this position
    pub const fn mapping_key(self) -> StorageKey {
        StorageKey::MappingSlot {
            row: self.row,
            col: self.col,
        }
    }

    /// Storage key of the calibration offset of this position
    pub const fn calibration_key(self) -> StorageKey {
        StorageKey::CalibrationOffset {
            row: self.row,
            col: self.col,
        }
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}
