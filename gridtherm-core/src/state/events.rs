//! Events that trigger mode transitions

/// Events that can trigger mode transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Boot events
    /// A complete mapping was restored from storage
    MappingLoaded,
    /// No usable mapping in storage
    MappingMissing,

    // Learning events
    /// Every grid position has been assigned
    LearningComplete,

    // Operator events
    /// Operator cleared the mapping (RESET)
    MappingCleared,
}
