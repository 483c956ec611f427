//! Operating mode state machine
//!
//! The device is either learning its sensor layout or measuring. The mode
//! is explicit, finite and deterministic; every change goes through
//! [`Mode::transition`].

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::Mode;
