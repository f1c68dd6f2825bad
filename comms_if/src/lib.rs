//! # Communications interface crate.
//!
//! Provides the interfaces shared between the sequence engine, the motion-control service and
//! whatever front-end raises intents and displays events.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Intent messages raised by the front-end (or a script) towards the engine
pub mod tc;

/// Capability set of the equipment (motion-control service) driven by the engine
pub mod eqpt;

/// Events produced by the engine for the front-end
pub mod tm;
