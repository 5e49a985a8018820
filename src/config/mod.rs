//! Constants and defaults

pub mod defaults;
