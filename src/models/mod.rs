//! Domain models

pub mod roster;

pub use roster::*;
