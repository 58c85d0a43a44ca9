//! # Audio Module
//!
//! Demuxes audio tracks to determine their exact duration. The composed
//! video copies its duration from the value probed here.

pub mod probe;

pub use probe::{AudioProbe, TrackInfo};
