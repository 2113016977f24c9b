// sojourner_sim/src/simulation/mod.rs

//! The headless simulation: scenario loading, terrain and camera synthesis,
//! and the drive loop that feeds frames through the perception core.

pub mod camera;
pub mod config;
pub mod prng;
pub mod runner;
pub mod terrain;
