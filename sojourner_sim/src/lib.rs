// sojourner_sim/src/lib.rs

//! Headless harness for `sojourner_core`: loads a scenario, synthesizes
//! camera frames from a seeded terrain and drives the perception pipeline
//! with them.

// This prelude is for convenience for other files WITHIN the sojourner_sim crate.
pub mod prelude;

pub mod cli;
pub mod error;
pub mod simulation;
