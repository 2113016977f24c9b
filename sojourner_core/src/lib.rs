// sojourner_core/src/lib.rs

//! Camera-frame perception for a ground rover: terrain classification,
//! bird's-eye rectification, projection into a persistent world map, and a
//! polar summary of navigable terrain for steering.

// This file defines the public modules of the library.
pub mod config;
pub mod error;
pub mod frames;
pub mod image;
pub mod mapping;
pub mod messages;
pub mod perception;
pub mod pipeline;
pub mod prelude;
pub mod types;
