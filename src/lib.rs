//! Intersection Signal Simulation Library
//!
//! A single four-way intersection with an adaptive signal controller that can
//! run headless or feed any renderer.

pub mod render;
pub mod simulation;
pub mod spawner;
