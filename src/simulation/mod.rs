//! Standalone intersection simulation module
//!
//! This module contains the signal controller, the vehicle agents and the
//! supervisor that ties them together. It runs without any renderer and can
//! be driven tick by tick from tests or the console runner.

mod car;
mod car_manager;
mod config;
mod geometry;
mod routing;
mod sensor;
mod signal;
mod strategy;
mod types;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use car::{CarSnapshot, CarUpdateResult, DriveContext, HoldReason, SimCar};
#[allow(unused_imports)]
pub use car_manager::{gate_for, prune_finished, resolve_deadlocks, spawn_area_clear, update_cars};
#[allow(unused_imports)]
pub use config::{DriverTuning, PhasePlan, SignalConfig, SimConfig, StrategyKind};
#[allow(unused_imports)]
pub use geometry::{Layout, Rect, SensorZone};
#[allow(unused_imports)]
pub use routing::{entry_point, exit_point, LaneGraph, Movement, RouteTable};
#[allow(unused_imports)]
pub use sensor::DemandSensor;
#[allow(unused_imports)]
pub use signal::{Phase, SensorEvent, SignalController, SignalSnapshot, SignalState};
#[allow(unused_imports)]
pub use strategy::{strategy_for, Adaptive, ControlStrategy, FixedTime};
#[allow(unused_imports)]
pub use types::{
    normalize_angle, Approach, Branch, CarId, Position, RoadClass, Route, TurnKind, Waypoint,
};
pub use world::{CarPose, SimEvent, SimStats, SimWorld, SpawnRequest, WorldSnapshot};
