//! Per-tick vehicle management for the supervisor
//!
//! Gate permission, the snapshot update pass, pruning of finished cars and
//! the deadlock arbiter. Kept apart from the world so the world only
//! coordinates clocks, lifecycle and events.

use log::{debug, warn};
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

use super::car::{CarSnapshot, DriveContext, SimCar};
use super::config::DriverTuning;
use super::geometry::Layout;
use super::signal::SignalState;
use super::types::{CarId, Position, RoadClass};

/// Whether the signal lets this car move.
///
/// Cars already inside the box must clear it and are never gated. Outside
/// the box a car is held only while standing in its stop zone without
/// green. A class/approach pair with no stop zone or no branch is held.
pub fn gate_for(car: &SimCar, signal: &SignalState, layout: &Layout) -> bool {
    if layout.in_footprint(&car.position) {
        return true;
    }

    let Some(stop_zone) = layout.stop_zone(car.class, car.approach) else {
        debug!(
            "No stop zone for {:?} car from {:?}, holding car {:?}",
            car.class, car.approach, car.id
        );
        return false;
    };

    let branch = car.approach.branch();
    if car.class == RoadClass::Secondary && branch.is_none() {
        debug!(
            "Secondary car {:?} from {:?} has no signal branch, holding it",
            car.id, car.approach
        );
        return false;
    }

    !(stop_zone.contains(&car.position) && !signal.grants(car.class, branch))
}

/// Update every car against the positions all cars had before this tick
pub fn update_cars(cars: &mut BTreeMap<CarId, SimCar>, signal: &SignalState, ctx: &DriveContext) {
    let snapshot: Vec<CarSnapshot> = cars.values().map(SimCar::snapshot).collect();
    let gates: Vec<bool> = cars
        .values()
        .map(|car| gate_for(car, signal, ctx.layout))
        .collect();

    for (car, gate_open) in cars.values_mut().zip(gates) {
        car.update(gate_open, &snapshot, ctx);
    }
}

/// Remove every car whose cursor reached the end of its route
pub fn prune_finished(cars: &mut BTreeMap<CarId, SimCar>) -> Vec<CarId> {
    let finished: Vec<CarId> = cars
        .values()
        .filter(|car| car.is_finished())
        .map(|car| car.id)
        .collect();

    for id in &finished {
        cars.remove(id);
    }
    finished
}

/// Deadlock arbiter.
///
/// Looks for cars knotted together in the core of the box. When at least two
/// are stuck, the one farthest from the centre (closest to getting out) gets
/// forced priority and its blocked counter is reset. Returns the car that was
/// marked, if any.
pub fn resolve_deadlocks(
    cars: &mut BTreeMap<CarId, SimCar>,
    layout: &Layout,
    tuning: &DriverTuning,
) -> Option<CarId> {
    let stuck: Vec<(OrderedFloat<f32>, CarId)> = cars
        .values()
        .filter(|car| {
            layout.in_core(&car.position)
                && car.speed < tuning.stuck_speed
                && car.blocked_ticks > tuning.deadlock_ticks
        })
        .map(|car| (OrderedFloat(layout.distance_to_center(&car.position)), car.id))
        .collect();

    if stuck.len() < 2 {
        return None;
    }

    let (_, winner_id) = stuck.into_iter().max()?;
    let winner = cars.get_mut(&winner_id)?;
    if winner.forced_priority {
        return None;
    }

    warn!(
        "Deadlock arbiter: car {:?} ordered to clear the intersection",
        winner.id
    );
    winner.forced_priority = true;
    winner.blocked_ticks = 0;
    Some(winner.id)
}

/// No car within `radius` of a spawn point
pub fn spawn_area_clear(cars: &BTreeMap<CarId, SimCar>, spawn: &Position, radius: f32) -> bool {
    let radius_sq = radius * radius;
    cars.values()
        .all(|car| car.position.distance_squared(spawn) >= radius_sq)
}
