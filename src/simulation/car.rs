//! Vehicle agent for the intersection simulation
//!
//! Each car decides locally whether it may accelerate this tick (signal gate,
//! neighbours, downstream exit) and then integrates its motion along its
//! route. Neighbours are seen through read-only snapshots taken before the
//! tick started.

use log::debug;
use std::sync::Arc;

use super::config::DriverTuning;
use super::geometry::Layout;
use super::types::{normalize_angle, Approach, CarId, Position, RoadClass, Route, TurnKind, Waypoint};

/// Result of a car update indicating what the supervisor should do with it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarUpdateResult {
    /// Car is still travelling
    Continue,
    /// Car reached the final waypoint and can be removed
    Arrived,
}

/// Why a car was not allowed to accelerate this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    /// Red light or stop zone
    Signal,
    /// A neighbour is in the way
    Collision,
    /// The exit lane beyond the box is jammed
    YellowBox,
}

/// Shared read-only inputs for a motion tick
#[derive(Debug, Clone, Copy)]
pub struct DriveContext<'a> {
    pub layout: &'a Layout,
    pub tuning: &'a DriverTuning,
}

/// What other cars can see of a car during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarSnapshot {
    pub id: CarId,
    pub class: RoadClass,
    pub turn: TurnKind,
    pub position: Position,
    pub heading: f32,
    pub speed: f32,
}

/// A car in the intersection simulation
#[derive(Debug, Clone)]
pub struct SimCar {
    pub id: CarId,
    pub class: RoadClass,
    pub approach: Approach,
    pub turn: TurnKind,
    route: Arc<Route>,
    cursor: usize,
    pub position: Position,
    /// Degrees, 0 = north, always in (-180, 180]
    pub heading: f32,
    pub speed: f32,
    pub max_speed: f32,
    /// Consecutive ticks the car was let through by the signal but could not move
    pub blocked_ticks: u32,
    pub turn_signal: bool,
    /// Set at most once by the deadlock arbiter
    pub forced_priority: bool,
    /// One latch per sensor zone
    pub sensor_latch: [bool; 2],
    pub last_hold: Option<HoldReason>,
    ghosting: bool,
}

impl SimCar {
    pub fn new(
        id: CarId,
        class: RoadClass,
        approach: Approach,
        turn: TurnKind,
        route: Arc<Route>,
        max_speed: f32,
    ) -> Self {
        let position = route.first().copied().unwrap_or_default();
        let heading = match route.get(1) {
            Some(next) => position.heading_to(next),
            None => 0.0,
        };

        Self {
            id,
            class,
            approach,
            turn,
            route,
            cursor: 0,
            position,
            heading,
            speed: 0.0,
            max_speed: max_speed.max(0.0),
            blocked_ticks: 0,
            turn_signal: false,
            forced_priority: false,
            sensor_latch: [false; 2],
            last_hold: None,
            ghosting: false,
        }
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    /// Index of the waypoint last reached
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn next_waypoint(&self) -> Option<&Waypoint> {
        self.route.get(self.cursor + 1)
    }

    /// True once the final waypoint is reached. Empty routes count as done.
    pub fn is_finished(&self) -> bool {
        self.cursor + 1 >= self.route.len()
    }

    pub fn snapshot(&self) -> CarSnapshot {
        CarSnapshot {
            id: self.id,
            class: self.class,
            turn: self.turn,
            position: self.position,
            heading: self.heading,
            speed: self.speed,
        }
    }

    /// Advance the car by one motion tick
    pub fn update(
        &mut self,
        gate_open: bool,
        neighbors: &[CarSnapshot],
        ctx: &DriveContext,
    ) -> CarUpdateResult {
        if self.is_finished() {
            return CarUpdateResult::Arrived;
        }
        let tuning = ctx.tuning;

        let mut hold = None;
        if !gate_open {
            hold = Some(HoldReason::Signal);
        }
        if self.collision_ahead(neighbors, ctx) {
            hold = Some(HoldReason::Collision);
        }
        if hold.is_none() && self.approaching_box(ctx) && !self.exit_clear(neighbors, ctx) {
            hold = Some(HoldReason::YellowBox);
        }

        match hold {
            None => {
                self.speed = (self.speed + tuning.acceleration).min(self.max_speed);
                self.blocked_ticks = 0;
                self.ghosting = false;
            }
            Some(_) => {
                self.speed = (self.speed - tuning.deceleration).max(0.0);
                if self.speed < tuning.stop_snap {
                    self.speed = 0.0;
                }
                // Waiting at a red light is not congestion
                if gate_open {
                    self.blocked_ticks += 1;
                }
            }
        }
        self.last_hold = hold;

        let to_center = ctx.layout.distance_to_center(&self.position);
        self.turn_signal = self.turn != TurnKind::Straight
            && to_center > tuning.turn_signal_inner
            && to_center < tuning.turn_signal_outer;

        if self.speed > 0.0 {
            self.move_towards_waypoint(tuning);
        }

        if self.is_finished() {
            CarUpdateResult::Arrived
        } else {
            CarUpdateResult::Continue
        }
    }

    fn approaching_box(&self, ctx: &DriveContext) -> bool {
        let d = ctx.layout.distance_to_center(&self.position);
        d > ctx.tuning.approach_inner && d < ctx.tuning.approach_outer
    }

    /// Yellow-box rule: the lane past the intersection must not be jammed.
    /// Routes whose exit cannot be resolved are assumed clear.
    fn exit_clear(&self, neighbors: &[CarSnapshot], ctx: &DriveContext) -> bool {
        let Some(zone) = self.route.last().and_then(|last| ctx.layout.exit_zone(last)) else {
            return true;
        };

        !neighbors.iter().any(|other| {
            other.id != self.id
                && zone.contains(&other.position)
                && other.speed < ctx.tuning.exit_blocking_speed
        })
    }

    /// Immediate-collision check. Returns true if the car must not accelerate.
    fn collision_ahead(&mut self, neighbors: &[CarSnapshot], ctx: &DriveContext) -> bool {
        let tuning = ctx.tuning;

        if self.blocked_ticks > tuning.ghost_ticks {
            if !self.ghosting {
                debug!(
                    "Car {:?} ghosting through after {} blocked ticks",
                    self.id, self.blocked_ticks
                );
                self.ghosting = true;
            }
            return false;
        }

        let Some(next) = self.next_waypoint() else {
            return false;
        };
        let Some((vx, vy)) = self.position.direction_to(next) else {
            return false;
        };

        let soft_recovery = self.blocked_ticks > tuning.soft_recovery_ticks;
        let center = ctx.layout.center;
        let distance_to_center = self.position.distance(&center);
        let moving_away = match self.position.direction_to(&center) {
            Some((cx, cy)) => vx * cx + vy * cy < 0.0,
            None => false,
        };

        let safety_sq = tuning.safety_radius * tuning.safety_radius;
        let conflict_sq = tuning.conflict_radius * tuning.conflict_radius;

        for other in neighbors.iter().filter(|o| o.id != self.id) {
            let dx = other.position.x - self.position.x;
            let dy = other.position.y - self.position.y;
            let distance_sq = dx * dx + dy * dy;
            if distance_sq >= safety_sq {
                continue;
            }

            let forward = dx * vx + dy * vy;
            let lateral = (dx * -vy + dy * vx).abs();

            if forward > 0.0 && lateral < tuning.lane_half_width {
                if forward < tuning.following_distance {
                    return true;
                }
            } else if !soft_recovery
                && distance_sq < conflict_sq
                && forward > -tuning.behind_tolerance
            {
                let conflict = Conflict {
                    other,
                    distance_sq,
                    distance_to_center,
                    moving_away,
                };
                if self.yields_to(&conflict, ctx) {
                    return true;
                }
            }
        }

        false
    }

    /// Right-of-way cascade; the first rule with an opinion decides
    fn yields_to(&self, conflict: &Conflict, ctx: &DriveContext) -> bool {
        self.departure_rule(conflict)
            .or_else(|| self.hierarchy_rule(conflict, ctx.tuning))
            .or_else(|| self.opposing_left_rule(conflict, ctx.tuning))
            .unwrap_or_else(|| {
                let other_to_center = ctx.layout.distance_to_center(&conflict.other.position);
                other_to_center < conflict.distance_to_center
            })
    }

    fn departure_rule(&self, conflict: &Conflict) -> Option<bool> {
        conflict.moving_away.then_some(false)
    }

    fn hierarchy_rule(&self, conflict: &Conflict, tuning: &DriverTuning) -> Option<bool> {
        if self.class != RoadClass::Secondary || conflict.other.class != RoadClass::Primary {
            return None;
        }
        let committed =
            conflict.distance_to_center <= tuning.commitment_distance || self.turn_signal;
        Some(!committed)
    }

    /// Close oncoming through traffic forces a yield. Other close cars fall
    /// through to the centre rule.
    fn opposing_left_rule(&self, conflict: &Conflict, tuning: &DriverTuning) -> Option<bool> {
        if self.turn != TurnKind::Left || self.class != conflict.other.class {
            return None;
        }
        let difference = normalize_angle(self.heading - conflict.other.heading).abs();
        if difference <= 180.0 - tuning.opposing_tolerance {
            return None;
        }
        if conflict.distance_sq >= tuning.left_turn_close_range * tuning.left_turn_close_range {
            return Some(false);
        }
        matches!(conflict.other.turn, TurnKind::Straight | TurnKind::Right).then_some(true)
    }

    fn move_towards_waypoint(&mut self, tuning: &DriverTuning) {
        let Some(target) = self.next_waypoint().copied() else {
            return;
        };
        let distance = self.position.distance(&target);

        // Snap instead of overshooting
        if distance <= self.speed {
            self.position = target;
            self.cursor += 1;
            return;
        }

        let Some((ux, uy)) = self.position.direction_to(&target) else {
            return;
        };
        self.position.x += ux * self.speed;
        self.position.y += uy * self.speed;

        let target_heading = normalize_angle(uy.atan2(ux).to_degrees() + 90.0);
        let error = normalize_angle(target_heading - self.heading);

        // Turn fast while far off, slow down as the nose lines up
        let t = (error.abs() / 90.0).min(1.0);
        let step = tuning.min_rotation + (tuning.max_rotation - tuning.min_rotation) * t;

        if error.abs() < step {
            self.heading = target_heading;
        } else {
            self.heading = normalize_angle(self.heading + error.signum() * step);
        }
    }
}

/// A neighbour that may contest right of way
struct Conflict<'a> {
    other: &'a CarSnapshot,
    distance_sq: f32,
    distance_to_center: f32,
    moving_away: bool,
}
