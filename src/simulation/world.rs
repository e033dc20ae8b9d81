//! Intersection supervisor
//!
//! Owns the active cars, the signal controller and the demand sensor, and
//! drives them on two clocks: a motion tick every frame and a signal tick
//! every `frames_per_signal_tick` frames. Nothing else mutates this state.

use anyhow::{bail, Context, Result};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::car::{DriveContext, SimCar};
use super::car_manager::{prune_finished, resolve_deadlocks, spawn_area_clear, update_cars};
use super::config::{SimConfig, StrategyKind};
use super::geometry::Layout;
use super::routing::{entry_point, Movement, RouteTable};
use super::sensor::DemandSensor;
use super::signal::{Phase, SignalController, SignalSnapshot};
use super::types::{Approach, Branch, CarId, Position, RoadClass, Route, TurnKind};

/// Request from a spawn scheduler for a new vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnRequest {
    pub class: RoadClass,
    pub approach: Approach,
    pub turn: TurnKind,
}

/// Things that happened during a tick, for renderers and telemetry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    CarCreated {
        id: CarId,
        class: RoadClass,
        approach: Approach,
        turn: TurnKind,
    },
    CarRemoved {
        id: CarId,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
    },
    DeadlockResolved {
        id: CarId,
    },
}

/// Where a car is and what it shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarPose {
    pub id: CarId,
    pub class: RoadClass,
    pub turn: TurnKind,
    pub position: Position,
    pub heading: f32,
    pub speed: f32,
    pub turn_signal: bool,
    pub forced_priority: bool,
}

/// Plain copy of everything a renderer needs
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    pub frame: u64,
    pub cars: Vec<CarPose>,
    pub signal: SignalSnapshot,
    pub strategy: StrategyKind,
    /// Departures counted during the current green, indexed by branch
    pub departures: [u32; 2],
}

/// Running totals since the last start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    pub spawned: u64,
    pub completed: u64,
    pub phase_changes: u64,
    pub deadlocks_resolved: u64,
}

/// The intersection supervisor
pub struct SimWorld {
    config: SimConfig,

    pub layout: Layout,

    routes: RouteTable,

    /// Active cars, keyed by stable id
    pub cars: BTreeMap<CarId, SimCar>,

    signal: SignalController,

    sensor: DemandSensor,

    events: Vec<SimEvent>,

    pub stats: SimStats,

    next_id: usize,

    /// Motion ticks since start
    frame: u64,

    running: bool,

    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,
}

impl SimWorld {
    fn new_internal(config: SimConfig, rng: Option<StdRng>) -> Result<Self> {
        config.validate().context("Invalid simulation configuration")?;
        let layout = Layout::standard();
        let routes = RouteTable::standard().context("Failed to build route table")?;
        let sensor = DemandSensor::new(&layout);

        Ok(Self {
            signal: SignalController::new(config.signal, config.strategy),
            config,
            layout,
            routes,
            cars: BTreeMap::new(),
            sensor,
            events: Vec::new(),
            stats: SimStats::default(),
            next_id: 0,
            frame: 0,
            running: false,
            rng,
        })
    }

    pub fn new(config: SimConfig) -> Result<Self> {
        Self::new_internal(config, None)
    }

    /// Create a new SimWorld with a seeded RNG for reproducible simulations
    pub fn new_with_seed(config: SimConfig, seed: u64) -> Result<Self> {
        Self::new_internal(config, Some(StdRng::seed_from_u64(seed)))
    }

    /// Get a random value in the given range, using seeded RNG if available
    fn random_range(&mut self, (low, high): (f32, f32)) -> f32 {
        match &mut self.rng {
            Some(rng) => rng.random_range(low..=high),
            None => rand::rng().random_range(low..=high),
        }
    }

    fn next_car_id(&mut self) -> CarId {
        let id = CarId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        info!(
            "Simulation started ({:?}, {:?} plan)",
            self.signal.strategy_kind(),
            self.config.signal.plan
        );
        self.running = true;
    }

    /// Stop and return every piece of owned state to its initial value
    pub fn stop(&mut self) {
        if self.running {
            info!("Simulation stopped after {} frames", self.frame);
        }
        self.running = false;
        self.cars.clear();
        self.events.clear();
        self.sensor.reset_counts();
        self.signal.reset(self.config.signal);
        self.stats = SimStats::default();
        self.frame = 0;
    }

    /// Stop, swap in a new configuration and start again
    pub fn restart(&mut self, config: SimConfig) -> Result<()> {
        config.validate().context("Invalid simulation configuration")?;
        self.stop();
        self.config = config;
        self.signal = SignalController::new(config.signal, config.strategy);
        self.start();
        Ok(())
    }

    /// Swap the control strategy; cars and signal state are left alone
    pub fn set_strategy(&mut self, kind: StrategyKind) {
        self.config.strategy = kind;
        self.signal.set_strategy(kind);
    }

    pub fn strategy(&self) -> StrategyKind {
        self.signal.strategy_kind()
    }

    pub fn signal(&self) -> &SignalController {
        &self.signal
    }

    pub fn signal_snapshot(&self) -> SignalSnapshot {
        self.signal.state().snapshot()
    }

    pub fn departures(&self, branch: Branch) -> u32 {
        self.sensor.departures(branch)
    }

    /// Spawn a car on the precomputed route for its movement
    pub fn spawn(&mut self, request: SpawnRequest) -> Result<CarId> {
        let movement = Movement::new(request.approach, request.turn);
        if !Movement::options(request.class, request.approach).contains(&movement) {
            bail!(
                "{:?} traffic cannot enter from {:?} turning {:?}",
                request.class,
                request.approach,
                request.turn
            );
        }

        let route = self
            .routes
            .get(movement)
            .with_context(|| format!("No route for {:?}", movement))?;

        if request.class == RoadClass::Secondary {
            let spawn = entry_point(request.approach);
            if !spawn_area_clear(&self.cars, &spawn, self.config.tuning.spawn_clearance) {
                warn!(
                    "Spawn area at {:?} is blocked, wait for the last car to move on",
                    request.approach
                );
                bail!("Spawn area at {:?} is blocked", request.approach);
            }
        }

        let bounds = match request.class {
            RoadClass::Primary => self.config.tuning.primary_speed,
            RoadClass::Secondary => self.config.tuning.secondary_speed,
        };
        let max_speed = self.random_range(bounds);

        Ok(self.spawn_on_route(
            request.class,
            request.approach,
            request.turn,
            route,
            max_speed,
        ))
    }

    /// Spawn a car on an explicit route. No movement or clearance checks.
    pub fn spawn_on_route(
        &mut self,
        class: RoadClass,
        approach: Approach,
        turn: TurnKind,
        route: Arc<Route>,
        max_speed: f32,
    ) -> CarId {
        if self.layout.stop_zone(class, approach).is_none() {
            warn!(
                "{:?} car from {:?} has no stop zone and will be held outside the box",
                class, approach
            );
        }

        let id = self.next_car_id();
        let car = SimCar::new(id, class, approach, turn, route, max_speed);
        self.cars.insert(id, car);
        self.stats.spawned += 1;
        self.events.push(SimEvent::CarCreated {
            id,
            class,
            approach,
            turn,
        });
        id
    }

    /// One frame: motion tick, plus a signal tick when one is due.
    /// Does nothing while stopped.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        self.motion_tick();
        self.frame += 1;
        if self.frame % u64::from(self.config.frames_per_signal_tick) == 0 {
            self.signal_tick();
        }
    }

    /// Move every car, run the sensor and prune finished cars
    pub fn motion_tick(&mut self) {
        let ctx = DriveContext {
            layout: &self.layout,
            tuning: &self.config.tuning,
        };
        update_cars(&mut self.cars, self.signal.state(), &ctx);

        let sensor_events = self
            .sensor
            .detect(self.cars.values_mut(), self.signal.state());
        for event in sensor_events {
            let (from, to) = self.signal.on_sensor_event(event);
            self.on_phase_change(from, to);
        }

        for id in prune_finished(&mut self.cars) {
            self.stats.completed += 1;
            self.events.push(SimEvent::CarRemoved { id });
        }
    }

    /// Advance the signal and run the deadlock arbiter
    pub fn signal_tick(&mut self) {
        let (from, to) = self.signal.tick();
        self.on_phase_change(from, to);
        self.arbitrate();
    }

    /// Run the deadlock arbiter once
    pub fn arbitrate(&mut self) -> Option<CarId> {
        let id = resolve_deadlocks(&mut self.cars, &self.layout, &self.config.tuning)?;
        self.stats.deadlocks_resolved += 1;
        self.events.push(SimEvent::DeadlockResolved { id });
        Some(id)
    }

    fn on_phase_change(&mut self, from: Phase, to: Phase) {
        if from == to {
            return;
        }
        self.stats.phase_changes += 1;
        self.events.push(SimEvent::PhaseChanged { from, to });

        if to == Phase::PrimaryGreen {
            self.sensor.reset_latches(self.cars.values_mut());
        }
        if to.is_branch_green() {
            match self.signal.state().green_branch() {
                Some(branch) => self.sensor.reset_count(branch),
                None => self.sensor.reset_counts(),
            }
        }
    }

    /// Take the events raised since the last call
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            frame: self.frame,
            cars: self
                .cars
                .values()
                .map(|car| CarPose {
                    id: car.id,
                    class: car.class,
                    turn: car.turn,
                    position: car.position,
                    heading: car.heading,
                    speed: car.speed,
                    turn_signal: car.turn_signal,
                    forced_priority: car.forced_priority,
                })
                .collect(),
            signal: self.signal_snapshot(),
            strategy: self.signal.strategy_kind(),
            departures: [
                self.sensor.departures(Branch::A),
                self.sensor.departures(Branch::B),
            ],
        }
    }
}
