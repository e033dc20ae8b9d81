//! Rendering sinks for the simulation
//!
//! The simulation never draws anything itself. A renderer is fed lifecycle
//! events and snapshots after each frame and keeps whatever visual state it
//! needs.

use std::collections::BTreeMap;

use crate::simulation::{
    CarId, CarPose, Layout, Phase, Position, RoadClass, SignalSnapshot, SimEvent, SimStats,
    WorldSnapshot,
};

/// What a rendering backend must be able to do
pub trait Renderer {
    fn create_vehicle(&mut self, pose: &CarPose);
    fn update_vehicle(&mut self, pose: &CarPose);
    fn remove_vehicle(&mut self, id: CarId);
    fn update_signal(&mut self, signal: &SignalSnapshot);
    /// Forget every vehicle, e.g. after the world was stopped
    fn clear(&mut self);
}

/// Push one frame's events and poses into a renderer
pub fn sync(renderer: &mut dyn Renderer, events: &[SimEvent], snapshot: &WorldSnapshot) {
    for event in events {
        match event {
            SimEvent::CarCreated { id, .. } => {
                if let Some(pose) = snapshot.cars.iter().find(|pose| pose.id == *id) {
                    renderer.create_vehicle(pose);
                }
            }
            SimEvent::CarRemoved { id } => renderer.remove_vehicle(*id),
            SimEvent::PhaseChanged { .. } | SimEvent::DeadlockResolved { .. } => {}
        }
    }

    for pose in &snapshot.cars {
        renderer.update_vehicle(pose);
    }
    renderer.update_signal(&snapshot.signal);
}

const MAP_WIDTH: usize = 90;
const MAP_HEIGHT: usize = 35;

/// Terminal renderer: mirrors the scene and prints it as ASCII on demand
#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    layout: Layout,
    cars: BTreeMap<CarId, CarPose>,
    signal: Option<SignalSnapshot>,
}

impl ConsoleRenderer {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            cars: BTreeMap::new(),
            signal: None,
        }
    }

    pub fn vehicle_count(&self) -> usize {
        self.cars.len()
    }

    pub fn signal_line(&self) -> String {
        match &self.signal {
            Some(signal) => format!(
                "{} ({}s){}",
                signal.status_text(),
                signal.display_timer(),
                signal
                    .pending
                    .map(|branch| format!(", pending {:?}", branch))
                    .unwrap_or_default()
            ),
            None => "Signal off".to_string(),
        }
    }

    /// Build the ASCII map of the scene
    pub fn render_map(&self) -> String {
        let scene = self.layout.scene;
        let cell_w = (scene.max_x - scene.min_x) / MAP_WIDTH as f32;
        let cell_h = (scene.max_y - scene.min_y) / MAP_HEIGHT as f32;

        let to_grid = |p: &Position| -> Option<(usize, usize)> {
            if !scene.contains(p) {
                return None;
            }
            let col = ((p.x - scene.min_x) / cell_w) as usize;
            let row = ((p.y - scene.min_y) / cell_h) as usize;
            Some((row.min(MAP_HEIGHT - 1), col.min(MAP_WIDTH - 1)))
        };

        let mut grid = vec![vec![' '; MAP_WIDTH]; MAP_HEIGHT];

        // Roads and the box
        for (row, line) in grid.iter_mut().enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                let p = Position::new(
                    scene.min_x + (col as f32 + 0.5) * cell_w,
                    scene.min_y + (row as f32 + 0.5) * cell_h,
                );
                let on_primary = (p.x - self.layout.center.x).abs() < 80.0;
                let on_secondary = (p.y - self.layout.center.y).abs() < 60.0;
                *cell = if self.layout.in_footprint(&p) {
                    '#'
                } else if on_primary || on_secondary {
                    '.'
                } else {
                    ' '
                };
            }
        }

        // Signal heads
        if let Some(signal) = &self.signal {
            let primary = if signal.phase == Phase::PrimaryGreen {
                'G'
            } else if signal.phase.is_yellow() {
                'Y'
            } else {
                'R'
            };
            for zone in &self.layout.sensor_zones {
                let head = Position::new(zone.area.min_x, zone.area.min_y);
                if let Some((row, col)) = to_grid(&head) {
                    grid[row][col] = match signal.green_branch {
                        Some(branch) if branch == zone.branch => 'G',
                        None if signal.phase.is_branch_green() => 'G',
                        _ if signal.phase.is_yellow() => 'Y',
                        _ => 'R',
                    };
                }
            }
            let footprint = self.layout.footprint;
            for head in [
                Position::new(footprint.min_x, footprint.min_y - 20.0),
                Position::new(footprint.max_x, footprint.max_y + 20.0),
            ] {
                if let Some((row, col)) = to_grid(&head) {
                    grid[row][col] = primary;
                }
            }
        }

        // Cars
        for pose in self.cars.values() {
            if let Some((row, col)) = to_grid(&pose.position) {
                grid[row][col] = match (pose.forced_priority, pose.class) {
                    (true, _) => '!',
                    (false, RoadClass::Primary) => 'P',
                    (false, RoadClass::Secondary) => 'S',
                };
            }
        }

        let mut out = String::new();
        out.push_str("=== Intersection ===\n");
        out.push_str(&self.signal_line());
        out.push('\n');
        out.push_str("Legend: P=Primary car, S=Secondary car, !=Forced priority, #=Box, G/Y/R=Signal\n");
        for row in &grid {
            let line: String = row.iter().collect();
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }

    pub fn draw_map(&self) {
        println!("{}", self.render_map());
    }

    pub fn print_summary(&self, snapshot: &WorldSnapshot, stats: &SimStats) {
        println!("=== Intersection Summary ===");
        println!("Frame: {}", snapshot.frame);
        println!("Strategy: {:?}", snapshot.strategy);
        println!("Signal: {}", self.signal_line());
        println!(
            "Departures this green: A={}, B={}",
            snapshot.departures[0], snapshot.departures[1]
        );
        println!(
            "Cars: {} active, {} spawned, {} completed",
            snapshot.cars.len(),
            stats.spawned,
            stats.completed
        );
        println!(
            "Phase changes: {}, deadlocks resolved: {}",
            stats.phase_changes, stats.deadlocks_resolved
        );

        if !snapshot.cars.is_empty() {
            println!("--- Active Cars ---");
            for pose in &snapshot.cars {
                println!(
                    "  Car {:?}: {:?}, speed={:.2}, position=({:.1}, {:.1}), heading={:.0}{}",
                    pose.id.0,
                    pose.class,
                    pose.speed,
                    pose.position.x,
                    pose.position.y,
                    pose.heading,
                    if pose.turn_signal { ", signalling" } else { "" }
                );
            }
        }
        println!();
    }
}

impl Renderer for ConsoleRenderer {
    fn create_vehicle(&mut self, pose: &CarPose) {
        self.cars.insert(pose.id, *pose);
    }

    fn update_vehicle(&mut self, pose: &CarPose) {
        if let Some(known) = self.cars.get_mut(&pose.id) {
            *known = *pose;
        }
    }

    fn remove_vehicle(&mut self, id: CarId) {
        self.cars.remove(&id);
    }

    fn update_signal(&mut self, signal: &SignalSnapshot) {
        self.signal = Some(*signal);
    }

    fn clear(&mut self) {
        self.cars.clear();
        self.signal = None;
    }
}
