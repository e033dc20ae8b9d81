//! Static geometry of the intersection
//!
//! Zones are axis-aligned boxes in layout units. The coordinates describe one
//! specific layout: a vertical primary road centred on x = 450 (160 wide) and
//! a horizontal secondary road centred on y = 325 (120 wide), right-hand
//! traffic.

use super::types::{Approach, Branch, Position, RoadClass, Waypoint};

/// An axis-aligned box, bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Rect {
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn contains(&self, p: &Position) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Strict interior test
    pub fn contains_strict(&self, p: &Position) -> bool {
        p.x > self.min_x && p.x < self.max_x && p.y > self.min_y && p.y < self.max_y
    }

    /// Touching edges count as overlap
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.max_x < other.min_x
            || self.min_x > other.max_x
            || self.max_y < other.min_y
            || self.min_y > other.max_y)
    }
}

/// Detection area in front of a minor-road stop line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorZone {
    pub branch: Branch,
    pub area: Rect,
}

/// Static geometry the supervisor, agents and sensor read from
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub center: Position,
    /// Physical crossing area; vehicles inside are never gated
    pub footprint: Rect,
    /// Central box watched by the deadlock arbiter
    pub core: Rect,
    /// Visible scene; exits are resolved by which side a route leaves it
    pub scene: Rect,
    pub sensor_zones: [SensorZone; 2],
    stop_zones: [(RoadClass, Approach, Rect); 4],
    exit_zones: [(Approach, Rect); 4],
}

impl Default for Layout {
    fn default() -> Self {
        Self::standard()
    }
}

impl Layout {
    pub fn standard() -> Self {
        Self {
            center: Position::new(450.0, 325.0),
            footprint: Rect::new(360.0, 255.0, 540.0, 395.0),
            core: Rect::new(370.0, 245.0, 530.0, 405.0),
            scene: Rect::new(0.0, 0.0, 900.0, 700.0),
            sensor_zones: [
                SensorZone {
                    branch: Branch::A,
                    area: Rect::new(270.0, 335.0, 320.0, 375.0),
                },
                SensorZone {
                    branch: Branch::B,
                    area: Rect::new(580.0, 285.0, 630.0, 325.0),
                },
            ],
            stop_zones: [
                (RoadClass::Primary, Approach::North, Rect::new(370.0, 170.0, 450.0, 230.0)),
                (RoadClass::Primary, Approach::South, Rect::new(450.0, 370.0, 530.0, 430.0)),
                (RoadClass::Secondary, Approach::West, Rect::new(285.0, 325.0, 350.0, 405.0)),
                (RoadClass::Secondary, Approach::East, Rect::new(550.0, 245.0, 615.0, 325.0)),
            ],
            exit_zones: [
                (Approach::North, Rect::new(460.0, -999.0, 520.0, 275.0)),
                (Approach::South, Rect::new(380.0, 375.0, 440.0, 999.0)),
                (Approach::East, Rect::new(520.0, 335.0, 999.0, 395.0)),
                (Approach::West, Rect::new(-999.0, 255.0, 380.0, 315.0)),
            ],
        }
    }

    pub fn distance_to_center(&self, p: &Position) -> f32 {
        p.distance(&self.center)
    }

    pub fn in_footprint(&self, p: &Position) -> bool {
        self.footprint.contains(p)
    }

    pub fn in_core(&self, p: &Position) -> bool {
        self.core.contains_strict(p)
    }

    /// Stop line area for a class arriving from a side, `None` if unmapped
    pub fn stop_zone(&self, class: RoadClass, approach: Approach) -> Option<&Rect> {
        self.stop_zones
            .iter()
            .find(|(c, a, _)| *c == class && *a == approach)
            .map(|(_, _, rect)| rect)
    }

    /// Side of the scene a route's final waypoint leaves by
    pub fn exit_side(&self, last: &Waypoint) -> Option<Approach> {
        if last.y < self.scene.min_y {
            Some(Approach::North)
        } else if last.y > self.scene.max_y {
            Some(Approach::South)
        } else if last.x > self.scene.max_x {
            Some(Approach::East)
        } else if last.x < self.scene.min_x {
            Some(Approach::West)
        } else {
            None
        }
    }

    /// Downstream lane a vehicle must find clear before entering the box
    pub fn exit_zone(&self, last: &Waypoint) -> Option<&Rect> {
        let side = self.exit_side(last)?;
        self.exit_zones
            .iter()
            .find(|(a, _)| *a == side)
            .map(|(_, rect)| rect)
    }

    /// Body box of a vehicle anchored at its position, oriented by road class
    pub fn footprint_of(class: RoadClass, p: &Position) -> Rect {
        let (w, h) = match class {
            RoadClass::Primary => (26.0, 48.0),
            RoadClass::Secondary => (48.0, 26.0),
        };
        Rect::new(p.x, p.y, p.x + w, p.y + h)
    }
}
