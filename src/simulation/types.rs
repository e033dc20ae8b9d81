//! Core types for the intersection simulation
//!
//! Plain data shared by the vehicle agents, the signal controller and the
//! supervisor. Nothing in here holds mutable simulation state.

use std::sync::Arc;

/// A unique identifier for a vehicle in the active set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CarId(pub usize);

/// Which road a vehicle belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoadClass {
    /// The through road (north/south), higher priority
    Primary,
    /// The cross road (west/east), with turning movements
    Secondary,
}

/// The side of the intersection a vehicle enters from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Approach {
    /// Enters from the north, travelling south
    North,
    /// Enters from the south, travelling north
    South,
    /// Enters from the west, travelling east
    West,
    /// Enters from the east, travelling west
    East,
}

impl Approach {
    pub const ALL: [Approach; 4] = [Approach::North, Approach::South, Approach::West, Approach::East];

    /// Side the vehicle leaves by for a given turn (right-hand traffic)
    pub fn exit_for(self, turn: TurnKind) -> Approach {
        use Approach::*;
        match (self, turn) {
            (North, TurnKind::Straight) => South,
            (North, TurnKind::Right) => West,
            (North, TurnKind::Left) => East,
            (South, TurnKind::Straight) => North,
            (South, TurnKind::Right) => East,
            (South, TurnKind::Left) => West,
            (West, TurnKind::Straight) => East,
            (West, TurnKind::Right) => South,
            (West, TurnKind::Left) => North,
            (East, TurnKind::Straight) => West,
            (East, TurnKind::Right) => North,
            (East, TurnKind::Left) => South,
        }
    }

    /// Minor-road branch served by this approach, if any
    pub fn branch(self) -> Option<Branch> {
        match self {
            Approach::West => Some(Branch::A),
            Approach::East => Some(Branch::B),
            Approach::North | Approach::South => None,
        }
    }
}

/// Manoeuvre a vehicle performs at the intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnKind {
    Straight,
    Left,
    Right,
}

/// One of the two direction-specific movements on the minor road
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    /// Traffic entering from the west
    A,
    /// Traffic entering from the east
    B,
}

impl Branch {
    pub const ALL: [Branch; 2] = [Branch::A, Branch::B];

    pub fn other(self) -> Branch {
        match self {
            Branch::A => Branch::B,
            Branch::B => Branch::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Branch::A => 0,
            Branch::B => 1,
        }
    }
}

/// A 2D position in screen-like coordinates (y grows southwards)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// Waypoints are just fixed positions along a route
pub type Waypoint = Position;

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn distance_squared(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Unit vector from this position towards another, or `None` if they coincide
    pub fn direction_to(&self, other: &Position) -> Option<(f32, f32)> {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len > 0.0 {
            Some((dx / len, dy / len))
        } else {
            None
        }
    }

    /// Heading in degrees of the vector from this position to another.
    /// 0 points north (up the screen), 90 points east.
    pub fn heading_to(&self, other: &Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        normalize_angle(dy.atan2(dx).to_degrees() + 90.0)
    }
}

/// Wrap an angle in degrees into (-180, 180]
pub fn normalize_angle(mut angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    angle %= 360.0;
    if angle > 180.0 {
        angle -= 360.0;
    } else if angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

/// An immutable, shared sequence of waypoints
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Route {
    waypoints: Vec<Waypoint>,
}

impl Route {
    pub fn new(waypoints: Vec<Waypoint>) -> Arc<Self> {
        Arc::new(Self { waypoints })
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    pub fn first(&self) -> Option<&Waypoint> {
        self.waypoints.first()
    }

    pub fn last(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    /// Total polyline length
    pub fn length(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|pair| pair[0].distance(&pair[1]))
            .sum()
    }
}
