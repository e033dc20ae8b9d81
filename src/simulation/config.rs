//! Configuration records for the simulation
//!
//! Supplied once when the world starts; a restart may swap in a new record.
//! Signal durations are counted in signal ticks (one per simulated second),
//! distances and speeds in layout units per motion tick.

use anyhow::{bail, Result};

/// How the minor road is split into phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhasePlan {
    /// Each minor branch gets its own green: six phases per cycle
    #[default]
    SplitBranches,
    /// Legacy layout: both branches share one green, four phases per cycle
    SharedBranch,
}

/// Which control strategy drives the signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    FixedTime,
    #[default]
    Adaptive,
}

impl std::str::FromStr for StrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" | "fixed-time" | "fixed_time" => Ok(StrategyKind::FixedTime),
            "adaptive" => Ok(StrategyKind::Adaptive),
            other => bail!("Unknown strategy '{}', expected 'fixed' or 'adaptive'", other),
        }
    }
}

/// Phase timing for the signal controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalConfig {
    /// Nominal primary green duration
    pub primary_green: u32,
    /// Nominal minor branch green duration, also the per-departure extension
    pub branch_green: u32,
    /// Primary green must last at least this long before demand can end it
    pub min_hold: u32,
    /// Primary green is cut after this long no matter what
    pub emergency_ceiling: u32,
    /// A branch green is cut after this long no matter how much demand remains
    pub branch_ceiling: u32,
    /// Departures after which a branch green stops being extended
    pub max_vehicles_per_phase: u32,
    pub yellow: u32,
    pub plan: PhasePlan,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            primary_green: 30,
            branch_green: 5,
            min_hold: 15,
            emergency_ceiling: 120,
            branch_ceiling: 20,
            max_vehicles_per_phase: 5,
            yellow: 1,
            plan: PhasePlan::SplitBranches,
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.primary_green == 0 || self.branch_green == 0 {
            bail!("Green durations must be positive");
        }
        if self.min_hold > self.emergency_ceiling {
            bail!(
                "Minimum hold ({}) cannot exceed the emergency ceiling ({})",
                self.min_hold,
                self.emergency_ceiling
            );
        }
        if self.emergency_ceiling == 0 || self.branch_ceiling == 0 {
            bail!("Ceiling timers must be positive");
        }
        if self.max_vehicles_per_phase == 0 {
            bail!("Per-phase vehicle cap must be at least 1");
        }
        Ok(())
    }
}

/// Empirically tuned constants for the driver model.
///
/// These fit the standard layout; a different geometry needs re-tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverTuning {
    pub acceleration: f32,
    /// Braking rate, must be larger than `acceleration`
    pub deceleration: f32,
    /// Speeds below this snap to zero while braking
    pub stop_snap: f32,

    /// Neighbours closer than this are considered at all
    pub safety_radius: f32,
    /// Neighbours closer than this can trigger right-of-way rules
    pub conflict_radius: f32,
    pub following_distance: f32,
    /// Lateral offset under which a neighbour counts as in the same lane
    pub lane_half_width: f32,
    /// How far behind a neighbour may be and still be a crossing conflict
    pub behind_tolerance: f32,
    pub commitment_distance: f32,
    pub left_turn_close_range: f32,
    /// Degrees away from exactly opposite that still count as oncoming
    pub opposing_tolerance: f32,

    pub approach_inner: f32,
    pub approach_outer: f32,
    pub turn_signal_inner: f32,
    pub turn_signal_outer: f32,
    /// Vehicles slower than this block an exit lane
    pub exit_blocking_speed: f32,

    pub soft_recovery_ticks: u32,
    pub ghost_ticks: u32,
    pub deadlock_ticks: u32,
    pub stuck_speed: f32,

    pub min_rotation: f32,
    pub max_rotation: f32,

    pub spawn_clearance: f32,
    pub primary_speed: (f32, f32),
    pub secondary_speed: (f32, f32),
}

impl Default for DriverTuning {
    fn default() -> Self {
        Self {
            acceleration: 0.05,
            deceleration: 0.25,
            stop_snap: 0.1,
            safety_radius: 85.0,
            conflict_radius: 110.0,
            following_distance: 80.0,
            lane_half_width: 35.0,
            behind_tolerance: 20.0,
            commitment_distance: 120.0,
            left_turn_close_range: 85.0,
            opposing_tolerance: 45.0,
            approach_inner: 110.0,
            approach_outer: 140.0,
            turn_signal_inner: 30.0,
            turn_signal_outer: 200.0,
            exit_blocking_speed: 0.5,
            soft_recovery_ticks: 40,
            ghost_ticks: 60,
            deadlock_ticks: 30,
            stuck_speed: 0.2,
            min_rotation: 3.0,
            max_rotation: 15.0,
            spawn_clearance: 100.0,
            primary_speed: (2.3, 3.3),
            secondary_speed: (2.0, 2.4),
        }
    }
}

impl DriverTuning {
    pub fn validate(&self) -> Result<()> {
        if self.acceleration <= 0.0 || self.deceleration <= self.acceleration {
            bail!("Braking must be positive and faster than acceleration");
        }
        if !(self.deadlock_ticks < self.soft_recovery_ticks
            && self.soft_recovery_ticks < self.ghost_ticks)
        {
            bail!(
                "Liveness thresholds must satisfy deadlock ({}) < soft recovery ({}) < ghost ({})",
                self.deadlock_ticks,
                self.soft_recovery_ticks,
                self.ghost_ticks
            );
        }
        if self.approach_inner >= self.approach_outer
            || self.turn_signal_inner >= self.turn_signal_outer
        {
            bail!("Inner radii must be smaller than outer radii");
        }
        if self.min_rotation <= 0.0 || self.min_rotation > self.max_rotation {
            bail!("Rotation bounds must satisfy 0 < min <= max");
        }
        for (name, (low, high)) in [
            ("primary", self.primary_speed),
            ("secondary", self.secondary_speed),
        ] {
            if low <= 0.0 || low > high {
                bail!("Invalid {} speed bounds {}..{}", name, low, high);
            }
        }
        Ok(())
    }
}

/// Everything the world needs at start time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    pub signal: SignalConfig,
    pub tuning: DriverTuning,
    /// Motion ticks per signal tick
    pub frames_per_signal_tick: u32,
    pub strategy: StrategyKind,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            signal: SignalConfig::default(),
            tuning: DriverTuning::default(),
            frames_per_signal_tick: 60,
            strategy: StrategyKind::Adaptive,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        self.signal.validate()?;
        self.tuning.validate()?;
        if self.frames_per_signal_tick == 0 {
            bail!("Frames per signal tick must be at least 1");
        }
        Ok(())
    }
}
