//! Traffic signal state machine
//!
//! The controller owns the signal state and ticks it once per signal tick
//! through the active control strategy. Phases only ever move forward around
//! a fixed ring:
//!
//! primary green → yellow → lead branch green → yellow → trail branch green →
//! yellow → primary green
//!
//! The lead branch is picked when primary green ends; the trail branch is the
//! other one. With the shared-branch plan the lead green serves both branches
//! and goes straight to the final yellow.

use log::{debug, info};

use super::config::{PhasePlan, SignalConfig, StrategyKind};
use super::strategy::{strategy_for, ControlStrategy};
use super::types::{Branch, RoadClass};

/// A signal phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    PrimaryGreen,
    YellowToLead,
    LeadGreen,
    YellowToTrail,
    TrailGreen,
    YellowToPrimary,
}

impl Phase {
    /// Successor on the ring for a given plan
    pub fn next(self, plan: PhasePlan) -> Phase {
        match (self, plan) {
            (Phase::PrimaryGreen, _) => Phase::YellowToLead,
            (Phase::YellowToLead, _) => Phase::LeadGreen,
            (Phase::LeadGreen, PhasePlan::SplitBranches) => Phase::YellowToTrail,
            (Phase::LeadGreen, PhasePlan::SharedBranch) => Phase::YellowToPrimary,
            (Phase::YellowToTrail, _) => Phase::TrailGreen,
            (Phase::TrailGreen, _) => Phase::YellowToPrimary,
            (Phase::YellowToPrimary, _) => Phase::PrimaryGreen,
        }
    }

    pub fn is_yellow(self) -> bool {
        matches!(
            self,
            Phase::YellowToLead | Phase::YellowToTrail | Phase::YellowToPrimary
        )
    }

    pub fn is_branch_green(self) -> bool {
        matches!(self, Phase::LeadGreen | Phase::TrailGreen)
    }

    /// Number of phases in one full cycle
    pub fn cycle_len(plan: PhasePlan) -> usize {
        match plan {
            PhasePlan::SplitBranches => 6,
            PhasePlan::SharedBranch => 4,
        }
    }
}

/// Mutable signal state, shared between the controller and its strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalState {
    pub phase: Phase,
    pub plan: PhasePlan,
    /// Nominal countdown for the current phase
    pub timer: u32,
    /// Hard limit on primary green
    pub emergency_timer: u32,
    /// Time left before demand may end primary green
    pub min_hold_timer: u32,
    /// Branch requested by demand during primary green
    pub pending: Option<Branch>,
    /// Branch served first in the current (or most recent) cycle
    pub lead: Branch,
    pub last_served: Option<Branch>,
    /// Signal ticks since the current phase began
    pub phase_elapsed: u32,
}

impl SignalState {
    pub fn new(config: &SignalConfig) -> Self {
        Self {
            phase: Phase::PrimaryGreen,
            plan: config.plan,
            timer: config.primary_green,
            emergency_timer: config.emergency_ceiling,
            min_hold_timer: config.min_hold,
            pending: None,
            lead: Branch::A,
            last_served: None,
            phase_elapsed: 0,
        }
    }

    /// Whether the road class / branch combination currently has green.
    /// Secondary traffic without a branch is never granted.
    pub fn grants(&self, class: RoadClass, branch: Option<Branch>) -> bool {
        match class {
            RoadClass::Primary => self.phase == Phase::PrimaryGreen,
            RoadClass::Secondary => branch.is_some_and(|b| self.branch_green(b)),
        }
    }

    pub fn branch_green(&self, branch: Branch) -> bool {
        match (self.phase, self.plan) {
            (Phase::LeadGreen, PhasePlan::SharedBranch) => true,
            (Phase::LeadGreen, PhasePlan::SplitBranches) => self.lead == branch,
            (Phase::TrailGreen, _) => self.lead.other() == branch,
            _ => false,
        }
    }

    /// The branch whose green is showing, if exactly one is
    pub fn green_branch(&self) -> Option<Branch> {
        match (self.phase, self.plan) {
            (Phase::LeadGreen, PhasePlan::SplitBranches) => Some(self.lead),
            (Phase::TrailGreen, _) => Some(self.lead.other()),
            _ => None,
        }
    }

    /// Move to the next phase on the ring, loading its duration
    pub fn advance(&mut self, config: &SignalConfig) {
        let from = self.phase;
        let to = from.next(self.plan);

        if from == Phase::PrimaryGreen {
            let alternate = self.last_served.map_or(Branch::A, Branch::other);
            self.lead = self.pending.take().unwrap_or(alternate);
            self.last_served = Some(self.lead);
        }

        self.phase = to;
        self.phase_elapsed = 0;
        self.timer = match to {
            Phase::PrimaryGreen => config.primary_green,
            Phase::LeadGreen | Phase::TrailGreen => config.branch_green,
            _ => config.yellow,
        };

        if to == Phase::PrimaryGreen {
            self.emergency_timer = config.emergency_ceiling;
            self.min_hold_timer = config.min_hold;
            self.pending = None;
        }

        debug!("Signal {:?} -> {:?} (lead {:?})", from, to, self.lead);
    }

    /// Count the nominal timer down; returns true when it had already run out
    pub fn count_down(&mut self) -> bool {
        if self.timer == 0 {
            return true;
        }
        self.timer -= 1;
        false
    }

    pub fn snapshot(&self) -> SignalSnapshot {
        let primary = self.phase == Phase::PrimaryGreen;
        SignalSnapshot {
            phase: self.phase,
            green_branch: self.green_branch(),
            lead: self.lead,
            timer: self.timer,
            emergency_timer: primary.then_some(self.emergency_timer),
            min_hold_timer: primary.then_some(self.min_hold_timer),
            pending: self.pending,
        }
    }
}

/// Plain copy of the signal state for renderers and telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalSnapshot {
    pub phase: Phase,
    pub green_branch: Option<Branch>,
    pub lead: Branch,
    pub timer: u32,
    pub emergency_timer: Option<u32>,
    pub min_hold_timer: Option<u32>,
    pub pending: Option<Branch>,
}

impl SignalSnapshot {
    /// Single countdown for display: the emergency timer during primary green
    pub fn display_timer(&self) -> u32 {
        self.emergency_timer.unwrap_or(self.timer)
    }

    pub fn status_text(&self) -> String {
        match self.phase {
            Phase::PrimaryGreen => "Primary green".to_string(),
            Phase::YellowToLead => "Changing to minor road...".to_string(),
            Phase::LeadGreen | Phase::TrailGreen => match self.green_branch {
                Some(branch) => format!("Minor branch {:?} green", branch),
                None => "Minor road green".to_string(),
            },
            Phase::YellowToTrail => "Changing branch...".to_string(),
            Phase::YellowToPrimary => "Changing to primary...".to_string(),
        }
    }
}

/// Events raised by the demand sensor into the active strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorEvent {
    /// A minor-road vehicle arrived while primary had green
    DemandDetected { branch: Branch, elapsed_green: u32 },
    /// A minor-road vehicle left its zone during its branch's green
    Departed { branch: Branch, count: u32 },
}

/// Signal state plus the strategy that drives it
#[derive(Debug)]
pub struct SignalController {
    state: SignalState,
    config: SignalConfig,
    strategy: Box<dyn ControlStrategy>,
}

impl SignalController {
    pub fn new(config: SignalConfig, kind: StrategyKind) -> Self {
        Self {
            state: SignalState::new(&config),
            config,
            strategy: strategy_for(kind),
        }
    }

    pub fn state(&self) -> &SignalState {
        &self.state
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Swap strategies without touching the signal state
    pub fn set_strategy(&mut self, kind: StrategyKind) {
        if self.strategy.kind() != kind {
            info!("Signal strategy changed to {:?}", kind);
            self.strategy = strategy_for(kind);
        }
    }

    /// One signal tick. Returns the phase before and after.
    pub fn tick(&mut self) -> (Phase, Phase) {
        let before = self.state.phase;
        self.state.phase_elapsed += 1;
        self.strategy.tick(&mut self.state, &self.config);
        (before, self.state.phase)
    }

    /// Feed a sensor event to the strategy. Returns the phase before and after.
    pub fn on_sensor_event(&mut self, event: SensorEvent) -> (Phase, Phase) {
        let before = self.state.phase;
        self.strategy.on_sensor_event(&mut self.state, &self.config, event);
        (before, self.state.phase)
    }

    /// Back to the initial state, optionally with a new configuration
    pub fn reset(&mut self, config: SignalConfig) {
        self.config = config;
        self.state = SignalState::new(&config);
        self.strategy = strategy_for(self.strategy.kind());
    }
}
