//! Control strategies for the signal controller
//!
//! A strategy decides, once per signal tick, whether the current phase ends,
//! and how sensor events bend the timers. Both strategies move through the
//! same phase ring; only the timing rules differ.

use log::{debug, info, warn};
use std::fmt::Debug;

use super::config::{SignalConfig, StrategyKind};
use super::signal::{Phase, SensorEvent, SignalState};

pub trait ControlStrategy: Debug {
    fn kind(&self) -> StrategyKind;

    /// Called once per signal tick
    fn tick(&mut self, state: &mut SignalState, config: &SignalConfig);

    /// Called for every event raised by the demand sensor
    fn on_sensor_event(
        &mut self,
        _state: &mut SignalState,
        _config: &SignalConfig,
        _event: SensorEvent,
    ) {
    }
}

pub fn strategy_for(kind: StrategyKind) -> Box<dyn ControlStrategy> {
    match kind {
        StrategyKind::FixedTime => Box::new(FixedTime),
        StrategyKind::Adaptive => Box::new(Adaptive::default()),
    }
}

/// Every phase runs its nominal duration, sensors are ignored
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedTime;

impl ControlStrategy for FixedTime {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FixedTime
    }

    fn tick(&mut self, state: &mut SignalState, config: &SignalConfig) {
        if state.count_down() {
            state.advance(config);
        }
    }
}

/// Demand-actuated timing.
///
/// Primary green holds until minor-road demand arrives (after the minimum
/// hold) or the emergency ceiling runs out. Branch greens stretch while
/// vehicles keep departing, up to the vehicle cap and the branch ceiling.
#[derive(Debug, Default, Clone, Copy)]
pub struct Adaptive {
    branch_elapsed: u32,
}

impl Adaptive {
    fn tick_primary(&mut self, state: &mut SignalState, config: &SignalConfig) {
        state.emergency_timer = state.emergency_timer.saturating_sub(1);
        state.min_hold_timer = state.min_hold_timer.saturating_sub(1);
        // Nominal expiry just parks the timer at zero
        state.count_down();

        if state.emergency_timer == 0 {
            warn!("Emergency ceiling reached, forcing minor road green");
            state.pending = None;
            state.advance(config);
        } else if state.min_hold_timer == 0 && state.pending.is_some() {
            debug!("Minimum hold over, serving pending {:?}", state.pending);
            state.advance(config);
        }
    }

    fn tick_branch(&mut self, state: &mut SignalState, config: &SignalConfig) {
        if state.count_down() {
            self.branch_elapsed = 0;
            state.advance(config);
            return;
        }

        self.branch_elapsed += 1;
        if self.branch_elapsed >= config.branch_ceiling && state.timer > 0 {
            info!(
                "Branch green cut after {} ticks despite continued demand",
                self.branch_elapsed
            );
            state.timer = 0;
        }
    }
}

impl ControlStrategy for Adaptive {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Adaptive
    }

    fn tick(&mut self, state: &mut SignalState, config: &SignalConfig) {
        match state.phase {
            Phase::PrimaryGreen => self.tick_primary(state, config),
            Phase::LeadGreen | Phase::TrailGreen => self.tick_branch(state, config),
            _ => {
                self.branch_elapsed = 0;
                if state.count_down() {
                    state.advance(config);
                }
            }
        }
    }

    fn on_sensor_event(
        &mut self,
        state: &mut SignalState,
        config: &SignalConfig,
        event: SensorEvent,
    ) {
        match event {
            SensorEvent::DemandDetected {
                branch,
                elapsed_green,
            } => {
                if state.phase != Phase::PrimaryGreen {
                    return;
                }
                if elapsed_green >= config.min_hold || state.min_hold_timer == 0 {
                    debug!("Demand on branch {:?}, switching now", branch);
                    state.pending = Some(branch);
                    state.advance(config);
                } else {
                    let remaining = config.min_hold - elapsed_green;
                    if state.pending.is_none() {
                        state.pending = Some(branch);
                    }
                    if state.timer > remaining {
                        state.timer = remaining;
                    }
                    debug!(
                        "Demand on branch {:?}, switch scheduled in {} ticks",
                        branch, remaining
                    );
                }
            }
            SensorEvent::Departed { branch, count } => {
                if !state.branch_green(branch) {
                    return;
                }
                if count >= config.max_vehicles_per_phase
                    || self.branch_elapsed >= config.branch_ceiling
                {
                    state.timer = 0;
                } else {
                    state.timer = config.branch_green;
                }
            }
        }
    }
}
