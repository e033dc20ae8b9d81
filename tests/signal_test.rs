//! Signal controller and control strategies

use signal_sim::simulation::{
    Branch, Phase, PhasePlan, RoadClass, SensorEvent, SignalConfig, SignalController, StrategyKind,
};

fn controller(kind: StrategyKind) -> SignalController {
    SignalController::new(SignalConfig::default(), kind)
}

/// Drive an adaptive controller into its lead branch green
fn adaptive_in_lead_green(branch: Branch) -> SignalController {
    let mut signal = controller(StrategyKind::Adaptive);
    for _ in 0..15 {
        signal.tick();
    }
    let elapsed_green = signal.state().phase_elapsed;
    signal.on_sensor_event(SensorEvent::DemandDetected {
        branch,
        elapsed_green,
    });
    for _ in 0..10 {
        if signal.state().phase == Phase::LeadGreen {
            break;
        }
        signal.tick();
    }
    assert_eq!(signal.state().phase, Phase::LeadGreen);
    signal
}

#[test]
fn test_initial_state() {
    let signal = controller(StrategyKind::Adaptive);
    let state = signal.state();
    assert_eq!(state.phase, Phase::PrimaryGreen);
    assert_eq!(state.timer, 30);
    assert_eq!(state.emergency_timer, 120);
    assert_eq!(state.min_hold_timer, 15);
    assert_eq!(state.pending, None);
    assert!(state.grants(RoadClass::Primary, None));
    assert!(!state.grants(RoadClass::Secondary, Some(Branch::A)));
    assert!(!state.grants(RoadClass::Secondary, None));
}

#[test]
fn test_fixed_time_ring_never_skips_a_phase() {
    let mut signal = controller(StrategyKind::FixedTime);
    let mut observed = vec![signal.state().phase];

    for _ in 0..500 {
        let (from, to) = signal.tick();
        if from != to {
            assert_eq!(to, from.next(PhasePlan::SplitBranches));
            observed.push(to);
        }
    }

    assert_eq!(
        &observed[..7],
        &[
            Phase::PrimaryGreen,
            Phase::YellowToLead,
            Phase::LeadGreen,
            Phase::YellowToTrail,
            Phase::TrailGreen,
            Phase::YellowToPrimary,
            Phase::PrimaryGreen,
        ]
    );
}

#[test]
fn test_fixed_time_durations() {
    let mut signal = controller(StrategyKind::FixedTime);

    // A phase of duration d occupies d + 1 ticks
    for _ in 0..30 {
        signal.tick();
        assert_eq!(signal.state().phase, Phase::PrimaryGreen);
    }
    signal.tick();
    assert_eq!(signal.state().phase, Phase::YellowToLead);
    assert_eq!(signal.state().timer, 1);

    signal.tick();
    assert_eq!(signal.state().phase, Phase::YellowToLead);
    signal.tick();
    assert_eq!(signal.state().phase, Phase::LeadGreen);
    assert_eq!(signal.state().timer, 5);
}

#[test]
fn test_fixed_time_alternates_lead_branch() {
    let mut signal = controller(StrategyKind::FixedTime);
    let mut leads = Vec::new();

    for _ in 0..200 {
        let (from, to) = signal.tick();
        if from != to && to == Phase::LeadGreen {
            leads.push(signal.state().lead);
            assert_eq!(signal.state().green_branch(), Some(signal.state().lead));
        }
        if from != to && to == Phase::TrailGreen {
            assert_eq!(signal.state().green_branch(), Some(signal.state().lead.other()));
        }
    }

    assert!(leads.len() >= 3);
    assert_eq!(&leads[..3], &[Branch::A, Branch::B, Branch::A]);
}

#[test]
fn test_fixed_time_ignores_sensor_events() {
    let mut signal = controller(StrategyKind::FixedTime);
    for _ in 0..20 {
        signal.tick();
    }
    let before = signal.state().clone();
    signal.on_sensor_event(SensorEvent::DemandDetected {
        branch: Branch::B,
        elapsed_green: 20,
    });
    assert_eq!(signal.state(), &before);
}

#[test]
fn test_demand_after_min_hold_switches_at_once() {
    let mut signal = controller(StrategyKind::Adaptive);
    for _ in 0..15 {
        signal.tick();
    }
    assert_eq!(signal.state().phase, Phase::PrimaryGreen);

    let (from, to) = signal.on_sensor_event(SensorEvent::DemandDetected {
        branch: Branch::B,
        elapsed_green: 15,
    });
    assert_eq!(from, Phase::PrimaryGreen);
    assert_eq!(to, Phase::YellowToLead);
    assert_eq!(signal.state().lead, Branch::B);
}

#[test]
fn test_early_demand_waits_for_min_hold() {
    let mut signal = controller(StrategyKind::Adaptive);
    for _ in 0..5 {
        signal.tick();
    }
    signal.on_sensor_event(SensorEvent::DemandDetected {
        branch: Branch::B,
        elapsed_green: 5,
    });
    assert_eq!(signal.state().pending, Some(Branch::B));
    assert_eq!(signal.state().timer, 10);

    for _ in 0..9 {
        signal.tick();
        assert_eq!(signal.state().phase, Phase::PrimaryGreen);
    }
    signal.tick();
    assert_eq!(signal.state().phase, Phase::YellowToLead);
    assert_eq!(signal.state().lead, Branch::B);
    assert_eq!(signal.state().pending, None);
}

#[test]
fn test_adaptive_primary_holds_until_emergency_ceiling() {
    let mut signal = controller(StrategyKind::Adaptive);

    for _ in 0..119 {
        signal.tick();
        assert_eq!(signal.state().phase, Phase::PrimaryGreen);
    }
    signal.tick();
    assert_eq!(signal.state().phase, Phase::YellowToLead);
    assert_eq!(signal.state().lead, Branch::A);
}

#[test]
fn test_departure_at_cap_ends_branch_green() {
    let mut signal = adaptive_in_lead_green(Branch::A);

    signal.on_sensor_event(SensorEvent::Departed {
        branch: Branch::A,
        count: 2,
    });
    assert_eq!(signal.state().timer, 5);

    signal.on_sensor_event(SensorEvent::Departed {
        branch: Branch::A,
        count: 5,
    });
    assert_eq!(signal.state().timer, 0);

    signal.tick();
    assert_eq!(signal.state().phase, Phase::YellowToTrail);
}

#[test]
fn test_departure_from_red_branch_is_ignored() {
    let mut signal = adaptive_in_lead_green(Branch::A);
    signal.tick();
    let timer = signal.state().timer;

    signal.on_sensor_event(SensorEvent::Departed {
        branch: Branch::B,
        count: 5,
    });
    assert_eq!(signal.state().timer, timer);
}

#[test]
fn test_branch_ceiling_beats_continuous_departures() {
    let mut signal = adaptive_in_lead_green(Branch::B);
    let mut ticks = 0;

    while signal.state().phase == Phase::LeadGreen {
        signal.on_sensor_event(SensorEvent::Departed {
            branch: Branch::B,
            count: 1,
        });
        signal.tick();
        ticks += 1;
        assert!(ticks <= 22, "branch green outlived its ceiling");
    }
    assert_eq!(signal.state().phase, Phase::YellowToTrail);
}

#[test]
fn test_branch_green_without_departures_runs_nominal_time() {
    let mut signal = adaptive_in_lead_green(Branch::A);
    let mut ticks = 0;
    while signal.state().phase == Phase::LeadGreen {
        signal.tick();
        ticks += 1;
    }
    assert_eq!(ticks, 6);
}

#[test]
fn test_shared_branch_plan() {
    let config = SignalConfig {
        plan: PhasePlan::SharedBranch,
        ..SignalConfig::default()
    };
    let mut signal = SignalController::new(config, StrategyKind::FixedTime);
    let mut observed = vec![signal.state().phase];

    for _ in 0..200 {
        let (from, to) = signal.tick();
        if from != to {
            assert_eq!(to, from.next(PhasePlan::SharedBranch));
            observed.push(to);
            if to == Phase::LeadGreen {
                let state = signal.state();
                assert!(state.branch_green(Branch::A) && state.branch_green(Branch::B));
                assert_eq!(state.green_branch(), None);
            }
        }
    }

    assert!(!observed.contains(&Phase::TrailGreen));
    assert_eq!(
        &observed[..5],
        &[
            Phase::PrimaryGreen,
            Phase::YellowToLead,
            Phase::LeadGreen,
            Phase::YellowToPrimary,
            Phase::PrimaryGreen,
        ]
    );
    assert_eq!(Phase::cycle_len(PhasePlan::SharedBranch), 4);
}

#[test]
fn test_strategy_swap_keeps_signal_state() {
    let mut signal = controller(StrategyKind::Adaptive);
    for _ in 0..40 {
        signal.tick();
    }
    let before = signal.state().clone();
    assert_eq!(before.phase, Phase::PrimaryGreen);
    assert_eq!(before.timer, 0);

    signal.set_strategy(StrategyKind::FixedTime);
    assert_eq!(signal.strategy_kind(), StrategyKind::FixedTime);
    assert_eq!(signal.state(), &before);

    // The overrun primary green ends on the next fixed-time tick
    signal.tick();
    assert_eq!(signal.state().phase, Phase::YellowToLead);
}

#[test]
fn test_snapshot_display_timer() {
    let mut signal = controller(StrategyKind::Adaptive);
    signal.tick();

    let snapshot = signal.state().snapshot();
    assert_eq!(snapshot.emergency_timer, Some(119));
    assert_eq!(snapshot.display_timer(), 119);
    assert_eq!(snapshot.status_text(), "Primary green");

    let signal = adaptive_in_lead_green(Branch::B);
    let snapshot = signal.state().snapshot();
    assert_eq!(snapshot.emergency_timer, None);
    assert_eq!(snapshot.display_timer(), snapshot.timer);
    assert_eq!(snapshot.green_branch, Some(Branch::B));
    assert_eq!(snapshot.status_text(), "Minor branch B green");
}

#[test]
fn test_reset_restores_initial_state() {
    let mut signal = controller(StrategyKind::FixedTime);
    for _ in 0..77 {
        signal.tick();
    }
    signal.reset(SignalConfig::default());
    assert_eq!(
        signal.state(),
        controller(StrategyKind::FixedTime).state()
    );
}

#[test]
fn test_strategy_names_parse() {
    assert_eq!("fixed".parse::<StrategyKind>().unwrap(), StrategyKind::FixedTime);
    assert_eq!("Adaptive".parse::<StrategyKind>().unwrap(), StrategyKind::Adaptive);
    assert!("round-robin".parse::<StrategyKind>().is_err());
}

#[test]
fn test_invalid_config_rejected() {
    let config = SignalConfig {
        min_hold: 200,
        ..SignalConfig::default()
    };
    assert!(config.validate().is_err());
    assert!(SignalConfig::default().validate().is_ok());
}
