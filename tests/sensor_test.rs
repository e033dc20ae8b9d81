//! Demand sensor latching and departure counting

use signal_sim::simulation::{
    Approach, Branch, CarId, DemandSensor, Layout, Phase, Position, RoadClass, Route,
    SensorEvent, SignalConfig, SignalState, SimCar, TurnKind,
};

fn car(id: usize, class: RoadClass, approach: Approach, position: Position) -> SimCar {
    let mut car = SimCar::new(
        CarId(id),
        class,
        approach,
        TurnKind::Straight,
        Route::new(vec![position, Position::new(1100.0, position.y)]),
        2.0,
    );
    car.position = position;
    car
}

fn primary_green() -> SignalState {
    SignalState::new(&SignalConfig::default())
}

fn lead_green(lead: Branch) -> SignalState {
    SignalState {
        phase: Phase::LeadGreen,
        lead,
        ..primary_green()
    }
}

#[test]
fn test_arrival_during_primary_green_raises_demand_once() {
    let layout = Layout::standard();
    let mut sensor = DemandSensor::new(&layout);
    let mut signal = primary_green();
    signal.phase_elapsed = 7;

    let mut cars = vec![car(0, RoadClass::Secondary, Approach::West, Position::new(300.0, 365.0))];

    let events = sensor.detect(cars.iter_mut(), &signal);
    assert_eq!(
        events,
        vec![SensorEvent::DemandDetected {
            branch: Branch::A,
            elapsed_green: 7,
        }]
    );
    assert!(cars[0].sensor_latch[0]);

    // Still in the zone: latched, no new event
    assert!(sensor.detect(cars.iter_mut(), &signal).is_empty());
}

#[test]
fn test_primary_cars_are_ignored() {
    let layout = Layout::standard();
    let mut sensor = DemandSensor::new(&layout);
    let mut cars = vec![car(0, RoadClass::Primary, Approach::North, Position::new(300.0, 365.0))];

    assert!(sensor.detect(cars.iter_mut(), &primary_green()).is_empty());
    assert!(!cars[0].sensor_latch[0]);
}

#[test]
fn test_departure_during_own_green_is_counted() {
    let layout = Layout::standard();
    let mut sensor = DemandSensor::new(&layout);
    let mut cars = vec![
        car(0, RoadClass::Secondary, Approach::West, Position::new(300.0, 365.0)),
        car(1, RoadClass::Secondary, Approach::West, Position::new(230.0, 365.0)),
    ];
    sensor.detect(cars.iter_mut(), &primary_green());

    let signal = lead_green(Branch::A);
    cars[0].position = Position::new(400.0, 365.0);
    let events = sensor.detect(cars.iter_mut(), &signal);
    assert_eq!(
        events,
        vec![SensorEvent::Departed {
            branch: Branch::A,
            count: 1,
        }]
    );

    cars[1].position = Position::new(400.0, 365.0);
    let events = sensor.detect(cars.iter_mut(), &signal);
    assert_eq!(
        events,
        vec![SensorEvent::Departed {
            branch: Branch::A,
            count: 2,
        }]
    );
    assert_eq!(sensor.departures(Branch::A), 2);
    assert_eq!(sensor.departures(Branch::B), 0);
    assert_eq!(sensor.total_departures(), 2);

    sensor.reset_count(Branch::A);
    assert_eq!(sensor.departures(Branch::A), 0);
}

#[test]
fn test_leaving_on_red_only_unlatches() {
    let layout = Layout::standard();
    let mut sensor = DemandSensor::new(&layout);
    let mut cars = vec![car(0, RoadClass::Secondary, Approach::East, Position::new(600.0, 290.0))];

    let events = sensor.detect(cars.iter_mut(), &primary_green());
    assert_eq!(
        events,
        vec![SensorEvent::DemandDetected {
            branch: Branch::B,
            elapsed_green: 0,
        }]
    );
    assert!(cars[0].sensor_latch[1]);

    // Branch A has green, so B's zone does not count
    cars[0].position = Position::new(450.0, 290.0);
    assert!(sensor.detect(cars.iter_mut(), &lead_green(Branch::A)).is_empty());
    assert!(!cars[0].sensor_latch[1]);
    assert_eq!(sensor.departures(Branch::B), 0);
}

#[test]
fn test_waiting_car_retriggers_after_latch_reset() {
    let layout = Layout::standard();
    let mut sensor = DemandSensor::new(&layout);
    let mut cars = vec![car(0, RoadClass::Secondary, Approach::West, Position::new(300.0, 365.0))];

    // Arrives during yellow: latched without demand
    let yellow = SignalState {
        phase: Phase::YellowToPrimary,
        ..primary_green()
    };
    assert!(sensor.detect(cars.iter_mut(), &yellow).is_empty());
    assert!(sensor.detect(cars.iter_mut(), &primary_green()).is_empty());

    sensor.reset_latches(cars.iter_mut());
    let events = sensor.detect(cars.iter_mut(), &primary_green());
    assert_eq!(events.len(), 1);
}
