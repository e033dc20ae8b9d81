//! Periodic spawn scheduler

use signal_sim::simulation::{Approach, RoadClass, TurnKind};
use signal_sim::spawner::SpawnScheduler;

#[test]
fn test_requests_follow_intervals() {
    let mut scheduler = SpawnScheduler::with_seed(10, 25, 7);

    assert_eq!(scheduler.poll(0).len(), 2);
    assert!(scheduler.poll(5).is_empty());
    assert_eq!(scheduler.poll(10).len(), 1);
    assert_eq!(scheduler.poll(50).len(), 2);
}

#[test]
fn test_requests_match_road_classes() {
    let mut scheduler = SpawnScheduler::with_seed(1, 1, 42);
    let mut turns = Vec::new();

    for frame in 0..200 {
        for request in scheduler.poll(frame) {
            match request.class {
                RoadClass::Primary => {
                    assert_eq!(request.turn, TurnKind::Straight);
                    assert!(matches!(request.approach, Approach::North | Approach::South));
                }
                RoadClass::Secondary => {
                    assert!(matches!(request.approach, Approach::West | Approach::East));
                    turns.push(request.turn);
                }
            }
        }
    }

    assert!(turns.contains(&TurnKind::Left));
    assert!(turns.contains(&TurnKind::Right));
    assert!(turns.contains(&TurnKind::Straight));
}

#[test]
fn test_same_seed_same_requests() {
    let mut a = SpawnScheduler::with_seed(3, 4, 99);
    let mut b = SpawnScheduler::with_seed(3, 4, 99);
    for frame in 0..100 {
        assert_eq!(a.poll(frame), b.poll(frame));
    }
}

#[test]
fn test_zero_interval_disables_class() {
    let mut scheduler = SpawnScheduler::new(0, 0);
    assert!((0..100).all(|frame| scheduler.poll(frame).is_empty()));
}
