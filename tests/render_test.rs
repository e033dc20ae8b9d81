//! Console renderer fed from world snapshots

use signal_sim::render::{sync, ConsoleRenderer, Renderer};
use signal_sim::simulation::{
    Approach, Position, RoadClass, Route, SimConfig, SimWorld, TurnKind,
};

/// Skip the title, status and legend lines
fn grid_contains(map: &str, c: char) -> bool {
    map.lines().skip(3).any(|line| line.contains(c))
}

#[test]
fn test_renderer_mirrors_vehicle_lifecycle() {
    let mut world = SimWorld::new_with_seed(SimConfig::default(), 1).unwrap();
    world.start();
    let mut renderer = ConsoleRenderer::new(world.layout.clone());

    let route = Route::new(vec![Position::new(100.0, 100.0), Position::new(100.0, 110.0)]);
    world.spawn_on_route(RoadClass::Primary, Approach::North, TurnKind::Straight, route, 3.0);

    world.tick();
    sync(&mut renderer, &world.drain_events(), &world.snapshot());
    assert_eq!(renderer.vehicle_count(), 1);

    for _ in 0..200 {
        world.tick();
        sync(&mut renderer, &world.drain_events(), &world.snapshot());
    }
    assert_eq!(renderer.vehicle_count(), 0);
}

#[test]
fn test_map_shows_cars_and_signal() {
    let mut world = SimWorld::new_with_seed(SimConfig::default(), 1).unwrap();
    world.start();
    let mut renderer = ConsoleRenderer::new(world.layout.clone());
    assert_eq!(renderer.signal_line(), "Signal off");

    let route = Route::new(vec![Position::new(410.0, 100.0), Position::new(410.0, 900.0)]);
    world.spawn_on_route(RoadClass::Primary, Approach::North, TurnKind::Straight, route, 3.0);
    world.tick();
    sync(&mut renderer, &world.drain_events(), &world.snapshot());

    let map = renderer.render_map();
    assert!(map.contains("Primary green"));
    assert!(grid_contains(&map, 'P'));
    assert!(grid_contains(&map, '#'));

    renderer.clear();
    assert_eq!(renderer.vehicle_count(), 0);
    assert!(!grid_contains(&renderer.render_map(), 'P'));
}
