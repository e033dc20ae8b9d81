//! Periodic random traffic for the headless runner
//!
//! The scheduler only produces requests; the world decides whether a request
//! can be honoured (movement allowed, spawn area clear).

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::simulation::{Approach, Movement, RoadClass, SpawnRequest};

const PRIMARY_APPROACHES: [Approach; 2] = [Approach::North, Approach::South];
const SECONDARY_APPROACHES: [Approach; 2] = [Approach::West, Approach::East];

/// Emits spawn requests at fixed per-class intervals, counted in frames
#[derive(Debug)]
pub struct SpawnScheduler {
    primary_every: u64,
    secondary_every: u64,
    rng: Option<StdRng>,
}

impl SpawnScheduler {
    /// An interval of zero disables that class
    pub fn new(primary_every: u64, secondary_every: u64) -> Self {
        Self {
            primary_every,
            secondary_every,
            rng: None,
        }
    }

    pub fn with_seed(primary_every: u64, secondary_every: u64, seed: u64) -> Self {
        Self {
            rng: Some(StdRng::seed_from_u64(seed)),
            ..Self::new(primary_every, secondary_every)
        }
    }

    /// Requests due at this frame
    pub fn poll(&mut self, frame: u64) -> Vec<SpawnRequest> {
        let mut requests = Vec::new();
        if due(frame, self.primary_every) {
            requests.extend(self.pick(RoadClass::Primary));
        }
        if due(frame, self.secondary_every) {
            requests.extend(self.pick(RoadClass::Secondary));
        }
        requests
    }

    /// Random approach for the class, then a random allowed movement
    fn pick(&mut self, class: RoadClass) -> Option<SpawnRequest> {
        let approaches: &[Approach] = match class {
            RoadClass::Primary => &PRIMARY_APPROACHES,
            RoadClass::Secondary => &SECONDARY_APPROACHES,
        };

        let approach = *self.choose(approaches)?;
        let movement = *self.choose(&Movement::options(class, approach))?;

        Some(SpawnRequest {
            class,
            approach,
            turn: movement.turn,
        })
    }

    fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        match &mut self.rng {
            Some(rng) => items.choose(rng),
            None => items.choose(&mut rand::rng()),
        }
    }
}

fn due(frame: u64, every: u64) -> bool {
    every > 0 && frame % every == 0
}

