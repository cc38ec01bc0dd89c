//! Random-waypoint mobility
//!
//! Each node walks in a straight line towards a random target inside the
//! area at a random speed, then picks a new target. Fully determined by the
//! seed, so two runs with the same seed see identical movement.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use trustroute_core::{NodeId, Position};
use trustroute_mesh::{Positions, TopologyProvider};

#[derive(Debug, Clone)]
struct Walker {
    position: Position,
    target: Position,
    speed: f64,
}

/// Seeded random-waypoint model over a square area
#[derive(Debug, Clone)]
pub struct RandomWaypoint {
    walkers: Vec<Walker>,
    area: f64,
    min_speed: f64,
    max_speed: f64,
    clock: Duration,
    rng: StdRng,
}

impl RandomWaypoint {
    /// `nodes` walkers uniformly placed in `[0, area)²`, speeds in m/s
    pub fn new(nodes: u32, area: f64, min_speed: f64, max_speed: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let max_speed = max_speed.max(min_speed);
        let walkers = (0..nodes)
            .map(|_| Walker {
                position: random_point(&mut rng, area),
                target: random_point(&mut rng, area),
                speed: random_speed(&mut rng, min_speed, max_speed),
            })
            .collect();
        Self {
            walkers,
            area,
            min_speed,
            max_speed,
            clock: Duration::ZERO,
            rng,
        }
    }

    /// Move every walker forward to `now`; earlier times are ignored
    fn advance(&mut self, now: Duration) {
        if now <= self.clock {
            return;
        }
        let dt = (now - self.clock).as_secs_f64();
        self.clock = now;

        for walker in &mut self.walkers {
            let mut budget = walker.speed * dt;
            loop {
                let remaining = walker.position.distance_to(&walker.target);
                if remaining > budget {
                    let f = budget / remaining;
                    walker.position = Position::new(
                        walker.position.x + (walker.target.x - walker.position.x) * f,
                        walker.position.y + (walker.target.y - walker.position.y) * f,
                        0.0,
                    );
                    break;
                }
                budget -= remaining;
                walker.position = walker.target;
                walker.target = random_point(&mut self.rng, self.area);
                walker.speed = random_speed(&mut self.rng, self.min_speed, self.max_speed);
                if walker.speed <= 0.0 {
                    break;
                }
            }
        }
    }
}

impl TopologyProvider for RandomWaypoint {
    fn positions(&mut self, now: Duration) -> Positions {
        self.advance(now);
        self.walkers
            .iter()
            .enumerate()
            .map(|(i, walker)| (NodeId(i as u32), walker.position))
            .collect()
    }
}

fn random_point(rng: &mut StdRng, area: f64) -> Position {
    Position::new(rng.gen_range(0.0..area), rng.gen_range(0.0..area), 0.0)
}

fn random_speed(rng: &mut StdRng, min: f64, max: f64) -> f64 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}
