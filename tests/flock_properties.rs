use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use boids::{Boid, BoundaryMode, Flock, Kind, NeighborSearch, SimulationParams, Vector2};

fn quiet(params: SimulationParams) -> SimulationParams {
    SimulationParams {
        cohesion_weight: 0.0,
        separation_weight: 0.0,
        alignment_weight: 0.0,
        fear_weight: 0.0,
        ..params
    }
}

fn busy_flock(boundary: BoundaryMode, search: NeighborSearch, seed: u64) -> Flock {
    let params = SimulationParams {
        num_boids: 150,
        boundary,
        neighbor_search: search,
        // Larger radii so every rule fires often
        cohesion_radius: 0.15,
        separation_radius: 0.05,
        alignment_radius: 0.1,
        fear_radius: 0.15,
        ..Default::default()
    };
    let mut flock = Flock::with_seed(params, seed).unwrap();
    for _ in 0..5 {
        flock.add_predator(None);
    }
    flock
}

#[test]
fn speed_never_exceeds_max() {
    for boundary in [BoundaryMode::Wrap, BoundaryMode::Bounce] {
        for search in [NeighborSearch::Linear, NeighborSearch::KdTree] {
            let mut flock = busy_flock(boundary, search, 11);
            let max_speed = flock.params().max_speed;
            for _ in 0..200 {
                flock.step();
                for boid in flock.boids() {
                    assert!(boid.speed() <= max_speed * (1.0 + 1e-9), "speed {} in {boundary:?}", boid.speed());
                }
            }
        }
    }
}

#[test]
fn wrap_keeps_positions_in_unit_square() {
    let mut flock = busy_flock(BoundaryMode::Wrap, NeighborSearch::Linear, 12);
    flock.update_params(|p| p.max_speed = 0.05).unwrap();
    for _ in 0..300 {
        flock.step();
        for boid in flock.boids() {
            let p = boid.position;
            assert!((0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.y), "escaped to {p}");
        }
    }
}

#[test]
fn bounce_contains_boids_starting_inside() {
    let mut rng = StdRng::seed_from_u64(13);
    let params = SimulationParams::default();
    let boids: Vec<Boid> = (0..100)
        .map(|_| {
            let position = Vector2::new(rng.gen_range(0.25..0.75), rng.gen_range(0.25..0.75));
            Boid::at(&mut rng, position, params.max_speed, Kind::Normal)
        })
        .collect();
    let mut flock = Flock::from_boids(boids, params).unwrap();

    let epsilon = 0.01;
    for _ in 0..200 {
        flock.step();
        for boid in flock.boids() {
            let p = boid.position;
            assert!(p.x >= -epsilon && p.x <= 1.0 + epsilon, "escaped to {p}");
            assert!(p.y >= -epsilon && p.y <= 1.0 + epsilon, "escaped to {p}");
        }
    }
}

#[test]
fn bounce_turns_a_boid_heading_for_the_wall() {
    let params = quiet(SimulationParams::default());
    let starts = [
        (Vector2::new(0.01, 0.5), Vector2::new(-0.001, 0.0)),
        (Vector2::new(0.01, 0.01), Vector2::new(-0.0007, -0.0007)),
        (Vector2::new(0.99, 0.3), Vector2::new(0.001, 0.0002)),
    ];
    for (position, velocity) in starts {
        let boids = vec![Boid::new(position, velocity, Kind::Normal)];
        let mut flock = Flock::from_boids(boids, params).unwrap();
        for _ in 0..3000 {
            flock.step();
            let p = flock.boids()[0].position;
            assert!(p.x > -1e-3 && p.x < 1.0 + 1e-3, "escaped to {p}");
            assert!(p.y > -1e-3 && p.y < 1.0 + 1e-3, "escaped to {p}");
        }
    }
}

#[test]
fn cohesion_pulls_two_boids_together() {
    let params = SimulationParams {
        cohesion_weight: 0.1,
        cohesion_radius: 0.2,
        max_speed: 0.05,
        ..quiet(SimulationParams::default())
    };
    let boids = vec![
        Boid::new(Vector2::new(0.45, 0.5), Vector2::new(0.0005, 0.0), Kind::Normal),
        Boid::new(Vector2::new(0.55, 0.5), Vector2::new(-0.0005, 0.0), Kind::Normal),
    ];
    let mut flock = Flock::from_boids(boids, params).unwrap();
    flock.step();

    let left = &flock.boids()[0];
    let right = &flock.boids()[1];
    // 0.0005 + (0.55 - 0.45) * 0.1
    assert!((left.velocity.x - 0.0105).abs() < 1e-9);
    assert!(right.velocity.x < -0.0005 - 0.005);
    assert!(left.velocity.y.abs() < 1e-12 && right.velocity.y.abs() < 1e-12);
}

#[test]
fn cohesion_between_coincident_boids_is_zero() {
    let params = SimulationParams {
        cohesion_weight: 0.1,
        cohesion_radius: 0.2,
        ..quiet(SimulationParams::default())
    };
    let boids = vec![
        Boid::new(Vector2::new(0.5, 0.5), Vector2::new(0.0005, 0.0), Kind::Normal),
        Boid::new(Vector2::new(0.5, 0.5), Vector2::new(-0.0005, 0.0), Kind::Normal),
    ];
    let mut flock = Flock::from_boids(boids, params).unwrap();
    flock.step();
    assert_eq!(flock.boids()[0].velocity, Vector2::new(0.0005, 0.0));
}

#[test]
fn bounce_pushes_edge_boid_inward() {
    let params = quiet(SimulationParams::default());
    let boids = vec![Boid::new(Vector2::new(0.001, 0.5), Vector2::new(-0.0005, 0.0), Kind::Normal)];
    let mut flock = Flock::from_boids(boids, params).unwrap();
    flock.step();
    assert!(flock.boids()[0].velocity.x > -0.0005);
}

#[test]
fn wrap_reenters_from_opposite_edge() {
    let params = SimulationParams {
        boundary: BoundaryMode::Wrap,
        max_speed: 0.02,
        ..quiet(SimulationParams::default())
    };
    let boids = vec![Boid::new(Vector2::new(0.999, 0.5), Vector2::new(0.01, 0.0), Kind::Normal)];
    let mut flock = Flock::from_boids(boids, params).unwrap();
    flock.step();
    let p = flock.boids()[0].position;
    assert!((p.x - 0.009).abs() < 1e-9, "landed at {p}");
    assert!((p.y - 0.5).abs() < 1e-12);
}

#[test]
fn predators_scatter_prey() {
    let params = SimulationParams {
        fear_weight: 0.2,
        boundary: BoundaryMode::Wrap,
        ..quiet(SimulationParams::default())
    };
    let boids = vec![
        Boid::new(Vector2::new(0.5, 0.5), Vector2::new(0.0, 0.001), Kind::Normal),
        Boid::new(Vector2::new(0.5, 0.55), Vector2::ZERO, Kind::Predator),
    ];
    let mut flock = Flock::from_boids(boids, params).unwrap();
    flock.step();
    // Position is turned about the origin, velocity is left alone
    let prey = &flock.boids()[0];
    assert!(prey.position.x < 0.4);
    assert!(prey.position.y > 0.6);
    assert!((prey.velocity.y - 0.001).abs() < 1e-12);
}

#[test]
fn kdtree_search_matches_linear_search() {
    for boundary in [BoundaryMode::Wrap, BoundaryMode::Bounce] {
        let mut linear = busy_flock(boundary, NeighborSearch::Linear, 21);
        let mut indexed = busy_flock(boundary, NeighborSearch::KdTree, 21);
        for _ in 0..100 {
            linear.step();
            indexed.step();
        }
        for (a, b) in linear.boids().iter().zip(indexed.boids()) {
            assert_eq!(a.position, b.position, "{boundary:?}");
            assert_eq!(a.velocity, b.velocity, "{boundary:?}");
        }
    }
}

#[test]
fn switching_search_mid_run_is_seamless() {
    let mut reference = busy_flock(BoundaryMode::Bounce, NeighborSearch::Linear, 22);
    let mut switched = busy_flock(BoundaryMode::Bounce, NeighborSearch::Linear, 22);
    for tick in 0..60 {
        if tick == 30 {
            switched.update_params(|p| p.neighbor_search = NeighborSearch::KdTree).unwrap();
        }
        reference.step();
        switched.step();
    }
    for (a, b) in reference.boids().iter().zip(switched.boids()) {
        assert_eq!(a.position, b.position);
    }
}

#[test]
fn flocks_keep_independent_parameters() {
    let calm = SimulationParams {
        num_boids: 20,
        ..quiet(SimulationParams::default())
    };
    let lively = SimulationParams {
        num_boids: 20,
        cohesion_weight: 0.3,
        ..Default::default()
    };
    let mut a = Flock::with_seed(calm, 5).unwrap();
    let mut b = Flock::with_seed(lively, 5).unwrap();
    a.step();
    b.step();
    assert_eq!(a.params().cohesion_weight, 0.0);
    assert_eq!(b.params().cohesion_weight, 0.3);
}
