/*
 * Boid Flocking Viewer
 *
 * Draws a flock with nannou. All simulation logic lives in the library: the
 * viewer steps the flock once per frame and only reads each boid's position,
 * heading, kind and tail.
 *
 * Usage: boids-viewer [params.toml]
 */

use nannou::prelude::*;
use tracing_subscriber::EnvFilter;

use boids::{Flock, SimulationParams};

const BOID_SIZE: f32 = 6.0;
const PREDATORS: usize = 3;

struct Model {
    flock: Flock,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    nannou::app(model).update(update).run();
}

fn model(app: &App) -> Model {
    app.new_window()
        .title("Boid Flocking Simulation")
        .size(800, 800)
        .view(view)
        .build()
        .unwrap();

    let params = match std::env::args().nth(1) {
        Some(path) => SimulationParams::from_file(&path).unwrap_or_else(|err| {
            tracing::warn!(%path, %err, "falling back to default parameters");
            SimulationParams::default()
        }),
        None => SimulationParams::default(),
    };

    let mut flock = Flock::new(params).expect("default parameters are valid");
    for _ in 0..PREDATORS {
        flock.add_predator(None);
    }

    Model { flock }
}

fn update(_app: &App, model: &mut Model, _update: Update) {
    model.flock.step();
}

// Convert a unit-square position to window coordinates
fn to_screen(x: f64, y: f64, window_rect: Rect) -> Point2 {
    pt2(
        window_rect.left() + x as f32 * window_rect.w(),
        window_rect.bottom() + y as f32 * window_rect.h(),
    )
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    draw.background().color(rgb(20u8, 30, 50));

    let window_rect = app.window_rect();
    let points = [
        pt2(BOID_SIZE, 0.0),
        pt2(-BOID_SIZE, BOID_SIZE / 2.0),
        pt2(-BOID_SIZE, -BOID_SIZE / 2.0),
    ];

    for boid in model.flock.boids() {
        let color = if boid.is_predator() {
            rgb(230u8, 60, 60)
        } else {
            rgb(220u8, 220, 220)
        };

        let tail: Vec<Point2> = boid
            .tail()
            .map(|p| to_screen(p.x, p.y, window_rect))
            .collect();
        // Skip segments that jump across a wrapped edge
        for segment in tail.windows(2) {
            if segment[0].distance(segment[1]) < window_rect.w() / 2.0 {
                draw.line()
                    .start(segment[0])
                    .end(segment[1])
                    .weight(1.0)
                    .color(rgba(0.6, 0.6, 0.7, 0.3));
            }
        }

        draw.polygon()
            .color(color)
            .points(points.iter().cloned())
            .xy(to_screen(boid.position.x, boid.position.y, window_rect))
            .rotate(boid.heading() as f32);
    }

    draw.to_frame(app, &frame).unwrap();
}
