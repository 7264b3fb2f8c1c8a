//! Frame-level telemetry: wraps the game loop with Micromegas instrumentation.

use bevy::prelude::*;
use micromegas_tracing::prelude::{fmetric, imetric, span_scope};

use crate::components::Pellet;
use crate::plugins::ghosts::Ghost;

/// Ordering of gameplay work within a frame.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameSet {
    Input,
    Simulation,
    Presentation,
}

pub struct TelemetryPlugin;

impl Plugin for TelemetryPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (GameSet::Input, GameSet::Simulation, GameSet::Presentation).chain(),
        );
        app.add_systems(Last, (frame_telemetry, population_telemetry));
    }
}

fn frame_telemetry(time: Res<Time>) {
    span_scope!("frame");
    let dt_ms = time.delta_secs_f64() * 1000.0;
    fmetric!("frame_time_ms", "ms", dt_ms);
}

fn population_telemetry(ghosts: Query<(), With<Ghost>>, pellets: Query<(), With<Pellet>>) {
    imetric!("ghosts", "count", ghosts.iter().count() as u64);
    imetric!("pellets_remaining", "count", pellets.iter().count() as u64);
}
