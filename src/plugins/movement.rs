//! First-person walking with axis-separated wall collision.
//!
//! The player is a circle on the ground plane. Each frame the requested
//! displacement is applied one axis at a time, and an axis is dropped when it
//! would push the circle into a wall cell, so the player slides along walls
//! instead of sticking to them.

use bevy::prelude::*;
use micromegas_tracing::prelude::{debug, span_fn, span_scope};

use crate::app_state::PlayingState;
use crate::components::{GridPosition, Look, Player, WalkInput};
use crate::plugins::maze::{Cell, MazeGrid};
use crate::plugins::telemetry::GameSet;
use crate::resources::GameConfig;

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (walk_player, sync_player_cell.after(walk_player))
                .in_set(GameSet::Simulation)
                .run_if(in_state(PlayingState::Playing)),
        );
    }
}

/// True if a circle at `(x, z)` with `radius` overlaps any wall cell.
pub fn overlaps_wall(grid: &MazeGrid, x: f32, z: f32, radius: f32) -> bool {
    if grid.is_wall_at_world(x, z) {
        return true;
    }
    let (cx, cz) = (x.round() as i32, z.round() as i32);
    for dz in -1..=1 {
        for dx in -1..=1 {
            let cell = GridPosition::new(cx + dx, cz + dz);
            if grid.cell(cell) != Some(Cell::Wall) {
                continue;
            }
            // Closest point of the unit square centred on the cell
            let nx = x.clamp(cell.x as f32 - 0.5, cell.x as f32 + 0.5);
            let nz = z.clamp(cell.z as f32 - 0.5, cell.z as f32 + 0.5);
            if (x - nx).powi(2) + (z - nz).powi(2) < radius * radius {
                return true;
            }
        }
    }
    false
}

/// Move from `from` by `delta`, X first then Z, keeping only the axes that
/// stay clear of walls. The Y component is left untouched.
pub fn resolve_move(grid: &MazeGrid, from: Vec3, delta: Vec3, radius: f32) -> Vec3 {
    let mut pos = from;
    if !overlaps_wall(grid, pos.x + delta.x, pos.z, radius) {
        pos.x += delta.x;
    }
    if !overlaps_wall(grid, pos.x, pos.z + delta.z, radius) {
        pos.z += delta.z;
    }
    pos
}

/// World-space displacement for a walk request at the given look angles.
pub fn walk_delta(look: &Look, input: Vec2, distance: f32) -> Vec3 {
    let front = look.ground_front();
    let right = front.cross(Vec3::Y).normalize_or_zero();
    (front * input.y + right * input.x).normalize_or_zero() * distance
}

#[span_fn]
fn walk_player(
    time: Res<Time>,
    config: Res<GameConfig>,
    grid: Option<Res<MazeGrid>>,
    mut query: Query<(&WalkInput, &Look, &mut Transform), With<Player>>,
) {
    let Some(grid) = grid else { return };
    let distance = config.player_speed * time.delta_secs();
    for (input, look, mut transform) in &mut query {
        if input.0 == Vec2::ZERO {
            continue;
        }
        let delta = walk_delta(look, input.0, distance);
        transform.translation = resolve_move(&grid, transform.translation, delta, config.player_radius);
    }
}

/// Keep the player's grid cell in step with its world position.
fn sync_player_cell(mut query: Query<(&Transform, &mut GridPosition), (With<Player>, Changed<Transform>)>) {
    for (transform, mut cell) in &mut query {
        let now = GridPosition::new(
            transform.translation.x.round() as i32,
            transform.translation.z.round() as i32,
        );
        if *cell != now {
            debug!("player entered cell ({}, {})", now.x, now.z);
            *cell = now;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
