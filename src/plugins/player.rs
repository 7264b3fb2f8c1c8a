//! Player spawning and input handling.
//!
//! The player is the first-person camera itself: one entity carries the
//! `Camera3d`, the view angles, and the walk request.

use bevy::prelude::*;
use micromegas_tracing::prelude::{info, span_fn, span_scope};

use crate::app_state::{AppState, PlayingState};
use crate::components::*;
use crate::plugins::maze::{PlayerSpawn, grid_to_world, load_maze};
use crate::plugins::telemetry::GameSet;
use crate::resources::GameConfig;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::InGame), spawn_player.after(load_maze));
        app.add_systems(
            Update,
            player_input
                .in_set(GameSet::Input)
                .run_if(in_state(PlayingState::Playing)),
        );
        app.add_systems(
            Update,
            toggle_pause
                .in_set(GameSet::Input)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

const EYE_HEIGHT: f32 = 0.0;

/// Spawn the player camera at the level's spawn cell.
#[span_fn]
pub fn spawn_player(mut commands: Commands, spawn: Res<PlayerSpawn>, config: Res<GameConfig>) {
    let pos = spawn.0;
    let look = Look::default();
    let eye = grid_to_world(pos, EYE_HEIGHT);

    commands.spawn((
        Player,
        pos,
        look,
        WalkInput::default(),
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: config.fov_degrees.to_radians(),
            near: 0.1,
            far: 100.0,
            ..default()
        }),
        Transform::from_translation(eye).looking_to(look.front(), Vec3::Y),
        PointLight {
            intensity: 40_000.0,
            range: 12.0,
            ..default()
        },
    ));
    info!("player spawned at ({}, {})", pos.x, pos.z);
}

/// Read WASD and buffer this frame's walk request.
#[span_fn]
fn player_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut query: Query<&mut WalkInput, With<Player>>,
) {
    let mut wish = Vec2::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        wish.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        wish.y -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        wish.x += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        wish.x -= 1.0;
    }
    for mut input in &mut query {
        input.0 = wish;
    }
}

fn toggle_pause(
    keyboard: Res<ButtonInput<KeyCode>>,
    state: Res<State<PlayingState>>,
    mut next_state: ResMut<NextState<PlayingState>>,
) {
    if !keyboard.just_pressed(KeyCode::Escape) {
        return;
    }
    let next = match state.get() {
        PlayingState::Playing => PlayingState::Paused,
        PlayingState::Paused => PlayingState::Playing,
    };
    info!("{:?} -> {:?}", state.get(), next);
    next_state.set(next);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
