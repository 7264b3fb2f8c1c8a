use bevy::input::mouse::AccumulatedMouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, CursorOptions, PrimaryWindow};
use micromegas_tracing::prelude::{debug, span_fn, span_scope};

use super::telemetry::GameSet;
use crate::app_state::PlayingState;
use crate::components::{Look, Player};
use crate::resources::GameConfig;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_sun);
        app.add_systems(
            Update,
            mouse_look
                .in_set(GameSet::Input)
                .run_if(in_state(PlayingState::Playing)),
        );
        app.add_systems(Update, apply_look.in_set(GameSet::Presentation));
        app.add_systems(OnEnter(PlayingState::Playing), grab_cursor);
        app.add_systems(OnExit(PlayingState::Playing), release_cursor);
    }
}

fn spawn_sun(mut commands: Commands) {
    commands.spawn((
        DirectionalLight {
            illuminance: 3_000.0,
            ..default()
        },
        Transform::from_xyz(4.0, 10.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

/// Turn the view by this frame's accumulated mouse motion.
#[span_fn]
fn mouse_look(
    motion: Res<AccumulatedMouseMotion>,
    config: Res<GameConfig>,
    mut query: Query<&mut Look, With<Player>>,
) {
    if motion.delta == Vec2::ZERO {
        return;
    }
    for mut look in &mut query {
        look.turn(motion.delta, config.mouse_sensitivity);
    }
}

/// Point the camera along its view angles.
fn apply_look(mut query: Query<(&Look, &mut Transform), Changed<Look>>) {
    for (look, mut transform) in &mut query {
        transform.look_to(look.front(), Vec3::Y);
    }
}

fn grab_cursor(mut windows: Query<&mut CursorOptions, With<PrimaryWindow>>) {
    let Ok(mut cursor) = windows.single_mut() else {
        return;
    };
    cursor.grab_mode = CursorGrabMode::Locked;
    cursor.visible = false;
    debug!("cursor locked");
}

fn release_cursor(mut windows: Query<&mut CursorOptions, With<PrimaryWindow>>) {
    let Ok(mut cursor) = windows.single_mut() else {
        return;
    };
    cursor.grab_mode = CursorGrabMode::None;
    cursor.visible = true;
    debug!("cursor released");
}
