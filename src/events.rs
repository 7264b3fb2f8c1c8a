//! Game events triggered by gameplay systems and observed by the session log.

use bevy::prelude::*;

use crate::components::GridPosition;

#[derive(Event, Debug)]
pub struct PelletEaten {
    pub cell: GridPosition,
}

#[derive(Event, Debug)]
pub struct PlayerCaught;

#[derive(Event, Debug)]
pub struct LevelCleared;
