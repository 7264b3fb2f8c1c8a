pub mod camera;
pub mod collectibles;
pub mod game_over;
pub mod ghosts;
pub mod maze;
pub mod movement;
pub mod player;
pub mod telemetry;
