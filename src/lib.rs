pub mod ai;
pub mod app_state;
pub mod components;
pub mod events;
pub mod plugins;
pub mod resources;
pub mod tracing_bridge;

use bevy::prelude::*;
use micromegas_tracing::prelude::{debug, info, span_fn, span_scope};

use app_state::{AppState, PlayingState};
use events::{LevelCleared, PelletEaten, PlayerCaught};
use plugins::camera::CameraPlugin;
use plugins::collectibles::CollectiblePlugin;
use plugins::game_over::GameOverPlugin;
use plugins::ghosts::GhostPlugin;
use plugins::maze::MazePlugin;
use plugins::movement::MovementPlugin;
use plugins::player::PlayerPlugin;
use plugins::telemetry::TelemetryPlugin;
use resources::{CONFIG_PATH, GameConfig, GameOutcome, Score};

pub struct Pacman3dPlugin;

impl Plugin for Pacman3dPlugin {
    fn build(&self, app: &mut App) {
        // State machine (StatesPlugin comes from DefaultPlugins)
        app.init_state::<AppState>();
        app.add_sub_state::<PlayingState>();

        if !app.world().contains_resource::<GameConfig>() {
            app.insert_resource(GameConfig::load_or_default(CONFIG_PATH));
        }

        // Game plugins
        app.add_plugins(CameraPlugin);
        app.add_plugins(MazePlugin);
        app.add_plugins(PlayerPlugin);
        app.add_plugins(MovementPlugin);
        app.add_plugins(GhostPlugin);
        app.add_plugins(CollectiblePlugin);
        app.add_plugins(GameOverPlugin);
        app.add_plugins(TelemetryPlugin);

        app.add_observer(log_pellet_eaten);
        app.add_observer(log_player_caught);
        app.add_observer(log_level_cleared);

        // Per-game-session resources: inserted fresh when the game starts,
        // kept through GameOver so the outcome can be reported.
        app.add_systems(OnEnter(AppState::InGame), init_game_session);
    }
}

/// Insert per-game-session resources with fresh defaults.
#[span_fn]
fn init_game_session(mut commands: Commands) {
    commands.insert_resource(Score(0));
    commands.insert_resource(GameOutcome::Undecided);
}

fn log_pellet_eaten(event: On<PelletEaten>) {
    debug!("pellet eaten at ({}, {})", event.cell.x, event.cell.z);
}

fn log_player_caught(_trigger: On<PlayerCaught>) {
    info!("a ghost caught the player");
}

fn log_level_cleared(_trigger: On<LevelCleared>) {
    info!("all pellets eaten");
}
