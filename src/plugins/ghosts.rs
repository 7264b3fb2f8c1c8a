//! Ghost spawning, per-tick patrol updates, and catching the player.

use bevy::math::Vec3Swizzles;
use bevy::prelude::*;
use micromegas_tracing::prelude::{debug, info, span_fn, span_scope, warn};

use crate::ai::ghost::GhostAgent;
use crate::ai::pick_ghost_spawns;
use crate::app_state::{AppState, PlayingState};
use crate::components::{GridPosition, Player};
use crate::events::PlayerCaught;
use crate::plugins::collectibles::check_level_cleared;
use crate::plugins::maze::{MazeGrid, PlayerSpawn, load_maze};
use crate::plugins::telemetry::GameSet;
use crate::resources::{GameConfig, GameOutcome, GhostRng};

pub struct GhostPlugin;

impl Plugin for GhostPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(AppState::InGame),
            (seed_ghost_rng, spawn_ghosts.after(seed_ghost_rng).after(load_maze)),
        );
        app.add_systems(
            Update,
            (
                ghost_tick,
                sync_ghost_transforms.after(ghost_tick),
                ghost_catches_player
                    .after(ghost_tick)
                    .after(check_level_cleared),
            )
                .in_set(GameSet::Simulation)
                .run_if(in_state(PlayingState::Playing)),
        );
        app.add_systems(OnExit(AppState::InGame), remove_ghost_rng);
    }
}

const GHOST_COLORS: [Color; 4] = [
    Color::srgb(1.0, 0.0, 0.0),
    Color::srgb(1.0, 0.7, 1.0),
    Color::srgb(0.0, 1.0, 1.0),
    Color::srgb(1.0, 0.7, 0.4),
];

const GHOST_SIZE: f32 = 0.5;

/// A patrolling ghost. Its `Transform` and `GridPosition` follow the agent.
#[derive(Component, Debug)]
pub struct Ghost(pub GhostAgent);

fn seed_ghost_rng(mut commands: Commands, config: Res<GameConfig>) {
    commands.insert_resource(GhostRng::from_seed(config.rng_seed));
}

fn remove_ghost_rng(mut commands: Commands) {
    commands.remove_resource::<GhostRng>();
}

/// Place the configured number of ghosts on random cells away from the player.
#[span_fn]
pub fn spawn_ghosts(
    mut commands: Commands,
    grid: Res<MazeGrid>,
    spawn: Res<PlayerSpawn>,
    config: Res<GameConfig>,
    mut rng: ResMut<GhostRng>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let cells = pick_ghost_spawns(
        &grid,
        spawn.0,
        config.ghost_count,
        config.min_spawn_distance,
        &mut *rng,
    );
    if cells.len() < config.ghost_count {
        warn!(
            "only {} of {} ghosts fit in this maze",
            cells.len(),
            config.ghost_count
        );
    }

    let mesh = meshes.add(Sphere::new(GHOST_SIZE / 2.0));
    for (i, cell) in cells.into_iter().enumerate() {
        let agent = match GhostAgent::new(cell, config.ghost_height, &grid) {
            Ok(agent) => agent,
            Err(e) => {
                warn!("skipping ghost: {}", e);
                continue;
            }
        };
        let material = materials.add(StandardMaterial {
            base_color: GHOST_COLORS[i % GHOST_COLORS.len()],
            ..default()
        });
        commands.spawn((
            Transform::from_translation(agent.render_position()),
            Ghost(agent),
            cell,
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material),
        ));
        debug!("ghost {} spawned at ({}, {})", i, cell.x, cell.z);
    }
}

/// Advance every ghost one tick. Ghosts run one after another against the
/// same grid, so each sees the cells marked by those before it.
#[span_fn]
pub fn ghost_tick(
    time: Res<Time>,
    config: Res<GameConfig>,
    mut grid: ResMut<MazeGrid>,
    mut rng: ResMut<GhostRng>,
    mut ghosts: Query<&mut Ghost>,
) {
    let dt = time.delta_secs() * config.ghost_speed;
    for mut ghost in &mut ghosts {
        ghost.0.update(dt, &mut grid, &mut *rng);
    }
}

fn sync_ghost_transforms(mut ghosts: Query<(&Ghost, &mut Transform, &mut GridPosition)>) {
    for (ghost, mut transform, mut cell) in &mut ghosts {
        transform.translation = ghost.0.render_position();
        *cell = ghost.0.grid_position();
    }
}

/// End the game when a ghost gets within reach of the player on the ground plane.
/// A level cleared earlier in the same frame stays won.
#[span_fn]
pub fn ghost_catches_player(
    mut commands: Commands,
    config: Res<GameConfig>,
    player: Query<&Transform, With<Player>>,
    ghosts: Query<&Ghost>,
    mut outcome: ResMut<GameOutcome>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if *outcome != GameOutcome::Undecided {
        return;
    }
    let Ok(player) = player.single() else {
        return;
    };
    let player_xz = player.translation.xz();
    for ghost in &ghosts {
        let ghost_xz = ghost.0.render_position().xz();
        if ghost_xz.distance(player_xz) < config.catch_radius {
            info!(
                "player caught at ({:.2}, {:.2})",
                player_xz.x, player_xz.y
            );
            *outcome = GameOutcome::Caught;
            commands.trigger(PlayerCaught);
            next_state.set(AppState::GameOver);
            return;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    const CORRIDOR: &str = "#######\n#.....#\n#######";

    fn setup_app(grid: MazeGrid) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(StatesPlugin);
        app.init_state::<AppState>();
        app.add_sub_state::<PlayingState>();
        app.insert_resource(GameConfig::default());
        app.insert_resource(GameOutcome::Undecided);
        app.insert_resource(GhostRng::from_seed(Some(1)));
        app.insert_resource(grid);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)));
        app.add_systems(
            Update,
            (
                ghost_tick,
                sync_ghost_transforms.after(ghost_tick),
                ghost_catches_player.after(ghost_tick),
            )
                .run_if(in_state(PlayingState::Playing)),
        );

        for _ in 0..5 {
            app.update();
        }
        app
    }

    fn spawn_ghost(app: &mut App, cell: GridPosition) -> Entity {
        let agent = {
            let grid = app.world().resource::<MazeGrid>();
            GhostAgent::new(cell, -0.25, grid).unwrap()
        };
        app.world_mut()
            .spawn((Ghost(agent), cell, Transform::default()))
            .id()
    }

    #[test]
    fn ghosts_patrol_and_mark_grid() {
        let mut app = setup_app(MazeGrid::from_ascii(CORRIDOR).unwrap());
        let ghost = spawn_ghost(&mut app, GridPosition::new(1, 1));

        for _ in 0..40 {
            app.update();
        }

        let agent = &app.world().entity(ghost).get::<Ghost>().unwrap().0;
        assert_ne!(agent.grid_position(), GridPosition::new(1, 1));
        assert!(app.world().resource::<MazeGrid>().visited_count() > 0);

        let transform = app.world().entity(ghost).get::<Transform>().unwrap();
        assert_eq!(transform.translation, agent.render_position());
        let cell = app.world().entity(ghost).get::<GridPosition>().unwrap();
        assert_eq!(*cell, agent.grid_position());
    }

    #[test]
    fn ghost_touching_player_ends_game() {
        let mut app = setup_app(MazeGrid::from_ascii(CORRIDOR).unwrap());
        spawn_ghost(&mut app, GridPosition::new(1, 1));
        app.world_mut()
            .spawn((Player, Transform::from_xyz(1.1, 0.0, 1.0)));

        for _ in 0..5 {
            app.update();
        }

        assert_eq!(*app.world().resource::<GameOutcome>(), GameOutcome::Caught);
        let state = app.world().resource::<State<AppState>>();
        assert_eq!(*state.get(), AppState::GameOver);
    }

    #[test]
    fn catch_does_not_override_a_won_level() {
        let mut app = setup_app(MazeGrid::from_ascii(CORRIDOR).unwrap());
        app.insert_resource(GameOutcome::Won);
        spawn_ghost(&mut app, GridPosition::new(1, 1));
        app.world_mut()
            .spawn((Player, Transform::from_xyz(1.0, 0.0, 1.0)));

        app.update();

        assert_eq!(*app.world().resource::<GameOutcome>(), GameOutcome::Won);
        let state = app.world().resource::<State<AppState>>();
        assert_eq!(*state.get(), AppState::InGame);
    }

    #[test]
    fn distant_ghost_is_harmless() {
        let mut app = setup_app(MazeGrid::from_ascii(CORRIDOR).unwrap());
        spawn_ghost(&mut app, GridPosition::new(1, 1));
        app.world_mut()
            .spawn((Player, Transform::from_xyz(5.0, 0.0, 8.0)));

        for _ in 0..20 {
            app.update();
        }

        assert_eq!(
            *app.world().resource::<GameOutcome>(),
            GameOutcome::Undecided
        );
        let state = app.world().resource::<State<PlayingState>>();
        assert_eq!(*state.get(), PlayingState::Playing);
    }
}
