//! Collectible systems: pellet pickup and level completion.

use bevy::math::Vec3Swizzles;
use bevy::prelude::*;
use micromegas_tracing::prelude::{info, span_fn, span_scope};

use crate::app_state::{AppState, PlayingState};
use crate::components::{GridPosition, Pellet, Player};
use crate::events::{LevelCleared, PelletEaten};
use crate::plugins::telemetry::GameSet;
use crate::resources::{GameConfig, GameOutcome, Score};

pub struct CollectiblePlugin;

impl Plugin for CollectiblePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (pellet_pickup, check_level_cleared.after(pellet_pickup))
                .in_set(GameSet::Simulation)
                .run_if(in_state(PlayingState::Playing)),
        );
    }
}

pub const PELLET_POINTS: u64 = 10;

/// Eat every pellet within reach of the player on the ground plane.
#[span_fn]
fn pellet_pickup(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut score: ResMut<Score>,
    player_query: Query<&Transform, With<Player>>,
    pellet_query: Query<(Entity, &GridPosition, &Transform), With<Pellet>>,
) {
    let Ok(player) = player_query.single() else {
        return;
    };
    let player_xz = player.translation.xz();
    for (entity, cell, transform) in &pellet_query {
        if transform.translation.xz().distance(player_xz) < config.pickup_radius {
            commands.entity(entity).despawn();
            score.0 += PELLET_POINTS;
            commands.trigger(PelletEaten { cell: *cell });
        }
    }
}

/// Once no pellet is left, the player wins. Pellets are spawned on entering
/// the game, so a level without any is won on the first frame.
pub fn check_level_cleared(
    mut commands: Commands,
    pellet_query: Query<(), With<Pellet>>,
    score: Res<Score>,
    mut outcome: ResMut<GameOutcome>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if *outcome == GameOutcome::Undecided && pellet_query.is_empty() {
        info!("level cleared with score {}", score.0);
        *outcome = GameOutcome::Won;
        commands.trigger(LevelCleared);
        next_state.set(AppState::GameOver);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;

    #[derive(Resource, Default)]
    struct Eaten(Vec<GridPosition>);

    fn setup_app(with_level_check: bool) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(StatesPlugin);
        app.init_state::<AppState>();
        app.add_sub_state::<PlayingState>();
        app.insert_resource(Score(0));
        app.insert_resource(GameOutcome::Undecided);
        app.insert_resource(GameConfig::default());
        app.init_resource::<Eaten>();
        app.add_observer(|event: On<PelletEaten>, mut eaten: ResMut<Eaten>| {
            eaten.0.push(event.cell);
        });
        if with_level_check {
            app.add_plugins(CollectiblePlugin);
        } else {
            // check_level_cleared is tested separately so it cannot fire
            // before the test spawns its pellets
            app.add_systems(
                Update,
                pellet_pickup.run_if(in_state(PlayingState::Playing)),
            );
        }
        app
    }

    fn start_game(app: &mut App) {
        for _ in 0..5 {
            app.update();
        }
    }

    fn spawn_pellet(app: &mut App, x: i32, z: i32) -> Entity {
        let cell = GridPosition::new(x, z);
        app.world_mut()
            .spawn((Pellet, cell, Transform::from_xyz(x as f32, -0.25, z as f32)))
            .id()
    }

    #[test]
    fn pellet_pickup_increments_score() {
        let mut app = setup_app(false);
        start_game(&mut app);
        app.world_mut()
            .spawn((Player, Transform::from_xyz(1.2, 0.0, 1.1)));
        let near = spawn_pellet(&mut app, 1, 1);
        let far = spawn_pellet(&mut app, 2, 1);

        app.update();

        assert_eq!(app.world().resource::<Score>().0, PELLET_POINTS);
        assert!(app.world().get_entity(near).is_err());
        assert!(app.world().get_entity(far).is_ok());
        assert_eq!(app.world().resource::<Eaten>().0, vec![GridPosition::new(1, 1)]);
    }

    #[test]
    fn pickup_ignores_height_difference() {
        let mut app = setup_app(false);
        start_game(&mut app);
        // Eye level sits above the pellets
        app.world_mut()
            .spawn((Player, Transform::from_xyz(3.0, 0.0, 3.4)));
        spawn_pellet(&mut app, 3, 3);

        app.update();

        assert_eq!(app.world().resource::<Score>().0, PELLET_POINTS);
    }

    #[test]
    fn empty_level_is_won_at_once() {
        let mut app = setup_app(true);
        app.world_mut()
            .spawn((Player, Transform::from_xyz(1.0, 0.0, 1.0)));

        start_game(&mut app);

        assert_eq!(app.world().resource::<Score>().0, 0);
        assert_eq!(*app.world().resource::<GameOutcome>(), GameOutcome::Won);
        assert_eq!(*app.world().resource::<State<AppState>>().get(), AppState::GameOver);
    }

    #[test]
    fn last_pellet_wins_the_game() {
        let mut app = setup_app(true);
        app.world_mut()
            .spawn((Player, Transform::from_xyz(1.0, 0.0, 1.0)));
        spawn_pellet(&mut app, 1, 1);
        spawn_pellet(&mut app, 5, 5);

        start_game(&mut app);
        assert_eq!(app.world().resource::<Score>().0, PELLET_POINTS);
        assert_eq!(*app.world().resource::<State<AppState>>().get(), AppState::InGame);

        let mut query = app
            .world_mut()
            .query_filtered::<&mut Transform, With<Player>>();
        query.single_mut(app.world_mut()).unwrap().translation = Vec3::new(5.0, 0.0, 5.0);
        for _ in 0..5 {
            app.update();
        }

        assert_eq!(*app.world().resource::<GameOutcome>(), GameOutcome::Won);
        let state = app.world().resource::<State<AppState>>();
        assert_eq!(*state.get(), AppState::GameOver);
    }
}
