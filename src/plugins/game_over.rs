//! End of a game: the world stops where it was and the outcome is reported.
//!
//! Every gameplay system runs only while `PlayingState::Playing` exists, so
//! leaving `InGame` freezes ghosts, pellets, and the view in place.

use bevy::prelude::*;
use micromegas_tracing::prelude::{imetric, info, span_fn, span_scope};

use crate::app_state::AppState;
use crate::resources::{GameOutcome, Score};

pub struct GameOverPlugin;

impl Plugin for GameOverPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::GameOver), report_outcome);
    }
}

/// One-line description of how the game ended.
pub fn headline(outcome: GameOutcome) -> &'static str {
    match outcome {
        GameOutcome::Won => "maze cleared",
        GameOutcome::Caught => "caught by a ghost",
        GameOutcome::Undecided => "game over",
    }
}

#[span_fn]
fn report_outcome(score: Res<Score>, outcome: Res<GameOutcome>) {
    info!("{}: final score {}", headline(*outcome), score.0);
    imetric!("final_score", "points", score.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::PlayingState;
    use bevy::state::app::StatesPlugin;

    #[test]
    fn headline_per_outcome() {
        assert_eq!(headline(GameOutcome::Won), "maze cleared");
        assert_eq!(headline(GameOutcome::Caught), "caught by a ghost");
        assert_eq!(headline(GameOutcome::Undecided), "game over");
    }

    #[test]
    fn game_over_ends_play_and_keeps_results() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(StatesPlugin);
        app.init_state::<AppState>();
        app.add_sub_state::<PlayingState>();
        app.insert_resource(Score(100));
        app.insert_resource(GameOutcome::Caught);
        app.add_plugins(GameOverPlugin);
        app.update();

        app.world_mut()
            .resource_mut::<NextState<AppState>>()
            .set(AppState::GameOver);
        for _ in 0..5 {
            app.update();
        }

        assert!(app.world().get_resource::<State<PlayingState>>().is_none());
        assert_eq!(app.world().resource::<Score>().0, 100);
        assert_eq!(*app.world().resource::<GameOutcome>(), GameOutcome::Caught);
    }
}
