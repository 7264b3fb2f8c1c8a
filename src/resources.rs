use std::path::Path;

use bevy::prelude::*;
use micromegas_tracing::prelude::warn;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;

use crate::ai::ChoiceSource;

#[derive(Resource, Debug)]
pub struct Score(pub u64);

/// How the current game ended, if it has.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameOutcome {
    #[default]
    Undecided,
    Won,
    Caught,
}

// ---------------------------------------------------------------------------
// Game config
// ---------------------------------------------------------------------------

pub const CONFIG_PATH: &str = "assets/config.json";

/// Tunables read from `assets/config.json`. Missing fields take defaults.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub level_file: String,
    pub ghost_count: usize,
    /// Grid cells per second a ghost glides.
    pub ghost_speed: f32,
    pub ghost_height: f32,
    /// Minimum Manhattan distance between the player and a ghost spawn.
    pub min_spawn_distance: u32,
    pub player_speed: f32,
    pub mouse_sensitivity: f32,
    pub player_radius: f32,
    pub pickup_radius: f32,
    pub catch_radius: f32,
    pub fov_degrees: f32,
    /// Fixed seed for ghost decisions; random when absent.
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            level_file: "assets/levels/level0.txt".to_string(),
            ghost_count: 4,
            ghost_speed: 1.0,
            ghost_height: -0.25,
            min_spawn_distance: 3,
            player_speed: 2.5,
            mouse_sensitivity: 0.1,
            player_radius: 0.2,
            pickup_radius: 0.5,
            catch_radius: 0.5,
            fov_degrees: 45.0,
            rng_seed: None,
        }
    }
}

impl GameConfig {
    pub fn parse(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("Invalid game config: {}", e))
    }

    /// Read the config file, falling back to defaults if it is missing or broken.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("no config at {}: {}; using defaults", path.display(), e);
                return Self::default();
            }
        };
        Self::parse(&text).unwrap_or_else(|e| {
            warn!("{} in {}; using defaults", e, path.display());
            Self::default()
        })
    }
}

// ---------------------------------------------------------------------------
// Randomness
// ---------------------------------------------------------------------------

/// Random source for ghost decisions.
#[derive(Resource, Debug, Deref, DerefMut)]
pub struct GhostRng(pub StdRng);

impl GhostRng {
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(StdRng::seed_from_u64(seed)),
            None => Self(StdRng::from_entropy()),
        }
    }
}

impl ChoiceSource for GhostRng {
    fn choose(&mut self, count: usize) -> usize {
        self.0.choose(count)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_tuning() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.ghost_count, 4);
        assert!((cfg.ghost_speed - 1.0).abs() < f32::EPSILON);
        assert!((cfg.player_speed - 2.5).abs() < f32::EPSILON);
        assert!((cfg.mouse_sensitivity - 0.1).abs() < f32::EPSILON);
        assert!((cfg.pickup_radius - 0.5).abs() < f32::EPSILON);
        assert_eq!(cfg.rng_seed, None);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg = GameConfig::parse(r#"{ "ghost_count": 2, "rng_seed": 7 }"#).unwrap();
        assert_eq!(cfg.ghost_count, 2);
        assert_eq!(cfg.rng_seed, Some(7));
        assert_eq!(cfg.level_file, GameConfig::default().level_file);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let err = GameConfig::parse("{ ghost_count: }").unwrap_err();
        assert!(err.contains("Invalid game config"));
    }

    #[test]
    fn missing_config_file_falls_back() {
        let cfg = GameConfig::load_or_default("does/not/exist.json");
        assert_eq!(cfg, GameConfig::default());
    }

    #[test]
    fn shipped_config_parses() {
        let text = std::fs::read_to_string(CONFIG_PATH).unwrap();
        let cfg = GameConfig::parse(&text).unwrap();
        assert!(std::fs::metadata(&cfg.level_file).is_ok());
    }

    #[test]
    fn seeded_rng_is_repeatable() {
        let mut a = GhostRng::from_seed(Some(42));
        let mut b = GhostRng::from_seed(Some(42));
        let xs: Vec<usize> = (0..32).map(|_| a.choose(3)).collect();
        let ys: Vec<usize> = (0..32).map(|_| b.choose(3)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|x| *x < 3));
    }
}
