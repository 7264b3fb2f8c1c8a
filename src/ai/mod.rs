//! Ghost AI: the per-ghost patrol state machine and spawn placement.

pub mod ghost;

use rand::Rng;
use rand::rngs::StdRng;

use crate::components::GridPosition;
use crate::plugins::maze::MazeGrid;

/// Source of uniform choices for ghost decisions.
///
/// The game feeds a seedable RNG through this; tests feed scripted answers.
pub trait ChoiceSource {
    /// Pick an index in `0..count`. `count` is never zero.
    fn choose(&mut self, count: usize) -> usize;
}

impl ChoiceSource for StdRng {
    fn choose(&mut self, count: usize) -> usize {
        self.gen_range(0..count)
    }
}

/// Manhattan distance between two cells.
pub fn manhattan(a: &GridPosition, b: &GridPosition) -> u32 {
    (a.x - b.x).unsigned_abs() + (a.z - b.z).unsigned_abs()
}

/// Choose up to `count` distinct ghost spawn cells.
///
/// Candidates are open cells reachable from the player that lie at least
/// `min_distance` away from it. Every candidate has an open neighbour, since
/// it was reached through one.
pub fn pick_ghost_spawns(
    grid: &MazeGrid,
    player: GridPosition,
    count: usize,
    min_distance: u32,
    rng: &mut impl ChoiceSource,
) -> Vec<GridPosition> {
    let mut candidates: Vec<GridPosition> =
        pathfinding::prelude::bfs_reach(player, |pos| grid.open_neighbors(*pos))
            .filter(|pos| manhattan(pos, &player) >= min_distance.max(1))
            .collect();

    // Partial Fisher-Yates: the first `picked` slots hold the chosen cells.
    let picked = count.min(candidates.len());
    for i in 0..picked {
        let j = i + rng.choose(candidates.len() - i);
        candidates.swap(i, j);
    }
    candidates.truncate(picked);
    candidates
}
