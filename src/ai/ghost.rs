//! Ghost patrol agent.
//!
//! A ghost alternates between two modes. In `ReadyToDecide` it looks at the
//! four neighbouring cells, picks a direction that does not turn straight
//! back (randomly when there is more than one), and steps one cell. In
//! `Gliding` it moves its render position from the old cell to the new one
//! over one unit of normalized time.
//!
//! When every way forward is blocked the ghost reverses; this is the only
//! case in which it turns around.

use bevy::math::Vec3;

use super::ChoiceSource;
use crate::components::{Direction, GridPosition};
use crate::plugins::maze::{MazeGrid, grid_to_world};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostMode {
    /// Interpolating the render position toward the current cell.
    Gliding,
    /// Due to pick and take the next step.
    ReadyToDecide,
}

#[derive(Debug, Clone)]
pub struct GhostAgent {
    grid_position: GridPosition,
    previous_grid_position: GridPosition,
    height: f32,
    render_position: Vec3,
    /// Last direction actually moved in; `None` until the first step.
    facing: Option<Direction>,
    committed: Direction,
    clock: f32,
    mode: GhostMode,
    forced_reversal_pending: bool,
}

impl GhostAgent {
    /// Create a ghost standing on `spawn`, rendered at `height`.
    ///
    /// The spawn must be an open cell with at least one open neighbour.
    pub fn new(spawn: GridPosition, height: f32, grid: &MazeGrid) -> Result<Self, String> {
        if !grid.is_walkable(spawn) {
            return Err(format!(
                "Ghost spawn ({}, {}) is not an open cell",
                spawn.x, spawn.z
            ));
        }
        let committed = initial_direction(spawn, grid).ok_or_else(|| {
            format!(
                "Ghost spawn ({}, {}) has no open neighbour",
                spawn.x, spawn.z
            )
        })?;

        Ok(Self {
            grid_position: spawn,
            previous_grid_position: spawn,
            height,
            render_position: grid_to_world(spawn, height),
            facing: None,
            committed,
            clock: 0.0,
            mode: GhostMode::ReadyToDecide,
            forced_reversal_pending: false,
        })
    }

    /// Advance by `dt` units of normalized time: glide, or take the next step.
    pub fn update(&mut self, dt: f32, grid: &mut MazeGrid, rng: &mut impl ChoiceSource) {
        match self.mode {
            GhostMode::Gliding => self.glide(dt),
            GhostMode::ReadyToDecide => {
                self.decide(grid, rng);
                self.take_step(grid);
            }
        }
    }

    /// Directions the ghost may take from its cell, in search order.
    ///
    /// A direction qualifies if its cell is enterable and it is not the exact
    /// reverse of the current facing.
    pub fn candidates(&self, grid: &MazeGrid) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|dir| grid.is_traversable(self.grid_position, *dir))
            .filter(|dir| self.facing.is_none_or(|facing| *dir != facing.opposite()))
            .collect()
    }

    fn decide(&mut self, grid: &MazeGrid, rng: &mut impl ChoiceSource) {
        let candidates = self.candidates(grid);
        match candidates.len() {
            0 => self.forced_reversal_pending = true,
            1 => self.committed = candidates[0],
            n @ (2 | 3) => self.committed = candidates[rng.choose(n)],
            // Only reachable before the first step, where the spawn
            // direction already stands.
            _ => {}
        }
    }

    fn take_step(&mut self, grid: &mut MazeGrid) {
        let mut dir = self.committed;
        if self.forced_reversal_pending {
            dir = dir.opposite();
            self.committed = dir;
            self.forced_reversal_pending = false;
        }

        self.previous_grid_position = self.grid_position;
        self.grid_position = self.grid_position.step(dir);
        self.facing = Some(dir);
        grid.mark_visited(self.grid_position);

        self.clock = 0.0;
        self.mode = GhostMode::Gliding;
    }

    fn glide(&mut self, dt: f32) {
        self.clock += dt;
        if self.clock <= 1.0 {
            let from = grid_to_world(self.previous_grid_position, self.height);
            let to = grid_to_world(self.grid_position, self.height);
            self.render_position = from.lerp(to, self.clock);
        } else {
            // Snap so the next glide starts exactly on the cell.
            self.render_position = grid_to_world(self.grid_position, self.height);
            self.clock = 0.0;
            self.mode = GhostMode::ReadyToDecide;
        }
    }

    pub fn grid_position(&self) -> GridPosition {
        self.grid_position
    }

    pub fn previous_grid_position(&self) -> GridPosition {
        self.previous_grid_position
    }

    /// Smoothed world position for rendering and player proximity checks.
    pub fn render_position(&self) -> Vec3 {
        self.render_position
    }

    pub fn facing(&self) -> Option<Direction> {
        self.facing
    }

    pub fn committed_direction(&self) -> Direction {
        self.committed
    }

    pub fn interpolation_clock(&self) -> f32 {
        self.clock
    }

    pub fn mode(&self) -> GhostMode {
        self.mode
    }

    pub fn forced_reversal_pending(&self) -> bool {
        self.forced_reversal_pending
    }
}

/// First enterable direction from `spawn`, probing East, West, South, North.
pub fn initial_direction(spawn: GridPosition, grid: &MazeGrid) -> Option<Direction> {
    Direction::ALL
        .into_iter()
        .find(|dir| grid.is_traversable(spawn, *dir))
}
