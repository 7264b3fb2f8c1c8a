//! Maze loading, rendering, and the walkability grid.
//!
//! Parses numeric level files into a [`MazeGrid`] resource shared by every
//! ghost, and spawns wall cubes, the floor and pellets as 3D meshes.

use std::fmt;

use bevy::prelude::*;
use micromegas_tracing::prelude::{debug, info, span_scope};

use crate::app_state::AppState;
use crate::components::{Direction, GridPosition, Pellet, Wall};
use crate::resources::GameConfig;

pub struct MazePlugin;

impl Plugin for MazePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::InGame), load_maze);
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Height at which pellets float above the floor.
pub const PELLET_HEIGHT: f32 = -0.25;

/// Floor plane sits at the bottom face of the wall cubes.
const FLOOR_HEIGHT: f32 = -0.5;

const PELLET_SIZE: f32 = 0.2;

const WALL_COLOR: Color = Color::srgb(0.25, 0.3, 0.75);
const FLOOR_COLOR: Color = Color::srgb(0.05, 0.05, 0.1);
const PELLET_COLOR: Color = Color::srgb(1.0, 0.9, 0.1);

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Open,
    Wall,
    /// Open cell a ghost has stepped into. Still traversable.
    Visited,
}

impl Cell {
    fn from_code(code: i32) -> Option<Self> {
        match code {
            0 | 2 | 3 => Some(Cell::Open),
            1 => Some(Cell::Wall),
            _ => None,
        }
    }

    fn to_char(self) -> char {
        match self {
            Cell::Open => '.',
            Cell::Wall => '#',
            Cell::Visited => 'o',
        }
    }
}

// ---------------------------------------------------------------------------
// Maze grid resource
// ---------------------------------------------------------------------------

/// Rectangular walkability map, indexed by `(x, z)`.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct MazeGrid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl MazeGrid {
    /// A grid of the given size with every cell open.
    pub fn open(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Open; width * height],
        }
    }

    /// Build a grid from ASCII rows: `#` wall, `o` visited, anything else open.
    /// Short rows are padded with open cells.
    pub fn from_ascii(text: &str) -> Result<Self, String> {
        let rows: Vec<&str> = text.lines().collect();
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        if width == 0 || height == 0 {
            return Err("Empty grid".to_string());
        }

        let mut grid = Self::open(width, height);
        for (z, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let cell = match ch {
                    '#' => Cell::Wall,
                    'o' => Cell::Visited,
                    _ => Cell::Open,
                };
                grid.cells[z * width + x] = cell;
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, pos: GridPosition) -> Option<usize> {
        if pos.x < 0 || pos.z < 0 {
            return None;
        }
        let (x, z) = (pos.x as usize, pos.z as usize);
        (x < self.width && z < self.height).then(|| z * self.width + x)
    }

    /// Cell kind at a position, or None if out of bounds.
    pub fn cell(&self, pos: GridPosition) -> Option<Cell> {
        self.index(pos).map(|i| self.cells[i])
    }

    pub fn set(&mut self, pos: GridPosition, cell: Cell) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = cell;
        }
    }

    /// Whether a cell can be walked on. Out of bounds is not walkable.
    pub fn is_walkable(&self, pos: GridPosition) -> bool {
        self.cell(pos).is_some_and(|c| c != Cell::Wall)
    }

    /// Whether the neighbour of `current` in direction `dir` can be entered.
    pub fn is_traversable(&self, current: GridPosition, dir: Direction) -> bool {
        self.is_walkable(current.step(dir))
    }

    /// Record that a ghost has stepped into `pos`.
    pub fn mark_visited(&mut self, pos: GridPosition) {
        if self.cell(pos) == Some(Cell::Open) {
            self.set(pos, Cell::Visited);
        }
    }

    /// Walkable 4-neighbours, in search order.
    pub fn open_neighbors(&self, pos: GridPosition) -> Vec<GridPosition> {
        Direction::ALL
            .iter()
            .filter(|d| self.is_traversable(pos, **d))
            .map(|d| pos.step(*d))
            .collect()
    }

    /// Whether the world-space point lies inside a wall cube.
    /// Cubes are unit sized and centred on integer coordinates.
    pub fn is_wall_at_world(&self, x: f32, z: f32) -> bool {
        let pos = GridPosition::new(x.round() as i32, z.round() as i32);
        self.cell(pos) == Some(Cell::Wall)
    }

    pub fn visited_count(&self) -> usize {
        self.cells.iter().filter(|c| **c == Cell::Visited).count()
    }
}

impl fmt::Display for MazeGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width == 0 {
            return Ok(());
        }
        for row in self.cells.chunks(self.width) {
            let line: String = row.iter().map(|c| c.to_char()).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Level files
// ---------------------------------------------------------------------------

/// A parsed level: walkability grid plus what stands on it.
#[derive(Debug, Clone)]
pub struct Level {
    pub grid: MazeGrid,
    pub player_spawn: GridPosition,
    pub pellets: Vec<GridPosition>,
}

impl Level {
    /// Parse a level file.
    ///
    /// The first token is `W,H`; it is followed by `W*H` whitespace separated
    /// cell codes, row by row: `0` open with a pellet, `1` wall, `2` player
    /// spawn, `3` open without a pellet.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut tokens = text.split_whitespace();
        let header = tokens.next().ok_or("Empty level")?;
        let (width, height) = parse_header(header)?;

        let mut grid = MazeGrid::open(width, height);
        let mut player_spawn = None;
        let mut pellets = Vec::new();

        for z in 0..height {
            for x in 0..width {
                let token = tokens
                    .next()
                    .ok_or_else(|| format!("Level ends early at ({}, {})", x, z))?;
                let code: i32 = token
                    .parse()
                    .map_err(|_| format!("Invalid cell '{}' at ({}, {})", token, x, z))?;
                let cell = Cell::from_code(code)
                    .ok_or_else(|| format!("Unknown cell code {} at ({}, {})", code, x, z))?;

                let pos = GridPosition::new(x as i32, z as i32);
                match code {
                    0 => pellets.push(pos),
                    2 => {
                        if player_spawn.is_some() {
                            return Err(format!("Multiple player spawns at ({}, {})", x, z));
                        }
                        player_spawn = Some(pos);
                    }
                    _ => {}
                }
                grid.set(pos, cell);
            }
        }

        if let Some(extra) = tokens.next() {
            return Err(format!("Unexpected trailing data '{}'", extra));
        }

        let player_spawn = player_spawn.ok_or("No player spawn (2) found in level")?;

        Ok(Level {
            grid,
            player_spawn,
            pellets,
        })
    }
}

fn parse_header(header: &str) -> Result<(usize, usize), String> {
    let (w, h) = header
        .split_once(',')
        .ok_or_else(|| format!("Bad level header '{}', expected W,H", header))?;
    let width: usize = w
        .parse()
        .map_err(|_| format!("Bad level width '{}'", w))?;
    let height: usize = h
        .parse()
        .map_err(|_| format!("Bad level height '{}'", h))?;
    if width == 0 || height == 0 {
        return Err(format!("Level has zero size {}x{}", width, height));
    }
    Ok((width, height))
}

/// Player start cell of the loaded level.
#[derive(Resource, Debug, Clone, Copy)]
pub struct PlayerSpawn(pub GridPosition);

// ---------------------------------------------------------------------------
// Coordinate conversion
// ---------------------------------------------------------------------------

/// Convert a grid position to world coordinates at the given height.
pub fn grid_to_world(pos: GridPosition, height: f32) -> Vec3 {
    Vec3::new(pos.x as f32, height, pos.z as f32)
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Load the configured level and spawn its geometry.
pub fn load_maze(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    span_scope!("maze_load");
    let path = &config.level_file;
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read level file {}: {}", path, e));
    let level = Level::parse(&text)
        .unwrap_or_else(|e| panic!("Failed to parse level file {}: {}", path, e));

    let grid = &level.grid;
    let wall_mesh = meshes.add(Cuboid::new(1.0, 1.0, 1.0));
    let wall_material = materials.add(StandardMaterial {
        base_color: WALL_COLOR,
        perceptual_roughness: 0.9,
        ..default()
    });

    for z in 0..grid.height() {
        for x in 0..grid.width() {
            let pos = GridPosition::new(x as i32, z as i32);
            if grid.cell(pos) == Some(Cell::Wall) {
                commands.spawn((
                    Wall,
                    pos,
                    Mesh3d(wall_mesh.clone()),
                    MeshMaterial3d(wall_material.clone()),
                    Transform::from_translation(grid_to_world(pos, 0.0)),
                ));
            }
        }
    }

    let (w, h) = (grid.width() as f32, grid.height() as f32);
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(w, h))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: FLOOR_COLOR,
            ..default()
        })),
        Transform::from_xyz((w - 1.0) / 2.0, FLOOR_HEIGHT, (h - 1.0) / 2.0),
    ));

    let pellet_mesh = meshes.add(Cuboid::new(PELLET_SIZE, PELLET_SIZE, PELLET_SIZE));
    let pellet_material = materials.add(StandardMaterial {
        base_color: PELLET_COLOR,
        emissive: LinearRgba::rgb(0.6, 0.5, 0.0),
        ..default()
    });
    for pos in &level.pellets {
        commands.spawn((
            Pellet,
            *pos,
            Mesh3d(pellet_mesh.clone()),
            MeshMaterial3d(pellet_material.clone()),
            Transform::from_translation(grid_to_world(*pos, PELLET_HEIGHT)),
        ));
    }

    info!(
        "maze loaded: {} ({}x{}, {} pellets)",
        path,
        grid.width(),
        grid.height(),
        level.pellets.len()
    );
    debug!("maze layout:\n{}", grid);

    commands.insert_resource(PlayerSpawn(level.player_spawn));
    commands.insert_resource(level.grid);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
