use bevy::prelude::*;

// ---------------------------------------------------------------------------
// Grid and spatial
// ---------------------------------------------------------------------------

/// Integer maze cell. `x` is the column, `z` the row; both map straight onto
/// the world axes of the same name.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GridPosition {
    pub x: i32,
    pub z: i32,
}

impl GridPosition {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The cell one step away in `dir`.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dz) = dir.delta();
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }
}

/// Cardinal direction on the maze grid.
///
/// The declaration order is the order in which ghost AI checks directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    East,
    West,
    South,
    North,
}

impl Direction {
    /// All four directions in search order.
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::West,
        Direction::South,
        Direction::North,
    ];

    /// Grid offset for this direction.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::South => (0, 1),
            Direction::North => (0, -1),
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::South => Direction::North,
            Direction::North => Direction::South,
        }
    }
}

// ---------------------------------------------------------------------------
// Entity markers
// ---------------------------------------------------------------------------

#[derive(Component, Debug)]
pub struct Player;

#[derive(Component, Debug)]
pub struct Wall;

#[derive(Component, Debug)]
pub struct Pellet;

/// Buffered walk request for this frame: `x` strafes right, `y` moves forward.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct WalkInput(pub Vec2);

/// First-person view angles, in degrees.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Look {
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for Look {
    fn default() -> Self {
        Self {
            yaw: -90.0,
            pitch: 0.0,
        }
    }
}

impl Look {
    /// Unit view vector for the current angles.
    pub fn front(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    /// Apply a mouse movement in pixels. Pitch stops short of straight up or
    /// down so the view never flips.
    pub fn turn(&mut self, mouse_delta: Vec2, sensitivity: f32) {
        self.yaw += mouse_delta.x * sensitivity;
        self.pitch = (self.pitch - mouse_delta.y * sensitivity).clamp(-89.0, 89.0);
    }

    /// View vector flattened onto the ground plane, so walking never climbs.
    pub fn ground_front(&self) -> Vec3 {
        let yaw = self.yaw.to_radians();
        Vec3::new(yaw.cos(), 0.0, yaw.sin())
    }
}
