use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A 1-indexed coordinate in the cubic instance grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl GridCoord {
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// World position of this cell when cells are `pitch` units apart.
    pub fn to_world(self, pitch: f32) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32) * pitch
    }

    /// Whether the coordinate lies inside a grid with `side` cells per axis.
    pub fn in_grid(self, side: u32) -> bool {
        let valid = |c: u32| (1..=side).contains(&c);
        valid(self.x) && valid(self.y) && valid(self.z)
    }
}

/// Total instances in a grid with `side` cells per axis.
pub fn instance_count(side: u32) -> usize {
    let s = side as usize;
    s * s * s
}

/// Buffer index of `coord`: `((x-1)*S + (y-1))*S + (z-1)`.
pub fn instance_index(coord: GridCoord, side: u32) -> usize {
    debug_assert!(coord.in_grid(side), "{coord:?} outside grid of side {side}");
    let s = side as usize;
    let (x, y, z) = (
        coord.x as usize - 1,
        coord.y as usize - 1,
        coord.z as usize - 1,
    );
    (x * s + y) * s + z
}

/// Inverse of [`instance_index`].
pub fn grid_coord(index: usize, side: u32) -> GridCoord {
    let s = side as usize;
    debug_assert!(index < s * s * s, "index {index} outside grid of side {side}");
    let z = index % s;
    let y = (index / s) % s;
    let x = index / (s * s);
    GridCoord::new(x as u32 + 1, y as u32 + 1, z as u32 + 1)
}

/// All coordinates in buffer order: x outer, y middle, z inner.
pub fn coords(side: u32) -> impl Iterator<Item = GridCoord> {
    (1..=side).flat_map(move |x| {
        (1..=side).flat_map(move |y| (1..=side).map(move |z| GridCoord::new(x, y, z)))
    })
}
