//! Hex board geometry.
//!
//! Three coordinate spaces meet here:
//!
//! - **Grid** `(x, y)`: the server's rectangular `width × height` index space.
//! - **Cube** `(q, r, s)` with `q + r + s == 0`: hex cells of a disk of a given
//!   radius centred on the origin.
//! - **World** `(x, z)`: the render plane, right-handed and Y-up, in the same
//!   units as the configured cell size.
//!
//! Grid and cube are related by a centred "odd-r" offset transform: the grid
//! centre `(width / 2, height / 2)` is the origin cell and every row whose
//! offset from the centre row is odd is shifted half a cell to the right.
//! The transform is a bijection between all grid indices and all axial cells;
//! restricting it to cells inside the disk (and indices inside the rectangle)
//! gives the set of valid board indices. Everything else is
//! [`HexError`], never a clamped coordinate.

use std::cmp::Ordering;
use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

const SQRT_3: f32 = 1.732_050_8;

/// Distances closer than this (in squared cell units) count as equal.
const PICK_EPSILON: f32 = 1e-4;

/// Fractional cube coordinates beyond this do not round to a cell.
const ROUND_LIMIT: f32 = (1_i32 << 30) as f32;

/// Largest supported disk radius.
pub const MAX_BOARD_RADIUS: u32 = 1 << 14;

/// Largest supported index rectangle side.
pub const MAX_BOARD_SIDE: u32 = 2 * MAX_BOARD_RADIUS + 1;

/// The six axial neighbour offsets, starting east and turning counter-clockwise.
const NEIGHBOURS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    #[error("grid index ({0}, {1}) is outside the board")]
    GridOutOfBounds(i32, i32),

    #[error("cell {0} is outside the board")]
    CellOutOfBounds(CubeCoord),

    #[error("board radius {radius} with a {width}x{height} index rectangle is too large")]
    ShapeTooLarge { radius: u32, width: u32, height: u32 },
}

// =============================================================================
// Coordinates
// =============================================================================

/// A hex cell in cube coordinates. `q + r + s == 0` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CubeCoord {
    q: i32,
    r: i32,
    s: i32,
}

impl CubeCoord {
    pub const ORIGIN: Self = Self { q: 0, r: 0, s: 0 };

    /// Returns `None` unless `q + r + s == 0`.
    pub fn new(q: i32, r: i32, s: i32) -> Option<Self> {
        let sum = i64::from(q) + i64::from(r) + i64::from(s);
        (sum == 0).then_some(Self { q, r, s })
    }

    /// Returns `None` when `s = -q - r` does not fit in an `i32`.
    pub fn from_axial(q: i32, r: i32) -> Option<Self> {
        let s = i32::try_from(-(i64::from(q) + i64::from(r))).ok()?;
        Some(Self { q, r, s })
    }

    pub fn q(self) -> i32 {
        self.q
    }

    pub fn r(self) -> i32 {
        self.r
    }

    pub fn s(self) -> i32 {
        self.s
    }

    /// Steps from the origin.
    pub fn length(self) -> u32 {
        self.q
            .unsigned_abs()
            .max(self.r.unsigned_abs())
            .max(self.s.unsigned_abs())
    }

    /// Steps between two cells.
    pub fn distance(self, other: Self) -> u32 {
        let dq = i64::from(self.q) - i64::from(other.q);
        let dr = i64::from(self.r) - i64::from(other.r);
        let ds = i64::from(self.s) - i64::from(other.s);
        let steps = dq.abs().max(dr.abs()).max(ds.abs());
        u32::try_from(steps).unwrap_or(u32::MAX)
    }

    /// Adjacent cells. Near the edge of the `i32` range there are fewer than six.
    pub fn neighbours(self) -> impl Iterator<Item = Self> {
        NEIGHBOURS.iter().filter_map(move |&(dq, dr)| {
            Self::from_axial(self.q.checked_add(dq)?, self.r.checked_add(dr)?)
        })
    }

    /// Round fractional cube coordinates to the containing cell.
    fn round(q: f32, r: f32) -> Option<Self> {
        if !(q.abs() < ROUND_LIMIT && r.abs() < ROUND_LIMIT) {
            return None;
        }
        let s = -q - r;
        let (mut rq, mut rr, rs) = (q.round(), r.round(), s.round());
        let (dq, dr, ds) = ((rq - q).abs(), (rr - r).abs(), (rs - s).abs());
        if dq > dr && dq > ds {
            rq = -rr - rs;
        } else if dr > ds {
            rr = -rq - rs;
        }
        Self::from_axial(rq as i32, rr as i32)
    }
}

impl std::fmt::Display for CubeCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.q, self.r, self.s)
    }
}

/// Server grid index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A scene ray as produced by the renderer's screen-to-world raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: WorldPoint,
    pub direction: WorldPoint,
}

// =============================================================================
// Board shape (index space)
// =============================================================================

/// Extent of the board: the hex disk and the server's index rectangle.
///
/// Pure index arithmetic, no world geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardShape {
    radius: i32,
    width: i32,
    height: i32,
}

impl BoardShape {
    /// The standard radius-3 board on a 7×7 grid.
    pub const STANDARD: Self = Self {
        radius: 3,
        width: 7,
        height: 7,
    };

    /// A disk whose index rectangle is exactly its bounding box.
    pub fn disk(radius: u32) -> Result<Self, HexError> {
        let side = radius.saturating_mul(2).saturating_add(1);
        Self::new(radius, side, side)
    }

    /// Fails with [`HexError::ShapeTooLarge`] past [`MAX_BOARD_RADIUS`] or
    /// [`MAX_BOARD_SIDE`].
    pub fn new(radius: u32, width: u32, height: u32) -> Result<Self, HexError> {
        let extent = |value: u32, max: u32| {
            if value <= max {
                i32::try_from(value).ok()
            } else {
                None
            }
        };
        match (
            extent(radius, MAX_BOARD_RADIUS),
            extent(width, MAX_BOARD_SIDE),
            extent(height, MAX_BOARD_SIDE),
        ) {
            (Some(r), Some(w), Some(h)) => Ok(Self {
                radius: r,
                width: w,
                height: h,
            }),
            _ => Err(HexError::ShapeTooLarge {
                radius,
                width,
                height,
            }),
        }
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains_cell(&self, cell: CubeCoord) -> bool {
        cell.length() <= self.radius.unsigned_abs()
    }

    pub fn contains_index(&self, x: i32, y: i32) -> bool {
        self.grid_to_hex(x, y).is_ok()
    }

    fn in_rectangle(&self, x: i32, y: i32) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }

    /// Map a server grid index to its hex cell.
    pub fn grid_to_hex(&self, x: i32, y: i32) -> Result<CubeCoord, HexError> {
        if !self.in_rectangle(x, y) {
            return Err(HexError::GridOutOfBounds(x, y));
        }
        let col = x - self.width / 2;
        let row = y - self.height / 2;
        CubeCoord::from_axial(col - (row - (row & 1)) / 2, row)
            .filter(|cell| self.contains_cell(*cell))
            .ok_or(HexError::GridOutOfBounds(x, y))
    }

    /// Inverse of [`grid_to_hex`](Self::grid_to_hex).
    pub fn hex_to_grid(&self, cell: CubeCoord) -> Result<GridCoord, HexError> {
        if !self.contains_cell(cell) {
            return Err(HexError::CellOutOfBounds(cell));
        }
        let row = cell.r;
        let x = cell.q + (row - (row & 1)) / 2 + self.width / 2;
        let y = row + self.height / 2;
        if self.in_rectangle(x, y) {
            Ok(GridCoord { x, y })
        } else {
            Err(HexError::CellOutOfBounds(cell))
        }
    }

    /// Every valid board index with its cell, in row-major index order.
    pub fn cells(self) -> impl Iterator<Item = (GridCoord, CubeCoord)> {
        (0..self.height).flat_map(move |y| {
            (0..self.width).filter_map(move |x| {
                self.grid_to_hex(x, y)
                    .ok()
                    .map(|cell| (GridCoord { x, y }, cell))
            })
        })
    }
}

// =============================================================================
// Layout (world space)
// =============================================================================

/// Pointy-top hex layout of a [`BoardShape`] in world space, plus the
/// accumulated board rotation about +Y.
///
/// Rotation is a view transform: it changes where cells are drawn and what a
/// world point picks, never which cell an index maps to.
#[derive(Debug, Clone, PartialEq)]
pub struct HexLayout {
    shape: BoardShape,
    cell_size: f32,
    rotation: f32,
}

impl HexLayout {
    pub fn new(shape: BoardShape, cell_size: f32) -> Self {
        Self {
            shape,
            cell_size,
            rotation: 0.0,
        }
    }

    pub fn shape(&self) -> BoardShape {
        self.shape
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Accumulated rotation in radians, normalized to `[0, 2π)`.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn grid_to_hex(&self, x: i32, y: i32) -> Result<CubeCoord, HexError> {
        self.shape.grid_to_hex(x, y)
    }

    pub fn hex_to_grid(&self, cell: CubeCoord) -> Result<GridCoord, HexError> {
        self.shape.hex_to_grid(cell)
    }

    pub fn cells(&self) -> impl Iterator<Item = (GridCoord, CubeCoord)> {
        self.shape.cells()
    }

    pub fn rotate(&mut self, delta: f32) {
        if delta.is_finite() {
            self.rotation = (self.rotation + delta).rem_euclid(TAU);
        }
    }

    /// World `(x, z)` of a cell centre under the current rotation.
    pub fn hex_to_world(&self, cell: CubeCoord) -> (f32, f32) {
        self.hex_to_world_at(cell, self.rotation)
    }

    /// World `(x, z)` of a cell centre under an explicit rotation.
    pub fn hex_to_world_at(&self, cell: CubeCoord, rotation: f32) -> (f32, f32) {
        let (x, z) = self.unrotated_center(cell);
        rotate_xz(x, z, rotation)
    }

    fn unrotated_center(&self, cell: CubeCoord) -> (f32, f32) {
        let q = cell.q as f32;
        let r = cell.r as f32;
        (
            self.cell_size * SQRT_3 * (q + r / 2.0),
            self.cell_size * 1.5 * r,
        )
    }

    /// Nearest board cell to a world point, or `None` if that cell is off the
    /// disk. Ties go to the lowest `q`, then the lowest `r`.
    pub fn world_to_hex(&self, x: f32, z: f32) -> Option<CubeCoord> {
        if !(x.is_finite() && z.is_finite()) || self.cell_size <= 0.0 {
            return None;
        }
        let (ux, uz) = rotate_xz(x, z, -self.rotation);
        // No board cell is picked from beyond this distance
        let reach = (self.shape.radius as f32 + 2.0) * self.cell_size * SQRT_3;
        if ux.hypot(uz) > reach {
            return None;
        }
        let r = uz / (1.5 * self.cell_size);
        let q = ux / (SQRT_3 * self.cell_size) - r / 2.0;
        let guess = CubeCoord::round(q, r)?;

        let tolerance = PICK_EPSILON * self.cell_size * self.cell_size;
        let nearest = std::iter::once(guess)
            .chain(guess.neighbours())
            .map(|cell| {
                let (cx, cz) = self.unrotated_center(cell);
                let d = (cx - ux).powi(2) + (cz - uz).powi(2);
                (d, cell)
            })
            .min_by(|(da, a), (db, b)| {
                if (da - db).abs() <= tolerance {
                    (a.q, a.r).cmp(&(b.q, b.r))
                } else {
                    da.partial_cmp(db).unwrap_or(Ordering::Equal)
                }
            })
            .map(|(_, cell)| cell)?;

        self.shape.contains_cell(nearest).then_some(nearest)
    }

    /// Intersect a scene ray with the board plane (`y = 0`) and pick a cell.
    pub fn pick_ray(&self, ray: Ray) -> Option<CubeCoord> {
        let Ray { origin, direction } = ray;
        if direction.y.abs() < f32::EPSILON {
            return None;
        }
        let t = -origin.y / direction.y;
        if !t.is_finite() || t < 0.0 {
            return None;
        }
        self.world_to_hex(origin.x + t * direction.x, origin.z + t * direction.z)
    }
}

/// Rotation about +Y by the right-hand rule.
fn rotate_xz(x: f32, z: f32, angle: f32) -> (f32, f32) {
    let (sin, cos) = angle.sin_cos();
    (x * cos + z * sin, -x * sin + z * cos)
}
