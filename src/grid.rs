//! Toroidal lattice holding at most one agent per cell.
//!
//! The grid only stores [`AgentId`] handles; agent state lives in the
//! model's registry. Neighborhoods are Chebyshev squares of a given radius
//! that wrap around both edges. On a torus smaller than the square the axis
//! collapses to every column (or row) once, so no cell is visited twice.

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::error::GridError;

/// A cell coordinate. Always within the grid that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Straight-line distance, ignoring wrap-around.
    pub fn euclidean(self, other: Pos) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    width: usize,
    height: usize,
    cells: Vec<Option<AgentId>>,
}

impl SpatialGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    /// Map any signed coordinate onto the torus.
    pub fn wrap(&self, x: isize, y: isize) -> Pos {
        Pos::new(
            x.rem_euclid(self.width as isize) as usize,
            y.rem_euclid(self.height as isize) as usize,
        )
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        (pos.x < self.width && pos.y < self.height).then(|| pos.y * self.width + pos.x)
    }

    /// Occupant of a cell, if any. Out-of-range cells read as empty.
    pub fn get(&self, pos: Pos) -> Option<AgentId> {
        self.index(pos).and_then(|i| self.cells[i])
    }

    pub fn is_cell_empty(&self, pos: Pos) -> bool {
        self.index(pos).is_some_and(|i| self.cells[i].is_none())
    }

    /// Put an agent into an empty cell.
    pub fn place(&mut self, agent: AgentId, pos: Pos) -> Result<(), GridError> {
        let Some(i) = self.index(pos) else {
            return Err(GridError::OutOfBounds { x: pos.x, y: pos.y });
        };
        if let Some(occupant) = self.cells[i] {
            return Err(GridError::OccupiedCell {
                x: pos.x,
                y: pos.y,
                occupant: occupant.index(),
            });
        }
        self.cells[i] = Some(agent);
        Ok(())
    }

    /// Move the occupant of `from` to `to`. Returns false (and changes
    /// nothing) if `from` is empty, `to` is occupied, or they are the same cell.
    pub fn move_agent(&mut self, from: Pos, to: Pos) -> bool {
        let (Some(src), Some(dst)) = (self.index(from), self.index(to)) else {
            return false;
        };
        if src == dst || self.cells[dst].is_some() {
            return false;
        }
        match self.cells[src].take() {
            Some(agent) => {
                self.cells[dst] = Some(agent);
                true
            }
            None => false,
        }
    }

    /// Shift the occupant of `from` by `(dx, dy)` with wrap-around.
    ///
    /// Movement is opportunistic: an occupied destination leaves the agent
    /// where it is and returns `None`.
    pub fn move_by(&mut self, from: Pos, dx: isize, dy: isize) -> Option<Pos> {
        let to = self.wrap(from.x as isize + dx, from.y as isize + dy);
        self.move_agent(from, to).then_some(to)
    }

    /// Every cell within Chebyshev distance `radius` of `center`, excluding
    /// `center` itself.
    pub fn neighborhood(&self, center: Pos, radius: usize) -> Neighborhood {
        Neighborhood {
            xs: axis(center.x, radius, self.width),
            ys: axis(center.y, radius, self.height),
            center,
            next: 0,
        }
    }

    /// Occupied cells around `center`. Cloning the iterator restarts the scan.
    pub fn neighbors_within(
        &self,
        center: Pos,
        radius: usize,
    ) -> impl Iterator<Item = (Pos, AgentId)> + Clone + '_ {
        self.neighborhood(center, radius)
            .filter_map(move |pos| self.get(pos).map(|agent| (pos, agent)))
    }

    /// Free cells around `center`, in neighborhood order.
    pub fn empty_cells_within(
        &self,
        center: Pos,
        radius: usize,
    ) -> impl Iterator<Item = Pos> + Clone + '_ {
        self.neighborhood(center, radius)
            .filter(move |&pos| self.is_cell_empty(pos))
    }

    /// Every coordinate exactly once: x outer, y inner.
    pub fn coord_iter(&self) -> impl Iterator<Item = Pos> + use<> {
        let (width, height) = (self.width, self.height);
        (0..width).flat_map(move |x| (0..height).map(move |y| Pos::new(x, y)))
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Coordinates along one axis within `radius` of `c`, wrapped.
fn axis(c: usize, radius: usize, len: usize) -> Vec<usize> {
    if radius.saturating_mul(2).saturating_add(1) >= len {
        return (0..len).collect();
    }
    (0..=2 * radius)
        .map(|k| (c + len - radius + k) % len)
        .collect()
}

/// Lazy square neighborhood. See [`SpatialGrid::neighborhood`].
#[derive(Debug, Clone)]
pub struct Neighborhood {
    xs: Vec<usize>,
    ys: Vec<usize>,
    center: Pos,
    next: usize,
}

impl Iterator for Neighborhood {
    type Item = Pos;

    fn next(&mut self) -> Option<Pos> {
        let rows = self.ys.len();
        while self.next < self.xs.len() * rows {
            let i = self.next;
            self.next += 1;
            let pos = Pos::new(self.xs[i / rows], self.ys[i % rows]);
            if pos != self.center {
                return Some(pos);
            }
        }
        None
    }
}
