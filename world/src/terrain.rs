//! Seeded terrain generation and walkability queries.

use tilequest_core::{CellCoord, GridRules};
use tracing::debug;

use crate::rng::SeededRng;

/// Draws spent on one blocked-cell placement before it is given up.
pub const MAX_REDRAWS: u32 = 64;

/// Static kind of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// Walkable ground.
    Open,
    /// Impassable obstacle.
    Blocked,
}

/// Immutable walkable/blocked layout of the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Terrain {
    columns: u32,
    rows: u32,
    blocked: Vec<bool>,
}

impl Terrain {
    /// Creates an entirely open terrain.
    #[must_use]
    pub fn open(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            blocked: vec![false; capacity],
        }
    }

    /// Generates terrain from a fresh stream seeded with `seed`.
    #[must_use]
    pub fn generate(seed: u32, rules: &GridRules) -> Self {
        let mut rng = SeededRng::new(seed);
        Self::generate_with(&mut rng, rules)
    }

    /// Generates terrain by drawing blocked cells from `rng`.
    ///
    /// Each of the `rules.blocked_cells` placements blocks one new cell. A
    /// placement whose first draw lands on the start cell is skipped. A draw
    /// that lands on an already blocked cell is redrawn, up to
    /// [`MAX_REDRAWS`] times, so the count falls short only by start-cell hits
    /// or on a grid too small to hold every placement.
    #[must_use]
    pub fn generate_with(rng: &mut SeededRng, rules: &GridRules) -> Self {
        let mut terrain = Self::open(rules.columns, rules.rows);
        if terrain.blocked.is_empty() {
            return terrain;
        }

        for _ in 0..rules.blocked_cells {
            let first = rng.cell(rules.columns, rules.rows);
            if first == rules.start {
                continue;
            }

            let mut cell = first;
            let mut redraws = 0;
            while cell == rules.start || !terrain.is_walkable(cell) {
                if redraws == MAX_REDRAWS {
                    break;
                }
                cell = rng.cell(rules.columns, rules.rows);
                redraws += 1;
            }
            if cell != rules.start {
                terrain.set_blocked(cell);
            }
        }

        debug!(
            seed = rng.seed(),
            blocked = terrain.blocked_count(),
            "generated terrain"
        );
        terrain
    }

    /// Creates terrain with the provided cells blocked.
    #[must_use]
    pub fn with_blocked(columns: u32, rows: u32, cells: &[CellCoord]) -> Self {
        let mut terrain = Self::open(columns, rows);
        for &cell in cells {
            terrain.set_blocked(cell);
        }
        terrain
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the cell lies within the grid.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.x() < self.columns && cell.y() < self.rows
    }

    /// Kind of the provided cell; cells outside the grid count as blocked.
    #[must_use]
    pub fn kind(&self, cell: CellCoord) -> CellKind {
        if self.is_walkable(cell) {
            CellKind::Open
        } else {
            CellKind::Blocked
        }
    }

    /// True iff the cell is in bounds and open.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.blocked.get(index).copied())
            .map_or(false, |blocked| !blocked)
    }

    /// Number of blocked cells.
    #[must_use]
    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|blocked| **blocked).count()
    }

    /// Blocked cells in row-major order.
    pub fn blocked_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let columns = self.columns;
        self.blocked
            .iter()
            .enumerate()
            .filter(|(_, blocked)| **blocked)
            .filter_map(move |(index, _)| {
                let index = u32::try_from(index).ok()?;
                Some(CellCoord::new(index % columns, index / columns))
            })
    }

    /// Dense row-major blocked flags.
    #[must_use]
    pub fn cells(&self) -> &[bool] {
        &self.blocked
    }

    fn set_blocked(&mut self, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.blocked.get_mut(index) {
                *slot = true;
            }
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let y = usize::try_from(cell.y()).ok()?;
        let x = usize::try_from(cell.x()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(y * width + x)
    }
}
