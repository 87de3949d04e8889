//! Enemy occupancy grid consulted by movement, placement and pathfinding.

use tilequest_core::{CellCoord, EnemyId};

/// Dense enemy occupancy laid over the terrain.
#[derive(Clone, Debug)]
pub(crate) struct OccupancyGrid {
    columns: u32,
    rows: u32,
    cells: Vec<Option<EnemyId>>,
}

impl OccupancyGrid {
    pub(crate) fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![None; capacity],
        }
    }

    pub(crate) fn clear(&mut self) {
        self.cells.fill(None);
    }

    pub(crate) fn occupant(&self, cell: CellCoord) -> Option<EnemyId> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    pub(crate) fn occupy(&mut self, enemy: EnemyId, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = Some(enemy);
            }
        }
    }

    /// Clears the cell only if `enemy` holds it.
    pub(crate) fn vacate(&mut self, enemy: EnemyId, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                if *slot == Some(enemy) {
                    *slot = None;
                }
            }
        }
    }

    pub(crate) fn cells(&self) -> &[Option<EnemyId>] {
        &self.cells
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.x() < self.columns && cell.y() < self.rows {
            let y = usize::try_from(cell.y()).ok()?;
            let x = usize::try_from(cell.x()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(y * width + x)
        } else {
            None
        }
    }
}
