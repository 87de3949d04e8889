//! Breadth-first route search over the cell grid.

use std::collections::VecDeque;

use tilequest_core::{CellCoord, Direction};

/// Finds a shortest 4-connected route from `start` to `goal`.
///
/// Cells for which `is_free` returns `false` are never entered; the start cell
/// itself is not tested. The returned route excludes `start`, ends with
/// `goal`, and is empty when both cells coincide. Returns `None` when `goal`
/// is not free or cannot be reached.
///
/// Neighbors are expanded in [`Direction::ALL`] order, so ties between equally
/// short routes resolve identically for identical occupancy.
pub fn find_path<F>(
    start: CellCoord,
    goal: CellCoord,
    columns: u32,
    rows: u32,
    mut is_free: F,
) -> Option<Vec<CellCoord>>
where
    F: FnMut(CellCoord) -> bool,
{
    let width = usize::try_from(columns).ok()?;
    let height = usize::try_from(rows).ok()?;
    let cell_count = width.checked_mul(height)?;

    let start_index = index(width, columns, rows, start)?;
    let goal_index = index(width, columns, rows, goal)?;

    if start == goal {
        return Some(Vec::new());
    }

    if !is_free(goal) {
        return None;
    }

    let mut came_from: Vec<Option<usize>> = vec![None; cell_count];
    let mut visited = vec![false; cell_count];
    let mut queue = VecDeque::new();

    visited[start_index] = true;
    queue.push_back(start);

    while let Some(cell) = queue.pop_front() {
        let current_index = index(width, columns, rows, cell)?;

        for direction in Direction::ALL {
            let Some(neighbor) = cell.neighbor(direction, columns, rows) else {
                continue;
            };
            let Some(neighbor_index) = index(width, columns, rows, neighbor) else {
                continue;
            };

            if visited[neighbor_index] {
                continue;
            }
            visited[neighbor_index] = true;

            if !is_free(neighbor) {
                continue;
            }

            came_from[neighbor_index] = Some(current_index);
            if neighbor_index == goal_index {
                return Some(reconstruct(&came_from, start_index, goal_index, width));
            }
            queue.push_back(neighbor);
        }
    }

    None
}

fn reconstruct(
    came_from: &[Option<usize>],
    start_index: usize,
    goal_index: usize,
    width: usize,
) -> Vec<CellCoord> {
    let mut path = Vec::new();
    let mut current = goal_index;

    while current != start_index {
        path.push(coord(width, current));
        match came_from.get(current).copied().flatten() {
            Some(previous) => current = previous,
            None => break,
        }
    }

    path.reverse();
    path
}

fn index(width: usize, columns: u32, rows: u32, cell: CellCoord) -> Option<usize> {
    if cell.x() >= columns || cell.y() >= rows {
        return None;
    }
    let x = usize::try_from(cell.x()).ok()?;
    let y = usize::try_from(cell.y()).ok()?;
    y.checked_mul(width)?.checked_add(x)
}

fn coord(width: usize, index: usize) -> CellCoord {
    let x = u32::try_from(index % width).unwrap_or(u32::MAX);
    let y = u32::try_from(index / width).unwrap_or(u32::MAX);
    CellCoord::new(x, y)
}
