//! ViewportWindow - the virtual row window
//!
//! Maps a fixed-size pool of recyclable row views onto a logically much
//! larger collection. Given the collection size, the requested top row, the
//! viewport capacity and the user's visible-row cap, it computes how many
//! rows are materialized and the minimal release/acquire sequence needed to
//! slide the window there:
//!
//! - When the new range overlaps the old one (small scroll delta), rows slide
//!   off one end and on at the other, one logical position at a time, so a
//!   scroll by k rows touches O(k) handles.
//! - When the ranges are disjoint (a jump), everything is replaced and the
//!   caller must refresh the whole window.

use tracing::debug;

use crate::error::ConstructionError;
use crate::events::ScrollDirection;
use crate::row_pool::{RowId, RowPool};

/// What a recompute did to the materialized window. `acquired` holds the
/// relative positions of rows that are newly materialized and still need a
/// content refresh; on the replace path `full_refresh` is set instead.
#[derive(Debug, Clone, Default)]
pub struct WindowUpdate {
    pub direction: ScrollDirection,
    pub acquired: Vec<usize>,
    pub released: usize,
    pub full_refresh: bool,
}

impl WindowUpdate {
    pub fn changed(&self) -> bool {
        self.released > 0 || !self.acquired.is_empty() || self.full_refresh
    }
}

pub struct ViewportWindow {
    /// Logical index of the first currently materialized row. Lags behind
    /// the requested top row until a recompute catches it up.
    current_visible_top: usize,
    rows: Vec<RowId>,
    num_rows_visible: usize,
    viewport_capacity: usize,
    max_rows_visible: usize,
}

impl ViewportWindow {
    pub fn new() -> Self {
        Self {
            current_visible_top: 0,
            rows: Vec::new(),
            num_rows_visible: 0,
            viewport_capacity: 0,
            max_rows_visible: usize::MAX,
        }
    }

    pub fn num_rows_visible(&self) -> usize {
        self.num_rows_visible
    }

    pub fn current_visible_top(&self) -> usize {
        self.current_visible_top
    }

    pub fn viewport_capacity(&self) -> usize {
        self.viewport_capacity
    }

    pub fn set_viewport_capacity(&mut self, rows: usize) {
        self.viewport_capacity = rows;
    }

    pub fn max_rows_visible(&self) -> usize {
        self.max_rows_visible
    }

    pub fn set_max_rows_visible(&mut self, max: usize) {
        self.max_rows_visible = max;
    }

    pub fn rows(&self) -> &[RowId] {
        &self.rows
    }

    pub fn row_at(&self, relative: usize) -> Option<RowId> {
        self.rows.get(relative).copied()
    }

    /// Relative position of a row control, or None if it is not
    /// materialized.
    pub fn position_of(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|r| *r == id)
    }

    /// The effective window height for the given collection state: capacity
    /// clamped by the rows remaining below `top_row` and by the user cap,
    /// but never 0 while there is data and space for at least one row.
    pub fn effective_visible(&self, top_row: usize, collection_size: usize) -> usize {
        if collection_size == 0 || self.viewport_capacity == 0 {
            return 0;
        }
        let displayable = collection_size.saturating_sub(top_row);
        let clamped = self
            .viewport_capacity
            .min(displayable)
            .min(self.max_rows_visible);
        clamped.max(1)
    }

    /// Main refresh algorithm. Slides or replaces the materialized window so
    /// it covers `[top_row, top_row + num_rows_visible)`, recycling as many
    /// already-materialized rows as possible.
    pub fn recompute(
        &mut self,
        pool: &mut RowPool,
        top_row: usize,
        collection_size: usize,
    ) -> Result<WindowUpdate, ConstructionError> {
        let mut update = WindowUpdate::default();

        if collection_size == 0 {
            update.released = self.rows.len();
            self.release_all(pool);
            return Ok(update);
        }

        self.num_rows_visible = self.effective_visible(top_row, collection_size);

        // Track whether the user is scrolling forwards or backwards
        update.direction = if top_row > self.current_visible_top {
            ScrollDirection::Forward
        } else if top_row < self.current_visible_top {
            ScrollDirection::Backward
        } else {
            ScrollDirection::None
        };

        let delta = self.current_visible_top.abs_diff(top_row);
        let mut newly_acquired: Vec<RowId> = Vec::new();

        if self.rows.len() > delta {
            // Overlap: slide one logical position at a time, releasing at
            // one end and acquiring at the other, then fix the row count.
            while self.current_visible_top < top_row {
                self.release_at(pool, 0, &mut update);
                self.current_visible_top += 1;
            }
            while self.current_visible_top > top_row {
                self.current_visible_top -= 1;
                let id = pool.acquire()?;
                self.rows.insert(0, id);
                newly_acquired.push(id);
            }
            self.fix_number_of_rows(pool, &mut update, &mut newly_acquired)?;
        } else {
            // Disjoint jump (or first materialization): release the whole
            // window and acquire a fresh one; the spares recycle straight
            // back so no new construction happens.
            while !self.rows.is_empty() {
                let last = self.rows.len() - 1;
                self.release_at(pool, last, &mut update);
            }
            self.current_visible_top = top_row;
            self.fix_number_of_rows(pool, &mut update, &mut newly_acquired)?;
            update.full_refresh = true;
        }

        if !update.full_refresh {
            update.acquired = self
                .rows
                .iter()
                .enumerate()
                .filter(|(_, id)| newly_acquired.contains(id))
                .map(|(pos, _)| pos)
                .collect();
        }

        debug!(target: "viewport",
               "Recomputed window: top={}, visible={}, released={}, acquired={:?}, full={}",
               top_row, self.num_rows_visible, update.released, update.acquired,
               update.full_refresh);
        Ok(update)
    }

    /// Grow or shrink at the tail until the materialized count matches
    /// `num_rows_visible` exactly.
    fn fix_number_of_rows(
        &mut self,
        pool: &mut RowPool,
        update: &mut WindowUpdate,
        newly_acquired: &mut Vec<RowId>,
    ) -> Result<(), ConstructionError> {
        while self.rows.len() > self.num_rows_visible {
            let last = self.rows.len() - 1;
            self.release_at(pool, last, update);
        }
        while self.rows.len() < self.num_rows_visible {
            let id = pool.acquire()?;
            self.rows.push(id);
            newly_acquired.push(id);
        }
        Ok(())
    }

    fn release_at(&mut self, pool: &mut RowPool, position: usize, update: &mut WindowUpdate) {
        let id = self.rows.remove(position);
        pool.release(id);
        update.released += 1;
    }

    /// Splice a freshly acquired row into the window at `relative`,
    /// pushing later rows down. Used by the insert mutation when the new
    /// record lands inside the window; a following recompute restores the
    /// count invariant.
    pub fn insert_at(
        &mut self,
        pool: &mut RowPool,
        relative: usize,
    ) -> Result<RowId, ConstructionError> {
        let id = pool.acquire()?;
        let position = relative.min(self.rows.len());
        self.rows.insert(position, id);
        Ok(id)
    }

    /// Remove and release the row at `relative`. Used by the delete
    /// mutation; a following recompute restores the count invariant.
    pub fn remove_at(&mut self, pool: &mut RowPool, relative: usize) {
        if relative < self.rows.len() {
            let id = self.rows.remove(relative);
            pool.release(id);
        }
    }

    /// Release every materialized row (empty collection or teardown).
    pub fn release_all(&mut self, pool: &mut RowPool) {
        for id in self.rows.drain(..) {
            pool.release(id);
        }
        self.num_rows_visible = 0;
        self.current_visible_top = 0;
    }
}

impl Default for ViewportWindow {
    fn default() -> Self {
        Self::new()
    }
}
