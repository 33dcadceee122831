//! RefreshDispatcher - fills materialized rows from the content providers.
//!
//! Providers are invoked in registration order with the absolute logical
//! index and the row handle. Dispatch walks the window front-to-back when
//! scrolling forward (or not scrolling) and back-to-front when scrolling
//! backward, so partially painted frames read in the scroll direction.

use std::rc::Rc;

use tracing::{debug, error};

use crate::error::ProviderError;
use crate::events::ScrollDirection;
use crate::row_pool::{RowHandle, RowPool};
use crate::viewport::ViewportWindow;

/// Marker written into every cell of a row whose provider failed, so one bad
/// provider cannot blank the whole view.
pub const REFRESH_ERROR_MARKER: &str = "#ERR#";

/// Populates one materialized row with data for a logical index.
pub trait RowContentProvider {
    fn refresh(&self, absolute: usize, handle: &mut RowHandle) -> Result<(), ProviderError>;
}

pub struct RefreshDispatcher {
    providers: Vec<Rc<dyn RowContentProvider>>,
    last_direction: ScrollDirection,
}

impl RefreshDispatcher {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            last_direction: ScrollDirection::None,
        }
    }

    pub fn add_provider(&mut self, provider: Rc<dyn RowContentProvider>) {
        self.providers.push(provider);
    }

    pub fn remove_provider(&mut self, provider: &Rc<dyn RowContentProvider>) {
        self.providers.retain(|p| !Rc::ptr_eq(p, provider));
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn last_direction(&self) -> ScrollDirection {
        self.last_direction
    }

    /// Refresh every materialized row, ordered by the scroll direction.
    pub fn refresh_visible(
        &mut self,
        pool: &mut RowPool,
        window: &ViewportWindow,
        top_row: usize,
        collection_size: usize,
        direction: ScrollDirection,
    ) {
        self.last_direction = direction;
        let count = window.rows().len();
        match direction {
            ScrollDirection::Backward => {
                for relative in (0..count).rev() {
                    self.refresh_position(pool, window, top_row, collection_size, relative);
                }
            }
            _ => {
                for relative in 0..count {
                    self.refresh_position(pool, window, top_row, collection_size, relative);
                }
            }
        }
    }

    /// Refresh only the given relative positions (the newly acquired rows of
    /// a scroll edit), ordered by the scroll direction.
    pub fn refresh_positions(
        &mut self,
        pool: &mut RowPool,
        window: &ViewportWindow,
        top_row: usize,
        collection_size: usize,
        positions: &[usize],
        direction: ScrollDirection,
    ) {
        self.last_direction = direction;
        let mut ordered: Vec<usize> = positions.to_vec();
        ordered.sort_unstable();
        if direction == ScrollDirection::Backward {
            ordered.reverse();
        }
        for relative in ordered {
            self.refresh_position(pool, window, top_row, collection_size, relative);
        }
    }

    /// Refresh a single materialized row; out-of-range positions no-op.
    pub fn refresh_row(
        &mut self,
        pool: &mut RowPool,
        window: &ViewportWindow,
        top_row: usize,
        collection_size: usize,
        relative: usize,
    ) {
        if relative < window.num_rows_visible() {
            self.refresh_position(pool, window, top_row, collection_size, relative);
        }
    }

    fn refresh_position(
        &self,
        pool: &mut RowPool,
        window: &ViewportWindow,
        top_row: usize,
        collection_size: usize,
        relative: usize,
    ) {
        if collection_size < 1 {
            return;
        }
        let Some(id) = window.row_at(relative) else {
            return;
        };
        let Some(handle) = pool.get_mut(id) else {
            return;
        };
        let absolute = top_row + relative;
        debug!(target: "refresh", "Refreshing row {} (absolute {})", relative, absolute);
        for provider in &self.providers {
            if let Err(e) = provider.refresh(absolute, handle) {
                // One failing provider must not stop the rest; flag the row
                error!(target: "refresh",
                       "Content provider failed for row {}: {}", absolute, e);
                handle.set_all_cells(REFRESH_ERROR_MARKER);
            }
        }
    }
}

impl Default for RefreshDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
