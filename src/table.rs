//! CompositeTable - the navigation controller and public API
//!
//! Owns the row pool, the viewport window, the refresh dispatcher and the
//! empty-state placeholder, and runs the focus/navigation state machine over
//! `(top_row, current_row, current_column)`. Every position change funnels
//! through one guarded transition protocol: poll the veto hooks, notify
//! departure from the old row, recompute the window, then notify arrival at
//! the new row. A veto aborts the whole operation with zero state mutation.
//!
//! Architecture:
//! LogicalCollection (external, size-only)
//!     → ViewportWindow (which indices are materialized)
//!         → RowPool (recyclable row view handles)
//!             → RefreshDispatcher (fills handles from content providers)
//! with CompositeTable mediating every focus and scroll transition.
//!
//! Everything runs synchronously on the UI event thread. The one exception
//! is focus arrival: transitions that scroll enqueue the arrive notification
//! as a zero-delay task drained by `pump_deferred`, so pending layout work
//! can complete first. A deferred task whose target handle has been
//! destroyed in the meantime is dropped, not applied.

use std::collections::VecDeque;
use std::rc::Rc;

use tracing::debug;

use crate::config::TableConfig;
use crate::error::TableError;
use crate::events::{
    DeleteHandler, InsertHandler, KeyCode, Modifiers, RowConstructionListener, RowFocusListener,
    ScrollDirection, ScrollEvent, ScrollListener, Traversal,
};
use crate::placeholder::EmptyStatePlaceholder;
use crate::refresh::{RefreshDispatcher, RowContentProvider};
use crate::row_pool::{RowFactory, RowHandle, RowId, RowPool};
use crate::viewport::ViewportWindow;

/// A deferred focus assignment, executed on the next `pump_deferred`.
/// `target` is re-checked for liveness and materialization at drain time.
#[derive(Debug, Clone, Copy)]
struct DeferredFocus {
    target: RowId,
    column: usize,
    fire_arrive: bool,
}

pub struct CompositeTable {
    pool: RowPool,
    window: ViewportWindow,
    dispatcher: RefreshDispatcher,
    placeholder: EmptyStatePlaceholder,

    row_focus_listeners: Vec<Rc<dyn RowFocusListener>>,
    insert_handlers: Vec<Rc<dyn InsertHandler>>,
    delete_handlers: Vec<Rc<dyn DeleteHandler>>,
    scroll_listeners: Vec<Rc<dyn ScrollListener>>,

    deferred: VecDeque<DeferredFocus>,

    collection_size: usize,
    top_row: usize,
    /// Offset of the focused row from the top of the window. `-1` means no
    /// selection; values outside `[0, num_rows_visible)` mean the focused
    /// row has been scrolled off and track where it went.
    current_row: isize,
    current_column: usize,

    traverse_on_tabs: bool,
}

impl CompositeTable {
    pub fn new(factory: Box<dyn RowFactory>) -> Self {
        Self::with_config(factory, &TableConfig::default())
    }

    pub fn with_config(factory: Box<dyn RowFactory>, config: &TableConfig) -> Self {
        let mut window = ViewportWindow::new();
        if let Some(max) = config.max_rows_visible {
            window.set_max_rows_visible(max);
        }
        let mut placeholder = EmptyStatePlaceholder::new(config.insert_hint.clone());
        placeholder.show();

        Self {
            pool: RowPool::new(factory),
            window,
            dispatcher: RefreshDispatcher::new(),
            placeholder,
            row_focus_listeners: Vec::new(),
            insert_handlers: Vec::new(),
            delete_handlers: Vec::new(),
            scroll_listeners: Vec::new(),
            deferred: VecDeque::new(),
            collection_size: 0,
            top_row: 0,
            current_row: -1,
            current_column: 0,
            traverse_on_tabs: config.traverse_on_tabs,
        }
    }

    // Property getters/setters
    // --------------------------------------------------------------

    pub fn top_row(&self) -> usize {
        self.top_row
    }

    pub fn collection_size(&self) -> usize {
        self.collection_size
    }

    pub fn num_rows_visible(&self) -> usize {
        self.window.num_rows_visible()
    }

    pub fn viewport_capacity(&self) -> usize {
        self.window.viewport_capacity()
    }

    pub fn max_rows_visible(&self) -> usize {
        self.window.max_rows_visible()
    }

    /// The focused row as an offset from the top of the window, or `-1`
    /// when no focused row is currently visible.
    pub fn current_row(&self) -> isize {
        if self.is_row_visible(self.current_row) {
            self.current_row
        } else {
            -1
        }
    }

    pub fn current_column(&self) -> usize {
        self.current_column
    }

    /// The selected `(column, row)` pair, row relative to the window top,
    /// or `None` when no selection is visible.
    pub fn selection(&self) -> Option<(usize, usize)> {
        if self.is_row_visible(self.current_row) {
            Some((self.current_column, self.current_row as usize))
        } else {
            None
        }
    }

    pub fn placeholder(&self) -> &EmptyStatePlaceholder {
        &self.placeholder
    }

    pub fn set_insert_hint(&mut self, hint: impl Into<String>) {
        self.placeholder.set_message(hint);
    }

    pub fn is_traverse_on_tabs(&self) -> bool {
        self.traverse_on_tabs
    }

    pub fn set_traverse_on_tabs(&mut self, enabled: bool) {
        self.traverse_on_tabs = enabled;
    }

    pub fn set_menu(&mut self, menu: Option<String>) {
        self.pool.set_menu(menu);
    }

    pub fn set_background(&mut self, background: Option<String>) {
        self.pool.set_background(background);
    }

    pub fn pool_stats(&self) -> crate::row_pool::PoolStats {
        self.pool.stats()
    }

    /// Resize driver: how many rows fit in the client area. Recomputes the
    /// window and refreshes newly materialized rows; never fires scroll
    /// events.
    pub fn set_viewport_capacity(&mut self, rows: usize) -> Result<(), TableError> {
        self.window.set_viewport_capacity(rows);
        self.update_visible_rows(false)
    }

    pub fn set_max_rows_visible(&mut self, max: usize) -> Result<(), TableError> {
        self.window.set_max_rows_visible(max);
        self.update_visible_rows(false)
    }

    /// Tell the table how many records the underlying collection holds.
    /// Transitions to or from empty show or hide the placeholder.
    pub fn set_num_rows_in_collection(&mut self, count: usize) -> Result<(), TableError> {
        self.top_row = 0;
        if self.current_row >= count as isize {
            self.current_row = if count > 0 { count as isize - 1 } else { -1 };
        }
        self.collection_size = count;
        self.update_visible_rows(false)?;
        self.refresh_all_rows();
        Ok(())
    }

    // Row control accessors
    // --------------------------------------------------------------

    pub fn get_row_controls(&self) -> Vec<RowId> {
        self.window.rows().to_vec()
    }

    pub fn get_current_row_control(&self) -> Option<RowId> {
        if self.is_row_visible(self.current_row) {
            self.window.row_at(self.current_row as usize)
        } else {
            None
        }
    }

    /// Given a row control, its offset from the top of the window. Passing
    /// a control that is not currently materialized is a programming error.
    pub fn get_control_row(&self, id: RowId) -> Result<usize, TableError> {
        self.window.position_of(id).ok_or(TableError::RowNotVisible)
    }

    pub fn row_handle(&self, id: RowId) -> Option<&RowHandle> {
        self.pool.get(id)
    }

    // Listener registration
    // --------------------------------------------------------------

    pub fn add_row_focus_listener(&mut self, listener: Rc<dyn RowFocusListener>) {
        self.row_focus_listeners.push(listener);
    }

    pub fn remove_row_focus_listener(&mut self, listener: &Rc<dyn RowFocusListener>) {
        self.row_focus_listeners
            .retain(|l| !Rc::ptr_eq(l, listener));
    }

    pub fn add_row_content_provider(&mut self, provider: Rc<dyn RowContentProvider>) {
        self.dispatcher.add_provider(provider);
    }

    pub fn remove_row_content_provider(&mut self, provider: &Rc<dyn RowContentProvider>) {
        self.dispatcher.remove_provider(provider);
    }

    pub fn add_row_construction_listener(&mut self, listener: Rc<dyn RowConstructionListener>) {
        self.pool.add_construction_listener(listener);
    }

    pub fn add_insert_handler(&mut self, handler: Rc<dyn InsertHandler>) {
        self.insert_handlers.push(handler);
    }

    pub fn remove_insert_handler(&mut self, handler: &Rc<dyn InsertHandler>) {
        self.insert_handlers.retain(|h| !Rc::ptr_eq(h, handler));
    }

    pub fn add_delete_handler(&mut self, handler: Rc<dyn DeleteHandler>) {
        self.delete_handlers.push(handler);
    }

    pub fn remove_delete_handler(&mut self, handler: &Rc<dyn DeleteHandler>) {
        self.delete_handlers.retain(|h| !Rc::ptr_eq(h, handler));
    }

    pub fn add_scroll_listener(&mut self, listener: Rc<dyn ScrollListener>) {
        self.scroll_listeners.push(listener);
    }

    pub fn remove_scroll_listener(&mut self, listener: &Rc<dyn ScrollListener>) {
        self.scroll_listeners.retain(|l| !Rc::ptr_eq(l, listener));
    }

    // Main refresh algorithm
    // --------------------------------------------------------------

    /// Make sure the correct rows are materialized for the current
    /// `(top_row, collection_size, capacity)` and that newly materialized
    /// rows have data. `scroll_events` gates scroll notification so that
    /// resize-only recomputes stay silent.
    fn update_visible_rows(&mut self, scroll_events: bool) -> Result<(), TableError> {
        if self.collection_size == 0 {
            self.window.release_all(&mut self.pool);
            self.top_row = 0;
            self.current_row = -1;
            self.current_column = 0;
            self.placeholder.show();
            return Ok(());
        }
        self.placeholder.hide();

        // Never show trailing blank rows: pull the top row back if the
        // window would overhang the end of the collection.
        let span = self.window.effective_visible(0, self.collection_size);
        if span > 0 && self.top_row + span > self.collection_size {
            self.top_row = self.collection_size - span;
        }
        if self.top_row >= self.collection_size {
            self.top_row = self.collection_size - 1;
        }

        let update = self
            .window
            .recompute(&mut self.pool, self.top_row, self.collection_size)
            .map_err(TableError::from)?;

        // After PgDn or a resize shrink the focused row can wind up outside
        // the visible range; pull it back in.
        let visible = self.window.num_rows_visible();
        if self.current_row >= visible as isize && visible < self.window.viewport_capacity() {
            self.current_row = visible as isize - 1;
        }

        if update.full_refresh {
            self.dispatcher.refresh_visible(
                &mut self.pool,
                &self.window,
                self.top_row,
                self.collection_size,
                update.direction,
            );
        } else if !update.acquired.is_empty() {
            self.dispatcher.refresh_positions(
                &mut self.pool,
                &self.window,
                self.top_row,
                self.collection_size,
                &update.acquired,
                update.direction,
            );
        }

        if scroll_events && update.direction != ScrollDirection::None {
            let event = ScrollEvent {
                direction: update.direction,
            };
            for listener in &self.scroll_listeners {
                listener.table_scrolled(&event);
            }
        }
        Ok(())
    }

    pub fn refresh_all_rows(&mut self) {
        self.dispatcher.refresh_visible(
            &mut self.pool,
            &self.window,
            self.top_row,
            self.collection_size,
            ScrollDirection::None,
        );
    }

    pub fn refresh_row(&mut self, relative: usize) {
        self.dispatcher.refresh_row(
            &mut self.pool,
            &self.window,
            self.top_row,
            self.collection_size,
            relative,
        );
    }

    // Guarded transition protocol
    // --------------------------------------------------------------

    fn is_row_visible(&self, row: isize) -> bool {
        row >= 0 && (row as usize) < self.window.num_rows_visible()
    }

    fn current_handle(&self) -> Option<&RowHandle> {
        if !self.is_row_visible(self.current_row) {
            return None;
        }
        self.window
            .row_at(self.current_row as usize)
            .and_then(|id| self.pool.get(id))
    }

    /// Ask every focus listener for permission to leave the current row,
    /// firing `depart` once all grant it. When the old row is not
    /// materialized (scrolled off), permission is assumed granted and no
    /// notifications fire.
    fn request_row_change(&self) -> bool {
        let Some(handle) = self.current_handle() else {
            return true;
        };
        let absolute = self.top_row + self.current_row as usize;
        for listener in &self.row_focus_listeners {
            if !listener.request_row_change(absolute, handle) {
                debug!(target: "navigation", "Row change vetoed at row {}", absolute);
                return false;
            }
        }
        self.fire_row_depart();
        true
    }

    fn fire_row_depart(&self) {
        let Some(handle) = self.current_handle() else {
            return;
        };
        let absolute = self.top_row + self.current_row as usize;
        for listener in &self.row_focus_listeners {
            listener.depart(absolute, handle);
        }
    }

    fn fire_row_arrive(&self) {
        let Some(handle) = self.current_handle() else {
            return;
        };
        let absolute = self.top_row + self.current_row as usize;
        for listener in &self.row_focus_listeners {
            listener.arrive(absolute, handle);
        }
    }

    fn do_set_top_row(
        &mut self,
        top_row: usize,
        current_row: isize,
        scroll_events: bool,
    ) -> Result<(), TableError> {
        self.top_row = top_row;
        self.current_row = current_row;
        self.update_visible_rows(scroll_events)
    }

    /// Apply the selection now and defer the focus arrival to the next
    /// event-loop turn, keyed to the target handle so a handle destroyed in
    /// the meantime drops the task.
    fn internal_set_selection(&mut self, column: usize, row: usize, fire_arrive: bool) {
        let Some(target) = self.window.row_at(row) else {
            return;
        };
        self.current_row = row as isize;
        self.current_column = column;
        self.deferred.push_back(DeferredFocus {
            target,
            column,
            fire_arrive,
        });
        debug!(target: "navigation",
               "Selection set to (col {}, row {}), arrive deferred: {}",
               column, row, fire_arrive);
    }

    /// Drain pending deferred focus tasks, FIFO. Stale tasks (target handle
    /// destroyed or no longer materialized) are dropped without effect.
    pub fn pump_deferred(&mut self) {
        while let Some(task) = self.deferred.pop_front() {
            if !self.pool.is_alive(task.target) {
                debug!(target: "navigation", "Dropped deferred focus for dead handle {:?}",
                       task.target);
                continue;
            }
            let Some(position) = self.window.position_of(task.target) else {
                continue;
            };
            self.current_row = position as isize;
            self.current_column = task.column;
            if task.fire_arrive {
                self.fire_row_arrive();
            }
        }
    }

    fn deselect_current_row_if_visible(&mut self) {
        if !self.is_row_visible(self.current_row) {
            return;
        }
        if let Some(id) = self.window.row_at(self.current_row as usize) {
            if let Some(handle) = self.pool.get_mut(id) {
                handle.clear_selection();
            }
        }
    }

    fn column_count(&self) -> usize {
        self.window
            .row_at(0)
            .and_then(|id| self.pool.get(id))
            .map(|h| h.column_count())
            .unwrap_or(0)
    }

    fn compute_top_row_delta(&self, row: isize) -> isize {
        let visible = self.window.num_rows_visible() as isize;
        if row < 0 {
            row
        } else if row >= visible {
            row - visible + 1
        } else {
            0
        }
    }

    // Scrolling API
    // --------------------------------------------------------------

    /// Scroll so the given logical index is the top row. Rejects arguments
    /// outside `[0, collection_size)`; the window is still clamped so it
    /// never overhangs the end of the collection. Setting the current value
    /// is a no-op: no notifications fire and no handles move.
    pub fn set_top_row(&mut self, top_row: usize) -> Result<bool, TableError> {
        if top_row >= self.collection_size {
            return Err(TableError::TopRowOutOfRange {
                requested: top_row,
                collection_size: self.collection_size,
            });
        }
        // Clamp before computing the focus-tracking delta so the tracked
        // offset reflects the distance actually scrolled
        let span = self.window.effective_visible(0, self.collection_size);
        let target = if span > 0 {
            top_row.min(self.collection_size - span)
        } else {
            top_row
        };
        if target == self.top_row {
            return Ok(true);
        }
        if !self.request_row_change() {
            return Ok(false);
        }
        let delta = self.top_row as isize - target as isize;
        let current = self.current_row + delta;
        self.do_set_top_row(target, current, true)?;
        self.fire_row_arrive();
        Ok(true)
    }

    /// Select `(column, row)` where `row` is relative to the window top and
    /// may lie outside it; the window scrolls the minimal distance needed to
    /// bring the target into view before selecting.
    pub fn set_selection(&mut self, column: usize, row: isize) -> Result<bool, TableError> {
        let absolute = self.top_row as isize + row;
        if absolute < 0 || absolute >= self.collection_size as isize {
            return Err(TableError::SelectionOutOfRange { column, row });
        }
        let columns = self.column_count();
        if columns > 0 && column >= columns {
            return Err(TableError::SelectionOutOfRange { column, row });
        }

        let delta = self.compute_top_row_delta(row);
        if delta != 0 {
            if !self.request_row_change() {
                return Ok(false);
            }
            let current = self.current_row;
            let new_top = (self.top_row as isize + delta).max(0) as usize;
            self.do_set_top_row(new_top, current, true)?;
            self.internal_set_selection(column, (row - delta) as usize, true);
        } else if row == self.current_row {
            self.internal_set_selection(column, row as usize, false);
        } else {
            if !self.request_row_change() {
                return Ok(false);
            }
            self.internal_set_selection(column, row as usize, true);
        }
        Ok(true)
    }

    /// Deselect the current row, notifying departure.
    pub fn clear_selection(&mut self) {
        if self.current_row != -1 {
            self.fire_row_depart();
            self.current_row = -1;
        }
    }

    /// Scroll so the focused row is visible again. Returns whether a scroll
    /// was needed.
    pub fn do_make_focused_row_visible(&mut self) -> Result<bool, TableError> {
        if self.window.num_rows_visible() < 1 {
            return Ok(false);
        }
        let delta = self.compute_top_row_delta(self.current_row);
        if delta == 0 {
            return Ok(false);
        }
        let new_top = (self.top_row as isize + delta).max(0) as usize;
        let current = self.current_row - delta;
        self.do_set_top_row(new_top, current, true)?;
        if self.is_row_visible(self.current_row) {
            let column = self.current_column;
            let row = self.current_row as usize;
            self.internal_set_selection(column, row, false);
        }
        Ok(true)
    }

    // Keyboard navigation
    // --------------------------------------------------------------

    /// Move focus up one row: a within-window move when not at the window
    /// edge, a one-row slide of the window at the edge. No-op in single-row
    /// mode or at the first absolute row.
    pub fn do_row_up(&mut self) -> Result<bool, TableError> {
        if self.window.max_rows_visible() <= 1 {
            return Ok(false);
        }
        if self.current_row > 0 {
            if !self.request_row_change() {
                return Ok(false);
            }
            self.deselect_current_row_if_visible();
            let column = self.current_column;
            let row = (self.current_row - 1) as usize;
            self.internal_set_selection(column, row, false);
            return Ok(true);
        }
        if self.top_row > 0 {
            if !self.request_row_change() {
                return Ok(false);
            }
            self.deselect_current_row_if_visible();
            let current = self.current_row;
            self.do_set_top_row(self.top_row - 1, current, true)?;
            let column = self.current_column;
            let row = self.current_row.max(0) as usize;
            self.internal_set_selection(column, row, true);
            return Ok(true);
        }
        Ok(false)
    }

    /// Mirror of `do_row_up`.
    pub fn do_row_down(&mut self) -> Result<bool, TableError> {
        if self.window.max_rows_visible() <= 1 {
            return Ok(false);
        }
        let visible = self.window.num_rows_visible() as isize;
        if self.current_row < visible - 1 {
            if !self.request_row_change() {
                return Ok(false);
            }
            self.deselect_current_row_if_visible();
            let column = self.current_column;
            let row = (self.current_row + 1).max(0) as usize;
            self.internal_set_selection(column, row, false);
            return Ok(true);
        }
        if self.top_row + self.window.num_rows_visible() < self.collection_size {
            if !self.request_row_change() {
                return Ok(false);
            }
            self.deselect_current_row_if_visible();
            let current = self.current_row;
            self.do_set_top_row(self.top_row + 1, current, true)?;
            let column = self.current_column;
            let row = self.current_row.max(0) as usize;
            self.internal_set_selection(column, row, true);
            return Ok(true);
        }
        Ok(false)
    }

    pub fn do_page_up(&mut self) -> Result<bool, TableError> {
        if self.top_row == 0 {
            return Ok(false);
        }
        if !self.request_row_change() {
            return Ok(false);
        }
        self.deselect_current_row_if_visible();
        let new_top = self.top_row.saturating_sub(self.window.num_rows_visible());
        self.do_set_top_row(new_top, 0, true)?;
        let column = self.current_column;
        self.internal_set_selection(column, 0, true);
        Ok(true)
    }

    pub fn do_page_down(&mut self) -> Result<bool, TableError> {
        let visible = self.window.num_rows_visible();
        if self.top_row + visible >= self.collection_size {
            return Ok(false);
        }
        if !self.request_row_change() {
            return Ok(false);
        }
        self.deselect_current_row_if_visible();
        let new_top = (self.top_row + visible).min(self.collection_size - 1);
        self.do_set_top_row(new_top, visible as isize - 1, true)?;
        let column = self.current_column;
        let row = self.current_row.max(0) as usize;
        self.internal_set_selection(column, row, true);
        Ok(true)
    }

    /// Ctrl-Home: scroll to the top of the collection and focus the first
    /// visible row.
    pub fn do_focus_initial_row(&mut self) -> Result<bool, TableError> {
        if self.top_row == 0 {
            return Ok(false);
        }
        if !self.request_row_change() {
            return Ok(false);
        }
        self.deselect_current_row_if_visible();
        let current = self.current_row;
        self.do_set_top_row(0, current, true)?;
        let column = self.current_column;
        self.internal_set_selection(column, 0, true);
        Ok(true)
    }

    /// Ctrl-End: scroll to the tail of the collection and focus the last
    /// visible row.
    pub fn do_focus_last_row(&mut self) -> Result<bool, TableError> {
        let visible = self.window.num_rows_visible();
        if self.top_row + visible >= self.collection_size {
            return Ok(false);
        }
        if !self.request_row_change() {
            return Ok(false);
        }
        self.deselect_current_row_if_visible();
        let current = self.current_row;
        self.do_set_top_row(self.collection_size - visible, current, true)?;
        let column = self.current_column;
        let row = self.window.num_rows_visible().saturating_sub(1);
        self.internal_set_selection(column, row, true);
        Ok(true)
    }

    /// Tab or Enter past the last column: move to column 0 of the next row,
    /// sliding the window when focus is already on the last visible row.
    /// Silently does nothing at the absolute end of the collection.
    pub fn handle_next_row_navigation(&mut self) -> Result<bool, TableError> {
        let visible = self.window.num_rows_visible() as isize;
        if self.current_row < visible - 1 {
            if !self.request_row_change() {
                return Ok(false);
            }
            self.deselect_current_row_if_visible();
            let row = (self.current_row + 1).max(0) as usize;
            self.internal_set_selection(0, row, false);
            return Ok(true);
        }
        if self.top_row + self.window.num_rows_visible() >= self.collection_size {
            return Ok(false);
        }
        if !self.request_row_change() {
            return Ok(false);
        }
        self.deselect_current_row_if_visible();
        let current = self.current_row;
        self.do_set_top_row(self.top_row + 1, current, true)?;
        let row = self.current_row.max(0) as usize;
        self.internal_set_selection(0, row, true);
        Ok(true)
    }

    /// Shift-Tab at column 0: move to the last column of the previous row.
    /// Silently does nothing at the absolute start of the collection.
    pub fn handle_previous_row_navigation(&mut self) -> Result<bool, TableError> {
        let last_column = self.column_count().saturating_sub(1);
        if self.current_row == 0 {
            if self.top_row == 0 {
                return Ok(false);
            }
            if !self.request_row_change() {
                return Ok(false);
            }
            self.deselect_current_row_if_visible();
            let current = self.current_row;
            self.do_set_top_row(self.top_row - 1, current, true)?;
            self.internal_set_selection(last_column, 0, true);
            return Ok(true);
        }
        if self.current_row > 0 {
            if !self.request_row_change() {
                return Ok(false);
            }
            self.deselect_current_row_if_visible();
            let row = (self.current_row - 1) as usize;
            self.internal_set_selection(last_column, row, false);
            return Ok(true);
        }
        Ok(false)
    }

    /// Focus-traversal dispatch. Returns whether the traversal was consumed
    /// by row navigation (the host should then suppress its own handling).
    pub fn handle_key_traversed(&mut self, traversal: Traversal) -> Result<bool, TableError> {
        let columns = self.column_count();
        let at_last_column = columns == 0 || self.current_column >= columns - 1;

        if !self.traverse_on_tabs {
            // Row traversal disabled: only report whether the edge was hit
            return Ok(match traversal {
                Traversal::TabNext => at_last_column,
                Traversal::TabPrevious => self.current_column == 0,
                Traversal::Return => false,
            });
        }

        match traversal {
            Traversal::TabNext => {
                if at_last_column {
                    self.handle_next_row_navigation()?;
                    return Ok(true);
                }
                Ok(false)
            }
            Traversal::TabPrevious => {
                if self.current_column == 0 {
                    self.handle_previous_row_navigation()?;
                    return Ok(true);
                }
                Ok(false)
            }
            Traversal::Return => {
                if at_last_column {
                    self.handle_next_row_navigation()?;
                } else if self.is_row_visible(self.current_row) {
                    let column = self.current_column + 1;
                    let row = self.current_row as usize;
                    self.internal_set_selection(column, row, false);
                }
                Ok(true)
            }
        }
    }

    /// Keyboard driver. Modifier state is passed in explicitly by the host;
    /// the core keeps no global key state.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: Modifiers) -> Result<bool, TableError> {
        if self.do_make_focused_row_visible()? {
            return Ok(true);
        }
        if modifiers.ctrl {
            return match key {
                KeyCode::Home => self.do_focus_initial_row(),
                KeyCode::End => self.do_focus_last_row(),
                KeyCode::Insert => self.do_insert_row(),
                KeyCode::Delete => self.do_delete_row(),
                _ => Ok(false),
            };
        }
        match key {
            KeyCode::ArrowUp => self.do_row_up(),
            KeyCode::ArrowDown => self.do_row_down(),
            KeyCode::PageUp => self.do_page_up(),
            KeyCode::PageDown => self.do_page_down(),
            _ => Ok(false),
        }
    }

    // Mouse wheel and scrollbar drivers
    // --------------------------------------------------------------

    /// Mouse wheel: a one-row slide per notch, keeping the focused row
    /// tracked across the move. Positive delta scrolls up.
    pub fn handle_scroll_wheel(&mut self, delta: i32) -> Result<bool, TableError> {
        if delta > 0 {
            if self.top_row == 0 {
                return Ok(false);
            }
            if !self.request_row_change() {
                return Ok(false);
            }
            self.deselect_current_row_if_visible();
            let current = self.current_row;
            self.do_set_top_row(self.top_row - 1, current + 1, true)?;
        } else if delta < 0 {
            if self.top_row + self.window.num_rows_visible() >= self.collection_size {
                return Ok(false);
            }
            if !self.request_row_change() {
                return Ok(false);
            }
            self.deselect_current_row_if_visible();
            let current = self.current_row;
            self.do_set_top_row(self.top_row + 1, current - 1, true)?;
        } else {
            return Ok(false);
        }

        if self.is_row_visible(self.current_row) {
            let column = self.current_column;
            let row = self.current_row as usize;
            self.internal_set_selection(column, row, true);
        }
        Ok(true)
    }

    /// Scrollbar driver: an absolute jump to `selection` as the new top
    /// row, keeping the focused row tracked. Out-of-range slider values are
    /// clamped defensively (the slider is an internal collaborator, not the
    /// public API).
    pub fn handle_scrollbar(&mut self, selection: usize) -> Result<bool, TableError> {
        if self.collection_size == 0 {
            return Ok(false);
        }
        let span = self.window.effective_visible(0, self.collection_size);
        let max_top = if span > 0 {
            self.collection_size - span
        } else {
            self.collection_size - 1
        };
        let selection = selection.min(max_top);
        if selection == self.top_row {
            return Ok(false);
        }
        if !self.request_row_change() {
            return Ok(false);
        }
        self.deselect_current_row_if_visible();
        let was_visible = self.is_row_visible(self.current_row);
        let delta = self.top_row as isize - selection as isize;
        let current = self.current_row + delta;
        self.do_set_top_row(selection, current, true)?;

        // If the focused row just scrolled into view, hand focus to it
        if !was_visible && self.is_row_visible(self.current_row) {
            let column = self.current_column;
            let row = self.current_row as usize;
            self.internal_set_selection(column, row, true);
        }
        Ok(true)
    }

    // Insert / delete mutation
    // --------------------------------------------------------------

    fn fire_insert(&self, position_hint: usize) -> Option<usize> {
        for handler in &self.insert_handlers {
            if let Some(position) = handler.insert(position_hint) {
                return Some(position);
            }
        }
        None
    }

    fn fire_can_delete(&self, absolute: usize) -> bool {
        self.delete_handlers
            .iter()
            .all(|h| h.can_delete(absolute))
    }

    /// Ask the model to insert a record near the current position, then
    /// bring the new record into view and select it. Returns `Ok(false)`
    /// when no handler is registered, the model rejects the insert, or a
    /// focus listener vetoes leaving the current row.
    pub fn do_insert_row(&mut self) -> Result<bool, TableError> {
        if self.insert_handlers.is_empty() {
            return Ok(false);
        }
        if !self.request_row_change() {
            return Ok(false);
        }
        let hint = (self.top_row as isize + self.current_row).max(0) as usize;
        let Some(position) = self.fire_insert(hint) else {
            return Ok(false);
        };
        debug!(target: "navigation", "Inserted row at absolute {}", position);

        self.placeholder.hide();
        self.deselect_current_row_if_visible();
        let column = self.current_column;
        let visible = self.window.num_rows_visible();

        // New record lands inside the window: splice it in, pushing later
        // rows down; the recompute trims the tail if the window is full
        if position >= self.top_row && position < self.top_row + visible {
            let relative = position - self.top_row;
            self.window.insert_at(&mut self.pool, relative)?;
            self.collection_size += 1;
            self.update_visible_rows(false)?;
            self.refresh_row(relative);
            self.internal_set_selection(column, relative, true);
            return Ok(true);
        }

        self.collection_size += 1;

        // Above the window: scroll up one row to reveal the shift. The
        // slide only refreshes the newly acquired top row, but the insert
        // moved every record behind the kept rows too, so re-refresh them
        if position < self.top_row {
            let current = self.current_row;
            let new_top = self.top_row - 1;
            self.do_set_top_row(new_top, current, true)?;
            self.refresh_all_rows();
            self.internal_set_selection(column, 0, true);
            return Ok(true);
        }

        // Below the window with spare room under the effective cap: the
        // window simply grows
        let cap = self
            .window
            .viewport_capacity()
            .min(self.window.max_rows_visible());
        if cap > visible {
            self.update_visible_rows(false)?;
            let grown = self.window.num_rows_visible();
            let relative = (position - self.top_row).min(grown.saturating_sub(1));
            self.internal_set_selection(column, relative, true);
            return Ok(true);
        }

        // Below with a full window: scroll down to reveal it at the bottom
        let current = self.current_row;
        let new_top = position + 1 - visible;
        self.do_set_top_row(new_top, current, true)?;
        let relative = self.window.num_rows_visible().saturating_sub(1);
        self.internal_set_selection(column, relative, true);
        Ok(true)
    }

    /// Ask the model to delete the focused record, then repair the window
    /// and move the selection. Returns `Ok(false)` when no handler is
    /// registered, any handler refuses, or there is no focused row.
    pub fn do_delete_row(&mut self) -> Result<bool, TableError> {
        if self.delete_handlers.is_empty() {
            return Ok(false);
        }
        if !self.is_row_visible(self.current_row) {
            return Ok(false);
        }
        let absolute = self.top_row + self.current_row as usize;
        if !self.fire_can_delete(absolute) {
            return Ok(false);
        }
        for handler in &self.delete_handlers {
            handler.delete_row(absolute);
        }
        debug!(target: "navigation", "Deleted row at absolute {}", absolute);

        self.collection_size -= 1;
        let visible = self.window.num_rows_visible();
        let column = self.current_column;
        let current = self.current_row as usize;

        if self.current_row >= visible as isize - 1 {
            // Deleted the last visible row
            if self.collection_size > 0 {
                if current < 1 {
                    // Only one row was visible: scroll up to keep a full
                    // window
                    self.window.remove_at(&mut self.pool, current);
                    let new_top = self.top_row.saturating_sub(1);
                    let tracked = self.current_row;
                    self.do_set_top_row(new_top, tracked, true)?;
                    let row = self.current_row.max(0) as usize;
                    self.internal_set_selection(column, row, true);
                } else {
                    // Move focus to the previous row
                    self.window.remove_at(&mut self.pool, current);
                    self.current_row = current as isize - 1;
                    self.update_visible_rows(false)?;
                    self.internal_set_selection(column, current - 1, false);
                }
            } else {
                // The collection is now empty: show the placeholder
                self.window.remove_at(&mut self.pool, current);
                self.update_visible_rows(false)?;
                self.placeholder.set_focus(true);
            }
        } else {
            // Keep the focus where it was; a new bottom row slides up
            self.window.remove_at(&mut self.pool, current);
            self.update_visible_rows(false)?;
            self.internal_set_selection(column, current, true);
        }

        for handler in &self.delete_handlers {
            handler.row_deleted(absolute);
        }
        Ok(true)
    }

    // Teardown
    // --------------------------------------------------------------

    /// Destroy every row handle and drop pending deferred focus tasks.
    pub fn dispose(&mut self) {
        self.deferred.clear();
        self.window.release_all(&mut self.pool);
        self.pool.dispose_all();
        self.current_row = -1;
        self.placeholder.show();
    }
}
