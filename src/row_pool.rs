//! Recyclable pool of row view handles.
//!
//! The pool owns every row view the table ever materializes. When the window
//! shrinks or slides, handles are released back to a spare list rather than
//! destroyed; the next acquisition recycles a spare before asking the
//! factory for a new one. Handles are destroyed only when the whole viewport
//! is torn down. The pool knows nothing about logical indices.

use std::rc::Rc;

use tracing::debug;

use crate::error::ConstructionError;
use crate::events::RowConstructionListener;

/// Opaque slot id issued by the pool. Everything outside the pool refers to
/// row views only through these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(usize);

impl RowId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Shape of a freshly constructed row view, as reported by the factory.
#[derive(Debug, Clone, Copy)]
pub struct RowPrototype {
    pub column_count: usize,
    /// Whether the row's cells support a clearable text selection.
    pub selectable: bool,
}

/// Constructs one row view instance on demand. This replaces reflective
/// prototype cloning with a plain callback supplied at configuration time.
pub trait RowFactory {
    fn construct_row(&mut self) -> Result<RowPrototype, ConstructionError>;
}

impl<F> RowFactory for F
where
    F: FnMut() -> Result<RowPrototype, ConstructionError>,
{
    fn construct_row(&mut self) -> Result<RowPrototype, ConstructionError> {
        self()
    }
}

/// One materialized, reusable row view.
///
/// Content providers write cell text into it; the navigation layer reads its
/// column count and toggles its selection. The `alive` flag is the liveness
/// check for deferred focus: a handle that has been destroyed must never
/// receive a late focus assignment.
#[derive(Debug, Clone)]
pub struct RowHandle {
    id: RowId,
    column_count: usize,
    visible: bool,
    alive: bool,
    selectable: bool,
    cells: Vec<String>,
    selection: Option<(usize, usize)>,
    menu: Option<String>,
    background: Option<String>,
}

impl RowHandle {
    fn new(id: RowId, prototype: RowPrototype) -> Self {
        Self {
            id,
            column_count: prototype.column_count,
            visible: true,
            alive: true,
            selectable: prototype.selectable,
            cells: vec![String::new(); prototype.column_count],
            selection: None,
            menu: None,
            background: None,
        }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn cell(&self, column: usize) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    /// Write cell text; out-of-range columns are ignored.
    pub fn set_cell(&mut self, column: usize, text: impl Into<String>) {
        if let Some(cell) = self.cells.get_mut(column) {
            *cell = text.into();
        }
    }

    pub fn set_all_cells(&mut self, text: &str) {
        for cell in &mut self.cells {
            *cell = text.to_string();
        }
    }

    pub fn is_selectable(&self) -> bool {
        self.selectable
    }

    pub fn selection(&self) -> Option<(usize, usize)> {
        self.selection
    }

    pub fn set_selection(&mut self, start: usize, end: usize) {
        if self.selectable {
            self.selection = Some((start, end));
        }
    }

    /// Clear any text selection. No-op for rows without the capability.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn menu(&self) -> Option<&str> {
        self.menu.as_deref()
    }

    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }
}

/// Counters exposed for structural-change observation. Acquire/release are
/// the observable events a host can diff instead of polling child widgets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub created: usize,
    pub acquired: usize,
    pub released: usize,
}

pub struct RowPool {
    factory: Box<dyn RowFactory>,
    slots: Vec<RowHandle>,
    spare: Vec<RowId>,
    construction_listeners: Vec<Rc<dyn RowConstructionListener>>,
    menu: Option<String>,
    background: Option<String>,
    stats: PoolStats,
}

impl RowPool {
    pub fn new(factory: Box<dyn RowFactory>) -> Self {
        Self {
            factory,
            slots: Vec::new(),
            spare: Vec::new(),
            construction_listeners: Vec::new(),
            menu: None,
            background: None,
            stats: PoolStats::default(),
        }
    }

    /// Return a recycled spare handle if one exists, else construct a new
    /// one via the factory. Newly constructed handles are announced to
    /// construction listeners before being handed back. Factory failure is
    /// fatal and propagates immediately.
    pub fn acquire(&mut self) -> Result<RowId, ConstructionError> {
        self.stats.acquired += 1;

        if let Some(id) = self.spare.pop() {
            let menu = self.menu.clone();
            let background = self.background.clone();
            if let Some(handle) = self.slots.get_mut(id.0) {
                handle.visible = true;
                handle.menu = menu;
                handle.background = background;
            }
            debug!(target: "row_pool", "Recycled spare row {:?}", id);
            return Ok(id);
        }

        let prototype = self.factory.construct_row()?;
        let id = RowId(self.slots.len());
        let mut handle = RowHandle::new(id, prototype);
        handle.menu = self.menu.clone();
        handle.background = self.background.clone();
        self.slots.push(handle);
        self.stats.created += 1;
        debug!(target: "row_pool", "Constructed new row {:?} ({} columns)",
               id, prototype.column_count);

        let listeners: Vec<_> = self.construction_listeners.to_vec();
        if let Some(handle) = self.slots.get(id.0) {
            for listener in &listeners {
                listener.row_constructed(handle);
            }
        }
        Ok(id)
    }

    /// Hide the handle and park it on the spare list. Never destroys.
    pub fn release(&mut self, id: RowId) {
        if let Some(handle) = self.slots.get_mut(id.0) {
            handle.visible = false;
            handle.clear_selection();
            self.spare.push(id);
            self.stats.released += 1;
        }
    }

    /// Destroy every handle, active and spare, notifying construction
    /// listeners so hosts can unregister anything attached to the handles.
    pub fn dispose_all(&mut self) {
        let listeners: Vec<_> = self.construction_listeners.to_vec();
        for handle in &mut self.slots {
            handle.alive = false;
            handle.visible = false;
            for listener in &listeners {
                listener.row_disposed(handle);
            }
        }
        self.slots.clear();
        self.spare.clear();
        debug!(target: "row_pool", "Disposed all row handles");
    }

    pub fn get(&self, id: RowId) -> Option<&RowHandle> {
        self.slots.get(id.0)
    }

    pub fn get_mut(&mut self, id: RowId) -> Option<&mut RowHandle> {
        self.slots.get_mut(id.0)
    }

    pub fn is_alive(&self, id: RowId) -> bool {
        self.slots.get(id.0).is_some_and(|h| h.alive)
    }

    /// Propagate a context menu to all handles, present and future.
    pub fn set_menu(&mut self, menu: Option<String>) {
        self.menu = menu.clone();
        for handle in &mut self.slots {
            handle.menu = menu.clone();
        }
    }

    /// Propagate a background color to all handles, present and future.
    pub fn set_background(&mut self, background: Option<String>) {
        self.background = background.clone();
        for handle in &mut self.slots {
            handle.background = background.clone();
        }
    }

    pub fn add_construction_listener(&mut self, listener: Rc<dyn RowConstructionListener>) {
        self.construction_listeners.push(listener);
    }

    pub fn remove_construction_listener(&mut self, listener: &Rc<dyn RowConstructionListener>) {
        self.construction_listeners
            .retain(|l| !Rc::ptr_eq(l, listener));
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    pub fn spare_count(&self) -> usize {
        self.spare.len()
    }
}
