//! Collaborator contracts for the table core
//!
//! This module defines the listener and handler traits through which the
//! windowing core talks to the outside world: row focus (with veto), row
//! construction, insert/delete mutation, and scroll notification. All
//! callbacks run synchronously on the single UI event thread.

use crate::row_pool::RowHandle;

/// Direction of the most recent user scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    #[default]
    None,
    /// Scrolling towards larger logical indices (down).
    Forward,
    /// Scrolling towards smaller logical indices (up).
    Backward,
}

/// Fired once per completed top-row change caused by user scrolling.
/// Resize-only recomputes never produce one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollEvent {
    pub direction: ScrollDirection,
}

/// Listener for scroll events.
pub trait ScrollListener {
    fn table_scrolled(&self, event: &ScrollEvent);
}

/// Row focus protocol: a veto hook plus depart/arrive notifications.
///
/// `request_row_change` is polled before every position change while the old
/// row is still materialized; any listener returning `false` aborts the whole
/// operation with zero state mutation. `depart` fires after all listeners
/// grant the change, `arrive` after the new position is applied (possibly on
/// the following event-loop turn, see deferred focus).
pub trait RowFocusListener {
    fn request_row_change(&self, _absolute: usize, _handle: &RowHandle) -> bool {
        true
    }
    fn depart(&self, _absolute: usize, _handle: &RowHandle) {}
    fn arrive(&self, _absolute: usize, _handle: &RowHandle) {}
}

/// Notified whenever the pool constructs a brand-new row handle (not when a
/// spare is recycled), and again when handles are destroyed at teardown so
/// hosts can unregister anything they attached to the handle.
pub trait RowConstructionListener {
    fn row_constructed(&self, handle: &RowHandle);
    fn row_disposed(&self, _handle: &RowHandle) {}
}

/// Requests that the model insert a new record near `position_hint`.
/// Returns the absolute index actually inserted, or `None` if the model
/// could not insert.
pub trait InsertHandler {
    fn insert(&self, position_hint: usize) -> Option<usize>;
}

/// Three-phase delete protocol: approval, mutation, post-notification.
pub trait DeleteHandler {
    fn can_delete(&self, _absolute: usize) -> bool {
        true
    }
    fn delete_row(&self, absolute: usize);
    fn row_deleted(&self, _absolute: usize) {}
}

/// Keys the navigation state machine understands. The hosting toolkit maps
/// its own key events onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    ArrowUp,
    ArrowDown,
    PageUp,
    PageDown,
    Home,
    End,
    Insert,
    Delete,
}

/// Modifier state sampled by the host at the point of the event and passed
/// in explicitly; the core keeps no global key state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
        alt: false,
    };
}

/// Focus-traversal requests (Tab / Shift-Tab / Return within a row).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    TabNext,
    TabPrevious,
    Return,
}
