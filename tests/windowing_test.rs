use std::cell::RefCell;
use std::rc::Rc;

use composite_table::{
    CompositeTable, ProviderError, RowContentProvider, RowFactory, RowHandle, RowPrototype,
    ScrollDirection, ScrollEvent, ScrollListener, TableConfig, TableError,
};

fn factory() -> Box<dyn RowFactory> {
    Box::new(|| {
        Ok(RowPrototype {
            column_count: 3,
            selectable: true,
        })
    })
}

struct NumberProvider;

impl RowContentProvider for NumberProvider {
    fn refresh(&self, absolute: usize, handle: &mut RowHandle) -> Result<(), ProviderError> {
        handle.set_cell(0, format!("row {}", absolute));
        Ok(())
    }
}

#[derive(Default)]
struct ScrollRecorder {
    events: RefCell<Vec<ScrollDirection>>,
}

impl ScrollListener for ScrollRecorder {
    fn table_scrolled(&self, event: &ScrollEvent) {
        self.events.borrow_mut().push(event.direction);
    }
}

fn make_table(capacity: usize, rows: usize) -> CompositeTable {
    let mut table = CompositeTable::new(factory());
    table.add_row_content_provider(Rc::new(NumberProvider));
    table.set_viewport_capacity(capacity).unwrap();
    table.set_num_rows_in_collection(rows).unwrap();
    table
}

fn cell(table: &CompositeTable, relative: usize) -> String {
    let id = table.get_row_controls()[relative];
    table.row_handle(id).unwrap().cell(0).unwrap().to_string()
}

#[test]
fn test_populating_materializes_window() {
    let table = make_table(10, 100);

    assert_eq!(table.num_rows_visible(), 10);
    assert_eq!(table.top_row(), 0);
    assert!(!table.placeholder().is_visible());
    for relative in 0..10 {
        assert_eq!(cell(&table, relative), format!("row {}", relative));
    }
    assert_eq!(table.pool_stats().created, 10);
}

#[test]
fn test_small_collection_shrinks_window() {
    let table = make_table(10, 3);

    assert_eq!(table.num_rows_visible(), 3);
    assert_eq!(cell(&table, 2), "row 2");
}

#[test]
fn test_set_top_row_clamps_near_tail() {
    let mut table = make_table(10, 100);

    assert!(table.set_top_row(95).unwrap());
    assert_eq!(table.top_row(), 90);
    assert_eq!(cell(&table, 0), "row 90");
    assert_eq!(cell(&table, 9), "row 99");
}

#[test]
fn test_set_top_row_rejects_out_of_range() {
    let mut table = make_table(10, 100);

    match table.set_top_row(100) {
        Err(TableError::TopRowOutOfRange {
            requested,
            collection_size,
        }) => {
            assert_eq!(requested, 100);
            assert_eq!(collection_size, 100);
        }
        other => panic!("expected TopRowOutOfRange, got {:?}", other),
    }
    match table.set_top_row(0) {
        Ok(true) => {}
        _ => panic!("current top row should be accepted"),
    }

    let mut empty = make_table(10, 0);
    assert!(empty.set_top_row(0).is_err());
}

#[test]
fn test_set_top_row_is_idempotent() {
    let mut table = make_table(10, 100);
    let recorder = Rc::new(ScrollRecorder::default());
    table.add_scroll_listener(recorder.clone());

    assert!(table.set_top_row(5).unwrap());
    assert_eq!(recorder.events.borrow().len(), 1);
    let created = table.pool_stats().created;

    // Setting the same value again must be a complete no-op
    assert!(table.set_top_row(5).unwrap());
    assert_eq!(recorder.events.borrow().len(), 1);
    assert_eq!(table.pool_stats().created, created);
}

#[test]
fn test_short_scroll_slides_without_construction() {
    let mut table = make_table(10, 100);
    let recorder = Rc::new(ScrollRecorder::default());
    table.add_scroll_listener(recorder.clone());

    table.set_top_row(3).unwrap();

    assert_eq!(table.pool_stats().created, 10);
    assert_eq!(cell(&table, 0), "row 3");
    assert_eq!(cell(&table, 9), "row 12");
    assert_eq!(recorder.events.borrow().as_slice(), &[ScrollDirection::Forward]);

    table.set_top_row(1).unwrap();
    assert_eq!(cell(&table, 0), "row 1");
    assert_eq!(
        recorder.events.borrow().as_slice(),
        &[ScrollDirection::Forward, ScrollDirection::Backward]
    );
}

#[test]
fn test_long_jump_recycles_every_handle() {
    let mut table = make_table(10, 100);

    table.set_top_row(50).unwrap();

    // The jump is disjoint but release precedes acquisition, so the
    // spares cover every slot and nothing new is constructed
    assert_eq!(table.pool_stats().created, 10);
    assert_eq!(cell(&table, 0), "row 50");
    assert_eq!(cell(&table, 9), "row 59");
}

#[test]
fn test_empty_collection_shows_placeholder() {
    let mut table = make_table(5, 0);

    assert_eq!(table.num_rows_visible(), 0);
    assert!(table.placeholder().is_visible());
    assert_eq!(table.current_row(), -1);

    table.set_num_rows_in_collection(4).unwrap();
    assert!(!table.placeholder().is_visible());
    assert_eq!(table.num_rows_visible(), 4);

    table.set_num_rows_in_collection(0).unwrap();
    assert!(table.placeholder().is_visible());
    assert_eq!(table.num_rows_visible(), 0);
    assert_eq!(table.current_row(), -1);
}

#[test]
fn test_max_rows_visible_caps_the_window() {
    let config = TableConfig {
        max_rows_visible: Some(1),
        ..TableConfig::default()
    };
    let mut table = CompositeTable::with_config(factory(), &config);
    table.add_row_content_provider(Rc::new(NumberProvider));
    table.set_viewport_capacity(10).unwrap();
    table.set_num_rows_in_collection(5).unwrap();

    assert_eq!(table.num_rows_visible(), 1);
    assert_eq!(cell(&table, 0), "row 0");
}

#[test]
fn test_resize_grows_and_shrinks_window() {
    let mut table = make_table(5, 100);
    let recorder = Rc::new(ScrollRecorder::default());
    table.add_scroll_listener(recorder.clone());

    table.set_viewport_capacity(8).unwrap();
    assert_eq!(table.num_rows_visible(), 8);
    assert_eq!(cell(&table, 7), "row 7");

    table.set_viewport_capacity(3).unwrap();
    assert_eq!(table.num_rows_visible(), 3);

    // Resizes recompute the window but are not scrolls
    assert!(recorder.events.borrow().is_empty());
}

#[test]
fn test_resize_near_tail_pulls_top_row_back() {
    let mut table = make_table(10, 12);
    table.set_top_row(2).unwrap();
    assert_eq!(table.top_row(), 2);

    // Growing the window at the tail must not expose blank rows
    table.set_viewport_capacity(12).unwrap();
    assert_eq!(table.top_row(), 0);
    assert_eq!(table.num_rows_visible(), 12);
    assert_eq!(cell(&table, 11), "row 11");
}

#[test]
fn test_shrinking_collection_resets_scroll_position() {
    let mut table = make_table(10, 100);
    table.set_top_row(40).unwrap();

    table.set_num_rows_in_collection(20).unwrap();

    assert_eq!(table.top_row(), 0);
    assert_eq!(table.num_rows_visible(), 10);
    assert_eq!(cell(&table, 0), "row 0");
}

#[test]
fn test_provider_error_marks_row_and_continues() {
    let mut table = CompositeTable::new(factory());

    struct FlakyProvider;
    impl RowContentProvider for FlakyProvider {
        fn refresh(&self, absolute: usize, handle: &mut RowHandle) -> Result<(), ProviderError> {
            if absolute == 2 {
                return Err(ProviderError::new("backing store miss"));
            }
            handle.set_cell(0, format!("row {}", absolute));
            Ok(())
        }
    }

    table.add_row_content_provider(Rc::new(FlakyProvider));
    table.set_viewport_capacity(5).unwrap();
    table.set_num_rows_in_collection(5).unwrap();

    assert_eq!(cell(&table, 1), "row 1");
    assert_eq!(cell(&table, 2), composite_table::REFRESH_ERROR_MARKER);
    assert_eq!(cell(&table, 3), "row 3");
}

#[test]
fn test_dispose_destroys_all_handles() {
    let mut table = make_table(10, 100);
    let controls = table.get_row_controls();
    assert_eq!(controls.len(), 10);

    table.dispose();

    assert!(table.get_row_controls().is_empty());
    for id in controls {
        assert!(table.row_handle(id).is_none());
    }
    assert!(table.placeholder().is_visible());
}
