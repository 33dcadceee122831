use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::rc::Rc;

use composite_table::{
    CompositeTable, ProviderError, RowContentProvider, RowFactory, RowHandle, RowPrototype,
};

struct IndexProvider;

impl RowContentProvider for IndexProvider {
    fn refresh(&self, absolute: usize, handle: &mut RowHandle) -> Result<(), ProviderError> {
        handle.set_cell(0, absolute.to_string());
        Ok(())
    }
}

fn create_table(capacity: usize, rows: usize) -> CompositeTable {
    let factory: Box<dyn RowFactory> = Box::new(|| {
        Ok(RowPrototype {
            column_count: 4,
            selectable: true,
        })
    });
    let mut table = CompositeTable::new(factory);
    table.add_row_content_provider(Rc::new(IndexProvider));
    table.set_viewport_capacity(capacity).unwrap();
    table.set_num_rows_in_collection(rows).unwrap();
    table
}

fn benchmark_sequential_scroll(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_scroll");

    // One-row slides through a large collection: the common case while
    // holding the down arrow or dragging the thumb slowly
    group.bench_function("100k_rows_window_50", |b| {
        let mut table = create_table(50, 100_000);
        let mut top = 0usize;
        b.iter(|| {
            top = (top + 1) % 99_000;
            table.set_top_row(black_box(top)).unwrap();
        });
    });

    group.bench_function("100k_rows_window_200", |b| {
        let mut table = create_table(200, 100_000);
        let mut top = 0usize;
        b.iter(|| {
            top = (top + 1) % 99_000;
            table.set_top_row(black_box(top)).unwrap();
        });
    });

    group.finish();
}

fn benchmark_disjoint_jumps(c: &mut Criterion) {
    let mut group = c.benchmark_group("disjoint_jumps");

    // Scrollbar jumps far enough that no window positions overlap; every
    // handle recycles through the spare list
    group.bench_function("100k_rows_window_50", |b| {
        let mut table = create_table(50, 100_000);
        let mut i = 0usize;
        b.iter(|| {
            i += 1;
            let top = (i * 7_919) % 99_000;
            table.handle_scrollbar(black_box(top)).unwrap();
        });
    });

    group.finish();
}

fn benchmark_page_navigation(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_navigation");

    group.bench_function("page_down_up_window_50", |b| {
        let mut table = create_table(50, 100_000);
        table.set_selection(0, 0).unwrap();
        table.pump_deferred();
        b.iter(|| {
            table.do_page_down().unwrap();
            table.pump_deferred();
            table.do_page_up().unwrap();
            table.pump_deferred();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_sequential_scroll,
    benchmark_disjoint_jumps,
    benchmark_page_navigation
);
criterion_main!(benches);
