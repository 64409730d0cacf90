//! Benchmarks for tspage
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use memmap2::MmapMut;
use tempfile::tempfile;
use tspage::page::*;

const PAGE_SIZE: usize = 1024 * 1024;
const PARAMS: u32 = 16;

/// A page filled to capacity with 16-byte payloads spread over `PARAMS` keys
fn create_full_page() -> Page<Vec<u8>> {
    let mut page = Page::new(PageKind::Index, vec![0u8; PAGE_SIZE], 0).unwrap();
    let payload = [0u8; 16];
    let mut i = 0i64;
    while page
        .add_entry_ref(&EntryRef::new(
            (i as u32 * 7919) % PARAMS,
            Timestamp::from_micros(i * 1000),
            &payload,
        ))
        .is_ok()
    {
        i += 1;
    }
    page
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");
    let payload = [0u8; 16];
    let entries = create_full_page().get_entries_count();

    group.throughput(Throughput::Elements(entries as u64));

    group.bench_function("fill_vec_page", |b| {
        b.iter_batched(
            || Page::new(PageKind::Index, vec![0u8; PAGE_SIZE], 0).unwrap(),
            |mut page| {
                let mut i = 0i64;
                while page
                    .add_entry_ref(&EntryRef::new(1, Timestamp::from_micros(i), black_box(&payload)))
                    .is_ok()
                {
                    i += 1;
                }
                page
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("fill_mapped_page", |b| {
        let file = tempfile().unwrap();
        file.set_len(PAGE_SIZE as u64).unwrap();

        b.iter_batched(
            || {
                let map = unsafe { MmapMut::map_mut(&file).unwrap() };
                Page::new(PageKind::Index, map, 0).unwrap()
            },
            |mut page| {
                let mut i = 0i64;
                while page
                    .add_entry_ref(&EntryRef::new(1, Timestamp::from_micros(i), black_box(&payload)))
                    .is_ok()
                {
                    i += 1;
                }
                page
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");

    group.bench_function("sort_full_page", |b| {
        b.iter_batched(create_full_page, |page| page.sort(), BatchSize::LargeInput)
    });

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    let page = create_full_page().sort();

    group.bench_function("point_search", |b| {
        let mut key = 0u32;
        b.iter(|| {
            key = (key + 1) % PARAMS;
            page.search(black_box(key), Timestamp::from_micros(5_000_000))
        })
    });

    group.bench_function("cursor_scan_param", |b| {
        let mut results = vec![0u32; 256];
        b.iter(|| {
            let mut cursor =
                PageCursor::single_parameter(3, Timestamp::MIN, Timestamp::MAX, &mut results)
                    .unwrap();
            let mut total = 0usize;
            while !cursor.is_done() {
                page.search_cursor(&mut cursor);
                total += cursor.len();
                cursor.reset_results();
            }
            total
        })
    });

    group.bench_function("cursor_bbox_miss", |b| {
        let mut results = vec![0u32; 256];
        b.iter(|| {
            let mut cursor = PageCursor::single_parameter(
                black_box(PARAMS + 1),
                Timestamp::MIN,
                Timestamp::MAX,
                &mut results,
            )
            .unwrap();
            page.search_cursor(&mut cursor);
            cursor.is_done()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_append, bench_sort, bench_search);
criterion_main!(benches);
