//! Benchmarks for the brochure editing engine.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use prospekt::render::NoopHandlers;
use prospekt::snap::Rect;
use prospekt::{
    compute_snap, render_document, render_page, ChangeClass, Document, ElementKind,
    ElementManager, History, Page, PageType, Photo, Point, Preferences, Size, SnapConfig,
};

fn sample_document(pages: usize, photos_per_page: usize) -> Document {
    let mut doc = Document::new();
    for i in 0..(pages * photos_per_page) {
        doc.photos.push(
            Photo::new(format!("ph-{}", i), format!("photo-{}.jpg", i))
                .with_url(format!("http://cdn/ph-{}.jpg", i)),
        );
    }
    for p in 0..pages {
        let mut page = Page::new(format!("page-{}", p), PageType::Content)
            .with_title(format!("Page {}", p))
            .with_content("description", "A generously proportioned reception room.");
        for i in 0..photos_per_page {
            page.photos.push(format!("ph-{}", p * photos_per_page + i));
        }
        doc.pages.push(page);
    }
    doc
}

fn bench_render_page(c: &mut Criterion) {
    let doc = sample_document(1, 6);
    let prefs = Preferences::default();
    c.bench_function("render_page_6_photos", |b| {
        b.iter(|| {
            black_box(render_page(
                &doc.pages[0],
                &doc,
                &prefs,
                &NoopHandlers,
            ))
        })
    });
}

fn bench_render_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_document");

    for num_pages in [1, 8, 24].iter() {
        let doc = sample_document(*num_pages, 3);
        let prefs = Preferences::default();
        group.bench_with_input(BenchmarkId::new("pages", num_pages), num_pages, |b, _| {
            b.iter(|| {
                black_box(render_document(
                    &doc,
                    &prefs,
                    &NoopHandlers,
                ))
            })
        });
    }
    group.finish();
}

fn bench_history_push(c: &mut Criterion) {
    let doc = sample_document(8, 3);
    c.bench_function("history_push_full_snapshot", |b| {
        let mut history: History<Vec<Page>> = History::new();
        let mut i = 0u64;
        b.iter(|| {
            history.push(
                format!("edit-{}", i),
                ChangeClass::Content,
                doc.pages.clone(),
            );
            i += 1;
        })
    });
}

fn bench_snap(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_snap");

    for num_siblings in [1, 10, 50].iter() {
        let siblings: Vec<Rect> = (0..*num_siblings)
            .map(|i| Rect::new((i * 37) as f64, (i * 53) as f64 % 900.0, 80.0, 60.0))
            .collect();
        let canvas = Rect::new(0.0, 0.0, 794.0, 1123.0);
        let config = SnapConfig::default();
        group.bench_with_input(
            BenchmarkId::new("siblings", num_siblings),
            num_siblings,
            |b, _| {
                b.iter(|| {
                    black_box(compute_snap(
                        Point::new(203.0, 411.0),
                        Size::new(120.0, 90.0),
                        &siblings,
                        canvas,
                        &config,
                    ))
                })
            },
        );
    }
    group.finish();
}

fn bench_element_paste(c: &mut Criterion) {
    c.bench_function("element_copy_paste", |b| {
        let mut manager = ElementManager::new();
        let id = manager.create(
            "page-0",
            ElementKind::Shape {
                shape: "rect".to_string(),
            },
            Point::new(100.0, 100.0),
            Size::new(40.0, 40.0),
        );
        manager.copy("page-0", &id).unwrap();
        b.iter(|| {
            black_box(manager.paste("page-0", None).unwrap());
        })
    });
}

criterion_group!(
    benches,
    bench_render_page,
    bench_render_document,
    bench_history_push,
    bench_snap,
    bench_element_paste,
);

criterion_main!(benches);
