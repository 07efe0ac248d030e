//! Benchmarks for the render pipeline.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use markpane::highlight::highlight_html;
use markpane::preview::PreviewSurface;
use markpane::render::{ComrakRenderer, DebouncedRenderer, InlineExecutor, MarkdownRenderer};

fn sample_markdown() -> String {
    let mut md = String::from("# Notes\n\n");
    for i in 0..40 {
        md.push_str(&format!(
            "## Section {i}\n\nSome **bold** and _italic_ text with `code`.\n\n- [ ] task {i}\n\n"
        ));
    }
    md
}

fn bench_comrak_render(c: &mut Criterion) {
    let md = sample_markdown();
    let renderer = ComrakRenderer::new();
    c.bench_function("comrak_render", |b| {
        b.iter(|| renderer.render(black_box(&md)))
    });
}

fn bench_burst_then_commit(c: &mut Criterion) {
    let md = sample_markdown();
    c.bench_function("burst_then_commit", |b| {
        b.iter(|| {
            let mut renderer = DebouncedRenderer::new(InlineExecutor::new(ComrakRenderer::new()));
            let mut surface = PreviewSurface::new();
            // The sample is ASCII, so every prefix is a valid slice.
            for (at, end) in (1..=md.len()).step_by(97).enumerate() {
                renderer.schedule(&md[..end], at as u64 * 10);
            }
            renderer.poll(u64::MAX);
            renderer.drain(Some(&mut surface));
            black_box(surface.revision())
        });
    });
}

fn bench_highlight_html(c: &mut Criterion) {
    let html = ComrakRenderer::new().render(&sample_markdown()).unwrap_or_default();
    c.bench_function("highlight_html", |b| {
        b.iter(|| highlight_html(black_box(&html)))
    });
}

criterion_group!(
    benches,
    bench_comrak_render,
    bench_burst_then_commit,
    bench_highlight_html
);
criterion_main!(benches);
