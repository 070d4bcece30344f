#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fmt::Write;
use readable_dom::builder::build_document;
use readable_dom::parse::parse_document;
use readable_dom::walker::TreeWalker;
use readable_dom::Document;

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// Generates an article-like page with `paragraphs` paragraphs, some inline
/// markup and entity references.
fn make_article(paragraphs: usize) -> String {
    let mut html = String::from(
        "<!DOCTYPE html><html><head><title>Bench &amp; co</title>\
         <style>p { margin: 0 }</style></head><body><div id=\"content\">",
    );
    for i in 0..paragraphs {
        let _ = write!(
            html,
            "<p class=\"para\">Paragraph {i} with <a href=\"/link/{i}\">a link</a>, \
             <em>emphasis</em> &amp; some &quot;quoted&quot; text.</p>\n"
        );
    }
    html.push_str("</div><div class=\"sidebar\"><ul>");
    for i in 0..paragraphs / 10 {
        let _ = write!(html, "<li><a href=\"#{i}\">Item {i}</a>");
    }
    html.push_str("</ul></div></body></html>");
    html
}

/// Generates a document nested `depth` levels deep.
fn make_nested(depth: usize) -> String {
    let mut html = "<div>".repeat(depth);
    html.push_str("deep");
    html.push_str(&"</div>".repeat(depth));
    html
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let html = make_article(200);
    c.bench_function("parse_article", |b| {
        b.iter(|| parse_document(black_box(&html)));
    });
}

fn bench_walk(c: &mut Criterion) {
    let tree = parse_document(&make_article(200));
    c.bench_function("walk_article", |b| {
        b.iter(|| TreeWalker::new(black_box(&tree)).count());
    });
}

fn bench_build(c: &mut Criterion) {
    let tree = parse_document(&make_article(200));
    c.bench_function("build_article", |b| {
        b.iter(|| build_document(black_box(&tree), "https://example.com/"));
    });
}

fn bench_build_nested(c: &mut Criterion) {
    let tree = parse_document(&make_nested(400));
    c.bench_function("build_nested_400", |b| {
        b.iter(|| build_document(black_box(&tree), ""));
    });
}

fn bench_lookup(c: &mut Criterion) {
    let doc = Document::parse(&make_article(200), "");
    c.bench_function("get_elements_by_tag_name", |b| {
        b.iter(|| doc.get_elements_by_tag_name(doc.root(), black_box("a")).len());
    });
    c.bench_function("get_element_by_id", |b| {
        b.iter(|| doc.get_element_by_id(doc.root(), black_box("missing")));
    });
}

fn bench_serialize(c: &mut Criterion) {
    let doc = Document::parse(&make_article(200), "");
    c.bench_function("outer_html", |b| {
        b.iter(|| doc.outer_html(black_box(doc.root())));
    });
    c.bench_function("text_content", |b| {
        b.iter(|| doc.text_content(black_box(doc.root())));
    });
}

fn bench_mutation(c: &mut Criterion) {
    c.bench_function("replace_every_paragraph", |b| {
        b.iter_batched(
            || Document::parse(&make_article(100), ""),
            |mut doc| {
                for p in doc.get_elements_by_tag_name(doc.root(), "p") {
                    let parent = doc.parent(p).expect("paragraph is attached");
                    let div = doc.create_element("div");
                    doc.replace_child(parent, div, p).expect("paragraph is a child");
                }
                doc
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(parsing, bench_parse, bench_walk);
criterion_group!(building, bench_build, bench_build_nested);
criterion_group!(model, bench_lookup, bench_serialize, bench_mutation);

criterion_main!(parsing, building, model);
