//! Benchmarks for the compile pipeline.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};

use mdtex::ast::Node;
use mdtex::latex::{RenderOptions, escape_latex};
use mdtex::parse::MarkdownParser;

/// Build a Markdown document with `sections` sections of mixed content.
fn sample_markdown(sections: usize) -> String {
    let mut doc = String::new();
    for i in 0..sections {
        doc.push_str(&format!("## Section {i}\n\n"));
        doc.push_str(&format!(
            "Paragraph with *emphasis*, `code`, 50% escapes and a note[^n{i}].\n\n"
        ));
        doc.push_str("| Key | Value | 说明 |\n|:----|:-----:|-----:|\n");
        for row in 0..5 {
            doc.push_str(&format!("| k{row} | v{row} | 中文内容 |\n"));
        }
        doc.push_str("\n$$\\sum_{k=1}^{n} k = \\frac{n(n+1)}{2}$$\n\n");
        doc.push_str("```rust\nfn main() { println!(\"hello\"); }\n```\n\n");
        doc.push_str(&format!("[^n{i}]: Footnote body {i}.\n\n"));
    }
    doc
}

// ============================================================================
// Parsing
// ============================================================================

fn bench_parse_markdown(c: &mut Criterion) {
    let source = sample_markdown(50);
    c.bench_function("parse_markdown", |b| {
        b.iter(|| MarkdownParser.parse(&source));
    });
}

// ============================================================================
// Compilation
// ============================================================================

fn bench_compile(c: &mut Criterion) {
    let tree = MarkdownParser.parse(&sample_markdown(50));
    let options = RenderOptions::for_document("bench/sample.md");
    c.bench_function("compile", |b| {
        b.iter(|| mdtex::compile(&tree, &options));
    });
}

fn bench_load_json(c: &mut Criterion) {
    let json = r#"{"type":"root","children":[{"type":"paragraph","children":[{"type":"text","value":"50% done"},{"type":"inlineMath","value":"x^2"}]}]}"#;
    c.bench_function("load_json", |b| {
        b.iter(|| Node::from_json(json).unwrap());
    });
}

fn bench_escape(c: &mut Criterion) {
    let text = "Costs $5 & 50% off {braces} under_scores ~tilde^caret — dash ".repeat(200);
    c.bench_function("escape_latex", |b| {
        b.iter(|| escape_latex(&text));
    });
}

criterion_group!(
    benches,
    bench_parse_markdown,
    bench_compile,
    bench_load_json,
    bench_escape
);
criterion_main!(benches);
