//! # Lookup Benchmarks
//!
//! Performance benchmarks for tscat-core parsing, compiling and lookups.
//!
//! Run with: `cargo bench -p tscat-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tscat_core::{
    Catalog, Context, Message, Translator, compile, load_compiled, parse_ts, write_ts,
};

/// Create a catalog with `contexts` contexts of 50 finished messages each.
fn create_catalog(contexts: usize) -> Catalog {
    let mut catalog = Catalog::new("uk");
    for c in 0..contexts {
        let mut context = Context::new(format!("Dialog{c}"));
        for m in 0..50 {
            context = context.with_message(Message::new(
                format!("Label number {m}"),
                format!("Мітка номер {m}"),
            ));
        }
        context = context.with_message(Message::plural(
            "%n coin(s)",
            vec!["%n монета".into(), "%n монети".into(), "%n монет".into()],
        ));
        catalog = catalog.with_context(context);
    }
    catalog
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_ts");

    for size in [10, 100, 500].iter() {
        let xml = write_ts(&create_catalog(*size));

        group.bench_with_input(BenchmarkId::from_parameter(size), &xml, |b, xml| {
            b.iter(|| black_box(parse_ts(xml)));
        });
    }

    group.finish();
}

fn bench_load_compiled(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_compiled");

    for size in [10, 100, 500].iter() {
        let bytes = compile(&create_catalog(*size)).expect("compile");

        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| black_box(load_compiled(bytes).map(|c| c.translator())));
        });
    }

    group.finish();
}

fn bench_translate(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate");

    for size in [10, 100, 500].iter() {
        let translator = Translator::from_catalog(&create_catalog(*size));
        let context = format!("Dialog{}", size / 2);

        group.bench_with_input(BenchmarkId::new("hit", size), &context, |b, context| {
            b.iter(|| black_box(translator.translate(context, "Label number 25", None)));
        });

        group.bench_with_input(BenchmarkId::new("miss", size), &context, |b, context| {
            b.iter(|| black_box(translator.translate(context, "No such label", None)));
        });

        group.bench_with_input(BenchmarkId::new("plural", size), &context, |b, context| {
            b.iter(|| black_box(translator.translate_plural(context, "%n coin(s)", None, 23)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_load_compiled, bench_translate);
criterion_main!(benches);
