use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fmt::Write;
use xmldom::{parse_xml, DomSerializer};

/// A flat catalog with `count` records, each carrying attributes and text
fn make_catalog(count: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<catalog>\n");
    for i in 0..count {
        let _ = writeln!(
            xml,
            "  <book id=\"bk{i}\"><title>Title {i} &amp; more</title>\
             <price>{}.99</price><!-- note --></book>",
            10 + i
        );
    }
    xml.push_str("</catalog>\n");
    xml
}

fn make_nested(depth: usize) -> String {
    let mut xml = String::new();
    for i in 0..depth {
        let _ = write!(xml, "<level n=\"{i}\">");
    }
    for _ in 0..depth {
        xml.push_str("</level>");
    }
    xml
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for count in [10, 100, 1000] {
        let xml = make_catalog(count);
        group.throughput(Throughput::Bytes(xml.len() as u64));
        group.bench_with_input(BenchmarkId::new("catalog", count), &xml, |b, xml| {
            b.iter(|| parse_xml(black_box(xml.as_bytes())).unwrap());
        });
    }

    let nested = make_nested(500);
    group.bench_function("nested_500", |b| {
        b.iter(|| parse_xml(black_box(nested.as_bytes())).unwrap());
    });
    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let doc = parse_xml(make_catalog(1000).as_bytes()).unwrap();
    let serializer = DomSerializer::new();
    c.bench_function("serialize/catalog_1000", |b| {
        b.iter(|| serializer.serialize(black_box(&doc), doc.document_node()).unwrap());
    });
}

fn bench_elements_by_tag_name(c: &mut Criterion) {
    let doc = parse_xml(make_catalog(1000).as_bytes()).unwrap();
    c.bench_function("elements_by_tag_name/title", |b| {
        b.iter(|| doc.elements_by_tag_name(black_box("title")).len());
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_serialize,
    bench_elements_by_tag_name
);
criterion_main!(benches);
