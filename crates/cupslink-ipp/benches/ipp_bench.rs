// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for IPP request encoding and response decoding in the
// cupslink-ipp crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use cupslink_core::types::{
    IPP_VERSION_MAJOR, IPP_VERSION_MINOR, TAG_BEGIN_GROUP, TAG_END_OF_ATTRIBUTES,
    VALUE_TAG_ENUM, VALUE_TAG_INTEGER, VALUE_TAG_NAME, VALUE_TAG_TEXT_WITH_LANGUAGE, VALUE_TAG_URI,
};
use cupslink_ipp::{RequestAttributes, build_request, parse_response};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Write a single IPP attribute into a byte buffer.
fn write_attr(buf: &mut Vec<u8>, value_tag: u8, name: &str, value: &[u8]) {
    buf.push(value_tag);
    buf.extend_from_slice(&(name.len() as u16).to_be_bytes());
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(&(value.len() as u16).to_be_bytes());
    buf.extend_from_slice(value);
}

/// A get-printers style answer with `printers` groups of typical attributes.
fn build_printer_list(printers: usize) -> Vec<u8> {
    let mut buf = vec![IPP_VERSION_MAJOR, IPP_VERSION_MINOR, 0x00, 0x00];
    buf.extend_from_slice(&42u32.to_be_bytes());

    let mut info = Vec::new();
    info.extend_from_slice(&2u16.to_be_bytes());
    info.extend_from_slice(b"en");
    info.extend_from_slice(&10u16.to_be_bytes());
    info.extend_from_slice(b"Front desk");

    for i in 0..printers {
        let group = format!("printer-{i}");
        buf.push(TAG_BEGIN_GROUP);
        buf.extend_from_slice(&(group.len() as u16).to_be_bytes());
        buf.extend_from_slice(group.as_bytes());
        write_attr(&mut buf, VALUE_TAG_NAME, "printer-name", group.as_bytes());
        write_attr(
            &mut buf,
            VALUE_TAG_URI,
            "printer-uri-supported",
            format!("ipp://localhost:631/printers/{group}").as_bytes(),
        );
        write_attr(&mut buf, VALUE_TAG_ENUM, "printer-state", &[0x00, 0x03]);
        write_attr(&mut buf, VALUE_TAG_INTEGER, "queued-job-count", &(i as i32).to_be_bytes());
        write_attr(&mut buf, VALUE_TAG_TEXT_WITH_LANGUAGE, "printer-info", &info);
    }
    buf.push(TAG_END_OF_ATTRIBUTES);
    buf
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_build_print_job(c: &mut Criterion) {
    let mut attrs = RequestAttributes::new();
    attrs
        .insert("attributes-charset", "utf-8")
        .insert("attributes-natural-language", "en")
        .insert("printer-uri", "ipp://localhost:631/printers/office")
        .insert("requesting-user-name", "bench")
        .insert("job-name", "benchmark job")
        .insert_many("finishings", ["3", "4"]);
    let document = vec![0x25u8; 64 * 1024];

    c.bench_function("build_request (print-job, 64 KiB)", |b| {
        b.iter(|| {
            let bytes = build_request("print-job", black_box(&attrs), Some(black_box(document.as_slice())));
            assert!(bytes.is_ok());
        });
    });
}

fn bench_parse_printer_list(c: &mut Criterion) {
    let small = build_printer_list(1);
    let large = build_printer_list(200);

    c.bench_function("parse_response (1 printer)", |b| {
        b.iter(|| {
            let result = parse_response(black_box(&small));
            assert!(result.is_ok());
        });
    });

    c.bench_function("parse_response (200 printers)", |b| {
        b.iter(|| {
            let result = parse_response(black_box(&large));
            assert!(result.is_ok());
        });
    });
}

criterion_group!(benches, bench_build_print_job, bench_parse_printer_list);
criterion_main!(benches);
