//! Benchmarks for the parse, check and rewrite pipeline.
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use std::fmt::Write as _;
use std::hint::black_box;

use bumpalo::Bump;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use goop::{CheckerConfig, PrintConfig, Source, Unit};

#[cfg(feature = "profile-with-puffin")]
use std::collections::HashMap;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

#[cfg(feature = "profile-with-puffin")]
fn collect_scopes(
    stream: &puffin::Stream,
    scope: &puffin::Scope,
    scope_collection: &puffin::ScopeCollection,
    timings: &mut HashMap<String, i64>,
) {
    use puffin::Reader;

    if let Some(details) = scope_collection.fetch_by_id(&scope.id) {
        *timings.entry(details.name().to_string()).or_insert(0) += scope.record.duration_ns;
    }
    if scope.child_begin_position < scope.child_end_position
        && let Ok(reader) = Reader::with_offset(stream, scope.child_begin_position)
        && let Ok(children) = reader.read_top_scopes()
    {
        for child in children {
            collect_scopes(stream, &child, scope_collection, timings);
        }
    }
}

#[cfg(feature = "profile-with-puffin")]
fn print_profiling_stats() {
    use puffin::Reader;

    let Some(frame_view) = FRAME_VIEW.get() else {
        println!("Profiler not initialized");
        return;
    };
    let view = frame_view.lock();
    let scope_collection = view.scope_collection();

    let mut timings: HashMap<String, i64> = HashMap::new();
    let mut frame_count = 0i64;
    for frame in view.recent_frames() {
        frame_count += 1;
        let Ok(unpacked) = frame.unpacked() else {
            continue;
        };
        for (_thread, stream_info) in unpacked.thread_streams.iter() {
            if let Ok(scopes) = Reader::from_start(&stream_info.stream).read_top_scopes() {
                for scope in scopes {
                    collect_scopes(&stream_info.stream, &scope, scope_collection, &mut timings);
                }
            }
        }
    }

    println!("\n=== Profiling Summary ({frame_count} frames) ===");
    let mut entries: Vec<_> = timings.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    let total_ns: i64 = entries.iter().map(|(_, ns)| *ns).sum();
    for (name, ns) in &entries {
        let avg = ns / frame_count.max(1);
        let pct = if total_ns > 0 {
            *ns as f64 / total_ns as f64 * 100.0
        } else {
            0.0
        };
        println!(
            "  {:30} {:>10.2?} avg ({:>5.1}%)",
            name,
            std::time::Duration::from_nanos(avg as u64),
            pct
        );
    }
    println!("=====================================\n");
}

#[cfg(not(feature = "profile-with-puffin"))]
fn print_profiling_stats() {}

const VEC4: &str = include_str!("../test_scripts/vec4.go");

/// A package with the vec4 operators and `count` functions using them.
fn generated_package(count: usize) -> String {
    let mut source = String::from(
        "package main\n\ntype vec4 [4]float32\n\n\
         func (v vec4) Op_Multiply(o vec4) vec4 { return vec4{v[0] * o[0], v[1] * o[1], v[2] * o[2], v[3] * o[3]} }\n\
         func (v vec4) Op_PreMultiplyScalar(o float32) vec4 { return vec4{v[0] * o, v[1] * o, v[2] * o, v[3] * o} }\n\
         func (v vec4) Op_Add(o vec4) vec4 { return vec4{v[0] + o[0], v[1] + o[1], v[2] + o[2], v[3] + o[3]} }\n\
         func (v vec4) Op_SubtractScalar(o float32) vec4 { return vec4{v[0] - o, v[1] - o, v[2] - o, v[3] - o} }\n\n",
    );
    for i in 0..count {
        let _ = write!(
            source,
            "func step{i}(v1, v2 vec4, k float32) vec4 {{\n\
             \tret := 2*v1*v2 + v1 - 4\n\
             \tif k > 1 {{\n\
             \t\tret = ret + v2*v1 - k\n\
             \t}}\n\
             \treturn ret\n\
             }}\n\n"
        );
    }
    source
}

fn transform(source: &str) -> usize {
    let arena = Bump::new();
    let mut unit = Unit::new(&arena);
    unit.parse_sources(&[Source::new("bench.go", source)]).unwrap();
    let outputs = unit
        .transform(&CheckerConfig::default(), &PrintConfig::default())
        .unwrap();
    outputs[0].text.len()
}

fn phase_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let source = generated_package(200);
    let mut group = c.benchmark_group("pipeline/phases");
    group.throughput(Throughput::Bytes(source.len() as u64));

    group.bench_function("parse", |b| {
        b.iter(|| {
            let arena = Bump::new();
            let mut unit = Unit::new(&arena);
            unit.parse_sources(&[Source::new("bench.go", black_box(source.as_str()))])
                .unwrap();
            black_box(unit.files().len())
        });
    });

    group.bench_function("check", |b| {
        let arena = Bump::new();
        let mut unit = Unit::new(&arena);
        unit.parse_sources(&[Source::new("bench.go", source.as_str())]).unwrap();
        b.iter(|| {
            let result = unit.check(black_box(&CheckerConfig::default()));
            black_box(result.package.overloads.len())
        });
    });

    group.bench_function("transform", |b| {
        b.iter(|| {
            let len = transform(black_box(&source));
            end_profiling_frame();
            black_box(len)
        });
    });

    group.finish();
    print_profiling_stats();
}

fn size_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("pipeline/sizes");

    group.throughput(Throughput::Bytes(VEC4.len() as u64));
    group.bench_function("vec4_example", |b| {
        b.iter(|| black_box(transform(black_box(VEC4))));
    });

    for count in [10, 100, 1000] {
        let source = generated_package(count);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(format!("functions_{count}"), |b| {
            b.iter(|| {
                let len = transform(black_box(&source));
                end_profiling_frame();
                black_box(len)
            });
        });
    }

    group.finish();
    print_profiling_stats();
}

criterion_group!(benches, phase_benchmarks, size_benchmarks);
criterion_main!(benches);
