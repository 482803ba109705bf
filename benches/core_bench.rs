//! Benchmarks for cmdset core operations.
//!
//! Run with: cargo bench
//!
//! Results include 95% confidence intervals via Criterion.

use cmdset::core::codegen::{build_commands, BuildContext, CommandKind};
use cmdset::core::parser::parse_documents;
use cmdset::core::resolver::{render_str, RenderOptions};
use cmdset::core::staging::StagingDir;
use cmdset::core::types::VariableSet;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::Path;

fn params(count: usize) -> VariableSet {
    (0..count)
        .map(|i| {
            (
                format!("VAR_{i}"),
                serde_yaml_ng::Value::String(format!("value-{i}")),
            )
        })
        .collect()
}

fn template(lines: usize, vars: usize) -> String {
    let mut out = String::new();
    for i in 0..lines {
        if i % 10 == 0 {
            out.push_str("# comment ${VAR_0}\n");
        } else {
            out.push_str(&format!("key_{i}: ${{VAR_{}}}\n", i % vars));
        }
    }
    out
}

fn bench_render(c: &mut Criterion) {
    let vars = params(20);
    let opts = RenderOptions::lenient();

    let mut group = c.benchmark_group("render_str");
    for lines in [10, 100, 1000] {
        let text = template(lines, 20);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &text, |b, text| {
            b.iter(|| black_box(render_str(black_box(text), &vars, &opts).unwrap()));
        });
    }
    group.finish();
}

fn bench_render_single_appearance(c: &mut Criterion) {
    let vars = params(20);
    let opts = RenderOptions::lenient().single_appearance(["VAR_1"]);
    let text = template(1000, 20);

    c.bench_function("render_str_single_appearance", |b| {
        b.iter(|| black_box(render_str(black_box(&text), &vars, &opts).unwrap()));
    });
}

fn command_file(commands: usize) -> String {
    let mut out = String::new();
    for i in 0..commands {
        out.push_str(&format!(
            "kind: helm\ncommand: install\nchart: stable/app-{i}\nflags: [debug]\noptions:\n  name: app-{i}\n  namespace: apps\nset-values:\n  replicas: {i}\n---\n"
        ));
    }
    out
}

fn bench_build_helm(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_helm");
    for count in [1, 10, 100] {
        let yaml = command_file(count);
        let docs = parse_documents(&yaml, Path::new("bench.yaml")).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(count), &docs, |b, docs| {
            b.iter(|| {
                let mut docs = docs.clone();
                let built =
                    build_commands(CommandKind::Helm, &mut docs, 0, &BuildContext::default())
                        .unwrap();
                black_box(built);
            });
        });
    }
    group.finish();
}

fn bench_build_kubectl_file_argument(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let staging = StagingDir::new(dir.path());
    let ctx = BuildContext {
        staging: Some(&staging),
    };
    let yaml = "kind: kubectl\ncommand: apply\noptions: {f: obj}\n---\napiVersion: v1\nkind: ConfigMap\nmetadata: {name: bench}\ndata: {a: '1', b: '2'}\n";
    let docs = parse_documents(yaml, Path::new("bench.yaml")).unwrap();

    c.bench_function("build_kubectl_file_argument", |b| {
        b.iter(|| {
            let mut docs = docs.clone();
            black_box(build_commands(CommandKind::Kubectl, &mut docs, 0, &ctx).unwrap());
        });
    });
}

fn bench_parse_documents(c: &mut Criterion) {
    let yaml = command_file(50);
    c.bench_function("parse_documents_50", |b| {
        b.iter(|| black_box(parse_documents(black_box(&yaml), Path::new("bench.yaml")).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_render,
    bench_render_single_appearance,
    bench_build_helm,
    bench_build_kubectl_file_argument,
    bench_parse_documents,
);
criterion_main!(benches);
