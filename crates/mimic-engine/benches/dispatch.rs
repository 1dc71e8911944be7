use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mimic_engine::{ClassBuilder, TypeRegistry};
use mimic_sdk::{arg, around, Callable, ParameterDescriptor, Value};
use std::sync::Arc;

fn multiply() -> Callable {
    Callable::new(
        vec![ParameterDescriptor::untyped("a"), ParameterDescriptor::untyped("b")],
        |args| Ok(Value::Int(arg::<i64>(args, 0)? * arg::<i64>(args, 1)?)),
    )
}

fn bench_static_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("static_dispatch");
    let args = [Value::Int(6), Value::Int(7)];

    for decorators in [0usize, 1, 4, 16] {
        let mut builder = ClassBuilder::with_registry(Arc::new(TypeRegistry::new()));
        builder.add_static_method("multiply", multiply());
        for _ in 0..decorators {
            builder.add_decorator(around(|jp| jp.execute()));
        }
        let class = builder.create().unwrap();

        group.bench_with_input(
            BenchmarkId::new("decorators", decorators),
            &class,
            |b, class| {
                b.iter(|| class.call_static("multiply", black_box(&args)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_instance_dispatch(c: &mut Criterion) {
    let mut builder = ClassBuilder::with_registry(Arc::new(TypeRegistry::new()));
    builder
        .add_method("multiply", multiply())
        .add_decorator(around(|jp| jp.execute()));
    let instance = builder.create().unwrap().instantiate();
    let args = [Value::Int(6), Value::Int(7)];

    c.bench_function("instance_dispatch", |b| {
        b.iter(|| instance.call("multiply", black_box(&args)).unwrap());
    });
}

fn bench_create(c: &mut Criterion) {
    let registry = Arc::new(TypeRegistry::new());
    let mut builder = ClassBuilder::with_registry(registry);
    builder
        .add_method("add", multiply())
        .add_static_method("multiply", multiply())
        .add_decorator(around(|jp| jp.execute()));

    c.bench_function("create_class", |b| {
        b.iter(|| builder.create().unwrap());
    });
}

criterion_group!(
    benches,
    bench_static_dispatch,
    bench_instance_dispatch,
    bench_create
);
criterion_main!(benches);
