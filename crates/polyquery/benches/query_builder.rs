use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use polyquery::{Condition, DialectKind, Order, Query, QueryBuilder, Value};

/// SELECT col0, col1, ... FROM t WHERE col0=:col01 AND col1=:col12 ...
fn build_select_query(n: usize) -> Query {
    let columns: Vec<String> = (0..n).map(|i| format!("col{i}")).collect();
    let pairs: Vec<(String, Value)> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.clone(), Value::Int(i as i64)))
        .collect();
    Query::new()
        .select(&columns.join(", "))
        .from("t")
        .where_(Condition::hash(pairs))
        .order_by("col0", Order::Desc)
        .limit(50)
}

fn bench_build_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/build_select");

    for n in [1, 5, 10, 50, 100] {
        let query = build_select_query(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &query, |b, query| {
            let qb = QueryBuilder::for_kind(DialectKind::Pgsql);
            b.iter(|| black_box(qb.build(query).unwrap()));
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            let qb = QueryBuilder::for_kind(DialectKind::Mysql);
            b.iter(|| {
                let query = Query::new()
                    .from("t")
                    .where_(Condition::in_list("id", values.clone()));
                black_box(qb.build(&query).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_dialects(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/dialect");
    let query = Query::new()
        .select("id, name")
        .from("user u")
        .left_join("profile p", "p.user_id = u.id")
        .where_(
            Condition::hash([("status", 1)])
                .and_with(Condition::lookup_key("name__icontains", "al").unwrap())
                .and_with(Condition::between("age", 18, 65)),
        )
        .order_by("id", Order::Desc)
        .limit(10)
        .offset(20);

    for kind in DialectKind::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(kind), &query, |b, query| {
            let qb = QueryBuilder::for_kind(kind);
            b.iter(|| black_box(qb.build(query).unwrap()));
        });
    }

    group.finish();
}

fn bench_to_positional(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/to_positional");

    for n in [1, 10, 100] {
        let built = QueryBuilder::for_kind(DialectKind::Pgsql)
            .build(&build_select_query(n))
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &built, |b, built| {
            b.iter(|| black_box(built.to_positional(polyquery::PlaceholderStyle::Dollar)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_build_select,
    bench_in_list,
    bench_dialects,
    bench_to_positional
);
criterion_main!(benches);
