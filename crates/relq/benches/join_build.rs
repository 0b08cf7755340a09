use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use relq::{Column, Database, Join, Selectable, Selection, SqliteDriver};

/// A chain of `n` tables `t0 .. t{n-1}`, each with `width` columns plus `id` and `prev_id`.
fn chain_db(n: usize, width: usize) -> Database {
    let driver = SqliteDriver::open_in_memory().unwrap();
    let mut ddl = String::new();
    for t in 0..n {
        ddl.push_str(&format!("CREATE TABLE t{t} (id INTEGER PRIMARY KEY, prev_id INTEGER"));
        for c in 0..width {
            ddl.push_str(&format!(", c{c} TEXT"));
        }
        ddl.push_str(");\n");
    }
    driver.execute_batch(&ddl).unwrap();
    Database::new(driver)
}

fn chain_selections(db: &Database, n: usize) -> Vec<Selection> {
    (1..n)
        .map(|t| {
            let this = db.get_table(&format!("t{t}")).unwrap();
            let prev = db.get_table(&format!("t{}", t - 1)).unwrap();
            this.column("prev_id")
                .unwrap()
                .equals(prev.column("id").unwrap())
        })
        .collect()
}

fn bench_create_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("join/create_and_shape");

    for n in [2, 4, 8, 16] {
        let db = chain_db(n, 8);
        let selections = chain_selections(&db, n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &selections, |b, sel| {
            b.iter(|| {
                let join = Join::new(sel.iter().cloned(), Vec::<Column>::new()).unwrap();
                black_box(join.record_shape().unwrap());
            });
        });
    }

    group.finish();
}

fn bench_select_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("join/select_sql");

    for n in [2, 4, 8, 16] {
        let db = chain_db(n, 8);
        let join = Join::new(chain_selections(&db, n), Vec::<Column>::new()).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &join, |b, join| {
            b.iter(|| black_box(join.select_sql(Some("t0.id > 10"), Some(100))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_create_join, bench_select_sql);
criterion_main!(benches);
