use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wavefront_window::{
    query::{QueryResponse, Timeseries},
    runner::flatten,
    testing::{FakeQueryApi, MemoryLogger},
    DataPoint, Properties, Runner,
};

// 2024-01-01T00:00:00Z
const START: i64 = 1704067200;

fn response(num_series: usize, hours: i64) -> QueryResponse {
    let timeseries = (0..num_series)
        .map(|i| Timeseries {
            tags: Some(HashMap::from([
                ("customer".to_string(), format!("customer-{}", i % 10)),
                ("cluster".to_string(), format!("cluster-{}", i)),
            ])),
            data: (0..hours)
                .map(|h| DataPoint {
                    timestamp: START + h * 3600,
                    value: h as f64,
                })
                .collect(),
        })
        .collect();
    QueryResponse {
        timeseries: Some(timeseries),
        ..Default::default()
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("flatten", |b| {
        let response = response(100, 24);
        b.iter(|| black_box(flatten("cpu", &response).unwrap()));
    });

    c.bench_function("run_all", |b| {
        let num_metrics = 20;
        let mut api = FakeQueryApi::new();
        let mut queries = vec![];
        for i in 0..num_metrics {
            let query = format!("ts(metric.{})", i);
            api = api.respond(&query, response(10, 24));
            queries.push((format!("metric-{}", i), query));
        }

        b.iter(|| {
            let mut properties = Properties::from_iter([("start-time", "2024-01-01T00:00:00Z")]);
            let rows: usize = Runner::new(&api, MemoryLogger::new())
                .with_clock(|| START + 24 * 3600)
                .run_all(&mut properties, queries.iter().cloned())
                .map(|rows| rows.unwrap().len())
                .sum();
            black_box(rows)
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
