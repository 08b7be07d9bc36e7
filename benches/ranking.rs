use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use magicrank::{RawRecord, SortCriterion, aggregate, normalize, sort_records};
use serde_json::json;

const SAMPLE_SIZE: usize = 500;

fn raw_payload() -> Vec<RawRecord> {
    (0..SAMPLE_SIZE)
        .map(|idx| {
            let value = json!({
                "papel": format!("TCKR{}", SAMPLE_SIZE - idx),
                "setor": if idx % 3 == 0 { "Financeiro" } else { "Energia" },
                "preco": format!("{},{:02}", 10 + idx % 90, idx % 100),
                "magic_formula": (idx * 7919) % SAMPLE_SIZE + 1,
                "roic": (idx % 47) as f64 * 1.5,
                "ev_ebit": if idx % 50 == 0 { json!("n/d") } else { json!((idx % 31) as f64 + 0.25) },
                "score": idx % 120,
                "rank_roic": idx % 80 + 1,
                "rank_ev_ebit": idx % 60 + 1,
            });
            match value {
                serde_json::Value::Object(map) => map,
                _ => RawRecord::new(),
            }
        })
        .collect()
}

fn bench_ranking(c: &mut Criterion) {
    let raw = raw_payload();
    let records = normalize(&raw, "14/10/2026");

    c.bench_function("normalize", |b| {
        b.iter(|| normalize(black_box(&raw), black_box("14/10/2026")));
    });

    let mut group = c.benchmark_group("sort_records");
    for criterion in SortCriterion::ALL {
        group.bench_function(criterion.as_str(), |b| {
            b.iter_batched(
                || records.clone(),
                |records| sort_records(black_box(&records), criterion),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();

    c.bench_function("aggregate", |b| {
        b.iter(|| aggregate(black_box(&records)).total);
    });
}

criterion_group!(benches, bench_ranking);
criterion_main!(benches);
