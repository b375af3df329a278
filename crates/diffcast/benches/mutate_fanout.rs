use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use diffcast::ArraySubject;

fn mutate_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutate_fanout");
    for subscribers in [0usize, 1, 8, 64] {
        group.bench_function(format!("{subscribers}_subscribers"), |b| {
            let subject = ArraySubject::new(vec![0i64; 16]);
            let subs: Vec<_> = (0..subscribers)
                .map(|_| {
                    subject.subscribe(|u| {
                        black_box(&u.value);
                    })
                })
                .collect();
            b.iter(|| {
                subject.replace_at(0, black_box(1)).unwrap();
            });
            drop(subs);
        });
    }
    group.finish();
}

criterion_group!(benches, mutate_fanout);
criterion_main!(benches);
