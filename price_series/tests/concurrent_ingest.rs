use std::{sync::Arc, thread};

use price_series::{
    DateKey, DateRange, IngestMode, MemorySeriesStore, RawDate, RawRow, Reconciler, SeriesStore,
};

fn rows(days: std::ops::RangeInclusive<u32>) -> Vec<RawRow> {
    days.map(|d| RawRow {
        date: RawDate::Number(i64::from(20210100 + d)),
        close: f64::from(d),
        high: f64::from(d) + 0.5,
        low: f64::from(d) - 0.5,
    })
    .collect()
}

#[test]
fn parallel_ingests_of_one_symbol_never_duplicate() {
    let store = Arc::new(MemorySeriesStore::new());
    let reconciler = Arc::new(Reconciler::new(Arc::clone(&store)));
    let range = DateRange::new(DateKey::new(20210101).unwrap(), DateKey::new(20210120).unwrap()).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let reconciler = Arc::clone(&reconciler);
            let batch = rows(1 + i..=12 + i);
            thread::spawn(move || {
                reconciler
                    .ingest("BTC", &batch, IngestMode::Range(range), 1.0)
                    .unwrap()
                    .inserted
                    .len()
            })
        })
        .collect();
    let inserted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let series = store.read_series("BTC", None).unwrap();
    assert_eq!(series.len(), 19);
    assert_eq!(inserted, 19);
}

#[test]
fn symbols_are_reconciled_independently() {
    let reconciler = Reconciler::new(MemorySeriesStore::new());
    let batch = rows(1..=3);
    for symbol in ["BTC", "ETH"] {
        let outcome = reconciler.ingest(symbol, &batch, IngestMode::LatestDay, 2.0).unwrap();
        assert_eq!(outcome.inserted.len(), 1);
        assert_eq!(outcome.inserted[0].close, 1.5);
    }
    assert_eq!(reconciler.store().symbols(), vec!["BTC".to_string(), "ETH".to_string()]);
}
