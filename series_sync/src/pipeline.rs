//! The polling runtime: history reconciliation and price checks.

use std::{sync::Arc, time::Duration};

use alerts::{AlertThrottle, CycleReport, MemoryThrottleStore, NotificationSink, Notifier, ThrottleStore};
use anyhow::Context;
use chrono::{DateTime, Utc};
use indicators::IndicatorBundle;
use price_series::{
    DateKey, DateRange, IngestMode, ReconcileOutcome, Reconciler, SeriesStore,
    providers::{QuoteSource, RowSource},
};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::{
    config::{AppConfig, Persistence},
    db::{connection::connect_sqlite, migrate},
    limits_file,
    sink::TracingSink,
    snapshot::SnapshotFile,
    store::SqliteSeriesStore,
    symbols,
    throttle_kv::SqliteThrottleStore,
};

/// Outcome of one history cycle. One symbol failing never stops the others.
#[derive(Debug, Default)]
pub struct HistoryReport {
    pub outcomes: Vec<ReconcileOutcome>,
    /// `(symbol, error)` pairs.
    pub failures: Vec<(String, String)>,
}

impl HistoryReport {
    pub fn inserted(&self) -> usize {
        self.outcomes.iter().map(|o| o.inserted.len()).sum()
    }
}

pub struct Pipeline {
    config: AppConfig,
    reconciler: Reconciler<Arc<dyn SeriesStore>>,
    rows: Arc<dyn RowSource>,
    quotes: Arc<dyn QuoteSource>,
    notifier: Notifier,
}

impl Pipeline {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn SeriesStore>,
        rows: Arc<dyn RowSource>,
        quotes: Arc<dyn QuoteSource>,
        notifier: Notifier,
    ) -> Self {
        symbols::refresh_symbols(&config.symbols);
        Self {
            config,
            reconciler: Reconciler::new(store),
            rows,
            quotes,
            notifier,
        }
    }

    /// Migrates the database and wires the SQLite stores, the snapshot file and the log sink.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        migrate::run_sqlite(&config.database_url).context("apply migrations")?;
        let store: Arc<dyn SeriesStore> = Arc::new(SqliteSeriesStore::open(&config.database_url)?);
        let notifier = build_notifier(&config, Arc::new(TracingSink))?;
        let snapshot = Arc::new(SnapshotFile::new(&config.snapshot_file));
        Ok(Self::new(config, store, snapshot.clone(), snapshot, notifier))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SeriesStore> {
        self.reconciler.store()
    }

    fn ingest_mode(&self, today: DateKey) -> IngestMode {
        match self.config.polling.history_days {
            0 => IngestMode::LatestDay,
            days => IngestMode::Range(DateRange::looking_back(today, days)),
        }
    }

    /// Reconciles every configured symbol (or only `only`) against the row source.
    ///
    /// Fails as a whole only when the conversion divisor is unavailable.
    pub async fn history_cycle(
        &self,
        today: DateKey,
        mode: Option<IngestMode>,
        only: Option<&str>,
    ) -> anyhow::Result<HistoryReport> {
        let divisor = self
            .rows
            .conversion_divisor()
            .await
            .context("conversion divisor unavailable")?;
        let mode = mode.unwrap_or_else(|| self.ingest_mode(today));
        let mut report = HistoryReport::default();

        let targets: Vec<String> = match only {
            Some(symbol) => vec![symbol.trim().to_uppercase()],
            None => self.config.symbols.keys().cloned().collect(),
        };
        for symbol in targets {
            let rows = match self.rows.fetch_rows(&symbol, None).await {
                Ok(rows) => rows,
                Err(e) => {
                    warn!(symbol, error = %e, "rows unavailable");
                    report.failures.push((symbol, e.to_string()));
                    continue;
                }
            };
            match self.reconciler.ingest(&symbol, &rows, mode, divisor) {
                Ok(outcome) => {
                    info!(symbol, inserted = outcome.inserted.len(), "history reconciled");
                    report.outcomes.push(outcome);
                }
                Err(e) => {
                    error!(symbol, error = %e, "reconciliation failed");
                    report.failures.push((symbol, e.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// Checks current quotes against the limits file and sends what the throttle lets through.
    pub async fn price_cycle(&self, now: DateTime<Utc>) -> anyhow::Result<CycleReport> {
        let book = limits_file::load_limits(&self.config.limits_file)?;
        let quotes = self.quotes.current_prices().await.context("quotes unavailable")?;
        let report = self
            .notifier
            .run_cycle(&book, &self.config.recipients(), &quotes, now)
            .await;
        info!(
            sent = report.sent.len(),
            suppressed = report.suppressed,
            missing = report.missing_quotes.len(),
            failed = report.failures.len(),
            "price cycle done"
        );
        Ok(report)
    }

    /// Indicators for the stored series of `symbol` as of `as_of`.
    pub fn indicators(&self, symbol: &str, as_of: DateKey) -> anyhow::Result<IndicatorBundle> {
        let symbol = symbol.trim().to_uppercase();
        let series = self
            .store()
            .read_series(&symbol, None)
            .with_context(|| format!("read series {symbol}"))?;
        IndicatorBundle::compute(&series, as_of, &self.config.indicators)
            .with_context(|| format!("indicators for {symbol} as of {as_of}"))
    }

    /// Runs both cycles on their intervals until Ctrl-C. A failed cycle is logged and skipped.
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut history = tokio::time::interval(Duration::from_secs(self.config.polling.history_interval_secs));
        let mut prices = tokio::time::interval(Duration::from_secs(self.config.polling.price_interval_secs));
        history.set_missed_tick_behavior(MissedTickBehavior::Skip);
        prices.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        info!(symbols = self.config.symbols.len(), "polling started");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                _ = history.tick() => {
                    let today = DateKey::today_in(self.config.tz());
                    match self.history_cycle(today, None, None).await {
                        Ok(report) => info!(inserted = report.inserted(), failed = report.failures.len(), "history cycle done"),
                        Err(e) => warn!(error = %format!("{e:#}"), "history cycle skipped"),
                    }
                }
                _ = prices.tick() => {
                    if let Err(e) = self.price_cycle(Utc::now()).await {
                        warn!(error = %format!("{e:#}"), "price cycle skipped");
                    }
                }
            }
        }
        Ok(())
    }
}

/// The ingest mode asked for on the command line; `None` leaves it to `polling.history_days`.
///
/// `from`/`to` may be given alone: a missing `to` is `today`, a missing
/// `from` is the earliest representable day.
pub fn requested_mode(
    today: DateKey,
    latest: bool,
    days: Option<u32>,
    from: Option<DateKey>,
    to: Option<DateKey>,
) -> anyhow::Result<Option<IngestMode>> {
    let bounded = from.is_some() || to.is_some();
    if [latest, days.is_some(), bounded].iter().filter(|set| **set).count() > 1 {
        anyhow::bail!("--latest, --days and --from/--to are mutually exclusive");
    }
    if latest {
        return Ok(Some(IngestMode::LatestDay));
    }
    if let Some(days) = days {
        return Ok(Some(IngestMode::Range(DateRange::looking_back(today, days))));
    }
    if bounded {
        let range = DateRange::new(from.unwrap_or_else(DateKey::earliest), to.unwrap_or(today))
            .context("invalid --from/--to range")?;
        return Ok(Some(IngestMode::Range(range)));
    }
    Ok(None)
}

/// The throttle store named by `throttle.persistence`.
pub fn build_throttle_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ThrottleStore>> {
    Ok(match config.throttle.persistence {
        Persistence::Memory => Arc::new(MemoryThrottleStore::new()),
        Persistence::Durable => Arc::new(SqliteThrottleStore::from_connection(connect_sqlite(
            &config.database_url,
        )?)),
    })
}

pub fn build_notifier(config: &AppConfig, sink: Arc<dyn NotificationSink>) -> anyhow::Result<Notifier> {
    let throttle = if config.throttle.enabled {
        Some(AlertThrottle::new(build_throttle_store(config)?, config.throttle_policy()))
    } else {
        None
    };
    Ok(Notifier::new(sink, throttle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(raw: u32) -> DateKey {
        DateKey::new(raw).unwrap()
    }

    fn range(from: u32, to: u32) -> Option<IngestMode> {
        Some(IngestMode::Range(DateRange::new(day(from), day(to)).unwrap()))
    }

    #[test]
    fn explicit_interval() {
        let mode = requested_mode(day(20210301), false, None, Some(day(20210101)), Some(day(20210131))).unwrap();
        assert_eq!(mode, range(20210101, 20210131));
    }

    #[test]
    fn one_bound_is_open_ended() {
        let today = day(20210301);
        assert_eq!(
            requested_mode(today, false, None, Some(day(20210215)), None).unwrap(),
            range(20210215, 20210301)
        );
        let Some(IngestMode::Range(r)) = requested_mode(today, false, None, None, Some(day(20210110))).unwrap() else {
            panic!("expected a range");
        };
        assert_eq!(r.from(), DateKey::earliest());
        assert_eq!(r.to(), day(20210110));
    }

    #[test]
    fn other_modes() {
        let today = day(20210301);
        assert_eq!(requested_mode(today, false, None, None, None).unwrap(), None);
        assert_eq!(requested_mode(today, true, None, None, None).unwrap(), Some(IngestMode::LatestDay));
        assert_eq!(requested_mode(today, false, Some(2), None, None).unwrap(), range(20210227, 20210301));
    }

    #[test]
    fn rejects_inverted_or_mixed_requests() {
        let today = day(20210301);
        let err = requested_mode(today, false, None, Some(day(20210201)), Some(day(20210101))).unwrap_err();
        assert!(format!("{err:#}").contains("invalid --from/--to range"));

        assert!(requested_mode(today, true, None, Some(day(20210101)), None).is_err());
        assert!(requested_mode(today, false, Some(3), None, Some(day(20210101))).is_err());
    }
}
