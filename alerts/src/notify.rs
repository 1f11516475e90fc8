//! One notification cycle: quotes + limits -> throttled messages -> sink.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use snafu::{Backtrace, Snafu};
use tracing::{debug, error, info, warn};

use crate::{
    book::LimitsBook,
    limits::{Breach, detect_breach},
    throttle::{AlertThrottle, ThrottleKey},
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DeliveryError {
    /// The sink accepted the request but refused this message.
    #[snafu(display("delivery to {recipient} rejected: {message}"))]
    Rejected {
        recipient: String,
        message: String,
        backtrace: Backtrace,
    },

    /// The sink could not be reached at all.
    #[snafu(display("notification sink unavailable: {message}"))]
    Unavailable { message: String, backtrace: Backtrace },
}

/// Outbound channel for alert texts. Implementations must not retry.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentAlert {
    pub user: String,
    pub symbol: String,
    pub breach: Breach,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleFailure {
    pub user: String,
    pub symbol: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    pub sent: Vec<SentAlert>,
    pub suppressed: usize,
    /// `user/symbol` pairs skipped for lack of a current quote.
    pub missing_quotes: Vec<String>,
    pub failures: Vec<CycleFailure>,
}

pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    throttle: Option<AlertThrottle>,
}

impl Notifier {
    /// Without a throttle every breach is sent on every cycle.
    pub fn new(sink: Arc<dyn NotificationSink>, throttle: Option<AlertThrottle>) -> Self {
        Self { sink, throttle }
    }

    /// Checks every limit of every user that has a recipient id.
    ///
    /// `recipients` maps user names to sink recipient ids. Failures are
    /// recorded per user and symbol and never stop the cycle.
    pub async fn run_cycle(
        &self,
        book: &LimitsBook,
        recipients: &IndexMap<String, String>,
        quotes: &IndexMap<String, f64>,
        now: DateTime<Utc>,
    ) -> CycleReport {
        let mut report = CycleReport::default();

        for (user, recipient) in recipients {
            let symbols = book.symbols_for(user);
            if symbols.is_empty() {
                debug!(user, "no limits configured");
                continue;
            }
            for symbol in symbols {
                let Some(price) = quotes.get(&symbol).copied() else {
                    warn!(user, symbol, "no current quote, skipping");
                    report.missing_quotes.push(format!("{user}/{symbol}"));
                    continue;
                };
                let fail = |error: String| CycleFailure {
                    user: user.clone(),
                    symbol: symbol.clone(),
                    error,
                };

                let limits = match book.coin_limits(user, &symbol) {
                    Ok(limits) => limits,
                    Err(e) => {
                        report.failures.push(fail(e.to_string()));
                        continue;
                    }
                };
                let Some(breach) = detect_breach(&limits, price) else {
                    continue;
                };

                if let Some(throttle) = &self.throttle {
                    let key = ThrottleKey::new(user.as_str(), symbol.as_str(), breach.kind);
                    match throttle.should_notify(&key, breach.threshold, price, now) {
                        Ok(true) => {}
                        Ok(false) => {
                            debug!(%key, price, "breach suppressed");
                            report.suppressed += 1;
                            continue;
                        }
                        Err(e) => {
                            error!(%key, error = %e, "throttle unavailable, not sending");
                            report.failures.push(fail(e.to_string()));
                            continue;
                        }
                    }
                }

                let text = breach.message(&symbol);
                match self.sink.send(recipient, &text).await {
                    Ok(()) => {
                        info!(user, symbol, kind = %breach.kind, threshold = breach.threshold, price, "alert sent");
                        report.sent.push(SentAlert {
                            user: user.clone(),
                            symbol: symbol.clone(),
                            breach,
                            text,
                        });
                    }
                    Err(e) => {
                        error!(user, symbol, error = %e, "alert delivery failed");
                        report.failures.push(fail(e.to_string()));
                    }
                }
            }
        }
        report
    }
}
