use std::sync::Mutex;

use alerts::{DeliveryError, LimitsBook, NotificationSink, notify::RejectedSnafu};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;

/// Collects every delivered message; refuses delivery to `blocked`.
#[derive(Default)]
pub struct RecordingSink {
    pub delivered: Mutex<Vec<(String, String)>>,
    pub blocked: Option<String>,
}

impl RecordingSink {
    pub fn blocking(recipient: &str) -> Self {
        Self {
            blocked: Some(recipient.to_string()),
            ..Self::default()
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.delivered.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), DeliveryError> {
        if self.blocked.as_deref() == Some(recipient) {
            return RejectedSnafu {
                recipient,
                message: "blocked",
            }
            .fail();
        }
        self.delivered
            .lock()
            .unwrap()
            .push((recipient.to_string(), text.to_string()));
        Ok(())
    }
}

pub fn book() -> LimitsBook {
    LimitsBook::from_json(
        r#"{
            "alice": {"BTC": {"low": [30000], "high": [60000]}, "ETH": {"high": [2000]}},
            "bob": {"BTC": {"low": [31000]}},
            "carol": {"BTC": {"low": [99999]}}
        }"#,
    )
    .unwrap()
}

pub fn recipients() -> IndexMap<String, String> {
    IndexMap::from([
        ("alice".to_string(), "100".to_string()),
        ("bob".to_string(), "200".to_string()),
    ])
}

pub fn quotes(btc: f64) -> IndexMap<String, f64> {
    IndexMap::from([("BTC".to_string(), btc)])
}

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 5, 1, 12, minute, 0).unwrap()
}
