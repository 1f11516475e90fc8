mod common;

use std::sync::Arc;

use alerts::{AlertThrottle, MemoryThrottleStore, Notifier, ThrottlePolicy};
use common::{RecordingSink, at, book, quotes, recipients};
use serde_json::json;

fn throttled(sink: Arc<RecordingSink>) -> Notifier {
    let throttle = AlertThrottle::new(Arc::new(MemoryThrottleStore::new()), ThrottlePolicy::default());
    Notifier::new(sink, Some(throttle))
}

#[tokio::test]
async fn first_cycle_reports_sent_missing_and_failed() {
    let sink = Arc::new(RecordingSink::blocking("200"));
    let notifier = throttled(sink.clone());

    let report = notifier.run_cycle(&book(), &recipients(), &quotes(29000.0), at(0)).await;

    let summary = json!({
        "sent": report.sent.iter().map(|s| s.text.clone()).collect::<Vec<_>>(),
        "suppressed": report.suppressed,
        "missing": report.missing_quotes,
        "failures": report
            .failures
            .iter()
            .map(|f| format!("{}/{}: {}", f.user, f.symbol, f.error))
            .collect::<Vec<_>>(),
    });
    insta::assert_json_snapshot!(summary, @r#"
    {
      "failures": [
        "bob/BTC: delivery to 200 rejected: blocked"
      ],
      "missing": [
        "alice/ETH"
      ],
      "sent": [
        "BTC is lower than 30000: current value 29000"
      ],
      "suppressed": 0
    }
    "#);
    assert_eq!(sink.texts().len(), 1);
}

#[tokio::test]
async fn small_moves_are_suppressed_until_the_price_moves_enough() {
    let sink = Arc::new(RecordingSink::default());
    let notifier = throttled(sink.clone());
    let (book, recipients) = (book(), recipients());

    notifier.run_cycle(&book, &recipients, &quotes(29000.0), at(0)).await;
    // 1 % lower: below the 2.5 % threshold
    let second = notifier.run_cycle(&book, &recipients, &quotes(28710.0), at(1)).await;
    assert!(second.sent.is_empty());
    assert_eq!(second.suppressed, 2);

    let third = notifier.run_cycle(&book, &recipients, &quotes(28000.0), at(2)).await;
    assert_eq!(third.sent.len(), 2);
    assert_eq!(sink.texts().len(), 4);
}

#[tokio::test]
async fn without_a_throttle_every_cycle_notifies() {
    let sink = Arc::new(RecordingSink::default());
    let notifier = Notifier::new(sink.clone(), None);
    let (book, recipients) = (book(), recipients());

    for minute in 0..3 {
        let report = notifier.run_cycle(&book, &recipients, &quotes(29000.0), at(minute)).await;
        assert_eq!(report.sent.len(), 2);
    }
    assert_eq!(sink.texts().len(), 6);
}

#[tokio::test]
async fn high_breach_message() {
    let sink = Arc::new(RecordingSink::default());
    let notifier = Notifier::new(sink.clone(), None);

    let report = notifier.run_cycle(&book(), &recipients(), &quotes(61000.0), at(0)).await;
    assert_eq!(report.sent.len(), 1);
    assert_eq!(report.sent[0].text, "BTC is higher than 60000: current value 61000");
    assert_eq!(report.sent[0].user, "alice");
}
