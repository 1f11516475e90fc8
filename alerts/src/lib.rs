//! Price limits and the notifications they trigger.
//!
//! Users register low/high thresholds per symbol in a [`LimitsBook`]. Each
//! polling cycle the [`Notifier`] checks current quotes against those
//! thresholds, asks the [`AlertThrottle`] whether a breach is worth
//! repeating, and hands the message to a [`NotificationSink`].

pub mod book;
pub mod errors;
pub mod limits;
pub mod notify;
pub mod store;
pub mod throttle;
pub mod tree;

pub use book::{AddOutcome, LimitsBook, RemoveTarget};
pub use errors::{LimitsError, ThrottleError, TreeError};
pub use limits::{Breach, CoinLimits, LimitKind, LimitSpec, detect_breach};
pub use notify::{CycleReport, DeliveryError, NotificationSink, Notifier};
pub use store::{MemoryThrottleStore, ThrottleStore};
pub use throttle::{AlertThrottle, ThrottleKey, ThrottlePolicy, ThrottleState, evaluate};
pub use tree::ConfigNode;
