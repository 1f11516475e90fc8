//! Debouncing of repeated limit breaches.
//!
//! A breach is re-notified only when the price moved by more than
//! [`ThrottlePolicy::min_move`] since the last notification, or when a
//! different threshold is breached after [`ThrottlePolicy::cooldown`].

use std::{fmt, sync::Arc};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use shared_utils::KeyedLocks;
use tracing::debug;

use crate::{errors::ThrottleError, limits::LimitKind, store::ThrottleStore};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThrottleKey {
    pub user: String,
    pub symbol: String,
    pub kind: LimitKind,
}

impl ThrottleKey {
    pub fn new(user: impl Into<String>, symbol: impl Into<String>, kind: LimitKind) -> Self {
        Self {
            user: user.into(),
            symbol: symbol.into(),
            kind,
        }
    }
}

impl fmt::Display for ThrottleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.user, self.symbol, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrottleState {
    pub limit_value: f64,
    pub last_notified_value: f64,
    pub last_change_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottlePolicy {
    pub cooldown: TimeDelta,
    /// Relative price move, `0.025` is 2.5 %.
    pub min_move: f64,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            cooldown: TimeDelta::minutes(15),
            min_move: 0.025,
        }
    }
}

/// One transition of the throttle state machine. Returns whether to notify
/// and the state to store.
pub fn evaluate(
    prior: Option<&ThrottleState>,
    limit_value: f64,
    current_value: f64,
    now: DateTime<Utc>,
    policy: &ThrottlePolicy,
) -> (bool, ThrottleState) {
    let Some(prior) = prior else {
        return (
            true,
            ThrottleState {
                limit_value,
                last_notified_value: current_value,
                last_change_time: now,
            },
        );
    };
    let mut next = prior.clone();

    if limit_value != prior.limit_value && now - prior.last_change_time > policy.cooldown {
        next.limit_value = limit_value;
        next.last_change_time = now;
        return (true, next);
    }

    if prior.last_notified_value > 0.0 {
        let moved = (prior.last_notified_value - current_value).abs() / prior.last_notified_value;
        if moved > policy.min_move {
            next.last_notified_value = current_value;
            return (true, next);
        }
        return (false, next);
    }

    (true, next)
}

/// [`evaluate`] over a shared store, one evaluation at a time per key.
pub struct AlertThrottle {
    store: Arc<dyn ThrottleStore>,
    policy: ThrottlePolicy,
    locks: KeyedLocks<ThrottleKey>,
}

impl AlertThrottle {
    pub fn new(store: Arc<dyn ThrottleStore>, policy: ThrottlePolicy) -> Self {
        Self {
            store,
            policy,
            locks: KeyedLocks::new(),
        }
    }

    pub fn policy(&self) -> &ThrottlePolicy {
        &self.policy
    }

    /// Whether a breach of `limit_value` at `current_value` should be notified.
    pub fn should_notify(
        &self,
        key: &ThrottleKey,
        limit_value: f64,
        current_value: f64,
        now: DateTime<Utc>,
    ) -> Result<bool, ThrottleError> {
        self.locks.with_lock(key, || -> Result<bool, ThrottleError> {
            let prior = self.store.get(key)?;
            let (notify, next) = evaluate(prior.as_ref(), limit_value, current_value, now, &self.policy);
            if prior.as_ref() != Some(&next) {
                self.store.put(key, &next)?;
            }
            debug!(%key, limit_value, current_value, notify, "throttle evaluated");
            Ok(notify)
        })
    }
}
