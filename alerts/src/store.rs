use std::{collections::HashMap, sync::RwLock};

use crate::{
    errors::ThrottleError,
    throttle::{ThrottleKey, ThrottleState},
};

/// Key-value persistence for throttle states.
pub trait ThrottleStore: Send + Sync {
    fn get(&self, key: &ThrottleKey) -> Result<Option<ThrottleState>, ThrottleError>;
    fn put(&self, key: &ThrottleKey, state: &ThrottleState) -> Result<(), ThrottleError>;
}

/// Throttle states kept for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryThrottleStore {
    states: RwLock<HashMap<ThrottleKey, ThrottleState>>,
}

impl MemoryThrottleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ThrottleStore for MemoryThrottleStore {
    fn get(&self, key: &ThrottleKey) -> Result<Option<ThrottleState>, ThrottleError> {
        let states = self
            .states
            .read()
            .map_err(|_| ThrottleError::Store("memory throttle store poisoned".into()))?;
        Ok(states.get(key).cloned())
    }

    fn put(&self, key: &ThrottleKey, state: &ThrottleState) -> Result<(), ThrottleError> {
        let mut states = self
            .states
            .write()
            .map_err(|_| ThrottleError::Store("memory throttle store poisoned".into()))?;
        states.insert(key.clone(), state.clone());
        Ok(())
    }
}
