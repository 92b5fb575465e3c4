use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use longplan_traits::{BoxError, ParamStore};

use crate::error::SimError;

/// In-memory param store. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryParams {
    values: Rc<RefCell<HashMap<String, bool>>>,
    offline: Rc<RefCell<bool>>,
}

impl MemoryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, value: bool) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: &str, value: bool) {
        self.values.borrow_mut().insert(key.to_owned(), value);
    }

    /// Make every read fail until cleared.
    pub fn set_offline(&self, offline: bool) {
        *self.offline.borrow_mut() = offline;
    }
}

impl ParamStore for MemoryParams {
    fn get_bool(&self, key: &str) -> Result<Option<bool>, BoxError> {
        if *self.offline.borrow() {
            return Err(SimError::ParamsUnavailable.into());
        }
        Ok(self.values.borrow().get(key).copied())
    }
}
