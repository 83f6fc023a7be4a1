//! String key/value persistence.
//!
//! The browser implementation goes through `gloo-storage`; [`MemoryStorage`]
//! backs the tests and any non-browser host.

use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

use gloo_storage::{LocalStorage, SessionStorage, Storage};

use crate::error::CheckoutError;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, CheckoutError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CheckoutError>;
    fn remove(&self, key: &str) -> Result<(), CheckoutError>;
}

/// A `window.localStorage` or `window.sessionStorage` area.
pub struct BrowserStorage<S> {
    _area: PhantomData<S>,
}

impl<S> BrowserStorage<S> {
    pub const fn new() -> Self {
        Self { _area: PhantomData }
    }
}

impl<S> Default for BrowserStorage<S> {
    fn default() -> Self {
        Self::new()
    }
}

pub type LocalArea = BrowserStorage<LocalStorage>;
pub type SessionArea = BrowserStorage<SessionStorage>;

fn js_storage_error(err: wasm_bindgen::JsValue) -> CheckoutError {
    CheckoutError::Storage(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

impl<S: Storage> KeyValueStore for BrowserStorage<S> {
    fn get(&self, key: &str) -> Result<Option<String>, CheckoutError> {
        S::raw().get_item(key).map_err(js_storage_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CheckoutError> {
        S::raw().set_item(key, value).map_err(js_storage_error)
    }

    fn remove(&self, key: &str) -> Result<(), CheckoutError> {
        S::raw().remove_item(key).map_err(js_storage_error)
    }
}

/// In-memory store. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CheckoutError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CheckoutError> {
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CheckoutError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_clones_share_state() {
        let store = MemoryStorage::new();
        let other = store.clone();
        store.set("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));
        other.remove("k").unwrap();
        assert!(store.is_empty());
    }
}
