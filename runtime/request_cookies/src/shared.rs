use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::entry::{CookieEntry, CookieOptions, DeleteOptions};
use crate::errors::{DeleteCookieError, SetCookieError};
use crate::state::StoreState;
use crate::store::CookieStore;

/// A [`CookieStore`] that can be shared across concurrent tasks handling the same request.
///
/// Every method takes the lock for the duration of a single operation,
/// so concurrent `set`s on the same name resolve to the last write.
/// Use [`with`](Self::with) to perform several operations atomically.
#[derive(Debug, Clone)]
pub struct SharedCookieStore(Arc<Mutex<CookieStore>>);

impl SharedCookieStore {
    pub fn new(store: CookieStore) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    pub fn get(&self, name: &str) -> Option<CookieEntry> {
        self.inner().get(name)
    }

    pub fn get_all(&self, name: Option<&str>) -> Vec<CookieEntry> {
        self.inner().get_all(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.inner().has(name)
    }

    pub fn set(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
        options: CookieOptions,
    ) -> Result<(), SetCookieError> {
        self.inner().set(name, value, options)
    }

    pub fn delete(&self, name: &str) -> Result<(), DeleteCookieError> {
        self.inner().delete(name)
    }

    pub fn delete_with(&self, options: DeleteOptions) -> Result<(), DeleteCookieError> {
        self.inner().delete_with(options)
    }

    pub fn clear(&self) -> Result<(), DeleteCookieError> {
        self.inner().clear()
    }

    pub fn state(&self) -> StoreState {
        self.inner().state()
    }

    /// Run `f` while holding the lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut CookieStore) -> R) -> R {
        f(&mut self.inner())
    }

    /// Get the store back, if this is the last handle to it.
    pub fn try_into_inner(self) -> Result<CookieStore, Self> {
        match Arc::try_unwrap(self.0) {
            Ok(mutex) => Ok(mutex.into_inner().unwrap_or_else(|e| e.into_inner())),
            Err(shared) => Err(Self(shared)),
        }
    }

    fn inner(&self) -> MutexGuard<'_, CookieStore> {
        self.0.lock().expect("Cookie store mutex should not be poisoned")
    }
}

impl From<CookieStore> for SharedCookieStore {
    fn from(store: CookieStore) -> Self {
        Self::new(store)
    }
}

impl fmt::Display for SharedCookieStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner(), f)
    }
}
