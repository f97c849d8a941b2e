//! Store wrappers for failure-injection testing

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::store::{KvStore, SetOptions};

/// A [`KvStore`] wrapper whose operations can be made to fail at runtime.
///
/// While failing, every call returns [`StoreError::Unavailable`] without
/// touching the wrapped store. Used to exercise retry and best-effort paths
/// against a store that is down.
pub struct FlakyStore<S> {
    inner: S,
    failing: AtomicBool,
}

impl<S: KvStore> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
        }
    }

    /// Toggle failure injection. Takes effect on the next operation.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Access the wrapped store, e.g. to inspect or reset its contents.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: KvStore> KvStore for FlakyStore<S> {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Option<Bytes>, opts: SetOptions) -> Result<bool> {
        self.check()?;
        self.inner.set(key, value, opts).await
    }
}
