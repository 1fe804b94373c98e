// Shared transport configuration and the lazily created HTTP handle.
//
// The local and cloud clients each own exactly one `HttpHandle`. The handle
// builds its `reqwest::Client` on first use, can be released at any time, and
// is rebuilt transparently on the next call.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::trace;

use crate::error::Error;

/// Default timeout for calls to the device on the local network.
pub const DEFAULT_LOCAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for calls to the cloud API and identity provider.
pub const DEFAULT_CLOUD_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("petwalk-rs/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOCAL_TIMEOUT,
        }
    }
}

impl TransportConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))
    }
}

/// A single, lazily created HTTP session owned by one client.
///
/// The lock is only held to swap the `Option`, never across an `.await`.
/// Concurrent callers may race to build the client; the last one wins and
/// both clients stay valid for the request they were handed out for.
#[derive(Debug)]
pub(crate) struct HttpHandle {
    config: TransportConfig,
    slot: Mutex<Option<reqwest::Client>>,
}

impl HttpHandle {
    pub(crate) fn new(config: TransportConfig) -> Self {
        Self {
            config,
            slot: Mutex::new(None),
        }
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Return the current client, creating one if none is held.
    pub(crate) fn acquire(&self) -> Result<reqwest::Client, Error> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }
        trace!("creating HTTP session");
        let client = self.config.build_client()?;
        *slot = Some(client.clone());
        Ok(client)
    }

    /// Drop the held client. In-flight requests keep their own clone.
    pub(crate) fn release(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_some() {
            trace!("released HTTP session");
        }
    }

    /// Guard one call: the session is released unless the call completes.
    pub(crate) fn call(&self) -> CallGuard<'_> {
        CallGuard {
            handle: self,
            completed: false,
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Releases a client's HTTP session when dropped.
///
/// Returned by `LocalClient::scope` and `CloudClient::scope`. Because release
/// happens in `Drop`, it runs on success, on error and when the caller
/// abandons the future mid-flight.
#[must_use = "the session is released as soon as the guard is dropped"]
pub struct SessionScope<'a> {
    handle: &'a HttpHandle,
}

impl<'a> SessionScope<'a> {
    pub(crate) fn new(handle: &'a HttpHandle) -> Self {
        Self { handle }
    }
}

impl Drop for SessionScope<'_> {
    fn drop(&mut self) {
        self.handle.release();
    }
}

/// Releases the session if dropped before [`CallGuard::complete`].
///
/// Covers both an error return and a future abandoned mid-request.
pub(crate) struct CallGuard<'a> {
    handle: &'a HttpHandle,
    completed: bool,
}

impl CallGuard<'_> {
    /// Finish the call, keeping the session only on success.
    pub(crate) fn complete<T>(mut self, result: Result<T, Error>) -> Result<T, Error> {
        self.completed = result.is_ok();
        result
    }
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.handle.release();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_created_lazily_and_released() {
        let handle = HttpHandle::new(TransportConfig::default());
        assert!(!handle.is_open());

        handle.acquire().unwrap();
        assert!(handle.is_open());

        handle.release();
        assert!(!handle.is_open());

        // Recreated on next use
        handle.acquire().unwrap();
        assert!(handle.is_open());
    }

    #[test]
    fn scope_releases_on_drop() {
        let handle = HttpHandle::new(TransportConfig::default());
        {
            let _scope = SessionScope::new(&handle);
            handle.acquire().unwrap();
            assert!(handle.is_open());
        }
        assert!(!handle.is_open());
    }

    #[test]
    fn call_guard_keeps_session_only_on_success() {
        let handle = HttpHandle::new(TransportConfig::default());

        handle.acquire().unwrap();
        handle.call().complete(Ok(())).unwrap();
        assert!(handle.is_open());

        let failed: Result<(), Error> = Err(Error::WebSocket("reset".into()));
        assert!(handle.call().complete(failed).is_err());
        assert!(!handle.is_open());

        handle.acquire().unwrap();
        {
            let _abandoned = handle.call();
        }
        assert!(!handle.is_open());
    }
}
