//! Injectable clock
//!
//! All strategy inter-attempt waits go through this trait instead of
//! calling `tokio::time::sleep` directly, so that tests can fast-forward
//! the `scheduled_retry` ladder (worst case 31 real seconds) without
//! burning wall-clock time.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A source of cooperative waits. `wait` MUST be a cancellation-safe
/// suspension point: it must not block the executor thread, and dropping
/// the returned future must not leave anything locked (§5).
pub trait Clock: Send + Sync {
    fn wait<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Production clock: a real, cooperative `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn wait<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Test clock: resolves instantly but records every requested wait, in
/// order, in milliseconds. Lets a test assert the exact schedule a
/// strategy produced (P5, P6, P7) without the test itself taking 31
/// seconds.
#[derive(Debug, Default, Clone)]
pub struct RecordingClock {
    waits_ms: Arc<std::sync::Mutex<Vec<u64>>>,
    total_ms: Arc<AtomicU64>,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded_ms(&self) -> Vec<u64> {
        self.waits_ms.lock().unwrap().clone()
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms.load(Ordering::SeqCst)
    }
}

impl Clock for RecordingClock {
    fn wait<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        let ms = duration.as_millis() as u64;
        self.waits_ms.lock().unwrap().push(ms);
        self.total_ms.fetch_add(ms, Ordering::SeqCst);
        Box::pin(std::future::ready(()))
    }
}
