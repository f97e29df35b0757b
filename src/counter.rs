//! Process-wide `message-id` counter.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running count of every RPC sent by this process, incremented by
/// [`Method::wrap`](crate::message::Method::wrap). The first wrapped RPC
/// carries `message-id="1"`.
///
/// The counter is safe for client applications to access, use and increment.
pub static MESSAGE_COUNTER: MessageCounter = MessageCounter::new();

/// A 64-bit unsigned counter safe for concurrent use. All mutators are
/// linearizable with [`value`](MessageCounter::value): any read that returns
/// after an [`add`](MessageCounter::add) completes reflects that add.
#[derive(Debug, Default)]
pub struct MessageCounter(AtomicU64);

impl MessageCounter {
    /// Creates a counter starting at zero.
    pub const fn new() -> Self {
        MessageCounter(AtomicU64::new(0))
    }

    /// Adds `delta` and returns the updated value.
    pub fn add(&self, delta: u64) -> u64 {
        self.0.fetch_add(delta, Ordering::SeqCst) + delta
    }

    /// Assigns `value`, discarding the current count. Intended for explicit
    /// teardown; the counter otherwise lives for the process.
    pub fn set(&self, value: u64) {
        self.0.store(value, Ordering::SeqCst);
    }

    /// Returns the current value.
    pub fn value(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

impl fmt::Display for MessageCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}
