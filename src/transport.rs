//! Secure transport boundary.

use crate::error::Result;
use async_trait::async_trait;

pub mod ssh;

/// Lifecycle handle for the secure transport a session runs on. The core
/// treats the transport as a pair of opaque byte streams handed to
/// [`Session::open`](crate::session::Session::open); closing is the only
/// operation it needs afterwards.
#[async_trait]
pub trait Transport: Send {
    async fn close(&mut self) -> Result<()>;
}
