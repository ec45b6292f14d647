//! Message delivery pipeline: ordered sync queue, streaming reply buffer and retry policy

pub mod queue;
pub mod retry;
pub mod stream;

pub use queue::{DrainBlocked, Outgoing, SyncQueue};
pub use retry::RetryPolicy;
pub use stream::{FlushFn, StreamBuffer};
