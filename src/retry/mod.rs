//! Rate-limit aware retries for mutating remote calls.
//!
//! Delete-class operations may be throttled by the server. [`RetryExecutor`]
//! reruns them a bounded number of times, sleeping for the wait the server
//! suggested (or a default) between attempts. Any other failure is returned
//! on the spot.
//!
//! # Example
//!
//! ```ignore
//! let executor = RetryExecutor::default();
//! executor
//!     .run("delete_value", key, move || client.delete(key))
//!     .await?;
//! ```

mod classify;
mod executor;

pub use classify::{classify_message, Classification, Classify};
pub use executor::{RetryError, RetryExecutor, RetryPolicy};
