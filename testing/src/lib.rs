//! # Mingle Testing
//!
//! Testing utilities for the Mingle sync engine:
//!
//! - [`mocks::FixedClock`] — deterministic time, so the upcoming/past
//!   boundary sits exactly where a test puts it.
//! - [`fixtures`] — builders for events and participants with
//!   deterministic ids and dates relative to the fixed clock.
//! - [`InMemoryDataService`] — a complete in-memory data service with
//!   the real conflict and search semantics, optionally linked to the
//!   push channel so local actions produce their broadcast echo.
//! - [`InMemoryPushChannel`] — a scriptable push channel with per-event
//!   room membership and connection loss/recovery.
//!
//! ## Example
//!
//! ```ignore
//! use mingle_testing::{fixtures, mocks::test_clock, InMemoryDataService, InMemoryPushChannel};
//!
//! let channel = InMemoryPushChannel::new();
//! let service = InMemoryDataService::new(fixtures::participant(1))
//!     .with_events(vec![fixtures::event("e1").starting_in_hours(2).build()])
//!     .linked_to(channel.clone());
//! ```

/// In-memory data service
pub mod data_service;
/// Event and participant fixtures
pub mod fixtures;
/// Mock clocks
pub mod mocks;
/// In-memory push channel
pub mod push_channel;

pub use data_service::InMemoryDataService;
pub use mocks::{FixedClock, SteppingClock, test_clock};
pub use push_channel::InMemoryPushChannel;

/// Installs a test tracing subscriber honoring `RUST_LOG`.
///
/// Safe to call from several tests; only the first call wins.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
