//! Weather acquisition for the panel.
//!
//! Fetches the provider payload, normalizes it into an immutable
//! [`WeatherSnapshot`], gates refreshes and publishes the latest snapshot
//! to readers through a [`SnapshotSlot`].

pub mod clock;
pub mod conditions;
pub mod connectivity;
pub mod fetcher;
pub mod format;
pub mod scheduler;
pub mod types;

pub use conditions::{ConditionEntry, ConditionResolver, Resolution};
pub use connectivity::{ConnectivityState, LinkState, ReconnectPolicy};
pub use fetcher::{FetchError, WeatherFetcher};
pub use scheduler::{Published, SnapshotSlot, SyncStatus, UpdateOutcome, UpdateScheduler};
pub use types::WeatherSnapshot;
