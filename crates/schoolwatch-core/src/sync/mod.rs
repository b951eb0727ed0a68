//! Refresh coordination.
//!
//! `RefreshCoordinator` turns "the user wants fresh data" into exactly one
//! `RefreshOutcome`, choosing between the local cache, the remote source and
//! the cooldown window:
//!
//! ```text
//! smart_refresh:  fresh, non-empty cache ──► Success (from cache)
//!                 otherwise ──► force_refresh
//!
//! force_refresh:  cooldown active ──► Cooldown
//!                 fetch ok ──► save cache, record attempt ──► Success
//!                 fetch failed ──► cached records? ──► Success (from cache)
//!                                               └──► Error
//! ```

pub mod coordinator;
pub mod outcome;

pub use coordinator::{FailedFetchPolicy, RefreshCoordinator};
pub use outcome::RefreshOutcome;
