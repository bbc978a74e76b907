//! placekeeper engine
//!
//! Turns host window events into placement cache updates:
//! - location changes arm a short debounce, then a full scan saves every
//!   eligible window for the current monitor count,
//! - display changes arm a longer delay, then restore the placements saved
//!   for the new monitor count,
//! - a guard keeps scans from recording the scattered layout the OS
//!   produces while a display change is being handled.
//!
//! [`Coordinator`] holds that state machine; [`service`] wires it to the
//! window watcher and a control channel.

use std::time::Duration;

mod coordinator;
mod error;
mod oneshot;
pub mod service;
pub mod test_support;

pub use coordinator::Coordinator;
pub use error::{Error, Result};
pub use oneshot::OneShot;
pub use placekeeper_store::{
    EVICTION_THRESHOLD, MAX_MONITORS, MIN_MONITORS, MonitorRange, STALE_THRESHOLD, StoreCfg,
};
pub use win_winops::watcher::WatchEvent;

/// Debounce between a window moving and the rescan.
pub const SCAN_DELAY_MS: u64 = 200;

/// Delay between a display change and the restore pass.
pub const DISPLAY_DELAY_MS: u64 = 500;

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeeperCfg {
    /// Debounce for location-change driven scans.
    pub scan_delay: Duration,
    /// Settle time after a display change before restoring.
    pub display_delay: Duration,
    /// Placement cache configuration.
    pub store: StoreCfg,
}

impl Default for KeeperCfg {
    fn default() -> Self {
        Self {
            scan_delay: Duration::from_millis(SCAN_DELAY_MS),
            display_delay: Duration::from_millis(DISPLAY_DELAY_MS),
            store: StoreCfg::default(),
        }
    }
}

/// Requests from the shell to the running service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMsg {
    /// Flip diagnostics recording.
    ToggleDiagnostics,
    /// Restore for the current monitor count even if it has not changed.
    ForceRestore,
    /// Stop the service loop.
    Shutdown,
}
